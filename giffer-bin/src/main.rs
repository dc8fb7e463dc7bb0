// main.rs      giffer command
//
// Copyright (c) 2019-2025  Douglas Lau
//
#![forbid(unsafe_code)]

mod life;

use crate::life::LifeGrid;
use clap::{App, AppSettings, Arg, ArgMatches};
use giffer::{
    lzw, AnimationEnc, AnimationParams, ColorTable, Error as GifError,
    Progress, Selection,
};
use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Crate version
const VERSION: &'static str = std::env!("CARGO_PKG_VERSION");

/// Main entry point
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder().format_timestamp(None).init();
    let mut out = StandardStream::stdout(ColorChoice::Auto);
    let matches = create_app().get_matches();
    render(&mut out, &matches)?;
    out.reset()?;
    Ok(())
}

/// Create clap App
fn create_app() -> App<'static, 'static> {
    App::new("giffer")
        .version(VERSION)
        .about("Render a Life pattern into an animated GIF")
        .setting(AppSettings::ArgRequiredElseHelp)
        .arg(
            Arg::with_name("pattern")
                .required(true)
                .help("pattern file (.rle or .cells)"),
        )
        .arg(
            Arg::with_name("output")
                .default_value("out.gif")
                .help("output GIF file"),
        )
        .arg(
            Arg::with_name("generations")
                .short("g")
                .long("generations")
                .takes_value(true)
                .default_value("1")
                .help("number of generations"),
        )
        .arg(
            Arg::with_name("ms-per-gen")
                .short("t")
                .long("ms-per-gen")
                .takes_value(true)
                .default_value("100")
                .help("milliseconds per generation"),
        )
        .arg(
            Arg::with_name("offset")
                .short("o")
                .long("offset")
                .takes_value(true)
                .allow_hyphen_values(true)
                .help("pan by dx,dy cells over the animation"),
        )
        .arg(
            Arg::with_name("frames-per-gen")
                .short("f")
                .long("frames-per-gen")
                .takes_value(true)
                .default_value("4")
                .help("frames per generation when panning"),
        )
        .arg(
            Arg::with_name("cell-size")
                .short("c")
                .long("cell-size")
                .takes_value(true)
                .default_value("14")
                .help("cell size in pixels, excluding gridlines"),
        )
        .arg(
            Arg::with_name("grid-width")
                .short("w")
                .long("grid-width")
                .takes_value(true)
                .default_value("2")
                .help("gridline width in pixels"),
        )
        .arg(
            Arg::with_name("palette")
                .short("p")
                .long("palette")
                .takes_value(true)
                .possible_values(&["lifewiki", "mono"])
                .default_value("lifewiki")
                .help("color palette"),
        )
        .arg(
            Arg::with_name("region")
                .short("r")
                .long("region")
                .takes_value(true)
                .allow_hyphen_values(true)
                .help("cells to render as x,y,w,h (default: pattern bounds)"),
        )
        .arg(
            Arg::with_name("verify")
                .long("verify")
                .help("decode the written GIF to check it"),
        )
}

/// Parse one value
fn parse_value<T: FromStr>(name: &str, value: &str) -> Result<T, GifError> {
    value.trim().parse().map_err(|_| {
        GifError::InvalidParameter(format!("{}: {:?}", name, value))
    })
}

/// Parse comma-separated values
fn parse_list<T: FromStr>(
    name: &str,
    value: &str,
    len: usize,
) -> Result<Vec<T>, GifError> {
    let vals = value
        .split(',')
        .map(|v| parse_value(name, v))
        .collect::<Result<Vec<T>, _>>()?;
    if vals.len() != len {
        return Err(GifError::InvalidParameter(format!(
            "{}: expected {} values, got {:?}",
            name, len, value
        )));
    }
    Ok(vals)
}

/// Parse a required argument (clap supplies defaults)
fn arg<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T, GifError> {
    let value = matches.value_of(name).unwrap_or_default();
    parse_value(name, value)
}

/// Build animation parameters from arguments
fn animation_params(
    matches: &ArgMatches,
) -> Result<AnimationParams, GifError> {
    let mut params = AnimationParams::default()
        .with_generation_count(arg(matches, "generations")?)
        .with_ms_per_generation(arg(matches, "ms-per-gen")?)
        .with_frames_per_generation(arg(matches, "frames-per-gen")?)
        .with_cell_size(
            arg(matches, "cell-size")?,
            arg(matches, "grid-width")?,
        )
        .with_output_path(matches.value_of_os("output").unwrap_or_default());
    if let Some(offset) = matches.value_of("offset") {
        let d: Vec<i64> = parse_list("offset", offset, 2)?;
        params = params.with_cell_offset(d[0], d[1]);
    }
    Ok(params)
}

/// Get the selected color table
fn color_table(matches: &ArgMatches) -> Result<ColorTable, GifError> {
    match matches.value_of("palette") {
        Some("lifewiki") | None => Ok(ColorTable::lifewiki()),
        Some("mono") => Ok(ColorTable::monochrome()),
        Some(p) => Err(GifError::InvalidParameter(format!("palette {}", p))),
    }
}

/// Get the selected region
fn selection(
    matches: &ArgMatches,
    grid: &LifeGrid,
) -> Result<Option<Selection>, GifError> {
    match matches.value_of("region") {
        Some(region) => {
            let xy: Vec<i64> = parse_list("region", region, 4)?;
            let w = u32::try_from(xy[2]).map_err(|_| {
                GifError::InvalidParameter(format!("region: {:?}", region))
            })?;
            let h = u32::try_from(xy[3]).map_err(|_| {
                GifError::InvalidParameter(format!("region: {:?}", region))
            })?;
            Ok(Some(Selection::new(xy[0], xy[1], w, h)))
        }
        None => Ok(grid.bounds()),
    }
}

/// Progress display
struct FrameCounter<'a> {
    out: &'a mut StandardStream,
    color: ColorSpec,
    res: io::Result<()>,
}

impl Progress for FrameCounter<'_> {
    fn frame_done(&mut self, frame: u64, total: u64) {
        if self.res.is_ok() {
            self.res = self.show(frame, total);
        }
    }
}

impl FrameCounter<'_> {
    fn show(&mut self, frame: u64, total: u64) -> io::Result<()> {
        self.out.set_color(&self.color)?;
        write!(self.out, "\rframe {}/{}", frame, total)?;
        if frame == total {
            writeln!(self.out)?;
        }
        self.out.flush()
    }
}

/// Render a pattern file into a GIF
fn render(
    out: &mut StandardStream,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let mut magenta = ColorSpec::new();
    magenta.set_fg(Some(Color::Magenta));
    let mut cyan = ColorSpec::new();
    cyan.set_fg(Some(Color::Cyan)).set_intense(true);
    let mut bold = ColorSpec::new();
    bold.set_fg(Some(Color::White))
        .set_intense(true)
        .set_bold(true);
    let path = matches.value_of_os("pattern").unwrap_or_default();
    let mut grid = LifeGrid::parse(&fs::read_to_string(path)?)?;
    let params = animation_params(matches)?;
    let table = color_table(matches)?;
    let sel = selection(matches, &grid)?;
    log::debug!("selection {:?}", sel);
    let output = params.output_path().to_path_buf();
    out.set_color(&magenta)?;
    writeln!(out, "{:?}", path)?;
    out.set_color(&bold)?;
    writeln!(
        out,
        "population {}, {} generations",
        grid.population(),
        params.generation_count()
    )?;
    let enc = AnimationEnc::new(params, table, sel)?;
    let (width, height) = (enc.width(), enc.height());
    let frames = enc.total_frames();
    let mut counter = FrameCounter {
        out: &mut *out,
        color: cyan,
        res: Ok(()),
    };
    let len = enc.encode_file(&mut grid, &mut counter)?;
    counter.res?;
    out.set_color(&bold)?;
    writeln!(
        out,
        "{:?}: {} frames, {}x{}, {} bytes",
        output, frames, width, height, len
    )?;
    if matches.is_present("verify") {
        let n = verify(&output, usize::from(width) * usize::from(height))?;
        out.set_color(&magenta)?;
        writeln!(out, "verified {} frames", n)?;
    }
    Ok(())
}

/// Decode every frame of a written GIF, checking the pixel count
fn verify(path: &Path, n_pixels: usize) -> Result<usize, Box<dyn Error>> {
    let gif = fs::read(path)?;
    Ok(check_frames(&gif, n_pixels)?)
}

/// Decode every frame of a GIF, returning the frame count
fn check_frames(gif: &[u8], n_pixels: usize) -> Result<usize, GifError> {
    let corrupt = || GifError::InvalidLzwData;
    let packed = *gif.get(10).ok_or_else(corrupt)?;
    // header, screen descriptor and global color table
    let mut pos = 13 + (3 << ((packed & 0x07) + 1));
    let mut frames = 0;
    loop {
        match *gif.get(pos).ok_or_else(corrupt)? {
            0x21 => {
                pos += 2;
                pos = skip_sub_blocks(gif, pos)?;
            }
            0x2C => {
                let start = pos + 10;
                let end = skip_sub_blocks(gif, start + 1)?;
                let pixels = lzw::decompress(&gif[start..end])?;
                if pixels.len() != n_pixels {
                    return Err(corrupt());
                }
                frames += 1;
                pos = end;
            }
            0x3B => return Ok(frames),
            _ => return Err(corrupt()),
        }
    }
}

/// Skip data sub-blocks, including the terminator
fn skip_sub_blocks(gif: &[u8], mut pos: usize) -> Result<usize, GifError> {
    loop {
        let len = usize::from(*gif.get(pos).ok_or(GifError::InvalidLzwData)?);
        pos += 1 + len;
        if len == 0 {
            return Ok(pos);
        }
    }
}
