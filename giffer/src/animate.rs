// animate.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Animation assembly
use crate::block::*;
use crate::encode::BlockEnc;
use crate::error::{Error, Result};
use crate::grid::{CellGrid, Selection};
use crate::lzw;
use crate::raster::{CellLayout, Rasterizer};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Shortest frame time derived from frames per generation (ms)
const MIN_FRAME_MS: u32 = 20;

/// Parameters of an animation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimationParams {
    /// Number of generations to animate
    generation_count: u64,
    /// Cell displacement over the whole animation
    cell_offset: (i64, i64),
    /// Time per generation (ms)
    ms_per_generation: u32,
    /// Frames per generation (only used when panning)
    frames_per_generation: u32,
    /// Cell and gridline sizes
    layout: CellLayout,
    /// Output file path
    output_path: PathBuf,
}

impl Default for AnimationParams {
    fn default() -> Self {
        AnimationParams {
            generation_count: 1,
            cell_offset: (0, 0),
            ms_per_generation: 100,
            frames_per_generation: 1,
            layout: CellLayout::new(14, 2),
            output_path: PathBuf::from("out.gif"),
        }
    }
}

impl AnimationParams {
    /// Set the number of generations
    pub fn with_generation_count(mut self, generation_count: u64) -> Self {
        self.generation_count = generation_count;
        self
    }

    /// Set the cell displacement over the whole animation
    pub fn with_cell_offset(mut self, dx: i64, dy: i64) -> Self {
        self.cell_offset = (dx, dy);
        self
    }

    /// Set the time per generation in milliseconds
    pub fn with_ms_per_generation(mut self, ms: u32) -> Self {
        self.ms_per_generation = ms;
        self
    }

    /// Set the number of frames per generation when panning
    pub fn with_frames_per_generation(mut self, frames: u32) -> Self {
        self.frames_per_generation = frames;
        self
    }

    /// Set the cell size (excluding gridlines) and gridline width
    pub fn with_cell_size(
        mut self,
        pure_cell_px: u32,
        grid_line_px: u32,
    ) -> Self {
        self.layout = CellLayout::new(pure_cell_px, grid_line_px);
        self
    }

    /// Set the output file path
    pub fn with_output_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output_path = path.into();
        self
    }

    /// Get the number of generations
    pub fn generation_count(&self) -> u64 {
        self.generation_count
    }

    /// Get the cell displacement
    pub fn cell_offset(&self) -> (i64, i64) {
        self.cell_offset
    }

    /// Get the time per generation (ms)
    pub fn ms_per_generation(&self) -> u32 {
        self.ms_per_generation
    }

    /// Get the cell layout
    pub fn layout(&self) -> CellLayout {
        self.layout
    }

    /// Get the output file path
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Get the time per frame (ms).
    ///
    /// Without panning, one frame is shown per generation.
    pub fn ms_per_frame(&self) -> u32 {
        if self.cell_offset == (0, 0) {
            self.ms_per_generation
        } else {
            let frames = self.frames_per_generation.max(1);
            (self.ms_per_generation / frames)
                .max(MIN_FRAME_MS)
                .min(self.ms_per_generation)
        }
    }

    /// Get the total duration (ms)
    pub fn total_ms(&self) -> u64 {
        u64::from(self.ms_per_generation).saturating_mul(self.generation_count)
    }

    /// Get the total number of frames
    pub fn total_frames(&self) -> u64 {
        (self.total_ms() / u64::from(self.ms_per_frame())).max(1)
    }

    /// Get the frame delay in centiseconds
    pub fn delay_time_cs(&self) -> Result<u16> {
        Ok(u16::try_from(self.ms_per_frame() / 10)?)
    }

    /// Check that all parameters are usable
    pub fn validate(&self) -> Result<()> {
        if self.generation_count == 0 {
            return Err(Error::InvalidParameter(
                "generation count must be at least 1".into(),
            ));
        }
        if self.ms_per_generation == 0 {
            return Err(Error::InvalidParameter(
                "time per generation must be positive".into(),
            ));
        }
        if self.layout.pure_cell_px() == 0 {
            return Err(Error::InvalidParameter(
                "cell size must be positive".into(),
            ));
        }
        if u64::from(self.ms_per_generation)
            .checked_mul(self.generation_count)
            .is_none()
        {
            return Err(Error::InvalidParameter("animation too long".into()));
        }
        let cell_px = i64::from(self.layout.cell_px());
        let (dx, dy) = self.cell_offset;
        let pan_x = dx.checked_mul(cell_px);
        let pan_y = dy.checked_mul(cell_px);
        if pan_x.is_none() || pan_y.is_none() {
            return Err(Error::InvalidParameter("cell offset too large".into()));
        }
        if self.delay_time_cs().is_err() {
            return Err(Error::InvalidParameter(
                "frame delay too long".into(),
            ));
        }
        Ok(())
    }

    /// Get the pan offset (pixels) at a time
    fn offset_px(&self, t: u64) -> (i64, i64) {
        let cell_px = i128::from(self.layout.cell_px());
        let t = i128::from(t);
        let total = i128::from(self.total_ms());
        let (dx, dy) = self.cell_offset;
        (
            (i128::from(dx) * cell_px * t / total) as i64,
            (i128::from(dy) * cell_px * t / total) as i64,
        )
    }

    /// Get the generation shown at a time
    fn generation(&self, t: u64) -> u64 {
        t / u64::from(self.ms_per_generation)
    }
}

/// Receiver of progress notifications
pub trait Progress {
    /// Called after a frame is encoded (`frame` counts from 1)
    fn frame_done(&mut self, frame: u64, total: u64);
}

impl<F: FnMut(u64, u64)> Progress for F {
    fn frame_done(&mut self, frame: u64, total: u64) {
        self(frame, total)
    }
}

/// Assembly state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Preamble blocks written
    HeaderWritten,
    /// Frames being encoded (next frame number)
    FrameLoop(u64),
    /// Trailer written
    Finalized,
}

/// Animation encoder.
///
/// The whole GIF is buffered in memory; nothing touches the file system
/// until [write_file] or [write_to].  Dropping the encoder before then
/// discards the animation.
///
/// ## Example
/// ```
/// use giffer::{
///     AnimationEnc, AnimationParams, CellGrid, ColorTable, Selection,
/// };
///
/// struct Blinker(u64);
///
/// impl CellGrid for Blinker {
///     fn cell_state(&self, x: i64, y: i64) -> u8 {
///         let (a, b) = if self.0 % 2 == 0 { (x, y) } else { (y, x) };
///         (a == 1 && (0..3).contains(&b)) as u8
///     }
///     fn advance(&mut self, generations: u64) {
///         self.0 += generations;
///     }
/// }
///
/// # fn main() -> Result<(), giffer::Error> {
/// let params = AnimationParams::default()
///     .with_generation_count(2)
///     .with_cell_size(4, 1);
/// let selection = Some(Selection::new(0, 0, 3, 3));
/// let enc = AnimationEnc::new(params, ColorTable::lifewiki(), selection)?;
/// let gif = enc.encode_all(&mut Blinker(0), &mut |_: u64, _: u64| ())?;
/// assert_eq!(&gif[..6], b"GIF89a");
/// # Ok(())
/// # }
/// ```
///
/// [write_file]: struct.AnimationEnc.html#method.write_file
/// [write_to]: struct.AnimationEnc.html#method.write_to
pub struct AnimationEnc {
    /// Animation parameters
    params: AnimationParams,
    /// Global color table
    table: ColorTable,
    /// Frame rasterizer
    rasterizer: Rasterizer,
    /// Block encoder (output buffer)
    enc: BlockEnc<Vec<u8>>,
    /// Current state
    state: State,
}

impl AnimationEnc {
    /// Create an animation encoder, writing the preamble blocks.
    ///
    /// Fails on an empty selection, a canvas too large for GIF or invalid
    /// parameters.
    pub fn new(
        params: AnimationParams,
        table: ColorTable,
        selection: Option<Selection>,
    ) -> Result<Self> {
        params.validate()?;
        let selection = Selection::validate(selection)?;
        let rasterizer = Rasterizer::new(selection, params.layout(), &table)?;
        let mut anim = AnimationEnc {
            params,
            table,
            rasterizer,
            enc: BlockEnc::new(Vec::new()),
            state: State::HeaderWritten,
        };
        anim.encode_preamble()?;
        Ok(anim)
    }

    /// Encode header, screen descriptor, color table and looping blocks
    fn encode_preamble(&mut self) -> Result<()> {
        let width = self.rasterizer.width();
        let height = self.rasterizer.height();
        info!(
            "canvas {}x{}, {} frames of {} ms",
            width,
            height,
            self.total_frames(),
            self.params.ms_per_frame()
        );
        self.enc.encode(Header::default())?;
        self.enc.encode(
            LogicalScreenDesc::default()
                .with_screen_width(width)
                .with_screen_height(height)
                .with_color_table(&self.table),
        )?;
        self.enc.encode(self.table.clone())?;
        self.enc.encode(Application::with_loop_count(0))?;
        Ok(())
    }

    /// Get the canvas width
    pub fn width(&self) -> u16 {
        self.rasterizer.width()
    }

    /// Get the canvas height
    pub fn height(&self) -> u16 {
        self.rasterizer.height()
    }

    /// Get the total number of frames
    pub fn total_frames(&self) -> u64 {
        self.params.total_frames()
    }

    /// Get the number of frames encoded so far
    pub fn frames_done(&self) -> u64 {
        match self.state {
            State::HeaderWritten => 0,
            State::FrameLoop(n) => n,
            State::Finalized => self.total_frames(),
        }
    }

    /// Encode the next frame, then advance the grid to the following one.
    ///
    /// Returns `false` once all frames have been encoded.
    pub fn encode_frame<G: CellGrid + ?Sized>(
        &mut self,
        grid: &mut G,
    ) -> Result<bool> {
        let frame = match self.state {
            State::HeaderWritten => 0,
            State::FrameLoop(n) => n,
            State::Finalized => return Ok(false),
        };
        let total = self.total_frames();
        if frame >= total {
            return Ok(false);
        }
        let f = self.build_frame(&*grid, frame)?;
        self.enc.encode_frame(&f)?;
        self.state = State::FrameLoop(frame + 1);
        if frame + 1 < total {
            let mpf = u64::from(self.params.ms_per_frame());
            let gen = self.params.generation(frame * mpf);
            let next_gen = self.params.generation((frame + 1) * mpf);
            if next_gen > gen {
                grid.advance(next_gen - gen);
            }
        }
        Ok(true)
    }

    /// Rasterize and compress one frame
    fn build_frame<G: CellGrid + ?Sized>(
        &self,
        grid: &G,
        frame: u64,
    ) -> Result<Frame> {
        let t = frame * u64::from(self.params.ms_per_frame());
        let offset = self.params.offset_px(t);
        debug!("frame {} at {} ms, offset {:?}", frame, t, offset);
        let raster = self.rasterizer.rasterize(grid, offset)?;
        let data =
            lzw::compress(raster.as_u8_slice(), self.table.min_code_size())?;
        let graphic_control_ext = GraphicControl::default()
            .with_disposal_method(DisposalMethod::NoAction)
            .with_delay_time_cs(self.params.delay_time_cs()?);
        let image_desc = ImageDesc::default()
            .with_width(self.width())
            .with_height(self.height());
        Ok(Frame {
            graphic_control_ext,
            image_desc,
            image_data: ImageData::with_compressed(data),
        })
    }

    /// Encode all remaining frames, reporting progress
    fn encode_remaining<G, P>(
        &mut self,
        grid: &mut G,
        progress: &mut P,
    ) -> Result<()>
    where
        G: CellGrid + ?Sized,
        P: Progress + ?Sized,
    {
        let total = self.total_frames();
        while self.encode_frame(grid)? {
            progress.frame_done(self.frames_done(), total);
        }
        Ok(())
    }

    /// Encode all remaining frames, reporting progress.
    ///
    /// Returns the complete GIF.
    pub fn encode_all<G, P>(
        mut self,
        grid: &mut G,
        progress: &mut P,
    ) -> Result<Vec<u8>>
    where
        G: CellGrid + ?Sized,
        P: Progress + ?Sized,
    {
        self.encode_remaining(grid, progress)?;
        self.finish()
    }

    /// Encode all remaining frames, then write the output file.
    ///
    /// Returns the number of bytes written.
    pub fn encode_file<G, P>(
        mut self,
        grid: &mut G,
        progress: &mut P,
    ) -> Result<usize>
    where
        G: CellGrid + ?Sized,
        P: Progress + ?Sized,
    {
        self.encode_remaining(grid, progress)?;
        self.write_file()
    }

    /// Write the trailer and get the complete GIF.
    ///
    /// All frames must have been encoded.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.frames_done() < self.total_frames() {
            return Err(Error::IncompleteAnimation);
        }
        self.enc.encode(Trailer::default())?;
        self.state = State::Finalized;
        Ok(self.enc.into_inner())
    }

    /// Finish and write the GIF to the output path of the parameters
    pub fn write_file(self) -> Result<usize> {
        let path = self.params.output_path().to_path_buf();
        self.write_to(path)
    }

    /// Finish and write the GIF to a file, atomically.
    ///
    /// Returns the number of bytes written.
    pub fn write_to<P: AsRef<Path>>(self, path: P) -> Result<usize> {
        let gif = self.finish()?;
        write_atomic(path.as_ref(), &gif)?;
        info!("wrote {} bytes to {:?}", gif.len(), path.as_ref());
        Ok(gif.len())
    }
}

/// Get a temporary path next to a file, unique to this process
fn temp_path(path: &Path) -> PathBuf {
    let mut name = std::ffi::OsString::from(".");
    name.push(path.file_name().unwrap_or_else(|| "giffer".as_ref()));
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

/// Write a file completely or not at all
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let tmp = temp_path(path);
    let res = write_then_rename(&tmp, path, data);
    if res.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    res
}

/// Write a temporary file, then rename it into place
fn write_then_rename(tmp: &Path, path: &Path, data: &[u8]) -> Result<()> {
    let mut f = File::create(tmp)?;
    f.write_all(data)?;
    f.sync_all()?;
    fs::rename(tmp, path)?;
    Ok(())
}
