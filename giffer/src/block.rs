// block.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! GIF blocks needed for a looping animation
use crate::error::{Error, Result};

/// Number of channels in a color table entry (RGB)
const CHANNELS: usize = 3;

/// Palette of the LifeWiki style: dead, alive, unused, gridline gray
const LIFEWIKI: [u8; 12] = [
    0xFF, 0xFF, 0xFF, // dead cell
    0x00, 0x00, 0x00, // live cell
    0x00, 0x00, 0x00, // unused
    0xC6, 0xC6, 0xC6, // gridlines
];

/// Two color palette: dead cells white, live cells (and gridlines) black
const MONOCHROME: [u8; 6] = [0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00];

/// Global color table for an animation.
///
/// The number of entries is always a power of two between 2 and 256.  The
/// last entry is reserved for gridlines (the border color).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorTable {
    /// Size field: the table holds `2 << size` entries
    size: u8,
    /// Packed RGB triples
    colors: Vec<u8>,
}

impl ColorTable {
    /// Create a color table from packed RGB triples.
    ///
    /// The length of `colors` must be `3 * 2^(k+1)` for some `k` in `0..=7`,
    /// otherwise [InvalidPaletteSize](enum.Error.html) is returned.
    pub fn with_colors(colors: &[u8]) -> Result<Self> {
        let len = colors.len();
        for size in 0..8 {
            if CHANNELS << (size + 1) == len {
                let colors = colors.to_vec();
                return Ok(ColorTable { size, colors });
            }
        }
        Err(Error::InvalidPaletteSize(len))
    }

    /// Get the LifeWiki palette (4 entries, gray gridlines)
    pub fn lifewiki() -> Self {
        ColorTable {
            size: 1,
            colors: LIFEWIKI.to_vec(),
        }
    }

    /// Get a black and white palette (2 entries)
    pub fn monochrome() -> Self {
        ColorTable {
            size: 0,
            colors: MONOCHROME.to_vec(),
        }
    }

    /// Get the size field (`0..=7`)
    pub fn size(&self) -> u8 {
        self.size
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        2 << self.size
    }

    /// Check if the table is empty (never true)
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Get the index of the border (gridline) color
    pub fn border_idx(&self) -> u8 {
        (self.len() - 1) as u8
    }

    /// Get the packed RGB triples
    pub fn colors(&self) -> &[u8] {
        &self.colors
    }

    /// Get the LZW minimum code size for image data using this table.
    ///
    /// GIF does not allow code sizes below 2, even for 2-entry tables.
    pub fn min_code_size(&self) -> u8 {
        (self.size + 1).max(2)
    }
}

/// Disposal method of a frame
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DisposalMethod {
    /// No disposal specified
    #[default]
    NoAction,
    /// Leave frame in place
    Keep,
    /// Restore to background color
    Background,
    /// Restore to previous frame
    Previous,
}

impl From<DisposalMethod> for u8 {
    fn from(d: DisposalMethod) -> Self {
        use self::DisposalMethod::*;
        match d {
            NoAction => 0,
            Keep => 1,
            Background => 2,
            Previous => 3,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum BlockCode {
    Header_,
    LogicalScreenDesc_,
    Extension_,
    ImageDesc_,
    Trailer_,
}

impl BlockCode {
    pub fn signature(self) -> &'static [u8] {
        use self::BlockCode::*;
        match self {
            Header_ => b"GIF",
            ImageDesc_ => b",", // (0x2C) Image separator
            Extension_ => b"!", // (0x21) Extension introducer
            Trailer_ => b";",   // (0x3B) GIF trailer
            _ => &[],
        }
    }
    pub fn size(self) -> usize {
        use self::BlockCode::*;
        match self {
            Header_ => 6,
            LogicalScreenDesc_ => 7,
            ImageDesc_ => 10,
            Trailer_ => 1,
            Extension_ => 2, // +sub-blocks
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ExtensionCode {
    GraphicControl_,
    Application_,
}

impl From<ExtensionCode> for u8 {
    fn from(t: ExtensionCode) -> Self {
        use self::ExtensionCode::*;
        match t {
            GraphicControl_ => 0xF9,
            Application_ => 0xFF,
        }
    }
}

/// Header block (signature and version)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    version: [u8; 3],
}

impl Default for Header {
    fn default() -> Self {
        Header { version: *b"89a" }
    }
}

impl Header {
    pub fn version(&self) -> [u8; 3] {
        self.version
    }
}

/// Logical screen descriptor block
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogicalScreenDesc {
    screen_width: u16,
    screen_height: u16,
    flags: u8,
    background_color_idx: u8,
    pixel_aspect_ratio: u8,
}

impl LogicalScreenDesc {
    const COLOR_TABLE_PRESENT: u8 = 0b1000_0000;
    const COLOR_TABLE_SIZE: u8 = 0b0000_0111;

    pub fn with_screen_width(mut self, screen_width: u16) -> Self {
        self.screen_width = screen_width;
        self
    }
    pub fn screen_width(&self) -> u16 {
        self.screen_width
    }
    pub fn with_screen_height(mut self, screen_height: u16) -> Self {
        self.screen_height = screen_height;
        self
    }
    pub fn screen_height(&self) -> u16 {
        self.screen_height
    }
    /// Set flags for a global color table
    pub fn with_color_table(mut self, tbl: &ColorTable) -> Self {
        self.flags =
            Self::COLOR_TABLE_PRESENT | (tbl.size() & Self::COLOR_TABLE_SIZE);
        self
    }
    pub fn flags(&self) -> u8 {
        self.flags
    }
    pub fn background_color_idx(&self) -> u8 {
        self.background_color_idx
    }
    pub fn pixel_aspect_ratio(&self) -> u8 {
        self.pixel_aspect_ratio
    }
}

/// Graphic control extension block
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GraphicControl {
    flags: u8,
    delay_time_cs: u16, // delay in centiseconds (hundredths of a second)
    transparent_color_idx: u8,
}

impl GraphicControl {
    const DISPOSAL_METHOD: u8 = 0b0001_1100;

    pub fn flags(&self) -> u8 {
        self.flags
    }
    pub fn with_disposal_method(mut self, method: DisposalMethod) -> Self {
        let d: u8 = method.into();
        self.flags = (self.flags & !Self::DISPOSAL_METHOD) | (d << 2);
        self
    }
    pub fn delay_time_cs(&self) -> u16 {
        self.delay_time_cs
    }
    pub fn with_delay_time_cs(mut self, delay_time_cs: u16) -> Self {
        self.delay_time_cs = delay_time_cs;
        self
    }
    pub fn transparent_color_idx(&self) -> u8 {
        self.transparent_color_idx
    }
}

/// Application extension block
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Application {
    app_data: Vec<Vec<u8>>, // sequence of sub-blocks
}

impl Application {
    /// Create a NETSCAPE2.0 looping extension (zero loops forever)
    pub fn with_loop_count(loop_count: u16) -> Self {
        let mut v = vec![1];
        v.extend_from_slice(&loop_count.to_le_bytes());
        let app_data = vec![b"NETSCAPE2.0".to_vec(), v];
        Application { app_data }
    }
    pub fn app_data(&self) -> &[Vec<u8>] {
        &self.app_data
    }
    pub fn loop_count(&self) -> Option<u16> {
        let d = &self.app_data;
        // 2 sub-blocks: app ID / auth code, then looping sub-block (ID 1)
        let exists = d.len() == 2
            && d[0] == b"NETSCAPE2.0"
            && d[1].len() == 3
            && d[1][0] == 1;
        if exists {
            Some(u16::from_le_bytes([d[1][1], d[1][2]]))
        } else {
            None
        }
    }
}

/// Image descriptor block
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImageDesc {
    left: u16,
    top: u16,
    width: u16,
    height: u16,
    flags: u8,
}

impl ImageDesc {
    pub fn with_left(mut self, left: u16) -> Self {
        self.left = left;
        self
    }
    pub fn left(&self) -> u16 {
        self.left
    }
    pub fn with_top(mut self, top: u16) -> Self {
        self.top = top;
        self
    }
    pub fn top(&self) -> u16 {
        self.top
    }
    pub fn with_width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }
    pub fn width(&self) -> u16 {
        self.width
    }
    pub fn with_height(mut self, height: u16) -> Self {
        self.height = height;
        self
    }
    pub fn height(&self) -> u16 {
        self.height
    }
    pub fn flags(&self) -> u8 {
        self.flags
    }
}

/// Image data block: compressed LZW stream, already framed in sub-blocks.
///
/// The first byte is the LZW minimum code size and the last is the block
/// terminator, exactly as produced by [lzw::compress](../lzw/fn.compress.html).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    data: Vec<u8>,
}

impl ImageData {
    pub fn with_compressed(data: Vec<u8>) -> Self {
        ImageData { data }
    }
    pub fn min_code_size(&self) -> u8 {
        self.data.first().copied().unwrap_or(2)
    }
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Trailer block
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Trailer {}

/// A block of a GIF animation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Header(Header),
    LogicalScreenDesc(LogicalScreenDesc),
    GlobalColorTable(ColorTable),
    GraphicControl(GraphicControl),
    Application(Application),
    ImageDesc(ImageDesc),
    ImageData(ImageData),
    Trailer(Trailer),
}

impl From<Header> for Block {
    fn from(b: Header) -> Self {
        Block::Header(b)
    }
}

impl From<LogicalScreenDesc> for Block {
    fn from(b: LogicalScreenDesc) -> Self {
        Block::LogicalScreenDesc(b)
    }
}

impl From<ColorTable> for Block {
    fn from(b: ColorTable) -> Self {
        Block::GlobalColorTable(b)
    }
}

impl From<GraphicControl> for Block {
    fn from(b: GraphicControl) -> Self {
        Block::GraphicControl(b)
    }
}

impl From<Application> for Block {
    fn from(b: Application) -> Self {
        Block::Application(b)
    }
}

impl From<ImageDesc> for Block {
    fn from(b: ImageDesc) -> Self {
        Block::ImageDesc(b)
    }
}

impl From<ImageData> for Block {
    fn from(b: ImageData) -> Self {
        Block::ImageData(b)
    }
}

impl From<Trailer> for Block {
    fn from(b: Trailer) -> Self {
        Block::Trailer(b)
    }
}

/// Blocks of one animation frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub graphic_control_ext: GraphicControl,
    pub image_desc: ImageDesc,
    pub image_data: ImageData,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn color_table_sizes() {
        for k in 0..8 {
            let len = 3 * (2 << k);
            let t = ColorTable::with_colors(&vec![0; len]).unwrap();
            assert_eq!(t.size(), k as u8);
            assert_eq!(t.colors().len(), 3 * (2 << t.size()));
            assert_eq!(t.len(), 2 << k);
            assert_eq!(t.border_idx() as usize, t.len() - 1);
        }
    }

    #[test]
    fn color_table_invalid() {
        for len in [0, 3, 5, 9, 12 + 3, 18, 24 + 1, 1536] {
            match ColorTable::with_colors(&vec![0; len]) {
                Err(Error::InvalidPaletteSize(n)) => assert_eq!(n, len),
                r => panic!("unexpected {:?} for {}", r, len),
            }
        }
    }

    #[test]
    fn named_palettes() {
        let t = ColorTable::lifewiki();
        assert_eq!(t, ColorTable::with_colors(&LIFEWIKI).unwrap());
        assert_eq!(t.border_idx(), 3);
        assert_eq!(&t.colors()[9..], &[0xC6, 0xC6, 0xC6]);
        assert_eq!(t.min_code_size(), 2);
        let t = ColorTable::monochrome();
        assert_eq!(t.size(), 0);
        assert_eq!(t.border_idx(), 1);
        assert_eq!(t.min_code_size(), 2);
        let t = ColorTable::with_colors(&[0; 768]).unwrap();
        assert_eq!(t.min_code_size(), 8);
    }

    #[test]
    fn screen_desc_flags() {
        let d = LogicalScreenDesc::default()
            .with_color_table(&ColorTable::lifewiki());
        assert_eq!(d.flags(), 0x81);
        let d = LogicalScreenDesc::default()
            .with_color_table(&ColorTable::monochrome());
        assert_eq!(d.flags(), 0x80);
    }

    #[test]
    fn disposal_flags() {
        let g = GraphicControl::default()
            .with_disposal_method(DisposalMethod::Background);
        assert_eq!(g.flags(), 0b0000_1000);
        let g = g.with_disposal_method(DisposalMethod::NoAction);
        assert_eq!(g.flags(), 0);
    }

    #[test]
    fn loop_count() {
        let b = Application::default();
        assert_eq!(b.loop_count(), None);
        let b = Application::with_loop_count(0);
        assert_eq!(b.loop_count(), Some(0));
        let b = Application::with_loop_count(0x0102);
        assert_eq!(b.app_data()[1], vec![1, 0x02, 0x01]);
        assert_eq!(b.loop_count(), Some(0x0102));
    }
}
