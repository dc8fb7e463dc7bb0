// encode.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! GIF block encoding
use crate::block::*;
use crate::error::Result;
use std::io::Write;

/// Block encoder: writes [Block]s with their exact byte layout.
///
/// [Block]: block/enum.Block.html
pub struct BlockEnc<W: Write> {
    /// Writer for output data
    writer: W,
}

impl<W: Write> BlockEnc<W> {
    /// Create a new block encoder
    pub fn new(writer: W) -> Self {
        BlockEnc { writer }
    }

    /// Encode one block
    pub fn encode<B: Into<Block>>(&mut self, block: B) -> Result<()> {
        self.encode_block(&block.into())
    }

    /// Encode one block by reference
    pub fn encode_block(&mut self, block: &Block) -> Result<()> {
        use crate::block::Block::*;
        let w = &mut self.writer;
        match block {
            Header(b) => b.format(w),
            LogicalScreenDesc(b) => b.format(w),
            GlobalColorTable(b) => b.format(w),
            GraphicControl(b) => b.format(w),
            Application(b) => b.format(w),
            ImageDesc(b) => b.format(w),
            ImageData(b) => b.format(w),
            Trailer(b) => b.format(w),
        }
    }

    /// Encode the blocks of one frame
    pub fn encode_frame(&mut self, frame: &Frame) -> Result<()> {
        let w = &mut self.writer;
        frame.graphic_control_ext.format(w)?;
        frame.image_desc.format(w)?;
        frame.image_data.format(w)
    }

    /// Get the inner writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl Header {
    fn format<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(BlockCode::Header_.signature())?;
        w.write_all(&self.version())?;
        Ok(())
    }
}

impl LogicalScreenDesc {
    fn format<W: Write>(&self, w: &mut W) -> Result<()> {
        let mut buf = Vec::with_capacity(BlockCode::LogicalScreenDesc_.size());
        buf.extend_from_slice(&self.screen_width().to_le_bytes());
        buf.extend_from_slice(&self.screen_height().to_le_bytes());
        buf.push(self.flags());
        buf.push(self.background_color_idx());
        buf.push(self.pixel_aspect_ratio());
        w.write_all(&buf)?;
        Ok(())
    }
}

impl ColorTable {
    fn format<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(self.colors())?;
        Ok(())
    }
}

impl GraphicControl {
    fn format<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(BlockCode::Extension_.signature())?;
        let mut buf = Vec::with_capacity(7);
        buf.push(ExtensionCode::GraphicControl_.into());
        buf.push(4); // block size
        buf.push(self.flags());
        buf.extend_from_slice(&self.delay_time_cs().to_le_bytes());
        buf.push(self.transparent_color_idx());
        buf.push(0); // block terminator
        w.write_all(&buf)?;
        Ok(())
    }
}

impl Application {
    fn format<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(BlockCode::Extension_.signature())?;
        w.write_all(&[ExtensionCode::Application_.into()])?;
        for c in self.app_data() {
            debug_assert!(c.len() < 256);
            let len = c.len() as u8;
            w.write_all(&[len])?; // block size
            w.write_all(c)?;
        }
        w.write_all(&[0])?; // block terminator
        Ok(())
    }
}

impl ImageDesc {
    fn format<W: Write>(&self, w: &mut W) -> Result<()> {
        let mut buf = Vec::with_capacity(BlockCode::ImageDesc_.size());
        buf.extend_from_slice(BlockCode::ImageDesc_.signature());
        buf.extend_from_slice(&self.left().to_le_bytes());
        buf.extend_from_slice(&self.top().to_le_bytes());
        buf.extend_from_slice(&self.width().to_le_bytes());
        buf.extend_from_slice(&self.height().to_le_bytes());
        buf.push(self.flags());
        w.write_all(&buf)?;
        Ok(())
    }
}

impl ImageData {
    fn format<W: Write>(&self, w: &mut W) -> Result<()> {
        // already framed: min code size, sub-blocks and terminator
        w.write_all(self.data())?;
        Ok(())
    }
}

impl Trailer {
    fn format<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(BlockCode::Trailer_.signature())?;
        Ok(())
    }
}
