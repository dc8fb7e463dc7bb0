// raster.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Rendering cell grids into indexed rasters
use crate::block::ColorTable;
use crate::error::{Error, Result};
use crate::grid::{CellGrid, Selection};
use pix::gray::Gray8;
use pix::Raster;

/// Pixel layout of cells and gridlines
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellLayout {
    /// Width / height of one cell, excluding gridlines
    pure_cell_px: u32,
    /// Width of gridlines
    grid_line_px: u32,
}

impl CellLayout {
    /// Create a new cell layout
    pub fn new(pure_cell_px: u32, grid_line_px: u32) -> Self {
        CellLayout {
            pure_cell_px,
            grid_line_px,
        }
    }

    /// Get the cell size, excluding gridlines
    pub fn pure_cell_px(self) -> u32 {
        self.pure_cell_px
    }

    /// Get the gridline width
    pub fn grid_line_px(self) -> u32 {
        self.grid_line_px
    }

    /// Get the distance between neighboring cells
    pub fn cell_px(self) -> u32 {
        self.pure_cell_px + self.grid_line_px
    }

    /// Get the pixel length spanned by a number of cells.
    ///
    /// Includes the gridline on both ends.
    fn span_px(self, cells: u32) -> u64 {
        u64::from(self.cell_px()) * u64::from(cells)
            + u64::from(self.grid_line_px)
    }

    /// Get the canvas size for a selection.
    ///
    /// Fails with [CanvasTooLarge] if either dimension does not fit in 16
    /// bits.
    ///
    /// [CanvasTooLarge]: ../enum.Error.html#variant.CanvasTooLarge
    pub fn canvas_size(self, selection: &Selection) -> Result<(u16, u16)> {
        let width = self.span_px(selection.width);
        let height = self.span_px(selection.height);
        match (u16::try_from(width), u16::try_from(height)) {
            (Ok(w), Ok(h)) => Ok((w, h)),
            _ => {
                warn!("canvas {}x{} too large", width, height);
                Err(Error::CanvasTooLarge)
            }
        }
    }
}

/// Offset split into whole cells and remaining pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SplitOffset {
    cells: i64,
    px: u32,
}

impl SplitOffset {
    fn new(offset_px: i64, cell_px: u32) -> Self {
        let cell_px = i64::from(cell_px);
        SplitOffset {
            cells: offset_px.div_euclid(cell_px),
            px: offset_px.rem_euclid(cell_px) as u32,
        }
    }
}

/// Frame rasterizer for a selection of cells
#[derive(Clone, Debug)]
pub struct Rasterizer {
    /// Selected region
    selection: Selection,
    /// Cell layout
    layout: CellLayout,
    /// Canvas width
    width: u16,
    /// Canvas height
    height: u16,
    /// Border (gridline) color
    border: Gray8,
    /// Number of colors in palette
    n_colors: usize,
}

impl Rasterizer {
    /// Create a rasterizer.
    ///
    /// Gridlines use the border color of `table`.
    pub fn new(
        selection: Selection,
        layout: CellLayout,
        table: &ColorTable,
    ) -> Result<Self> {
        if layout.pure_cell_px() == 0 {
            return Err(Error::InvalidParameter("cell size is zero".into()));
        }
        let (width, height) = layout.canvas_size(&selection)?;
        Ok(Rasterizer {
            selection,
            layout,
            width,
            height,
            border: Gray8::new(table.border_idx()),
            n_colors: table.len(),
        })
    }

    /// Get the canvas width
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Get the canvas height
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Render one frame, panned by a pixel offset.
    ///
    /// The canvas is cut from an over-sized raster holding one extra column
    /// and row of cells, starting at the sub-cell part of the offset.  The
    /// whole-cell part shifts which cells are sampled.
    pub fn rasterize<G: CellGrid + ?Sized>(
        &self,
        grid: &G,
        offset_px: (i64, i64),
    ) -> Result<Raster<Gray8>> {
        let cell_px = self.layout.cell_px();
        let ox = SplitOffset::new(offset_px.0, cell_px);
        let oy = SplitOffset::new(offset_px.1, cell_px);
        trace!("rasterize: offset {:?} {:?}", ox, oy);
        let x = self.selection.x + ox.cells;
        let y = self.selection.y + oy.cells;
        let over = self.oversize(grid, x, y)?;
        Ok(crop(
            &over,
            ox.px,
            oy.px,
            u32::from(self.width),
            u32::from(self.height),
        ))
    }

    /// Render an over-sized raster with top-left cell at `(x, y)`
    fn oversize<G: CellGrid + ?Sized>(
        &self,
        grid: &G,
        x: i64,
        y: i64,
    ) -> Result<Raster<Gray8>> {
        let cols = self.selection.width + 1;
        let rows = self.selection.height + 1;
        let width = self.layout.span_px(cols) as usize;
        let height = self.layout.span_px(rows) as usize;
        let cell_px = self.layout.cell_px() as usize;
        let pure_px = self.layout.pure_cell_px() as usize;
        let line_px = self.layout.grid_line_px() as usize;
        let mut pixels = vec![self.border; width * height];
        let mut row_px = vec![self.border; width];
        for r in 0..rows {
            for c in 0..cols {
                let state = grid.cell_state(x + i64::from(c), y + i64::from(r));
                if usize::from(state) >= self.n_colors {
                    warn!("cell state {} has no color", state);
                    return Err(Error::InvalidColorIndex);
                }
                let left = line_px + c as usize * cell_px;
                row_px[left..left + pure_px].fill(Gray8::new(state));
            }
            let top = line_px + r as usize * cell_px;
            for py in top..top + pure_px {
                let start = py * width;
                pixels[start..start + width].copy_from_slice(&row_px);
            }
        }
        Ok(Raster::with_pixels(width as u32, height as u32, pixels))
    }
}

/// Copy a region out of a raster
fn crop(
    raster: &Raster<Gray8>,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Raster<Gray8> {
    debug_assert!(x + width <= raster.width());
    debug_assert!(y + height <= raster.height());
    let stride = raster.width() as usize;
    let src = raster.pixels();
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for py in y as usize..(y + height) as usize {
        let start = py * stride + x as usize;
        pixels.extend_from_slice(&src[start..start + width as usize]);
    }
    Raster::with_pixels(width, height, pixels)
}

#[cfg(test)]
mod test {
    use super::*;

    /// Static checkerboard grid (alive where x + y is even)
    struct Checker;

    impl CellGrid for Checker {
        fn cell_state(&self, x: i64, y: i64) -> u8 {
            ((x + y).rem_euclid(2) == 0) as u8
        }
        fn advance(&mut self, _generations: u64) {}
    }

    /// Grid with a single live cell at the origin
    struct Dot;

    impl CellGrid for Dot {
        fn cell_state(&self, x: i64, y: i64) -> u8 {
            (x == 0 && y == 0) as u8
        }
        fn advance(&mut self, _generations: u64) {}
    }

    fn indices(raster: &Raster<Gray8>) -> Vec<u8> {
        raster.as_u8_slice().to_vec()
    }

    #[test]
    fn canvas_size() {
        let layout = CellLayout::new(14, 2);
        let sel = Selection::new(0, 0, 4681, 1);
        assert!(matches!(
            layout.canvas_size(&sel),
            Err(Error::CanvasTooLarge)
        ));
        let sel = Selection::new(0, 0, 10, 5);
        assert_eq!(layout.canvas_size(&sel).unwrap(), (162, 82));
        let layout = CellLayout::new(1, 0);
        let sel = Selection::new(0, 0, 65535, 2);
        assert_eq!(layout.canvas_size(&sel).unwrap(), (65535, 2));
        let layout = CellLayout::new(1, 1);
        let sel = Selection::new(0, 0, 32767, 2);
        assert_eq!(layout.canvas_size(&sel).unwrap(), (65535, 5));
        let sel = Selection::new(0, 0, 32768, 2);
        assert!(layout.canvas_size(&sel).is_err());
    }

    #[test]
    fn split_offset() {
        assert_eq!(SplitOffset::new(0, 10), SplitOffset { cells: 0, px: 0 });
        assert_eq!(SplitOffset::new(25, 10), SplitOffset { cells: 2, px: 5 });
        assert_eq!(SplitOffset::new(-3, 10), SplitOffset { cells: -1, px: 7 });
        assert_eq!(SplitOffset::new(-20, 10), SplitOffset { cells: -2, px: 0 });
    }

    #[test]
    fn gridlines() {
        let table = ColorTable::lifewiki();
        let sel = Selection::new(0, 0, 2, 1);
        let rast = Rasterizer::new(sel, CellLayout::new(2, 1), &table).unwrap();
        assert_eq!((rast.width(), rast.height()), (7, 4));
        let r = rast.rasterize(&Dot, (0, 0)).unwrap();
        #[rustfmt::skip]
        assert_eq!(indices(&r), [
            3, 3, 3, 3, 3, 3, 3,
            3, 1, 1, 3, 0, 0, 3,
            3, 1, 1, 3, 0, 0, 3,
            3, 3, 3, 3, 3, 3, 3,
        ]);
    }

    #[test]
    fn sub_cell_offset() {
        let table = ColorTable::lifewiki();
        let sel = Selection::new(0, 0, 2, 1);
        let rast = Rasterizer::new(sel, CellLayout::new(2, 1), &table).unwrap();
        let r = rast.rasterize(&Dot, (1, 2)).unwrap();
        #[rustfmt::skip]
        assert_eq!(indices(&r), [
            1, 1, 3, 0, 0, 3, 0,
            3, 3, 3, 3, 3, 3, 3,
            0, 0, 3, 0, 0, 3, 0,
            0, 0, 3, 0, 0, 3, 0,
        ]);
        // negative offsets sample cells left / above the selection
        let r = rast.rasterize(&Dot, (-3, 0)).unwrap();
        #[rustfmt::skip]
        assert_eq!(indices(&r), [
            3, 3, 3, 3, 3, 3, 3,
            3, 0, 0, 3, 1, 1, 3,
            3, 0, 0, 3, 1, 1, 3,
            3, 3, 3, 3, 3, 3, 3,
        ]);
    }

    #[test]
    fn pan_one_cell() {
        let table = ColorTable::monochrome();
        let sel = Selection::new(0, 0, 6, 4);
        let rast =
            Rasterizer::new(sel, CellLayout::new(10, 0), &table).unwrap();
        let first = rast.rasterize(&Checker, (0, 0)).unwrap();
        let last = rast.rasterize(&Checker, (10, 0)).unwrap();
        let w = usize::from(rast.width());
        let a = indices(&first);
        let b = indices(&last);
        for (ra, rb) in a.chunks(w).zip(b.chunks(w)) {
            assert_eq!(&rb[..w - 10], &ra[10..]);
        }
        assert_ne!(a, b);
    }

    #[test]
    fn invalid_state() {
        struct Wild;
        impl CellGrid for Wild {
            fn cell_state(&self, _x: i64, _y: i64) -> u8 {
                4
            }
            fn advance(&mut self, _generations: u64) {}
        }
        let table = ColorTable::lifewiki();
        let sel = Selection::new(0, 0, 1, 1);
        let rast = Rasterizer::new(sel, CellLayout::new(1, 0), &table).unwrap();
        assert!(matches!(
            rast.rasterize(&Wild, (0, 0)),
            Err(Error::InvalidColorIndex)
        ));
    }
}
