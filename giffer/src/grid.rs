// grid.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Cell grid access
use crate::error::{Error, Result};

/// An unbounded grid of cells with a simulation clock.
///
/// Any integer coordinate can be sampled; cells outside of the live area
/// report the background state.
pub trait CellGrid {
    /// Get the state (palette index) of the cell at `(x, y)`
    fn cell_state(&self, x: i64, y: i64) -> u8;

    /// Advance the simulation by a number of generations
    fn advance(&mut self, generations: u64);
}

impl<G: CellGrid + ?Sized> CellGrid for &mut G {
    fn cell_state(&self, x: i64, y: i64) -> u8 {
        (**self).cell_state(x, y)
    }

    fn advance(&mut self, generations: u64) {
        (**self).advance(generations)
    }
}

/// Rectangular region of a grid to render, in cells
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    /// Left cell
    pub x: i64,
    /// Top cell
    pub y: i64,
    /// Width in cells
    pub width: u32,
    /// Height in cells
    pub height: u32,
}

impl Selection {
    /// Maximum width / height (GIF dimensions are 16-bit)
    const MAX_DIM: u32 = u16::MAX as u32;

    /// Create a new selection
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Selection {
            x,
            y,
            width,
            height,
        }
    }

    /// Check a selection from the grid's owner.
    ///
    /// `None` or a zero-sized region is [EmptySelection], while dimensions
    /// of 65536 or more are [CanvasTooLarge].
    ///
    /// [EmptySelection]: enum.Error.html#variant.EmptySelection
    /// [CanvasTooLarge]: enum.Error.html#variant.CanvasTooLarge
    pub fn validate(selection: Option<Selection>) -> Result<Selection> {
        match selection {
            None => Err(Error::EmptySelection),
            Some(s) if s.width == 0 || s.height == 0 => {
                Err(Error::EmptySelection)
            }
            Some(s) if s.width > Self::MAX_DIM || s.height > Self::MAX_DIM => {
                Err(Error::CanvasTooLarge)
            }
            Some(s) => Ok(s),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn validate() {
        assert!(matches!(
            Selection::validate(None),
            Err(Error::EmptySelection)
        ));
        assert!(matches!(
            Selection::validate(Some(Selection::new(0, 0, 0, 5))),
            Err(Error::EmptySelection)
        ));
        assert!(matches!(
            Selection::validate(Some(Selection::new(0, 0, 65536, 5))),
            Err(Error::CanvasTooLarge)
        ));
        assert!(matches!(
            Selection::validate(Some(Selection::new(0, 0, 5, 65536))),
            Err(Error::CanvasTooLarge)
        ));
        let s = Selection::new(-3, 4, 65535, 1);
        assert_eq!(Selection::validate(Some(s)).unwrap(), s);
    }
}
