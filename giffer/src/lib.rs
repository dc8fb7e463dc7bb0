// lib.rs      giffer crate.
//
// Copyright (c) 2025  Douglas Lau
//
//! Animated GIF encoding for cellular automaton patterns.
//!
//! An [AnimationEnc] renders a [Selection] of a [CellGrid] into frames,
//! compresses them and assembles a looping GIF89a file.
//!
//! [AnimationEnc]: struct.AnimationEnc.html
//! [CellGrid]: trait.CellGrid.html
//! [Selection]: struct.Selection.html
#![forbid(unsafe_code)]

#[macro_use]
extern crate log;

mod animate;
pub mod block;
mod encode;
mod error;
mod grid;
pub mod lzw;
mod raster;

pub use crate::animate::{AnimationEnc, AnimationParams, Progress};
pub use crate::block::ColorTable;
pub use crate::encode::BlockEnc;
pub use crate::error::{Error, Result};
pub use crate::grid::{CellGrid, Selection};
pub use crate::raster::{CellLayout, Rasterizer};
