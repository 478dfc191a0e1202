//! Tree-to-tree transformations.
//!
//! Passes take the input tree by reference and return an independent tree.
//! The input is never mutated.

pub mod tiling;

pub use tiling::{tile, tile_with, TileOptions};
