//! Core traits and types for skyloong-sync board abstraction.
//!
//! This crate provides:
//! - Feature traits (`HasPerKeyRgb`) that boards can implement
//! - The `Board` trait with `as_*()` methods for feature discovery
//! - Common types like `BoardInfo`, `Rgb`, `MatrixMap` and the shared `BoardError`

mod board;
mod color;
mod features;

pub use board::{Board, BoardInfo};
pub use color::{MatrixMap, Rgb};
pub use features::{BoardError, HasPerKeyRgb, LedInfo, Result};
