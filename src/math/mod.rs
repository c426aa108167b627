//! Mathematical utilities and data structures

pub mod rect;
pub mod scalar;

pub use rect::Rect;
