//! Library code for the fractal generators.
//!
//! Four independent generator families live here:
//! - [`curve`]: self-similar subdivision of line segments (Koch, Minkowski).
//! - [`lsystem`]: L-system rewriting and a turtle interpreter.
//! - [`ifs`]: iterated-function-system attractors sampled by the chaos game.
//! - [`escape`]: escape-time fields for the Mandelbrot and Julia sets.
//!
//! Every generator takes plain parameters and returns plain numbers:
//! a polyline, a point cloud or a grid of counts. Drawing them is up to the caller.

pub mod curve;
pub mod escape;
pub mod ifs;
pub mod lsystem;
pub mod numeric;

pub use numeric::{FromRational, Point, Polyline};

/// A pair of integer (width, height) dimensions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Size {
    pub width: usize,
    pub height: usize,
}

impl Size {
    pub fn new(width: usize, height: usize) -> Self {
        Size { width, height }
    }
}

/// Errors reported by the generators.
///
/// All of these are caller-input problems; nothing is retried or recovered internally.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unbalanced bracket: ']' at offset {offset} with no saved turtle state")]
    UnbalancedBracket { offset: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn invalid<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::InvalidInput(msg.into()))
}
