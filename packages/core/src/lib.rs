#![deny(clippy::all)]

//! Angular Core Runtime
//!
//! Incremental rendering runtime for compiled templates. A template is described once by a
//! static `TNode` graph (shared by every instance) and rendered into per-instance `LView`
//! slot arrays, with all native mutation going through a pluggable [`render3::Renderer`].

mod config;
mod error;
pub mod render3;
pub mod util;

pub use config::RuntimeConfig;
pub use error::{Result, RuntimeError};
