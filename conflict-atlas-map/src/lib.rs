#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

mod error;
pub use error::{MapError, MapResult};

/// Engine abstraction and the plain data types exchanged with it
pub mod renderer;

/// Owned map handle and its viewport operations
pub mod canvas;

/// Event categories and their paint rules
pub mod style;

/// Single-select category state
pub mod filter;

pub mod popup;

/// Vector-tile overlay with one layer per category
pub mod vector_tiles;

/// World-polygon overlay fed by the HTTP API
pub mod geojson_overlay;

pub mod regions;
