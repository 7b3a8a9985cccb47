#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

/// Environment variable access with substitution tracking.
pub mod env;

mod error;
pub use error::{CoreError, CoreResult};

/// Polygon query and GeoJSON assembly.
pub mod polygons;

/// `PostgreSQL` connection handling.
#[cfg(feature = "postgres")]
pub mod postgres;
