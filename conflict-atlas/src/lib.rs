#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

pub mod config;

mod error;
pub use error::{AtlasError, AtlasResult};

pub mod logging;
pub mod srv;
