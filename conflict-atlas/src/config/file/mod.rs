mod file_config;
pub use file_config::*;

mod main;
pub use main::*;

pub mod cors;
pub mod map;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod srv;

mod error;
pub use error::{ConfigFileError, ConfigFileResult};
