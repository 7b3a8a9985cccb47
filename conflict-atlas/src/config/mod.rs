pub mod args;
pub mod file;
