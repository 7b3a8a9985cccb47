#[cfg(feature = "postgres")]
mod pg;
#[cfg(feature = "postgres")]
pub use pg::PgArgs;

mod root;
pub use root::*;

mod srv;
pub use srv::SrvArgs;
