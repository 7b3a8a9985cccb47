use std::fmt::Write as _;
use std::io;

/// A convenience [`Result`] for the Conflict Atlas server.
pub type AtlasResult<T> = Result<T, AtlasError>;

fn elide_vec(vec: &[String], max_items: usize, max_len: usize) -> String {
    let mut s = String::new();
    for (i, v) in vec.iter().enumerate() {
        if i > max_items {
            let _ = write!(s, " and {} more", vec.len() - i);
            break;
        }
        if i > 0 {
            s.push(' ');
        }
        match v.char_indices().nth(max_len) {
            Some((end, _)) => {
                s.push_str(&v[..end]);
                s.push('…');
            }
            None => s.push_str(v),
        }
    }
    s
}

#[derive(thiserror::Error, Debug)]
pub enum AtlasError {
    #[error("The --config and the connection parameters cannot be used together. Please remove unsupported parameters '{}'", elide_vec(.0, 3, 15))]
    ConfigAndConnectionsError(Vec<String>),

    #[error("Unrecognizable connection strings: {}", elide_vec(.0, 3, 15))]
    UnrecognizableConnections(Vec<String>),

    #[error("Only one database connection is supported, but {} were given: {}", .0.len(), elide_vec(.0, 3, 15))]
    MultipleConnections(Vec<String>),

    #[error("Unable to bind to {1}: {0}")]
    BindingError(#[source] io::Error, String),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] conflict_atlas_core::postgres::PostgresError),

    #[error(transparent)]
    CoreError(#[from] conflict_atlas_core::CoreError),

    #[error(transparent)]
    ConfigFileError(#[from] crate::config::file::ConfigFileError),

    #[error("Unable to install the tracing subscriber: {0}")]
    TracingInitError(#[from] tracing::dispatcher::SetGlobalDefaultError),

    #[error("Unable to forward log records to tracing: {0}")]
    LogBridgeError(#[from] log::SetLoggerError),

    #[error(transparent)]
    WebError(#[from] actix_web::Error),

    #[error(transparent)]
    IoError(#[from] io::Error),
}
