/// Errors produced by the geometry query service.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    /// Errors that can occur while talking to [`postgres`](crate::postgres).
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] crate::postgres::PostgresError),

    /// A row carried a geometry that is not valid `GeoJSON`.
    #[error("Row {1} has an invalid GeoJSON geometry: {0}")]
    InvalidGeometry(#[source] Box<geojson::Error>, i64),

    /// Errors occurring from other geometry providers, not implemented by this crate.
    #[error(transparent)]
    OtherError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A convenience [`Result`] for the geometry query service.
pub type CoreResult<T> = Result<T, CoreError>;
