use url::Url;

/// A convenience [`Result`] for the map library.
pub type MapResult<T> = Result<T, MapError>;

#[derive(thiserror::Error, Debug)]
pub enum MapError {
    #[error("A map needs a non-empty container id")]
    MissingContainer,

    #[error("The map canvas has already been torn down")]
    TornDown,

    #[error("Unknown category '{0}', expected one of: {1}")]
    UnknownCategory(String, String),

    #[error("Unknown region '{0}', expected one of: {1}")]
    UnknownRegion(String, String),

    #[error("Unable to parse API base URL {1}: {0}")]
    InvalidApiUrl(#[source] url::ParseError, String),

    #[error("Unable to fetch polygons from {1}: {0}")]
    FetchError(#[source] reqwest::Error, Url),

    #[error("Polygon request to {1} failed with HTTP {0}")]
    BadStatus(reqwest::StatusCode, Url),
}
