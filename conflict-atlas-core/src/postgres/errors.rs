use std::io;
use std::path::PathBuf;

use deadpool_postgres::tokio_postgres::Error as TokioPgError;
use deadpool_postgres::{BuildError, PoolError};
use semver::Version;

/// A convenience [`Result`] for `PostgreSQL` operations.
pub type PostgresResult<T> = Result<T, PostgresError>;

/// Errors that can occur while connecting to or querying `PostgreSQL`.
#[derive(thiserror::Error, Debug)]
pub enum PostgresError {
    /// Platform root certificates could not be loaded.
    #[error("Cannot load platform root certificates: {0:?}")]
    CannotLoadRoots(Vec<rustls_native_certs::Error>),

    /// A certificate file could not be opened.
    #[error("Cannot open certificate file {path}: {0}", path = .1.display())]
    CannotOpenCert(#[source] io::Error, PathBuf),

    /// A certificate file could not be parsed.
    #[error("Cannot parse certificate file {path}: {0}", path = .1.display())]
    CannotParseCert(#[source] io::Error, PathBuf),

    /// The private key file does not contain a supported key.
    #[error("Unable to parse PEM private key file {path}", path = .0.display())]
    InvalidPrivateKey(PathBuf),

    /// The client certificate and key could not be used together.
    #[error("Unable to use client certificate pair {cert} / {key}: {0}", cert = .1.display(), key = .2.display())]
    CannotUseClientKey(#[source] rustls::Error, PathBuf, PathBuf),

    /// A generic TLS error.
    #[error(transparent)]
    RustlsError(#[from] rustls::Error),

    /// The connection string asked for an SSL mode we cannot honor.
    #[error("Unknown SSL mode: {0:?}")]
    UnknownSslMode(deadpool_postgres::tokio_postgres::config::SslMode),

    /// A query failed.
    #[error("Postgres error while {1}: {0}")]
    PostgresError(#[source] TokioPgError, &'static str),

    /// The connection pool could not be built.
    #[error("Unable to build a Postgres connection pool {1}: {0}")]
    PostgresPoolBuildError(#[source] BuildError, String),

    /// No connection could be taken from the pool.
    #[error("Unable to get a Postgres connection from the pool {1}: {0}")]
    PostgresPoolConnError(#[source] PoolError, String),

    /// The connection string is malformed.
    #[error("Unable to parse connection string {1}: {0}")]
    BadConnectionString(#[source] TokioPgError, String),

    /// The reported `PostGIS` version is not semver-like.
    #[error("Unable to parse PostGIS version {1}: {0}")]
    BadPostgisVersion(#[source] semver::Error, String),

    /// The reported `PostgreSQL` version is not semver-like.
    #[error("Unable to parse PostgreSQL version {1}: {0}")]
    BadPostgresVersion(#[source] semver::Error, String),

    /// `PostGIS` is older than the minimum we support.
    #[error("PostGIS version {0} is too old, minimum required is {1}")]
    PostgisTooOld(Version, Version),

    /// `PostgreSQL` is older than the minimum we support.
    #[error("PostgreSQL version {0} is too old, minimum required is {1}")]
    PostgresqlTooOld(Version, Version),

    /// An identifier in the polygon query configuration cannot be quoted safely.
    #[error("Invalid SQL identifier {0:?} in the polygon query configuration")]
    InvalidIdentifier(String),
}
