use std::path::PathBuf;
use thiserror::Error;

/// Errors generated by the server.
#[derive(Debug, Error)]
pub enum Error {
    /// Config file path is not a file.
    #[error("path {0} is not a file")]
    NotFile(PathBuf),

    /// Config file already exists.
    #[error("file {0} already exists")]
    FileExists(PathBuf),

    /// Error generated by the core library.
    #[error(transparent)]
    Core(#[from] svr_core::Error),

    /// Error generated by the database layer.
    #[error(transparent)]
    Database(#[from] svr_database::Error),

    /// Error generated by the recovery library.
    #[error(transparent)]
    Recovery(#[from] svr_recovery::Error),

    /// Error generated by input and output.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Error deserializing TOML.
    #[error(transparent)]
    TomlDeser(#[from] toml::de::Error),

    /// Error serializing TOML.
    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),

    /// Error parsing a socket address.
    #[error(transparent)]
    AddrParse(#[from] std::net::AddrParseError),

    /// Error converting a header value.
    #[error(transparent)]
    HeaderValue(#[from] axum::http::header::InvalidHeaderValue),

    /// Error parsing a URL.
    #[error(transparent)]
    UrlParse(#[from] url::ParseError),

    /// Error serializing JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
