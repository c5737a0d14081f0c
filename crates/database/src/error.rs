use thiserror::Error;

/// Errors generated by the database layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Error generated by the core library.
    #[error(transparent)]
    Core(#[from] svr_core::Error),

    /// Error generated by the database client.
    #[error(transparent)]
    Client(#[from] async_sqlite::Error),

    /// Error generated by the underlying connection.
    #[error(transparent)]
    Sql(#[from] async_sqlite::rusqlite::Error),

    /// Error generated running migrations.
    #[error(transparent)]
    Migration(#[from] refinery::Error),

    /// The migration report never came back from the client.
    #[error("no migration report received")]
    NoMigrationReport,

    /// Error parsing a stored identifier.
    #[error(transparent)]
    Uuid(#[from] uuid::Error),
}
