use crate::notifier::NotificationError;
use thiserror::Error;

/// Errors generated by the recovery library.
#[derive(Debug, Error)]
pub enum Error {
    /// A shard payload names an email with no invited guardian.
    #[error("guardian {0} has not been invited")]
    GuardianNotFound(String),

    /// A guardian was already invited with this email.
    #[error("guardian {0} is already invited")]
    GuardianAlreadyInvited(String),

    /// Two shard payloads name the same guardian.
    #[error("duplicate shard for guardian {0}")]
    DuplicateGuardian(String),

    /// Caller is not an authenticated owner.
    #[error("unauthorized")]
    Unauthorized,

    /// Token or request lookup failed.
    ///
    /// Deliberately conflates unknown, already-used and already
    /// terminal so the unauthenticated cancel surface cannot be used
    /// as an oracle.
    #[error("recovery request not found or already used")]
    NotFoundOrAlreadyUsed,

    /// A recovery kit carries a fixed number of guardian shards.
    #[error("expected exactly {0} guardian shards")]
    ShardCount(usize),

    /// Error generated by the core library.
    #[error(transparent)]
    Core(#[from] svr_core::Error),

    /// Error generated by the database layer.
    #[error(transparent)]
    Database(#[from] svr_database::Error),

    /// Error generated by the database client.
    #[error(transparent)]
    Client(#[from] async_sqlite::Error),

    /// Error generated by SQLite.
    #[error(transparent)]
    Sql(#[from] async_sqlite::rusqlite::Error),

    /// Error delivering a notification.
    #[error(transparent)]
    Notification(#[from] NotificationError),
}
