//! Embedded schema migrations for the recovery tables.
//!
//! `sql_migrations/V1__recovery_tables.sql` creates the `owners`,
//! `guardians`, `recovery_shards` and `recovery_requests` tables.
use crate::{Error, Result};
use async_sqlite::Client;
use refinery::Report;
use tokio::sync::oneshot;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("sql_migrations");
}

/// Bring a client's schema up to date.
///
/// Refinery runs synchronously on the connection, so the report is
/// handed back over a oneshot channel.
pub async fn migrate_client(client: &mut Client) -> Result<Report> {
    let (report_tx, report_rx) =
        oneshot::channel::<std::result::Result<Report, refinery::Error>>();
    client
        .conn_mut(move |conn| {
            let outcome = embedded::migrations::runner().run(conn);
            let _ = report_tx.send(outcome);
            Ok(())
        })
        .await?;

    let report =
        report_rx.await.map_err(|_| Error::NoMigrationReport)??;
    for migration in report.applied_migrations() {
        tracing::debug!(
            version = %migration.version(),
            name = %migration.name(),
            "database::migration_applied",
        );
    }
    Ok(report)
}
