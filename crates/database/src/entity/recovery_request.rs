use crate::{Error, Result};
use async_sqlite::rusqlite::{
    Connection, Error as SqlError, OptionalExtension, Row,
};
use sql_query_builder as sql;
use std::ops::Deref;
use svr_core::{RecoveryRequestId, RequestStatus, UtcDateTime};

fn request_select_columns(sql: sql::Select) -> sql::Select {
    sql.select(
        r#"
            request_id,
            identifier,
            owner_id,
            requested_at,
            timelock_until,
            status,
            cancel_token_hash
        "#,
    )
}

/// Recovery request row from the database.
#[derive(Debug, Default)]
pub struct RecoveryRequestRow {
    /// Row identifier.
    pub row_id: i64,
    /// Request identifier.
    pub identifier: String,
    /// Owner row identifier.
    pub owner_id: i64,
    /// RFC3339 date and time.
    requested_at: String,
    /// RFC3339 date and time.
    timelock_until: String,
    /// Request status.
    status: i64,
    /// SHA-256 of the veto token as hex, cleared once consumed.
    pub cancel_token_hash: Option<String>,
}

impl RecoveryRequestRow {
    /// Create a pending request row for insertion.
    pub fn new_insert(
        request_id: &RecoveryRequestId,
        owner_id: i64,
        requested_at: &UtcDateTime,
        timelock_until: &UtcDateTime,
        cancel_token_hash: String,
    ) -> Result<Self> {
        Ok(RecoveryRequestRow {
            identifier: request_id.to_string(),
            owner_id,
            requested_at: requested_at.to_rfc3339().map_err(svr_core::Error::from)?,
            timelock_until: timelock_until
                .to_rfc3339()
                .map_err(svr_core::Error::from)?,
            status: RequestStatus::Pending.as_i64(),
            cancel_token_hash: Some(cancel_token_hash),
            ..Default::default()
        })
    }
}

impl<'a> TryFrom<&Row<'a>> for RecoveryRequestRow {
    type Error = SqlError;
    fn try_from(row: &Row<'a>) -> std::result::Result<Self, Self::Error> {
        Ok(RecoveryRequestRow {
            row_id: row.get(0)?,
            identifier: row.get(1)?,
            owner_id: row.get(2)?,
            requested_at: row.get(3)?,
            timelock_until: row.get(4)?,
            status: row.get(5)?,
            cancel_token_hash: row.get(6)?,
        })
    }
}

/// Recovery request record from the database.
#[derive(Debug)]
pub struct RecoveryRequestRecord {
    /// Row identifier.
    pub row_id: i64,
    /// Request identifier.
    pub request_id: RecoveryRequestId,
    /// Owner row identifier.
    pub owner_id: i64,
    /// When the request was created.
    pub requested_at: UtcDateTime,
    /// When the veto window closes.
    pub timelock_until: UtcDateTime,
    /// Request status.
    pub status: RequestStatus,
}

impl TryFrom<RecoveryRequestRow> for RecoveryRequestRecord {
    type Error = Error;

    fn try_from(
        value: RecoveryRequestRow,
    ) -> std::result::Result<Self, Self::Error> {
        Ok(RecoveryRequestRecord {
            row_id: value.row_id,
            request_id: value.identifier.parse()?,
            owner_id: value.owner_id,
            requested_at: UtcDateTime::parse_rfc3339(&value.requested_at)
                .map_err(svr_core::Error::from)?,
            timelock_until: UtcDateTime::parse_rfc3339(
                &value.timelock_until,
            )
            .map_err(svr_core::Error::from)?,
            status: value
                .status
                .try_into()
                .map_err(svr_core::Error::from)?,
        })
    }
}

/// Recovery request entity.
pub struct RecoveryRequestEntity<'conn, C>
where
    C: Deref<Target = Connection>,
{
    conn: &'conn C,
}

impl<'conn, C> RecoveryRequestEntity<'conn, C>
where
    C: Deref<Target = Connection>,
{
    /// Create a new recovery request entity.
    pub fn new(conn: &'conn C) -> Self {
        Self { conn }
    }

    /// Find a request by identifier.
    pub fn find_optional(
        &self,
        request_id: &RecoveryRequestId,
    ) -> std::result::Result<Option<RecoveryRequestRow>, SqlError> {
        let query = request_select_columns(sql::Select::new())
            .from("recovery_requests")
            .where_clause("identifier = ?1");
        let mut stmt = self.conn.prepare_cached(&query.as_string())?;
        stmt.query_row([request_id.to_string()], |row| row.try_into())
            .optional()
    }

    /// List the requests for an owner, newest first.
    pub fn list_for_owner(
        &self,
        owner_id: i64,
    ) -> Result<Vec<RecoveryRequestRow>> {
        let query = request_select_columns(sql::Select::new())
            .from("recovery_requests")
            .where_clause("owner_id = ?1")
            .order_by("requested_at DESC");
        let mut stmt = self.conn.prepare_cached(&query.as_string())?;

        fn convert_row(row: &Row<'_>) -> Result<RecoveryRequestRow> {
            Ok(row.try_into()?)
        }

        let rows = stmt.query_and_then([owner_id], |row| {
            Ok::<_, crate::Error>(convert_row(row)?)
        })?;
        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?);
        }
        Ok(requests)
    }

    /// List pending requests whose timelock has expired.
    ///
    /// This is the candidate set for the external completion process;
    /// nothing in this subsystem acts on it. Stored timestamps are
    /// whole-second RFC3339 in UTC, so the text is fixed width and
    /// the SQL comparison is chronological.
    pub fn find_actionable(
        &self,
        now: &str,
    ) -> Result<Vec<RecoveryRequestRow>> {
        let query = request_select_columns(sql::Select::new())
            .from("recovery_requests")
            .where_clause("status = ?1 AND timelock_until <= ?2")
            .order_by("timelock_until ASC");
        let mut stmt = self.conn.prepare_cached(&query.as_string())?;

        fn convert_row(row: &Row<'_>) -> Result<RecoveryRequestRow> {
            Ok(row.try_into()?)
        }

        let rows = stmt.query_and_then(
            (RequestStatus::Pending.as_i64(), now),
            |row| Ok::<_, crate::Error>(convert_row(row)?),
        )?;
        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?);
        }
        Ok(requests)
    }

    /// Create the request in the database.
    pub fn insert(
        &self,
        row: &RecoveryRequestRow,
    ) -> std::result::Result<i64, SqlError> {
        let query = sql::Insert::new()
            .insert_into(
                "recovery_requests (identifier, owner_id, requested_at, timelock_until, status, cancel_token_hash)",
            )
            .values("(?1, ?2, ?3, ?4, ?5, ?6)");
        self.conn.execute(
            &query.as_string(),
            (
                &row.identifier,
                &row.owner_id,
                &row.requested_at,
                &row.timelock_until,
                &row.status,
                &row.cancel_token_hash,
            ),
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Cancel the pending request matching a veto token hash.
    ///
    /// Single conditional update so two racing cancellations resolve
    /// exactly-once: only the winner observes one affected row. The
    /// hash is cleared in the same statement, making the link
    /// permanently single-use.
    pub fn cancel_by_token_hash(
        &self,
        token_hash: &str,
    ) -> std::result::Result<usize, SqlError> {
        let query = sql::Update::new()
            .update("recovery_requests")
            .set("status = ?1, cancel_token_hash = NULL")
            .where_clause("status = ?2 AND cancel_token_hash = ?3");
        let mut stmt = self.conn.prepare_cached(&query.as_string())?;
        stmt.execute((
            RequestStatus::Cancelled.as_i64(),
            RequestStatus::Pending.as_i64(),
            token_hash,
        ))
    }

    /// Cancel a pending request belonging to an owner.
    ///
    /// Same terminal transition as the token cancel, guarded by
    /// ownership instead of the token.
    pub fn cancel_pending(
        &self,
        owner_id: i64,
        request_id: &RecoveryRequestId,
    ) -> std::result::Result<usize, SqlError> {
        let query = sql::Update::new()
            .update("recovery_requests")
            .set("status = ?1, cancel_token_hash = NULL")
            .where_clause(
                "status = ?2 AND owner_id = ?3 AND identifier = ?4",
            );
        let mut stmt = self.conn.prepare_cached(&query.as_string())?;
        stmt.execute((
            RequestStatus::Cancelled.as_i64(),
            RequestStatus::Pending.as_i64(),
            owner_id,
            request_id.to_string(),
        ))
    }
}
