use crate::{Error, Result};
use async_sqlite::rusqlite::{
    Connection, Error as SqlError, OptionalExtension, Row,
};
use sql_query_builder as sql;
use std::ops::Deref;
use svr_core::{GuardianId, GuardianStatus, UtcDateTime};

fn guardian_select_columns(sql: sql::Select) -> sql::Select {
    sql.select(
        r#"
            guardian_id,
            owner_id,
            identifier,
            email,
            status,
            created_at
        "#,
    )
}

/// Guardian row from the database.
#[derive(Debug, Default)]
pub struct GuardianRow {
    /// Row identifier.
    pub row_id: i64,
    /// Owner row identifier.
    pub owner_id: i64,
    /// Guardian identifier.
    pub identifier: String,
    /// Guardian email address.
    pub email: String,
    /// Invitation status.
    status: i64,
    /// RFC3339 date and time.
    created_at: String,
}

impl GuardianRow {
    /// Create a guardian row for insertion.
    pub fn new_insert(
        owner_id: i64,
        guardian_id: &GuardianId,
        email: String,
    ) -> Result<Self> {
        Ok(GuardianRow {
            owner_id,
            identifier: guardian_id.to_string(),
            email,
            status: GuardianStatus::Pending.as_i64(),
            created_at: UtcDateTime::default().to_rfc3339()?,
            ..Default::default()
        })
    }
}

impl<'a> TryFrom<&Row<'a>> for GuardianRow {
    type Error = SqlError;
    fn try_from(row: &Row<'a>) -> std::result::Result<Self, Self::Error> {
        Ok(GuardianRow {
            row_id: row.get(0)?,
            owner_id: row.get(1)?,
            identifier: row.get(2)?,
            email: row.get(3)?,
            status: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

/// Guardian record from the database.
#[derive(Debug)]
pub struct GuardianRecord {
    /// Row identifier.
    pub row_id: i64,
    /// Guardian identifier.
    pub guardian_id: GuardianId,
    /// Guardian email address.
    pub email: String,
    /// Invitation status.
    pub status: GuardianStatus,
    /// Created date and time.
    pub created_at: UtcDateTime,
}

impl TryFrom<GuardianRow> for GuardianRecord {
    type Error = Error;

    fn try_from(value: GuardianRow) -> std::result::Result<Self, Self::Error> {
        Ok(GuardianRecord {
            row_id: value.row_id,
            guardian_id: value.identifier.parse()?,
            email: value.email,
            status: value
                .status
                .try_into()
                .map_err(svr_core::Error::from)?,
            created_at: UtcDateTime::parse_rfc3339(&value.created_at)
                .map_err(svr_core::Error::from)?,
        })
    }
}

/// Guardian entity.
pub struct GuardianEntity<'conn, C>
where
    C: Deref<Target = Connection>,
{
    conn: &'conn C,
}

impl<'conn, C> GuardianEntity<'conn, C>
where
    C: Deref<Target = Connection>,
{
    /// Create a new guardian entity.
    pub fn new(conn: &'conn C) -> Self {
        Self { conn }
    }

    /// Find a guardian of an owner by email address.
    pub fn find_by_email(
        &self,
        owner_id: i64,
        email: &str,
    ) -> std::result::Result<Option<GuardianRow>, SqlError> {
        let query = guardian_select_columns(sql::Select::new())
            .from("guardians")
            .where_clause("owner_id = ?1 AND email = ?2");
        let mut stmt = self.conn.prepare_cached(&query.as_string())?;
        stmt.query_row((owner_id, email), |row| row.try_into())
            .optional()
    }

    /// Find a guardian of an owner by identifier.
    pub fn find_optional(
        &self,
        owner_id: i64,
        guardian_id: &GuardianId,
    ) -> std::result::Result<Option<GuardianRow>, SqlError> {
        let query = guardian_select_columns(sql::Select::new())
            .from("guardians")
            .where_clause("owner_id = ?1 AND identifier = ?2");
        let mut stmt = self.conn.prepare_cached(&query.as_string())?;
        stmt.query_row((owner_id, guardian_id.to_string()), |row| {
            row.try_into()
        })
        .optional()
    }

    /// List the guardians of an owner.
    pub fn list_for_owner(
        &self,
        owner_id: i64,
    ) -> Result<Vec<GuardianRow>> {
        let query = guardian_select_columns(sql::Select::new())
            .from("guardians")
            .where_clause("owner_id = ?1")
            .order_by("created_at ASC");
        let mut stmt = self.conn.prepare_cached(&query.as_string())?;

        fn convert_row(row: &Row<'_>) -> Result<GuardianRow> {
            Ok(row.try_into()?)
        }

        let rows = stmt.query_and_then([owner_id], |row| {
            Ok::<_, crate::Error>(convert_row(row)?)
        })?;
        let mut guardians = Vec::new();
        for row in rows {
            guardians.push(row?);
        }
        Ok(guardians)
    }

    /// Create the guardian in the database.
    pub fn insert(
        &self,
        row: &GuardianRow,
    ) -> std::result::Result<i64, SqlError> {
        let query = sql::Insert::new()
            .insert_into(
                "guardians (owner_id, identifier, email, status, created_at)",
            )
            .values("(?1, ?2, ?3, ?4, ?5)");
        self.conn.execute(
            &query.as_string(),
            (
                &row.owner_id,
                &row.identifier,
                &row.email,
                &row.status,
                &row.created_at,
            ),
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Mark a guardian as having accepted their invitation.
    pub fn mark_active(
        &self,
        guardian_id: i64,
    ) -> std::result::Result<usize, SqlError> {
        let query = sql::Update::new()
            .update("guardians")
            .set("status = ?1")
            .where_clause("guardian_id = ?2");
        let mut stmt = self.conn.prepare_cached(&query.as_string())?;
        Ok(stmt.execute((GuardianStatus::Active.as_i64(), guardian_id))?)
    }
}
