use crate::{Error, Result};
use async_sqlite::rusqlite::{
    Connection, Error as SqlError, OptionalExtension, Row,
};
use sql_query_builder as sql;
use std::ops::Deref;
use svr_core::{OwnerId, UtcDateTime};

fn owner_select_columns(sql: sql::Select) -> sql::Select {
    sql.select(
        r#"
            owner_id,
            identifier,
            email,
            created_at,
            has_recovery_kit,
            recovery_setup_at
        "#,
    )
}

/// Owner row from the database.
///
/// Owners are created by the surrounding identity system; this
/// subsystem only reads them and flips the recovery kit columns.
#[derive(Debug, Default)]
pub struct OwnerRow {
    /// Row identifier.
    pub row_id: i64,
    /// Owner identifier.
    pub identifier: String,
    /// Owner email address.
    pub email: String,
    /// RFC3339 date and time.
    created_at: String,
    /// Whether a recovery kit exists.
    pub has_recovery_kit: bool,
    /// RFC3339 date and time the kit was saved, if any.
    recovery_setup_at: Option<String>,
}

impl OwnerRow {
    /// Create an owner row for insertion.
    pub fn new_insert(owner_id: &OwnerId, email: String) -> Result<Self> {
        Ok(OwnerRow {
            identifier: owner_id.to_string(),
            email,
            created_at: UtcDateTime::default().to_rfc3339()?,
            ..Default::default()
        })
    }
}

impl<'a> TryFrom<&Row<'a>> for OwnerRow {
    type Error = SqlError;
    fn try_from(row: &Row<'a>) -> std::result::Result<Self, Self::Error> {
        Ok(OwnerRow {
            row_id: row.get(0)?,
            identifier: row.get(1)?,
            email: row.get(2)?,
            created_at: row.get(3)?,
            has_recovery_kit: row.get::<_, i64>(4)? != 0,
            recovery_setup_at: row.get(5)?,
        })
    }
}

/// Owner record from the database.
#[derive(Debug)]
pub struct OwnerRecord {
    /// Row identifier.
    pub row_id: i64,
    /// Owner identifier.
    pub owner_id: OwnerId,
    /// Owner email address.
    pub email: String,
    /// Created date and time.
    pub created_at: UtcDateTime,
    /// Whether a recovery kit exists.
    pub has_recovery_kit: bool,
    /// When the recovery kit was saved, if ever.
    pub recovery_setup_at: Option<UtcDateTime>,
}

impl TryFrom<OwnerRow> for OwnerRecord {
    type Error = Error;

    fn try_from(value: OwnerRow) -> std::result::Result<Self, Self::Error> {
        let recovery_setup_at = value
            .recovery_setup_at
            .as_deref()
            .map(UtcDateTime::parse_rfc3339)
            .transpose()
            .map_err(svr_core::Error::from)?;
        Ok(OwnerRecord {
            row_id: value.row_id,
            owner_id: value.identifier.parse()?,
            email: value.email,
            created_at: UtcDateTime::parse_rfc3339(&value.created_at)
                .map_err(svr_core::Error::from)?,
            has_recovery_kit: value.has_recovery_kit,
            recovery_setup_at,
        })
    }
}

/// Owner entity.
pub struct OwnerEntity<'conn, C>
where
    C: Deref<Target = Connection>,
{
    conn: &'conn C,
}

impl<'conn, C> OwnerEntity<'conn, C>
where
    C: Deref<Target = Connection>,
{
    /// Create a new owner entity.
    pub fn new(conn: &'conn C) -> Self {
        Self { conn }
    }

    /// Find an owner by identifier.
    pub fn find_optional(
        &self,
        owner_id: &OwnerId,
    ) -> std::result::Result<Option<OwnerRow>, SqlError> {
        let query = owner_select_columns(sql::Select::new())
            .from("owners")
            .where_clause("identifier = ?1");
        let mut stmt = self.conn.prepare_cached(&query.as_string())?;
        stmt.query_row([owner_id.to_string()], |row| row.try_into())
            .optional()
    }

    /// Find an owner by email address.
    ///
    /// The email column collates case-insensitively.
    pub fn find_by_email(
        &self,
        email: &str,
    ) -> std::result::Result<Option<OwnerRow>, SqlError> {
        let query = owner_select_columns(sql::Select::new())
            .from("owners")
            .where_clause("email = ?1");
        let mut stmt = self.conn.prepare_cached(&query.as_string())?;
        stmt.query_row([email], |row| row.try_into()).optional()
    }

    /// Create the owner in the database.
    ///
    /// Surface for the surrounding identity system and for tests;
    /// the recovery subsystem itself never creates owners.
    pub fn insert(
        &self,
        row: &OwnerRow,
    ) -> std::result::Result<i64, SqlError> {
        let query = sql::Insert::new()
            .insert_into("owners (identifier, email, created_at)")
            .values("(?1, ?2, ?3)");
        self.conn.execute(
            &query.as_string(),
            (&row.identifier, &row.email, &row.created_at),
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Mark the owner as holding a complete recovery kit.
    ///
    /// Must only be called once both encrypted shards are durably
    /// stored in the same transaction.
    pub fn mark_recovery_kit(
        &self,
        owner_id: i64,
        setup_at: &str,
    ) -> std::result::Result<(), SqlError> {
        let query = sql::Update::new()
            .update("owners")
            .set("has_recovery_kit = 1, recovery_setup_at = ?1")
            .where_clause("owner_id = ?2");
        let mut stmt = self.conn.prepare_cached(&query.as_string())?;
        stmt.execute((setup_at, owner_id))?;
        Ok(())
    }
}
