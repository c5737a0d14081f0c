use crate::{Error, Result};
use async_sqlite::rusqlite::{Connection, Error as SqlError, Row};
use sql_query_builder as sql;
use std::ops::Deref;
use svr_core::UtcDateTime;

fn shard_select_columns(sql: sql::Select) -> sql::Select {
    sql.select(
        r#"
            shard_id,
            owner_id,
            guardian_id,
            encrypted_shard,
            salt,
            created_at
        "#,
    )
}

/// Recovery shard row from the database.
///
/// The ciphertext and salt are opaque base64 blobs; the local share
/// of the split never reaches this table.
#[derive(Debug, Default)]
pub struct RecoveryShardRow {
    /// Row identifier.
    pub row_id: i64,
    /// Owner row identifier.
    pub owner_id: i64,
    /// Guardian row identifier.
    pub guardian_id: i64,
    /// Encrypted shard as base64.
    pub encrypted_shard: String,
    /// Key derivation salt as base64.
    pub salt: String,
    /// RFC3339 date and time.
    created_at: String,
}

impl RecoveryShardRow {
    /// Create a shard row for insertion.
    pub fn new_insert(
        owner_id: i64,
        guardian_id: i64,
        encrypted_shard: String,
        salt: String,
    ) -> Result<Self> {
        Ok(RecoveryShardRow {
            owner_id,
            guardian_id,
            encrypted_shard,
            salt,
            created_at: UtcDateTime::default().to_rfc3339()?,
            ..Default::default()
        })
    }
}

impl<'a> TryFrom<&Row<'a>> for RecoveryShardRow {
    type Error = SqlError;
    fn try_from(row: &Row<'a>) -> std::result::Result<Self, Self::Error> {
        Ok(RecoveryShardRow {
            row_id: row.get(0)?,
            owner_id: row.get(1)?,
            guardian_id: row.get(2)?,
            encrypted_shard: row.get(3)?,
            salt: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

/// Recovery shard record from the database.
#[derive(Debug)]
pub struct RecoveryShardRecord {
    /// Row identifier.
    pub row_id: i64,
    /// Guardian row identifier.
    pub guardian_id: i64,
    /// Encrypted shard as base64.
    pub encrypted_shard: String,
    /// Key derivation salt as base64.
    pub salt: String,
    /// Created date and time.
    pub created_at: UtcDateTime,
}

impl TryFrom<RecoveryShardRow> for RecoveryShardRecord {
    type Error = Error;

    fn try_from(
        value: RecoveryShardRow,
    ) -> std::result::Result<Self, Self::Error> {
        Ok(RecoveryShardRecord {
            row_id: value.row_id,
            guardian_id: value.guardian_id,
            encrypted_shard: value.encrypted_shard,
            salt: value.salt,
            created_at: UtcDateTime::parse_rfc3339(&value.created_at)
                .map_err(svr_core::Error::from)?,
        })
    }
}

/// Recovery shard entity.
pub struct RecoveryShardEntity<'conn, C>
where
    C: Deref<Target = Connection>,
{
    conn: &'conn C,
}

impl<'conn, C> RecoveryShardEntity<'conn, C>
where
    C: Deref<Target = Connection>,
{
    /// Create a new recovery shard entity.
    pub fn new(conn: &'conn C) -> Self {
        Self { conn }
    }

    /// List the stored shards for an owner.
    pub fn list_for_owner(
        &self,
        owner_id: i64,
    ) -> Result<Vec<RecoveryShardRow>> {
        let query = shard_select_columns(sql::Select::new())
            .from("recovery_shards")
            .where_clause("owner_id = ?1")
            .order_by("guardian_id ASC");
        let mut stmt = self.conn.prepare_cached(&query.as_string())?;

        fn convert_row(row: &Row<'_>) -> Result<RecoveryShardRow> {
            Ok(row.try_into()?)
        }

        let rows = stmt.query_and_then([owner_id], |row| {
            Ok::<_, crate::Error>(convert_row(row)?)
        })?;
        let mut shards = Vec::new();
        for row in rows {
            shards.push(row?);
        }
        Ok(shards)
    }

    /// Delete any existing shard held by a guardian.
    ///
    /// Replacement is delete-then-insert so re-running kit setup or
    /// rotating guardians leaves exactly one row per guardian.
    pub fn delete_for_guardian(
        &self,
        guardian_id: i64,
    ) -> std::result::Result<usize, SqlError> {
        let query = sql::Delete::new()
            .delete_from("recovery_shards")
            .where_clause("guardian_id = ?1");
        self.conn.execute(&query.as_string(), [guardian_id])
    }

    /// Create the shard in the database.
    pub fn insert(
        &self,
        row: &RecoveryShardRow,
    ) -> std::result::Result<i64, SqlError> {
        let query = sql::Insert::new()
            .insert_into(
                "recovery_shards (owner_id, guardian_id, encrypted_shard, salt, created_at)",
            )
            .values("(?1, ?2, ?3, ?4, ?5)");
        self.conn.execute(
            &query.as_string(),
            (
                &row.owner_id,
                &row.guardian_id,
                &row.encrypted_shard,
                &row.salt,
                &row.created_at,
            ),
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}
