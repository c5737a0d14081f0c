//! Entities for rows in the database.
mod guardian;
mod owner;
mod recovery_request;
mod recovery_shard;

pub use guardian::{GuardianEntity, GuardianRecord, GuardianRow};
pub use owner::{OwnerEntity, OwnerRecord, OwnerRow};
pub use recovery_request::{
    RecoveryRequestEntity, RecoveryRequestRecord, RecoveryRequestRow,
};
pub use recovery_shard::{
    RecoveryShardEntity, RecoveryShardRecord, RecoveryShardRow,
};
