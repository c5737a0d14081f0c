//! Guardian directory and recovery request lifecycle.
use crate::{normalize_email, Error, RecoveryNotifier, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;
use std::{collections::HashSet, sync::Arc};
use svr_core::{
    crypto::{token, RecoveryShardPayload, GUARDIAN_SHARE_COUNT},
    GuardianId, OwnerId, RecoveryRequestId, RequestStatus, UtcDateTime,
};
use svr_database::{
    async_sqlite::Client,
    entity::{
        GuardianEntity, GuardianRecord, GuardianRow, OwnerEntity,
        RecoveryRequestEntity, RecoveryRequestRecord, RecoveryRequestRow,
        RecoveryShardEntity, RecoveryShardRecord, RecoveryShardRow,
    },
};
use time::Duration;
use url::Url;

/// Default veto window in hours.
pub const DEFAULT_TIMELOCK_HOURS: i64 = 48;

/// Options for the recovery service.
#[derive(Debug, Clone)]
pub struct RecoveryOptions {
    /// Veto window between a request and its earliest completion.
    pub timelock: Duration,
    /// Base URL for cancel links; the veto token is appended as a
    /// query parameter.
    pub cancel_url: Url,
}

impl RecoveryOptions {
    /// Create options with the default 48 hour timelock.
    pub fn new(cancel_url: Url) -> Self {
        Self {
            timelock: Duration::hours(DEFAULT_TIMELOCK_HOURS),
            cancel_url,
        }
    }
}

/// Recovery state of an owner's account.
#[derive(Debug, Serialize)]
pub struct RecoveryStatus {
    /// Whether both guardian shards are stored.
    #[serde(rename = "hasRecoveryKit")]
    pub has_recovery_kit: bool,
    /// When the recovery kit was saved, if ever.
    #[serde(
        rename = "recoverySetupAt",
        skip_serializing_if = "Option::is_none"
    )]
    pub recovery_setup_at: Option<UtcDateTime>,
    /// When the account was created.
    #[serde(rename = "accountCreatedAt")]
    pub account_created_at: UtcDateTime,
    /// Number of recovery requests currently in their veto window.
    #[serde(rename = "pendingRequests")]
    pub pending_requests: usize,
}

/// Outcome smuggled out of the shard transaction so the uncommitted
/// transaction drop rolls back before the error is raised.
enum SaveOutcome {
    Saved,
    OwnerMissing,
    GuardianMissing(String),
}

/// Service driving the guardian directory and request lifecycle.
pub struct RecoveryService {
    client: Client,
    notifier: Arc<dyn RecoveryNotifier>,
    options: RecoveryOptions,
}

impl RecoveryService {
    /// Create a recovery service.
    pub fn new(
        client: Client,
        notifier: Arc<dyn RecoveryNotifier>,
        options: RecoveryOptions,
    ) -> Self {
        Self {
            client,
            notifier,
            options,
        }
    }

    /// Database client backing this service.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Invite a guardian for an owner.
    pub async fn invite_guardian(
        &self,
        owner_id: OwnerId,
        email: &str,
    ) -> Result<GuardianRecord> {
        let email = normalize_email(email);
        let guardian_id = GuardianId::new_v4();
        let row = self
            .client
            .conn_and_then(move |conn| {
                let owners = OwnerEntity::new(&conn);
                let owner = owners
                    .find_optional(&owner_id)?
                    .ok_or(Error::Unauthorized)?;
                let guardians = GuardianEntity::new(&conn);
                if guardians
                    .find_by_email(owner.row_id, &email)?
                    .is_some()
                {
                    return Err(Error::GuardianAlreadyInvited(email));
                }
                let mut row = GuardianRow::new_insert(
                    owner.row_id,
                    &guardian_id,
                    email,
                )?;
                row.row_id = guardians.insert(&row)?;
                Ok::<_, Error>(row)
            })
            .await?;
        Ok(row.try_into().map_err(svr_database::Error::from)?)
    }

    /// List an owner's guardians.
    pub async fn list_guardians(
        &self,
        owner_id: OwnerId,
    ) -> Result<Vec<GuardianRecord>> {
        let rows = self
            .client
            .conn_and_then(move |conn| {
                let owners = OwnerEntity::new(&conn);
                let owner = owners
                    .find_optional(&owner_id)?
                    .ok_or(Error::Unauthorized)?;
                let guardians = GuardianEntity::new(&conn);
                Ok::<_, Error>(guardians.list_for_owner(owner.row_id)?)
            })
            .await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(
                row.try_into().map_err(svr_database::Error::from)?,
            );
        }
        Ok(records)
    }

    /// Mark a guardian as having accepted their invitation.
    pub async fn accept_guardian(
        &self,
        owner_id: OwnerId,
        guardian_id: GuardianId,
    ) -> Result<()> {
        self.client
            .conn_and_then(move |conn| {
                let owners = OwnerEntity::new(&conn);
                let owner = owners
                    .find_optional(&owner_id)?
                    .ok_or(Error::Unauthorized)?;
                let guardians = GuardianEntity::new(&conn);
                let row = guardians
                    .find_optional(owner.row_id, &guardian_id)?
                    .ok_or_else(|| {
                        Error::GuardianNotFound(guardian_id.to_string())
                    })?;
                guardians.mark_active(row.row_id)?;
                Ok::<_, Error>(())
            })
            .await
    }

    /// Store both encrypted guardian shards for an owner.
    ///
    /// Runs in a single transaction: either both shards are stored
    /// and the owner is marked as holding a recovery kit, or nothing
    /// changes. Re-submission replaces any previously stored shards.
    pub async fn save_shards(
        &self,
        owner_id: OwnerId,
        shards: Vec<RecoveryShardPayload>,
    ) -> Result<()> {
        if shards.len() != GUARDIAN_SHARE_COUNT {
            return Err(Error::ShardCount(GUARDIAN_SHARE_COUNT));
        }
        let payloads: Vec<(String, String, String)> = shards
            .into_iter()
            .map(|shard| {
                (
                    normalize_email(&shard.guardian_email),
                    STANDARD.encode(&shard.encrypted),
                    STANDARD.encode(shard.salt),
                )
            })
            .collect();
        // Each shard must belong to a distinct guardian; a repeated
        // email would leave fewer stored shards than the threshold
        // needs while still marking the kit as set up.
        let mut seen = HashSet::new();
        for (email, _, _) in &payloads {
            if !seen.insert(email.as_str()) {
                return Err(Error::DuplicateGuardian(email.clone()));
            }
        }
        let setup_at = UtcDateTime::now().to_rfc3339()?;

        let outcome = self
            .client
            .conn_mut_and_then(move |conn| {
                let tx = conn.transaction()?;
                let owners = OwnerEntity::new(&tx);
                let Some(owner) = owners.find_optional(&owner_id)?
                else {
                    return Ok(SaveOutcome::OwnerMissing);
                };
                let guardians = GuardianEntity::new(&tx);
                let shard_entity = RecoveryShardEntity::new(&tx);
                for (email, encrypted, salt) in payloads {
                    let Some(guardian) =
                        guardians.find_by_email(owner.row_id, &email)?
                    else {
                        return Ok(SaveOutcome::GuardianMissing(email));
                    };
                    shard_entity.delete_for_guardian(guardian.row_id)?;
                    let row = RecoveryShardRow::new_insert(
                        owner.row_id,
                        guardian.row_id,
                        encrypted,
                        salt,
                    )?;
                    shard_entity.insert(&row)?;
                }
                owners.mark_recovery_kit(owner.row_id, &setup_at)?;
                tx.commit()?;
                Ok::<_, Error>(SaveOutcome::Saved)
            })
            .await?;

        match outcome {
            SaveOutcome::Saved => Ok(()),
            SaveOutcome::OwnerMissing => Err(Error::Unauthorized),
            SaveOutcome::GuardianMissing(email) => {
                Err(Error::GuardianNotFound(email))
            }
        }
    }

    /// Stored encrypted shards for an owner.
    pub async fn stored_shards(
        &self,
        owner_id: OwnerId,
    ) -> Result<Vec<RecoveryShardRecord>> {
        let rows = self
            .client
            .conn_and_then(move |conn| {
                let owners = OwnerEntity::new(&conn);
                let owner = owners
                    .find_optional(&owner_id)?
                    .ok_or(Error::Unauthorized)?;
                let shards = RecoveryShardEntity::new(&conn);
                Ok::<_, Error>(shards.list_for_owner(owner.row_id)?)
            })
            .await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(
                row.try_into().map_err(svr_database::Error::from)?,
            );
        }
        Ok(records)
    }

    /// Open a recovery request against the account owning an email
    /// address.
    ///
    /// Unauthenticated. Always returns success so callers cannot use
    /// it to enumerate accounts; when the email matches an owner a
    /// pending request is created and the veto link is delivered to
    /// that owner.
    pub async fn request_recovery(&self, email: &str) -> Result<()> {
        let normalized = normalize_email(email);
        let owner = self
            .client
            .conn_and_then(move |conn| {
                let owners = OwnerEntity::new(&conn);
                Ok::<_, Error>(owners.find_by_email(&normalized)?)
            })
            .await?;
        let Some(owner) = owner else {
            tracing::debug!("recovery::request_unmatched");
            return Ok(());
        };

        let (raw_token, token_hash) = token::generate();
        let request_id = RecoveryRequestId::new_v4();
        let requested_at = UtcDateTime::now();
        let timelock_until = requested_at.clone() + self.options.timelock;
        let row = RecoveryRequestRow::new_insert(
            &request_id,
            owner.row_id,
            &requested_at,
            &timelock_until,
            token_hash,
        )?;
        self.client
            .conn_and_then(move |conn| {
                let requests = RecoveryRequestEntity::new(&conn);
                requests.insert(&row)?;
                Ok::<_, Error>(())
            })
            .await?;
        tracing::info!(%request_id, "recovery::request_opened");

        let mut cancel_url = self.options.cancel_url.clone();
        cancel_url
            .query_pairs_mut()
            .append_pair("token", raw_token.as_str());
        if let Err(error) = self
            .notifier
            .send_recovery_veto_email(&owner.email, &cancel_url)
            .await
        {
            // The request stands; the owner can still cancel through
            // an authenticated session.
            tracing::warn!(%error, "recovery::veto_email_failed");
        }
        Ok(())
    }

    /// Cancel the pending request matching a veto token.
    ///
    /// Unauthenticated. The token is consumed whether or not it
    /// matched, and every failure cause collapses into
    /// [`Error::NotFoundOrAlreadyUsed`].
    pub async fn cancel_by_token(&self, raw_token: &str) -> Result<()> {
        let token_hash = token::hash(raw_token);
        let affected = self
            .client
            .conn_and_then(move |conn| {
                let requests = RecoveryRequestEntity::new(&conn);
                Ok::<_, Error>(
                    requests.cancel_by_token_hash(&token_hash)?,
                )
            })
            .await?;
        if affected == 1 {
            tracing::info!("recovery::request_vetoed");
            Ok(())
        } else {
            Err(Error::NotFoundOrAlreadyUsed)
        }
    }

    /// Cancel an owner's own pending request.
    pub async fn cancel_request(
        &self,
        owner_id: OwnerId,
        request_id: RecoveryRequestId,
    ) -> Result<()> {
        let affected = self
            .client
            .conn_and_then(move |conn| {
                let owners = OwnerEntity::new(&conn);
                let owner = owners
                    .find_optional(&owner_id)?
                    .ok_or(Error::Unauthorized)?;
                let requests = RecoveryRequestEntity::new(&conn);
                Ok::<_, Error>(
                    requests.cancel_pending(owner.row_id, &request_id)?,
                )
            })
            .await?;
        if affected == 1 {
            tracing::info!(%request_id, "recovery::request_cancelled");
            Ok(())
        } else {
            Err(Error::NotFoundOrAlreadyUsed)
        }
    }

    /// Recovery state of an owner's account.
    pub async fn recovery_status(
        &self,
        owner_id: OwnerId,
    ) -> Result<RecoveryStatus> {
        let (owner, requests) = self
            .client
            .conn_and_then(move |conn| {
                let owners = OwnerEntity::new(&conn);
                let owner = owners
                    .find_optional(&owner_id)?
                    .ok_or(Error::Unauthorized)?;
                let requests = RecoveryRequestEntity::new(&conn);
                let rows = requests.list_for_owner(owner.row_id)?;
                Ok::<_, Error>((owner, rows))
            })
            .await?;
        let owner: svr_database::entity::OwnerRecord =
            owner.try_into().map_err(svr_database::Error::from)?;
        let mut pending = 0;
        for row in requests {
            let record: RecoveryRequestRecord =
                row.try_into().map_err(svr_database::Error::from)?;
            if record.status == RequestStatus::Pending {
                pending += 1;
            }
        }
        Ok(RecoveryStatus {
            has_recovery_kit: owner.has_recovery_kit,
            recovery_setup_at: owner.recovery_setup_at,
            account_created_at: owner.created_at,
            pending_requests: pending,
        })
    }

    /// List an owner's pending recovery requests, newest first.
    pub async fn pending_requests(
        &self,
        owner_id: OwnerId,
    ) -> Result<Vec<RecoveryRequestRecord>> {
        let rows = self
            .client
            .conn_and_then(move |conn| {
                let owners = OwnerEntity::new(&conn);
                let owner = owners
                    .find_optional(&owner_id)?
                    .ok_or(Error::Unauthorized)?;
                let requests = RecoveryRequestEntity::new(&conn);
                Ok::<_, Error>(requests.list_for_owner(owner.row_id)?)
            })
            .await?;
        let mut records = Vec::new();
        for row in rows {
            let record: RecoveryRequestRecord =
                row.try_into().map_err(svr_database::Error::from)?;
            if record.status == RequestStatus::Pending {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Pending requests across all owners whose timelock has expired.
    ///
    /// Candidate set for the surrounding identity system; nothing in
    /// this subsystem completes a request.
    pub async fn actionable_requests(
        &self,
    ) -> Result<Vec<RecoveryRequestRecord>> {
        let now = UtcDateTime::now().to_rfc3339()?;
        let rows = self
            .client
            .conn_and_then(move |conn| {
                let requests = RecoveryRequestEntity::new(&conn);
                Ok::<_, Error>(requests.find_actionable(&now)?)
            })
            .await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(
                row.try_into().map_err(svr_database::Error::from)?,
            );
        }
        Ok(records)
    }
}
