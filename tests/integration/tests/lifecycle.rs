use anyhow::Result;
use std::sync::Arc;
use svr_core::{crypto::RecoveryShardPayload, OwnerId, RequestStatus};
use svr_integration_tests::{
    extract_token, memory_service, owner_with_guardians, MockNotifier,
};
use svr_recovery::{Error, RecoveryKit};
use time::Duration;

const OWNER: &str = "owner@example.com";
const GUARDIANS: [&str; 2] =
    ["alice@example.com", "bob@example.com"];

#[tokio::test]
async fn lifecycle_kit_request_veto() -> Result<()> {
    let notifier = Arc::new(MockNotifier::default());
    let service = memory_service(notifier.clone()).await?;
    let owner_id =
        owner_with_guardians(&service, OWNER, GUARDIANS).await?;

    let kit = RecoveryKit::generate(GUARDIANS)?;
    service
        .save_shards(owner_id, kit.guardian_shards.clone())
        .await?;

    let status = service.recovery_status(owner_id).await?;
    assert!(status.has_recovery_kit);
    assert!(status.recovery_setup_at.is_some());
    assert_eq!(0, status.pending_requests);

    // Open a request; the veto link goes to the owner.
    service.request_recovery(OWNER).await?;
    let messages = notifier.messages();
    assert_eq!(1, messages.len());
    assert_eq!(OWNER, messages[0].0);

    let status = service.recovery_status(owner_id).await?;
    assert_eq!(1, status.pending_requests);

    // First click cancels, second click finds nothing.
    let url = notifier.last_cancel_url().unwrap();
    let token = extract_token(&url).unwrap();
    service.cancel_by_token(&token).await?;
    let result = service.cancel_by_token(&token).await;
    assert!(matches!(result, Err(Error::NotFoundOrAlreadyUsed)));

    let status = service.recovery_status(owner_id).await?;
    assert_eq!(0, status.pending_requests);
    Ok(())
}

#[tokio::test]
async fn lifecycle_unknown_email_is_silent() -> Result<()> {
    let notifier = Arc::new(MockNotifier::default());
    let service = memory_service(notifier.clone()).await?;

    service.request_recovery("nobody@example.com").await?;
    assert!(notifier.messages().is_empty());
    assert!(service.actionable_requests().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn lifecycle_email_normalized_for_lookup() -> Result<()> {
    let notifier = Arc::new(MockNotifier::default());
    let service = memory_service(notifier.clone()).await?;
    owner_with_guardians(&service, OWNER, GUARDIANS).await?;

    service.request_recovery("  Owner@Example.COM ").await?;
    assert_eq!(1, notifier.messages().len());
    Ok(())
}

#[tokio::test]
async fn lifecycle_timelock_is_48_hours() -> Result<()> {
    let notifier = Arc::new(MockNotifier::default());
    let service = memory_service(notifier.clone()).await?;
    let owner_id =
        owner_with_guardians(&service, OWNER, GUARDIANS).await?;

    service.request_recovery(OWNER).await?;
    let requests = service.pending_requests(owner_id).await?;
    assert_eq!(1, requests.len());
    let request = &requests[0];
    assert_eq!(RequestStatus::Pending, request.status);

    let requested: time::OffsetDateTime =
        request.requested_at.clone().into();
    let until: time::OffsetDateTime =
        request.timelock_until.clone().into();
    assert_eq!(Duration::hours(48), until - requested);

    // Still inside the veto window.
    assert!(service.actionable_requests().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn lifecycle_actionable_after_timelock() -> Result<()> {
    use svr_core::{RecoveryRequestId, UtcDateTime};
    use svr_database::entity::{
        OwnerEntity, RecoveryRequestEntity, RecoveryRequestRow,
    };

    let notifier = Arc::new(MockNotifier::default());
    let service = memory_service(notifier.clone()).await?;
    let owner_id =
        owner_with_guardians(&service, OWNER, GUARDIANS).await?;

    // Backdate a request so its veto window has already closed.
    let request_id = RecoveryRequestId::new_v4();
    service
        .client()
        .conn_and_then(move |conn| {
            let owners = OwnerEntity::new(&conn);
            let owner = owners.find_optional(&owner_id)?.unwrap();
            let requested: UtcDateTime =
                (time::OffsetDateTime::now_utc()
                    - Duration::hours(49))
                .into();
            let until = requested.clone() + Duration::hours(48);
            let row = RecoveryRequestRow::new_insert(
                &request_id,
                owner.row_id,
                &requested,
                &until,
                "unused".to_owned(),
            )?;
            RecoveryRequestEntity::new(&conn).insert(&row)?;
            Ok::<_, svr_database::Error>(())
        })
        .await?;

    let actionable = service.actionable_requests().await?;
    assert_eq!(1, actionable.len());
    assert_eq!(request_id, actionable[0].request_id);
    assert_eq!(RequestStatus::Pending, actionable[0].status);
    Ok(())
}

#[tokio::test]
async fn lifecycle_owner_cancels_own_request() -> Result<()> {
    let notifier = Arc::new(MockNotifier::default());
    let service = memory_service(notifier.clone()).await?;
    let owner_id =
        owner_with_guardians(&service, OWNER, GUARDIANS).await?;

    service.request_recovery(OWNER).await?;
    let requests = service.pending_requests(owner_id).await?;
    let request_id = requests[0].request_id;

    // Another account cannot cancel it.
    let other_id = svr_integration_tests::insert_owner(
        &service,
        "other@example.com",
    )
    .await?;
    let result = service.cancel_request(other_id, request_id).await;
    assert!(matches!(result, Err(Error::NotFoundOrAlreadyUsed)));

    service.cancel_request(owner_id, request_id).await?;
    assert!(service.pending_requests(owner_id).await?.is_empty());

    // Cancelling twice fails.
    let result = service.cancel_request(owner_id, request_id).await;
    assert!(matches!(result, Err(Error::NotFoundOrAlreadyUsed)));

    // The token from the notification is dead too.
    let url = notifier.last_cancel_url().unwrap();
    let token = extract_token(&url).unwrap();
    let result = service.cancel_by_token(&token).await;
    assert!(matches!(result, Err(Error::NotFoundOrAlreadyUsed)));
    Ok(())
}

#[tokio::test]
async fn lifecycle_concurrent_veto_exactly_once() -> Result<()> {
    let notifier = Arc::new(MockNotifier::default());
    let service =
        Arc::new(memory_service(notifier.clone()).await?);
    owner_with_guardians(&service, OWNER, GUARDIANS).await?;

    service.request_recovery(OWNER).await?;
    let url = notifier.last_cancel_url().unwrap();
    let token = extract_token(&url).unwrap();

    let first = {
        let service = service.clone();
        let token = token.clone();
        tokio::spawn(async move {
            service.cancel_by_token(&token).await
        })
    };
    let second = {
        let service = service.clone();
        let token = token.clone();
        tokio::spawn(async move {
            service.cancel_by_token(&token).await
        })
    };

    let outcomes = [first.await?, second.await?];
    let wins =
        outcomes.iter().filter(|result| result.is_ok()).count();
    assert_eq!(1, wins);
    Ok(())
}

#[tokio::test]
async fn lifecycle_multiple_pending_requests() -> Result<()> {
    let notifier = Arc::new(MockNotifier::default());
    let service = memory_service(notifier.clone()).await?;
    let owner_id =
        owner_with_guardians(&service, OWNER, GUARDIANS).await?;

    service.request_recovery(OWNER).await?;
    service.request_recovery(OWNER).await?;
    assert_eq!(2, notifier.messages().len());
    assert_eq!(
        2,
        service.pending_requests(owner_id).await?.len()
    );

    // Each token only cancels its own request.
    let messages = notifier.messages();
    let token = extract_token(&messages[0].1).unwrap();
    service.cancel_by_token(&token).await?;
    assert_eq!(
        1,
        service.pending_requests(owner_id).await?.len()
    );
    Ok(())
}

#[tokio::test]
async fn shards_unknown_guardian_rolls_back() -> Result<()> {
    let notifier = Arc::new(MockNotifier::default());
    let service = memory_service(notifier.clone()).await?;
    let owner_id =
        svr_integration_tests::insert_owner(&service, OWNER).await?;
    let record = service
        .invite_guardian(owner_id, GUARDIANS[0])
        .await?;
    service.accept_guardian(owner_id, record.guardian_id).await?;

    // Second shard names a guardian that was never invited.
    let kit = RecoveryKit::generate(GUARDIANS)?;
    let result =
        service.save_shards(owner_id, kit.guardian_shards).await;
    assert!(matches!(
        result,
        Err(Error::GuardianNotFound(email)) if email == GUARDIANS[1]
    ));

    // Nothing was stored, not even the first shard.
    assert!(service.stored_shards(owner_id).await?.is_empty());
    let status = service.recovery_status(owner_id).await?;
    assert!(!status.has_recovery_kit);
    Ok(())
}

#[tokio::test]
async fn shards_resubmission_replaces() -> Result<()> {
    let notifier = Arc::new(MockNotifier::default());
    let service = memory_service(notifier.clone()).await?;
    let owner_id =
        owner_with_guardians(&service, OWNER, GUARDIANS).await?;

    let first = RecoveryKit::generate(GUARDIANS)?;
    service
        .save_shards(owner_id, first.guardian_shards)
        .await?;

    let second = RecoveryKit::generate(GUARDIANS)?;
    service
        .save_shards(owner_id, second.guardian_shards.clone())
        .await?;

    // One shard per guardian and the latest submission wins.
    let stored = service.stored_shards(owner_id).await?;
    assert_eq!(2, stored.len());
    let stored_blobs: Vec<Vec<u8>> = stored
        .iter()
        .map(|record| {
            use base64::{engine::general_purpose::STANDARD, Engine};
            STANDARD.decode(&record.encrypted_shard).unwrap()
        })
        .collect();
    for shard in &second.guardian_shards {
        assert!(stored_blobs.contains(&shard.encrypted));
    }
    Ok(())
}

#[tokio::test]
async fn shards_duplicate_guardian_rejected() -> Result<()> {
    let notifier = Arc::new(MockNotifier::default());
    let service = memory_service(notifier.clone()).await?;
    let owner_id =
        owner_with_guardians(&service, OWNER, GUARDIANS).await?;

    // Both shards name the same guardian; storing them would leave
    // one row behind while claiming the kit is complete.
    let kit = RecoveryKit::generate([GUARDIANS[0], GUARDIANS[0]])?;
    let result =
        service.save_shards(owner_id, kit.guardian_shards).await;
    assert!(matches!(
        result,
        Err(Error::DuplicateGuardian(email)) if email == GUARDIANS[0]
    ));

    assert!(service.stored_shards(owner_id).await?.is_empty());
    let status = service.recovery_status(owner_id).await?;
    assert!(!status.has_recovery_kit);
    Ok(())
}

#[tokio::test]
async fn shards_wrong_count_rejected() -> Result<()> {
    let notifier = Arc::new(MockNotifier::default());
    let service = memory_service(notifier.clone()).await?;
    let owner_id =
        owner_with_guardians(&service, OWNER, GUARDIANS).await?;

    let kit = RecoveryKit::generate(GUARDIANS)?;
    let one: Vec<RecoveryShardPayload> =
        kit.guardian_shards[..1].to_vec();
    let result = service.save_shards(owner_id, one).await;
    assert!(matches!(result, Err(Error::ShardCount(2))));
    Ok(())
}

#[tokio::test]
async fn guardian_directory() -> Result<()> {
    let notifier = Arc::new(MockNotifier::default());
    let service = memory_service(notifier.clone()).await?;
    let owner_id =
        svr_integration_tests::insert_owner(&service, OWNER).await?;

    let record = service
        .invite_guardian(owner_id, "  Alice@Example.COM ")
        .await?;
    assert_eq!("alice@example.com", record.email);

    // Same guardian cannot be invited twice.
    let result =
        service.invite_guardian(owner_id, GUARDIANS[0]).await;
    assert!(matches!(result, Err(Error::GuardianAlreadyInvited(_))));

    service.accept_guardian(owner_id, record.guardian_id).await?;
    let guardians = service.list_guardians(owner_id).await?;
    assert_eq!(1, guardians.len());
    assert_eq!(
        svr_core::GuardianStatus::Active,
        guardians[0].status
    );

    // Unknown callers are rejected before any lookups.
    let result = service
        .list_guardians(OwnerId::new_v4())
        .await;
    assert!(matches!(result, Err(Error::Unauthorized)));
    Ok(())
}
