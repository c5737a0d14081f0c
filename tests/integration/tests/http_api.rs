use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use std::sync::Arc;
use svr_integration_tests::{
    extract_token, memory_service, owner_with_guardians, MockNotifier,
};
use svr_recovery::RecoveryKit;
use tower::ServiceExt;

const OWNER: &str = "owner@example.com";
const GUARDIANS: [&str; 2] =
    ["alice@example.com", "bob@example.com"];

async fn test_app(
    notifier: Arc<MockNotifier>,
) -> Result<(Router, Arc<svr_recovery::RecoveryService>)> {
    let service = Arc::new(memory_service(notifier).await?);
    let app = svr_server::router(service.clone(), Vec::new());
    Ok((app, service))
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

fn json_request(
    method: &str,
    uri: &str,
    body: serde_json::Value,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authed_json_request(
    method: &str,
    uri: &str,
    bearer: &str,
    body: serde_json::Value,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authed_request(
    method: &str,
    uri: &str,
    bearer: &str,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn http_request_recovery_indistinguishable() -> Result<()> {
    let notifier = Arc::new(MockNotifier::default());
    let (app, service) = test_app(notifier.clone()).await?;
    owner_with_guardians(&service, OWNER, GUARDIANS).await?;

    let hit = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/recover/request",
            serde_json::json!({ "email": OWNER }),
        ))
        .await?;
    let miss = app
        .oneshot(json_request(
            "POST",
            "/recover/request",
            serde_json::json!({ "email": "nobody@example.com" }),
        ))
        .await?;

    // Status and body are byte-identical either way.
    assert_eq!(StatusCode::OK, hit.status());
    assert_eq!(StatusCode::OK, miss.status());
    let hit_body = body_bytes(hit).await;
    let miss_body = body_bytes(miss).await;
    assert_eq!(hit_body, miss_body);

    // Only the real owner got a notification.
    assert_eq!(1, notifier.messages().len());
    Ok(())
}

#[tokio::test]
async fn http_cancel_link_single_use() -> Result<()> {
    let notifier = Arc::new(MockNotifier::default());
    let (app, service) = test_app(notifier.clone()).await?;
    owner_with_guardians(&service, OWNER, GUARDIANS).await?;
    service.request_recovery(OWNER).await?;

    let url = notifier.last_cancel_url().unwrap();
    let token = extract_token(&url).unwrap();
    let uri = format!("/recover/cancel?token={}", token);

    let first = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(&uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await?;
    assert_eq!(StatusCode::OK, first.status());
    let body: serde_json::Value =
        serde_json::from_slice(&body_bytes(first).await)?;
    assert_eq!(Some(true), body["ok"].as_bool());

    // Second click and a bogus token give identical rejections.
    let second = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(&uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await?;
    let bogus = app
        .oneshot(
            Request::builder()
                .uri("/recover/cancel?token=deadbeef")
                .body(Body::empty())
                .unwrap(),
        )
        .await?;
    assert_eq!(StatusCode::OK, second.status());
    assert_eq!(StatusCode::OK, bogus.status());
    let second_body = body_bytes(second).await;
    let bogus_body = body_bytes(bogus).await;
    assert_eq!(second_body, bogus_body);
    let body: serde_json::Value =
        serde_json::from_slice(&second_body)?;
    assert_eq!(Some(false), body["ok"].as_bool());
    Ok(())
}

#[tokio::test]
async fn http_bearer_auth() -> Result<()> {
    let notifier = Arc::new(MockNotifier::default());
    let (app, service) = test_app(notifier).await?;
    let owner_id =
        svr_integration_tests::insert_owner(&service, OWNER).await?;

    // Missing header is rejected by the extractor.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/recover/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await?;
    assert_eq!(StatusCode::BAD_REQUEST, response.status());

    // Malformed bearer is unauthorized.
    let response = app
        .clone()
        .oneshot(authed_request(
            "GET",
            "/recover/status",
            "not-a-uuid",
        ))
        .await?;
    assert_eq!(StatusCode::UNAUTHORIZED, response.status());

    // Unknown but well-formed owner is unauthorized too.
    let response = app
        .clone()
        .oneshot(authed_request(
            "GET",
            "/recover/status",
            &svr_core::OwnerId::new_v4().to_string(),
        ))
        .await?;
    assert_eq!(StatusCode::UNAUTHORIZED, response.status());

    let response = app
        .oneshot(authed_request(
            "GET",
            "/recover/status",
            &owner_id.to_string(),
        ))
        .await?;
    assert_eq!(StatusCode::OK, response.status());
    let body: serde_json::Value =
        serde_json::from_slice(&body_bytes(response).await)?;
    assert_eq!(Some(false), body["hasRecoveryKit"].as_bool());
    Ok(())
}

#[tokio::test]
async fn http_save_shards() -> Result<()> {
    let notifier = Arc::new(MockNotifier::default());
    let (app, service) = test_app(notifier).await?;
    let owner_id =
        owner_with_guardians(&service, OWNER, GUARDIANS).await?;
    let bearer = owner_id.to_string();

    let kit = RecoveryKit::generate(GUARDIANS)?;
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "PUT",
            "/recover/shards",
            &bearer,
            serde_json::to_value(&kit.guardian_shards)?,
        ))
        .await?;
    assert_eq!(StatusCode::OK, response.status());

    let response = app
        .clone()
        .oneshot(authed_request(
            "GET",
            "/recover/status",
            &bearer,
        ))
        .await?;
    let body: serde_json::Value =
        serde_json::from_slice(&body_bytes(response).await)?;
    assert_eq!(Some(true), body["hasRecoveryKit"].as_bool());

    // Wrong number of shards is a bad request.
    let response = app
        .oneshot(authed_json_request(
            "PUT",
            "/recover/shards",
            &bearer,
            serde_json::to_value(&kit.guardian_shards[..1])?,
        ))
        .await?;
    assert_eq!(StatusCode::BAD_REQUEST, response.status());
    Ok(())
}

#[tokio::test]
async fn http_guardian_routes() -> Result<()> {
    let notifier = Arc::new(MockNotifier::default());
    let (app, service) = test_app(notifier).await?;
    let owner_id =
        svr_integration_tests::insert_owner(&service, OWNER).await?;
    let bearer = owner_id.to_string();

    let response = app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/recover/guardians",
            &bearer,
            serde_json::json!({ "email": GUARDIANS[0] }),
        ))
        .await?;
    assert_eq!(StatusCode::OK, response.status());
    let body: serde_json::Value =
        serde_json::from_slice(&body_bytes(response).await)?;
    let guardian_id = body["guardianId"].as_str().unwrap().to_owned();
    assert_eq!(Some("pending"), body["status"].as_str());

    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            &format!("/recover/guardians/{}/accept", guardian_id),
            &bearer,
        ))
        .await?;
    assert_eq!(StatusCode::OK, response.status());

    let response = app
        .oneshot(authed_request(
            "GET",
            "/recover/guardians",
            &bearer,
        ))
        .await?;
    let body: serde_json::Value =
        serde_json::from_slice(&body_bytes(response).await)?;
    assert_eq!(1, body.as_array().unwrap().len());
    assert_eq!(Some("active"), body[0]["status"].as_str());
    Ok(())
}

#[tokio::test]
async fn http_cancel_request_route() -> Result<()> {
    let notifier = Arc::new(MockNotifier::default());
    let (app, service) = test_app(notifier).await?;
    let owner_id =
        owner_with_guardians(&service, OWNER, GUARDIANS).await?;
    let bearer = owner_id.to_string();

    service.request_recovery(OWNER).await?;
    let requests = service.pending_requests(owner_id).await?;
    let request_id = requests[0].request_id;

    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            &format!("/recover/cancel/{}", request_id),
            &bearer,
        ))
        .await?;
    assert_eq!(StatusCode::OK, response.status());

    let response = app
        .oneshot(authed_request(
            "POST",
            &format!("/recover/cancel/{}", request_id),
            &bearer,
        ))
        .await?;
    assert_eq!(StatusCode::NOT_FOUND, response.status());
    Ok(())
}
