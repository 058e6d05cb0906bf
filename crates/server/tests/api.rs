use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;
use server::{Identity, IdentityVerifier, ServerState, router};

const ALICE_TOKEN: &str = "token-alice";
const BOB_TOKEN: &str = "token-bob";

async fn engine() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

fn verifier() -> IdentityVerifier {
    IdentityVerifier::from_tokens([
        (
            ALICE_TOKEN.to_string(),
            Identity {
                uid: "uid-alice".to_string(),
                email: Some("alice@example.com".to_string()),
                display_name: Some("Alice".to_string()),
                ..Default::default()
            },
        ),
        (
            BOB_TOKEN.to_string(),
            Identity {
                uid: "uid-bob".to_string(),
                ..Default::default()
            },
        ),
    ])
}

async fn app() -> Router {
    router(ServerState::new(engine().await, verifier()))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_expense(app: &Router, token: &str, amount: i64) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/movements",
        Some(token),
        Some(json!({
            "type": "expense",
            "amount": amount,
            "currency": "CRC",
            "description": "",
            "status": "pending",
            "date": "2024-01-01",
            "tags": []
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn health_is_public() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["app"], "Suma");
    assert_eq!(body["identity"], "configured");
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let app = app().await;

    let (status, body) = send(&app, "GET", "/api/v1/movements", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Authorization header required");

    let (status, _) = send(&app, "GET", "/api/v1/kpis/summary", Some("nope"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/v1/auth/me")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unconfigured_identity_returns_503() {
    let app = router(ServerState::new(engine().await, IdentityVerifier::Disabled));

    let (status, body) = send(&app, "GET", "/api/v1/movements", Some("token"), None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["detail"].is_string());

    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identity"], "not_configured");
}

#[tokio::test]
async fn create_generates_default_description() {
    let app = app().await;
    let body = create_expense(&app, ALICE_TOKEN, 5000).await;

    assert_eq!(body["description"], "Gasto del 2024-01-01");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["type"], "expense");
    assert_eq!(body["amount"], 5000);
    assert_eq!(body["currency"], "CRC");
    assert_eq!(body["responsible"], Value::Null);
    assert!(body["id"].is_string());
}

#[tokio::test]
async fn create_rejects_invalid_input() {
    let app = app().await;

    for payload in [
        json!({"type": "income", "amount": 12.5}),
        json!({"type": "income", "amount": 0}),
        json!({"type": "income", "amount": -100}),
        json!({"type": "income", "amount": 100, "currency": "USD"}),
        json!({"type": "income", "amount": 100, "status": "closed"}),
        json!({"type": "gift", "amount": 100}),
    ] {
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/movements",
            Some(ALICE_TOKEN),
            Some(payload.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{payload}");
        assert!(body["detail"].is_string(), "{payload}");
    }

    let (_, list) = send(&app, "GET", "/api/v1/movements", Some(ALICE_TOKEN), None).await;
    assert_eq!(list.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn amounts_are_stored_exactly_or_rejected() {
    let app = app().await;

    for amount in [
        json!(9_007_199_254_740_992u64),
        json!(9_007_199_254_740_993u64),
        json!(5_000_000_000_000_000_000u64),
        json!(1e300),
    ] {
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/movements",
            Some(ALICE_TOKEN),
            Some(json!({"type": "income", "amount": amount})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{amount}");
        assert!(body["detail"].is_string(), "{amount}");
    }

    let (status, created) = send(
        &app,
        "POST",
        "/api/v1/movements",
        Some(ALICE_TOKEN),
        Some(json!({"type": "income", "amount": 9_007_199_254_740_991u64})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["amount"], 9_007_199_254_740_991u64);

    let uri = format!("/api/v1/movements/{}", created["id"].as_str().unwrap());
    let (status, _) = send(
        &app,
        "PATCH",
        &uri,
        Some(ALICE_TOKEN),
        Some(json!({"amount": 9_007_199_254_740_993u64})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, fetched) = send(&app, "GET", &uri, Some(ALICE_TOKEN), None).await;
    assert_eq!(fetched["amount"], 9_007_199_254_740_991u64);
}

#[tokio::test]
async fn kpi_summary_of_largest_amounts_succeeds() {
    let app = app().await;
    for _ in 0..2 {
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/movements",
            Some(ALICE_TOKEN),
            Some(json!({"type": "income", "amount": 9_007_199_254_740_991u64})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, summary) =
        send(&app, "GET", "/api/v1/kpis/summary", Some(ALICE_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK, "{summary}");
    assert_eq!(summary["total_income"], 18_014_398_509_481_982u64);
    assert_eq!(summary["balance"], 18_014_398_509_481_982u64);
}

#[tokio::test]
async fn classify_clears_blank_responsible_and_never_reverts() {
    let app = app().await;
    let created = create_expense(&app, ALICE_TOKEN, 12000).await;
    let uri = format!("/api/v1/movements/{}", created["id"].as_str().unwrap());

    let (status, body) = send(
        &app,
        "PATCH",
        &uri,
        Some(ALICE_TOKEN),
        Some(json!({"status": "classified", "responsible": "Maria"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["responsible"], "Maria");

    let (status, body) = send(
        &app,
        "PATCH",
        &uri,
        Some(ALICE_TOKEN),
        Some(json!({"status": "closed", "responsible": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "closed");
    assert_eq!(body["responsible"], Value::Null);

    let (status, _) = send(
        &app,
        "PATCH",
        &uri,
        Some(ALICE_TOKEN),
        Some(json!({"status": "pending"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = send(&app, "GET", &uri, Some(ALICE_TOKEN), None).await;
    assert_eq!(body["status"], "closed");
}

#[tokio::test]
async fn pending_filter_is_subset_of_all() {
    let app = app().await;
    let first = create_expense(&app, ALICE_TOKEN, 1000).await;
    create_expense(&app, ALICE_TOKEN, 2000).await;
    let uri = format!("/api/v1/movements/{}", first["id"].as_str().unwrap());
    send(
        &app,
        "PATCH",
        &uri,
        Some(ALICE_TOKEN),
        Some(json!({"status": "closed"})),
    )
    .await;

    let (_, all) = send(&app, "GET", "/api/v1/movements", Some(ALICE_TOKEN), None).await;
    let (_, all_explicit) = send(
        &app,
        "GET",
        "/api/v1/movements?status=all",
        Some(ALICE_TOKEN),
        None,
    )
    .await;
    let (_, pending) = send(
        &app,
        "GET",
        "/api/v1/movements?status=pending",
        Some(ALICE_TOKEN),
        None,
    )
    .await;

    let all = all.as_array().unwrap();
    let pending = pending.as_array().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all_explicit.as_array().unwrap().len(), 2);
    assert_eq!(pending.len(), 1);
    for movement in pending {
        assert_eq!(movement["status"], "pending");
        assert!(all.iter().any(|m| m["id"] == movement["id"]));
    }

    let (status, _) = send(
        &app,
        "GET",
        "/api/v1/movements?status=archived",
        Some(ALICE_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        "GET",
        "/api/v1/movements?limit=500",
        Some(ALICE_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn movements_are_isolated_per_user() {
    let app = app().await;
    let created = create_expense(&app, ALICE_TOKEN, 1000).await;
    let uri = format!("/api/v1/movements/{}", created["id"].as_str().unwrap());

    let (_, list) = send(&app, "GET", "/api/v1/movements", Some(BOB_TOKEN), None).await;
    assert!(list.as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        "PATCH",
        &uri,
        Some(BOB_TOKEN),
        Some(json!({"status": "closed"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &uri, Some(BOB_TOKEN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, summary) = send(&app, "GET", "/api/v1/kpis/summary", Some(BOB_TOKEN), None).await;
    assert_eq!(summary["movement_count"], 0);

    let missing = format!("/api/v1/movements/{}", uuid::Uuid::new_v4());
    let (status, body) = send(&app, "GET", &missing, Some(ALICE_TOKEN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn delete_reports_deleted() {
    let app = app().await;
    let created = create_expense(&app, ALICE_TOKEN, 1000).await;
    let uri = format!("/api/v1/movements/{}", created["id"].as_str().unwrap());

    let (status, body) = send(&app, "DELETE", &uri, Some(ALICE_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"deleted": true}));

    let (status, _) = send(&app, "DELETE", &uri, Some(ALICE_TOKEN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn kpi_summary_balances() {
    let app = app().await;
    create_expense(&app, ALICE_TOKEN, 12000).await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/movements",
        Some(ALICE_TOKEN),
        Some(json!({"type": "income", "amount": 45000, "responsible": "Maria"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, summary) =
        send(&app, "GET", "/api/v1/kpis/summary", Some(ALICE_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["period"], Value::Null);
    assert_eq!(summary["total_income"], 45000);
    assert_eq!(summary["total_expense"], 12000);
    assert_eq!(summary["balance"], 33000);
    assert_eq!(summary["movement_count"], 2);
    assert_eq!(summary["pending_count"], 2);
    assert_eq!(
        summary["breakdown_responsible"],
        json!([
            {"name": "Maria", "value": 45000},
            {"name": "Sin responsable", "value": 12000}
        ])
    );

    // The income above is dated today, the expense in 2024.
    let (status, today) = send(
        &app,
        "GET",
        "/api/v1/kpis/summary?period=today",
        Some(ALICE_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(today["period"], "today");
    assert_eq!(today["total_income"], 45000);
    assert_eq!(today["total_expense"], 0);

    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/kpis/summary?period=year",
        Some(ALICE_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn register_upserts_and_me_reads_back() {
    let app = app().await;

    let (status, _) = send(&app, "GET", "/api/v1/auth/me", Some(ALICE_TOKEN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, user) = send(
        &app,
        "POST",
        "/api/v1/auth/register",
        Some(ALICE_TOKEN),
        Some(json!({"display_name": "Alice P.", "photo_url": null})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["id"], "uid-alice");
    assert_eq!(user["email"], "alice@example.com");
    assert_eq!(user["display_name"], "Alice P.");

    let (status, user) = send(
        &app,
        "POST",
        "/api/v1/auth/register",
        Some(ALICE_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["display_name"], "Alice");

    let (status, me) = send(&app, "GET", "/api/v1/auth/me", Some(ALICE_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], "uid-alice");
}

#[tokio::test]
async fn catalogs_are_public() {
    let app = app().await;

    let (status, unit) = send(
        &app,
        "POST",
        "/api/v1/business-units",
        None,
        Some(json!({"name": "Sucursal Centro", "type": "branch"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(unit["type"], "branch");

    let (status, units) = send(&app, "GET", "/api/v1/business-units", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(units.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "POST", "/api/v1/tags", None, Some(json!({"name": "SINPE"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) =
        send(&app, "POST", "/api/v1/tags", None, Some(json!({"name": "sinpe"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["detail"].is_string());

    let (_, tags) = send(&app, "GET", "/api/v1/tags", None, None).await;
    assert_eq!(tags.as_array().unwrap().len(), 1);

    // Movements can reference the new unit.
    let (status, movement) = send(
        &app,
        "POST",
        "/api/v1/movements",
        Some(ALICE_TOKEN),
        Some(json!({"type": "income", "amount": 1000, "business_unit_id": unit["id"]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(movement["business_unit_id"], unit["id"]);
}
