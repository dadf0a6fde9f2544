use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use engine::Engine;
use forum::StaticScores;
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::Database;
use serde_json::{Value, json};
use server::{ServerSettings, ServerState, router};
use tower::ServiceExt;

const SYNC_KEY: &str = "sync-secret";
const PUBLIC_URL: &str = "https://points.example";

async fn state() -> ServerState {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    let scores = StaticScores::default()
        .with("alice", 200)
        .with("bob", 5000)
        .with("dev", 10);

    ServerState {
        engine: Arc::new(engine),
        scores: Arc::new(scores),
        settings: Arc::new(ServerSettings {
            public_url: format!("{PUBLIC_URL}/"),
            sync_key: SYNC_KEY.to_string(),
            ..ServerSettings::default()
        }),
    }
}

fn request(method: &str, uri: &str, auth: Option<String>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn call(state: &ServerState, request: Request<Body>) -> (StatusCode, Value) {
    let response = router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn bearer(token: &str) -> Option<String> {
    Some(format!("Bearer {token}"))
}

async fn login(state: &ServerState, id: i64, username: &str, trust_level: i32) -> String {
    let request = Request::builder()
        .method("POST")
        .uri("/auth/sync")
        .header("x-sync-key", SYNC_KEY)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "id": id, "username": username, "name": username, "trust_level": trust_level })
                .to_string(),
        ))
        .unwrap();
    let (status, body) = call(state, request).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["session_token"].as_str().unwrap().to_string()
}

fn token_of(confirm_url: &Value) -> String {
    let url = confirm_url.as_str().unwrap();
    let prefix = format!("{PUBLIC_URL}/confirm/");
    assert!(url.starts_with(&prefix), "{url}");
    url[prefix.len()..].to_string()
}

#[tokio::test]
async fn sync_requires_the_shared_key() {
    let state = state().await;
    let body = json!({ "id": 1, "username": "alice" });

    let (status, _) = call(&state, request("POST", "/auth/sync", None, Some(body.clone()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .method("POST")
        .uri("/auth/sync")
        .header("x-sync-key", "guess")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, _) = call(&state, wrong).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login(&state, 1, "alice", 1).await;
    let (status, me) = call(&state, request("GET", "/me", bearer(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "alice");
    assert_eq!(me["actual_score"], 200);
    assert_eq!(me["original_score"], 200);
}

#[tokio::test]
async fn session_routes_require_a_live_session() {
    let state = state().await;

    let (status, _) = call(&state, request("GET", "/me", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&state, request("GET", "/me", bearer("bogus"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login(&state, 1, "alice", 1).await;
    let (status, _) = call(&state, request("POST", "/auth/logout", bearer(&token), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&state, request("GET", "/me", bearer(&token), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn app_consumption_flow() {
    let state = state().await;
    let dev = login(&state, 10, "dev", 2).await;
    let alice = login(&state, 1, "alice", 1).await;
    let bob = login(&state, 2, "bob", 1).await;

    let (status, app) = call(
        &state,
        request(
            "POST",
            "/apps",
            bearer(&dev),
            Some(json!({ "name": "Shop", "redirect_uri": "https://shop.example/done" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{app}");
    let credential = format!(
        "{}:{}",
        app["client_id"].as_str().unwrap(),
        app["client_secret"].as_str().unwrap()
    );

    let (status, apps) = call(&state, request("GET", "/apps", bearer(&dev), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(apps["apps"].as_array().unwrap().len(), 1);

    let (status, created) = call(
        &state,
        request(
            "POST",
            "/api/score/consume",
            Some(credential),
            Some(json!({ "username": "alice", "amount": 100, "purpose": "sticker" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    let token = token_of(&created["confirm_url"]);

    let (status, pending) = call(&state, request("GET", &format!("/confirm/{token}"), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending["type"], "consumption");
    assert_eq!(pending["app_name"], "Shop");
    assert_eq!(pending["amount"], 100);
    assert_eq!(pending["fee_amount"], 3);
    assert_eq!(pending["developer_amount"], 97);

    let confirm = json!({ "action": "confirm" });
    let (status, _) = call(
        &state,
        request("POST", &format!("/confirm/{token}"), bearer(&bob), Some(confirm.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, outcome) = call(
        &state,
        request("POST", &format!("/confirm/{token}"), bearer(&alice), Some(confirm.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{outcome}");
    assert_eq!(outcome["result"], "consumed");
    assert_eq!(outcome["remaining_score"], 100);
    assert_eq!(outcome["id"], created["consumption_id"]);

    let (status, _) = call(
        &state,
        request("POST", &format!("/confirm/{token}"), bearer(&alice), Some(confirm)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&state, request("GET", &format!("/confirm/{token}"), None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_app_credentials_are_rejected() {
    let state = state().await;
    let body = json!({ "username": "alice", "amount": 1 });

    for auth in [None, Some("nocolon".to_string()), Some("a:b".to_string())] {
        let (status, error) = call(
            &state,
            request("POST", "/api/score/consume", auth, Some(body.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(error["error"].is_string());
    }
}

#[tokio::test]
async fn untrusted_users_cannot_register_apps() {
    let state = state().await;
    let token = login(&state, 1, "alice", 0).await;

    let (status, _) = call(
        &state,
        request(
            "POST",
            "/apps",
            bearer(&token),
            Some(json!({ "name": "Shop", "redirect_uri": "https://shop.example" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn transfer_errors_carry_the_balance() {
    let state = state().await;
    let alice = login(&state, 1, "alice", 1).await;
    login(&state, 2, "bob", 1).await;

    let (status, error) = call(
        &state,
        request(
            "POST",
            "/api/score/transfer",
            bearer(&alice),
            Some(json!({ "to_username": "bob", "amount": 1500 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["current_score"], 200);

    let (status, error) = call(
        &state,
        request(
            "POST",
            "/api/score/transfer",
            bearer(&alice),
            Some(json!({ "to_username": "alice", "amount": 10 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(error.get("current_score").is_none());

    let (status, _) = call(
        &state,
        request(
            "POST",
            "/api/score/transfer",
            bearer(&alice),
            Some(json!({ "to_username": "ghost", "amount": 10 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn batch_transfer_flow() {
    let state = state().await;
    let bob = login(&state, 2, "bob", 1).await;
    login(&state, 1, "alice", 1).await;
    login(&state, 10, "dev", 1).await;

    let (status, created) = call(
        &state,
        request(
            "POST",
            "/api/score/transfer/batch",
            bearer(&bob),
            Some(json!({
                "recipients": [
                    { "username": "alice", "amount": 2000, "message": "prize" },
                    { "username": "dev", "amount": 100 },
                    { "username": "ghost", "amount": 100 }
                ]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["transfer_ids"].as_array().unwrap().len(), 2);
    assert_eq!(created["skipped"], json!(["ghost"]));
    let token = token_of(&created["confirm_url"]);

    let (status, pending) = call(&state, request("GET", &format!("/confirm/{token}"), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending["type"], "transfer");
    assert_eq!(pending["from_username"], "bob");
    assert_eq!(pending["batch_id"], created["batch_id"]);
    assert_eq!(pending["transfers"].as_array().unwrap().len(), 2);

    let (status, outcome) = call(
        &state,
        request(
            "POST",
            &format!("/confirm/{token}"),
            bearer(&bob),
            Some(json!({ "action": "confirm" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{outcome}");
    assert_eq!(outcome["result"], "transferred");
    assert_eq!(outcome["batch_complete"], true);
    // 2000 pays 140 in fees, 100 is free.
    assert_eq!(outcome["remaining_score"], 2900);

    let (status, records) = call(&state, request("GET", "/me/records?limit=10", bearer(&bob), None)).await;
    assert_eq!(status, StatusCode::OK);
    let records = records["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r["outgoing"] == true && r["status"] == "confirmed"));
}

#[tokio::test]
async fn leaderboard_respects_visibility() {
    let state = state().await;
    let alice = login(&state, 1, "alice", 1).await;
    login(&state, 2, "bob", 1).await;

    let (status, board) = call(&state, request("GET", "/leaderboard?kind=balance", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["kind"], "balance");
    assert_eq!(board["entries"][0]["username"], "bob");
    assert_eq!(board["entries"][0]["rank"], 1);
    assert_eq!(board["entries"][1]["username"], "alice");

    let (status, me) = call(
        &state,
        request("POST", "/me/leaderboard", bearer(&alice), Some(json!({ "show": false }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["show_in_leaderboard"], false);

    let (_, board) = call(&state, request("GET", "/leaderboard?limit=5", None, None)).await;
    let entries = board["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["username"], "bob");
}
