use axum::{Json, Router, extract::Path, http::StatusCode, routing::get};
use forum::{ForumClient, ForumSettings, ScoreSource};
use tokio::net::TcpListener;

async fn profile(Path(file): Path<String>) -> Result<Json<serde_json::Value>, StatusCode> {
    match file.as_str() {
        "alice.json" => Ok(Json(
            serde_json::json!({ "user": { "username": "alice", "gamification_score": 1234 } }),
        )),
        "nouser.json" => Ok(Json(serde_json::json!({ "users": [] }))),
        "noscore.json" => Ok(Json(serde_json::json!({ "user": { "username": "noscore" } }))),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn fake_forum() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/u/{file}", get(profile));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base_url: String) -> ForumClient {
    ForumClient::new(&ForumSettings {
        base_url,
        proxy: None,
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn reads_gamification_score() {
    let forum = client(fake_forum().await);
    assert_eq!(forum.fetch_score("alice").await.unwrap(), 1234);
    assert_eq!(forum.gamification_score("alice").await, 1234);
}

#[tokio::test]
async fn missing_score_field_is_zero() {
    let forum = client(fake_forum().await);
    assert_eq!(forum.fetch_score("noscore").await.unwrap(), 0);
}

#[tokio::test]
async fn failures_degrade_to_zero() {
    let forum = client(fake_forum().await);

    assert!(forum.fetch_score("ghost").await.is_err());
    assert_eq!(forum.gamification_score("ghost").await, 0);

    assert!(matches!(
        forum.fetch_score("nouser").await,
        Err(forum::ForumError::MissingUser)
    ));
    assert_eq!(forum.gamification_score("nouser").await, 0);
}

#[tokio::test]
async fn unreachable_forum_degrades_to_zero() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let forum = client(format!("http://{addr}"));
    assert_eq!(forum.gamification_score("alice").await, 0);
}
