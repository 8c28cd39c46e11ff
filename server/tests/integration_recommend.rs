use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use reco_core::{Engine, EngineHandle};
use serde_json::Value;
use tower::ServiceExt;

const CORPUS: &str = "\
course_title,course_organization,course_certificate_type,course_rating,course_difficulty,course_students_enrolled
Intro to Python,OrgA,COURSE,4.5,Beginner,10k
Advanced Python,,COURSE,4.0,Advanced,2k
Cooking Basics,OrgC,COURSE,4.9,Beginner,50k
";

fn ready_app() -> Router {
    let engine = Engine::from_reader(CORPUS.as_bytes(), "inline").unwrap();
    server::build_app(EngineHandle::ready(engine), 5)
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let req = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

#[tokio::test]
async fn recommend_returns_ranked_results() {
    let (status, json) = get(ready_app(), "/recommend?q=python&k=2").await;
    assert_eq!(status, StatusCode::OK);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    for hit in arr {
        assert!(hit["title"].as_str().unwrap().contains("Python"));
    }
}

#[tokio::test]
async fn empty_query_matches_trending() {
    let (_, rec) = get(ready_app(), "/recommend?q=&k=3").await;
    let (_, trend) = get(ready_app(), "/trending?k=3").await;
    assert_eq!(rec["results"], trend["results"]);
    assert_eq!(trend["results"][0]["title"], "Cooking Basics");
}

#[tokio::test]
async fn not_ready_engine_is_unavailable() {
    let app = server::build_app(EngineHandle::new(), 5);
    let (status, _) = get(app.clone(), "/recommend?q=python").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let (status, json) = get(app, "/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "not_ready");
}

#[tokio::test]
async fn failed_engine_reports_error() {
    let handle = EngineHandle::new();
    handle.complete(Err("corpus missing".into()));
    let (status, json) = get(server::build_app(handle, 5), "/trending").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("corpus missing"));
}

#[tokio::test]
async fn spawned_build_becomes_ready() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("courses.csv");
    std::fs::write(&path, CORPUS).unwrap();
    let handle = EngineHandle::new();
    server::spawn_build(handle.clone(), server::EngineSource::Corpus(path.to_string_lossy().to_string()))
        .await
        .unwrap();
    let (status, json) = get(server::build_app(handle, 5), "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ready");
}

#[tokio::test]
async fn webhook_replies_in_band() {
    let body = r#"{"update_id":1,"message":{"message_id":7,"chat":{"id":42},"text":"python"}}"#;
    let (status, json) = post(ready_app(), "/webhook", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["method"], "sendMessage");
    assert_eq!(json["chat_id"], 42);
    let text = json["text"].as_str().unwrap();
    assert!(text.starts_with("📘 "));
    assert!(text.contains("🏫 N/A | ⭐ 4.0"));
}

#[tokio::test]
async fn webhook_start_greets() {
    let body = r#"{"message":{"chat":{"id":1},"text":"/start"}}"#;
    let (_, json) = post(ready_app(), "/webhook", body).await;
    assert_eq!(json["text"], server::GREETING);
}

#[tokio::test]
async fn webhook_start_with_bot_suffix_greets() {
    let body = r#"{"message":{"chat":{"id":1},"text":"/start@CourseBot"}}"#;
    let (_, json) = post(ready_app(), "/webhook", body).await;
    assert_eq!(json["method"], "sendMessage");
    assert_eq!(json["text"], server::GREETING);
}

#[tokio::test]
async fn webhook_ignores_other_commands() {
    let body = r#"{"message":{"chat":{"id":1},"text":"/help"}}"#;
    let (status, json) = post(ready_app(), "/webhook", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert!(json.get("method").is_none());
}

#[tokio::test]
async fn webhook_ignores_blank_text_and_rejects_garbage() {
    let (status, json) = post(ready_app(), "/webhook", r#"{"message":{"chat":{"id":1},"text":"   "}}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);

    let (status, _) = post(ready_app(), "/webhook", "not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn webhook_before_ready_sends_failure_message() {
    let app = server::build_app(EngineHandle::new(), 5);
    let (_, json) = post(app, "/webhook", r#"{"message":{"chat":{"id":3},"text":"python"}}"#).await;
    assert_eq!(json["text"], server::FAILURE_REPLY);
}
