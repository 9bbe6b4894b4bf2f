use std::collections::HashSet;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use database::services::interaction::InteractionService;
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;
use server::{
    AppState,
    answers::{AnswerSelector, CANNED_ANSWERS},
    build_router,
    dtos::question::InteractionResponse,
};
use tower::util::ServiceExt;

async fn setup() -> (Router, InteractionService) {
    let (app, interactions, _) = setup_with_db().await;
    (app, interactions)
}

async fn setup_with_db() -> (Router, InteractionService, DatabaseConnection) {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None).await.expect("Failed to migrate");

    let interactions = InteractionService::new(db.clone());
    let state = AppState::new(interactions.clone(), AnswerSelector::seeded(1));
    (build_router(state), interactions, db)
}

fn ask(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/questions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

#[tokio::test]
async fn post_question_returns_created_with_canned_answer() {
    let (app, interactions) = setup().await;

    let response = app
        .oneshot(ask(r#"{"question":"Will it rain?"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );

    let body: InteractionResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body.question, "Will it rain?");
    assert!(CANNED_ANSWERS.contains(&body.answer.as_str()));
    assert_eq!(interactions.count().await.unwrap(), 1);
}

#[tokio::test]
async fn post_question_without_content_type_is_accepted() {
    let (app, _) = setup().await;

    let request = Request::builder()
        .method("POST")
        .uri("/questions")
        .body(Body::from(r#"{"question":"Is it Friday?"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn response_exposes_identity_and_timestamps_only() {
    let (app, _) = setup().await;

    let response = app.oneshot(ask(r#"{"question":"Why?"}"#)).await.unwrap();
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();

    let mut keys: Vec<_> = body.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    assert_eq!(
        keys,
        ["answer", "created_at", "id", "question", "updated_at"]
    );
}

#[tokio::test]
async fn malformed_bodies_are_rejected_without_writing() {
    let (app, interactions) = setup().await;

    for body in [
        "",
        "{",
        "null",
        "[]",
        r#"{"q":"Will it rain?"}"#,
        r#"{"question":5}"#,
        r#"{"question":null}"#,
    ] {
        let response = app.clone().oneshot(ask(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body:?}");
        assert!(body_bytes(response).await.is_empty());
    }

    assert_eq!(interactions.count().await.unwrap(), 0);
}

#[tokio::test]
async fn posted_interaction_is_listed() {
    let (app, _) = setup().await;

    let response = app
        .clone()
        .oneshot(ask(r#"{"question":"Will it rain?"}"#))
        .await
        .unwrap();
    let created: InteractionResponse =
        serde_json::from_slice(&body_bytes(response).await).unwrap();

    let response = app.oneshot(get("/questions")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let listed: Vec<InteractionResponse> =
        serde_json::from_slice(&body_bytes(response).await).unwrap();
    let found = listed.iter().find(|i| i.id == created.id).unwrap();
    assert_eq!(found.question, "Will it rain?");
    assert_eq!(found.answer, created.answer);
}

#[tokio::test]
async fn empty_store_lists_no_interactions() {
    let (app, _) = setup().await;

    let response = app.oneshot(get("/questions")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"[]");
}

#[tokio::test]
async fn readiness_follows_row_count() {
    let (app, _) = setup().await;

    let response = app.clone().oneshot(get("/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app
        .clone()
        .oneshot(ask(r#"{"question":"Ready?"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.oneshot(get("/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_is_ok_even_when_database_is_gone() {
    let (app, _, db) = setup_with_db().await;
    db.close().await.unwrap();

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.is_empty());

    let response = app.clone().oneshot(get("/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app.clone().oneshot(get("/questions")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_bytes(response).await.is_empty());

    let response = app.oneshot(ask(r#"{"question":"Hello?"}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn concurrent_posts_get_unique_ids() {
    const N: usize = 25;
    let (app, interactions) = setup().await;

    let handles: Vec<_> = (0..N)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let body = format!(r#"{{"question":"Question {i}"}}"#);
                let response = app.oneshot(ask(body)).await.unwrap();
                assert_eq!(response.status(), StatusCode::CREATED);
                let created: InteractionResponse =
                    serde_json::from_slice(&body_bytes(response).await).unwrap();
                created.id
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap());
    }

    assert_eq!(ids.len(), N);
    assert_eq!(interactions.count().await.unwrap(), N as u64);
}

#[tokio::test]
async fn openapi_document_lists_routes() {
    let (app, _) = setup().await;

    let response = app.oneshot(get("/api-docs/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let doc: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    for path in ["/questions", "/health", "/readiness"] {
        assert!(doc["paths"].get(path).is_some(), "missing {path}");
    }
}
