mod common;

use axum::http::StatusCode;
use ticketing_core::ObjectId;

use auth::Role;
use common::{access_token, TestApp};

#[tokio::test]
async fn test_current_user_projection() {
    let app = TestApp::new();
    app.register("87770000011").await;
    let token = access_token(&app.login("87770000011").await);

    let (status, body) = app.get("/users/data", &token).await;
    assert_eq!(status, StatusCode::OK);

    let object = body.as_object().unwrap();
    for key in ["_id", "role", "purchases", "events", "phone", "firstName", "lastName"] {
        assert!(object.contains_key(key), "missing {}", key);
    }
    assert!(!object.contains_key("password"));
    assert!(!object.contains_key("passwordHash"));
}

#[tokio::test]
async fn test_user_by_id() {
    let app = TestApp::new();
    app.register("87770000013").await;
    let (_, second) = app.register("87770000014").await;
    let token = access_token(&app.login("87770000013").await);

    let uri = format!("/users/data/{}", second["_id"].as_str().unwrap());
    let (status, body) = app.get(&uri, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phone"], "87770000014");
}

#[tokio::test]
async fn test_user_by_unknown_id() {
    let app = TestApp::new();
    app.register("87770000015").await;
    let token = access_token(&app.login("87770000015").await);

    let (status, _) = app
        .get(&format!("/users/data/{}", ObjectId::new()), &token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_by_well_formed_unknown_hex_id() {
    let app = TestApp::new();
    app.register("87770000018").await;
    let token = access_token(&app.login("87770000018").await);

    for uri in [
        "/users/data/5eb5a36794d860bfe1c9f9a3",
        "/api/users/data/5eb5a36794d860bfe1c9f9a3",
    ] {
        let (status, _) = app.get(uri, &token).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[tokio::test]
async fn test_user_ids_are_24_hex_characters() {
    let app = TestApp::new();
    let (status, body) = app.register("87770000019").await;
    assert_eq!(status, StatusCode::CREATED);

    let id = body["_id"].as_str().unwrap();
    assert_eq!(id.len(), 24);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn test_user_by_malformed_id() {
    let app = TestApp::new();
    app.register("87770000016").await;
    let token = access_token(&app.login("87770000016").await);

    let (status, _) = app.get("/users/data/INVALID_ID", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_by_id_requires_auth() {
    let app = TestApp::new();
    let (status, _) = app
        .send(
            axum::http::Method::GET,
            &format!("/users/data/{}", ObjectId::new()),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_survives_in_projection() {
    let app = TestApp::new();
    let token = app.login_as("87770000017", Role::Organizer).await;

    let (_, body) = app.get("/users/data", &token).await;
    assert_eq!(body["role"], "organizer");
}
