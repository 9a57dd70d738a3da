//! End-to-end tests of the legacy `/session/*`, `/health`, `/rooms` and
//! `/lobbies` REST surface preserved for backward compatibility.

mod test_helpers;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use test_helpers::{http_url, spawn_app};

#[tokio::test]
async fn host_then_join_by_code_round_trips() {
    let (addr, _state) = spawn_app().await;
    let client = Client::new();

    let hosted: Value = client
        .post(http_url(addr, "/session/host"))
        .json(&json!({"lobby_name": "Legacy", "public": true}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(hosted["success"], true);
    let code = hosted["code"].as_str().unwrap().to_string();
    assert_eq!(hosted["ws_url"], format!("/ws/{code}"));
    assert_eq!(hosted["lobby_name"], "Legacy");

    let response = client
        .post(http_url(addr, &format!("/session/join/{code}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["name"], "Legacy");
}

#[tokio::test]
async fn debug_mode_always_returns_fixed_test_code() {
    let (addr, _state) = spawn_app().await;
    let client = Client::new();

    let hosted: Value = client
        .post(http_url(addr, "/session/host"))
        .json(&json!({"is_debug": true}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(hosted["code"], "TEST");

    // Hosting again in debug mode overwrites the previous TEST room rather
    // than failing on collision.
    let hosted_again: Value = client
        .post(http_url(addr, "/session/host"))
        .json(&json!({"is_debug": true, "lobby_name": "Second"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(hosted_again["code"], "TEST");
    assert_eq!(hosted_again["lobby_name"], "Second");
}

#[tokio::test]
async fn join_unknown_code_returns_404_room_not_found() {
    let (addr, _state) = spawn_app().await;
    let client = Client::new();

    let response = client
        .post(http_url(addr, "/session/join/ZZZZ"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "ROOM_NOT_FOUND");
}

#[tokio::test]
async fn players_endpoint_updates_advisory_count() {
    let (addr, _state) = spawn_app().await;
    let client = Client::new();

    let hosted: Value = client
        .post(http_url(addr, "/session/host"))
        .json(&json!({}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let code = hosted["code"].as_str().unwrap().to_string();

    let response: Value = client
        .post(http_url(addr, &format!("/session/players/{code}")))
        .json(&json!({"player_count": 3}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(response["player_count"], 3);
}

#[tokio::test]
async fn close_removes_the_room_from_rooms_listing() {
    let (addr, _state) = spawn_app().await;
    let client = Client::new();

    let hosted: Value = client
        .post(http_url(addr, "/session/host"))
        .json(&json!({"lobby_name": "Closeable"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let code = hosted["code"].as_str().unwrap().to_string();

    let close_response = client
        .post(http_url(addr, &format!("/session/close/{code}")))
        .send()
        .await
        .unwrap();
    assert_eq!(close_response.status(), StatusCode::OK);

    let rooms: Value = client
        .get(http_url(addr, "/rooms"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(rooms["rooms"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn health_reports_live_counts() {
    let (addr, _state) = spawn_app().await;
    let client = Client::new();

    client
        .post(http_url(addr, "/session/host"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    let health: Value = client
        .get(http_url(addr, "/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["rooms"], 1);
}

#[tokio::test]
async fn lobbies_endpoint_uses_legacy_pascal_case_shape() {
    let (addr, _state) = spawn_app().await;
    let client = Client::new();

    client
        .post(http_url(addr, "/session/host"))
        .json(&json!({"lobby_name": "PascalCase", "public": true, "player_limit": 5}))
        .send()
        .await
        .unwrap();

    let lobbies: Value = client
        .get(http_url(addr, "/lobbies"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let items = lobbies["lobbies"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["Name"], "PascalCase");
    assert_eq!(items[0]["PlayerLimit"], 5);
    assert_eq!(items[0]["Public"], true);
    assert_eq!(items[0]["HasPassword"], false);
}

#[tokio::test]
async fn preflight_options_request_succeeds_with_empty_body() {
    let (addr, _state) = spawn_app().await;
    let client = Client::new();

    let response = client
        .request(reqwest::Method::OPTIONS, http_url(addr, "/api/lobby/list"))
        .header("Access-Control-Request-Method", "GET")
        .header("Origin", "https://example.test")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.bytes().await.unwrap();
    assert!(body.is_empty());
}
