//! Legacy REST surface carried forward for backward compatibility: the
//! `/session/*` endpoints predate the lobby-socket protocol, plus `/health`,
//! `/rooms`, and `/lobbies`.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::app_state::AppState;
use crate::protocol::{CloseReason, ErrorCode, ServerMessage};
use crate::server::broadcast;

fn not_found(code: ErrorCode) -> impl IntoResponse {
    (
        axum::http::StatusCode::NOT_FOUND,
        Json(json!({"success": false, "code": code})),
    )
}

#[derive(Debug, Deserialize)]
pub struct HostBody {
    #[serde(default)]
    pub is_debug: bool,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub lobby_name: Option<String>,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub player_limit: Option<u32>,
}

pub async fn host(State(state): State<AppState>, Json(body): Json<HostBody>) -> impl IntoResponse {
    let channel = body
        .channel
        .unwrap_or_else(|| state.config.legacy_default_channel.clone());
    let code = state.store.host_room(
        body.lobby_name.clone(),
        body.public.unwrap_or(true),
        body.player_limit.unwrap_or(0),
        channel,
        body.is_debug,
    );
    let lobby_name = body.lobby_name.unwrap_or_else(|| format!("Lobby-{code}"));
    tracing::info!(%code, "legacy room hosted");
    Json(json!({
        "success": true,
        "code": code,
        "ws_url": format!("/ws/{code}"),
        "lobby_name": lobby_name,
    }))
    .into_response()
}

pub async fn join(
    State(state): State<AppState>,
    Path(code_or_name): Path<String>,
) -> impl IntoResponse {
    let Some(code) = state.store.find_room_code(&code_or_name) else {
        return not_found(ErrorCode::RoomNotFound).into_response();
    };

    match state.store.list_all_rooms().into_iter().find(|r| r.0 == code) {
        Some((code, name, player_count, player_limit, public, open)) => Json(json!({
            "success": true,
            "code": code,
            "name": name,
            "player_count": player_count,
            "player_limit": player_limit,
            "public": public,
            "open": open,
        }))
        .into_response(),
        None => not_found(ErrorCode::RoomNotFound).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
    #[serde(default)]
    pub lobby_name: Option<String>,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub player_limit: Option<u32>,
}

pub async fn update(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(body): Json<UpdateBody>,
) -> impl IntoResponse {
    let code = code.to_uppercase();
    match state
        .store
        .update_room(&code, body.lobby_name, body.public, body.player_limit)
    {
        Ok(()) => match state.store.list_all_rooms().into_iter().find(|r| r.0 == code) {
            Some((code, name, player_count, player_limit, public, open)) => Json(json!({
                "success": true,
                "code": code,
                "name": name,
                "player_count": player_count,
                "player_limit": player_limit,
                "public": public,
                "open": open,
            }))
            .into_response(),
            None => not_found(ErrorCode::RoomNotFound).into_response(),
        },
        Err(code) => not_found(code).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct PlayersBody {
    pub player_count: u32,
}

pub async fn players(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(body): Json<PlayersBody>,
) -> impl IntoResponse {
    match state.store.set_room_player_count(&code.to_uppercase(), body.player_count) {
        Ok(player_count) => Json(json!({"player_count": player_count})).into_response(),
        Err(code) => not_found(code).into_response(),
    }
}

pub async fn close(State(state): State<AppState>, Path(code): Path<String>) -> impl IntoResponse {
    let code = code.to_uppercase();
    match state.store.close_room(&code) {
        Ok(remaining) => {
            if !remaining.is_empty() {
                let event = ServerMessage::LobbyClosed {
                    code: code.clone(),
                    reason: CloseReason::HostClosed,
                };
                broadcast(&state, &remaining, &event).await;
            }
            tracing::info!(%code, "legacy room closed");
            Json(json!({"success": true})).into_response()
        }
        Err(code) => not_found(code).into_response(),
    }
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let (rooms, lobbies, lobby_peers) = state.store.counts();
    Json(json!({
        "status": "ok",
        "rooms": rooms,
        "lobbies": lobbies,
        "lobby_peers": lobby_peers,
    }))
}

pub async fn rooms(State(state): State<AppState>) -> impl IntoResponse {
    let items: Vec<_> = state
        .store
        .list_all_rooms()
        .into_iter()
        .map(|(code, name, player_count, player_limit, public, open)| {
            json!({
                "code": code,
                "name": name,
                "player_count": player_count,
                "player_limit": player_limit,
                "public": public,
                "open": open,
            })
        })
        .collect();
    Json(json!({ "rooms": items }))
}

/// Backward-compatible shape: PascalCase fields, every lobby regardless of
/// visibility (the public-only filter is `list_lobbies` on the live protocol).
pub async fn lobbies(State(state): State<AppState>) -> impl IntoResponse {
    let items: Vec<_> = state
        .store
        .list_all_rooms()
        .into_iter()
        .map(|(code, name, player_count, player_limit, public, open)| {
            json!({
                "Name": name,
                "Code": code,
                "PlayerCount": player_count,
                "PlayerLimit": player_limit,
                "Public": public,
                "Open": open,
                "HasPassword": false,
            })
        })
        .collect();
    Json(json!({ "lobbies": items }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn health_reports_empty_counts_on_fresh_state() {
        let state = AppState::new(Config::default());
        let (rooms, lobbies, peers) = state.store.counts();
        assert_eq!((rooms, lobbies, peers), (0, 0, 0));
    }
}
