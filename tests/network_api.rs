//! End-to-end HTTP tests against a server over the in-memory store.

#![allow(clippy::panic, clippy::indexing_slicing)]

mod support;

use std::time::Duration;

use serde_json::json;
use tabletop_network::config::NetworkConfig;
use tabletop_network::domain::PlayerRole;

use support::{spawn_app, spawn_app_with};

#[tokio::test]
async fn health_reports_healthy() {
    let app = spawn_app().await;
    let (status, body) = app.get_json(&app.url("/health")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn unknown_profile_is_404() {
    let app = spawn_app().await;
    let url = app.api(&format!("/players/{}/network", uuid::Uuid::new_v4()));
    let (status, body) = app.get_json(&url).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], 2001);
}

#[tokio::test]
async fn fresh_player_sees_empty_network() {
    let app = spawn_app().await;
    let me = app.player("Wren", PlayerRole::Player).await;

    let url = app.api(&format!("/players/{}/network", me.auth_user_id));
    let (status, body) = app.get_json(&url).await;
    assert_eq!(status, 200);
    assert_eq!(body["source"], "fresh");
    assert_eq!(body["network"]["network"]["alias"], "Request a Sponsor");
    assert_eq!(body["network"]["has_pending_request"], false);
    assert_eq!(
        body["network"]["network"]["children"][0]["children"]
            .as_array()
            .map(Vec::len),
        Some(2)
    );

    let (_, again) = app.get_json(&url).await;
    assert_eq!(again["source"], "cached");
}

#[tokio::test]
async fn text_format_renders_ascii_tree() {
    let app = spawn_app().await;
    let me = app.player("Wren", PlayerRole::Player).await;

    let url = app.api(&format!("/players/{}/network?format=text", me.auth_user_id));
    let Ok(resp) = app.client.get(&url).send().await else {
        panic!("request failed");
    };
    assert_eq!(resp.status(), 200);
    let Ok(text) = resp.text().await else {
        panic!("no body");
    };
    assert_eq!(
        text,
        "Request a Sponsor\n└── You\n    ├── Invite\n    └── Invite\n"
    );
}

#[tokio::test]
async fn sponsor_request_accept_flow() {
    let app = spawn_app().await;
    let admin = app.player("Marla", PlayerRole::Admin).await;
    let me = app.player("Wren", PlayerRole::Player).await;

    let (status, rel) = app
        .post_json(
            &app.api(&format!("/players/{}/sponsor-requests", me.auth_user_id)),
            &json!({ "admin_profile_id": admin.id }),
        )
        .await;
    assert_eq!(status, 201);
    assert_eq!(rel["status"], "pending");

    let (_, mine) = app
        .get_json(&app.api(&format!("/players/{}/network", me.auth_user_id)))
        .await;
    assert_eq!(mine["network"]["network"]["alias"], "In Review");
    assert_eq!(mine["network"]["has_pending_request"], true);

    let (_, theirs) = app
        .get_json(&app.api(&format!("/players/{}/network", admin.auth_user_id)))
        .await;
    assert_eq!(theirs["network"]["pending_downlines"][0]["player"]["alias"], "Wren");

    let Some(rel_id) = rel["relationship_id"].as_str() else {
        panic!("missing relationship id");
    };
    let (status, accepted) = app
        .post_json(
            &app.api(&format!(
                "/players/{}/relationships/{rel_id}/accept",
                admin.auth_user_id
            )),
            &json!({}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(accepted["status"], "active");

    let (_, mine) = app
        .get_json(&app.api(&format!("/players/{}/network", me.auth_user_id)))
        .await;
    assert_eq!(mine["network"]["network"]["alias"], "Marla");
    assert_eq!(mine["network"]["active_sponsor"]["alias"], "Marla");

    let (_, theirs) = app
        .get_json(&app.api(&format!("/players/{}/network", admin.auth_user_id)))
        .await;
    assert_eq!(theirs["network"]["downlines"][0]["alias"], "Wren");
    assert_eq!(
        theirs["network"]["pending_downlines"].as_array().map(Vec::len),
        Some(0)
    );
}

#[tokio::test]
async fn accept_by_someone_else_is_forbidden() {
    let app = spawn_app().await;
    let admin = app.player("Marla", PlayerRole::Admin).await;
    let other = app.player("Oak", PlayerRole::Admin).await;
    let me = app.player("Wren", PlayerRole::Player).await;

    let (_, rel) = app
        .post_json(
            &app.api(&format!("/players/{}/sponsor-requests", me.auth_user_id)),
            &json!({ "admin_profile_id": admin.id }),
        )
        .await;
    let Some(rel_id) = rel["relationship_id"].as_str() else {
        panic!("missing relationship id");
    };
    let (status, body) = app
        .post_json(
            &app.api(&format!(
                "/players/{}/relationships/{rel_id}/accept",
                other.auth_user_id
            )),
            &json!({}),
        )
        .await;
    assert_eq!(status, 403);
    assert_eq!(body["error"]["code"], 2101);
}

#[tokio::test]
async fn cancel_sponsor_request_restores_placeholder() {
    let app = spawn_app().await;
    let admin = app.player("Marla", PlayerRole::Admin).await;
    let me = app.player("Wren", PlayerRole::Player).await;
    let base = app.api(&format!("/players/{}/sponsor-requests", me.auth_user_id));

    let (status, _) = app
        .post_json(&base, &json!({ "admin_profile_id": admin.id }))
        .await;
    assert_eq!(status, 201);

    let Ok(resp) = app.client.delete(&base).send().await else {
        panic!("delete failed");
    };
    assert_eq!(resp.status(), 200);

    let (_, mine) = app
        .get_json(&app.api(&format!("/players/{}/network", me.auth_user_id)))
        .await;
    assert_eq!(mine["network"]["network"]["alias"], "Request a Sponsor");

    let Ok(resp) = app.client.delete(&base).send().await else {
        panic!("delete failed");
    };
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
async fn sponsor_request_to_non_admin_is_rejected() {
    let app = spawn_app().await;
    let peer = app.player("Oak", PlayerRole::Player).await;
    let me = app.player("Wren", PlayerRole::Player).await;

    let (status, body) = app
        .post_json(
            &app.api(&format!("/players/{}/sponsor-requests", me.auth_user_id)),
            &json!({ "admin_profile_id": peer.id }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], 1001);
}

#[tokio::test]
async fn invite_is_sent_and_accepted() {
    let app = spawn_app().await;
    let host = app.player("Wren", PlayerRole::Player).await;

    let (status, sent) = app
        .post_json(
            &app.api(&format!("/players/{}/invites", host.auth_user_id)),
            &json!({ "email": "ash@example.com", "first_name": "Ash", "last_name": "Grey" }),
        )
        .await;
    assert_eq!(status, 201);
    assert_eq!(sent["email_delivered"], true);
    assert_eq!(sent["invite"]["status"], "sent");

    let joiner = app.player("Ash", PlayerRole::Player).await;
    let Some(invite_id) = sent["invite"]["invite_id"].as_str() else {
        panic!("missing invite id");
    };
    let (status, accepted) = app
        .post_json(
            &app.api(&format!("/invites/{invite_id}/accept")),
            &json!({ "user_id": joiner.auth_user_id }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(accepted["invite"]["status"], "accepted");
    assert_eq!(accepted["relationship"]["status"], "active");

    let (_, hosts) = app
        .get_json(&app.api(&format!("/players/{}/network", host.auth_user_id)))
        .await;
    assert_eq!(hosts["network"]["downlines"][0]["alias"], "Ash");

    let (status, body) = app
        .post_json(
            &app.api(&format!("/invites/{invite_id}/accept")),
            &json!({ "user_id": joiner.auth_user_id }),
        )
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], 2202);
}

#[tokio::test]
async fn invite_with_bad_email_is_rejected() {
    let app = spawn_app().await;
    let host = app.player("Wren", PlayerRole::Player).await;

    let (status, _) = app
        .post_json(
            &app.api(&format!("/players/{}/invites", host.auth_user_id)),
            &json!({ "email": "nope", "first_name": "Ash", "last_name": "Grey" }),
        )
        .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn refetch_inside_throttle_serves_last_value() {
    let app = spawn_app_with(NetworkConfig {
        network_throttle: Duration::from_secs(60),
        ..NetworkConfig::default()
    })
    .await;
    let me = app.player("Wren", PlayerRole::Player).await;

    let (status, first) = app
        .get_json(&app.api(&format!("/players/{}/network", me.auth_user_id)))
        .await;
    assert_eq!(status, 200);
    assert_eq!(first["source"], "fresh");

    let (status, again) = app
        .post_json(
            &app.api(&format!("/players/{}/network/refetch", me.auth_user_id)),
            &json!({}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(again["source"], "throttled");
    assert_eq!(again["network"], first["network"]);
}

#[tokio::test]
async fn openapi_document_lists_network_route() {
    let app = spawn_app().await;
    let (status, doc) = app.get_json(&app.url("/api-docs/openapi.json")).await;
    assert_eq!(status, 200);
    assert!(doc["paths"]["/api/v1/players/{user_id}/network"].is_object());
}
