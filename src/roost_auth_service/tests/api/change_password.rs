use serde_json::{Value, json};

use crate::helpers::{COOKIE_NAME, TestApp};

async fn token_for(app: &TestApp, username: &str, password: &str) -> String {
    let response = app.login(username, password).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn change_password_then_login_with_new_password() {
    let app = TestApp::new().await.with_healthy_collaborators().await;
    app.verified_user("alice", "alice@x.com", "Abcdef1!").await;
    let token = token_for(&app, "alice", "Abcdef1!").await;

    let response = app
        .change_password(
            "alice",
            Some(&token),
            &json!({ "currentPassword": "Abcdef1!", "newPassword": "Newpass12" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    assert_eq!(app.login("alice", "Abcdef1!").await.status().as_u16(), 401);
    assert_eq!(app.login("alice", "Newpass12").await.status().as_u16(), 200);
}

#[tokio::test]
async fn wrong_current_password_is_rejected() {
    let app = TestApp::new().await.with_healthy_collaborators().await;
    app.verified_user("alice", "alice@x.com", "Abcdef1!").await;
    let token = token_for(&app, "alice", "Abcdef1!").await;

    let response = app
        .change_password(
            "alice",
            Some(&token),
            &json!({ "currentPassword": "Wrong1234", "newPassword": "Newpass12" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 401);

    assert_eq!(app.login("alice", "Abcdef1!").await.status().as_u16(), 200);
}

#[tokio::test]
async fn token_is_required_and_must_belong_to_the_account() {
    let app = TestApp::new().await.with_healthy_collaborators().await;
    app.verified_user("alice", "alice@x.com", "Abcdef1!").await;
    app.verified_user("bob", "bob@x.com", "Abcdef1!").await;
    let bob_token = token_for(&app, "bob", "Abcdef1!").await;
    let body = json!({ "currentPassword": "Abcdef1!", "newPassword": "Newpass12" });

    let missing = app.change_password("alice", None, &body).await;
    assert_eq!(missing.status().as_u16(), 401);

    let garbage = app.change_password("alice", Some("not-a-jwt"), &body).await;
    assert_eq!(garbage.status().as_u16(), 401);

    let someone_else = app.change_password("alice", Some(&bob_token), &body).await;
    assert_eq!(someone_else.status().as_u16(), 403);

    assert_eq!(app.login("alice", "Abcdef1!").await.status().as_u16(), 200);
}

#[tokio::test]
async fn weak_new_password_is_a_bad_request() {
    let app = TestApp::new().await.with_healthy_collaborators().await;
    app.verified_user("alice", "alice@x.com", "Abcdef1!").await;
    let token = token_for(&app, "alice", "Abcdef1!").await;

    let response = app
        .change_password(
            "alice",
            Some(&token),
            &json!({ "currentPassword": "Abcdef1!", "newPassword": "short" }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn session_cookie_authenticates_change_password() {
    let app = TestApp::new().await.with_healthy_collaborators().await;
    app.verified_user("alice", "alice@x.com", "Abcdef1!").await;
    let token = token_for(&app, "alice", "Abcdef1!").await;

    let response = reqwest::Client::new()
        .put(format!("{}/api/auth/change-password/alice", app.address))
        .header("Cookie", format!("{COOKIE_NAME}={token}"))
        .json(&json!({ "currentPassword": "Abcdef1!", "newPassword": "Newpass12" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn token_header_authenticates_change_password() {
    let app = TestApp::new().await.with_healthy_collaborators().await;
    app.verified_user("alice", "alice@x.com", "Abcdef1!").await;
    let token = token_for(&app, "alice", "Abcdef1!").await;

    let response = reqwest::Client::new()
        .put(format!("{}/api/auth/change-password/alice", app.address))
        .header("Token", token)
        .json(&json!({ "currentPassword": "Abcdef1!", "newPassword": "Newpass12" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
}
