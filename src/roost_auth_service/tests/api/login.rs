use roost_core::{Role, TokenIssuer};
use serde_json::Value;

use crate::helpers::{COOKIE_NAME, TestApp, error_message, regular_signup};

#[tokio::test]
async fn verified_user_gets_token_with_role_and_cookie() {
    let app = TestApp::new().await.with_healthy_collaborators().await;
    app.verified_user("alice", "alice@x.com", "Abcdef1!").await;

    let response = app.login("alice", "Abcdef1!").await;

    assert_eq!(response.status().as_u16(), 200);
    let cookie = response
        .cookies()
        .find(|cookie| cookie.name() == COOKIE_NAME)
        .expect("No auth cookie found");
    assert!(cookie.http_only());

    let body: Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap();
    assert!(!token.is_empty());

    let claims = app.tokens.validate(token).unwrap();
    assert_eq!(claims.username, "alice");
    assert_eq!(claims.role, Role::Regular);
}

#[tokio::test]
async fn pending_account_cannot_log_in() {
    let app = TestApp::new().await.with_healthy_collaborators().await;
    app.signup_regular(&regular_signup("alice", "alice@x.com", "Abcdef1!"))
        .await;

    for password in ["Abcdef1!", "Wrong123"] {
        let response = app.login("alice", password).await;
        assert_eq!(response.status().as_u16(), 401);
        assert_eq!(error_message(response).await, "Account is not verified");
    }
}

#[tokio::test]
async fn unknown_user_and_wrong_password_are_indistinguishable() {
    let app = TestApp::new().await.with_healthy_collaborators().await;
    app.verified_user("alice", "alice@x.com", "Abcdef1!").await;

    let wrong_password = app.login("alice", "Abcdef1?").await;
    let unknown_user = app.login("mallory", "Abcdef1!").await;
    let malformed_user = app.login("?", "Abcdef1!").await;

    for response in [wrong_password, unknown_user, malformed_user] {
        assert_eq!(response.status().as_u16(), 401);
        assert_eq!(error_message(response).await, "Wrong credentials");
    }
}
