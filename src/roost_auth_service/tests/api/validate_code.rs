use roost_core::{CredentialStore, Username, VerificationStatus};

use crate::helpers::{TestApp, error_message, regular_signup};

#[tokio::test]
async fn correct_code_verifies_account_exactly_once() {
    let app = TestApp::new().await.with_healthy_collaborators().await;
    app.signup_regular(&regular_signup("alice", "alice@x.com", "Abcdef1!"))
        .await;
    let code = app.code_sent_to("alice@x.com").await;

    let response = app.validate_code("alice", &code).await;
    assert_eq!(response.status().as_u16(), 200);

    let credential = app
        .credentials
        .get_by_username(&Username::parse("alice").unwrap())
        .await
        .unwrap();
    assert_eq!(credential.status(), VerificationStatus::Verified);

    let resubmitted = app.validate_code("alice", &code).await;
    assert_eq!(resubmitted.status().as_u16(), 409);
    assert_eq!(
        error_message(resubmitted).await,
        "Account is already verified"
    );
}

#[tokio::test]
async fn wrong_code_leaves_account_pending() {
    let app = TestApp::new().await.with_healthy_collaborators().await;
    app.signup_regular(&regular_signup("alice", "alice@x.com", "Abcdef1!"))
        .await;
    let code = app.code_sent_to("alice@x.com").await;
    let wrong = if code == "123456" { "654321" } else { "123456" };

    let response = app.validate_code("alice", wrong).await;
    assert_eq!(response.status().as_u16(), 401);

    let credential = app
        .credentials
        .get_by_username(&Username::parse("alice").unwrap())
        .await
        .unwrap();
    assert_eq!(credential.status(), VerificationStatus::Pending);

    assert_eq!(app.validate_code("alice", &code).await.status().as_u16(), 200);
}

#[tokio::test]
async fn malformed_code_or_unknown_user() {
    let app = TestApp::new().await;

    assert_eq!(
        app.validate_code("alice", "12ab56").await.status().as_u16(),
        400
    );
    assert_eq!(
        app.validate_code("nobody", "123456").await.status().as_u16(),
        404
    );
}
