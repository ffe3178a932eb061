use roost_core::{
    CredentialStore, CredentialStoreError, SagaState, UserId, Username, VerificationStatus,
};
use serde_json::Value;
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{method, path, path_regex},
};

use crate::helpers::{TestApp, business_signup, error_message, regular_signup};

#[tokio::test]
async fn signup_creates_pending_account_and_remote_records() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.profile_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graph/registerUser"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.graph_server)
        .await;

    let response = app
        .signup_regular(&regular_signup("alice", "alice@x.com", "Abcdef1!"))
        .await;

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["username"], "alice");
    let user_id = UserId::parse_str(body["userId"].as_str().unwrap()).unwrap();

    let credential = app
        .credentials
        .get_by_username(&Username::parse("alice").unwrap())
        .await
        .unwrap();
    assert_eq!(credential.user_id(), &user_id);
    assert_eq!(credential.status(), VerificationStatus::Pending);
    assert_eq!(credential.verification_code().as_str().len(), 6);
    assert_eq!(
        app.code_sent_to("alice@x.com").await,
        credential.verification_code().as_str()
    );
    assert_eq!(app.journal.get(&user_id).unwrap().state, SagaState::Committed);
}

#[tokio::test]
async fn business_signup_sends_company_as_graph_name() {
    let app = TestApp::new().await.with_healthy_collaborators().await;

    let response = app
        .signup_business(&business_signup("acme", "ops@acme.example", "Abcdef1!"))
        .await;
    assert_eq!(response.status().as_u16(), 201);

    let requests = app.graph_server.received_requests().await.unwrap();
    let node: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(node["type"], "business");
    assert_eq!(node["name"], "Acme");
    assert_eq!(node["username"], "acme");
}

#[tokio::test]
async fn duplicate_username_or_email_is_rejected_before_collaborators() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.profile_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.graph_server)
        .await;

    let first = app
        .signup_regular(&regular_signup("alice", "alice@x.com", "Abcdef1!"))
        .await;
    assert_eq!(first.status().as_u16(), 201);

    let same_username = app
        .signup_regular(&regular_signup("alice", "other@x.com", "Abcdef1!"))
        .await;
    assert_eq!(same_username.status().as_u16(), 409);
    assert_eq!(error_message(same_username).await, "Username already exists");

    let same_email = app
        .signup_regular(&regular_signup("alice2", "ALICE@x.com", "Abcdef1!"))
        .await;
    assert_eq!(same_email.status().as_u16(), 409);
    assert_eq!(error_message(same_email).await, "Email already exists");

    assert_eq!(app.email_client.sent().await.len(), 1);
}

#[tokio::test]
async fn invalid_input_is_a_bad_request() {
    let app = TestApp::new().await;

    let cases = [
        regular_signup("alice", "not-an-email", "Abcdef1!"),
        regular_signup("alice", "alice@x.com", "weak"),
        regular_signup("a", "alice@x.com", "Abcdef1!"),
        {
            let mut body = regular_signup("alice", "alice@x.com", "Abcdef1!");
            body["gender"] = "robot".into();
            body
        },
        {
            let mut body = regular_signup("alice", "alice@x.com", "Abcdef1!");
            body["age"] = "thirty".into();
            body
        },
    ];

    for body in cases {
        let response = app.signup_regular(&body).await;
        assert_eq!(response.status().as_u16(), 400, "body: {body}");
        assert!(!error_message(response).await.is_empty());
    }

    assert!(app.email_client.sent().await.is_empty());
}

#[tokio::test]
async fn graph_failure_rolls_back_profile_and_credential() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.profile_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex("^/profile/.+$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.profile_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graph/registerUser"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.graph_server)
        .await;

    let response = app
        .signup_regular(&regular_signup("bob", "bob@x.com", "Abcdef1!"))
        .await;

    assert_eq!(response.status().as_u16(), 502);

    let requests = app.profile_server.received_requests().await.unwrap();
    let created: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let bob_id = created["id"].as_str().unwrap();
    assert_eq!(requests[1].method.as_str(), "DELETE");
    assert_eq!(requests[1].url.path(), format!("/profile/{bob_id}"));

    assert_eq!(
        app.credentials
            .get_by_username(&Username::parse("bob").unwrap())
            .await
            .unwrap_err(),
        CredentialStoreError::NotFound
    );
    let saga_id = UserId::parse_str(bob_id).unwrap();
    assert_eq!(app.journal.get(&saga_id).unwrap().state, SagaState::Failed);
}

#[tokio::test]
async fn open_graph_breaker_fails_fast_without_calling_graph() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.profile_server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&app.profile_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.graph_server)
        .await;

    let bob = app
        .signup_regular(&regular_signup("bob", "bob@x.com", "Abcdef1!"))
        .await;
    assert_eq!(bob.status().as_u16(), 502);

    let carol = app
        .signup_regular(&regular_signup("carol", "carol@x.com", "Abcdef1!"))
        .await;
    assert_eq!(carol.status().as_u16(), 503);
    assert!(carol.headers().contains_key("retry-after"));
    assert_eq!(
        error_message(carol).await,
        "graph is temporarily unavailable"
    );
}

#[tokio::test]
async fn open_profile_breaker_rejects_before_profile_is_called() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&app.profile_server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&app.profile_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.graph_server)
        .await;

    let first = app
        .signup_regular(&regular_signup("bob", "bob@x.com", "Abcdef1!"))
        .await;
    assert_eq!(first.status().as_u16(), 502);

    let second = app
        .signup_regular(&regular_signup("carol", "carol@x.com", "Abcdef1!"))
        .await;
    assert_eq!(second.status().as_u16(), 503);

    for username in ["bob", "carol"] {
        assert!(
            !app.credentials
                .username_exists(&Username::parse(username).unwrap())
                .await
                .unwrap()
        );
    }
}
