use std::{sync::Arc, time::Duration};

use reqwest::Url;
use roost_adapters::{
    Argon2PasswordHasher, CollaboratorEndpoint, DashMapSagaJournal, HashMapCredentialStore,
    HashMapRecoveryStore, HttpGraphClient, HttpProfileClient, JwtKeys, JwtTokenIssuer,
    MockEmailClient, config::test::APP_ADDRESS,
};
use roost_auth_service::{AuthDependencies, AuthService, AuthServiceOptions};
use roost_core::{CircuitBreaker, CircuitBreakerConfig};
use secrecy::Secret;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, path_regex},
};

pub const COOKIE_NAME: &str = "jwt";

pub struct TestApp {
    pub address: String,
    pub http_client: reqwest::Client,
    pub credentials: HashMapCredentialStore,
    pub journal: DashMapSagaJournal,
    pub email_client: MockEmailClient,
    pub tokens: Arc<JwtTokenIssuer>,
    pub profile_server: MockServer,
    pub graph_server: MockServer,
}

fn endpoint(name: &'static str, base_url: &str) -> CollaboratorEndpoint {
    CollaboratorEndpoint::new(
        reqwest::Client::new(),
        Url::parse(base_url).unwrap(),
        Duration::from_secs(1),
        CircuitBreaker::new(name, CircuitBreakerConfig::default()),
    )
}

impl TestApp {
    pub async fn new() -> Self {
        Self::start(std::future::pending()).await.0
    }

    /// Spawns the service; it stops once `shutdown` resolves.
    pub async fn start<S>(shutdown: S) -> (Self, JoinHandle<std::io::Result<()>>)
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let profile_server = MockServer::start().await;
        let graph_server = MockServer::start().await;

        let credentials = HashMapCredentialStore::new();
        let journal = DashMapSagaJournal::new();
        let email_client = MockEmailClient::new();
        let tokens = Arc::new(JwtTokenIssuer::new(
            JwtKeys {
                current: Secret::from("api-test-secret".to_string()),
                previous: Vec::new(),
            },
            600,
        ));

        let deps = AuthDependencies {
            credentials: Arc::new(credentials.clone()),
            recovery_requests: Arc::new(HashMapRecoveryStore::new()),
            journal: Arc::new(journal.clone()),
            email_client: Arc::new(email_client.clone()),
            hasher: Arc::new(Argon2PasswordHasher::new()),
            tokens: tokens.clone(),
            profiles: Arc::new(HttpProfileClient::new(endpoint(
                "profile",
                &profile_server.uri(),
            ))),
            graph: Arc::new(HttpGraphClient::new(endpoint("graph", &graph_server.uri()))),
        };
        let options = AuthServiceOptions {
            cookie_name: COOKIE_NAME.to_string(),
            registration_deadline: Duration::from_secs(10),
            recovery_code_ttl: chrono::Duration::minutes(15),
        };

        let listener = tokio::net::TcpListener::bind(APP_ADDRESS).await.unwrap();
        let address = format!("http://{}", listener.local_addr().unwrap());

        let service = AuthService::new(deps, options);
        let server = tokio::spawn(service.run_standalone(listener, None, shutdown));

        let http_client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .unwrap();

        let app = Self {
            address,
            http_client,
            credentials,
            journal,
            email_client,
            tokens,
            profile_server,
            graph_server,
        };
        (app, server)
    }

    /// Profile and graph services that accept everything.
    pub async fn with_healthy_collaborators(self) -> Self {
        Mock::given(method("POST"))
            .and(path("/profile"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.profile_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/graph/registerUser"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.graph_server)
            .await;
        Mock::given(method("DELETE"))
            .and(path_regex("^/profile/.+$"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&self.profile_server)
            .await;
        self
    }

    pub async fn post_json(&self, route: &str, body: &Value) -> reqwest::Response {
        self.http_client
            .post(format!("{}{route}", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn signup_regular(&self, body: &Value) -> reqwest::Response {
        self.post_json("/api/auth/signup-regular", body).await
    }

    pub async fn signup_business(&self, body: &Value) -> reqwest::Response {
        self.post_json("/api/auth/signup-business", body).await
    }

    pub async fn validate_code(&self, username: &str, code: &str) -> reqwest::Response {
        self.post_json(
            "/api/auth/validate-code",
            &json!({ "username": username, "code": code }),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.post_json(
            "/api/auth/login",
            &json!({ "username": username, "password": password }),
        )
        .await
    }

    pub async fn code_recovery(&self, email: &str) -> reqwest::Response {
        self.post_json("/api/auth/code-recovery", &json!({ "email": email }))
            .await
    }

    pub async fn recovery_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> reqwest::Response {
        self.post_json(
            "/api/auth/recovery-password",
            &json!({ "email": email, "code": code, "newPassword": new_password }),
        )
        .await
    }

    /// PUT change-password without relying on the cookie jar.
    pub async fn change_password(
        &self,
        username: &str,
        token: Option<&str>,
        body: &Value,
    ) -> reqwest::Response {
        let mut request = reqwest::Client::new()
            .put(format!("{}/api/auth/change-password/{username}", self.address))
            .json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to execute request.")
    }

    /// The six-digit code in the latest email sent to `email`.
    pub async fn code_sent_to(&self, email: &str) -> String {
        let sent = self
            .email_client
            .last_sent_to(email)
            .await
            .expect("No email was sent");
        extract_code(&sent.content)
    }

    /// Registers and verifies `username`.
    pub async fn verified_user(&self, username: &str, email: &str, password: &str) {
        let response = self
            .signup_regular(&regular_signup(username, email, password))
            .await;
        assert_eq!(response.status().as_u16(), 201);

        let code = self.code_sent_to(email).await;
        assert_eq!(self.validate_code(username, &code).await.status().as_u16(), 200);
    }
}

pub fn extract_code(content: &str) -> String {
    content
        .split(|c: char| !c.is_ascii_digit())
        .find(|digits| digits.len() == 6)
        .expect("Email does not contain a code")
        .to_string()
}

pub fn regular_signup(username: &str, email: &str, password: &str) -> Value {
    json!({
        "username": username,
        "email": email,
        "password": password,
        "firstName": "Alice",
        "lastName": "Smith",
        "gender": "female",
        "age": "30",
        "city": "Belgrade",
    })
}

pub fn business_signup(username: &str, email: &str, password: &str) -> Value {
    json!({
        "username": username,
        "email": email,
        "password": password,
        "company": "Acme",
        "website": "https://acme.example",
    })
}

pub async fn error_message(response: reqwest::Response) -> String {
    let body: Value = response.json().await.expect("Error body is not JSON");
    body["error"]
        .as_str()
        .expect("Error body has no message")
        .to_string()
}
