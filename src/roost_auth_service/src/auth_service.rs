use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderValue, Method, request},
    routing::{post, put},
};
use roost_adapters::AllowedOrigins;
use roost_application::{
    ChangePasswordUseCase, LoginUseCase, RecoveryReport, RegistrationError, RegistrationSaga,
    RequestRecoveryCodeUseCase, ResetPasswordUseCase, VerifyCodeUseCase,
};
use roost_axum::{
    ChangePasswordState, DynRegistrationSaga, LoginState, SessionConfig, SignupState,
    routes::{
        change_password, code_recovery, login, recovery_password, signup_business,
        signup_regular, validate_code,
    },
};
use roost_core::{
    CredentialStore, EmailClient, GraphClient, PasswordHasher, ProfileClient,
    RecoveryRequestStore, SagaJournal, TokenIssuer,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::shutdown::DRAIN_TIMEOUT;
use crate::telemetry::{make_span_with_request_id, on_request, on_response};

/// Ports the service is assembled from.
#[derive(Clone)]
pub struct AuthDependencies {
    pub credentials: Arc<dyn CredentialStore>,
    pub recovery_requests: Arc<dyn RecoveryRequestStore>,
    pub journal: Arc<dyn SagaJournal>,
    pub email_client: Arc<dyn EmailClient>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub tokens: Arc<dyn TokenIssuer>,
    pub profiles: Arc<dyn ProfileClient>,
    pub graph: Arc<dyn GraphClient>,
}

#[derive(Debug, Clone)]
pub struct AuthServiceOptions {
    pub cookie_name: String,
    pub registration_deadline: Duration,
    pub recovery_code_ttl: chrono::Duration,
}

/// Account service: registration saga, verification, login and password
/// lifecycle routes under `/api/auth`.
pub struct AuthService {
    router: Router,
    saga: Arc<DynRegistrationSaga>,
    registration_deadline: Duration,
}

impl AuthService {
    pub fn new(deps: AuthDependencies, options: AuthServiceOptions) -> Self {
        let session = SessionConfig::new(options.cookie_name);

        let saga: Arc<DynRegistrationSaga> = Arc::new(RegistrationSaga::new(
            deps.credentials.clone(),
            deps.email_client.clone(),
            deps.hasher.clone(),
            deps.profiles.clone(),
            deps.graph.clone(),
            deps.journal.clone(),
        ));

        let signup_state = SignupState {
            saga: saga.clone(),
            deadline: options.registration_deadline,
        };
        let verify_code = Arc::new(VerifyCodeUseCase::new(deps.credentials.clone()));
        let login_state = LoginState {
            login: Arc::new(LoginUseCase::new(
                deps.credentials.clone(),
                deps.hasher.clone(),
                deps.tokens.clone(),
            )),
            session: session.clone(),
        };
        let change_password_state = ChangePasswordState {
            change_password: Arc::new(ChangePasswordUseCase::new(
                deps.credentials.clone(),
                deps.hasher.clone(),
            )),
            tokens: deps.tokens.clone(),
            session,
        };
        let request_recovery_code = Arc::new(RequestRecoveryCodeUseCase::new(
            deps.credentials.clone(),
            deps.recovery_requests.clone(),
            deps.email_client,
        ));
        let reset_password = Arc::new(ResetPasswordUseCase::new(
            deps.credentials,
            deps.recovery_requests,
            deps.hasher,
            options.recovery_code_ttl,
        ));

        let router = Router::new()
            .route("/api/auth/signup-regular", post(signup_regular))
            .route("/api/auth/signup-business", post(signup_business))
            .with_state(signup_state)
            .route("/api/auth/validate-code", post(validate_code))
            .with_state(verify_code)
            .route("/api/auth/login", post(login))
            .with_state(login_state)
            .route("/api/auth/code-recovery", post(code_recovery))
            .with_state(request_recovery_code)
            .route("/api/auth/recovery-password", post(recovery_password))
            .with_state(reset_password)
            .route(
                "/api/auth/change-password/{username}",
                put(change_password),
            )
            .with_state(change_password_state);

        Self {
            router,
            saga,
            registration_deadline: options.registration_deadline,
        }
    }

    /// Finishes or rolls back registrations interrupted by a crash.
    ///
    /// Sagas journaled within the last registration deadline may still be
    /// running on another instance and are skipped.
    pub async fn recover_incomplete(&self) -> Result<RecoveryReport, RegistrationError> {
        self.saga
            .recover_incomplete(self.registration_deadline)
            .await
    }

    fn with_trace_layer(mut self) -> Self {
        self.router = self.router.layer(
            TraceLayer::new_for_http()
                .make_span_with(make_span_with_request_id)
                .on_request(on_request)
                .on_response(on_response),
        );
        self
    }

    /// Router that can be nested into another application.
    pub fn as_nested_router(mut self, allowed_origins: Option<AllowedOrigins>) -> Router {
        if let Some(allowed_origins) = allowed_origins
            && !allowed_origins.is_empty()
        {
            let cors = CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::PUT])
                .allow_credentials(true)
                .allow_origin(AllowOrigin::predicate(
                    move |origin: &HeaderValue, _request_parts: &request::Parts| {
                        allowed_origins.contains(origin)
                    },
                ));

            self.router = self.router.layer(cors);
        }
        self.with_trace_layer().router
    }

    /// Serves until `shutdown` resolves, then drains in-flight requests for
    /// up to [`DRAIN_TIMEOUT`].
    pub async fn run_standalone<S>(
        self,
        listener: TcpListener,
        allowed_origins: Option<AllowedOrigins>,
        shutdown: S,
    ) -> Result<(), std::io::Error>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let router = self.as_nested_router(allowed_origins);

        tracing::info!("Auth service listening on {}", listener.local_addr()?);

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            shutdown.await;
            drain.graceful_shutdown(Some(DRAIN_TIMEOUT));
        });

        axum_server::Server::<std::net::SocketAddr>::from_listener(listener)
            .handle(handle)
            .serve(router.into_make_service())
            .await?;

        tracing::info!("Auth service stopped");
        Ok(())
    }
}
