pub mod http_graph_client;
pub mod http_profile_client;

pub use http_graph_client::HttpGraphClient;
pub use http_profile_client::HttpProfileClient;

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use roost_core::{BreakerError, CircuitBreaker, CollaboratorError};
use serde::Serialize;

/// Base URL, HTTP client and circuit breaker of one collaborator service.
///
/// Creates go through the breaker. Deletes are compensation and are sent
/// whatever state the breaker is in.
pub struct CollaboratorEndpoint {
    http_client: Client,
    base_url: Url,
    request_timeout: Duration,
    breaker: CircuitBreaker,
}

impl CollaboratorEndpoint {
    pub fn new(
        http_client: Client,
        base_url: Url,
        request_timeout: Duration,
        breaker: CircuitBreaker,
    ) -> Self {
        Self {
            http_client,
            base_url,
            request_timeout,
            breaker,
        }
    }

    pub fn name(&self) -> &str {
        self.breaker.name()
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Appends `segments` to the base URL, keeping any path prefix it has.
    fn url(&self, segments: &[&str]) -> Result<Url, CollaboratorError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CollaboratorError::Transport {
                collaborator: self.name().to_string(),
                message: format!("base URL '{}' cannot have a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request_failed(&self, e: reqwest::Error) -> CollaboratorError {
        if e.is_timeout() {
            CollaboratorError::Timeout {
                collaborator: self.name().to_string(),
                timeout: self.request_timeout,
            }
        } else {
            CollaboratorError::Transport {
                collaborator: self.name().to_string(),
                message: e.to_string(),
            }
        }
    }

    /// POSTs `body` through the breaker. Only a 200 counts as success.
    async fn post_json<B>(&self, segments: &[&str], body: &B) -> Result<(), CollaboratorError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = self.url(segments)?;

        self.breaker
            .execute(move || async move {
                let response = self
                    .http_client
                    .post(url)
                    .timeout(self.request_timeout)
                    .json(body)
                    .send()
                    .await
                    .map_err(|e| self.request_failed(e))?;

                match response.status() {
                    StatusCode::OK => Ok(()),
                    status => Err(CollaboratorError::Status {
                        collaborator: self.name().to_string(),
                        status: status.as_u16(),
                    }),
                }
            })
            .await
            .map_err(|e| match e {
                BreakerError::Open { name, retry_after } => CollaboratorError::BreakerOpen {
                    collaborator: name,
                    retry_after,
                },
                BreakerError::Timeout { name, timeout } => CollaboratorError::Timeout {
                    collaborator: name,
                    timeout,
                },
                BreakerError::Operation(e) => e,
            })
    }

    /// DELETEs a resource. A missing resource counts as deleted.
    async fn delete(&self, segments: &[&str]) -> Result<(), CollaboratorError> {
        let url = self.url(segments)?;

        let response = self
            .http_client
            .delete(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| self.request_failed(e))?;

        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => Ok(()),
            status => Err(CollaboratorError::Status {
                collaborator: self.name().to_string(),
                status: status.as_u16(),
            }),
        }
    }
}
