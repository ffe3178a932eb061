use roost_core::{AccountDetails, CollaboratorError, ProfileClient, ProfileRecord, UserId};
use secrecy::ExposeSecret;
use serde_json::{Value, json};

use super::CollaboratorEndpoint;

pub struct HttpProfileClient {
    endpoint: CollaboratorEndpoint,
}

impl HttpProfileClient {
    pub fn new(endpoint: CollaboratorEndpoint) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &CollaboratorEndpoint {
        &self.endpoint
    }
}

fn profile_body(profile: &ProfileRecord) -> Value {
    let id = profile.id.to_string();
    let username = profile.username.as_str();
    let email = profile.email.as_ref().expose_secret();
    let role = profile.role().as_str();

    match &profile.details {
        AccountDetails::Regular(details) => json!({
            "id": id,
            "username": username,
            "email": email,
            "role": role,
            "firstname": details.first_name,
            "lastname": details.last_name,
            "age": details.age.to_string(),
            "city": details.city,
            "gender": details.gender.as_str(),
        }),
        AccountDetails::Business(details) => json!({
            "id": id,
            "username": username,
            "email": email,
            "role": role,
            "company": details.company,
            "website": details.website,
        }),
    }
}

#[async_trait::async_trait]
impl ProfileClient for HttpProfileClient {
    #[tracing::instrument(name = "Creating profile", skip_all, fields(id = %profile.id))]
    async fn create_profile(&self, profile: &ProfileRecord) -> Result<(), CollaboratorError> {
        self.endpoint
            .post_json(&["profile"], &profile_body(profile))
            .await
    }

    #[tracing::instrument(name = "Deleting profile", skip(self))]
    async fn delete_profile(&self, id: &UserId) -> Result<(), CollaboratorError> {
        self.endpoint
            .delete(&["profile", id.to_string().as_str()])
            .await
    }
}
