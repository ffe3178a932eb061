use roost_core::{CollaboratorError, GraphClient, GraphNode, UserId};
use serde::Serialize;

use super::CollaboratorEndpoint;

pub struct HttpGraphClient {
    endpoint: CollaboratorEndpoint,
}

impl HttpGraphClient {
    pub fn new(endpoint: CollaboratorEndpoint) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &CollaboratorEndpoint {
        &self.endpoint
    }
}

#[derive(Serialize)]
struct RegisterNodeRequest<'a> {
    id: String,
    #[serde(rename = "type")]
    kind: &'a str,
    name: &'a str,
    username: &'a str,
}

#[async_trait::async_trait]
impl GraphClient for HttpGraphClient {
    #[tracing::instrument(name = "Creating graph node", skip_all, fields(id = %node.id))]
    async fn create_node(&self, node: &GraphNode) -> Result<(), CollaboratorError> {
        let request = RegisterNodeRequest {
            id: node.id.to_string(),
            kind: node.role.as_str(),
            name: &node.name,
            username: node.username.as_str(),
        };
        self.endpoint
            .post_json(&["graph", "registerUser"], &request)
            .await
    }

    #[tracing::instrument(name = "Deleting graph node", skip(self))]
    async fn delete_node(&self, id: &UserId) -> Result<(), CollaboratorError> {
        self.endpoint
            .delete(&["graph", id.to_string().as_str()])
            .await
    }
}
