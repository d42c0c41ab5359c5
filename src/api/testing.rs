//! Helpers shared by the API test modules.

use wiremock::MockServer;

use super::auth::TokenPair;
use super::client::ApiClient;
use crate::config::ClientConfig;
use crate::state::ClientState;

/// Client pointed at a mock server with a fresh in-memory state.
pub fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&ClientConfig::new(&server.uri()), ClientState::in_memory())
}

/// Same as `client_for`, with an access token already stored.
pub fn signed_in_client(server: &MockServer, access: &str) -> ApiClient {
    let client = client_for(server);
    client
        .state()
        .sign_in(&TokenPair {
            access: access.to_string(),
            refresh: format!("{}-refresh", access),
        })
        .unwrap();
    client
}

/// `Authorization` header of every request the server has seen, in order.
pub async fn auth_headers(server: &MockServer) -> Vec<Option<String>> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|req| {
            req.headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .collect()
}
