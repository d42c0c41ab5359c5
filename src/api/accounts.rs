//! Login, registration and profile endpoints.
//!
//! The login endpoints are on the public allowlist, so no stale bearer token
//! leaks into them. A successful login stores the returned token pair.

use super::auth::TokenPair;
use super::client::ApiClient;
use super::error::ApiError;
use super::types::{GoogleLoginRequest, LoginRequest, RegisterRequest, TokenResponse, User};

fn store_tokens(client: &ApiClient, resp: &TokenResponse) -> Result<(), ApiError> {
    client
        .state()
        .sign_in(&TokenPair {
            access: resp.access.clone(),
            refresh: resp.refresh.clone(),
        })
        .map_err(|e| ApiError::Unexpected(format!("Failed to store tokens: {}", e)))
}

/// POST /auth/login/ with username and password.
pub async fn login(client: &ApiClient, request: &LoginRequest) -> Result<TokenResponse, ApiError> {
    let resp: TokenResponse = client.post("/auth/login/", request).await?.json()?;
    store_tokens(client, &resp)?;
    log::info!("Logged in as {}", request.username);
    Ok(resp)
}

/// POST /auth/register/.
///
/// Some deployments answer with a token pair, others with the created user
/// only; tokens are stored when present and `None` is returned otherwise.
pub async fn register(
    client: &ApiClient,
    request: &RegisterRequest,
) -> Result<Option<TokenResponse>, ApiError> {
    let resp = client.post("/auth/register/", request).await?;
    match resp.json::<TokenResponse>() {
        Ok(tokens) => {
            store_tokens(client, &tokens)?;
            Ok(Some(tokens))
        }
        Err(_) => Ok(None),
    }
}

/// POST /auth/google/: exchange an identity-provider ID token for a token pair.
pub async fn google_login(client: &ApiClient, id_token: &str) -> Result<TokenResponse, ApiError> {
    let request = GoogleLoginRequest {
        id_token: id_token.to_string(),
    };
    let resp: TokenResponse = client.post("/auth/google/", &request).await?.json()?;
    store_tokens(client, &resp)?;
    log::info!("Logged in with identity provider");
    Ok(resp)
}

/// GET /auth/me/.
pub async fn current_user(client: &ApiClient) -> Result<User, ApiError> {
    client.get("/auth/me/").await?.json()
}

/// Forget the stored tokens.
pub fn logout(client: &ApiClient) -> Result<(), ApiError> {
    client
        .state()
        .sign_out()
        .map_err(|e| ApiError::Unexpected(format!("Failed to clear tokens: {}", e)))?;
    log::info!("Logged out");
    Ok(())
}
