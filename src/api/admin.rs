//! Administrator endpoints: users, invitations, assignment and review.
//!
//! Every mutation drops the cached reads it could make stale *before* the
//! request goes out, so a failed or half-applied mutation still forces a
//! refetch.

use super::client::{ApiClient, ApiResponse};
use super::error::ApiError;
use super::types::{
    AcceptInviteRequest, AssignPaperworkRequest, CreateUserRequest, DeadlineRequest,
    InviteRequest, InviteResponse, InviteVerification, Paperwork, PaperworkVersion,
    PendingInvitation, ReviewRequest, User, UserStatusRequest,
};

/// Cache prefix of the user list.
pub const USERS_PREFIX: &str = "/admin_app/users";

/// Cache prefix of the pending invitation list.
pub const INVITATIONS_PREFIX: &str = "/admin_app/pending-invitations";

/// Cache prefix of every paperwork read.
pub const PAPERWORKS_PREFIX: &str = "/api/paperworks";

/// Server-side cap on invitation email attempts.
pub const MAX_INVITE_ATTEMPTS: u32 = 5;

impl InviteResponse {
    /// Message shown after a successful invitation.
    pub fn summary(&self) -> String {
        match &self.details {
            Some(details) => {
                let mut msg = format!(
                    "Invitation sent (attempt {} of {})",
                    details.attempt_number, MAX_INVITE_ATTEMPTS
                );
                if let Some(remaining) = details.remaining_attempts {
                    msg.push_str(&format!(", {} remaining", remaining));
                }
                if let Some(expires_at) = &details.expires_at {
                    msg.push_str(&format!(", expires {}", expires_at));
                }
                msg
            }
            None => "Invitation sent successfully! The user will receive an email to complete their registration.".to_string(),
        }
    }

    /// Message shown after a successful retry.
    pub fn retry_summary(&self) -> String {
        match &self.details {
            Some(details) => format!(
                "Invitation retry sent successfully! Attempt {} of {}",
                details.attempt_number, MAX_INVITE_ATTEMPTS
            ),
            None => "Invitation retry sent successfully!".to_string(),
        }
    }
}

impl PendingInvitation {
    /// Whether the retry action should be offered.
    pub fn can_retry(&self) -> bool {
        self.email_attempts < MAX_INVITE_ATTEMPTS
    }
}

// ── Users ─────────────────────────────────────────────────────────────────────

pub async fn get_users(client: &ApiClient) -> Result<Vec<User>, ApiError> {
    client.get("/admin_app/users/").await?.json()
}

pub async fn create_user(client: &ApiClient, request: &CreateUserRequest) -> Result<User, ApiError> {
    client.invalidate(&[USERS_PREFIX]);
    client.post("/admin_app/createusers/", request).await?.json()
}

pub async fn update_user_status(
    client: &ApiClient,
    username: &str,
    status: &str,
) -> Result<(), ApiError> {
    client.invalidate(&[USERS_PREFIX]);
    let path = format!(
        "/admin_app/updateusers/{}/status/",
        urlencoding::encode(username)
    );
    client
        .patch(
            &path,
            &UserStatusRequest {
                status: status.to_string(),
            },
        )
        .await?;
    Ok(())
}

// ── Invitations ───────────────────────────────────────────────────────────────

/// The send already succeeded, so an unreadable body only loses the attempt
/// metadata.
fn invite_body(resp: &ApiResponse) -> InviteResponse {
    resp.json().unwrap_or_else(|e| {
        log::debug!("Ignoring unreadable invitation response: {}", e);
        InviteResponse::default()
    })
}

/// POST /admin_app/invite/.
pub async fn invite_user(
    client: &ApiClient,
    request: &InviteRequest,
) -> Result<InviteResponse, ApiError> {
    client.invalidate(&[USERS_PREFIX, INVITATIONS_PREFIX]);
    let resp = client.post("/admin_app/invite/", request).await?;
    log::info!("Invitation sent to {}", request.email);
    Ok(invite_body(&resp))
}

/// POST /admin_app/retry-invite/{token}/.
pub async fn retry_invite(client: &ApiClient, token: &str) -> Result<InviteResponse, ApiError> {
    client.invalidate(&[INVITATIONS_PREFIX]);
    let path = format!("/admin_app/retry-invite/{}/", urlencoding::encode(token));
    let resp = client.post_empty(&path).await?;
    Ok(invite_body(&resp))
}

pub async fn get_pending_invitations(
    client: &ApiClient,
) -> Result<Vec<PendingInvitation>, ApiError> {
    client.get("/admin_app/pending-invitations/").await?.json()
}

/// GET /admin_app/verify-invite/{token}/ (public).
pub async fn verify_invite(
    client: &ApiClient,
    token: &str,
) -> Result<InviteVerification, ApiError> {
    let path = format!("/admin_app/verify-invite/{}/", urlencoding::encode(token));
    client.get(&path).await?.json()
}

/// POST /admin_app/accept-invite/{token}/ (public).
pub async fn accept_invite(
    client: &ApiClient,
    token: &str,
    request: &AcceptInviteRequest,
) -> Result<(), ApiError> {
    let path = format!("/admin_app/accept-invite/{}/", urlencoding::encode(token));
    client.post(&path, request).await?;
    Ok(())
}

// ── Paperworks ────────────────────────────────────────────────────────────────

pub async fn assign_paperwork(
    client: &ApiClient,
    request: &AssignPaperworkRequest,
) -> Result<Paperwork, ApiError> {
    client.invalidate(&[PAPERWORKS_PREFIX]);
    client.post("/admin_app/paperworks/", request).await?.json()
}

pub async fn update_paperwork_deadline(
    client: &ApiClient,
    id: u64,
    deadline: &str,
) -> Result<(), ApiError> {
    client.invalidate(&[PAPERWORKS_PREFIX]);
    let path = format!("/admin_app/paperworks/{}/deadline/", id);
    client
        .patch(
            &path,
            &DeadlineRequest {
                deadline: deadline.to_string(),
            },
        )
        .await?;
    Ok(())
}

pub async fn review_paperwork(
    client: &ApiClient,
    id: u64,
    review: &ReviewRequest,
) -> Result<(), ApiError> {
    client.invalidate(&[PAPERWORKS_PREFIX]);
    client
        .post(&format!("/api/paperworks/{}/review/", id), review)
        .await?;
    Ok(())
}

pub async fn get_paperwork_by_id(client: &ApiClient, id: u64) -> Result<Paperwork, ApiError> {
    client.get(&format!("/api/paperworks/{}/", id)).await?.json()
}

pub async fn get_paperwork_versions(
    client: &ApiClient,
    id: u64,
) -> Result<Vec<PaperworkVersion>, ApiError> {
    client
        .get(&format!("/api/paperworks/{}/versions/", id))
        .await?
        .json()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::cache::ResponseCache;
    use crate::api::testing::{auth_headers, client_for, signed_in_client};
    use crate::api::types::{InviteDetails, PaperworkStatus, Role};

    fn seed(client: &ApiClient, urls: &[&str]) -> Vec<String> {
        urls.iter()
            .map(|url| {
                let key = ResponseCache::key("GET", url, &[]);
                client.state().cache.put(&key, b"[]".to_vec(), HashMap::new());
                key
            })
            .collect()
    }

    #[tokio::test]
    async fn test_invite_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin_app/invite/"))
            .and(body_json(json!({"email": "a@b.com", "role": "RESEARCHER"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "message": "Invitation sent",
                "details": {"attempt_number": 1, "remaining_attempts": 4, "expires_at": "2025-01-08T00:00:00Z"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = signed_in_client(&server, "admin-token");
        let keys = seed(
            &client,
            &[
                "/admin_app/users/",
                "/admin_app/pending-invitations/",
                "/api/paperworks/",
            ],
        );

        let resp = invite_user(
            &client,
            &InviteRequest {
                email: "a@b.com".into(),
                role: Role::Researcher,
                force_resend: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(
            resp.summary(),
            "Invitation sent (attempt 1 of 5), 4 remaining, expires 2025-01-08T00:00:00Z"
        );
        assert!(client.state().cache.get(&keys[0]).is_none());
        assert!(client.state().cache.get(&keys[1]).is_none());
        assert!(client.state().cache.get(&keys[2]).is_some());
        assert_eq!(
            auth_headers(&server).await,
            vec![Some("Bearer admin-token".to_string())]
        );
    }

    #[tokio::test]
    async fn test_invite_without_details_uses_generic_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin_app/invite/"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let client = signed_in_client(&server, "t");
        let resp = invite_user(
            &client,
            &InviteRequest {
                email: "a@b.com".into(),
                role: Role::Researcher,
                force_resend: Some(true),
            },
        )
        .await
        .unwrap();
        assert!(resp.details.is_none());
        assert!(resp.summary().starts_with("Invitation sent successfully!"));
    }

    #[tokio::test]
    async fn test_invite_with_malformed_details_still_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin_app/invite/"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"details": {"attempt_number": "first"}})),
            )
            .mount(&server)
            .await;

        let client = signed_in_client(&server, "t");
        let request = InviteRequest {
            email: "a@b.com".to_string(),
            role: Role::Researcher,
            force_resend: None,
        };
        let resp = invite_user(&client, &request).await.unwrap();
        assert!(resp.details.is_none());
        assert_eq!(
            resp.summary(),
            "Invitation sent successfully! The user will receive an email to complete their registration."
        );
    }

    #[tokio::test]
    async fn test_invalidation_happens_even_when_mutation_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/paperworks/4/review/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = signed_in_client(&server, "t");
        let keys = seed(&client, &["/api/paperworks/", "/api/paperworks/4/", "/auth/me/"]);

        let err = review_paperwork(
            &client,
            4,
            &ReviewRequest {
                status: PaperworkStatus::Approved,
                comments: None,
                version_no: Some(2),
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert!(client.state().cache.get(&keys[0]).is_none());
        assert!(client.state().cache.get(&keys[1]).is_none());
        assert!(client.state().cache.get(&keys[2]).is_some());
    }

    #[tokio::test]
    async fn test_retry_invite_message_and_scope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin_app/retry-invite/tok123/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "details": {"attempt_number": 3}
            })))
            .mount(&server)
            .await;

        let client = signed_in_client(&server, "t");
        let keys = seed(&client, &["/admin_app/pending-invitations/", "/admin_app/users/"]);

        let resp = retry_invite(&client, "tok123").await.unwrap();
        assert_eq!(
            resp.details,
            Some(InviteDetails {
                attempt_number: 3,
                remaining_attempts: None,
                expires_at: None
            })
        );
        assert_eq!(
            resp.retry_summary(),
            "Invitation retry sent successfully! Attempt 3 of 5"
        );
        assert!(client.state().cache.get(&keys[0]).is_none());
        assert!(client.state().cache.get(&keys[1]).is_some());
    }

    #[tokio::test]
    async fn test_user_mutations_invalidate_user_list() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/admin_app/updateusers/ada/status/"))
            .and(body_json(json!({"status": "INACTIVE"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = signed_in_client(&server, "t");
        let keys = seed(&client, &["/admin_app/users/", "/admin_app/pending-invitations/"]);

        update_user_status(&client, "ada", "INACTIVE").await.unwrap();
        assert!(client.state().cache.get(&keys[0]).is_none());
        assert!(client.state().cache.get(&keys[1]).is_some());
    }

    #[tokio::test]
    async fn test_deadline_update_invalidates_paperworks() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/admin_app/paperworks/8/deadline/"))
            .and(body_json(json!({"deadline": "2025-03-01"})))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = signed_in_client(&server, "t");
        let keys = seed(&client, &["/api/paperworks/8/versions/"]);
        update_paperwork_deadline(&client, 8, "2025-03-01").await.unwrap();
        assert!(client.state().cache.get(&keys[0]).is_none());
    }

    #[tokio::test]
    async fn test_verify_invite_is_public() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin_app/verify-invite/abc/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"email": "a@b.com", "role": "ADMIN", "valid": true})),
            )
            .mount(&server)
            .await;

        let client = signed_in_client(&server, "t");
        let verification = verify_invite(&client, "abc").await.unwrap();
        assert_eq!(verification.role, Some(Role::Admin));
        assert_eq!(auth_headers(&server).await, vec![None]);
    }

    #[tokio::test]
    async fn test_pending_invitations_are_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin_app/pending-invitations/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"email": "a@b.com", "token": "t1", "email_attempts": 5, "remaining_attempts": 0},
                {"email": "c@d.com", "token": "t2", "email_attempts": 2, "remaining_attempts": 3}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let first = get_pending_invitations(&client).await.unwrap();
        let second = get_pending_invitations(&client).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert!(!first[0].can_retry());
        assert!(first[1].can_retry());
    }
}
