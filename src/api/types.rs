//! Request and response types for the paperwork API.
//!
//! Field names follow the server's snake_case JSON. Response types are
//! lenient: anything the UI can live without is optional.

use serde::{Deserialize, Serialize};

// ── Auth ──────────────────────────────────────────────────────────────────────

/// Body for POST /auth/login/.
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body for POST /auth/register/.
#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Body for POST /auth/google/.
#[derive(Debug, Serialize)]
pub struct GoogleLoginRequest {
    pub id_token: String,
}

/// Token pair returned by the login endpoints.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Researcher,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Researcher => "RESEARCHER",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "RESEARCHER" => Ok(Role::Researcher),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// User profile from GET /auth/me/ and GET /admin_app/users/.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<u64>,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub status: Option<String>,
}

impl User {
    /// "First Last", falling back to the username.
    pub fn display_name(&self) -> String {
        let full = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        );
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

// ── Admin ─────────────────────────────────────────────────────────────────────

/// Body for POST /admin_app/createusers/.
#[derive(Debug, Serialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct UserStatusRequest {
    pub status: String,
}

/// Body for POST /admin_app/invite/.
#[derive(Debug, Serialize)]
pub struct InviteRequest {
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_resend: Option<bool>,
}

/// Send-attempt metadata attached to invitation responses.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InviteDetails {
    pub attempt_number: u32,
    #[serde(default)]
    pub remaining_attempts: Option<u32>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Response of POST /admin_app/invite/ and /admin_app/retry-invite/{token}/.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InviteResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<InviteDetails>,
}

/// One row of GET /admin_app/pending-invitations/.
#[derive(Debug, Clone, Deserialize)]
pub struct PendingInvitation {
    pub email: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub email_attempts: u32,
    #[serde(default)]
    pub remaining_attempts: Option<u32>,
    #[serde(default)]
    pub last_email_attempt: Option<String>,
    /// Seconds until the invitation expires.
    #[serde(default)]
    pub time_remaining: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Response of GET /admin_app/verify-invite/{token}/.
#[derive(Debug, Clone, Deserialize)]
pub struct InviteVerification {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub valid: Option<bool>,
}

/// Body for POST /admin_app/accept-invite/{token}/.
#[derive(Debug, Serialize)]
pub struct AcceptInviteRequest {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Body for POST /admin_app/paperworks/.
#[derive(Debug, Serialize)]
pub struct AssignPaperworkRequest {
    pub title: String,
    pub researcher: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeadlineRequest {
    pub deadline: String,
}

// ── Paperworks ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaperworkStatus {
    Assigned,
    Submitted,
    ChangesRequested,
    Approved,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl PaperworkStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PaperworkStatus::Assigned => "ASSIGNED",
            PaperworkStatus::Submitted => "SUBMITTED",
            PaperworkStatus::ChangesRequested => "CHANGES REQUESTED",
            PaperworkStatus::Approved => "APPROVED",
            PaperworkStatus::Rejected => "REJECTED",
            PaperworkStatus::Unknown => "N/A",
        }
    }
}

/// Researcher summary embedded in a paperwork.
#[derive(Debug, Clone, Deserialize)]
pub struct Researcher {
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paperwork {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: PaperworkStatus,
    #[serde(default)]
    pub researcher: Option<Researcher>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub assigned_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Paperwork {
    /// Who the paperwork is assigned to, for listings.
    pub fn assignee(&self) -> String {
        let Some(r) = &self.researcher else {
            return "Unassigned".to_string();
        };
        let full = format!(
            "{} {}",
            r.first_name.as_deref().unwrap_or_default(),
            r.last_name.as_deref().unwrap_or_default()
        );
        let full = full.trim();
        if full.is_empty() {
            r.username.clone()
        } else {
            full.to_string()
        }
    }

    /// Latest known activity timestamp.
    pub fn last_activity(&self) -> Option<&str> {
        self.updated_at.as_deref().or(self.assigned_at.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaperworkVersion {
    #[serde(default)]
    pub id: Option<u64>,
    pub version_no: u32,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body for POST /api/paperworks/{id}/review/.
#[derive(Debug, Serialize)]
pub struct ReviewRequest {
    pub status: PaperworkStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_no: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub id: Option<u64>,
    pub status: PaperworkStatus,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub reviewer: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Response of GET .../zip-contents/.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZipListing {
    #[serde(default)]
    pub files: Vec<String>,
}

/// Response of GET .../zip-file/{entryPath}/.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZipEntryResponse {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub is_binary: Option<bool>,
}

// ── Stats & notifications ─────────────────────────────────────────────────────

/// Dashboard counters. The server decides which keys exist, so they are
/// kept as an ordered map.
pub type StatsSummary = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invite_request_omits_absent_force_resend() {
        let body = serde_json::to_value(InviteRequest {
            email: "a@b.com".into(),
            role: Role::Researcher,
            force_resend: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"email": "a@b.com", "role": "RESEARCHER"}));
    }

    #[test]
    fn test_unknown_paperwork_status() {
        let p: Paperwork = serde_json::from_value(serde_json::json!({
            "id": 3, "title": "T", "status": "ARCHIVED"
        }))
        .unwrap();
        assert_eq!(p.status, PaperworkStatus::Unknown);
        assert_eq!(p.assignee(), "Unassigned");
    }

    #[test]
    fn test_assignee_prefers_full_name() {
        let p: Paperwork = serde_json::from_value(serde_json::json!({
            "id": 3, "title": "T", "status": "CHANGES_REQUESTED",
            "researcher": {"username": "ada", "first_name": "Ada", "last_name": "Lovelace"},
            "assigned_at": "2024-01-01"
        }))
        .unwrap();
        assert_eq!(p.assignee(), "Ada Lovelace");
        assert_eq!(p.status.label(), "CHANGES REQUESTED");
        assert_eq!(p.last_activity(), Some("2024-01-01"));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("researcher".parse::<Role>().unwrap(), Role::Researcher);
        assert!("guest".parse::<Role>().is_err());
    }
}
