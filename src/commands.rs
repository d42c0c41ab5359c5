//! Subcommand handlers for the `paperwork` binary.
//!
//! Each handler calls one or two library operations and prints the result.
//! API failures are reported with `ApiError::user_message`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use paperwork_client::api::paperworks::Upload;
use paperwork_client::api::types::{
    AcceptInviteRequest, AssignPaperworkRequest, InviteRequest, LoginRequest, PaperworkStatus,
    RegisterRequest, ReviewRequest, Role,
};
use paperwork_client::api::{
    accounts, admin, notifications, paperworks, reports, ApiClient, ApiError,
};
use paperwork_client::routes;
use paperwork_client::viewer::{DocumentRef, DocumentViewer, DocxMount, Format, ViewerView};

use crate::cli::Command;

fn report(e: ApiError) -> String {
    log::debug!("API error: {:?}", e);
    e.user_message()
}

fn parse_role(role: &str) -> Result<Role, String> {
    role.parse()
}

fn parse_status(status: &str) -> Result<PaperworkStatus, String> {
    let tag = status.trim().to_ascii_uppercase().replace([' ', '-'], "_");
    match serde_json::from_value(serde_json::Value::String(tag)) {
        Ok(PaperworkStatus::Unknown) | Err(_) => Err(format!("unknown status '{}'", status)),
        Ok(status) => Ok(status),
    }
}

async fn read_upload(path: &Path) -> Result<Upload, String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("Invalid file name: {}", path.display()))?;
    Ok(Upload::new(file_name, bytes))
}

/// Check the signed-in user's role against the screen a command stands for.
async fn require(client: &ApiClient, path: &str) -> Result<(), String> {
    let user = accounts::current_user(client).await.map_err(report)?;
    routes::authorize(path, Some(&user))
}

/// Writes DOCX bytes to a file for an external program to open.
struct FileMount(PathBuf);

impl DocxMount for FileMount {
    async fn render(&self, bytes: &[u8]) -> Result<(), String> {
        tokio::fs::write(&self.0, bytes)
            .await
            .map_err(|e| format!("Failed to write {}: {}", self.0.display(), e))
    }
}

pub async fn dispatch(client: Arc<ApiClient>, command: Command) -> Result<(), String> {
    match command {
        // ── Accounts ──
        Command::Login { username, password } => {
            let resp = accounts::login(&client, &LoginRequest { username, password })
                .await
                .map_err(report)?;
            match resp.user {
                Some(user) => println!("Signed in as {} ({})", user.display_name(), user.role.as_str()),
                None => println!("Signed in"),
            }
        }
        Command::GoogleLogin { id_token } => {
            accounts::google_login(&client, &id_token)
                .await
                .map_err(report)?;
            println!("Signed in");
        }
        Command::Register {
            username,
            email,
            password,
            role,
        } => {
            let request = RegisterRequest {
                username,
                email,
                password,
                role: parse_role(&role)?,
            };
            match accounts::register(&client, &request).await.map_err(report)? {
                Some(_) => println!("Account created, signed in"),
                None => println!("Account created, please sign in"),
            }
        }
        Command::Logout => {
            accounts::logout(&client).map_err(report)?;
            println!("Signed out");
        }
        Command::Me => {
            let user = accounts::current_user(&client).await.map_err(report)?;
            println!("{} <{}>", user.display_name(), user.email.as_deref().unwrap_or("-"));
            println!("Role: {}", user.role.as_str());
        }

        // ── Administration ──
        Command::Users => {
            require(&client, "/admin/users").await?;
            for user in admin::get_users(&client).await.map_err(report)? {
                println!(
                    "{:<20} {:<30} {:<11} {}",
                    user.username,
                    user.email.as_deref().unwrap_or("-"),
                    user.role.as_str(),
                    user.status.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Invite {
            email,
            role,
            force_resend,
        } => {
            require(&client, "/admin/users/create").await?;
            let request = InviteRequest {
                email,
                role: parse_role(&role)?,
                force_resend: force_resend.then_some(true),
            };
            let resp = admin::invite_user(&client, &request)
                .await
                .map_err(report)?;
            println!("{}", resp.summary());
        }
        Command::RetryInvite { token } => {
            require(&client, "/admin/users").await?;
            let resp = admin::retry_invite(&client, &token).await.map_err(report)?;
            println!("{}", resp.retry_summary());
        }
        Command::Invitations => {
            require(&client, "/admin/users").await?;
            let pending = admin::get_pending_invitations(&client)
                .await
                .map_err(report)?;
            if pending.is_empty() {
                println!("No pending invitations");
            }
            for inv in pending {
                println!(
                    "{:<30} {:<11} attempts {}/{}{}",
                    inv.email,
                    inv.role.map(|r| r.as_str()).unwrap_or("-"),
                    inv.email_attempts,
                    admin::MAX_INVITE_ATTEMPTS,
                    if inv.can_retry() { "" } else { "  (max attempts reached)" }
                );
            }
        }
        Command::VerifyInvite { token } => {
            let info = admin::verify_invite(&client, &token)
                .await
                .map_err(report)?;
            println!(
                "Invitation for {} as {}",
                info.email.as_deref().unwrap_or("-"),
                info.role.map(|r| r.as_str()).unwrap_or("-")
            );
        }
        Command::AcceptInvite {
            token,
            username,
            password,
            first_name,
            last_name,
        } => {
            let request = AcceptInviteRequest {
                username,
                password,
                first_name,
                last_name,
            };
            admin::accept_invite(&client, &token, &request)
                .await
                .map_err(report)?;
            println!("Registration complete, please sign in");
        }
        Command::Assign {
            title,
            researcher,
            description,
            deadline,
        } => {
            require(&client, "/admin/papers").await?;
            let request = AssignPaperworkRequest {
                title,
                researcher,
                description,
                deadline,
            };
            let paper = admin::assign_paperwork(&client, &request)
                .await
                .map_err(report)?;
            println!("Assigned paperwork #{} to {}", paper.id, paper.assignee());
        }
        Command::Deadline { id, deadline } => {
            require(&client, &format!("/admin/papers/{}/deadline", id)).await?;
            admin::update_paperwork_deadline(&client, id, &deadline)
                .await
                .map_err(report)?;
            println!("Deadline updated");
        }
        Command::Review {
            id,
            status,
            comments,
            version,
        } => {
            require(&client, &format!("/admin/papers/{}", id)).await?;
            let review = ReviewRequest {
                status: parse_status(&status)?,
                comments,
                version_no: version,
            };
            admin::review_paperwork(&client, id, &review)
                .await
                .map_err(report)?;
            println!("Review submitted");
        }

        // ── Paperworks ──
        Command::Papers => {
            for paper in paperworks::list(&client).await.map_err(report)? {
                println!(
                    "#{:<5} {:<40} {:<18} {:<25} {}",
                    paper.id,
                    paper.title,
                    paper.status.label(),
                    paper.assignee(),
                    paper.last_activity().unwrap_or("-")
                );
            }
        }
        Command::Paper { id } => {
            let paper = paperworks::get(&client, id).await.map_err(report)?;
            println!("#{} {}", paper.id, paper.title);
            println!("Status:     {}", paper.status.label());
            println!("Researcher: {}", paper.assignee());
            println!("Deadline:   {}", paper.deadline.as_deref().unwrap_or("-"));
            if let Some(description) = &paper.description {
                println!("\n{}", description);
            }
        }
        Command::Versions { id } => {
            for v in paperworks::versions(&client, id).await.map_err(report)? {
                println!(
                    "v{:<3} {:<5} {}  {}",
                    v.version_no,
                    v.file_type.as_deref().unwrap_or("-"),
                    v.submitted_at.as_deref().unwrap_or("-"),
                    v.notes.as_deref().unwrap_or("")
                );
            }
        }
        Command::Reviews { id } => {
            for r in paperworks::reviews(&client, id).await.map_err(report)? {
                println!(
                    "{:<18} {:<15} {}",
                    r.status.label(),
                    r.reviewer.as_deref().unwrap_or("-"),
                    r.comments.as_deref().unwrap_or("")
                );
            }
        }
        Command::CreatePaper {
            title,
            file,
            description,
        } => {
            require(&client, "/papers/create").await?;
            let mut upload = read_upload(&file).await?.field("title", &title);
            if let Some(description) = &description {
                upload = upload.field("description", description);
            }
            let paper = paperworks::create_paperwork(&client, upload)
                .await
                .map_err(report)?;
            println!("Created paperwork #{}", paper.id);
        }
        Command::SubmitVersion { id, file, notes } => {
            require(&client, &format!("/papers/{}/submit", id)).await?;
            let mut upload = read_upload(&file).await?;
            if let Some(notes) = &notes {
                upload = upload.field("notes", notes);
            }
            let version = paperworks::submit_version(&client, id, upload)
                .await
                .map_err(report)?;
            println!("Submitted version {}", version.version_no);
        }
        Command::View {
            id,
            version,
            format,
            entry,
            out,
        } => view(client, DocumentRef::new(id, version, Format::parse(&format)), entry, out).await?,

        // ── Reports and notifications ──
        Command::Stats => {
            let user = accounts::current_user(&client).await.map_err(report)?;
            let summary = match user.role {
                Role::Admin => reports::admin_summary(&client).await,
                Role::Researcher => reports::researcher_summary(&client).await,
            }
            .map_err(report)?;
            for (key, value) in summary {
                println!("{:<30} {}", key, value);
            }
        }
        Command::ExportCsv { out } => {
            let bytes = reports::export_csv(&client).await.map_err(report)?;
            tokio::fs::write(&out, &bytes)
                .await
                .map_err(|e| format!("Failed to write {}: {}", out.display(), e))?;
            println!("Wrote {} bytes to {}", bytes.len(), out.display());
        }
        Command::Notifications => {
            for n in notifications::list(&client).await.map_err(report)? {
                println!(
                    "{} #{:<5} {}  {}",
                    if n.is_read { ' ' } else { '*' },
                    n.id,
                    n.created_at.as_deref().unwrap_or(""),
                    n.message
                );
            }
        }
        Command::MarkRead { id } => {
            notifications::mark_as_read(&client, id)
                .await
                .map_err(report)?;
        }
    }
    Ok(())
}

async fn view(
    client: Arc<ApiClient>,
    doc: DocumentRef,
    entry: Option<String>,
    out: Option<PathBuf>,
) -> Result<(), String> {
    let viewer = DocumentViewer::new(client);
    viewer.open(doc).await;
    if let Some(entry) = &entry {
        if !viewer.select_zip_entry(entry).await {
            return Err("--entry only applies to zip files".to_string());
        }
    }

    let view = viewer.view();
    println!("{}", view.to_text());

    match (&view, out) {
        (ViewerView::Docx { .. }, Some(out)) => {
            if viewer.mount_docx(&FileMount(out.clone())).await? {
                println!("Wrote {}", out.display());
            }
        }
        (ViewerView::Zip { pane, .. }, Some(out)) => {
            let Some(decoded) = pane.image_bytes() else {
                return Err("--out needs an image entry".to_string());
            };
            let bytes = decoded.map_err(|e| format!("Invalid image data: {}", e))?;
            tokio::fs::write(&out, &bytes)
                .await
                .map_err(|e| format!("Failed to write {}: {}", out.display(), e))?;
            println!("Wrote {}", out.display());
        }
        (ViewerView::Error(_), _) => return Err("could not load the file".to_string()),
        _ => {}
    }
    viewer.close();
    Ok(())
}
