mod commands;

use std::sync::Arc;

use clap::Parser;

use paperwork_client::api::auth::TokenStore;
use paperwork_client::api::ApiClient;
use paperwork_client::config::ClientConfig;
use paperwork_client::state::ClientState;

mod cli {
    use std::path::PathBuf;

    use clap::{Parser, Subcommand};

    #[derive(Parser, Debug)]
    #[command(name = "paperwork", about = "Paperwork management client")]
    pub struct Args {
        /// API base URL (overrides PAPERWORK_API_URL / VITE_API_URL)
        #[arg(long, global = true)]
        pub api_url: Option<String>,

        /// Token storage: file, keychain or memory
        #[arg(long, global = true)]
        pub token_store: Option<String>,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Subcommand, Debug)]
    pub enum Command {
        /// Sign in with username and password
        Login {
            username: String,
            #[arg(long, env = "PAPERWORK_PASSWORD")]
            password: String,
        },
        /// Sign in with an identity-provider token
        GoogleLogin { id_token: String },
        /// Create an account
        Register {
            username: String,
            email: String,
            #[arg(long, env = "PAPERWORK_PASSWORD")]
            password: String,
            #[arg(long, default_value = "RESEARCHER")]
            role: String,
        },
        /// Forget the stored tokens
        Logout,
        /// Show the signed-in user
        Me,
        /// List users (admin)
        Users,
        /// Invite a user by email (admin)
        Invite {
            email: String,
            #[arg(long, default_value = "RESEARCHER")]
            role: String,
            #[arg(long)]
            force_resend: bool,
        },
        /// Resend a pending invitation (admin)
        RetryInvite { token: String },
        /// List pending invitations (admin)
        Invitations,
        /// Check an invitation token
        VerifyInvite { token: String },
        /// Complete registration from an invitation
        AcceptInvite {
            token: String,
            username: String,
            #[arg(long, env = "PAPERWORK_PASSWORD")]
            password: String,
            #[arg(long)]
            first_name: Option<String>,
            #[arg(long)]
            last_name: Option<String>,
        },
        /// List paperworks
        Papers,
        /// Show one paperwork
        Paper { id: u64 },
        /// List the versions of a paperwork
        Versions { id: u64 },
        /// List the reviews of a paperwork
        Reviews { id: u64 },
        /// Review a paperwork (admin)
        Review {
            id: u64,
            /// APPROVED, REJECTED or CHANGES_REQUESTED
            status: String,
            #[arg(long)]
            comments: Option<String>,
            #[arg(long)]
            version: Option<u32>,
        },
        /// Assign a new paperwork to a researcher (admin)
        Assign {
            title: String,
            researcher: String,
            #[arg(long)]
            description: Option<String>,
            #[arg(long)]
            deadline: Option<String>,
        },
        /// Change a paperwork deadline (admin)
        Deadline { id: u64, deadline: String },
        /// Create a paperwork with its first file
        CreatePaper {
            title: String,
            file: PathBuf,
            #[arg(long)]
            description: Option<String>,
        },
        /// Upload a new version of a paperwork
        SubmitVersion {
            id: u64,
            file: PathBuf,
            #[arg(long)]
            notes: Option<String>,
        },
        /// Preview a submitted file
        View {
            id: String,
            version: String,
            /// pdf, docx, tex or zip
            format: String,
            /// ZIP entry to open
            #[arg(long)]
            entry: Option<String>,
            /// Write DOCX bytes or the selected image here
            #[arg(long)]
            out: Option<PathBuf>,
        },
        /// Dashboard counters
        Stats,
        /// Download the paperwork report as CSV
        ExportCsv { out: PathBuf },
        /// List notifications
        Notifications,
        /// Mark a notification as read
        MarkRead { id: u64 },
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    env_logger::init();

    let args = cli::Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: cli::Args) -> Result<(), String> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = args.api_url {
        config.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(kind) = args.token_store {
        config.token_store = kind.parse()?;
    }
    log::debug!("Using API at {}", config.base_url);

    let state = ClientState::init(TokenStore::new(config.token_backend()?));
    let client = Arc::new(ApiClient::new(&config, state));
    commands::dispatch(client, args.command).await
}
