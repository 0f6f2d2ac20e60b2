//! services/client/src/bin/lens.rs

use clap::{Parser, Subcommand};
use client_lib::{
    adapters::IdentityToolkitAdapter,
    config::Config,
    error::ClientError,
    flows::{
        auth::{self, AuthOutcome, PendingVerification},
        conversation::SubmitOutcome,
        document::{describe, document_view_url, load_document_info},
        history::{document_rows, load_document_queries, load_history, summary_lines},
        navigation::{nav_menu, navigate_resolved, Navigation},
        upload::upload_document,
        AppState, Conversation, ProfilePoller,
    },
};
use lens_core::domain::{Notification, NotificationLevel, Role, Transcript, UploadFile, UserProfile};
use lens_core::format::{format_date, render_answer, Block, Span};
use lens_core::ports::{FederatedCredential, SessionProvider};
use lens_core::routing::Route;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lens", about = "Upload PDFs and ask questions about them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the backend is reachable.
    Health,
    /// Show what the page at PATH would display right now.
    Open { path: String },
    Login {
        email: String,
        #[arg(long, env = "LENS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Signup {
        email: String,
        #[arg(long, env = "LENS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in with an id token issued by a federated provider.
    LoginFederated {
        #[arg(long, default_value = "google.com")]
        provider: String,
        #[arg(long)]
        id_token: String,
    },
    /// Send a new verification link to an unverified account.
    ResendVerification {
        email: String,
        #[arg(long, env = "LENS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Show the signed-in profile; with --watch, keep polling it.
    Me {
        #[arg(long)]
        watch: bool,
    },
    Upload {
        file: PathBuf,
        /// Credit balance last shown; zero stops the upload locally.
        #[arg(long)]
        credits: Option<i64>,
    },
    Info { document_id: String },
    /// Ask one question, or read questions from stdin when none is given.
    Ask {
        document_id: String,
        question: Option<String>,
    },
    History {
        #[arg(long)]
        document: Option<String>,
    },
    /// Open a conversation on the demo document.
    Demo,
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let cli = Cli::parse();
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded. Backend at {}", config.api_base_url);

    // --- 2. Build the Shared AppState & Resolve the Session ---
    let http = reqwest::Client::builder().build()?;
    let app = Arc::new(AppState::from_config(config, http.clone()));
    app.session.restore()?;

    // --- 3. Run the Command ---
    match cli.command {
        Command::Health => {
            let status = app.documents.health().await?;
            println!("{}", status);
        }
        Command::Open { path } => open(&app, &path).await,
        Command::Login { email, password } => {
            let identity = identity(&app, http)?;
            match auth::sign_in(&identity, &app.session, &email, &password).await {
                Ok(outcome) => report_auth(&outcome),
                Err(e) => notify(&e.notification()),
            }
        }
        Command::Signup { email, password } => {
            let identity = identity(&app, http)?;
            match auth::sign_up(&identity, &app.session, &email, &password).await {
                Ok(outcome) => report_auth(&outcome),
                Err(e) => notify(&e.notification()),
            }
        }
        Command::LoginFederated { provider, id_token } => {
            let identity = identity(&app, http)?;
            let credential = FederatedCredential {
                provider_id: provider,
                id_token,
            };
            match auth::sign_in_federated(&identity, &app.session, &credential).await {
                Ok(outcome) => report_auth(&outcome),
                Err(e) => notify(&e.notification()),
            }
        }
        Command::ResendVerification { email, password } => {
            let identity = identity(&app, http)?;
            match auth::sign_in(&identity, &app.session, &email, &password).await {
                Ok(AuthOutcome::Unverified { pending, .. }) => resend(&identity, &pending).await,
                Ok(outcome) => report_auth(&outcome),
                Err(e) => notify(&e.notification()),
            }
        }
        Command::Logout => match auth::sign_out(&app.session) {
            Ok(notification) => notify(&notification),
            Err(e) => notify(&e.notification()),
        },
        Command::Me { watch } => me(&app, watch).await?,
        Command::Upload { file, credits } => {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let bytes = tokio::fs::read(&file).await?;
            match upload_document(&app, &UploadFile::new(name, bytes), credits).await {
                Ok(success) => {
                    notify(&success.notification);
                    println!("Document id: {}", success.document_id());
                    println!("Continue with: lens ask {}", success.document_id());
                }
                Err(e) => notify(&e.notification()),
            }
        }
        Command::Info { document_id } => {
            let info = load_document_info(&app, &document_id).await;
            for line in describe(&info) {
                println!("{}", line);
            }
            println!("View: {}", document_view_url(&app, &document_id));
        }
        Command::Ask {
            document_id,
            question,
        } => converse(app.clone(), document_id, question).await?,
        Command::History { document } => history(&app, document).await,
        Command::Demo => {
            let demo = app.config.demo_document_id.clone();
            println!("Demo document: {}", demo);
            converse(app.clone(), demo, None).await?;
        }
    }

    Ok(())
}

fn identity(app: &AppState, http: reqwest::Client) -> Result<IdentityToolkitAdapter, ClientError> {
    let key = app.config.require_identity_api_key()?;
    Ok(IdentityToolkitAdapter::new(
        http,
        &app.config.identity_base_url,
        key,
    ))
}

async fn resend(identity: &IdentityToolkitAdapter, pending: &PendingVerification) {
    match auth::resend_verification(identity, pending).await {
        Ok(notification) => notify(&notification),
        Err(e) => notify(&e.notification()),
    }
}

async fn open(app: &AppState, path: &str) {
    match navigate_resolved(&app.session, path).await {
        Navigation::Render(route) => {
            println!("{}", route.title());
            for line in nav_menu(route) {
                println!("{}", line);
            }
        }
        Navigation::Loading(route) => println!("{}: Loading...", route.title()),
        Navigation::Redirect { from, to } => {
            println!("{} requires sign-in; redirecting to {}", from.title(), to.path())
        }
    }
}

async fn me(app: &Arc<AppState>, watch: bool) -> Result<(), ClientError> {
    if app.session.snapshot().is_guest() {
        notify(&Notification::info("Guest", "Not signed in."));
        return Ok(());
    }
    if !watch {
        let token = app.session.id_token().await?;
        let profile = app.documents.me(token.as_deref()).await?;
        print_profile(&profile);
        return Ok(());
    }

    let poller = ProfilePoller::spawn(app.clone());
    let mut updates = poller.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(profile) = updates.borrow_and_update().clone() {
                    print_profile(&profile);
                }
            }
        }
    }
    poller.stop().await;
    Ok(())
}

fn print_profile(profile: &UserProfile) {
    println!("{}  {} credits", profile.email, profile.credits);
}

async fn history(app: &AppState, document: Option<String>) {
    match document {
        Some(id) => {
            let loaded = load_document_queries(app, &id).await;
            if let Some(error) = &loaded.error {
                notify(error);
            }
            for query in &loaded.value {
                println!("[{}] ({} ms)", format_date(&query.query_date), query.response_time_ms);
                println!("Q: {}", query.query_text);
                println!("A: {}", query.response_text);
                println!();
            }
        }
        None => {
            if app.session.snapshot().is_guest() {
                println!("Redirecting to {}", Route::Login.path());
                return;
            }
            let loaded = load_history(app).await;
            if let Some(error) = &loaded.error {
                notify(error);
            }
            let [documents, total] = summary_lines(&loaded.value);
            println!("{}  {}", documents, total);
            for row in document_rows(&loaded.value) {
                println!("{}", row);
            }
        }
    }
}

async fn converse(
    app: Arc<AppState>,
    document_id: String,
    question: Option<String>,
) -> Result<(), ClientError> {
    let conversation = Conversation::new(app, document_id);

    if let Some(question) = question {
        conversation.ask(&question).await;
        print_new_turns(&conversation.transcript().await, 1);
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shown = 0;
    while let Some(line) = lines.next_line().await? {
        conversation.set_draft(line).await;
        if conversation.submit().await == SubmitOutcome::Ignored {
            continue;
        }
        let transcript = conversation.transcript().await;
        // The user's own line is already on screen.
        print_new_turns(&transcript, shown + 1);
        shown = transcript.len();
    }
    Ok(())
}

fn print_new_turns(transcript: &Transcript, from: usize) {
    for turn in transcript.turns().iter().skip(from) {
        match turn.role {
            Role::User => println!("> {}", turn.text),
            Role::Assistant => print_answer(&turn.text),
        }
    }
}

fn print_answer(text: &str) {
    for block in render_answer(text) {
        match block {
            Block::List(items) => {
                for item in items {
                    println!("  {}", item);
                }
            }
            Block::Paragraph(lines) => {
                for line in lines {
                    let rendered: String = line
                        .iter()
                        .map(|span| match span {
                            Span::Text(text) => text.clone(),
                            Span::Strong(text) => text.to_uppercase(),
                        })
                        .collect();
                    println!("{}", rendered);
                }
            }
        }
        println!();
    }
}

fn report_auth(outcome: &AuthOutcome) {
    notify(outcome.notification());
    if let AuthOutcome::Unverified { pending, .. } = outcome {
        if let Some(email) = &pending.email {
            println!("Run `lens resend-verification {}` for a new link.", email);
        }
    }
}

fn notify(notification: &Notification) {
    let level = match notification.level {
        NotificationLevel::Success => "success",
        NotificationLevel::Info => "info",
        NotificationLevel::Warning => "warning",
        NotificationLevel::Error => "error",
    };
    println!("[{}] {}: {}", level, notification.title, notification.message);
}
