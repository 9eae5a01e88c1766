// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Mailcheck portal CLI
//!
//! Drives the auth gate from a terminal (login, register, status, ...) with
//! the session kept in a local file, and serves the mock auth service.

use clap::{Args, Parser, Subcommand};
use mailcheck_portal::{
    auth::AuthGate,
    config::{AuthBackend, Config},
    error::AuthError,
    models::{Session, UserPatch},
    navigation::{HistoryNavigator, Navigator, DASHBOARD_PATH, LOGIN_PATH},
    persistence::FileSessionStore,
    services::{ActiveAuthApi, HttpAuthApi, LocalAuthApi, UserDirectory},
    AppState,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "mailcheck-portal", about = "Mailcheck dashboard session CLI and mock auth service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the mock auth service over HTTP
    Serve,
    /// Restore the persisted session and report who is signed in
    Status {
        /// Location the client is at when it starts
        #[arg(long, default_value = DASHBOARD_PATH)]
        path: String,
    },
    /// Sign in with email and password
    Login(LoginArgs),
    /// Create an account and sign in
    Register(RegisterArgs),
    /// Sign out and forget the persisted session
    Logout,
    /// Request a password reset email
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    /// Edit profile fields of the signed-in user
    UpdateProfile(ProfileArgs),
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "MAILCHECK_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "MAILCHECK_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct ProfileArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    company: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    avatar_url: Option<String>,
}

type Gate = AuthGate<ActiveAuthApi, FileSessionStore, Arc<HistoryNavigator>>;

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    match command {
        Command::Serve => serve(config).await,
        Command::Status { path } => {
            let gate = build_gate(&config, &path)?;
            let session = gate.restore().await;
            print_session(&session);
            print_redirects(gate.navigator());
            Ok(())
        }
        Command::Login(args) => {
            let gate = build_gate(&config, LOGIN_PATH)?;
            let user = gate
                .login(args.email.trim(), &args.password)
                .await
                .map_err(user_facing)?;
            println!("Signed in as {} <{}>", user.name, user.email);
            print_redirects(gate.navigator());
            Ok(())
        }
        Command::Register(args) => {
            let gate = build_gate(&config, "/register")?;
            let user = gate
                .register(args.name.trim(), args.email.trim(), &args.password)
                .await
                .map_err(user_facing)?;
            println!("Welcome, {}! You have {} credits.", user.name, user.credits);
            print_redirects(gate.navigator());
            Ok(())
        }
        Command::Logout => {
            let gate = build_gate(&config, DASHBOARD_PATH)?;
            gate.logout();
            println!("Signed out");
            Ok(())
        }
        Command::ForgotPassword { email } => {
            let gate = build_gate(&config, "/forgot-password")?;
            gate.forgot_password(email.trim()).await.map_err(user_facing)?;
            println!("If an account exists for {email}, a reset link is on its way");
            Ok(())
        }
        Command::UpdateProfile(args) => {
            let gate = build_gate(&config, "/settings")?;
            gate.restore().await;
            let patch = UserPatch {
                name: args.name,
                company: args.company,
                phone: args.phone,
                avatar_url: args.avatar_url,
                ..UserPatch::default()
            };
            match gate.update_user(patch) {
                Some(user) => println!("Profile updated for {}", user.email),
                None => println!("Not signed in; nothing to update"),
            }
            Ok(())
        }
    }
}

/// Wire the gate to the configured auth service and the session file.
fn build_gate(config: &Config, start_path: &str) -> anyhow::Result<Gate> {
    let api = match config.auth_backend {
        AuthBackend::Http => {
            ActiveAuthApi::Http(HttpAuthApi::new(&config.auth_api_url, config.http_timeout)?)
        }
        AuthBackend::Local => {
            config.require_service_secrets()?;
            let directory = UserDirectory::from_config(config)?;
            ActiveAuthApi::Local(LocalAuthApi::new(Arc::new(directory)))
        }
    };
    tracing::debug!(backend = ?config.auth_backend, "Auth service selected");

    let storage = FileSessionStore::new(&config.session_dir);
    let navigator = Arc::new(HistoryNavigator::new(start_path));
    Ok(AuthGate::new(api, storage, navigator))
}

async fn serve(config: Config) -> anyhow::Result<()> {
    config.require_service_secrets()?;
    let directory = UserDirectory::from_config(&config)?;
    tracing::info!(
        port = config.port,
        accounts = directory.len(),
        forgot_password = config.forgot_password_enabled,
        "Starting mock auth service"
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        directory,
    });
    let app = mailcheck_portal::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

fn user_facing(err: AuthError) -> anyhow::Error {
    tracing::debug!(error = %err, "Auth operation failed");
    anyhow::anyhow!(err.display_message())
}

fn print_session(session: &Session) {
    match session.user() {
        Some(user) => println!(
            "Signed in as {} <{}> ({}), {} credits",
            user.name,
            user.email,
            user.effective_role(),
            user.credits
        ),
        None => println!("Not signed in"),
    }
}

fn print_redirects(navigator: &Arc<HistoryNavigator>) {
    for to in navigator.redirects() {
        println!("-> {to}");
    }
    tracing::debug!(location = %navigator.current_path(), "Final location");
}

/// Initialize structured JSON logging on stderr.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mailcheck_portal=info,warn"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
