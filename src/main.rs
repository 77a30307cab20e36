// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! blogctl: command-line front end for the blog backend.
//!
//! Usage:
//!   blogctl login --username ada --password secret
//!   blogctl create --title "Hello" --content "First post"
//!   blogctl list
//!
//! Configuration comes from the environment (see `blog_client::config`);
//! the global flags below override it. Logs go to stderr, command output
//! to stdout.

use std::path::PathBuf;
use std::process::ExitCode;

use blog_client::config::{ClientConfig, LOG_FORMAT_ENV};
use blog_client::error::ClientResult;
use blog_client::models::{BlogDraft, BlogId, Credentials};
use blog_client::session::SessionStrategy;
use blog_client::state::ClientState;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "blogctl")]
#[command(about = "Command-line client for the blog backend")]
#[command(version)]
struct Cli {
    /// Base URL of the blog backend
    #[arg(long, env = "BLOG_API_URL")]
    api_url: Option<String>,

    /// Directory for the token, cookies and liked posts
    #[arg(long, env = "BLOG_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Session strategy: bearer, cookie or cookie-csrf
    #[arg(long, env = "BLOG_SESSION_STRATEGY")]
    strategy: Option<SessionStrategy>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account
    Signup {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "BLOG_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in and store the session
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "BLOG_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the session and forget local credentials
    Logout,
    /// Print the URL that starts GitHub login in a browser
    GithubUrl,
    /// Check that the backend is up
    Health,
    /// List all posts
    List,
    /// Show one post
    Show { id: BlogId },
    /// Publish a new post
    Create {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        content: String,
    },
    /// Replace a post's title and content
    Update {
        id: BlogId,
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        content: String,
    },
    /// Delete a post
    Delete { id: BlogId },
    /// Like a post, or unlike it if already liked
    Like { id: BlogId },
    /// List liked post ids, most recent first
    Liked,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling");
            trigger.cancel();
        }
    });

    match run(cli, cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_auth_expired() => {
            eprintln!("Your session has expired. Please log in again with `blogctl login`.");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e.display_message());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("blog_client=info,blogctl=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}

async fn run(cli: Cli, cancel: CancellationToken) -> ClientResult<()> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url)?;
    }
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(strategy) = cli.strategy {
        config = config.with_strategy(strategy);
    }

    let state = ClientState::open(config)?.with_cancellation(cancel);
    let result = execute(&state, cli.command).await;
    // Keep whatever cookies the server set, even when the command failed.
    settle(result, state.persist())
}

/// A failed command's own error outranks a failed save.
fn settle(result: ClientResult<()>, persisted: ClientResult<()>) -> ClientResult<()> {
    match (result, persisted) {
        (Err(e), Err(persist_error)) => {
            warn!(error = %persist_error, "Failed to save session cookies");
            Err(e)
        }
        (result, persisted) => result.and(persisted),
    }
}

async fn execute(state: &ClientState, command: Command) -> ClientResult<()> {
    debug!(command = command_name(&command), "Running command");
    let api = &state.api;

    match command {
        Command::Signup { username, password } => {
            let message = api.signup(&Credentials::new(username, password)).await?;
            println!("{}", message.as_deref().unwrap_or("Signup successful"));
            println!("You can now log in with `blogctl login`.");
        }
        Command::Login { username, password } => {
            let session = api.login(&Credentials::new(username.clone(), password)).await?;
            let name = session.username.unwrap_or(username);
            match session.role {
                Some(role) => println!("Logged in as {name} ({role})"),
                None => println!("Logged in as {name}"),
            }
        }
        Command::Logout => {
            api.logout().await?;
            println!("Logged out");
        }
        Command::GithubUrl => {
            println!("{}", api.github_authorization_url()?);
        }
        Command::Health => {
            let health = api.health().await?;
            match health.message {
                Some(message) => println!("{}: {message}", health.status),
                None => println!("{}", health.status),
            }
        }
        Command::List => {
            let blogs = api.list_blogs().await?;
            if blogs.is_empty() {
                println!("No posts yet");
            }
            for blog in blogs {
                let marker = if state.likes.is_liked(blog.id) { " ♥" } else { "" };
                println!("{:>5}  {}{marker}", blog.id, blog.title);
            }
        }
        Command::Show { id } => {
            let blog = api.get_blog(id).await?;
            println!("#{} {}", blog.id, blog.title);
            if let Some(author) = &blog.username {
                println!("by {author}");
            }
            println!();
            println!("{}", blog.content);
        }
        Command::Create { title, content } => {
            let blog = api.create_blog(&BlogDraft::new(title, content)).await?;
            println!("Created post #{}", blog.id);
        }
        Command::Update { id, title, content } => {
            let blog = api.update_blog(id, &BlogDraft::new(title, content)).await?;
            println!("Updated post #{}", blog.id);
        }
        Command::Delete { id } => {
            api.delete_blog(id).await?;
            println!("Deleted post #{id}");
        }
        Command::Like { id } => {
            if state.likes.toggle(id)? {
                println!("Liked post #{id}");
            } else {
                println!("Unliked post #{id}");
            }
        }
        Command::Liked => {
            let ids = state.likes.ids();
            if ids.is_empty() {
                println!("No liked posts");
            }
            for id in ids {
                println!("{id}");
            }
        }
    }
    Ok(())
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Signup { .. } => "signup",
        Command::Login { .. } => "login",
        Command::Logout => "logout",
        Command::GithubUrl => "github-url",
        Command::Health => "health",
        Command::List => "list",
        Command::Show { .. } => "show",
        Command::Create { .. } => "create",
        Command::Update { .. } => "update",
        Command::Delete { .. } => "delete",
        Command::Like { .. } => "like",
        Command::Liked => "liked",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blog_client::error::ClientError;
    use blog_client::gateway::GatewayError;
    use blog_client::storage::StorageError;

    fn save_failed() -> ClientResult<()> {
        Err(StorageError::InvalidKey("cookies".into()).into())
    }

    #[test]
    fn command_error_survives_failed_save() {
        let err = settle(Err(GatewayError::AuthExpired.into()), save_failed()).unwrap_err();
        assert!(err.is_auth_expired());
    }

    #[test]
    fn failed_save_is_reported_after_successful_command() {
        let err = settle(Ok(()), save_failed()).unwrap_err();
        assert!(matches!(err, ClientError::Storage(_)));
        assert!(settle(Ok(()), Ok(())).is_ok());
    }
}
