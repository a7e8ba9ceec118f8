//! graphrec - command-line front end for the GraphRec recommendation service
//!
//! Plays the role of the browser page: reads and writes the active identity,
//! toggles likes, pushes genre preferences and prints recommendations and
//! metrics.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use graphrec_client::binder::{CommitOutcome, Key};
use graphrec_client::gateways::RecommendationList;
use graphrec_client::notify::FailureNotifier;
use graphrec_client::GraphRecClient;
use graphrec_common::config::ConfigResolver;
use graphrec_common::ItemId;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for graphrec
#[derive(Parser, Debug)]
#[command(name = "graphrec")]
#[command(about = "Client for the GraphRec recommendation service")]
#[command(version)]
struct Args {
    /// Base URL of the GraphRec API
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session state file
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    /// Config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the active user
    Whoami,
    /// Switch the active user
    Login { id: String },
    /// Like an item
    Like { item: ItemId },
    /// Remove a like
    Unlike { item: ItemId },
    /// List liked items
    Likes,
    /// Manage genre preferences
    Genres {
        #[command(subcommand)]
        action: GenreAction,
    },
    /// Manage the ranking strategy
    Algo {
        #[command(subcommand)]
        action: AlgoAction,
    },
    /// Push preferences and fetch recommendations
    Recommend {
        /// Number of recommendations
        #[arg(short, long)]
        k: Option<usize>,
        /// Genre to include in the preference push (repeatable)
        #[arg(long = "genre")]
        genres: Vec<String>,
    },
    /// Show service metrics
    Metrics,
    /// List catalog items
    Items,
    /// Check that the service is reachable
    Status,
}

#[derive(Subcommand, Debug)]
enum GenreAction {
    /// Push the given selection (empty clears it remotely)
    Set { tags: Vec<String> },
    /// Push an empty selection
    Clear,
}

#[derive(Subcommand, Debug)]
enum AlgoAction {
    Show,
    Set { label: String },
    Clear,
}

/// Reports like failures on stderr
struct StderrNotifier;

impl FailureNotifier for StderrNotifier {
    fn notify(&self, message: &str) {
        eprintln!("error: {}", message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigResolver::new()
        .config_path(args.config.clone())
        .api_url(args.api_url.clone())
        .state_file(args.state_file.clone())
        .resolve();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "Starting graphrec v{} against {}",
        env!("CARGO_PKG_VERSION"),
        config.base_url
    );

    let client = GraphRecClient::open(config)
        .context("Failed to initialize client")?
        .with_notifier(Arc::new(StderrNotifier));

    run(&client, args.command).await
}

async fn run(client: &GraphRecClient, command: Command) -> Result<()> {
    let session = client.session();

    match command {
        Command::Whoami => {
            println!("{}", session.user_id());
        }
        Command::Login { id } => {
            // Same path as typing into the identity field and pressing Enter
            let binder = client.bind_identity(0);
            let field = binder.add_field();
            binder.input(field, &id);
            match binder.key(field, Key::Enter) {
                Some(CommitOutcome::Committed { user_id, persisted }) => {
                    println!("Active user: {}", user_id);
                    if !persisted {
                        eprintln!("warning: identity could not be saved for next time");
                    }
                }
                Some(CommitOutcome::Unchanged) => println!("Active user: {}", session.user_id()),
                Some(CommitOutcome::Rejected) => anyhow::bail!("user id must not be empty"),
                Some(CommitOutcome::NotEditing) | None => {}
            }
        }
        Command::Like { item } => {
            if client.interactions().toggle(item, false).await {
                println!("Liked {}", item);
            } else {
                std::process::exit(1);
            }
        }
        Command::Unlike { item } => {
            if client.interactions().toggle(item, true).await {
                println!("Unliked {}", item);
            } else {
                eprintln!("Could not remove like for {}", item);
                std::process::exit(1);
            }
        }
        Command::Likes => {
            let likes = client
                .interactions()
                .try_fetch_likes()
                .await
                .context("Failed to fetch likes")?;
            if likes.is_empty() {
                println!("No likes for user {}", session.user_id());
            }
            for item in likes {
                println!("{}", item);
            }
        }
        Command::Genres { action } => {
            match action {
                GenreAction::Set { tags } => session.set_genres(tags),
                GenreAction::Clear => session.clear_genres(),
            }
            let pushed = client.preferences().prepare_preferences().await;
            if let Err(e) = pushed.outcome() {
                anyhow::bail!("Failed to save preferences: {}", e);
            }
            println!(
                "Saved preferences for user {}: [{}]",
                pushed.user_id(),
                pushed.genres().join(", ")
            );
        }
        Command::Algo { action } => match action {
            AlgoAction::Show => match session.algorithm() {
                Some(label) => println!("{}", label),
                None => println!("(server default)"),
            },
            AlgoAction::Set { label } => {
                session
                    .set_algorithm(&label)
                    .context("Failed to save ranking strategy")?;
                println!("Ranking strategy: {}", label.trim());
            }
            AlgoAction::Clear => {
                session
                    .clear_algorithm()
                    .context("Failed to clear ranking strategy")?;
                println!("Ranking strategy cleared");
            }
        },
        Command::Recommend { k, genres } => {
            for tag in genres {
                session.select_genre(tag);
            }
            let k = k.unwrap_or(client.config().default_k);
            let list = client
                .recommendations()
                .fetch(k)
                .await
                .context("Recommendations unavailable")?;
            print_recommendations(&list);
        }
        Command::Metrics => {
            let snapshot = client
                .metrics()
                .fetch()
                .await
                .context("Metrics unavailable")?;
            for (key, value) in &snapshot.values {
                println!("{:<24} {}", key, value);
            }
        }
        Command::Items => {
            let catalog = client
                .catalog()
                .try_fetch_items()
                .await
                .context("Failed to fetch catalog")?;
            for (id, item) in &catalog {
                println!("{:>6}  {:<40} {}", id, item.title, item.category);
            }
        }
        Command::Status => {
            let status = client.status().await.context("Service unreachable")?;
            println!(
                "{} ({})",
                status.status,
                status.message.as_deref().unwrap_or("no message")
            );
        }
    }

    Ok(())
}

fn print_recommendations(list: &RecommendationList) {
    if list.is_empty() {
        println!("No recommendations");
        return;
    }
    for (rank, item) in list.items.iter().enumerate() {
        println!(
            "{:>2}. {:>6}  {:<40} {}",
            rank + 1,
            item.id,
            item.title.as_deref().unwrap_or("-"),
            item.reason.as_deref().unwrap_or("")
        );
    }
    if let Some(ms) = list.latency_ms {
        println!("({:.1} ms)", ms);
    }
}
