//! social-queue - Inspect and adjust the remote posting queue

use clap::{Parser, Subcommand};
use libsocial::accounts::{check_auth, save_accounts};
use libsocial::analytics::{Analytics, InsightsTarget};
use libsocial::queue::QueueManager;
use libsocial::remote::publer::PublerClient;
use libsocial::remote::RemotePost;
use libsocial::scheduling::{parse_datetime, parse_start_date, parse_timezone};
use libsocial::{Config, Network, PostingApi, Result, SocialError};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "social-queue")]
#[command(version)]
#[command(about = "Inspect and adjust the remote posting queue")]
#[command(long_about = "\
social-queue - Inspect and adjust the remote posting queue

DESCRIPTION:
    social-queue works on posts already scheduled on Publer. It lists the
    queue, writes a local snapshot of it, cancels posts and moves them to a
    new send time. Every change is recorded in state/events.jsonl. It also
    checks the API key, lists connected accounts and fetches post insights.

COMMANDS:
    list       List scheduled posts
    sync       Write the queue to state/publer_snapshot.json
    cancel     Delete a scheduled post
    move       Reschedule a post
    accounts   List connected accounts
    auth       Check the API key and show visible workspaces
    analytics  Fetch post insights for an account

USAGE EXAMPLES:
    social-queue list --platform x
    social-queue sync
    social-queue cancel 12345
    social-queue move 12345 --to 2024-02-01T10:00:00-06:00
    social-queue move 12345 --to \"next friday 9:00\"
    social-queue accounts --save
    social-queue analytics --from 2024-01-01 --to 2024-01-31

CONFIGURATION:
    Shares social.toml with the social command. Natural-language times
    are read in schedule.timezone.

EXIT CODES:
    0 - Success
    1 - Operation failed
    2 - Configuration error
    3 - Invalid input
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List scheduled posts
    List {
        /// Only posts for this network's account
        #[arg(short, long)]
        platform: Option<String>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Snapshot the queue for every network
    Sync,

    /// Delete a scheduled post
    Cancel {
        /// Remote post id
        id: String,
    },

    /// Move a post to a new send time
    Move {
        /// Remote post id
        id: String,

        /// New send time: RFC 3339 or natural language
        #[arg(long)]
        to: String,
    },

    /// List accounts connected on the service
    Accounts {
        /// Also write the list to state/accounts.json
        #[arg(long)]
        save: bool,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check the API key against the service
    Auth {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Fetch post insights for one account
    Analytics {
        /// First day: YYYY-MM-DD or natural language
        #[arg(long)]
        from: String,

        /// Last day: YYYY-MM-DD or natural language
        #[arg(long)]
        to: String,

        /// Remote account id (overrides --platform)
        #[arg(long)]
        account: Option<String>,

        /// Network whose connected account to use
        #[arg(short, long, default_value = "linkedin")]
        platform: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libsocial::logging::LoggingConfig::from_env(cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let api: Arc<dyn PostingApi> = Arc::new(PublerClient::new(&config.publer)?);
    let mut queue = QueueManager::new(api.clone(), &config.workspace.state_path());

    match cli.command {
        Commands::List { platform, format } => {
            validate_format(&format)?;
            let platform = platform.as_deref().map(Network::from_name);
            let posts = queue.list(platform.as_ref()).await?;
            print_posts(&posts, &format)
        }
        Commands::Sync => {
            let snapshot = queue.sync().await?;
            println!("Synced {} scheduled posts", snapshot.posts.len());
            for (platform, count) in &snapshot.counts {
                println!("  {:10} {}", format!("{}:", platform), count);
            }
            println!("Snapshot: {}", queue.snapshot_path().display());
            Ok(())
        }
        Commands::Cancel { id } => {
            queue.cancel(&id).await?;
            println!("Cancelled post {}", id);
            Ok(())
        }
        Commands::Move { id, to } => {
            let tz = parse_timezone(&config.schedule.timezone)?;
            let when = parse_datetime(&to, tz, chrono::Utc::now())?;
            tracing::debug!("Moving post {} to {}", id, when);
            queue.reschedule(&id, when).await?;
            println!("Moved post {} to {}", id, when.to_rfc3339());
            Ok(())
        }
        Commands::Accounts { save, format } => {
            validate_format(&format)?;
            let accounts = api.list_accounts().await?;
            if format == "json" {
                print_json(&accounts)?;
            } else if accounts.is_empty() {
                println!("No connected accounts.");
            } else {
                println!("Accounts ({}):\n", accounts.len());
                for account in &accounts {
                    println!(
                        "  {} [{}] {}",
                        account.id,
                        account.provider,
                        account.name.as_deref().unwrap_or("-")
                    );
                }
            }
            if save {
                let path = save_accounts(&accounts, &config.workspace.state_path())?;
                eprintln!("Saved to {}", path.display());
            }
            Ok(())
        }
        Commands::Auth { format } => {
            validate_format(&format)?;
            let check = check_auth(api.as_ref()).await?;
            if format == "json" {
                return print_json(&check);
            }
            println!("Auth OK");
            for workspace in &check.workspaces {
                println!(
                    "  workspace {} {}",
                    workspace.id,
                    workspace.name.as_deref().unwrap_or("")
                );
            }
            Ok(())
        }
        Commands::Analytics {
            from,
            to,
            account,
            platform,
        } => {
            let tz = parse_timezone(&config.schedule.timezone)?;
            let now = chrono::Utc::now();
            let from = parse_start_date(&from, tz, now)?;
            let to = parse_start_date(&to, tz, now)?;
            let target = match account {
                Some(id) => InsightsTarget::Account(id),
                None => InsightsTarget::Network(Network::from_name(&platform)),
            };
            let insights = Analytics::new(api)
                .post_insights(&target, from, to)
                .await?;
            print_json(&insights)
        }
    }
}

fn validate_format(format: &str) -> Result<()> {
    if format != "text" && format != "json" {
        return Err(SocialError::InvalidInput(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            format
        )));
    }
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| SocialError::InvalidInput(format!("Failed to render JSON: {}", e)))?;
    println!("{}", out);
    Ok(())
}

fn print_posts(posts: &[RemotePost], format: &str) -> Result<()> {
    if format == "json" {
        return print_json(posts);
    }

    if posts.is_empty() {
        println!("No scheduled posts.");
        return Ok(());
    }

    println!("Scheduled posts ({}):\n", posts.len());
    for post in posts {
        let when = post.scheduled_at.as_deref().unwrap_or("-");
        let preview: String = post.text.chars().take(60).collect();
        println!(
            "  {} [{}] {} {}",
            post.id,
            post.network,
            when,
            preview.replace('\n', " ")
        );
    }
    Ok(())
}
