//! social - Move ideas from local files to scheduled posts
//!
//! Pipeline driver: ingest ideas, generate drafts, approve them, plan a
//! schedule and apply it to the posting service.

use clap::{Parser, Subcommand};
use libsocial::compose::draft_idea;
use libsocial::ingest::Ingestor;
use libsocial::planner::{ApplyPolicy, ApplyResult};
use libsocial::remote::publer::PublerClient;
use libsocial::scheduling::parse_days;
use libsocial::status::{PipelineStatus, RemoteCounts};
use libsocial::{
    AccountResolver, Config, DraftStatus, DraftStore, EventKind, EventLog, IdeaStatus, IdeaStore,
    Network, Plan, PlanApplier, PlanBuilder, PlanRequest, PlanStore, PostingApi, Result,
    SocialError,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "social")]
#[command(version)]
#[command(about = "Move ideas from local files to scheduled posts")]
#[command(long_about = "\
social - Move ideas from local files to scheduled posts

DESCRIPTION:
    social drives a file-based content pipeline. Ideas are ingested into
    ideas/, turned into per-network drafts in drafts/, approved by hand,
    planned onto a schedule in queue/plan.json and submitted to Publer.

COMMANDS:
    ingest   Create ideas from prompts, transcripts, repo docs, commits or a note
    draft    Generate drafts from ready ideas
    review   List drafts or approve one
    plan     Build a schedule plan from approved drafts
    apply    Submit a plan to Publer
    status   Show pipeline counts

USAGE EXAMPLES:
    social ingest note \"Planner shipped\"
    social draft --batch --limit 5
    social review --status draft
    social review --approve 2024-01-01T09-00-00Z__planner-twitter.md
    social plan --platform x --start 2024-01-01 --time 09:00 --every 2d
    social apply --dry-run
    social apply

CONFIGURATION:
    Config file: ./social.toml or ~/.config/social-engine/config.toml
    Override with SOCIAL_CONFIG. The API key is read from PUBLER_API_KEY
    (or the variable named by publer.api_key_env).

EXIT CODES:
    0 - Success
    1 - Operation failed (including plans with failed items)
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
    /// Create ideas from a source
    Ingest {
        #[command(subcommand)]
        source: IngestSource,
    },

    /// Generate drafts from ideas
    ///
    /// Without --idea or --batch, lists ideas ready for drafting.
    Draft {
        /// Idea id to draft
        #[arg(long, conflicts_with = "batch")]
        idea: Option<String>,

        /// Draft every ready idea
        #[arg(long)]
        batch: bool,

        /// Maximum number of ideas to draft with --batch
        #[arg(long, requires = "batch")]
        limit: Option<usize>,

        /// Comma-separated networks (default: linkedin,twitter)
        #[arg(short, long, value_delimiter = ',')]
        platform: Vec<String>,
    },

    /// List drafts or approve one
    Review {
        /// Filter by status: draft, approved, scheduled
        #[arg(short, long)]
        status: Option<String>,

        /// Filter by network (x and twitter are the same)
        #[arg(short, long)]
        platform: Option<String>,

        /// Approve a draft (file name or path)
        #[arg(long)]
        approve: Option<PathBuf>,

        /// Show a preview of each draft's postable text
        #[arg(long)]
        content: bool,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Build a schedule plan from approved drafts
    Plan {
        /// Plan from approved drafts (the only selection mode)
        #[arg(long)]
        from_approved: bool,

        /// Only plan drafts for this network
        #[arg(short, long)]
        platform: Option<String>,

        /// Maximum number of drafts to plan
        #[arg(short, long)]
        count: Option<usize>,

        /// Start date: YYYY-MM-DD or natural language (default: tomorrow)
        #[arg(long)]
        start: Option<String>,

        /// Send time of the first post, HH:MM
        #[arg(long)]
        time: Option<String>,

        /// Days between posts: 1, 2d, 48h
        #[arg(long)]
        every: Option<String>,

        /// IANA timezone for send times
        #[arg(long)]
        timezone: Option<String>,

        /// Where to write the plan (default: queue/plan.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show an existing plan instead of building one
        #[arg(long, value_name = "PLAN")]
        show: Option<Option<PathBuf>>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Submit a plan to the posting service
    Apply {
        /// Plan file (default: queue/plan.json)
        plan: Option<PathBuf>,

        /// Show what would be scheduled without calling the service
        #[arg(long)]
        dry_run: bool,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show counts of ideas, drafts and planned posts
    Status {
        /// Also count posts in the remote queue
        #[arg(long)]
        remote: bool,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand, Debug)]
enum IngestSource {
    /// Every *.md file in the prompts directory except README
    Prompts {
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Split transcripts into sections, one idea each
    Transcripts {
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Docs changed recently in a git repository
    Repo {
        /// Repository to scan
        #[arg(long)]
        repo: PathBuf,

        /// How far back to look: 7, 7d, 168h
        #[arg(long, default_value = "7d")]
        since: String,
    },

    /// Subjects of recent commits
    Commits {
        /// Repository to read
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Number of commits
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },

    /// Capture a single idea from the command line
    Note {
        /// Idea text
        text: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libsocial::logging::LoggingConfig::from_env(cli.verbose).init();

    match run(cli).await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

/// Stores and logs rooted at the configured workspace
struct Workspace {
    config: Config,
    ideas: IdeaStore,
    drafts: DraftStore,
    events: EventLog,
}

impl Workspace {
    fn new(config: Config) -> Self {
        let ws = &config.workspace;
        Self {
            ideas: IdeaStore::new(ws.ideas_path()),
            drafts: DraftStore::new(ws.drafts_path()),
            events: EventLog::new(&ws.state_path()),
            config,
        }
    }

    fn plan_store(&self, path: Option<PathBuf>) -> PlanStore {
        PlanStore::new(path.unwrap_or_else(|| self.config.workspace.plan_path()))
    }

    fn api(&self) -> Result<Arc<dyn PostingApi>> {
        Ok(Arc::new(PublerClient::new(&self.config.publer)?))
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let workspace = Workspace::new(Config::load()?);
    tracing::debug!(
        "Workspace root: {}",
        workspace.config.workspace.root_path().display()
    );

    match cli.command {
        Commands::Ingest { source } => cmd_ingest(&workspace, source),
        Commands::Draft {
            idea,
            batch,
            limit,
            platform,
        } => cmd_draft(&workspace, idea.as_deref(), batch, limit, &platform),
        Commands::Review {
            status,
            platform,
            approve,
            content,
            format,
        } => {
            validate_format(&format)?;
            match approve {
                Some(path) => cmd_approve(&workspace, &path),
                None => cmd_review(&workspace, status.as_deref(), platform.as_deref(), content, &format),
            }
        }
        Commands::Plan {
            from_approved: _,
            platform,
            count,
            start,
            time,
            every,
            timezone,
            output,
            show,
            format,
        } => {
            validate_format(&format)?;
            if let Some(path) = show {
                return cmd_plan_show(&workspace, path, &format);
            }
            let request = PlanRequest {
                platform: platform.as_deref().map(Network::from_name),
                count,
                start_date: start,
                start_time: time,
                interval_days: every.as_deref().map(parse_days).transpose()?,
                timezone,
            };
            cmd_plan(&workspace, &request, output, &format).await
        }
        Commands::Apply {
            plan,
            dry_run,
            format,
        } => {
            validate_format(&format)?;
            cmd_apply(&workspace, plan, dry_run, &format).await
        }
        Commands::Status { remote, format } => {
            validate_format(&format)?;
            cmd_status(&workspace, remote, &format).await
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

fn print_json(value: &serde_json::Value) -> Result<()> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| SocialError::InvalidInput(format!("Failed to render JSON: {}", e)))?;
    println!("{}", out);
    Ok(())
}

fn cmd_ingest(workspace: &Workspace, source: IngestSource) -> Result<i32> {
    let ingestor = Ingestor::new(workspace.ideas.clone(), workspace.events.clone());
    let paths = &workspace.config.workspace;

    let (label, created) = match source {
        IngestSource::Prompts { dir } => {
            let dir = dir.unwrap_or_else(|| paths.prompts_path());
            (dir.display().to_string(), ingestor.prompts(&dir)?)
        }
        IngestSource::Transcripts { path } => {
            let dir = path.unwrap_or_else(|| paths.transcripts_path());
            (dir.display().to_string(), ingestor.transcripts(&dir)?)
        }
        IngestSource::Repo { repo, since } => {
            let days = parse_days(&since)?;
            (
                format!("{} (last {} days)", repo.display(), days),
                ingestor.repo(&repo, days)?,
            )
        }
        IngestSource::Commits { repo, count } => {
            (format!("{} commits", repo.display()), ingestor.commits(&repo, count)?)
        }
        IngestSource::Note { text } => ("note".to_string(), vec![ingestor.note(&text)?]),
    };

    println!("Ingested {} ideas from {}", created.len(), label);
    for idea in &created {
        println!("  - {}", idea.id);
    }
    Ok(0)
}

fn requested_networks(platforms: &[String]) -> Vec<Network> {
    if platforms.is_empty() {
        Network::defaults()
    } else {
        platforms
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| Network::from_name(p))
            .collect()
    }
}

fn cmd_draft(
    workspace: &Workspace,
    idea: Option<&str>,
    batch: bool,
    limit: Option<usize>,
    platforms: &[String],
) -> Result<i32> {
    let networks = requested_networks(platforms);
    let now = chrono::Utc::now();

    let ids: Vec<String> = match (idea, batch) {
        (Some(id), _) => vec![id.to_string()],
        (None, true) => {
            let mut ready = workspace.ideas.list(Some(IdeaStatus::Ready))?;
            if let Some(limit) = limit {
                ready.truncate(limit);
            }
            ready.into_iter().map(|i| i.id).collect()
        }
        (None, false) => {
            let ready = workspace.ideas.list(Some(IdeaStatus::Ready))?;
            println!("{} ideas ready for drafting:", ready.len());
            for idea in &ready {
                let preview: String = idea.body.chars().take(50).collect();
                println!("  - {}: {}", idea.id, preview);
            }
            println!("\nUse --idea <ID> or --batch to generate drafts");
            return Ok(0);
        }
    };

    if ids.is_empty() {
        println!("No ideas with status 'ready' found.");
        return Ok(0);
    }

    let mut total = Vec::new();
    for id in &ids {
        let created = draft_idea(&workspace.ideas, &workspace.drafts, id, &networks, now)?;
        println!("{} -> {} drafts", id, created.len());
        for draft in &created {
            println!("  - {}", draft.id);
        }
        total.extend(created.into_iter().map(|d| d.id));
    }

    workspace.events.record(
        EventKind::DraftsCreated,
        json!({ "ideas": ids, "drafts": total }),
    );
    println!("\nCreated {} drafts from {} ideas", total.len(), ids.len());
    Ok(0)
}

fn cmd_approve(workspace: &Workspace, path: &Path) -> Result<i32> {
    let draft = workspace.drafts.approve(path)?;
    workspace.events.record(
        EventKind::DraftApproved,
        json!({ "draft": draft.path, "platform": draft.platform }),
    );
    println!("Approved: {}", draft.id);
    Ok(0)
}

fn cmd_review(
    workspace: &Workspace,
    status: Option<&str>,
    platform: Option<&str>,
    content: bool,
    format: &str,
) -> Result<i32> {
    let status = status.map(str::parse::<DraftStatus>).transpose()?;
    let platform = platform.map(Network::from_name);
    let drafts = workspace.drafts.list(status, platform.as_ref())?;

    if format == "json" {
        let items: Vec<_> = drafts
            .iter()
            .map(|d| {
                json!({
                    "id": d.id,
                    "path": d.path,
                    "idea_id": d.idea_id,
                    "platform": d.platform,
                    "status": d.status,
                    "created_at": d.created_at,
                    "text": libsocial::compose::postable_text(&d.body),
                })
            })
            .collect();
        print_json(&json!(items))?;
        return Ok(0);
    }

    if drafts.is_empty() {
        println!("No drafts found matching criteria.");
        return Ok(0);
    }

    println!("Drafts ({}):\n", drafts.len());
    for draft in &drafts {
        let marker = match draft.status {
            DraftStatus::Draft => "o",
            DraftStatus::Approved => "+",
            DraftStatus::Scheduled => "*",
        };
        let platform = draft
            .platform
            .as_ref()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!("  {} [{:9}] {:9} {}", marker, platform, draft.status, draft.id);
        if content {
            let text = libsocial::compose::postable_text(&draft.body);
            let preview: String = text.chars().take(100).collect();
            println!("                {}", preview.replace('\n', " "));
        }
    }
    println!("\nTo approve: social review --approve <FILE>");
    Ok(0)
}

fn print_plan(plan: &Plan) {
    for item in &plan.items {
        let name = item
            .draft
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| item.draft.display().to_string());
        println!(
            "  [{:9}] {} -> {}",
            item.platform,
            item.scheduled_at.to_rfc3339(),
            name
        );
    }
}

fn plan_json(plan: &Plan) -> Result<serde_json::Value> {
    serde_json::to_value(plan)
        .map_err(|e| SocialError::InvalidInput(format!("Failed to render plan: {}", e)))
}

fn cmd_plan_show(workspace: &Workspace, path: Option<PathBuf>, format: &str) -> Result<i32> {
    let store = workspace.plan_store(path);
    let plan = store.load()?;

    if format == "json" {
        print_json(&plan_json(&plan)?)?;
        return Ok(0);
    }

    println!("Plan: {}", store.path().display());
    println!("Created: {}", plan.created_at.to_rfc3339());
    println!("Timezone: {}", plan.timezone);
    println!("Items: {}\n", plan.items.len());
    print_plan(&plan);
    Ok(0)
}

async fn cmd_plan(
    workspace: &Workspace,
    request: &PlanRequest,
    output: Option<PathBuf>,
    format: &str,
) -> Result<i32> {
    let mut resolver = AccountResolver::new(workspace.api()?);
    let plan = PlanBuilder::new(&workspace.drafts, &mut resolver, &workspace.config.schedule)
        .build(request)
        .await?;

    if plan.is_empty() {
        if format == "json" {
            print_json(&plan_json(&plan)?)?;
        } else {
            println!("No approved drafts found to plan.");
            println!("Approve drafts first with: social review --approve <FILE>");
        }
        return Ok(0);
    }

    let location = workspace.plan_store(output).save(&plan)?;

    if format == "json" {
        print_json(&plan_json(&plan)?)?;
        return Ok(0);
    }

    println!("Created plan with {} posts -> {}", plan.items.len(), location.display());
    println!("\nSchedule:");
    print_plan(&plan);
    println!("\nReview {}, then run:", location.display());
    println!("  social apply {}", location.display());
    Ok(0)
}

fn print_apply_result(result: &ApplyResult) {
    if result.dry_run {
        println!("=== DRY RUN ===\n");
        for item in &result.successes {
            let preview: String = item.text.chars().take(100).collect();
            println!("Would schedule {}", item.draft.display());
            println!("  Platform:  {}", item.platform);
            println!("  Scheduled: {}", item.scheduled_at.to_rfc3339());
            println!("  Text:      {}", preview.replace('\n', " "));
            println!();
        }
    }

    let verb = if result.dry_run { "Would schedule" } else { "Scheduled" };
    println!("{}: {}", verb, result.successes.len());
    if !result.failures.is_empty() {
        println!("Failed: {}", result.failures.len());
        for failure in &result.failures {
            println!("  - {}: {}", failure.draft.display(), failure.error);
        }
    }
    if result.dry_run {
        println!("\nRemove --dry-run to apply for real.");
    }
}

async fn cmd_apply(workspace: &Workspace, plan_path: Option<PathBuf>, dry_run: bool, format: &str) -> Result<i32> {
    let plan = workspace.plan_store(plan_path).load()?;
    let applier = PlanApplier::new(
        workspace.api()?,
        workspace.drafts.clone(),
        workspace.events.clone(),
    )
    .with_policy(ApplyPolicy::from(&workspace.config.apply));

    let result = applier.apply(&plan, dry_run).await?;

    if format == "json" {
        let value = serde_json::to_value(&result)
            .map_err(|e| SocialError::InvalidInput(format!("Failed to render result: {}", e)))?;
        print_json(&value)?;
    } else {
        print_apply_result(&result);
    }

    Ok(if result.failures.is_empty() { 0 } else { 1 })
}

async fn cmd_status(workspace: &Workspace, remote: bool, format: &str) -> Result<i32> {
    let plan = workspace.plan_store(None);
    let mut status = PipelineStatus::collect(&workspace.ideas, &workspace.drafts, &plan)?;

    if remote {
        let mut queue = libsocial::queue::QueueManager::new(
            workspace.api()?,
            &workspace.config.workspace.state_path(),
        );
        status = status.with_remote(&mut queue).await;
    }

    if format == "json" {
        let value = serde_json::to_value(&status)
            .map_err(|e| SocialError::InvalidInput(format!("Failed to render status: {}", e)))?;
        print_json(&value)?;
        return Ok(0);
    }

    println!("Ideas:");
    println!("  Ready to draft:  {}", status.ideas.ready);
    println!("  Drafted:         {}", status.ideas.drafted);
    println!("  Needs review:    {}", status.ideas.review);
    println!("\nDrafts:");
    println!("  Pending review:  {}", status.drafts.draft);
    println!("  Approved:        {}", status.drafts.approved);
    println!("  Scheduled:       {}", status.drafts.scheduled);
    for (platform, count) in &status.drafts.by_platform {
        println!("  {:16} {}", format!("{}:", platform), count);
    }
    println!("\nPlan:");
    match status.plan_items {
        Some(n) => println!("  Items:           {}", n),
        None => println!("  (no plan)"),
    }
    if let Some(remote) = &status.remote {
        println!("\nQueue (remote):");
        match remote {
            RemoteCounts::Counts(counts) => {
                for (platform, count) in counts {
                    println!("  {:16} {}", format!("{}:", platform), count);
                }
            }
            RemoteCounts::Error(e) => println!("  (could not fetch: {})", e),
        }
    }
    Ok(0)
}
