use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use jobpilot::config::Config;
use jobpilot::db::Database;
use jobpilot::drafts::DraftRunner;
use jobpilot::submit::{FormFiller, LlmAnswerer, NoopAnswerer, QuickApplyFlow};
use jobpilot::{
    build_sources, load_config, Aggregator, CycleReport, EngineLimits, JobpilotError, Lead,
    LeadStatus, Region, StatusController, SubmitEngine, SubmitError,
};

#[derive(Parser, Debug)]
#[command(name = "jobpilot")]
#[command(version)]
#[command(about = "Job-lead aggregation, tracking, and automated quick-apply submission")]
#[command(propagate_version = true)]
struct Args {
    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the lead store database
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Aggregate postings from all configured sources
    Search {
        /// Regions to search (comma-separated, or "all")
        #[arg(long, default_value = "all")]
        region: String,

        /// Keep only postings whose title contains this role
        #[arg(long)]
        role: Option<String>,
    },

    /// Generate application drafts for found leads
    Draft {
        /// Draft a specific lead only
        #[arg(long, conflicts_with = "all")]
        id: Option<i64>,

        /// Draft every lead at status 'found'
        #[arg(long)]
        all: bool,
    },

    /// List tracked leads
    List {
        /// Filter by status
        #[arg(long)]
        status: Option<String>,

        /// Filter by region
        #[arg(long)]
        region: Option<String>,
    },

    /// Show one lead in full
    Show { id: i64 },

    /// Mark a lead as applied (manual override)
    MarkApplied { id: i64 },

    /// Set a lead's status (manual override)
    Mark { id: i64, status: String },

    /// Submit applications for cover-ready leads
    Submit {
        /// Restrict to regions (comma-separated, or "all")
        #[arg(long, default_value = "all")]
        region: String,

        /// Cap on submissions this run (overrides config)
        #[arg(long)]
        max: Option<u64>,

        /// Walk every flow up to review without submitting
        #[arg(long)]
        dry_run: bool,
    },

    /// Full daily cycle: search, draft, submit, status line
    Cycle {
        /// Run the submission stage in dry-run mode
        #[arg(long)]
        dry_run: bool,
    },
}

fn init_tracing() {
    tracing_log::LogTracer::init().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn default_config_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".jobpilot")
        .join("config.json")
}

struct App {
    config: Config,
    db: Database,
}

impl App {
    fn open(args: &Args) -> Result<Self, JobpilotError> {
        let config_path = args.config.clone().unwrap_or_else(default_config_path);
        let config = load_config(&config_path)?;

        let db_path = match args.db.clone().or_else(jobpilot::db::default_database_path) {
            Some(path) => path,
            None => {
                return Err(jobpilot::ConfigError::Validation {
                    message: "no database path available (pass --db)".to_string(),
                }
                .into())
            }
        };
        let db = Database::open(&db_path)?;

        Ok(Self { config, db })
    }

    fn controller(&self) -> StatusController {
        StatusController::new(self.db.clone(), self.config.submit.max_attempts)
    }

    fn parse_regions(&self, selector: &str) -> Result<Vec<Region>, JobpilotError> {
        if selector == "all" {
            return Ok(self.config.search.regions.clone());
        }
        selector
            .split(',')
            .map(|r| {
                r.trim().parse::<Region>().map_err(|_| {
                    JobpilotError::Config(jobpilot::ConfigError::UnknownRegion(
                        r.trim().to_string(),
                    ))
                })
            })
            .collect()
    }

    async fn search(&self, regions: &[Region], role: Option<&str>) -> Result<(), JobpilotError> {
        let sources = build_sources(&self.config.sources);
        let aggregator = Aggregator::new(self.db.clone(), sources, &self.config);
        let summary = aggregator.run(regions, role).await?;

        println!("Search complete: {}", summary);
        for (source, error) in &summary.errors {
            println!("  [{}] {}", source, error);
        }
        Ok(())
    }

    async fn draft(&self, id: Option<i64>, _all: bool) -> Result<(), JobpilotError> {
        let controller = self.controller();
        let targets: Vec<Lead> = match id {
            Some(id) => vec![controller.get(id)?],
            None => controller.next_actionable(LeadStatus::Found, None)?,
        };
        if targets.is_empty() {
            println!("No leads at status 'found'.");
            return Ok(());
        }

        let runner = DraftRunner::new(self.db.clone(), self.config.drafts.clone());
        let summary = runner.draft_all(&targets).await;
        println!("Drafted {} lead(s), {} failed.", summary.drafted, summary.failed);
        Ok(())
    }

    fn list(&self, status: Option<&str>, region: Option<&str>) -> Result<(), JobpilotError> {
        let status = status
            .map(|s| {
                s.parse::<LeadStatus>()
                    .map_err(|_| jobpilot::ConfigError::UnknownStatus(s.to_string()))
            })
            .transpose()?;
        let region = region
            .map(|r| {
                r.parse::<Region>()
                    .map_err(|_| jobpilot::ConfigError::UnknownRegion(r.to_string()))
            })
            .transpose()?;

        let leads = self.controller().list(status, region)?;
        if leads.is_empty() {
            println!("No leads match.");
            return Ok(());
        }
        for lead in leads {
            println!(
                "#{:<4} [{:^12}] [{:^6}] {:<45} | {:<25} | {}",
                lead.id,
                lead.status.to_string(),
                lead.region.to_string(),
                truncate(&lead.title, 45),
                truncate(&lead.company, 25),
                lead.url
            );
        }
        Ok(())
    }

    fn show(&self, id: i64) -> Result<(), JobpilotError> {
        let lead = self.controller().get(id)?;
        let json = serde_json::to_string_pretty(&lead).expect("lead serializes");
        println!("{}", json);
        Ok(())
    }

    async fn submit(
        &self,
        regions: &[Region],
        max: Option<u64>,
        dry_run: bool,
    ) -> Result<jobpilot::submit::RunSummary, JobpilotError> {
        let controller = self.controller();
        let mut candidates = Vec::new();
        for &region in regions {
            candidates.extend(controller.next_actionable(LeadStatus::CoverReady, Some(region))?);
        }
        if candidates.is_empty() {
            println!("No cover-ready leads to submit.");
            return Ok(Default::default());
        }

        // Missing session token aborts the run before the browser ever
        // starts, with the same distinct error as an expired one.
        let token = jobpilot::resolve_secret(
            self.config.submit.session_token.value.as_deref(),
            self.config.submit.session_token.file.as_deref(),
            self.config.submit.session_token.env_var.as_deref(),
        )
        .map_err(|_| JobpilotError::Submit(SubmitError::SessionExpired))?;

        let answerer: Arc<dyn jobpilot::submit::AnswerGenerator> =
            match jobpilot::resolve_secret_optional(
                self.config.answers.api_key.value.as_deref(),
                self.config.answers.api_key.file.as_deref(),
                self.config.answers.api_key.env_var.as_deref(),
            )? {
                Some(key) => match LlmAnswerer::new(&self.config.answers, key, &self.config.profile)
                {
                    Ok(answerer) => Arc::new(answerer),
                    Err(e) => {
                        eprintln!("Answer generation unavailable ({}); fields will stay blank.", e);
                        Arc::new(NoopAnswerer)
                    }
                },
                None => Arc::new(NoopAnswerer),
            };

        let mut limits = EngineLimits::from_config(&self.config.submit);
        if let Some(max) = max {
            limits.max_per_run = max;
        }

        let filler = FormFiller::new(
            self.config.profile.clone(),
            answerer,
            std::time::Duration::from_secs(self.config.answers.timeout_secs),
        );
        let engine = SubmitEngine::new(self.db.clone(), limits, filler);

        let cancel = Arc::new(AtomicBool::new(false));
        let handler_flag = cancel.clone();
        ctrlc::set_handler(move || {
            eprintln!("Stop requested - finishing the in-flight attempt...");
            handler_flag.store(true, Ordering::Relaxed);
        })
        .ok();

        let mut driver = QuickApplyFlow::connect(&self.config.submit, token)
            .await
            .map_err(JobpilotError::Submit)?;

        let summary = engine
            .run(&mut driver, &candidates, dry_run, &cancel)
            .await?;

        println!("Submission run: {}", summary);
        for review in &summary.reviews {
            println!("  [dry-run] lead #{}: {} fields, resume={}",
                review.lead_id,
                review.fields.len(),
                review.resume_uploaded
            );
        }
        Ok(summary)
    }

    async fn cycle(&self, dry_run: bool) -> Result<CycleReport, JobpilotError> {
        let mut report = CycleReport::default();
        let regions = self.config.search.regions.clone();

        let sources = build_sources(&self.config.sources);
        let aggregator = Aggregator::new(self.db.clone(), sources, &self.config);
        match aggregator.run(&regions, None).await {
            Ok(summary) => report.absorb_aggregate(&summary),
            Err(e) => eprintln!("Search stage failed: {}", e),
        }

        let controller = self.controller();
        let found = controller.next_actionable(LeadStatus::Found, None)?;
        if !found.is_empty() && !self.config.drafts.command.is_empty() {
            let runner = DraftRunner::new(self.db.clone(), self.config.drafts.clone());
            let summary = runner.draft_all(&found).await;
            report.absorb_drafts(&summary);
        }

        match self.submit(&regions, None, dry_run).await {
            Ok(summary) => report.absorb_submit(&summary),
            Err(JobpilotError::Submit(SubmitError::SessionExpired)) => {
                report.session_expired = true;
            }
            Err(e) => eprintln!("Submission stage failed: {}", e),
        }

        report.status_counts = controller.status_counts()?;
        Ok(report)
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

async fn run(args: Args) -> Result<(), JobpilotError> {
    let app = App::open(&args)?;

    match &args.command {
        Commands::Search { region, role } => {
            let regions = app.parse_regions(region)?;
            app.search(&regions, role.as_deref()).await
        }
        Commands::Draft { id, all } => app.draft(*id, *all).await,
        Commands::List { status, region } => app.list(status.as_deref(), region.as_deref()),
        Commands::Show { id } => app.show(*id),
        Commands::MarkApplied { id } => {
            let lead = app.controller().mark_applied(*id)?;
            println!("#{} marked applied: {} @ {}", lead.id, lead.title, lead.company);
            Ok(())
        }
        Commands::Mark { id, status } => {
            let status: LeadStatus = status
                .parse()
                .map_err(|_| jobpilot::ConfigError::UnknownStatus(status.clone()))?;
            let lead = app.controller().set_status(*id, status)?;
            println!("#{} set to {}: {} @ {}", lead.id, lead.status, lead.title, lead.company);
            Ok(())
        }
        Commands::Submit {
            region,
            max,
            dry_run,
        } => {
            let regions = app.parse_regions(region)?;
            app.submit(&regions, *max, *dry_run).await.map(|_| ())
        }
        Commands::Cycle { dry_run } => {
            let report = app.cycle(*dry_run).await?;
            println!("{}", report);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => {}
        Err(JobpilotError::Submit(SubmitError::SessionExpired)) => {
            eprintln!("Error: {}", SubmitError::SessionExpired);
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
