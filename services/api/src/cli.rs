use crate::demo::{render_matches, run_demo, seed_snapshot, DemoArgs};
use crate::infra::{AllocationStore, TracingEventPublisher};
use crate::server;
use clap::{ArgGroup, Args, Parser, Subcommand};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use talent_match::config::AppConfig;
use talent_match::error::AppError;
use talent_match::workflows::allocation::{
    AllocationRepository, AllocationService, AllocationServiceError, BatchError, BatchId,
    CandidateId, EventPublisher, RoleId,
};

#[derive(Parser, Debug)]
#[command(
    name = "talent-match",
    about = "Rank candidates against open roles and manage exclusive allocations",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the top matches for one role or one candidate
    Rank(RankArgs),
    /// Work with stored batches
    Batch {
        #[command(subcommand)]
        command: BatchCommand,
    },
    /// Walk through ranking, batching, approvals, and conflicts on a seeded pool
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum BatchCommand {
    /// Write a batch as Role,Candidate,Score CSV
    Export(BatchExportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON state file (overrides APP_DATA_PATH)
    #[arg(long)]
    pub(crate) data: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["role", "candidate"])))]
pub(crate) struct RankArgs {
    /// Rank the candidate pool for this role id
    #[arg(long)]
    pub(crate) role: Option<String>,
    /// Rank open roles for this candidate id
    #[arg(long)]
    pub(crate) candidate: Option<String>,
    /// Number of matches to print (defaults to APP_MATCH_LIMIT)
    #[arg(long)]
    pub(crate) limit: Option<usize>,
    /// JSON state file; the seeded demo pool is used when neither this nor APP_DATA_PATH is set
    #[arg(long)]
    pub(crate) data: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct BatchExportArgs {
    /// JSON state file holding the batches
    #[arg(long)]
    pub(crate) data: PathBuf,
    /// Batch id to export (defaults to the current batch)
    #[arg(long)]
    pub(crate) batch: Option<String>,
    /// Destination CSV path
    #[arg(long)]
    pub(crate) output: PathBuf,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Rank(args) => run_rank(args),
        Command::Batch {
            command: BatchCommand::Export(args),
        } => run_batch_export(args),
        Command::Demo(args) => run_demo(args),
    }
}

fn run_rank(args: RankArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let data = args.data.or(config.matching.data_path.clone());
    let store = Arc::new(AllocationStore::open(data.as_deref(), seed_snapshot));
    let service = AllocationService::new(
        store.clone(),
        Arc::new(TracingEventPublisher),
        config.matching.settings(),
    )?;

    let matches = match (args.role, args.candidate) {
        (Some(role), _) => service.top_matches_for_role(&RoleId(role), args.limit)?,
        (None, Some(candidate)) => {
            service.top_matches_for_candidate(&CandidateId(candidate), args.limit)?
        }
        (None, None) => Vec::new(),
    };

    let snapshot = store.load()?;
    println!("Top matches from {}", store.describe());
    render_matches(&snapshot, &matches);
    Ok(())
}

fn run_batch_export(args: BatchExportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = Arc::new(AllocationStore::open(Some(args.data.as_path()), Default::default));
    let service = AllocationService::new(
        store,
        Arc::new(TracingEventPublisher),
        config.matching.settings(),
    )?;

    let batch_id = export_batch_file(&service, args.batch, &args.output)?;
    println!("Exported {} to {}", batch_id, args.output.display());
    Ok(())
}

/// Resolves the batch before touching `output`, so an unknown id leaves no file behind.
fn export_batch_file<R, P>(
    service: &AllocationService<R, P>,
    batch: Option<String>,
    output: &Path,
) -> Result<BatchId, AppError>
where
    R: AllocationRepository + 'static,
    P: EventPublisher + 'static,
{
    let batch_id = match batch {
        Some(id) => BatchId(id),
        None => service
            .current_batch()
            .map(|batch| batch.id)
            .ok_or_else(|| {
                AllocationServiceError::Batch(BatchError::NotFound(BatchId("current".to_string())))
            })?,
    };

    let batch = service.batch(&batch_id)?;
    let file = File::create(output)?;
    service.export_batch(&batch.id, BufWriter::new(file))?;
    Ok(batch.id)
}
