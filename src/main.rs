use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use dotenv::dotenv;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use jira_history::{
    ConfigStore, Destination, Error, FileConfigStore, JiraClient, JiraConfig, OutputFormat,
    ReportService, RunConfig, render,
};

#[derive(Parser, Debug)]
#[command(
    name = "jira-history",
    version,
    about = "Report the dates Jira issues entered each configured status",
    override_usage = "jira-history [OPTIONS] <QUERY>"
)]
struct Cli {
    /// JQL query selecting the issues to report on
    query: String,

    /// Enable verbose logging. Helps with debugging.
    #[arg(short, long)]
    verbose: bool,

    /// Prefer JSON output instead of a simple table (same as --format json)
    #[arg(short, long, conflicts_with = "format")]
    json_output: bool,

    /// Output format: table, json, csv or tsv
    #[arg(long, default_value = "table")]
    format: OutputFormat,

    /// Write results to FILE instead of stdout
    #[arg(short = 'f', long = "output-file", value_name = "FILE")]
    output_file: Option<PathBuf>,

    /// Status configuration (default: ./statuses.json, then the user config dir)
    #[arg(long, value_name = "FILE")]
    statuses: Option<PathBuf>,

    /// Issues fetched per search round
    #[arg(long, env = "JIRA_MAX_RESULTS", default_value_t = jira_history::config_store::DEFAULT_PAGE_SIZE)]
    page_size: u32,

    /// Stop after this many search rounds (default: fetch every match)
    #[arg(long)]
    max_rounds: Option<u32>,
}

impl Cli {
    fn run_config(&self) -> RunConfig {
        let format = if self.json_output {
            OutputFormat::Json
        } else {
            self.format
        };

        RunConfig::new()
            .output_format(format)
            .destination(Destination::from_option(self.output_file.clone()))
            .verbose(self.verbose)
            .page_size(self.page_size)
            .max_rounds(self.max_rounds)
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

async fn run(cli: &Cli, run_config: RunConfig) -> Result<(), Error> {
    // 取得を始める前に設定をすべて検証する
    run_config.validate()?;

    let statuses = FileConfigStore::locate(cli.statuses.as_deref())?
        .load_status_config()
        .await?;
    let service = ReportService::new(statuses, &run_config)?;
    let client = JiraClient::new(JiraConfig::from_env()?)?;

    let (report, stats) = service.run(&client, &cli.query).await?;
    debug!(
        "Fetched {} issue(s) in {} round(s), {:.1}s",
        stats.issue_count,
        stats.rounds,
        stats.duration_seconds()
    );

    let text = render(&report, run_config.output_format)?;
    run_config.destination.write(&text).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv().ok();

    let cli = Cli::parse();
    let run_config = cli.run_config();
    init_logging(run_config.verbose);

    match run(&cli, run_config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
