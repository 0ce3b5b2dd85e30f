use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::task::JoinSet;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use routematch::{
    config::{Config, LogFormat},
    scenario::{run_scenario, ScenarioReport},
    RequestAttributes, Report, Scenario, Tester,
};

#[derive(Parser, Debug)]
#[command(name = "routematch")]
#[command(about = "Test which route definition matches a request")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run scenario files and check expected routes and coverage
    Test {
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        #[arg(required = true)]
        scenarios: Vec<PathBuf>,
    },

    /// Match a single request and explain the result
    Match {
        /// Route definition file
        #[arg(short, long)]
        routes: PathBuf,

        #[arg(short, long)]
        path: String,

        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request header, as 'Name: value'
        #[arg(short = 'H', long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,

        /// Filter to replace with a no-op stand-in
        #[arg(long = "mock-filter")]
        mock_filters: Vec<String>,

        #[arg(long)]
        ignore_trailing_slash: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn parse_header(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected 'Name: value', got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing header name in '{}'", s));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    // Initialize tracing
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }

    if let Some(path) = &args.config {
        info!("Loaded configuration from {:?}", path);
    }

    match args.command {
        Command::Test { format, scenarios } => run_tests(&config, scenarios, format).await,
        Command::Match {
            routes,
            path,
            method,
            headers,
            mock_filters,
            ignore_trailing_slash,
        } => {
            let mut options = config.tester_options(routes, &mock_filters);
            options.ignore_trailing_slash |= ignore_trailing_slash;

            let tester = Tester::new(&options).context("Failed to compile routes")?;

            let mut attrs = RequestAttributes::new(path).method(method);
            for (name, value) in headers {
                attrs = attrs.header(name, value);
            }

            let result = tester.test(&attrs);
            print!("{}", result.pretty_print());

            Ok(if result.route().is_some() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

async fn run_tests(config: &Config, paths: Vec<PathBuf>, format: Format) -> Result<ExitCode> {
    let mut scenarios = Vec::with_capacity(paths.len());
    for path in &paths {
        let mut scenario = Scenario::load(path)
            .with_context(|| format!("Failed to load scenario {:?}", path))?;
        for name in &config.mock_filters {
            if !scenario.mock_filters.contains(name) {
                scenario.mock_filters.push(name.clone());
            }
        }
        scenario.ignore_trailing_slash |= config.ignore_trailing_slash;
        scenarios.push(scenario);
    }

    info!("Running {} scenarios", scenarios.len());

    let mut tasks = JoinSet::new();
    for (i, scenario) in scenarios.into_iter().enumerate() {
        tasks.spawn_blocking(move || (i, run_scenario(&scenario)));
    }

    let mut results: Vec<(usize, ScenarioReport)> = Vec::with_capacity(paths.len());
    while let Some(joined) = tasks.join_next().await {
        results.push(joined.context("Scenario task panicked")?);
    }
    results.sort_by_key(|(i, _)| *i);

    let mut report = Report::default();
    for (_, scenario) in results {
        report.push(scenario);
    }

    match format {
        Format::Text => println!("{}", report),
        Format::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        ),
    }

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!("{} failures", report.failure_count());
        Ok(ExitCode::FAILURE)
    }
}
