use anyhow::Context;
use clap::Parser;
use msr::core::report;
use msr::utils::logger;
use msr::{
    Cli, Command, FileRegistry, HttpFetcher, MsrEngine, MsrError, RefreshCoordinator, Settings,
};
use std::future::Future;
use std::sync::Arc;

/// Conventional exit status for SIGINT.
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    if let Command::Version = cli.command {
        println!("{}", msr::VERSION);
        return Ok(());
    }

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => fail(&e),
    };
    tracing::debug!("Settings: {:?}", settings);

    let store = FileRegistry::from_config(&settings);
    let fetcher = match HttpFetcher::from_config(&settings) {
        Ok(fetcher) => Arc::new(fetcher),
        Err(e) => fail(&e),
    };
    let engine = MsrEngine::new(RefreshCoordinator::from_config(store, fetcher, &settings));

    match cli.command {
        Command::Version => {}
        Command::Register { url } => {
            if let Err(e) = engine.register(&url).await {
                fail(&e);
            }
        }
        Command::Measure => {
            let rows = or_empty(interruptible(engine.measure()).await);
            let output = if cli.json {
                report::render_json(&rows).context("failed to render measure report")?
            } else {
                report::render_measure_table(&rows)
            };
            print_report(&output, cli.json);
        }
        Command::Race => {
            let rows = or_empty(interruptible(engine.race()).await);
            let output = if cli.json {
                report::render_json(&rows).context("failed to render race report")?
            } else {
                report::render_race_table(&rows)
            };
            print_report(&output, cli.json);
        }
    }

    Ok(())
}

fn load_settings(cli: &Cli) -> msr::Result<Settings> {
    let file = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path.display());
            Some(Settings::load_file(path)?)
        }
        None => None,
    };
    Settings::resolve(file, cli.overrides())
}

/// Races a refresh against Ctrl-C. Dropping the refresh aborts in-flight
/// fetches before the registry is written.
async fn interruptible<T>(work: impl Future<Output = msr::Result<T>>) -> msr::Result<T> {
    tokio::select! {
        result = work => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted; registry left unchanged.");
            std::process::exit(EXIT_INTERRUPTED);
        }
    }
}

/// File access problems while refreshing degrade to a warning and an empty report.
fn or_empty<T>(result: msr::Result<Vec<T>>) -> Vec<T> {
    match result {
        Ok(rows) => rows,
        Err(e @ MsrError::RegistryMissing { .. }) => {
            tracing::debug!("{}", e);
            eprintln!("{}", e.user_friendly_message());
            Vec::new()
        }
        Err(e) => {
            tracing::error!("❌ Refresh failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("Warning: {}", e.user_friendly_message());
            Vec::new()
        }
    }
}

fn print_report(output: &str, json: bool) {
    if json {
        println!("{}", output);
    } else {
        print!("{}", output);
    }
}

fn fail(e: &MsrError) -> ! {
    tracing::error!("❌ {}", e);
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("{}", e.user_friendly_message());
    std::process::exit(e.exit_code())
}
