//! tfinspect CLI entry point.
//!
//! This binary provides the command-line interface for tfinspect.

use anyhow::Context;
use clap::Parser;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tfinspect::cli::{Cli, Commands, InitArgs, InspectArgs, ValidateArgs};
use tfinspect::{Config, Inspection, Inspector, Reporter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(exit_code) => exit_code,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            eprintln!("Error: {e}");

            // Print error chain (cause chain)
            let mut source = e.source();
            if source.is_some() {
                eprintln!("\nCaused by:");
                let mut i = 0;
                while let Some(cause) = source {
                    eprintln!("  {i}: {cause}");
                    source = cause.source();
                    i += 1;
                }
            }

            let code = e
                .downcast_ref::<tfinspect::InspectError>()
                .map_or(1, tfinspect::InspectError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        // RUST_LOG wins over the verbose flag
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let base_level = match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            };
            EnvFilter::new(format!("warn,tfinspect={base_level}"))
        })
    };

    // Reports go to stdout, logs to stderr
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Inspect(args) => {
            tracing::debug!("Loading configuration");
            let mut config = Config::load(cli.config.as_deref())?;
            config.merge_cli_args(&args);
            config.validate()?;
            inspect(config, &args)
        }
        Commands::Init(args) => init(&args),
        Commands::Validate(args) => Ok(validate(&args)),
    }
}

fn inspect(config: Config, args: &InspectArgs) -> anyhow::Result<ExitCode> {
    let inspector = Inspector::new(config.clone());

    let inspection = if args.full_pipeline() {
        tracing::debug!(dir = %args.dir.display(), "Running full pipeline");
        inspector.inspect(&args.dir, args.metadata.as_deref())?
    } else {
        tracing::debug!(dir = %args.dir.display(), "Running front end only");
        let module = inspector.load_module(&args.dir)?;
        Inspection {
            diagnostics: module.diagnostics.clone(),
            module: Some(module),
        }
    };

    let report = Reporter::new(&config)
        .variables_only(args.filter_variables)
        .generate(&inspection, args.format)?;

    if let Some(output_path) = &args.output {
        std::fs::write(output_path, &report)
            .with_context(|| format!("Failed to write report to {}", output_path.display()))?;
        tracing::info!(path = %output_path.display(), "Report written");
    } else {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{report}")?;
    }

    if inspection.has_errors() {
        tracing::warn!(
            errors = inspection.diagnostics.error_count(),
            "Inspection finished with errors"
        );
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

fn init(args: &InitArgs) -> anyhow::Result<ExitCode> {
    let path: &Path = &args.output;
    if path.exists() && !args.force {
        anyhow::bail!(
            "Configuration file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }

    std::fs::write(path, Config::example_yaml())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Created example configuration: {}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn validate(args: &ValidateArgs) -> ExitCode {
    match Config::from_file(&args.config) {
        Ok(_) => {
            println!("Configuration is valid: {}", args.config.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Configuration error: {}", e.detail());
            ExitCode::from(1)
        }
    }
}
