use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::context::{DEFAULT_PROGRAM_NAME, StageContext};
use crate::copy_strategy::StrategyKind;
use crate::executor::{BuildStatus, StageExecutor};
use crate::manifest::Manifest;
use crate::platform::TargetPlatform;
use crate::target_description::TargetDescription;

#[derive(Parser)]
#[command(name = "sdkstage")]
#[command(about = "Stages SDK documentation and headers into the engine binaries directory")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Copy the manifest's files into Binaries/<platform>/<program>
    Stage {
        /// Engine root directory
        #[arg(long)]
        engine_dir: PathBuf,

        /// Target platform (defaults to the host)
        #[arg(long)]
        platform: Option<String>,

        /// Program name used for the output directory
        #[arg(long, default_value = DEFAULT_PROGRAM_NAME)]
        program: String,

        /// JSON manifest to stage instead of the built-in SDK manifest
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Result of the primary build; nothing is staged on failure
        #[arg(long, value_enum, default_value_t = BuildStatusArg::Success)]
        build_status: BuildStatusArg,

        /// Override the copy strategy picked from the platform
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
    },

    /// Print or write the built-in staging manifest as JSON
    Manifest {
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print or write the SDK target description as JSON
    Describe {
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Check the engine layout against the staging manifest
    Doctor {
        #[arg(long)]
        engine_dir: PathBuf,

        #[arg(long)]
        platform: Option<String>,

        #[arg(long)]
        manifest: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BuildStatusArg {
    Success,
    Failure,
}

impl From<BuildStatusArg> for BuildStatus {
    fn from(arg: BuildStatusArg) -> Self {
        match arg {
            BuildStatusArg::Success => BuildStatus::Succeeded,
            BuildStatusArg::Failure => BuildStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    Overwrite,
    Sync,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Overwrite => StrategyKind::Overwrite,
            StrategyArg::Sync => StrategyKind::Sync,
        }
    }
}

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Stage {
            engine_dir,
            platform,
            program,
            manifest,
            build_status,
            strategy,
        } => stage_command(engine_dir, platform, program, manifest, build_status, strategy),
        Commands::Manifest { output } => manifest_command(output),
        Commands::Describe { output } => describe_command(output),
        Commands::Doctor {
            engine_dir,
            platform,
            manifest,
        } => doctor_command(engine_dir, platform, manifest),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Logs go to stderr so JSON output on stdout stays clean
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn stage_command(
    engine_dir: PathBuf,
    platform: Option<String>,
    program: String,
    manifest_path: Option<PathBuf>,
    build_status: BuildStatusArg,
    strategy: Option<StrategyArg>,
) -> Result<()> {
    let context = build_context(engine_dir, platform)?.program_name(program);
    let manifest = load_manifest(manifest_path.as_deref())?;

    let executor = match strategy {
        Some(kind) => StageExecutor::with_strategy(context, StrategyKind::from(kind).into_strategy()),
        None => StageExecutor::new(context),
    };

    let Some(report) = executor
        .run_after(build_status.into(), &manifest)
        .context("Staging aborted")?
    else {
        println!("Primary build did not succeed; nothing staged");
        return Ok(());
    };

    println!("{}", report);

    if !report.is_success() {
        let failing: Vec<String> = report
            .failed_rules()
            .into_iter()
            .map(|rule| format!("rule {} ({} issues)", rule, report.issues_for_rule(rule).len()))
            .collect();

        return Err(anyhow!(
            "Staging finished with {} failed rules and {} failed files: {}",
            report.rules_failed,
            report.files_failed,
            failing.join(", ")
        ));
    }

    Ok(())
}

fn manifest_command(output: Option<PathBuf>) -> Result<()> {
    let json = Manifest::sdk_default()
        .to_json()
        .context("Failed to serialize manifest to JSON")?;

    match output {
        Some(path) => {
            fs::write(&path, json)
                .with_context(|| format!("Failed to write manifest to {}", path.display()))?;
            println!("Wrote manifest: {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

fn describe_command(output: Option<PathBuf>) -> Result<()> {
    let description = TargetDescription::sdk();

    match output {
        Some(path) => {
            description.write(&path)?;
            println!("Wrote target description: {}", path.display());
        }
        None => println!("{}", description.to_json()?),
    }

    Ok(())
}

fn doctor_command(engine_dir: PathBuf, platform: Option<String>, manifest_path: Option<PathBuf>) -> Result<()> {
    println!("sdkstage doctor - checking engine layout...\n");

    let context = build_context(engine_dir, platform)?;
    let manifest = load_manifest(manifest_path.as_deref())?;
    let executor = StageExecutor::new(context);
    let context = executor.context();

    println!("✓ Engine directory: {}", context.engine_dir.display());
    println!("  Platform: {}", context.platform);
    println!("  Output root: {}", context.output_root().display());
    println!("  Copy strategy: {}", executor.strategy_kind().as_str());

    println!("\nManifest rules:");
    let mut missing = 0;
    for (index, rule) in manifest.rules().iter().enumerate() {
        let source = context.expand(rule.source_dir());
        let marker = if source.is_dir() {
            "✓"
        } else {
            missing += 1;
            "✗"
        };
        println!(
            "  {} [{}] {}/{} -> {}",
            marker,
            index + 1,
            source.display(),
            rule.file_mask(),
            rule.destination()
        );
        if rule.normalized_destination().is_none() {
            println!("      destination escapes the output root and will be rejected");
        }
    }

    if missing > 0 {
        println!("\n{} source directories are missing; those rules will be skipped", missing);
    }

    println!("\n✓ sdkstage doctor check complete");

    Ok(())
}

fn build_context(engine_dir: PathBuf, platform: Option<String>) -> Result<StageContext> {
    let platform = match platform {
        Some(name) => name.parse::<TargetPlatform>()?,
        None => TargetPlatform::host(),
    };

    let context = StageContext::new(engine_dir, platform);
    context.validate()?;

    Ok(context)
}

fn load_manifest(path: Option<&Path>) -> Result<Manifest> {
    match path {
        Some(path) => Ok(Manifest::read(path)?),
        None => Ok(Manifest::sdk_default()),
    }
}
