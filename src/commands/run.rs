//! Run command implementation
//!
//! Executes the six-step conversion pipeline against one repository:
//! 1. Ensure the default branch
//! 2. Submodule hygiene
//! 3. Boardful commit
//! 4. Ensure the work branch
//! 5. CI-assets commit
//! 6. Boardless commit
//!
//! Every step is guarded against repeat work, so running this command over
//! an already-converted repository changes nothing.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use boardless::output::{emoji, OutputConfig};
use boardless::pipeline::{Pipeline, PipelineConfig, StepStatus};

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Repository root (defaults to the current directory)
    #[arg(short, long, value_name = "PATH", env = "BOARDLESS_REPO")]
    pub repo: Option<PathBuf>,

    /// Stop after the Boardful commit on the default branch
    #[arg(long)]
    pub boardful_only: bool,

    /// Show detailed progress information
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the run command
pub fn execute(args: RunArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let root = resolve_root(args.repo)?;

    if !args.quiet {
        println!("{} Boardless Conversion", emoji(&out, "🔧", "[RUN]"));
        println!();
    }
    if !args.quiet && args.verbose {
        println!(
            "{} Repository: {}",
            emoji(&out, "📋", "[INFO]"),
            root.display()
        );
        if args.boardful_only {
            println!(
                "{} Boardful-only mode, work-branch steps skipped",
                emoji(&out, "📋", "[INFO]")
            );
        }
        println!();
    }

    let mut config = PipelineConfig::new(&root);
    config.boardless = !args.boardful_only;
    let report = Pipeline::new(config).run()?;

    if !args.quiet {
        for step in &report.steps {
            match &step.status {
                StepStatus::Committed(oid) => println!(
                    "{} {}: committed {:.7}",
                    emoji(&out, "✅", "[OK]"),
                    step.step,
                    oid.to_string()
                ),
                StepStatus::NothingToCommit => println!(
                    "{} {}: nothing to commit",
                    emoji(&out, "⏭️", "[SKIP]"),
                    step.step
                ),
                StepStatus::SkippedByGuard => println!(
                    "{} {}: already done",
                    emoji(&out, "⏭️", "[SKIP]"),
                    step.step
                ),
                StepStatus::Completed => {
                    println!("{} {}: done", emoji(&out, "✅", "[OK]"), step.step)
                }
            }
            for warning in &step.warnings {
                println!("    {} {}", emoji(&out, "⚠️", "[WARN]"), warning);
            }
        }
        println!();
        println!(
            "{} {} commit(s) created",
            emoji(&out, "🎯", "[RESULT]"),
            report.commit_count()
        );
    }

    Ok(())
}

fn resolve_root(repo: Option<PathBuf>) -> Result<PathBuf> {
    match repo {
        Some(path) => Ok(path),
        None => std::env::current_dir().context("failed to resolve the current directory"),
    }
}
