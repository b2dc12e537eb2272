//! CLI entry point: reads one event as JSON on stdin, runs it through the
//! rule engine, and writes the host-facing decision to stdout.

use anyhow::{Context, Result};
use clap::Parser;
use gatekeeper_core::accumulator::{ExecutionResult, PermissionDecision};
use gatekeeper_core::config;
use gatekeeper_core::event::Event;
use gatekeeper_core::runner::Runner;
use serde_json::json;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "gatekeeper", about = "Agent-session hook rule engine")]
struct Cli {
    /// Project root to resolve layered configuration from. Defaults to the
    /// current directory, ascending to find a `.gatekeeper` marker.
    #[arg(long)]
    project_root: Option<PathBuf>,

    /// Print the merged, matched-order rule set and exit without running
    /// any event through it.
    #[arg(long)]
    list_rules: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "gatekeeper failed");
            eprintln!("gatekeeper: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let project_root = cli
        .project_root
        .or_else(|| std::env::current_dir().ok().and_then(|cwd| config::find_project_root(&cwd)));

    let runner = Runner::load(project_root.as_deref()).context("failed to load configuration")?;

    if cli.list_rules {
        let ids: Vec<&str> = runner.rules().iter().map(|r| r.id.as_str()).collect();
        println!("{}", serde_json::to_string_pretty(&ids)?);
        return Ok(ExitCode::SUCCESS);
    }

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read event from stdin")?;

    let event: Event = serde_json::from_str(&input).context("failed to parse event JSON")?;
    let result = runner.run(&event);

    let wire = to_wire_output(&result);
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer(&mut handle, &wire)?;
    writeln!(handle)?;

    if result.should_block {
        if let Some(reason) = &result.block_reason {
            eprintln!("{reason}");
        }
        return Ok(ExitCode::from(2));
    }

    Ok(ExitCode::SUCCESS)
}

fn to_wire_output(result: &ExecutionResult) -> serde_json::Value {
    let decision = if result.should_block {
        Some("block")
    } else {
        None
    };

    let permission_decision = result.permission_decision.map(|d| match d {
        PermissionDecision::Allow => "allow",
        PermissionDecision::Deny => "deny",
        PermissionDecision::Ask => "ask",
    });

    json!({
        "continue": !result.should_block,
        "decision": decision,
        "reason": result.block_reason,
        "hookSpecificOutput": {
            "permissionDecision": permission_decision,
            "permissionDecisionReason": result.permission_decision_reason,
            "additionalContext": result.additional_context,
        }
    })
}
