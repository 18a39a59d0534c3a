//! stimkit Test Bench CLI
//!
//! Generate suites from a test DSL and run them against the SoC model.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use stimkit_sim::{generate_from_file, BenchConfig, BenchOutcome, RunExport, TestBench};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// stimkit verification stimulus runner
#[derive(Parser, Debug)]
#[command(name = "stimkit-sim")]
#[command(about = "Drive manifest-declared agents with file-based test vectors", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every phase against the SoC model
    Run(RunArgs),

    /// Generate per-agent suites from a DSL file
    GenTests(GenArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Manifest listing the IP instances
    #[arg(short, long, default_value = "soc/manifest.json")]
    manifest: PathBuf,

    /// Root directory of the generated suites
    #[arg(short, long, default_value = "tests/generated")]
    tests_root: PathBuf,

    /// Generate suites from this DSL file before running
    #[arg(long)]
    dsl: Option<PathBuf>,

    /// How long monitors may take to settle after the run phase
    #[arg(long, default_value = "5000")]
    settle_timeout_ms: u64,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export the run record to a JSON file
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenArgs {
    /// DSL YAML file
    dsl: PathBuf,

    /// Output directory
    #[arg(long, default_value = "tests/generated")]
    out: PathBuf,

    /// Also write a manifest listing the generated instances
    #[arg(long)]
    manifest: Option<PathBuf>,
}

fn gen_tests(args: &GenArgs) -> i32 {
    match generate_from_file(&args.dsl, &args.out, args.manifest.as_deref()) {
        Ok(suites) => {
            info!("Generated {} suites under {}", suites.len(), args.out.display());
            0
        }
        Err(e) => {
            error!("{}", e);
            1
        }
    }
}

fn print_json(outcome: &BenchOutcome) {
    let summary = serde_json::json!({
        "passed": outcome.passed(),
        "registered": outcome.registered,
        "vectors_driven": outcome.run.vectors_driven(),
        "vectors_dropped": outcome.run.vectors_dropped(),
        "failures": outcome.orchestration.failures,
        "agents": outcome.run.agents.iter().map(|a| {
            serde_json::json!({
                "agent": a.agent,
                "skipped": a.skipped,
                "driven": a.vectors_driven,
                "dropped": a.vectors_dropped,
                "passed": a.verdict.as_ref().map(|v| v.passed()),
            })
        }).collect::<Vec<_>>(),
    });
    match serde_json::to_string_pretty(&summary) {
        Ok(text) => println!("{}", text),
        Err(e) => error!("Failed to encode summary: {}", e),
    }
}

fn print_summary(outcome: &BenchOutcome) {
    for agent in &outcome.run.agents {
        if agent.skipped {
            info!("- {} skipped (no suite)", agent.agent);
            continue;
        }
        let verdict = match &agent.verdict {
            Some(v) if v.passed() => "PASSED".to_string(),
            Some(v) => format!("FAILED ({} mismatches)", v.mismatches.len()),
            None => "no scoreboard".to_string(),
        };
        info!(
            "- {}: {} driven, {} dropped, {}",
            agent.agent, agent.vectors_driven, agent.vectors_dropped, verdict
        );
    }

    for failure in &outcome.orchestration.failures {
        error!("  {} phase failed in {}: {}", failure.phase, failure.component, failure.message);
    }

    if outcome.passed() {
        info!("✅ Run passed ({} agents)", outcome.run.agents.len());
    } else {
        error!("❌ Run failed");
    }
}

async fn run(args: &RunArgs) -> i32 {
    if let Some(dsl) = &args.dsl {
        if let Err(e) = generate_from_file(dsl, &args.tests_root, None) {
            error!("{}", e);
            return 1;
        }
    }

    let config = BenchConfig {
        manifest_path: args.manifest.clone(),
        tests_root: args.tests_root.clone(),
        settle_timeout_ms: args.settle_timeout_ms,
    };

    let mut bench = match TestBench::new(config.clone()) {
        Ok(bench) => bench,
        Err(e) => {
            error!("Failed to create bench: {}", e);
            return 1;
        }
    };

    let outcome = match bench.run().await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Bench run aborted: {}", e);
            return 1;
        }
    };

    if let Some(path) = &args.export {
        let export = RunExport::new(&config, &outcome);
        match export.write_to_file(path) {
            Ok(()) => info!("Exported run {} to {}", export.run_id, path.display()),
            Err(e) => error!("Failed to write export: {:?}", e),
        }
    }

    if args.json {
        print_json(&outcome);
    } else {
        print_summary(&outcome);
    }

    if outcome.passed() {
        0
    } else {
        1
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let code = match &cli.command {
        Command::Run(args) => {
            if !args.json {
                info!("stimkit test bench v{}", env!("CARGO_PKG_VERSION"));
            }
            run(args).await
        }
        Command::GenTests(args) => gen_tests(args),
    };

    // Exit with proper code for CI
    std::process::exit(code);
}
