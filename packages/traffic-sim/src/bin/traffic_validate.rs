//! Standalone scenario linter: parses and validates a YAML scenario file
//! without starting an engine, exiting non-zero on any violation.
//!
//! Mirrors the teacher's habit of shipping a small standalone binary
//! alongside the main simulator crate (`packages/uwb-simulator` sits beside
//! `backend-rust` in the same workspace).

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "traffic-validate", about = "Validate a TrafficSim scenario file")]
struct Args {
    /// Path to the scenario YAML file.
    #[arg(short, long)]
    config: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "traffic_validate=info".into()),
        )
        .init();

    let args = Args::parse();

    let raw = match std::fs::read_to_string(&args.config) {
        Ok(raw) => raw,
        Err(err) => {
            eprintln!("error: could not read '{}': {err}", args.config);
            std::process::exit(1);
        }
    };

    let doc = match traffic_sim::scenario::parse(&args.config, &raw) {
        Ok(doc) => doc,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let errors = traffic_sim::scenario::validate(&args.config, &doc);
    if errors.is_empty() {
        println!(
            "{} is valid: {} type(s), {} platform(s)",
            args.config,
            doc.platform_types.len(),
            doc.platforms.len()
        );
        std::process::exit(0);
    }

    eprintln!("{} has {} error(s):", args.config, errors.len());
    for err in &errors {
        eprintln!("  - {err}");
    }
    std::process::exit(1);
}
