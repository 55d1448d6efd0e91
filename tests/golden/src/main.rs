//! Golden Test Runner
//!
//! Checks the pinned query encodings and ids, and that malformed encodings
//! are rejected. Exits non-zero on any failure.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use telliot_golden_tests::{rejection_vectors, vectors, GoldenTestHarness};
use telliot_query::QueryRegistry;

#[derive(Parser)]
#[command(name = "telliot-golden")]
#[command(about = "Telliot query encoding golden test suite")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all golden vectors
    Run {
        /// Additional query type schemas (JSON)
        #[arg(long)]
        registry: Option<PathBuf>,
    },
    /// List golden vectors
    List,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    match args.command {
        Commands::Run { registry } => run_vectors(registry),
        Commands::List => {
            list_vectors();
            Ok(())
        }
    }
}

fn run_vectors(registry_path: Option<PathBuf>) -> Result<()> {
    println!("🧪 Starting Telliot Golden Test Suite");
    println!("=====================================");

    let mut registry = QueryRegistry::builtin();
    if let Some(path) = registry_path {
        let json = std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
        registry.load_json(&json)?;
    }
    let harness = GoldenTestHarness::new(registry);

    let mut all_passed = true;
    for vector in vectors() {
        println!("\n🎯 {}", vector.name);
        println!("   {}", vector.description);
        match harness.check(&vector) {
            Ok(()) => println!("   ✅ PASSED ({})", vector.query_id),
            Err(e) => {
                println!("   ❌ FAILED: {}", e);
                all_passed = false;
            }
        }
    }

    for vector in rejection_vectors() {
        println!("\n🎯 reject {}", vector.name);
        match harness.check_rejection(&vector) {
            Ok(error) => println!("   ✅ REJECTED: {}", error),
            Err(e) => {
                println!("   ❌ FAILED: {}", e);
                all_passed = false;
            }
        }
    }

    println!("\n=====================================");
    if all_passed {
        println!("🎉 All golden tests PASSED!");
        Ok(())
    } else {
        println!("💥 Some golden tests FAILED!");
        std::process::exit(1);
    }
}

fn list_vectors() {
    println!("📋 Golden Vectors:");
    println!("==================");

    for (i, vector) in vectors().iter().enumerate() {
        println!("{}. {}", i + 1, vector.name);
        println!("   {}", vector.description);
        println!("   id: {}", vector.query_id);
        println!();
    }

    println!("📋 Rejection Vectors:");
    for vector in rejection_vectors() {
        println!("   - {} ({} bytes)", vector.name, vector.query_data.len());
    }
}
