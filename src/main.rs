// src/main.rs

use anyhow::Result;
use clap::Parser;
use conanpatch::commands::cmd_patch_conanfile;

#[derive(Parser)]
#[command(name = "patch-conanfile")]
#[command(author, version, about = "Patch a CuraEngine conanfile.py to build without the internal package remote", long_about = None)]
struct Cli {
    /// Path to the conanfile.py to patch in place
    recipe: String,
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the patch summary
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    cmd_patch_conanfile(&cli.recipe)
}
