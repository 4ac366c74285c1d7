// src/bin/resolve_requirements.rs

use anyhow::Result;
use clap::Parser;
use conanpatch::commands::cmd_resolve_requirements;
use conanpatch::profile::{FeatureFlags, Platform, PluginSupport};

#[derive(Parser)]
#[command(name = "resolve-requirements")]
#[command(author, version, about = "Resolve a CuraEngine conandata.yml into public-source requirements", long_about = None)]
struct Cli {
    /// Path to conandata.yml
    conandata: String,

    /// Build without protocol (arcus) support
    #[arg(long)]
    no_arcus: bool,

    /// Build without plugin support
    #[arg(long)]
    no_plugins: bool,

    /// Allow remote plugins (ignored without plugin support)
    #[arg(long)]
    remote_plugins: bool,

    /// Bundle the cura resource packs
    #[arg(long)]
    cura_resources: bool,

    /// Build the benchmarks
    #[arg(long)]
    benchmarks: bool,

    /// Enable extensive compiler warnings
    #[arg(long)]
    extensive_warnings: bool,

    /// Target architecture
    #[arg(long, default_value = "x86_64")]
    arch: String,

    /// Target operating system
    #[arg(long, default_value = "Linux")]
    os: String,

    /// TOML file overriding the restricted-origin fallback policy
    #[arg(long, value_name = "FILE")]
    policy: Option<String>,

    /// Compiler to check against the minimum supported versions
    #[arg(long, requires = "compiler_version")]
    compiler: Option<String>,

    /// Version of --compiler
    #[arg(long, requires = "compiler")]
    compiler_version: Option<String>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the resolution
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    let flags = FeatureFlags {
        protocol: !cli.no_arcus,
        plugins: PluginSupport::from_options(!cli.no_plugins, cli.remote_plugins),
        resource_pack: cli.cura_resources,
        benchmarks: cli.benchmarks,
        extensive_warnings: cli.extensive_warnings,
        platform: Platform::new(cli.arch, cli.os),
    };

    let compiler = match (&cli.compiler, &cli.compiler_version) {
        (Some(name), Some(version)) => Some((name.as_str(), version.as_str())),
        _ => None,
    };

    cmd_resolve_requirements(&cli.conandata, &flags, cli.policy.as_deref(), compiler, cli.json)
}
