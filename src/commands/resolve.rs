// src/commands/resolve.rs

//! Resolve a recipe's declared requirements for a build profile

use crate::profile::{check_compiler, FeatureFlags};
use crate::resolver::{option_plan, resolve, ConanData, FallbackPolicy, RequirementSet, Resolution};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Machine-readable form of a resolution
#[derive(Debug, Serialize)]
pub struct ResolveOutput {
    pub version: Option<String>,
    /// Packaged engine executable for the target platform
    pub binary: String,
    pub requirements: Vec<String>,
    pub diagnostics: Vec<String>,
    pub options: Vec<String>,
    pub toolchain: BTreeMap<String, bool>,
}

impl ResolveOutput {
    fn new(data: &ConanData, resolution: &Resolution, flags: &FeatureFlags) -> Self {
        Self {
            version: data.version.clone(),
            binary: format!("CuraEngine{}", flags.platform.binary_extension()),
            requirements: resolution.requirements.iter().map(|r| r.to_string()).collect(),
            diagnostics: resolution.diagnostics.iter().map(|d| d.to_string()).collect(),
            options: option_plan(flags).iter().map(|s| s.to_string()).collect(),
            toolchain: flags
                .toolchain_variables()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

/// Resolve the requirement groups in `conandata_path` and print the result
///
/// # Arguments
/// * `conandata_path` - Path to the recipe's `conandata.yml`
/// * `flags` - Feature toggles and target platform
/// * `policy_path` - Optional TOML fallback policy (built-in defaults otherwise)
/// * `compiler` - Optional `(name, version)` checked against the minimums
/// * `json` - Print JSON instead of text
pub fn cmd_resolve_requirements(
    conandata_path: &str,
    flags: &FeatureFlags,
    policy_path: Option<&str>,
    compiler: Option<(&str, &str)>,
    json: bool,
) -> Result<()> {
    if let Some((name, version)) = compiler {
        check_compiler(name, version)?;
    }

    let policy = match policy_path {
        Some(p) => FallbackPolicy::load(Path::new(p))
            .with_context(|| format!("Failed to load fallback policy: {}", p))?,
        None => FallbackPolicy::default(),
    };

    let path = Path::new(conandata_path);
    let data = ConanData::load(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    let set = RequirementSet::new(&data, &policy)
        .with_context(|| format!("Invalid requirement in {}", path.display()))?;

    let resolution = resolve(&set, flags);
    let output = ResolveOutput::new(&data, &resolution, flags);

    if json {
        let text = serde_json::to_string_pretty(&output).context("Failed to serialize resolution")?;
        println!("{}", text);
        return Ok(());
    }

    if let Some(version) = &output.version {
        println!("CuraEngine {} ({})", version, flags.platform);
    }
    println!("Binary: {}", output.binary);
    println!("Requirements:");
    for req in &output.requirements {
        println!("  {}", req);
    }
    if !output.diagnostics.is_empty() {
        println!("Diagnostics:");
        for diagnostic in &output.diagnostics {
            println!("  {}", diagnostic);
        }
    }
    if !output.options.is_empty() {
        println!("Options:");
        for option in &output.options {
            println!("  {}", option);
        }
    }
    println!("Toolchain:");
    for (name, value) in &output.toolchain {
        println!("  {}={}", name, if *value { "ON" } else { "OFF" });
    }

    Ok(())
}
