// src/commands/patch.rs

//! Patch a recipe in place

use crate::recipe::{PatchEngine, RecipeSource, RuleCatalog};
use crate::resolver::FallbackPolicy;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Patch `recipe_path` in place and print what changed
///
/// The file is only rewritten when a rule fired and the result validated;
/// on any error it is left untouched.
pub fn cmd_patch_conanfile(recipe_path: &str) -> Result<()> {
    let path = Path::new(recipe_path);

    let source = RecipeSource::read(path)
        .with_context(|| format!("Failed to read recipe: {}", path.display()))?;

    let catalog = RuleCatalog::new(&FallbackPolicy::default())
        .context("Failed to build rewrite rules")?;
    let engine = PatchEngine::new(catalog);

    let result = engine.patch(&source.lines).with_context(|| {
        format!("Patched {} is not valid Python, file left unchanged", path.display())
    })?;

    print!("{}", result.report);

    if !result.report.has_changes() {
        if result.report.residuals().next().is_some() {
            println!("{}: no rules matched, nothing written", path.display());
        } else {
            println!("{}: already patched, nothing written", path.display());
        }
        return Ok(());
    }

    source
        .with_lines(result.lines)
        .write_atomic(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Patched {}", path.display());
    println!("Patched {}", path.display());
    Ok(())
}
