// src/commands/mod.rs
//! Command handlers for the command-line tools

mod patch;
mod resolve;

pub use patch::cmd_patch_conanfile;
pub use resolve::{cmd_resolve_requirements, ResolveOutput};
