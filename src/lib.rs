// src/lib.rs

//! Conan recipe patching for builds without the internal package remote
//!
//! Two pieces:
//! - [`recipe`]: a line-oriented patch engine that disables the recipe's
//!   dependence on internal extension packages and restricted dependency
//!   origins, validating the result before it is written back
//! - [`resolver`]: resolves the recipe's declared requirement groups for a
//!   build profile into an ordered list of public-source requests
//!
//! Build profile helpers live in [`profile`]; Conan package references in
//! [`reference`].

pub mod commands;
mod error;
pub mod profile;
pub mod recipe;
pub mod reference;
pub mod resolver;

pub use error::{Error, Result};
pub use profile::{check_compiler, FeatureFlags, Platform, PluginSupport};
pub use recipe::{PatchEngine, PatchReport, PatchResult, RecipeSource, RuleCatalog};
pub use reference::{Origin, Reference, ReferenceParseError};
pub use resolver::{resolve, FallbackPolicy, Requirement, RequirementSet, Resolution};
