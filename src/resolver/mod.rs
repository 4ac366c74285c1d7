// src/resolver/mod.rs

//! Requirement resolution for the engine recipe
//!
//! The recipe declares its dependencies in grouped lists (core, protocol,
//! plugins, resource packs). Some entries are published only on an internal
//! remote; this module decides what to request instead:
//!
//! - restricted + essential: request the same name/version from a public source
//! - restricted + non-essential: drop it and record a diagnostic
//! - public: request unchanged
//!
//! Resolution is a pure function of an immutable [`RequirementSet`] and the
//! build's [`FeatureFlags`](crate::profile::FeatureFlags).

mod conandata;
mod engine;
mod options;
mod policy;
mod requirement;

pub use conandata::{ConanData, GroupKind, RequirementGroup, RequirementSet};
pub use engine::{resolve, Diagnostic, DiagnosticKind, Resolution};
pub use options::{apply_option_plan, option_plan, OptionOutcome, OptionSetting, OptionTarget};
pub use policy::FallbackPolicy;
pub use requirement::{Requirement, SourceTag};
