// src/resolver/options.rs

//! Dependency option plan
//!
//! `configure()` wants to set options on dependencies that may not be part of
//! the graph (arcus is optional). Each setting is applied through an
//! [`OptionTarget`] capability query whose outcome is handed back to the
//! caller instead of being swallowed.

use crate::profile::FeatureFlags;
use std::fmt;
use tracing::warn;

/// A dependency option the recipe wants to set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSetting {
    /// Package pattern, `*` for every dependency
    pub package: String,
    pub option: String,
    pub value: String,
    /// Optional settings may be unavailable without failing the build
    pub optional: bool,
}

impl OptionSetting {
    fn new(package: &str, option: &str, value: &str, optional: bool) -> Self {
        Self {
            package: package.to_string(),
            option: option.to_string(),
            value: value.to_string(),
            optional,
        }
    }
}

impl fmt::Display for OptionSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}={}", self.package, self.option, self.value)?;
        if self.optional {
            write!(f, " (optional)")?;
        }
        Ok(())
    }
}

/// Something that can accept dependency options
pub trait OptionTarget {
    /// Try to set `option` on `package`; `false` when the package or option
    /// does not exist
    fn try_set(&mut self, package: &str, option: &str, value: &str) -> bool;
}

/// Outcome of one setting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionOutcome {
    Applied(OptionSetting),
    Unavailable(OptionSetting),
}

impl OptionOutcome {
    /// An unavailable setting that was not optional
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Unavailable(s) if !s.optional)
    }
}

/// Option settings implied by the feature flags, in application order
pub fn option_plan(flags: &FeatureFlags) -> Vec<OptionSetting> {
    let mut plan = Vec::new();
    if flags.protocol || flags.plugins.is_enabled() {
        plan.push(OptionSetting::new("protobuf", "shared", "False", false));
    }
    if flags.protocol {
        plan.push(OptionSetting::new("arcus", "shared", "True", true));
    }
    if flags.platform.is_emscripten() {
        plan.push(OptionSetting::new("*", "shared", "False", false));
    }
    plan
}

/// Apply a plan, reporting each outcome
pub fn apply_option_plan(plan: &[OptionSetting], target: &mut impl OptionTarget) -> Vec<OptionOutcome> {
    plan.iter()
        .map(|setting| {
            if target.try_set(&setting.package, &setting.option, &setting.value) {
                OptionOutcome::Applied(setting.clone())
            } else {
                if setting.optional {
                    warn!(
                        "Could not configure {}:{} (package may not be available)",
                        setting.package, setting.option
                    );
                }
                OptionOutcome::Unavailable(setting.clone())
            }
        })
        .collect()
}
