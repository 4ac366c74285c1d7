// src/resolver/policy.rs

//! Fallback policy for restricted-origin packages
//!
//! The policy names the internal remote users whose packages cannot be assumed
//! reachable, the packages that may be dropped entirely when unreachable, and
//! the structural requirements the recipe always adds. Defaults match the
//! CuraEngine recipe; a TOML file can override any field:
//!
//! ```toml
//! restricted_users = ["ultimaker"]
//! non_essential = ["scripta"]
//! threading_package = "onetbb"
//! semver_helper = "neargye-semver/0.3.0"
//! tail = ["clipper/6.4.2@ultimaker/stable", "boost/1.86.0"]
//! ```

use crate::error::{Error, Result};
use crate::reference::Reference;
use crate::resolver::requirement::{Requirement, SourceTag};
use serde::Deserialize;
use std::path::Path;

/// Restricted-origin handling for one recipe
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FallbackPolicy {
    /// Origin users only served by the internal remote
    pub restricted_users: Vec<String>,
    /// Package names that may be dropped when their origin is restricted
    pub non_essential: Vec<String>,
    /// Package skipped on the single-threaded wasm profile
    pub threading_package: String,
    /// Semantic-versioning helper required whenever plugins are enabled
    pub semver_helper: String,
    /// Requirements the recipe always adds after the declared groups
    pub tail: Vec<String>,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            restricted_users: vec!["ultimaker".to_string()],
            non_essential: vec!["scripta".to_string()],
            threading_package: "onetbb".to_string(),
            semver_helper: "neargye-semver/0.3.0".to_string(),
            tail: [
                "clipper/6.4.2@ultimaker/stable",
                "boost/1.86.0",
                "rapidjson/cci.20230929",
                "stb/cci.20230920",
                "spdlog/1.15.1",
                "fmt/11.1.3",
                "range-v3/0.12.0",
                "zlib/1.3.1",
                "mapbox-wagyu/0.5.0@ultimaker/stable",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl FallbackPolicy {
    /// Parse a policy from TOML; omitted fields keep their defaults
    pub fn parse(content: &str) -> Result<Self> {
        let policy: Self = toml::from_str(content)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Load a policy file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::IoError(format!("Failed to read policy file {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.restricted_users.iter().any(|u| u.is_empty()) {
            return Err(Error::ParseError(
                "restricted_users must not contain empty names".to_string(),
            ));
        }
        Reference::parse(&self.semver_helper)?;
        for entry in &self.tail {
            Reference::parse(entry)?;
        }
        Ok(())
    }

    /// Marker substrings (`@user`) identifying restricted references in text
    pub fn restricted_markers(&self) -> Vec<String> {
        self.restricted_users.iter().map(|u| format!("@{}", u)).collect()
    }

    pub fn is_restricted(&self, reference: &Reference) -> bool {
        self.restricted_users.iter().any(|u| reference.is_from(u))
    }

    /// Classify a declared reference string into a [`Requirement`]
    pub fn classify(&self, declared: &str) -> Result<Requirement> {
        let reference = Reference::parse(declared)?;
        let source_tag = if self.is_restricted(&reference) {
            SourceTag::Restricted
        } else {
            SourceTag::Public
        };
        let essential = !self.non_essential.iter().any(|n| *n == reference.name);
        Ok(Requirement::new(reference, source_tag, essential))
    }

    /// Tail entries that are both restricted and essential
    ///
    /// These are the hardcoded declarations a recipe carries outside its
    /// declared lists.
    pub fn restricted_tail(&self) -> Result<Vec<Requirement>> {
        let mut out = Vec::new();
        for entry in &self.tail {
            let req = self.classify(entry)?;
            if req.source_tag() == SourceTag::Restricted && req.is_essential() {
                out.push(req);
            }
        }
        Ok(out)
    }
}
