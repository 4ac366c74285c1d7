// src/resolver/conandata.rs

//! `conandata.yml` loading
//!
//! The recipe keeps its declared requirement lists in `conandata.yml`, one list
//! per feature group:
//!
//! ```yaml
//! version: "5.10.0"
//! requirements:
//!   - "scripta/0.1.0@ultimaker/testing"
//! requirements_arcus:
//!   - "arcus/5.4.1"
//! requirements_plugins:
//!   - "curaengine_grpc_definitions/0.3.1"
//! requirements_cura_resources:
//!   - "cura_resources/5.10.0"
//! ```

use crate::error::{Error, Result};
use crate::resolver::policy::FallbackPolicy;
use crate::resolver::requirement::Requirement;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Raw contents of `conandata.yml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConanData {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub commit: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub requirements_arcus: Vec<String>,
    #[serde(default)]
    pub requirements_plugins: Vec<String>,
    #[serde(default)]
    pub requirements_cura_resources: Vec<String>,
}

impl ConanData {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    fn declared(&self, group: GroupKind) -> &[String] {
        match group {
            GroupKind::Core => &self.requirements,
            GroupKind::Protocol => &self.requirements_arcus,
            GroupKind::Plugins => &self.requirements_plugins,
            GroupKind::ResourcePack => &self.requirements_cura_resources,
        }
    }
}

/// Feature group a requirement list belongs to
///
/// Variant order is processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKind {
    Core,
    Protocol,
    Plugins,
    ResourcePack,
}

impl GroupKind {
    pub fn all() -> &'static [GroupKind] {
        &[Self::Core, Self::Protocol, Self::Plugins, Self::ResourcePack]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Protocol => "protocol",
            Self::Plugins => "plugins",
            Self::ResourcePack => "resource-pack",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A declared, classified requirement list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementGroup {
    pub kind: GroupKind,
    pub requirements: Vec<Requirement>,
}

/// Immutable resolver input: groups plus the recipe's structural requirements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementSet {
    groups: Vec<RequirementGroup>,
    tail: Vec<Requirement>,
    semver_helper: Requirement,
    threading_package: String,
}

impl RequirementSet {
    /// Classify `conandata` lists and the policy's fixed entries
    pub fn new(data: &ConanData, policy: &FallbackPolicy) -> Result<Self> {
        let mut groups = Vec::new();
        for &kind in GroupKind::all() {
            let requirements = data
                .declared(kind)
                .iter()
                .map(|d| policy.classify(d))
                .collect::<Result<Vec<_>>>()?;
            groups.push(RequirementGroup { kind, requirements });
        }
        Self::from_groups(groups, policy)
    }

    /// Build from already classified groups
    ///
    /// Groups are ordered by kind regardless of the order given.
    pub fn from_groups(mut groups: Vec<RequirementGroup>, policy: &FallbackPolicy) -> Result<Self> {
        groups.sort_by_key(|g| g.kind);
        let tail = policy
            .tail
            .iter()
            .map(|d| policy.classify(d))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            groups,
            tail,
            semver_helper: policy.classify(&policy.semver_helper)?,
            threading_package: policy.threading_package.clone(),
        })
    }

    pub fn groups(&self) -> &[RequirementGroup] {
        &self.groups
    }

    pub fn tail(&self) -> &[Requirement] {
        &self.tail
    }

    pub fn semver_helper(&self) -> &Requirement {
        &self.semver_helper
    }

    pub fn threading_package(&self) -> &str {
        &self.threading_package
    }
}
