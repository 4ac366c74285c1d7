// src/resolver/engine.rs

//! Requirement resolution
//!
//! Turns a [`RequirementSet`] and [`FeatureFlags`] into the ordered list of
//! requests handed to the package manager. Every emitted requirement is
//! public-source; restricted essential requirements fall back to their public
//! form and restricted non-essential ones are dropped with a diagnostic.

use crate::profile::FeatureFlags;
use crate::resolver::conandata::{GroupKind, RequirementSet};
use crate::resolver::requirement::{Requirement, SourceTag};
use std::fmt;
use tracing::{debug, info, warn};

/// Why a diagnostic was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Restricted requirement replaced by its public form
    Fallback,
    /// Restricted non-essential requirement dropped
    SkippedNonEssential,
    /// Requirement not applicable to the target platform
    SkippedPlatform,
}

/// One resolver diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Declared reference the diagnostic is about
    pub requirement: String,
    /// `None` for the recipe's fixed tail
    pub group: Option<GroupKind>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.group {
            Some(group) => write!(f, "[{}] {}", group, self.message),
            None => write!(f, "[tail] {}", self.message),
        }
    }
}

/// Result of requirement resolution
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Requests in package-manager order, all public-source
    pub requirements: Vec<Requirement>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Resolution {
    pub fn contains(&self, name: &str) -> bool {
        self.requirements.iter().any(|r| r.name() == name)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| {
            matches!(
                d.kind,
                DiagnosticKind::SkippedNonEssential | DiagnosticKind::SkippedPlatform
            )
        })
    }
}

/// Resolve declared requirements for a build profile
///
/// Never fails: unsatisfiable packages surface later, in the package manager.
pub fn resolve(set: &RequirementSet, flags: &FeatureFlags) -> Resolution {
    let mut resolution = Resolution::default();

    for group in set.groups() {
        let enabled = match group.kind {
            GroupKind::Core => true,
            GroupKind::Protocol => flags.protocol,
            GroupKind::Plugins => flags.plugins.is_enabled(),
            GroupKind::ResourcePack => flags.resource_pack,
        };
        if !enabled {
            debug!("Group {} disabled, skipping {} requirement(s)", group.kind, group.requirements.len());
            continue;
        }

        if group.kind == GroupKind::Plugins {
            admit(set, flags, set.semver_helper(), Some(group.kind), &mut resolution);
        }

        for req in &group.requirements {
            admit(set, flags, req, Some(group.kind), &mut resolution);
        }
    }

    for req in set.tail() {
        admit(set, flags, req, None, &mut resolution);
    }

    resolution
}

/// Apply the per-requirement rules and emit the result, if any
fn admit(
    set: &RequirementSet,
    flags: &FeatureFlags,
    req: &Requirement,
    group: Option<GroupKind>,
    resolution: &mut Resolution,
) {
    if flags.platform.is_single_threaded_wasm() && req.name() == set.threading_package() {
        debug!("Skipping {} on {}", req, flags.platform);
        resolution.diagnostics.push(Diagnostic {
            kind: DiagnosticKind::SkippedPlatform,
            requirement: req.to_string(),
            group,
            message: format!(
                "Skipping {} - threading is unavailable on {}",
                req, flags.platform
            ),
        });
        return;
    }

    match (req.source_tag(), req.is_essential()) {
        (SourceTag::Restricted, false) => {
            warn!("Skipping {} - restricted-source package not available publicly", req);
            resolution.diagnostics.push(Diagnostic {
                kind: DiagnosticKind::SkippedNonEssential,
                requirement: req.to_string(),
                group,
                message: format!(
                    "Skipping {} - restricted-source package not available publicly; {} features are unavailable in this build",
                    req,
                    req.name()
                ),
            });
        }
        (SourceTag::Restricted, true) => {
            let public = req.to_public();
            info!("Using package: {} (fallback for {})", public, req);
            resolution.diagnostics.push(Diagnostic {
                kind: DiagnosticKind::Fallback,
                requirement: req.to_string(),
                group,
                message: format!("Using {} in place of {}", public, req),
            });
            resolution.requirements.push(public);
        }
        (SourceTag::Public, _) => resolution.requirements.push(req.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Platform, PluginSupport};
    use crate::reference::Reference;
    use crate::resolver::conandata::{ConanData, RequirementGroup};
    use crate::resolver::policy::FallbackPolicy;

    fn policy_without_tail() -> FallbackPolicy {
        FallbackPolicy {
            tail: Vec::new(),
            ..FallbackPolicy::default()
        }
    }

    fn core(requirements: Vec<Requirement>) -> Vec<RequirementGroup> {
        vec![RequirementGroup {
            kind: GroupKind::Core,
            requirements,
        }]
    }

    fn minimal_flags() -> FeatureFlags {
        FeatureFlags {
            protocol: false,
            plugins: PluginSupport::Disabled,
            ..FeatureFlags::default()
        }
    }

    #[test]
    fn test_restricted_essential_falls_back() {
        let clipper = Requirement::new(Reference::parse("clipper/6.4.2").unwrap(), SourceTag::Restricted, true);
        let set = RequirementSet::from_groups(core(vec![clipper]), &policy_without_tail()).unwrap();
        let resolution = resolve(&set, &minimal_flags());

        assert_eq!(resolution.requirements.len(), 1);
        let r = &resolution.requirements[0];
        assert_eq!(r.name(), "clipper");
        assert_eq!(r.version_spec(), "6.4.2");
        assert_eq!(r.source_tag(), SourceTag::Public);
    }

    #[test]
    fn test_restricted_non_essential_skipped() {
        let policy = policy_without_tail();
        let scripta = policy.classify("scripta/0.1.0@ultimaker/testing").unwrap();
        let set = RequirementSet::from_groups(core(vec![scripta]), &policy).unwrap();
        let resolution = resolve(&set, &minimal_flags());

        assert!(!resolution.contains("scripta"));
        let skipped: Vec<_> = resolution.skipped().collect();
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].message.contains("scripta"));
        assert!(skipped[0].message.contains("Skipping"));
    }

    #[test]
    fn test_threading_package_excluded_on_wasm() {
        let policy = policy_without_tail();
        for (tag, essential) in [
            (SourceTag::Public, true),
            (SourceTag::Restricted, true),
            (SourceTag::Restricted, false),
        ] {
            let onetbb = Requirement::new(Reference::parse("onetbb/2021.12.0").unwrap(), tag, essential);
            let set = RequirementSet::from_groups(core(vec![onetbb]), &policy).unwrap();
            let flags = FeatureFlags {
                platform: Platform::wasm_single_threaded(),
                ..minimal_flags()
            };
            let resolution = resolve(&set, &flags);
            assert!(!resolution.contains("onetbb"));
        }
    }

    #[test]
    fn test_threading_package_kept_on_native() {
        let policy = policy_without_tail();
        let onetbb = policy.classify("onetbb/2021.12.0").unwrap();
        let set = RequirementSet::from_groups(core(vec![onetbb]), &policy).unwrap();
        assert!(resolve(&set, &minimal_flags()).contains("onetbb"));
    }

    #[test]
    fn test_group_order_and_flags() {
        let data = ConanData::parse(
            r#"
requirements: ["a/1.0"]
requirements_arcus: ["b/1.0"]
requirements_plugins: ["c/1.0"]
requirements_cura_resources: ["d/1.0"]
"#,
        )
        .unwrap();
        let set = RequirementSet::new(&data, &policy_without_tail()).unwrap();

        let all = FeatureFlags {
            resource_pack: true,
            ..FeatureFlags::default()
        };
        let names: Vec<_> = resolve(&set, &all)
            .requirements
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "neargye-semver", "c", "d"]);

        let names: Vec<_> = resolve(&set, &minimal_flags())
            .requirements
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn test_semver_helper_only_with_plugins() {
        let set = RequirementSet::from_groups(Vec::new(), &policy_without_tail()).unwrap();
        assert!(!resolve(&set, &minimal_flags()).contains("neargye-semver"));

        let set = RequirementSet::new(&ConanData::default(), &policy_without_tail()).unwrap();
        assert!(resolve(&set, &FeatureFlags::default()).contains("neargye-semver"));
    }

    #[test]
    fn test_default_tail_is_public() {
        let set = RequirementSet::new(&ConanData::default(), &FallbackPolicy::default()).unwrap();
        let resolution = resolve(&set, &minimal_flags());
        let refs: Vec<_> = resolution.requirements.iter().map(|r| r.to_string()).collect();
        assert_eq!(refs.first().map(String::as_str), Some("clipper/6.4.2"));
        assert_eq!(refs.last().map(String::as_str), Some("mapbox-wagyu/0.5.0"));
        assert!(refs.contains(&"zlib/1.3.1".to_string()));
        assert!(resolution
            .requirements
            .iter()
            .all(|r| r.source_tag() == SourceTag::Public));
        assert!(refs.iter().all(|r| !r.contains('@')));
    }
}
