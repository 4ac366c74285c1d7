// src/profile.rs

//! Build profile: target platform and feature flags
//!
//! A profile is what the recipe's `config_options`, `configure`, `validate` and
//! `generate` steps look at: the target platform (architecture + OS) and the
//! boolean feature options. Remote plugin support only exists as a concept when
//! plugin support is enabled, so it is folded into [`PluginSupport`] rather than
//! kept as an independent boolean.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Target platform identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    pub arch: String,
    pub os: String,
}

impl Platform {
    pub fn new(arch: impl Into<String>, os: impl Into<String>) -> Self {
        Self {
            arch: arch.into(),
            os: os.into(),
        }
    }

    /// The single-threaded web-assembly profile (no threading support)
    pub fn wasm_single_threaded() -> Self {
        Self::new("wasm", "Emscripten")
    }

    pub fn is_single_threaded_wasm(&self) -> bool {
        self.arch == "wasm" && self.os == "Emscripten"
    }

    pub fn is_emscripten(&self) -> bool {
        self.os == "Emscripten"
    }

    /// File extension of the packaged engine executable
    pub fn binary_extension(&self) -> &'static str {
        match self.os.as_str() {
            "Windows" => ".exe",
            "Emscripten" => ".js",
            _ => "",
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::new("x86_64", "Linux")
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.arch, self.os)
    }
}

/// Plugin support, with the remote-plugin flag only defined when enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginSupport {
    Disabled,
    Enabled { remote: bool },
}

impl PluginSupport {
    /// Build from raw recipe options
    ///
    /// Mirrors `config_options`: when plugins are disabled the remote option is
    /// deleted, so whatever value was passed for it is discarded.
    pub fn from_options(enable_plugins: bool, enable_remote_plugins: bool) -> Self {
        if enable_plugins {
            Self::Enabled {
                remote: enable_remote_plugins,
            }
        } else {
            Self::Disabled
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled { .. })
    }

    /// Remote plugin flag, `None` when plugin support is disabled
    pub fn remote(&self) -> Option<bool> {
        match self {
            Self::Enabled { remote } => Some(*remote),
            Self::Disabled => None,
        }
    }
}

/// Feature toggles plus target platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Protocol (arcus) support
    pub protocol: bool,
    pub plugins: PluginSupport,
    /// Bundle the cura resource packs
    pub resource_pack: bool,
    pub benchmarks: bool,
    pub extensive_warnings: bool,
    pub platform: Platform,
}

impl Default for FeatureFlags {
    /// The recipe's `default_options`
    fn default() -> Self {
        Self {
            protocol: true,
            plugins: PluginSupport::Enabled { remote: false },
            resource_pack: false,
            benchmarks: false,
            extensive_warnings: false,
            platform: Platform::default(),
        }
    }
}

impl FeatureFlags {
    /// CMake cache variables handed to the toolchain
    pub fn toolchain_variables(&self) -> BTreeMap<&'static str, bool> {
        let mut vars = BTreeMap::new();
        vars.insert("ENABLE_ARCUS", self.protocol);
        vars.insert("ENABLE_BENCHMARKS", self.benchmarks);
        vars.insert("EXTENSIVE_WARNINGS", self.extensive_warnings);
        vars.insert("ENABLE_THREADING", !self.platform.is_single_threaded_wasm());
        vars.insert("ENABLE_PLUGINS", self.plugins.is_enabled());
        if let Some(remote) = self.plugins.remote() {
            vars.insert("ENABLE_REMOTE_PLUGINS", remote);
        }
        vars
    }
}

/// Minimum compiler versions accepted by `validate`
const COMPILER_MINIMUMS: &[(&str, &str)] = &[
    ("gcc", "12"),
    ("clang", "14"),
    ("apple-clang", "13"),
    ("msvc", "191"),
    ("visual_studio", "17"),
];

/// Reject compilers older than the engine supports
///
/// Unknown compilers are accepted.
pub fn check_compiler(compiler: &str, version: &str) -> Result<()> {
    let Some((_, minimum)) = COMPILER_MINIMUMS.iter().find(|(name, _)| *name == compiler) else {
        return Ok(());
    };

    if compare_versions(version, minimum) == std::cmp::Ordering::Less {
        return Err(Error::ConfigError(format!(
            "{} {} is too old, at least {} is required for C++20",
            compiler, version, minimum
        )));
    }
    Ok(())
}

/// Compare dotted numeric versions component by component
///
/// Missing components count as zero; non-numeric components compare as zero.
fn compare_versions(a: &str, b: &str) -> std::cmp::Ordering {
    let parse = |s: &str| -> Vec<u64> { s.split('.').map(|p| p.parse().unwrap_or(0)).collect() };
    let (a, b) = (parse(a), parse(b));
    let len = a.len().max(b.len());
    for i in 0..len {
        let (x, y) = (a.get(i).copied().unwrap_or(0), b.get(i).copied().unwrap_or(0));
        match x.cmp(&y) {
            std::cmp::Ordering::Equal => continue,
            other => return other,
        }
    }
    std::cmp::Ordering::Equal
}
