// src/recipe/rules.rs

//! Rewrite rule catalog
//!
//! Each rule pairs a trigger (what the line, or a short fixed window of lines,
//! must look like) with an action (what to emit instead). The catalog is kept
//! sorted by [`RuleClass`], so walking it front to back is the priority order
//! and the first match wins.

use crate::error::{Error, Result};
use crate::resolver::FallbackPolicy;
use regex::Regex;
use std::fmt;

/// Rule classes, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleClass {
    /// Extension-mechanism declarations (`python_requires = ...`)
    DeclarationDisable,
    /// Calls into behavior the removed extension provided
    InheritanceHook,
    /// `pass` placeholder for blocks emptied by a disabling rule
    EmptyBlockGuard,
    /// Origin-stripping guard injected into requirement loops
    LoopInjection,
    /// Hardcoded restricted dependency declarations
    DependencySubstitution,
}

impl RuleClass {
    pub fn all() -> &'static [RuleClass] {
        &[
            Self::DeclarationDisable,
            Self::InheritanceHook,
            Self::EmptyBlockGuard,
            Self::LoopInjection,
            Self::DependencySubstitution,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeclarationDisable => "declaration-disable",
            Self::InheritanceHook => "inheritance-hook",
            Self::EmptyBlockGuard => "empty-block-guard",
            Self::LoopInjection => "loop-injection",
            Self::DependencySubstitution => "dependency-substitution",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::DeclarationDisable => "extension declarations disabled",
            Self::InheritanceHook => "extension hooks disabled",
            Self::EmptyBlockGuard => "placeholder statements injected",
            Self::LoopInjection => "requirement loops guarded",
            Self::DependencySubstitution => "dependencies switched to public sources",
        }
    }
}

impl fmt::Display for RuleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a rule does to the lines it consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleAction {
    CommentOutSingleLine,
    CommentOutAndAppendPass,
    CommentOutMultiLineBlock,
    InjectBeforeNextLine,
    SubstituteDependencyDeclaration,
}

impl RuleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CommentOutSingleLine => "comment-out",
            Self::CommentOutAndAppendPass => "comment-out+pass",
            Self::CommentOutMultiLineBlock => "comment-out-block",
            Self::InjectBeforeNextLine => "inject",
            Self::SubstituteDependencyDeclaration => "substitute",
        }
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// When a rule fires
#[derive(Debug, Clone)]
pub enum Trigger {
    /// A one-line statement with exactly this text (trailing comment allowed)
    Statement(String),
    /// A block header followed directly by exactly these body statements
    Block { header: String, body: Vec<String> },
    /// A `for` header over a declared requirement list; capture group `var`
    /// names the loop variable
    LoopHeader(Regex),
}

impl Trigger {
    /// Does `line` hold `statement`, ignoring indentation and a trailing comment
    pub fn statement_matches(statement: &str, line: &str) -> bool {
        let trimmed = line.trim();
        match trimmed.strip_prefix(statement) {
            Some("") => true,
            Some(rest) => rest.starts_with(char::is_whitespace) && rest.trim_start().starts_with('#'),
            None => false,
        }
    }
}

/// One entry of the catalog
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pub id: String,
    pub class: RuleClass,
    pub trigger: Trigger,
    pub action: RuleAction,
    /// Annotation emitted with the disabled text
    pub reason: String,
    /// Replacement statement for substitutions
    pub replacement: Option<String>,
}

impl RewriteRule {
    fn statement(id: &str, class: RuleClass, statement: &str, action: RuleAction, reason: &str) -> Self {
        Self {
            id: id.to_string(),
            class,
            trigger: Trigger::Statement(statement.to_string()),
            action,
            reason: reason.to_string(),
            replacement: None,
        }
    }

    /// Number of input lines the rule consumes when it fires
    pub fn scope(&self) -> usize {
        match &self.trigger {
            Trigger::Block { body, .. } => 1 + body.len(),
            Trigger::Statement(_) | Trigger::LoopHeader(_) => 1,
        }
    }
}

/// Guard injected at the top of requirement loops
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopGuard {
    markers: Vec<String>,
    non_essential: Vec<String>,
}

impl LoopGuard {
    /// Snippet lines for loop variable `var`, as (nesting depth, text)
    pub fn lines(&self, var: &str) -> Vec<(usize, String)> {
        let condition = self
            .markers
            .iter()
            .map(|m| format!("\"{}\" in {}", m, var))
            .collect::<Vec<_>>()
            .join(" or ");

        let mut lines = vec![(0, format!("if {}:", condition))];
        if !self.non_essential.is_empty() {
            let names = self
                .non_essential
                .iter()
                .map(|n| format!("\"{}\"", n))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push((1, format!("if {}.split(\"/\")[0] in [{}]:", var, names)));
            lines.push((2, "continue".to_string()));
        }
        lines.push((1, format!("{} = {}.split(\"@\")[0]", var, var)));
        lines
    }
}

const INTERNAL_REMOTE: &str = "internal remote unreachable";

/// Prioritized rule list plus the marker substrings it targets
#[derive(Debug, Clone)]
pub struct RuleCatalog {
    rules: Vec<RewriteRule>,
    markers: Vec<String>,
    loop_guard: LoopGuard,
}

impl RuleCatalog {
    /// Catalog for the engine recipe and its `sentrylibrary`/`npmpackage`
    /// extensions, with dependency substitutions taken from `policy`
    pub fn new(policy: &FallbackPolicy) -> Result<Self> {
        use RuleAction::*;
        use RuleClass::*;

        let hook_reason = format!("Disabled ({})", INTERNAL_REMOTE);
        let base_reason = "Disabled (SentryLibrary base class removed)";

        let mut rules = vec![
            RewriteRule::statement(
                "python-requires",
                DeclarationDisable,
                r#"python_requires = "sentrylibrary/1.0.0", "npmpackage/[>=1.0.0]""#,
                CommentOutSingleLine,
                &format!("python_requires commented out ({})", INTERNAL_REMOTE),
            ),
            RewriteRule::statement(
                "python-requires-extend",
                DeclarationDisable,
                r#"python_requires_extend = "sentrylibrary.SentryLibrary""#,
                CommentOutSingleLine,
                "python_requires_extend commented out",
            ),
            RewriteRule {
                id: "sentry-init".to_string(),
                class: InheritanceHook,
                trigger: Trigger::Block {
                    header: "def init(self):".to_string(),
                    body: vec![
                        r#"base = self.python_requires["sentrylibrary"].module.SentryLibrary"#.to_string(),
                        "self.options.update(base.options, base.default_options)".to_string(),
                    ],
                },
                action: CommentOutMultiLineBlock,
                reason: format!("Sentry support disabled ({})", INTERNAL_REMOTE),
                replacement: None,
            },
            RewriteRule::statement(
                "sentry-init-base",
                InheritanceHook,
                r#"base = self.python_requires["sentrylibrary"].module.SentryLibrary"#,
                CommentOutSingleLine,
                &hook_reason,
            ),
            RewriteRule::statement(
                "sentry-init-options",
                InheritanceHook,
                "self.options.update(base.options, base.default_options)",
                CommentOutSingleLine,
                &hook_reason,
            ),
            RewriteRule::statement(
                "super-config-options",
                InheritanceHook,
                "super().config_options()",
                CommentOutSingleLine,
                base_reason,
            ),
            RewriteRule::statement(
                "super-configure",
                InheritanceHook,
                "super().configure()",
                CommentOutSingleLine,
                base_reason,
            ),
            RewriteRule::statement(
                "super-validate",
                InheritanceHook,
                "super().validate()",
                CommentOutSingleLine,
                base_reason,
            ),
            RewriteRule::statement(
                "sentry-toolchain",
                InheritanceHook,
                "self.setup_cmake_toolchain_sentry(tc)",
                CommentOutSingleLine,
                &hook_reason,
            ),
            RewriteRule::statement(
                "sentry-debug-files",
                InheritanceHook,
                r#"self.send_sentry_debug_files(binary_basename="CuraEngine")"#,
                CommentOutSingleLine,
                &hook_reason,
            ),
            RewriteRule::statement(
                "npm-package-json",
                InheritanceHook,
                r#"self.python_requires["npmpackage"].module.conf_package_json(self)"#,
                CommentOutAndAppendPass,
                &hook_reason,
            ),
            RewriteRule {
                id: "requirements-loop".to_string(),
                class: LoopInjection,
                trigger: Trigger::LoopHeader(
                    Regex::new(
                        r#"^\s*for\s+(?P<var>[A-Za-z_]\w*)\s+in\s+self\.conan_data\[\s*["']requirements\w*["']\s*\]\s*:\s*(#.*)?$"#,
                    )
                    .map_err(|e| Error::ParseError(format!("Invalid loop pattern: {}", e)))?,
                ),
                action: InjectBeforeNextLine,
                reason: "Strip restricted origin qualifiers".to_string(),
                replacement: None,
            },
        ];

        for req in policy.restricted_tail()? {
            let public = req.to_public();
            rules.push(RewriteRule {
                id: format!("fallback-{}", req.name()),
                class: DependencySubstitution,
                trigger: Trigger::Statement(format!("self.requires(\"{}\")", req)),
                action: SubstituteDependencyDeclaration,
                reason: format!("Using {} instead ({})", public, INTERNAL_REMOTE),
                replacement: Some(format!("self.requires(\"{}\")", public)),
            });
        }

        rules.sort_by_key(|r| r.class);

        let mut markers: Vec<String> = ["sentrylibrary", "SentryLibrary", "npmpackage", "_sentry"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        markers.extend(policy.restricted_markers());

        Ok(Self {
            rules,
            markers,
            loop_guard: LoopGuard {
                markers: policy.restricted_markers(),
                non_essential: policy.non_essential.clone(),
            },
        })
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    /// Substrings that must not survive on an active line unnoticed
    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn loop_guard(&self) -> &LoopGuard {
        &self.loop_guard
    }

    /// First targeted marker found in `line`
    pub fn find_marker(&self, line: &str) -> Option<&str> {
        self.markers
            .iter()
            .find(|m| line.contains(m.as_str()))
            .map(String::as_str)
    }
}
