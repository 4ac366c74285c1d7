// src/recipe/report.rs

//! Patch run diagnostics

use crate::recipe::rules::{RuleAction, RuleClass};
use std::fmt;

/// What happened at a reported line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportAction {
    /// A rule fired and rewrote the line(s)
    Applied(RuleAction),
    /// A targeted marker survived outside every recognized pattern
    ResidualMarker { marker: String },
}

/// One report entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    /// 1-based line number in the input
    pub line: usize,
    pub rule_id: String,
    /// `None` for residual markers
    pub class: Option<RuleClass>,
    pub action: ReportAction,
}

/// Ordered record of every rule that fired during one patch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    entries: Vec<ReportEntry>,
}

impl PatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn applied(&mut self, line: usize, rule_id: &str, class: RuleClass, action: RuleAction) {
        self.entries.push(ReportEntry {
            line,
            rule_id: rule_id.to_string(),
            class: Some(class),
            action: ReportAction::Applied(action),
        });
    }

    pub(crate) fn residual(&mut self, line: usize, marker: &str) {
        self.entries.push(ReportEntry {
            line,
            rule_id: "residual-marker".to_string(),
            class: None,
            action: ReportAction::ResidualMarker {
                marker: marker.to_string(),
            },
        });
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any rule rewrote text
    pub fn has_changes(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.action, ReportAction::Applied(_)))
    }

    /// How many times rules of `class` fired
    pub fn count(&self, class: RuleClass) -> usize {
        self.entries.iter().filter(|e| e.class == Some(class)).count()
    }

    /// Residual marker entries that need manual review
    pub fn residuals(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.action, ReportAction::ResidualMarker { .. }))
    }

    /// Per-class counts for classes that fired, in priority order
    pub fn summary(&self) -> Vec<(RuleClass, usize)> {
        RuleClass::all()
            .iter()
            .map(|&class| (class, self.count(class)))
            .filter(|(_, n)| *n > 0)
            .collect()
    }
}

impl fmt::Display for PatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_changes() {
            writeln!(f, "No rules fired")?;
        }
        for (class, count) in self.summary() {
            writeln!(f, "  {:<24} {:>3}  {}", class.as_str(), count, class.description())?;
        }
        for entry in self.residuals() {
            if let ReportAction::ResidualMarker { marker } = &entry.action {
                writeln!(
                    f,
                    "  line {}: '{}' found outside any known pattern - review manually",
                    entry.line, marker
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut report = PatchReport::new();
        report.applied(3, "python-requires", RuleClass::DeclarationDisable, RuleAction::CommentOutSingleLine);
        report.applied(40, "super-configure", RuleClass::InheritanceHook, RuleAction::CommentOutSingleLine);
        report.applied(41, "super-validate", RuleClass::InheritanceHook, RuleAction::CommentOutSingleLine);
        report.residual(90, "@ultimaker");

        assert!(report.has_changes());
        assert_eq!(
            report.summary(),
            vec![(RuleClass::DeclarationDisable, 1), (RuleClass::InheritanceHook, 2)]
        );
        assert_eq!(report.residuals().count(), 1);

        let text = report.to_string();
        assert!(text.contains("inheritance-hook"));
        assert!(text.contains("line 90: '@ultimaker'"));
    }

    #[test]
    fn test_residual_only_is_not_a_change() {
        let mut report = PatchReport::new();
        report.residual(1, "npmpackage");
        assert!(!report.has_changes());
        assert!(report.to_string().starts_with("No rules fired"));
    }
}
