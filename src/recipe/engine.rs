// src/recipe/engine.rs

//! Rule dispatcher
//!
//! One forward cursor over the input lines. At each position the catalog is
//! tried in priority order; the first rule that matches decides how many lines
//! are consumed and what is emitted. Unmatched lines are copied unchanged.
//!
//! Block structure of the *output* is tracked as lines are emitted, so when a
//! disabling rule removes the last active statement of a block the `pass`
//! placeholder goes in right there, in the same pass.

use crate::error::{Error, Result};
use crate::recipe::lexer::{leading_whitespace, scan_lines, LineInfo, LineScanner};
use crate::recipe::report::PatchReport;
use crate::recipe::rules::{RewriteRule, RuleAction, RuleCatalog, RuleClass, Trigger};
use crate::recipe::validate::{PythonValidator, SyntaxValidator};
use tracing::{debug, warn};

/// Indent unit used for lines the engine synthesizes
const INDENT_UNIT: &str = "    ";

/// Rewritten lines plus the diagnostics of the run
#[derive(Debug, Clone)]
pub struct PatchResult {
    pub lines: Vec<String>,
    pub report: PatchReport,
}

/// Prioritized rule dispatcher with post-rewrite validation
#[derive(Debug, Clone)]
pub struct PatchEngine<V = PythonValidator> {
    catalog: RuleCatalog,
    validator: V,
}

impl PatchEngine<PythonValidator> {
    pub fn new(catalog: RuleCatalog) -> Self {
        Self {
            catalog,
            validator: PythonValidator,
        }
    }
}

impl<V: SyntaxValidator> PatchEngine<V> {
    pub fn with_validator(catalog: RuleCatalog, validator: V) -> Self {
        Self { catalog, validator }
    }

    /// Rewrite `lines`; fails with `Error::Validation` if the result is not
    /// well-formed source
    ///
    /// The error names the input line the offending output line came from.
    pub fn patch(&self, lines: &[String]) -> Result<PatchResult> {
        let infos = scan_lines(lines);
        let mut pass = Pass {
            catalog: &self.catalog,
            lines,
            infos: &infos,
            out: Output::default(),
            report: PatchReport::new(),
        };

        let mut cursor = 0;
        while cursor < lines.len() {
            pass.out.source = cursor;
            cursor += match pass.find_match(cursor) {
                Some(m) => pass.apply(m, cursor),
                None => {
                    pass.copy(cursor);
                    1
                }
            };
        }

        let Pass { out, report, .. } = pass;
        self.validator
            .validate(&out.lines)
            .map_err(|e| out.to_input_line(e))?;

        debug!(
            "Patched {} line(s) into {}; {} report entr(ies)",
            lines.len(),
            out.lines.len(),
            report.entries().len()
        );
        Ok(PatchResult {
            lines: out.lines,
            report,
        })
    }
}

/// An open block in the output
#[derive(Debug)]
struct Frame {
    header_indent: usize,
    /// Direct child statements emitted so far
    active: usize,
}

/// Emitted lines plus the block structure they form
#[derive(Debug, Default)]
struct Output {
    lines: Vec<String>,
    /// 0-based input line each output line was produced from
    origins: Vec<usize>,
    /// Input line currently being emitted
    source: usize,
    scanner: LineScanner,
    frames: Vec<Frame>,
}

impl Output {
    fn push(&mut self, line: String) {
        let info = self.scanner.scan(&line);
        if info.starts_logical && info.has_code {
            while self.frames.last().is_some_and(|f| f.header_indent >= info.indent) {
                self.frames.pop();
            }
            if let Some(frame) = self.frames.last_mut() {
                frame.active += 1;
            }
        }
        if info.opens_block {
            self.frames.push(Frame {
                header_indent: info.indent,
                active: 0,
            });
        }
        self.lines.push(line);
        self.origins.push(self.source);
    }

    /// Re-number a validation error from output lines to input lines
    fn to_input_line(&self, e: Error) -> Error {
        match e {
            Error::Validation { line, message } if line > 0 => {
                let input = self
                    .origins
                    .get(line - 1)
                    .or(self.origins.last())
                    .map_or(line, |origin| origin + 1);
                if input == line {
                    return Error::Validation { line, message };
                }
                Error::Validation {
                    line: input,
                    message: format!("{} (line {} of the rewritten output)", message, line),
                }
            }
            other => other,
        }
    }

    /// Header indent of the block that would hold a statement at `indent`,
    /// if that block has no active statement yet
    fn empty_block(&self, indent: usize) -> Option<usize> {
        self.frames
            .iter()
            .rev()
            .find(|f| f.header_indent < indent)
            .filter(|f| f.active == 0)
            .map(|f| f.header_indent)
    }
}

enum Match<'a> {
    Rule(&'a RewriteRule),
    Loop {
        rule: &'a RewriteRule,
        var: String,
        /// Lines of an already present guard following the header
        existing: usize,
    },
}

/// State of one patch run
struct Pass<'a> {
    catalog: &'a RuleCatalog,
    lines: &'a [String],
    infos: &'a [LineInfo],
    out: Output,
    report: PatchReport,
}

impl<'a> Pass<'a> {
    fn find_match(&self, i: usize) -> Option<Match<'a>> {
        let info = self.infos[i];
        if !info.is_simple_statement() {
            return None;
        }
        let catalog = self.catalog;
        let line = &self.lines[i];

        for rule in catalog.rules() {
            match &rule.trigger {
                Trigger::Statement(statement) => {
                    if Trigger::statement_matches(statement, line) {
                        return Some(Match::Rule(rule));
                    }
                }
                Trigger::Block { header, body } => {
                    if self.block_matches(i, header, body) {
                        return Some(Match::Rule(rule));
                    }
                }
                Trigger::LoopHeader(re) => {
                    if !info.opens_block {
                        continue;
                    }
                    if let Some(var) = re.captures(line).and_then(|c| c.name("var")) {
                        let var = var.as_str().to_string();
                        let existing = self.existing_guard(i, &var);
                        return Some(Match::Loop { rule, var, existing });
                    }
                }
            }
        }
        None
    }

    /// Header plus body statements, each on its own line, body evenly indented
    fn block_matches(&self, i: usize, header: &str, body: &[String]) -> bool {
        if !self.infos[i].opens_block || !Trigger::statement_matches(header, &self.lines[i]) {
            return false;
        }
        let header_indent = self.infos[i].indent;
        let mut body_indent = None;

        for (k, statement) in body.iter().enumerate() {
            let j = i + 1 + k;
            let (Some(line), Some(info)) = (self.lines.get(j), self.infos.get(j)) else {
                return false;
            };
            if !info.is_simple_statement()
                || info.indent <= header_indent
                || !Trigger::statement_matches(statement, line)
            {
                return false;
            }
            match body_indent {
                None => body_indent = Some(info.indent),
                Some(indent) if indent != info.indent => return false,
                Some(_) => {}
            }
        }
        true
    }

    /// Length of a guard already following the loop header at `i`, or 0
    ///
    /// Comparison ignores whitespace.
    fn existing_guard(&self, i: usize, var: &str) -> usize {
        let expected = self.catalog.loop_guard().lines(var);
        for (k, (_, text)) in expected.iter().enumerate() {
            match self.lines.get(i + 1 + k) {
                Some(line) if normalize(line) == normalize(text) => {}
                _ => return 0,
            }
        }
        expected.len()
    }

    /// Emit the replacement for a match; returns the number of lines consumed
    fn apply(&mut self, m: Match<'a>, i: usize) -> usize {
        let lines = self.lines;
        let line = &lines[i];
        let ws = leading_whitespace(line);
        let trimmed = line.trim();

        let rule = match m {
            Match::Loop { rule, var, existing } => {
                self.out.push(line.clone());
                if existing > 0 {
                    debug!("Line {}: requirement loop already guarded", i + 1);
                    for (k, guarded) in lines[i + 1..i + 1 + existing].iter().enumerate() {
                        self.out.source = i + 1 + k;
                        self.out.push(guarded.clone());
                    }
                    return 1 + existing;
                }
                let (body_ws, unit) = self.body_whitespace(i);
                for (depth, text) in self.catalog.loop_guard().lines(&var) {
                    self.out.push(format!("{}{}{}", body_ws, unit.repeat(depth), text));
                }
                self.fired(i, rule);
                return 1;
            }
            Match::Rule(rule) => rule,
        };

        match rule.action {
            RuleAction::CommentOutSingleLine => {
                if rule.class == RuleClass::DeclarationDisable {
                    self.out.push(format!("{}# {}", ws, rule.reason));
                    self.out.push(format!("{}# {}", ws, trimmed));
                } else {
                    self.out.push(format!("{}# {}  # {}", ws, trimmed, rule.reason));
                }
                self.fired(i, rule);
                self.guard_empty_block(i, i + 1, ws, self.infos[i].indent);
                1
            }
            RuleAction::CommentOutAndAppendPass => {
                self.out.push(format!("{}# {}  # {}", ws, trimmed, rule.reason));
                self.out.push(format!("{}pass", ws));
                self.fired(i, rule);
                1
            }
            RuleAction::CommentOutMultiLineBlock => {
                let scope = rule.scope();
                self.out.push(line.clone());
                let body = &lines[i + 1..i + scope];
                let body_ws = body.first().map(|l| leading_whitespace(l)).unwrap_or(ws);
                self.out.push(format!("{}# {}", body_ws, rule.reason));
                for (k, body_line) in body.iter().enumerate() {
                    self.out.source = i + 1 + k;
                    self.out
                        .push(format!("{}# {}", leading_whitespace(body_line), body_line.trim()));
                }
                self.fired(i, rule);
                let body_indent = self.infos.get(i + 1).map_or(self.infos[i].indent + 1, |b| b.indent);
                self.guard_empty_block(i, i + scope, body_ws, body_indent);
                scope
            }
            RuleAction::SubstituteDependencyDeclaration => {
                self.out.push(format!("{}# {}  # {}", ws, trimmed, rule.reason));
                match &rule.replacement {
                    Some(replacement) => self.out.push(format!("{}{}", ws, replacement)),
                    None => self.guard_empty_block(i, i + 1, ws, self.infos[i].indent),
                }
                self.fired(i, rule);
                1
            }
            RuleAction::InjectBeforeNextLine => {
                self.out.push(line.clone());
                if let Some(replacement) = &rule.replacement {
                    let (body_ws, _) = self.body_whitespace(i);
                    self.out.push(format!("{}{}", body_ws, replacement));
                }
                self.fired(i, rule);
                1
            }
        }
    }

    /// Copy an unmatched line, flagging targeted markers on active lines
    fn copy(&mut self, i: usize) {
        let (lines, catalog) = (self.lines, self.catalog);
        let line = &lines[i];
        if !line.trim_start().starts_with('#') {
            if let Some(marker) = catalog.find_marker(line) {
                warn!(
                    "Line {}: '{}' found outside any known pattern, review manually",
                    i + 1,
                    marker
                );
                self.report.residual(i + 1, marker);
            }
        }
        self.out.push(line.clone());
    }

    fn fired(&mut self, i: usize, rule: &RewriteRule) {
        debug!("Line {}: {} ({})", i + 1, rule.id, rule.action);
        self.report.applied(i + 1, &rule.id, rule.class, rule.action);
    }

    /// Append `pass` when the statement just disabled at `indent` left its
    /// block without active statements and the block ends before `next`
    fn guard_empty_block(&mut self, i: usize, next: usize, ws: &str, indent: usize) {
        let Some(header_indent) = self.out.empty_block(indent) else {
            return;
        };

        let continues = self.infos[next.min(self.infos.len())..]
            .iter()
            .find(|info| info.starts_logical && info.has_code)
            .is_some_and(|info| info.indent > header_indent);
        if continues {
            return;
        }

        self.out.push(format!("{}pass", ws));
        debug!("Line {}: block left empty, inserted pass", i + 1);
        self.report.applied(
            i + 1,
            RuleClass::EmptyBlockGuard.as_str(),
            RuleClass::EmptyBlockGuard,
            RuleAction::CommentOutAndAppendPass,
        );
    }

    /// Indentation for lines injected at the top of the block opened at `i`,
    /// and the unit for nesting below it
    ///
    /// Both come from the first statement of the body; comment and blank
    /// lines in between carry no indentation.
    fn body_whitespace(&self, i: usize) -> (String, String) {
        let header_ws = leading_whitespace(&self.lines[i]);
        let first = self.infos[i + 1..]
            .iter()
            .position(|info| info.starts_logical && info.has_code)
            .map(|k| i + 1 + k)
            .filter(|&j| self.infos[j].indent > self.infos[i].indent);

        match first {
            Some(j) => {
                let body_ws = leading_whitespace(&self.lines[j]);
                let unit = body_ws
                    .strip_prefix(header_ws)
                    .filter(|u| !u.is_empty())
                    .unwrap_or(INDENT_UNIT);
                (body_ws.to_string(), unit.to_string())
            }
            None => {
                let unit = if header_ws.contains('\t') { "\t" } else { INDENT_UNIT };
                (format!("{}{}", header_ws, unit), unit.to_string())
            }
        }
    }
}

fn normalize(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::recipe::report::ReportAction;
    use crate::resolver::FallbackPolicy;

    fn engine() -> PatchEngine {
        PatchEngine::new(RuleCatalog::new(&FallbackPolicy::default()).unwrap())
    }

    fn lines(src: &str) -> Vec<String> {
        src.lines().map(str::to_string).collect()
    }

    #[test]
    fn test_unmatched_lines_pass_through() {
        let input = lines("import os\n\nx = 1\n");
        let result = engine().patch(&input).unwrap();
        assert_eq!(result.lines, input);
        assert!(result.report.is_empty());
    }

    #[test]
    fn test_declaration_disabled_with_trace() {
        let input = lines(
            "class A(ConanFile):\n    name = \"curaengine\"\n    python_requires = \"sentrylibrary/1.0.0\", \"npmpackage/[>=1.0.0]\"\n",
        );
        let result = engine().patch(&input).unwrap();
        assert_eq!(result.lines.len(), 4);
        assert!(result.lines[2].starts_with("    # python_requires commented out"));
        assert_eq!(
            result.lines[3],
            "    # python_requires = \"sentrylibrary/1.0.0\", \"npmpackage/[>=1.0.0]\""
        );
        assert_eq!(result.report.entries()[0].line, 3);
        assert_eq!(result.report.count(RuleClass::DeclarationDisable), 1);
    }

    #[test]
    fn test_two_statement_body_gets_pass() {
        let input = lines(
            r#"class A:
    def init(self):
        base = self.python_requires["sentrylibrary"].module.SentryLibrary
        self.options.update(base.options, base.default_options)

    def other(self):
        return 1
"#,
        );
        let result = engine().patch(&input).unwrap();
        let body: Vec<_> = result.lines[2..6].to_vec();
        assert!(body[0].trim_start().starts_with("# Sentry support disabled"));
        assert!(body[1].trim_start().starts_with("# base = "));
        assert!(body[2].trim_start().starts_with("# self.options.update"));
        assert_eq!(body[3], "        pass");
        assert_eq!(result.report.count(RuleClass::EmptyBlockGuard), 1);
        assert_eq!(result.report.count(RuleClass::InheritanceHook), 1);
    }

    #[test]
    fn test_block_shape_drift_falls_back_to_lines() {
        // blank line inside the body breaks the block pattern
        let input = lines(
            r#"class A:
    def init(self):
        base = self.python_requires["sentrylibrary"].module.SentryLibrary

        self.options.update(base.options, base.default_options)
"#,
        );
        let result = engine().patch(&input).unwrap();
        let ids: Vec<_> = result
            .report
            .entries()
            .iter()
            .map(|e| e.rule_id.as_str())
            .collect();
        assert_eq!(ids, vec!["sentry-init-base", "sentry-init-options", "empty-block-guard"]);
        assert_eq!(result.lines.last().unwrap(), "        pass");
    }

    #[test]
    fn test_pass_only_when_block_ends() {
        let input = lines(
            r#"def configure(self):
    super().configure()
    if self.options.enable_arcus:
        self.options["protobuf"].shared = False
"#,
        );
        let result = engine().patch(&input).unwrap();
        assert_eq!(result.report.count(RuleClass::EmptyBlockGuard), 0);
        assert!(!result.lines.iter().any(|l| l.trim() == "pass"));
    }

    #[test]
    fn test_single_statement_conditional_gets_pass() {
        let input = lines(
            r#"def build(self):
    if self.settings.os == "Windows":
        self.send_sentry_debug_files(binary_basename="CuraEngine")
    cmake = 1
"#,
        );
        let result = engine().patch(&input).unwrap();
        assert_eq!(result.lines[3], "        pass");
        assert_eq!(result.lines[4], "    cmake = 1");
    }

    #[test]
    fn test_loop_injection_matches_header_indent() {
        let input = lines(
            r#"def requirements(self):
    for req in self.conan_data["requirements"]:
        self.requires(req)
    if self.options.enable_arcus:
        for dep in self.conan_data["requirements_arcus"]:
            self.requires(dep)
    if self.options.enable_plugins:
        if True:
            for req in self.conan_data["requirements_plugins"]:
                self.requires(req)
"#,
        );
        let result = engine().patch(&input).unwrap();
        assert_eq!(result.report.count(RuleClass::LoopInjection), 3);

        let guard_at = |header: usize| -> Vec<String> {
            let header_ws = leading_whitespace(&result.lines[header]).len();
            result.lines[header + 1..header + 5]
                .iter()
                .map(|l| {
                    assert!(leading_whitespace(l).len() >= header_ws + 4);
                    l[header_ws + 4..].to_string()
                })
                .collect()
        };
        let first = guard_at(1);
        assert_eq!(first[0], r#"if "@ultimaker" in req:"#);
        assert_eq!(first[3], r#"    req = req.split("@")[0]"#);

        let header_of = |needle: &str| result.lines.iter().position(|l| l.contains(needle)).unwrap();
        let third = guard_at(header_of("requirements_plugins"));
        assert_eq!(first, third);
        let second = guard_at(header_of("requirements_arcus"));
        assert_eq!(second[0], r#"if "@ultimaker" in dep:"#);
    }

    #[test]
    fn test_loop_guard_skips_leading_comment_in_body() {
        let input = lines(
            r#"def requirements(self):
  for req in self.conan_data["requirements"]:
    # public packages first

    self.requires(req)
"#,
        );
        let engine = engine();
        let result = engine.patch(&input).unwrap();
        assert_eq!(
            result.lines[2..6],
            [
                r#"    if "@ultimaker" in req:"#,
                r#"      if req.split("/")[0] in ["scripta"]:"#,
                "        continue",
                r#"      req = req.split("@")[0]"#,
            ]
        );
        assert_eq!(result.lines[6], "    # public packages first");
        assert_eq!(result.lines[8], "    self.requires(req)");

        let again = engine.patch(&result.lines).unwrap();
        assert_eq!(again.lines, result.lines);
        assert!(!again.report.has_changes());
    }

    #[test]
    fn test_loop_guard_in_tab_indented_recipe() {
        let input = lines(
            "class A(ConanFile):\n\tdef requirements(self):\n\t\tfor req in self.conan_data[\"requirements\"]:\n\t\t\t# comment first\n\t\t\tself.requires(req)\n",
        );
        let result = engine().patch(&input).unwrap();
        assert_eq!(
            result.lines[3..7],
            [
                "\t\t\tif \"@ultimaker\" in req:",
                "\t\t\t\tif req.split(\"/\")[0] in [\"scripta\"]:",
                "\t\t\t\t\tcontinue",
                "\t\t\t\treq = req.split(\"@\")[0]",
            ]
        );
        assert_eq!(result.lines[8], "\t\t\tself.requires(req)");
        assert_eq!(result.report.count(RuleClass::LoopInjection), 1);
    }

    #[test]
    fn test_dependency_substitution() {
        let input = lines("def requirements(self):\n    self.requires(\"clipper/6.4.2@ultimaker/stable\")\n");
        let result = engine().patch(&input).unwrap();
        assert!(result.lines[1].starts_with("    # self.requires(\"clipper/6.4.2@ultimaker/stable\")"));
        assert_eq!(result.lines[2], "    self.requires(\"clipper/6.4.2\")");
        assert_eq!(
            result.report.entries()[0].action,
            ReportAction::Applied(RuleAction::SubstituteDependencyDeclaration)
        );
    }

    #[test]
    fn test_residual_marker_flagged() {
        let input = lines("def requirements(self):\n    self.requires(\"arcus/5.4.1@ultimaker/stable\")\n");
        let result = engine().patch(&input).unwrap();
        assert_eq!(result.lines, input);
        let residuals: Vec<_> = result.report.residuals().collect();
        assert_eq!(residuals.len(), 1);
        assert_eq!(residuals[0].line, 2);
        assert!(!result.report.has_changes());
    }

    #[test]
    fn test_comments_and_strings_not_rewritten() {
        let input = lines(
            "def f(self):\n    # super().configure()\n    doc = \"\"\"\n    super().configure()\n    \"\"\"\n",
        );
        let result = engine().patch(&input).unwrap();
        assert_eq!(result.lines, input);
        assert!(!result.report.has_changes());
    }

    #[test]
    fn test_idempotent() {
        let input = lines(
            r#"class A(ConanFile):
    python_requires = "sentrylibrary/1.0.0", "npmpackage/[>=1.0.0]"
    python_requires_extend = "sentrylibrary.SentryLibrary"

    def init(self):
        base = self.python_requires["sentrylibrary"].module.SentryLibrary
        self.options.update(base.options, base.default_options)

    def requirements(self):
        for req in self.conan_data["requirements"]:
            self.requires(req)
        self.requires("clipper/6.4.2@ultimaker/stable")
"#,
        );
        let engine = engine();
        let once = engine.patch(&input).unwrap();
        let twice = engine.patch(&once.lines).unwrap();
        assert_eq!(once.lines, twice.lines);
        assert!(!twice.report.has_changes());
        assert_eq!(twice.report.residuals().count(), 0);
    }

    #[test]
    fn test_existing_guard_with_different_spacing_not_reinjected() {
        let input = lines(
            r#"def requirements(self):
    for req in self.conan_data["requirements"]:
        if "@ultimaker"  in req:
            if req.split("/")[0] in ["scripta"]:
                continue
            req = req.split( "@")[0]
        self.requires(req)
"#,
        );
        let result = engine().patch(&input).unwrap();
        assert_eq!(result.lines, input);
        assert_eq!(result.report.residuals().count(), 0);
    }

    #[test]
    fn test_invalid_input_fails_validation() {
        let input = lines("def f(self):\n    x = (1,\n");
        match engine().patch(&input) {
            Err(Error::Validation { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected validation error, got {:?}", other.map(|r| r.lines)),
        }
    }

    #[test]
    fn test_validation_error_names_input_line() {
        // the injected guard shifts the broken line down by four
        let input = lines(
            "def requirements(self):\n    for req in self.conan_data[\"requirements\"]:\n        self.requires(req)\n    x = (1,\n",
        );
        match engine().patch(&input) {
            Err(Error::Validation { line, message }) => {
                assert_eq!(line, 4);
                assert!(message.contains("line 8 of the rewritten output"), "{}", message);
            }
            other => panic!("expected validation error, got {:?}", other.map(|r| r.lines)),
        }
    }

    #[test]
    fn test_custom_validator_error_propagates() {
        struct Reject;
        impl SyntaxValidator for Reject {
            fn validate(&self, _lines: &[String]) -> Result<()> {
                Err(Error::Validation {
                    line: 7,
                    message: "rejected".to_string(),
                })
            }
        }
        let engine = PatchEngine::with_validator(
            RuleCatalog::new(&FallbackPolicy::default()).unwrap(),
            Reject,
        );
        match engine.patch(&lines("x = 1\n")) {
            Err(Error::Validation { line, message }) => {
                assert_eq!(line, 1);
                assert_eq!(message, "rejected (line 7 of the rewritten output)");
            }
            other => panic!("expected validation error, got {:?}", other.map(|r| r.lines)),
        }
    }
}
