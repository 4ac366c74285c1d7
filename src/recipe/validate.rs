// src/recipe/validate.rs

//! Post-rewrite syntax validation
//!
//! The patch engine never writes a recipe it cannot show to be well formed.
//! [`PythonValidator`] checks the properties a line-oriented rewrite can break:
//! string and bracket termination, consistent indentation, and that every
//! block header is followed by an indented body.
//!
//! Indentation is measured twice, with tabs as eight columns and as one. A
//! line whose two measurements order differently against the enclosing
//! blocks depends on the tab size and is rejected, as Python does.

use crate::error::{Error, Result};
use crate::recipe::lexer::{LineInfo, LineScanner};

const TAB_ERROR: &str = "inconsistent use of tabs and spaces in indentation";

/// Checks rewritten recipe text before it is written back
pub trait SyntaxValidator {
    /// `Err(Error::Validation { .. })` with the first offending line
    fn validate(&self, lines: &[String]) -> Result<()>;
}

/// Block-structure validator for Python source
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonValidator;

impl SyntaxValidator for PythonValidator {
    fn validate(&self, lines: &[String]) -> Result<()> {
        let mut scanner = LineScanner::new();
        // (tab = 8, tab = 1) columns of each open block
        let mut indents: Vec<(usize, usize)> = vec![(0, 0)];
        let mut pending_header: Option<usize> = None;

        for line in lines {
            let info = scanner.scan(line);

            if info.starts_logical && info.has_code {
                let (top, top_alt) = indents.last().copied().unwrap_or((0, 0));
                if let Some(header) = pending_header.take() {
                    if info.indent <= top {
                        let message = format!("expected an indented block after line {}", header);
                        return Err(invalid(&info, message));
                    }
                    if info.alt_indent <= top_alt {
                        return Err(invalid(&info, TAB_ERROR));
                    }
                    indents.push((info.indent, info.alt_indent));
                } else if info.indent > top {
                    return Err(invalid(&info, "unexpected indent"));
                } else {
                    while indents.last().is_some_and(|&(i, _)| i > info.indent) {
                        indents.pop();
                    }
                    match indents.last() {
                        Some(&(indent, alt)) if indent == info.indent => {
                            if alt != info.alt_indent {
                                return Err(invalid(&info, TAB_ERROR));
                            }
                        }
                        _ => {
                            return Err(invalid(
                                &info,
                                "unindent does not match any outer indentation level",
                            ));
                        }
                    }
                }
            }

            if let Some(issue) = scanner.issues().first() {
                return Err(Error::Validation {
                    line: issue.line,
                    message: issue.message.clone(),
                });
            }

            if info.opens_block {
                pending_header = Some(info.number);
            }
        }

        if let Some(issue) = scanner.finish().first() {
            return Err(Error::Validation {
                line: issue.line,
                message: issue.message.clone(),
            });
        }

        if let Some(header) = pending_header {
            return Err(Error::Validation {
                line: lines.len(),
                message: format!("expected an indented block after line {}", header),
            });
        }

        Ok(())
    }
}

fn invalid(info: &LineInfo, message: impl Into<String>) -> Error {
    Error::Validation {
        line: info.number,
        message: message.into(),
    }
}
