// src/recipe/lexer.rs

//! Physical-line scanner for Python recipes
//!
//! Tracks just enough lexical state across lines to tell where logical lines
//! start and end: open string literals (including triple-quoted ones), bracket
//! nesting, backslash continuations and comments. It does not tokenize
//! expressions.

/// Indentation width of a tab, as the Python tokenizer counts it
const TAB_WIDTH: usize = 8;

/// A lexical problem found while scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    pub line: usize,
    pub message: String,
}

/// What the scanner learned about one physical line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineInfo {
    /// 1-based line number
    pub number: usize,
    /// The line begins a new logical line
    pub starts_logical: bool,
    /// The logical line is complete at the end of this physical line
    pub ends_logical: bool,
    /// Anything besides whitespace and comments on this line
    pub has_code: bool,
    /// Indentation (in columns) of the logical line this line belongs to
    pub indent: usize,
    /// Same indentation with tabs counted as one column
    pub alt_indent: usize,
    /// The completed logical line ends with `:` and opens an indented block
    pub opens_block: bool,
}

impl LineInfo {
    /// A complete one-line statement
    pub fn is_simple_statement(&self) -> bool {
        self.starts_logical && self.ends_logical && self.has_code
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenString {
    quote: char,
    triple: bool,
    line: usize,
}

/// Incremental scanner; feed lines in order
#[derive(Debug, Default)]
pub struct LineScanner {
    line_no: usize,
    string: Option<OpenString>,
    brackets: Vec<(char, usize)>,
    continuation: bool,
    logical_indent: usize,
    logical_alt_indent: usize,
    last_code_char: Option<char>,
    issues: Vec<SyntaxIssue>,
}

impl LineScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the next physical line (without its line terminator)
    pub fn scan(&mut self, line: &str) -> LineInfo {
        self.line_no += 1;
        let starts_logical = self.string.is_none() && self.brackets.is_empty() && !self.continuation;
        self.continuation = false;

        if starts_logical {
            self.logical_indent = indent_width(line);
            self.logical_alt_indent = column(line, 1);
            self.last_code_char = None;
        }

        let chars: Vec<char> = line.chars().collect();
        let mut has_code = self.string.is_some();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if let Some(open) = self.string {
                if c == '\\' {
                    if i + 1 == chars.len() {
                        // escaped newline keeps the literal open
                        self.continuation = !open.triple;
                    }
                    i += 2;
                    continue;
                }
                if c == open.quote {
                    if !open.triple {
                        self.string = None;
                        self.last_code_char = Some(c);
                    } else if chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c) {
                        self.string = None;
                        self.last_code_char = Some(c);
                        i += 3;
                        continue;
                    }
                }
                i += 1;
                continue;
            }

            match c {
                '#' => break,
                '"' | '\'' => {
                    has_code = true;
                    let triple = chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c);
                    self.string = Some(OpenString {
                        quote: c,
                        triple,
                        line: self.line_no,
                    });
                    self.last_code_char = Some(c);
                    i += if triple { 3 } else { 1 };
                    continue;
                }
                '(' | '[' | '{' => {
                    has_code = true;
                    self.brackets.push((c, self.line_no));
                    self.last_code_char = Some(c);
                }
                ')' | ']' | '}' => {
                    has_code = true;
                    self.close_bracket(c);
                    self.last_code_char = Some(c);
                }
                '\\' if i + 1 == chars.len() => {
                    self.continuation = true;
                }
                c if c.is_whitespace() => {}
                c => {
                    has_code = true;
                    self.last_code_char = Some(c);
                }
            }
            i += 1;
        }

        // A single-quoted literal cannot span lines without an escaped newline
        if let Some(open) = self.string {
            if !open.triple && !self.continuation {
                self.issues.push(SyntaxIssue {
                    line: open.line,
                    message: format!("unterminated string literal (detected at line {})", self.line_no),
                });
                self.string = None;
            }
        }

        let ends_logical = self.string.is_none() && self.brackets.is_empty() && !self.continuation;
        LineInfo {
            number: self.line_no,
            starts_logical,
            ends_logical,
            has_code,
            indent: self.logical_indent,
            alt_indent: self.logical_alt_indent,
            opens_block: ends_logical && self.last_code_char == Some(':'),
        }
    }

    fn close_bracket(&mut self, close: char) {
        let expected = match close {
            ')' => '(',
            ']' => '[',
            _ => '{',
        };
        match self.brackets.pop() {
            Some((open, _)) if open == expected => {}
            Some((open, line)) => {
                let message = if line == self.line_no {
                    format!("closing parenthesis '{}' does not match opening parenthesis '{}'", close, open)
                } else {
                    format!(
                        "closing parenthesis '{}' does not match opening parenthesis '{}' on line {}",
                        close, open, line
                    )
                };
                self.issues.push(SyntaxIssue {
                    line: self.line_no,
                    message,
                });
            }
            None => self.issues.push(SyntaxIssue {
                line: self.line_no,
                message: format!("unmatched '{}'", close),
            }),
        }
    }

    /// Issues found so far, oldest first
    pub fn issues(&self) -> &[SyntaxIssue] {
        &self.issues
    }

    /// Report constructs left open at end of input
    pub fn finish(&mut self) -> &[SyntaxIssue] {
        if let Some(open) = self.string.take() {
            let message = if open.triple {
                format!(
                    "unterminated triple-quoted string literal (detected at line {})",
                    self.line_no
                )
            } else {
                format!("unterminated string literal (detected at line {})", self.line_no)
            };
            self.issues.push(SyntaxIssue {
                line: open.line,
                message,
            });
        }
        if let Some(&(open, line)) = self.brackets.first() {
            self.issues.push(SyntaxIssue {
                line,
                message: format!("'{}' was never closed", open),
            });
            self.brackets.clear();
        }
        if self.continuation {
            self.issues.push(SyntaxIssue {
                line: self.line_no,
                message: "unexpected EOF while parsing".to_string(),
            });
            self.continuation = false;
        }
        &self.issues
    }
}

/// Column width of the leading whitespace
pub fn indent_width(line: &str) -> usize {
    column(line, TAB_WIDTH)
}

fn column(line: &str, tab: usize) -> usize {
    let mut width = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width = (width / tab + 1) * tab,
            '\x0c' => width = 0,
            _ => break,
        }
    }
    width
}

/// The leading whitespace of a line, verbatim
pub fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// Scan a whole file
pub fn scan_lines<S: AsRef<str>>(lines: &[S]) -> Vec<LineInfo> {
    let mut scanner = LineScanner::new();
    lines.iter().map(|l| scanner.scan(l.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_statements() {
        let infos = scan_lines(&["x = 1", "    y = 'a # not a comment'  # comment"]);
        assert!(infos[0].is_simple_statement());
        assert_eq!(infos[1].indent, 4);
        assert!(infos[1].is_simple_statement());
        assert!(!infos[1].opens_block);
    }

    #[test]
    fn test_block_header() {
        let infos = scan_lines(&["def init(self):  # hook", "if x: pass", "d = {'a': 1}"]);
        assert!(infos[0].opens_block);
        assert!(!infos[1].opens_block);
        assert!(!infos[2].opens_block);
    }

    #[test]
    fn test_bracket_continuation() {
        let infos = scan_lines(&[
            "    copy(self, \"*\", a,",
            "         b)",
            "    if (a and",
            "            b):",
        ]);
        assert!(infos[0].starts_logical && !infos[0].ends_logical);
        assert!(!infos[1].starts_logical && infos[1].ends_logical);
        assert_eq!(infos[1].indent, 4);
        assert!(infos[3].opens_block);
        assert_eq!(infos[3].indent, 4);
    }

    #[test]
    fn test_triple_quoted_string() {
        let infos = scan_lines(&["    \"\"\"", "    Docs: with a colon:", "    \"\"\"", "    pass"]);
        assert!(!infos[0].ends_logical);
        assert!(!infos[1].starts_logical);
        assert!(infos[2].ends_logical);
        assert!(!infos[2].opens_block);
        assert!(infos[3].starts_logical);
    }

    #[test]
    fn test_backslash_continuation() {
        let infos = scan_lines(&["x = 1 + \\", "        2", "y = 3"]);
        assert!(!infos[0].ends_logical);
        assert!(!infos[1].starts_logical);
        assert!(infos[2].starts_logical);
    }

    #[test]
    fn test_escaped_quote() {
        let infos = scan_lines(&[r#"s = "say \"hi\"""#, "t = 1"]);
        assert!(infos[0].ends_logical);
        assert!(infos[1].starts_logical);
    }

    #[test]
    fn test_issues() {
        let mut scanner = LineScanner::new();
        scanner.scan("s = 'open");
        assert_eq!(scanner.issues().len(), 1);
        assert_eq!(scanner.issues()[0].line, 1);

        let mut scanner = LineScanner::new();
        scanner.scan("x = (1, 2]");
        assert!(scanner.issues()[0].message.contains("does not match"));

        let mut scanner = LineScanner::new();
        scanner.scan("x = foo(");
        let issues = scanner.finish();
        assert_eq!(issues[0].message, "'(' was never closed");
    }

    #[test]
    fn test_indent_width() {
        assert_eq!(indent_width("    x"), 4);
        assert_eq!(indent_width("\tx"), 8);
        assert_eq!(indent_width("  \tx"), 8);
        assert_eq!(column("  \tx", 1), 3);
        let infos = scan_lines(&["\t\tx = 1", "        y = 2"]);
        assert_eq!((infos[0].indent, infos[0].alt_indent), (16, 2));
        assert_eq!((infos[1].indent, infos[1].alt_indent), (8, 8));
        assert_eq!(leading_whitespace("\t  x = 1"), "\t  ");
    }
}
