// src/recipe/mod.rs

//! Conan recipe patching
//!
//! Rewrites a `conanfile.py` that depends on an unreachable internal package
//! remote so it builds from public sources only:
//! - extension declarations (`python_requires`) are commented out, with a trace
//! - calls into the removed extensions are disabled, with `pass` inserted
//!   wherever that would leave a block empty
//! - requirement loops get a guard that strips the restricted origin qualifier
//! - hardcoded restricted `self.requires(...)` lines are switched to public
//!   equivalents
//!
//! Rewriting is line oriented. A rule only ever sees complete one-line
//! statements (or a fixed window of them), never text inside strings or
//! continuation lines, and the result is validated before anything is
//! written back.
//!
//! # Example
//!
//! ```
//! use conanpatch::recipe::{PatchEngine, RuleCatalog};
//! use conanpatch::resolver::FallbackPolicy;
//!
//! let catalog = RuleCatalog::new(&FallbackPolicy::default()).unwrap();
//! let engine = PatchEngine::new(catalog);
//! let input: Vec<String> = ["def configure(self):", "    super().configure()"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//!
//! let result = engine.patch(&input).unwrap();
//! assert_eq!(result.lines.last().map(String::as_str), Some("    pass"));
//! ```

mod engine;
pub mod lexer;
mod report;
mod rules;
mod source;
mod validate;

pub use engine::{PatchEngine, PatchResult};
pub use report::{PatchReport, ReportAction, ReportEntry};
pub use rules::{LoopGuard, RewriteRule, RuleAction, RuleCatalog, RuleClass, Trigger};
pub use source::{LineEnding, RecipeSource};
pub use validate::{PythonValidator, SyntaxValidator};
