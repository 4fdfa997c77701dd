//! Load-time rewriting of `goto`/`[lbl]` pseudo-statements into labeled
//! `while` loops and `continue` statements.
//!
//! The pipeline is: shield string literals, rewrite gotos, expand labels one
//! at a time against the freshly mutated buffer, restore the literals.

pub mod block;
pub mod diagnostics;
pub mod hook;
pub mod literal;
pub mod rewrite;
pub mod transform;

mod util;

pub use block::{locate_block, BlockSpan};
pub use diagnostics::{Diagnostic, DiagnosticCode, Phase, Severity};
pub use hook::{GotoHook, HookRegistry, SourceHook};
pub use literal::{LiteralScanner, QuotedLiteralScanner, ShieldToken, Shielded};
pub use rewrite::{KeywordMatcher, RegexKeywordMatcher};
pub use transform::{transform, transform_using, transform_with, TransformOptions, Transformed};
