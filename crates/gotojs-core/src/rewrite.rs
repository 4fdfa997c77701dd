//! Rewrite engine: `goto` to `continue`, `[lbl]` to a guarded `while` loop.
//!
//! Gotos are rewritten in one global pass. Labels are then handled one at a
//! time: each iteration finds the first remaining marker in the current
//! buffer, locates its enclosing block in that same buffer, swaps the marker
//! for the loop preamble and closes the loop just before the block's `}`.
//! Recomputing the span on every iteration keeps the offsets valid without an
//! offset-translation table, so the loop is inherently sequential.

use std::ops::Range;
use std::sync::OnceLock;

use anyhow::Result;
use gotojs_contracts::SENTINEL_PREFIX;
use regex::Regex;
use serde::Serialize;

use crate::block::locate_block;
use crate::diagnostics::{Diagnostic, DiagnosticCode};

/// One keyword occurrence: where it sits and the identifier it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub range: Range<usize>,
    pub name: String,
}

/// Finds label and goto markers in shielded text.
pub trait KeywordMatcher {
    fn first_label(&self, text: &str) -> Option<Marker>;
    /// All label markers, left to right.
    fn labels(&self, text: &str) -> Vec<Marker>;
    /// All goto markers, left to right and non-overlapping.
    fn gotos(&self, text: &str) -> Vec<Marker>;
}

/// `[lbl] <name>:` and `goto <name>;`, case-insensitive, ASCII identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexKeywordMatcher;

fn label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\[lbl\]\s+([A-Za-z0-9_]+)\s*:").expect("label pattern"))
}

fn goto_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)goto\s+([A-Za-z0-9_]+)\s*;").expect("goto pattern"))
}

fn marker(caps: regex::Captures<'_>) -> Marker {
    let whole = caps.get(0).map_or(0..0, |m| m.range());
    let name = caps.get(1).map_or("", |m| m.as_str()).to_string();
    Marker { range: whole, name }
}

impl KeywordMatcher for RegexKeywordMatcher {
    fn first_label(&self, text: &str) -> Option<Marker> {
        label_re().captures(text).map(marker)
    }

    fn labels(&self, text: &str) -> Vec<Marker> {
        label_re().captures_iter(text).map(marker).collect()
    }

    fn gotos(&self, text: &str) -> Vec<Marker> {
        goto_re().captures_iter(text).map(marker).collect()
    }
}

pub fn sentinel(name: &str) -> String {
    format!("{SENTINEL_PREFIX}{name}")
}

fn jump(name: &str) -> String {
    let flag = sentinel(name);
    format!("{flag} = false;\n continue {name};")
}

fn loop_preamble(name: &str) -> String {
    let flag = sentinel(name);
    format!("var {flag} = false;\n{name}: while(!{flag}){{\n {flag} = true;\n")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelSite {
    pub name: String,
    /// Byte offset of the marker in the text handed to [`rewrite`].
    pub offset: usize,
    /// False when no enclosing `}` was found and the loop closes at the end.
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GotoSite {
    pub target: String,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub text: String,
    pub labels: Vec<LabelSite>,
    pub gotos: Vec<GotoSite>,
}

/// Replaces every goto marker in a single pass.
pub fn rewrite_gotos(text: &str, matcher: &dyn KeywordMatcher) -> (String, Vec<GotoSite>) {
    let mut out = String::with_capacity(text.len());
    let mut sites = Vec::new();
    let mut last = 0;
    for m in matcher.gotos(text) {
        out.push_str(&text[last..m.range.start]);
        out.push_str(&jump(&m.name));
        last = m.range.end;
        sites.push(GotoSite {
            target: m.name,
            offset: m.range.start,
        });
    }
    out.push_str(&text[last..]);
    (out, sites)
}

/// Expands the first label marker of `buf` and closes its loop.
fn expand_label(buf: &str, m: &Marker) -> (String, bool) {
    let span = locate_block(m.range.start, buf);
    let preamble = loop_preamble(&m.name);

    // Everything after the marker moved by the preamble/marker length delta.
    let close_at = span.end.max(m.range.end) - m.range.len() + preamble.len();

    let mut next = String::with_capacity(buf.len() + preamble.len() + 1);
    next.push_str(&buf[..m.range.start]);
    next.push_str(&preamble);
    next.push_str(&buf[m.range.end..]);
    next.insert(close_at, '}');
    (next, span.closed)
}

pub fn rewrite(text: &str, matcher: &dyn KeywordMatcher) -> Result<Rewritten> {
    // Goto replacements never contain a label marker, so the declared set is
    // the same before and after the goto pass.
    let declared = matcher.labels(text);
    let (mut buf, gotos) = rewrite_gotos(text, matcher);

    let mut pending = declared.into_iter();
    let mut labels = Vec::new();
    while let Some(m) = matcher.first_label(&buf) {
        let Some(origin) = pending.next() else {
            anyhow::bail!(
                "{}",
                Diagnostic::new(
                    DiagnosticCode::GJS0901LabelLoopStalled,
                    format!(
                        "label `{}` still present after {} expansions",
                        m.name,
                        labels.len()
                    ),
                )
                .at(m.range.start)
            );
        };
        let (next, closed) = expand_label(&buf, &m);
        buf = next;
        labels.push(LabelSite {
            name: m.name,
            offset: origin.range.start,
            closed,
        });
    }

    Ok(Rewritten {
        text: buf,
        labels,
        gotos,
    })
}
