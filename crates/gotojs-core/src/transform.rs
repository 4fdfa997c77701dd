use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use gotojs_contracts::GOTOJS_REPORT_SCHEMA_VERSION;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::diagnostics::{Diagnostic, DiagnosticCode, Severity};
use crate::literal::{LiteralScanner, QuotedLiteralScanner, ShieldToken};
use crate::rewrite::{rewrite, GotoSite, KeywordMatcher, LabelSite, RegexKeywordMatcher};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformOptions {
    /// Fail on warnings as well as errors.
    pub strict: bool,
    /// Pins the literal placeholder instead of deriving it from the clock.
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transformed {
    pub code: String,
    pub diagnostics: Vec<Diagnostic>,
    /// Offsets in both site lists refer to the original source.
    pub labels: Vec<LabelSite>,
    pub gotos: Vec<GotoSite>,
    pub literal_count: usize,
    pub source_sha256: String,
}

impl Transformed {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn to_report_json(&self) -> Value {
        json!({
            "schema_version": GOTOJS_REPORT_SCHEMA_VERSION,
            "source_sha256": self.source_sha256,
            "ok": !self.has_errors(),
            "literal_count": self.literal_count,
            "labels": self.labels,
            "gotos": self.gotos,
            "diagnostics": self
                .diagnostics
                .iter()
                .map(|d| {
                    json!({
                        "code": d.code.code_str(),
                        "phase": d.phase,
                        "severity": d.severity,
                        "message": d.message,
                        "help": d.help,
                        "offset": d.offset,
                    })
                })
                .collect::<Vec<_>>(),
        })
    }
}

/// Best-effort rewrite of `src`: never fails and never reports.
///
/// Diagnostics are dropped; if the rewrite cannot finish, the source comes
/// back untouched.
pub fn transform(src: &str) -> String {
    match analyze(
        src,
        &TransformOptions::default(),
        &QuotedLiteralScanner,
        &RegexKeywordMatcher,
    ) {
        Ok(t) => t.code,
        Err(_) => src.to_string(),
    }
}

pub fn transform_with(src: &str, opts: &TransformOptions) -> Result<Transformed> {
    transform_using(src, opts, &QuotedLiteralScanner, &RegexKeywordMatcher)
}

/// Runs the pipeline with caller-supplied literal and keyword scanners.
///
/// Errors always fail the call; warnings only fail it in strict mode.
pub fn transform_using(
    src: &str,
    opts: &TransformOptions,
    scanner: &dyn LiteralScanner,
    matcher: &dyn KeywordMatcher,
) -> Result<Transformed> {
    let t = analyze(src, opts, scanner, matcher)?;
    let failing: Vec<String> = t
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error || opts.strict)
        .map(|d| d.to_string())
        .collect();
    if !failing.is_empty() {
        anyhow::bail!("{}", failing.join("\n"));
    }
    Ok(t)
}

fn shield_token(src: &str, opts: &TransformOptions) -> Result<ShieldToken> {
    match &opts.token {
        None => Ok(ShieldToken::fresh_for(src)),
        Some(t) => {
            if t.is_empty() || !t.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
                anyhow::bail!("shield token must be a non-empty run of [A-Za-z0-9_], got {t:?}");
            }
            Ok(ShieldToken::new(t.as_str()).avoiding(src))
        }
    }
}

fn analyze(
    src: &str,
    opts: &TransformOptions,
    scanner: &dyn LiteralScanner,
    matcher: &dyn KeywordMatcher,
) -> Result<Transformed> {
    let shielded = scanner.shield(src, shield_token(src, opts)?);
    let rewritten = rewrite(&shielded.text, matcher)?;
    let restored = shielded.restore(&rewritten.text);

    let labels: Vec<LabelSite> = rewritten
        .labels
        .into_iter()
        .map(|l| LabelSite {
            offset: shielded.source_offset(l.offset),
            ..l
        })
        .collect();
    let gotos: Vec<GotoSite> = rewritten
        .gotos
        .into_iter()
        .map(|g| GotoSite {
            offset: shielded.source_offset(g.offset),
            ..g
        })
        .collect();

    let mut diagnostics = Vec::new();

    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    for l in &labels {
        if !l.closed {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::GJS0100UnmatchedBlock,
                    format!("label `{}` is not inside a closed block", l.name),
                )
                .at(l.offset),
            );
        }
        let n = seen.entry(l.name.as_str()).or_insert(0);
        *n += 1;
        if *n == 2 {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::GJS0201DuplicateLabel,
                    format!("label `{}` is declared again", l.name),
                )
                .at(l.offset),
            );
        }
    }

    let declared: BTreeSet<&str> = labels.iter().map(|l| l.name.as_str()).collect();
    for g in &gotos {
        if !declared.contains(g.target.as_str()) {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::GJS0200UndeclaredLabel,
                    format!("goto `{}` has no matching [lbl] declaration", g.target),
                )
                .at(g.offset),
            );
        }
    }

    if restored.unresolved > 0 {
        diagnostics.push(Diagnostic::new(
            DiagnosticCode::GJS0300UnresolvedPlaceholder,
            format!(
                "{} placeholder(s) `{}` left in the output",
                restored.unresolved,
                shielded.token.as_str()
            ),
        ));
    }
    if restored.unused > 0 {
        diagnostics.push(Diagnostic::new(
            DiagnosticCode::GJS0301UnusedLiteral,
            format!("{} literal(s) were not restored", restored.unused),
        ));
    }

    Ok(Transformed {
        code: restored.text,
        diagnostics,
        labels,
        gotos,
        literal_count: shielded.literals.len(),
        source_sha256: crate::util::sha256_hex(src.as_bytes()),
    })
}
