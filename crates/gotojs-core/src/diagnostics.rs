use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    Shield,
    Locate,
    Rewrite,
    Restore,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiagnosticCode {
    GJS0100UnmatchedBlock,
    GJS0200UndeclaredLabel,
    GJS0201DuplicateLabel,
    GJS0300UnresolvedPlaceholder,
    GJS0301UnusedLiteral,
    GJS0901LabelLoopStalled,
}

impl DiagnosticCode {
    pub fn code_str(self) -> &'static str {
        match self {
            DiagnosticCode::GJS0100UnmatchedBlock => "GJS0100",
            DiagnosticCode::GJS0200UndeclaredLabel => "GJS0200",
            DiagnosticCode::GJS0201DuplicateLabel => "GJS0201",
            DiagnosticCode::GJS0300UnresolvedPlaceholder => "GJS0300",
            DiagnosticCode::GJS0301UnusedLiteral => "GJS0301",
            DiagnosticCode::GJS0901LabelLoopStalled => "GJS0901",
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            DiagnosticCode::GJS0100UnmatchedBlock => "label has no enclosing closing brace",
            DiagnosticCode::GJS0200UndeclaredLabel => "goto targets a label that is never declared",
            DiagnosticCode::GJS0201DuplicateLabel => "label is declared more than once",
            DiagnosticCode::GJS0300UnresolvedPlaceholder => {
                "string placeholder left without a literal to restore"
            }
            DiagnosticCode::GJS0301UnusedLiteral => "shielded literal was never restored",
            DiagnosticCode::GJS0901LabelLoopStalled => "label rewrite loop made no progress",
        }
    }

    pub fn default_help(self) -> Option<&'static str> {
        match self {
            DiagnosticCode::GJS0100UnmatchedBlock => {
                Some("The loop for this label is closed at the end of the source.")
            }
            DiagnosticCode::GJS0200UndeclaredLabel => Some(
                "The emitted `continue` has no matching loop label; the host will reject it.",
            ),
            DiagnosticCode::GJS0201DuplicateLabel => Some(
                "Each declaration emits `var goto_function_<name>`; rename one of the labels.",
            ),
            DiagnosticCode::GJS0901LabelLoopStalled => Some(
                "This is a bug in gotojs. Please report it with the input source file.",
            ),
            _ => None,
        }
    }

    pub fn default_severity(self) -> Severity {
        match self {
            DiagnosticCode::GJS0100UnmatchedBlock
            | DiagnosticCode::GJS0200UndeclaredLabel
            | DiagnosticCode::GJS0201DuplicateLabel => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn default_phase(self) -> Phase {
        match self {
            DiagnosticCode::GJS0100UnmatchedBlock => Phase::Locate,
            DiagnosticCode::GJS0200UndeclaredLabel | DiagnosticCode::GJS0201DuplicateLabel => {
                Phase::Rewrite
            }
            DiagnosticCode::GJS0300UnresolvedPlaceholder | DiagnosticCode::GJS0301UnusedLiteral => {
                Phase::Restore
            }
            DiagnosticCode::GJS0901LabelLoopStalled => Phase::Internal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub phase: Phase,
    pub severity: Severity,
    pub message: String,
    pub help: Option<String>,
    /// Byte offset into the original source, when the problem has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Diagnostic {
            code,
            phase: code.default_phase(),
            severity: code.default_severity(),
            message: message.into(),
            help: code.default_help().map(|s| s.to_string()),
            offset: None,
        }
    }

    pub fn at(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?} {:?}: {}",
            self.code.code_str(),
            self.phase,
            self.severity,
            self.message
        )?;
        if let Some(offset) = self.offset {
            write!(f, " (at byte {offset})")?;
        }
        if let Some(help) = &self.help {
            write!(f, "\n  help: {help}")?;
        }
        Ok(())
    }
}

pub fn render_diagnostics_md() -> String {
    let mut rows: Vec<(&'static str, Phase, Severity, &'static str, &'static str)> = all_codes()
        .iter()
        .map(|&code| {
            (
                code.code_str(),
                code.default_phase(),
                code.default_severity(),
                code.default_message(),
                code.default_help().unwrap_or(""),
            )
        })
        .collect();
    rows.sort_by(|a, b| a.0.cmp(b.0));

    let mut out = String::new();
    out.push_str("# gotojs diagnostics catalog\n\n");
    out.push_str("This document is generated from `crates/gotojs-core/src/diagnostics.rs`.\n\n");
    out.push_str("| Code | Phase | Severity | Message | Help |\n");
    out.push_str("| ---- | ----- | -------- | ------- | ---- |\n");
    for (code, phase, sev, msg, help) in rows {
        out.push_str(&format!(
            "| {code} | {phase:?} | {sev:?} | {msg} | {help} |\n"
        ));
    }
    out
}

fn all_codes() -> &'static [DiagnosticCode] {
    &[
        DiagnosticCode::GJS0100UnmatchedBlock,
        DiagnosticCode::GJS0200UndeclaredLabel,
        DiagnosticCode::GJS0201DuplicateLabel,
        DiagnosticCode::GJS0300UnresolvedPlaceholder,
        DiagnosticCode::GJS0301UnusedLiteral,
        DiagnosticCode::GJS0901LabelLoopStalled,
    ]
}

#[cfg(test)]
mod tests {
    use super::{render_diagnostics_md, Diagnostic, DiagnosticCode, Severity};

    #[test]
    fn display_includes_offset_and_help() {
        let d = Diagnostic::new(DiagnosticCode::GJS0200UndeclaredLabel, "goto `nowhere`").at(12);
        assert_eq!(d.severity, Severity::Warning);
        let s = d.to_string();
        assert!(s.starts_with("GJS0200 Rewrite Warning: goto `nowhere` (at byte 12)"), "{s}");
        assert!(s.contains("\n  help: "), "{s}");
    }

    #[test]
    fn catalog_lists_every_code_once() {
        let md = render_diagnostics_md();
        for code in super::all_codes() {
            assert_eq!(md.matches(code.code_str()).count(), 1, "{}", code.code_str());
        }
    }
}
