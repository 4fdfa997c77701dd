//! Literal shield: hides quoted string contents from keyword matching.
//!
//! Every single- or double-quoted literal is swapped for one opaque
//! placeholder token and kept aside in order of appearance. After the rewrite
//! passes the placeholders are replaced, left to right, by the saved literals.

use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use regex::Regex;

/// The opaque placeholder that stands in for each shielded literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShieldToken(String);

impl ShieldToken {
    pub fn new(token: impl Into<String>) -> Self {
        ShieldToken(token.into())
    }

    /// `_<unix millis>`, the same shape the token has always had.
    pub fn from_clock() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        ShieldToken(format!("_{millis}"))
    }

    /// A clock token that does not occur anywhere in `src`.
    pub fn fresh_for(src: &str) -> Self {
        Self::from_clock().avoiding(src)
    }

    /// Extends the token with a numeric suffix until `src` no longer contains it.
    pub fn avoiding(self, src: &str) -> Self {
        if !src.contains(&self.0) {
            return self;
        }
        let mut n: u64 = 0;
        loop {
            let candidate = format!("{}_{n}", self.0);
            if !src.contains(&candidate) {
                return ShieldToken(candidate);
            }
            n += 1;
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Source text with its literals lifted out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shielded {
    pub text: String,
    pub token: ShieldToken,
    pub literals: Vec<String>,
    /// `(shielded, source)` byte offsets just past each placeholder/literal.
    pub anchors: Vec<(usize, usize)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restored {
    pub text: String,
    /// Placeholders that had no literal left to take their place.
    pub unresolved: usize,
    /// Literals that no placeholder asked for.
    pub unused: usize,
}

impl Shielded {
    /// Maps an offset in the shielded text back to the original source.
    pub fn source_offset(&self, offset: usize) -> usize {
        let idx = self.anchors.partition_point(|&(shielded, _)| shielded <= offset);
        match idx.checked_sub(1).map(|i| self.anchors[i]) {
            Some((shielded, source)) => offset - shielded + source,
            None => offset,
        }
    }

    /// Puts the literals back into `text`, consuming them first-in first-out.
    pub fn restore(&self, text: &str) -> Restored {
        let token = self.token.as_str();
        let mut out = String::with_capacity(text.len());
        let mut literals = self.literals.iter();
        let mut unresolved = 0;
        let mut rest = text;
        if !token.is_empty() {
            while let Some(pos) = rest.find(token) {
                out.push_str(&rest[..pos]);
                match literals.next() {
                    Some(lit) => out.push_str(lit),
                    None => {
                        out.push_str(token);
                        unresolved += 1;
                    }
                }
                rest = &rest[pos + token.len()..];
            }
        }
        out.push_str(rest);
        Restored {
            text: out,
            unresolved,
            unused: literals.count(),
        }
    }
}

/// Finds string literals in raw source.
pub trait LiteralScanner {
    fn shield(&self, src: &str, token: ShieldToken) -> Shielded;
}

/// Regex approximation of quoted literals: the closing quote is the next
/// matching quote not written as `\"` or `\'`. Literals do not span lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuotedLiteralScanner;

fn literal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""(?:\\"|.)*?"|'(?:\\'|.)*?'"#).expect("literal pattern"))
}

impl LiteralScanner for QuotedLiteralScanner {
    fn shield(&self, src: &str, token: ShieldToken) -> Shielded {
        let mut text = String::with_capacity(src.len());
        let mut literals = Vec::new();
        let mut anchors = Vec::new();
        let mut last = 0;
        for m in literal_re().find_iter(src) {
            text.push_str(&src[last..m.start()]);
            text.push_str(token.as_str());
            anchors.push((text.len(), m.end()));
            literals.push(m.as_str().to_string());
            last = m.end();
        }
        text.push_str(&src[last..]);
        Shielded {
            text,
            token,
            literals,
            anchors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LiteralScanner, QuotedLiteralScanner, ShieldToken};

    fn shield(src: &str) -> super::Shielded {
        QuotedLiteralScanner.shield(src, ShieldToken::new("@@S@@"))
    }

    #[test]
    fn lifts_both_quote_styles_in_order() {
        let s = shield(r#"a = "x"; b = 'y z'; c = "it's";"#);
        assert_eq!(s.text, "a = @@S@@; b = @@S@@; c = @@S@@;");
        assert_eq!(s.literals, vec![r#""x""#, "'y z'", r#""it's""#]);
    }

    #[test]
    fn escaped_quote_does_not_end_literal() {
        let s = shield(r#"s = "say \"goto top;\""; t;"#);
        assert_eq!(s.literals, vec![r#""say \"goto top;\"""#]);
        assert_eq!(s.text, "s = @@S@@; t;");
    }

    #[test]
    fn empty_literals_stay_separate() {
        let s = shield(r#"f("", "b")"#);
        assert_eq!(s.literals, vec![r#""""#, r#""b""#]);
        assert_eq!(s.text, "f(@@S@@, @@S@@)");
    }

    #[test]
    fn no_literals_is_identity() {
        let src = "x++; { y--; }";
        let s = shield(src);
        assert_eq!(s.text, src);
        assert!(s.literals.is_empty());
    }

    #[test]
    fn shield_then_restore_reproduces_source() {
        let src = "var a = 'one', b = \"two\";\nprint(a + \"[lbl] x:\" + 'goto y;');";
        let s = shield(src);
        let r = s.restore(&s.text);
        assert_eq!(r.text, src);
        assert_eq!((r.unresolved, r.unused), (0, 0));
    }

    #[test]
    fn restore_counts_mismatches() {
        let s = shield("'a'");
        let r = s.restore("@@S@@ @@S@@");
        assert_eq!(r.text, "'a' @@S@@");
        assert_eq!(r.unresolved, 1);

        let r = s.restore("nothing here");
        assert_eq!(r.unused, 1);
    }

    #[test]
    fn offsets_map_back_across_placeholders() {
        let src = r#"a("long literal"); [lbl] x:"#;
        let s = shield(src);
        let at = s.text.find("[lbl]").unwrap();
        assert_eq!(s.source_offset(at), src.find("[lbl]").unwrap());
        assert_eq!(s.source_offset(1), 1);
    }

    #[test]
    fn token_avoids_existing_text() {
        let t = ShieldToken::new("_42").avoiding("var _42 = 1; var _42_0;");
        assert_eq!(t.as_str(), "_42_1");
        let t = ShieldToken::from_clock();
        assert!(t.as_str().starts_with('_'));
        assert!(t.as_str()[1..].chars().all(|c| c.is_ascii_digit()));
    }
}
