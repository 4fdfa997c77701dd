//! Block locator: the smallest brace-delimited region around an offset.

use serde::Serialize;

/// Braces enclosing an offset.
///
/// `start` is the byte index of the opening `{`, `None` when the backward scan
/// runs off the front of the text. `end` is the byte index of the matching
/// `}`, or `text.len()` when the forward scan runs off the end; either way it
/// is where a closing brace for a wrapper inserted inside the block belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockSpan {
    pub start: Option<usize>,
    pub end: usize,
    pub closed: bool,
}

/// Scans outward from `offset` for the enclosing braces.
///
/// The backward and forward scans count depth independently, so for a label
/// that sits between sibling blocks the two ends need not belong to the same
/// physical block.
pub fn locate_block(offset: usize, text: &str) -> BlockSpan {
    let bytes = text.as_bytes();
    let offset = offset.min(bytes.len());

    let mut start = None;
    let mut depth: i64 = -1;
    let mut i = offset;
    while i > 0 {
        i -= 1;
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => depth -= 1,
            _ => continue,
        }
        if depth == 0 {
            start = Some(i);
            break;
        }
    }

    let mut end = bytes.len();
    let mut closed = false;
    let mut depth: i64 = 1;
    let mut i = offset;
    while i + 1 < bytes.len() {
        i += 1;
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => depth -= 1,
            _ => continue,
        }
        if depth == 0 {
            end = i;
            closed = true;
            break;
        }
    }

    BlockSpan { start, end, closed }
}

#[cfg(test)]
mod tests {
    use super::locate_block;

    #[test]
    fn finds_innermost_block_and_excludes_trailing_text() {
        let text = "before { [lbl] loop: middle } after";
        let span = locate_block(text.find("loop").unwrap(), text);
        let start = span.start.expect("opening brace");
        assert_eq!(&text[start..start + 1], "{");
        assert_eq!(&text[start..=span.end], "{ [lbl] loop: middle }");
        assert!(span.closed);
        assert_eq!(&text[span.end + 1..], " after");
    }

    #[test]
    fn skips_balanced_sibling_blocks() {
        let text = "{ a { b } [lbl] c: { d } e }";
        let span = locate_block(text.find("[lbl]").unwrap(), text);
        assert_eq!(span.start, Some(0));
        assert_eq!(span.end, text.len() - 1);
    }

    #[test]
    fn unmatched_on_both_sides_spans_whole_text() {
        let text = "[lbl] top: y++;";
        let span = locate_block(0, text);
        assert_eq!(span.start, None);
        assert_eq!(span.end, text.len());
        assert!(!span.closed);
    }

    #[test]
    fn label_adjacent_to_braces() {
        let text = "{[lbl] x:}";
        let span = locate_block(1, text);
        assert_eq!(span.start, Some(0));
        assert_eq!(span.end, 9);
    }

    #[test]
    fn scans_are_independent_at_block_edges() {
        // The backward scan climbs past the sibling block and runs off the
        // front, while the forward scan still finds a closing brace.
        let text = "a { b } [lbl] x: c } d";
        let span = locate_block(text.find("[lbl]").unwrap(), text);
        assert_eq!(span.start, None);
        assert!(span.closed);
        assert_eq!(&text[span.end..], "} d");
    }

    #[test]
    fn offset_past_end_is_clamped() {
        let text = "{ x }";
        let span = locate_block(99, text);
        assert_eq!(span.start, None);
        assert_eq!(span.end, text.len());
    }
}
