#![no_main]

use gotojs_core::{KeywordMatcher, RegexKeywordMatcher};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let data = if data.len() > 16 * 1024 {
        &data[..16 * 1024]
    } else {
        data
    };

    let Ok(src) = std::str::from_utf8(data) else {
        return;
    };

    let out = gotojs_core::transform(src);

    // Without quotes nothing is shielded: one closing brace per label.
    if !src.contains(['"', '\'']) {
        let labels = RegexKeywordMatcher.labels(src).len();
        assert_eq!(out.matches('}').count(), src.matches('}').count() + labels);
        assert!(RegexKeywordMatcher.first_label(&out).is_none());
    }
});
