use std::path::PathBuf;

use gotojs_core::{transform_with, DiagnosticCode, TransformOptions};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../tests/gotojs/fixtures")
        .canonicalize()
        .expect("fixtures dir")
}

fn load(name: &str) -> (String, String) {
    let dir = fixtures_dir();
    let src = std::fs::read_to_string(dir.join(format!("{name}.gjs"))).expect("read fixture");
    let expected =
        std::fs::read_to_string(dir.join(format!("{name}.expected.js"))).expect("read expected");
    (src, expected)
}

fn run(name: &str) -> gotojs_core::Transformed {
    let (src, expected) = load(name);
    let t = transform_with(&src, &TransformOptions::default()).expect("transform ok");
    assert_eq!(t.code, expected, "fixture {name} drifted");
    t
}

#[test]
fn countdown_fixture() {
    let t = run("countdown");
    assert_eq!(t.labels.len(), 1);
    assert!(t.labels[0].closed);
    assert_eq!(t.literal_count, 2);
    assert!(t.diagnostics.is_empty());
}

#[test]
fn nested_fixture_keeps_string_lookalikes() {
    let t = run("nested");
    let names: Vec<&str> = t.labels.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["row", "col"]);
    assert!(t.code.contains(r#"=== "goto row;""#));
    assert!(t.code.contains("'skipping [lbl] markers in strings'"));
    assert!(t.diagnostics.is_empty());
}

#[test]
fn toplevel_fixture_closes_at_end_of_file() {
    let t = run("toplevel");
    assert!(t.code.ends_with("}\n}"));
    assert_eq!(t.diagnostics.len(), 1);
    assert_eq!(t.diagnostics[0].code, DiagnosticCode::GJS0100UnmatchedBlock);
}

#[test]
fn every_fixture_is_balanced_and_marker_free() {
    for entry in std::fs::read_dir(fixtures_dir()).expect("read fixtures dir") {
        let path = entry.expect("dir entry").path();
        if path.extension().and_then(|e| e.to_str()) != Some("gjs") {
            continue;
        }
        let src = std::fs::read_to_string(&path).expect("read fixture");
        let out = gotojs_core::transform(&src);
        let labels = src.matches("[lbl]").count() - src.matches("[lbl] markers").count();
        assert_eq!(
            out.matches('}').count(),
            src.matches('}').count() + labels,
            "{}",
            path.display()
        );
        assert_eq!(out.matches('{').count(), out.matches('}').count());
    }
}
