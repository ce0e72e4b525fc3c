use super::*;

#[test]
fn test_directories_are_recognized() {
    assert!(is_test_path("__tests__/index.js"));
    assert!(is_test_path("src/test/helpers.js"));
    assert!(is_test_path("deep/fixtures/data.json"));
    assert!(!is_test_path("src/index.js"));
    // A file merely named like a test dir is not a test path.
    assert!(!is_test_path("src/tests"));
}

#[test]
fn test_file_names_are_recognized() {
    assert!(is_test_path("src/parser.test.ts"));
    assert!(is_test_path("src/parser.spec.js"));
    assert!(is_test_path("src/app.test.tsx"));
    assert!(is_test_path("src/app.spec.mjs"));
    assert!(!is_test_path("src/latest.js"));
    assert!(!is_test_path("src/test.js"));
}

#[test]
fn classifier_is_stable_across_calls() {
    for path in ["a/test/b.js", "dist/x.min.js", "src/main.ts"] {
        assert_eq!(is_test_path(path), is_test_path(path));
    }
}

#[test]
fn nested_dependency_detection() {
    assert!(is_nested_dependency("node_modules/lodash/index.js"));
    assert!(is_nested_dependency("pkg/node_modules/a/b.js"));
    assert!(!is_nested_dependency("src/node_modules_shim.js"));
}

#[test]
fn declaration_files() {
    assert!(is_declaration_file("dist/index.d.ts"));
    assert!(is_declaration_file("index.d.mts"));
    assert!(is_declaration_file("index.d.cts"));
    assert!(!is_declaration_file("index.ts"));
}

#[test]
fn scannable_source_scope() {
    assert!(is_scannable_source("src/index.js"));
    assert!(is_scannable_source("bin/cli.mjs"));
    assert!(!is_scannable_source("src/index.d.ts"));
    assert!(!is_scannable_source("src/index.test.js"));
    assert!(!is_scannable_source("node_modules/x/index.js"));
    assert!(!is_scannable_source("README.md"));
}

#[test]
fn build_artifact_heuristic() {
    let repo: BTreeSet<String> = ["src/index.ts", "util.ts"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    assert!(is_expected_build_artifact("dist/bundle.js", &repo));
    assert!(is_expected_build_artifact("lib/anything.txt", &repo));
    assert!(is_expected_build_artifact("index.d.ts", &repo));
    assert!(is_expected_build_artifact("bundle.js.map", &repo));
    assert!(is_expected_build_artifact("native/addon.node", &repo));
    // Compiled twin with a src/ prefix in the repo.
    assert!(is_expected_build_artifact("index.js", &repo));
    // Compiled twin without a prefix.
    assert!(is_expected_build_artifact("util.js", &repo));
    // No twin anywhere: unexpected.
    assert!(!is_expected_build_artifact("loader.js", &repo));
    assert!(!is_expected_build_artifact("data/raw.txt", &repo));
}
