//! Pure path predicates shared by the file-walking scanners and the diff
//! engine. All inputs are artifact-relative, forward-slash paths.

use std::collections::BTreeSet;

/// Directory segments that mark test-only code.
const TEST_DIR_SEGMENTS: [&str; 6] = [
    "__tests__",
    "tests",
    "test",
    "fixtures",
    "__fixtures__",
    "__mocks__",
];

/// Nested-dependency directory name used by the npm ecosystem.
pub const NESTED_DEPENDENCY_DIR: &str = "node_modules";

/// Top-level directories the diff engine treats as build output.
const BUILD_OUTPUT_DIRS: [&str; 9] = [
    "dist",
    "lib",
    "build",
    ".next",
    "out",
    "prebuilds",
    "compiled",
    "esm",
    "cjs",
];

/// Extensions of files that cannot be source-reviewed.
pub const NATIVE_BINARY_EXTENSIONS: [&str; 7] =
    ["node", "so", "dll", "dylib", "exe", "bin", "wasm"];

/// Extensions the code-execution scanners consider source code.
pub const SOURCE_EXTENSIONS: [&str; 4] = ["js", "mjs", "cjs", "ts"];

pub fn extension(path: &str) -> Option<&str> {
    let name = file_name(path);
    let dot = name.rfind('.')?;
    if dot == 0 {
        return None;
    }
    Some(&name[dot + 1..])
}

pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// True when any directory segment marks a test tree, or the filename
/// matches `*.test.*` / `*.spec.*` with a source extension.
pub fn is_test_path(path: &str) -> bool {
    let mut segments = path.split('/').peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            return is_test_file_name(segment);
        }
        if TEST_DIR_SEGMENTS.contains(&segment) {
            return true;
        }
    }
    false
}

fn is_test_file_name(name: &str) -> bool {
    for marker in [".test.", ".spec."] {
        let Some(idx) = name.rfind(marker) else {
            continue;
        };
        let ext = &name[idx + marker.len()..];
        let ext = ext.strip_suffix('x').unwrap_or(ext);
        if matches!(ext, "js" | "ts" | "mjs" | "cjs" | "mts" | "cts") {
            return true;
        }
    }
    false
}

/// True when the path passes through a nested dependency directory.
pub fn is_nested_dependency(path: &str) -> bool {
    path.split('/').any(|segment| segment == NESTED_DEPENDENCY_DIR)
}

/// TypeScript declaration files carry no executable code.
pub fn is_declaration_file(path: &str) -> bool {
    let name = file_name(path);
    name.ends_with(".d.ts") || name.ends_with(".d.mts") || name.ends_with(".d.cts")
}

/// True when the static and obfuscation scanners should read the file.
pub fn is_scannable_source(path: &str) -> bool {
    if is_nested_dependency(path) || is_test_path(path) || is_declaration_file(path) {
        return false;
    }
    extension(path).is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Build-artifact heuristic used by the diff engine to classify files that
/// exist in the published artifact but not in the source repository.
pub fn is_expected_build_artifact(path: &str, repo_files: &BTreeSet<String>) -> bool {
    if let Some(first) = path.split('/').next() {
        if BUILD_OUTPUT_DIRS.contains(&first) {
            return true;
        }
    }
    if is_declaration_file(path) {
        return true;
    }
    if path.ends_with(".map") {
        return true;
    }
    let Some(ext) = extension(path) else {
        return false;
    };
    if NATIVE_BINARY_EXTENSIONS.contains(&ext) {
        return true;
    }
    if matches!(ext, "js" | "mjs" | "cjs") {
        let stem = &path[..path.len() - ext.len()];
        for ts_ext in ["ts", "tsx", "mts", "cts"] {
            let candidate = format!("{stem}{ts_ext}");
            if repo_files.contains(&candidate) || repo_files.contains(&format!("src/{candidate}")) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
