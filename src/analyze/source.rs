//! Helpers shared by the health-mode analyzers.

use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Component, Path};

use crate::artifact::Artifact;

lazy_static! {
    /// File names that mark test code across the supported languages
    static ref TEST_FILE_NAME: Regex = Regex::new(
        r"(?x)
        (_test\.(go|py|rs|c|cpp)$)
        | (^test_.*\.py$)
        | (\.(test|spec)\.(js|jsx|ts|tsx)$)
        | (Tests?\.java$)
        "
    )
    .unwrap();
    static ref CFG_TEST: Regex = Regex::new(r"(?m)^\s*#\[cfg\(test\)\]").unwrap();
}

/// Directory names whose contents are test code.
const TEST_DIRS: &[&str] = &["tests", "test", "__tests__", "testdata", "spec", "benches"];

/// Check if a path is a test file, by name or by a test directory on the way.
pub fn is_test_file(path: &Path) -> bool {
    let name_match = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| TEST_FILE_NAME.is_match(n))
        .unwrap_or(false);
    if name_match {
        return true;
    }
    path.parent()
        .map(|p| {
            p.components().any(|c| match c {
                Component::Normal(s) => TEST_DIRS.contains(&s.to_string_lossy().as_ref()),
                _ => false,
            })
        })
        .unwrap_or(false)
}

/// Production part of a source file: Rust files lose their `#[cfg(test)]` tail.
pub fn production_text(artifact: &Artifact) -> &str {
    let content = artifact.content.as_str();
    if artifact.extension() != "rs" {
        return content;
    }
    match CFG_TEST.find(content) {
        Some(m) => &content[..m.start()],
        None => content,
    }
}

/// Production sources under analysis: test files are skipped entirely.
pub fn production_sources<'a>(
    sources: &'a [Artifact],
    root: &'a Path,
) -> impl Iterator<Item = (&'a Artifact, &'a str)> + 'a {
    sources
        .iter()
        .filter(move |a| !is_test_file(a.path.strip_prefix(root).unwrap_or(&a.path)))
        .map(|a| (a, production_text(a)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_test_file() {
        assert!(is_test_file(Path::new("pkg/handler_test.go")));
        assert!(is_test_file(Path::new("app/test_models.py")));
        assert!(is_test_file(Path::new("web/button.test.tsx")));
        assert!(is_test_file(Path::new("src/FooTest.java")));
        assert!(is_test_file(Path::new("tests/integration.rs")));
        assert!(is_test_file(Path::new("crate/tests/fixtures/a.rs")));

        assert!(!is_test_file(Path::new("src/lib.rs")));
        assert!(!is_test_file(Path::new("src/contest.rs")));
        assert!(!is_test_file(Path::new("src/latest/mod.rs")));
    }

    #[test]
    fn test_production_text_cuts_cfg_test() {
        let a = Artifact::new(
            "src/lib.rs",
            "fn real() {}\n\n#[cfg(test)]\nmod tests {\n    fn mock() {}\n}\n".to_string(),
        );
        let text = production_text(&a);
        assert!(text.contains("real"));
        assert!(!text.contains("mock"));

        let py = Artifact::new("app.py", "#[cfg(test)]\nmock = 1\n".to_string());
        assert!(production_text(&py).contains("mock"));
    }
}
