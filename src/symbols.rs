//! Per-directory index of publicly exposed declarations.
//!
//! The index maps each directory that holds at least one artifact to the set
//! of public type, function and interface names declared by the source files
//! sitting next to it. Extraction is line-anchored pattern matching on each
//! language's export marker; no grammar is parsed.

use lazy_static::lazy_static;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::artifact::SOURCE_EXTENSIONS;

/// Kind of public declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeclarationKind {
    Type,
    Function,
    Interface,
}

/// A public declaration found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
}

/// One extraction rule: a line-anchored pattern whose first capture group is
/// the declared name.
struct DeclarationRule {
    extensions: &'static [&'static str],
    kind: DeclarationKind,
    regex: Regex,
}

impl DeclarationRule {
    fn new(extensions: &'static [&'static str], kind: DeclarationKind, pattern: &str) -> Self {
        Self {
            extensions,
            kind,
            regex: Regex::new(pattern).unwrap(),
        }
    }
}

const RUST: &[&str] = &["rs"];
const JS_TS: &[&str] = &["js", "jsx", "ts", "tsx"];
const GO: &[&str] = &["go"];
const PYTHON: &[&str] = &["py"];

lazy_static! {
    static ref DECLARATION_RULES: Vec<DeclarationRule> = vec![
        // Rust: bare `pub` only, restricted visibility is not public API
        DeclarationRule::new(RUST, DeclarationKind::Type,
            r"(?m)^\s*pub\s+(?:struct|enum|union|type)\s+([A-Za-z_]\w*)"),
        DeclarationRule::new(RUST, DeclarationKind::Function,
            r#"(?m)^\s*pub\s+(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+"[^"]*"\s+)?fn\s+([A-Za-z_]\w*)"#),
        DeclarationRule::new(RUST, DeclarationKind::Interface,
            r"(?m)^\s*pub\s+(?:unsafe\s+)?trait\s+([A-Za-z_]\w*)"),

        // JavaScript / TypeScript: `export`
        DeclarationRule::new(JS_TS, DeclarationKind::Type,
            r"(?m)^\s*export\s+(?:default\s+)?(?:abstract\s+)?(?:class|enum|type)\s+([A-Za-z_$][\w$]*)"),
        DeclarationRule::new(JS_TS, DeclarationKind::Function,
            r"(?m)^\s*export\s+(?:default\s+)?(?:async\s+)?function\*?\s+([A-Za-z_$][\w$]*)"),
        DeclarationRule::new(JS_TS, DeclarationKind::Interface,
            r"(?m)^\s*export\s+interface\s+([A-Za-z_$][\w$]*)"),

        // Go: capitalised identifiers are exported
        DeclarationRule::new(GO, DeclarationKind::Type,
            r"(?m)^type\s+([A-Z]\w*)\s+struct\b"),
        DeclarationRule::new(GO, DeclarationKind::Function,
            r"(?m)^func\s+(?:\([^)]*\)\s*)?([A-Z]\w*)\s*[\[(]"),
        DeclarationRule::new(GO, DeclarationKind::Interface,
            r"(?m)^type\s+([A-Z]\w*)\s+interface\b"),

        // Python: top-level names without a leading underscore
        DeclarationRule::new(PYTHON, DeclarationKind::Type,
            r"(?m)^class\s+([A-Za-z]\w*)"),
        DeclarationRule::new(PYTHON, DeclarationKind::Function,
            r"(?m)^(?:async\s+)?def\s+([A-Za-z]\w*)"),
    ];
}

static EMPTY: Lazy<BTreeSet<String>> = Lazy::new(BTreeSet::new);

/// Extract public declarations from source text of the given extension.
pub fn extract_declarations(extension: &str, content: &str) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    for rule in DECLARATION_RULES.iter() {
        if !rule.extensions.contains(&extension) {
            continue;
        }
        for caps in rule.regex.captures_iter(content) {
            if let Some(name) = caps.get(1) {
                declarations.push(Declaration {
                    name: name.as_str().to_string(),
                    kind: rule.kind,
                });
            }
        }
    }
    declarations
}

/// Collect public symbol names from the source files directly inside `dir`.
///
/// Names declared in several sibling files are kept once.
pub fn index_directory(dir: &Path) -> BTreeSet<String> {
    let mut names = BTreeSet::new();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("cannot list {}: {}", dir.display(), e);
            return names;
        }
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if SOURCE_EXTENSIONS.contains(&ext) => ext.to_string(),
            _ => continue,
        };
        let content = match fs::read(&path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!("cannot read source {}: {}", path.display(), e);
                continue;
            }
        };
        names.extend(
            extract_declarations(&ext, &content)
                .into_iter()
                .map(|d| d.name),
        );
    }

    names
}

/// Read-only mapping of directory to public symbol names.
#[derive(Debug, Clone, Default)]
pub struct SymbolIndex {
    entries: BTreeMap<PathBuf, BTreeSet<String>>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index for the given directories in parallel.
    pub fn build<P: AsRef<Path> + Sync>(dirs: &[P]) -> Self {
        let entries: BTreeMap<PathBuf, BTreeSet<String>> = dirs
            .par_iter()
            .map(|d| {
                let dir = d.as_ref();
                (dir.to_path_buf(), index_directory(dir))
            })
            .collect();

        debug!(
            "indexed {} directories, {} symbols total",
            entries.len(),
            entries.values().map(BTreeSet::len).sum::<usize>()
        );

        Self { entries }
    }

    /// Insert an entry directly.
    pub fn insert<P: Into<PathBuf>>(&mut self, dir: P, symbols: BTreeSet<String>) {
        self.entries.insert(dir.into(), symbols);
    }

    /// Symbols indexed for a directory; empty when the directory has none.
    pub fn symbols_for(&self, dir: &Path) -> &BTreeSet<String> {
        self.entries.get(dir).unwrap_or(&EMPTY)
    }

    /// Number of indexed directories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
