//! Artifact discovery and loading.

use globset::GlobSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::VerifyError;

/// Extensions treated as documentation artifacts.
pub const DOC_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Extensions treated as source files (health mode and symbol indexing).
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "rs", "go", "py", "js", "ts", "jsx", "tsx", "java", "c", "cpp", "h", "hpp", "sh",
];

/// Directory names that are never descended into.
const PRUNED_DIRS: &[&str] = &[
    "target",
    "node_modules",
    "vendor",
    "dist",
    "build",
    "__pycache__",
];

/// One discovered file under analysis. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub content: String,
    pub size_bytes: u64,
    pub line_count: usize,
}

impl Artifact {
    /// Build an artifact from in-memory content.
    pub fn new<P: Into<PathBuf>>(path: P, content: String) -> Self {
        let size_bytes = content.len() as u64;
        let line_count = content.lines().count();
        Self {
            path: path.into(),
            content,
            size_bytes,
            line_count,
        }
    }

    /// The directory containing this artifact.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// File extension, lowercased, without the dot.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default()
    }
}

/// Outcome of loading one discovered path.
#[derive(Debug, Clone)]
pub enum Loaded {
    /// Readable and large enough to analyze.
    Ready(Artifact),
    /// Readable but below the minimum size; short-circuits to Critical.
    TooSmall(Artifact),
    /// Could not be read; forced to 0/Critical.
    Unreadable { path: PathBuf, error: String },
}

impl Loaded {
    pub fn path(&self) -> &Path {
        match self {
            Loaded::Ready(a) | Loaded::TooSmall(a) => &a.path,
            Loaded::Unreadable { path, .. } => path,
        }
    }

    /// The loaded artifact, if it could be read at all.
    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            Loaded::Ready(a) | Loaded::TooSmall(a) => Some(a),
            Loaded::Unreadable { .. } => None,
        }
    }
}

/// Discovers and reads candidate files under a root.
pub struct ArtifactLoader {
    root: PathBuf,
    extensions: &'static [&'static str],
    exclude: GlobSet,
    min_bytes: u64,
}

impl ArtifactLoader {
    /// Create a loader for files with the given extensions.
    pub fn new<P: AsRef<Path>>(root: P, extensions: &'static [&'static str]) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extensions,
            exclude: GlobSet::empty(),
            min_bytes: 0,
        }
    }

    /// Skip paths (relative to the root) matching any of these globs.
    pub fn exclude(mut self, exclude: GlobSet) -> Self {
        self.exclude = exclude;
        self
    }

    /// Files smaller than this are marked too small to be meaningful.
    pub fn min_bytes(mut self, min_bytes: u64) -> Self {
        self.min_bytes = min_bytes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_excluded(&self, path: &Path) -> bool {
        if self.exclude.is_empty() {
            return false;
        }
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        self.exclude.is_match(rel)
    }

    fn has_wanted_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Discover candidate files, sorted by path.
    pub fn discover(&self) -> Vec<PathBuf> {
        if self.root.is_file() {
            return vec![self.root.clone()];
        }

        let mut files = Vec::new();
        let root = self.root.clone();

        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| {
                if e.path() == root || !e.file_type().is_dir() {
                    return true;
                }
                let name = e.file_name().to_string_lossy();
                !name.starts_with('.') && !PRUNED_DIRS.contains(&name.as_ref())
            })
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping unwalkable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if self.has_wanted_extension(path) && !self.is_excluded(path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        debug!("discovered {} candidate files under {}", files.len(), self.root.display());
        files
    }

    /// Read one file and classify it.
    pub fn load(&self, path: &Path) -> Loaded {
        match std::fs::read(path) {
            Ok(bytes) => {
                let content = String::from_utf8_lossy(&bytes).into_owned();
                let mut artifact = Artifact::new(path, content);
                artifact.size_bytes = bytes.len() as u64;
                if artifact.size_bytes < self.min_bytes {
                    Loaded::TooSmall(artifact)
                } else {
                    Loaded::Ready(artifact)
                }
            }
            Err(source) => {
                let err = VerifyError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                };
                warn!("{}", err);
                Loaded::Unreadable {
                    path: path.to_path_buf(),
                    error: err.to_string(),
                }
            }
        }
    }

    /// Discover and load every candidate file.
    pub fn load_all(&self) -> Vec<Loaded> {
        self.discover().iter().map(|p| self.load(p)).collect()
    }
}
