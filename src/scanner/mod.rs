//! File scanner for walking the explored source tree.
//!
//! This module owns the knowledge shared by every tool about which
//! directories are never entered, which files are worth listing or
//! searching, and how include globs are applied.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;
use walkdir::WalkDir;

/// Directory names that are pruned from every walk (VCS, build and
/// dependency folders).
pub const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    "node_modules",
    "bin",
    "obj",
    "target",
    "dist",
    "build",
    "out",
    "__pycache__",
    ".venv",
    "venv",
    ".idea",
    ".vscode",
    ".vs",
    "vendor",
    "packages",
    "coverage",
    ".next",
];

/// Extensions searched by content tools.
const CODE_EXTENSIONS: &[&str] = &[
    "cs", "csx", "vb", "fs", "java", "kt", "kts", "scala", "groovy", "go", "rs", "py", "pyi",
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts", "vue", "svelte", "c", "h", "cc",
    "cpp", "cxx", "hpp", "hh", "hxx", "m", "mm", "swift", "rb", "php", "lua", "pl", "r", "dart",
    "ex", "exs", "erl", "hs", "clj", "sh", "bash", "zsh", "ps1", "psm1", "sql", "proto",
    "graphql", "html", "htm", "css", "scss", "sass", "less", "razor", "cshtml", "xaml", "json",
    "yaml", "yml", "toml", "xml", "csproj", "fsproj", "vbproj", "props", "targets", "sln",
    "gradle", "cmake", "ini", "cfg", "conf", "config", "env", "tf", "hcl",
];

/// Extensions shown by the directory listing in addition to code files.
const DOC_EXTENSIONS: &[&str] = &["md", "markdown", "rst", "txt", "adoc"];

/// Extensionless file names worth listing.
const LISTED_FILE_NAMES: &[&str] = &[
    "Makefile",
    "Dockerfile",
    "Containerfile",
    "Rakefile",
    "Gemfile",
    "Procfile",
    "Jenkinsfile",
    "CMakeLists.txt",
    "LICENSE",
];

/// Extensions never read as text.
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "tiff", "psd", "svgz", "pdf", "doc",
    "docx", "xls", "xlsx", "ppt", "pptx", "zip", "gz", "tgz", "bz2", "xz", "7z", "rar", "tar",
    "jar", "war", "nupkg", "exe", "dll", "so", "dylib", "a", "lib", "o", "obj", "pdb", "class",
    "pyc", "pyo", "wasm", "bin", "dat", "db", "sqlite", "mp3", "mp4", "wav", "avi", "mov",
    "mkv", "ttf", "otf", "woff", "woff2", "eot", "snk", "pfx", "p12",
];

/// Lowercased extension of `path`, or an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

pub fn is_excluded_dir(name: &str) -> bool {
    EXCLUDED_DIRS.contains(&name)
}

pub fn is_code_file(path: &Path) -> bool {
    CODE_EXTENSIONS.contains(&extension_of(path).as_str())
}

pub fn is_binary_file(path: &Path) -> bool {
    BINARY_EXTENSIONS.contains(&extension_of(path).as_str())
}

/// Whether the directory listing shows this file.
pub fn is_listed_file(path: &Path) -> bool {
    let ext = extension_of(path);
    if CODE_EXTENSIONS.contains(&ext.as_str()) || DOC_EXTENSIONS.contains(&ext.as_str()) {
        return true;
    }
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| LISTED_FILE_NAMES.contains(&n))
        .unwrap_or(false)
}

/// Modification time, or the epoch when it cannot be read.
pub fn modified_time(path: &Path) -> SystemTime {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Path of `path` relative to `root`, with forward slashes.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}

/// A glob restricting which files a search visits.
///
/// Patterns without a `/` are matched against the file name, so `*.cs`
/// selects C# files at any depth; other patterns are matched against the
/// path relative to the root.
#[derive(Debug, Clone)]
pub struct IncludeFilter {
    raw: String,
    pattern: glob::Pattern,
    tail: Option<glob::Pattern>,
}

impl IncludeFilter {
    pub fn parse(raw: &str) -> Result<Self, glob::PatternError> {
        let raw = raw.trim();
        let pattern = glob::Pattern::new(raw)?;
        let tail = match raw.strip_prefix("**/") {
            Some(rest) if !rest.is_empty() => Some(glob::Pattern::new(rest)?),
            _ => None,
        };
        Ok(Self {
            raw: raw.to_string(),
            pattern,
            tail,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Extension named by the filter, e.g. `cs` for `*.cs` or `src/**/*.cs`.
    pub fn extension(&self) -> Option<String> {
        let last = self.raw.rsplit('/').next()?;
        let (_, ext) = last.rsplit_once('.')?;
        if ext.is_empty() || ext.contains(['*', '?', '[', '{']) {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    pub fn matches(&self, relative: &str) -> bool {
        if !self.raw.contains('/') {
            let name = relative.rsplit('/').next().unwrap_or(relative);
            return self.pattern.matches(name);
        }
        if self.pattern.matches(relative) {
            return true;
        }
        self.tail
            .as_ref()
            .map(|tail| {
                if tail.as_str().contains('/') {
                    tail.matches(relative)
                } else {
                    let name = relative.rsplit('/').next().unwrap_or(relative);
                    tail.matches(name)
                }
            })
            .unwrap_or(false)
    }
}

/// Configuration for file scanning.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Only visit files with a recognized code extension.
    pub code_only: bool,
    /// Skip files whose extension marks them as binary.
    pub skip_binary: bool,
    /// Optional include glob.
    pub include: Option<IncludeFilter>,
    /// Files larger than this are skipped (bytes).
    pub max_file_size: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            code_only: true,
            skip_binary: true,
            include: None,
            max_file_size: 1024 * 1024, // 1MB
        }
    }
}

impl ScanConfig {
    /// Every file regardless of kind or size, as file discovery wants.
    pub fn all_files() -> Self {
        Self {
            code_only: false,
            skip_binary: false,
            include: None,
            max_file_size: u64::MAX,
        }
    }

    pub fn with_include(mut self, include: Option<IncludeFilter>) -> Self {
        self.include = include;
        self
    }
}

/// Scanned file information.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Relative path from the root, forward slashes.
    pub relative: String,
    pub modified: SystemTime,
}

/// File scanner for discovering files under a root.
pub struct FileScanner {
    config: ScanConfig,
    root: PathBuf,
}

impl FileScanner {
    pub fn new(root: PathBuf, config: ScanConfig) -> Self {
        Self { config, root }
    }

    /// Whether a file found on disk passes this scanner's filters.
    pub fn accepts(&self, path: &Path) -> bool {
        if self.config.skip_binary && is_binary_file(path) {
            return false;
        }
        if self.config.code_only && !is_code_file(path) {
            return false;
        }
        if let Some(include) = &self.config.include {
            if !include.matches(&relative_path(&self.root, path)) {
                return false;
            }
        }
        match fs::metadata(path) {
            Ok(metadata) => metadata.len() <= self.config.max_file_size,
            Err(_) => false,
        }
    }

    /// Whether any component of `path` below the root is a reserved directory.
    pub fn in_excluded_dir(&self, path: &Path) -> bool {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        let mut components: Vec<_> = rel.components().collect();
        components.pop();
        components
            .iter()
            .any(|c| is_excluded_dir(&c.as_os_str().to_string_lossy()))
    }

    /// Walk the tree and collect every accepted file, ordered by path.
    pub fn scan(&self) -> Vec<ScannedFile> {
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !(entry.file_type().is_dir()
                        && is_excluded_dir(&entry.file_name().to_string_lossy()))
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.accepts(entry.path()) {
                continue;
            }
            files.push(ScannedFile {
                path: entry.path().to_path_buf(),
                relative: relative_path(&self.root, entry.path()),
                modified: modified_time(entry.path()),
            });
        }
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scan_prunes_excluded_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("src/app.ts"), "export class App {}").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "module.exports = 1").unwrap();
        fs::write(root.join("logo.png"), [0u8, 1, 2]).unwrap();

        let scanner = FileScanner::new(root.to_path_buf(), ScanConfig::default());
        let files: Vec<_> = scanner.scan().into_iter().map(|f| f.relative).collect();

        assert_eq!(files, vec!["src/app.ts".to_string()]);
    }

    #[test]
    fn test_include_filter_by_name_and_path() {
        let by_name = IncludeFilter::parse("*.cs").unwrap();
        assert!(by_name.matches("A.cs"));
        assert!(by_name.matches("src/deep/B.cs"));
        assert!(!by_name.matches("src/B.rs"));
        assert_eq!(by_name.extension().as_deref(), Some("cs"));

        let by_path = IncludeFilter::parse("src/**/*.rs").unwrap();
        assert!(by_path.matches("src/agent/mod.rs"));
        assert!(!by_path.matches("tests/mod.rs"));

        let recursive = IncludeFilter::parse("**/*.py").unwrap();
        assert!(recursive.matches("main.py"));
        assert!(recursive.matches("pkg/main.py"));

        assert_eq!(IncludeFilter::parse("*.{ts,tsx}").unwrap().extension(), None);
    }

    #[test]
    fn test_file_classification() {
        assert!(is_code_file(Path::new("a/B.CS")));
        assert!(is_binary_file(Path::new("lib.dll")));
        assert!(is_listed_file(Path::new("README.md")));
        assert!(is_listed_file(Path::new("Dockerfile")));
        assert!(!is_listed_file(Path::new("image.png")));
        assert!(is_excluded_dir(".git"));
        assert!(!is_excluded_dir("src"));
    }

    #[test]
    fn test_in_excluded_dir() {
        let scanner = FileScanner::new(PathBuf::from("/repo"), ScanConfig::default());
        assert!(scanner.in_excluded_dir(Path::new("/repo/target/debug/x.rs")));
        assert!(!scanner.in_excluded_dir(Path::new("/repo/src/target.rs")));
    }
}
