//! Shared search engine for the content and file-discovery tools.
//!
//! Two strategies produce the same result: delegate to `rg` when the
//! context found it on PATH, otherwise walk the tree in-process. Either
//! way the hits are ranked newest file first and capped by the caller.

use crate::models::SearchMatch;
use crate::scanner::{self, FileScanner, IncludeFilter, ScanConfig, ScannedFile};
use crate::tools::{truncate_line, ToolExecutionContext};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// Maximum characters kept from a matching line.
pub const MAX_LINE_CHARS: usize = 200;

/// Second-stage check on a matching line, given the file it came from.
pub type LineFilter<'f> = dyn Fn(&Path, &str) -> bool + Sync + 'f;

/// A content search over the code files of the run root.
#[derive(Clone)]
pub struct ContentQuery<'a> {
    pub pattern: &'a str,
    pub case_insensitive: bool,
    pub include: Option<&'a IncludeFilter>,
    pub limit: usize,
    /// Lines the pattern matched but this rejects are not hits.
    pub line_filter: Option<&'a LineFilter<'a>>,
}

impl ContentQuery<'_> {
    fn accepts(&self, path: &Path, line: &str) -> bool {
        self.line_filter.map_or(true, |filter| filter(path, line))
    }
}

/// Ranked hits plus whether more existed than the limit allowed.
#[derive(Debug, Default)]
pub struct SearchOutcome {
    pub matches: Vec<SearchMatch>,
    pub truncated: bool,
    /// True when the pattern did not compile and was searched literally.
    pub literal_fallback: bool,
}

/// Compile `pattern`, falling back to a literal search of the same text.
/// The flag is true when the fallback was taken.
pub fn compile_pattern(pattern: &str, case_insensitive: bool) -> Result<(Regex, bool), regex::Error> {
    let build = |p: &str| {
        RegexBuilder::new(p)
            .case_insensitive(case_insensitive)
            .build()
    };
    match build(pattern) {
        Ok(re) => Ok((re, false)),
        Err(e) => {
            debug!("Invalid regex {:?} ({}), searching literally", pattern, e);
            build(&regex::escape(pattern)).map(|re| (re, true))
        }
    }
}

/// Run a content search, ranked newest file first.
pub fn search_content(
    ctx: &ToolExecutionContext,
    query: &ContentQuery<'_>,
) -> Result<SearchOutcome, regex::Error> {
    let (regex, literal_fallback) = compile_pattern(query.pattern, query.case_insensitive)?;

    let mut matches = None;
    if let Some(rg) = ctx.ripgrep() {
        match ripgrep_content(rg, ctx.root(), regex.as_str(), query) {
            Ok(found) => matches = Some(found),
            Err(e) => warn!("ripgrep failed, using in-process search: {}", e),
        }
    }
    let mut matches = match matches {
        Some(found) => found,
        None => scan_content(ctx.root(), &regex, query),
    };

    rank(&mut matches);
    let truncated = matches.len() > query.limit;
    matches.truncate(query.limit);
    Ok(SearchOutcome {
        matches,
        truncated,
        literal_fallback,
    })
}

/// Newest file first; source order within a file.
fn rank(matches: &mut [SearchMatch]) {
    matches.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| a.relative_path.cmp(&b.relative_path))
            .then_with(|| a.line_number.cmp(&b.line_number))
    });
}

fn scan_content(root: &Path, regex: &Regex, query: &ContentQuery<'_>) -> Vec<SearchMatch> {
    let config = ScanConfig::default().with_include(query.include.cloned());
    let files = FileScanner::new(root.to_path_buf(), config).scan();

    let mut matches = Vec::new();
    for file in files {
        let bytes = match fs::read(&file.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("Skipping {}: {}", file.relative, e);
                continue;
            }
        };
        let content = String::from_utf8_lossy(&bytes);
        // One more than the limit per file is enough to detect truncation.
        let hits = content
            .lines()
            .enumerate()
            .filter(|(_, line)| regex.is_match(line) && query.accepts(&file.path, line))
            .take(query.limit + 1);
        for (index, line) in hits {
            matches.push(SearchMatch {
                absolute_path: file.path.clone(),
                relative_path: file.relative.clone(),
                line_number: index + 1,
                line_text: truncate_line(line, MAX_LINE_CHARS),
                modified: file.modified,
            });
        }
    }
    matches
}

#[derive(Debug, Deserialize)]
struct RgEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<RgMatch>,
}

#[derive(Debug, Deserialize)]
struct RgMatch {
    path: Option<RgText>,
    lines: Option<RgText>,
    line_number: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RgText {
    text: Option<String>,
}

fn exclusion_globs() -> Vec<String> {
    scanner::EXCLUDED_DIRS
        .iter()
        .map(|dir| format!("!{}", dir))
        .collect()
}

fn ripgrep_content(
    rg: &Path,
    root: &Path,
    pattern: &str,
    query: &ContentQuery<'_>,
) -> Result<Vec<SearchMatch>, String> {
    let mut command = Command::new(rg);
    command
        .current_dir(root)
        .arg("--json")
        .arg("--no-config")
        .arg("--hidden")
        .arg("--no-ignore")
        .arg("--max-filesize")
        .arg("1M");
    if query.case_insensitive {
        command.arg("--ignore-case");
    }
    for glob in exclusion_globs() {
        command.arg("--glob").arg(glob);
    }
    if let Some(include) = query.include {
        command.arg("--glob").arg(include.as_str());
    }
    command.arg("-e").arg(pattern).arg(".");

    let output = command.output().map_err(|e| e.to_string())?;
    // Exit code 1 means "no matches".
    match output.status.code() {
        Some(0) | Some(1) => {}
        other => {
            return Err(format!(
                "exit status {:?}: {}",
                other,
                String::from_utf8_lossy(&output.stderr).trim()
            ))
        }
    }

    let mut matches = Vec::new();
    let mut per_file: std::collections::HashMap<PathBuf, usize> = Default::default();
    for line in String::from_utf8_lossy(&output.stdout).lines() {
        let Ok(event) = serde_json::from_str::<RgEvent>(line) else {
            continue;
        };
        if event.kind != "match" {
            continue;
        }
        let Some(data) = event.data else { continue };
        let (Some(path), Some(line_number)) = (data.path.and_then(|p| p.text), data.line_number)
        else {
            continue;
        };
        let absolute = root.join(path.trim_start_matches("./"));
        if !scanner::is_code_file(&absolute) || scanner::is_binary_file(&absolute) {
            continue;
        }
        let text = data.lines.and_then(|l| l.text).unwrap_or_default();
        let text = text.trim_end_matches(['\n', '\r']);
        if !query.accepts(&absolute, text) {
            continue;
        }
        let count = per_file.entry(absolute.clone()).or_insert(0);
        *count += 1;
        if *count > query.limit + 1 {
            continue;
        }
        matches.push(SearchMatch {
            relative_path: scanner::relative_path(root, &absolute),
            modified: scanner::modified_time(&absolute),
            absolute_path: absolute,
            line_number,
            line_text: truncate_line(text, MAX_LINE_CHARS),
        });
    }
    Ok(matches)
}

/// Files matching `filter`, deduplicated and ranked newest first.
pub fn find_files(ctx: &ToolExecutionContext, filter: &IncludeFilter) -> Vec<ScannedFile> {
    let mut files = None;
    if let Some(rg) = ctx.ripgrep() {
        match ripgrep_files(rg, ctx.root(), filter) {
            Ok(found) => files = Some(found),
            Err(e) => warn!("ripgrep failed, using in-process glob: {}", e),
        }
    }
    let files = files.unwrap_or_else(|| {
        let config = ScanConfig::all_files().with_include(Some(filter.clone()));
        FileScanner::new(ctx.root().to_path_buf(), config).scan()
    });

    let mut seen = HashSet::new();
    let mut files: Vec<ScannedFile> = files
        .into_iter()
        .filter(|f| seen.insert(f.path.clone()))
        .collect();
    files.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| a.relative.cmp(&b.relative))
    });
    files
}

fn ripgrep_files(
    rg: &Path,
    root: &Path,
    filter: &IncludeFilter,
) -> Result<Vec<ScannedFile>, String> {
    let output = Command::new(rg)
        .current_dir(root)
        .arg("--files")
        .arg("--no-config")
        .arg("--hidden")
        .arg("--no-ignore")
        .arg("--glob")
        .arg(filter.as_str())
        .arg("--glob")
        .arg("!.git")
        .arg(".")
        .output()
        .map_err(|e| e.to_string())?;
    match output.status.code() {
        Some(0) | Some(1) => {}
        other => return Err(format!("exit status {:?}", other)),
    }

    let walker = FileScanner::new(root.to_path_buf(), ScanConfig::all_files());
    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| root.join(l.trim().trim_start_matches("./")))
        .filter(|path| !walker.in_excluded_dir(path))
        .map(|path| ScannedFile {
            relative: scanner::relative_path(root, &path),
            modified: scanner::modified_time(&path),
            path,
        })
        .collect())
}

/// Render hits grouped by file, in ranked order.
pub fn format_grouped(matches: &[SearchMatch]) -> String {
    let mut output = String::new();
    let mut current: Option<&str> = None;
    for m in matches {
        if current != Some(m.relative_path.as_str()) {
            if current.is_some() {
                output.push('\n');
            }
            output.push_str(&format!("{}:\n", m.relative_path));
            current = Some(&m.relative_path);
        }
        output.push_str(&format!("  Line {}: {}\n", m.line_number, m.line_text));
    }
    output
}

/// Number of distinct files among `matches`.
pub fn file_count(matches: &[SearchMatch]) -> usize {
    matches
        .iter()
        .map(|m| m.absolute_path.as_path())
        .collect::<HashSet<_>>()
        .len()
}

/// Backdate `path` by `secs_ago` seconds.
#[cfg(test)]
pub(crate) fn touch(path: &Path, secs_ago: u64) {
    let time = std::time::SystemTime::now() - std::time::Duration::from_secs(secs_ago);
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(time).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;
    use tempfile::TempDir;

    #[test]
    fn test_invalid_regex_searches_literally() {
        let (re, literal) = compile_pattern("foo(", false).unwrap();
        assert!(literal);
        assert!(re.is_match("call foo(x)"));

        let (re, literal) = compile_pattern("fo+", true).unwrap();
        assert!(!literal);
        assert!(re.is_match("FOOO"));
    }

    #[test]
    fn test_content_ranked_newest_first_and_capped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("old.rs"), "hit one\nhit two\n").unwrap();
        fs::write(root.join("new.rs"), "miss\nhit three\n").unwrap();
        touch(&root.join("old.rs"), 3600);
        touch(&root.join("new.rs"), 10);

        let ctx = ToolExecutionContext::new(root);
        let query = ContentQuery {
            pattern: "hit",
            case_insensitive: true,
            include: None,
            limit: 2,
            line_filter: None,
        };
        let outcome = search_content(&ctx, &query).unwrap();

        assert!(outcome.truncated);
        assert_eq!(outcome.matches.len(), 2);
        assert_eq!(outcome.matches[0].relative_path, "new.rs");
        assert_eq!(outcome.matches[0].line_number, 2);
        assert_eq!(outcome.matches[1].relative_path, "old.rs");
        assert_eq!(outcome.matches[1].line_number, 1);
        assert!(outcome.matches[0].modified >= outcome.matches[1].modified);
    }

    #[test]
    fn test_find_files_respects_filter() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules")).unwrap();
        fs::write(root.join("src/a.ts"), "").unwrap();
        fs::write(root.join("b.ts"), "").unwrap();
        fs::write(root.join("node_modules/c.ts"), "").unwrap();
        fs::write(root.join("d.rs"), "").unwrap();

        let ctx = ToolExecutionContext::new(root);
        let filter = IncludeFilter::parse("*.ts").unwrap();
        let mut names: Vec<_> = find_files(&ctx, &filter)
            .into_iter()
            .map(|f| f.relative)
            .collect();
        names.sort();
        assert_eq!(names, vec!["b.ts".to_string(), "src/a.ts".to_string()]);
    }

    #[test]
    fn test_ripgrep_sees_hidden_and_ignored_files_like_the_scan() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let rg_ctx = ToolExecutionContext::new(root).with_ripgrep_detection();
        if rg_ctx.ripgrep().is_none() {
            return;
        }
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join(".hidden")).unwrap();
        fs::create_dir_all(root.join("node_modules")).unwrap();
        fs::write(root.join("src/main.rs"), "needle\n").unwrap();
        fs::write(root.join(".hidden/conf.rs"), "needle\n").unwrap();
        fs::write(root.join("ignored.rs"), "needle\n").unwrap();
        fs::write(root.join(".ignore"), "ignored.rs\n").unwrap();
        fs::write(root.join("node_modules/dep.rs"), "needle\n").unwrap();
        let scan_ctx = ToolExecutionContext::new(root);

        let content = |ctx: &ToolExecutionContext| {
            let query = ContentQuery {
                pattern: "needle",
                case_insensitive: false,
                include: None,
                limit: 10,
                line_filter: None,
            };
            let mut paths: Vec<String> = search_content(ctx, &query)
                .unwrap()
                .matches
                .into_iter()
                .map(|m| m.relative_path)
                .collect();
            paths.sort();
            paths
        };
        let expected = vec![".hidden/conf.rs", "ignored.rs", "src/main.rs"];
        assert_eq!(content(&scan_ctx), expected);
        assert_eq!(content(&rg_ctx), expected);

        let filter = IncludeFilter::parse("*.rs").unwrap();
        let files = |ctx: &ToolExecutionContext| {
            let mut names: Vec<String> = find_files(ctx, &filter).into_iter().map(|f| f.relative).collect();
            names.sort();
            names
        };
        assert_eq!(files(&scan_ctx), expected);
        assert_eq!(files(&rg_ctx), expected);
    }

    #[test]
    fn test_format_grouped() {
        let hit = |file: &str, line: usize| SearchMatch {
            absolute_path: PathBuf::from(file),
            relative_path: file.to_string(),
            line_number: line,
            line_text: "text".to_string(),
            modified: SystemTime::UNIX_EPOCH,
        };
        let matches = vec![hit("a.rs", 1), hit("a.rs", 4), hit("b.rs", 2)];
        let output = format_grouped(&matches);
        assert_eq!(
            output,
            "a.rs:\n  Line 1: text\n  Line 4: text\n\nb.rs:\n  Line 2: text\n"
        );
        assert_eq!(file_count(&matches), 2);
    }
}
