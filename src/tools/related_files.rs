//! Dependencies (imports) and dependents (textual references) of one file.

use crate::scanner::{FileScanner, ScanConfig};
use crate::tools::languages::{export_table, generic_export_table, import_table, Language};
use crate::tools::outline::CommentState;
use crate::tools::{required_str, Tool, ToolError, ToolExecutionContext};
use regex::Regex;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const MAX_DEPENDENTS: usize = 20;

pub struct RelatedFilesTool;

impl Tool for RelatedFilesTool {
    fn name(&self) -> &str {
        "related_files"
    }

    fn description(&self) -> &str {
        "Show what a file depends on (its imports/usings/includes) and which other files reference the \
         types and functions it defines. Saves several grep calls when tracing how code is connected."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the source file relative to the repository root"
                }
            },
            "required": ["path"]
        })
    }

    fn run(&self, args: &Map<String, Value>, ctx: &ToolExecutionContext) -> Result<String, ToolError> {
        let requested = required_str(args, "path")?.trim();
        let path = ctx.resolve(requested)?;
        if !path.exists() {
            return Err(ToolError::FileNotFound(requested.to_string()));
        }
        if !path.is_file() {
            return Err(ToolError::NotAFile(requested.to_string()));
        }
        let bytes = fs::read(&path).map_err(|source| ToolError::Io {
            path: requested.to_string(),
            source,
        })?;
        let content = String::from_utf8_lossy(&bytes);
        let language = Language::from_path(&path);

        let dependencies: Vec<String> = match language {
            Some(lang) => extract_imports(&content, lang)
                .into_iter()
                .map(|target| resolve_import(ctx, &path, lang, &target))
                .fold(Vec::new(), |mut acc, dep| {
                    if !acc.contains(&dep) {
                        acc.push(dep);
                    }
                    acc
                }),
            None => Vec::new(),
        };
        let names = extract_exports(&content, language);
        let (dependents, truncated) = find_dependents(ctx, &path, &names);

        let mut output = format!("Related files for {}\n\nDependencies:\n", ctx.relative(&path));
        if dependencies.is_empty() {
            output.push_str("  (none detected)\n");
        }
        for dep in &dependencies {
            output.push_str(&format!("  {}\n", dep));
        }

        if names.is_empty() {
            output.push_str("\nDependents:\n");
        } else {
            let shown: Vec<&str> = names.iter().take(10).map(String::as_str).collect();
            output.push_str(&format!("\nDependents (files referencing {}):\n", shown.join(", ")));
        }
        if dependents.is_empty() {
            output.push_str("  (no dependents found)\n");
        }
        for dependent in &dependents {
            output.push_str(&format!("  {}\n", dependent));
        }
        if truncated {
            output.push_str(&format!(
                "  (Dependents truncated at {}. Use grep for an exhaustive search.)\n",
                MAX_DEPENDENTS
            ));
        }
        Ok(output)
    }
}

/// Import targets from the leading import section of a file.
pub fn extract_imports(content: &str, language: Language) -> Vec<String> {
    let table = import_table(language);
    let mut targets = Vec::new();
    let mut comments = CommentState::default();
    // (item, end) of the multi-line import group being read
    let mut open_block: Option<(Option<&Regex>, &Regex)> = None;

    for raw in content.lines() {
        let line = raw.trim();
        if let Some((item, end)) = open_block {
            if end.is_match(line) {
                push_target(end.captures(line), &mut targets);
                open_block = None;
            } else if let Some(item) = item {
                push_target(item.captures(line), &mut targets);
            }
            continue;
        }

        let Some(line) = comments.code(line, table.line_comments, table.block_comments) else {
            continue;
        };
        if let Some(block) = table.blocks.iter().find(|(start, _, _)| start.is_match(line)) {
            push_target(block.0.captures(line), &mut targets);
            open_block = Some((block.1.as_ref(), &block.2));
            continue;
        }
        if let Some(caps) = table.imports.iter().find_map(|re| re.captures(line)) {
            push_target(Some(caps), &mut targets);
            continue;
        }
        if table.preamble.iter().any(|re| re.is_match(line)) {
            continue;
        }
        break;
    }
    targets
}

fn push_target(caps: Option<regex::Captures<'_>>, targets: &mut Vec<String>) {
    if let Some(target) = caps.and_then(|c| c.get(1)) {
        let target = target.as_str().trim_end_matches("::").trim();
        if !target.is_empty() {
            targets.push(target.to_string());
        }
    }
}

/// Names of the types and functions a file defines, in source order.
pub fn extract_exports(content: &str, language: Option<Language>) -> Vec<String> {
    let patterns = match language {
        Some(lang) => export_table(lang),
        None => generic_export_table(),
    };
    let mut names: Vec<String> = Vec::new();
    for line in content.lines() {
        for re in patterns {
            if let Some(name) = re.captures(line).and_then(|c| c.get(1)) {
                let name = name.as_str();
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
    }
    names
}

/// Map an import target to a repository path when it names a local file.
fn resolve_import(ctx: &ToolExecutionContext, file: &Path, language: Language, target: &str) -> String {
    let dir = file.parent().unwrap_or(ctx.root());
    let candidates: Vec<PathBuf> = match language {
        Language::TypeScript | Language::JavaScript if target.starts_with('.') => {
            let base = dir.join(target);
            let mut list = vec![base.clone()];
            for ext in ["ts", "tsx", "d.ts", "js", "jsx", "mjs", "cjs"] {
                list.push(PathBuf::from(format!("{}.{}", base.display(), ext)));
            }
            for index in ["index.ts", "index.tsx", "index.js"] {
                list.push(base.join(index));
            }
            list
        }
        Language::Cpp => vec![dir.join(target), ctx.root().join(target)],
        Language::Rust if !target.contains("::") => {
            vec![dir.join(format!("{}.rs", target)), dir.join(target).join("mod.rs")]
        }
        Language::Python if target.starts_with('.') => {
            let dots = target.chars().take_while(|c| *c == '.').count();
            let mut base = dir.to_path_buf();
            for _ in 1..dots {
                base.pop();
            }
            let module = target[dots..].replace('.', "/");
            if module.is_empty() {
                vec![base.join("__init__.py")]
            } else {
                vec![
                    base.join(format!("{}.py", module)),
                    base.join(&module).join("__init__.py"),
                ]
            }
        }
        _ => Vec::new(),
    };

    candidates
        .into_iter()
        .filter(|c| c.is_file())
        .filter_map(|c| fs::canonicalize(c).ok())
        .find(|c| c.starts_with(ctx.root()))
        .map(|c| ctx.relative(&c))
        .unwrap_or_else(|| target.to_string())
}

/// Code files (other than `file`) containing any of `names` as a substring.
fn find_dependents(ctx: &ToolExecutionContext, file: &Path, names: &[String]) -> (Vec<String>, bool) {
    if names.is_empty() {
        return (Vec::new(), false);
    }
    let own = fs::canonicalize(file).unwrap_or_else(|_| file.to_path_buf());
    let scanner = FileScanner::new(ctx.root().to_path_buf(), ScanConfig::default());

    let mut dependents = Vec::new();
    for candidate in scanner.scan() {
        let canonical = fs::canonicalize(&candidate.path).unwrap_or_else(|_| candidate.path.clone());
        if canonical == own {
            continue;
        }
        let Ok(bytes) = fs::read(&candidate.path) else {
            debug!("Skipping unreadable {}", candidate.relative);
            continue;
        };
        let text = String::from_utf8_lossy(&bytes);
        if names.iter().any(|name| text.contains(name.as_str())) {
            if dependents.len() == MAX_DEPENDENTS {
                return (dependents, true);
            }
            dependents.push(candidate.relative);
        }
    }
    (dependents, false)
}
