//! Structural outline of a source file: types and members without bodies.
//!
//! A single forward scan classifies each line with the language table from
//! [`languages`](super::languages). Nesting is tracked with a stack of
//! open blocks (brace languages) or the indentation width (Python); only
//! file-scope lines and the direct members of types are evaluated, which
//! keeps implementation bodies out of the result.

use crate::models::OutlineSymbol;
use crate::scanner::is_binary_file;
use crate::tools::languages::{
    outline_table, DepthMode, Language, OutlineTable, SymbolKind, CONTROL_WORDS,
};
use crate::tools::{required_str, truncate_line, Tool, ToolError, ToolExecutionContext};
use serde_json::{json, Map, Value};
use std::fs;

const MAX_SIGNATURE_CHARS: usize = 120;
const MAX_SYMBOLS: usize = 400;

pub struct FileOutlineTool;

impl Tool for FileOutlineTool {
    fn name(&self) -> &str {
        "file_outline"
    }

    fn description(&self) -> &str {
        "Show the structure of a source file (namespaces, types, methods, properties, fields, functions) \
         with line numbers but without method bodies. Much cheaper than read_file for getting an overview; \
         use the line numbers with read_file's offset to drill in."
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
        let relative = ctx.relative(&path);
        if is_binary_file(&path) {
            return Ok(format!("[Binary file: {}]", relative));
        }

        let bytes = fs::read(&path).map_err(|source| ToolError::Io {
            path: requested.to_string(),
            source,
        })?;
        let content = String::from_utf8_lossy(&bytes);
        let symbols = extract_outline(&content, Language::from_path(&path));

        if symbols.is_empty() {
            return Ok(format!(
                "No structural symbols found in {}. Use read_file to view its contents.",
                relative
            ));
        }

        let shown = symbols.len().min(MAX_SYMBOLS);
        let mut output = format!("Outline of {} ({} symbols):\n\n", relative, shown);
        for symbol in symbols.iter().take(MAX_SYMBOLS) {
            output.push_str(&format!(
                "{:>5}: {}{}\n",
                symbol.line,
                "  ".repeat(symbol.depth),
                symbol.signature
            ));
        }
        if symbols.len() > MAX_SYMBOLS {
            output.push_str(&format!(
                "\n(Outline truncated at {} symbols. Use read_file with an offset to see the rest.)\n",
                MAX_SYMBOLS
            ));
        }
        Ok(output)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Namespace,
    Type,
    Other,
}

/// Extract outline symbols from `content` using the table for `lang`
/// (the generic table when `None`).
pub fn extract_outline(content: &str, lang: Option<Language>) -> Vec<OutlineSymbol> {
    let table = outline_table(lang);
    match table.depth_mode {
        DepthMode::Braces => scan_braces(content, table),
        DepthMode::Indentation => scan_indentation(content, table),
    }
}

/// Tracks multi-line comments across lines.
#[derive(Default)]
pub(crate) struct CommentState {
    closing: Option<&'static str>,
}

impl CommentState {
    /// Code portion of `line` (already trimmed), or `None` when the line
    /// is blank or entirely comment.
    pub(crate) fn code<'a>(
        &mut self,
        line: &'a str,
        line_comments: &[&str],
        block_comments: &'static [(&'static str, &'static str)],
    ) -> Option<&'a str> {
        let mut line = line;
        if let Some(closing) = self.closing {
            let pos = line.find(closing)?;
            self.closing = None;
            line = line[pos + closing.len()..].trim();
        }
        if line.is_empty() || line_comments.iter().any(|c| line.starts_with(c)) {
            return None;
        }
        for &(open, close) in block_comments {
            if let Some(rest) = line.strip_prefix(open) {
                match rest.find(close) {
                    Some(pos) => {
                        let after = rest[pos + close.len()..].trim();
                        return if after.is_empty() { None } else { Some(after) };
                    }
                    None => {
                        self.closing = Some(close);
                        return None;
                    }
                }
            }
        }
        Some(line)
    }
}

fn leading_word(line: &str) -> &str {
    let end = line
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(line.len());
    &line[..end]
}

fn is_statement(line: &str, table: &OutlineTable) -> bool {
    let word = leading_word(line);
    CONTROL_WORDS.contains(&word) || table.ignored_words.contains(&word)
}

/// Whitespace-collapsed, brace-trimmed, length-capped declaration text.
pub(crate) fn clean_signature(line: &str) -> String {
    let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_end_matches('{').trim_end();
    truncate_line(trimmed, MAX_SIGNATURE_CHARS)
}

/// Drop a trailing line comment before counting braces.
fn strip_trailing_comment<'a>(line: &'a str, table: &OutlineTable) -> &'a str {
    table
        .line_comments
        .iter()
        .filter_map(|marker| line.find(&format!(" {}", marker)))
        .min()
        .map(|pos| &line[..pos])
        .unwrap_or(line)
}

fn scan_braces(content: &str, table: &OutlineTable) -> Vec<OutlineSymbol> {
    let mut symbols = Vec::new();
    let mut stack: Vec<Block> = Vec::new();
    let mut pending: Option<SymbolKind> = None;
    let mut file_scoped = false;
    let mut comments = CommentState::default();

    for (index, raw) in content.lines().enumerate() {
        let Some(line) = comments.code(raw.trim(), table.line_comments, table.block_comments) else {
            continue;
        };

        let structural: Vec<Block> = stack
            .iter()
            .copied()
            .filter(|b| *b != Block::Namespace)
            .collect();
        let effective = structural.len();
        let namespaces = stack.len() - effective;
        let eligible = effective == 0 || (effective == 1 && structural[0] == Block::Type);

        let mut matched = None;
        if eligible {
            let scoped = !file_scoped
                && table
                    .file_scoped_namespace
                    .as_ref()
                    .map(|re| re.is_match(line))
                    .unwrap_or(false);
            let kind = if scoped {
                Some(SymbolKind::Member)
            } else if is_statement(line, table) {
                None
            } else {
                table.classify(line)
            };
            if let Some(kind) = kind {
                symbols.push(OutlineSymbol {
                    line: index + 1,
                    depth: effective + namespaces + usize::from(file_scoped),
                    signature: clean_signature(line),
                });
                matched = Some(kind);
            }
            file_scoped |= scoped;
        }

        let code = strip_trailing_comment(line, table);
        let mut opened = false;
        for ch in code.chars() {
            match ch {
                '{' => {
                    let block = if opened {
                        Block::Other
                    } else {
                        match matched.or(pending) {
                            Some(SymbolKind::Namespace) => Block::Namespace,
                            Some(SymbolKind::Type) => Block::Type,
                            _ => Block::Other,
                        }
                    };
                    opened = true;
                    pending = None;
                    stack.push(block);
                }
                '}' => {
                    stack.pop();
                }
                _ => {}
            }
        }

        if !opened {
            if code.trim_end().ends_with(';') || code.trim_end().ends_with('}') {
                pending = None;
            } else if matched.is_some() {
                pending = matched;
            }
        }
    }
    symbols
}

fn indentation_width(raw: &str) -> usize {
    raw.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

fn scan_indentation(content: &str, table: &OutlineTable) -> Vec<OutlineSymbol> {
    let mut symbols = Vec::new();
    let mut comments = CommentState::default();
    let mut inside_class = false;

    for (index, raw) in content.lines().enumerate() {
        let Some(line) = comments.code(raw.trim(), table.line_comments, table.block_comments) else {
            continue;
        };
        let depth = indentation_width(raw) / 4;
        if depth == 0 {
            inside_class = false;
        }
        if depth > 1 || (depth == 1 && !inside_class) || is_statement(line, table) {
            continue;
        }
        if let Some(kind) = table.classify(line) {
            if depth == 0 {
                inside_class = kind == SymbolKind::Type;
            }
            symbols.push(OutlineSymbol {
                line: index + 1,
                depth,
                signature: clean_signature(line.trim_end_matches(':')),
            });
        }
    }
    symbols
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn outline(content: &str, lang: Option<Language>) -> Vec<(usize, usize, String)> {
        extract_outline(content, lang)
            .into_iter()
            .map(|s| (s.line, s.depth, s.signature))
            .collect()
    }

    #[test]
    fn test_csharp_block_namespace() {
        let source = r#"using System;

namespace Acme.Ui
{
    /// <summary>A widget.</summary>
    public class Widget : IWidget
    {
        private readonly int _size = 3;

        public Widget(int size)
        {
            _size = size;
            if (size > 10) { Console.WriteLine("big"); }
        }

        public int Size { get; set; }

        public void Render()
        {
            var local = 1;
        }
    }
}
"#;
        let symbols = outline(source, Some(Language::CSharp));
        assert_eq!(
            symbols,
            vec![
                (3, 0, "namespace Acme.Ui".to_string()),
                (6, 1, "public class Widget : IWidget".to_string()),
                (8, 2, "private readonly int _size = 3;".to_string()),
                (10, 2, "public Widget(int size)".to_string()),
                (16, 2, "public int Size { get; set; }".to_string()),
                (18, 2, "public void Render()".to_string()),
            ]
        );
    }

    #[test]
    fn test_csharp_file_scoped_namespace() {
        let source = "namespace Acme;\n\npublic class Widget\n{\n    void Render() {}\n}\n";
        let symbols = outline(source, Some(Language::CSharp));
        assert_eq!(
            symbols,
            vec![
                (1, 0, "namespace Acme;".to_string()),
                (3, 1, "public class Widget".to_string()),
                (5, 2, "void Render() {}".to_string()),
            ]
        );
    }

    #[test]
    fn test_rust_impl_members_and_bodies_skipped() {
        let source = r#"use std::fmt;

/// A point.
pub struct Point {
    pub x: i32,
    y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        let p = Point { x, y };
        p
    }
}

fn helper() {}
"#;
        let symbols = outline(source, Some(Language::Rust));
        let lines: Vec<usize> = symbols.iter().map(|s| s.0).collect();
        assert_eq!(lines, vec![4, 5, 6, 9, 10, 16]);
        assert_eq!(symbols[3], (9, 0, "impl Point".to_string()));
        assert_eq!(symbols[4].1, 1);
    }

    #[test]
    fn test_functions_inside_functions_are_hidden() {
        let source = "function outer() {\n  function inner() {}\n  return inner;\n}\nexport class App {\n  start() {\n    const x = () => {};\n  }\n}\n";
        let symbols = outline(source, Some(Language::JavaScript));
        assert_eq!(
            symbols,
            vec![
                (1, 0, "function outer()".to_string()),
                (5, 0, "export class App".to_string()),
                (6, 1, "start()".to_string()),
            ]
        );
    }

    #[test]
    fn test_python_indentation() {
        let source = r#"import os

class Repo:
    """Docstring with class Fake: inside."""

    def open(self):
        def nested():
            pass
        return nested

def main():
    pass
"#;
        let symbols = outline(source, Some(Language::Python));
        assert_eq!(
            symbols,
            vec![
                (3, 0, "class Repo".to_string()),
                (6, 1, "def open(self)".to_string()),
                (11, 0, "def main()".to_string()),
            ]
        );
    }

    #[test]
    fn test_go_package_is_file_scoped() {
        let source = "package server\n\nimport \"fmt\"\n\ntype Server struct {\n\tAddr string\n}\n\nfunc (s *Server) Start() error {\n\treturn nil\n}\n";
        let symbols = outline(source, Some(Language::Go));
        assert_eq!(
            symbols,
            vec![
                (1, 0, "package server".to_string()),
                (5, 1, "type Server struct".to_string()),
                (6, 2, "Addr string".to_string()),
                (9, 1, "func (s *Server) Start() error".to_string()),
            ]
        );
    }

    #[test]
    fn test_block_comments_are_skipped() {
        let source = "/*\nclass Hidden {\n*/\nclass Shown {\n}\n";
        let symbols = outline(source, Some(Language::Java));
        assert_eq!(symbols, vec![(4, 0, "class Shown".to_string())]);
    }

    #[test]
    fn test_generic_fallback() {
        let source = "module Shop\n  class Cart\n    def total\n    end\n  end\nend\n";
        let symbols = outline(source, None);
        assert_eq!(symbols.len(), 3);
        assert_eq!(symbols[0].2, "module Shop");
    }

    #[test]
    fn test_tool_output_format() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("A.cs"),
            "class Widget\n{\n    void Render() {}\n}\n",
        )
        .unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "just prose\n").unwrap();
        let ctx = ToolExecutionContext::new(temp_dir.path());

        let output = FileOutlineTool.execute(r#"{"path": "A.cs"}"#, &ctx);
        assert_eq!(
            output,
            "Outline of A.cs (2 symbols):\n\n    1: class Widget\n    3:   void Render() {}\n"
        );

        let empty = FileOutlineTool.execute(r#"{"path": "notes.txt"}"#, &ctx);
        assert!(empty.starts_with("No structural symbols found in notes.txt"));
    }
}
