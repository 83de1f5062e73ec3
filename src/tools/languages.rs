//! Per-language pattern tables.
//!
//! Outline rules, definition anchors, import statements and exported
//! names are kept as data keyed by [`Language`]; the tools that use them
//! run one generic scan over whatever table applies. Supporting another
//! language means adding table entries here.

use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

/// Languages with dedicated tables. Files of any other kind fall back to
/// the generic outline table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    CSharp,
    Java,
    Go,
    Rust,
    Python,
    TypeScript,
    JavaScript,
    Cpp,
}

impl Language {
    pub const ALL: [Language; 8] = [
        Language::CSharp,
        Language::Java,
        Language::Go,
        Language::Rust,
        Language::Python,
        Language::TypeScript,
        Language::JavaScript,
        Language::Cpp,
    ];

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Language::CSharp => &["cs", "csx"],
            Language::Java => &["java"],
            Language::Go => &["go"],
            Language::Rust => &["rs"],
            Language::Python => &["py", "pyi"],
            Language::TypeScript => &["ts", "tsx", "mts", "cts"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::Cpp => &["c", "h", "cc", "cpp", "cxx", "hpp", "hh", "hxx"],
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.extensions().contains(&ext.as_str()))
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// What a matched outline line introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Namespace/module block; its braces do not count as nesting.
    Namespace,
    /// Type whose body members are listed one level deeper.
    Type,
    /// Function, field, property and everything else without listed children.
    Member,
}

/// How nesting depth is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthMode {
    Braces,
    /// Four columns of indentation per level.
    Indentation,
}

struct OutlineSource {
    depth_mode: DepthMode,
    file_scoped_namespace: Option<&'static str>,
    line_comments: &'static [&'static str],
    block_comments: &'static [(&'static str, &'static str)],
    /// Leading words that never start a declaration in this language.
    ignored_words: &'static [&'static str],
    rules: &'static [(SymbolKind, &'static str)],
}

const C_COMMENTS: &[(&str, &str)] = &[("/*", "*/")];

fn outline_source(lang: Option<Language>) -> OutlineSource {
    match lang {
        Some(Language::CSharp) => OutlineSource {
            depth_mode: DepthMode::Braces,
            file_scoped_namespace: Some(r"^namespace\s+[\w.]+\s*;"),
            line_comments: &["//"],
            block_comments: C_COMMENTS,
            ignored_words: &["using", "global", "extern"],
            rules: &[
                (SymbolKind::Namespace, r"^namespace\s+[\w.]+"),
                (
                    SymbolKind::Type,
                    r"^(?:\[.*\]\s*)?(?:(?:public|private|protected|internal|static|sealed|abstract|partial|readonly|ref|unsafe|new|file)\s+)*(?:class|interface|struct|enum|record(?:\s+(?:class|struct))?)\s+\w+",
                ),
                (
                    SymbolKind::Member,
                    r"^(?:(?:public|private|protected|internal|static|unsafe|new)\s+)*delegate\s+",
                ),
                (
                    SymbolKind::Member,
                    r"^(?:(?:public|private|protected|internal|static|virtual|override|abstract|sealed|new)\s+)*event\s+",
                ),
                (
                    SymbolKind::Member,
                    r"^(?:(?:public|private|protected|internal|static)\s+)+[A-Za-z_]\w*\s*\(",
                ),
                (
                    SymbolKind::Member,
                    r"^(?:(?:public|private|protected|internal|static|virtual|override|abstract|sealed|async|extern|unsafe|new|partial|readonly|const|volatile|required)\s+)*[A-Za-z_][\w.]*(?:<.*>)?(?:\[[,\s]*\])*\??\s+[A-Za-z_]\w*\s*(?:<[^>]*>)?\s*(?:\(|\{|=>|=|;|$)",
                ),
            ],
        },
        Some(Language::Java) => OutlineSource {
            depth_mode: DepthMode::Braces,
            file_scoped_namespace: Some(r"^package\s+[\w.]+\s*;"),
            line_comments: &["//"],
            block_comments: C_COMMENTS,
            ignored_words: &["import", "package"],
            rules: &[
                (
                    SymbolKind::Type,
                    r"^(?:@\w+(?:\([^)]*\))?\s+)*(?:(?:public|private|protected|static|final|abstract|sealed|non-sealed|strictfp)\s+)*(?:class|interface|enum|record|@interface)\s+\w+",
                ),
                (
                    SymbolKind::Member,
                    r"^(?:(?:public|private|protected)\s+)+[A-Z]\w*\s*\(",
                ),
                (
                    SymbolKind::Member,
                    r"^(?:(?:public|private|protected|static|final|abstract|synchronized|native|default|transient|volatile)\s+)*(?:<[^>]*>\s+)?[A-Za-z_][\w.]*(?:<.*>)?(?:\[\])*\s+[A-Za-z_]\w*\s*(?:\(|=|;|$)",
                ),
            ],
        },
        Some(Language::Go) => OutlineSource {
            depth_mode: DepthMode::Braces,
            file_scoped_namespace: Some(r"^package\s+\w+"),
            line_comments: &["//"],
            block_comments: C_COMMENTS,
            ignored_words: &["import", "package"],
            rules: &[
                (
                    SymbolKind::Type,
                    r"^type\s+\w+(?:\[[^\]]*\])?\s+(?:struct|interface)\b",
                ),
                (SymbolKind::Member, r"^type\s+\w+"),
                (SymbolKind::Member, r"^func\s+(?:\([^)]*\)\s*)?\w+"),
                (SymbolKind::Member, r"^(?:var|const)\s+\w+"),
                (SymbolKind::Member, r"^[A-Za-z_]\w*\s*\("),
                (
                    SymbolKind::Member,
                    r"^[A-Za-z_]\w*(?:\s*,\s*\w+)*\s+[\*\[\]\w.]+",
                ),
            ],
        },
        Some(Language::Rust) => OutlineSource {
            depth_mode: DepthMode::Braces,
            file_scoped_namespace: None,
            line_comments: &["//"],
            block_comments: C_COMMENTS,
            ignored_words: &["use", "extern", "let"],
            rules: &[
                (
                    SymbolKind::Namespace,
                    r"^(?:pub(?:\([^)]*\))?\s+)?mod\s+\w+\s*\{",
                ),
                (SymbolKind::Member, r"^(?:pub(?:\([^)]*\))?\s+)?mod\s+\w+"),
                (
                    SymbolKind::Type,
                    r"^(?:pub(?:\([^)]*\))?\s+)?(?:unsafe\s+)?(?:struct|enum|union|trait)\s+\w+",
                ),
                (SymbolKind::Type, r"^(?:unsafe\s+)?impl\b"),
                (
                    SymbolKind::Member,
                    r#"^(?:pub(?:\([^)]*\))?\s+)?(?:(?:const|async|unsafe|extern(?:\s+"[^"]*")?)\s+)*fn\s+\w+"#,
                ),
                (
                    SymbolKind::Member,
                    r"^(?:pub(?:\([^)]*\))?\s+)?(?:type|const|static)\s+\w+",
                ),
                (SymbolKind::Member, r"^macro_rules!\s*\w+"),
                (
                    SymbolKind::Member,
                    r"^(?:pub(?:\([^)]*\))?\s+)?[a-z_]\w*\s*:\s*\S",
                ),
                (SymbolKind::Member, r"^[A-Z]\w*\s*(?:[({,=]|$)"),
            ],
        },
        Some(Language::Python) => OutlineSource {
            depth_mode: DepthMode::Indentation,
            file_scoped_namespace: None,
            line_comments: &["#"],
            block_comments: &[("\"\"\"", "\"\"\""), ("'''", "'''")],
            ignored_words: &["import", "from"],
            rules: &[
                (SymbolKind::Type, r"^class\s+\w+"),
                (SymbolKind::Member, r"^(?:async\s+)?def\s+\w+"),
            ],
        },
        Some(Language::TypeScript) | Some(Language::JavaScript) => OutlineSource {
            depth_mode: DepthMode::Braces,
            file_scoped_namespace: None,
            line_comments: &["//"],
            block_comments: C_COMMENTS,
            ignored_words: &["import"],
            rules: &[
                (
                    SymbolKind::Namespace,
                    r#"^(?:export\s+)?(?:declare\s+)?(?:namespace|module)\s+[\w.'"-]+"#,
                ),
                (
                    SymbolKind::Type,
                    r"^(?:export\s+)?(?:default\s+)?(?:declare\s+)?(?:abstract\s+)?class\s+\w+",
                ),
                (
                    SymbolKind::Type,
                    r"^(?:export\s+)?(?:declare\s+)?interface\s+\w+",
                ),
                (
                    SymbolKind::Type,
                    r"^(?:export\s+)?(?:declare\s+)?(?:const\s+)?enum\s+\w+",
                ),
                (
                    SymbolKind::Member,
                    r"^(?:export\s+)?(?:declare\s+)?type\s+\w+",
                ),
                (
                    SymbolKind::Member,
                    r"^(?:export\s+)?(?:default\s+)?(?:declare\s+)?(?:async\s+)?function\*?\s*\w*\s*[<(]",
                ),
                (
                    SymbolKind::Member,
                    r"^(?:export\s+)?(?:declare\s+)?(?:const|let|var)\s+\w+",
                ),
                (
                    SymbolKind::Member,
                    r"^(?:(?:public|private|protected|static|readonly|async|abstract|override|declare|get|set)\s+)*[#\w$]+\??\s*(?:<[^>]*>)?\s*\(",
                ),
                (
                    SymbolKind::Member,
                    r"^(?:(?:public|private|protected|static|readonly|abstract|override|declare)\s+)*[#\w$]+[?!]?\s*[:=;]",
                ),
            ],
        },
        Some(Language::Cpp) => OutlineSource {
            depth_mode: DepthMode::Braces,
            file_scoped_namespace: None,
            line_comments: &["//"],
            block_comments: C_COMMENTS,
            ignored_words: &["using"],
            rules: &[
                (
                    SymbolKind::Namespace,
                    r"^(?:inline\s+)?namespace(?:\s+[\w:]+)?\s*(?:\{|$)",
                ),
                (SymbolKind::Namespace, r#"^extern\s+"C"\s*(?:\{|$)"#),
                (
                    SymbolKind::Type,
                    r"^(?:template\s*<.*>\s*)?(?:typedef\s+)?(?:class|struct|union|enum(?:\s+class|\s+struct)?)\s+\w+[^;]*$",
                ),
                (SymbolKind::Member, r"^#\s*define\s+\w+"),
                (SymbolKind::Member, r"^typedef\s+.+;"),
                (
                    SymbolKind::Member,
                    r"^(?:template\s*<.*>\s*)?[A-Za-z_][\w:<>,\*&\s]*[\s\*&:]~?[A-Za-z_]\w*\s*\(",
                ),
                (
                    SymbolKind::Member,
                    r"^(?:explicit\s+|virtual\s+)?~?[A-Za-z_]\w*\s*\([^)]*\)\s*(?:const\s*)?(?:override\s*)?(?:=\s*\w+\s*)?[;{]?\s*$",
                ),
                (
                    SymbolKind::Member,
                    r"^[A-Za-z_][\w:<>,\*&\s]*[\s\*&][A-Za-z_]\w*(?:\[[^\]]*\])?\s*(?:=[^;]*)?;",
                ),
            ],
        },
        None => OutlineSource {
            depth_mode: DepthMode::Braces,
            file_scoped_namespace: None,
            line_comments: &["//", "#"],
            block_comments: C_COMMENTS,
            ignored_words: &[],
            rules: &[
                (
                    SymbolKind::Type,
                    r"^(?:(?:pub|public|private|protected|internal|export|static|abstract|final|sealed|open|data|case)\s+)*(?:class|struct|interface|enum|trait|impl|module|object|protocol|record|extension|actor)\b",
                ),
                (
                    SymbolKind::Member,
                    r"^(?:(?:pub|public|private|protected|internal|export|static|async|override|open|inline|suspend)\s+)*(?:fn|func|fun|function|def|sub|proc|method)\s+\w+",
                ),
            ],
        },
    }
}

/// Compiled outline table for one language (or the generic fallback).
pub struct OutlineTable {
    pub depth_mode: DepthMode,
    pub file_scoped_namespace: Option<Regex>,
    pub line_comments: &'static [&'static str],
    pub block_comments: &'static [(&'static str, &'static str)],
    pub ignored_words: &'static [&'static str],
    pub rules: Vec<(SymbolKind, Regex)>,
}

impl OutlineTable {
    fn compile(source: OutlineSource) -> Self {
        let rules = source
            .rules
            .iter()
            .map(|(kind, pattern)| (*kind, compile(pattern)))
            .collect();
        Self {
            depth_mode: source.depth_mode,
            file_scoped_namespace: source.file_scoped_namespace.map(compile),
            line_comments: source.line_comments,
            block_comments: source.block_comments,
            ignored_words: source.ignored_words,
            rules,
        }
    }

    /// First rule matching the trimmed line.
    pub fn classify(&self, trimmed: &str) -> Option<SymbolKind> {
        self.rules
            .iter()
            .find(|(_, re)| re.is_match(trimmed))
            .map(|(kind, _)| *kind)
    }
}

fn compile(pattern: &str) -> Regex {
    // Table patterns are constants; a failure here is a programming error.
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid table pattern {pattern:?}: {e}"))
}

static OUTLINE_TABLES: LazyLock<HashMap<Option<Language>, OutlineTable>> = LazyLock::new(|| {
    Language::ALL
        .into_iter()
        .map(Some)
        .chain(std::iter::once(None))
        .map(|lang| (lang, OutlineTable::compile(outline_source(lang))))
        .collect()
});

pub fn outline_table(lang: Option<Language>) -> &'static OutlineTable {
    // Every key, including None, is inserted above.
    &OUTLINE_TABLES[&lang]
}

/// Words that start statements, never declarations.
pub const CONTROL_WORDS: &[&str] = &[
    "if", "else", "for", "foreach", "while", "do", "switch", "case", "return", "throw", "try",
    "catch", "finally", "break", "continue", "goto", "yield", "await", "new", "delete", "lock",
    "fixed", "checked", "unchecked", "with", "assert", "pass", "raise", "print", "echo",
    "defer", "go", "select", "elif", "except", "match",
];

/// Definition-anchoring templates; `{symbol}` is replaced by the escaped name.
pub fn definition_templates(lang: Language) -> &'static [&'static str] {
    match lang {
        Language::CSharp => &[
            r"\b(?:class|interface|struct|enum|record(?:\s+(?:class|struct))?)\s+{symbol}\b",
            r"\bdelegate\s+[\w<>\[\],.?]+\s+{symbol}\s*[<(]",
            r"\bevent\s+[\w<>\[\],.?]+\s+{symbol}\b",
            r"^\s*(?:(?:public|private|protected|internal|static|virtual|override|abstract|sealed|async|extern|unsafe|new|partial|readonly)\s+)+[\w<>\[\],.?]+\s+{symbol}\s*(?:<[^>]*>)?\s*(?:\(|\{|=>)",
            r"^\s*[\w<>\[\],.?]+\s+{symbol}\s*\([^;=]*$",
            r"\b(?:public|private|protected|internal)\s+{symbol}\s*\(",
        ],
        Language::Java => &[
            r"\b(?:class|interface|enum|record|@interface)\s+{symbol}\b",
            r"^\s*(?:(?:public|private|protected|static|final|abstract|synchronized|native|default)\s+)*(?:<[^>]*>\s+)?[\w<>\[\],.?]+\s+{symbol}\s*\([^;]*$",
            r"^\s*(?:(?:public|private|protected|static|final|volatile|transient)\s+)+[\w<>\[\],.?]+\s+{symbol}\s*[=;]",
        ],
        Language::Go => &[
            r"\bfunc\s+(?:\([^)]*\)\s+)?{symbol}\s*[\[(]",
            r"\btype\s+{symbol}[\s\[]",
            r"^\s*(?:var|const)\s+{symbol}\b",
        ],
        Language::Rust => &[
            r"\b(?:fn|struct|enum|trait|type|union|mod|const|static)\s+{symbol}\b",
            r"\bmacro_rules!\s*{symbol}\b",
        ],
        Language::Python => &[
            r"^\s*(?:async\s+)?def\s+{symbol}\s*\(",
            r"^\s*class\s+{symbol}\b",
            r"^{symbol}\s*(?::[^=]+)?=[^=]",
        ],
        Language::TypeScript => &[
            r"\b(?:class|interface|enum|namespace|module)\s+{symbol}\b",
            r"\btype\s+{symbol}\s*(?:<[^>]*>)?\s*=",
            r"\bfunction\*?\s+{symbol}\s*[<(]",
            r"\b(?:const|let|var)\s+{symbol}\s*(?::[^=]+)?=",
            r"^\s*(?:(?:public|private|protected|static|async|abstract|override|readonly|get|set)\s+)*{symbol}\s*(?:<[^>]*>)?\s*\([^;]*\)\s*(?::[^={;]+)?\s*\{",
        ],
        Language::JavaScript => &[
            r"\bclass\s+{symbol}\b",
            r"\bfunction\*?\s+{symbol}\s*\(",
            r"\b(?:const|let|var)\s+{symbol}\s*=",
            r"^\s*(?:(?:static|async|get|set)\s+)*{symbol}\s*\([^;]*\)\s*\{",
            r"\b{symbol}\s*:\s*(?:async\s+)?function\b",
        ],
        Language::Cpp => &[
            r"\b(?:class|struct|union|enum(?:\s+class)?|namespace)\s+{symbol}\b[^;]*$",
            r"#\s*define\s+{symbol}\b",
            r"\btypedef\b.*\b{symbol}\s*;",
            r"\busing\s+{symbol}\s*=",
            r"^[\w:<>,\*&\s]*[\s\*&:]{symbol}\s*\([^;]*$",
        ],
    }
}

/// Import-statement rules for one language.
pub struct ImportTable {
    pub line_comments: &'static [&'static str],
    pub block_comments: &'static [(&'static str, &'static str)],
    /// Lines that may precede imports without ending the import block.
    pub preamble: Vec<Regex>,
    /// Single-line imports; group 1 is the imported target.
    pub imports: Vec<Regex>,
    /// Multi-line import groups: (start, item, end). Groups 1 capture targets.
    pub blocks: Vec<(Regex, Option<Regex>, Regex)>,
}

struct ImportSource {
    line_comments: &'static [&'static str],
    block_comments: &'static [(&'static str, &'static str)],
    preamble: &'static [&'static str],
    imports: &'static [&'static str],
    blocks: &'static [(&'static str, Option<&'static str>, &'static str)],
}

fn import_source(lang: Language) -> ImportSource {
    match lang {
        Language::CSharp => ImportSource {
            line_comments: &["//"],
            block_comments: C_COMMENTS,
            preamble: &[
                r"^namespace\s+[\w.]+\s*;",
                r"^#(?:region|endregion|nullable|pragma|if|endif|define)\b",
                r"^\[assembly:",
            ],
            imports: &[r"^(?:global\s+)?using\s+(?:static\s+)?(?:\w+\s*=\s*)?([\w.]+)\s*;"],
            blocks: &[],
        },
        Language::Java => ImportSource {
            line_comments: &["//"],
            block_comments: C_COMMENTS,
            preamble: &[r"^package\s+[\w.]+\s*;"],
            imports: &[r"^import\s+(?:static\s+)?([\w.]+(?:\.\*)?)\s*;"],
            blocks: &[],
        },
        Language::Go => ImportSource {
            line_comments: &["//"],
            block_comments: C_COMMENTS,
            preamble: &[r"^package\s+\w+"],
            imports: &[r#"^import\s+(?:[\w.]+\s+)?"([^"]+)""#],
            blocks: &[(
                r"^import\s*\(\s*$",
                Some(r#"^(?:[\w.]+\s+)?"([^"]+)""#),
                r"^\)",
            )],
        },
        Language::Rust => ImportSource {
            line_comments: &["//"],
            block_comments: C_COMMENTS,
            preamble: &[r"^#!?\[.*\]\s*$"],
            imports: &[
                r"^(?:pub(?:\([^)]*\))?\s+)?use\s+([\w:]+)",
                r"^(?:pub(?:\([^)]*\))?\s+)?mod\s+(\w+)\s*;",
                r"^extern\s+crate\s+(\w+)",
            ],
            blocks: &[(
                r"^(?:pub(?:\([^)]*\))?\s+)?use\s+([\w:]+)\{[^}]*$",
                None,
                r"\}\s*;",
            )],
        },
        Language::Python => ImportSource {
            line_comments: &["#"],
            block_comments: &[("\"\"\"", "\"\"\""), ("'''", "'''")],
            preamble: &[],
            imports: &[
                r"^import\s+([\w.]+)",
                r"^from\s+(\.*[\w.]*)\s+import\b",
            ],
            blocks: &[(r"^from\s+(\.*[\w.]*)\s+import\s*\([^)]*$", None, r"\)")],
        },
        Language::TypeScript | Language::JavaScript => ImportSource {
            line_comments: &["//"],
            block_comments: C_COMMENTS,
            preamble: &[r#"^['"]use (?:strict|client|server)['"];?$"#],
            imports: &[
                r#"^import\s+(?:type\s+)?(?:[\w*{}\s,$]+\s+from\s+)?['"]([^'"]+)['"]"#,
                r#"^export\s+(?:type\s+)?(?:\*(?:\s+as\s+\w+)?|\{[^}]*\})\s+from\s+['"]([^'"]+)['"]"#,
                r#"^(?:const|let|var)\s+[\w{}\s,:$]+=\s*require\(\s*['"]([^'"]+)['"]\s*\)"#,
                r#"^require\(\s*['"]([^'"]+)['"]\s*\)"#,
            ],
            blocks: &[(
                r"^(?:import|export)\s+(?:type\s+)?\{[^}]*$",
                None,
                r#"^\}.*\bfrom\s+['"]([^'"]+)['"]"#,
            )],
        },
        Language::Cpp => ImportSource {
            line_comments: &["//"],
            block_comments: C_COMMENTS,
            preamble: &[
                r"^#\s*pragma\s+once",
                r"^#\s*(?:ifndef|ifdef|if|define|endif|else|elif)\b",
            ],
            imports: &[r#"^#\s*(?:include|import)\s*[<"]([^>"]+)[>"]"#],
            blocks: &[],
        },
    }
}

static IMPORT_TABLES: LazyLock<HashMap<Language, ImportTable>> = LazyLock::new(|| {
    Language::ALL
        .into_iter()
        .map(|lang| {
            let source = import_source(lang);
            let table = ImportTable {
                line_comments: source.line_comments,
                block_comments: source.block_comments,
                preamble: source.preamble.iter().map(|p| compile(p)).collect(),
                imports: source.imports.iter().map(|p| compile(p)).collect(),
                blocks: source
                    .blocks
                    .iter()
                    .map(|(start, item, end)| (compile(start), item.map(compile), compile(end)))
                    .collect(),
            };
            (lang, table)
        })
        .collect()
});

pub fn import_table(lang: Language) -> &'static ImportTable {
    &IMPORT_TABLES[&lang]
}

/// Patterns capturing (group 1) the names a file defines for others to use.
fn export_patterns(lang: Language) -> &'static [&'static str] {
    match lang {
        Language::CSharp => &[
            r"^\s*(?:\[.*\]\s*)?(?:(?:public|internal|private|protected|static|sealed|abstract|partial|readonly|ref|unsafe|file)\s+)*(?:class|interface|struct|enum|record(?:\s+(?:class|struct))?)\s+(\w+)",
            r"\bdelegate\s+[\w<>\[\],.?]+\s+(\w+)\s*[<(]",
        ],
        Language::Java => &[
            r"^\s*(?:@\w+(?:\([^)]*\))?\s+)*(?:(?:public|private|protected|static|final|abstract|sealed|non-sealed)\s+)*(?:class|interface|enum|record|@interface)\s+(\w+)",
        ],
        Language::Go => &[
            r"^func\s+(?:\([^)]*\)\s*)?([A-Z]\w*)",
            r"^type\s+([A-Z]\w*)",
        ],
        Language::Rust => &[
            r"^\s*pub(?:\([^)]*\))?\s+(?:(?:async|const|unsafe)\s+)*(?:fn|struct|enum|trait|type|const|static|union)\s+(\w+)",
            r"^\s*macro_rules!\s*(\w+)",
        ],
        Language::Python => &[r"^(?:async\s+)?(?:class|def)\s+([A-Za-z]\w*)"],
        Language::TypeScript | Language::JavaScript => &[
            r"^export\s+(?:default\s+)?(?:declare\s+)?(?:abstract\s+)?(?:async\s+)?(?:class|interface|function\*?|const|let|var|type|enum|namespace)\s+([\w$]+)",
        ],
        Language::Cpp => &[
            r"^\s*(?:template\s*<.*>\s*)?(?:class|struct|union|enum(?:\s+class)?)\s+(\w+)[^;]*$",
        ],
    }
}

static EXPORT_TABLES: LazyLock<HashMap<Language, Vec<Regex>>> = LazyLock::new(|| {
    Language::ALL
        .into_iter()
        .map(|lang| (lang, export_patterns(lang).iter().map(|p| compile(p)).collect()))
        .collect()
});

pub fn export_table(lang: Language) -> &'static [Regex] {
    &EXPORT_TABLES[&lang]
}

/// Export patterns used for files whose language has no dedicated table.
static GENERIC_EXPORTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![compile(
        r"^\s*(?:(?:pub|public|export|open|data)\s+)*(?:class|struct|interface|enum|trait|module|object|protocol|record)\s+(\w+)",
    )]
});

pub fn generic_export_table() -> &'static [Regex] {
    &GENERIC_EXPORTS
}
