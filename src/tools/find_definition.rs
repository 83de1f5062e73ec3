//! Definition-site search: where a symbol is declared, not where it is used.

use crate::scanner::IncludeFilter;
use crate::tools::languages::{definition_templates, Language};
use crate::tools::outline::clean_signature;
use crate::tools::search::{search_content, ContentQuery, LineFilter};
use crate::tools::{optional_str, required_str, Tool, ToolError, ToolExecutionContext};
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::Path;

const MAX_RESULTS: usize = 20;

pub struct FindDefinitionTool;

impl Tool for FindDefinitionTool {
    fn name(&self) -> &str {
        "find_definition"
    }

    fn description(&self) -> &str {
        "Find where a symbol (class, interface, struct, enum, function, method, type alias, constant) is \
         defined. More precise than grep: usages are ignored. Pass 'include' (e.g. '*.go') to restrict \
         the search to one language."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "Exact, case-sensitive name of the symbol"
                },
                "include": {
                    "type": "string",
                    "description": "Optional glob restricting which files are searched, e.g. '*.cs'"
                }
            },
            "required": ["symbol"]
        })
    }

    fn run(&self, args: &Map<String, Value>, ctx: &ToolExecutionContext) -> Result<String, ToolError> {
        let symbol = required_str(args, "symbol")?.trim();
        let include = optional_str(args, "include")
            .map(IncludeFilter::parse)
            .transpose()
            .map_err(|e| ToolError::InvalidArgument {
                name: "include",
                reason: e.to_string(),
            })?;

        let language = include
            .as_ref()
            .and_then(|f| f.extension())
            .and_then(|ext| Language::from_extension(&ext));
        let pattern = definition_pattern(symbol, language);
        let matcher = DefinitionMatcher::new(symbol, language).map_err(|e| ToolError::InvalidArgument {
            name: "symbol",
            reason: e.to_string(),
        })?;
        let line_filter: &LineFilter<'_> = &|path, line| matcher.is_definition(path, line);

        let query = ContentQuery {
            pattern: &pattern,
            case_insensitive: false,
            include: include.as_ref(),
            limit: MAX_RESULTS,
            line_filter: Some(line_filter),
        };
        let outcome = search_content(ctx, &query).map_err(|e| ToolError::InvalidArgument {
            name: "symbol",
            reason: e.to_string(),
        })?;

        if outcome.matches.is_empty() {
            return Ok(format!(
                "No definition found for '{}'. Check the spelling, or use grep to find where it is used.",
                symbol
            ));
        }

        let mut output = format!(
            "Found {} definition(s) for '{}':\n",
            outcome.matches.len(),
            symbol
        );
        for hit in &outcome.matches {
            output.push_str(&format!(
                "\n{}:{}\n    {}\n",
                hit.relative_path,
                hit.line_number,
                clean_signature(&hit.line_text)
            ));
        }
        if outcome.truncated {
            output.push_str(&format!(
                "\n(Results truncated at {} definitions. Use include to narrow the search to one language.)\n",
                MAX_RESULTS
            ));
        }
        Ok(output)
    }
}

/// One regex OR-combining the definition templates of `language`, or of
/// every language when `None`.
pub fn definition_pattern(symbol: &str, language: Option<Language>) -> String {
    let escaped = regex::escape(symbol);
    let languages: Vec<Language> = match language {
        Some(lang) => vec![lang],
        None => Language::ALL.to_vec(),
    };

    let mut seen = std::collections::HashSet::new();
    languages
        .into_iter()
        .flat_map(|lang| definition_templates(lang).iter())
        .filter(|template| seen.insert(**template))
        .map(|template| format!("(?:{})", template.replace("{symbol}", &escaped)))
        .collect::<Vec<_>>()
        .join("|")
}

/// Checks a candidate line against the templates of its own file's language.
/// The combined pattern only preselects lines; a C# usage such as
/// `static Widget Create()` must not pass as a Rust `static` item.
struct DefinitionMatcher {
    by_language: HashMap<Language, Regex>,
    /// Used for code files without a dedicated table.
    any_language: Regex,
}

impl DefinitionMatcher {
    fn new(symbol: &str, language: Option<Language>) -> Result<Self, regex::Error> {
        let languages = match language {
            Some(lang) => vec![lang],
            None => Language::ALL.to_vec(),
        };
        let mut by_language = HashMap::new();
        for lang in languages {
            by_language.insert(lang, Regex::new(&definition_pattern(symbol, Some(lang)))?);
        }
        Ok(Self {
            by_language,
            any_language: Regex::new(&definition_pattern(symbol, language))?,
        })
    }

    fn is_definition(&self, path: &Path, line: &str) -> bool {
        match Language::from_path(path) {
            Some(lang) => self
                .by_language
                .get(&lang)
                .is_some_and(|re| re.is_match(line)),
            None => self.any_language.is_match(line),
        }
    }
}
