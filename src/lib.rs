//! schema-gbnf: compiles JSON Schema documents into GBNF grammars.
//!
//! Given a JSON Schema document, [`compile`] emits an equivalent grammar in a simple
//! EBNF-like notation that accepts exactly the set of JSON texts conforming to the
//! input schema — intended to drive a constrained-decoding token sampler.

pub mod builtins;
pub mod error;
pub mod object;
pub mod refs;
pub mod regex;
pub mod rules;
pub mod text;
pub mod visitor;

pub use error::{CompileError, SchemaError};
pub use refs::{Fetcher, NoopFetcher};
pub use rules::RuleTable;

use serde_json::Value;

/// Output of an advanced compilation: the emitted grammar text plus any non-fatal
/// diagnostics (currently only unsupported-regex-syntax warnings).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutput {
    pub grammar: String,
    pub warnings: Vec<String>,
}

/// Configurable behavior for [`Compiler`]. The only knob today is `dotall`, which
/// controls whether `.` in a regex `pattern` matches newlines.
#[derive(Debug, Clone, Copy)]
pub struct CompilerOptions {
    pub dotall: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self { dotall: false }
    }
}

/// A single-use JSON-Schema-to-GBNF converter.
///
/// All state (rule table, reference index, error/warning buffers, in-progress set)
/// lives for the duration of one [`Compiler::compile`] call; there is no
/// cross-invocation cache.
pub struct Compiler<F: Fetcher> {
    options: CompilerOptions,
    fetcher: F,
}

impl<F: Fetcher> Compiler<F> {
    pub fn new(options: CompilerOptions, fetcher: F) -> Self {
        Self { options, fetcher }
    }

    /// Compiles `schema` into a [`CompileOutput`], consuming `self` — the converter
    /// is single-use.
    ///
    /// # Errors
    /// Returns [`CompileError::Fetch`] if the fetcher fails, or
    /// [`CompileError::Errors`] carrying every problem accumulated during traversal
    /// (regex, reference, or schema-shape errors) if any were recorded.
    pub fn compile(self, schema: &Value) -> Result<CompileOutput, CompileError> {
        let mut normalized = schema.clone();
        let root = schema.clone();

        let mut resolver = refs::Resolver::new(&self.fetcher);
        resolver
            .resolve_refs(&mut normalized, &root, "")
            .map_err(CompileError::Fetch)?;

        let mut errors = resolver.errors;
        let refs_index = resolver.refs;

        let mut table = rules::RuleTable::new();
        let mut visitor = visitor::Visitor::new(&mut table, &refs_index, self.options.dotall);
        visitor.visit(&normalized, "root");

        errors.extend(visitor.errors);
        let warnings = visitor.warnings;

        if !errors.is_empty() {
            return Err(CompileError::Errors(errors));
        }

        Ok(CompileOutput {
            grammar: table.render(),
            warnings,
        })
    }
}

/// Compiles `schema` into grammar text using a no-op fetcher and `dotall = false`.
///
/// # Errors
/// See [`Compiler::compile`]. Warnings are discarded; use [`Compiler`] directly to
/// observe them.
pub fn compile(schema: &Value) -> Result<String, CompileError> {
    Compiler::new(CompilerOptions::default(), NoopFetcher)
        .compile(schema)
        .map(|output| output.grammar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compile_boolean_schema() {
        let grammar = compile(&json!({"type": "boolean"})).unwrap();
        assert!(grammar.contains("root ::= (\"true\" | \"false\") space"));
    }

    #[test]
    fn compile_is_deterministic() {
        let schema = json!({"type": "object", "properties": {"a": {"type": "string"}}, "required": ["a"]});
        let first = compile(&schema).unwrap();
        let second = compile(&schema).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn compile_unanchored_pattern_reports_error() {
        let schema = json!({"type": "string", "pattern": "[0-9]+"});
        let err = compile(&schema).unwrap_err();
        assert!(err.to_string().contains("Pattern must start with"));
    }

    #[test]
    fn compile_every_rule_name_is_defined() {
        let schema = json!({
            "type": "object",
            "properties": {
                "a": {"type": "string"},
                "b": {"type": "array", "items": {"type": "integer"}}
            },
            "required": ["a"]
        });
        let grammar = compile(&schema).unwrap();
        let defined: std::collections::HashSet<&str> = grammar
            .lines()
            .filter_map(|line| line.split(" ::= ").next())
            .collect();
        for line in grammar.lines() {
            let Some((_, rhs)) = line.split_once(" ::= ") else { continue };
            for token in rhs.split_whitespace() {
                let candidate = token.trim_matches(|c: char| !(c.is_ascii_alphanumeric() || c == '-'));
                if candidate.is_empty() || candidate.chars().next().unwrap().is_ascii_digit() {
                    continue;
                }
                if token.starts_with('"') {
                    continue;
                }
                assert!(
                    defined.contains(candidate),
                    "rule {candidate} referenced in `{line}` is not defined"
                );
            }
        }
    }

    #[test]
    fn root_rule_exists_exactly_once() {
        let grammar = compile(&json!({"type": "integer"})).unwrap();
        let root_lines: Vec<&str> = grammar.lines().filter(|l| l.starts_with("root ::=")).collect();
        assert_eq!(root_lines.len(), 1);
    }

    #[test]
    fn fetch_failure_propagates_immediately() {
        struct FailingFetcher;
        impl Fetcher for FailingFetcher {
            fn fetch(&self, _uri: &str) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
                Err("network down".into())
            }
        }
        let schema = json!({"$ref": "https://example.com/defs.json#/X"});
        let result = Compiler::new(CompilerOptions::default(), FailingFetcher).compile(&schema);
        assert!(matches!(result, Err(CompileError::Fetch(_))));
    }

    #[test]
    fn cyclic_schema_compiles_without_infinite_recursion() {
        let schema = json!({
            "$ref": "#/$defs/A",
            "$defs": {"A": {"type": "object", "properties": {"next": {"$ref": "#/$defs/A"}}}}
        });
        let grammar = compile(&schema).unwrap();
        assert!(grammar.contains("A ::="));
    }
}
