//! Schema visitor: dispatches on schema shape to produce rules.

use std::collections::HashSet;

use serde_json::Value;

use crate::builtins;
use crate::error::SchemaError;
use crate::object;
use crate::refs::RefIndex;
use crate::regex::RegexCompiler;
use crate::rules::RuleTable;
use crate::text::{format_literal, Max};

/// Holds all mutable state shared across a single `visit()` recursion tree.
pub struct Visitor<'a> {
    pub(crate) table: &'a mut RuleTable,
    pub(crate) refs: &'a RefIndex,
    pub(crate) in_progress: HashSet<String>,
    pub(crate) errors: Vec<SchemaError>,
    pub(crate) warnings: Vec<String>,
    pub(crate) dotall: bool,
}

impl<'a> Visitor<'a> {
    pub fn new(table: &'a mut RuleTable, refs: &'a RefIndex, dotall: bool) -> Self {
        Self {
            table,
            refs,
            in_progress: HashSet::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            dotall,
        }
    }

    /// Dispatches on `schema`'s shape in priority order, installing the resulting
    /// rule(s) and returning the name of the rule representing `schema` itself.
    pub fn visit(&mut self, schema: &Value, name: &str) -> String {
        // The root call installs the literal reserved name `root`; every other
        // proposed name is still guarded against colliding with the catalog.
        let name = if name == "root" {
            name.to_string()
        } else {
            builtins::avoid_reserved(name)
        };

        if let Some(Value::String(r)) = schema.get("$ref") {
            let resolved = self.resolve_ref(r);
            return self.table.add_rule(&name, resolved);
        }

        if let Some(alternatives) = schema.get("oneOf").or_else(|| schema.get("anyOf")) {
            if let Value::Array(alts) = alternatives {
                return self.visit_union(&name, alts);
            }
        }

        if let Some(Value::Array(types)) = schema.get("type") {
            let synthetic: Vec<Value> = types
                .iter()
                .filter_map(Value::as_str)
                .map(|t| serde_json::json!({"type": t}))
                .collect();
            return self.visit_union(&name, &synthetic);
        }

        if let Some(const_value) = schema.get("const") {
            let literal = format_literal(&serde_json::to_string(const_value).unwrap_or_default());
            return self.table.add_rule(&name, literal);
        }

        if let Some(Value::Array(values)) = schema.get("enum") {
            let joined = values
                .iter()
                .map(|v| format_literal(&serde_json::to_string(v).unwrap_or_default()))
                .collect::<Vec<_>>()
                .join(" | ");
            return self.table.add_rule(&name, joined);
        }

        // A bare `additionalProperties != true` with no keyword present at all (the
        // fully empty schema) falls through to the object-primitive fallback instead
        // of the object-rule builder, so require one of the two keywords to be present.
        let type_str = schema.get("type").and_then(Value::as_str);
        let has_properties = schema.get("properties").is_some();
        let has_additional = schema.get("additionalProperties").is_some();
        let additional_not_true = !matches!(schema.get("additionalProperties"), Some(Value::Bool(true)));
        if (type_str.is_none() || type_str == Some("object"))
            && (has_properties || additional_not_true)
            && (has_properties || has_additional)
        {
            return object::visit_object(self, &name, schema);
        }

        if let Some(Value::Array(members)) = schema.get("allOf") {
            if type_str.is_none() || type_str == Some("object") {
                return object::visit_all_of(self, &name, members);
            }
        }

        let has_items = schema.get("items").is_some() || schema.get("prefixItems").is_some();
        if (type_str.is_none() || type_str == Some("array")) && has_items {
            return self.visit_array(&name, schema);
        }

        if type_str == Some("string") {
            if let Some(Value::String(pattern)) = schema.get("pattern") {
                let mut compiler = RegexCompiler::new(self.table, self.dotall);
                let result = compiler.compile_pattern(&name, pattern);
                self.errors.extend(compiler.errors.drain(..));
                self.warnings.extend(compiler.warnings.drain(..));
                return result.unwrap_or_else(|| name.clone());
            }
            if let Some(Value::String(format)) = schema.get("format") {
                if is_uuid_format(format) {
                    let rule = builtins::add_format(self.table, "uuid").unwrap();
                    return self.bind_catalog_rule(&name, rule);
                }
                if let Some(rule) = builtins::add_format(self.table, format) {
                    return self.bind_catalog_rule(&name, rule);
                }
                // `format` is present but `<format>-string` has no catalog entry —
                // neither the primitive nor the format catalog covers it.
                self.errors.push(SchemaError::UnknownPrimitive { name: format.clone() });
                return String::new();
            }
            if schema.get("minLength").is_some() || schema.get("maxLength").is_some() {
                let min = schema.get("minLength").and_then(Value::as_u64).unwrap_or(0) as usize;
                let max = schema
                    .get("maxLength")
                    .and_then(Value::as_u64)
                    .map_or(Max::Unbounded, |n| Max::Finite(n as usize));
                let char_rule = builtins::add_char(self.table);
                self.table.add_rule("space", "\" \"?");
                let body = crate::text::build_repetition(&char_rule, min, max, "", false);
                let rhs = format!("\"\\\"\" {body} \"\\\"\" space");
                return self.table.add_rule(&name, rhs);
            }
        }

        if schema.as_object().is_none_or(serde_json::Map::is_empty)
            || (type_str == Some("object") && schema.as_object().map(|m| m.len()) == Some(1))
        {
            let rule = builtins::add_primitive(self.table, "object").unwrap();
            return self.bind_catalog_rule(&name, rule);
        }

        if let Some(t) = type_str {
            if let Some(rule) = builtins::add_primitive(self.table, t) {
                return self.bind_catalog_rule(&name, rule);
            }
        }

        self.errors.push(SchemaError::UnrecognizedSchema {
            dump: schema.to_string(),
        });
        String::new()
    }

    /// Binds `name` to a catalog rule (one installed by `builtins::add_primitive` or
    /// `add_format`). The literal `root` rule gets the catalog entry's own RHS text
    /// inlined, so a schema that resolves straight to a primitive (e.g. `{"type":
    /// "boolean"}`) doesn't leave `root` as a bare one-hop alias; any other name
    /// just reuses the catalog rule directly, since the catalog entry already is a
    /// valid rule representing this schema.
    fn bind_catalog_rule(&mut self, name: &str, catalog_rule: String) -> String {
        if name == "root" {
            let rhs = self.table.get(&catalog_rule).unwrap_or_default().to_string();
            self.table.add_rule("root", rhs)
        } else {
            catalog_rule
        }
    }

    fn visit_union(&mut self, name: &str, alternatives: &[Value]) -> String {
        let rendered: Vec<String> = alternatives
            .iter()
            .enumerate()
            .map(|(i, alt)| {
                let sub_name = if name.is_empty() {
                    format!("alternative-{i}")
                } else {
                    format!("{name}-{i}")
                };
                self.visit(alt, &sub_name)
            })
            .collect();
        self.table.add_rule(name, rendered.join(" | "))
    }

    fn visit_array(&mut self, name: &str, schema: &Value) -> String {
        if let Some(Value::Array(tuple)) = schema.get("prefixItems").or_else(|| schema.get("items")) {
            let rule_names: Vec<String> = tuple
                .iter()
                .enumerate()
                .map(|(i, item)| self.visit(item, &format!("{name}-tuple-{i}")))
                .collect();
            let joined = rule_names.join(" \",\" space ");
            self.table.add_rule("space", "\" \"?");
            return self
                .table
                .add_rule(name, format!("\"[\" space {joined} \"]\" space"));
        }
        let items = schema.get("items").cloned().unwrap_or(Value::Bool(true));
        let item_name = if name.is_empty() { "item".to_string() } else { format!("{name}-item") };
        let item_rule = self.visit(&items, &item_name);
        let min = schema.get("minItems").and_then(Value::as_u64).unwrap_or(0) as usize;
        let max = schema
            .get("maxItems")
            .and_then(Value::as_u64)
            .map_or(Max::Unbounded, |n| Max::Finite(n as usize));
        let body = crate::text::build_repetition(&item_rule, min, max, "\",\" space", false);
        self.table.add_rule("space", "\" \"?");
        self.table.add_rule(name, format!("\"[\" space {body} \"]\" space"))
    }

    /// Resolves a `$ref` string to the name of the rule that represents its target,
    /// recursing into the target schema at most once per URI on the current call
    /// stack (cycle breaking via `in_progress`).
    fn resolve_ref(&mut self, r: &str) -> String {
        let mut ref_name = r.rsplit('/').next().unwrap_or(r).to_string();
        if !self.table.contains(&ref_name) && !self.in_progress.contains(r) {
            self.in_progress.insert(r.to_string());
            match self.refs.get(r).cloned() {
                Some(target) => {
                    ref_name = self.visit(&target, &ref_name);
                }
                None => {
                    self.errors.push(SchemaError::UnresolvedRef {
                        reference: r.to_string(),
                        token: "(unindexed)".to_string(),
                        dump: String::new(),
                    });
                }
            }
            self.in_progress.remove(r);
        }
        ref_name
    }
}

fn is_uuid_format(format: &str) -> bool {
    format == "uuid"
        || (format.len() == 5
            && format.starts_with("uuid")
            && format.as_bytes()[4].is_ascii_digit()
            && matches!(format.as_bytes()[4], b'1'..=b'5'))
}
