//! Object-rule builder: emits rules for JSON objects with required/optional property
//! orderings and optional `additionalProperties`.

use serde_json::Value;

use crate::text::format_literal;
use crate::visitor::Visitor;

fn child_name(parent: &str, suffix: &str) -> String {
    if parent.is_empty() {
        suffix.to_string()
    } else {
        format!("{parent}-{suffix}")
    }
}

fn kv_rule_name(parent: &str, prop: &str) -> String {
    child_name(parent, &format!("{prop}-kv"))
}

fn register_kv(v: &mut Visitor, parent: &str, prop: &str, prop_schema: &Value) -> String {
    let prop_rule = v.visit(prop_schema, &child_name(parent, prop));
    let key_lit = format_literal(&serde_json::to_string(prop).unwrap_or_default());
    let colon_lit = format_literal(":");
    v.table.add_rule("space", "\" \"?");
    let rhs = format!("{key_lit} space {colon_lit} space {prop_rule}");
    v.table.add_rule(&kv_rule_name(parent, prop), rhs)
}

/// Builds the object rule for a schema carrying `properties`/`required`/
/// `additionalProperties`, installing it (and every helper rule it needs) under
/// `name`, and returns the installed rule's name.
pub fn visit_object(v: &mut Visitor, name: &str, schema: &Value) -> String {
    let properties: Vec<(String, Value)> = schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|m| m.iter().map(|(k, val)| (k.clone(), val.clone())).collect())
        .unwrap_or_default();

    let required: std::collections::HashSet<String> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();

    let kv_rules: indexmap::IndexMap<String, String> = properties
        .iter()
        .map(|(prop, sub)| (prop.clone(), register_kv(v, name, prop, sub)))
        .collect();

    let additional = schema.get("additionalProperties");
    let additional_enabled = matches!(additional, Some(Value::Object(_)) | Some(Value::Bool(true)));
    let additional_kv_name = if additional_enabled {
        Some(register_additional_kv(v, name, additional))
    } else {
        None
    };

    let mut required_list: Vec<String> = Vec::new();
    let mut optional_list: Vec<String> = Vec::new();
    for (prop, _) in &properties {
        if required.contains(prop) {
            required_list.push(prop.clone());
        } else {
            optional_list.push(prop.clone());
        }
    }
    if additional_enabled {
        optional_list.push("*".to_string());
    }

    let mut rhs = String::from("\"{\" space");
    for (i, prop) in required_list.iter().enumerate() {
        if i > 0 {
            rhs.push_str(" \",\" space");
        }
        rhs.push(' ');
        rhs.push_str(&kv_rules[prop]);
    }

    if !optional_list.is_empty() {
        let alternatives: Vec<String> = (0..optional_list.len())
            .map(|start| get_recursive_refs(v, name, &optional_list[start..], false, &kv_rules, additional_kv_name.as_deref()))
            .collect();
        let joined = if alternatives.len() == 1 {
            alternatives[0].clone()
        } else {
            format!("( {} )", alternatives.join(" | "))
        };
        if required_list.is_empty() {
            rhs.push_str(&format!(" ( {joined} )?"));
        } else {
            rhs.push_str(&format!(" ( \",\" space ( {joined} ) )?"));
        }
    }

    rhs.push_str(" \"}\" space");
    v.table.add_rule("space", "\" \"?");
    v.table.add_rule(name, rhs)
}

fn register_additional_kv(v: &mut Visitor, name: &str, additional: Option<&Value>) -> String {
    let string_rule = crate::builtins::add_primitive(v.table, "string").unwrap();
    let value_schema = match additional {
        Some(Value::Object(_)) => additional.cloned().unwrap(),
        _ => Value::Object(serde_json::Map::new()),
    };
    let value_rule = v.visit(&value_schema, &child_name(name, "additional-value"));
    let colon_lit = format_literal(":");
    v.table.add_rule("space", "\" \"?");
    let rhs = format!("{string_rule} {colon_lit} space {value_rule}");
    v.table.add_rule(&child_name(name, "additional-kv"), rhs)
}

/// Left-factors the remaining optional keys `ks` into a chain of nested optional
/// groups, per the component design's `get_recursive_refs`.
fn get_recursive_refs(
    v: &mut Visitor,
    name: &str,
    ks: &[String],
    first_is_optional: bool,
    kv_rules: &indexmap::IndexMap<String, String>,
    additional_kv_name: Option<&str>,
) -> String {
    let Some((k, rest)) = ks.split_first() else {
        return String::new();
    };

    let head = if k == "*" {
        let additional_kv = additional_kv_name.expect("additional marker present without additional-kv rule");
        let rhs = format!("{additional_kv} ( \",\" space {additional_kv} )*");
        v.table.add_rule(&child_name(name, "additional-kvs"), rhs)
    } else {
        let kv = &kv_rules[k];
        if first_is_optional {
            format!("( \",\" space {kv} )?")
        } else {
            kv.clone()
        }
    };

    if rest.is_empty() {
        head
    } else {
        let tail_rhs = get_recursive_refs(v, name, rest, true, kv_rules, additional_kv_name);
        let rest_name = child_name(name, &format!("{k}-rest"));
        let tail_rule = v.table.add_rule(&rest_name, tail_rhs);
        format!("{head} {tail_rule}")
    }
}

/// Merges `allOf` members with object shape into a single object rule. Non-object
/// members (arbitrary schemas with no `properties` and no resolvable `$ref`) have no
/// defined merge per the design notes; they are skipped and a warning is recorded
/// naming the skipped member.
pub fn visit_all_of(v: &mut Visitor, name: &str, members: &[Value]) -> String {
    let mut properties = serde_json::Map::new();
    let mut required: Vec<String> = Vec::new();

    for member in members {
        let resolved = if let Some(Value::String(r)) = member.get("$ref") {
            v.refs.get(r).cloned().unwrap_or_else(|| member.clone())
        } else {
            member.clone()
        };

        match resolved.get("properties").and_then(Value::as_object) {
            Some(props) => {
                for (k, val) in props {
                    properties.insert(k.clone(), val.clone());
                }
                if let Some(req) = resolved.get("required").and_then(Value::as_array) {
                    for r in req {
                        if let Some(s) = r.as_str() {
                            if !required.contains(&s.to_string()) {
                                required.push(s.to_string());
                            }
                        }
                    }
                }
            }
            None => {
                v.warnings
                    .push(format!("allOf member with no object shape was skipped: {resolved}"));
            }
        }
    }

    let merged = serde_json::json!({
        "type": "object",
        "properties": Value::Object(properties),
        "required": required,
    });
    visit_object(v, name, &merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refs::RefIndex;
    use crate::rules::RuleTable;
    use serde_json::json;

    #[test]
    fn required_and_optional_properties_produce_expected_shape() {
        let mut table = RuleTable::new();
        let refs = RefIndex::new();
        let mut v = Visitor::new(&mut table, &refs, false);
        let schema = json!({
            "type": "object",
            "properties": {"a": {"type": "string"}, "b": {"type": "number"}},
            "required": ["a"]
        });
        let name = v.visit(&schema, "root");
        let rhs = table.get(&name).unwrap();
        assert!(rhs.starts_with("\"{\" space root-a-kv"));
        assert!(table.contains("root-a-kv"));
        assert!(table.contains("root-b-kv"));
    }

    #[test]
    fn additional_properties_false_emits_no_additional_kv() {
        let mut table = RuleTable::new();
        let refs = RefIndex::new();
        let mut v = Visitor::new(&mut table, &refs, false);
        let schema = json!({
            "type": "object",
            "properties": {"a": {"type": "string"}},
            "required": ["a"],
            "additionalProperties": false
        });
        v.visit(&schema, "root");
        assert!(!table.contains("root-additional-kv"));
    }

    #[test]
    fn additional_properties_true_registers_additional_kv() {
        let mut table = RuleTable::new();
        let refs = RefIndex::new();
        let mut v = Visitor::new(&mut table, &refs, false);
        let schema = json!({"type": "object", "additionalProperties": true});
        v.visit(&schema, "root");
        assert!(table.contains("root-additional-kv"));
    }

    #[test]
    fn all_of_merges_properties_from_members() {
        let mut table = RuleTable::new();
        let refs = RefIndex::new();
        let mut v = Visitor::new(&mut table, &refs, false);
        let schema = json!({
            "allOf": [
                {"type": "object", "properties": {"a": {"type": "string"}}, "required": ["a"]},
                {"type": "object", "properties": {"b": {"type": "number"}}}
            ]
        });
        let name = v.visit(&schema, "root");
        assert!(table.contains(&format!("{name}")));
        assert!(table.contains("root-a-kv"));
        assert!(table.contains("root-b-kv"));
    }

    #[test]
    fn no_properties_and_no_additional_produces_empty_body() {
        let mut table = RuleTable::new();
        let refs = RefIndex::new();
        let mut v = Visitor::new(&mut table, &refs, false);
        let schema = json!({"type": "object", "additionalProperties": false});
        let name = v.visit(&schema, "root");
        assert_eq!(table.get(&name).unwrap(), "\"{\" space \"}\" space");
    }
}
