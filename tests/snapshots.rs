//! Snapshot coverage of the emitted grammar text for a handful of canonical
//! schemas, one per schema family (primitive, ref, array, object, pattern).

use schema_gbnf::compile;
use serde_json::json;

#[test]
fn boolean_primitive_snapshot() {
    let grammar = compile(&json!({"type": "boolean"})).unwrap();
    insta::assert_snapshot!(grammar, @r###"
space ::= " "?
boolean ::= ("true" | "false") space
root ::= ("true" | "false") space
"###);
}

#[test]
fn ref_to_integer_snapshot() {
    let schema = json!({
        "$ref": "#/$defs/X",
        "$defs": {"X": {"type": "integer"}}
    });
    let grammar = compile(&schema).unwrap();
    insta::assert_snapshot!(grammar, @r###"
integral-part ::= [0-9] | [1-9] [0-9]{0,15}
space ::= " "?
integer ::= "-"? integral-part space
root ::= integer
"###);
}

#[test]
fn array_single_item_snapshot() {
    let schema = json!({
        "type": "array",
        "items": {"type": "integer"},
        "minItems": 1,
        "maxItems": 1
    });
    let grammar = compile(&schema).unwrap();
    insta::assert_snapshot!(grammar, @r###"
integral-part ::= [0-9] | [1-9] [0-9]{0,15}
space ::= " "?
integer ::= "-"? integral-part space
root ::= "[" space integer "]" space
"###);
}

#[test]
fn object_single_required_property_snapshot() {
    let schema = json!({
        "type": "object",
        "properties": {"a": {"type": "boolean"}},
        "required": ["a"]
    });
    let grammar = compile(&schema).unwrap();
    insta::assert_snapshot!(grammar, @r###"
space ::= " "?
boolean ::= ("true" | "false") space
root-a-kv ::= "\"a\"" space ":" space boolean
root ::= "{" space root-a-kv "}" space
"###);
}

#[test]
fn pattern_char_class_plus_snapshot() {
    let schema = json!({"type": "string", "pattern": "^[A-Z]+$"});
    let grammar = compile(&schema).unwrap();
    insta::assert_snapshot!(grammar, @r###"
pattern-repeat ::= [A-Z]
space ::= " "?
root ::= "\"" pattern-repeat+ "\"" space
"###);
}
