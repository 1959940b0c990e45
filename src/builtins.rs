//! Built-in rule catalog: fixed productions for JSON primitives and string formats.

use crate::rules::RuleTable;

/// Names reserved by the catalog; a user-proposed name colliding with one of these is
/// renamed by appending `-` before being handed to [`RuleTable::add_rule`].
pub const RESERVED: &[&str] = &[
    "root",
    "space",
    "boolean",
    "null",
    "decimal-part",
    "integral-part",
    "number",
    "integer",
    "char",
    "string",
    "value",
    "object",
    "array",
    "uuid",
    "date",
    "time",
    "date-time",
    "date-string",
    "time-string",
    "date-time-string",
    "uuid-string",
];

#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

/// Renames `name` by appending `-` if it collides with a reserved catalog name.
#[must_use]
pub fn avoid_reserved(name: &str) -> String {
    if is_reserved(name) {
        format!("{name}-")
    } else {
        name.to_string()
    }
}

fn add_space(table: &mut RuleTable) -> String {
    table.add_rule("space", "\" \"?")
}

fn add_boolean(table: &mut RuleTable) -> String {
    add_space(table);
    table.add_rule("boolean", "(\"true\" | \"false\") space")
}

fn add_null(table: &mut RuleTable) -> String {
    add_space(table);
    table.add_rule("null", "\"null\" space")
}

fn add_decimal_part(table: &mut RuleTable) -> String {
    table.add_rule("decimal-part", "[0-9] [0-9]{0,15}")
}

fn add_integral_part(table: &mut RuleTable) -> String {
    table.add_rule("integral-part", "[0-9] | [1-9] [0-9]{0,15}")
}

fn add_number(table: &mut RuleTable) -> String {
    add_integral_part(table);
    add_decimal_part(table);
    add_space(table);
    table.add_rule(
        "number",
        "\"-\"? integral-part (\".\" decimal-part)? ([eE] [-+]? integral-part)? space",
    )
}

fn add_integer(table: &mut RuleTable) -> String {
    add_integral_part(table);
    add_space(table);
    table.add_rule("integer", "\"-\"? integral-part space")
}

pub fn add_char(table: &mut RuleTable) -> String {
    table.add_rule(
        "char",
        "[^\"\\\\] | \"\\\\\" ([\"\\\\/bfnrt] | \"u\" [0-9a-fA-F]{4})",
    )
}

fn add_string(table: &mut RuleTable) -> String {
    add_char(table);
    add_space(table);
    table.add_rule("string", "\"\\\"\" char* \"\\\"\" space")
}

fn add_array(table: &mut RuleTable) -> String {
    let value = add_value(table);
    add_space(table);
    table.add_rule(
        "array",
        &format!("\"[\" space ( {value} (\",\" space {value})* )? \"]\" space"),
    )
}

fn add_object(table: &mut RuleTable) -> String {
    let string = add_string(table);
    let value = add_value(table);
    add_space(table);
    table.add_rule(
        "object",
        &format!(
            "\"{{\" space ( {string} \":\" space {value} (\",\" space {string} \":\" space {value})* )? \"}}\" space"
        ),
    )
}

fn add_value(table: &mut RuleTable) -> String {
    if table.contains("value") {
        return "value".to_string();
    }
    // `object` and `array` both reference `value`; register the name first so the
    // mutual recursion terminates, then backfill dependencies before the RHS.
    table.add_rule("value", "object | array | string | number | boolean | null");
    add_boolean(table);
    add_null(table);
    add_number(table);
    add_string(table);
    "value".to_string()
}

fn add_uuid(table: &mut RuleTable) -> String {
    add_space(table);
    table.add_rule(
        "uuid",
        "\"\\\"\" [0-9a-fA-F]{8} \"-\" [0-9a-fA-F]{4} \"-\" [0-9a-fA-F]{4} \"-\" [0-9a-fA-F]{4} \"-\" [0-9a-fA-F]{12} \"\\\"\" space",
    )
}

fn add_date(table: &mut RuleTable) -> String {
    table.add_rule("date", "[0-9]{4} \"-\" ( \"0\" [1-9] | \"1\" [0-2] ) \"-\" ( \"0\" [1-9] | [1-2] [0-9] | \"3\" [0-1] )")
}

fn add_time(table: &mut RuleTable) -> String {
    table.add_rule(
        "time",
        "( \"0\" [0-9] | \"1\" [0-9] | \"2\" [0-3] ) \":\" [0-5] [0-9] \":\" [0-5] [0-9] ( \".\" [0-9]{3} )? ( \"Z\" | ( \"+\" | \"-\" ) ( \"0\" [0-9] | \"1\" [0-9] | \"2\" [0-3] ) \":\" [0-5] [0-9] )",
    )
}

fn add_date_time(table: &mut RuleTable) -> String {
    let date = add_date(table);
    let time = add_time(table);
    table.add_rule("date-time", &format!("{date} \"T\" {time}"))
}

/// Adds a primitive that wraps `inner` in JSON string quotes, as required for the
/// `-string` format variants (e.g. `date-string` wraps `date`).
fn add_string_wrapped(table: &mut RuleTable, name: &str, inner: &str) -> String {
    add_space(table);
    table.add_rule(name, &format!("\"\\\"\" {inner} \"\\\"\" space"))
}

/// Adds the primitive catalog entry named `primitive` to `table`, returning the rule
/// name. Used by the visitor's scalar fallback (priority 14) and by `object`/`array`
/// construction.
pub fn add_primitive(table: &mut RuleTable, primitive: &str) -> Option<String> {
    Some(match primitive {
        "boolean" => add_boolean(table),
        "null" => add_null(table),
        "number" => add_number(table),
        "integer" => add_integer(table),
        "string" => add_string(table),
        "object" => add_object(table),
        "array" => add_array(table),
        _ => return None,
    })
}

/// Adds a format catalog entry. `format` is the JSON Schema `format` keyword value
/// (without the `-string` suffix); returns `None` if the format is unknown.
pub fn add_format(table: &mut RuleTable, format: &str) -> Option<String> {
    match format {
        "uuid" => Some(add_uuid(table)),
        "date" => {
            let date = add_date(table);
            Some(add_string_wrapped(table, "date-string", &date))
        }
        "time" => {
            let time = add_time(table);
            Some(add_string_wrapped(table, "time-string", &time))
        }
        "date-time" => {
            let dt = add_date_time(table);
            Some(add_string_wrapped(table, "date-time-string", &dt))
        }
        _ => None,
    }
}
