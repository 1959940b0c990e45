//! Regex-to-grammar compiler: translates ECMA-style patterns anchored with `^...$`
//! into grammar fragments.

use crate::error::SchemaError;
use crate::rules::RuleTable;
use crate::text::{build_repetition, format_literal, Max};

const METACHARS: &[char] = &['.', '(', ')', '[', ']', '{', '}', '*', '+', '?', '|'];

#[derive(Debug, Clone)]
enum Item {
    Literal(String),
    Fragment(String),
}

pub struct RegexCompiler<'a> {
    table: &'a mut RuleTable,
    dotall: bool,
    pub errors: Vec<SchemaError>,
    pub warnings: Vec<String>,
}

impl<'a> RegexCompiler<'a> {
    pub fn new(table: &'a mut RuleTable, dotall: bool) -> Self {
        Self {
            table,
            dotall,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Compiles an anchored pattern `^P$` into a rule named `proposed_name`, returning
    /// the final installed name. On an unanchored pattern, records `InvalidPattern`
    /// and returns `None` without installing anything.
    pub fn compile_pattern(&mut self, proposed_name: &str, pattern: &str) -> Option<String> {
        let Some(stripped) = pattern.strip_prefix('^').and_then(|s| s.strip_suffix('$')) else {
            self.errors.push(SchemaError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "Pattern must start with '^' and end with '$'".to_string(),
            });
            return None;
        };
        let items = self.parse_body(stripped);
        let body = self.render_items(&items);
        let rhs = format!("\"\\\"\" {body} \"\\\"\" space");
        self.table.add_rule("space", "\" \"?");
        Some(self.table.add_rule(proposed_name, rhs))
    }

    fn render_items(&self, items: &[Item]) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut pending_literal = String::new();
        for item in items {
            match item {
                Item::Literal(s) => pending_literal.push_str(s),
                Item::Fragment(f) => {
                    if !pending_literal.is_empty() {
                        parts.push(format_literal(&pending_literal));
                        pending_literal.clear();
                    }
                    parts.push(f.clone());
                }
            }
        }
        if !pending_literal.is_empty() {
            parts.push(format_literal(&pending_literal));
        }
        parts.join(" ")
    }

    fn parse_body(&mut self, body: &str) -> Vec<Item> {
        let chars: Vec<char> = body.chars().collect();
        let mut items = Vec::new();
        let mut i = 0usize;
        while i < chars.len() {
            let c = chars[i];
            match c {
                '.' => {
                    let dot_class = if self.dotall {
                        "[\\U00000000-\\U0010FFFF]"
                    } else {
                        "[^\\x0A\\x0D]"
                    };
                    self.table.add_rule("dot", dot_class);
                    items.push(Item::Fragment("dot".to_string()));
                    i += 1;
                }
                '(' => {
                    let (inner, consumed) = match self.extract_group(&chars[i..]) {
                        Some(pair) => pair,
                        None => {
                            self.errors.push(SchemaError::InvalidPattern {
                                pattern: body.to_string(),
                                reason: "Unbalanced '('".to_string(),
                            });
                            break;
                        }
                    };
                    i += consumed;
                    let inner_text = if let Some(rest) = inner.strip_prefix('?') {
                        self.warnings
                            .push("Unsupported pattern syntax".to_string());
                        rest.to_string()
                    } else {
                        inner
                    };
                    let sub_items = self.parse_body(&inner_text);
                    let sub_rendered = self.render_items(&sub_items);
                    items.push(Item::Fragment(format!("( {sub_rendered} )")));
                }
                '[' => match self.extract_char_class(&chars[i..]) {
                    Some((class_text, consumed)) => {
                        items.push(Item::Fragment(class_text));
                        i += consumed;
                    }
                    None => {
                        self.errors.push(SchemaError::InvalidPattern {
                            pattern: body.to_string(),
                            reason: "Unbalanced '['".to_string(),
                        });
                        break;
                    }
                },
                '|' => {
                    items.push(Item::Fragment("|".to_string()));
                    i += 1;
                }
                '*' | '+' | '?' => {
                    self.attach_quantifier(&mut items, c);
                    i += 1;
                }
                '{' => {
                    let Some((spec_text, consumed)) = Self::extract_braces(&chars[i..]) else {
                        self.errors.push(SchemaError::InvalidPattern {
                            pattern: body.to_string(),
                            reason: "Unbalanced '{'".to_string(),
                        });
                        break;
                    };
                    i += consumed;
                    match parse_repetition_spec(&spec_text) {
                        Some((min, max)) => self.attach_repetition(&mut items, min, max),
                        None => self.errors.push(SchemaError::InvalidPattern {
                            pattern: body.to_string(),
                            reason: format!("Invalid repetition count: {{{spec_text}}}"),
                        }),
                    }
                }
                '\\' if i + 1 < chars.len() => {
                    let next = chars[i + 1];
                    let literal = if METACHARS.contains(&next) {
                        next.to_string()
                    } else {
                        format!("\\{next}")
                    };
                    Self::push_literal(&mut items, &literal);
                    i += 2;
                }
                '"' => {
                    Self::push_literal(&mut items, "\\\"");
                    i += 1;
                }
                other => {
                    Self::push_literal(&mut items, &other.to_string());
                    i += 1;
                }
            }
        }
        items
    }

    fn push_literal(items: &mut Vec<Item>, text: &str) {
        if let Some(Item::Literal(last)) = items.last_mut() {
            last.push_str(text);
        } else {
            items.push(Item::Literal(text.to_string()));
        }
    }

    /// Given chars starting at `(`, finds the matching `)` accounting for nesting.
    /// Returns the inner text (exclusive of the parens) and the number of chars
    /// consumed (inclusive of both parens).
    fn extract_group(&self, chars: &[char]) -> Option<(String, usize)> {
        let mut depth = 0i32;
        let mut j = 0usize;
        while j < chars.len() {
            match chars[j] {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        let inner: String = chars[1..j].iter().collect();
                        return Some((inner, j + 1));
                    }
                }
                '\\' => j += 1,
                _ => {}
            }
            j += 1;
        }
        None
    }

    /// Given chars starting at `[`, finds the matching `]`, treating `\X` as a
    /// two-character unit so an escaped `]` does not terminate the class early.
    fn extract_char_class(&self, chars: &[char]) -> Option<(String, usize)> {
        let mut j = 1usize;
        while j < chars.len() {
            match chars[j] {
                ']' => {
                    let text: String = chars[0..=j].iter().collect();
                    return Some((text, j + 1));
                }
                '\\' if j + 1 < chars.len() => j += 2,
                _ => j += 1,
            }
        }
        None
    }

    fn extract_braces(chars: &[char]) -> Option<(String, usize)> {
        let mut j = 1usize;
        while j < chars.len() {
            if chars[j] == '}' {
                let text: String = chars[1..j].iter().collect();
                return Some((text, j + 1));
            }
            j += 1;
        }
        None
    }

    fn attach_quantifier(&mut self, items: &mut Vec<Item>, quantifier: char) {
        let (min, max) = match quantifier {
            '*' => (0, Max::Unbounded),
            '+' => (1, Max::Unbounded),
            '?' => (0, Max::Finite(1)),
            _ => unreachable!(),
        };
        self.attach_repetition(items, min, max);
    }

    fn attach_repetition(&mut self, items: &mut Vec<Item>, min: usize, max: Max) {
        let Some(last) = items.pop() else {
            // No preceding item (e.g. a bare quantifier right after `(?`); drop it.
            return;
        };
        match last {
            Item::Literal(text) => {
                let rendered = build_repetition(&format_literal(&text), min, max, "", true);
                items.push(Item::Fragment(rendered));
            }
            Item::Fragment(text) => {
                let item_ref = if text.chars().all(|c| c.is_alphanumeric() || c == '-') {
                    text
                } else {
                    self.table.add_rule("pattern-repeat", text)
                };
                let rendered = build_repetition(&item_ref, min, max, "", false);
                items.push(Item::Fragment(rendered));
            }
        }
    }
}

/// Parses the interior of `{...}`: `m`, `m,`, `m,n`, or `,n`.
fn parse_repetition_spec(spec: &str) -> Option<(usize, Max)> {
    if let Some((m, n)) = spec.split_once(',') {
        if m.is_empty() {
            let max: usize = n.parse().ok()?;
            Some((0, Max::Finite(max)))
        } else if n.is_empty() {
            let min: usize = m.parse().ok()?;
            Some((min, Max::Unbounded))
        } else {
            let min: usize = m.parse().ok()?;
            let max: usize = n.parse().ok()?;
            if max < min {
                return None;
            }
            Some((min, Max::Finite(max)))
        }
    } else {
        let n: usize = spec.parse().ok()?;
        Some((n, Max::Finite(n)))
    }
}
