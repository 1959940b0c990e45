//! Grammar-text primitives: literal escaping, character-class escaping, repetition.

/// Wraps `s` in ASCII double quotes, escaping `\r`, `\n`, and `"` for GBNF string
/// terminals.
#[must_use]
pub fn format_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '"' => out.push_str("\\\""),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Escapes a character for use inside a `[...]` character class: in addition to the
/// literal escapes of [`format_literal`], `-`, `]`, and `\` must be escaped.
#[must_use]
pub fn escape_char_class(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '-' => out.push_str("\\-"),
            ']' => out.push_str("\\]"),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out
}

/// Concatenates `s` with itself `n` times (`n = 0` yields `""`).
#[must_use]
pub fn repeat(s: &str, n: usize) -> String {
    s.repeat(n)
}

/// An upper repetition bound: a finite count or unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Max {
    Finite(usize),
    Unbounded,
}

/// Builds a GBNF fragment matching between `min` and `max` repetitions of `item`,
/// optionally separated by `sep`.
///
/// See the component design notes for the full min/max/sep/item_is_literal contract;
/// this is a direct transliteration of that contract into string assembly.
#[must_use]
pub fn build_repetition(item: &str, min: usize, max: Max, sep: &str, item_is_literal: bool) -> String {
    if item_is_literal && sep.is_empty() {
        // item is itself a quoted terminal like `"x"`; collapse min copies of the
        // *inner* text into one terminal, then handle the tail as for any other item.
        let inner = item
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(item);
        let head = if min > 0 {
            format!("\"{}\"", repeat(inner, min))
        } else {
            String::new()
        };
        return finish_repetition(&head, item, min, max, sep, min > 0);
    }

    if sep.is_empty() {
        if min == 0 && max == Max::Finite(1) {
            return format!("{item}?");
        }
        if min == 1 && max == Max::Unbounded {
            return format!("{item}+");
        }
        if min == 0 && max == Max::Unbounded {
            return format!("{item}*");
        }
    }

    let head = if min > 0 {
        if sep.is_empty() {
            std::iter::repeat(item.to_string())
                .take(min)
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            let mut parts = Vec::with_capacity(min);
            parts.push(item.to_string());
            for _ in 1..min {
                parts.push(format!("{sep} space {item}"));
            }
            parts.join(" ")
        }
    } else {
        String::new()
    };
    finish_repetition(&head, item, min, max, sep, min > 0)
}

fn finish_repetition(head: &str, item: &str, min: usize, max: Max, sep: &str, has_head: bool) -> String {
    let mut result = head.to_string();
    match max {
        Max::Unbounded => {
            let tail = if sep.is_empty() {
                if min > 0 {
                    format!("{item}*")
                } else {
                    format!("{item}*")
                }
            } else if has_head {
                format!("({sep} space {item})*")
            } else {
                format!("({item} ({sep} space {item})*)?")
            };
            if result.is_empty() {
                result = tail;
            } else if min == 0 {
                result = tail;
            } else {
                result = format!("{result} {tail}");
            }
        }
        Max::Finite(max_n) => {
            if max_n > min {
                let extra = max_n - min;
                let mut tail = String::new();
                for i in (0..extra).rev() {
                    let prefixed = if has_head || i + 1 < extra {
                        if sep.is_empty() {
                            item.to_string()
                        } else {
                            format!("{sep} space {item}")
                        }
                    } else {
                        item.to_string()
                    };
                    tail = if tail.is_empty() {
                        format!("({prefixed})?")
                    } else {
                        format!("({prefixed} {tail})?")
                    };
                }
                result = if result.is_empty() {
                    tail
                } else {
                    format!("{result} {tail}")
                };
            }
        }
    }
    result
}
