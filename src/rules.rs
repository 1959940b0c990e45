//! Rule-table manager: sanitizes names, deduplicates identical RHS, disambiguates
//! collisions.

use indexmap::IndexMap;

/// An insertion-ordered `name -> rhs` table. Insertion order is preserved for
/// deterministic serialization even though it carries no other semantic meaning.
#[derive(Debug, Default)]
pub struct RuleTable {
    rules: IndexMap<String, String>,
}

fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut run_open = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            out.push(c);
            run_open = false;
        } else if !run_open {
            out.push('-');
            run_open = true;
        }
    }
    if out.is_empty() {
        out.push('-');
    }
    out
}

impl RuleTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `rhs` under a name derived from `proposed_name`, returning the name
    /// actually used.
    ///
    /// A sanitized name that is unused, or already mapped to an identical RHS, is
    /// reused as-is. A sanitized name mapped to a *different* RHS is disambiguated by
    /// appending the smallest non-negative integer suffix that is either unused or
    /// already mapped to this exact RHS.
    pub fn add_rule(&mut self, proposed_name: &str, rhs: impl Into<String>) -> String {
        let rhs = rhs.into();
        let base = sanitize(proposed_name);
        if self.fits(&base, &rhs) {
            self.rules.entry(base.clone()).or_insert(rhs);
            return base;
        }
        let mut i = 0usize;
        loop {
            let candidate = format!("{base}{i}");
            if self.fits(&candidate, &rhs) {
                self.rules.entry(candidate.clone()).or_insert(rhs);
                return candidate;
            }
            i += 1;
        }
    }

    fn fits(&self, name: &str, rhs: &str) -> bool {
        match self.rules.get(name) {
            None => true,
            Some(existing) => existing == rhs,
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.rules.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Renders the table as one `name ::= rhs` line per rule, in insertion order.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, rhs) in &self.rules {
            out.push_str(name);
            out.push_str(" ::= ");
            out.push_str(rhs);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_runs_of_invalid_chars() {
        assert_eq!(sanitize("foo bar!!baz"), "foo-bar-baz");
    }

    #[test]
    fn add_rule_fresh_name_installs_as_is() {
        let mut t = RuleTable::new();
        let name = t.add_rule("widget", "\"w\"");
        assert_eq!(name, "widget");
        assert_eq!(t.get("widget"), Some("\"w\""));
    }

    #[test]
    fn add_rule_identical_rhs_is_idempotent() {
        let mut t = RuleTable::new();
        let a = t.add_rule("widget", "\"w\"");
        let b = t.add_rule("widget", "\"w\"");
        assert_eq!(a, b);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn add_rule_colliding_rhs_disambiguates_with_suffix() {
        let mut t = RuleTable::new();
        let a = t.add_rule("widget", "\"w\"");
        let b = t.add_rule("widget", "\"x\"");
        assert_eq!(a, "widget");
        assert_eq!(b, "widget0");
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn add_rule_reuses_existing_suffix_for_same_rhs() {
        let mut t = RuleTable::new();
        t.add_rule("widget", "\"w\"");
        t.add_rule("widget", "\"x\"");
        let c = t.add_rule("widget", "\"x\"");
        assert_eq!(c, "widget0");
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn render_preserves_insertion_order() {
        let mut t = RuleTable::new();
        t.add_rule("b", "\"b\"");
        t.add_rule("a", "\"a\"");
        assert_eq!(t.render(), "b ::= \"b\"\na ::= \"a\"\n");
    }

    #[test]
    fn sanitize_never_produces_empty_name() {
        assert_eq!(sanitize("!!!"), "-");
    }
}
