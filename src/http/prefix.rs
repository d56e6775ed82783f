//! Prefix expansion for request payloads
//!
//! A request may carry `{"prefix": {"foaf": "http://xmlns.com/foaf/0.1/"}}`;
//! every string starting with `foaf:` then has that prefix replaced by the
//! full IRI before it reaches the engine.

use crate::graph::{Clause, Pattern, Value};
use std::collections::BTreeMap;

/// Prefix name to IRI
pub type Prefixes = BTreeMap<String, String>;

/// Expand a prefixed string in place. Prefixes are tried in name order and
/// each replaces at most once.
pub fn expand_str(prefixes: &Prefixes, s: &mut String) {
    for (prefix, iri) in prefixes {
        let rest = s
            .strip_prefix(prefix.as_str())
            .and_then(|rest| rest.strip_prefix(':'));
        if let Some(rest) = rest {
            *s = format!("{}{}", iri, rest);
        }
    }
}

pub fn expand_value(prefixes: &Prefixes, value: &mut Value) {
    if let Value::String(s) = value {
        expand_str(prefixes, s);
    }
}

pub fn expand_pattern(prefixes: &Prefixes, pattern: &mut Pattern) {
    expand_str(prefixes, &mut pattern.subject);
    expand_str(prefixes, &mut pattern.predicate);
    if let Some(object) = pattern.object.as_mut() {
        expand_value(prefixes, object);
    }
}

pub fn expand_clause(prefixes: &Prefixes, clause: &mut Clause) {
    for s in clause.strings_mut() {
        expand_str(prefixes, s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Position, Term};

    fn foaf() -> Prefixes {
        let mut prefixes = Prefixes::new();
        prefixes.insert("foaf".into(), "http://xmlns.com/foaf/0.1/".into());
        prefixes.insert("rdf".into(), "http://www.w3.org/1999/02/22-rdf-syntax-ns#".into());
        prefixes
    }

    #[test]
    fn test_expand_only_leading_prefix() {
        let prefixes = foaf();
        let mut s = "foaf:Person".to_string();
        expand_str(&prefixes, &mut s);
        assert_eq!(s, "http://xmlns.com/foaf/0.1/Person");

        let mut s = "see foaf:Person".to_string();
        expand_str(&prefixes, &mut s);
        assert_eq!(s, "see foaf:Person");

        let mut s = "foafy:thing".to_string();
        expand_str(&prefixes, &mut s);
        assert_eq!(s, "foafy:thing");
    }

    #[test]
    fn test_expand_pattern_skips_non_strings() {
        let mut pattern = Pattern::new("_:1", "rdf:type", Some("foaf:Person".into()));
        expand_pattern(&foaf(), &mut pattern);
        assert_eq!(pattern.predicate, "http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
        assert_eq!(pattern.object, Some(Value::from("http://xmlns.com/foaf/0.1/Person")));

        let mut pattern = Pattern::new("_:1", "foaf:age", Some(42.into()));
        expand_pattern(&foaf(), &mut pattern);
        assert_eq!(pattern.object, Some(Value::Integer(42)));
    }

    #[test]
    fn test_expand_clause_leaves_variables() {
        let mut clause = Clause::new("?p", "rdf:type", "foaf:Person");
        expand_clause(&foaf(), &mut clause);
        assert_eq!(clause.term(Position::Subject), &Term::var("p"));
        assert_eq!(
            clause.term(Position::Object),
            &Term::constant("http://xmlns.com/foaf/0.1/Person")
        );
    }
}
