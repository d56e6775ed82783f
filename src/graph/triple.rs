//! Triples, wildcard patterns and query clauses

use super::value::Value;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix marking a query variable inside a clause.
pub const VARIABLE_SIGIL: char = '?';

/// A position within a (subject, predicate, object) tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Position {
    Subject,
    Predicate,
    Object,
}

impl Position {
    pub const ALL: [Position; 3] = [Position::Subject, Position::Predicate, Position::Object];

    /// Tuple index (0, 1 or 2)
    pub fn index(self) -> usize {
        match self {
            Position::Subject => 0,
            Position::Predicate => 1,
            Position::Object => 2,
        }
    }
}

/// A stored fact. Serialized as a JSON array `[subject, predicate, object]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: Value,
}

impl Triple {
    pub fn new(subject: impl Into<String>, predicate: impl Into<String>, object: impl Into<Value>) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// A persisted triple needs a subject, a predicate and a non-empty object.
    pub fn is_valid(&self) -> bool {
        !self.subject.is_empty() && !self.predicate.is_empty() && !self.object.is_empty()
    }

    /// The value at a tuple position; subject and predicate become strings.
    pub fn value_at(&self, position: Position) -> Value {
        match position {
            Position::Subject => Value::String(self.subject.clone()),
            Position::Predicate => Value::String(self.predicate.clone()),
            Position::Object => self.object.clone(),
        }
    }

    /// The exact pattern matching only this triple.
    pub fn to_pattern(&self) -> Pattern {
        Pattern::new(self.subject.clone(), self.predicate.clone(), Some(self.object.clone()))
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.predicate, self.object)
    }
}

impl Serialize for Triple {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.subject, &self.predicate, &self.object).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Triple {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (subject, predicate, object) = <(String, String, Value)>::deserialize(deserializer)?;
        Ok(Self {
            subject,
            predicate,
            object,
        })
    }
}

/// A triple in which any position may be a wildcard.
///
/// An empty subject or predicate, a missing object or an empty-string object
/// match any value at that position. Serialized as `[subject, predicate, object]`
/// where any entry may be `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pattern {
    pub subject: String,
    pub predicate: String,
    pub object: Option<Value>,
}

impl Pattern {
    pub fn new(subject: impl Into<String>, predicate: impl Into<String>, object: Option<Value>) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.filter(|o| !o.is_empty()),
        }
    }

    /// The pattern matching every triple.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_predicate(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = predicate.into();
        self
    }

    pub fn with_object(mut self, object: impl Into<Value>) -> Self {
        self.object = Some(object.into()).filter(|o| !o.is_empty());
        self
    }

    pub fn subject(&self) -> Option<&str> {
        Some(self.subject.as_str()).filter(|s| !s.is_empty())
    }

    pub fn predicate(&self) -> Option<&str> {
        Some(self.predicate.as_str()).filter(|p| !p.is_empty())
    }

    pub fn object(&self) -> Option<&Value> {
        self.object.as_ref().filter(|o| !o.is_empty())
    }

    /// True when every position is a wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.subject().is_none() && self.predicate().is_none() && self.object().is_none()
    }

    /// Whether a concrete triple satisfies this pattern.
    pub fn matches(&self, triple: &Triple) -> bool {
        self.subject().map_or(true, |s| s == triple.subject)
            && self.predicate().map_or(true, |p| p == triple.predicate)
            && self.object().map_or(true, |o| *o == triple.object)
    }

    /// Convert a fully specified pattern into a triple.
    ///
    /// Returns `None` when the object is a wildcard; empty subjects and
    /// predicates are kept so bulk inserts can skip them.
    pub fn into_triple(self) -> Option<Triple> {
        let object = self.object.filter(|o| !o.is_empty())?;
        Some(Triple {
            subject: self.subject,
            predicate: self.predicate,
            object,
        })
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.subject, &self.predicate, &self.object).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (subject, predicate, object) =
            <(Option<String>, Option<String>, Option<Value>)>::deserialize(deserializer)?;
        Ok(Pattern::new(
            subject.unwrap_or_default(),
            predicate.unwrap_or_default(),
            object,
        ))
    }
}

/// One entry of a query clause: a variable or a constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// Variable name, without the sigil
    Variable(String),
    Constant(Value),
}

impl Term {
    pub fn var(name: impl Into<String>) -> Self {
        Term::Variable(name.into())
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        Term::Constant(value.into())
    }
}

impl From<Value> for Term {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) if s.starts_with(VARIABLE_SIGIL) => {
                Term::Variable(s[VARIABLE_SIGIL.len_utf8()..].to_string())
            }
            other => Term::Constant(other),
        }
    }
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Term::from(Value::from(s))
    }
}

impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Term::Variable(name) => format!("{}{}", VARIABLE_SIGIL, name).serialize(serializer),
            Term::Constant(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Term {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Term::from(Value::deserialize(deserializer)?))
    }
}

/// One pattern of a join query, e.g. `["?person", "likes", "?thing"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause(pub [Term; 3]);

impl Clause {
    pub fn new(subject: impl Into<Term>, predicate: impl Into<Term>, object: impl Into<Term>) -> Self {
        Self([subject.into(), predicate.into(), object.into()])
    }

    pub fn term(&self, position: Position) -> &Term {
        &self.0[position.index()]
    }

    /// Mutable access to the string content of every term, for prefix expansion.
    pub fn strings_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.0.iter_mut().filter_map(|term| match term {
            Term::Variable(_) => None,
            Term::Constant(Value::String(s)) => Some(s),
            Term::Constant(_) => None,
        })
    }
}
