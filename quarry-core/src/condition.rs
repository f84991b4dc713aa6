//! Typed WHERE conditions and their compilation into SQL fragments

use crate::Value;

/// Key-unique field map that remembers insertion order.
///
/// Inserting a field that is already present replaces its value in place, so
/// the emitted SQL always follows the order in which fields were first added.
#[derive(Debug, Clone, PartialEq)]
pub struct Fields<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for Fields<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> Fields<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field
    pub fn insert(&mut self, field: impl Into<String>, value: V) {
        let field = field.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    /// Chaining form of [`Fields::insert`]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<V>) -> Self {
        self.insert(field, value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl Fields<Vec<Value>> {
    /// Add a membership list, converting each element into a [`Value`]
    pub fn with_list<I, T>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.insert(field, values.into_iter().map(Into::into).collect());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for Fields<V>
where
    K: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (field, value) in iter {
            fields.insert(field, value);
        }
        fields
    }
}

impl<V> IntoIterator for Fields<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A flat WHERE predicate family.
///
/// Every field inside one condition is joined with `AND`; several conditions
/// added to a query are joined with `AND` as well.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `field = ?`
    Eq(Fields<Value>),
    /// `field != ?`
    Neq(Fields<Value>),
    /// `field > ?`
    Gt(Fields<Value>),
    /// `field < ?`
    Lt(Fields<Value>),
    /// `field IN (?, ...)`
    In(Fields<Vec<Value>>),
    /// Compiles to nothing
    Unrecognized,
}

impl Condition {
    /// SQL operator for the comparison variants
    pub fn operator(&self) -> Option<&'static str> {
        match self {
            Condition::Eq(_) => Some("="),
            Condition::Neq(_) => Some("!="),
            Condition::Gt(_) => Some(">"),
            Condition::Lt(_) => Some("<"),
            Condition::In(_) => Some("IN"),
            Condition::Unrecognized => None,
        }
    }

    /// Add another compared field to this condition.
    ///
    /// On an `In` condition the value becomes a one-element list.
    pub fn and_field(mut self, field: &str, value: impl Into<Value>) -> Self {
        match &mut self {
            Condition::Eq(fields)
            | Condition::Neq(fields)
            | Condition::Gt(fields)
            | Condition::Lt(fields) => fields.insert(field, value.into()),
            Condition::In(fields) => fields.insert(field, vec![value.into()]),
            Condition::Unrecognized => {}
        }
        self
    }

    /// Add another membership list to an `In` condition; other variants are left untouched
    pub fn and_values<I, T>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        if let Condition::In(fields) = &mut self {
            fields.insert(field, values.into_iter().map(Into::into).collect());
        }
        self
    }
}

/// SQL text with `?` placeholders plus the arguments for them, in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledFragment {
    pub sql: String,
    pub args: Vec<Value>,
}

impl CompiledFragment {
    /// An empty fragment contributes no clause
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Compile a condition into a SQL fragment and its ordered arguments.
///
/// `Unrecognized` and conditions without fields produce an empty fragment.
pub fn compile(condition: Condition) -> CompiledFragment {
    let Some(operator) = condition.operator() else {
        return CompiledFragment::default();
    };

    match condition {
        Condition::Eq(fields)
        | Condition::Neq(fields)
        | Condition::Gt(fields)
        | Condition::Lt(fields) => compile_comparison(fields, operator),
        Condition::In(fields) => compile_in(fields),
        Condition::Unrecognized => CompiledFragment::default(),
    }
}

fn compile_comparison(fields: Fields<Value>, operator: &str) -> CompiledFragment {
    let mut parts = Vec::with_capacity(fields.len());
    let mut args = Vec::with_capacity(fields.len());

    for (field, value) in fields {
        parts.push(format!("{} {} ?", field, operator));
        args.push(value);
    }

    CompiledFragment {
        sql: parts.join(" AND "),
        args,
    }
}

fn compile_in(fields: Fields<Vec<Value>>) -> CompiledFragment {
    let mut parts = Vec::with_capacity(fields.len());
    let mut args = Vec::new();

    for (field, values) in fields {
        let placeholders = vec!["?"; values.len()].join(",");
        parts.push(format!("{} IN ({})", field, placeholders));
        args.extend(values);
    }

    CompiledFragment {
        sql: parts.join(" AND "),
        args,
    }
}

/// Shorthand constructors for single-field conditions
pub mod cond {
    use super::{Condition, Fields};
    use crate::Value;

    pub fn eq(field: &str, value: impl Into<Value>) -> Condition {
        Condition::Eq(Fields::new().with(field, value))
    }

    pub fn neq(field: &str, value: impl Into<Value>) -> Condition {
        Condition::Neq(Fields::new().with(field, value))
    }

    pub fn gt(field: &str, value: impl Into<Value>) -> Condition {
        Condition::Gt(Fields::new().with(field, value))
    }

    pub fn lt(field: &str, value: impl Into<Value>) -> Condition {
        Condition::Lt(Fields::new().with(field, value))
    }

    pub fn is_in<I, T>(field: &str, values: I) -> Condition
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Condition::In(Fields::new().with_list(field, values))
    }
}
