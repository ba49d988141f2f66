//! Document predicates used by `Match` stages, join restrictions, and
//! [`DocumentStore::find`](crate::store::DocumentStore::find).

use serde_json::Value;

use crate::{Document, Id, document::ID_FIELD};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
  /// Matches every document.
  #[default]
  All,
  /// `field == value`. An array-valued field matches if it contains `value`.
  Eq { field: String, value: Value },
  /// `field` equals any of `values`.
  In { field: String, values: Vec<Value> },
  /// Case-insensitive free-text match: every whitespace-separated term of
  /// `query` must occur in at least one of `fields`.
  Text { fields: Vec<String>, query: String },
  /// All inner filters match.
  And(Vec<Filter>),
}

impl Filter {
  pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
    Self::Eq { field: field.into(), value: value.into() }
  }

  /// Match a single document by primary key.
  pub fn id(id: Id) -> Self { Self::eq(ID_FIELD, id) }

  pub fn is_in<V>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self
  where
    V: Into<Value>,
  {
    Self::In {
      field:  field.into(),
      values: values.into_iter().map(Into::into).collect(),
    }
  }

  pub fn text(fields: &[&str], query: impl Into<String>) -> Self {
    Self::Text {
      fields: fields.iter().map(|f| (*f).to_owned()).collect(),
      query:  query.into(),
    }
  }

  /// Conjunction, flattening nested `And`s and dropping `All`.
  pub fn and(self, other: Filter) -> Self {
    match (self, other) {
      (Self::All, f) | (f, Self::All) => f,
      (Self::And(mut left), Self::And(right)) => {
        left.extend(right);
        Self::And(left)
      }
      (Self::And(mut left), f) => {
        left.push(f);
        Self::And(left)
      }
      (f, Self::And(mut right)) => {
        right.insert(0, f);
        Self::And(right)
      }
      (f, g) => Self::And(vec![f, g]),
    }
  }

  pub fn matches(&self, doc: &Document) -> bool {
    match self {
      Self::All => true,
      Self::Eq { field, value } => field_matches(doc.get(field), value),
      Self::In { field, values } => {
        let actual = doc.get(field);
        values.iter().any(|v| field_matches(actual, v))
      }
      Self::Text { fields, query } => {
        let haystacks: Vec<String> = fields
          .iter()
          .filter_map(|f| doc.get(f).and_then(Value::as_str))
          .map(str::to_lowercase)
          .collect();
        query
          .split_whitespace()
          .map(str::to_lowercase)
          .all(|term| haystacks.iter().any(|h| h.contains(&term)))
      }
      Self::And(filters) => filters.iter().all(|f| f.matches(doc)),
    }
  }
}

/// Equality with array-containment: `[a, b]` matches `a`. A missing field
/// matches only `null`.
pub fn field_matches(actual: Option<&Value>, expected: &Value) -> bool {
  match actual {
    None => expected.is_null(),
    Some(Value::Array(items)) if !expected.is_array() => items.contains(expected),
    Some(v) => v == expected,
  }
}
