//! The declarative aggregation pipeline.
//!
//! A pipeline is an ordered list of [`Stage`]s run against one base
//! collection. Stages never mutate stored documents; they transform the
//! in-flight sequence only. Execution semantics live in [`crate::eval`].

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
  Collection, Document,
  document::{CREATED_AT_FIELD, ID_FIELD},
  filter::{Filter, field_matches},
};

// ─── Stages ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Stage {
  Match(Filter),
  Lookup(JoinSpec),
  AddFields(Vec<ComputedField>),
  Sort(SortSpec),
  Project(Projection),
  Skip(usize),
  Limit(usize),
}

// ─── Joins ───────────────────────────────────────────────────────────────────

/// How the joined foreign documents are attached to the local document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinReduce {
  /// Attach every match as an array.
  All,
  /// Attach the first match, or `null` when nothing matched.
  First,
}

/// Attach documents from `from` whose `foreign_field` equals the local
/// document's `local_field`, under `as_field`.
///
/// When `local_field` holds an array, every element is a key and the joined
/// documents follow the array's order. `pipeline` runs separately over each
/// local document's matches before they are attached.
#[derive(Debug, Clone)]
pub struct JoinSpec {
  pub from:          Collection,
  pub local_field:   String,
  pub foreign_field: String,
  pub as_field:      String,
  pub reduce:        JoinReduce,
  /// Extra predicate on the foreign documents.
  pub filter:        Filter,
  pub pipeline:      Vec<Stage>,
}

impl JoinSpec {
  pub fn new(
    from: Collection,
    local_field: impl Into<String>,
    foreign_field: impl Into<String>,
    as_field: impl Into<String>,
  ) -> Self {
    Self {
      from,
      local_field: local_field.into(),
      foreign_field: foreign_field.into(),
      as_field: as_field.into(),
      reduce: JoinReduce::All,
      filter: Filter::All,
      pipeline: Vec::new(),
    }
  }

  /// Look up a single user by the id stored in `local_field`, keeping only
  /// the projected profile fields.
  pub fn user(
    local_field: impl Into<String>,
    as_field: impl Into<String>,
    profile: Projection,
  ) -> Self {
    Self::new(Collection::Users, local_field, ID_FIELD, as_field)
      .first()
      .project(profile)
  }

  pub fn first(mut self) -> Self {
    self.reduce = JoinReduce::First;
    self
  }

  pub fn filter(mut self, filter: Filter) -> Self {
    self.filter = self.filter.and(filter);
    self
  }

  pub fn then(mut self, stage: Stage) -> Self {
    self.pipeline.push(stage);
    self
  }

  pub fn project(self, projection: Projection) -> Self {
    self.then(Stage::Project(projection))
  }

  /// Does `foreign` belong to the local document whose key is `key`?
  pub(crate) fn links(&self, foreign: &Document, key: &Value) -> bool {
    field_matches(foreign.get(&self.foreign_field), key)
  }
}

// ─── Computed fields ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Computed {
  /// Length of an array field; `0` when absent.
  Size { of: String },
  /// Whether any object in the array field `array` has `field == value`.
  /// Always `false` when `value` is `None`.
  Contains {
    array: String,
    field: String,
    value: Option<Value>,
  },
}

impl Computed {
  pub fn evaluate(&self, doc: &Document) -> Value {
    match self {
      Self::Size { of } => {
        let len = doc.get(of).and_then(Value::as_array).map_or(0, Vec::len);
        Value::from(len as u64)
      }
      Self::Contains { array, field, value } => {
        let Some(value) = value else {
          return Value::Bool(false);
        };
        let found = doc
          .get(array)
          .and_then(Value::as_array)
          .is_some_and(|items| items.iter().any(|item| item.get(field) == Some(value)));
        Value::Bool(found)
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComputedField {
  pub name: String,
  pub expr: Computed,
}

impl ComputedField {
  pub fn size(name: impl Into<String>, of: impl Into<String>) -> Self {
    Self { name: name.into(), expr: Computed::Size { of: of.into() } }
  }

  pub fn contains(
    name: impl Into<String>,
    array: impl Into<String>,
    field: impl Into<String>,
    value: Option<Value>,
  ) -> Self {
    Self {
      name: name.into(),
      expr: Computed::Contains { array: array.into(), field: field.into(), value },
    }
  }
}

// ─── Sorting ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
  Asc,
  #[default]
  Desc,
}

impl SortDirection {
  /// Lenient parse of `asc`/`desc` (also `1`/`-1`).
  pub fn parse(raw: &str) -> Option<Self> {
    match raw.trim().to_ascii_lowercase().as_str() {
      "asc" | "ascending" | "1" => Some(Self::Asc),
      "desc" | "descending" | "-1" => Some(Self::Desc),
      _ => None,
    }
  }
}

/// A single-key sort. Sorting is stable, so documents with equal keys keep
/// their incoming (insertion) order.
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
  pub field:     String,
  pub direction: SortDirection,
}

impl SortSpec {
  pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
    Self { field: field.into(), direction }
  }

  pub fn newest_first() -> Self { Self::new(CREATED_AT_FIELD, SortDirection::Desc) }

  pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
    let ord = compare_values(a.get(&self.field), b.get(&self.field));
    match self.direction {
      SortDirection::Asc => ord,
      SortDirection::Desc => ord.reverse(),
    }
  }
}

/// Total order over JSON values: missing < null < bool < number < string <
/// other. RFC 3339 strings compare chronologically.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
  match (a, b) {
    (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
    (Some(Value::Number(x)), Some(Value::Number(y))) => x
      .as_f64()
      .partial_cmp(&y.as_f64())
      .unwrap_or(Ordering::Equal),
    (Some(Value::String(x)), Some(Value::String(y))) => {
      match (parse_timestamp(x), parse_timestamp(y)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => x.cmp(y),
      }
    }
    (a, b) => type_rank(a).cmp(&type_rank(b)),
  }
}

fn type_rank(value: Option<&Value>) -> u8 {
  match value {
    None => 0,
    Some(Value::Null) => 1,
    Some(Value::Bool(_)) => 2,
    Some(Value::Number(_)) => 3,
    Some(Value::String(_)) => 4,
    Some(Value::Array(_)) => 5,
    Some(Value::Object(_)) => 6,
  }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc))
}

// ─── Projection ──────────────────────────────────────────────────────────────

/// An allow-list of output fields. Anything not listed is dropped, including
/// fields of nested objects that carry their own projection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
  fields: Vec<(String, Option<Projection>)>,
}

impl Projection {
  pub fn of(fields: &[&str]) -> Self {
    fields.iter().fold(Self::default(), |p, f| p.field(*f))
  }

  pub fn field(mut self, name: impl Into<String>) -> Self {
    self.fields.push((name.into(), None));
    self
  }

  /// Keep `name`, recursively projecting an object (or each object of an
  /// array) with `inner`.
  pub fn nested(mut self, name: impl Into<String>, inner: Projection) -> Self {
    self.fields.push((name.into(), Some(inner)));
    self
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.fields.iter().map(|(name, _)| name.as_str())
  }

  pub fn apply(&self, doc: &Document) -> Document {
    let mut out = Document::new();
    for (name, inner) in &self.fields {
      if let Some(value) = doc.get(name) {
        let value = match inner {
          Some(inner) => inner.apply_value(value),
          None => value.clone(),
        };
        out.insert(name.clone(), value);
      }
    }
    out
  }

  fn apply_value(&self, value: &Value) -> Value {
    match value {
      Value::Object(obj) => Value::Object(self.apply(obj)),
      Value::Array(items) => {
        Value::Array(items.iter().map(|v| self.apply_value(v)).collect())
      }
      other => other.clone(),
    }
  }
}
