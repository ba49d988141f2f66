//! [`SqlReader`]: the pipeline evaluator's view of the `documents` table.
//!
//! Equality and membership filters on string values are translated to SQL so
//! the scan returns fewer rows. Anything else is left to the evaluator, which
//! re-checks every document, so a partial translation is always safe.

use reel_core::{Collection, Document, document::ID_FIELD, eval::CollectionReader, filter::Filter};
use rusqlite::{Connection, types::Value as SqlValue};
use serde_json::Value;

use crate::codec::decode_body;

pub struct SqlReader<'c> {
  conn: &'c Connection,
}

impl<'c> SqlReader<'c> {
  pub fn new(conn: &'c Connection) -> Self { Self { conn } }
}

impl CollectionReader for SqlReader<'_> {
  type Error = rusqlite::Error;

  fn scan(&mut self, collection: Collection, filter: &Filter) -> rusqlite::Result<Vec<Document>> {
    let mut query = Query::new(collection);
    query.push_filter(filter);
    query.sql.push_str(" ORDER BY seq");

    let mut stmt = self.conn.prepare_cached(&query.sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(query.params), |row| {
      row.get::<_, String>(0)
    })?;
    rows.map(|body| decode_body(&body?)).collect()
  }
}

// ─── Filter pushdown ─────────────────────────────────────────────────────────

struct Query {
  sql:    String,
  params: Vec<SqlValue>,
}

impl Query {
  fn new(collection: Collection) -> Self {
    Self {
      sql:    "SELECT body FROM documents WHERE collection = ?".to_owned(),
      params: vec![SqlValue::Text(collection.to_string())],
    }
  }

  fn push_filter(&mut self, filter: &Filter) {
    match filter {
      Filter::And(filters) => filters.iter().for_each(|f| self.push_filter(f)),
      Filter::Eq { field, value } => {
        if let Some(value) = text(value) {
          self.push_membership(field, vec![value]);
        }
      }
      Filter::In { field, values } => {
        // An empty `In` matches nothing; the evaluator handles that.
        let texts: Option<Vec<String>> = values.iter().map(text).collect();
        if let Some(texts) = texts.filter(|t| !t.is_empty()) {
          self.push_membership(field, texts);
        }
      }
      Filter::All | Filter::Text { .. } => {}
    }
  }

  /// `field` equals, or for an array field contains, one of `values`.
  fn push_membership(&mut self, field: &str, values: Vec<String>) {
    if !is_plain_field(field) {
      return;
    }
    let placeholders = vec!["?"; values.len()].join(", ");
    if field == ID_FIELD {
      self.sql.push_str(&format!(" AND id IN ({placeholders})"));
    } else {
      // `json_each` yields the value itself for scalars and each element for
      // arrays, which mirrors the containment rule of `Filter::Eq`.
      self.sql.push_str(&format!(
        " AND EXISTS (SELECT 1 FROM json_each(documents.body, ?) AS j WHERE j.value IN ({placeholders}))"
      ));
      self.params.push(SqlValue::Text(format!("$.{field}")));
    }
    self.params.extend(values.into_iter().map(SqlValue::Text));
  }
}

fn text(value: &Value) -> Option<String> { value.as_str().map(str::to_owned) }

/// Field names that map onto a top-level JSON path unambiguously.
fn is_plain_field(field: &str) -> bool {
  !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
