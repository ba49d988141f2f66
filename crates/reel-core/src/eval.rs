//! In-process pipeline evaluator.
//!
//! Backends hand the evaluator a [`CollectionReader`], a synchronous scan of
//! one collection, and get identical join, sort, and projection semantics
//! regardless of how the documents are physically stored.

use serde_json::Value;

use crate::{
  Collection, Document,
  filter::Filter,
  page::{Page, PageRequest},
  pipeline::{JoinReduce, JoinSpec, Stage},
};

/// Synchronous read access to stored collections.
pub trait CollectionReader {
  type Error;

  /// Documents of `collection` in insertion order. Implementations may
  /// return a superset of the documents matching `filter`; the evaluator
  /// re-checks every document.
  fn scan(
    &mut self,
    collection: Collection,
    filter: &Filter,
  ) -> Result<Vec<Document>, Self::Error>;
}

/// Run `stages` against `collection`. A leading `Match` is handed to the
/// reader so backends can narrow the scan.
pub fn run<R: CollectionReader>(
  reader: &mut R,
  collection: Collection,
  stages: &[Stage],
) -> Result<Vec<Document>, R::Error> {
  let all = Filter::All;
  let (filter, rest) = match stages.split_first() {
    Some((Stage::Match(filter), rest)) => (filter, rest),
    _ => (&all, stages),
  };

  let mut docs = reader.scan(collection, filter)?;
  docs.retain(|d| filter.matches(d));
  apply(reader, docs, rest)
}

/// Run `stages` and return one page of the output.
///
/// Trailing `Lookup`, `AddFields` and `Project` stages map each document to
/// exactly one output without reordering, so they only run over the page
/// window. Everything up to the last stage that filters, orders or windows
/// runs over the whole collection to establish the total.
pub fn paginate<R: CollectionReader>(
  reader: &mut R,
  collection: Collection,
  stages: &[Stage],
  request: PageRequest,
) -> Result<Page<Document>, R::Error> {
  let split = stages
    .iter()
    .rposition(|s| !matches!(s, Stage::Lookup(_) | Stage::AddFields(_) | Stage::Project(_)))
    .map_or(0, |i| i + 1);
  let (head, tail) = stages.split_at(split);

  let mut page = request.slice(run(reader, collection, head)?);
  page.items = apply(reader, page.items, tail)?;
  Ok(page)
}

/// Run `stages` over an already-materialised sequence.
pub fn apply<R: CollectionReader>(
  reader: &mut R,
  mut docs: Vec<Document>,
  stages: &[Stage],
) -> Result<Vec<Document>, R::Error> {
  for stage in stages {
    docs = match stage {
      Stage::Match(filter) => {
        docs.retain(|d| filter.matches(d));
        docs
      }
      Stage::Lookup(join) => lookup(reader, docs, join)?,
      Stage::AddFields(fields) => {
        for doc in &mut docs {
          for field in fields {
            let value = field.expr.evaluate(doc);
            doc.insert(field.name.clone(), value);
          }
        }
        docs
      }
      Stage::Sort(spec) => {
        docs.sort_by(|a, b| spec.compare(a, b));
        docs
      }
      Stage::Project(projection) => docs.iter().map(|d| projection.apply(d)).collect(),
      Stage::Skip(n) => docs.into_iter().skip(*n).collect(),
      Stage::Limit(n) => {
        docs.truncate(*n);
        docs
      }
    };
  }
  Ok(docs)
}

/// The join keys of `doc`: each element of an array field, a scalar field as
/// a single key, nothing for a missing or null field.
fn local_keys<'d>(doc: &'d Document, field: &str) -> Vec<&'d Value> {
  match doc.get(field) {
    None | Some(Value::Null) => Vec::new(),
    Some(Value::Array(items)) => items.iter().collect(),
    Some(value) => vec![value],
  }
}

fn lookup<R: CollectionReader>(
  reader: &mut R,
  mut docs: Vec<Document>,
  join: &JoinSpec,
) -> Result<Vec<Document>, R::Error> {
  let mut keys: Vec<Value> = Vec::new();
  for doc in &docs {
    for key in local_keys(doc, &join.local_field) {
      if !keys.contains(key) {
        keys.push(key.clone());
      }
    }
  }

  // One scan for the whole batch; grouping happens in memory.
  let foreign = if keys.is_empty() {
    Vec::new()
  } else {
    let filter = Filter::In { field: join.foreign_field.clone(), values: keys }
      .and(join.filter.clone());
    let mut found = reader.scan(join.from, &filter)?;
    found.retain(|d| filter.matches(d));
    found
  };

  for doc in &mut docs {
    let mut group: Vec<Document> = Vec::new();
    for key in local_keys(doc, &join.local_field) {
      group.extend(foreign.iter().filter(|f| join.links(f, key)).cloned());
    }
    let group = apply(reader, group, &join.pipeline)?;

    let value = match join.reduce {
      JoinReduce::All => Value::Array(group.into_iter().map(Value::Object).collect()),
      JoinReduce::First => group.into_iter().next().map_or(Value::Null, Value::Object),
    };
    doc.insert(join.as_field.clone(), value);
  }

  Ok(docs)
}
