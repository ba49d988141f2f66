//! The `DocumentStore` trait: the narrow persistence surface every engine is
//! written against.
//!
//! Backends (e.g. `reel-store-sqlite`) implement the trait; the engines in
//! this crate and the HTTP layer depend only on the abstraction.

use std::future::Future;

use crate::{
  Collection, Document, Error, Id, Record, Result,
  filter::Filter,
  page::{Page, PageRequest},
  pipeline::Stage,
};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a document store backend.
///
/// Single-document writes are atomic. Nothing spanning several documents is,
/// so callers must tolerate interleaving with concurrent writers.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reads ─────────────────────────────────────────────────────────────

  fn find_by_id(
    &self,
    collection: Collection,
    id: Id,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_;

  /// Every document of `collection` matching `filter`, in insertion order.
  fn find(
    &self,
    collection: Collection,
    filter: Filter,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert a new document. Returns `false`, writing nothing, when the
  /// document would violate a uniqueness constraint of the collection.
  fn insert(
    &self,
    collection: Collection,
    doc: Document,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Shallow-merge `patch` into the stored document. Returns the updated
  /// document, or `None` if nothing has that id.
  fn update_by_id(
    &self,
    collection: Collection,
    id: Id,
    patch: Document,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_;

  /// Returns `true` if a document was removed.
  fn delete_by_id(
    &self,
    collection: Collection,
    id: Id,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Aggregation ───────────────────────────────────────────────────────

  /// Run a pipeline against `collection` and return the output sequence.
  fn run_pipeline(
    &self,
    collection: Collection,
    stages: Vec<Stage>,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + '_;

  /// Run a pipeline and return one page of its output together with the
  /// total length of the unwindowed output.
  fn paginate(
    &self,
    collection: Collection,
    stages: Vec<Stage>,
    page: PageRequest,
  ) -> impl Future<Output = Result<Page<Document>, Self::Error>> + Send + '_;
}

// ─── Typed helpers ───────────────────────────────────────────────────────────

/// Fetch and decode a record. `None` if no such document exists.
pub async fn get<T: Record, S: DocumentStore>(store: &S, id: Id) -> Result<Option<T>> {
  match store.find_by_id(T::COLLECTION, id).await.map_err(Error::store)? {
    Some(doc) => Ok(Some(T::from_document(doc)?)),
    None => Ok(None),
  }
}

/// Like [`get`], but a missing document is [`Error::NotFound`].
pub async fn require<T: Record, S: DocumentStore>(store: &S, id: Id) -> Result<T> {
  get(store, id).await?.ok_or_else(|| Error::not_found(T::COLLECTION, id))
}

pub async fn exists<S: DocumentStore>(
  store: &S,
  collection: Collection,
  id: Id,
) -> Result<bool> {
  Ok(store.find_by_id(collection, id).await.map_err(Error::store)?.is_some())
}

/// Persist a new record. Returns `false` on a uniqueness violation.
pub async fn insert_record<T: Record, S: DocumentStore>(
  store: &S,
  record: &T,
) -> Result<bool> {
  let doc = record.to_document()?;
  store.insert(T::COLLECTION, doc).await.map_err(Error::store)
}
