//! [`SqliteStore`]: the SQLite implementation of [`DocumentStore`].

use std::path::Path;

use reel_core::{
  Collection, Document, Id,
  document::{ID_FIELD, document_id},
  eval,
  filter::Filter,
  page::{Page, PageRequest},
  pipeline::Stage,
  store::DocumentStore,
};
use rusqlite::{ErrorCode, OptionalExtension as _};
use tracing::debug;

use crate::{
  Result,
  codec::{decode_body, encode_body},
  reader::SqlReader,
  schema::SCHEMA,
};

const SELECT_BODY: &str = "SELECT body FROM documents WHERE collection = ?1 AND id = ?2";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A document store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn evaluate(&self, collection: Collection, stages: Vec<Stage>) -> Result<Vec<Document>> {
    let docs = self
      .conn
      .call(move |conn| {
        let mut reader = SqlReader::new(conn);
        Ok(eval::run(&mut reader, collection, &stages)?)
      })
      .await?;
    Ok(docs)
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = crate::Error;

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn find_by_id(&self, collection: Collection, id: Id) -> Result<Option<Document>> {
    let collection = collection.to_string();
    let id = id.to_string();

    let doc = self
      .conn
      .call(move |conn| {
        let body: Option<String> = conn
          .query_row(SELECT_BODY, rusqlite::params![collection, id], |r| r.get(0))
          .optional()?;
        Ok(body.map(|b| decode_body(&b)).transpose()?)
      })
      .await?;
    Ok(doc)
  }

  async fn find(&self, collection: Collection, filter: Filter) -> Result<Vec<Document>> {
    self.evaluate(collection, vec![Stage::Match(filter)]).await
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn insert(&self, collection: Collection, doc: Document) -> Result<bool> {
    let id = document_id(&doc)?.to_string();
    let body = serde_json::to_string(&doc)?;
    let name = collection.to_string();

    let inserted = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
          rusqlite::params![name, id, body],
        ) {
          Ok(_) => Ok(true),
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == ErrorCode::ConstraintViolation =>
          {
            Ok(false)
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      debug!(%collection, "insert rejected by uniqueness constraint");
    }
    Ok(inserted)
  }

  async fn update_by_id(
    &self,
    collection: Collection,
    id: Id,
    patch: Document,
  ) -> Result<Option<Document>> {
    let collection = collection.to_string();
    let id = id.to_string();

    let updated = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let body: Option<String> = tx
          .query_row(SELECT_BODY, rusqlite::params![collection, id], |r| r.get(0))
          .optional()?;
        let Some(body) = body else {
          return Ok(None);
        };

        let mut doc = decode_body(&body)?;
        for (field, value) in patch {
          // The primary key is immutable.
          if field != ID_FIELD {
            doc.insert(field, value);
          }
        }

        tx.execute(
          "UPDATE documents SET body = ?3 WHERE collection = ?1 AND id = ?2",
          rusqlite::params![collection, id, encode_body(&doc)?],
        )?;
        tx.commit()?;
        Ok(Some(doc))
      })
      .await?;
    Ok(updated)
  }

  async fn delete_by_id(&self, collection: Collection, id: Id) -> Result<bool> {
    let collection = collection.to_string();
    let id = id.to_string();

    let deleted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
          rusqlite::params![collection, id],
        )?;
        Ok(n > 0)
      })
      .await?;
    Ok(deleted)
  }

  // ── Aggregation ───────────────────────────────────────────────────────────

  async fn run_pipeline(&self, collection: Collection, stages: Vec<Stage>) -> Result<Vec<Document>> {
    self.evaluate(collection, stages).await
  }

  async fn paginate(
    &self,
    collection: Collection,
    stages: Vec<Stage>,
    page: PageRequest,
  ) -> Result<Page<Document>> {
    let page = self
      .conn
      .call(move |conn| {
        let mut reader = SqlReader::new(conn);
        Ok(eval::paginate(&mut reader, collection, &stages, page)?)
      })
      .await?;
    Ok(page)
  }
}
