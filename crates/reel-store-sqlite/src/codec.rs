//! Conversion between [`Document`]s and the JSON text in the `body` column.
//!
//! Failures are reported as `rusqlite` conversion errors so they can be raised
//! from inside `Connection::call` closures and from the pipeline reader.

use reel_core::Document;
use rusqlite::types::Type;

pub fn encode_body(doc: &Document) -> rusqlite::Result<String> {
  serde_json::to_string(doc).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

pub fn decode_body(body: &str) -> rusqlite::Result<Document> {
  serde_json::from_str(body)
    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}
