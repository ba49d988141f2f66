//! SQL schema for the reel SQLite store.
//!
//! Executed once at connection startup. The version is recorded in
//! `PRAGMA user_version` so later migrations can be gated on it.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Every collection shares one table. `seq` records insertion order, which
-- scans follow and stable sorts fall back to.
CREATE TABLE IF NOT EXISTS documents (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT,
    collection TEXT NOT NULL,   -- snake_case collection name
    id         TEXT NOT NULL,   -- hyphenated lowercase UUID, mirrors body.id
    body       TEXT NOT NULL,   -- JSON object
    UNIQUE (collection, id)
);

CREATE INDEX IF NOT EXISTS documents_collection_idx ON documents(collection, seq);

-- Relation rows are unique per key. Concurrent toggles rely on these.
CREATE UNIQUE INDEX IF NOT EXISTS likes_relation_idx ON documents(
    json_extract(body, '$.subject_kind'),
    json_extract(body, '$.subject_id'),
    json_extract(body, '$.actor_id')
) WHERE collection = 'likes';

CREATE UNIQUE INDEX IF NOT EXISTS subscriptions_relation_idx ON documents(
    json_extract(body, '$.channel_id'),
    json_extract(body, '$.subscriber_id')
) WHERE collection = 'subscriptions';

PRAGMA user_version = 1;
";
