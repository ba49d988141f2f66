//! The paginated search resolver.
//!
//! Search runs in two phases. Resolution filters and orders the whole video
//! collection down to an id sequence, without any joins. Enrichment then
//! joins owners onto just the ids of the requested page and restores the
//! resolved order. Totals always come from the resolved candidate count.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
  Collection, Error, Id, Result,
  document::{ID_FIELD, document_id, from_document},
  filter::Filter,
  page::{Page, PageRequest},
  pipeline::{Projection, SortDirection, SortSpec, Stage},
  store::DocumentStore,
  views::{VideoSummary, video_summary_stages},
};

/// Fields free-text queries are matched against.
const TEXT_FIELDS: &[&str] = &["title", "description"];

/// Sortable video fields. Parsing accepts the stored field name as well as a
/// short alias, case-insensitively.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum SortKey {
  #[default]
  #[strum(serialize = "created_at", serialize = "createdAt", serialize = "date")]
  CreatedAt,
  #[strum(serialize = "view_count", serialize = "views")]
  ViewCount,
  #[strum(serialize = "duration_seconds", serialize = "duration")]
  DurationSeconds,
  #[strum(serialize = "title")]
  Title,
}

impl SortKey {
  pub fn field(self) -> &'static str {
    match self {
      Self::CreatedAt => "created_at",
      Self::ViewCount => "view_count",
      Self::DurationSeconds => "duration_seconds",
      Self::Title => "title",
    }
  }
}

/// Parameters for [`search_videos`].
#[derive(Debug, Clone, PartialEq)]
pub struct VideoQuery {
  /// Free text; blank is the same as absent.
  pub text:           Option<String>,
  pub owner_id:       Option<Id>,
  pub sort_key:       SortKey,
  pub direction:      SortDirection,
  pub published_only: bool,
  pub page:           PageRequest,
}

impl Default for VideoQuery {
  fn default() -> Self {
    Self {
      text:           None,
      owner_id:       None,
      sort_key:       SortKey::default(),
      direction:      SortDirection::Desc,
      published_only: true,
      page:           PageRequest::default(),
    }
  }
}

impl VideoQuery {
  fn resolution_stages(&self) -> Vec<Stage> {
    let text = match self.text.as_deref().map(str::trim) {
      Some(q) if !q.is_empty() => Filter::text(TEXT_FIELDS, q),
      _ => Filter::All,
    };
    let mut stages = vec![
      Stage::Match(text),
      Stage::Sort(SortSpec::new(self.sort_key.field(), self.direction)),
    ];
    if let Some(owner_id) = self.owner_id {
      stages.push(Stage::Match(Filter::eq("owner_id", owner_id)));
    }
    if self.published_only {
      stages.push(Stage::Match(Filter::eq("is_published", true)));
    }
    stages.push(Stage::Project(Projection::of(&[ID_FIELD])));
    stages
  }
}

/// Resolution phase: the complete, ordered id sequence matching `query`.
/// Ties on the sort key keep insertion order.
pub async fn resolve_candidates<S: DocumentStore>(
  store: &S,
  query: &VideoQuery,
) -> Result<Vec<Id>> {
  let docs = store
    .run_pipeline(Collection::Videos, query.resolution_stages())
    .await
    .map_err(Error::store)?;
  docs.iter().map(document_id).collect()
}

/// Enrichment phase: one page of summaries for `candidates`. An empty
/// candidate list, or a page past the end, never touches the store.
pub async fn enrich_page<S: DocumentStore>(
  store: &S,
  candidates: &[Id],
  page: PageRequest,
) -> Result<Page<VideoSummary>> {
  if candidates.is_empty() {
    debug!("no search candidates, skipping enrichment");
    return Ok(Page::empty(page));
  }

  let total = candidates.len() as u64;
  let window: Vec<Id> =
    candidates.iter().skip(page.offset()).take(page.limit()).copied().collect();
  if window.is_empty() {
    return Ok(Page::new(Vec::new(), total, page));
  }

  let mut stages = vec![Stage::Match(Filter::is_in(ID_FIELD, window.iter().copied()))];
  stages.extend(video_summary_stages());
  let docs = store
    .run_pipeline(Collection::Videos, stages)
    .await
    .map_err(Error::store)?;

  let mut by_id = HashMap::with_capacity(docs.len());
  for doc in docs {
    let summary: VideoSummary = from_document(doc)?;
    by_id.insert(summary.id, summary);
  }
  // A candidate deleted between the phases is dropped from the page.
  let items: Vec<VideoSummary> = window.iter().filter_map(|id| by_id.remove(id)).collect();
  debug!(total, page = page.page(), items = items.len(), "search page enriched");

  Ok(Page::new(items, total, page))
}

pub async fn search_videos<S: DocumentStore>(
  store: &S,
  query: &VideoQuery,
) -> Result<Page<VideoSummary>> {
  let candidates = resolve_candidates(store, query).await?;
  debug!(candidates = candidates.len(), "search candidates resolved");
  enrich_page(store, &candidates, query.page).await
}
