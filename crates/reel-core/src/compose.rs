//! The view composer: a declarative join/annotate/project pipeline over one
//! base collection, decoded into a typed view record.

use serde::de::DeserializeOwned;

use crate::{
  Collection, Error, Id, Result,
  document::from_document,
  filter::Filter,
  page::{Page, PageRequest},
  pipeline::{ComputedField, JoinSpec, Projection, SortSpec, Stage},
  store::DocumentStore,
};

/// Everything needed to build one kind of view record.
///
/// Stages are emitted in a fixed order: match, joins, computed fields, sort,
/// projection. A sort on a base field moves ahead of the joins, so a paged
/// view only joins the documents of its page. The composer never writes.
#[derive(Debug, Clone)]
pub struct ViewSpec {
  pub base:       Collection,
  pub filter:     Filter,
  pub joins:      Vec<JoinSpec>,
  pub computed:   Vec<ComputedField>,
  /// `None` keeps insertion order.
  pub sort:       Option<SortSpec>,
  pub projection: Projection,
}

impl ViewSpec {
  /// A view over `base`, newest first, projecting `projection`.
  pub fn new(base: Collection, projection: Projection) -> Self {
    Self {
      base,
      filter: Filter::All,
      joins: Vec::new(),
      computed: Vec::new(),
      sort: Some(SortSpec::newest_first()),
      projection,
    }
  }

  pub fn filter(mut self, filter: Filter) -> Self {
    self.filter = self.filter.and(filter);
    self
  }

  pub fn join(mut self, join: JoinSpec) -> Self {
    self.joins.push(join);
    self
  }

  pub fn compute(mut self, field: ComputedField) -> Self {
    self.computed.push(field);
    self
  }

  pub fn sort(mut self, sort: Option<SortSpec>) -> Self {
    self.sort = sort;
    self
  }

  /// Whether `field` only exists after the joins and computed fields ran.
  fn is_derived(&self, field: &str) -> bool {
    self.joins.iter().any(|j| j.as_field == field)
      || self.computed.iter().any(|c| c.name == field)
  }

  pub fn stages(&self) -> Vec<Stage> {
    let (early_sort, late_sort) = match &self.sort {
      Some(sort) if self.is_derived(&sort.field) => (None, Some(sort)),
      sort => (sort.as_ref(), None),
    };

    let mut stages = vec![Stage::Match(self.filter.clone())];
    stages.extend(early_sort.cloned().map(Stage::Sort));
    stages.extend(self.joins.iter().cloned().map(Stage::Lookup));
    if !self.computed.is_empty() {
      stages.push(Stage::AddFields(self.computed.clone()));
    }
    stages.extend(late_sort.cloned().map(Stage::Sort));
    stages.push(Stage::Project(self.projection.clone()));
    stages
  }
}

/// Run the view pipeline and decode every output record.
pub async fn compose<V, S>(store: &S, spec: &ViewSpec) -> Result<Vec<V>>
where
  V: DeserializeOwned,
  S: DocumentStore,
{
  let docs = store
    .run_pipeline(spec.base, spec.stages())
    .await
    .map_err(Error::store)?;
  docs.into_iter().map(from_document).collect()
}

/// The single view record for base document `id`. An empty result is
/// [`Error::NotFound`].
pub async fn compose_one<V, S>(store: &S, spec: &ViewSpec, id: Id) -> Result<V>
where
  V: DeserializeOwned,
  S: DocumentStore,
{
  let spec = spec.clone().filter(Filter::id(id));
  compose(store, &spec)
    .await?
    .into_iter()
    .next()
    .ok_or_else(|| Error::not_found(spec.base, id))
}

/// One page of view records, with totals over the full result.
pub async fn compose_page<V, S>(
  store: &S,
  spec: &ViewSpec,
  page: PageRequest,
) -> Result<Page<V>>
where
  V: DeserializeOwned,
  S: DocumentStore,
{
  store
    .paginate(spec.base, spec.stages(), page)
    .await
    .map_err(Error::store)?
    .try_map(from_document)
}
