//! Page requests and paginated results.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// A 1-based page window. Always holds positive values: every way of
/// building one, deserialisation included, goes through [`PageRequest::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPageRequest")]
pub struct PageRequest {
  page:      u64,
  page_size: u64,
}

#[derive(Deserialize)]
struct RawPageRequest {
  #[serde(default)]
  page:      u64,
  #[serde(default)]
  page_size: u64,
}

impl From<RawPageRequest> for PageRequest {
  fn from(raw: RawPageRequest) -> Self { Self::new(raw.page, raw.page_size) }
}

impl Default for PageRequest {
  fn default() -> Self { Self { page: DEFAULT_PAGE, page_size: DEFAULT_PAGE_SIZE } }
}

impl PageRequest {
  /// Zero falls back to the defaults; the size is capped at
  /// [`MAX_PAGE_SIZE`].
  pub fn new(page: u64, page_size: u64) -> Self {
    let page = if page == 0 { DEFAULT_PAGE } else { page };
    let page_size = match page_size {
      0 => DEFAULT_PAGE_SIZE,
      n => n.min(MAX_PAGE_SIZE),
    };
    Self { page, page_size }
  }

  /// Coerce raw query-string values. Missing, non-numeric, and non-positive
  /// inputs fall back to page 1 / size 10.
  pub fn parse(page: Option<&str>, page_size: Option<&str>) -> Self {
    fn positive(raw: Option<&str>) -> u64 {
      raw
        .and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .map_or(0, |n| n as u64)
    }
    Self::new(positive(page), positive(page_size))
  }

  pub fn page(&self) -> u64 { self.page }

  pub fn page_size(&self) -> u64 { self.page_size }

  /// Number of items before this page.
  pub fn offset(&self) -> usize {
    (self.page.saturating_sub(1)).saturating_mul(self.page_size) as usize
  }

  pub fn limit(&self) -> usize { self.page_size as usize }

  pub fn total_pages(&self, total_items: u64) -> u64 {
    total_items.div_ceil(self.page_size)
  }

  /// Cut this page out of a complete, ordered result set.
  pub fn slice<T>(&self, all: Vec<T>) -> Page<T> {
    let total = all.len() as u64;
    let items = all.into_iter().skip(self.offset()).take(self.limit()).collect();
    Page::new(items, total, *self)
  }
}

/// One page of results plus metadata about the complete result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
  pub items:       Vec<T>,
  pub total_items: u64,
  pub total_pages: u64,
  pub page:        u64,
  pub page_size:   u64,
}

impl<T> Page<T> {
  pub fn new(items: Vec<T>, total_items: u64, request: PageRequest) -> Self {
    Self {
      items,
      total_items,
      total_pages: request.total_pages(total_items),
      page: request.page,
      page_size: request.page_size,
    }
  }

  pub fn empty(request: PageRequest) -> Self { Self::new(Vec::new(), 0, request) }

  pub fn try_map<U, E>(
    self,
    f: impl FnMut(T) -> Result<U, E>,
  ) -> Result<Page<U>, E> {
    Ok(Page {
      items:       self.items.into_iter().map(f).collect::<Result<_, _>>()?,
      total_items: self.total_items,
      total_pages: self.total_pages,
      page:        self.page,
      page_size:   self.page_size,
    })
  }
}
