//! Cursor-following pagination.

use crate::error::{OrgFetchError, Result};
use serde::de::DeserializeOwned;
use std::collections::HashSet;

/// One raw page of a paginated list.
#[derive(Debug, Clone)]
pub struct Page {
    /// Locator the page was fetched from.
    pub locator: String,
    /// Undecoded response body.
    pub body: Vec<u8>,
    /// Locator of the following page, `None` on the last page.
    pub next: Option<String>,
}

/// Fetches a single page for a locator.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, locator: &str) -> Result<Page>;
}

/// Lazily walks a paginated list starting from one locator.
///
/// Yields pages in order and stops after the page whose `next` is `None`.
/// The first fetch error is yielded once and ends the sequence. A `next`
/// locator that was already fetched also ends the sequence, so a looping
/// `Link` header cannot cause an endless walk.
pub struct Paginator<'a, F: PageFetcher + ?Sized> {
    fetcher: &'a F,
    next: Option<String>,
    seen: HashSet<String>,
    max_pages: Option<usize>,
    fetched: usize,
}

impl<'a, F: PageFetcher + ?Sized> Paginator<'a, F> {
    /// Creates a paginator that starts at `start`.
    pub fn new(fetcher: &'a F, start: impl Into<String>) -> Self {
        Self {
            fetcher,
            next: Some(start.into()),
            seen: HashSet::new(),
            max_pages: None,
            fetched: 0,
        }
    }

    /// Stops after `pages` pages regardless of any continuation.
    pub fn max_pages(mut self, pages: usize) -> Self {
        self.max_pages = Some(pages);
        self
    }

    /// Fetches every page, failing on the first error.
    pub fn collect_all(self) -> Result<Vec<Page>> {
        self.collect()
    }
}

impl<F: PageFetcher + ?Sized> Iterator for Paginator<'_, F> {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.max_pages.is_some_and(|max| self.fetched >= max) {
            self.next = None;
        }

        let locator = self.next.take()?;
        if !self.seen.insert(locator.clone()) {
            tracing::warn!(%locator, "pagination cursor repeated, stopping");
            return None;
        }

        tracing::debug!(%locator, page = self.fetched + 1, "fetching page");
        match self.fetcher.fetch(&locator) {
            Ok(page) => {
                self.fetched += 1;
                self.next = page.next.clone();
                Some(Ok(page))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Decodes each page as a JSON array and concatenates the items in page order.
pub fn decode_pages<T: DeserializeOwned>(pages: &[Page]) -> Result<Vec<T>> {
    let mut items = Vec::new();
    for page in pages {
        let batch: Vec<T> =
            serde_json::from_slice(&page.body).map_err(|source| OrgFetchError::Decode {
                url: page.locator.clone(),
                source,
            })?;
        items.extend(batch);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing::StaticFetcher;

    fn numbered_pages(pages: usize, per_page: usize) -> StaticFetcher {
        let mut fetcher = StaticFetcher::new();
        for p in 0..pages {
            let items: Vec<String> = (0..per_page).map(|i| (p * per_page + i).to_string()).collect();
            let body = format!("[{}]", items.join(","));
            let next = if p + 1 < pages {
                Some(format!("page-{}", p + 1))
            } else {
                None
            };
            fetcher = fetcher.page(&format!("page-{}", p), &body, next.as_deref());
        }
        fetcher
    }

    #[test]
    fn test_collects_every_page_in_order() {
        let fetcher = numbered_pages(4, 3);
        let pages = Paginator::new(&fetcher, "page-0").collect_all().unwrap();
        assert_eq!(pages.len(), 4);

        let items: Vec<usize> = decode_pages(&pages).unwrap();
        assert_eq!(items, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn test_single_page_without_next() {
        let fetcher = StaticFetcher::new().page("only", "[]", None);
        let pages = Paginator::new(&fetcher, "only").collect_all().unwrap();
        assert_eq!(pages.len(), 1);
        assert!(decode_pages::<u32>(&pages).unwrap().is_empty());
    }

    #[test]
    fn test_repeated_cursor_stops() {
        let fetcher = StaticFetcher::new()
            .page("a", "[1]", Some("b"))
            .page("b", "[2]", Some("a"));

        let pages = Paginator::new(&fetcher, "a").collect_all().unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(fetcher.requested(), vec!["a", "b"]);
    }

    #[test]
    fn test_self_referencing_next_stops() {
        let fetcher = StaticFetcher::new().page("a", "[1]", Some("a"));
        let pages = Paginator::new(&fetcher, "a").collect_all().unwrap();
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_error_discards_fetched_pages() {
        let fetcher = StaticFetcher::new()
            .page("a", "[1]", Some("b"))
            .page("b", "[2]", Some("missing"));

        let result = Paginator::new(&fetcher, "a").collect_all();
        assert!(matches!(
            result,
            Err(OrgFetchError::HttpStatus { status: 404, .. })
        ));
    }

    #[test]
    fn test_max_pages_truncates() {
        let fetcher = numbered_pages(3, 2);
        let pages = Paginator::new(&fetcher, "page-0")
            .max_pages(1)
            .collect_all()
            .unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(fetcher.requested(), vec!["page-0"]);
    }

    #[test]
    fn test_malformed_page_is_decode_error() {
        let fetcher = StaticFetcher::new().page("a", "{not json", None);
        let pages = Paginator::new(&fetcher, "a").collect_all().unwrap();
        let result = decode_pages::<u32>(&pages);
        assert!(matches!(result, Err(OrgFetchError::Decode { url, .. }) if url == "a"));
    }
}
