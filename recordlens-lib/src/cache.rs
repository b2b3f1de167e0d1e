//! Page-granular record cache

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use log::{debug, warn};

use crate::error::PageFetchError;
use crate::model::Record;
use crate::source::RecordSource;

/// Records per fetch page, aligned with the server's slicing.
pub const PAGE_SIZE: usize = 100;

/// Page covering a logical index.
pub fn page_of(index: usize) -> usize {
    index / PAGE_SIZE
}

/// Logical index range covered by a page.
pub fn page_bounds(page: usize) -> Range<usize> {
    let start = page * PAGE_SIZE;
    start..start + PAGE_SIZE
}

/// Outcome of a [`PageCache::fetch_page`] call.
#[derive(Debug)]
pub enum PageFill {
    /// The page was fetched and its records stored.
    Fetched,
    /// The page was already resident; the source was not touched.
    AlreadyLoaded,
    /// Another fill was in flight, so this one was skipped.
    Busy,
    /// The fetch failed; affected slots stay empty until a later
    /// navigation retries them.
    Failed(PageFetchError),
}

/// Sparse, append-only store of fetched records keyed by logical index.
///
/// Slots are filled a page at a time and never overwritten or evicted,
/// so a record handed to a render sink can only ever be replaced by
/// itself. Presence of a page's first slot marks the whole page as
/// loaded. A single cooperative flag keeps concurrent window fills from
/// issuing duplicate page fetches; a fill that loses the race skips
/// instead of waiting, and the skipped range is picked up by the next
/// navigation that covers it.
#[derive(Debug, Default)]
pub struct PageCache {
    slots: DashMap<usize, Record>,
    fill_in_flight: AtomicBool,
}

impl PageCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a page's records are resident.
    pub fn is_page_loaded(&self, page: usize) -> bool {
        self.slots.contains_key(&page_bounds(page).start)
    }

    /// Returns `true` while a page fetch is in flight.
    pub fn is_filling(&self) -> bool {
        self.fill_in_flight.load(Ordering::SeqCst)
    }

    /// Record at a logical index, if resident.
    pub fn record(&self, index: usize) -> Option<Record> {
        self.slots.get(&index).map(|entry| entry.clone())
    }

    /// Number of resident records.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if nothing is resident yet.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Snapshot of a slot range, `None` where nothing is resident.
    pub fn window(&self, range: Range<usize>) -> Vec<Option<Record>> {
        range.map(|index| self.record(index)).collect()
    }

    /// Stores a page of records, skipping slots that are already filled.
    ///
    /// A page shorter than [`PAGE_SIZE`] fills only its leading slots;
    /// that happens on the final page of a collection.
    pub fn populate(&self, page: usize, records: Vec<Record>) {
        let start = page_bounds(page).start;
        for (offset, record) in records.into_iter().enumerate() {
            self.slots.entry(start + offset).or_insert(record);
        }
    }

    /// Ensures a page is resident, fetching it from `source` if needed.
    ///
    /// Fills are best-effort: a failure is logged and reported, never
    /// retried here. At most one fill runs at a time; a call that finds
    /// another in flight returns [`PageFill::Busy`] without touching
    /// the source.
    pub async fn fetch_page(&self, source: &dyn RecordSource, page: usize) -> PageFill {
        if self.is_page_loaded(page) {
            return PageFill::AlreadyLoaded;
        }
        if self.fill_in_flight.swap(true, Ordering::SeqCst) {
            debug!("skipping page {page} fetch, another fill is in flight");
            return PageFill::Busy;
        }

        let result = source.fetch_record_page(page).await;
        self.fill_in_flight.store(false, Ordering::SeqCst);

        match result {
            Ok(records) => {
                debug!("page {page} loaded with {} records", records.len());
                self.populate(page, records);
                PageFill::Fetched
            }
            Err(err) => {
                warn!("{err}");
                PageFill::Failed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tokio::sync::Semaphore;

    use super::*;
    use crate::error::{ImageFetchError, LoadError, MetadataFetchError, SourceError};
    use crate::model::{CollectionSummary, ImageData, RecordMetadata};

    fn record(index: usize) -> Record {
        Record::new(format!("rec-{index:05}"), "/data/shard0")
    }

    fn page_records(page: usize, len: usize) -> Vec<Record> {
        let start = page_bounds(page).start;
        (0..len).map(|offset| record(start + offset)).collect()
    }

    struct CountingSource {
        pages: Mutex<Vec<usize>>,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Self {
            Self {
                pages: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl RecordSource for CountingSource {
        async fn load_collection(&self, _path: &str) -> Result<CollectionSummary, LoadError> {
            Ok(CollectionSummary::new(0, 0))
        }

        async fn fetch_record_page(&self, page: usize) -> Result<Vec<Record>, PageFetchError> {
            self.pages.lock().unwrap().push(page);
            if self.fail {
                Err(PageFetchError::new(page, SourceError::http(500, "boom")))
            } else {
                Ok(page_records(page, PAGE_SIZE))
            }
        }

        async fn fetch_image(
            &self,
            key: &str,
            _location: &str,
        ) -> Result<ImageData, ImageFetchError> {
            Err(ImageFetchError::new(key, SourceError::rejected("no images")))
        }

        async fn fetch_metadata(
            &self,
            key: &str,
            _location: &str,
        ) -> Result<RecordMetadata, MetadataFetchError> {
            Err(MetadataFetchError::new(key, SourceError::rejected("no metadata")))
        }
    }

    struct GatedSource {
        started: Arc<Semaphore>,
        release: Arc<Semaphore>,
        pages: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl RecordSource for GatedSource {
        async fn load_collection(&self, _path: &str) -> Result<CollectionSummary, LoadError> {
            Ok(CollectionSummary::new(0, 0))
        }

        async fn fetch_record_page(&self, page: usize) -> Result<Vec<Record>, PageFetchError> {
            self.pages.lock().unwrap().push(page);
            self.started.add_permits(1);
            self.release.acquire().await.unwrap().forget();
            Ok(page_records(page, PAGE_SIZE))
        }

        async fn fetch_image(
            &self,
            key: &str,
            _location: &str,
        ) -> Result<ImageData, ImageFetchError> {
            Err(ImageFetchError::new(key, SourceError::rejected("no images")))
        }

        async fn fetch_metadata(
            &self,
            key: &str,
            _location: &str,
        ) -> Result<RecordMetadata, MetadataFetchError> {
            Err(MetadataFetchError::new(key, SourceError::rejected("no metadata")))
        }
    }

    #[test]
    fn test_page_math() {
        assert_eq!(page_of(0), 0);
        assert_eq!(page_of(99), 0);
        assert_eq!(page_of(100), 1);
        assert_eq!(page_of(250), 2);
        assert_eq!(page_bounds(2), 200..300);
    }

    #[test]
    fn test_populate_and_window() {
        let cache = PageCache::new();
        cache.populate(0, page_records(0, PAGE_SIZE));

        let window = cache.window(95..110);
        assert_eq!(window.len(), 15);
        assert!(window[..5].iter().all(Option::is_some));
        assert!(window[5..].iter().all(Option::is_none));
        assert_eq!(cache.record(99).unwrap().key(), "rec-00099");
        assert_eq!(cache.record(100), None);
    }

    #[test]
    fn test_populate_never_overwrites() {
        let cache = PageCache::new();
        cache.populate(0, page_records(0, PAGE_SIZE));
        cache.populate(0, vec![Record::new("replacement", "/elsewhere")]);

        assert_eq!(cache.record(0).unwrap().key(), "rec-00000");
        assert_eq!(cache.len(), PAGE_SIZE);
    }

    #[test]
    fn test_short_final_page() {
        let cache = PageCache::new();
        cache.populate(1, page_records(1, 50));

        assert!(cache.is_page_loaded(1));
        assert!(cache.record(149).is_some());
        assert_eq!(cache.record(150), None);
    }

    #[tokio::test]
    async fn test_fetch_page_stores_records() {
        let cache = PageCache::new();
        let source = CountingSource::new(false);

        assert!(matches!(
            cache.fetch_page(&source, 1).await,
            PageFill::Fetched
        ));
        assert!(cache.is_page_loaded(1));
        assert_eq!(*source.pages.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_fetch_page_skips_resident_page() {
        let cache = PageCache::new();
        cache.populate(0, page_records(0, PAGE_SIZE));
        let source = CountingSource::new(false);

        assert!(matches!(
            cache.fetch_page(&source, 0).await,
            PageFill::AlreadyLoaded
        ));
        assert!(source.pages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_page_retryable() {
        let cache = PageCache::new();
        let failing = CountingSource::new(true);

        let fill = cache.fetch_page(&failing, 3).await;
        assert!(matches!(fill, PageFill::Failed(ref err) if err.page == 3));
        assert!(!cache.is_page_loaded(3));
        assert!(!cache.is_filling());

        let working = CountingSource::new(false);
        assert!(matches!(
            cache.fetch_page(&working, 3).await,
            PageFill::Fetched
        ));
        assert!(cache.is_page_loaded(3));
    }

    #[tokio::test]
    async fn test_concurrent_fill_skips() {
        let cache = Arc::new(PageCache::new());
        let source = Arc::new(GatedSource {
            started: Arc::new(Semaphore::new(0)),
            release: Arc::new(Semaphore::new(0)),
            pages: Mutex::new(Vec::new()),
        });

        let first = tokio::spawn({
            let cache = cache.clone();
            let source = source.clone();
            async move { cache.fetch_page(source.as_ref(), 0).await }
        });
        source.started.acquire().await.unwrap().forget();

        assert!(matches!(
            cache.fetch_page(source.as_ref(), 0).await,
            PageFill::Busy
        ));

        source.release.add_permits(1);
        assert!(matches!(first.await.unwrap(), PageFill::Fetched));
        assert_eq!(*source.pages.lock().unwrap(), vec![0]);
        assert!(cache.is_page_loaded(0));
    }
}
