// ============================================================================
// bitcap-core/src/storage/mod.rs
// ============================================================================
//
// OBJECT STORAGE: Listing, Download, and In-Place Upload
//
// The object store is reached only through the `ObjectStore` trait so the
// batch logic can run against a scripted store in tests. Listing is
// page-based; `ObjectListing` turns the pages into a lazy key iterator that
// fetches the next page only when the current one is exhausted.
//
// KEY COMPONENTS:
// - ObjectStore: list one page, download one key, upload over one key
// - ObjectListing: lazy iterator over every key under a prefix
// - S3ObjectStore: production implementation on aws-sdk-s3
//
// AI-ASSISTANT-INFO: Object store abstraction and paginated listing

use crate::error::CoreResult;
use std::collections::VecDeque;
use std::path::Path;

mod s3;

pub use s3::S3ObjectStore;

/// One page of a prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    /// Keys in store order
    pub keys: Vec<String>,
    /// Token for the following page; `None` on the last page
    pub next_token: Option<String>,
}

/// Trait for the remote object store, allowing mocking.
pub trait ObjectStore {
    /// Lists one page of keys under `prefix`, starting at `continuation`.
    fn list_page(&self, prefix: &str, continuation: Option<&str>) -> CoreResult<ObjectPage>;

    /// Writes the object stored at `key` to `local_path`.
    fn download(&self, key: &str, local_path: &Path) -> CoreResult<()>;

    /// Uploads `local_path` to `key`, replacing any existing object.
    fn upload(&self, local_path: &Path, key: &str) -> CoreResult<()>;
}

impl<T: ObjectStore + ?Sized> ObjectStore for &T {
    fn list_page(&self, prefix: &str, continuation: Option<&str>) -> CoreResult<ObjectPage> {
        (**self).list_page(prefix, continuation)
    }

    fn download(&self, key: &str, local_path: &Path) -> CoreResult<()> {
        (**self).download(key, local_path)
    }

    fn upload(&self, local_path: &Path, key: &str) -> CoreResult<()> {
        (**self).upload(local_path, key)
    }
}

/// Lazy iterator over every key under a prefix.
///
/// A listing error is yielded once and ends the iteration.
pub struct ObjectListing<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    prefix: String,
    buffered: VecDeque<String>,
    next_token: Option<String>,
    started: bool,
    finished: bool,
    pages_fetched: usize,
}

impl<'a, S: ObjectStore + ?Sized> ObjectListing<'a, S> {
    pub fn new(store: &'a S, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            buffered: VecDeque::new(),
            next_token: None,
            started: false,
            finished: false,
            pages_fetched: 0,
        }
    }

    /// Number of pages requested so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    fn fetch_next_page(&mut self) -> CoreResult<()> {
        let page = self
            .store
            .list_page(&self.prefix, self.next_token.as_deref())?;
        self.started = true;
        self.pages_fetched += 1;
        log::debug!(
            "Listed {} keys under '{}' (page {})",
            page.keys.len(),
            self.prefix,
            self.pages_fetched
        );
        self.buffered.extend(page.keys);
        self.next_token = page.next_token;
        Ok(())
    }
}

impl<S: ObjectStore + ?Sized> Iterator for ObjectListing<'_, S> {
    type Item = CoreResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(key) = self.buffered.pop_front() {
                return Some(Ok(key));
            }
            if self.finished || (self.started && self.next_token.is_none()) {
                return None;
            }
            // Empty pages with a continuation token are legal; keep paging.
            if let Err(e) = self.fetch_next_page() {
                self.finished = true;
                return Some(Err(e));
            }
        }
    }
}

/// Content type sent with an upload, from the key's extension.
pub fn content_type_for(key: &str) -> &'static str {
    let ext = Path::new(key)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::external::mocks::MockObjectStore;

    #[test]
    fn listing_walks_every_page_in_order() {
        let store = MockObjectStore::new();
        store.add_page("p/", &["p/1.mp4", "p/2.mov"], Some("t1"));
        store.add_page("p/", &[], Some("t2"));
        store.add_page("p/", &["p/3.mp4"], None);

        let mut listing = ObjectListing::new(&store, "p/");
        let keys: Vec<String> = listing.by_ref().map(|k| k.unwrap()).collect();

        assert_eq!(keys, vec!["p/1.mp4", "p/2.mov", "p/3.mp4"]);
        assert_eq!(listing.pages_fetched(), 3);
        assert_eq!(
            store.list_calls(),
            vec![
                ("p/".to_string(), None),
                ("p/".to_string(), Some("t1".to_string())),
                ("p/".to_string(), Some("t2".to_string())),
            ]
        );
    }

    #[test]
    fn listing_fetches_lazily() {
        let store = MockObjectStore::new();
        store.add_page("p/", &["p/1.mp4"], Some("t1"));
        store.add_page("p/", &["p/2.mp4"], None);

        let mut listing = ObjectListing::new(&store, "p/");
        assert_eq!(listing.pages_fetched(), 0);
        assert_eq!(listing.next().unwrap().unwrap(), "p/1.mp4");
        assert_eq!(listing.pages_fetched(), 1);
    }

    #[test]
    fn unknown_prefix_is_empty() {
        let store = MockObjectStore::new();
        assert_eq!(ObjectListing::new(&store, "nothing/").count(), 0);
    }

    #[test]
    fn listing_error_ends_iteration() {
        let store = MockObjectStore::new();
        store.fail_listing("bad/");
        let mut listing = ObjectListing::new(&store, "bad/");
        assert!(matches!(listing.next(), Some(Err(CoreError::List { .. }))));
        assert!(listing.next().is_none());
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for("a/b.MP4"), "video/mp4");
        assert_eq!(content_type_for("a/b.mov"), "video/quicktime");
        assert_eq!(content_type_for("a/b"), "application/octet-stream");
    }
}
