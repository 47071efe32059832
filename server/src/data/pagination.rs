//! Page-at-a-time iteration over a filtered user listing
//!
//! A [`Paginator`] owns the cursor (offset and last reported total) behind a
//! lock and asks a [`PageSource`] for rows. Backends only implement the
//! source; the cursor state machine is shared.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::error::DataError;
use super::traits::PageIterator;
use super::types::{PaginationData, User};

/// Rows of one page plus the total matching row count reported alongside them
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    pub users: Vec<User>,
    pub total_rows: u64,
}

/// A prepared listing that can return the page starting at any offset
#[async_trait]
pub trait PageSource: Send + Sync {
    fn page_size(&self) -> u64;

    async fn fetch(&self, offset: u64, cancel: &CancellationToken)
    -> Result<FetchedPage, DataError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    Created,
    Active,
    Exhausted,
}

#[derive(Debug)]
struct Cursor {
    offset: u64,
    total_rows: u64,
    state: CursorState,
}

/// Iterator over the pages of a [`PageSource`]
pub struct Paginator<S> {
    source: S,
    cursor: Mutex<Cursor>,
}

impl<S: PageSource> Paginator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cursor: Mutex::new(Cursor {
                offset: 0,
                total_rows: 0,
                state: CursorState::Created,
            }),
        }
    }
}

#[async_trait]
impl<S: PageSource> PageIterator for Paginator<S> {
    async fn pagination(&self) -> Option<PaginationData> {
        let cursor = self.cursor.lock().await;
        match cursor.state {
            CursorState::Created => None,
            CursorState::Active | CursorState::Exhausted => Some(PaginationData::new(
                cursor.total_rows,
                self.source.page_size(),
            )),
        }
    }

    async fn next(&self, cancel: &CancellationToken) -> Result<Option<Vec<User>>, DataError> {
        // Held across the fetch: one page in flight per iterator
        let mut cursor = self.cursor.lock().await;
        if cursor.state == CursorState::Exhausted {
            return Ok(None);
        }

        let page = self.source.fetch(cursor.offset, cancel).await?;
        tracing::trace!(
            offset = cursor.offset,
            rows = page.users.len(),
            total_rows = page.total_rows,
            "Fetched page"
        );

        if page.users.is_empty() {
            // An empty first page carries no total column, so the total is zero
            if cursor.state == CursorState::Created {
                cursor.total_rows = 0;
            }
            cursor.state = CursorState::Exhausted;
            return Ok(None);
        }

        cursor.offset += page.users.len() as u64;
        cursor.total_rows = page.total_rows;
        cursor.state = CursorState::Active;
        Ok(Some(page.users))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn user(n: usize) -> User {
        User {
            id: format!("u{n}"),
            first_name: None,
            last_name: None,
            nickname: format!("nick{n}"),
            password: String::new(),
            email: format!("u{n}@example.com"),
            country: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Serves `rows` users; fails on the listed call numbers (0-based)
    struct FakeSource {
        rows: usize,
        size: u64,
        calls: Arc<AtomicUsize>,
        fail_on: Vec<usize>,
    }

    impl FakeSource {
        fn new(rows: usize, size: u64) -> Self {
            Self {
                rows,
                size,
                calls: Arc::new(AtomicUsize::new(0)),
                fail_on: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl PageSource for FakeSource {
        fn page_size(&self) -> u64 {
            self.size
        }

        async fn fetch(
            &self,
            offset: u64,
            cancel: &CancellationToken,
        ) -> Result<FetchedPage, DataError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if cancel.is_cancelled() {
                return Err(DataError::Cancelled);
            }
            if self.fail_on.contains(&call) {
                return Err(DataError::from_postgres(sqlx::Error::PoolTimedOut));
            }
            let start = (offset as usize).min(self.rows);
            let end = (start + self.size as usize).min(self.rows);
            Ok(FetchedPage {
                users: (start..end).map(user).collect(),
                total_rows: if start < end { self.rows as u64 } else { 0 },
            })
        }
    }

    async fn page_sizes(it: &dyn PageIterator) -> Vec<usize> {
        let token = CancellationToken::new();
        let mut sizes = Vec::new();
        while let Some(page) = it.next(&token).await.unwrap() {
            sizes.push(page.len());
        }
        sizes
    }

    #[tokio::test]
    async fn test_seven_rows_in_pages_of_three() {
        let it = Paginator::new(FakeSource::new(7, 3));
        let token = CancellationToken::new();

        assert!(it.pagination().await.is_none());

        let first = it.next(&token).await.unwrap().unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first[0].id, "u0");
        assert_eq!(
            it.pagination().await,
            Some(PaginationData {
                total_elements: 7,
                total_pages: 3,
                page_size: 3,
            })
        );

        assert_eq!(it.next(&token).await.unwrap().unwrap()[0].id, "u3");
        assert_eq!(it.next(&token).await.unwrap().unwrap().len(), 1);
        assert!(it.next(&token).await.unwrap().is_none());
        assert_eq!(it.pagination().await.unwrap().total_elements, 7);
    }

    #[tokio::test]
    async fn test_helper_walks_all_pages() {
        let it = Paginator::new(FakeSource::new(10, 4));
        assert_eq!(page_sizes(&it).await, vec![4, 4, 2]);
    }

    #[tokio::test]
    async fn test_exhaustion_is_idempotent() {
        let source = FakeSource::new(2, 5);
        let calls = source.calls.clone();
        let it = Paginator::new(source);
        let token = CancellationToken::new();

        assert_eq!(it.next(&token).await.unwrap().unwrap().len(), 2);
        assert!(it.next(&token).await.unwrap().is_none());
        assert!(it.next(&token).await.unwrap().is_none());
        assert!(it.next(&token).await.unwrap().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_result_reports_zero_total() {
        let it = Paginator::new(FakeSource::new(0, 3));
        let token = CancellationToken::new();

        assert!(it.next(&token).await.unwrap().is_none());
        let data = it.pagination().await.unwrap();
        assert_eq!(data.total_elements, 0);
        assert_eq!(data.total_pages, 0);
    }

    #[tokio::test]
    async fn test_error_does_not_advance_offset() {
        let mut source = FakeSource::new(5, 2);
        source.fail_on = vec![1];
        let it = Paginator::new(source);
        let token = CancellationToken::new();

        assert_eq!(it.next(&token).await.unwrap().unwrap()[0].id, "u0");
        let err = it.next(&token).await.unwrap_err();
        assert!(err.is_transient());

        // Retry resumes at the same offset
        assert_eq!(it.next(&token).await.unwrap().unwrap()[0].id, "u2");
        assert_eq!(it.next(&token).await.unwrap().unwrap()[0].id, "u4");
        assert!(it.next(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_error_before_first_page_keeps_unknown_total() {
        let mut source = FakeSource::new(3, 3);
        source.fail_on = vec![0];
        let it = Paginator::new(source);
        let token = CancellationToken::new();

        assert!(it.next(&token).await.is_err());
        assert!(it.pagination().await.is_none());
        assert_eq!(it.next(&token).await.unwrap().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_is_retryable() {
        let it = Paginator::new(FakeSource::new(4, 2));
        let cancelled = CancellationToken::new();
        cancelled.cancel();

        assert!(matches!(
            it.next(&cancelled).await,
            Err(DataError::Cancelled)
        ));

        let fresh = CancellationToken::new();
        assert_eq!(it.next(&fresh).await.unwrap().unwrap()[0].id, "u0");
    }

    #[tokio::test]
    async fn test_concurrent_next_calls_never_overlap() {
        let it = Arc::new(Paginator::new(FakeSource::new(9, 1)));
        let mut handles = Vec::new();
        for _ in 0..9 {
            let it = it.clone();
            handles.push(tokio::spawn(async move {
                let token = CancellationToken::new();
                it.next(&token).await.unwrap().unwrap()[0].id.clone()
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 9);
    }
}
