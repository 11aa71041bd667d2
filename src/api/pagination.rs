// src/api/pagination.rs
//! Cursor-following collection over the service's paginated listings.
//!
//! Every listing endpoint returns `data.items`, an optional `data.page_token`
//! and an optional `data.has_more`. The same protocol is reused for document
//! blocks, wiki spaces, wiki nodes and folder entries.

use crate::error::AppError;
use futures::stream::{self, Stream, TryStreamExt};
use serde::Deserialize;
use std::future::Future;

/// One page of a listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default, rename = "page_token")]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: Option<bool>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self {
            items,
            next_cursor,
            has_more: None,
        }
    }

    /// The cursor to request next, or `None` on the last page.
    ///
    /// An empty token, or `has_more == false`, also ends the listing.
    pub fn continuation(&self) -> Option<&str> {
        if self.has_more == Some(false) {
            return None;
        }
        self.next_cursor.as_deref().filter(|cursor| !cursor.is_empty())
    }
}

fn repeated_cursor(cursor: &str) -> AppError {
    AppError::Protocol(format!(
        "pagination cursor '{}' was returned for its own page",
        cursor
    ))
}

/// Validates a page against the cursor that requested it and returns the
/// cursor for the following request.
fn next_cursor<T>(page: &Page<T>, requested: Option<&str>) -> Result<Option<String>, AppError> {
    match page.continuation() {
        Some(next) if Some(next) == requested => Err(repeated_cursor(next)),
        next => Ok(next.map(str::to_string)),
    }
}

/// Fetches every page and concatenates the items in server order.
///
/// `fetch_page` is first called with `None`, then with each continuation
/// cursor until a page carries none.
pub async fn collect_pages<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>, AppError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, AppError>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0u32;

    loop {
        let page = fetch_page(cursor.clone()).await?;
        pages += 1;
        let next = next_cursor(&page, cursor.as_deref())?;
        items.extend(page.items);

        match next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    log::debug!("Collected {} items over {} pages", items.len(), pages);
    Ok(items)
}

enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Lazily yields items, fetching the next page only when the current one is
/// exhausted. Same cursor rules as [`collect_pages`].
pub fn stream_pages<T, F, Fut>(fetch_page: F) -> impl Stream<Item = Result<T, AppError>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, AppError>>,
{
    stream::try_unfold(
        (fetch_page, Cursor::Start),
        |(mut fetch_page, cursor)| async move {
            let requested = match cursor {
                Cursor::Start => None,
                Cursor::Next(cursor) => Some(cursor),
                Cursor::Done => return Ok::<_, AppError>(None),
            };
            let page = fetch_page(requested.clone()).await?;
            let state = match next_cursor(&page, requested.as_deref())? {
                Some(next) => Cursor::Next(next),
                None => Cursor::Done,
            };
            let items = stream::iter(page.items.into_iter().map(Ok::<T, AppError>));
            Ok(Some((items, (fetch_page, state))))
        },
    )
    .try_flatten()
}
