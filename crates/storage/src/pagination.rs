//! Lazy key listing over paginated object store APIs.
//!
//! A [`PageSource`] fetches one page of keys at a time. [`paginate`] turns it
//! into a [`KeyStream`] that only requests the next page once every key of the
//! current one has been handed out, and never requests anything before the
//! first poll.

use crate::backend::KeyStream;
use crate::StorageError;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;

/// One page of a listing
#[derive(Debug, Default)]
pub struct Page {
    pub keys: Vec<String>,
    /// Continuation token, `None` on the last page
    pub next_token: Option<String>,
}

/// Fetches listing pages for a single prefix
#[async_trait::async_trait]
pub trait PageSource: Send + Sync + 'static {
    async fn fetch_page(&self, token: Option<String>) -> Result<Page, StorageError>;
}

enum Cursor {
    NeedPage(Option<String>),
    HavePage {
        keys: VecDeque<String>,
        next_token: Option<String>,
    },
    Done,
}

/// Build a lazy key stream from a page source.
///
/// A failed fetch is yielded once and ends the stream.
pub fn paginate<S: PageSource>(source: S) -> KeyStream {
    stream::unfold((source, Cursor::NeedPage(None)), |(source, mut cursor)| async move {
        loop {
            cursor = match cursor {
                Cursor::Done => return None,
                Cursor::HavePage {
                    mut keys,
                    next_token,
                } => match keys.pop_front() {
                    Some(key) => {
                        return Some((Ok(key), (source, Cursor::HavePage { keys, next_token })))
                    }
                    None => match next_token {
                        Some(token) => Cursor::NeedPage(Some(token)),
                        None => Cursor::Done,
                    },
                },
                Cursor::NeedPage(token) => match source.fetch_page(token).await {
                    Ok(page) => {
                        tracing::trace!(keys = page.keys.len(), more = page.next_token.is_some(), "Fetched listing page");
                        Cursor::HavePage {
                            keys: page.keys.into(),
                            next_token: page.next_token,
                        }
                    }
                    Err(e) => return Some((Err(e), (source, Cursor::Done))),
                },
            };
        }
    })
    .boxed()
}
