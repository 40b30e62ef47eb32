//! Lazy page stream over a repository's release history

use futures::Stream;
use futures::stream;
use tracing::debug;

use crate::release::error::RegistryError;
use crate::release::source::ReleaseSource;
use crate::release::types::Release;

enum PageState {
    Start(Option<String>),
    Next(String),
    Done,
}

/// Streams pages of releases starting from the first page.
///
/// A page is only requested when the consumer polls for it, so at most one
/// request is in flight and dropping the stream stops pagination.
pub fn release_pages<'a, S>(
    source: &'a S,
    owner: &'a str,
    name: &'a str,
) -> impl Stream<Item = Result<Vec<Release>, RegistryError>> + 'a
where
    S: ReleaseSource + ?Sized,
{
    release_pages_from(source, owner, name, None)
}

/// Streams pages of releases resuming at `cursor`.
pub fn release_pages_from<'a, S>(
    source: &'a S,
    owner: &'a str,
    name: &'a str,
    cursor: Option<String>,
) -> impl Stream<Item = Result<Vec<Release>, RegistryError>> + 'a
where
    S: ReleaseSource + ?Sized,
{
    stream::try_unfold(PageState::Start(cursor), move |state| async move {
        let cursor = match state {
            PageState::Done => return Ok::<_, RegistryError>(None),
            PageState::Start(cursor) => cursor,
            PageState::Next(cursor) => Some(cursor),
        };

        let page = source.fetch_release_page(owner, name, cursor).await?;
        debug!(owner, name, count = page.releases.len(), "Fetched release page");

        let next = match page.next_cursor {
            Some(cursor) => PageState::Next(cursor),
            None => PageState::Done,
        };
        Ok(Some((page.releases, next)))
    })
}
