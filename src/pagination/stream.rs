// src/pagination/stream.rs
//! Async pagination as `futures` streams.
//!
//! The stream holds its executor and cursor state in the `unfold` seed, so
//! it suspends only while a request is in flight. Dropping it between polls
//! sends nothing further.

use super::{into_envelope, CursorState, ListRequest, RequestExecutor};
use crate::error::AppError;
use crate::model::{Envelope, ListItem};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};

/// Streams the envelopes of a list endpoint. Ends after the first error.
pub fn pages<T, E>(
    executor: E,
    list: ListRequest,
    state: CursorState,
) -> BoxStream<'static, Result<Envelope<T>, AppError>>
where
    T: ListItem,
    E: RequestExecutor,
{
    stream::unfold(Some((executor, list, state)), |seed| async move {
        let (executor, list, mut state) = seed?;
        loop {
            let page = state.next_request()?;
            let fetched = executor
                .execute(list.request(&page))
                .await
                .and_then(into_envelope::<T>);

            match fetched {
                Ok(envelope) => {
                    state.advance(&envelope);
                    return Some((Ok(envelope), Some((executor, list, state))));
                }
                Err(err) => {
                    if let Err(err) = state.shrink(err) {
                        return Some((Err(err), None));
                    }
                }
            }
        }
    })
    .boxed()
}

/// Streams the individual results of a list endpoint, in order.
pub fn items<T, E>(
    executor: E,
    list: ListRequest,
    state: CursorState,
) -> BoxStream<'static, Result<T, AppError>>
where
    T: ListItem,
    E: RequestExecutor,
{
    pages::<T, E>(executor, list, state)
        .map_ok(|envelope| stream::iter(envelope.results.into_iter().map(Ok::<T, AppError>)))
        .try_flatten()
        .boxed()
}
