// src/pagination/blocking.rs
//! Synchronous pagination: one request per `next()` at a page boundary.

use super::{into_envelope, BlockingRequestExecutor, CursorState, ListRequest};
use crate::error::AppError;
use crate::model::{Envelope, ListItem};
use std::marker::PhantomData;

/// Iterates the envelopes of a list endpoint.
///
/// Fused after the first error: the state is finished before the error is
/// yielded, so no further request is sent.
pub struct BlockingPages<T, E> {
    executor: E,
    list: ListRequest,
    state: CursorState,
    _item: PhantomData<fn() -> T>,
}

impl<T: ListItem, E: BlockingRequestExecutor> BlockingPages<T, E> {
    pub fn new(executor: E, list: ListRequest, state: CursorState) -> Self {
        Self {
            executor,
            list,
            state,
            _item: PhantomData,
        }
    }

    pub fn state(&self) -> &CursorState {
        &self.state
    }

    /// Flattens the envelopes into their results.
    pub fn items(self) -> BlockingItems<T, E> {
        BlockingItems {
            pages: self,
            buffer: Vec::new().into_iter(),
        }
    }
}

impl<T: ListItem, E: BlockingRequestExecutor> Iterator for BlockingPages<T, E> {
    type Item = Result<Envelope<T>, AppError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let page = self.state.next_request()?;
            let fetched = self
                .executor
                .execute(self.list.request(&page))
                .and_then(into_envelope::<T>);

            match fetched {
                Ok(envelope) => {
                    self.state.advance(&envelope);
                    return Some(Ok(envelope));
                }
                Err(err) => {
                    if let Err(err) = self.state.shrink(err) {
                        return Some(Err(err));
                    }
                }
            }
        }
    }
}

/// Iterates the individual results of a list endpoint, in order.
pub struct BlockingItems<T, E> {
    pages: BlockingPages<T, E>,
    buffer: std::vec::IntoIter<T>,
}

impl<T: ListItem, E: BlockingRequestExecutor> Iterator for BlockingItems<T, E> {
    type Item = Result<T, AppError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.next() {
                return Some(Ok(item));
            }
            match self.pages.next()? {
                Ok(envelope) => self.buffer = envelope.results.into_iter(),
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
