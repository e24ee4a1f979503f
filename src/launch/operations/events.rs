//! Event batch fetching with guaranteed release

use std::ops::ControlFlow;

use tracing::debug;

use crate::launch::pure::check;
use crate::launch::types::LaunchResult;
use crate::provider::{EventBatchView, LsxEvent, Operation, Provider};

/// A fetched batch that goes back to the provider when dropped
pub struct BatchGuard<'p, P: Provider> {
    provider: &'p P,
    batch: Option<P::EventBatch>,
}

impl<'p, P: Provider> BatchGuard<'p, P> {
    pub fn events(&self) -> Vec<LsxEvent> {
        self.batch.as_ref().map(|b| b.events()).unwrap_or_default()
    }
}

impl<P: Provider> Drop for BatchGuard<'_, P> {
    fn drop(&mut self) {
        if let Some(batch) = self.batch.take() {
            self.provider.free_events(batch);
        }
    }
}

/// Fetch the next batch, possibly empty
pub fn fetch_batch<'p, P: Provider>(
    provider: &'p P,
    runtime: &mut P::Runtime,
    session: &mut P::Session,
) -> LaunchResult<BatchGuard<'p, P>> {
    let batch = check(
        Operation::ConsumeEvents,
        provider.consume_events(runtime, session),
        || provider.last_error(),
    )?;
    Ok(BatchGuard {
        provider,
        batch: Some(batch),
    })
}

/// Fetch one batch and hand its events to `sink`, then release it.
///
/// The batch stays checked out until `sink` returns. Empty batches are
/// released without calling `sink`.
pub fn poll_once<P, F>(
    provider: &P,
    runtime: &mut P::Runtime,
    session: &mut P::Session,
    sink: F,
) -> LaunchResult<ControlFlow<()>>
where
    P: Provider,
    F: FnOnce(Vec<LsxEvent>) -> ControlFlow<()>,
{
    let guard = fetch_batch(provider, runtime, session)?;
    let events = guard.events();
    if events.is_empty() {
        return Ok(ControlFlow::Continue(()));
    }
    debug!(count = events.len(), "received LSX events");
    Ok(sink(events))
}
