//! Event subscription pipeline
//!
//! A background thread owns the runtime and session handles, polls the
//! provider for LSX events and hands each batch to the consumer. A batch is
//! only released once the consumer has taken every event in it and come back
//! for more. The consumer decides when to stop.

use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded, select};
use tracing::{debug, error, info};

use crate::launch::operations::poll_once;
use crate::launch::types::{LaunchError, LaunchResult, PumpOptions};
use crate::provider::{LsxEvent, Provider};

/// Live stream of LSX events from a launched game
pub struct Subscription {
    batches: Receiver<LaunchResult<Vec<LsxEvent>>>,
    pending: VecDeque<LsxEvent>,
    // Set while the pump holds a delivered batch waiting for `ack`
    unacked: bool,
    ack: Sender<()>,
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wait up to `timeout` for the next event.
    ///
    /// Asking for more after the last event of a batch lets the pump release
    /// that batch. `Ok(None)` means nothing arrived in time. A pump failure
    /// is returned once; afterwards the stream reports `StreamClosed`.
    pub fn recv_timeout(&mut self, timeout: Duration) -> LaunchResult<Option<LsxEvent>> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }
        self.acknowledge();

        match self.batches.recv_timeout(timeout) {
            Ok(Ok(batch)) => {
                self.pending = batch.into();
                self.unacked = true;
                Ok(self.pending.pop_front())
            }
            Ok(Err(err)) => Err(err),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(LaunchError::StreamClosed),
        }
    }

    fn acknowledge(&mut self) {
        if self.unacked {
            self.unacked = false;
            // Capacity 1 and one batch in flight, so this never blocks.
            let _ = self.ack.send(());
        }
    }

    /// Ask the pump to finish and wait for it.
    ///
    /// The pump releases the batch it is holding before exiting.
    pub fn stop(&mut self) {
        // Dropping the sender disconnects the stop channel, which the pump
        // treats as a stop request.
        if self.stop.take().is_some() {
            debug!("stopping event pump");
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("event pump panicked");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Move the handles into a pump thread and start streaming events
pub fn subscribe<P>(
    provider: Arc<P>,
    mut runtime: P::Runtime,
    mut session: P::Session,
    options: PumpOptions,
) -> Subscription
where
    P: Provider + 'static,
{
    let (batch_tx, batch_rx) = bounded(1);
    let (ack_tx, ack_rx) = bounded::<()>(1);
    let (stop_tx, stop_rx) = bounded::<()>(0);

    let worker = std::thread::spawn(move || {
        info!(interval = ?options.interval, "event pump started");
        loop {
            let flow = poll_once(&*provider, &mut runtime, &mut session, |events| {
                let sent = select! {
                    send(batch_tx, Ok(events)) -> sent => sent.is_ok(),
                    recv(stop_rx) -> _ => false,
                };
                if !sent {
                    return ControlFlow::Break(());
                }
                select! {
                    recv(ack_rx) -> ack => {
                        if ack.is_ok() {
                            ControlFlow::Continue(())
                        } else {
                            ControlFlow::Break(())
                        }
                    }
                    recv(stop_rx) -> _ => ControlFlow::Break(()),
                }
            });

            match flow {
                Ok(ControlFlow::Continue(())) => {}
                Ok(ControlFlow::Break(())) => break,
                Err(err) => {
                    error!(error = %err, "event pump failed");
                    select! {
                        send(batch_tx, Err(err)) -> _ => {}
                        recv(stop_rx) -> _ => {}
                    }
                    break;
                }
            }

            match stop_rx.recv_timeout(options.interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        info!("event pump stopped");
    });

    Subscription {
        batches: batch_rx,
        pending: VecDeque::new(),
        unacked: false,
        ack: ack_tx,
        stop: Some(stop_tx),
        worker: Some(worker),
    }
}
