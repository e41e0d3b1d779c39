use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::Dispatcher;
use crate::job::SelectionEvent;

/// Feeds selection events into a dispatcher, one independent task per
/// firing.
///
/// The pipeline is the seam between the node selector and the dispatcher:
/// the selector holds the sender half and the run loop drains the receiver.
/// Each firing is spawned, so a no-overlap firing suspended on its terminal
/// signal never delays the next event, and a single job's failure never
/// halts or backpressures the pipeline.
pub struct DispatchPipeline {
    dispatcher: Arc<Dispatcher>,
}

impl DispatchPipeline {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Create the channel the node selector submits events through.
    pub fn channel(
        buffer: usize,
    ) -> (mpsc::Sender<SelectionEvent>, mpsc::Receiver<SelectionEvent>) {
        mpsc::channel(buffer)
    }

    /// Drain selection events until the channel closes or `shutdown` fires.
    ///
    /// Shutdown does not cancel firings already in flight; their claims are
    /// released by their own terminal signals.
    pub async fn run(
        self,
        mut events: mpsc::Receiver<SelectionEvent>,
        shutdown: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("dispatch pipeline shutting down");
                    break;
                }
                event = events.recv() => {
                    match event {
                        Some(event) => {
                            let dispatcher = self.dispatcher.clone();
                            tokio::spawn(async move {
                                dispatcher.dispatch_event(event).await;
                            });
                        }
                        None => {
                            tracing::info!("selection channel closed, dispatch pipeline stopping");
                            break;
                        }
                    }
                }
            }
        }
    }
}
