//! Live query results driven by domain events.

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, watch};

use super::{BroadcastEventSink, DomainEvent, EventInterest};
use crate::errors::Result;

/// Runs `query` now and again after every event matching `interest`,
/// publishing each result on the returned watch channel.
///
/// Bursts of events are coalesced into a single re-run. The background task
/// stops once every receiver has been dropped or the sink goes away. A failed
/// re-run is logged and the previous value stays visible.
///
/// The first run happens on the caller's thread. Re-runs go to the blocking
/// pool, so `query` may do synchronous database reads.
///
/// Must be called from within a tokio runtime.
pub fn watch_query<T, F>(
    sink: &BroadcastEventSink,
    interest: EventInterest,
    query: F,
) -> Result<watch::Receiver<T>>
where
    T: Send + Sync + 'static,
    F: Fn() -> Result<T> + Send + Sync + 'static,
{
    // Subscribe before the first run so no change slips in between.
    let mut events = sink.subscribe();
    let initial = query()?;
    let (tx, rx) = watch::channel(initial);
    let query = Arc::new(query);

    tokio::spawn(async move {
        loop {
            let refresh = tokio::select! {
                _ = tx.closed() => break,
                received = events.recv() => match received {
                    Ok(event) => interest.matches(&event) || drain_matching(&mut events, &interest),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("Live query lagged by {} events, refreshing", skipped);
                        true
                    }
                    Err(RecvError::Closed) => break,
                },
            };
            if !refresh {
                continue;
            }
            drain_matching(&mut events, &interest);

            let run = query.clone();
            match tokio::task::spawn_blocking(move || run()).await {
                Ok(Ok(value)) => {
                    if tx.send(value).is_err() {
                        break;
                    }
                }
                Ok(Err(e)) => warn!("Live query refresh failed: {}", e),
                Err(e) => warn!("Live query refresh panicked or was cancelled: {}", e),
            }
        }
        debug!("Live query stopped");
    });

    Ok(rx)
}

/// Consumes everything already queued, reporting whether any of it matched.
fn drain_matching(events: &mut broadcast::Receiver<DomainEvent>, interest: &EventInterest) -> bool {
    let mut matched = false;
    loop {
        match events.try_recv() {
            Ok(event) => matched |= interest.matches(&event),
            Err(TryRecvError::Lagged(_)) => matched = true,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return matched,
        }
    }
}
