//! Feed bridge: pumps one view's change source into its hub.
//!
//! One bridge task runs per view for the lifetime of the process. When the
//! source connection breaks the bridge resubscribes with capped exponential
//! backoff; already-connected clients simply stop receiving updates until
//! the feed recovers.

use std::time::Duration;

use futures::StreamExt;
use taskstream_db::ChangeSource;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::hub::Hub;

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Pump events from `source` into `hub` until the shutdown signal flips.
pub async fn run<S: ChangeSource>(
    source: S,
    hub: Hub,
    view: &'static str,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut backoff = INITIAL_BACKOFF;

    loop {
        match source.subscribe().await {
            Ok(mut stream) => {
                info!(view, "change feed subscribed");
                loop {
                    tokio::select! {
                        next = stream.next() => match next {
                            Some(Ok(event)) => {
                                backoff = INITIAL_BACKOFF;
                                hub.publish(event);
                            }
                            Some(Err(e)) => {
                                warn!(view, error = %e, "change feed error");
                                break;
                            }
                            None => {
                                warn!(view, "change feed ended");
                                break;
                            }
                        },
                        _ = shutdown.changed() => {
                            info!(view, "feed bridge stopping");
                            return;
                        }
                    }
                }
            }
            Err(e) => error!(view, error = %e, "change feed subscribe failed"),
        }

        tokio::select! {
            _ = tokio::time::sleep(backoff) => {}
            _ = shutdown.changed() => {
                info!(view, "feed bridge stopping");
                return;
            }
        }
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}
