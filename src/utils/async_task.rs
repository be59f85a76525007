use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tokio::time::Instant;
use tracing::debug;

use crate::BackoffPolicy;

/// Outcome of a bounded polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PollOutcome {
    Ready { attempts: usize },
    TimedOut { attempts: usize, elapsed: Duration },
}

/// Calls `probe` until it reports true or the policy deadline passes.
///
/// Delay between probes starts at `base_delay` and doubles up to
/// `max_delay`; the last sleep is clipped so the loop never overshoots the
/// deadline by more than one probe.
pub(crate) async fn poll_until<F, T>(
    policy: &BackoffPolicy,
    mut probe: F,
) -> PollOutcome
where
    F: FnMut() -> T,
    T: Future<Output = bool>,
{
    let started = Instant::now();
    let deadline = started + policy.timeout();
    let mut delay = policy.base_delay();
    let mut attempts = 0;

    loop {
        attempts += 1;
        if probe().await {
            return PollOutcome::Ready { attempts };
        }

        let now = Instant::now();
        if now >= deadline {
            return PollOutcome::TimedOut {
                attempts,
                elapsed: now - started,
            };
        }

        debug!("probe attempt {} not ready, retrying in {:?}", attempts, delay);
        sleep(delay.min(deadline - now)).await;
        delay = (delay * 2).min(policy.max_delay());
    }
}
