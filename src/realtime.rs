//! Wall-clock driver: sleeps until each virtual deadline with tokio and runs
//! the page's due timers, one virtual millisecond per real millisecond.

use crate::dom::DocumentTree;
use crate::Page;
use log::{debug, info};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{sleep_until, Instant};

/// Why [`drive`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The shutdown signal fired (or its sender was dropped)
    Shutdown,
    /// The wall-clock limit elapsed
    LimitReached,
    /// No timers remain
    Idle,
}

/// Drive `page` in real time until shutdown, `limit`, or idleness.
///
/// The page is never moved to another task; all timer actions run on the
/// caller's task, one at a time.
pub async fn drive<D: DocumentTree + 'static>(page: &mut Page<D>, limit: Option<Duration>, mut shutdown: oneshot::Receiver<()>) -> StopReason {
    let start = Instant::now();
    let origin = page.now();
    let stop_at = limit.map(|l| start + l);

    loop {
        let Some(next) = page.next_deadline() else {
            info!("no timers left at {}ms", page.now());
            return StopReason::Idle;
        };
        let wake = start + Duration::from_millis(next - origin);

        if let Some(stop) = stop_at.filter(|&stop| wake > stop) {
            tokio::select! {
                _ = &mut shutdown => return StopReason::Shutdown,
                _ = sleep_until(stop) => {
                    let limit_ms = (stop - start).as_millis() as u64;
                    page.run_until(origin + limit_ms);
                    info!("run limit reached at {}ms", page.now());
                    return StopReason::LimitReached;
                }
            }
        }

        tokio::select! {
            _ = &mut shutdown => {
                debug!("shutdown requested at {}ms", page.now());
                return StopReason::Shutdown;
            }
            _ = sleep_until(wake) => {
                let ran = page.run_until(next);
                debug!("ran {} timer action(s) at {}ms", ran, next);
            }
        }
    }
}
