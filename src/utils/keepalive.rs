// ============================================================================
// Journal Keep-Alive
// Periodic no-op ping against the persistence layer to prevent
// idle-connection drops
// ============================================================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::interfaces::MarketJournal;

/// Handle for a running keep-alive loop. Dropping it (or calling `stop`)
/// stops the background thread at its next wakeup.
pub struct KeepAlive {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl KeepAlive {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for KeepAlive {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Ping the journal every `interval` from a background thread. Failures are
/// logged and the loop keeps going; this is a peripheral liveness concern,
/// never part of the mutation contract.
pub fn spawn_keepalive(journal: Arc<dyn MarketJournal>, interval: Duration) -> KeepAlive {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);

    let handle = thread::Builder::new()
        .name("market-keepalive".to_string())
        .spawn(move || {
            // Short sleep slices so stop() is honored promptly
            let slice = interval.min(Duration::from_millis(100));
            let mut slept = Duration::ZERO;
            while flag.load(Ordering::Acquire) {
                thread::sleep(slice);
                slept += slice;
                if slept < interval {
                    continue;
                }
                slept = Duration::ZERO;
                if let Err(err) = journal.ping() {
                    tracing::warn!(error = %err, "journal keep-alive ping failed");
                }
            }
        })
        .expect("failed to spawn keep-alive thread");

    KeepAlive {
        running,
        handle: Some(handle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::{JournalEntry, StoreError};
    use std::sync::atomic::AtomicUsize;

    struct CountingJournal {
        pings: AtomicUsize,
    }

    impl MarketJournal for CountingJournal {
        fn record(&self, _batch: &[JournalEntry]) -> Result<(), StoreError> {
            Ok(())
        }

        fn ping(&self) -> Result<(), StoreError> {
            self.pings.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_keepalive_pings_then_stops() {
        let journal = Arc::new(CountingJournal {
            pings: AtomicUsize::new(0),
        });

        let keepalive = spawn_keepalive(journal.clone(), Duration::from_millis(10));
        thread::sleep(Duration::from_millis(80));
        keepalive.stop();

        let pings = journal.pings.load(Ordering::SeqCst);
        assert!(pings >= 1, "expected at least one ping, saw {pings}");

        // No further pings after stop
        thread::sleep(Duration::from_millis(40));
        assert_eq!(journal.pings.load(Ordering::SeqCst), pings);
    }
}
