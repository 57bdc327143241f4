//! Registry snapshot cache.
//!
//! Holds the last scan result and hands out shared snapshots. Concurrent
//! callers that miss the cache all await the same scan. `invalidate()` bumps
//! a generation token; a scan that finishes under an older generation still
//! answers its own awaiters but is not published.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use super::scan::scan;
use super::ModulesState;
use crate::config::WalkerConfig;

type ScanFuture = Shared<BoxFuture<'static, Arc<ModulesState>>>;

/// Callback run once for every completed scan, before it is published.
pub type ScanObserver = Box<dyn Fn(&ModulesState) + Send + Sync>;

/// Cache for the modules registry. Cloning shares the cache.
#[derive(Clone)]
pub struct RegistryCache {
    inner: Arc<Inner>,
}

struct Inner {
    config: WalkerConfig,
    observer: Option<ScanObserver>,
    slot: Mutex<Slot>,
    scans: AtomicU64,
}

#[derive(Default)]
struct Slot {
    generation: u64,
    snapshot: Option<Arc<ModulesState>>,
    in_flight: Option<ScanFuture>,
}

impl std::fmt::Debug for RegistryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.lock();
        f.debug_struct("RegistryCache")
            .field("modules", &self.inner.config.modules.path)
            .field("generation", &slot.generation)
            .field("cached", &slot.snapshot.is_some())
            .field("in_flight", &slot.in_flight.is_some())
            .finish()
    }
}

impl RegistryCache {
    /// Create an empty cache; the first `get()` scans.
    #[must_use]
    pub fn new(config: WalkerConfig) -> Self {
        Self::build(config, None)
    }

    /// Create an empty cache that hands every completed scan to `observer`.
    ///
    /// The observer runs inside the shared scan, so callers joining an
    /// in-flight scan do not trigger it again.
    #[must_use]
    pub fn with_observer(
        config: WalkerConfig,
        observer: impl Fn(&ModulesState) + Send + Sync + 'static,
    ) -> Self {
        Self::build(config, Some(Box::new(observer)))
    }

    fn build(config: WalkerConfig, observer: Option<ScanObserver>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                observer,
                slot: Mutex::new(Slot::default()),
                scans: AtomicU64::new(0),
            }),
        }
    }

    /// The configuration scans run with.
    #[must_use]
    pub fn config(&self) -> &WalkerConfig {
        &self.inner.config
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.inner.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the current snapshot, scanning if there is none.
    ///
    /// Joins a scan already in flight instead of starting another one.
    pub async fn get(&self) -> Arc<ModulesState> {
        let pending = {
            let mut slot = self.lock();
            if let Some(snapshot) = &slot.snapshot {
                return Arc::clone(snapshot);
            }
            if let Some(in_flight) = &slot.in_flight {
                debug!(generation = slot.generation, "Joining in-flight scan");
                in_flight.clone()
            } else {
                let started = self.start_scan(slot.generation);
                slot.in_flight = Some(started.clone());
                started
            }
        };
        pending.await
    }

    fn start_scan(&self, generation: u64) -> ScanFuture {
        debug!(generation, "Starting registry scan");
        let inner = Arc::clone(&self.inner);
        async move {
            inner.scans.fetch_add(1, Ordering::Relaxed);
            let state = Arc::new(scan(&inner.config).await);
            if let Some(observer) = &inner.observer {
                observer(&state);
            }

            let mut slot = inner.slot.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.generation == generation {
                slot.snapshot = Some(Arc::clone(&state));
                slot.in_flight = None;
            } else {
                debug!(
                    generation,
                    current = slot.generation,
                    "Discarding scan from stale generation"
                );
            }
            state
        }
        .boxed()
        .shared()
    }

    /// Drop the snapshot. The next `get()` scans again.
    pub fn invalidate(&self) {
        let mut slot = self.lock();
        slot.generation += 1;
        slot.snapshot = None;
        slot.in_flight = None;
        debug!(generation = slot.generation, "Registry cache invalidated");
    }

    /// The published snapshot, without scanning.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<ModulesState>> {
        self.lock().snapshot.clone()
    }

    /// Current generation; bumped by every `invalidate()`.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Number of scans started so far.
    #[must_use]
    pub fn scan_count(&self) -> u64 {
        self.inner.scans.load(Ordering::Relaxed)
    }
}
