use crate::assets::server::asset_runtime;
use crate::assets::{AssetServer, Locator, SharedPrefab};
use crate::errors::{Result, ReviewError};

/// Readiness of one model slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// No locator assigned yet.
    #[default]
    Idle,
    /// A load is in flight.
    Loading,
    /// The template is available.
    Ready,
    /// The last load failed. The slot stays blocked until a new locator
    /// arrives; retrying is the data service's business, not ours.
    Failed,
}

struct PendingLoad {
    generation: u64,
    rx: flume::Receiver<Result<SharedPrefab>>,
}

/// One model slot of the review pair.
///
/// The slot separates cheap locator assignment from the expensive load
/// behind it: `request` returns immediately and `poll` drains the result
/// once it lands. Assigning a new locator supersedes any in-flight load;
/// a superseded result is discarded on arrival, never applied. Clearing
/// or dropping the slot releases the pending receiver and whatever byte
/// buffer the locator still holds, on every exit path alike.
#[derive(Default)]
pub struct ResourceSlot {
    locator: Option<Locator>,
    state: LoadState,
    generation: u64,
    pending: Option<PendingLoad>,
    prefab: Option<SharedPrefab>,
    error: Option<ReviewError>,
}

impl ResourceSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> LoadState {
        self.state
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == LoadState::Ready
    }

    #[must_use]
    pub fn locator(&self) -> Option<&Locator> {
        self.locator.as_ref()
    }

    #[must_use]
    pub fn prefab(&self) -> Option<&SharedPrefab> {
        self.prefab.as_ref()
    }

    /// The failure that put the slot into [`LoadState::Failed`], if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&ReviewError> {
        self.error.as_ref()
    }

    /// Assigns a locator and kicks off its load on the asset runtime.
    ///
    /// Re-requesting the locator already loading or loaded is a no-op.
    /// Anything else bumps the slot generation, which invalidates whatever
    /// was in flight before.
    pub fn request(&mut self, server: &AssetServer, locator: Locator) {
        let same_source = self
            .locator
            .as_ref()
            .is_some_and(|current| current.cache_key() == locator.cache_key());
        if same_source && matches!(self.state, LoadState::Loading | LoadState::Ready) {
            return;
        }

        self.generation += 1;
        self.pending = None;
        self.prefab = None;
        self.error = None;
        self.locator = Some(locator.clone());
        self.state = LoadState::Loading;

        // Cached templates resolve without touching the runtime
        if let Some(prefab) = server.cached_model(&locator) {
            self.prefab = Some(prefab);
            self.state = LoadState::Ready;
            return;
        }

        let (tx, rx) = flume::bounded(1);
        self.pending = Some(PendingLoad {
            generation: self.generation,
            rx,
        });

        let server = server.clone();
        asset_runtime().spawn(async move {
            let result = server.load_model_async(&locator).await;
            // The receiver may be gone if the slot moved on; that is the
            // discard path, not an error
            let _ = tx.send(result);
        });
    }

    /// Injects an already-built template, bypassing the loader entirely.
    /// Supersedes any load still in flight.
    pub fn provide(&mut self, prefab: SharedPrefab) {
        self.generation += 1;
        self.pending = None;
        self.prefab = Some(prefab);
        self.error = None;
        self.state = LoadState::Ready;
    }

    /// Drains a finished load if one has arrived. Called once per frame.
    pub fn poll(&mut self) {
        let Some(pending) = &self.pending else {
            return;
        };

        match pending.rx.try_recv() {
            Ok(result) => {
                let stale = pending.generation != self.generation;
                self.pending = None;

                if stale {
                    log::debug!("discarding load result for a superseded locator");
                    return;
                }

                match result {
                    Ok(prefab) => {
                        self.prefab = Some(prefab);
                        self.state = LoadState::Ready;
                    }
                    Err(err) => {
                        log::error!("model load failed: {err}");
                        self.error = Some(err);
                        self.state = LoadState::Failed;
                    }
                }
            }
            Err(flume::TryRecvError::Empty) => {}
            Err(flume::TryRecvError::Disconnected) => {
                let stale = pending.generation != self.generation;
                self.pending = None;
                if !stale {
                    self.error = Some(ReviewError::LoadInterrupted(
                        "loader task dropped its result channel".to_string(),
                    ));
                    self.state = LoadState::Failed;
                }
            }
        }
    }

    /// Releases everything the slot holds, including any in-flight load.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.pending = None;
        self.locator = None;
        self.prefab = None;
        self.error = None;
        self.state = LoadState::Idle;
    }
}
