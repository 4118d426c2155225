//! Shared cache of the time-independent pipeline inputs.
//!
//! Butterfly tables depend only on resolution. Initial spectra depend on the
//! full [`SpectrumKey`]. Each is stored and invalidated on its own, and each
//! entry is built at most once even when several callers ask concurrently.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use crate::dispatch::{DefaultDispatcher, Dispatcher};
use crate::error::Result;
use crate::fft::ButterflyTable;
use crate::grid::Resolution;
use crate::noise::NoiseSource;
use crate::params::{SpectrumKey, SpectrumParameters};
use crate::spectrum::{InitialSpectrumPair, SpectrumGenerator};

/// Initialize-once slot; waiters block until the first builder finishes
type Slot<T> = Arc<OnceLock<Arc<T>>>;

struct SpectrumEntry {
    key: SpectrumKey,
    slot: Slot<InitialSpectrumPair>,
}

/// Lock a map, recovering the data if a builder panicked while holding it
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Butterfly-table and initial-spectrum cache
///
/// Owns the dispatcher used to build entries, so the same substrate can be
/// shared by every pipeline holding an `Arc` to the cache.
pub struct SpectrumCache<D: Dispatcher = DefaultDispatcher> {
    dispatcher: D,
    butterflies: Mutex<HashMap<Resolution, Slot<ButterflyTable>>>,
    spectra: Mutex<HashMap<Resolution, SpectrumEntry>>,
    butterfly_builds: AtomicUsize,
    spectrum_builds: AtomicUsize,
}

impl Default for SpectrumCache<DefaultDispatcher> {
    fn default() -> Self {
        Self::new(DefaultDispatcher::default())
    }
}

impl<D: Dispatcher> SpectrumCache<D> {
    pub fn new(dispatcher: D) -> Self {
        Self {
            dispatcher,
            butterflies: Mutex::new(HashMap::new()),
            spectra: Mutex::new(HashMap::new()),
            butterfly_builds: AtomicUsize::new(0),
            spectrum_builds: AtomicUsize::new(0),
        }
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Butterfly table for `n`, built on first request
    pub fn get_or_build_butterfly(&self, n: usize) -> Result<Arc<ButterflyTable>> {
        let resolution = Resolution::new(n)?;
        let slot = Arc::clone(lock(&self.butterflies).entry(resolution).or_default());

        // Built outside the map lock so other resolutions are not blocked
        let table = slot.get_or_init(|| {
            self.butterfly_builds.fetch_add(1, Ordering::Relaxed);
            log::info!("building butterfly table for N={}", resolution);
            Arc::new(ButterflyTable::build(resolution, &self.dispatcher))
        });
        Ok(Arc::clone(table))
    }

    /// Initial spectrum for `params`, rebuilt whenever its key changes
    ///
    /// Only one spectrum is kept per resolution; a request with different
    /// parameters replaces it.
    pub fn get_or_build_spectrum(
        &self,
        params: &SpectrumParameters,
    ) -> Result<Arc<InitialSpectrumPair>> {
        let resolution = params.validate()?;
        let key = params.cache_key();

        let slot = {
            let mut spectra = lock(&self.spectra);
            let current = spectra
                .get(&resolution)
                .filter(|entry| entry.key == key)
                .map(|entry| Arc::clone(&entry.slot));
            match current {
                Some(slot) => slot,
                None => {
                    if spectra.contains_key(&resolution) {
                        log::info!("spectrum parameters changed at N={}, rebuilding", resolution);
                    }
                    let slot: Slot<InitialSpectrumPair> = Slot::default();
                    spectra.insert(
                        resolution,
                        SpectrumEntry {
                            key,
                            slot: Arc::clone(&slot),
                        },
                    );
                    slot
                }
            }
        };

        let spectrum = slot.get_or_init(|| {
            self.spectrum_builds.fetch_add(1, Ordering::Relaxed);
            log::info!(
                "building initial spectrum for N={} (seed {})",
                resolution,
                params.noise_seed
            );
            let noise = NoiseSource::new(params.noise_seed).sample(resolution);
            Arc::new(SpectrumGenerator::new(&self.dispatcher).synthesize(&noise, params, resolution))
        });
        Ok(Arc::clone(spectrum))
    }

    /// Whether a finished butterfly table exists for `n`
    pub fn contains_butterfly(&self, n: usize) -> bool {
        let Ok(resolution) = Resolution::new(n) else {
            return false;
        };
        lock(&self.butterflies)
            .get(&resolution)
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Key of the spectrum currently cached for `n`, if any
    pub fn cached_spectrum_key(&self, n: usize) -> Option<SpectrumKey> {
        let resolution = Resolution::new(n).ok()?;
        lock(&self.spectra).get(&resolution).map(|entry| entry.key)
    }

    /// Number of butterfly tables built since construction
    pub fn butterfly_builds(&self) -> usize {
        self.butterfly_builds.load(Ordering::Relaxed)
    }

    /// Number of initial spectra built since construction
    pub fn spectrum_builds(&self) -> usize {
        self.spectrum_builds.load(Ordering::Relaxed)
    }

    /// Drop every cached spectrum, keeping butterfly tables
    pub fn invalidate_spectra(&self) {
        lock(&self.spectra).clear();
    }

    /// Drop everything
    pub fn invalidate_all(&self) {
        lock(&self.butterflies).clear();
        lock(&self.spectra).clear();
    }
}
