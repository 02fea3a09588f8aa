//! Retry loop around single generation attempts.
//!
//! Attempt 0 runs with the requested seed. Every failure draws the next seed
//! from an RNG seeded with that first seed, so a whole run is reproducible
//! from one number.

use facility_logic::validate::ATTEMPT_RANGE;
use facility_logic::{run_attempt, FacilityLayout, FacilityPreset, GenerationError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

/// A successful run of the driver.
#[derive(Debug)]
pub struct GenerationOutcome {
    pub layout: FacilityLayout,
    /// Seed of the attempt that succeeded.
    pub seed: u64,
    /// Seed the run started from.
    pub initial_seed: u64,
    /// Attempts made, the successful one included.
    pub attempts: u8,
    pub elapsed: Duration,
}

/// Seed for attempt 0: explicit, then the preset's, then a random one.
pub fn initial_seed(preset: &FacilityPreset, seed: Option<u64>) -> u64 {
    seed.or(preset.seed).unwrap_or_else(rand::random)
}

/// Run up to `attempts` attempts (clamped to 1..=16) and return the first
/// success, or the last error.
pub fn generate(
    preset: &FacilityPreset,
    seed: Option<u64>,
    attempts: u8,
) -> Result<GenerationOutcome, GenerationError> {
    let max_attempts = attempts.clamp(*ATTEMPT_RANGE.start(), *ATTEMPT_RANGE.end());
    let initial = initial_seed(preset, seed);
    let mut reseed = StdRng::seed_from_u64(initial);
    let started = Instant::now();

    let mut seed = initial;
    let mut last_error = None;
    for attempt in 1..=max_attempts {
        match run_attempt(preset, seed) {
            Ok(layout) => {
                let elapsed = started.elapsed();
                log::info!(
                    "Generated '{}' on attempt {}/{} (seed {}) in {:.1} ms",
                    preset.name,
                    attempt,
                    max_attempts,
                    seed,
                    elapsed.as_secs_f64() * 1000.0
                );
                return Ok(GenerationOutcome {
                    layout,
                    seed,
                    initial_seed: initial,
                    attempts: attempt,
                    elapsed,
                });
            }
            Err(err @ GenerationError::InvalidPreset(_)) => {
                log::warn!("Attempt {} rejected the preset: {}", attempt, err);
                return Err(err);
            }
            Err(err) => {
                log::warn!(
                    "Attempt {}/{} failed (seed {}): {}",
                    attempt,
                    max_attempts,
                    seed,
                    err
                );
                last_error = Some(err);
                seed = reseed.gen();
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        GenerationError::InvalidPreset("no attempt was made".to_string())
    }))
}
