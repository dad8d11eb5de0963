//! Synthetic daily climate series.
//!
//! Values follow a smooth seasonal cycle plus seeded noise, so tests that
//! depend on exact numbers can rebuild them with the same seed.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Annual mean of the synthetic daily mean temperature, in K.
pub const MEAN_TEMPERATURE_K: f64 = 288.15;

/// Half the peak-to-trough range of the seasonal cycle, in K.
pub const SEASONAL_AMPLITUDE_K: f64 = 12.0;

/// Smooth seasonal temperature for a day of year, warmest near day 200.
///
/// # Example
///
/// ```
/// use test_utils::seasonal_temperature;
///
/// assert!(seasonal_temperature(200) > seasonal_temperature(15));
/// ```
pub fn seasonal_temperature(day: usize) -> f64 {
    let phase = 2.0 * PI * (day as f64 - 109.0) / 365.0;
    MEAN_TEMPERATURE_K + SEASONAL_AMPLITUDE_K * phase.sin()
}

/// Daily temperatures in K for `days` steps and `cells` grid cells, in
/// time-major order. `offset` shifts the whole series (e.g. +6 K for a
/// daily maximum).
pub fn temperature_series(days: usize, cells: usize, offset: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(days * cells);
    for day in 0..days {
        let base = seasonal_temperature(day) + offset;
        for _ in 0..cells {
            data.push(base + rng.gen_range(-3.0..3.0));
        }
    }
    data
}

/// Daily precipitation flux in kg m-2 s-1. Roughly two days in three are
/// dry.
pub fn precipitation_series(days: usize, cells: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(days * cells);
    for _ in 0..days * cells {
        let wet = rng.gen_bool(1.0 / 3.0);
        data.push(if wet { rng.gen_range(0.0..2.0e-4) } else { 0.0 });
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_series_is_seeded() {
        let a = temperature_series(10, 4, 0.0, 7);
        let b = temperature_series(10, 4, 0.0, 7);
        let c = temperature_series(10, 4, 0.0, 8);

        assert_eq!(a.len(), 40);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_temperature_series_stays_near_cycle() {
        let data = temperature_series(365, 2, 6.0, 1);
        for (i, v) in data.iter().enumerate() {
            let expected = seasonal_temperature(i / 2) + 6.0;
            assert!((v - expected).abs() <= 3.0);
        }
    }

    #[test]
    fn test_precipitation_is_non_negative() {
        let data = precipitation_series(365, 3, 42);
        assert!(data.iter().all(|&v| (0.0..2.0e-4).contains(&v)));
        assert!(data.iter().any(|&v| v == 0.0));
        assert!(data.iter().any(|&v| v > 0.0));
    }
}
