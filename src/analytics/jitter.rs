//! Display jitter for multi-period forecasts.
//!
//! The compounding law in [`super::forecast`] is deterministic. Jitter is a
//! separate pass over its output so that callers can inject a seeded RNG or
//! skip the pass entirely.

use rand::Rng;

use super::forecast::ForecastPoint;

/// Multiplies every predicted value by an independent factor drawn
/// uniformly from `[1 - band, 1 + band]`. A non-positive band is a no-op.
pub fn apply<R: Rng + ?Sized>(points: &mut [ForecastPoint], band: f64, rng: &mut R) {
    if !band.is_finite() || band <= 0.0 {
        return;
    }
    for point in points.iter_mut() {
        if let Some(predicted) = point.predicted.as_mut() {
            let factor = 1.0 + rng.gen_range(-band..=band);
            *predicted = (*predicted * factor).max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn points(values: &[f64]) -> Vec<ForecastPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| ForecastPoint::forecast(format!("Week {}", i + 1), *v))
            .collect()
    }

    #[test]
    fn jitter_stays_inside_the_band() {
        let mut jittered = points(&[100.0; 50]);
        apply(&mut jittered, 0.05, &mut StdRng::seed_from_u64(7));
        for point in &jittered {
            let value = point.predicted.unwrap();
            assert!((95.0..=105.0).contains(&value), "{value} escaped the band");
        }
        assert!(jittered.iter().any(|p| p.predicted != Some(100.0)));
    }

    #[test]
    fn seeded_jitter_is_reproducible() {
        let mut first = points(&[10.0, 20.0, 30.0]);
        let mut second = points(&[10.0, 20.0, 30.0]);
        apply(&mut first, 0.02, &mut StdRng::seed_from_u64(42));
        apply(&mut second, 0.02, &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn zero_band_and_actual_only_points_are_untouched() {
        let mut unchanged = points(&[10.0, 20.0]);
        apply(&mut unchanged, 0.0, &mut StdRng::seed_from_u64(1));
        assert_eq!(unchanged, points(&[10.0, 20.0]));

        let mut actual_only = vec![ForecastPoint::actual("Oct 1", 12.0)];
        apply(&mut actual_only, 0.05, &mut StdRng::seed_from_u64(1));
        assert_eq!(actual_only[0].actual, Some(12.0));
        assert_eq!(actual_only[0].predicted, None);
    }
}
