//! Pure pricing math for the bot fleet: a fair-value estimate derived from
//! recent fantasy-point output, and a 1-5 tier bucketed from that estimate's
//! z-score against the rest of the roster.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const DEFAULT_FAIR_VALUE: i64 = 10;
const MOMENTUM_FLOOR: (i64, u32) = (7, 1);
const MOMENTUM_CEIL: (i64, u32) = (13, 1);

/// `recent` is a player's fantasy-point totals, newest first, capped at the
/// last 10 games. Momentum compares the last 3 outings against whatever
/// precedes them, clamped to 0.7-1.3 so a single hot or cold game can't
/// swing the estimate past 30%. Falls back to a flat $10 with no history.
pub fn fair_value(recent: &[Decimal]) -> Decimal {
    if recent.is_empty() {
        return Decimal::from(DEFAULT_FAIR_VALUE);
    }

    let sample = &recent[..recent.len().min(10)];
    let avg = average(sample);

    let last3_len = sample.len().min(3);
    let last3 = average(&sample[..last3_len]);
    let prior = &sample[last3_len..];
    let momentum = if prior.is_empty() {
        Decimal::ONE
    } else {
        let prior_avg = average(prior);
        if prior_avg == Decimal::ZERO {
            Decimal::ONE
        } else {
            (last3 / prior_avg)
                .max(Decimal::new(MOMENTUM_FLOOR.0, MOMENTUM_FLOOR.1))
                .min(Decimal::new(MOMENTUM_CEIL.0, MOMENTUM_CEIL.1))
        }
    };

    avg * Decimal::new(5, 1) * momentum
}

fn average(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().sum::<Decimal>() / Decimal::from(values.len() as i64)
}

/// Buckets `value` into 1-5 by rounding its z-score against `population`
/// (every other player's fair value) to the nearest integer and centering
/// on tier 3. A thin or uniform population (std dev 0) falls back to the
/// middle tier rather than dividing by zero.
pub fn tier_for(value: Decimal, population: &[Decimal]) -> i32 {
    if population.len() < 2 {
        return 3;
    }

    let samples: Vec<f64> = population.iter().filter_map(|d| d.to_f64()).collect();
    if samples.len() < 2 {
        return 3;
    }

    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    let variance = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / samples.len() as f64;
    let std_dev = variance.sqrt();
    if std_dev <= f64::EPSILON {
        return 3;
    }

    let z = (value.to_f64().unwrap_or(mean) - mean) / std_dev;
    (3 + z.round() as i32).clamp(1, 5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_history_defaults_to_ten_dollars() {
        assert_eq!(fair_value(&[]), Decimal::from(10));
    }

    #[test]
    fn hot_streak_pulls_estimate_above_flat_average() {
        let recent = vec![
            Decimal::from(40),
            Decimal::from(38),
            Decimal::from(36),
            Decimal::from(20),
            Decimal::from(18),
        ];
        let flat = vec![Decimal::from(30); 5];
        assert!(fair_value(&recent) > fair_value(&flat));
    }

    #[test]
    fn tier_centers_on_three_for_a_uniform_population() {
        let population = vec![Decimal::from(10); 5];
        assert_eq!(tier_for(Decimal::from(10), &population), 3);
    }

    #[test]
    fn tier_rewards_an_outlier_with_a_higher_bucket() {
        let mut population = vec![Decimal::from(10); 20];
        population.push(Decimal::from(80));
        assert!(tier_for(Decimal::from(80), &population) >= 4);
    }
}
