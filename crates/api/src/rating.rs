//! Integral rating arithmetic.
//!
//! A review's integral rating is the mean of its per-criterion ratings,
//! weighted by each criterion's weight:
//!
//! ```text
//! integral = Σ(rating · weight) / Σ(weight)
//! ```
//!
//! An empty set of ratings, or one whose weights sum to zero, yields `0.0`.

/// Weighted mean of `(rating, weight)` pairs.
pub fn integral_rating<I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (i32, f64)>,
{
    let (weighted_sum, total_weight) = pairs
        .into_iter()
        .fold((0.0_f64, 0.0_f64), |(sum, total), (rating, weight)| {
            (sum + f64::from(rating) * weight, total + weight)
        });
    if total_weight > 0.0 {
        weighted_sum / total_weight
    } else {
        0.0
    }
}

/// Criterion weights must be finite and strictly positive.
pub fn is_valid_weight(weight: f64) -> bool {
    weight.is_finite() && weight > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn empty_ratings_yield_zero() {
        assert_eq!(integral_rating(Vec::new()), 0.0);
    }

    #[test]
    fn zero_total_weight_yields_zero() {
        assert_eq!(integral_rating(vec![(5, 0.0), (3, 0.0)]), 0.0);
    }

    #[test]
    fn heavier_criteria_pull_the_score() {
        // (5·3 + 1·1) / 4 = 4.0
        let score = integral_rating(vec![(5, 3.0), (1, 1.0)]);
        assert!((score - 4.0).abs() < EPSILON);
    }

    #[test]
    fn single_rating_is_returned_as_is() {
        assert!((integral_rating(vec![(3, 0.25)]) - 3.0).abs() < EPSILON);
    }

    #[test]
    fn weight_validation() {
        assert!(is_valid_weight(0.5));
        assert!(!is_valid_weight(0.0));
        assert!(!is_valid_weight(-1.0));
        assert!(!is_valid_weight(f64::NAN));
        assert!(!is_valid_weight(f64::INFINITY));
    }

    fn rating_pairs() -> impl Strategy<Value = Vec<(i32, f64)>> {
        prop::collection::vec((1..=5i32, 0.01f64..100.0), 1..12)
    }

    proptest! {
        #[test]
        fn matches_weighted_mean_formula(pairs in rating_pairs()) {
            let numerator: f64 = pairs.iter().map(|(r, w)| f64::from(*r) * w).sum();
            let denominator: f64 = pairs.iter().map(|(_, w)| w).sum();
            let expected = numerator / denominator;
            let actual = integral_rating(pairs.clone());
            prop_assert!((actual - expected).abs() < EPSILON);
        }

        #[test]
        fn stays_between_lowest_and_highest_rating(pairs in rating_pairs()) {
            let min = pairs.iter().map(|(r, _)| *r).min().unwrap_or(0);
            let max = pairs.iter().map(|(r, _)| *r).max().unwrap_or(0);
            let score = integral_rating(pairs);
            prop_assert!(score >= f64::from(min) - EPSILON);
            prop_assert!(score <= f64::from(max) + EPSILON);
        }

        #[test]
        fn scaling_all_weights_changes_nothing(pairs in rating_pairs(), factor in 0.1f64..10.0) {
            let scaled: Vec<(i32, f64)> = pairs.iter().map(|(r, w)| (*r, w * factor)).collect();
            let base = integral_rating(pairs);
            prop_assert!((integral_rating(scaled) - base).abs() < 1e-6);
        }

        #[test]
        fn equal_weights_give_arithmetic_mean(ratings in prop::collection::vec(1..=5i32, 1..12)) {
            let mean = ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / ratings.len() as f64;
            let score = integral_rating(ratings.into_iter().map(|r| (r, 1.0)));
            prop_assert!((score - mean).abs() < EPSILON);
        }
    }
}
