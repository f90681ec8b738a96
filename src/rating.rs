//! # Time-weighted rating
//!
//! Splits reviews into four recency quartiles of `day_diff` and blends the
//! per-quartile mean `overall` with caller-supplied weights:
//!
//! ```text
//! bucket 1: day_diff <= q25          (most recent)
//! bucket 2: q25 < day_diff <= q50
//! bucket 3: q50 < day_diff <= q75
//! bucket 4: day_diff > q75           (oldest)
//!
//! result = Σ mean_i * w_i / 100
//! ```
//!
//! Weights are expected to sum to 100 but that is the caller's call; the
//! result is a plain linear combination either way.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RatingError;
use crate::math::{mean, quantile_sorted};
use crate::review::Review;

/// Weights for the four recency quartiles, most recent first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct QuartileWeights(pub [f64; 4]);

impl QuartileWeights {
    /// Default reporting weights (28/26/24/22).
    pub const STANDARD: Self = Self([28.0, 26.0, 24.0, 22.0]);
    /// Steeper recency preference (30/26/24/20).
    pub const RECENT_HEAVY: Self = Self([30.0, 26.0, 24.0, 20.0]);

    pub fn new(w1: f64, w2: f64, w3: f64, w4: f64) -> Self {
        Self([w1, w2, w3, w4])
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }
}

impl Default for QuartileWeights {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl From<[f64; 4]> for QuartileWeights {
    fn from(w: [f64; 4]) -> Self {
        Self(w)
    }
}

impl From<QuartileWeights> for [f64; 4] {
    fn from(w: QuartileWeights) -> Self {
        w.0
    }
}

/// How to treat a weighted quartile with no reviews in it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyBucketPolicy {
    /// Fail with `RatingError::EmptyBucket`.
    #[default]
    Reject,
    /// Drop empty quartiles and rescale the rest to the original weight total.
    Renormalize,
}

/// The 25/50/75th percentiles of `day_diff`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuartileCutoffs {
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
}

impl QuartileCutoffs {
    /// `None` for an empty slice.
    pub fn from_day_diffs(day_diffs: &[f64]) -> Option<Self> {
        let mut sorted = day_diffs.to_vec();
        sorted.sort_by(f64::total_cmp);
        Some(Self {
            q25: quantile_sorted(&sorted, 0.25)?,
            q50: quantile_sorted(&sorted, 0.50)?,
            q75: quantile_sorted(&sorted, 0.75)?,
        })
    }

    /// Zero-based quartile index for a given age.
    pub fn bucket_of(&self, day_diff: f64) -> usize {
        if day_diff <= self.q25 {
            0
        } else if day_diff <= self.q50 {
            1
        } else if day_diff <= self.q75 {
            2
        } else {
            3
        }
    }
}

/// Per-quartile statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BucketStats {
    /// 1-based, 1 = most recent.
    pub bucket: usize,
    pub count: usize,
    /// `None` when the quartile is empty.
    pub mean: Option<f64>,
    pub weight: f64,
}

/// Everything the report layer wants to show next to the weighted value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingBreakdown {
    pub overall_mean: f64,
    pub cutoffs: QuartileCutoffs,
    pub buckets: [BucketStats; 4],
    pub weighted_average: f64,
}

/// Plain mean of `overall`.
pub fn overall_mean(reviews: &[Review]) -> Result<f64, RatingError> {
    check_finite(reviews)?;
    mean(reviews.iter().map(|r| r.overall)).ok_or(RatingError::EmptyDataset)
}

/// Time-weighted average rating; empty weighted quartiles are an error.
pub fn weighted_average(reviews: &[Review], weights: QuartileWeights) -> Result<f64, RatingError> {
    breakdown(reviews, weights, EmptyBucketPolicy::Reject).map(|b| b.weighted_average)
}

/// Quartile cutoffs, per-quartile means, and the blended rating.
pub fn breakdown(
    reviews: &[Review],
    weights: QuartileWeights,
    policy: EmptyBucketPolicy,
) -> Result<RatingBreakdown, RatingError> {
    check_finite(reviews)?;
    let day_diffs: Vec<f64> = reviews.iter().map(|r| r.day_diff).collect();
    let cutoffs = QuartileCutoffs::from_day_diffs(&day_diffs).ok_or(RatingError::EmptyDataset)?;

    let mut sums = [0.0f64; 4];
    let mut counts = [0usize; 4];
    for r in reviews {
        let b = cutoffs.bucket_of(r.day_diff);
        sums[b] += r.overall;
        counts[b] += 1;
    }

    let buckets: [BucketStats; 4] = std::array::from_fn(|i| BucketStats {
        bucket: i + 1,
        count: counts[i],
        mean: (counts[i] > 0).then(|| sums[i] / counts[i] as f64),
        weight: weights.0[i],
    });

    let weighted_average = blend(&buckets, weights, policy)?;
    let overall_mean = sums.iter().sum::<f64>() / reviews.len() as f64;

    debug!(
        target: "rating",
        reviews = reviews.len(),
        q25 = cutoffs.q25,
        q50 = cutoffs.q50,
        q75 = cutoffs.q75,
        weight_sum = weights.sum(),
        weighted_average,
        "time-weighted rating computed"
    );
    if (weights.sum() - 100.0).abs() > 1e-9 {
        debug!(target: "rating", weight_sum = weights.sum(), "quartile weights do not sum to 100");
    }

    Ok(RatingBreakdown {
        overall_mean,
        cutoffs,
        buckets,
        weighted_average,
    })
}

fn blend(
    buckets: &[BucketStats; 4],
    weights: QuartileWeights,
    policy: EmptyBucketPolicy,
) -> Result<f64, RatingError> {
    // Zero-weight quartiles contribute nothing whether or not they are empty.
    let missing = buckets.iter().find(|b| b.mean.is_none() && b.weight != 0.0);

    match (missing, policy) {
        (None, _) => Ok(buckets
            .iter()
            .filter_map(|b| b.mean.map(|m| m * b.weight / 100.0))
            .sum()),
        (Some(b), EmptyBucketPolicy::Reject) => Err(RatingError::EmptyBucket {
            bucket: b.bucket,
            weight: b.weight,
        }),
        (Some(b), EmptyBucketPolicy::Renormalize) => {
            let kept: f64 = buckets
                .iter()
                .filter(|b| b.mean.is_some())
                .map(|b| b.weight)
                .sum();
            if kept == 0.0 {
                // Every weighted quartile is empty: nothing left to rescale onto.
                return Err(RatingError::EmptyBucket {
                    bucket: b.bucket,
                    weight: b.weight,
                });
            }
            let scale = weights.sum() / kept;
            Ok(buckets
                .iter()
                .filter_map(|b| b.mean.map(|m| m * b.weight * scale / 100.0))
                .sum())
        }
    }
}

fn check_finite(reviews: &[Review]) -> Result<(), RatingError> {
    for (index, r) in reviews.iter().enumerate() {
        if !r.day_diff.is_finite() {
            return Err(RatingError::NonFinite {
                field: "day_diff",
                index,
            });
        }
        if !r.overall.is_finite() {
            return Err(RatingError::NonFinite {
                field: "overall",
                index,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reviews(pairs: &[(f64, f64)]) -> Vec<Review> {
        pairs
            .iter()
            .map(|&(day_diff, overall)| Review::new(overall, 0, 0, day_diff))
            .collect()
    }

    #[test]
    fn most_recent_quartile_only() {
        let rs = reviews(&[(1.0, 5.0), (2.0, 5.0), (3.0, 5.0), (4.0, 1.0)]);
        let v = weighted_average(&rs, QuartileWeights::new(100.0, 0.0, 0.0, 0.0)).unwrap();
        assert!((v - 5.0).abs() < 1e-12);

        let oldest = weighted_average(&rs, QuartileWeights::new(0.0, 0.0, 0.0, 100.0)).unwrap();
        assert!((oldest - 1.0).abs() < 1e-12);
    }

    #[test]
    fn default_weights_blend_all_quartiles() {
        let rs = reviews(&[(1.0, 5.0), (2.0, 4.0), (3.0, 3.0), (4.0, 2.0)]);
        let v = weighted_average(&rs, QuartileWeights::default()).unwrap();
        let expected = 5.0 * 0.28 + 4.0 * 0.26 + 3.0 * 0.24 + 2.0 * 0.22;
        assert!((v - expected).abs() < 1e-12);
    }

    #[test]
    fn boundaries_are_right_closed() {
        let c = QuartileCutoffs {
            q25: 10.0,
            q50: 20.0,
            q75: 30.0,
        };
        assert_eq!(c.bucket_of(10.0), 0);
        assert_eq!(c.bucket_of(10.5), 1);
        assert_eq!(c.bucket_of(20.0), 1);
        assert_eq!(c.bucket_of(30.0), 2);
        assert_eq!(c.bucket_of(30.1), 3);
    }

    #[test]
    fn degenerate_quantiles_reduce_to_mean() {
        let rs = reviews(&[(7.0, 5.0), (7.0, 4.0), (7.0, 3.0)]);
        let full_weight = weighted_average(&rs, QuartileWeights::new(100.0, 0.0, 0.0, 0.0)).unwrap();
        assert!((full_weight - 4.0).abs() < 1e-12);

        let renorm = breakdown(&rs, QuartileWeights::STANDARD, EmptyBucketPolicy::Renormalize)
            .unwrap()
            .weighted_average;
        assert!((renorm - 4.0).abs() < 1e-12);
    }

    #[test]
    fn empty_weighted_bucket_is_reported() {
        let rs = reviews(&[(7.0, 5.0), (7.0, 4.0)]);
        let err = weighted_average(&rs, QuartileWeights::STANDARD).unwrap_err();
        assert_eq!(
            err,
            RatingError::EmptyBucket {
                bucket: 2,
                weight: 26.0
            }
        );
    }

    #[test]
    fn renormalize_with_no_weighted_data_is_undefined() {
        let rs = reviews(&[(7.0, 5.0), (7.0, 4.0)]);
        let err = breakdown(
            &rs,
            QuartileWeights::new(0.0, 50.0, 50.0, 0.0),
            EmptyBucketPolicy::Renormalize,
        )
        .unwrap_err();
        assert_eq!(
            err,
            RatingError::EmptyBucket {
                bucket: 2,
                weight: 50.0
            }
        );
    }

    #[test]
    fn empty_input_and_non_finite_values() {
        assert_eq!(
            weighted_average(&[], QuartileWeights::STANDARD),
            Err(RatingError::EmptyDataset)
        );
        assert_eq!(overall_mean(&[]), Err(RatingError::EmptyDataset));

        let rs = reviews(&[(1.0, 5.0), (f64::NAN, 4.0)]);
        assert_eq!(
            weighted_average(&rs, QuartileWeights::STANDARD),
            Err(RatingError::NonFinite {
                field: "day_diff",
                index: 1
            })
        );
    }

    #[test]
    fn weights_not_summing_to_100_scale_the_result() {
        let rs = reviews(&[(1.0, 4.0), (2.0, 4.0), (3.0, 4.0), (4.0, 4.0)]);
        let v = weighted_average(&rs, QuartileWeights::new(50.0, 50.0, 50.0, 50.0)).unwrap();
        assert!((v - 8.0).abs() < 1e-12);
    }

    #[test]
    fn breakdown_reports_counts_and_means() {
        let rs = reviews(&[(1.0, 5.0), (2.0, 5.0), (3.0, 5.0), (4.0, 1.0)]);
        let b = breakdown(&rs, QuartileWeights::STANDARD, EmptyBucketPolicy::Reject).unwrap();
        assert_eq!(b.overall_mean, 4.0);
        assert_eq!(b.cutoffs.q50, 2.5);
        assert_eq!(b.buckets.map(|s| s.count), [1, 1, 1, 1]);
        assert_eq!(b.buckets[3].mean, Some(1.0));
    }

    #[test]
    fn weights_deserialize_from_array() {
        let w: QuartileWeights = serde_json::from_str("[30, 26, 24, 20]").unwrap();
        assert_eq!(w, QuartileWeights::RECENT_HEAVY);
        assert_eq!(w.sum(), 100.0);
    }
}
