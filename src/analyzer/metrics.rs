//! Vector math and metric aggregation
//!
//! All functions here are deterministic and independent of embedding batch
//! sizes: they see the final per-page vectors only, so how those vectors were
//! produced cannot change the numbers.

use crate::analyzer::types::{
    CategoryBreakdown, ContentComposition, PageCategory, SimilarityBin,
};

/// Number of histogram bins over [0, 1]
const HISTOGRAM_BINS: usize = 10;

/// Saturation constant of the info-density curve (characters)
const INFO_DENSITY_SCALE: f64 = 2000.0;

/// Scales a vector to unit length in place
///
/// Returns false when the vector has zero (or non-finite) norm and was left
/// untouched; such vectors carry no direction and must be discarded upstream.
pub fn normalize(vector: &mut [f32]) -> bool {
    let norm = vector
        .iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt();

    if norm == 0.0 || !norm.is_finite() {
        return false;
    }

    for x in vector.iter_mut() {
        *x = (f64::from(*x) / norm) as f32;
    }
    true
}

/// Unit-normalized mean of a set of unit vectors
///
/// Returns None when the input is empty or the raw mean has zero norm
/// (perfectly opposing vectors); the caller surfaces that explicitly.
pub fn centroid(vectors: &[&[f32]]) -> Option<Vec<f32>> {
    let first = vectors.first()?;
    let dims = first.len();

    let mut sum = vec![0.0f64; dims];
    for vector in vectors {
        for (acc, &x) in sum.iter_mut().zip(vector.iter()) {
            *acc += f64::from(x);
        }
    }

    let n = vectors.len() as f64;
    let mut mean: Vec<f32> = sum.iter().map(|&x| (x / n) as f32).collect();

    if normalize(&mut mean) {
        Some(mean)
    } else {
        None
    }
}

/// Cosine similarity of two unit vectors
///
/// For unit-normalized inputs this is the dot product; the result is clamped
/// to [-1, 1] to absorb accumulated rounding.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum::<f64>();

    dot.clamp(-1.0, 1.0)
}

/// Bounded transform of content length into [0, 1)
///
/// Saturating and strictly monotonic: empty content maps to exactly 0, very
/// long pages approach 1. Deterministic in the character count alone.
pub fn info_density(content_length: usize) -> f64 {
    let len = content_length as f64;
    len / (len + INFO_DENSITY_SCALE)
}

/// Partitions [0, 1] into ten equal bins and counts pages per bin
///
/// Similarity exactly 1.0 lands in the top bin; negative similarities clamp
/// into the bottom bin. Bin counts always sum to the number of inputs.
pub fn similarity_histogram(similarities: &[f64]) -> Vec<SimilarityBin> {
    let mut counts = [0usize; HISTOGRAM_BINS];

    for &similarity in similarities {
        let clamped = similarity.clamp(0.0, 1.0);
        let index = ((clamped * HISTOGRAM_BINS as f64) as usize).min(HISTOGRAM_BINS - 1);
        counts[index] += 1;
    }

    counts
        .iter()
        .enumerate()
        .map(|(i, &count)| SimilarityBin {
            lower: i as f64 / HISTOGRAM_BINS as f64,
            upper: (i + 1) as f64 / HISTOGRAM_BINS as f64,
            count,
        })
        .collect()
}

/// Counts pages per category and derives their shares
pub fn content_composition(categories: &[PageCategory]) -> ContentComposition {
    let mut central = 0usize;
    let mut support = 0usize;
    let mut peripheral = 0usize;

    for category in categories {
        match category {
            PageCategory::Central => central += 1,
            PageCategory::Support => support += 1,
            PageCategory::Peripheral => peripheral += 1,
        }
    }

    let total = categories.len();
    let breakdown = |count: usize| CategoryBreakdown {
        count,
        percent: percent_of(count, total),
    };

    ContentComposition {
        central: breakdown(central),
        support: breakdown(support),
        peripheral: breakdown(peripheral),
    }
}

/// Share of `count` in `total` as a percentage rounded to one decimal
fn percent_of(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = count as f64 / total as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_normalize_unit_length() {
        let mut v = vec![3.0, 4.0];
        assert!(normalize(&mut v));
        assert_close(f64::from(v[0]), 0.6);
        assert_close(f64::from(v[1]), 0.8);
    }

    #[test]
    fn test_normalize_rejects_zero_vector() {
        let mut v = vec![0.0, 0.0, 0.0];
        assert!(!normalize(&mut v));
    }

    #[test]
    fn test_cosine_self_similarity_is_one() {
        let mut v = vec![0.2, -0.5, 0.7, 0.1];
        assert!(normalize(&mut v));
        let similarity = cosine_similarity(&v, &v);
        assert!((similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_is_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert_close(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_opposite_is_minus_one() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert_close(cosine_similarity(&a, &b), -1.0);
    }

    #[test]
    fn test_centroid_of_single_vector_is_itself() {
        let mut v = vec![0.3, 0.4, 0.5];
        assert!(normalize(&mut v));
        let c = centroid(&[&v]).unwrap();
        let similarity = cosine_similarity(&v, &c);
        assert!((similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_centroid_of_opposing_vectors_is_none() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!(centroid(&[&a[..], &b[..]]).is_none());
    }

    #[test]
    fn test_centroid_empty_is_none() {
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn test_centroid_is_unit_length() {
        let mut a = vec![1.0, 1.0, 0.0];
        let mut b = vec![0.0, 1.0, 1.0];
        assert!(normalize(&mut a));
        assert!(normalize(&mut b));
        let c = centroid(&[&a[..], &b[..]]).unwrap();
        let norm: f64 = c.iter().map(|&x| f64::from(x) * f64::from(x)).sum::<f64>();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_info_density_bounds() {
        assert_close(info_density(0), 0.0);
        assert!(info_density(100) > 0.0);
        assert!(info_density(1_000_000) < 1.0);
    }

    #[test]
    fn test_info_density_monotonic() {
        let mut last = -1.0;
        for length in [0, 10, 100, 1000, 10_000, 100_000] {
            let density = info_density(length);
            assert!(density > last);
            last = density;
        }
    }

    #[test]
    fn test_histogram_counts_sum_to_input_len() {
        let similarities = vec![0.05, 0.15, 0.95, 0.85, 0.85, 1.0, 0.0, -0.3];
        let bins = similarity_histogram(&similarities);
        assert_eq!(bins.len(), 10);
        let total: usize = bins.iter().map(|b| b.count).sum();
        assert_eq!(total, similarities.len());
    }

    #[test]
    fn test_histogram_top_bin_includes_one() {
        let bins = similarity_histogram(&[1.0]);
        assert_eq!(bins[9].count, 1);
    }

    #[test]
    fn test_histogram_negative_clamps_to_bottom_bin() {
        let bins = similarity_histogram(&[-0.5]);
        assert_eq!(bins[0].count, 1);
    }

    #[test]
    fn test_histogram_bin_edges() {
        let bins = similarity_histogram(&[]);
        assert_close(bins[0].lower, 0.0);
        assert_close(bins[0].upper, 0.1);
        assert_close(bins[9].lower, 0.9);
        assert_close(bins[9].upper, 1.0);
    }

    #[test]
    fn test_composition_counts_and_percentages() {
        let categories = vec![
            PageCategory::Central,
            PageCategory::Central,
            PageCategory::Support,
            PageCategory::Peripheral,
        ];
        let composition = content_composition(&categories);

        assert_eq!(composition.central.count, 2);
        assert_eq!(composition.support.count, 1);
        assert_eq!(composition.peripheral.count, 1);
        assert_eq!(composition.total(), 4);
        assert_close(composition.central.percent, 50.0);
        assert_close(composition.support.percent, 25.0);
        assert_close(composition.peripheral.percent, 25.0);
    }

    #[test]
    fn test_composition_percent_rounding() {
        let categories = vec![
            PageCategory::Central,
            PageCategory::Support,
            PageCategory::Peripheral,
        ];
        let composition = content_composition(&categories);
        // 1/3 of 100% rounds to 33.3
        assert_close(composition.central.percent, 33.3);
    }
}
