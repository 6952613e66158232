//! Percentile-based rating categorization
//!
//! Converts a user's historical rating distribution into dynamic
//! sentiment-tier boundaries. Percentile ranges per tier are fixed
//! constants; only the numeric midpoint and boundary values are
//! data-dependent.

use crate::types::{CategoryDescriptor, RatingCategory};

/// Default midpoint when the user has no rating history.
const EMPTY_HISTORY_MIDPOINT: f64 = 7.0;
/// Default value range when the user has no rating history.
const EMPTY_HISTORY_RANGE: (f64, f64) = (1.0, 10.0);

/// Sort ratings ascending, dropping non-finite values.
fn sorted_ratings(ratings: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = ratings.iter().copied().filter(|r| r.is_finite()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted
}

/// Value at a percentile position using floor-index interpolation,
/// clamped to the valid index range.
fn value_at_percentile(sorted: &[f64], percentile: u8) -> f64 {
    let index = ((percentile as f64 / 100.0) * sorted.len() as f64).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// Midpoint of the boundary values at a percentile range over the
/// user's rating distribution. Defaults to 7.0 with no history.
pub fn midpoint_for_range(ratings: &[f64], range: (u8, u8)) -> f64 {
    let sorted = sorted_ratings(ratings);
    if sorted.is_empty() {
        return EMPTY_HISTORY_MIDPOINT;
    }
    let low = value_at_percentile(&sorted, range.0);
    let high = value_at_percentile(&sorted, range.1);
    (low + high) / 2.0
}

/// Numeric `[low, high]` boundary values at a percentile range.
/// Defaults to `[1, 10]` with no history.
pub fn range_for_percentile(ratings: &[f64], range: (u8, u8)) -> (f64, f64) {
    let sorted = sorted_ratings(ratings);
    if sorted.is_empty() {
        return EMPTY_HISTORY_RANGE;
    }
    (
        value_at_percentile(&sorted, range.0),
        value_at_percentile(&sorted, range.1),
    )
}

/// The four sentiment tiers with computed numeric metadata, in
/// descending order (Loved first).
pub fn dynamic_categories(ratings: &[f64]) -> [CategoryDescriptor; 4] {
    RatingCategory::all().map(|category| {
        let range = category.percentile_range();
        CategoryDescriptor {
            category,
            percentile_range: range,
            label: category.label(),
            description: category.description(),
            midpoint: midpoint_for_range(ratings, range),
            value_range: range_for_percentile(ratings, range),
            default_rating: category.default_rating(),
        }
    })
}

/// Locate a rating's sentiment tier by its percentile position among
/// historical ratings. With no history, fixed absolute thresholds apply.
pub fn category_for_rating(rating: f64, ratings: &[f64]) -> RatingCategory {
    let sorted = sorted_ratings(ratings);
    if sorted.is_empty() {
        return if rating >= 8.5 {
            RatingCategory::Loved
        } else if rating >= 6.5 {
            RatingCategory::Liked
        } else if rating >= 4.5 {
            RatingCategory::Average
        } else {
            RatingCategory::Disliked
        };
    }

    let position = sorted.iter().position(|r| *r >= rating);
    let percentile = match position {
        Some(index) => (index as f64 / sorted.len() as f64) * 100.0,
        None => 100.0,
    };

    if percentile >= 75.0 {
        RatingCategory::Loved
    } else if percentile >= 50.0 {
        RatingCategory::Liked
    } else if percentile >= 25.0 {
        RatingCategory::Average
    } else {
        RatingCategory::Disliked
    }
}
