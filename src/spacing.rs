//! Compatibility-aware spacing policy
//!
//! Minimum center-to-center distance between two plants, derived from their
//! mutual affinity and physical footprint. Antagonistic pairs are pushed
//! apart, companion pairs may sit close. Pure functions; the placement code
//! in the genetic algorithm calls these on every candidate position.

/// Required minimum center-to-center distance in meters.
///
/// Base separation: 2.5 m for antagonists (compatibility < -0.5), 1.0 m for
/// companions (> 0.5), 1.5 m otherwise, plus half the side of each footprint.
pub fn min_distance(compatibility: f64, size1: f64, size2: f64) -> f64 {
    let base = if compatibility < -0.5 {
        2.5
    } else if compatibility > 0.5 {
        1.0
    } else {
        1.5
    };
    base + size1.sqrt() / 2.0 + size2.sqrt() / 2.0
}

/// Quadratic penalty for a pair placed closer than its minimum distance.
///
/// 0 at or beyond the minimum, rising to 1 as the centers coincide.
pub fn proximity_penalty(actual_distance: f64, min_distance: f64) -> f64 {
    if actual_distance >= min_distance || min_distance <= 0.0 {
        return 0.0;
    }
    let shortfall = 1.0 - actual_distance / min_distance;
    shortfall * shortfall
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn antagonists_need_wide_separation() {
        // Two 1 m² footprints: 2.5 + 0.5 + 0.5
        assert_relative_eq!(min_distance(-0.8, 1.0, 1.0), 3.5);
    }

    #[test]
    fn companions_may_sit_close() {
        assert_relative_eq!(min_distance(0.9, 1.0, 1.0), 2.0);
    }

    #[test]
    fn neutral_pairs_take_the_middle_band() {
        assert_relative_eq!(min_distance(0.0, 0.25, 0.25), 2.0);
        // Band edges are exclusive: exactly ±0.5 is neutral
        assert_relative_eq!(min_distance(0.5, 0.25, 0.25), 2.0);
        assert_relative_eq!(min_distance(-0.5, 0.25, 0.25), 2.0);
    }

    #[test]
    fn penalty_is_zero_at_or_beyond_minimum() {
        assert_eq!(proximity_penalty(2.0, 2.0), 0.0);
        assert_eq!(proximity_penalty(5.0, 2.0), 0.0);
    }

    #[test]
    fn penalty_grows_quadratically_inside_minimum() {
        assert_relative_eq!(proximity_penalty(1.0, 2.0), 0.25);
        assert_relative_eq!(proximity_penalty(0.5, 2.0), 0.5625);
        assert_relative_eq!(proximity_penalty(0.0, 2.0), 1.0);
    }
}
