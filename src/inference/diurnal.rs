//! Cosmetic time-of-day correction applied on top of raw model output.
//!
//! Not physically derived. Kept apart from the pipeline so raw predictions
//! stay inspectable.

use rand::Rng;
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HourBucket {
    /// 06:00-09:00 and 17:00-20:00.
    Rush,
    /// 09:00-17:00.
    Midday,
    Night,
}

impl HourBucket {
    pub fn of(hour: u32) -> Self {
        match hour {
            6..=8 | 17..=19 => HourBucket::Rush,
            9..=16 => HourBucket::Midday,
            _ => HourBucket::Night,
        }
    }

    pub fn offset_range(self) -> RangeInclusive<f32> {
        match self {
            HourBucket::Rush => 0.5..=1.5,
            HourBucket::Midday => -1.0..=0.0,
            HourBucket::Night => 0.0..=0.5,
        }
    }
}

pub fn sample_offset<R: Rng + ?Sized>(hour: u32, rng: &mut R) -> f32 {
    rng.gen_range(HourBucket::of(hour).offset_range())
}

/// `max(0, raw + offset)`.
pub fn apply_offset(raw: f32, offset: f32) -> f32 {
    (raw + offset).max(0.0)
}

pub fn adjust<R: Rng + ?Sized>(raw: f32, hour: u32, rng: &mut R) -> f32 {
    apply_offset(raw, sample_offset(hour, rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn buckets_follow_the_clock() {
        assert_eq!(HourBucket::of(5), HourBucket::Night);
        assert_eq!(HourBucket::of(6), HourBucket::Rush);
        assert_eq!(HourBucket::of(9), HourBucket::Midday);
        assert_eq!(HourBucket::of(16), HourBucket::Midday);
        assert_eq!(HourBucket::of(17), HourBucket::Rush);
        assert_eq!(HourBucket::of(20), HourBucket::Night);
        assert_eq!(HourBucket::of(23), HourBucket::Night);
    }

    #[test]
    fn offsets_stay_inside_their_bucket() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for hour in 0..24 {
            let range = HourBucket::of(hour).offset_range();
            for _ in 0..200 {
                let offset = sample_offset(hour, &mut rng);
                assert!(range.contains(&offset), "hour {hour}: {offset}");
            }
        }
    }

    #[test]
    fn adjusted_value_is_never_negative() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for hour in 0..24 {
            for raw in [-1.5, -0.3, 0.0, 0.2, 12.0] {
                assert!(adjust(raw, hour, &mut rng) >= 0.0);
            }
        }
    }

    #[test]
    fn same_seed_same_adjustment() {
        let a = adjust(10.0, 8, &mut ChaCha8Rng::seed_from_u64(1));
        let b = adjust(10.0, 8, &mut ChaCha8Rng::seed_from_u64(1));
        assert_eq!(a, b);
    }

    #[test]
    fn floor_applies_after_offset() {
        assert_eq!(apply_offset(-2.0, 0.5), 0.0);
        assert_eq!(apply_offset(3.0, -1.0), 2.0);
    }
}
