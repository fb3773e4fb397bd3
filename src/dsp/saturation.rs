//! Gain / Saturation Stage
//!
//! Linear gain followed by a soft-knee saturator that only engages when the
//! gain amplifies. Attenuation never saturates.

/// Magnitude above which the soft knee compresses
pub const SATURATION_THRESHOLD: f32 = 0.8;

/// Soft-knee curve, sign-symmetric around zero
///
/// Above the threshold: `t + (x - t) / (1 + (x - t)^2)`. A sample exactly at
/// the threshold is returned unchanged.
#[inline]
pub fn soft_saturate(x: f32) -> f32 {
    let t = SATURATION_THRESHOLD;
    if x > t {
        let over = x - t;
        t + over / (1.0 + over * over)
    } else if x < -t {
        let over = x + t;
        -t + over / (1.0 + over * over)
    } else {
        x
    }
}

/// Apply gain, then saturation if `linear_gain > 1.0`
#[inline]
pub fn process_sample(x: f32, linear_gain: f32) -> f32 {
    let y = x * linear_gain;
    if linear_gain > 1.0 {
        soft_saturate(y)
    } else {
        y
    }
}

/// Apply gain and saturation to a block in place
pub fn apply_gain_and_saturation(samples: &mut [f32], linear_gain: f32) {
    apply_gain_and_saturation_iter(samples.iter_mut(), linear_gain);
}

/// Strided variant used for interleaved buffers
#[inline]
pub fn apply_gain_and_saturation_iter<'a, I>(samples: I, linear_gain: f32)
where
    I: Iterator<Item = &'a mut f32>,
{
    if linear_gain > 1.0 {
        for sample in samples {
            *sample = soft_saturate(*sample * linear_gain);
        }
    } else {
        for sample in samples {
            *sample *= linear_gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn ramp() -> Vec<f32> {
        (-200..=200).map(|i| i as f32 / 100.0).collect()
    }

    #[test_case(0.0)]
    #[test_case(0.5)]
    #[test_case(1.0)]
    fn test_no_saturation_at_or_below_unity(gain: f32) {
        let input = ramp();
        let mut output = input.clone();
        apply_gain_and_saturation(&mut output, gain);
        for (x, y) in input.iter().zip(&output) {
            assert_eq!(*y, x * gain);
        }
    }

    #[test_case(1.5)]
    #[test_case(2.0)]
    #[test_case(10.0)]
    fn test_below_threshold_untouched(gain: f32) {
        let input: Vec<f32> = ramp()
            .into_iter()
            .filter(|x| (x * gain).abs() <= SATURATION_THRESHOLD)
            .collect();
        let mut output = input.clone();
        apply_gain_and_saturation(&mut output, gain);
        for (x, y) in input.iter().zip(&output) {
            assert_eq!(*y, x * gain);
        }
    }

    #[test_case(1.5)]
    #[test_case(2.0)]
    #[test_case(10.0)]
    fn test_above_threshold_compressed(gain: f32) {
        let input: Vec<f32> = ramp()
            .into_iter()
            .filter(|x| (x * gain).abs() > SATURATION_THRESHOLD)
            .collect();
        assert!(!input.is_empty());
        let mut output = input.clone();
        apply_gain_and_saturation(&mut output, gain);
        for (x, y) in input.iter().zip(&output) {
            let driven = x * gain;
            assert!(y.abs() < driven.abs(), "{} -> {} not compressed", driven, y);
            assert_eq!(y.signum(), driven.signum());
        }
    }

    #[test]
    fn test_exact_threshold_unchanged() {
        assert_eq!(soft_saturate(SATURATION_THRESHOLD), SATURATION_THRESHOLD);
        assert_eq!(soft_saturate(-SATURATION_THRESHOLD), -SATURATION_THRESHOLD);
    }

    #[test]
    fn test_curve_values() {
        // 2.0 driven: 0.8 + 1.2 / (1 + 1.44)
        let y = process_sample(1.0, 2.0);
        assert!((y - (0.8 + 1.2 / 2.44)).abs() < 1e-6);
        assert!(y > 0.8 && y < 2.0);
        assert_eq!(process_sample(-1.0, 2.0), -y);
    }

    #[test]
    fn test_iter_variant_matches_slice() {
        let input = ramp();
        let mut a = input.clone();
        let mut b = input.clone();
        apply_gain_and_saturation(&mut a, 3.0);
        for s in b.iter_mut() {
            *s = process_sample(*s, 3.0);
        }
        assert_eq!(a, b);
    }
}
