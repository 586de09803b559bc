use crate::knotdata::KnotData;

/// Rewrite a pair of adjacent knots so that the cubic Bezier between them
/// is monotone in time.
///
/// A segment is regressive when the combined horizontal tangent reach
/// exceeds the segment length; the cubic then folds back in time.  This is
/// the KeepRatio normalization: both widths are scaled by the same factor
/// so that their sum exactly equals the segment length, and the ratio of
/// the two tangent lengths is preserved.  Slopes are untouched.
///
/// This runs on per-segment copies during sampling, as a display
/// safeguard; authored knot data is never modified.
pub(crate) fn deregress_segment(prev: &mut KnotData, next: &mut KnotData) {
    let segment_length = next.time - prev.time;
    let reach = prev.post_tan_width + next.pre_tan_width;
    if reach > segment_length && reach > 0.0 {
        let factor = segment_length / reach;
        prev.post_tan_width *= factor;
        next.pre_tan_width *= factor;
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::types::InterpMode;

    fn curve_pair(post_width: f64, pre_width: f64) -> (KnotData, KnotData) {
        let prev = KnotData {
            time: 0.0,
            value: 0.0,
            post_tan_width: post_width,
            post_tan_slope: 1.0,
            next_interp: InterpMode::Curve,
            ..Default::default()
        };
        let next = KnotData {
            time: 1.0,
            value: 1.0,
            pre_value: 1.0,
            pre_tan_width: pre_width,
            pre_tan_slope: 2.0,
            ..Default::default()
        };
        (prev, next)
    }

    #[test]
    fn non_regressive_pair_untouched() {
        let (mut prev, mut next) = curve_pair(0.25, 0.5);
        deregress_segment(&mut prev, &mut next);
        assert_eq!(prev.post_tan_width, 0.25);
        assert_eq!(next.pre_tan_width, 0.5);
    }

    #[test]
    fn regressive_pair_scaled_to_segment_length() {
        let (mut prev, mut next) = curve_pair(3.0, 2.0);
        deregress_segment(&mut prev, &mut next);
        assert_eq!(prev.post_tan_width + next.pre_tan_width, 1.0);
        // 3:2 ratio preserved.
        assert_eq!(prev.post_tan_width, 0.6);
        assert_eq!(next.pre_tan_width, 0.4);
        // Slopes unchanged.
        assert_eq!(prev.post_tan_slope, 1.0);
        assert_eq!(next.pre_tan_slope, 2.0);
    }

    #[test]
    fn exact_reach_untouched() {
        let (mut prev, mut next) = curve_pair(0.5, 0.5);
        deregress_segment(&mut prev, &mut next);
        assert_eq!(prev.post_tan_width, 0.5);
        assert_eq!(next.pre_tan_width, 0.5);
    }
}
