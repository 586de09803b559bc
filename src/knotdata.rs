use crate::types::{CurveType, InterpMode};

/// One keyframe of a spline.
///
/// Tangents are stored as a non-negative horizontal `width` and a `slope`
/// in value units per time unit.  Slopes always describe the curve in
/// forward time: a positive pre-tangent slope means the curve ascends into
/// the knot.
///
/// A *dual-valued* knot has distinct pre- and post-values, modeling a
/// step: the segment arriving from the left sees `pre_value`, everything
/// at and after the knot sees `value`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnotData {
    pub time: f64,
    pub value: f64,
    pub pre_value: f64,
    pub dual_valued: bool,
    pub pre_tan_width: f64,
    pub pre_tan_slope: f64,
    pub post_tan_width: f64,
    pub post_tan_slope: f64,
    /// Interpolation used from this knot to the next one.
    pub next_interp: InterpMode,
    pub curve_type: CurveType,
}

impl Default for KnotData {
    fn default() -> KnotData {
        KnotData {
            time: 0.0,
            value: 0.0,
            pre_value: 0.0,
            dual_valued: false,
            pre_tan_width: 0.0,
            pre_tan_slope: 0.0,
            post_tan_width: 0.0,
            post_tan_slope: 0.0,
            next_interp: InterpMode::default(),
            curve_type: CurveType::default(),
        }
    }
}

impl KnotData {
    /// The value seen when approaching this knot from earlier times.
    pub fn pre_value(&self) -> f64 {
        if self.dual_valued {
            self.pre_value
        } else {
            self.value
        }
    }

    /// Vertical extent of the pre-tangent control offset.  The pre-tangent
    /// points backward in time, so the height is the negated rise over the
    /// tangent width.
    pub fn pre_tan_height(&self) -> f64 {
        -self.pre_tan_width * self.pre_tan_slope
    }

    /// Vertical extent of the post-tangent control offset.
    pub fn post_tan_height(&self) -> f64 {
        self.post_tan_width * self.post_tan_slope
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn pre_value_follows_dual_flag() {
        let mut knot = KnotData {
            value: 4.0,
            pre_value: 1.0,
            ..Default::default()
        };
        assert_eq!(knot.pre_value(), 4.0);
        knot.dual_valued = true;
        assert_eq!(knot.pre_value(), 1.0);
    }

    #[test]
    fn tangent_heights_carry_sign() {
        let knot = KnotData {
            pre_tan_width: 2.0,
            pre_tan_slope: 3.0,
            post_tan_width: 2.0,
            post_tan_slope: 3.0,
            ..Default::default()
        };
        // A smooth knot: the pre control point sits below and behind, the
        // post control point above and ahead.
        assert_eq!(knot.pre_tan_height(), -6.0);
        assert_eq!(knot.post_tan_height(), 6.0);
    }
}
