use superslice::Ext;

use crate::knotdata::KnotData;
use crate::types::{Extrapolation, LoopParams};

#[derive(thiserror::Error, Debug)]
pub enum SplineDataError {
    #[error("knot time {time} is not after the last knot time {last}")]
    KnotOutOfOrder { time: f64, last: f64 },
    #[error("knot times must not be NaN")]
    TimeNan,
}

/// Primary data structure for splines: an ordered knot sequence plus the
/// overall extrapolation and inner-loop parameters.
///
/// Knots are appended in ascending time order; the full editing surface
/// (insertion, removal, retiming) lives with the authoring layer, not
/// here.  Sampling reads this structure without mutating it, so
/// concurrent sampling calls against the same spline are safe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplineData {
    pub pre_extrapolation: Extrapolation,
    pub post_extrapolation: Extrapolation,
    pub loop_params: LoopParams,

    // A duplicate of the knot times, so that we can maximize locality
    // while performing binary searches for knots.  The entries correspond
    // exactly to the entries in `knots`.  Times are unique and sorted in
    // ascending order.
    times: Vec<f64>,
    knots: Vec<KnotData>,
}

impl SplineData {
    pub fn new() -> SplineData {
        SplineData::default()
    }

    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }

    pub fn knot_count(&self) -> usize {
        self.knots.len()
    }

    /// The packed knot times, ascending.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn knots(&self) -> &[KnotData] {
        &self.knots
    }

    pub fn reserve(&mut self, count: usize) {
        self.times.reserve(count);
        self.knots.reserve(count);
    }

    /// Append a knot whose time is strictly after all existing knots.
    pub fn push_knot(&mut self, knot: KnotData) -> Result<(), SplineDataError> {
        if knot.time.is_nan() {
            return Err(SplineDataError::TimeNan);
        }
        if let Some(&last) = self.times.last() {
            if knot.time <= last {
                return Err(SplineDataError::KnotOutOfOrder {
                    time: knot.time,
                    last,
                });
            }
        }
        self.times.push(knot.time);
        self.knots.push(knot);
        Ok(())
    }

    /// Whether there is a valid inner-loop configuration.
    pub fn has_inner_loops(&self) -> bool {
        self.inner_loop_start_index().is_some()
    }

    /// The index of the first prototype knot, if inner looping is valid:
    /// the prototype interval must be non-degenerate and a knot must exist
    /// exactly at its start.
    pub fn inner_loop_start_index(&self) -> Option<usize> {
        let lp = &self.loop_params;
        if lp.proto_end <= lp.proto_start {
            return None;
        }
        let idx = self
            .times
            .lower_bound_by(|t| t.partial_cmp(&lp.proto_start).unwrap());
        if idx < self.times.len() && self.times[idx] == lp.proto_start {
            Some(idx)
        } else {
            None
        }
    }
}
