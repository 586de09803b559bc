use std::borrow::Cow;

use nalgebra::Vector2;
use superslice::Ext;
use tracing::{debug, error, trace};

use crate::interval::Interval;
use crate::knotdata::KnotData;
use crate::regressionpreventer;
use crate::splinedata::SplineData;
use crate::types::{CurveType, ExtrapMode, InterpMode, SampleSink, SampleSource};
use crate::utilities::lerp;

#[derive(thiserror::Error, Debug)]
pub enum SampleError {
    #[error("time interval [{min}, {max}] is empty")]
    EmptyInterval { min: f64, max: f64 },
    #[error("time scale must be positive, not {time_scale}")]
    NonPositiveTimeScale { time_scale: f64 },
    #[error("value scale must be positive, not {value_scale}")]
    NonPositiveValueScale { value_scale: f64 },
    #[error("tolerance must be positive, not {tolerance}")]
    NonPositiveTolerance { tolerance: f64 },
}

/// Approximate a spline over `time_interval` with piecewise-linear
/// polylines written to `sink`.
///
/// `time_scale` and `value_scale` convert curve coordinates to the space
/// the approximation error is measured in (typically pixels per time unit
/// and pixels per value unit); the emitted polylines deviate from the true
/// curve by at most `tolerance` in that space.
///
/// A spline without knots produces no output and returns `Ok`.
pub fn sample<K: SampleSink>(
    data: &SplineData,
    time_interval: Interval,
    time_scale: f64,
    value_scale: f64,
    tolerance: f64,
    sink: &mut K,
) -> Result<(), SampleError> {
    if time_interval.is_empty() {
        return Err(SampleError::EmptyInterval {
            min: time_interval.min(),
            max: time_interval.max(),
        });
    }
    if !(time_scale > 0.0) {
        return Err(SampleError::NonPositiveTimeScale { time_scale });
    }
    if !(value_scale > 0.0) {
        return Err(SampleError::NonPositiveValueScale { value_scale });
    }
    if !(tolerance > 0.0) {
        return Err(SampleError::NonPositiveTolerance { tolerance });
    }

    if data.is_empty() {
        return Ok(());
    }

    Sampler::new(data, time_interval, time_scale, value_scale, tolerance).sample(sink);
    Ok(())
}

// Each spline can have as many as seven intervals that are populated from
// different sources: pre-extrapolation loops, inner loops,
// post-extrapolation, and so on.
struct SourceInterval {
    source: SampleSource,
    interval: Interval,
}

/// `Sampler` constructs a partially unrolled version of the spline and
/// then samples that version.  Only the inner loops are unrolled, and only
/// in the region where sampling will occur.  The unrolled version enables
/// random access to all the relevant knots; extrapolation looping becomes
/// simple time and value shifting.
struct Sampler<'a> {
    data: &'a SplineData,
    time_interval: Interval,
    time_scale: f64,
    value_scale: f64,
    tolerance: f64,

    have_multiple_knots: bool,
    first_time: f64,
    last_time: f64,
    source_intervals: Vec<SourceInterval>,

    // The knots and their times.  With no inner looping these alias the
    // spline data directly; otherwise they hold the unrolled copies.  The
    // packed times are what the binary searches walk.
    times: Cow<'a, [f64]>,
    knots: Cow<'a, [KnotData]>,
}

fn lower_bound(times: &[f64], t: f64) -> usize {
    times.lower_bound_by(|x| x.partial_cmp(&t).unwrap())
}

fn upper_bound(times: &[f64], t: f64) -> usize {
    times.upper_bound_by(|x| x.partial_cmp(&t).unwrap())
}

fn to_knot_time(sample_time: f64, scale: f64, offset: f64) -> f64 {
    (sample_time - offset) / scale
}

fn to_sample_time(knot_time: f64, scale: f64, offset: f64) -> f64 {
    knot_time * scale + offset
}

impl<'a> Sampler<'a> {
    fn new(
        data: &'a SplineData,
        time_interval: Interval,
        time_scale: f64,
        value_scale: f64,
        tolerance: f64,
    ) -> Sampler<'a> {
        // Characterize the spline.
        let first_proto_index = data.inner_loop_start_index();
        let have_inner_loops = first_proto_index.is_some();

        // There are multiple knots if multiple are authored; valid inner
        // looping also always yields at least two.
        let have_multiple_knots = have_inner_loops || data.times().len() > 1;

        let have_pre_extrap_loops = have_multiple_knots && data.pre_extrapolation.is_looping();
        let have_post_extrap_loops = have_multiple_knots && data.post_extrapolation.is_looping();

        // First and last knot times; these may be authored or echoed.
        let raw_first_time = data.times()[0];
        let raw_last_time = *data.times().last().unwrap();
        let mut first_time = raw_first_time;
        let mut last_time = raw_last_time;

        let mut first_inner_loop = 0.0;
        let mut last_inner_loop = 0.0;
        let first_inner_proto = data.loop_params.proto_start;
        let last_inner_proto = data.loop_params.proto_end;
        if have_inner_loops {
            let looped = data.loop_params.looped_interval();
            first_inner_loop = looped.min();
            last_inner_loop = looped.max();
            if first_inner_loop < raw_first_time {
                first_time = first_inner_loop;
            }
            if last_inner_loop > raw_last_time {
                last_time = last_inner_loop;
            }
        }

        let mut source_intervals = Vec::new();
        if data.pre_extrapolation.mode != ExtrapMode::ValueBlock {
            source_intervals.push(SourceInterval {
                source: if have_pre_extrap_loops {
                    SampleSource::PreExtrapLoop
                } else {
                    SampleSource::PreExtrap
                },
                interval: Interval::half_open(f64::NEG_INFINITY, first_time),
            });
        }
        if have_inner_loops {
            if first_time < first_inner_loop {
                source_intervals.push(SourceInterval {
                    source: SampleSource::KnotInterp,
                    interval: Interval::half_open(first_time, first_inner_loop),
                });
            }
            if first_inner_loop < first_inner_proto {
                source_intervals.push(SourceInterval {
                    source: SampleSource::InnerLoopPreEcho,
                    interval: Interval::half_open(first_inner_loop, first_inner_proto),
                });
            }
            source_intervals.push(SourceInterval {
                source: SampleSource::InnerLoopProto,
                interval: Interval::half_open(first_inner_proto, last_inner_proto),
            });
            if last_inner_proto < last_inner_loop {
                source_intervals.push(SourceInterval {
                    source: SampleSource::InnerLoopPostEcho,
                    interval: Interval::half_open(last_inner_proto, last_inner_loop),
                });
            }
            if last_inner_loop < last_time {
                source_intervals.push(SourceInterval {
                    source: SampleSource::KnotInterp,
                    interval: Interval::half_open(last_inner_loop, last_time),
                });
            }
        } else if first_time < last_time {
            source_intervals.push(SourceInterval {
                source: SampleSource::KnotInterp,
                interval: Interval::half_open(first_time, last_time),
            });
        }
        if data.post_extrapolation.mode != ExtrapMode::ValueBlock {
            source_intervals.push(SourceInterval {
                source: if have_post_extrap_loops {
                    SampleSource::PostExtrapLoop
                } else {
                    SampleSource::PostExtrap
                },
                interval: Interval::half_open(last_time, f64::INFINITY),
            });
        }

        let (times, knots) = if let Some(proto_index) = first_proto_index {
            let (times, knots) = unroll_inner_loops(
                data,
                &time_interval,
                proto_index,
                first_inner_loop,
                last_inner_loop,
                first_inner_proto,
                last_inner_proto,
                have_pre_extrap_loops || have_post_extrap_loops,
            );
            (Cow::Owned(times), Cow::Owned(knots))
        } else {
            // The spline data already has everything we need.
            (Cow::Borrowed(data.times()), Cow::Borrowed(data.knots()))
        };

        trace!(
            min = time_interval.min(),
            max = time_interval.max(),
            have_inner_loops,
            have_pre_extrap_loops,
            have_post_extrap_loops,
            source_regions = source_intervals.len(),
            first_time,
            last_time,
            "sampler constructed"
        );

        Sampler {
            data,
            time_interval,
            time_scale,
            value_scale,
            tolerance,
            have_multiple_knots,
            first_time,
            last_time,
            source_intervals,
            times,
            knots,
        }
    }

    fn sample<K: SampleSink>(&self, sink: &mut K) {
        debug_assert!(!self.knots.is_empty());

        for si in &self.source_intervals {
            let region = self.time_interval & si.interval;
            if region.size() > 0.0 {
                match si.source {
                    // All non-looping extrapolation modes are linear.
                    SampleSource::PreExtrap | SampleSource::PostExtrap => {
                        self.extrap_linear(&region, si.source, sink);
                    }
                    SampleSource::PreExtrapLoop | SampleSource::PostExtrapLoop => {
                        self.extrap_loop(&region, si.source, sink);
                    }
                    // Sample and knot times agree in these regions.
                    _ => self.sample_knots(&region, si.source, 1.0, 0.0, 0.0, sink),
                }
            }
        }
    }

    fn extrap_linear<K: SampleSink>(
        &self,
        region: &Interval,
        source: SampleSource,
        sink: &mut K,
    ) {
        let is_pre = source == SampleSource::PreExtrap;
        let extrap = if is_pre {
            &self.data.pre_extrapolation
        } else {
            &self.data.post_extrapolation
        };

        let slope = match extrap.mode {
            // No extrapolation, just return.
            ExtrapMode::ValueBlock => return,
            ExtrapMode::Held => 0.0,
            ExtrapMode::Sloped => extrap.slope,
            ExtrapMode::LoopRepeat | ExtrapMode::LoopReset | ExtrapMode::LoopOscillate => {
                // Should have dispatched to extrap_loop instead.
                error!(mode = ?extrap.mode, "loop extrapolation reached the linear branch");
                return;
            }
            ExtrapMode::Linear => self.edge_slope(is_pre),
        };

        let t1 = region.min();
        let t2 = region.max();
        let (v1, v2) = if is_pre {
            let v2 = self.knots.first().unwrap().pre_value();
            (v2 - slope * (t2 - t1), v2)
        } else {
            let v1 = self.knots.last().unwrap().value;
            (v1, v1 + slope * (t2 - t1))
        };

        // There's only ever one segment.
        sink.add_segment(t1, v1, t2, v2, source);
    }

    /// Slope of a straight-line continuation past the edge knot, from the
    /// interpolated side of that knot: flat for a dual-valued edge knot or
    /// a held edge segment, the knot-to-knot slope for a linear edge
    /// segment, and the interpolated tangent slope for a curved one.
    fn edge_slope(&self, is_pre: bool) -> f64 {
        if !self.have_multiple_knots {
            return 0.0;
        }
        let (knot1, knot2) = if is_pre {
            (&self.knots[0], &self.knots[1])
        } else {
            (&self.knots[self.knots.len() - 2], &self.knots[self.knots.len() - 1])
        };
        let edge_dual = if is_pre {
            knot1.dual_valued
        } else {
            knot2.dual_valued
        };
        if edge_dual {
            return 0.0;
        }
        match knot1.next_interp {
            // They should never be at the same time, but don't divide by 0.
            InterpMode::Linear if knot1.time != knot2.time => {
                (knot2.pre_value() - knot1.value) / (knot2.time - knot1.time)
            }
            InterpMode::Curve => {
                if is_pre {
                    knot1.post_tan_slope
                } else {
                    knot2.pre_tan_slope
                }
            }
            _ => 0.0,
        }
    }

    // Figure out the time and value conversions for each loop iteration
    // and then invoke the knot walk, possibly multiple times.  For
    // extrapolation looping we are guaranteed a knot at each end of the
    // looped region.
    //
    // There are two time ranges here: sample times (the inputs and outputs
    // of this function) and knot times (stored in the knots array).
    // Conversion uses a scale and an offset:
    //     sample_time = knot_time * scale + offset
    fn extrap_loop<K: SampleSink>(&self, region: &Interval, source: SampleSource, sink: &mut K) {
        let is_pre = source == SampleSource::PreExtrapLoop;
        let extrap = if is_pre {
            &self.data.pre_extrapolation
        } else {
            &self.data.post_extrapolation
        };
        if !extrap.is_looping() {
            error!(mode = ?extrap.mode, "non-loop extrapolation reached the loop branch");
            return;
        }

        let first = self.knots.first().unwrap();
        let last = self.knots.last().unwrap();
        let knot_span = self.last_time - self.first_time;

        let value_offset = if extrap.mode == ExtrapMode::LoopRepeat {
            last.value - first.value
        } else {
            0.0
        };
        let oscillate = extrap.mode == ExtrapMode::LoopOscillate;

        let min_time = region.min();
        let max_time = region.max();

        // The entire timeline divides into knot_span sized iterations;
        // iteration 0 is the span containing the knots themselves.
        // Determine which iterations we're asked to sample, rounding tiny
        // fractional iterations away at the boundaries.
        let time_tolerance = self.tolerance / self.time_scale;
        let min_iter = (min_time - self.first_time) / knot_span;
        let max_iter = (max_time - self.first_time) / knot_span;
        let iter_tolerance = time_tolerance / knot_span;

        let min_iter_num = (min_iter + iter_tolerance).floor() as i64;
        let max_iter_num = (max_iter - iter_tolerance).ceil() as i64;

        for iter_num in min_iter_num..max_iter_num {
            if iter_num == 0 {
                continue;
            }

            let reversed = oscillate && iter_num % 2 != 0;

            // Sample times for the span of this iteration.
            let first_iter_time = self.first_time + iter_num as f64 * knot_span;
            let last_iter_time = self.first_time + (iter_num + 1) as f64 * knot_span;

            let (knot_to_sample_scale, knot_to_sample_offset) = if reversed {
                (-1.0, self.last_time + first_iter_time)
            } else {
                (1.0, iter_num as f64 * knot_span)
            };
            let iter_value_offset = iter_num as f64 * value_offset;

            let iter_interval = Interval::closed(first_iter_time, last_iter_time);
            let sample_interval = *region & iter_interval;
            if reversed {
                self.sample_knots_reversed(
                    &sample_interval,
                    source,
                    knot_to_sample_scale,
                    knot_to_sample_offset,
                    iter_value_offset,
                    sink,
                );
            } else {
                self.sample_knots(
                    &sample_interval,
                    source,
                    knot_to_sample_scale,
                    knot_to_sample_offset,
                    iter_value_offset,
                    sink,
                );
            }
        }
    }

    /// Indices `i` such that the knot pairs `(i, i + 1)` cover
    /// `knot_interval`, as a half-open range.
    fn segment_range(&self, knot_interval: &Interval) -> (usize, usize) {
        let next_index = upper_bound(&self.times, knot_interval.min());
        let end_index = lower_bound(&self.times, knot_interval.max()).min(self.times.len() - 1);
        (next_index.saturating_sub(1), end_index)
    }

    fn sample_knots<K: SampleSink>(
        &self,
        sample_interval: &Interval,
        source: SampleSource,
        knot_to_sample_scale: f64,
        knot_to_sample_offset: f64,
        value_offset: f64,
        sink: &mut K,
    ) {
        // Shift the interval from sample to knot times and clamp any
        // rounding errors.  Forward sampling always has scale +1.
        let knot_interval = sample_interval.shifted(-knot_to_sample_offset)
            & Interval::closed(self.first_time, self.last_time);
        if knot_interval.is_empty() {
            return;
        }

        let (first_seg, end_seg) = self.segment_range(&knot_interval);
        for i in first_seg..end_seg {
            let segment_interval =
                Interval::closed(self.knots[i].time, self.knots[i + 1].time) & knot_interval;
            self.sample_segment(
                &self.knots[i],
                &self.knots[i + 1],
                &segment_interval,
                source,
                knot_to_sample_scale,
                knot_to_sample_offset,
                value_offset,
                sink,
            );
        }
    }

    // Used only for the backward iterations of oscillating extrapolation
    // loops; the sample interval fits within a single iteration.  The
    // knot walk runs in descending order so that the negated time map
    // still hands the sink ascending sample times.
    fn sample_knots_reversed<K: SampleSink>(
        &self,
        sample_interval: &Interval,
        source: SampleSource,
        knot_to_sample_scale: f64,
        knot_to_sample_offset: f64,
        value_offset: f64,
        sink: &mut K,
    ) {
        // The interval's maximum maps to the smallest sample time.
        let knot_interval = Interval::closed(
            to_knot_time(sample_interval.max(), knot_to_sample_scale, knot_to_sample_offset),
            to_knot_time(sample_interval.min(), knot_to_sample_scale, knot_to_sample_offset),
        ) & Interval::closed(self.first_time, self.last_time);
        if knot_interval.is_empty() {
            return;
        }

        let (first_seg, end_seg) = self.segment_range(&knot_interval);
        for i in (first_seg..end_seg).rev() {
            let segment_interval =
                Interval::closed(self.knots[i].time, self.knots[i + 1].time) & knot_interval;
            self.sample_segment(
                &self.knots[i],
                &self.knots[i + 1],
                &segment_interval,
                source,
                knot_to_sample_scale,
                knot_to_sample_offset,
                value_offset,
                sink,
            );
        }
    }

    /// Interpolate from `prev` to `next` over the knot-time
    /// `segment_interval` and store sample segments into the sink.
    #[allow(clippy::too_many_arguments)]
    fn sample_segment<K: SampleSink>(
        &self,
        prev: &KnotData,
        next: &KnotData,
        segment_interval: &Interval,
        source: SampleSource,
        knot_to_sample_scale: f64,
        knot_to_sample_offset: f64,
        value_offset: f64,
        sink: &mut K,
    ) {
        match prev.next_interp {
            // No value, nothing to do.
            InterpMode::ValueBlock => {}

            InterpMode::Curve => {
                // The segment is a curve that may need to be broken down.
                // Ensure it is not regressive first; the copies keep the
                // stored knots untouched.
                let mut prev = *prev;
                let mut next = *next;
                regressionpreventer::deregress_segment(&mut prev, &mut next);
                self.sample_curve_segment(
                    &prev,
                    &next,
                    segment_interval,
                    source,
                    knot_to_sample_scale,
                    knot_to_sample_offset,
                    value_offset,
                    sink,
                );
            }

            // A single straight line.
            InterpMode::Held | InterpMode::Linear => {
                let mut t1 = prev.time;
                let mut v1 = prev.value;
                let mut t2 = next.time;
                let mut v2 = if prev.next_interp == InterpMode::Held {
                    prev.value
                } else {
                    next.pre_value()
                };

                // Adjust for sampling just part of the segment.  Only lerp
                // when the value changes, to avoid rounding noise.
                let t = segment_interval.min();
                if t > t1 {
                    let u = (t - t1) / (t2 - t1);
                    t1 = t;
                    if v1 != v2 {
                        v1 = lerp(u, v1, v2);
                    }
                }
                let t = segment_interval.max();
                if t < t2 {
                    let u = (t - t1) / (t2 - t1);
                    t2 = t;
                    if v1 != v2 {
                        v2 = lerp(u, v1, v2);
                    }
                }

                sink.add_segment(
                    to_sample_time(t1, knot_to_sample_scale, knot_to_sample_offset),
                    v1 + value_offset,
                    to_sample_time(t2, knot_to_sample_scale, knot_to_sample_offset),
                    v2 + value_offset,
                    source,
                );
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn sample_curve_segment<K: SampleSink>(
        &self,
        prev: &KnotData,
        next: &KnotData,
        segment_interval: &Interval,
        source: SampleSource,
        knot_to_sample_scale: f64,
        knot_to_sample_offset: f64,
        value_offset: f64,
        sink: &mut K,
    ) {
        match prev.curve_type {
            CurveType::Bezier => {
                // The four Bezier control points.  Tangent widths are
                // non-negative; the heights carry the sign, and the pre
                // tangent's horizontal component points backward in time.
                let cp0 = Vector2::new(prev.time, prev.value);
                let cp3 = Vector2::new(next.time, next.value);
                let cp = [
                    cp0,
                    cp0 + Vector2::new(prev.post_tan_width, prev.post_tan_height()),
                    cp3 + Vector2::new(-next.pre_tan_width, next.pre_tan_height()),
                    cp3,
                ];
                self.sample_bezier(
                    &cp,
                    segment_interval,
                    source,
                    knot_to_sample_scale,
                    knot_to_sample_offset,
                    value_offset,
                    sink,
                );
            }
            CurveType::Hermite => {
                debug!(time = prev.time, "skipping unsupported Hermite segment");
            }
        }
    }

    // A Bezier curve lies within the bounds of its control points, so the
    // height of the control point "hull" above the cp0-cp3 baseline bounds
    // the error of approximating the curve by that baseline.  Heights are
    // measured in tolerance space, scaled by (time_scale, value_scale).
    // If the hull is too tall, split at u = 0.5 and recurse on the halves
    // that overlap the requested interval; each split shrinks the heights
    // by at least a factor of four, so the recursion depth is logarithmic
    // in the initial height over the tolerance.
    #[allow(clippy::too_many_arguments)]
    fn sample_bezier<K: SampleSink>(
        &self,
        cp: &[Vector2<f64>; 4],
        segment_interval: &Interval,
        source: SampleSource,
        knot_to_sample_scale: f64,
        knot_to_sample_offset: f64,
        value_offset: f64,
        sink: &mut K,
    ) {
        let scale_vec = Vector2::new(self.time_scale, self.value_scale);
        let base_vec = (cp[3] - cp[0]).component_mul(&scale_vec);
        let vec1 = (cp[1] - cp[0]).component_mul(&scale_vec);
        let vec2 = (cp[2] - cp[0]).component_mul(&scale_vec);

        // u1 * base_vec and u2 * base_vec are the projections of vec1 and
        // vec2 onto base_vec; what remains of each is its perpendicular
        // component, whose length is the height above the baseline.
        let len_squared = base_vec.norm_squared();
        let u1 = vec1.dot(&base_vec) / len_squared;
        let u2 = vec2.dot(&base_vec) / len_squared;
        let h1_squared = (vec1 - base_vec * u1).norm_squared();
        let h2_squared = (vec2 - base_vec * u2).norm_squared();

        if h1_squared.max(h2_squared) <= self.tolerance * self.tolerance {
            // Flat enough; the baseline approximates this part of the
            // curve.  Clip it to the requested interval.
            let mut t1 = cp[0].x;
            let mut v1 = cp[0].y;
            let mut t2 = cp[3].x;
            let mut v2 = cp[3].y;

            if t1 < segment_interval.min() {
                let u = (segment_interval.min() - t1) / (t2 - t1);
                t1 = lerp(u, t1, t2);
                v1 = lerp(u, v1, v2);
            }
            if t2 > segment_interval.max() {
                let u = (segment_interval.max() - t1) / (t2 - t1);
                t2 = lerp(u, t1, t2);
                v2 = lerp(u, v1, v2);
            }

            sink.add_segment(
                to_sample_time(t1, knot_to_sample_scale, knot_to_sample_offset),
                v1 + value_offset,
                to_sample_time(t2, knot_to_sample_scale, knot_to_sample_offset),
                v2 + value_offset,
                source,
            );
        } else {
            let (left, right) = subdivide_bezier(cp, 0.5);
            let do_left = segment_interval.contains(left[0].x)
                || segment_interval.contains(left[3].x);
            let do_right = segment_interval.contains(right[0].x)
                || segment_interval.contains(right[3].x);

            // Under a negative time scale (oscillating loops) the right
            // half lands earlier in sample time, so emit it first.
            let halves = if knot_to_sample_scale < 0.0 {
                [(do_right, &right), (do_left, &left)]
            } else {
                [(do_left, &left), (do_right, &right)]
            };
            for (overlaps, half) in halves {
                if overlaps {
                    self.sample_bezier(
                        half,
                        segment_interval,
                        source,
                        knot_to_sample_scale,
                        knot_to_sample_offset,
                        value_offset,
                        sink,
                    );
                }
            }
        }
    }
}

/// Split a cubic Bezier at parameter `u` with de Casteljau's algorithm,
/// returning the control points of the left and right halves.
fn subdivide_bezier(
    cp: &[Vector2<f64>; 4],
    u: f64,
) -> ([Vector2<f64>; 4], [Vector2<f64>; 4]) {
    let cp01 = cp[0].lerp(&cp[1], u);
    let cp12 = cp[1].lerp(&cp[2], u);
    let cp23 = cp[2].lerp(&cp[3], u);

    let cp012 = cp01.lerp(&cp12, u);
    let cp123 = cp12.lerp(&cp23, u);

    let cp0123 = cp012.lerp(&cp123, u);

    (
        [cp[0], cp01, cp012, cp0123],
        [cp0123, cp123, cp23, cp[3]],
    )
}

// Bake the inner loops into flat knot and time arrays covering the region
// where sampling will occur.
//
// The looped interval is closed; its end carries a copy of the knot at the
// prototype start, which overrules any authored knot at that time.  There
// is a fencepost here: one more copy of the first prototype knot than
// there are iterations, because a copy sits at both ends of the looped
// range.
#[allow(clippy::too_many_arguments)]
fn unroll_inner_loops(
    data: &SplineData,
    time_interval: &Interval,
    first_proto_index: usize,
    first_inner_loop: f64,
    last_inner_loop: f64,
    first_inner_proto: f64,
    last_inner_proto: f64,
    have_extrap_loops: bool,
) -> (Vec<f64>, Vec<KnotData>) {
    let mut looped = Interval::closed(first_inner_loop, last_inner_loop);
    if have_extrap_loops {
        // With extrapolation looping, sampling can wrap around past the
        // edge knots, so only narrow the unrolled region when the request
        // lies entirely inside it.
        if looped.contains_interval(time_interval) {
            looped = *time_interval;
        }
    } else {
        // Only unroll the knots that affect the request.
        looped = looped & *time_interval;
    }

    let times = data.times();
    let knots = data.knots();
    let lp = &data.loop_params;

    // The slice of authored knots that can affect the request: from the
    // last knot at or before the request start, through the knot that
    // closes the segment containing the request end.
    let mut pre_begin = lower_bound(times, time_interval.min());
    if (pre_begin == times.len() || times[pre_begin] > time_interval.min()) && pre_begin != 0 {
        pre_begin -= 1;
    }
    let mut post_end = pre_begin + upper_bound(&times[pre_begin..], time_interval.max());
    if post_end < times.len() {
        post_end += 1;
    }

    if looped.is_empty() {
        // Even though there are inner loops, we're not interested in that
        // portion of the spline.
        return (
            times[pre_begin..post_end].to_vec(),
            knots[pre_begin..post_end].to_vec(),
        );
    }

    let pre_end = pre_begin + lower_bound(&times[pre_begin..], first_inner_loop);
    let proto_begin = pre_end + lower_bound(&times[pre_end..], first_inner_proto);
    let proto_end = proto_begin + lower_bound(&times[proto_begin..], last_inner_proto);
    // The post-loop knots start after the start-knot copy that sits at the
    // looped interval's end; anything at or before that time is ignored.
    let post_begin = proto_end + upper_bound(&times[proto_end..], last_inner_loop);
    let post_len = post_end.saturating_sub(post_begin);

    let proto_span = lp.proto_end - lp.proto_start;

    // Iterations needed to cover the (possibly narrowed) looped interval;
    // these can be fewer than the declared loop counts.
    let pre_loops = (((first_inner_proto - looped.min()) / proto_span).ceil() as i64).max(0);
    let post_loops = (((looped.max() - last_inner_proto) / proto_span).ceil() as i64).max(0);

    // Count the knots to allocate exactly once.
    let count = (pre_end - pre_begin)
        + (proto_end - proto_begin) * (pre_loops + 1 + post_loops) as usize
        + 1
        + post_len;
    let mut internal_times = Vec::with_capacity(count);
    let mut internal_knots = Vec::with_capacity(count);

    // Knots from before looping starts are copied verbatim.
    internal_times.extend_from_slice(&times[pre_begin..pre_end]);
    internal_knots.extend_from_slice(&knots[pre_begin..pre_end]);

    // Prototype copies, with shifted times and values.
    for loop_index in -pre_loops..=post_loops {
        let time_offset = proto_span * loop_index as f64;
        let value_offset = lp.value_offset * loop_index as f64;
        for i in proto_begin..proto_end {
            internal_times.push(times[i] + time_offset);
            let mut knot = knots[i];
            knot.time += time_offset;
            knot.value += value_offset;
            knot.pre_value += value_offset;
            internal_knots.push(knot);
        }
    }

    // One last copy of the first prototype knot closes the looped range.
    let time_offset = proto_span * (post_loops + 1) as f64;
    let value_offset = lp.value_offset * (post_loops + 1) as f64;
    internal_times.push(times[first_proto_index] + time_offset);
    let mut end_knot = knots[first_proto_index];
    end_knot.time += time_offset;
    end_knot.value += value_offset;
    end_knot.pre_value += value_offset;
    internal_knots.push(end_knot);

    // Knots from after looping ends.
    if post_len > 0 {
        internal_times.extend_from_slice(&times[post_begin..post_end]);
        internal_knots.extend_from_slice(&knots[post_begin..post_end]);
    }

    (internal_times, internal_knots)
}
