/*!
Keyframed animation splines and adaptive sampling.

A [`SplineData`] is a sequence of knots ([`KnotData`]) with per-segment
interpolation (held, linear, or cubic Bezier), dual values for stepped
keys, extrapolation rules beyond the edge knots (including repeating,
resetting, and oscillating loops), and an optional inner loop that echoes
a prototype range of knots.

The [`sample`] function converts such a spline into piecewise-linear
polylines that approximate the curve to within a caller-supplied tolerance
in screen space: curved segments are subdivided adaptively, looped regions
are materialized as if their knots were authored, and each polyline is
tagged with the region of the spline it came from ([`SampleSource`]) when
sampled through [`SplineSamplesWithSources`].

```
use keyspline::{sample, Interval, KnotData, InterpMode, SplineData, SplineSamples};

let mut data = SplineData::new();
data.push_knot(KnotData {
    time: 0.0,
    value: 0.0,
    next_interp: InterpMode::Linear,
    ..Default::default()
})?;
data.push_knot(KnotData {
    time: 1.0,
    value: 2.0,
    ..Default::default()
})?;

let mut samples = SplineSamples::<f64>::new();
sample(&data, Interval::closed(0.0, 1.0), 100.0, 100.0, 1.0, &mut samples)?;
assert_eq!(samples.polylines.len(), 1);
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/

mod interval;
mod knotdata;
mod regressionpreventer;
mod sample;
mod splinedata;
mod types;
pub mod utilities;

pub use crate::interval::Interval;
pub use crate::knotdata::KnotData;
pub use crate::sample::{sample, SampleError};
pub use crate::splinedata::{SplineData, SplineDataError};
pub use crate::types::{
    CurveType, ExtrapMode, Extrapolation, InterpMode, LoopParams, Polyline, SampleScalar,
    SampleSink, SampleSource, SplineSamples, SplineSamplesWithSources, Vertex,
};
