use std::fmt::Debug;

use half::f16;
use nalgebra::Vector2;

use crate::interval::Interval;

// ** NOTE TO MAINTAINERS **
//
// The explicit discriminants below are used in the binary file format.
// Do not change them; only add.

/// Interpolation mode for a spline segment (region between two knots).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpMode {
    /// No value in this segment.
    ValueBlock = 0,
    /// Constant value in this segment.
    #[default]
    Held = 1,
    /// Linear interpolation.
    Linear = 2,
    /// Bezier or Hermite, depends on curve type.
    Curve = 3,
}

/// Type of interpolation for a spline's `Curve` segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurveType {
    /// Bezier curve, free tangent widths.
    #[default]
    Bezier = 0,
    /// Hermite curve, like Bezier but fixed tangent width.  Reserved;
    /// Hermite segments are not sampled yet.
    Hermite = 1,
}

/// Curve-shaping mode for one of a spline's extrapolation regions (before
/// all knots and after all knots).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtrapMode {
    /// No value in this region.
    ValueBlock = 0,
    /// Constant value in this region.
    #[default]
    Held = 1,
    /// Linear interpolation based on edge knots.
    Linear = 2,
    /// Linear interpolation with specified slope.
    Sloped = 3,
    /// Knot curve repeated, offset so ends meet.
    LoopRepeat = 4,
    /// Curve repeated exactly, discontinuous joins.
    LoopReset = 5,
    /// Like Reset, but every other copy reversed.
    LoopOscillate = 6,
}

/// The source for a particular part of a sampled spline.
///
/// The source is not important to the values that vary over time, but if
/// the spline is sampled and displayed in a user interface, the source can
/// be used to highlight different regions of the displayed spline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleSource {
    /// Extrapolation before the first knot.
    PreExtrap = 0,
    /// Looped extrapolation before the first knot.
    PreExtrapLoop = 1,
    /// Echoed copy of an inner loop prototype.
    InnerLoopPreEcho = 2,
    /// The inner loop prototype itself.
    InnerLoopProto = 3,
    /// Echoed copy of an inner loop prototype.
    InnerLoopPostEcho = 4,
    /// "Normal" knot interpolation.
    KnotInterp = 5,
    /// Extrapolation after the last knot.
    PostExtrap = 6,
    /// Looped extrapolation after the last knot.
    PostExtrapLoop = 7,
}

/// Extrapolation parameters for the ends of a spline beyond the knots.
///
/// `slope` is meaningful only in `Sloped` mode and is ignored by
/// comparisons otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct Extrapolation {
    pub mode: ExtrapMode,
    pub slope: f64,
}

impl Extrapolation {
    pub fn new(mode: ExtrapMode) -> Extrapolation {
        Extrapolation { mode, slope: 0.0 }
    }

    pub fn sloped(slope: f64) -> Extrapolation {
        Extrapolation {
            mode: ExtrapMode::Sloped,
            slope,
        }
    }

    /// Whether our mode is one of the looping extrapolation modes.
    pub fn is_looping(&self) -> bool {
        matches!(
            self.mode,
            ExtrapMode::LoopRepeat | ExtrapMode::LoopReset | ExtrapMode::LoopOscillate
        )
    }
}

impl PartialEq for Extrapolation {
    fn eq(&self, other: &Extrapolation) -> bool {
        self.mode == other.mode && (self.mode != ExtrapMode::Sloped || self.slope == other.slope)
    }
}

/// Inner-loop parameters.
///
/// At most one inner-loop region can be specified per spline.  Only whole
/// numbers of pre- and post-iterations are supported.  The value offset
/// specifies the difference between the values at the starts of
/// consecutive iterations.
///
/// There must always be a knot at the `proto_start` time; otherwise the
/// loop parameters are invalid and will be ignored.  When
/// `proto_end <= proto_start`, inner looping is disabled.
///
/// A copy of the start knot is always made at the end of the prototype
/// region, even if there is no post-looping; this sets up for continuity
/// at loop joins.  Any knots authored in the pre-looped or post-looped
/// intervals are removed from consideration, though they remain in the
/// spline parameters.
///
/// Negative numbers of loops are not meaningful; they are treated the same
/// as zero counts.  These quantities are signed only so that accidental
/// underflow does not result in huge loop counts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoopParams {
    pub proto_start: f64,
    pub proto_end: f64,
    pub num_pre_loops: i32,
    pub num_post_loops: i32,
    pub value_offset: f64,
}

impl LoopParams {
    /// The prototype region, `[proto_start, proto_end)`.
    pub fn prototype_interval(&self) -> Interval {
        Interval::half_open(self.proto_start, self.proto_end)
    }

    /// The union of the prototype region and the echo region(s).
    pub fn looped_interval(&self) -> Interval {
        let proto_span = self.proto_end - self.proto_start;
        Interval::closed(
            self.proto_start - f64::from(self.num_pre_loops.max(0)) * proto_span,
            self.proto_end + f64::from(self.num_post_loops.max(0)) * proto_span,
        )
    }
}

/// A scalar type that sampled vertices can be stored in.
///
/// Sampling computes in `f64` and converts at the point of emission.
/// Note that you may have precision or overflow issues with [`f16`].
pub trait SampleScalar: Copy + PartialEq + Debug + 'static {
    fn from_f64(value: f64) -> Self;
}

impl SampleScalar for f64 {
    fn from_f64(value: f64) -> Self {
        value
    }
}

impl SampleScalar for f32 {
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl SampleScalar for f16 {
    fn from_f64(value: f64) -> Self {
        f16::from_f64(value)
    }
}

/// A `(time, value)` sample vertex.
pub type Vertex<S> = Vector2<S>;

/// One run of connected sample vertices.
pub type Polyline<S> = Vec<Vertex<S>>;

/// Receiver for sampled line segments.
///
/// The sampler hands every approximating segment to `add_segment` in
/// non-decreasing sample time; implementations decide how segments are
/// coalesced into polylines.
pub trait SampleSink {
    /// Accept the segment from `(t0, v0)` to `(t1, v1)`.  Implementations
    /// must normalize the endpoint order so that emitted vertices ascend
    /// in time.
    fn add_segment(&mut self, t0: f64, v0: f64, t1: f64, v1: f64, source: SampleSource);

    /// Drop any previously collected samples.
    fn clear(&mut self);
}

/// A collection of piecewise-linear polylines approximating a spline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplineSamples<S: SampleScalar> {
    pub polylines: Vec<Polyline<S>>,
}

impl<S: SampleScalar> SplineSamples<S> {
    pub fn new() -> SplineSamples<S> {
        SplineSamples {
            polylines: Vec::new(),
        }
    }
}

impl<S: SampleScalar> SampleSink for SplineSamples<S> {
    fn add_segment(&mut self, mut t0: f64, mut v0: f64, mut t1: f64, mut v1: f64,
                   _source: SampleSource) {
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
            std::mem::swap(&mut v0, &mut v1);
        }

        let vertex0 = Vertex::new(S::from_f64(t0), S::from_f64(v0));
        let vertex1 = Vertex::new(S::from_f64(t1), S::from_f64(v1));

        match self.polylines.last_mut() {
            // The segment continues the last polyline.
            Some(polyline) if polyline.last() == Some(&vertex0) => polyline.push(vertex1),
            _ => self.polylines.push(vec![vertex0, vertex1]),
        }
    }

    fn clear(&mut self) {
        self.polylines.clear();
    }
}

/// Like [`SplineSamples`], but also records which region of the spline
/// each polyline came from.
///
/// `polylines` and `sources` are parallel vectors: the source for
/// `polylines[i]` is `sources[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplineSamplesWithSources<S: SampleScalar> {
    pub polylines: Vec<Polyline<S>>,
    pub sources: Vec<SampleSource>,
}

impl<S: SampleScalar> SplineSamplesWithSources<S> {
    pub fn new() -> SplineSamplesWithSources<S> {
        SplineSamplesWithSources {
            polylines: Vec::new(),
            sources: Vec::new(),
        }
    }
}

impl<S: SampleScalar> SampleSink for SplineSamplesWithSources<S> {
    fn add_segment(&mut self, mut t0: f64, mut v0: f64, mut t1: f64, mut v1: f64,
                   source: SampleSource) {
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
            std::mem::swap(&mut v0, &mut v1);
        }

        let vertex0 = Vertex::new(S::from_f64(t0), S::from_f64(v0));
        let vertex1 = Vertex::new(S::from_f64(t1), S::from_f64(v1));

        let continues = self.sources.last() == Some(&source)
            && self
                .polylines
                .last()
                .and_then(|polyline| polyline.last())
                == Some(&vertex0);
        if continues {
            self.polylines.last_mut().unwrap().push(vertex1);
        } else {
            self.polylines.push(vec![vertex0, vertex1]);
            self.sources.push(source);
        }
    }

    fn clear(&mut self) {
        self.polylines.clear();
        self.sources.clear();
    }
}
