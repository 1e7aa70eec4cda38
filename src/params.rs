//! # Tracking parameters
//!
//! This module defines the [`TrackParams`] configuration struct and its
//! builder, which control every tunable stage of the pipeline: object
//! detection (`minpix`, `connectivity`), day-to-day linking (`alpha`,
//! `cut_off`), spatial-temporal normalisation (`resolution`, `n_phases`,
//! `earth_radius`), and composite reduction (`composite_method`).
//!
//! ## Pipeline overview
//!
//! 1. **Day labelling** — connected components of each daily mask are
//!    extracted under `connectivity` and filtered by `minpix`.
//!
//! 2. **Tracking** — objects are linked across consecutive days whenever
//!    their overlap ratio reaches `alpha`; `cut_off` optionally drops
//!    short-lived tracks from the final archive.
//!
//! 3. **Normalisation** — each track is projected onto a polar grid of
//!    `resolution × resolution` cells and resampled onto `n_phases`
//!    lifecycle phases, with geodesic distances computed on a sphere of
//!    radius `earth_radius` km.
//!
//! 4. **Composite reduction** — normalised tensors are aggregated across
//!    tracks with `composite_method`.
//!
//! ## Example
//!
//! ```rust
//! use tethys::params::TrackParams;
//!
//! let params = TrackParams::builder()
//!     .minpix(25)
//!     .alpha(0.6)
//!     .cut_off(5)
//!     .resolution(40)
//!     .build()
//!     .unwrap();
//! ```
use std::fmt;

use crate::composite::CompositeMethod;
use crate::constants::{Kilometer, EARTH_RADIUS_KM};
use crate::tethys_errors::TethysError;

/// Neighbourhood used by the connected-component labeller.
///
/// `Eight` (the default) includes diagonals; `Four` restricts adjacency to
/// the cardinal offsets. The choice applies to both the per-day labeller
/// and the in-plane part of the stacked 3-D mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Four,
    Eight,
}

impl Connectivity {
    /// The compass offsets spanned by this neighbourhood.
    pub fn offsets(&self) -> &'static [(i64, i64)] {
        const FOUR: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        const EIGHT: [(i64, i64); 8] = [
            (-1, -1),
            (-1, 0),
            (-1, 1),
            (0, -1),
            (0, 1),
            (1, -1),
            (1, 0),
            (1, 1),
        ];
        match self {
            Connectivity::Four => &FOUR,
            Connectivity::Eight => &EIGHT,
        }
    }
}

/// Configuration parameters for the full labelling → tracking →
/// normalisation → composite pipeline.
///
/// Fields
/// -----------------
/// **Detection**
/// * `minpix` – smallest cell count an object may have to be emitted.
///   Applied strictly after cross-face merging (and to the total 3-D
///   component size in stacked mode).
/// * `connectivity` – 4- or 8-neighbour adjacency for labelling.
/// * `morph_radius` – radius of the close-then-open filter applied per
///   time slice in stacked mode, counted in dilation passes of the
///   configured connectivity; 0 disables the filter.
///
/// **Tracking**
/// * `alpha` – overlap threshold in [0, 1] for continuation and split
///   decisions. The overlap ratio is `|A ∩ B| / min(|A|, |B|)`.
/// * `cut_off` – optional minimum duration (days); shorter tracks are
///   dropped by the post-hoc archive filter. `None` disables the filter.
///
/// **Normalisation**
/// * `resolution` – polar grid resolution R (radial and angular bins).
/// * `n_phases` – lifecycle phase count P.
/// * `earth_radius` – geodesic sphere radius in kilometers.
///
/// **Composite**
/// * `composite_method` – aggregate applied across tracks.
///
/// Defaults
/// -----------------
/// ```rust
/// use tethys::params::TrackParams;
/// let params = TrackParams::default();
/// assert_eq!(params.minpix, 10);
/// assert_eq!(params.alpha, 0.5);
/// assert_eq!(params.resolution, 50);
/// assert_eq!(params.n_phases, 5);
/// ```
///
/// See also
/// ------------
/// * [`TrackParamsBuilder`] – Fluent construction with validation.
/// * [`crate::labelling::day_labeller::label_day`] – Consumes the detection half.
/// * [`crate::tracking::tracker::Tracker`] – Consumes the tracking half.
/// * [`crate::normalise::normaliser::normalise_tracks`] – Consumes the normalisation half.
#[derive(Debug, Clone)]
pub struct TrackParams {
    // --- Detection ---
    pub minpix: usize,
    pub connectivity: Connectivity,
    pub morph_radius: usize,

    // --- Tracking ---
    pub alpha: f64,
    pub cut_off: Option<usize>,

    // --- Normalisation ---
    pub resolution: usize,
    pub n_phases: usize,
    pub earth_radius: Kilometer,

    // --- Composite ---
    pub composite_method: CompositeMethod,
}

impl TrackParams {
    /// Construct a new [`TrackParams`] with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`TrackParamsBuilder`] to configure custom parameters.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tethys::params::TrackParams;
    /// use tethys::composite::CompositeMethod;
    ///
    /// let params = TrackParams::builder()
    ///     .alpha(0.35)
    ///     .n_phases(10)
    ///     .composite_method(CompositeMethod::Median)
    ///     .build()
    ///     .unwrap();
    /// ```
    pub fn builder() -> TrackParamsBuilder {
        TrackParamsBuilder::new()
    }
}

impl Default for TrackParams {
    fn default() -> Self {
        TrackParams {
            minpix: 10,
            connectivity: Connectivity::Eight,
            morph_radius: 0,

            alpha: 0.5,
            cut_off: None,

            resolution: 50,
            n_phases: 5,
            earth_radius: EARTH_RADIUS_KM,

            composite_method: CompositeMethod::Mean,
        }
    }
}

/// Builder for [`TrackParams`], with validation.
#[derive(Debug, Clone)]
pub struct TrackParamsBuilder {
    params: TrackParams,
}

impl Default for TrackParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackParamsBuilder {
    /// Create a new builder initialized with default values.
    pub fn new() -> Self {
        Self {
            params: TrackParams::default(),
        }
    }

    // --- Detection ---
    pub fn minpix(mut self, v: usize) -> Self {
        self.params.minpix = v;
        self
    }
    pub fn connectivity(mut self, v: Connectivity) -> Self {
        self.params.connectivity = v;
        self
    }
    pub fn morph_radius(mut self, v: usize) -> Self {
        self.params.morph_radius = v;
        self
    }

    // --- Tracking ---
    pub fn alpha(mut self, v: f64) -> Self {
        self.params.alpha = v;
        self
    }
    pub fn cut_off(mut self, v: usize) -> Self {
        self.params.cut_off = Some(v);
        self
    }
    pub fn no_cut_off(mut self) -> Self {
        self.params.cut_off = None;
        self
    }

    // --- Normalisation ---
    pub fn resolution(mut self, v: usize) -> Self {
        self.params.resolution = v;
        self
    }
    pub fn n_phases(mut self, v: usize) -> Self {
        self.params.n_phases = v;
        self
    }
    pub fn earth_radius(mut self, v: Kilometer) -> Self {
        self.params.earth_radius = v;
        self
    }

    // --- Composite ---
    pub fn composite_method(mut self, v: CompositeMethod) -> Self {
        self.params.composite_method = v;
        self
    }

    /// Return true iff x is finite and inside [lo, hi].
    #[inline]
    fn in_range(x: f64, lo: f64, hi: f64) -> bool {
        x.is_finite() && x >= lo && x <= hi
    }

    /// Finalize the builder and produce a [`TrackParams`] instance.
    ///
    /// Validation rules
    /// -----------------
    /// * `minpix >= 1` – an object must contain at least one cell.
    /// * `alpha ∈ [0, 1]` and finite – overlap ratios live in [0, 1].
    /// * `cut_off >= 1` when set.
    /// * `resolution >= 2` – the radial coordinate divides by `R - 1`.
    /// * `n_phases >= 1`.
    /// * `earth_radius > 0` and finite.
    ///
    /// Return
    /// ------
    /// * `Ok(TrackParams)` if all values are valid.
    /// * `Err(TethysError::ParameterOutOfRange)` otherwise.
    pub fn build(self) -> Result<TrackParams, TethysError> {
        let p = &self.params;

        if p.minpix < 1 {
            return Err(TethysError::ParameterOutOfRange(
                "minpix must be >= 1".into(),
            ));
        }
        if !Self::in_range(p.alpha, 0.0, 1.0) {
            return Err(TethysError::ParameterOutOfRange(
                "alpha must be in [0, 1]".into(),
            ));
        }
        if let Some(cut_off) = p.cut_off {
            if cut_off < 1 {
                return Err(TethysError::ParameterOutOfRange(
                    "cut_off must be >= 1 when set".into(),
                ));
            }
        }
        if p.resolution < 2 {
            return Err(TethysError::ParameterOutOfRange(
                "resolution must be >= 2".into(),
            ));
        }
        if p.n_phases < 1 {
            return Err(TethysError::ParameterOutOfRange(
                "n_phases must be >= 1".into(),
            ));
        }
        if !(p.earth_radius.is_finite() && p.earth_radius > 0.0) {
            return Err(TethysError::ParameterOutOfRange(
                "earth_radius must be > 0".into(),
            ));
        }

        Ok(self.params)
    }
}

impl fmt::Display for TrackParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            const PARAM_COL: usize = 40; // width reserved for "name = value"
            writeln!(f, "Extreme-event tracking parameters")?;
            writeln!(f, "---------------------------------")?;

            macro_rules! line {
                ($fmt:expr, $val:expr, $comment:expr) => {{
                    let s = format!($fmt, $val);
                    let pad = if s.len() < PARAM_COL {
                        " ".repeat(PARAM_COL - s.len())
                    } else {
                        " ".to_string()
                    };
                    writeln!(f, "  {}{}# {}", s, pad, $comment)
                }};
            }

            writeln!(f, "[Detection]")?;
            line!("minpix        = {}", self.minpix, "Minimum object size (cells)")?;
            line!(
                "connectivity  = {:?}",
                self.connectivity,
                "Labelling neighbourhood"
            )?;
            line!(
                "morph_radius  = {}",
                self.morph_radius,
                "Close-then-open radius (stacked mode)"
            )?;

            writeln!(f, "\n[Tracking]")?;
            line!("alpha         = {:.3}", self.alpha, "Overlap threshold")?;
            match self.cut_off {
                Some(c) => line!("cut_off       = {} d", c, "Minimum track duration")?,
                None => line!("cut_off       = {}", "disabled", "Minimum track duration")?,
            }

            writeln!(f, "\n[Normalisation]")?;
            line!("resolution    = {}", self.resolution, "Polar grid resolution R")?;
            line!("n_phases      = {}", self.n_phases, "Lifecycle phase count P")?;
            line!(
                "earth_radius  = {:.1} km",
                self.earth_radius,
                "Geodesic sphere radius"
            )?;

            writeln!(f, "\n[Composite]")?;
            line!(
                "method        = {:?}",
                self.composite_method,
                "Aggregate across tracks"
            )?;

            Ok(())
        } else {
            write!(
                f,
                "TrackParams(minpix={}, connectivity={:?}, alpha={:.2}, cut_off={:?}, R={}, P={}, earth_radius={:.1}km, method={:?})",
                self.minpix,
                self.connectivity,
                self.alpha,
                self.cut_off,
                self.resolution,
                self.n_phases,
                self.earth_radius,
                self.composite_method,
            )
        }
    }
}
