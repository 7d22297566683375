//! Shared numeric and textual constants.

/// Nominal extrusion width handed to renderers as the line thickness.
pub const DEFAULT_PATH_WIDTH: f64 = 0.4;

/// Layer height assumed when a model has no positive Z step to infer from.
pub const DEFAULT_LAYER_STEP: f64 = 0.2;

/// Fractional digits kept when bucketing Z steps in the histogram.
pub const DEFAULT_STEP_PRECISION_DIGITS: u32 = 2;

/// Upper bound for configurable step precision.
pub const MAX_STEP_PRECISION_DIGITS: u32 = 6;

/// Amount subtracted from the layer step to form the current-layer band.
pub const DEFAULT_CURRENT_LAYER_SLACK: f64 = 0.05;

/// First character of the command family the decoder recognises.
pub const DEFAULT_FAMILY_PREFIX: char = 'G';

/// Value assigned to a word written without digits, e.g. the `X` in `G28 X`.
pub const BARE_WORD_VALUE: f64 = 1.0;

/// Height difference below which two Z values address the same layer.
pub const HEIGHT_TOLERANCE: f64 = 1e-6;
