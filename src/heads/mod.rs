pub mod config;
pub mod params;

pub use config::{canonical_axis, HeadConfig, HeadError};
pub use params::{AccuracyParams, SoftmaxLossParams};

/// Which of a layer's two inputs gradient is requested for.
///
/// Mirrors the training loop's per-input propagation flags: predictions may
/// receive a gradient, labels never can.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropagateDown {
    pub predictions: bool,
    pub labels: bool,
}

impl PropagateDown {
    pub fn predictions_only() -> PropagateDown {
        PropagateDown { predictions: true, labels: false }
    }

    pub fn none() -> PropagateDown {
        PropagateDown { predictions: false, labels: false }
    }
}
