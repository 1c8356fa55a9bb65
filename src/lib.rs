pub mod math;
pub mod heads;
pub mod metrics;
pub mod loss;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use math::softmax::{RowNormalizer, Softmax};
pub use heads::{AccuracyParams, HeadConfig, HeadError, PropagateDown, SoftmaxLossParams};
pub use metrics::accuracy::MultiClassAccuracy;
pub use loss::multi_softmax::MultiClassifierSoftmaxLoss;
