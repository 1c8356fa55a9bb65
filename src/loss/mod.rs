pub mod multi_softmax;

pub use multi_softmax::MultiClassifierSoftmaxLoss;
