use crate::heads::{canonical_axis, AccuracyParams, HeadConfig, HeadError, PropagateDown};
use crate::math::matrix::Matrix;

/// Top-1 accuracy over a packed multi-head prediction tensor.
///
/// The prediction tensor is (N, num_classifiers × num_classes): each example
/// row is the concatenation of every classifier's raw score block. The label
/// tensor is (N, num_classifiers). `forward` reports one accuracy in [0, 1]
/// per classifier.
///
/// This is an evaluation-only metric: it has no backward pass and must never
/// be used as a loss function.
pub struct MultiClassAccuracy {
    config: HeadConfig,
    top_k: usize,
}

impl MultiClassAccuracy {
    /// Sets up the metric from the prediction-axis and label-axis extents
    /// with default parameters (feature axis, top_k = 1).
    pub fn new(pred_extent: usize, label_extent: usize) -> Result<MultiClassAccuracy, HeadError> {
        MultiClassAccuracy::from_params(&AccuracyParams::default(), pred_extent, label_extent)
    }

    /// Sets up the metric from explicit parameters. Fails if the extents do
    /// not divide evenly, if the axis selector does not name the feature
    /// axis, or if `top_k` exceeds the derived number of classes.
    pub fn from_params(
        params: &AccuracyParams,
        pred_extent: usize,
        label_extent: usize,
    ) -> Result<MultiClassAccuracy, HeadError> {
        canonical_axis(params.axis)?;
        let config = HeadConfig::derive(pred_extent, label_extent)?;
        if params.top_k > config.num_classes {
            return Err(HeadError::TopKTooLarge {
                top_k: params.top_k,
                num_classes: config.num_classes,
            });
        }
        Ok(MultiClassAccuracy { config, top_k: params.top_k })
    }

    /// Re-derives the configuration after an input shape change. The output
    /// length becomes the new `num_classifiers`; `top_k` is re-validated
    /// against the new class count.
    pub fn reshape(&mut self, pred_extent: usize, label_extent: usize) -> Result<(), HeadError> {
        let config = HeadConfig::derive(pred_extent, label_extent)?;
        if self.top_k > config.num_classes {
            return Err(HeadError::TopKTooLarge {
                top_k: self.top_k,
                num_classes: config.num_classes,
            });
        }
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &HeadConfig {
        &self.config
    }

    /// Computes per-classifier top-1 accuracy over the batch.
    ///
    /// For every (example, classifier) pair the arg-max of the classifier's
    /// score block is compared against the label; ties resolve to the lowest
    /// index. Returns `correct / N` per classifier. The caller must supply a
    /// non-empty batch (N > 0), otherwise the result is NaN.
    ///
    /// Pure with respect to its inputs; no state is retained across calls.
    pub fn forward(&self, predictions: &Matrix, labels: &Matrix) -> Vec<f64> {
        assert_eq!(
            predictions.cols,
            self.config.num_classes * self.config.num_classifiers,
            "prediction width does not match configured shape; call reshape()"
        );
        assert_eq!(
            labels.cols, self.config.num_classifiers,
            "label width does not match configured shape; call reshape()"
        );
        assert_eq!(predictions.rows, labels.rows, "batch sizes differ");

        let mut correct_predictions = vec![0.0; self.config.num_classifiers];

        for n in 0..predictions.rows {
            let example_row = predictions.row(n);
            for classifier_id in 0..self.config.num_classifiers {
                let label_value = self.config.label_at(labels, n, classifier_id);
                let scores = self.config.head_slice(example_row, classifier_id);
                if arg_max(scores) == label_value {
                    correct_predictions[classifier_id] += 1.0;
                }
            }
        }

        let batch = predictions.rows as f64;
        correct_predictions.iter().map(|c| c / batch).collect()
    }

    /// An accuracy metric cannot be used as a loss function.
    ///
    /// # Panics
    /// Panics if gradient propagation is requested towards either input.
    pub fn backward(&self, propagate: PropagateDown) {
        if propagate.predictions || propagate.labels {
            panic!("MultiClassAccuracy cannot backpropagate; it is not a loss function");
        }
    }
}

/// Index of the maximum value; the first maximum wins on ties.
fn arg_max(scores: &[f64]) -> usize {
    let mut max_id = 0;
    let mut max_value = f64::NEG_INFINITY;
    for (id, &value) in scores.iter().enumerate() {
        if value > max_value {
            max_value = value;
            max_id = id;
        }
    }
    max_id
}
