use crate::heads::{canonical_axis, HeadConfig, HeadError, PropagateDown, SoftmaxLossParams};
use crate::math::matrix::Matrix;
use crate::math::softmax::{RowNormalizer, Softmax};

/// Softmax cross-entropy loss over a packed multi-head prediction tensor.
///
/// Predictions of shape (N, num_classifiers × num_classes) are treated as
/// N × num_classifiers independent score rows of num_classes values each.
/// Every row is softmax-normalized, the label's negative log-probability is
/// accumulated, and the sum is divided by the batch size N — not by
/// N × num_classifiers, so the scalar loss is the per-example total across
/// all classifiers averaged over the batch. The gradient scales the same
/// way; changing either side alone would break their correspondence.
///
/// One instance owns one probability buffer and is single-threaded: callers
/// that want parallel evaluation need one instance per thread. `backward`
/// consumes the probabilities computed by the immediately preceding
/// `forward`; the call order is forward, then at most one backward.
pub struct MultiClassifierSoftmaxLoss {
    config: HeadConfig,
    normalizer: Box<dyn RowNormalizer>,
    /// (N × num_classifiers, num_classes); fully overwritten by every
    /// forward call, never exposed.
    prob: Matrix,
    forward_ready: bool,
}

impl MultiClassifierSoftmaxLoss {
    /// Sets up the loss from the prediction-axis and label-axis extents,
    /// using the built-in numerically stable softmax.
    pub fn new(pred_extent: usize, label_extent: usize) -> Result<MultiClassifierSoftmaxLoss, HeadError> {
        MultiClassifierSoftmaxLoss::with_normalizer(pred_extent, label_extent, Box::new(Softmax))
    }

    /// Sets up the loss from explicit parameters.
    pub fn from_params(
        params: &SoftmaxLossParams,
        pred_extent: usize,
        label_extent: usize,
    ) -> Result<MultiClassifierSoftmaxLoss, HeadError> {
        canonical_axis(params.axis)?;
        MultiClassifierSoftmaxLoss::new(pred_extent, label_extent)
    }

    /// Sets up the loss with an injected row normalizer. The normalizer is
    /// assumed to produce probability rows (stable max-subtraction is its
    /// responsibility, not this layer's).
    pub fn with_normalizer(
        pred_extent: usize,
        label_extent: usize,
        normalizer: Box<dyn RowNormalizer>,
    ) -> Result<MultiClassifierSoftmaxLoss, HeadError> {
        let config = HeadConfig::derive(pred_extent, label_extent)?;
        Ok(MultiClassifierSoftmaxLoss {
            config,
            normalizer,
            prob: Matrix::default(),
            forward_ready: false,
        })
    }

    /// Sizes the internal probability buffer for the given input shapes,
    /// re-deriving num_classes/num_classifiers if the widths changed.
    ///
    /// Must be called before the first `forward` and again whenever any
    /// input shape changes; previously computed probabilities are
    /// invalidated. Fails if the widths do not divide evenly or if the label
    /// count does not equal the number of classifier-rows (exactly one label
    /// per classifier per example).
    pub fn reshape(
        &mut self,
        pred_rows: usize,
        pred_cols: usize,
        label_rows: usize,
        label_cols: usize,
    ) -> Result<(), HeadError> {
        let config = HeadConfig::derive(pred_cols, label_cols)?;
        let classifier_rows = pred_rows * pred_cols / config.num_classes;
        if classifier_rows != label_rows * label_cols {
            return Err(HeadError::CountMismatch {
                expected_labels: classifier_rows,
                actual_labels: label_rows * label_cols,
            });
        }
        self.config = config;
        self.prob = Matrix::zeros(classifier_rows, config.num_classes);
        self.forward_ready = false;
        Ok(())
    }

    pub fn config(&self) -> &HeadConfig {
        &self.config
    }

    /// Computes the scalar loss for one batch and refreshes the probability
    /// buffer that `backward` consumes.
    ///
    /// A probability of exactly zero is clamped to `f64::MIN_POSITIVE`
    /// before the log so a fully confident wrong prediction yields a large
    /// finite loss rather than infinity.
    pub fn forward(&mut self, predictions: &Matrix, labels: &Matrix) -> f64 {
        let classifier_rows = predictions.rows * self.config.num_classifiers;
        assert_eq!(
            self.prob.rows, classifier_rows,
            "input shape does not match configured shape; call reshape()"
        );
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

        // Unpack each example row into num_classifiers independent score
        // rows, then normalize them all in one pass.
        for n in 0..predictions.rows {
            for classifier_id in 0..self.config.num_classifiers {
                let r = self.config.flat_row(n, classifier_id);
                let scores = self.config.head_slice(predictions.row(n), classifier_id);
                self.prob.row_mut(r).copy_from_slice(scores);
            }
        }
        self.normalizer.normalize_rows(&mut self.prob);

        let mut loss = 0.0;
        for r in 0..classifier_rows {
            let (n, classifier_id) = self.config.unflatten(r);
            let label_value = self.config.label_at(labels, n, classifier_id);
            loss -= self.prob.data[r][label_value].max(f64::MIN_POSITIVE).ln();
        }

        self.forward_ready = true;
        // Normalized by batch size only; every classifier's contribution
        // stays in the sum.
        loss / predictions.rows as f64
    }

    /// Computes the gradient of the loss w.r.t. the packed predictions,
    /// scaled by the upstream gradient `loss_weight`.
    ///
    /// The combined softmax + cross-entropy gradient for one classifier row
    /// is `probability − one_hot(label)`; it is formed in place by
    /// subtracting 1 at each row's label index, repacked to the original
    /// (N, num_classifiers × num_classes) layout, and scaled by
    /// `loss_weight / N`. Returns `None` when no prediction gradient was
    /// requested.
    ///
    /// # Panics
    /// Panics if gradient w.r.t. labels is requested (labels are never
    /// differentiable), or if no `forward` with the current shapes precedes
    /// this call — backward consumes the forward pass's probabilities.
    pub fn backward(
        &mut self,
        labels: &Matrix,
        loss_weight: f64,
        propagate: PropagateDown,
    ) -> Option<Matrix> {
        if propagate.labels {
            panic!("MultiClassifierSoftmaxLoss cannot backpropagate to label inputs");
        }
        if !propagate.predictions {
            return None;
        }
        assert!(
            self.forward_ready,
            "backward requires a preceding forward call with matching shapes"
        );
        assert_eq!(
            labels.count(),
            self.prob.rows,
            "label count does not match the forward pass"
        );

        for r in 0..self.prob.rows {
            let (n, classifier_id) = self.config.unflatten(r);
            let label_value = self.config.label_at(labels, n, classifier_id);
            self.prob.data[r][label_value] -= 1.0;
        }
        self.forward_ready = false;

        let batch = self.prob.rows / self.config.num_classifiers;
        let scale = loss_weight / batch as f64;
        let width = self.config.num_classes * self.config.num_classifiers;
        let mut grad = Matrix::zeros(batch, width);
        for r in 0..self.prob.rows {
            let (n, classifier_id) = self.config.unflatten(r);
            let start = classifier_id * self.config.num_classes;
            for (j, &p) in self.prob.row(r).iter().enumerate() {
                grad.data[n][start + j] = p * scale;
            }
        }
        Some(grad)
    }
}
