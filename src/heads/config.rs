use std::fmt;

use crate::math::matrix::Matrix;

/// A fatal configuration error raised at setup/reshape time.
///
/// None of these are recoverable mid-batch: a component refuses to process
/// anything until it has been set up with consistent shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadError {
    /// The prediction-axis extent is not an exact multiple of the label-axis
    /// extent, so no whole number of classes per classifier exists.
    RatioNotIntegral { predictions: usize, labels: usize },
    /// `top_k` exceeds the number of classes per classifier.
    TopKTooLarge { top_k: usize, num_classes: usize },
    /// Prediction element count / num_classes does not equal the label
    /// element count (there must be exactly one label per classifier-row).
    CountMismatch { expected_labels: usize, actual_labels: usize },
    /// The axis selector does not resolve to the packed feature axis.
    BadAxis { axis: isize },
}

impl fmt::Display for HeadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadError::RatioNotIntegral { predictions, labels } => write!(
                f,
                "number of predictions ({}) must be a multiple of labels ({})",
                predictions, labels
            ),
            HeadError::TopKTooLarge { top_k, num_classes } => write!(
                f,
                "top_k ({}) must be less than or equal to the number of classes ({})",
                top_k, num_classes
            ),
            HeadError::CountMismatch { expected_labels, actual_labels } => write!(
                f,
                "number of labels ({}) must match number of prediction rows ({}); \
                 one integer label in 0..num_classes per classifier",
                actual_labels, expected_labels
            ),
            HeadError::BadAxis { axis } => write!(
                f,
                "axis {} does not select the packed feature axis of a 2-D tensor",
                axis
            ),
        }
    }
}

impl std::error::Error for HeadError {}

/// Resolves a possibly negative axis selector against a 2-D (batch, feature)
/// layout. Only the feature axis is a valid packing axis here.
pub fn canonical_axis(axis: isize) -> Result<usize, HeadError> {
    let canonical = if axis < 0 { axis + 2 } else { axis };
    if canonical == 1 {
        Ok(1)
    } else {
        Err(HeadError::BadAxis { axis })
    }
}

/// Shape configuration shared by the accuracy metric and the softmax loss.
///
/// Derived once from the extents of the packed prediction axis and the label
/// axis; reused for every batch until the shapes change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadConfig {
    /// Classes per classifier (width of one score block).
    pub num_classes: usize,
    /// Independent classifiers packed side by side.
    pub num_classifiers: usize,
}

impl HeadConfig {
    /// Derives the configuration from the prediction-axis extent and the
    /// label-axis extent. The prediction extent must be an exact multiple of
    /// the label extent; each classifier then owns `predictions / labels`
    /// contiguous score columns.
    pub fn derive(predictions: usize, labels: usize) -> Result<HeadConfig, HeadError> {
        if labels == 0 || predictions % labels != 0 {
            return Err(HeadError::RatioNotIntegral { predictions, labels });
        }
        Ok(HeadConfig {
            num_classes: predictions / labels,
            num_classifiers: labels,
        })
    }

    /// Maps (example, classifier) to the flattened classifier-row index used
    /// by the probability buffer. `unflatten` is its inverse; forward and
    /// backward both go through this pair so their indexing cannot diverge.
    pub fn flat_row(&self, example: usize, classifier: usize) -> usize {
        example * self.num_classifiers + classifier
    }

    /// Maps a flattened classifier-row index back to (example, classifier).
    pub fn unflatten(&self, row: usize) -> (usize, usize) {
        (row / self.num_classifiers, row % self.num_classifiers)
    }

    /// One classifier's contiguous score block within a packed example row.
    pub fn head_slice<'a>(&self, example_row: &'a [f64], classifier: usize) -> &'a [f64] {
        let start = classifier * self.num_classes;
        &example_row[start..start + self.num_classes]
    }

    /// Reads the integer label for (example, classifier).
    ///
    /// Labels are stored as floats but must hold exact integers in
    /// [0, num_classes). The range is a caller contract, checked only in
    /// debug builds to keep the inner loops branch-free in release.
    pub fn label_at(&self, labels: &Matrix, example: usize, classifier: usize) -> usize {
        let raw = labels.data[example][classifier];
        // `as usize` saturates negatives to 0, which would silently score
        // class 0; reject them before the cast.
        debug_assert!(raw >= 0.0, "label {} out of range: labels must be non-negative", raw);
        let label_value = raw as usize;
        debug_assert!(
            label_value < self.num_classes,
            "label {} out of range for {} classes",
            label_value,
            self.num_classes
        );
        label_value
    }
}
