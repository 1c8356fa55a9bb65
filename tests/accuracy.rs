use rand::Rng;

use hydra_nn::{AccuracyParams, HeadError, Matrix, MultiClassAccuracy, PropagateDown};

fn random_labels(batch: usize, num_classifiers: usize, num_classes: usize) -> Matrix {
    let mut rng = rand::thread_rng();
    Matrix::from_data(
        (0..batch)
            .map(|_| (0..num_classifiers).map(|_| rng.gen_range(0..num_classes) as f64).collect())
            .collect(),
    )
}

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

#[test]
fn single_classifier_matches_brute_force_count() {
    // 100 examples, 10 classes, 1 classifier.
    let predictions = Matrix::gaussian(100, 10, 1.0);
    let labels = random_labels(100, 1, 10);

    let accuracy = MultiClassAccuracy::new(10, 1).unwrap();
    let result = accuracy.forward(&predictions, &labels);
    assert_eq!(result.len(), 1);

    let mut num_correct = 0;
    for n in 0..100 {
        if arg_max(predictions.row(n)) == labels.data[n][0] as usize {
            num_correct += 1;
        }
    }
    assert!((result[0] - num_correct as f64 / 100.0).abs() < 1e-4);
}

#[test]
fn multiple_classifiers_score_independent_slices() {
    // Prediction width 10 with 5 labels: 5 classifiers of 2 classes each.
    let predictions = Matrix::gaussian(100, 10, 1.0);
    let labels = random_labels(100, 5, 2);

    let accuracy = MultiClassAccuracy::new(10, 5).unwrap();
    assert_eq!(accuracy.config().num_classes, 2);
    assert_eq!(accuracy.config().num_classifiers, 5);

    let result = accuracy.forward(&predictions, &labels);
    assert_eq!(result.len(), 5);

    let mut correct = vec![0.0; 5];
    for n in 0..100 {
        for classifier_id in 0..5 {
            let scores = &predictions.row(n)[classifier_id * 2..classifier_id * 2 + 2];
            if arg_max(scores) == labels.data[n][classifier_id] as usize {
                correct[classifier_id] += 1.0;
            }
        }
    }
    for classifier_id in 0..5 {
        assert!((result[classifier_id] - correct[classifier_id] / 100.0).abs() < 1e-4);
    }
}

#[test]
fn accuracy_values_lie_in_unit_interval() {
    let predictions = Matrix::gaussian(50, 12, 3.0);
    let labels = random_labels(50, 4, 3);
    let accuracy = MultiClassAccuracy::new(12, 4).unwrap();
    for value in accuracy.forward(&predictions, &labels) {
        assert!((0.0..=1.0).contains(&value));
    }
}

#[test]
fn ties_resolve_to_the_lowest_index() {
    let predictions = Matrix::from_data(vec![vec![1.0, 5.0, 5.0, 2.0]]);
    let accuracy = MultiClassAccuracy::new(4, 1).unwrap();

    // Class 1 and class 2 share the maximum score; class 1 is the prediction.
    let result = accuracy.forward(&predictions, &Matrix::from_data(vec![vec![1.0]]));
    assert_eq!(result[0], 1.0);
    let result = accuracy.forward(&predictions, &Matrix::from_data(vec![vec![2.0]]));
    assert_eq!(result[0], 0.0);
}

#[test]
fn random_scores_approach_chance_level() {
    // With uniform-random scores and labels, expected accuracy is 1/num_classes.
    let batch = 10_000;
    let num_classes = 4;
    let predictions = Matrix::gaussian(batch, num_classes, 1.0);
    let labels = random_labels(batch, 1, num_classes);

    let accuracy = MultiClassAccuracy::new(num_classes, 1).unwrap();
    let result = accuracy.forward(&predictions, &labels);
    assert!((result[0] - 1.0 / num_classes as f64).abs() < 0.03);
}

#[test]
fn setup_rejects_non_integral_ratio() {
    assert_eq!(
        MultiClassAccuracy::new(10, 3).err(),
        Some(HeadError::RatioNotIntegral { predictions: 10, labels: 3 })
    );
}

#[test]
fn setup_rejects_top_k_larger_than_num_classes() {
    let params = AccuracyParams { axis: 1, top_k: 11 };
    assert_eq!(
        MultiClassAccuracy::from_params(&params, 10, 1).err(),
        Some(HeadError::TopKTooLarge { top_k: 11, num_classes: 10 })
    );
}

#[test]
fn reshape_revalidates_top_k_against_new_class_count() {
    let params = AccuracyParams { axis: 1, top_k: 3 };
    let mut accuracy = MultiClassAccuracy::from_params(&params, 10, 1).unwrap();

    // 10 wide with 5 labels means only 2 classes per classifier; top_k = 3
    // no longer fits.
    assert_eq!(
        accuracy.reshape(10, 5).err(),
        Some(HeadError::TopKTooLarge { top_k: 3, num_classes: 2 })
    );

    accuracy.reshape(12, 2).unwrap();
    assert_eq!(accuracy.config().num_classes, 6);
    assert_eq!(accuracy.config().num_classifiers, 2);
}

#[test]
fn negative_axis_selects_the_feature_axis() {
    let params = AccuracyParams { axis: -1, top_k: 1 };
    assert!(MultiClassAccuracy::from_params(&params, 10, 1).is_ok());
    let params = AccuracyParams { axis: 0, top_k: 1 };
    assert_eq!(
        MultiClassAccuracy::from_params(&params, 10, 1).err(),
        Some(HeadError::BadAxis { axis: 0 })
    );
}

#[test]
fn backward_with_nothing_requested_is_a_no_op() {
    let accuracy = MultiClassAccuracy::new(10, 1).unwrap();
    accuracy.backward(PropagateDown::none());
}

// Label range is a debug-only contract check; a negative label must not
// silently saturate to class 0.
#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "non-negative")]
fn negative_labels_are_rejected_in_debug_builds() {
    let predictions = Matrix::gaussian(2, 4, 1.0);
    let labels = Matrix::from_data(vec![vec![-1.0], vec![0.0]]);
    let accuracy = MultiClassAccuracy::new(4, 1).unwrap();
    accuracy.forward(&predictions, &labels);
}

#[test]
#[should_panic(expected = "cannot backpropagate")]
fn backward_requesting_a_gradient_is_fatal() {
    let accuracy = MultiClassAccuracy::new(10, 1).unwrap();
    accuracy.backward(PropagateDown::predictions_only());
}
