use rand::Rng;

use hydra_nn::{Matrix, MultiClassAccuracy, MultiClassifierSoftmaxLoss, PropagateDown};

fn main() {
    // 3 classifiers of 4 classes each, packed into one 12-wide tensor.
    let batch = 100;
    let num_classifiers = 3;
    let num_classes = 4;
    let width = num_classifiers * num_classes;

    let predictions = Matrix::gaussian(batch, width, 1.0);

    let mut rng = rand::thread_rng();
    let labels = Matrix::from_data(
        (0..batch)
            .map(|_| (0..num_classifiers).map(|_| rng.gen_range(0..num_classes) as f64).collect())
            .collect(),
    );

    let accuracy = MultiClassAccuracy::new(width, num_classifiers).unwrap();
    for (classifier_id, acc) in accuracy.forward(&predictions, &labels).iter().enumerate() {
        println!("Classifier {classifier_id}: accuracy = {acc:.3}");
    }

    let mut loss_layer = MultiClassifierSoftmaxLoss::new(width, num_classifiers).unwrap();
    loss_layer.reshape(batch, width, batch, num_classifiers).unwrap();

    let loss = loss_layer.forward(&predictions, &labels);
    println!("Loss (summed over classifiers, averaged over batch) = {loss:.4}");

    let grad = loss_layer
        .backward(&labels, 1.0, PropagateDown::predictions_only())
        .unwrap();
    let first_row_sum: f64 = grad.row(0).iter().sum();
    println!("Gradient shape: ({}, {}); first row sums to {first_row_sum:.2e}", grad.rows, grad.cols);
}
