use hydra_nn::{Matrix, RowNormalizer, Softmax};

fn softmax_reference(m: &Matrix) -> Matrix {
    let data = m
        .data
        .iter()
        .map(|row| {
            let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let exps: Vec<f64> = row.iter().map(|x| (x - max).exp()).collect();
            let sum: f64 = exps.iter().sum();
            exps.into_iter().map(|e| e / sum).collect()
        })
        .collect();
    Matrix::from_data(data)
}

#[test]
fn softmax_matches_reference() {
    let mut m = Matrix::from_data(vec![
        vec![1.0, 2.0, 3.0],
        vec![-1.0, 0.0, 1.0],
    ]);
    let expected = softmax_reference(&m);
    Softmax.normalize_rows(&mut m);
    for (actual_row, expected_row) in m.data.iter().zip(expected.data.iter()) {
        for (a, b) in actual_row.iter().zip(expected_row.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}

#[test]
fn softmax_rows_sum_to_one() {
    let mut m = Matrix::from_data(vec![
        vec![0.3, -0.7, 2.2, 0.0],
        vec![5.0, 5.0, 5.0, 5.0],
    ]);
    Softmax.normalize_rows(&mut m);
    for row in &m.data {
        let sum: f64 = row.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }
}

#[test]
fn softmax_is_stable_for_large_magnitude_scores() {
    // Naive exp() would overflow at 1e3; max-subtraction keeps this finite.
    let mut m = Matrix::from_data(vec![
        vec![1000.0, 999.0, -1000.0],
        vec![-1000.0, -1001.0, -1002.0],
    ]);
    Softmax.normalize_rows(&mut m);
    for row in &m.data {
        let sum: f64 = row.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(row.iter().all(|p| p.is_finite() && *p >= 0.0));
    }
    // exp(1000) / (exp(1000) + exp(999)) = 1 / (1 + e^-1)
    assert!((m.data[0][0] - 1.0 / (1.0 + (-1.0f64).exp())).abs() < 1e-12);
}
