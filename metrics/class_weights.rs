use num_traits::ToPrimitive;

/// The cap on a single class's per-example weight in [`balanced_weights`](fn.balanced_weights.html).
pub const DEFAULT_MAX_WEIGHT: f64 = 200.0;

/**
Compute per-example weights so that every label class in `labels` contributes equally to a weighted accuracy.

Each example whose true label is `label` gets weight `min(n_examples / n_examples_with_label, max_weight)`. Examples whose true label is not in `labels` get weight zero. The weights are then normalized to sum to one.
*/
pub fn balanced_weights<T>(labels: &[T], y_true: &[T], max_weight: f64) -> Vec<f64>
where
	T: PartialEq,
{
	let n_examples = y_true.len().to_f64().unwrap();
	let mut weights = vec![0.0; y_true.len()];
	for label in labels {
		let n_true = y_true.iter().filter(|value| *value == label).count();
		if n_true == 0 {
			continue;
		}
		let weight = f64::min(n_examples / n_true.to_f64().unwrap(), max_weight);
		for (value, w) in y_true.iter().zip(weights.iter_mut()) {
			if value == label {
				*w += weight;
			}
		}
	}
	let total: f64 = weights.iter().sum();
	weights.iter_mut().for_each(|w| *w /= total);
	weights
}

#[test]
fn test_balanced_weights() {
	let labels = ["a", "b"];
	let y_true = ["a", "b", "b", "b"];
	let weights = balanced_weights(&labels, &y_true, DEFAULT_MAX_WEIGHT);
	// Before normalization "a" has weight 4 and each "b" has weight 4 / 3.
	assert!((weights[0] / weights[1] - 3.0).abs() < 1e-12);
	assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-12);
	assert!((weights[0] - 0.5).abs() < 1e-12);
}

#[test]
fn test_balanced_weights_cap() {
	let labels = ["a", "b"];
	let y_true = ["a", "b", "b", "b"];
	let weights = balanced_weights(&labels, &y_true, 2.0);
	// "a" is capped at 2, "b" stays at 4 / 3.
	assert!((weights[0] / weights[1] - 1.5).abs() < 1e-12);
}

#[test]
fn test_balanced_accuracy() {
	let labels = ["a", "b"];
	let y_true = ["a", "b", "b", "b"];
	let y_pred = ["b", "b", "b", "b"];
	let weights = balanced_weights(&labels, &y_true, DEFAULT_MAX_WEIGHT);
	let accuracy = super::accuracy_score(&y_true, &y_pred, Some(&weights));
	assert!((accuracy - 0.5).abs() < 1e-12);
}
