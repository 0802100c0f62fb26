use super::StreamingMetric;
use num_traits::ToPrimitive;

/// `|true ∩ pred| / |pred|`. This is `NaN` when nothing was predicted positive.
pub fn precision_score(y_true: &[bool], y_pred: &[bool]) -> f64 {
	let true_positives = count_true_positives(y_true, y_pred);
	let predicted_positives = y_pred.iter().filter(|&&p| p).count();
	true_positives.to_f64().unwrap() / predicted_positives.to_f64().unwrap()
}

/// `|true ∩ pred| / |true|`. This is `NaN` when there are no positive labels.
pub fn recall_score(y_true: &[bool], y_pred: &[bool]) -> f64 {
	let true_positives = count_true_positives(y_true, y_pred);
	let actual_positives = y_true.iter().filter(|&&t| t).count();
	true_positives.to_f64().unwrap() / actual_positives.to_f64().unwrap()
}

/// The harmonic mean of precision and recall, `2 / (1 / precision + 1 / recall)`.
pub fn f1_score(y_true: &[bool], y_pred: &[bool]) -> f64 {
	let precision = precision_score(y_true, y_pred);
	let recall = recall_score(y_true, y_pred);
	2.0 / (1.0 / precision + 1.0 / recall)
}

fn count_true_positives(y_true: &[bool], y_pred: &[bool]) -> usize {
	y_true
		.iter()
		.zip(y_pred.iter())
		.filter(|(&label, &prediction)| label && prediction)
		.count()
}

/**
`BinaryClassificationMetrics` accumulates the confusion counts of a binary classifier one example at a time. Merging accumulators and then finalizing produces the same numbers as calling [`precision_score`](fn.precision_score.html), [`recall_score`](fn.recall_score.html), [`accuracy_score`](fn.accuracy_score.html) and [`f1_score`](fn.f1_score.html) on the concatenated examples.
*/
#[derive(Clone, Debug, Default)]
pub struct BinaryClassificationMetrics {
	true_positives: u64,
	false_positives: u64,
	true_negatives: u64,
	false_negatives: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BinaryClassificationMetricsOutput {
	pub n_examples: u64,
	/// The number of examples whose label is positive.
	pub n_positive_labels: u64,
	pub true_positives: u64,
	pub false_positives: u64,
	pub true_negatives: u64,
	pub false_negatives: u64,
	pub precision: f64,
	pub recall: f64,
	pub accuracy: f64,
	pub f1_score: f64,
}

impl BinaryClassificationMetrics {
	pub fn new() -> Self {
		Self::default()
	}
}

impl StreamingMetric<'_> for BinaryClassificationMetrics {
	/// (label, prediction)
	type Input = (bool, bool);
	type Output = BinaryClassificationMetricsOutput;

	fn update(&mut self, (label, prediction): (bool, bool)) {
		match (label, prediction) {
			(true, true) => self.true_positives += 1,
			(false, true) => self.false_positives += 1,
			(false, false) => self.true_negatives += 1,
			(true, false) => self.false_negatives += 1,
		}
	}

	fn merge(&mut self, other: Self) {
		self.true_positives += other.true_positives;
		self.false_positives += other.false_positives;
		self.true_negatives += other.true_negatives;
		self.false_negatives += other.false_negatives;
	}

	fn finalize(self) -> BinaryClassificationMetricsOutput {
		let true_positives = self.true_positives.to_f64().unwrap();
		let false_positives = self.false_positives.to_f64().unwrap();
		let true_negatives = self.true_negatives.to_f64().unwrap();
		let false_negatives = self.false_negatives.to_f64().unwrap();
		let n_examples =
			self.true_positives + self.false_positives + self.true_negatives + self.false_negatives;
		let precision = true_positives / (true_positives + false_positives);
		let recall = true_positives / (true_positives + false_negatives);
		let accuracy = (true_positives + true_negatives) / n_examples.to_f64().unwrap();
		let f1_score = 2.0 / (1.0 / precision + 1.0 / recall);
		BinaryClassificationMetricsOutput {
			n_examples,
			n_positive_labels: self.true_positives + self.false_negatives,
			true_positives: self.true_positives,
			false_positives: self.false_positives,
			true_negatives: self.true_negatives,
			false_negatives: self.false_negatives,
			precision,
			recall,
			accuracy,
			f1_score,
		}
	}
}

#[test]
fn test_precision_recall() {
	// fishing = true
	let y_true = [true, true, false];
	let y_pred = [true, false, false];
	assert_eq!(precision_score(&y_true, &y_pred), 1.0);
	assert_eq!(recall_score(&y_true, &y_pred), 0.5);
	assert!((f1_score(&y_true, &y_pred) - 2.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_empty_denominators() {
	let y_true = [true, false];
	let y_pred = [false, false];
	assert!(precision_score(&y_true, &y_pred).is_nan());
	assert_eq!(recall_score(&y_true, &y_pred), 0.0);
	assert!(f1_score(&y_true, &y_pred).is_nan());
	assert!(recall_score(&[false], &[true]).is_nan());
}

#[test]
fn test_streaming_matches_batch() {
	let y_true = [true, true, true, false, false, true, false, false];
	let y_pred = [true, false, true, true, false, true, false, true];
	let mut left = BinaryClassificationMetrics::new();
	let mut right = BinaryClassificationMetrics::new();
	for (index, (&label, &prediction)) in y_true.iter().zip(y_pred.iter()).enumerate() {
		if index < 3 {
			left.update((label, prediction));
		} else {
			right.update((label, prediction));
		}
	}
	left.merge(right);
	let output = left.finalize();
	assert_eq!(output.n_examples, 8);
	assert_eq!(output.n_positive_labels, 4);
	assert_eq!(output.precision, precision_score(&y_true, &y_pred));
	assert_eq!(output.recall, recall_score(&y_true, &y_pred));
	assert_eq!(output.f1_score, f1_score(&y_true, &y_pred));
	assert_eq!(
		output.accuracy,
		super::accuracy_score(&y_true, &y_pred, None)
	);
}
