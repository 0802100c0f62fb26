use super::binary_classification::{f1_score, precision_score, recall_score};

/// Precision, recall and F1 of one label, treating it as the positive class against all others.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassMetrics {
	pub label: String,
	/// The number of examples whose true label is `label`.
	pub n_true: usize,
	/// The number of examples predicted as `label`.
	pub n_predicted: usize,
	pub precision: f64,
	pub recall: f64,
	pub f1_score: f64,
}

/**
Compute one-vs-rest precision, recall and F1 for each label in `labels`, in order.

A label is only reported when it occurs at least once as a true label and at least once as a prediction, so none of the returned values divide by zero.
*/
pub fn precision_recall_f1<S>(labels: &[S], y_true: &[S], y_pred: &[S]) -> Vec<ClassMetrics>
where
	S: AsRef<str>,
{
	labels
		.iter()
		.filter_map(|label| {
			let label = label.as_ref();
			let trues: Vec<bool> = y_true.iter().map(|value| value.as_ref() == label).collect();
			let positives: Vec<bool> = y_pred.iter().map(|value| value.as_ref() == label).collect();
			let n_true = trues.iter().filter(|&&t| t).count();
			let n_predicted = positives.iter().filter(|&&p| p).count();
			if n_true == 0 || n_predicted == 0 {
				return None;
			}
			Some(ClassMetrics {
				label: label.to_owned(),
				n_true,
				n_predicted,
				precision: precision_score(&trues, &positives),
				recall: recall_score(&trues, &positives),
				f1_score: f1_score(&trues, &positives),
			})
		})
		.collect()
}

#[test]
fn test_precision_recall_f1() {
	let labels = ["cargo", "tug", "trawlers"];
	let y_true = ["cargo", "cargo", "tug", "trawlers"];
	let y_pred = ["cargo", "tug", "tug", "tug"];
	let metrics = precision_recall_f1(&labels, &y_true, &y_pred);
	insta::assert_debug_snapshot!(metrics, @r###"
	[
	    ClassMetrics {
	        label: "cargo",
	        n_true: 2,
	        n_predicted: 1,
	        precision: 1.0,
	        recall: 0.5,
	        f1_score: 0.6666666666666666,
	    },
	    ClassMetrics {
	        label: "tug",
	        n_true: 1,
	        n_predicted: 3,
	        precision: 0.3333333333333333,
	        recall: 1.0,
	        f1_score: 0.5,
	    },
	]
	"###);
}
