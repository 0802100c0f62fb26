/*!
Statistics handed to report renderers: per-date and overall accuracy, the confusion matrix and per-label scores of a classification, and the error tables of a continuous attribute.
*/

use crate::{
	consolidate::{consolidate_across_dates, consolidate_attribute_across_dates},
	extract::{AttributeResults, InferenceResults},
	time::Timestamp,
};
use tracing::info;
use vessel_eval_metrics::{
	accuracy_score, balanced_weights, error_by_label, mean_absolute_error, precision_recall_f1,
	rms_error, Accuracy, ClassMetrics, ConfusionMatrix, ConfusionMatrixInput, LabelErrorMetrics,
	Metric, StreamingMetric,
};

#[derive(Clone, Debug, PartialEq)]
pub struct DateAccuracy {
	pub start_date: Timestamp,
	pub accuracy: f64,
}

#[derive(Clone, Debug)]
pub struct ClassificationReport {
	pub label_list: Vec<String>,
	/// Accuracy of the individual observations, per start date.
	pub accuracy_by_date: Vec<DateAccuracy>,
	/// Accuracy of the per-vessel consolidated labels.
	pub accuracy: f64,
	pub confusion_matrix: ConfusionMatrix,
	pub metrics_by_label: Vec<ClassMetrics>,
	/// Consolidated accuracy with every true class weighted equally.
	pub balanced_accuracy: f64,
}

/**
Score the `known` rows of `results`. Observations are scored per start date, then vessels are consolidated across dates and scored once each.
*/
pub fn classification_report(results: &InferenceResults, max_weight: f64) -> ClassificationReport {
	let accuracy_by_date = results
		.start_dates()
		.into_iter()
		.map(|start_date| {
			let mut accuracy = Accuracy::new();
			for row in results.known.iter().filter(|row| row.start_time == start_date) {
				accuracy.update((
					row.true_label.as_deref().unwrap_or_default(),
					row.inferred_label.as_str(),
				));
			}
			DateAccuracy {
				start_date,
				accuracy: accuracy.finalize().unwrap_or(std::f64::NAN),
			}
		})
		.collect();

	let consolidated = consolidate_across_dates(results, None);
	let y_true = consolidated.true_labels();
	let y_pred = consolidated.inferred_labels();
	let accuracy = accuracy_score(&y_true, &y_pred, None);
	let confusion_matrix = ConfusionMatrix::compute(ConfusionMatrixInput {
		labels: &results.label_list,
		y_true: &y_true,
		y_pred: &y_pred,
	});
	let metrics_by_label = precision_recall_f1(&results.label_list, &y_true, &y_pred);
	let weights = balanced_weights(&results.label_list, &y_true, max_weight);
	let balanced_accuracy = accuracy_score(&y_true, &y_pred, Some(&weights));
	info!(
		"{} vessels, accuracy {}, balanced accuracy {}",
		y_true.len(),
		accuracy,
		balanced_accuracy
	);
	ClassificationReport {
		label_list: results.label_list.clone(),
		accuracy_by_date,
		accuracy,
		confusion_matrix,
		metrics_by_label,
		balanced_accuracy,
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct DateError {
	pub start_date: Timestamp,
	pub rms_error: f64,
	pub abs_error: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AttributeReport {
	pub field: String,
	/// Errors of the individual observations with a known value, per start date.
	pub error_by_date: Vec<DateError>,
	/// Errors of the per-vessel consolidated values.
	pub rms_error: f64,
	pub abs_error: f64,
	pub error_by_label: Vec<LabelErrorMetrics>,
}

pub fn attribute_report(results: &AttributeResults) -> AttributeReport {
	let error_by_date = results
		.start_dates()
		.into_iter()
		.map(|start_date| {
			let (truths, predictions): (Vec<f64>, Vec<f64>) = results
				.known_rows(None)
				.into_iter()
				.filter(|row| row.start_time == start_date)
				.map(|row| (row.true_value, row.inferred))
				.unzip();
			DateError {
				start_date,
				rms_error: rms_error(&truths, &predictions),
				abs_error: mean_absolute_error(&truths, &predictions),
			}
		})
		.collect();

	let consolidated = consolidate_attribute_across_dates(results, None);
	let (truths, predictions): (Vec<f64>, Vec<f64>) = consolidated
		.iter()
		.filter(|row| !row.true_value.is_nan() && !row.inferred.is_nan())
		.map(|row| (row.true_value, row.inferred))
		.unzip();
	let predictions_by_vessel: Vec<f64> = consolidated.iter().map(|row| row.inferred).collect();
	let truths_by_vessel: Vec<f64> = consolidated.iter().map(|row| row.true_value).collect();
	let labels: Vec<&str> = consolidated
		.iter()
		.map(|row| row.true_label.as_str())
		.collect();
	AttributeReport {
		field: results.field.clone(),
		error_by_date,
		rms_error: rms_error(&truths, &predictions),
		abs_error: mean_absolute_error(&truths, &predictions),
		error_by_label: error_by_label(&predictions_by_vessel, &truths_by_vessel, &labels),
	}
}

#[test]
fn test_classification_report() {
	use crate::{
		extract::{classified_record, ClassificationExtractor, Extractor},
		taxonomy::Taxonomy,
	};
	use vessel_eval_metrics::DEFAULT_MAX_WEIGHT;
	let taxonomy = Taxonomy::builtin();
	let label_map = maplit::btreemap! {
		"1".to_owned() => "trawlers".to_owned(),
		"2".to_owned() => "trawlers".to_owned(),
		"3".to_owned() => "trawlers".to_owned(),
		"4".to_owned() => "tug".to_owned(),
	};
	let mut extractor = ClassificationExtractor::new("Multiclass", &label_map, &taxonomy);
	let records = vec![
		classified_record("1", "2015-01-01T00:00:00", &[("tug", 0.1), ("trawlers", 0.9)]),
		classified_record("2", "2015-01-01T00:00:00", &[("tug", 0.2), ("trawlers", 0.8)]),
		classified_record("3", "2015-01-01T00:00:00", &[("tug", 0.6), ("trawlers", 0.4)]),
		classified_record("4", "2015-01-01T00:00:00", &[("tug", 0.3), ("trawlers", 0.7)]),
		classified_record("4", "2016-01-01T00:00:00", &[("tug", 0.9), ("trawlers", 0.1)]),
		classified_record("5", "2016-01-01T00:00:00", &[("tug", 0.9), ("trawlers", 0.1)]),
	];
	for record in records.iter() {
		extractor.extract(record);
	}
	let report = classification_report(&extractor.finalize(), DEFAULT_MAX_WEIGHT);
	assert_eq!(report.label_list, vec!["tug", "trawlers"]);
	assert_eq!(report.accuracy_by_date.len(), 2);
	assert_eq!(report.accuracy_by_date[0].accuracy, 0.5);
	assert_eq!(report.accuracy_by_date[1].accuracy, 1.0);
	// Vessel 4 sums to tug 1.2 against trawlers 0.8.
	assert_eq!(report.accuracy, 0.75);
	assert_eq!(
		report.confusion_matrix.raw,
		ndarray::arr2(&[[1, 0], [1, 2]])
	);
	// Both classes weigh equally: tug is always right, trawlers two times out of three.
	assert!((report.balanced_accuracy - (0.5 + 0.5 * 2.0 / 3.0)).abs() < 1e-12);
	insta::assert_debug_snapshot!(report.metrics_by_label, @r###"
 [
     ClassMetrics {
         label: "tug",
         n_true: 1,
         n_predicted: 2,
         precision: 0.5,
         recall: 1.0,
         f1_score: 0.6666666666666666,
     },
     ClassMetrics {
         label: "trawlers",
         n_true: 3,
         n_predicted: 2,
         precision: 1.0,
         recall: 0.6666666666666666,
         f1_score: 0.8,
     },
 ]
 "###);
}

#[test]
fn test_attribute_report() {
	use crate::{
		extract::{attribute_record, AttributeExtractor, Extractor},
		taxonomy::UNKNOWN_LABEL,
	};
	let lengths = maplit::btreemap! {
		"1".to_owned() => 30.0,
		"2".to_owned() => 10.0,
	};
	let labels = maplit::btreemap! {
		"1".to_owned() => "trawlers".to_owned(),
	};
	let mut extractor = AttributeExtractor::new("length", &lengths, &labels);
	let records = vec![
		attribute_record("1", "2015-01-01T00:00:00", "length", 26.0),
		attribute_record("2", "2015-01-01T00:00:00", "length", 13.0),
		attribute_record("1", "2016-01-01T00:00:00", "length", 30.0),
		attribute_record("3", "2016-01-01T00:00:00", "length", 50.0),
	];
	for record in records.iter() {
		extractor.extract(record);
	}
	let report = attribute_report(&extractor.finalize());
	assert_eq!(report.field, "length");
	assert_eq!(report.error_by_date.len(), 2);
	// Errors of 4 and 3 on the first date.
	assert!((report.error_by_date[0].rms_error - 12.5f64.sqrt()).abs() < 1e-12);
	assert_eq!(report.error_by_date[0].abs_error, 3.5);
	assert_eq!(report.error_by_date[1].rms_error, 0.0);
	// Vessel 1 consolidates to 28, vessel 2 to 13, vessel 3 has no known length.
	assert!((report.rms_error - 6.5f64.sqrt()).abs() < 1e-12);
	assert_eq!(report.abs_error, 2.5);
	let labels: Vec<&str> = report
		.error_by_label
		.iter()
		.map(|row| row.label.as_str())
		.collect();
	assert_eq!(labels, vec![UNKNOWN_LABEL, "trawlers"]);
	assert_eq!(report.error_by_label[1].count, 1);
	assert_eq!(report.error_by_label[1].abs_error, 2.0);
}
