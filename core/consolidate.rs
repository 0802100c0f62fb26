/*!
Cross-date consolidation collapses the many per-timestamp observations of a vessel into one verdict per vessel, optionally restricted to a half open date window.
*/

use crate::{
	extract::{AttributeResults, InferenceResults},
	taxonomy::UNKNOWN_LABEL,
	time::DateRange,
};
use fnv::FnvHashMap;
use ndarray::prelude::*;
use num_traits::ToPrimitive;
use std::collections::BTreeMap;
use vessel_eval_metrics::{Mean, StreamingMetric};

#[derive(Clone, Debug, PartialEq)]
pub struct ConsolidatedRow {
	pub mmsi: String,
	pub inferred_label: String,
	pub true_label: Option<String>,
	/// Mean score per entry of the label list.
	pub scores: Array1<f64>,
}

impl ConsolidatedRow {
	/// The largest mean score.
	pub fn max_score(&self) -> f64 {
		self.scores.iter().cloned().fold(std::f64::NEG_INFINITY, f64::max)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConsolidatedResults {
	pub label_list: Vec<String>,
	/// One row per vessel, in order of first appearance.
	pub rows: Vec<ConsolidatedRow>,
}

impl ConsolidatedResults {
	pub fn inferred_labels(&self) -> Vec<String> {
		self.rows.iter().map(|row| row.inferred_label.clone()).collect()
	}

	/// True labels, with the empty string standing in for vessels without one.
	pub fn true_labels(&self) -> Vec<String> {
		self.rows
			.iter()
			.map(|row| row.true_label.clone().unwrap_or_default())
			.collect()
	}
}

/**
Consolidate the `known` rows of `results` per vessel. Score vectors of every observation in `date_range` are summed. The inferred label is the first maximum of the sum in label list order, and the reported scores are the mean over the contributing observations. The true label is the one of the vessel's first observation in range.
*/
pub fn consolidate_across_dates(
	results: &InferenceResults,
	date_range: Option<&DateRange>,
) -> ConsolidatedResults {
	let rows = results.known_in_range(date_range);
	let scores = results.indexed_scores(&rows);
	let mut slots: FnvHashMap<&str, usize> = FnvHashMap::default();
	let mut vessels: Vec<(&str, Option<&String>)> = Vec::new();
	for row in rows.iter() {
		if !slots.contains_key(row.mmsi.as_str()) {
			slots.insert(row.mmsi.as_str(), vessels.len());
			vessels.push((row.mmsi.as_str(), row.true_label.as_ref()));
		}
	}
	let mut sums = Array2::<f64>::zeros((vessels.len(), results.label_list.len()));
	let mut counts = vec![0usize; vessels.len()];
	for (row, scores) in rows.iter().zip(scores.genrows()) {
		let slot = slots[row.mmsi.as_str()];
		let mut sum = sums.row_mut(slot);
		sum += &scores;
		counts[slot] += 1;
	}
	let rows = vessels
		.into_iter()
		.zip(sums.genrows())
		.zip(counts.into_iter())
		.map(|(((mmsi, true_label), sum), count)| {
			let inferred_label = argmax(sum.iter().cloned())
				.map(|index| results.label_list[index].clone())
				.unwrap_or_default();
			let scores = sum.mapv(|score| score / count.to_f64().unwrap());
			ConsolidatedRow {
				mmsi: mmsi.to_owned(),
				inferred_label,
				true_label: true_label.cloned(),
				scores,
			}
		})
		.collect();
	ConsolidatedResults {
		label_list: results.label_list.clone(),
		rows,
	}
}

/// The index of the first maximum.
pub(crate) fn argmax<I>(values: I) -> Option<usize>
where
	I: IntoIterator<Item = f64>,
{
	let mut best: Option<(usize, f64)> = None;
	for (index, value) in values.into_iter().enumerate() {
		match best {
			Some((_, best_value)) if best_value >= value => {}
			_ => best = Some((index, value)),
		}
	}
	best.map(|(index, _)| index)
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConsolidatedAttribute {
	pub mmsi: String,
	/// NaN when no observation in range has a value.
	pub inferred: f64,
	/// NaN when the vessel has no known value.
	pub true_value: f64,
	pub true_label: String,
}

/**
Consolidate attribute observations per vessel, vessels in lexical order. The inferred value is the mean of the non-NaN observations in `date_range`. The true value is the mean of the vessel's known values and the true label is its first label other than `Unknown`.
*/
pub fn consolidate_attribute_across_dates(
	results: &AttributeResults,
	date_range: Option<&DateRange>,
) -> Vec<ConsolidatedAttribute> {
	let mut rows_by_mmsi = BTreeMap::new();
	for row in results.rows.iter() {
		rows_by_mmsi
			.entry(row.mmsi.as_str())
			.or_insert_with(Vec::new)
			.push(row);
	}
	rows_by_mmsi
		.into_iter()
		.map(|(mmsi, rows)| {
			let inferred = nan_mean(
				rows.iter()
					.filter(|row| date_range.map_or(true, |range| range.contains(&row.start_time)))
					.map(|row| row.inferred),
			);
			let true_value = nan_mean(rows.iter().map(|row| row.true_value));
			let true_label = rows
				.iter()
				.map(|row| row.true_label.as_str())
				.find(|label| *label != UNKNOWN_LABEL)
				.unwrap_or(UNKNOWN_LABEL)
				.to_owned();
			ConsolidatedAttribute {
				mmsi: mmsi.to_owned(),
				inferred,
				true_value,
				true_label,
			}
		})
		.collect()
}

fn nan_mean(values: impl Iterator<Item = f64>) -> f64 {
	let mut mean = Mean::new();
	for value in values.filter(|value| !value.is_nan()) {
		mean.update(value);
	}
	mean.finalize().unwrap_or(std::f64::NAN)
}

#[cfg(test)]
fn fixture() -> InferenceResults {
	use crate::{
		extract::{classified_record, ClassificationExtractor, Extractor},
		taxonomy::Taxonomy,
	};
	let taxonomy = Taxonomy::builtin();
	let label_map = maplit::btreemap! {
		"1".to_owned() => "trawlers".to_owned(),
		"2".to_owned() => "tug".to_owned(),
	};
	let mut extractor = ClassificationExtractor::new("Multiclass", &label_map, &taxonomy);
	let records = vec![
		classified_record("2", "2015-01-01T00:00:00", &[("tug", 0.5), ("trawlers", 0.5)]),
		classified_record("1", "2015-01-01T00:00:00", &[("tug", 0.7), ("trawlers", 0.3)]),
		classified_record("1", "2016-01-01T00:00:00", &[("tug", 0.1), ("trawlers", 0.9)]),
		classified_record("3", "2016-01-01T00:00:00", &[("tug", 0.9), ("trawlers", 0.1)]),
	];
	for record in records.iter() {
		extractor.extract(record);
	}
	extractor.finalize()
}

#[test]
fn test_consolidate_across_dates() {
	let results = fixture();
	let consolidated = consolidate_across_dates(&results, None);
	assert_eq!(consolidated.label_list, vec!["tug", "trawlers"]);
	assert_eq!(consolidated.rows.len(), 2);
	// Vessels keep their order of first appearance.
	assert_eq!(consolidated.rows[0].mmsi, "2");
	// An exact tie goes to the label earlier in vocabulary order.
	assert_eq!(consolidated.rows[0].inferred_label, "tug");
	assert_eq!(consolidated.rows[1].inferred_label, "trawlers");
	assert_eq!(consolidated.rows[1].true_label.as_deref(), Some("trawlers"));
	assert!((consolidated.rows[1].scores[0] - 0.4).abs() < 1e-12);
	assert!((consolidated.rows[1].scores[1] - 0.6).abs() < 1e-12);
	assert!((consolidated.rows[1].max_score() - 0.6).abs() < 1e-12);
}

#[test]
fn test_consolidate_in_date_range() {
	let results = fixture();
	let range = DateRange::year(2015).unwrap();
	let consolidated = consolidate_across_dates(&results, Some(&range));
	assert_eq!(consolidated.inferred_labels(), vec!["tug", "tug"]);
	assert_eq!(consolidated.true_labels(), vec!["tug", "trawlers"]);
	let all = consolidate_across_dates(&results.all_results(), None);
	assert_eq!(all.rows.len(), 3);
	assert_eq!(all.rows[2].true_label, None);
	assert_eq!(all.true_labels()[2], "");
}

#[test]
fn test_consolidate_attribute_across_dates() {
	use crate::extract::{AttributeRow, AttributeResults};
	use crate::time::parse_timestamp;
	let row = |mmsi: &str, date: &str, inferred: f64, true_value: f64, label: &str| AttributeRow {
		mmsi: mmsi.to_owned(),
		start_time: parse_timestamp(date).unwrap(),
		inferred,
		true_value,
		true_label: label.to_owned(),
	};
	let results = AttributeResults {
		field: "length".to_owned(),
		rows: vec![
			row("b", "2015-01-01T00:00:00", 10.0, 12.0, UNKNOWN_LABEL),
			row("a", "2015-01-01T00:00:00", 20.0, f64::NAN, UNKNOWN_LABEL),
			row("b", "2016-01-01T00:00:00", 14.0, 12.0, "tug"),
			row("b", "2016-06-01T00:00:00", f64::NAN, 12.0, "cargo"),
		],
	};
	let consolidated = consolidate_attribute_across_dates(&results, None);
	assert_eq!(consolidated.len(), 2);
	assert_eq!(consolidated[0].mmsi, "a");
	assert!(consolidated[0].true_value.is_nan());
	assert_eq!(consolidated[0].true_label, UNKNOWN_LABEL);
	assert_eq!(consolidated[1].inferred, 12.0);
	assert_eq!(consolidated[1].true_value, 12.0);
	assert_eq!(consolidated[1].true_label, "tug");
	let range = DateRange::year(2016).unwrap();
	let consolidated = consolidate_attribute_across_dates(&results, Some(&range));
	assert!(consolidated[0].inferred.is_nan());
	assert_eq!(consolidated[1].inferred, 14.0);
}
