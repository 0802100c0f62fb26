use super::Extractor;
use crate::{
	record::InferenceRecord,
	taxonomy::Taxonomy,
	time::{DateRange, Timestamp},
};
use ndarray::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// One classified observation of one vessel.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedRow {
	pub mmsi: String,
	pub start_time: Timestamp,
	pub inferred_label: String,
	/// `None` when the vessel has no ground truth label.
	pub true_label: Option<String>,
	pub scores: BTreeMap<String, f64>,
}

/**
Classification results in a fixed label space.

`all` holds every classified record. `known` holds the records whose vessel has a ground truth label, in the same relative order, so `known` is always a subsequence of `all`.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct InferenceResults {
	pub label_list: Vec<String>,
	pub known: Vec<ClassifiedRow>,
	pub all: Vec<ClassifiedRow>,
}

impl InferenceResults {
	/// A view whose `known` rows are all rows, truth or not.
	pub fn all_results(&self) -> InferenceResults {
		InferenceResults {
			label_list: self.label_list.clone(),
			known: self.all.clone(),
			all: self.all.clone(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.known.is_empty()
	}

	/// Score matrix of `rows`, one row per record and one column per entry of `label_list`. Labels missing from a record score zero.
	pub fn indexed_scores(&self, rows: &[&ClassifiedRow]) -> Array2<f64> {
		let mut scores = Array2::zeros((rows.len(), self.label_list.len()));
		for (mut scores, row) in scores.genrows_mut().into_iter().zip(rows.iter()) {
			for (score, label) in scores.iter_mut().zip(self.label_list.iter()) {
				*score = row.scores.get(label).copied().unwrap_or(0.0);
			}
		}
		scores
	}

	/// The `known` rows whose start time falls in `date_range`, or all of them.
	pub fn known_in_range(&self, date_range: Option<&DateRange>) -> Vec<&ClassifiedRow> {
		self.known
			.iter()
			.filter(|row| date_range.map_or(true, |range| range.contains(&row.start_time)))
			.collect()
	}

	/// The distinct start dates of the `known` rows, ascending.
	pub fn start_dates(&self) -> Vec<Timestamp> {
		let dates: BTreeSet<Timestamp> = self.known.iter().map(|row| row.start_time).collect();
		dates.into_iter().collect()
	}
}

/// Accumulates the classification block stored under `field`.
pub struct ClassificationExtractor<'a> {
	field: String,
	label_map: &'a BTreeMap<String, String>,
	taxonomy: &'a Taxonomy,
	all_labels: BTreeSet<String>,
	all: Vec<ClassifiedRow>,
	known: Vec<ClassifiedRow>,
}

impl<'a> ClassificationExtractor<'a> {
	pub fn new(
		field: impl Into<String>,
		label_map: &'a BTreeMap<String, String>,
		taxonomy: &'a Taxonomy,
	) -> Self {
		Self {
			field: field.into(),
			label_map,
			taxonomy,
			all_labels: label_map.values().cloned().collect(),
			all: Vec::new(),
			known: Vec::new(),
		}
	}

	/// Sort the label space into vocabulary order and log per-label counts.
	pub fn finalize(self) -> InferenceResults {
		let label_list = self.taxonomy.sort_labels(self.all_labels);
		for label in label_list.iter() {
			let true_count = self
				.known
				.iter()
				.filter(|row| row.true_label.as_deref() == Some(label.as_str()))
				.count();
			let inferred_count = self
				.known
				.iter()
				.filter(|row| row.inferred_label == *label)
				.count();
			info!(
				"{} true and {} inferred labels for {}",
				true_count, inferred_count, label
			);
		}
		InferenceResults {
			label_list,
			known: self.known,
			all: self.all,
		}
	}
}

impl<'a> Extractor for ClassificationExtractor<'a> {
	fn extract(&mut self, record: &InferenceRecord) {
		let block = match record.classifications.get(&self.field) {
			Some(block) => block,
			None => return,
		};
		self.all_labels.extend(block.label_scores.keys().cloned());
		let true_label = self.label_map.get(&record.mmsi).cloned();
		let row = ClassifiedRow {
			mmsi: record.mmsi.clone(),
			start_time: record.start_time,
			inferred_label: block.max_label.clone(),
			true_label,
			scores: block.label_scores.clone(),
		};
		if row.true_label.is_some() {
			self.known.push(row.clone());
		}
		self.all.push(row);
	}
}

#[cfg(test)]
pub(crate) fn classified_record(
	mmsi: &str,
	start_time: &str,
	scores: &[(&str, f64)],
) -> InferenceRecord {
	use crate::record::ClassificationBlock;
	let label_scores: BTreeMap<String, f64> = scores
		.iter()
		.map(|(label, score)| (label.to_string(), *score))
		.collect();
	let max_label = scores
		.iter()
		.fold(None, |best: Option<(&str, f64)>, &(label, score)| match best {
			Some((_, best_score)) if best_score >= score => best,
			_ => Some((label, score)),
		})
		.map(|(label, _)| label.to_owned())
		.unwrap_or_default();
	InferenceRecord {
		mmsi: mmsi.to_owned(),
		start_time: crate::time::parse_timestamp(start_time).unwrap(),
		end_time: None,
		classifications: maplit::btreemap! {
			"Multiclass".to_owned() => ClassificationBlock { label_scores, max_label },
		},
		attributes: BTreeMap::new(),
		fishing: None,
	}
}

#[test]
fn test_classification_extractor() {
	let taxonomy = Taxonomy::builtin();
	let label_map = maplit::btreemap! {
		"1".to_owned() => "trawlers".to_owned(),
	};
	let mut extractor = ClassificationExtractor::new("Multiclass", &label_map, &taxonomy);
	let records = vec![
		classified_record("2", "2015-01-01T00:00:00", &[("tug", 0.9), ("trawlers", 0.1)]),
		classified_record("1", "2015-01-01T00:00:00", &[("tug", 0.2), ("trawlers", 0.8)]),
		classified_record("1", "2015-07-01T00:00:00", &[("cargo", 0.6), ("trawlers", 0.4)]),
	];
	for record in records.iter() {
		extractor.extract(record);
	}
	let mut no_block = records[0].clone();
	no_block.classifications.clear();
	extractor.extract(&no_block);
	let results = extractor.finalize();
	assert_eq!(results.label_list, vec!["cargo", "tug", "trawlers"]);
	assert_eq!(results.all.len(), 3);
	assert_eq!(results.known.len(), 2);
	assert_eq!(results.all[0].true_label, None);
	assert_eq!(results.known[0], results.all[1]);
	assert_eq!(results.known[1], results.all[2]);
	let rows = results.known_in_range(None);
	let scores = results.indexed_scores(&rows);
	assert_eq!(scores, arr2(&[[0.0, 0.2, 0.8], [0.6, 0.0, 0.4]]));
}
