use crate::{
	consolidate::argmax,
	error::{Error, Result},
	extract::{ClassifiedRow, InferenceResults},
	taxonomy::LabelMapping,
};
use std::collections::BTreeMap;

/**
Remap `results` into the coarser label space of `mapping`. The score of a new label is the sum of the scores of its old labels, and the inferred label is the first maximum in mapping order. True labels are translated through the inverse mapping, which fails with [`Error::MissingMapping`](enum.Error.html) for a true label no set covers.

Rows without a true label are dropped from both views, so in the result `known` and `all` are identical.
*/
pub fn assemble_composite(
	results: &InferenceResults,
	mapping: &LabelMapping,
) -> Result<InferenceResults> {
	let label_list: Vec<String> = mapping.iter().map(|(label, _)| label.clone()).collect();
	let inverse_mapping: BTreeMap<&str, &str> = mapping
		.iter()
		.flat_map(|(new_label, old_labels)| {
			old_labels
				.iter()
				.map(move |old_label| (old_label.as_str(), new_label.as_str()))
		})
		.collect();
	let mut rows = Vec::new();
	for row in results.all.iter() {
		let old_label = match &row.true_label {
			Some(old_label) => old_label,
			None => continue,
		};
		let true_label = inverse_mapping
			.get(old_label.as_str())
			.ok_or_else(|| Error::MissingMapping {
				label: old_label.clone(),
			})?;
		let scores: Vec<f64> = mapping
			.iter()
			.map(|(_, old_labels)| {
				old_labels
					.iter()
					.map(|old_label| row.scores.get(old_label).copied().unwrap_or(0.0))
					.sum()
			})
			.collect();
		let inferred_label = argmax(scores.iter().cloned())
			.map(|index| label_list[index].clone())
			.unwrap_or_default();
		rows.push(ClassifiedRow {
			mmsi: row.mmsi.clone(),
			start_time: row.start_time,
			inferred_label,
			true_label: Some(true_label.to_string()),
			scores: label_list.iter().cloned().zip(scores).collect(),
		});
	}
	Ok(InferenceResults {
		label_list,
		known: rows.clone(),
		all: rows,
	})
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
		classified_record(
			"1",
			"2015-01-01T00:00:00",
			&[("cargo", 0.2), ("tug", 0.2), ("trawlers", 0.35), ("set_gillnets", 0.25)],
		),
		classified_record("3", "2015-01-01T00:00:00", &[("tug", 1.0)]),
		classified_record(
			"2",
			"2015-01-01T00:00:00",
			&[("cargo", 0.3), ("tanker", 0.3), ("tug", 0.4)],
		),
	];
	for record in records.iter() {
		extractor.extract(record);
	}
	extractor.finalize()
}

#[test]
fn test_assemble_fishing_composite() {
	use crate::taxonomy::Taxonomy;
	let taxonomy = Taxonomy::builtin();
	let results = fixture();
	let composite = assemble_composite(&results, taxonomy.fishing_mapping()).unwrap();
	assert_eq!(composite.label_list, vec!["fishing", "non_fishing"]);
	// The vessel without ground truth is dropped from both views.
	assert_eq!(composite.all.len(), 2);
	assert_eq!(composite.known, composite.all);
	let first = &composite.known[0];
	assert_eq!(first.mmsi, "1");
	assert_eq!(first.inferred_label, "fishing");
	assert_eq!(first.true_label.as_deref(), Some("fishing"));
	assert!((first.scores["fishing"] - 0.6).abs() < 1e-12);
	assert!((first.scores["non_fishing"] - 0.4).abs() < 1e-12);
	// Composite scores conserve the total of the fine scores.
	for (fine, coarse) in results.known.iter().zip(composite.known.iter()) {
		let fine_total: f64 = fine.scores.values().sum();
		let coarse_total: f64 = coarse.scores.values().sum();
		assert!((fine_total - coarse_total).abs() < 1e-12);
	}
}

#[test]
fn test_assemble_coarse_composite() {
	use crate::taxonomy::Taxonomy;
	let taxonomy = Taxonomy::builtin();
	let composite = assemble_composite(&fixture(), taxonomy.coarse_mapping()).unwrap();
	// cargo and tanker sum to 0.6 under cargo_or_tanker, beating tug.
	assert_eq!(composite.known[1].inferred_label, "cargo_or_tanker");
	assert_eq!(composite.known[1].true_label.as_deref(), Some("tug"));
	assert_eq!(composite.known[0].inferred_label, "trawlers");
}

#[test]
fn test_missing_mapping() {
	let mapping: LabelMapping = vec![(
		"fishing".to_owned(),
		maplit::btreeset! { "trawlers".to_owned() },
	)];
	let result = assemble_composite(&fixture(), &mapping);
	assert!(matches!(
		result,
		Err(Error::MissingMapping { ref label }) if label == "tug"
	));
}
