use crate::{
	agreement::{compute_fishing_range_agreement, AgreementReport, PackedAgreement},
	composite::assemble_composite,
	config::EvaluationConfig,
	error::Result,
	extract::{
		load_inferred, AttributeExtractor, AttributeResults, ClassificationExtractor, Extractor,
		FishingRangeExtractor, FishingRangeResults, InferenceResults,
	},
	ground_truth::{GroundTruth, TrueFishingRanges},
	localisation::{
		compare_fishing_localisation, localisation_report, LocalisationReport, LocalisationResults,
	},
	record::InferenceRecord,
	report::{attribute_report, classification_report, AttributeReport, ClassificationReport},
	taxonomy::Taxonomy,
};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// The label spaces a classification is scored in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassificationLevel {
	Fishing,
	Coarse,
	Fine,
}

impl ClassificationLevel {
	pub fn heading(self) -> &'static str {
		match self {
			ClassificationLevel::Fishing => "Is Fishing",
			ClassificationLevel::Coarse => "Coarse Labels",
			ClassificationLevel::Fine => "Fine Labels",
		}
	}
}

/// Annotated fishing activity to score localisation against.
#[derive(Clone, Copy, Default)]
pub struct FishingTruth<'a> {
	pub ranges: Option<&'a TrueFishingRanges<bool>>,
	pub agreement_ranges: Option<&'a TrueFishingRanges<PackedAgreement>>,
}

#[derive(Debug, Default)]
pub struct Evaluation {
	pub fine: Option<InferenceResults>,
	pub coarse: Option<InferenceResults>,
	pub fishing: Option<InferenceResults>,
	/// Reports of the non-empty classifications, fishing first and fine last.
	pub classification_reports: Vec<(ClassificationLevel, ClassificationReport)>,
	pub attributes: Vec<AttributeResults>,
	/// Reports of the non-empty attributes, in configured order.
	pub attribute_reports: Vec<AttributeReport>,
	pub fishing_ranges: Option<FishingRangeResults>,
	pub localisation: Option<LocalisationResults>,
	pub localisation_report: Option<LocalisationReport>,
	pub agreement: Option<AgreementReport>,
}

/**
Run a whole evaluation: one pass over `records` feeding every enabled extractor, then consolidation and scoring.

The fine classification is remapped into the coarse and fishing label spaces of `taxonomy`. Localisation is compared against `fishing_truth` when its ranges are given.
*/
pub fn evaluate<I>(
	config: &EvaluationConfig,
	taxonomy: &Taxonomy,
	ground_truth: &GroundTruth,
	records: I,
	fishing_truth: FishingTruth,
) -> Result<Evaluation>
where
	I: IntoIterator<Item = Result<InferenceRecord>>,
{
	let label_map = ground_truth.labels();
	let attribute_maps: Vec<(String, BTreeMap<String, f64>)> = config
		.attributes()
		.into_iter()
		.map(|field| {
			let values = ground_truth.attribute(&field);
			(field, values)
		})
		.collect();

	let mut classification_extractor = if config.skip_class_metrics() {
		None
	} else {
		Some(ClassificationExtractor::new(
			config.classification_field(),
			label_map,
			taxonomy,
		))
	};
	let mut attribute_extractors: Vec<AttributeExtractor> = if config.skip_attribute_metrics() {
		Vec::new()
	} else {
		attribute_maps
			.iter()
			.map(|(field, values)| AttributeExtractor::new(field.as_str(), values, label_map))
			.collect()
	};
	let mut fishing_range_extractor = if config.skip_localisation_metrics() {
		None
	} else {
		Some(FishingRangeExtractor::new())
	};

	info!("loading inference data");
	let allow_list = if config.test_only() {
		Some(ground_truth.allow_list())
	} else {
		None
	};
	{
		let mut extractors: Vec<&mut dyn Extractor> = Vec::new();
		if let Some(extractor) = classification_extractor.as_mut() {
			extractors.push(extractor);
		}
		for extractor in attribute_extractors.iter_mut() {
			extractors.push(extractor);
		}
		if let Some(extractor) = fishing_range_extractor.as_mut() {
			extractors.push(extractor);
		}
		load_inferred(records, &mut extractors, allow_list.as_ref())?;
	}

	let mut evaluation = Evaluation::default();

	if let Some(extractor) = classification_extractor {
		let fine = extractor.finalize();
		info!("assembling coarse data");
		let coarse = assemble_composite(&fine, taxonomy.coarse_mapping())?;
		info!("assembling fishing data");
		let fishing = assemble_composite(&fine, taxonomy.fishing_mapping())?;
		for (level, results) in [
			(ClassificationLevel::Fishing, &fishing),
			(ClassificationLevel::Coarse, &coarse),
			(ClassificationLevel::Fine, &fine),
		]
		.iter()
		{
			if results.is_empty() {
				continue;
			}
			info!("scoring {}", level.heading());
			let report = classification_report(results, config.max_weight());
			evaluation.classification_reports.push((*level, report));
		}
		evaluation.fine = Some(fine);
		evaluation.coarse = Some(coarse);
		evaluation.fishing = Some(fishing);
	}

	for extractor in attribute_extractors {
		let results = extractor.finalize();
		warn_negative(&results);
		if !results.is_empty() {
			info!("scoring {}", results.field);
			evaluation.attribute_reports.push(attribute_report(&results));
		}
		evaluation.attributes.push(results);
	}

	if let Some(extractor) = fishing_range_extractor {
		let predictions = extractor.finalize();
		if let Some(truth) = fishing_truth.ranges {
			info!("comparing localisation");
			let localisation = compare_fishing_localisation(&predictions, truth);
			if !localisation.is_empty() {
				evaluation.localisation_report = Some(localisation_report(&localisation, label_map));
			}
			evaluation.localisation = Some(localisation);
		}
		if let Some(truth) = fishing_truth.agreement_ranges {
			info!("comparing agreement");
			evaluation.agreement = Some(compute_fishing_range_agreement(&predictions, truth)?);
		}
		evaluation.fishing_ranges = Some(predictions);
	}

	Ok(evaluation)
}

fn warn_negative(results: &AttributeResults) {
	let negative: Vec<f64> = results
		.rows
		.iter()
		.map(|row| row.inferred)
		.filter(|value| *value < 0.0)
		.collect();
	if negative.is_empty() {
		return;
	}
	let min = negative.iter().cloned().fold(std::f64::INFINITY, f64::min);
	warn!(
		"inferred values less than zero for {} ({}, {} / {})",
		results.field,
		min,
		negative.len(),
		results.rows.len()
	);
}
