use vessel_eval_core::{
	agreement::PackedAgreement,
	evaluate::ClassificationLevel,
	export::{label_tables, write_labels, ALL_YEARS},
	ground_truth::{GroundTruth, TrueFishingRanges},
	record::InferenceRecord,
	evaluate, EvaluationConfig, FishingTruth,
};

const VESSELS: &str = "\
mmsi,label,length,tonnage,engine_power,crew_size,split
1,trawlers,30,,,,Test
2,cargo,150,,,,Test
3,set_gillnets,12,,,,Test
4,tug,25,,,,Training
";

const INFERENCE: &str = r#"
{"mmsi": "1", "start_time": "2015-01-01T00:00:00Z", "Multiclass": {"label_scores": {"trawlers": 0.8, "cargo": 0.2}, "max_label": "trawlers"}, "length": {"value": 28.0}}
{"mmsi": "2", "start_time": "2015-01-01T00:00:00Z", "Multiclass": {"label_scores": {"cargo": 0.9, "trawlers": 0.1}, "max_label": "cargo"}, "length": {"value": 140.0}}
{"mmsi": "3", "start_time": "2015-03-01T00:00:00Z", "end_time": "2015-03-01T00:19:00Z", "Multiclass": {"label_scores": {"set_gillnets": 0.3, "trawlers": 0.5, "cargo": 0.2}, "max_label": "trawlers"}, "length": {"value": 14.0}, "fishing_localisation": [{"start_time": "2015-03-01T00:05:00Z", "end_time": "2015-03-01T00:14:00Z", "value": true}]}
{"mmsi": "4", "start_time": "2015-01-01T00:00:00Z", "Multiclass": {"label_scores": {"tug": 1.0}, "max_label": "tug"}}
"#;

const FISHING_RANGES: &str = "\
mmsi,start_time,end_time,is_fishing
3,2015-03-01T00:00:00,2015-03-01T00:09:00,1
4,2015-03-01T00:00:00,2015-03-01T00:09:00,1
";

const AGREEMENT_RANGES: &str = "\
mmsi,start_time,end_time,is_fishing
3,2015-03-01T00:00:00,2015-03-01T00:09:00,0.002003
";

fn records() -> impl Iterator<Item = vessel_eval_core::Result<InferenceRecord>> {
	INFERENCE
		.lines()
		.filter(|line| !line.trim().is_empty())
		.map(InferenceRecord::from_json_str)
}

#[test]
fn test_evaluate() {
	let config = EvaluationConfig::from_json_str(r#"{"test_only": true}"#).unwrap();
	let taxonomy = config.taxonomy().unwrap();
	let ground_truth = GroundTruth::from_csv(
		VESSELS.as_bytes(),
		&taxonomy,
		config.test_split(),
		&config.attributes(),
	)
	.unwrap();
	let ranges = TrueFishingRanges::binary_from_csv(FISHING_RANGES.as_bytes(), &ground_truth).unwrap();
	let agreement_ranges: TrueFishingRanges<PackedAgreement> =
		TrueFishingRanges::agreement_from_csv(AGREEMENT_RANGES.as_bytes(), &ground_truth).unwrap();
	let evaluation = evaluate(
		&config,
		&taxonomy,
		&ground_truth,
		records(),
		FishingTruth {
			ranges: Some(&ranges),
			agreement_ranges: Some(&agreement_ranges),
		},
	)
	.unwrap();

	// The training split vessel is filtered out of the stream.
	let fine = evaluation.fine.as_ref().unwrap();
	assert_eq!(fine.all.len(), 3);
	assert_eq!(fine.label_list, vec!["cargo", "trawlers", "set_gillnets"]);

	let levels: Vec<ClassificationLevel> = evaluation
		.classification_reports
		.iter()
		.map(|(level, _)| *level)
		.collect();
	assert_eq!(
		levels,
		vec![
			ClassificationLevel::Fishing,
			ClassificationLevel::Coarse,
			ClassificationLevel::Fine
		]
	);
	let accuracies: Vec<f64> = evaluation
		.classification_reports
		.iter()
		.map(|(_, report)| report.accuracy)
		.collect();
	assert_eq!(accuracies[0], 1.0);
	assert!((accuracies[1] - 2.0 / 3.0).abs() < 1e-12);
	assert!((accuracies[2] - 2.0 / 3.0).abs() < 1e-12);
	let raw_sum: u64 = evaluation.classification_reports[2].1.confusion_matrix.raw.sum();
	assert_eq!(raw_sum, 3);

	// Only length has inferred values.
	assert_eq!(evaluation.attribute_reports.len(), 1);
	let length = &evaluation.attribute_reports[0];
	assert_eq!(length.field, "length");
	assert!((length.rms_error - 6.0).abs() < 1e-12);
	assert!((length.abs_error - 14.0 / 3.0).abs() < 1e-12);

	let localisation = evaluation.localisation_report.as_ref().unwrap();
	assert_eq!(localisation.overall.n_vessels, 1);
	assert_eq!(localisation.overall.n_minutes, 10);
	assert_eq!(localisation.overall.accuracy, 0.5);
	assert_eq!(localisation.by_gear.len(), 1);
	assert_eq!(localisation.by_gear[0].category, "stationary_gear");

	let agreement = evaluation.agreement.as_ref().unwrap();
	assert_eq!(agreement.model_agreement_ratio(), Some(0.5));

	let tables = label_tables(fine, &[2015, 2016]);
	assert_eq!(tables.len(), 2);
	assert_eq!(tables[0].0, ALL_YEARS);
	let mut output = Vec::new();
	write_labels(&mut output, &tables[0].1).unwrap();
	insta::assert_snapshot!(String::from_utf8(output).unwrap(), @r###"
 mmsi,inferred,score,known
 1,trawlers,0.8,trawlers
 2,cargo,0.9,cargo
 3,trawlers,0.5,set_gillnets
 "###);
}

#[test]
fn test_skipped_metrics() {
	let config = EvaluationConfig::from_json_str(
		r#"{"skip_class_metrics": true, "skip_localisation_metrics": true}"#,
	)
	.unwrap();
	let taxonomy = config.taxonomy().unwrap();
	let ground_truth = GroundTruth::from_csv(
		VESSELS.as_bytes(),
		&taxonomy,
		config.test_split(),
		&config.attributes(),
	)
	.unwrap();
	let evaluation = evaluate(
		&config,
		&taxonomy,
		&ground_truth,
		records(),
		FishingTruth::default(),
	)
	.unwrap();
	assert!(evaluation.fine.is_none());
	assert!(evaluation.classification_reports.is_empty());
	assert!(evaluation.localisation.is_none());
	assert!(evaluation.agreement.is_none());
	// Every vessel is streamed without the allow list.
	assert_eq!(evaluation.attributes[0].rows.len(), 3);
}

#[test]
fn test_invalid_record_aborts() {
	let config = EvaluationConfig::default();
	let taxonomy = config.taxonomy().unwrap();
	let ground_truth = GroundTruth::default();
	let records = vec![InferenceRecord::from_json_str(
		r#"{"mmsi": "1", "start_time": "not a time"}"#,
	)];
	let result = evaluate(
		&config,
		&taxonomy,
		&ground_truth,
		records,
		FishingTruth::default(),
	);
	assert!(matches!(
		result,
		Err(vessel_eval_core::Error::InvalidTimestamp(_))
	));
}
