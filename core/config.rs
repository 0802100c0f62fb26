/*!
This module defines the `EvaluationConfig` struct, which is used to configure an evaluation run with [`evaluate`](../evaluate/fn.evaluate.html). Every field is optional. The accessors of the same name resolve the defaults.
*/

use crate::{
	error::Result,
	ground_truth::{DEFAULT_ATTRIBUTES, DEFAULT_TEST_SPLIT},
	taxonomy::{Taxonomy, TaxonomyConfig},
};
use vessel_eval_metrics::DEFAULT_MAX_WEIGHT;

pub const DEFAULT_CLASSIFICATION_FIELD: &str = "Multiclass";

pub const DEFAULT_DUMP_YEARS: &[i32] = &[2012, 2013, 2014, 2015, 2016, 2017];

#[derive(Debug, Default, serde::Deserialize)]
pub struct EvaluationConfig {
	pub test_split: Option<String>,
	pub classification_field: Option<String>,
	pub attributes: Option<Vec<String>>,
	pub dump_years: Option<Vec<i32>>,
	pub max_weight: Option<f64>,
	pub test_only: Option<bool>,
	pub taxonomy: Option<TaxonomyConfig>,
	pub skip_class_metrics: Option<bool>,
	pub skip_attribute_metrics: Option<bool>,
	pub skip_localisation_metrics: Option<bool>,
}

impl EvaluationConfig {
	pub fn from_json_str(json: &str) -> Result<EvaluationConfig> {
		Ok(serde_json::from_str(json)?)
	}

	pub fn from_reader<R>(reader: R) -> Result<EvaluationConfig>
	where
		R: std::io::Read,
	{
		Ok(serde_json::from_reader(reader)?)
	}

	pub fn test_split(&self) -> &str {
		self.test_split.as_deref().unwrap_or(DEFAULT_TEST_SPLIT)
	}

	pub fn classification_field(&self) -> &str {
		self.classification_field
			.as_deref()
			.unwrap_or(DEFAULT_CLASSIFICATION_FIELD)
	}

	pub fn attributes(&self) -> Vec<String> {
		match &self.attributes {
			Some(attributes) => attributes.clone(),
			None => DEFAULT_ATTRIBUTES.iter().map(|field| field.to_string()).collect(),
		}
	}

	pub fn dump_years(&self) -> &[i32] {
		self.dump_years.as_deref().unwrap_or(DEFAULT_DUMP_YEARS)
	}

	pub fn max_weight(&self) -> f64 {
		self.max_weight.unwrap_or(DEFAULT_MAX_WEIGHT)
	}

	pub fn test_only(&self) -> bool {
		self.test_only.unwrap_or(false)
	}

	pub fn skip_class_metrics(&self) -> bool {
		self.skip_class_metrics.unwrap_or(false)
	}

	pub fn skip_attribute_metrics(&self) -> bool {
		self.skip_attribute_metrics.unwrap_or(false)
	}

	pub fn skip_localisation_metrics(&self) -> bool {
		self.skip_localisation_metrics.unwrap_or(false)
	}

	/// Build the configured taxonomy, or the built-in one.
	pub fn taxonomy(&self) -> Result<Taxonomy> {
		Taxonomy::new(self.taxonomy.clone().unwrap_or_default())
	}
}

#[test]
fn test_defaults() {
	let config = EvaluationConfig::from_json_str("{}").unwrap();
	assert_eq!(config.test_split(), "Test");
	assert_eq!(config.classification_field(), "Multiclass");
	assert_eq!(
		config.attributes(),
		vec!["length", "tonnage", "engine_power", "crew_size"]
	);
	assert_eq!(config.dump_years(), &[2012, 2013, 2014, 2015, 2016, 2017]);
	assert_eq!(config.max_weight(), 200.0);
	assert!(!config.test_only());
	assert!(!config.skip_localisation_metrics());
	assert_eq!(config.taxonomy().unwrap().fine_labels().len(), 20);
}

#[test]
fn test_overrides() {
	let config = EvaluationConfig::from_json_str(
		r#"{
			"test_split": "Holdout",
			"attributes": ["length"],
			"dump_years": [],
			"test_only": true,
			"taxonomy": {
				"fine_labels": ["trawlers", "cargo"],
				"categories": [
					{"name": "fishing", "labels": ["trawlers"]},
					{"name": "non_fishing", "labels": ["cargo"]}
				],
				"coarse_categories": ["fishing", "non_fishing"]
			}
		}"#,
	)
	.unwrap();
	assert_eq!(config.test_split(), "Holdout");
	assert_eq!(config.attributes(), vec!["length"]);
	assert!(config.dump_years().is_empty());
	assert!(config.test_only());
	let taxonomy = config.taxonomy().unwrap();
	assert_eq!(taxonomy.fine_labels(), &["trawlers", "cargo"]);
	assert!(taxonomy.is_fishing("trawlers"));
}
