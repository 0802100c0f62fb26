/*!
The label taxonomy: the ordered fine-grained vessel class vocabulary, the named categories that group fine labels, and the composite mappings derived from them (fine → coarse and fine → fishing / non_fishing).

A [`Taxonomy`](struct.Taxonomy.html) is built once from a [`TaxonomyConfig`](struct.TaxonomyConfig.html) and is read-only afterwards.
*/

use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// An ordered list of `(new_label, old_labels)` pairs used to remap scores into a coarser label space.
pub type LabelMapping = Vec<(String, BTreeSet<String>)>;

pub const FISHING: &str = "fishing";
pub const NON_FISHING: &str = "non_fishing";
pub const OTHER_FISHING: &str = "other_fishing";
pub const OTHER_NOT_FISHING: &str = "other_not_fishing";

/// The label used for vessels without a known class.
pub const UNKNOWN_LABEL: &str = "Unknown";

const FINE_LABELS: &[&str] = &[
	"cargo",
	"tanker",
	"reefer",
	"passenger",
	"tug",
	"seismic_vessel",
	"gear",
	"pilot",
	"supply_vessel",
	"research",
	"patrol_vessel",
	"drifting_longlines",
	"set_longlines",
	"squid_jigger",
	"purse_seines",
	"trawlers",
	"pots_and_traps",
	"set_gillnets",
	"pole_and_line",
	"trollers",
];

const CATEGORIES: &[(&str, &[&str])] = &[
	(
		FISHING,
		&[
			"drifting_longlines",
			"set_longlines",
			"squid_jigger",
			"purse_seines",
			"trawlers",
			"pots_and_traps",
			"set_gillnets",
			"pole_and_line",
			"trollers",
		],
	),
	(
		NON_FISHING,
		&[
			"cargo",
			"tanker",
			"reefer",
			"passenger",
			"tug",
			"seismic_vessel",
			"gear",
			"pilot",
			"supply_vessel",
			"research",
			"patrol_vessel",
		],
	),
	("cargo_or_tanker", &["cargo", "tanker", "reefer"]),
	("passenger", &["passenger"]),
	("tug", &["tug"]),
	("seismic_vessel", &["seismic_vessel"]),
	(OTHER_NOT_FISHING, &["pilot", "supply_vessel"]),
	("drifting_longlines", &["drifting_longlines"]),
	("gear", &["gear"]),
	("purse_seines", &["purse_seines"]),
	("set_gillnets", &["set_gillnets"]),
	("set_longlines", &["set_longlines"]),
	("pots_and_traps", &["pots_and_traps"]),
	("trawlers", &["trawlers"]),
	("squid_jigger", &["squid_jigger"]),
	(OTHER_FISHING, &["pole_and_line"]),
];

const COARSE_CATEGORIES: &[&str] = &[
	"cargo_or_tanker",
	"passenger",
	"tug",
	"seismic_vessel",
	OTHER_NOT_FISHING,
	"drifting_longlines",
	"gear",
	"purse_seines",
	"set_gillnets",
	"set_longlines",
	"pots_and_traps",
	"trawlers",
	"squid_jigger",
	OTHER_FISHING,
];

/// Gear types scored separately by fishing localisation. Every other label falls under [`OTHER_GEAR`](constant.OTHER_GEAR.html).
const GEAR_CATEGORIES: &[(&str, &str)] = &[
	("drifting_longlines", "drifting_longlines"),
	("trawlers", "trawlers"),
	("purse_seines", "purse_seines"),
	("pots_and_traps", "stationary_gear"),
	("set_gillnets", "stationary_gear"),
	("set_longlines", "stationary_gear"),
];

pub const OTHER_GEAR: &str = "other";

/// The localisation gear category of a vessel label.
pub fn gear_category(label: &str) -> &'static str {
	GEAR_CATEGORIES
		.iter()
		.find(|(gear, _)| *gear == label)
		.map(|(_, category)| *category)
		.unwrap_or(OTHER_GEAR)
}

/// The localisation gear categories in report order: sorted, then `other`.
pub fn gear_categories() -> Vec<&'static str> {
	let categories: BTreeSet<&'static str> =
		GEAR_CATEGORIES.iter().map(|(_, category)| *category).collect();
	categories
		.into_iter()
		.chain(std::iter::once(OTHER_GEAR))
		.collect()
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct TaxonomyConfig {
	/// The fine vocabulary in canonical order.
	pub fine_labels: Vec<String>,
	/// Named groups of fine labels. Must include `fishing` and `non_fishing`.
	pub categories: Vec<CategoryConfig>,
	/// The coarse label space, in order. Each entry names one of `categories`.
	pub coarse_categories: Vec<String>,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct CategoryConfig {
	pub name: String,
	pub labels: Vec<String>,
}

impl Default for TaxonomyConfig {
	fn default() -> Self {
		Self {
			fine_labels: FINE_LABELS.iter().map(|label| label.to_string()).collect(),
			categories: CATEGORIES
				.iter()
				.map(|(name, labels)| CategoryConfig {
					name: name.to_string(),
					labels: labels.iter().map(|label| label.to_string()).collect(),
				})
				.collect(),
			coarse_categories: COARSE_CATEGORIES
				.iter()
				.map(|category| category.to_string())
				.collect(),
		}
	}
}

#[derive(Clone, Debug)]
pub struct Taxonomy {
	fine_labels: Vec<String>,
	canonical_index: BTreeMap<String, usize>,
	categories: BTreeMap<String, BTreeSet<String>>,
	coarse_mapping: LabelMapping,
	fishing_mapping: LabelMapping,
}

impl Taxonomy {
	pub fn new(config: TaxonomyConfig) -> Result<Taxonomy> {
		let canonical_index = config
			.fine_labels
			.iter()
			.enumerate()
			.map(|(index, label)| (label.clone(), index))
			.collect();
		let categories: BTreeMap<String, BTreeSet<String>> = config
			.categories
			.into_iter()
			.map(|category| (category.name, category.labels.into_iter().collect()))
			.collect();
		let fishing = categories
			.get(FISHING)
			.ok_or_else(|| Error::UnknownCategory(FISHING.to_owned()))?
			.clone();
		let non_fishing = categories
			.get(NON_FISHING)
			.ok_or_else(|| Error::UnknownCategory(NON_FISHING.to_owned()))?
			.clone();

		// Each fine label may belong to at most one coarse category.
		let mut owner: BTreeMap<&str, &str> = BTreeMap::new();
		let mut coarse_mapping: LabelMapping = Vec::with_capacity(config.coarse_categories.len());
		for name in config.coarse_categories.iter() {
			let labels = categories
				.get(name)
				.ok_or_else(|| Error::UnknownCategory(name.clone()))?;
			for label in labels.iter() {
				if let Some(first) = owner.insert(label, name) {
					return Err(Error::OverlappingCategories {
						label: label.clone(),
						first: first.to_owned(),
						second: name.clone(),
					});
				}
			}
			coarse_mapping.push((name.clone(), labels.clone()));
		}

		// Fine labels without a coarse category fall into the catch-all of their fishing class.
		let unused: Vec<&String> = config
			.fine_labels
			.iter()
			.filter(|label| !owner.contains_key(label.as_str()))
			.collect();
		for (name, labels) in coarse_mapping.iter_mut() {
			let class = match name.as_str() {
				OTHER_FISHING => &fishing,
				OTHER_NOT_FISHING => &non_fishing,
				_ => continue,
			};
			labels.extend(
				unused
					.iter()
					.filter(|label| class.contains(label.as_str()))
					.map(|label| label.to_string()),
			);
		}

		let fishing_mapping = vec![
			(FISHING.to_owned(), fishing),
			(NON_FISHING.to_owned(), non_fishing),
		];
		Ok(Taxonomy {
			fine_labels: config.fine_labels,
			canonical_index,
			categories,
			coarse_mapping,
			fishing_mapping,
		})
	}

	/// The taxonomy built from the static vessel class tables.
	pub fn builtin() -> Taxonomy {
		Taxonomy::new(TaxonomyConfig::default()).expect("the built-in taxonomy is well formed")
	}

	/// The fine vocabulary in canonical order.
	pub fn fine_labels(&self) -> &[String] {
		&self.fine_labels
	}

	pub fn contains(&self, label: &str) -> bool {
		self.canonical_index.contains_key(label)
	}

	pub fn canonical_index(&self, label: &str) -> Option<usize> {
		self.canonical_index.get(label).copied()
	}

	pub fn category(&self, name: &str) -> Option<&BTreeSet<String>> {
		self.categories.get(name)
	}

	pub fn is_fishing(&self, label: &str) -> bool {
		self.fishing_mapping[0].1.contains(label)
	}

	pub fn coarse_mapping(&self) -> &LabelMapping {
		&self.coarse_mapping
	}

	pub fn fishing_mapping(&self) -> &LabelMapping {
		&self.fishing_mapping
	}

	/**
	Sort `labels` into canonical vocabulary order. Labels outside the vocabulary are logged and placed after every vocabulary label, in lexical order.
	*/
	pub fn sort_labels<I>(&self, labels: I) -> Vec<String>
	where
		I: IntoIterator<Item = String>,
	{
		let mut labels: Vec<String> = labels.into_iter().collect();
		for label in labels.iter().filter(|label| !self.contains(label)) {
			warn!("{} is not in the fine label vocabulary", label);
		}
		labels.sort_by(|a, b| {
			let a_key = (self.canonical_index(a).unwrap_or(usize::MAX), a);
			let b_key = (self.canonical_index(b).unwrap_or(usize::MAX), b);
			a_key.cmp(&b_key)
		});
		labels.dedup();
		labels
	}
}

#[test]
fn test_builtin_coarse_mapping_partitions_vocabulary() {
	let taxonomy = Taxonomy::builtin();
	let mut seen = BTreeSet::new();
	for (_, labels) in taxonomy.coarse_mapping() {
		for label in labels {
			assert!(seen.insert(label.clone()), "{} mapped twice", label);
		}
	}
	let vocabulary: BTreeSet<String> = taxonomy.fine_labels().iter().cloned().collect();
	assert_eq!(seen, vocabulary);
	let names: Vec<&str> = taxonomy
		.coarse_mapping()
		.iter()
		.map(|(name, _)| name.as_str())
		.collect();
	assert_eq!(names, COARSE_CATEGORIES);
}

#[test]
fn test_catch_all_categories() {
	let taxonomy = Taxonomy::builtin();
	let find = |name: &str| {
		taxonomy
			.coarse_mapping()
			.iter()
			.find(|(category, _)| category == name)
			.map(|(_, labels)| labels.iter().map(|label| label.as_str()).collect::<Vec<_>>())
			.unwrap()
	};
	assert_eq!(find(OTHER_FISHING), vec!["pole_and_line", "trollers"]);
	assert_eq!(
		find(OTHER_NOT_FISHING),
		vec!["patrol_vessel", "pilot", "research", "supply_vessel"]
	);
}

#[test]
fn test_overlapping_categories() {
	let mut config = TaxonomyConfig::default();
	config
		.categories
		.iter_mut()
		.find(|category| category.name == "tug")
		.unwrap()
		.labels
		.push("cargo".to_owned());
	assert!(matches!(
		Taxonomy::new(config),
		Err(Error::OverlappingCategories { .. })
	));
}

#[test]
fn test_sort_labels() {
	let taxonomy = Taxonomy::builtin();
	let labels = vec![
		"trawlers".to_owned(),
		"mystery".to_owned(),
		"cargo".to_owned(),
		"tug".to_owned(),
	];
	assert_eq!(
		taxonomy.sort_labels(labels),
		vec!["cargo", "tug", "trawlers", "mystery"]
	);
}

#[test]
fn test_gear_category() {
	assert_eq!(gear_category("set_gillnets"), "stationary_gear");
	assert_eq!(gear_category("trawlers"), "trawlers");
	assert_eq!(gear_category("squid_jigger"), OTHER_GEAR);
	assert_eq!(
		gear_categories(),
		vec![
			"drifting_longlines",
			"purse_seines",
			"stationary_gear",
			"trawlers",
			"other"
		]
	);
}
