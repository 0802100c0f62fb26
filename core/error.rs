use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
	#[error("could not parse timestamp \"{0}\"")]
	InvalidTimestamp(String),
	#[error("label \"{label}\" is not covered by any set of the composite mapping")]
	MissingMapping { label: String },
	#[error("invalid {field} for vessel {mmsi}: \"{value}\"")]
	InvalidAttribute {
		field: String,
		mmsi: String,
		value: String,
	},
	#[error("missing field \"{0}\"")]
	MissingField(String),
	#[error("label \"{label}\" belongs to both {first} and {second}")]
	OverlappingCategories {
		label: String,
		first: String,
		second: String,
	},
	#[error("unknown category \"{0}\"")]
	UnknownCategory(String),
	#[error("vessel {mmsi}: {realized} agreeing raters exceed the {possible} possible")]
	InconsistentAgreement {
		mmsi: String,
		realized: f64,
		possible: f64,
	},
	#[error(transparent)]
	Csv(#[from] csv::Error),
	#[error(transparent)]
	Io(#[from] std::io::Error),
	#[error(transparent)]
	Json(#[from] serde_json::Error),
}
