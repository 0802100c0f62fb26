/*!
This crate scores the output of a vessel classifier against ground truth.

Inference records stream through [`load_inferred`](extract/fn.load_inferred.html) into extractors, one per kind of prediction. Classification results are consolidated per vessel across dates, remapped into the coarse and fishing label spaces of the [`Taxonomy`](taxonomy/struct.Taxonomy.html), and scored with a confusion matrix and per-label precision, recall and F1. Continuous attributes are scored with RMS and absolute errors. Predicted fishing activity is compared minute by minute with annotated fishing ranges, and with the verdicts of multiple human raters.

[`evaluate`](evaluate/fn.evaluate.html) runs all of it from an [`EvaluationConfig`](config/struct.EvaluationConfig.html).
*/

#![allow(clippy::tabs_in_doc_comments)]

pub mod agreement;
pub mod composite;
pub mod config;
pub mod consolidate;
pub mod error;
pub mod evaluate;
pub mod export;
pub mod extract;
pub mod ground_truth;
pub mod localisation;
pub mod record;
pub mod report;
pub mod taxonomy;
pub mod time;

pub use self::{
	config::EvaluationConfig,
	error::{Error, Result},
	evaluate::{evaluate, Evaluation, FishingTruth},
};
