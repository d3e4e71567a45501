use crate::error::InferenceError;
use crate::image_classifier::interpret::DecisionRecord;
use crate::image_classifier::pipeline::DefectClassifier;
use rayon::prelude::*;
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Decision {
        image_name: String,
        record: DecisionRecord,
    },
    Error {
        image_name: String,
        message: String,
    },
}

#[cfg(test)]
impl ItemOutcome {
    pub fn image_name(&self) -> &str {
        match self {
            ItemOutcome::Decision { image_name, .. } | ItemOutcome::Error { image_name, .. } => {
                image_name
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BulkSummary {
    pub defects: usize,
    pub no_defects: usize,
    pub errors: usize,
}

/// One outcome per input, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkResultSet {
    outcomes: Vec<ItemOutcome>,
}

impl BulkResultSet {
    pub fn from_outcomes(outcomes: Vec<ItemOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[ItemOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn summary(&self) -> BulkSummary {
        self.outcomes
            .iter()
            .fold(BulkSummary::default(), |mut summary, outcome| {
                match outcome {
                    ItemOutcome::Decision { record, .. } if record.has_defect => {
                        summary.defects += 1
                    }
                    ItemOutcome::Decision { .. } => summary.no_defects += 1,
                    ItemOutcome::Error { .. } => summary.errors += 1,
                }
                summary
            })
    }
}

impl DefectClassifier {
    pub fn classify_many(&self, items: &[(String, Vec<u8>)]) -> BulkResultSet {
        let outcomes: Vec<ItemOutcome> = match &self.bulk_pool {
            Some(pool) if items.len() > 1 => pool.install(|| {
                items
                    .par_iter()
                    .map(|item| self.classify_item(item))
                    .collect()
            }),
            _ => items.iter().map(|item| self.classify_item(item)).collect(),
        };

        let result_set = BulkResultSet::from_outcomes(outcomes);
        let summary = result_set.summary();
        let _ = self.logger.info(&format!(
            "bulk request: {} images, {} defects, {} clean, {} errors",
            result_set.len(),
            summary.defects,
            summary.no_defects,
            summary.errors
        ));

        result_set
    }

    /// A panic while classifying one item becomes that item's error outcome.
    fn classify_item(&self, (image_name, bytes): &(String, Vec<u8>)) -> ItemOutcome {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.classify(bytes)))
            .unwrap_or_else(|payload| {
                Err(InferenceError::Execution(format!(
                    "classification panicked: {}",
                    panic_message(&*payload)
                )))
            });

        match result {
            Ok(record) => ItemOutcome::Decision {
                image_name: image_name.clone(),
                record,
            },
            Err(e) => {
                let _ = self
                    .logger
                    .warn(&format!("classifying {} failed: {}", image_name, e));
                ItemOutcome::Error {
                    image_name: image_name.clone(),
                    message: e.to_string(),
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
