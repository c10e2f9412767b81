//! # Assessment Pipeline
//!
//! [`Assessor`] owns the process-wide state: the state statistics table and
//! the classifier. It is built once by [`Assessor::initialize`] before any
//! request is handled and is only read afterwards, so it is shared by
//! reference with no locking.
//!
//! Each submission runs lookup → build → predict → advise to completion.

use crate::advice::{Advice, advise};
use crate::applicant::Applicant;
use crate::features::{FeatureError, FeatureVector, build_features};
use crate::model::{ModelError, Predictor, TrainedClassifier, Verdict};
use crate::rates::{DataError, StateRates, StateRatesTable};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssessError {
    #[error("Failed to load the state statistics dataset: {0}")]
    Data(#[from] DataError),
    #[error("Classifier error: {0}")]
    Model(#[from] ModelError),
    #[error("Invalid applicant: {0}")]
    Feature(#[from] FeatureError),
}

/// Result of one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub verdict: Verdict,
    /// Rates used for the applicant's state; defaults when the state had no data.
    pub rates: StateRates,
    pub features: FeatureVector,
    /// Present only for [`Verdict::AtRisk`].
    pub advice: Option<Advice>,
}

pub struct Assessor<P = TrainedClassifier> {
    rates: StateRatesTable,
    predictor: P,
}

impl Assessor<TrainedClassifier> {
    /// Loads the dataset and the classifier. Any failure here is fatal.
    pub fn initialize(dataset_path: &Path, model_path: &Path) -> Result<Self, AssessError> {
        let rates = StateRatesTable::load(dataset_path)?;
        let predictor = TrainedClassifier::load(model_path)?;
        Ok(Self::new(rates, predictor))
    }
}

impl<P: Predictor> Assessor<P> {
    pub fn new(rates: StateRatesTable, predictor: P) -> Self {
        Self { rates, predictor }
    }

    pub fn rates(&self) -> &StateRatesTable {
        &self.rates
    }

    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    /// Encodes the applicant against their state's statistics.
    pub fn features(&self, applicant: &Applicant) -> Result<FeatureVector, FeatureError> {
        let rates = self.rates.lookup(&applicant.state);
        build_features(applicant, &rates)
    }

    pub fn assess(&self, applicant: &Applicant) -> Result<Assessment, AssessError> {
        let rates = self.rates.lookup(&applicant.state);
        let features = build_features(applicant, &rates)?;
        let verdict = self.predictor.predict(&features)?;
        log::debug!("Applicant in '{}' assessed as {verdict}", applicant.state);

        let advice = match verdict {
            Verdict::Credible => None,
            Verdict::AtRisk => Some(advise(applicant, &rates)),
        };

        Ok(Assessment {
            verdict,
            rates,
            features,
            advice,
        })
    }
}
