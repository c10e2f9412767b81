//! # Feature Builder
//!
//! Turns an [`Applicant`] and the matched [`StateRates`] into the fixed-order
//! numeric vector the classifier was trained on. [`FEATURE_NAMES`] is the
//! trained schema: its order and length must never change, or predictions
//! against the existing artifact become silently wrong.
//!
//! The state code appears twice (`statename_encoded` and `statename`) because
//! the trained artifact expects both columns.

use crate::applicant::Applicant;
use crate::rates::StateRates;
use crate::states::encode_state;
use ndarray::{Array1, Array2};
use thiserror::Error;

/// Number of features in the trained schema.
pub const FEATURE_COUNT: usize = 15;

/// Column names of the trained schema, in order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "hh_school_attd",
    "hh_edu_level",
    "hh_trg",
    "hh_trg_type__2",
    "hh_plots_number",
    "has_fishery",
    "borrowed_money_rate",
    "cooperative_usage_rate",
    "savings_group_usage_rate",
    "village_assoc_rate",
    "thrift_usage_rate",
    "social_group_rate",
    "crop_diversity_score",
    "statename_encoded",
    "statename",
];

/// Position of the encoded state code.
pub const STATE_ENCODED_INDEX: usize = 13;
/// Position of the duplicated state code.
pub const STATE_DUPLICATE_INDEX: usize = 14;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeatureError {
    #[error(
        "State '{0}' is not one of the 36 recognized states; the state encoding table has no code for it."
    )]
    UnknownState(String),
}

/// An applicant encoded in trained column order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Names paired with values, in trained order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.values.iter().copied())
    }

    pub fn to_array(&self) -> Array1<f64> {
        Array1::from_vec(self.values.to_vec())
    }
}

impl std::ops::Index<usize> for FeatureVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.values[index]
    }
}

/// Encodes one applicant. Fails if the state is outside the encoding table.
pub fn build_features(
    applicant: &Applicant,
    rates: &StateRates,
) -> Result<FeatureVector, FeatureError> {
    let state_code = encode_state(&applicant.state)
        .ok_or_else(|| FeatureError::UnknownState(applicant.state.clone()))?;
    let state_code = f64::from(state_code);

    let values = [
        applicant.school_attended.encoded(),
        f64::from(applicant.education_level.tier()),
        applicant.training_attended.encoded(),
        applicant.vocational_training.encoded(),
        f64::from(applicant.plot_count),
        applicant.has_fishery.encoded(),
        rates.borrowed_money_rate,
        rates.cooperative_usage_rate,
        rates.savings_group_usage_rate,
        rates.village_assoc_rate,
        rates.thrift_usage_rate,
        rates.social_group_rate,
        f64::from(applicant.crop_count),
        state_code,
        state_code,
    ];

    Ok(FeatureVector { values })
}

/// Stacks vectors into a `[n, FEATURE_COUNT]` matrix, one row per applicant.
pub fn stack_rows(vectors: &[FeatureVector]) -> Array2<f64> {
    let mut matrix = Array2::zeros((vectors.len(), FEATURE_COUNT));
    for (mut row, vector) in matrix.rows_mut().into_iter().zip(vectors) {
        row.assign(&vector.to_array());
    }
    matrix
}
