//! # Batch Scoring
//!
//! Applies the assessment pipeline to a tab-separated file of applicants and
//! writes one verdict row per applicant.
//!
//! Input columns: `school_attended`, `education_level`, `training`,
//! `vocational_training`, `plots`, `fishery`, `crops`, `state`, and an
//! optional `applicant_id` (1-based row numbers are used when it is absent).
//! Answers use the same labels as the interactive form.

use crate::advice::{Advice, advise};
use crate::applicant::{Applicant, EducationLevel, YesNo};
use crate::features::{FeatureError, stack_rows};
use crate::model::{ModelError, Predictor, Verdict};
use crate::pipeline::Assessor;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub const REQUIRED_COLUMNS: [&str; 8] = [
    "school_attended",
    "education_level",
    "training",
    "vocational_training",
    "plots",
    "fishery",
    "crops",
    "state",
];

const ID_COLUMN: &str = "applicant_id";

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Error from the underlying Polars DataFrame library: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to write the verdict table: {0}")]
    CsvError(#[from] csv::Error),
    #[error(
        "The required column '{0}' was not found in the applicants file. Please check spelling and case."
    )]
    ColumnNotFound(String),
    #[error("Row {row} has no value in column '{column}'.")]
    MissingValue { column: &'static str, row: usize },
    #[error("Row {row}, column '{column}': {reason}")]
    InvalidValue {
        column: &'static str,
        row: usize,
        reason: String,
    },
    #[error("Applicant '{id}': {source}")]
    Feature {
        id: String,
        source: FeatureError,
    },
    #[error("Classifier error: {0}")]
    Model(#[from] ModelError),
}

/// An applicant read from the batch file.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchApplicant {
    pub id: String,
    pub applicant: Applicant,
}

/// One output row.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRecord {
    pub id: String,
    pub state: String,
    pub verdict: Verdict,
    pub advice: Option<Advice>,
}

/// Reads and validates a tab-separated applicants file.
pub fn load_applicants(path: &Path) -> Result<Vec<BatchApplicant>, BatchError> {
    log::info!("Loading applicants from '{}'", path.display());

    // Every column is read as text; answers are parsed against their label tables.
    let df = CsvReader::new(File::open(path)?)
        .with_options(
            CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(Some(0))
                .with_parse_options(CsvParseOptions::default().with_separator(b'\t')),
        )
        .finish()?;

    let columns: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();
    for required in REQUIRED_COLUMNS {
        if !columns.iter().any(|name| name == required) {
            return Err(BatchError::ColumnNotFound(required.to_string()));
        }
    }
    let has_ids = columns.iter().any(|name| name == ID_COLUMN);

    let text = |name: &str| -> Result<Vec<Option<String>>, BatchError> {
        Ok(df
            .column(name)?
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|value| value.map(str::to_string))
            .collect())
    };

    let school = text("school_attended")?;
    let education = text("education_level")?;
    let training = text("training")?;
    let vocational = text("vocational_training")?;
    let plots = text("plots")?;
    let fishery = text("fishery")?;
    let crops = text("crops")?;
    let states = text("state")?;
    let ids = if has_ids { Some(text(ID_COLUMN)?) } else { None };

    let mut applicants = Vec::with_capacity(df.height());
    for index in 0..df.height() {
        let row = index + 1;
        let id = ids
            .as_ref()
            .and_then(|ids| ids[index].clone())
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| row.to_string());

        let applicant = Applicant {
            school_attended: internal::parse::<YesNo>(&school[index], "school_attended", row)?,
            education_level: internal::parse::<EducationLevel>(
                &education[index],
                "education_level",
                row,
            )?,
            training_attended: internal::parse::<YesNo>(&training[index], "training", row)?,
            vocational_training: internal::parse::<YesNo>(
                &vocational[index],
                "vocational_training",
                row,
            )?,
            plot_count: internal::parse::<u32>(&plots[index], "plots", row)?,
            has_fishery: internal::parse::<YesNo>(&fishery[index], "fishery", row)?,
            crop_count: internal::parse::<u32>(&crops[index], "crops", row)?,
            state: internal::required(&states[index], "state", row)?.to_string(),
        };
        applicants.push(BatchApplicant { id, applicant });
    }

    log::info!("Loaded {} applicants", applicants.len());
    Ok(applicants)
}

/// Assesses every applicant with a single classifier call over the stacked rows.
pub fn score_batch<P: Predictor>(
    assessor: &Assessor<P>,
    applicants: &[BatchApplicant],
) -> Result<Vec<BatchRecord>, BatchError> {
    let vectors = applicants
        .iter()
        .map(|entry| {
            assessor
                .features(&entry.applicant)
                .map_err(|source| BatchError::Feature {
                    id: entry.id.clone(),
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let verdicts = assessor.predictor().predict_rows(stack_rows(&vectors).view())?;

    let records: Vec<BatchRecord> = applicants
        .iter()
        .zip(verdicts)
        .map(|(entry, verdict)| {
            let advice = match verdict {
                Verdict::Credible => None,
                Verdict::AtRisk => {
                    let rates = assessor.rates().lookup(&entry.applicant.state);
                    Some(advise(&entry.applicant, &rates))
                }
            };
            BatchRecord {
                id: entry.id.clone(),
                state: entry.applicant.state.clone(),
                verdict,
                advice,
            }
        })
        .collect();

    let credible = records
        .iter()
        .filter(|record| record.verdict == Verdict::Credible)
        .count();
    log::info!(
        "Scored {} applicants: {credible} credible, {} at risk",
        records.len(),
        records.len() - credible
    );
    Ok(records)
}

/// Writes `applicant_id, state, verdict, label, tips` as TSV. Tips are joined by ` | `.
pub fn write_report(path: &Path, records: &[BatchRecord]) -> Result<(), BatchError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)?;
    writer.write_record(["applicant_id", "state", "verdict", "label", "tips"])?;
    for record in records {
        let tips = record
            .advice
            .as_ref()
            .map(|advice| {
                advice
                    .tips()
                    .iter()
                    .map(|tip| tip.message())
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .unwrap_or_default();
        let verdict = record.verdict.to_string();
        let label = record.verdict.label().to_string();
        writer.write_record([
            record.id.as_str(),
            record.state.as_str(),
            verdict.as_str(),
            label.as_str(),
            tips.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

mod internal {
    use super::*;

    pub(super) fn required<'a>(
        value: &'a Option<String>,
        column: &'static str,
        row: usize,
    ) -> Result<&'a str, BatchError> {
        match value.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(BatchError::MissingValue { column, row }),
        }
    }

    pub(super) fn parse<T>(
        value: &Option<String>,
        column: &'static str,
        row: usize,
    ) -> Result<T, BatchError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let text = required(value, column, row)?;
        text.parse::<T>().map_err(|err| BatchError::InvalidValue {
            column,
            row,
            reason: format!("'{text}' could not be parsed: {err}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str =
        "applicant_id\tschool_attended\teducation_level\ttraining\tvocational_training\tplots\tfishery\tcrops\tstate";

    fn create_test_tsv(rows: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn labels_and_numbers_are_parsed() {
        let file = create_test_tsv(&[
            "A-1\tYes\tJunior Secondary\tno\t1\t3\tNo\t2\tLagos",
            "\t0\t6\tYes\t0\t0\tyes\t5\takwa ibom",
        ]);
        let applicants = load_applicants(file.path()).unwrap();
        assert_eq!(applicants.len(), 2);

        assert_eq!(applicants[0].id, "A-1");
        let first = &applicants[0].applicant;
        assert_eq!(first.school_attended, YesNo::Yes);
        assert_eq!(first.education_level, EducationLevel::JuniorSecondary);
        assert_eq!(first.training_attended, YesNo::No);
        assert_eq!(first.vocational_training, YesNo::Yes);
        assert_eq!(first.plot_count, 3);
        assert_eq!(first.crop_count, 2);
        assert_eq!(first.state, "Lagos");

        assert_eq!(applicants[1].id, "2");
        assert_eq!(
            applicants[1].applicant.education_level,
            EducationLevel::Tertiary
        );
        assert_eq!(applicants[1].applicant.has_fishery, YesNo::Yes);
    }

    #[test]
    fn negative_plot_count_is_rejected() {
        let file = create_test_tsv(&["a\tYes\t3\tYes\tYes\t-1\tNo\t2\tkano"]);
        match load_applicants(file.path()).unwrap_err() {
            BatchError::InvalidValue { column, row, .. } => {
                assert_eq!(column, "plots");
                assert_eq!(row, 1);
            }
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn missing_column_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "school_attended\teducation_level").unwrap();
        writeln!(file, "Yes\t3").unwrap();
        file.flush().unwrap();
        match load_applicants(file.path()).unwrap_err() {
            BatchError::ColumnNotFound(column) => assert_eq!(column, "training"),
            other => panic!("Expected ColumnNotFound, got {:?}", other),
        }
    }
}
