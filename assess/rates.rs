//! # State Statistics Table
//!
//! Per-state averages of six informal-finance participation rates. The table
//! is computed once from the historical survey dataset and is read-only
//! afterwards.
//!
//! - Strict Schema: the dataset must carry a `statename` column and the six
//!   rate columns named in [`RATE_COLUMNS`]. Other columns are ignored; every
//!   field is read as text so no column's type is guessed from a prefix of rows.
//! - Missing Values: a missing rate is skipped when averaging, so a state's
//!   mean is taken over its non-null values only.
//! - Fallback: any state absent from the table resolves to
//!   [`StateRates::DEFAULT`], never to an error.

use crate::states::{STATE_ENCODING, normalize_state_name};
use ahash::AHashMap;
use itertools::Itertools;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

/// Column holding the state name in the dataset.
pub const STATE_COLUMN: &str = "statename";

/// The six rate columns, in the order they enter the feature vector.
pub const RATE_COLUMNS: [&str; 6] = [
    "borrowed_money_rate",
    "cooperative_usage_rate",
    "savings_group_usage_rate",
    "village_assoc_rate",
    "thrift_usage_rate",
    "social_group_rate",
];

/// Value used for every rate of a state with no data.
pub const DEFAULT_RATE: f64 = 0.5;

/// Mean participation rates for one state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateRates {
    pub borrowed_money_rate: f64,
    pub cooperative_usage_rate: f64,
    pub savings_group_usage_rate: f64,
    pub village_assoc_rate: f64,
    pub thrift_usage_rate: f64,
    pub social_group_rate: f64,
}

impl StateRates {
    /// The record returned for unrecognized states.
    pub const DEFAULT: StateRates = StateRates {
        borrowed_money_rate: DEFAULT_RATE,
        cooperative_usage_rate: DEFAULT_RATE,
        savings_group_usage_rate: DEFAULT_RATE,
        village_assoc_rate: DEFAULT_RATE,
        thrift_usage_rate: DEFAULT_RATE,
        social_group_rate: DEFAULT_RATE,
    };

    /// The rates in [`RATE_COLUMNS`] order.
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.borrowed_money_rate,
            self.cooperative_usage_rate,
            self.savings_group_usage_rate,
            self.village_assoc_rate,
            self.thrift_usage_rate,
            self.social_group_rate,
        ]
    }

    fn from_array(values: [f64; 6]) -> Self {
        let [
            borrowed_money_rate,
            cooperative_usage_rate,
            savings_group_usage_rate,
            village_assoc_rate,
            thrift_usage_rate,
            social_group_rate,
        ] = values;
        StateRates {
            borrowed_money_rate,
            cooperative_usage_rate,
            savings_group_usage_rate,
            village_assoc_rate,
            thrift_usage_rate,
            social_group_rate,
        }
    }
}

impl Default for StateRates {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Errors raised while reading or validating the statistics dataset.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Error from the underlying Polars DataFrame library: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error(
        "The required column '{0}' was not found in the dataset. Please check spelling and case."
    )]
    ColumnNotFound(String),
    #[error(
        "The required column '{column_name}' could not be converted to the expected type '{expected_type}'. (Found type: {found_type})"
    )]
    ColumnWrongType {
        column_name: String,
        expected_type: &'static str,
        found_type: String,
    },
    #[error("Non-finite values (NaN or Infinity) were found in the rate column '{0}'.")]
    NonFiniteValuesFound(String),
    #[error("Rate column '{column_name}' holds {value} at row {row}; rates must lie in [0, 1].")]
    RateOutOfRange {
        column_name: String,
        value: f64,
        row: usize,
    },
    #[error("The dataset contains no rows.")]
    EmptyDataset,
}

/// Mapping from lowercase state name to its averaged rates.
#[derive(Debug, Clone, Default)]
pub struct StateRatesTable {
    rates: AHashMap<String, StateRates>,
}

impl StateRatesTable {
    /// Reads a comma-separated dataset from `path` and aggregates it.
    pub fn load(path: &Path) -> Result<Self, DataError> {
        log::info!("Loading state statistics from '{}'", path.display());
        let dataset = CsvReader::new(File::open(path)?)
            .with_options(
                CsvReadOptions::default()
                    .with_has_header(true)
                    .with_infer_schema_length(Some(0)),
            )
            .finish()?;
        log::debug!(
            "Dataset has {} rows and {} columns",
            dataset.height(),
            dataset.width()
        );
        Self::build(dataset)
    }

    /// Groups `dataset` by lowercased state name and averages the rate columns.
    pub fn build(mut dataset: DataFrame) -> Result<Self, DataError> {
        if dataset.height() == 0 {
            return Err(DataError::EmptyDataset);
        }

        let present: Vec<String> = dataset
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        for required in std::iter::once(STATE_COLUMN).chain(RATE_COLUMNS) {
            if !present.iter().any(|name| name == required) {
                return Err(DataError::ColumnNotFound(required.to_string()));
            }
        }

        let normalized: Vec<Option<String>> = dataset
            .column(STATE_COLUMN)?
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|name| name.map(normalize_state_name))
            .collect();
        dataset.with_column(Series::new(STATE_COLUMN.into(), normalized))?;

        for column_name in RATE_COLUMNS {
            let casted = internal::validated_rate_column(&dataset, column_name)?;
            dataset.with_column(casted)?;
        }

        let aggregated = dataset
            .lazy()
            .filter(col(STATE_COLUMN).is_not_null())
            .group_by([col(STATE_COLUMN)])
            .agg(
                RATE_COLUMNS
                    .iter()
                    .map(|name| col(*name).mean())
                    .collect::<Vec<_>>(),
            )
            .collect()?;

        let names = aggregated.column(STATE_COLUMN)?.str()?;
        let means = RATE_COLUMNS
            .iter()
            .map(|name| aggregated.column(name).and_then(|column| column.f64()))
            .collect::<PolarsResult<Vec<_>>>()?;

        let mut rates = AHashMap::with_capacity(aggregated.height());
        for row in 0..aggregated.height() {
            let Some(name) = names.get(row) else {
                continue;
            };
            let mut values = [DEFAULT_RATE; 6];
            for (slot, (column_name, column)) in RATE_COLUMNS.iter().zip(&means).enumerate() {
                match column.get(row) {
                    Some(mean) => values[slot] = mean,
                    None => log::warn!(
                        "State '{name}' has no recorded values for '{column_name}'; using {DEFAULT_RATE}"
                    ),
                }
            }
            rates.insert(name.to_string(), StateRates::from_array(values));
        }

        for (known, _) in STATE_ENCODING {
            if !rates.contains_key(known) {
                log::warn!("Dataset has no rows for state '{known}'; lookups will use defaults");
            }
        }
        log::info!("Computed averages for {} states", rates.len());

        Ok(Self { rates })
    }

    /// Returns the averaged rates for `name`, or [`StateRates::DEFAULT`] when absent.
    pub fn lookup(&self, name: &str) -> StateRates {
        match self.rates.get(&normalize_state_name(name)) {
            Some(rates) => *rates,
            None => {
                log::debug!("No statistics for state '{name}'; falling back to defaults");
                StateRates::DEFAULT
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rates.contains_key(&normalize_state_name(name))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Aggregated states sorted by name.
    pub fn states(&self) -> impl Iterator<Item = (&str, &StateRates)> {
        self.rates
            .iter()
            .map(|(name, rates)| (name.as_str(), rates))
            .sorted_by(|a, b| a.0.cmp(b.0))
    }
}

mod internal {
    use super::*;

    /// Casts a rate column to f64 and checks every non-null value is a finite fraction.
    pub(super) fn validated_rate_column(
        dataset: &DataFrame,
        column_name: &str,
    ) -> Result<Column, DataError> {
        let column = dataset.column(column_name)?;
        let wrong_type = || DataError::ColumnWrongType {
            column_name: column_name.to_string(),
            expected_type: "f64 (numeric)",
            found_type: format!("{:?}", column.dtype()),
        };

        let casted = column.cast(&DataType::Float64).map_err(|_| wrong_type())?;
        // A failed string-to-number conversion shows up as new nulls.
        if casted.null_count() > column.null_count() {
            return Err(wrong_type());
        }

        for (row, value) in casted.f64()?.into_iter().enumerate() {
            let Some(value) = value else {
                continue;
            };
            if !value.is_finite() {
                return Err(DataError::NonFiniteValuesFound(column_name.to_string()));
            }
            if !(0.0..=1.0).contains(&value) {
                return Err(DataError::RateOutOfRange {
                    column_name: column_name.to_string(),
                    value,
                    row: row + 1,
                });
            }
        }

        Ok(casted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::io::{self, Write};
    use tempfile::NamedTempFile;

    const HEADER: &str = "statename,borrowed_money_rate,cooperative_usage_rate,savings_group_usage_rate,village_assoc_rate,thrift_usage_rate,social_group_rate,hh_plots_number";

    fn create_test_csv(rows: &[&str]) -> io::Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "{HEADER}")?;
        for row in rows {
            writeln!(file, "{row}")?;
        }
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn averages_are_grouped_by_lowercase_state() {
        let file = create_test_csv(&[
            "Lagos,0.2,0.1,0.3,0.4,0.0,0.02,3",
            "LAGOS,0.4,0.3,0.5,0.6,0.2,0.04,1",
            "kano,1.0,0.0,1.0,0.0,1.0,0.5,2",
        ])
        .unwrap();
        let table = StateRatesTable::load(file.path()).unwrap();

        assert_eq!(table.len(), 2);
        let lagos = table.lookup("lagos");
        assert_abs_diff_eq!(lagos.borrowed_money_rate, 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(lagos.cooperative_usage_rate, 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(lagos.savings_group_usage_rate, 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(lagos.village_assoc_rate, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(lagos.thrift_usage_rate, 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(lagos.social_group_rate, 0.03, epsilon = 1e-12);

        let kano = table.lookup("Kano");
        assert_eq!(kano.to_array(), [1.0, 0.0, 1.0, 0.0, 1.0, 0.5]);
    }

    #[test]
    fn missing_values_are_skipped_when_averaging() {
        let file = create_test_csv(&[
            "ogun,0.2,,0.3,0.4,0.1,0.1,1",
            "ogun,0.4,0.6,,0.6,0.3,0.3,1",
        ])
        .unwrap();
        let table = StateRatesTable::load(file.path()).unwrap();
        let ogun = table.lookup("ogun");
        assert_abs_diff_eq!(ogun.cooperative_usage_rate, 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(ogun.savings_group_usage_rate, 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(ogun.borrowed_money_rate, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn state_with_no_values_in_a_column_uses_the_default_rate() {
        let file = create_test_csv(&[
            "kano,0.1,,0.3,0.4,0.5,0.6,1",
            "oyo,0.1,0.2,0.3,0.4,0.5,0.6,1",
        ])
        .unwrap();
        let table = StateRatesTable::load(file.path()).unwrap();
        let kano = table.lookup("kano");
        assert_eq!(kano.cooperative_usage_rate, DEFAULT_RATE);
        assert_abs_diff_eq!(kano.borrowed_money_rate, 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(table.lookup("oyo").cooperative_usage_rate, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn rows_without_a_state_are_dropped() {
        let file = create_test_csv(&[
            ",0.9,0.9,0.9,0.9,0.9,0.9,1",
            "kano,0.1,0.2,0.3,0.4,0.5,0.6,1",
        ])
        .unwrap();
        let table = StateRatesTable::load(file.path()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup("kano").to_array(), [0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
    }

    #[test]
    fn decimals_after_many_integer_rows_still_load() {
        let mut rows: Vec<&str> = vec!["kano,1,0,1,0,1,0,2"; 150];
        rows.push("kano,0.5,0,1,0,1,0,2.5");
        let file = create_test_csv(&rows).unwrap();

        let table = StateRatesTable::load(file.path()).unwrap();
        let kano = table.lookup("kano");
        assert_abs_diff_eq!(kano.borrowed_money_rate, 150.5 / 151.0, epsilon = 1e-12);
        assert_eq!(kano.savings_group_usage_rate, 1.0);
        assert_eq!(kano.social_group_rate, 0.0);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let file = create_test_csv(&["akwa ibom,0.1,0.2,0.3,0.4,0.5,0.6,1"]).unwrap();
        let table = StateRatesTable::load(file.path()).unwrap();
        assert!(table.contains("Akwa Ibom"));
        assert_eq!(table.lookup("AKWA IBOM"), table.lookup("akwa ibom"));
        assert_abs_diff_eq!(table.lookup(" Akwa Ibom ").social_group_rate, 0.6);
    }

    #[test]
    fn unknown_state_falls_back_to_defaults() {
        let file = create_test_csv(&["kano,0.1,0.2,0.3,0.4,0.5,0.6,1"]).unwrap();
        let table = StateRatesTable::load(file.path()).unwrap();
        assert_eq!(table.lookup("atlantis"), StateRates::DEFAULT);
        assert_eq!(table.lookup("").to_array(), [0.5; 6]);
    }

    #[test]
    fn missing_rate_column_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "statename,borrowed_money_rate").unwrap();
        writeln!(file, "kano,0.1").unwrap();
        file.flush().unwrap();

        match StateRatesTable::load(file.path()).unwrap_err() {
            DataError::ColumnNotFound(column) => assert_eq!(column, "cooperative_usage_rate"),
            other => panic!("Expected ColumnNotFound, got {:?}", other),
        }
    }

    #[test]
    fn out_of_range_rate_is_rejected() {
        let file = create_test_csv(&[
            "kano,0.1,0.2,0.3,0.4,0.5,0.6,1",
            "kano,0.1,0.2,0.3,0.4,1.5,0.6,1",
        ])
        .unwrap();
        match StateRatesTable::load(file.path()).unwrap_err() {
            DataError::RateOutOfRange {
                column_name, row, ..
            } => {
                assert_eq!(column_name, "thrift_usage_rate");
                assert_eq!(row, 2);
            }
            other => panic!("Expected RateOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn non_numeric_rate_is_rejected() {
        let file = create_test_csv(&["kano,0.1,high,0.3,0.4,0.5,0.6,1"]).unwrap();
        match StateRatesTable::load(file.path()).unwrap_err() {
            DataError::ColumnWrongType { column_name, .. } => {
                assert_eq!(column_name, "cooperative_usage_rate")
            }
            other => panic!("Expected ColumnWrongType, got {:?}", other),
        }
    }

    #[test]
    fn states_are_listed_in_name_order() {
        let file = create_test_csv(&[
            "zamfara,0.1,0.2,0.3,0.4,0.5,0.6,1",
            "abia,0.1,0.2,0.3,0.4,0.5,0.6,1",
            "kano,0.1,0.2,0.3,0.4,0.5,0.6,1",
        ])
        .unwrap();
        let table = StateRatesTable::load(file.path()).unwrap();
        let names: Vec<&str> = table.states().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["abia", "kano", "zamfara"]);
    }
}
