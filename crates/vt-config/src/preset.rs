//! Built-in calibration presets.
//!
//! - `Cdc2020`: age distribution of ICU admissions from the early-2020 US
//!   surveillance report, with SOFA mortality grouped in pairs of scores and a
//!   plateau from 12 upward.
//! - `Flat`: equal weight across adult bands and a linear mortality ramp;
//!   useful for exercising the pipeline without clinical assumptions.

use crate::tables::{AgeBand, AgeTable, SeverityTable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Available calibration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalibrationPreset {
    #[default]
    Cdc2020,
    Flat,
}

/// `(label, min, max, weight, hosp %, icu %, death %)`
type BandRow = (&'static str, f64, Option<f64>, f64, f64, f64, f64);

const CDC_2020_BANDS: [BandRow; 7] = [
    ("0-19", 0.0, Some(19.0), 0.00, 1.6, 0.0, 0.0),
    ("20-44", 20.0, Some(44.0), 0.12, 14.3, 2.0, 0.1),
    ("45-54", 45.0, Some(54.0), 0.16, 21.2, 5.4, 0.5),
    ("55-64", 55.0, Some(64.0), 0.18, 20.5, 4.7, 1.4),
    ("65-74", 65.0, Some(74.0), 0.24, 28.6, 8.1, 2.7),
    ("75-84", 75.0, Some(84.0), 0.20, 30.5, 10.5, 4.3),
    ("85+", 85.0, None, 0.10, 31.3, 6.3, 10.4),
];

const SOFA_MORTALITY_PERCENT: [f64; 21] = [
    0.0, 0.0, 6.4, 6.4, 20.2, 20.2, 21.5, 21.5, 33.3, 33.3, 50.0, 50.0, 95.2, 95.2, 95.2, 95.2,
    95.2, 95.2, 95.2, 95.2, 95.2,
];

impl CalibrationPreset {
    pub const ALL: &'static [CalibrationPreset] =
        &[CalibrationPreset::Cdc2020, CalibrationPreset::Flat];

    pub fn as_str(&self) -> &'static str {
        match self {
            CalibrationPreset::Cdc2020 => "cdc-2020",
            CalibrationPreset::Flat => "flat",
        }
    }

    pub fn parse(s: &str) -> Option<CalibrationPreset> {
        match s.to_lowercase().as_str() {
            "cdc-2020" | "cdc2020" | "cdc" | "default" => Some(CalibrationPreset::Cdc2020),
            "flat" | "uniform" => Some(CalibrationPreset::Flat),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CalibrationPreset::Cdc2020 => {
                "ICU-admission age shares (US, early 2020) with grouped SOFA mortality"
            }
            CalibrationPreset::Flat => "Equal adult band weights with a linear mortality ramp",
        }
    }

    pub fn age_table(&self) -> AgeTable {
        let mut table = AgeTable::new(
            CDC_2020_BANDS
                .iter()
                .map(|&(label, min, max, weight, hosp, icu, death)| AgeBand {
                    hospitalization_percent: Some(hosp),
                    icu_percent: Some(icu),
                    death_percent: Some(death),
                    ..AgeBand::new(label, min, max, weight)
                })
                .collect(),
        );
        match self {
            CalibrationPreset::Cdc2020 => {
                table.description = Some(self.description().to_string());
            }
            CalibrationPreset::Flat => {
                let adult = (table.bands.len() - 1) as f64;
                for band in table.bands.iter_mut().skip(1) {
                    band.relative_weight = 1.0 / adult;
                }
                table.description = Some(self.description().to_string());
            }
        }
        table
    }

    pub fn severity_table(&self) -> SeverityTable {
        let mut table = match self {
            CalibrationPreset::Cdc2020 => SeverityTable::from_mortality(&SOFA_MORTALITY_PERCENT),
            CalibrationPreset::Flat => {
                let ramp: Vec<f64> = (0..=20).map(|b| f64::from(b) * 5.0).collect();
                SeverityTable::from_mortality(&ramp)
            }
        };
        table.description = Some(self.description().to_string());
        table
    }
}

impl fmt::Display for CalibrationPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CalibrationPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CalibrationPreset::parse(s).ok_or_else(|| format!("unknown calibration preset: {}", s))
    }
}
