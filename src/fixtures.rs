//! Record builders shared by unit tests.

use crate::models::{Metric, Record, Table};

/// A record whose every metric is derived from `value`.
pub fn record(state: &str, year: i32, cancer_type: &str, value: f64) -> Record {
    Record {
        cancer_type: cancer_type.to_string(),
        year,
        sex: "Persons".to_string(),
        state: state.to_string(),
        mortality_count: value.round() as i64,
        mortality_rate: value,
        incidence_rate: value * 2.0,
        incidence_count: value * 10.0,
    }
}

/// A record with an explicit value for one metric and zeros elsewhere.
pub fn record_with(state: &str, year: i32, metric: Metric, value: f64) -> Record {
    let mut r = Record {
        cancer_type: "All cancers combined".to_string(),
        year,
        sex: "Persons".to_string(),
        state: state.to_string(),
        mortality_count: 0,
        mortality_rate: 0.0,
        incidence_rate: 0.0,
        incidence_count: 0.0,
    };
    match metric {
        Metric::MortalityCount => r.mortality_count = value as i64,
        Metric::MortalityRate => r.mortality_rate = value,
        Metric::IncidenceRate => r.incidence_rate = value,
        Metric::IncidenceCount => r.incidence_count = value,
    }
    r
}

/// Three states over three years with "Lung cancer" and "Melanoma" rows.
///
/// Mortality rates rise by 2.0 per year in Victoria, fall by 1.0 in
/// Tasmania, and stay flat in Queensland. Melanoma rows are 1.0 lower.
pub fn sample_table() -> Table {
    let mut table = Vec::new();
    for (i, year) in (2018..=2020).enumerate() {
        let step = i as f64;
        for (cancer_type, offset) in [("Lung cancer", 0.0), ("Melanoma", -1.0)] {
            table.push(record("Victoria", year, cancer_type, 10.0 + 2.0 * step + offset));
            table.push(record("Tasmania", year, cancer_type, 20.0 - step + offset));
            table.push(record("Queensland", year, cancer_type, 15.0 + offset));
        }
    }
    table
}

/// Float comparison with a fixed tolerance.
pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
