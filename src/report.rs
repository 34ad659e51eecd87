//! Human-readable statistics report and CSV export.

use std::fmt;
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{DistrictStatistics, FeatureKind, UnassignedReason, UnassignedRecord};
use crate::pip::AssignmentReport;

const PARK_SAMPLE: usize = 10;
const POI_SAMPLE: usize = 5;
const INVALID_SAMPLE: usize = 5;

/// One row of the per-district table
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictRow {
    pub district: String,
    /// Counts in the order of [`StatisticsReport::categories`]
    pub counts: Vec<u64>,
    pub total: u64,
}

/// Tabulated view of an assignment run
#[derive(Debug, Clone)]
pub struct StatisticsReport<'a> {
    pub categories: Vec<String>,
    pub rows: Vec<DistrictRow>,
    /// Category totals, largest first
    pub category_totals: Vec<(String, u64)>,
    assignment: &'a AssignmentReport,
}

impl<'a> StatisticsReport<'a> {
    pub fn new(assignment: &'a AssignmentReport) -> Self {
        let stats = &assignment.statistics;
        let categories: Vec<String> = stats.categories().into_iter().map(String::from).collect();

        let rows = stats
            .iter()
            .map(|(district, counts)| {
                let counts: Vec<u64> = categories
                    .iter()
                    .map(|c| counts.get(c).copied().unwrap_or(0))
                    .collect();
                DistrictRow {
                    district: district.clone(),
                    total: counts.iter().sum(),
                    counts,
                }
            })
            .collect();

        Self {
            category_totals: category_totals(stats),
            categories,
            rows,
            assignment,
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Write the table as CSV: `district,<categories...>,total`
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);

        let mut header = Vec::with_capacity(self.categories.len() + 2);
        header.push("district");
        header.extend(self.categories.iter().map(String::as_str));
        header.push("total");
        csv.write_record(&header)?;

        for row in &self.rows {
            let mut record = Vec::with_capacity(row.counts.len() + 2);
            record.push(row.district.clone());
            record.extend(row.counts.iter().map(u64::to_string));
            record.push(row.total.to_string());
            csv.write_record(&record)?;
        }

        csv.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// Atomically write the CSV table to `path`
    pub fn save_csv(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
        self.write_csv(tmp.as_file())?;
        tmp.persist(path).map_err(|e| Error::Persist {
            path: path.to_path_buf(),
            source: e,
        })?;
        info!("Saved {}", path.display());
        Ok(())
    }
}

impl fmt::Display for StatisticsReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counters = &self.assignment.counters;

        writeln!(f, "{}", "=".repeat(80))?;
        writeln!(f, "DISTRICT STATISTICS")?;
        writeln!(f, "{}", "=".repeat(80))?;

        let name_width = self
            .rows
            .iter()
            .map(|r| r.district.chars().count())
            .chain(std::iter::once("District".len()))
            .max()
            .unwrap_or(0);

        write!(f, "{:<width$}", "District", width = name_width)?;
        for category in &self.categories {
            write!(f, " | {}", category)?;
        }
        writeln!(f, " | Total")?;
        for row in &self.rows {
            write!(f, "{:<width$}", row.district, width = name_width)?;
            for (category, count) in self.categories.iter().zip(&row.counts) {
                write!(f, " | {:>width$}", count, width = category.chars().count())?;
            }
            writeln!(f, " | {:>5}", row.total)?;
        }

        writeln!(f, "\nTotals:")?;
        writeln!(f, "  Districts with features: {}", self.rows.len())?;
        writeln!(f, "  Objects with district: {}", counters.pois_assigned)?;
        writeln!(f, "  Objects without district: {}", counters.pois_unassigned)?;
        writeln!(f, "  Parks with district: {}", counters.parks_assigned)?;
        writeln!(f, "  Parks without district: {}", counters.parks_unassigned)?;
        writeln!(
            f,
            "  Records with invalid coordinates or geometry: {}",
            self.assignment.invalid().count()
        )?;

        if !self.category_totals.is_empty() {
            writeln!(f, "\nBy category:")?;
            for (category, total) in &self.category_totals {
                writeln!(f, "  {}: {}", category, total)?;
            }
        }

        let parks: Vec<_> = self
            .assignment
            .without_district()
            .filter(|r| r.kind == FeatureKind::Park)
            .collect();
        if !parks.is_empty() {
            writeln!(f, "\nParks without district (first {}):", PARK_SAMPLE)?;
            for record in parks.iter().take(PARK_SAMPLE) {
                match record.centroid {
                    Some(c) => writeln!(
                        f,
                        "  - {} (centroid: {}, {})",
                        record.name, c.lon, c.lat
                    )?,
                    None => writeln!(f, "  - {}", record.name)?,
                }
            }
        }

        let pois: Vec<_> = self
            .assignment
            .without_district()
            .filter(|r| r.kind == FeatureKind::Poi)
            .collect();
        if !pois.is_empty() {
            writeln!(f, "\nObjects without district (first {}):", POI_SAMPLE)?;
            for record in pois.iter().take(POI_SAMPLE) {
                writeln!(f, "  - {}", describe(record))?;
            }
        }

        let invalid: Vec<_> = self.assignment.invalid().collect();
        if !invalid.is_empty() {
            writeln!(f, "\nInvalid records (first {}):", INVALID_SAMPLE)?;
            for record in invalid.iter().take(INVALID_SAMPLE) {
                let reason = match record.reason {
                    UnassignedReason::InvalidGeometry => "invalid geometry",
                    _ => "invalid coordinates",
                };
                writeln!(f, "  - {} ({})", describe(record), reason)?;
            }
        }

        Ok(())
    }
}

fn category_totals(stats: &DistrictStatistics) -> Vec<(String, u64)> {
    let mut totals: std::collections::BTreeMap<&str, u64> = Default::default();
    for (_, counts) in stats.iter() {
        for (category, count) in counts {
            *totals.entry(category.as_str()).or_default() += count;
        }
    }
    let mut totals: Vec<(String, u64)> = totals
        .into_iter()
        .map(|(category, total)| (category.to_string(), total))
        .collect();
    // stable: equal totals stay alphabetical
    totals.sort_by(|a, b| b.1.cmp(&a.1));
    totals
}

fn describe(record: &UnassignedRecord) -> String {
    format!("{} [{}] ({})", record.name, record.category, record.id)
}
