// 🏭 Sales Pipeline - merge → filter → clean → derive → project
//
// Reads N daily extracts, keeps the target product, turns "$2.50" × 4 into
// sales = 10.00 and writes a single date,region,sales artifact.

use crate::error::PipelineError;
use crate::records::{DerivedSalesRecord, RawSalesRecord, DERIVED_COLUMNS, RAW_COLUMNS};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use rust_decimal::Decimal;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

type Result<T> = std::result::Result<T, PipelineError>;

/// Date format used by the extracts
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// BUILD REPORT
// ============================================================================

/// Per-extract statistics collected during a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceStat {
    pub path: PathBuf,
    pub rows_read: usize,
    pub rows_retained: usize,
    pub sha256: String,
}

/// Summary of a successful pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildReport {
    pub target_product: String,
    pub sources: Vec<SourceStat>,
    pub merged_rows: usize,
    pub retained_rows: usize,
    pub total_sales: Decimal,
    pub output: PathBuf,
}

impl BuildReport {
    pub fn summary(&self) -> String {
        format!(
            "{} source(s), {} rows merged, {} '{}' rows kept, total sales {}",
            self.sources.len(),
            self.merged_rows,
            self.retained_rows,
            self.target_product,
            self.total_sales
        )
    }
}

// ============================================================================
// SALES PIPELINE
// ============================================================================

pub struct SalesPipeline {
    target_product: String,
}

impl SalesPipeline {
    pub fn new(target_product: &str) -> Self {
        SalesPipeline {
            target_product: target_product.to_string(),
        }
    }

    pub fn target_product(&self) -> &str {
        &self.target_product
    }

    /// Build the derived dataset in memory without writing anything
    pub fn build<P: AsRef<Path>>(&self, sources: &[P]) -> Result<Vec<DerivedSalesRecord>> {
        self.transform(sources).map(|(records, _)| records)
    }

    /// Build the derived dataset and replace the artifact at `output`.
    ///
    /// All-or-nothing: if any extract fails to load or any kept row fails to
    /// clean, the previous artifact (if any) is left as it was.
    pub fn run<P: AsRef<Path>>(&self, sources: &[P], output: &Path) -> Result<BuildReport> {
        let (records, stats) = self.transform(sources)?;

        write_dataset(output, &records)?;

        let report = BuildReport {
            target_product: self.target_product.clone(),
            merged_rows: stats.iter().map(|s| s.rows_read).sum(),
            retained_rows: records.len(),
            total_sales: records.iter().map(|r| r.sales).sum(),
            sources: stats,
            output: output.to_path_buf(),
        };

        info!(
            output = %output.display(),
            merged = report.merged_rows,
            retained = report.retained_rows,
            "derived dataset written"
        );

        Ok(report)
    }

    fn transform<P: AsRef<Path>>(
        &self,
        sources: &[P],
    ) -> Result<(Vec<DerivedSalesRecord>, Vec<SourceStat>)> {
        if sources.is_empty() {
            return Err(PipelineError::NoSources);
        }

        let mut tables = Vec::with_capacity(sources.len());
        let mut stats = Vec::with_capacity(sources.len());

        for source in sources {
            let path = source.as_ref();
            let (rows, sha256) = load_extract(path)?;
            let rows_retained = rows
                .iter()
                .filter(|r| r.product == self.target_product)
                .count();

            debug!(
                source = %path.display(),
                rows = rows.len(),
                retained = rows_retained,
                "extract loaded"
            );

            stats.push(SourceStat {
                path: path.to_path_buf(),
                rows_read: rows.len(),
                rows_retained,
                sha256,
            });
            tables.push(rows);
        }

        let merged = merge(tables);
        let kept = filter_product(merged, &self.target_product);

        let records = kept
            .iter()
            .map(derive_record)
            .collect::<Result<Vec<_>>>()?;

        Ok((records, stats))
    }
}

/// Build the derived dataset for `target_product` from `sources`, in order
pub fn build_dataset<P: AsRef<Path>>(
    sources: &[P],
    target_product: &str,
) -> Result<Vec<DerivedSalesRecord>> {
    SalesPipeline::new(target_product).build(sources)
}

// ============================================================================
// STAGES
// ============================================================================

/// Concatenate tables in the given order. No dedup, no key join.
pub fn merge(tables: Vec<Vec<RawSalesRecord>>) -> Vec<RawSalesRecord> {
    let total = tables.iter().map(Vec::len).sum();
    let mut merged = Vec::with_capacity(total);
    for table in tables {
        merged.extend(table);
    }
    merged
}

/// Keep rows whose product equals `target_product` (case-sensitive)
pub fn filter_product(rows: Vec<RawSalesRecord>, target_product: &str) -> Vec<RawSalesRecord> {
    rows.into_iter()
        .filter(|r| r.product == target_product)
        .collect()
}

/// Strip a leading `$` and parse the rest as a decimal number
pub fn parse_price(value: &str) -> std::result::Result<Decimal, String> {
    let trimmed = value.trim();
    let digits = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();

    if digits.is_empty() {
        return Err("empty price".to_string());
    }

    Decimal::from_str(digits).map_err(|e| e.to_string())
}

/// Clean, derive and project one kept row: date, region, price × quantity
pub fn derive_record(raw: &RawSalesRecord) -> Result<DerivedSalesRecord> {
    let parse_error = |field: &'static str, value: &str, reason: String| PipelineError::Parse {
        path: PathBuf::from(&raw.source_file),
        line: raw.line_number,
        field,
        value: value.to_string(),
        reason,
    };
    let invalid = |message: String| PipelineError::Validation {
        path: PathBuf::from(&raw.source_file),
        line: raw.line_number,
        message,
    };

    let date = NaiveDate::parse_from_str(raw.date.trim(), DATE_FORMAT)
        .map_err(|e| parse_error("date", &raw.date, e.to_string()))?;

    let region = raw.region.trim().to_lowercase();
    if region.is_empty() {
        return Err(invalid("empty region".to_string()));
    }

    let price = parse_price(&raw.price).map_err(|reason| parse_error("price", &raw.price, reason))?;
    // "$-0.00" included: any leading minus is rejected
    let signed = raw.price.trim().trim_start_matches('$').trim_start().starts_with('-');
    if signed || price.is_sign_negative() {
        return Err(invalid(format!("negative price {}", raw.price)));
    }

    let quantity: i64 = raw
        .quantity
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| parse_error("quantity", &raw.quantity, e.to_string()))?;
    if quantity < 0 {
        return Err(invalid(format!("negative quantity {}", quantity)));
    }

    let sales = price
        .checked_mul(Decimal::from(quantity))
        .ok_or_else(|| invalid(format!("sales overflow for {} × {}", raw.price, quantity)))?;

    Ok(DerivedSalesRecord {
        date,
        region,
        sales,
    })
}

// ============================================================================
// EXTRACT / ARTIFACT I/O
// ============================================================================

/// Read one source extract, keeping file order
pub fn read_extract(path: &Path) -> Result<Vec<RawSalesRecord>> {
    load_extract(path).map(|(rows, _)| rows)
}

fn load_extract(path: &Path) -> Result<(Vec<RawSalesRecord>, String)> {
    let bytes = fs::read(path).map_err(|e| PipelineError::io(path, e))?;
    let sha256 = format!("{:x}", Sha256::digest(&bytes));

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(bytes.as_slice());

    let headers = reader.headers()?.clone();
    require_columns(path, &headers, &RAW_COLUMNS)?;

    let source_file = path.display().to_string();
    let mut rows = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);

        let raw: RawSalesRecord = record.deserialize(Some(&headers))?;
        rows.push(raw.with_provenance(&source_file, line));
    }

    Ok((rows, sha256))
}

fn require_columns(path: &Path, headers: &StringRecord, required: &[&str]) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::Schema {
            path: path.to_path_buf(),
            missing,
        })
    }
}

/// Write the derived dataset, replacing any existing file at `path`.
///
/// Rows go to a sibling `.tmp` file first which is then renamed over the
/// target, so readers never see a half-written artifact.
pub fn write_dataset(path: &Path, records: &[DerivedSalesRecord]) -> Result<()> {
    let file_name = path.file_name().ok_or_else(|| {
        PipelineError::io(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "output path has no file name"),
        )
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }

    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    if let Err(err) = write_rows(&tmp_path, records) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        PipelineError::io(path, e)
    })
}

fn write_rows(tmp_path: &Path, records: &[DerivedSalesRecord]) -> Result<()> {
    // Header written by hand so an empty dataset still gets one
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(tmp_path)?;

    writer.write_record(DERIVED_COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }

    let file = writer
        .into_inner()
        .map_err(|e| PipelineError::io(tmp_path, e.into_error()))?;
    file.sync_all().map_err(|e| PipelineError::io(tmp_path, e))?;

    Ok(())
}

/// Load a derived dataset previously written by `write_dataset`
pub fn read_dataset(path: &Path) -> Result<Vec<DerivedSalesRecord>> {
    let file = fs::File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    require_columns(path, &headers, &DERIVED_COLUMNS)?;

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        records.push(record.deserialize(Some(&headers))?);
    }

    debug!(path = %path.display(), rows = records.len(), "derived dataset loaded");
    Ok(records)
}

// ============================================================================
// TESTS
// ============================================================================
