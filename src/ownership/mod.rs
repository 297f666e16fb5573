//! Aggregation over KSEI balance-position files: pipe-delimited `*.txt`
//! exports with one row per stock, split into nine investor categories for
//! the local and foreign side.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::errors::{SahamError, SahamResult};

/// KSEI category codes with their display names, in report order.
pub const INVESTOR_CATEGORIES: [(&str, &str); 9] = [
    ("ID", "Individual"),
    ("CP", "Corporate (Perusahaan)"),
    ("MF", "Mutual Fund (Reksa Dana)"),
    ("IB", "Financial Institution (Lembaga Keuangan)"),
    ("IS", "Insurance (Asuransi)"),
    ("SC", "Securities Company (Perusahaan Efek)"),
    ("PF", "Pension Fund (Dana Pensiun)"),
    ("FD", "Foundation (Yayasan)"),
    ("OT", "Others (Lainnya)"),
];

/// Date layouts seen across KSEI exports, day-first variants before ISO.
const DATE_FORMATS: [&str; 4] = ["%d-%b-%Y", "%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d"];

/// One parsed file row. Amounts follow [`INVESTOR_CATEGORIES`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnershipRow {
    pub date: NaiveDate,
    /// Month bucket, `YYYY-MM`.
    pub month: String,
    pub code: String,
    pub local: [f64; 9],
    pub foreign: [f64; 9],
}

impl OwnershipRow {
    pub fn local_total(&self) -> f64 {
        self.local.iter().sum()
    }

    pub fn foreign_total(&self) -> f64 {
        self.foreign.iter().sum()
    }
}

/// What `load_dir` managed to read, for CLI reporting.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub files: usize,
    pub rows: usize,
    /// File name and reason for every file that could not be parsed.
    pub skipped_files: Vec<(String, String)>,
    /// Rows dropped for an unparseable date or a blank code.
    pub skipped_rows: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Local,
    Foreign,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Local => write!(f, "Local"),
            Side::Foreign => write!(f, "Foreign"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    pub month: String,
    pub local: f64,
    pub foreign: f64,
}

impl MonthlyTotal {
    pub fn total(&self) -> f64 {
        self.local + self.foreign
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryShare {
    pub side: Side,
    pub category: &'static str,
    pub amount: f64,
    /// Percentage of the side total for the month.
    pub share: f64,
    /// Change versus the previous month, zero when none exists.
    pub delta: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryBreakdown {
    pub month: String,
    pub shares: Vec<CategoryShare>,
}

/// Reads every `*.txt` file under `dir` as a pipe-delimited KSEI export.
/// Files that cannot be parsed are skipped and reported, never fatal; a
/// missing directory simply yields no rows.
pub fn load_dir(dir: &Path) -> SahamResult<(Vec<OwnershipRow>, LoadReport)> {
    let mut report = LoadReport::default();
    let mut rows = Vec::new();

    if !dir.is_dir() {
        return Ok((rows, report));
    }

    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("txt"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    for path in paths {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("?")
            .to_string();
        match parse_file(&path) {
            Ok((parsed, skipped)) => {
                report.files += 1;
                report.rows += parsed.len();
                report.skipped_rows += skipped;
                rows.extend(parsed);
            }
            Err(e) => report.skipped_files.push((name, e.to_string())),
        }
    }

    Ok((rows, report))
}

fn parse_file(path: &Path) -> SahamResult<(Vec<OwnershipRow>, usize)> {
    let display = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'|')
        .from_path(path)
        .map_err(|e| SahamError::CsvFile {
            path: display.clone(),
            message: e.to_string(),
        })?;

    let headers = reader
        .headers()
        .map_err(|e| SahamError::CsvFile {
            path: display.clone(),
            message: e.to_string(),
        })?
        .clone();

    let find = |name: &str| -> SahamResult<usize> {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| SahamError::CsvFile {
                path: display.clone(),
                message: format!("missing column '{}'", name),
            })
    };

    let date_idx = find("Date")?;
    let code_idx = find("Code")?;
    let mut local_idx = [0usize; 9];
    let mut foreign_idx = [0usize; 9];
    for (i, (code, _)) in INVESTOR_CATEGORIES.iter().enumerate() {
        local_idx[i] = find(&format!("Local {}", code))?;
        foreign_idx[i] = find(&format!("Foreign {}", code))?;
    }

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for record in reader.records() {
        let record = record.map_err(|e| SahamError::CsvFile {
            path: display.clone(),
            message: e.to_string(),
        })?;

        let date = match parse_date(record.get(date_idx).unwrap_or("").trim()) {
            Some(date) => date,
            None => {
                skipped += 1;
                continue;
            }
        };
        let code = record.get(code_idx).unwrap_or("").trim().to_uppercase();
        if code.is_empty() {
            skipped += 1;
            continue;
        }

        let mut local = [0f64; 9];
        let mut foreign = [0f64; 9];
        for i in 0..9 {
            local[i] = parse_amount(record.get(local_idx[i]));
            foreign[i] = parse_amount(record.get(foreign_idx[i]));
        }

        rows.push(OwnershipRow {
            month: date.format("%Y-%m").to_string(),
            date,
            code,
            local,
            foreign,
        });
    }

    Ok((rows, skipped))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn parse_amount(value: Option<&str>) -> f64 {
    value.unwrap_or("").trim().parse().unwrap_or(0.0)
}

/// Summed local and foreign holdings per month for one code, months
/// ascending.
pub fn monthly_totals(rows: &[OwnershipRow], code: &str) -> Vec<MonthlyTotal> {
    let mut by_month: BTreeMap<&str, (f64, f64)> = BTreeMap::new();

    for row in rows.iter().filter(|r| r.code == code) {
        let entry = by_month.entry(&row.month).or_insert((0.0, 0.0));
        entry.0 += row.local_total();
        entry.1 += row.foreign_total();
    }

    by_month
        .into_iter()
        .map(|(month, (local, foreign))| MonthlyTotal {
            month: month.to_string(),
            local,
            foreign,
        })
        .collect()
}

/// Per-category composition for the latest month of one code: amount, share
/// of the side total and change against the previous month.
pub fn category_breakdown(rows: &[OwnershipRow], code: &str) -> Option<CategoryBreakdown> {
    let mut by_month: BTreeMap<&str, ([f64; 9], [f64; 9])> = BTreeMap::new();

    for row in rows.iter().filter(|r| r.code == code) {
        let entry = by_month
            .entry(&row.month)
            .or_insert(([0.0; 9], [0.0; 9]));
        for i in 0..9 {
            entry.0[i] += row.local[i];
            entry.1[i] += row.foreign[i];
        }
    }

    let (month, latest) = by_month.iter().next_back()?;
    let previous = by_month.iter().rev().nth(1).map(|(_, sums)| sums);

    let local_total: f64 = latest.0.iter().sum();
    let foreign_total: f64 = latest.1.iter().sum();

    let mut shares = Vec::with_capacity(INVESTOR_CATEGORIES.len() * 2);
    for (i, (_, name)) in INVESTOR_CATEGORIES.iter().enumerate() {
        shares.push(share_of(
            Side::Local,
            name,
            latest.0[i],
            local_total,
            previous.map(|p| p.0[i]),
        ));
    }
    for (i, (_, name)) in INVESTOR_CATEGORIES.iter().enumerate() {
        shares.push(share_of(
            Side::Foreign,
            name,
            latest.1[i],
            foreign_total,
            previous.map(|p| p.1[i]),
        ));
    }

    Some(CategoryBreakdown {
        month: month.to_string(),
        shares,
    })
}

fn share_of(
    side: Side,
    category: &'static str,
    amount: f64,
    side_total: f64,
    previous: Option<f64>,
) -> CategoryShare {
    let share = if side_total > 0.0 {
        amount / side_total * 100.0
    } else {
        0.0
    };
    CategoryShare {
        side,
        category,
        amount,
        share,
        delta: previous.map(|p| amount - p).unwrap_or(0.0),
    }
}

/// Renders a share count with thousands separators, no decimals.
pub fn format_amount(value: f64) -> String {
    let negative = value < 0.0;
    let digits = format!("{:.0}", value.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    if negative {
        format!("-{}", out)
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use tempfile::tempdir;

    const HEADER: &str = "Date|Code|Type|Local IS|Local CP|Local PF|Local IB|Local ID|Local MF|Local SC|Local FD|Local OT|Foreign IS|Foreign CP|Foreign PF|Foreign IB|Foreign ID|Foreign MF|Foreign SC|Foreign FD|Foreign OT";

    fn row(date: &str, code: &str, local: [u64; 9], foreign: [u64; 9]) -> String {
        let join = |v: [u64; 9]| {
            v.iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join("|")
        };
        format!("{}|{}|EQUITY|{}|{}", date, code, join(local), join(foreign))
    }

    // Values are written in HEADER column order (IS..OT), which differs
    // from the struct's category order (ID..OT).
    fn sample_file(dir: &Path, name: &str, lines: &[String]) {
        let mut content = String::from(HEADER);
        for line in lines {
            content.push('\n');
            content.push_str(line);
        }
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_load_dir_parses_pipe_delimited_rows() {
        let dir = tempdir().unwrap();
        sample_file(
            dir.path(),
            "Balancepos_April.txt",
            &[
                row("30-Apr-2024", "BBCA", [10, 20, 30, 40, 50, 60, 70, 80, 90], [1, 2, 3, 4, 5, 6, 7, 8, 9]),
                row("30-Apr-2024", "TLKM", [5; 9], [2; 9]),
            ],
        );

        let (rows, report) = load_dir(dir.path()).unwrap();

        assert_eq!(report.files, 1);
        assert_eq!(report.rows, 2);
        assert_eq!(report.skipped_rows, 0);
        assert!(report.skipped_files.is_empty());

        let bbca = rows.iter().find(|r| r.code == "BBCA").unwrap();
        assert_eq!(bbca.month, "2024-04");
        // header order IS..OT maps into struct order ID..OT by column name
        assert_eq!(bbca.local[0], 50.0, "Local ID");
        assert_eq!(bbca.local[4], 10.0, "Local IS");
        assert_eq!(bbca.foreign[8], 9.0, "Foreign OT");
        assert_eq!(bbca.local_total(), 450.0);
        assert_eq!(bbca.foreign_total(), 45.0);
    }

    #[test]
    fn test_load_dir_accepts_dayfirst_numeric_dates() {
        let dir = tempdir().unwrap();
        sample_file(
            dir.path(),
            "mixed.txt",
            &[row("01/02/2024", "BBCA", [1; 9], [0; 9])],
        );

        let (rows, _) = load_dir(dir.path()).unwrap();
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(rows[0].month, "2024-02");
    }

    #[test]
    fn test_load_dir_skips_file_missing_category_column() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("broken.txt"),
            "Date|Code|Local IS\n30-Apr-2024|BBCA|10",
        )
        .unwrap();
        sample_file(
            dir.path(),
            "good.txt",
            &[row("30-Apr-2024", "BBCA", [1; 9], [1; 9])],
        );

        let (rows, report) = load_dir(dir.path()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(report.files, 1);
        assert_eq!(report.skipped_files.len(), 1);
        assert_eq!(report.skipped_files[0].0, "broken.txt");
        assert!(report.skipped_files[0].1.contains("missing column"));
    }

    #[test]
    fn test_load_dir_drops_rows_with_bad_dates() {
        let dir = tempdir().unwrap();
        sample_file(
            dir.path(),
            "dates.txt",
            &[
                row("notadate", "BBCA", [1; 9], [1; 9]),
                row("31-May-2024", "BBCA", [2; 9], [2; 9]),
            ],
        );

        let (rows, report) = load_dir(dir.path()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(report.skipped_rows, 1);
        assert_eq!(rows[0].month, "2024-05");
    }

    #[test]
    fn test_load_dir_ignores_other_extensions_and_missing_dir() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("notes.csv"), "Date|Code\nx|y").unwrap();

        let (rows, report) = load_dir(dir.path()).unwrap();
        assert!(rows.is_empty());
        assert_eq!(report.files, 0);

        let (rows, report) = load_dir(&dir.path().join("nope")).unwrap();
        assert!(rows.is_empty());
        assert_eq!(report.files, 0);
    }

    #[test]
    fn test_monthly_totals_sums_ascending() {
        let dir = tempdir().unwrap();
        sample_file(
            dir.path(),
            "apr.txt",
            &[
                row("15-Apr-2024", "BBCA", [10; 9], [1; 9]),
                row("30-Apr-2024", "BBCA", [10; 9], [1; 9]),
                row("30-Apr-2024", "TLKM", [99; 9], [99; 9]),
            ],
        );
        sample_file(
            dir.path(),
            "may.txt",
            &[row("31-May-2024", "BBCA", [20; 9], [2; 9])],
        );

        let (rows, _) = load_dir(dir.path()).unwrap();
        let totals = monthly_totals(&rows, "BBCA");

        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].month, "2024-04");
        assert_eq!(totals[0].local, 180.0);
        assert_eq!(totals[0].foreign, 18.0);
        assert_eq!(totals[1].month, "2024-05");
        assert_eq!(totals[1].total(), 198.0);
    }

    #[test]
    fn test_category_breakdown_shares_and_deltas() {
        let dir = tempdir().unwrap();
        sample_file(
            dir.path(),
            "apr.txt",
            &[row("30-Apr-2024", "BBCA", [10, 10, 10, 10, 10, 10, 10, 10, 20], [5; 9])],
        );
        sample_file(
            dir.path(),
            "may.txt",
            &[row("31-May-2024", "BBCA", [10, 10, 10, 10, 30, 10, 10, 10, 0], [5; 9])],
        );

        let (rows, _) = load_dir(dir.path()).unwrap();
        let breakdown = category_breakdown(&rows, "BBCA").unwrap();

        assert_eq!(breakdown.month, "2024-05");
        assert_eq!(breakdown.shares.len(), 18);

        // fifth header column is "Local ID", so Individual holds 30 in May
        let local_id = breakdown
            .shares
            .iter()
            .find(|s| s.side == Side::Local && s.category == "Individual")
            .unwrap();
        assert_eq!(local_id.amount, 30.0);
        assert!((local_id.share - 30.0).abs() < 1e-9, "30 of 100 local");
        assert_eq!(local_id.delta, 20.0, "was 10 in April");

        let foreign_ot = breakdown
            .shares
            .iter()
            .find(|s| s.side == Side::Foreign && s.category == "Others (Lainnya)")
            .unwrap();
        assert_eq!(foreign_ot.amount, 5.0);
        assert_eq!(foreign_ot.delta, 0.0);
    }

    #[test]
    fn test_category_breakdown_single_month_has_zero_deltas() {
        let dir = tempdir().unwrap();
        sample_file(
            dir.path(),
            "apr.txt",
            &[row("30-Apr-2024", "BBCA", [10; 9], [0; 9])],
        );

        let (rows, _) = load_dir(dir.path()).unwrap();
        let breakdown = category_breakdown(&rows, "BBCA").unwrap();

        assert!(breakdown.shares.iter().all(|s| s.delta == 0.0));
        let foreign: Vec<_> = breakdown
            .shares
            .iter()
            .filter(|s| s.side == Side::Foreign)
            .collect();
        assert!(foreign.iter().all(|s| s.share == 0.0), "zero side total");
    }

    #[test]
    fn test_category_breakdown_unknown_code() {
        assert!(category_breakdown(&[], "BBCA").is_none());
    }

    #[test]
    fn test_format_amount_groups_thousands() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(1000.0), "1,000");
        assert_eq!(format_amount(1234567.0), "1,234,567");
        assert_eq!(format_amount(-25500.0), "-25,500");
    }
}
