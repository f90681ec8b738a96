// src/ingest/mod.rs
//! Loading collaborator: turns CSV/JSON review exports into `Review` records.
//!
//! `day_diff` is taken from the export when present, otherwise derived from
//! `reviewTime` (`YYYY-MM-DD`) or `unixReviewTime` against one reference date
//! fixed for the whole load.

pub mod types;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::info;

use crate::review::Review;
pub use types::{LoadOptions, RawReviewRow};

/// Load reviews from a `.csv` or `.json` file.
pub fn load_path(path: &Path, opts: LoadOptions) -> Result<Vec<Review>> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let reviews = match ext.as_str() {
        "csv" => {
            let file = fs::File::open(path)
                .with_context(|| format!("opening reviews from {}", path.display()))?;
            read_csv(file, opts)
        }
        "json" => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading reviews from {}", path.display()))?;
            parse_json(&content, opts)
        }
        other => Err(anyhow!("unsupported review file extension `{other}`")),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    info!(target: "ingest", path = %path.display(), reviews = reviews.len(), "reviews loaded");
    Ok(reviews)
}

/// Parse a CSV export with a header row.
pub fn read_csv<R: Read>(reader: R, opts: LoadOptions) -> Result<Vec<Review>> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut rows = Vec::new();
    for (i, result) in rdr.deserialize::<RawReviewRow>().enumerate() {
        // +2: 1-based and the header line
        let row = result.with_context(|| format!("parsing CSV row {}", i + 2))?;
        rows.push(row);
    }
    from_rows(rows, opts)
}

/// Parse a JSON array of raw rows.
pub fn parse_json(s: &str, opts: LoadOptions) -> Result<Vec<Review>> {
    let rows: Vec<RawReviewRow> = serde_json::from_str(s).context("parsing JSON reviews")?;
    from_rows(rows, opts)
}

/// Convert raw rows, fixing the reference date once for all of them.
pub fn from_rows(rows: Vec<RawReviewRow>, opts: LoadOptions) -> Result<Vec<Review>> {
    let reference = opts
        .reference_date
        .unwrap_or_else(|| Utc::now().date_naive());
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            into_review(row, reference, opts.prefer_dates).with_context(|| format!("review #{i}"))
        })
        .collect()
}

fn into_review(row: RawReviewRow, reference: NaiveDate, prefer_dates: bool) -> Result<Review> {
    if !row.overall.is_finite() {
        bail!("overall is not a finite number");
    }

    let review_date = review_date(&row)?;
    let from_date = review_date.map(|d| days_between(d, reference));

    let day_diff = match (row.day_diff, from_date, prefer_dates) {
        (_, Some(d), true) => d,
        (Some(d), _, _) => d,
        (None, Some(d), false) => d,
        (None, None, _) => bail!("no day_diff, reviewTime or unixReviewTime"),
    };
    if !day_diff.is_finite() {
        bail!("day_diff is not a finite number");
    }

    Ok(Review {
        reviewer_name: row.reviewer_name.filter(|s| !s.trim().is_empty()),
        overall: row.overall,
        summary: row.summary.unwrap_or_default(),
        helpful_yes: row.helpful_yes,
        total_vote: row.total_vote,
        day_diff,
        review_time: review_date,
    })
}

fn review_date(row: &RawReviewRow) -> Result<Option<NaiveDate>> {
    if let Some(raw) = row.review_time.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let d = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("reviewTime `{raw}` is not YYYY-MM-DD"))?;
        return Ok(Some(d));
    }
    if let Some(secs) = row.unix_review_time {
        let dt = DateTime::<Utc>::from_timestamp(secs, 0)
            .ok_or_else(|| anyhow!("unixReviewTime {secs} out of range"))?;
        return Ok(Some(dt.date_naive()));
    }
    Ok(None)
}

/// Whole days from `date` to `reference`; negative for future-dated reviews.
pub fn days_between(date: NaiveDate, reference: NaiveDate) -> f64 {
    (reference - date).num_days() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const CSV: &str = "\
reviewerID,asin,reviewerName,helpful,reviewText,overall,summary,unixReviewTime,reviewTime,day_diff,helpful_yes,total_vote
A3SBTW3WS4IQSN,B007WTAJTO,,\"[0, 0]\",No issues.,4.0,Four Stars,1406073600,2014-07-23,138,0,0
A18K1ODH1I2MVB,B007WTAJTO,0mie,\"[0, 0]\",Purchased this.,5.0,MOAR SPACE!!!,1382659200,2013-10-25,409,0,0
A2FII3I2MBMUIA,B007WTAJTO,4evryoung,\"[1, 1]\",Loads of room,5.0,Loads of room,1395619200,2014-03-24,259,1,1
";

    #[test]
    fn csv_with_original_columns() {
        let rows = read_csv(CSV.as_bytes(), LoadOptions::default()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].reviewer_name, None);
        assert_eq!(rows[1].reviewer_name.as_deref(), Some("0mie"));
        assert_eq!(rows[1].day_diff, 409.0);
        assert_eq!(rows[2].helpful_yes, 1);
        assert_eq!(rows[2].total_vote, 1);
        assert_eq!(rows[2].review_time, Some(date(2014, 3, 24)));
    }

    #[test]
    fn day_diff_derived_from_review_time() {
        let opts = LoadOptions {
            reference_date: Some(date(2014, 12, 8)),
            prefer_dates: true,
        };
        let rows = read_csv(CSV.as_bytes(), opts).unwrap();
        assert_eq!(rows[0].day_diff, 138.0);
        assert_eq!(rows[1].day_diff, 409.0);
    }

    #[test]
    fn unix_time_used_when_no_review_time() {
        let json = r#"[{"overall": 3.0, "unixReviewTime": 1406073600}]"#;
        let opts = LoadOptions {
            reference_date: Some(date(2014, 7, 30)),
            prefer_dates: false,
        };
        let rows = parse_json(json, opts).unwrap();
        assert_eq!(rows[0].day_diff, 7.0);
        assert_eq!(rows[0].review_time, Some(date(2014, 7, 23)));
    }

    #[test]
    fn rows_without_any_age_are_rejected() {
        let json = r#"[{"overall": 3.0}, {"overall": 4.0, "helpful_yes": 1, "total_vote": 2}]"#;
        let err = parse_json(json, LoadOptions::default()).unwrap_err();
        assert!(format!("{err:#}").contains("review #0"), "{err:#}");
    }

    #[test]
    fn bad_date_is_reported() {
        let json = r#"[{"overall": 3.0, "reviewTime": "23/07/2014"}]"#;
        let err = parse_json(json, LoadOptions::default()).unwrap_err();
        assert!(format!("{err:#}").contains("YYYY-MM-DD"), "{err:#}");
    }
}
