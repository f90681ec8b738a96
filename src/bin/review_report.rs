//! Offline report: overall vs. time-weighted rating, then the top reviews.
//!
//! ```text
//! review_report data/amazon_review.csv --top-k 20 --weights 28,26,24,22
//! ```

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use review_rank::api::parse_weights;
use review_rank::ingest::{self, LoadOptions};
use review_rank::rating::{self, QuartileWeights, RatingBreakdown};
use review_rank::{
    ranking, telemetry, AppConfig, Confidence, MalformedPolicy, Review, ScoreKind,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Rank product reviews by helpfulness and report time-weighted ratings")]
struct Cli {
    #[arg(help = "Review export (.csv or .json)")]
    path: PathBuf,

    #[arg(long, help = "Score to rank by: wilson | average | diff")]
    by: Option<ScoreKind>,

    #[arg(long, help = "Number of reviews to show")]
    top_k: Option<usize>,

    #[arg(long, help = "Confidence level for the Wilson bound, in (0, 1)")]
    confidence: Option<f64>,

    #[arg(long, value_parser = parse_weights, help = "Quartile weights, most recent first, e.g. 28,26,24,22")]
    weights: Option<QuartileWeights>,

    #[arg(long, help = "Reference date (YYYY-MM-DD) for deriving day_diff; defaults to today")]
    reference_date: Option<NaiveDate>,

    #[arg(long, help = "Recompute day_diff from review dates even when the column exists")]
    prefer_dates: bool,

    #[arg(long, help = "Clamp total_vote < helpful_yes to zero negative votes instead of failing")]
    clamp_malformed: bool,

    #[arg(long, help = "Print the ranked reviews as JSON")]
    json: bool,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();
    run(Cli::parse())
}

fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load().context("loading configuration")?;
    if let Some(by) = cli.by {
        config.ranking.by = by;
    }
    if let Some(k) = cli.top_k {
        config.ranking.top_k = k;
    }
    if let Some(c) = cli.confidence {
        config.ranking.confidence = Confidence::new(c)?;
    }
    if let Some(w) = cli.weights {
        config.rating.weights = w;
    }
    if cli.clamp_malformed {
        config.ranking.malformed = MalformedPolicy::Clamp;
    }

    let opts = LoadOptions {
        reference_date: cli.reference_date,
        prefer_dates: cli.prefer_dates,
    };
    let reviews = ingest::load_path(&cli.path, opts)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, &config, &reviews, cli.json)
}

fn write_report<W: Write>(
    out: &mut W,
    config: &AppConfig,
    reviews: &[Review],
    json: bool,
) -> Result<()> {
    // Task 1: product rating, flat vs. time-weighted.
    writeln!(out, "Reviews: {}", reviews.len())?;
    writeln!(out, "Overall mean: {:.5}", rating::overall_mean(reviews)?)?;
    for weights in [config.rating.weights, QuartileWeights::RECENT_HEAVY] {
        match rating::breakdown(reviews, weights, config.rating.empty_bucket) {
            Ok(b) => write_breakdown(out, &b)?,
            Err(e) => writeln!(out, "Weighted {:?}: undefined ({e})", weights.0)?,
        }
    }

    // Task 2: reviews to show on the product page.
    let ranked = ranking::rank_by(
        reviews,
        config.ranking.top_k,
        config.ranking.by,
        config.ranking.confidence,
        config.ranking.malformed,
    )?;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&ranked)?)?;
        return Ok(());
    }

    writeln!(out)?;
    writeln!(
        out,
        "Top {} by {} (confidence {}):",
        ranked.len(),
        config.ranking.by,
        config.ranking.confidence.level()
    )?;
    writeln!(
        out,
        "{:>3}  {:<28} {:>7} {:>5} {:>5} {:>5} {:>6} {:>8} {:>8}  summary",
        "#", "reviewer", "overall", "yes", "no", "total", "diff", "avg", "wilson"
    )?;
    for (i, s) in ranked.iter().enumerate() {
        writeln!(
            out,
            "{:>3}  {:<28} {:>7.1} {:>5} {:>5} {:>5} {:>6} {:>8.5} {:>8.5}  {}",
            i + 1,
            truncate(s.review.reviewer_name.as_deref().unwrap_or("-"), 28),
            s.review.overall,
            s.review.helpful_yes,
            s.helpful_no,
            s.review.total_vote,
            s.scores.score_pos_neg_diff,
            s.scores.score_average_rating,
            s.scores.wilson_lower_bound,
            truncate(&s.review.summary, 48),
        )?;
    }
    Ok(())
}

fn write_breakdown<W: Write>(out: &mut W, b: &RatingBreakdown) -> io::Result<()> {
    let weights: Vec<f64> = b.buckets.iter().map(|s| s.weight).collect();
    writeln!(
        out,
        "Weighted {:?}: {:.5}  (day_diff cutoffs {:.1} / {:.1} / {:.1})",
        weights, b.weighted_average, b.cutoffs.q25, b.cutoffs.q50, b.cutoffs.q75
    )?;
    for s in &b.buckets {
        match s.mean {
            Some(m) => writeln!(out, "  quartile {}: n={:<6} mean={m:.5}", s.bucket, s.count)?,
            None => writeln!(out, "  quartile {}: n=0      mean=-", s.bucket)?,
        }
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
