//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use capa_core::{OverlapPeriod, Period};
use regex::Regex;

/// Pre-compiled regex for `YYYY-MM`.
static MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{1,2})$").unwrap());

/// Pre-compiled regex for `YYYY-Qn`, also accepting `YYYYQn` and lowercase `q`.
static QUARTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-?[Qq]([1-4])$").unwrap());

/// Parse a calendar month such as `2026-02`.
pub fn parse_month(s: &str) -> anyhow::Result<Period> {
    let Some(caps) = MONTH_RE.captures(s.trim()) else {
        anyhow::bail!("Invalid month: {s}. Use YYYY-MM (e.g., 2026-02)");
    };
    let year: i32 = caps[1].parse().context("failed to parse year")?;
    let month: u32 = caps[2].parse().context("failed to parse month")?;
    Period::month(year, month).with_context(|| format!("Invalid month: {s}"))
}

/// Parse a calendar quarter such as `2026-Q1`.
pub fn parse_quarter(s: &str) -> anyhow::Result<Period> {
    let Some(caps) = QUARTER_RE.captures(s.trim()) else {
        anyhow::bail!("Invalid quarter: {s}. Use YYYY-Qn (e.g., 2026-Q1)");
    };
    let year: i32 = caps[1].parse().context("failed to parse year")?;
    let quarter: u32 = caps[2].parse().context("failed to parse quarter")?;
    Period::quarter(year, quarter).with_context(|| format!("Invalid quarter: {s}"))
}

/// One line per overlap, e.g. `Jan 15 - Jan 31: 40% (Project X)`.
pub fn format_overlap(period: &OverlapPeriod) -> String {
    let line = format!(
        "{} - {}: {}%",
        period.start.format("%b %d"),
        period.end.format("%b %d"),
        period.total_percentage,
    );
    if period.project_names.is_empty() {
        line
    } else {
        format!("{line} ({})", period.project_names.join(", "))
    }
}
