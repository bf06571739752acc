use std::path::PathBuf;

use chrono::NaiveDate;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum NasrError {
    #[error("illegal date {date}: earliest permitted date is {epoch}")]
    #[diagnostic(help("NASR shapefile subscriptions start at the {epoch} cycle"))]
    OutOfRangeDate { date: NaiveDate, epoch: NaiveDate },

    #[error("no NASR cycle can follow {0}")]
    NoNextCycle(NaiveDate),

    #[error("illegal date format: {0} (expected YYYY-MM-DD)")]
    DateFormat(String),

    #[error("not a NASR cycle effective date: {0}")]
    OffCycleDate(String),

    #[error("NASR request failed: {0}")]
    Http(String),

    #[error("error in file download: {url} returned status {status}")]
    #[diagnostic(help("the cycle may not be published yet"))]
    RemoteStatus { url: String, status: u16 },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("shapefile error: {0}")]
    Shapefile(String),

    #[error("invalid attribute: {0}")]
    Attribute(String),

    #[error("failed to write results: {0}")]
    Report(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),
}
