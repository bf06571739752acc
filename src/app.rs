use std::collections::HashSet;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use serde::Serialize;

use crate::airspace::{apply_relevancy_filters, load_restrictions};
use crate::analysis::{ConflictPolicy, Legality, analyze_flights};
use crate::config::Settings;
use crate::cycle::{EffectiveDate, normalize};
use crate::error::NasrError;
use crate::locations::load_locations;
use crate::nasr::{ArchiveVariant, NasrClient};
use crate::report::write_results;
use crate::resolver::{ArchiveResolver, ArchiveSource};
use crate::store::ArchiveStore;

#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub date: NaiveDate,
    pub locations: Utf8PathBuf,
    pub out_file: Utf8PathBuf,
    pub query_file: Option<Utf8PathBuf>,
    pub policy: ConflictPolicy,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleResult {
    pub requested: NaiveDate,
    pub effective: EffectiveDate,
    pub next: EffectiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub effective: EffectiveDate,
    pub path: String,
    pub source: ArchiveSource,
    pub shape_files: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub effective: EffectiveDate,
    pub archive: String,
    pub source: ArchiveSource,
    pub restrictions: usize,
    pub relevant_restrictions: usize,
    pub max_altitude_ft: i64,
    pub locations: usize,
    pub illegal: usize,
    pub rows: usize,
    pub out_file: String,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<C: NasrClient> {
    settings: Settings,
    resolver: ArchiveResolver<C>,
}

impl<C: NasrClient> App<C> {
    pub fn new(settings: Settings, client: C) -> Self {
        let store = ArchiveStore::new(settings.cache_dir.clone());
        let resolver = ArchiveResolver::new(store, client, settings.base_url.clone());
        Self { settings, resolver }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn fetch(
        &self,
        date: NaiveDate,
        query_file: Option<&Utf8Path>,
        sink: &dyn ProgressSink,
    ) -> Result<FetchResult, NasrError> {
        let effective = normalize(date)?;
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; cycle {effective} for {date}"),
            elapsed: None,
        });

        let started = Instant::now();
        let resolved = self.resolver.resolve(effective, query_file)?;
        sink.event(ProgressEvent {
            message: format!(
                "phase=Store; {} ({})",
                resolved.path,
                source_label(resolved.source)
            ),
            elapsed: Some(started.elapsed()),
        });

        Ok(FetchResult {
            effective,
            shape_files: resolved.shape_files_uri(),
            path: resolved.path.to_string(),
            source: resolved.source,
        })
    }

    pub fn check(
        &self,
        request: &CheckRequest,
        sink: &dyn ProgressSink,
    ) -> Result<CheckResult, NasrError> {
        let fetched = self.fetch(request.date, request.query_file.as_deref(), sink)?;
        let archive = Utf8PathBuf::from(fetched.path.as_str());

        let started = Instant::now();
        let restrictions = load_restrictions(&archive)?;
        let total = restrictions.len();
        let relevant = apply_relevancy_filters(restrictions, self.settings.max_altitude_ft);
        sink.event(ProgressEvent {
            message: format!(
                "phase=Filter; {} of {total} restrictions at or below {} ft",
                relevant.len(),
                self.settings.max_altitude_ft
            ),
            elapsed: Some(started.elapsed()),
        });

        let locations = load_locations(&request.locations)?;
        let started = Instant::now();
        let verdicts = analyze_flights(&relevant, &locations, request.policy);
        let illegal = verdicts
            .iter()
            .filter(|verdict| verdict.legality() == Legality::Illegal)
            .map(|verdict| verdict.location.fid)
            .collect::<HashSet<_>>()
            .len();
        sink.event(ProgressEvent {
            message: format!(
                "phase=Analyze; {illegal} of {} locations in restricted airspace",
                locations.len()
            ),
            elapsed: Some(started.elapsed()),
        });

        write_results(&request.out_file, &verdicts)?;
        sink.event(ProgressEvent {
            message: format!("phase=Report; wrote {}", request.out_file),
            elapsed: None,
        });

        Ok(CheckResult {
            effective: fetched.effective,
            archive: fetched.path,
            source: fetched.source,
            restrictions: total,
            relevant_restrictions: relevant.len(),
            max_altitude_ft: self.settings.max_altitude_ft,
            locations: locations.len(),
            illegal,
            rows: verdicts.len(),
            out_file: request.out_file.to_string(),
        })
    }
}

/// Cycle arithmetic only; needs neither settings nor a client.
pub fn cycle_summary(date: NaiveDate) -> Result<CycleResult, NasrError> {
    let effective = normalize(date)?;
    Ok(CycleResult {
        requested: date,
        effective,
        next: effective.next()?,
    })
}

pub fn source_label(source: ArchiveSource) -> &'static str {
    match source {
        ArchiveSource::Override => "override",
        ArchiveSource::Cache => "cache",
        ArchiveSource::Downloaded(ArchiveVariant::Compact) => "downloaded compact",
        ArchiveSource::Downloaded(ArchiveVariant::Comprehensive) => "downloaded comprehensive",
    }
}
