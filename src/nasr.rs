use std::io::Read;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::cycle::EffectiveDate;
use crate::error::NasrError;

pub const DEFAULT_BASE_URL: &str = "https://nfdc.faa.gov/webContent/28DaySub";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Which FAA distribution an archive came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveVariant {
    /// `class_airspace_shape_files.zip`, already rooted at `Shape_Files/`.
    Compact,
    /// The full 28-day subscription, shape files under `Additional_Data/`.
    Comprehensive,
}

impl ArchiveVariant {
    pub fn url(&self, base_url: &str, date: EffectiveDate) -> String {
        let base = base_url.trim_end_matches('/');
        match self {
            ArchiveVariant::Compact => {
                format!("{base}/{date}/class_airspace_shape_files.zip")
            }
            ArchiveVariant::Comprehensive => {
                format!("{base}/28DaySubscription_Effective_{date}.zip")
            }
        }
    }
}

pub enum RemoteBody {
    Found(Box<dyn Read + Send>),
    NotFound,
}

pub trait NasrClient: Send + Sync {
    /// 200 yields the body, 404 yields `NotFound`, anything else is an error.
    fn get(&self, url: &str) -> Result<RemoteBody, NasrError>;
}

#[derive(Clone)]
pub struct NasrHttpClient {
    client: Client,
}

impl NasrHttpClient {
    pub fn new(timeout: Duration) -> Result<Self, NasrError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("nasr-check/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| NasrError::Http(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| NasrError::Http(err.to_string()))?;
        Ok(Self { client })
    }
}

impl NasrClient for NasrHttpClient {
    fn get(&self, url: &str) -> Result<RemoteBody, NasrError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| NasrError::Http(format!("{url}: {err}")))?;
        match response.status() {
            StatusCode::OK => Ok(RemoteBody::Found(Box::new(response))),
            StatusCode::NOT_FOUND => Ok(RemoteBody::NotFound),
            status => Err(NasrError::RemoteStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }),
        }
    }
}
