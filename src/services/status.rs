use futures::stream::{self, StreamExt};
use reqwest::StatusCode;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::repositories::mappings::ChargerMapping;
use crate::repositories::MappingsRepository;
use crate::scrape::{extract_status, StatusData};
use crate::upstream::StatusClient;

/// Result of querying a single charger by name.
///
/// Upstream failures are reported in the payload rather than as request
/// errors.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ChargerStatus {
    Found {
        serial: String,
        data: StatusData,
    },
    Failed {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StatusOutcome {
    Data(StatusData),
    Error(String),
}

/// One entry of the bulk status report.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusResult {
    pub name: String,
    pub serial: String,
    #[serde(flatten)]
    pub outcome: StatusOutcome,
}

impl StatusResult {
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, StatusOutcome::Error(_))
    }
}

#[derive(Debug, Clone)]
pub struct StatusService {
    repository: Arc<MappingsRepository>,
    client: StatusClient,
    concurrency: usize,
}

impl StatusService {
    pub fn new(repository: Arc<MappingsRepository>, client: StatusClient, concurrency: usize) -> Self {
        Self {
            repository,
            client,
            concurrency: concurrency.max(1),
        }
    }

    /// Live status of the charger called `name`.
    ///
    /// Fails only when the name is unknown; nothing is fetched in that case.
    pub async fn fetch_status(&self, name: &str) -> Result<ChargerStatus> {
        let mapping = self.repository.get_by_name(name).await?;
        let serial = mapping.serial;

        let status = match self.client.fetch(&serial).await {
            Ok(page) if page.status == StatusCode::OK => ChargerStatus::Found {
                data: extract_status(&page.body),
                serial,
            },
            Ok(page) => {
                warn!(charger = %name, serial = %serial, status = %page.status, "Upstream returned non-success status");
                ChargerStatus::Failed {
                    error: format!("Failed to fetch {}", serial),
                    status: Some(page.status.as_u16()),
                }
            }
            Err(e) => {
                warn!(charger = %name, serial = %serial, error = %e, "Upstream request failed");
                ChargerStatus::Failed {
                    error: e.to_string(),
                    status: None,
                }
            }
        };

        Ok(status)
    }

    /// Live status of every mapped charger, in mapping order.
    ///
    /// Each charger gets exactly one attempt; a failing charger becomes an
    /// error entry and never fails the whole report.
    pub async fn fetch_all(&self) -> Result<Vec<StatusResult>> {
        let mappings = self.repository.get_all().await?;
        debug!(count = mappings.len(), "Fetching status for all chargers");

        let results = stream::iter(mappings)
            .map(|mapping| self.check(mapping))
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        Ok(results)
    }

    async fn check(&self, mapping: ChargerMapping) -> StatusResult {
        let outcome = match self.client.fetch(&mapping.serial).await {
            Ok(page) if page.status == StatusCode::OK => {
                StatusOutcome::Data(extract_status(&page.body))
            }
            Ok(page) => {
                warn!(charger = %mapping.name, serial = %mapping.serial, status = %page.status, "Upstream returned non-success status");
                StatusOutcome::Error(format!("HTTP {}", page.status.as_u16()))
            }
            Err(e) => {
                warn!(charger = %mapping.name, serial = %mapping.serial, error = %e, "Upstream request failed");
                StatusOutcome::Error(e.to_string())
            }
        };

        StatusResult {
            name: mapping.name,
            serial: mapping.serial,
            outcome,
        }
    }
}
