//! HTTP client for the staffdesk REST API

use crate::session::Session;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use staffdesk_core::config::ApiConfig;
use staffdesk_core::{
    Employee, Error, Portal, Record, RecordId, Result, StatusMachine, Task, WorkLog,
};
use staffdesk_records::{BulkOutcome, BulkStatusEndpoint, RecordEndpoint, StatusEndpoint};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Entity served by a REST collection
pub trait RemoteRecord: Record + DeserializeOwned {
    /// Collection path, e.g. `tasks`
    const COLLECTION: &'static str;

    /// List path for a portal
    fn list_path(portal: Portal) -> &'static str;
}

/// Entity whose status is changed through `PATCH /:collection/:id/status`
pub trait RemoteStatus: RemoteRecord {}

impl RemoteRecord for Task {
    const COLLECTION: &'static str = "tasks";

    fn list_path(portal: Portal) -> &'static str {
        match portal {
            Portal::Admin => "tasks",
            Portal::Employee => "tasks/my-tasks",
        }
    }
}

impl RemoteStatus for Task {}

impl RemoteRecord for WorkLog {
    const COLLECTION: &'static str = "worklogs";

    fn list_path(portal: Portal) -> &'static str {
        match portal {
            Portal::Admin => "worklogs",
            Portal::Employee => "worklogs/mine",
        }
    }
}

impl RemoteStatus for WorkLog {}

impl RemoteRecord for Employee {
    const COLLECTION: &'static str = "employees";

    fn list_path(_portal: Portal) -> &'static str {
        "employees"
    }
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct Envelope<T> {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    data: Option<T>,
}

#[derive(Debug, Serialize)]
struct StatusBody<'a> {
    status: &'a str,
}

#[derive(Debug, Serialize)]
struct BulkStatusBody<'a> {
    ids: &'a [RecordId],
    status: &'a str,
}

/// Gateway backed by the REST API
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    portal: Portal,
    session: Arc<Session>,
}

impl HttpGateway {
    /// Create a gateway with its own session seeded from `api.token`
    pub fn new(api: &ApiConfig) -> Result<Self> {
        Self::with_session(api, Arc::new(Session::new(api.token.clone())))
    }

    /// Create a gateway sharing an existing session
    pub fn with_session(api: &ApiConfig, session: Arc<Session>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(api.timeout_seconds))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            portal: api.portal,
            session,
        })
    }

    /// Session used for the bearer token
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Portal selecting the list endpoints
    pub fn portal(&self) -> Portal {
        self.portal
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn item_path(collection: &str, id: &RecordId) -> String {
        format!("{collection}/{}", urlencoding::encode(id.as_str()))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self.client.request(method, self.url(path));
        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn execute<T: DeserializeOwned + Send>(
        &self,
        request: RequestBuilder,
        action: &str,
    ) -> Result<Option<T>> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::network(None, format!("Failed to {action}: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.session.expire();
            return Err(Error::Unauthorized);
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(Some(status.as_u16()), format!("Failed to {action}: {e}")))?;
        debug!(%status, action, bytes = body.len(), "API response");

        if body.trim().is_empty() {
            if status.is_success() {
                return Ok(None);
            }
            return Err(Error::network(
                Some(status.as_u16()),
                format!("API returned error: {status}"),
            ));
        }

        let value: serde_json::Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(_) if !status.is_success() => {
                return Err(Error::network(
                    Some(status.as_u16()),
                    format!("API returned error: {status}"),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let message = value
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string);
        let rejected = value.get("success").and_then(serde_json::Value::as_bool) == Some(false);

        if !status.is_success() || rejected {
            let message = message.unwrap_or_else(|| format!("Failed to {action}: {status}"));
            warn!(%status, action, %message, "API request failed");
            return Err(Error::network(Some(status.as_u16()), message));
        }

        let envelope: Envelope<T> = serde_json::from_value(value)?;
        if envelope.success.is_none() {
            debug!(action, "Response without success flag");
        }
        Ok(envelope.data)
    }

    async fn execute_required<T: DeserializeOwned + Send>(
        &self,
        request: RequestBuilder,
        action: &str,
    ) -> Result<T> {
        self.execute(request, action)
            .await?
            .ok_or_else(|| Error::network(None, format!("Failed to {action}: empty response")))
    }
}

#[async_trait]
impl<R: RemoteRecord> RecordEndpoint<R> for HttpGateway {
    async fn fetch_all(&self) -> Result<Vec<R>> {
        let request = self.request(Method::GET, R::list_path(self.portal));
        let records: Option<Vec<R>> = self.execute(request, "fetch records").await?;
        Ok(records.unwrap_or_default())
    }

    async fn create(&self, draft: &R::Draft) -> Result<R> {
        let request = self.request(Method::POST, R::COLLECTION).json(draft);
        self.execute_required(request, "create record").await
    }

    async fn update(&self, id: &RecordId, patch: &R::Patch) -> Result<R> {
        let request = self
            .request(Method::PUT, &Self::item_path(R::COLLECTION, id))
            .json(patch);
        self.execute_required(request, "update record").await
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        let request = self.request(Method::DELETE, &Self::item_path(R::COLLECTION, id));
        let _: Option<serde_json::Value> = self.execute(request, "delete record").await?;
        Ok(())
    }
}

#[async_trait]
impl<R: RemoteStatus> StatusEndpoint<R> for HttpGateway {
    async fn update_status(&self, id: &RecordId, status: R::Status) -> Result<R> {
        let path = format!("{}/status", Self::item_path(R::COLLECTION, id));
        let request = self
            .request(Method::PATCH, &path)
            .json(&StatusBody {
                status: status.as_str(),
            });
        self.execute_required(request, "update status").await
    }
}

#[async_trait]
impl BulkStatusEndpoint<WorkLog> for HttpGateway {
    async fn update_status_bulk(
        &self,
        ids: &[RecordId],
        status: <WorkLog as Record>::Status,
    ) -> Result<BulkOutcome<WorkLog>> {
        let request = self
            .request(Method::PATCH, "worklogs/bulk-status")
            .json(&BulkStatusBody {
                ids,
                status: status.as_str(),
            });
        let outcome: Option<BulkOutcome<WorkLog>> =
            self.execute(request, "update statuses").await?;
        Ok(outcome.unwrap_or_default())
    }
}
