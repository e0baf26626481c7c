//! reqwest-backed [`EntityGateway`] speaking the console's REST conventions:
//! `{server}/ws/rest/{version}/{module}/{entity}` for the collection and
//! `/{uuid}` for one item.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use screen_core::{EntityGateway, PARAM_REST_ENTITY_NAME, PARAM_UUID};
use serde_json::Value;
use shared::{
    domain::{EntityRecord, RequestParams},
    error::{ApiError, GatewayError},
};
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

mod settings;

pub use settings::{load_settings, normalize_server_url, GatewaySettings};

#[derive(Debug, Clone)]
struct BaseTarget {
    module_name: String,
    rest_version: String,
}

pub struct RestEntityGateway {
    http: Client,
    server_url: Url,
    target: Mutex<Option<BaseTarget>>,
}

impl RestEntityGateway {
    pub fn new(mut server_url: Url) -> Self {
        // A trailing slash keeps Url::join from eating the last path segment.
        if !server_url.path().ends_with('/') {
            let path = format!("{}/", server_url.path());
            server_url.set_path(&path);
        }
        Self {
            http: Client::new(),
            server_url,
            target: Mutex::new(None),
        }
    }

    pub fn from_settings(settings: &GatewaySettings) -> Result<Self, GatewayError> {
        let server_url = Url::parse(&settings.server_url)
            .map_err(|err| GatewayError::InvalidRequest(format!("invalid server url: {err}")))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        let mut gateway = Self::new(server_url);
        gateway.http = http;
        Ok(gateway)
    }

    async fn entity_url(
        &self,
        params: &RequestParams,
        uuid: Option<&str>,
    ) -> Result<Url, GatewayError> {
        let target = self
            .target
            .lock()
            .await
            .clone()
            .ok_or(GatewayError::Unconfigured)?;
        let entity = params.get(PARAM_REST_ENTITY_NAME).ok_or_else(|| {
            GatewayError::InvalidRequest("missing rest_entity_name parameter".into())
        })?;
        let mut path = format!(
            "ws/rest/{}/{}/{entity}",
            target.rest_version, target.module_name
        );
        if let Some(uuid) = uuid {
            if uuid.is_empty() {
                return Err(GatewayError::InvalidRequest("empty uuid".into()));
            }
            path.push('/');
            path.push_str(uuid);
        }
        self.server_url
            .join(&path)
            .map_err(|err| GatewayError::InvalidRequest(err.to_string()))
    }

    /// Params that are not encoded into the path travel as the query string.
    fn extra_query(params: &RequestParams) -> Vec<(String, String)> {
        params
            .iter()
            .filter(|(key, _)| key.as_str() != PARAM_UUID && key.as_str() != PARAM_REST_ENTITY_NAME)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, GatewayError> {
        let response = request
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ApiError>(&text) {
                Ok(api) => GatewayError::Api(api),
                Err(_) => GatewayError::Http {
                    status: status.as_u16(),
                    detail: text,
                },
            });
        }
        if text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|err| GatewayError::Decode(err.to_string()))
    }
}

#[async_trait]
impl EntityGateway for RestEntityGateway {
    async fn set_base_url(&self, module_name: &str, rest_version: &str) {
        info!(module_name, rest_version, "entity gateway target configured");
        *self.target.lock().await = Some(BaseTarget {
            module_name: module_name.to_string(),
            rest_version: rest_version.to_string(),
        });
    }

    async fn load_entity(&self, params: RequestParams) -> Result<Value, GatewayError> {
        let uuid = params
            .get(PARAM_UUID)
            .cloned()
            .ok_or_else(|| GatewayError::InvalidRequest("missing uuid parameter".into()))?;
        let url = self.entity_url(&params, Some(&uuid)).await?;
        debug!(%url, "loading entity");
        self.send(self.http.get(url).query(&Self::extra_query(&params)))
            .await
    }

    async fn save_or_update_entity(
        &self,
        params: RequestParams,
        entity: &EntityRecord,
    ) -> Result<Value, GatewayError> {
        let uuid = entity.uuid_str();
        let url = if uuid.is_empty() {
            self.entity_url(&params, None).await?
        } else {
            self.entity_url(&params, Some(uuid)).await?
        };
        debug!(%url, new = uuid.is_empty(), "saving entity");
        self.send(
            self.http
                .post(url)
                .query(&Self::extra_query(&params))
                .json(entity),
        )
        .await
    }

    async fn retire_or_unretire_entity(
        &self,
        params: RequestParams,
        entity: &EntityRecord,
    ) -> Result<Value, GatewayError> {
        let uuid = entity.uuid_str();
        if uuid.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "cannot retire a record without a uuid".into(),
            ));
        }
        let url = self.entity_url(&params, Some(uuid)).await?;

        // Direction follows the record's current retired flag: a retired
        // record is unretired, anything else is retired.
        if entity.retired {
            debug!(%url, "unretiring entity");
            self.send(
                self.http
                    .post(url)
                    .query(&Self::extra_query(&params))
                    .json(&serde_json::json!({ "retired": false })),
            )
            .await
        } else {
            debug!(%url, "retiring entity");
            let mut query = Self::extra_query(&params);
            if let Some(reason) = &entity.retire_reason {
                query.push(("reason".to_string(), reason.clone()));
            }
            self.send(self.http.delete(url).query(&query)).await
        }
    }

    async fn purge_entity(
        &self,
        params: RequestParams,
        entity: &EntityRecord,
    ) -> Result<(), GatewayError> {
        let uuid = entity.uuid_str();
        if uuid.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "cannot purge a record without a uuid".into(),
            ));
        }
        let url = self.entity_url(&params, Some(uuid)).await?;
        debug!(%url, "purging entity");
        let mut query = Self::extra_query(&params);
        query.push(("purge".to_string(), "true".to_string()));
        self.send(self.http.delete(url).query(&query)).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
