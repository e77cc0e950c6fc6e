//! Dokploy adapter (self-hosted PaaS).
//!
//! Dokploy's REST surface is rpc-flavored: everything lives under
//! `/api/<entity>.<action>` and takes a JSON body keyed by `applicationId`.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::transport::{ApiCall, HttpTransport, Transport, parse_reply};
use crate::types::{BuildRef, BuildState, ResourceSpec, RouteSettings, absolute_url};
use gantry_core::config::ProviderCredentials;

pub struct DokployAdapter {
    transport: Arc<dyn Transport>,
}

#[derive(Debug, Deserialize)]
struct DokployApp {
    #[serde(rename = "applicationId")]
    application_id: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "applicationStatus", default)]
    status: Option<String>,
    #[serde(default)]
    fqdn: Option<String>,
    #[serde(rename = "logTail", default)]
    log_tail: Vec<String>,
}

impl DokployAdapter {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn connect(creds: &ProviderCredentials) -> ProviderResult<Self> {
        let transport = HttpTransport::new(&creds.base_url, "x-api-key", creds.token.clone())?;
        Ok(Self::new(Arc::new(transport)))
    }

    /// Find the application by name (case-insensitive) or create it.
    pub(crate) async fn ensure_resource(
        &self,
        name: &str,
        _spec: &ResourceSpec,
    ) -> ProviderResult<String> {
        let reply = self.transport.send(ApiCall::get("/api/application.all")).await?;
        let apps: Vec<DokployApp> = parse_reply(reply.body, "application.all")?;
        if let Some(existing) = apps.iter().find(|a| a.name.eq_ignore_ascii_case(name)) {
            debug!(app = name, id = %existing.application_id, "dokploy application exists");
            return Ok(existing.application_id.clone());
        }

        let reply = self
            .transport
            .send(ApiCall::post(
                "/api/application.create",
                json!({ "name": name, "appName": name }),
            ))
            .await?;
        let created: DokployApp = parse_reply(reply.body, "application.create")?;
        info!(app = name, id = %created.application_id, "dokploy application created");
        Ok(created.application_id)
    }

    pub(crate) async fn configure(
        &self,
        resource_id: &str,
        route: &RouteSettings,
    ) -> ProviderResult<bool> {
        let domain = self
            .transport
            .send(ApiCall::post(
                "/api/domain.create",
                json!({
                    "applicationId": resource_id,
                    "host": route.domain,
                    "port": route.port,
                    "https": true,
                }),
            ))
            .await?;
        let settings = self
            .transport
            .send(ApiCall::post(
                "/api/application.update",
                json!({
                    "applicationId": resource_id,
                    "healthCheckPath": route.health_path,
                }),
            ))
            .await?;
        // Dokploy answers mutations with a literal `false` body when the
        // change was not applied, still under HTTP 200.
        Ok(accepted(&domain.body) && accepted(&settings.body))
    }

    pub(crate) async fn set_variable(
        &self,
        resource_id: &str,
        key: &str,
        value: &str,
    ) -> ProviderResult<bool> {
        let reply = self
            .transport
            .send(ApiCall::post(
                "/api/application.saveEnvironment",
                json!({ "applicationId": resource_id, "key": key, "value": value }),
            ))
            .await?;
        Ok(accepted(&reply.body))
    }

    pub(crate) async fn trigger(&self, resource_id: &str) -> ProviderResult<BuildRef> {
        // The control verb must be `start`: the application router rejects
        // `deploy` even though the docs list it.
        self.transport
            .send(ApiCall::post(
                "/api/application.start",
                json!({ "applicationId": resource_id }),
            ))
            .await?;
        Ok(BuildRef {
            resource_id: resource_id.to_string(),
            external_id: None,
            url: None,
        })
    }

    pub(crate) async fn poll_build(&self, build: &BuildRef) -> ProviderResult<BuildState> {
        let reply = self
            .transport
            .send(ApiCall::get(format!(
                "/api/application.one?applicationId={}",
                build.resource_id
            )))
            .await?;
        let app: DokployApp = parse_reply(reply.body, "application.one")?;
        let status = app.status.as_deref().unwrap_or("unknown");
        match status {
            "done" => Ok(BuildState::Succeeded {
                url: app.fqdn.as_deref().map(absolute_url),
            }),
            "error" => Ok(BuildState::Failed { log_tail: app.log_tail }),
            "idle" | "running" => Ok(BuildState::InProgress),
            other => Err(ProviderError::Provider(format!(
                "unknown applicationStatus '{other}'"
            ))),
        }
    }
}

fn accepted(body: &Value) -> bool {
    *body != Value::Bool(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ScriptedTransport;

    fn adapter() -> (Arc<ScriptedTransport>, DokployAdapter) {
        let transport = Arc::new(ScriptedTransport::new());
        (transport.clone(), DokployAdapter::new(transport))
    }

    fn spec() -> ResourceSpec {
        ResourceSpec {
            repo_url: "https://github.com/acme/shop".into(),
            framework: "express".into(),
            port: 3000,
            build_recipe: Some("node20-standalone".into()),
        }
    }

    #[tokio::test]
    async fn ensure_resource_finds_existing_case_insensitively() {
        let (transport, dokploy) = adapter();
        transport.push_reply(
            200,
            json!([{ "applicationId": "app_1", "name": "Shop" }]),
        );

        let id = dokploy.ensure_resource("shop", &spec()).await.unwrap();
        assert_eq!(id, "app_1");
        // No create call follows a hit.
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn ensure_resource_creates_when_missing() {
        let (transport, dokploy) = adapter();
        transport.push_reply(200, json!([]));
        transport.push_reply(200, json!({ "applicationId": "app_9", "name": "shop" }));

        let id = dokploy.ensure_resource("shop", &spec()).await.unwrap();
        assert_eq!(id, "app_9");

        let calls = transport.calls();
        assert_eq!(calls[1].path, "/api/application.create");
        let body = calls[1].body.as_ref().unwrap();
        assert_eq!(body["appName"], "shop");
    }

    #[tokio::test]
    async fn trigger_uses_the_start_verb() {
        let (transport, dokploy) = adapter();
        transport.push_reply(200, Value::Null);

        let build = dokploy.trigger("app_1").await.unwrap();
        assert_eq!(build.resource_id, "app_1");
        assert!(build.external_id.is_none());

        let calls = transport.calls();
        assert_eq!(calls[0].path, "/api/application.start");
        assert_eq!(calls[0].body.as_ref().unwrap()["applicationId"], "app_1");
    }

    #[tokio::test]
    async fn poll_maps_application_status() {
        let (transport, dokploy) = adapter();
        let build = BuildRef {
            resource_id: "app_1".into(),
            external_id: None,
            url: None,
        };

        transport.push_reply(200, json!({ "applicationId": "app_1", "applicationStatus": "running" }));
        assert_eq!(dokploy.poll_build(&build).await.unwrap(), BuildState::InProgress);

        transport.push_reply(
            200,
            json!({ "applicationId": "app_1", "applicationStatus": "done", "fqdn": "shop.traefik.me" }),
        );
        assert_eq!(
            dokploy.poll_build(&build).await.unwrap(),
            BuildState::Succeeded { url: Some("https://shop.traefik.me".into()) }
        );

        transport.push_reply(
            200,
            json!({
                "applicationId": "app_1",
                "applicationStatus": "error",
                "logTail": ["npm ERR! missing script: build"],
            }),
        );
        let state = dokploy.poll_build(&build).await.unwrap();
        assert_eq!(
            state,
            BuildState::Failed { log_tail: vec!["npm ERR! missing script: build".into()] }
        );
    }

    #[tokio::test]
    async fn configure_reports_a_false_body_as_not_applied() {
        let (transport, dokploy) = adapter();
        transport.push_reply(200, json!({ "domainId": "d_1" }));
        transport.push_reply(200, Value::Bool(false));

        let route = RouteSettings::new("shop.traefik.me", 3000);
        let applied = dokploy.configure("app_1", &route).await.unwrap();
        assert!(!applied);
    }

    #[tokio::test]
    async fn set_variable_posts_one_key() {
        let (transport, dokploy) = adapter();
        transport.push_reply(200, Value::Bool(true));

        let applied = dokploy.set_variable("app_1", "NODE_ENV", "production").await.unwrap();
        assert!(applied);

        let calls = transport.calls();
        assert_eq!(calls[0].path, "/api/application.saveEnvironment");
        let body = calls[0].body.as_ref().unwrap();
        assert_eq!(body["key"], "NODE_ENV");
        assert_eq!(body["value"], "production");
    }
}
