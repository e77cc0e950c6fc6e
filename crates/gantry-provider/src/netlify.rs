//! Netlify adapter.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::ProviderResult;
use crate::transport::{ApiCall, HttpTransport, Transport, parse_reply};
use crate::types::{BuildRef, BuildState, ResourceSpec, RouteSettings, absolute_url};
use gantry_core::config::ProviderCredentials;

pub struct NetlifyAdapter {
    transport: Arc<dyn Transport>,
}

#[derive(Debug, Deserialize)]
struct Site {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TriggeredBuild {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "deploy_id", default)]
    deploy_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Deploy {
    state: String,
    #[serde(rename = "ssl_url", default)]
    ssl_url: Option<String>,
    #[serde(rename = "error_message", default)]
    error_message: Option<String>,
}

impl NetlifyAdapter {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn connect(creds: &ProviderCredentials) -> ProviderResult<Self> {
        let transport = HttpTransport::new(
            &creds.base_url,
            "authorization",
            format!("Bearer {}", creds.token),
        )?;
        Ok(Self::new(Arc::new(transport)))
    }

    pub(crate) async fn ensure_resource(
        &self,
        name: &str,
        _spec: &ResourceSpec,
    ) -> ProviderResult<String> {
        let reply = self.transport.send(ApiCall::get("/api/v1/sites")).await?;
        let sites: Vec<Site> = parse_reply(reply.body, "sites list")?;
        if let Some(existing) = sites.iter().find(|s| s.name.eq_ignore_ascii_case(name)) {
            debug!(app = name, id = %existing.id, "netlify site exists");
            return Ok(existing.id.clone());
        }

        let reply = self
            .transport
            .send(ApiCall::post("/api/v1/sites", json!({ "name": name })))
            .await?;
        let created: Site = parse_reply(reply.body, "site create")?;
        info!(app = name, id = %created.id, "netlify site created");
        Ok(created.id)
    }

    pub(crate) async fn configure(
        &self,
        resource_id: &str,
        route: &RouteSettings,
    ) -> ProviderResult<bool> {
        self.transport
            .send(ApiCall::patch(
                format!("/api/v1/sites/{resource_id}"),
                json!({ "custom_domain": route.domain }),
            ))
            .await?;
        Ok(true)
    }

    pub(crate) async fn set_variable(
        &self,
        resource_id: &str,
        key: &str,
        value: &str,
    ) -> ProviderResult<bool> {
        // The env endpoint 400s when the payload carries `scopes` (the
        // build-only flag other netlify surfaces accept). Send the minimal
        // shape only.
        self.transport
            .send(ApiCall::put(
                format!("/api/v1/sites/{resource_id}/env/{key}"),
                json!({
                    "key": key,
                    "values": [{ "value": value, "context": "all" }],
                }),
            ))
            .await?;
        Ok(true)
    }

    pub(crate) async fn trigger(&self, resource_id: &str) -> ProviderResult<BuildRef> {
        let reply = self
            .transport
            .send(ApiCall::post(
                format!("/api/v1/sites/{resource_id}/builds"),
                json!({}),
            ))
            .await?;
        let build: TriggeredBuild = parse_reply(reply.body, "build trigger")?;
        Ok(BuildRef {
            resource_id: resource_id.to_string(),
            external_id: build.deploy_id.or(build.id),
            url: None,
        })
    }

    pub(crate) async fn poll_build(&self, build: &BuildRef) -> ProviderResult<BuildState> {
        let Some(id) = build.external_id.as_deref() else {
            // No deploy id on the trigger reply; fall back to the site's
            // latest deploy.
            return self.poll_latest(&build.resource_id).await;
        };
        let reply = self
            .transport
            .send(ApiCall::get(format!("/api/v1/deploys/{id}")))
            .await?;
        let deploy: Deploy = parse_reply(reply.body, "deploy get")?;
        Ok(map_deploy_state(deploy))
    }

    async fn poll_latest(&self, resource_id: &str) -> ProviderResult<BuildState> {
        let reply = self
            .transport
            .send(ApiCall::get(format!(
                "/api/v1/sites/{resource_id}/deploys?per_page=1"
            )))
            .await?;
        let mut deploys: Vec<Deploy> = parse_reply(reply.body, "deploys list")?;
        match deploys.pop() {
            Some(deploy) => Ok(map_deploy_state(deploy)),
            None => Ok(BuildState::InProgress),
        }
    }
}

/// Netlify deploys pass through a long state vocabulary (new, enqueued,
/// building, processing, ...). Only `ready` and `error` are terminal.
fn map_deploy_state(deploy: Deploy) -> BuildState {
    match deploy.state.as_str() {
        "ready" => BuildState::Succeeded {
            url: deploy.ssl_url.as_deref().map(absolute_url),
        },
        "error" => BuildState::Failed {
            log_tail: deploy.error_message.into_iter().collect(),
        },
        _ => BuildState::InProgress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::transport::ScriptedTransport;

    fn adapter() -> (Arc<ScriptedTransport>, NetlifyAdapter) {
        let transport = Arc::new(ScriptedTransport::new());
        (transport.clone(), NetlifyAdapter::new(transport))
    }

    #[tokio::test]
    async fn env_payload_never_carries_the_scopes_flag() {
        let (transport, netlify) = adapter();
        transport.push_reply(200, json!({ "key": "API_KEY" }));

        netlify.set_variable("site_1", "API_KEY", "s3cret").await.unwrap();

        let call = &transport.calls()[0];
        assert_eq!(call.path, "/api/v1/sites/site_1/env/API_KEY");
        let body = call.body.as_ref().unwrap().as_object().unwrap();
        assert!(!body.contains_key("scopes"));
        assert_eq!(body["values"][0]["context"], "all");
    }

    #[tokio::test]
    async fn ensure_resource_matches_sites_case_insensitively() {
        let (transport, netlify) = adapter();
        transport.push_reply(
            200,
            json!([{ "id": "site_1", "name": "Landing" }]),
        );

        let spec = ResourceSpec {
            repo_url: "https://github.com/acme/landing".into(),
            framework: "astro".into(),
            port: 4321,
            build_recipe: None,
        };
        let id = netlify.ensure_resource("landing", &spec).await.unwrap();
        assert_eq!(id, "site_1");
    }

    #[tokio::test]
    async fn poll_reads_the_deploy_state() {
        let (transport, netlify) = adapter();
        let build = BuildRef {
            resource_id: "site_1".into(),
            external_id: Some("dep_5".into()),
            url: None,
        };

        transport.push_reply(200, json!({ "state": "building" }));
        assert_eq!(netlify.poll_build(&build).await.unwrap(), BuildState::InProgress);

        transport.push_reply(
            200,
            json!({ "state": "ready", "ssl_url": "https://landing.netlify.app" }),
        );
        assert_eq!(
            netlify.poll_build(&build).await.unwrap(),
            BuildState::Succeeded { url: Some("https://landing.netlify.app".into()) }
        );

        transport.push_reply(
            200,
            json!({ "state": "error", "error_message": "Build script returned non-zero exit code" }),
        );
        let state = netlify.poll_build(&build).await.unwrap();
        assert!(matches!(state, BuildState::Failed { log_tail } if log_tail.len() == 1));
    }

    #[tokio::test]
    async fn trigger_prefers_the_deploy_id() {
        let (transport, netlify) = adapter();
        transport.push_reply(200, json!({ "id": "bld_2", "deploy_id": "dep_5" }));

        let build = netlify.trigger("site_1").await.unwrap();
        assert_eq!(build.external_id.as_deref(), Some("dep_5"));
    }
}
