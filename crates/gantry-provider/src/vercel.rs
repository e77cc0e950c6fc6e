//! Vercel adapter.
//!
//! Endpoint versions are pinned per route (`/v9`, `/v10`, `/v13`) the way
//! vercel's API actually versions them.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::transport::{ApiCall, HttpTransport, Transport, parse_reply};
use crate::types::{BuildRef, BuildState, ResourceSpec, RouteSettings, absolute_url};
use gantry_core::config::ProviderCredentials;

pub struct VercelAdapter {
    transport: Arc<dyn Transport>,
}

#[derive(Debug, Deserialize)]
struct ProjectList {
    projects: Vec<Project>,
}

#[derive(Debug, Deserialize)]
struct Project {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct Deployment {
    id: String,
    #[serde(rename = "readyState")]
    ready_state: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(rename = "errorMessage", default)]
    error_message: Option<String>,
}

impl VercelAdapter {
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
        spec: &ResourceSpec,
    ) -> ProviderResult<String> {
        let reply = self.transport.send(ApiCall::get("/v9/projects")).await?;
        let list: ProjectList = parse_reply(reply.body, "projects list")?;
        if let Some(existing) = list.projects.iter().find(|p| p.name.eq_ignore_ascii_case(name)) {
            debug!(app = name, id = %existing.id, "vercel project exists");
            return Ok(existing.id.clone());
        }

        let reply = self
            .transport
            .send(ApiCall::post(
                "/v10/projects",
                json!({ "name": name, "framework": spec.framework }),
            ))
            .await?;
        let created: Project = parse_reply(reply.body, "project create")?;
        info!(app = name, id = %created.id, "vercel project created");
        Ok(created.id)
    }

    /// Attach the domain. Port and health path have no counterpart on the
    /// edge platform; the domain attach is all of routing here.
    pub(crate) async fn configure(
        &self,
        resource_id: &str,
        route: &RouteSettings,
    ) -> ProviderResult<bool> {
        self.transport
            .send(ApiCall::post(
                format!("/v10/projects/{resource_id}/domains"),
                json!({ "name": route.domain }),
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
        self.transport
            .send(ApiCall::post(
                format!("/v10/projects/{resource_id}/env"),
                json!({
                    "key": key,
                    "value": value,
                    "type": "encrypted",
                    "target": ["production", "preview"],
                }),
            ))
            .await?;
        Ok(true)
    }

    pub(crate) async fn trigger(&self, resource_id: &str) -> ProviderResult<BuildRef> {
        let reply = self
            .transport
            .send(ApiCall::post(
                "/v13/deployments",
                json!({
                    "name": resource_id,
                    "project": resource_id,
                    "target": "production",
                }),
            ))
            .await?;
        let deployment: Deployment = parse_reply(reply.body, "deployment create")?;
        Ok(BuildRef {
            resource_id: resource_id.to_string(),
            external_id: Some(deployment.id),
            url: deployment.url.as_deref().map(absolute_url),
        })
    }

    pub(crate) async fn poll_build(&self, build: &BuildRef) -> ProviderResult<BuildState> {
        let Some(id) = build.external_id.as_deref() else {
            return Err(ProviderError::Provider(
                "vercel build has no deployment id to poll".into(),
            ));
        };
        let reply = self
            .transport
            .send(ApiCall::get(format!("/v13/deployments/{id}")))
            .await?;
        let deployment: Deployment = parse_reply(reply.body, "deployment get")?;
        match deployment.ready_state.as_str() {
            "READY" => Ok(BuildState::Succeeded {
                url: deployment.url.as_deref().map(absolute_url),
            }),
            "ERROR" => Ok(BuildState::Failed {
                log_tail: deployment.error_message.into_iter().collect(),
            }),
            // CANCELED is terminal but distinct from ERROR; keep the
            // distinction instead of folding it into failure.
            "CANCELED" => Ok(BuildState::Canceled),
            "QUEUED" | "BUILDING" | "INITIALIZING" => Ok(BuildState::InProgress),
            other => Err(ProviderError::Provider(format!(
                "unknown readyState '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::transport::ScriptedTransport;

    fn adapter() -> (Arc<ScriptedTransport>, VercelAdapter) {
        let transport = Arc::new(ScriptedTransport::new());
        (transport.clone(), VercelAdapter::new(transport))
    }

    fn build_ref(id: &str) -> BuildRef {
        BuildRef {
            resource_id: "prj_1".into(),
            external_id: Some(id.into()),
            url: None,
        }
    }

    #[tokio::test]
    async fn ensure_resource_reuses_projects_by_name() {
        let (transport, vercel) = adapter();
        transport.push_reply(
            200,
            json!({ "projects": [{ "id": "prj_1", "name": "Demo-Site" }] }),
        );

        let spec = ResourceSpec {
            repo_url: "https://github.com/acme/demo-site".into(),
            framework: "nextjs".into(),
            port: 3000,
            build_recipe: None,
        };
        let id = vercel.ensure_resource("demo-site", &spec).await.unwrap();
        assert_eq!(id, "prj_1");
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn trigger_targets_production() {
        let (transport, vercel) = adapter();
        transport.push_reply(
            200,
            json!({ "id": "dpl_77", "readyState": "QUEUED", "url": "demo-abc.vercel.app" }),
        );

        let build = vercel.trigger("prj_1").await.unwrap();
        assert_eq!(build.external_id.as_deref(), Some("dpl_77"));
        assert_eq!(build.url.as_deref(), Some("https://demo-abc.vercel.app"));

        let body = transport.calls()[0].body.clone().unwrap();
        assert_eq!(body["target"], "production");
    }

    #[tokio::test]
    async fn canceled_ready_state_is_terminal_and_distinct() {
        let (transport, vercel) = adapter();
        transport.push_reply(200, json!({ "id": "dpl_77", "readyState": "CANCELED" }));

        let state = vercel.poll_build(&build_ref("dpl_77")).await.unwrap();
        assert_eq!(state, BuildState::Canceled);
    }

    #[tokio::test]
    async fn ready_state_vocabulary_maps() {
        let (transport, vercel) = adapter();
        let build = build_ref("dpl_77");

        transport.push_reply(200, json!({ "id": "dpl_77", "readyState": "BUILDING" }));
        assert_eq!(vercel.poll_build(&build).await.unwrap(), BuildState::InProgress);

        transport.push_reply(
            200,
            json!({ "id": "dpl_77", "readyState": "READY", "url": "demo-abc.vercel.app" }),
        );
        assert_eq!(
            vercel.poll_build(&build).await.unwrap(),
            BuildState::Succeeded { url: Some("https://demo-abc.vercel.app".into()) }
        );

        transport.push_reply(
            200,
            json!({ "id": "dpl_77", "readyState": "ERROR", "errorMessage": "build exited 1" }),
        );
        assert_eq!(
            vercel.poll_build(&build).await.unwrap(),
            BuildState::Failed { log_tail: vec!["build exited 1".into()] }
        );

        transport.push_reply(200, json!({ "id": "dpl_77", "readyState": "MYSTERY" }));
        assert!(vercel.poll_build(&build).await.is_err());
    }

    #[tokio::test]
    async fn env_payload_targets_both_environments() {
        let (transport, vercel) = adapter();
        transport.push_reply(200, json!({ "created": { "id": "env_1" } }));

        vercel.set_variable("prj_1", "API_KEY", "s3cret").await.unwrap();

        let body = transport.calls()[0].body.clone().unwrap();
        assert_eq!(body["type"], "encrypted");
        assert_eq!(body["target"], json!(["production", "preview"]));
    }
}
