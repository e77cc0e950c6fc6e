//! Project metadata — the interface to the external framework detector.
//!
//! Detection heuristics live upstream; this module only maps an
//! already-detected framework tag onto its toolchain defaults, and picks a
//! default provider and build recipe for it. Plain lookup tables, nothing
//! clever.

use serde::{Deserialize, Serialize};

use crate::types::ProviderKind;

/// Detected project metadata for an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub language: String,
    pub framework: String,
    pub port: u16,
    pub build_command: String,
    pub test_command: Option<String>,
    pub start_command: String,
    pub needs_database: bool,
}

impl ProjectMeta {
    /// Toolchain defaults for a framework tag. Unknown tags get a generic
    /// profile rather than an error — the tag still names the framework,
    /// we just cannot fill in commands for it.
    pub fn for_framework(tag: &str, port: u16) -> Self {
        let tag = tag.trim().to_ascii_lowercase();
        match tag.as_str() {
            "nextjs" => Self {
                language: "javascript".into(),
                framework: tag,
                port,
                build_command: "npm run build".into(),
                test_command: Some("npm test".into()),
                start_command: "npm run start".into(),
                needs_database: false,
            },
            "astro" | "vite" | "static" => Self {
                language: "javascript".into(),
                framework: tag,
                port,
                build_command: "npm run build".into(),
                test_command: None,
                start_command: "npm run preview".into(),
                needs_database: false,
            },
            "express" => Self {
                language: "javascript".into(),
                framework: tag,
                port,
                build_command: "npm install".into(),
                test_command: Some("npm test".into()),
                start_command: "node server.js".into(),
                needs_database: false,
            },
            "fastapi" => Self {
                language: "python".into(),
                framework: tag,
                port,
                build_command: "pip install -r requirements.txt".into(),
                test_command: Some("pytest".into()),
                start_command: format!("uvicorn main:app --host 0.0.0.0 --port {port}"),
                needs_database: false,
            },
            "django" => Self {
                language: "python".into(),
                framework: tag,
                port,
                build_command: "pip install -r requirements.txt".into(),
                test_command: Some("python manage.py test".into()),
                start_command: format!("gunicorn app.wsgi --bind 0.0.0.0:{port}"),
                needs_database: true,
            },
            "rails" => Self {
                language: "ruby".into(),
                framework: tag,
                port,
                build_command: "bundle install".into(),
                test_command: Some("bundle exec rspec".into()),
                start_command: "bundle exec rails server".into(),
                needs_database: true,
            },
            "axum" => Self {
                language: "rust".into(),
                framework: tag,
                port,
                build_command: "cargo build --release".into(),
                test_command: Some("cargo test".into()),
                start_command: "./target/release/app".into(),
                needs_database: false,
            },
            _ => Self {
                language: "unknown".into(),
                framework: tag,
                port,
                build_command: String::new(),
                test_command: None,
                start_command: String::new(),
                needs_database: false,
            },
        }
    }

    /// Static-output frameworks suit the edge platforms; everything else
    /// needs a long-running process on the PaaS.
    pub fn is_static(&self) -> bool {
        matches!(self.framework.as_str(), "astro" | "vite" | "static")
    }
}

/// Default provider for a framework tag when the config names none.
pub fn default_provider(framework: &str) -> ProviderKind {
    match framework.trim().to_ascii_lowercase().as_str() {
        "astro" | "vite" | "static" => ProviderKind::Vercel,
        _ => ProviderKind::Dokploy,
    }
}

/// Name of the build recipe (Dockerfile template) for a framework tag.
///
/// Template bodies live outside this subsystem; the pipeline only needs to
/// know whether a recipe exists. `None` fails the runtime-image gate.
pub fn build_recipe(framework: &str) -> Option<&'static str> {
    match framework.trim().to_ascii_lowercase().as_str() {
        "nextjs" => Some("node20-standalone"),
        "astro" | "vite" | "static" => Some("static-nginx"),
        "express" => Some("node20-service"),
        "fastapi" => Some("python312-uvicorn"),
        "django" => Some("python312-gunicorn"),
        "rails" => Some("ruby33-puma"),
        "axum" => Some("rust-multistage"),
        _ => None,
    }
}
