//! Provider adapters for gantry.
//!
//! Each supported host (dokploy, vercel, netlify) gets an adapter that
//! translates the uniform deploy contract — ensure resource, configure
//! routing, set variables, trigger and wait — into that provider's actual
//! API, quirks included. Everything above this crate sees one vocabulary:
//! [`ResourceSpec`] in, [`DeployOutcome`] out, failures normalized into the
//! four [`ProviderError`] classes.

pub mod dokploy;
pub mod error;
pub mod netlify;
pub mod provider;
pub mod retry;
pub mod transport;
pub mod types;
pub mod vercel;

pub use dokploy::DokployAdapter;
pub use error::{ProviderError, ProviderResult};
pub use netlify::NetlifyAdapter;
pub use provider::{Provider, ProviderSet};
pub use retry::{Retried, run_with_retry};
pub use transport::{ApiCall, ApiReply, HttpTransport, ScriptedTransport, Transport, Verb};
pub use types::{BuildRef, BuildState, DeployOutcome, ResourceSpec, RouteSettings};
pub use vercel::VercelAdapter;
