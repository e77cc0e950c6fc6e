//! Live deploy events for gantry.
//!
//! Each application key maps to a broadcast topic. Pipelines publish
//! progress events as stages run; the API layer subscribes on behalf of
//! SSE clients. Publishing never blocks and never fails: events sent to
//! a topic with no subscribers are dropped, and subscribers that fall
//! behind skip ahead rather than stalling the publisher. There is no
//! history replay; a subscriber sees events from subscription time on.

pub mod event;
pub mod stream;

pub use event::{DeployEvent, EventKind};
pub use stream::{DeployStream, Subscriber};
