//! trigger-proxy - debounces repository change notifications into Jenkins
//! job triggers.
//!
//! Inbound notifications name a repository and branch; a static mapping
//! table resolves them to build jobs, and each job fires on the build
//! server only after a configurable quiet period with no further matching
//! events.

pub mod config;
pub mod debounce;
pub mod dispatch;
pub mod key;
pub mod mapping;
pub mod server;
pub mod types;
