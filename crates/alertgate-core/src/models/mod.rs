//! Data models for AlertGate
//!
//! Field names follow the remote Alertmanager wire format so values can be
//! forwarded without an intermediate representation.

mod alert;
mod config;
mod receiver;
mod silence;

pub use alert::*;
pub use config::*;
pub use receiver::*;
pub use silence::*;
