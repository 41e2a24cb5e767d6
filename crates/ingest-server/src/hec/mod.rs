//! The HEC-compatible HTTP surface (§4.C, §6).

mod auth;
mod event;
mod handlers;
mod ip;
mod response;

pub use handlers::{collector_ack, collector_event, collector_health, collector_raw};
