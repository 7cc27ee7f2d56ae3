//! Terminal log streaming viewer for cloud-hosted site environments
//!
//! - `logstream` - categories, filters, messages, buffer, wire protocol
//! - `session` - connection state machine and its async driver
//! - `transport` - WebSocket client
//! - `cloud` - REST client, site cache
//! - `app`, `ui`, `input` - terminal interface

pub mod app;
pub mod cli;
pub mod cloud;
pub mod config;
pub mod constants;
pub mod error;
pub mod input;
pub mod logstream;
pub mod session;
pub mod settings;
pub mod transport;
pub mod ui;
