//! Interfaces layer: the REST API.

pub mod http;
