//! 传输层模块：基于 reqwest 的 JSON、multipart 与 SSE 事件流请求。
//!
//! # Transport Module
//!
//! One [`HttpTransport`] per client. It attaches bearer authentication, resolves
//! service paths against the base URL, turns non-2xx responses into
//! [`crate::Error::Remote`] and exposes event streams as raw byte streams for the
//! [`crate::pipeline`] decoder.

pub mod http;

pub use http::{HttpTransport, TransportConfig, TransportError};
