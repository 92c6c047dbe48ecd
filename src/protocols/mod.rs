pub mod headers;
pub mod http;

pub use http::{forward, ReqwestTransport, UpstreamRequest, UpstreamTransport};
