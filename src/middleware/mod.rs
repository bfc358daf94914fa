pub mod client_ip;
pub mod request_id;

pub use client_ip::ClientIp;
pub use request_id::{request_id_middleware, make_span_with_request_id, RequestId};
