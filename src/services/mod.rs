pub mod gateway;
pub mod matcher;
pub mod prompt;
pub mod providers;
pub mod proxy;
pub mod rate_limit;

pub use gateway::{GatewayOutcome, RecommendationGateway};
pub use matcher::LocalMatcher;
pub use proxy::RecommendProxy;
