mod project;
mod recommendation;

pub use project::{Category, Project, ProjectType};
pub use recommendation::{
    QueryResult, Recommendation, RecommendRequest, RemoteEntry, RemotePayload, Source,
    MAX_MATCH_SCORE,
};
