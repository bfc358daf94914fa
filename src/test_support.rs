//! Helpers shared by unit tests
use std::sync::Arc;

use axum::Router;

use crate::catalog::Catalog;

/// Serves a router on an ephemeral localhost port and returns its base URL
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn builtin_catalog() -> Arc<Catalog> {
    Arc::new(Catalog::builtin().unwrap())
}
