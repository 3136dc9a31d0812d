//! Static informational page.

use axum::{extract::State, response::Html, routing::get, Router};

use crate::http::server::AppState;
use crate::routing::RouteKind;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(state.routes.prefix_of(RouteKind::Docs)))
}

pub fn render_index(docs_path: &str) -> String {
    format!("<h1>Jobs API</h1><a href=\"{docs_path}\">Documentation</a>")
}
