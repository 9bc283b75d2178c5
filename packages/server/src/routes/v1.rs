use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::link::*;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_links))
        .routes(routes!(create_link))
        .routes(routes!(edit_link))
        .routes(routes!(delete_link))
        .routes(routes!(delete_all_links))
}
