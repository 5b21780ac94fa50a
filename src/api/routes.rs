/*
 * Responsibility
 * - data routes の URL 構造を定義 (collection ごとに 2 本)
 *   - /{collection}       GET (list) / POST (create)  ... collection_guard
 *   - /{collection}/{id}  GET / PUT / PATCH / DELETE  ... resource_guard
 * - guard は route_layer で掛ける (未定義 path は guard を通さず 404)
 */
use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};

use crate::api::handlers::records::{
    create_record, delete_record, get_record, list_records, patch_record, replace_record,
};
use crate::middleware::auth::ownership::{collection_guard, resource_guard};
use crate::schema::{Categories, Collection, Todos};
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(collection_routes::<Todos>(state))
        .merge(collection_routes::<Categories>(state))
}

fn collection_routes<C: Collection>(state: &AppState) -> Router<AppState> {
    let collection = Router::new()
        .route(
            &format!("/{}", C::NAME),
            get(list_records::<C>).post(create_record::<C>),
        )
        .route_layer(from_fn(collection_guard));

    let resource = Router::new()
        .route(
            &format!("/{}/{{id}}", C::NAME),
            get(get_record::<C>)
                .put(replace_record::<C>)
                .patch(patch_record::<C>)
                .delete(delete_record::<C>),
        )
        .route_layer(from_fn_with_state(state.clone(), resource_guard::<C>));

    collection.merge(resource)
}
