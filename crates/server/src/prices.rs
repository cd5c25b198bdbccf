//! Price lookup endpoint

use api_types::price::PriceView;
use axum::{
    Json,
    extract::{Path, State},
};

use crate::server::ServerState;

/// Handle requests for the fuel price of a region
pub async fn get(State(state): State<ServerState>, Path(region): Path<String>) -> Json<PriceView> {
    let prices = state.engine.prices();
    Json(PriceView {
        price: prices.lookup(&region),
        listed: prices.contains(&region),
        region,
    })
}
