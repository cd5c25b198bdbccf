//! Trip history API endpoints

use std::convert::Infallible;

use api_types::trip::{ClearResponse, TripList, TripView, format_date};
use axum::{
    Extension, Json,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use engine::{Amount, EngineError, Trip, TripSubscription};
use futures::stream::{self, Stream};

use crate::{ServerError, server::Identity, server::ServerState};

pub(crate) fn trip_view(trip: Trip) -> TripView {
    TripView {
        id: trip.id,
        distance: trip.distance,
        efficiency: trip.efficiency,
        date: format_date(trip.created_at),
        cost: Amount::new(trip.total_cost).to_string(),
        state: trip.state,
        fuel_price: trip.fuel_price,
        total_cost: trip.total_cost,
        created_at: trip.created_at,
    }
}

fn trip_list(trips: Vec<Trip>) -> TripList {
    TripList {
        trips: trips.into_iter().map(trip_view).collect(),
    }
}

/// Handle requests for the caller's trips, most recent first
pub async fn list(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
) -> Result<Json<TripList>, ServerError> {
    let user_id = identity.require()?;
    let trips = state.engine.list_trips(user_id).await?;
    Ok(Json(trip_list(trips)))
}

/// Handle requests for clearing the caller's whole history
pub async fn clear(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
) -> Result<Json<ClearResponse>, ServerError> {
    let user_id = identity.require()?;
    let outcome = state.engine.clear_trips(user_id).await?;
    Ok(Json(ClearResponse {
        deleted_count: outcome.deleted_count,
    }))
}

fn snapshot_event(snapshot: Result<Vec<Trip>, EngineError>) -> Event {
    match snapshot {
        Ok(trips) => Event::default()
            .event("snapshot")
            .json_data(trip_list(trips))
            .unwrap_or_else(|err| {
                tracing::error!("failed to encode trip snapshot: {err}");
                Event::default().event("error").data("failed to encode snapshot")
            }),
        Err(err) => {
            tracing::warn!("trip snapshot failed: {err}");
            Event::default().event("error").data(err.to_string())
        }
    }
}

/// Live trip history as Server-Sent Events.
///
/// One `snapshot` event is sent on connect and one after every change to the
/// caller's trips. The subscription is dropped, and so unregistered, when the
/// client disconnects.
pub async fn live(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ServerError> {
    let user_id = identity.require()?;
    let subscription = state.engine.subscribe(user_id)?;

    let events = stream::unfold(subscription, |mut subscription: TripSubscription| async move {
        let snapshot = subscription.next().await?;
        Some((Ok(snapshot_event(snapshot)), subscription))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
