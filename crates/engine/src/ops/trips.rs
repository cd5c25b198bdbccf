use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, prelude::*};

use crate::{NewTrip, ResultEngine, Trip, trips};

use super::{Engine, require_owner};

impl Engine {
    /// Persist a new trip for `user_id` and notify its live subscribers.
    ///
    /// The store assigns `id` and `created_at`. Nothing is retried.
    pub async fn write_trip(&self, user_id: &str, new_trip: NewTrip) -> ResultEngine<Trip> {
        let user_id = require_owner(user_id)?;
        let trip = new_trip.into_trip(user_id.to_string(), self.next_created_at());

        trips::ActiveModel::from(&trip)
            .insert(self.db()?)
            .await?;

        tracing::info!(
            user_id = %trip.user_id,
            trip_id = %trip.id,
            total_cost = trip.total_cost,
            "trip saved"
        );
        self.notify(user_id);
        Ok(trip)
    }

    /// All trips of `user_id`, most recent first.
    pub async fn list_trips(&self, user_id: &str) -> ResultEngine<Vec<Trip>> {
        let user_id = require_owner(user_id)?;
        load_trips(self.db()?, user_id).await
    }
}

pub(super) async fn load_trips<C>(db: &C, user_id: &str) -> ResultEngine<Vec<Trip>>
where
    C: ConnectionTrait,
{
    let models = trips::Entity::find()
        .filter(trips::Column::UserId.eq(user_id))
        .order_by_desc(trips::Column::CreatedAt)
        .order_by_desc(trips::Column::Id)
        .all(db)
        .await?;

    models.into_iter().map(Trip::try_from).collect()
}
