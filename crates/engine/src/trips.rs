//! Trip records.
//!
//! A `Trip` is one persisted estimate. It is written once, never updated,
//! and only removed together with the rest of its owner's history.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, TripInput};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub user_id: String,
    pub distance: f64,
    pub efficiency: f64,
    pub state: String,
    pub fuel_price: f64,
    pub total_cost: f64,
    pub created_at: DateTime<Utc>,
}

/// A trip ready to be written. Only constructible from a validated
/// [`TripInput`], so `total_cost` always matches the other fields.
#[derive(Clone, Debug, PartialEq)]
pub struct NewTrip {
    distance: f64,
    efficiency: f64,
    state: String,
    fuel_price: f64,
    total_cost: f64,
}

impl NewTrip {
    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub(crate) fn into_trip(self, user_id: String, created_at: DateTime<Utc>) -> Trip {
        Trip {
            id: Uuid::new_v4(),
            user_id,
            distance: self.distance,
            efficiency: self.efficiency,
            state: self.state,
            fuel_price: self.fuel_price,
            total_cost: self.total_cost,
            created_at,
        }
    }
}

impl From<&TripInput> for NewTrip {
    fn from(input: &TripInput) -> Self {
        Self {
            distance: input.distance(),
            efficiency: input.efficiency(),
            state: input.state().to_string(),
            fuel_price: input.fuel_price(),
            total_cost: input.cost(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "trips")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub distance: f64,
    pub efficiency: f64,
    pub state: String,
    pub fuel_price: f64,
    pub total_cost: f64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Trip> for ActiveModel {
    fn from(trip: &Trip) -> Self {
        Self {
            id: ActiveValue::Set(trip.id.to_string()),
            user_id: ActiveValue::Set(trip.user_id.clone()),
            distance: ActiveValue::Set(trip.distance),
            efficiency: ActiveValue::Set(trip.efficiency),
            state: ActiveValue::Set(trip.state.clone()),
            fuel_price: ActiveValue::Set(trip.fuel_price),
            total_cost: ActiveValue::Set(trip.total_cost),
            created_at: ActiveValue::Set(trip.created_at),
        }
    }
}

impl TryFrom<Model> for Trip {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidRecord(format!("invalid trip id: {}", model.id)))?,
            user_id: model.user_id,
            distance: model.distance,
            efficiency: model.efficiency,
            state: model.state,
            fuel_price: model.fuel_price,
            total_cost: model.total_cost,
            created_at: model.created_at,
        })
    }
}
