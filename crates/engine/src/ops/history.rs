use sea_orm::{PaginatorTrait, QueryFilter, TransactionTrait, prelude::*};
use serde::Serialize;

use crate::{ResultEngine, trips};

use super::{Engine, require_owner, with_tx};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ClearOutcome {
    pub deleted_count: u64,
}

impl Engine {
    /// Delete every trip of `user_id` in one DB transaction.
    ///
    /// The owner's rows are counted and deleted inside the same transaction,
    /// so a trip written concurrently is either fully kept or fully removed.
    /// An owner without trips gets `deleted_count == 0` and no delete
    /// statement is issued.
    pub async fn clear_trips(&self, user_id: &str) -> ResultEngine<ClearOutcome> {
        let user_id = require_owner(user_id)?;

        let outcome: ResultEngine<ClearOutcome> = with_tx!(self, |db_tx| {
            let existing = trips::Entity::find()
                .filter(trips::Column::UserId.eq(user_id))
                .count(&db_tx)
                .await?;

            if existing == 0 {
                Ok(ClearOutcome::default())
            } else {
                let res = trips::Entity::delete_many()
                    .filter(trips::Column::UserId.eq(user_id))
                    .exec(&db_tx)
                    .await?;
                Ok(ClearOutcome {
                    deleted_count: res.rows_affected,
                })
            }
        });
        let outcome = outcome?;

        if outcome.deleted_count > 0 {
            tracing::info!(
                user_id,
                deleted = outcome.deleted_count,
                "trip history cleared"
            );
            self.notify(user_id);
        }
        Ok(outcome)
    }
}
