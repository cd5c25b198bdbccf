use sea_orm::DatabaseConnection;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use crate::{ResultEngine, Trip};

use super::{Engine, TripChange, require_owner, trips::load_trips};

/// Live, ordered view of one owner's trips.
///
/// The first [`next`](Self::next) returns the current snapshot; every later
/// call waits until the owner's trip set changes and returns the new
/// snapshot (most recent first). Changes that pile up between two calls are
/// coalesced into one delivery.
///
/// Call [`cancel`](Self::cancel) once the view is no longer needed. It
/// consumes the handle, so no snapshot can be delivered afterwards.
#[derive(Debug)]
pub struct TripSubscription {
    user_id: String,
    database: DatabaseConnection,
    changes: broadcast::Receiver<TripChange>,
    initial_pending: bool,
}

impl Engine {
    /// Register a live subscription to the trips of `user_id`.
    ///
    /// Registration happens before the first snapshot is read, so no change
    /// between the two is missed. A degraded engine refuses to subscribe,
    /// since it could never deliver a change.
    pub fn subscribe(&self, user_id: &str) -> ResultEngine<TripSubscription> {
        let user_id = require_owner(user_id)?;
        let database = self.db()?.clone();
        let changes = self.changes.subscribe();
        tracing::debug!(user_id, "trip subscription registered");
        Ok(TripSubscription {
            user_id: user_id.to_string(),
            database,
            changes,
            initial_pending: true,
        })
    }
}

impl TripSubscription {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Wait for the next snapshot.
    ///
    /// Returns `None` once the engine has been dropped.
    pub async fn next(&mut self) -> Option<ResultEngine<Vec<Trip>>> {
        if self.initial_pending {
            self.initial_pending = false;
            return Some(self.load().await);
        }

        loop {
            match self.changes.recv().await {
                Ok(change) if *change.user_id == *self.user_id => break,
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    // Missed notifications may have been ours; re-read.
                    tracing::debug!(user_id = %self.user_id, skipped, "trip subscription lagged");
                    break;
                }
                Err(RecvError::Closed) => return None,
            }
        }
        self.drain_pending();

        Some(self.load().await)
    }

    async fn load(&self) -> ResultEngine<Vec<Trip>> {
        load_trips(&self.database, &self.user_id).await
    }

    /// Drop notifications already queued; the snapshot about to be read
    /// covers them.
    fn drain_pending(&mut self) {
        loop {
            match self.changes.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    /// Unregister. No further snapshots are delivered.
    pub fn cancel(self) {
        tracing::debug!(user_id = %self.user_id, "trip subscription cancelled");
    }
}
