use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use sea_orm::DatabaseConnection;
use tokio::sync::broadcast;

use crate::{EngineError, PriceTable, ResultEngine};

mod history;
mod subscription;
mod trips;

pub use history::ClearOutcome;
pub use subscription::TripSubscription;

/// Buffered change notifications per subscriber before it is considered lagged.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.db()?.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// A change to one owner's trip set.
#[derive(Clone, Debug)]
pub(crate) struct TripChange {
    pub(crate) user_id: Arc<str>,
}

#[derive(Debug)]
pub struct Engine {
    database: Option<DatabaseConnection>,
    prices: PriceTable,
    changes: broadcast::Sender<TripChange>,
    last_created_at: Mutex<DateTime<Utc>>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// `true` when built without a database. Every store operation then
    /// fails with [`EngineError::Unavailable`].
    pub fn is_degraded(&self) -> bool {
        self.database.is_none()
    }

    fn db(&self) -> ResultEngine<&DatabaseConnection> {
        self.database
            .as_ref()
            .ok_or_else(|| EngineError::Unavailable("no database configured".to_string()))
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    /// Price for `region`, falling back to the table default.
    pub fn lookup_price(&self, region: &str) -> f64 {
        self.prices.lookup(region)
    }

    fn notify(&self, user_id: &str) {
        // No receivers is not an error: nobody is watching this owner.
        let _ = self.changes.send(TripChange {
            user_id: Arc::from(user_id),
        });
    }

    /// Creation timestamps are strictly increasing within this engine.
    fn next_created_at(&self) -> DateTime<Utc> {
        let mut last = self
            .last_created_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now();
        let next = if now > *last {
            now
        } else {
            *last + Duration::microseconds(1)
        };
        *last = next;
        next
    }
}

fn require_owner(user_id: &str) -> ResultEngine<&str> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Identity(
            "owner identity must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: Option<DatabaseConnection>,
    prices: PriceTable,
}

impl EngineBuilder {
    /// Pass the required database. Without it the engine is degraded.
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = Some(db);
        self
    }

    /// Replace the built-in price table.
    pub fn prices(mut self, prices: PriceTable) -> EngineBuilder {
        self.prices = prices;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let engine = Engine {
            database: self.database,
            prices: self.prices,
            changes,
            last_created_at: Mutex::new(DateTime::<Utc>::MIN_UTC),
        };
        if engine.is_degraded() {
            tracing::warn!("engine built without a database; persistence is disabled");
        }
        Ok(engine)
    }
}
