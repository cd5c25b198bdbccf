//! Form API endpoints
//!
//! Each identity owns one in-memory `FormOrchestrator`. Requests without an
//! identity share a single session.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use api_types::{
    FieldErrorView,
    estimate::{ResultItem, ResultView},
    form::{
        FormView, ModeUpdate, MonthlyDraftPatch, MonthlyDraftView, SubmitResponse, TripDraftPatch,
        TripDraftView,
    },
};
use axum::{Extension, Json, extract::State};
use engine::{Estimate, FormOrchestrator, Mode, PriceTable, TripDraft};

use crate::{ServerError, server::Identity, server::ServerState, trips::trip_view};

struct Session {
    form: FormOrchestrator,
    last_seen: Instant,
}

/// In-memory form sessions.
///
/// Sessions idle for longer than `idle` are dropped. When `capacity` is
/// reached the least recently used idle session makes room for a new one.
/// A session with a submission in flight is never evicted.
pub struct FormSessions {
    prices: PriceTable,
    idle: Duration,
    capacity: usize,
    sessions: Mutex<HashMap<String, Session>>,
}

impl FormSessions {
    pub(crate) fn new(prices: PriceTable, idle: Duration, capacity: usize) -> Self {
        Self {
            prices,
            idle,
            capacity: capacity.max(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` on the session of `key`, creating it on first use.
    fn with<T>(&self, key: &str, f: impl FnOnce(&mut FormOrchestrator) -> T) -> T {
        self.with_at(key, Instant::now(), f)
    }

    fn with_at<T>(
        &self,
        key: &str,
        now: Instant,
        f: impl FnOnce(&mut FormOrchestrator) -> T,
    ) -> T {
        let mut sessions = self.lock();

        let before = sessions.len();
        sessions.retain(|k, session| {
            k == key
                || session.form.is_submitting()
                || now.saturating_duration_since(session.last_seen) <= self.idle
        });
        if sessions.len() < before {
            tracing::debug!(expired = before - sessions.len(), "form sessions expired");
        }

        if !sessions.contains_key(key) && sessions.len() >= self.capacity {
            let oldest = sessions
                .iter()
                .filter(|(_, session)| !session.form.is_submitting())
                .min_by_key(|(_, session)| session.last_seen)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                tracing::debug!("form session limit reached, evicting least recently used");
                sessions.remove(&oldest);
            }
        }

        let session = sessions.entry(key.to_string()).or_insert_with(|| Session {
            form: FormOrchestrator::new(self.prices),
            last_seen: now,
        });
        session.last_seen = now;
        f(&mut session.form)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lock().len()
    }
}

/// Clears the busy flag of a session when dropped, including when the
/// request future is cancelled mid-save.
struct InFlight<'a> {
    sessions: &'a FormSessions,
    key: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.sessions.with(&self.key, FormOrchestrator::finish_submit);
    }
}

pub(crate) fn map_mode(mode: Mode) -> api_types::Mode {
    match mode {
        Mode::Trip => api_types::Mode::Trip,
        Mode::Daily => api_types::Mode::Daily,
        Mode::Monthly => api_types::Mode::Monthly,
    }
}

fn unmap_mode(mode: api_types::Mode) -> Mode {
    match mode {
        api_types::Mode::Trip => Mode::Trip,
        api_types::Mode::Daily => Mode::Daily,
        api_types::Mode::Monthly => Mode::Monthly,
    }
}

pub(crate) fn result_view(estimate: &Estimate) -> ResultView {
    let summary = estimate.summary();
    ResultView {
        mode: map_mode(estimate.mode()),
        title: summary.title,
        items: summary
            .items
            .into_iter()
            .map(|item| ResultItem {
                label: item.label,
                value: item.value.value(),
                display: item.value.to_string(),
            })
            .collect(),
    }
}

fn draft_view(draft: Option<&TripDraft>) -> TripDraftView {
    draft
        .map(|draft| TripDraftView {
            distance: draft.distance,
            efficiency: draft.efficiency,
            state: draft.state.clone(),
            fuel_price: draft.fuel_price,
        })
        .unwrap_or_default()
}

fn form_view(form: &FormOrchestrator) -> FormView {
    let monthly = form.monthly_draft();
    FormView {
        mode: map_mode(form.mode()),
        trip: draft_view(form.trip_draft(Mode::Trip)),
        daily: draft_view(form.trip_draft(Mode::Daily)),
        monthly: MonthlyDraftView {
            daily_cost: monthly.daily_cost,
            commute_days: monthly.commute_days,
        },
        result: form.result().map(result_view),
        errors: form
            .errors()
            .fields()
            .iter()
            .map(|err| FieldErrorView {
                field: err.field.to_string(),
                message: err.message.clone(),
            })
            .collect(),
        submitting: form.is_submitting(),
    }
}

/// Handle requests for the current form state
pub async fn get(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
) -> Json<FormView> {
    Json(state.forms.with(&identity.session_key(), |form| form_view(form)))
}

/// Handle requests for switching the active mode
pub async fn set_mode(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Json(payload): Json<ModeUpdate>,
) -> Json<FormView> {
    Json(state.forms.with(&identity.session_key(), |form| {
        form.set_mode(unmap_mode(payload.mode));
        form_view(form)
    }))
}

fn apply_trip_patch(form: &mut FormOrchestrator, mode: Mode, patch: TripDraftPatch) {
    if let Some(distance) = patch.distance {
        form.set_distance(mode, Some(distance));
    }
    if let Some(efficiency) = patch.efficiency {
        form.set_efficiency(mode, Some(efficiency));
    }
    if let Some(state) = patch.state {
        form.set_region(mode, &state);
    }
    // Applied after the region so an explicit price in the same request wins.
    if let Some(fuel_price) = patch.fuel_price {
        form.set_fuel_price(mode, Some(fuel_price));
    }
}

/// Handle edits of the Trip mode draft
pub async fn patch_trip(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Json(payload): Json<TripDraftPatch>,
) -> Json<FormView> {
    Json(state.forms.with(&identity.session_key(), |form| {
        apply_trip_patch(form, Mode::Trip, payload);
        form_view(form)
    }))
}

/// Handle edits of the Daily mode draft
pub async fn patch_daily(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Json(payload): Json<TripDraftPatch>,
) -> Json<FormView> {
    Json(state.forms.with(&identity.session_key(), |form| {
        apply_trip_patch(form, Mode::Daily, payload);
        form_view(form)
    }))
}

/// Handle edits of the Monthly mode draft
pub async fn patch_monthly(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Json(payload): Json<MonthlyDraftPatch>,
) -> Json<FormView> {
    Json(state.forms.with(&identity.session_key(), |form| {
        if let Some(daily_cost) = payload.daily_cost {
            form.set_daily_cost(Some(daily_cost));
        }
        if let Some(commute_days) = payload.commute_days {
            form.set_commute_days(Some(commute_days));
        }
        form_view(form)
    }))
}

/// Handle submission of the active mode
///
/// The estimate is returned even when saving the trip fails; the failure is
/// reported in `warning`.
pub async fn submit(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
) -> Result<Json<SubmitResponse>, ServerError> {
    let key = identity.session_key();
    let submission = state.forms.with(&key, FormOrchestrator::begin_submit)?;
    let _in_flight = InFlight {
        sessions: &state.forms,
        key,
    };

    let report = submission
        .save(Some(state.engine.as_ref()), identity.user_id())
        .await;

    Ok(Json(SubmitResponse {
        result: result_view(&report.estimate),
        trip: report.trip.map(trip_view),
        warning: report.warning,
    }))
}
