use std::time::Duration;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection};

use engine::{Engine, EngineError, FormError, FormOrchestrator, Mode, NewTrip, TripInput};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn new_trip(distance: f64, state: &str) -> NewTrip {
    let input = TripInput::new(Some(distance), Some(18.0), Some(state), Some(100.0)).unwrap();
    NewTrip::from(&input)
}

#[tokio::test]
async fn write_assigns_id_and_timestamp() {
    let (engine, _db) = engine_with_db().await;

    let trip = engine
        .write_trip("alice", new_trip(350.0, "Kerala"))
        .await
        .unwrap();
    assert_eq!(trip.user_id, "alice");
    assert_eq!(trip.state, "Kerala");
    assert!((trip.total_cost - 350.0 / 18.0 * 100.0).abs() < 1e-9);

    let listed = engine.list_trips("alice").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, trip.id);
}

#[tokio::test]
async fn list_is_most_recent_first() {
    let (engine, _db) = engine_with_db().await;

    let first = engine.write_trip("alice", new_trip(10.0, "Goa")).await.unwrap();
    let second = engine.write_trip("alice", new_trip(20.0, "Goa")).await.unwrap();
    let third = engine.write_trip("alice", new_trip(30.0, "Goa")).await.unwrap();

    let ids: Vec<_> = engine
        .list_trips("alice")
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);
    assert!(third.created_at > second.created_at);
    assert!(second.created_at > first.created_at);
}

#[tokio::test]
async fn owners_never_see_each_other() {
    let (engine, _db) = engine_with_db().await;

    engine.write_trip("alice", new_trip(10.0, "Goa")).await.unwrap();
    engine.write_trip("bob", new_trip(20.0, "Delhi")).await.unwrap();

    let alice = engine.list_trips("alice").await.unwrap();
    assert_eq!(alice.len(), 1);
    assert!(alice.iter().all(|t| t.user_id == "alice"));
}

#[tokio::test]
async fn empty_owner_is_an_identity_error() {
    let (engine, _db) = engine_with_db().await;

    let err = engine.write_trip("", new_trip(10.0, "Goa")).await.unwrap_err();
    assert!(matches!(err, EngineError::Identity(_)));
    assert!(matches!(engine.subscribe(" "), Err(EngineError::Identity(_))));
    assert!(matches!(engine.clear_trips("").await, Err(EngineError::Identity(_))));
}

#[tokio::test]
async fn degraded_engine_rejects_writes() {
    let engine = Engine::builder().build().await.unwrap();

    let err = engine.write_trip("alice", new_trip(10.0, "Goa")).await.unwrap_err();
    assert!(err.is_persistence());

    assert!(matches!(
        engine.subscribe("alice"),
        Err(EngineError::Unavailable(_))
    ));
    assert!(engine.clear_trips("alice").await.unwrap_err().is_persistence());
}

#[tokio::test]
async fn clear_removes_only_the_owner_trips() {
    let (engine, _db) = engine_with_db().await;

    engine.write_trip("alice", new_trip(10.0, "Goa")).await.unwrap();
    engine.write_trip("alice", new_trip(20.0, "Goa")).await.unwrap();
    engine.write_trip("bob", new_trip(30.0, "Goa")).await.unwrap();

    let outcome = engine.clear_trips("alice").await.unwrap();
    assert_eq!(outcome.deleted_count, 2);
    assert!(engine.list_trips("alice").await.unwrap().is_empty());
    assert_eq!(engine.list_trips("bob").await.unwrap().len(), 1);
}

#[tokio::test]
async fn clear_handles_histories_beyond_sqlite_variable_limit() {
    let (engine, db) = engine_with_db().await;
    db.execute_unprepared(
        "WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 40000) \
         INSERT INTO trips (id, user_id, distance, efficiency, state, fuel_price, total_cost, created_at) \
         SELECT printf('00000000-0000-4000-8000-%012d', i), 'alice', 10.0, 18.0, 'Goa', 100.0, 55.5, \
         '2026-03-05T10:00:00+00:00' FROM n",
    )
    .await
    .unwrap();
    engine.write_trip("bob", new_trip(30.0, "Goa")).await.unwrap();

    let mut sub = engine.subscribe("alice").unwrap();
    sub.next().await.unwrap().unwrap();

    let outcome = engine.clear_trips("alice").await.unwrap();
    assert_eq!(outcome.deleted_count, 40_000);
    assert!(sub.next().await.unwrap().unwrap().is_empty());
    assert_eq!(engine.list_trips("bob").await.unwrap().len(), 1);
}

#[tokio::test]
async fn clear_with_no_trips_is_a_no_op() {
    let (engine, _db) = engine_with_db().await;
    engine.write_trip("bob", new_trip(30.0, "Goa")).await.unwrap();

    let outcome = engine.clear_trips("alice").await.unwrap();
    assert_eq!(outcome.deleted_count, 0);
    assert_eq!(engine.list_trips("bob").await.unwrap().len(), 1);
}

#[tokio::test]
async fn subscription_follows_writes_and_clear() {
    let (engine, _db) = engine_with_db().await;
    engine.write_trip("alice", new_trip(10.0, "Goa")).await.unwrap();

    let mut sub = engine.subscribe("alice").unwrap();
    let initial = sub.next().await.unwrap().unwrap();
    assert_eq!(initial.len(), 1);

    let newest = engine.write_trip("alice", new_trip(20.0, "Delhi")).await.unwrap();
    let snapshot = sub.next().await.unwrap().unwrap();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].id, newest.id);
    assert!(snapshot[0].created_at > snapshot[1].created_at);

    engine.clear_trips("alice").await.unwrap();
    let cleared = sub.next().await.unwrap().unwrap();
    assert!(cleared.is_empty());

    sub.cancel();
}

#[tokio::test]
async fn other_owner_changes_do_not_wake_subscription() {
    let (engine, _db) = engine_with_db().await;

    let mut sub = engine.subscribe("alice").unwrap();
    assert!(sub.next().await.unwrap().unwrap().is_empty());

    engine.write_trip("bob", new_trip(10.0, "Goa")).await.unwrap();
    engine.clear_trips("bob").await.unwrap();

    let waited = tokio::time::timeout(Duration::from_millis(100), sub.next()).await;
    assert!(waited.is_err());
}

#[tokio::test]
async fn queued_changes_are_coalesced() {
    let (engine, _db) = engine_with_db().await;

    let mut sub = engine.subscribe("alice").unwrap();
    sub.next().await.unwrap().unwrap();

    engine.write_trip("alice", new_trip(10.0, "Goa")).await.unwrap();
    engine.write_trip("alice", new_trip(20.0, "Goa")).await.unwrap();

    let snapshot = sub.next().await.unwrap().unwrap();
    assert_eq!(snapshot.len(), 2);

    let waited = tokio::time::timeout(Duration::from_millis(100), sub.next()).await;
    assert!(waited.is_err());
}

#[tokio::test]
async fn subscription_ends_when_engine_is_dropped() {
    let (engine, _db) = engine_with_db().await;

    let mut sub = engine.subscribe("alice").unwrap();
    sub.next().await.unwrap().unwrap();
    drop(engine);

    assert!(sub.next().await.is_none());
}

#[tokio::test]
async fn in_flight_submission_writes_once() {
    let (engine, _db) = engine_with_db().await;
    let mut form = FormOrchestrator::new(*engine.prices());
    form.set_distance(Mode::Trip, Some(350.0));
    form.set_efficiency(Mode::Trip, Some(18.0));
    form.set_region(Mode::Trip, "Kerala");
    form.set_fuel_price(Mode::Trip, Some(100.0));

    let submission = form.begin_submit().unwrap();
    assert_eq!(form.begin_submit().unwrap_err(), FormError::Busy);

    let report = submission.save(Some(&engine), Some("alice")).await;
    form.finish_submit();

    let saved = report.trip.unwrap();
    assert_eq!(report.estimate.cost().to_string(), "1944.44");
    assert_eq!(saved.fuel_price, 100.0);
    assert_eq!(engine.list_trips("alice").await.unwrap().len(), 1);
    assert!(!form.is_submitting());
}

#[tokio::test]
async fn daily_submission_saves_and_seeds_monthly() {
    let (engine, _db) = engine_with_db().await;
    let mut form = FormOrchestrator::new(*engine.prices());
    form.set_mode(Mode::Daily);
    form.set_distance(Mode::Daily, Some(50.0));
    form.set_efficiency(Mode::Daily, Some(18.0));
    form.set_region(Mode::Daily, "Goa");
    form.set_fuel_price(Mode::Daily, Some(100.0));

    let report = form.submit(Some(&engine), Some("alice")).await.unwrap();
    assert_eq!(report.estimate.cost().to_string(), "277.78");
    assert!(report.trip.is_some());
    assert_eq!(form.monthly_draft().daily_cost, Some(277.78));

    form.set_mode(Mode::Monthly);
    form.set_daily_cost(Some(150.0));
    form.set_commute_days(Some(22));
    let report = form.submit(Some(&engine), Some("alice")).await.unwrap();
    assert_eq!(report.estimate.cost().to_string(), "3300.00");
    assert!(report.trip.is_none());

    assert_eq!(engine.list_trips("alice").await.unwrap().len(), 1);
}
