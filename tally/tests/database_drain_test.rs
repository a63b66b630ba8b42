use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use ripple_model::entities::{aggregate_stats, geo_post_stats, geo_stats, post_stats, posts};
use ripple_tally::codec::ActivityKey;
use ripple_tally::recorder::GeoContext;
use ripple_tally::records::{ActivityCounts, AggregateStat, StatRecord};
use ripple_tally::scheduler::TickOutcome;
use ripple_tally::services::DatabaseService;
use ripple_tally::sink::StatSink;
use ripple_tally::store::MemoryCounterStore;
use ripple_tally::types::{ActivityAction, ActivityFamily, GeoAction};
use ripple_tally::{Config, Pipeline};
use sea_orm::EntityTrait;

async fn database() -> Arc<DatabaseService> {
    // A single connection keeps the in-memory database alive across queries
    let database = DatabaseService::new_with_options("sqlite::memory:", 1, 1)
        .await
        .unwrap();
    database.migrate().await.unwrap();
    Arc::new(database)
}

fn pipeline(database: &Arc<DatabaseService>) -> Pipeline {
    Pipeline::new(
        Arc::new(Config::default()),
        Arc::new(MemoryCounterStore::new()),
        database.clone(),
    )
}

fn tick_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 18, 30, 45).unwrap()
}

fn lisbon() -> GeoContext {
    GeoContext {
        client: "CID1".to_string(),
        ip: Some("2001:db8::1".to_string()),
        country: Some("Portugal".to_string()),
        country_code: Some("PT".to_string()),
        city: Some("Lisbon".to_string()),
        latitude: Some(38.7223),
        ..Default::default()
    }
}

async fn drain(pipeline: &Pipeline, now: DateTime<Utc>) {
    match pipeline.drain_now(now).await {
        TickOutcome::Completed(report) => assert!(report.total.is_clean(), "{report:?}"),
        TickOutcome::Skipped => panic!("drain unexpectedly skipped"),
    }
}

#[tokio::test]
async fn test_health_and_migration_status() {
    let database = database().await;

    assert!(database.health_check().await.unwrap());
    assert_eq!(database.pending_migrations().await.unwrap(), 0);
}

#[tokio::test]
async fn test_activity_drains_into_aggregate_and_post_tables() {
    let database = database().await;
    let pipeline = pipeline(&database);
    let likes = ActivityKey::new(ActivityFamily::Likes, "CID1").unwrap();
    let shares = ActivityKey::new(ActivityFamily::Shares, "CID1").unwrap();

    for _ in 0..5 {
        pipeline
            .recorder()
            .record_activity_hit(&likes, ActivityAction::Added, None, None)
            .await
            .unwrap();
    }
    for _ in 0..2 {
        pipeline
            .recorder()
            .record_activity_hit(&likes, ActivityAction::Removed, None, None)
            .await
            .unwrap();
    }
    pipeline
        .recorder()
        .record_activity_hit(&shares, ActivityAction::Added, Some("POST1"), None)
        .await
        .unwrap();

    drain(&pipeline, tick_at()).await;

    let rows = aggregate_stats::Model::find_for_client(&database.connection, "CID1")
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].likes_added, 5);
    assert_eq!(rows[0].likes_removed, 2);
    assert_eq!(
        rows[0].timestamp,
        Utc.with_ymd_and_hms(2025, 3, 1, 18, 30, 0).unwrap().naive_utc()
    );

    let rows = post_stats::Model::find_for_entity(&database.connection, "CID1", "POST1")
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].shares_added, 1);
}

#[tokio::test]
async fn test_geo_rows_accumulate_across_drains() {
    let database = database().await;
    let pipeline = pipeline(&database);

    for _ in 0..3 {
        pipeline
            .recorder()
            .record_geo_hit(&lisbon(), GeoAction::Like, Some("POST1"), None)
            .await
            .unwrap();
    }
    drain(&pipeline, tick_at()).await;

    for _ in 0..4 {
        pipeline
            .recorder()
            .record_geo_hit(&lisbon(), GeoAction::Like, Some("POST1"), None)
            .await
            .unwrap();
    }
    drain(&pipeline, tick_at()).await;

    let rows = geo_post_stats::Model::find_for_entity(&database.connection, "CID1", "POST1")
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].count, 7);
    assert_eq!(rows[0].action, "like");
    assert_eq!(rows[0].ip, "2001:db8::1");
    assert_eq!(rows[0].region, "unknown");
    assert_eq!(rows[0].latitude, Some(38.7223));
    assert_eq!(rows[0].longitude, None);

    let general = geo_stats::Model::find_for_client(&database.connection, "CID1")
        .await
        .unwrap();
    assert!(general.is_empty());
}

#[tokio::test]
async fn test_post_views_land_on_existing_post() {
    let database = database().await;
    let pipeline = pipeline(&database);
    database.ensure_post("CID1", "POST1").await.unwrap();

    for _ in 0..6 {
        pipeline
            .recorder()
            .record_post_view("CID1", "POST1")
            .await
            .unwrap();
    }
    pipeline
        .recorder()
        .record_post_view("CID1", "GONE")
        .await
        .unwrap();

    drain(&pipeline, tick_at()).await;

    let post = posts::Entity::find_by_id("POST1".to_string())
        .one(&database.connection)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(post.views_count, 6);
    assert!(pipeline.store().keys("post:views:*").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_persist_accumulates_same_identity() {
    let database = database().await;
    let record = StatRecord::Aggregate(AggregateStat {
        client: "CID1".to_string(),
        counts: ActivityCounts::from_field(ActivityFamily::Comments, ActivityAction::Added, 2),
        timestamp: tick_at(),
    });

    database.persist(&record).await.unwrap();
    database.persist(&record).await.unwrap();

    let rows = aggregate_stats::Model::find_for_client(&database.connection, "CID1")
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].comments_added, 4);
}
