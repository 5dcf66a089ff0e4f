//! Integration tests for the daily-plan store.

use chrono::{NaiveDate, NaiveTime};

use dayplan_db::models::{NewDailyPlan, NewScheduledTask, Priority};
use dayplan_db::queries::plans;
use dayplan_test_utils::{create_test_db, drop_test_db};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn entry(title: &str, start: (u32, u32), end: (u32, u32)) -> NewScheduledTask {
    NewScheduledTask {
        task_id: None,
        title: title.to_string(),
        description: String::new(),
        start_time: time(start.0, start.1),
        end_time: time(end.0, end.1),
        priority: Priority::Medium,
        duration_minutes: None,
    }
}

fn plan_for(d: NaiveDate, titles: &[&str]) -> NewDailyPlan {
    let schedule = titles
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let hour = 9 + i as u32;
            entry(t, (hour, 0), (hour, 45))
        })
        .collect();
    NewDailyPlan { date: d, schedule }
}

#[tokio::test]
async fn insert_and_get_by_date() {
    let (pool, db_name) = create_test_db().await;

    let d = date(2024, 3, 14);
    let stored = plans::insert_plan(&pool, &plan_for(d, &["Write report", "Team meeting"]))
        .await
        .expect("insert_plan should succeed")
        .expect("date was free");

    assert_eq!(stored.date, d);
    assert_eq!(stored.schedule.len(), 2);
    assert_eq!(stored.schedule[0].position, 0);
    assert_eq!(stored.schedule[1].position, 1);
    assert!(stored.schedule.iter().all(|e| e.plan_id == stored.id));

    let fetched = plans::get_plan_by_date(&pool, d)
        .await
        .unwrap()
        .expect("plan should exist");
    assert_eq!(fetched, stored);

    let by_id = plans::get_plan(&pool, stored.id).await.unwrap().unwrap();
    assert_eq!(by_id, stored);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn entry_order_is_preserved() {
    let (pool, db_name) = create_test_db().await;

    let d = date(2024, 3, 15);
    let mut plan = plan_for(d, &[]);
    plan.schedule = vec![
        entry("afternoon", (14, 0), (15, 0)),
        entry("morning", (9, 0), (10, 0)),
        entry("noon", (12, 0), (12, 30)),
    ];
    plans::insert_plan(&pool, &plan).await.unwrap().unwrap();

    let fetched = plans::get_plan_by_date(&pool, d).await.unwrap().unwrap();
    let titles: Vec<&str> = fetched.schedule.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["afternoon", "morning", "noon"]);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn insert_conflicts_on_existing_date() {
    let (pool, db_name) = create_test_db().await;

    let d = date(2024, 1, 2);
    plans::insert_plan(&pool, &plan_for(d, &["first"]))
        .await
        .unwrap()
        .unwrap();

    let second = plans::insert_plan(&pool, &plan_for(d, &["second", "third"]))
        .await
        .expect("conflict is not an error");
    assert!(second.is_none());

    let fetched = plans::get_plan_by_date(&pool, d).await.unwrap().unwrap();
    assert_eq!(fetched.schedule.len(), 1);
    assert_eq!(fetched.schedule[0].title, "first");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn upsert_replaces_schedule_and_keeps_identity() {
    let (pool, db_name) = create_test_db().await;

    let d = date(2024, 5, 1);
    let first = plans::upsert_plan(&pool, &plan_for(d, &["a", "b", "c"]))
        .await
        .unwrap();
    let second = plans::upsert_plan(&pool, &plan_for(d, &["x"])).await.unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at >= first.updated_at);
    assert_eq!(second.schedule.len(), 1);
    assert_eq!(second.schedule[0].title, "x");

    assert_eq!(plans::count_plans_for_date(&pool, d).await.unwrap(), 1);

    let fetched = plans::get_plan_by_date(&pool, d).await.unwrap().unwrap();
    assert_eq!(fetched.schedule.len(), 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn concurrent_upserts_leave_one_plan() {
    let (pool, db_name) = create_test_db().await;

    let d = date(2024, 6, 30);
    let mut handles = Vec::new();
    for i in 0..8 {
        let pool = pool.clone();
        let title = format!("run-{i}");
        handles.push(tokio::spawn(async move {
            plans::upsert_plan(&pool, &plan_for(d, &[title.as_str()])).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().expect("every upsert should succeed");
    }

    assert_eq!(plans::count_plans_for_date(&pool, d).await.unwrap(), 1);
    let fetched = plans::get_plan_by_date(&pool, d).await.unwrap().unwrap();
    assert_eq!(fetched.schedule.len(), 1, "schedules must not be merged");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn list_plans_loads_entries() {
    let (pool, db_name) = create_test_db().await;

    assert!(plans::list_plans(&pool).await.unwrap().is_empty());

    plans::upsert_plan(&pool, &plan_for(date(2024, 2, 2), &["late"]))
        .await
        .unwrap();
    plans::upsert_plan(&pool, &plan_for(date(2024, 2, 1), &["early", "earlier"]))
        .await
        .unwrap();
    plans::upsert_plan(&pool, &plan_for(date(2024, 2, 3), &[]))
        .await
        .unwrap();

    let all = plans::list_plans(&pool).await.unwrap();
    let dates: Vec<NaiveDate> = all.iter().map(|p| p.date).collect();
    assert_eq!(
        dates,
        vec![date(2024, 2, 1), date(2024, 2, 2), date(2024, 2, 3)]
    );
    assert_eq!(all[0].schedule.len(), 2);
    assert_eq!(all[1].schedule.len(), 1);
    assert!(all[2].schedule.is_empty());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn update_plan_replaces_date_and_entries() {
    let (pool, db_name) = create_test_db().await;

    let stored = plans::upsert_plan(&pool, &plan_for(date(2024, 7, 1), &["a", "b"]))
        .await
        .unwrap();

    let updated = plans::update_plan(&pool, stored.id, &plan_for(date(2024, 7, 2), &["c"]))
        .await
        .unwrap()
        .expect("plan should exist");

    assert_eq!(updated.id, stored.id);
    assert_eq!(updated.date, date(2024, 7, 2));
    assert_eq!(updated.schedule.len(), 1);
    assert!(
        plans::get_plan_by_date(&pool, date(2024, 7, 1))
            .await
            .unwrap()
            .is_none()
    );

    let missing = plans::update_plan(&pool, 9999, &plan_for(date(2024, 7, 3), &[]))
        .await
        .unwrap();
    assert!(missing.is_none());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn update_plan_onto_taken_date_fails() {
    let (pool, db_name) = create_test_db().await;

    plans::upsert_plan(&pool, &plan_for(date(2024, 8, 1), &["taken"]))
        .await
        .unwrap();
    let other = plans::upsert_plan(&pool, &plan_for(date(2024, 8, 2), &["other"]))
        .await
        .unwrap();

    let result = plans::update_plan(&pool, other.id, &plan_for(date(2024, 8, 1), &[])).await;
    assert!(result.is_err());

    // The failed update rolled back; the other plan is untouched.
    let fetched = plans::get_plan(&pool, other.id).await.unwrap().unwrap();
    assert_eq!(fetched.date, date(2024, 8, 2));
    assert_eq!(fetched.schedule.len(), 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn delete_plan_cascades_and_is_idempotent() {
    let (pool, db_name) = create_test_db().await;

    let stored = plans::upsert_plan(&pool, &plan_for(date(2024, 9, 9), &["a", "b"]))
        .await
        .unwrap();

    assert!(plans::delete_plan(&pool, stored.id).await.unwrap());
    assert!(plans::get_plan(&pool, stored.id).await.unwrap().is_none());
    assert!(!plans::delete_plan(&pool, stored.id).await.unwrap());

    let orphans: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM scheduled_tasks")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orphans.0, 0);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn missing_date_returns_none() {
    let (pool, db_name) = create_test_db().await;

    let result = plans::get_plan_by_date(&pool, date(1999, 12, 31))
        .await
        .unwrap();
    assert!(result.is_none());

    pool.close().await;
    drop_test_db(&db_name).await;
}
