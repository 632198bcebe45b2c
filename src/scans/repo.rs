use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::detect::DetectedItem;

/// Display name a scan carries until the user renames it.
pub const DEFAULT_FOOD_NAME: &str = "Unnamed food";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DayLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub log_date: Date,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Scan {
    pub id: Uuid,
    pub day_log_id: Uuid,
    pub food_name: String,
    pub calories: f64,
    pub time_eaten: OffsetDateTime,
    pub image_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScanItem {
    pub id: Uuid,
    pub scan_id: Uuid,
    pub food_name: Option<String>,
    pub confidence: f64,
    pub box_x1: f64,
    pub box_y1: f64,
    pub box_x2: f64,
    pub box_y2: f64,
}

/// One day log row per (user, date). The unique constraint is the
/// serialization point: concurrent calls for the same pair converge on a
/// single row via the upsert, and a row created here rolls back with the
/// rest of the transaction if the scan write fails.
pub async fn find_or_create_day_log(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    date: Date,
) -> sqlx::Result<DayLog> {
    sqlx::query_as::<_, DayLog>(
        r#"
        INSERT INTO day_logs (user_id, log_date)
        VALUES ($1, $2)
        ON CONFLICT (user_id, log_date) DO UPDATE SET user_id = EXCLUDED.user_id
        RETURNING id, user_id, log_date
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_one(&mut **tx)
    .await
}

pub async fn insert_scan_tx(
    tx: &mut Transaction<'_, Postgres>,
    day_log_id: Uuid,
    calories: f64,
    image_id: Uuid,
) -> sqlx::Result<Scan> {
    sqlx::query_as::<_, Scan>(
        r#"
        INSERT INTO scans (day_log_id, food_name, calories, image_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, day_log_id, food_name, calories, time_eaten, image_id
        "#,
    )
    .bind(day_log_id)
    .bind(DEFAULT_FOOD_NAME)
    .bind(calories)
    .bind(image_id)
    .fetch_one(&mut **tx)
    .await
}

pub async fn insert_scan_item_tx(
    tx: &mut Transaction<'_, Postgres>,
    scan_id: Uuid,
    item: &DetectedItem,
) -> sqlx::Result<ScanItem> {
    sqlx::query_as::<_, ScanItem>(
        r#"
        INSERT INTO scan_items (scan_id, food_name, confidence, box_x1, box_y1, box_x2, box_y2)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, scan_id, food_name, confidence, box_x1, box_y1, box_x2, box_y2
        "#,
    )
    .bind(scan_id)
    .bind(item.label.as_deref())
    .bind(item.confidence)
    .bind(item.bounds.x1)
    .bind(item.bounds.y1)
    .bind(item.bounds.x2)
    .bind(item.bounds.y2)
    .fetch_one(&mut **tx)
    .await
}

/// Existence is the only check here; ownership is the route layer's concern.
pub async fn rename_scan(
    db: &PgPool,
    scan_id: Uuid,
    food_name: &str,
) -> sqlx::Result<Option<Scan>> {
    sqlx::query_as::<_, Scan>(
        r#"
        UPDATE scans
        SET food_name = $2
        WHERE id = $1
        RETURNING id, day_log_id, food_name, calories, time_eaten, image_id
        "#,
    )
    .bind(scan_id)
    .bind(food_name)
    .fetch_optional(db)
    .await
}

/// One row of the calorie log: a day that has a log, with the summed
/// calories of its scans (zero when the log has no scans).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DayCalories {
    pub log_date: Date,
    pub total_calories: f64,
}

/// Per-day calorie totals over an inclusive date window, oldest first.
/// Days without a day log do not appear.
pub async fn calorie_log(
    db: &PgPool,
    user_id: Uuid,
    start: Date,
    end: Date,
) -> sqlx::Result<Vec<DayCalories>> {
    sqlx::query_as::<_, DayCalories>(
        r#"
        SELECT d.log_date, COALESCE(SUM(s.calories), 0) AS total_calories
        FROM day_logs d
        LEFT JOIN scans s ON s.day_log_id = d.id
        WHERE d.user_id = $1 AND d.log_date >= $2 AND d.log_date <= $3
        GROUP BY d.log_date
        ORDER BY d.log_date ASC
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await
}

pub async fn list_scans_for_date(
    db: &PgPool,
    user_id: Uuid,
    date: Date,
) -> sqlx::Result<Vec<(Scan, Vec<ScanItem>)>> {
    let scans = sqlx::query_as::<_, Scan>(
        r#"
        SELECT s.id, s.day_log_id, s.food_name, s.calories, s.time_eaten, s.image_id
        FROM scans s
        JOIN day_logs d ON d.id = s.day_log_id
        WHERE d.user_id = $1 AND d.log_date = $2
        ORDER BY s.time_eaten ASC
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_all(db)
    .await?;

    let mut out = Vec::with_capacity(scans.len());
    for scan in scans {
        let items = sqlx::query_as::<_, ScanItem>(
            r#"
            SELECT id, scan_id, food_name, confidence, box_x1, box_y1, box_x2, box_y2
            FROM scan_items
            WHERE scan_id = $1
            ORDER BY confidence DESC
            "#,
        )
        .bind(scan.id)
        .fetch_all(db)
        .await?;
        out.push((scan, items));
    }
    Ok(out)
}
