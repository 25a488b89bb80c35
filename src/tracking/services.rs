use sqlx::{PgPool, Postgres, Transaction};
use time::Date;
use tracing::debug;
use uuid::Uuid;

use crate::foods::repo::FoodItem;
use crate::nutrition::{recalculate_totals, scale_nutrition, EntryNutrition};

use super::repo::{DailyLog, FoodLogEntry};

/// Result of an entry mutation: the entry itself plus the log with its
/// freshly recomputed totals.
pub struct EntryChange {
    pub entry: FoodLogEntry,
    pub log: DailyLog,
}

/// Insert an entry snapshot and recompute the owning log's totals.
///
/// The log row stays locked for the whole transaction, so concurrent
/// mutations of the same day serialize instead of overwriting each other
/// with totals computed from a stale entry set.
pub async fn add_entry(
    db: &PgPool,
    user_id: Uuid,
    date: Date,
    food: &FoodItem,
    serving_size: f64,
    serving_unit: &str,
    meal_type: &str,
) -> anyhow::Result<EntryChange> {
    let snapshot = scale_nutrition(&food.nutrition(), serving_size);

    let mut txn = db.begin().await?;
    let log = DailyLog::get_or_create_for_update(&mut txn, user_id, date).await?;
    let entry = FoodLogEntry::insert(
        &mut txn,
        log.id,
        food.id,
        serving_size,
        serving_unit,
        meal_type,
        &snapshot,
    )
    .await?;
    let log = recalculate_log(&mut txn, log.id).await?;
    txn.commit().await?;

    debug!(entry_id = %entry.id, daily_log_id = %log.id, "entry added, totals recomputed");
    Ok(EntryChange { entry, log })
}

/// Rewrite an entry's snapshot from the food's current per-serving values
/// and recompute the log's totals.
pub async fn update_entry(
    db: &PgPool,
    entry: &FoodLogEntry,
    food: &FoodItem,
    serving_size: f64,
    serving_unit: &str,
    meal_type: &str,
) -> anyhow::Result<EntryChange> {
    let snapshot = scale_nutrition(&food.nutrition(), serving_size);

    let mut txn = db.begin().await?;
    DailyLog::lock_for_update(&mut txn, entry.daily_log_id).await?;
    let updated = FoodLogEntry::update(
        &mut txn,
        entry.id,
        serving_size,
        serving_unit,
        meal_type,
        &snapshot,
    )
    .await?;
    let log = recalculate_log(&mut txn, entry.daily_log_id).await?;
    txn.commit().await?;

    debug!(entry_id = %updated.id, daily_log_id = %log.id, "entry updated, totals recomputed");
    Ok(EntryChange { entry: updated, log })
}

/// Delete an entry and recompute the log's totals.
pub async fn remove_entry(db: &PgPool, entry: &FoodLogEntry) -> anyhow::Result<DailyLog> {
    let mut txn = db.begin().await?;
    DailyLog::lock_for_update(&mut txn, entry.daily_log_id).await?;
    FoodLogEntry::delete(&mut txn, entry.id).await?;
    let log = recalculate_log(&mut txn, entry.daily_log_id).await?;
    txn.commit().await?;

    debug!(entry_id = %entry.id, daily_log_id = %log.id, "entry removed, totals recomputed");
    Ok(log)
}

/// Full resum of a log from its current entries. Always recomputes from
/// scratch; never an incremental delta.
async fn recalculate_log(
    txn: &mut Transaction<'_, Postgres>,
    daily_log_id: Uuid,
) -> anyhow::Result<DailyLog> {
    let entries = FoodLogEntry::list_for_log(txn, daily_log_id).await?;
    let snapshots: Vec<EntryNutrition> = entries.iter().map(FoodLogEntry::nutrition).collect();
    let totals = recalculate_totals(&snapshots);
    DailyLog::update_totals(txn, daily_log_id, &totals).await
}

/// Consecutive days with a log, counting back from `today`.
/// `logged_dates` must be sorted newest first.
pub fn streak_from_dates(today: Date, logged_dates: &[Date]) -> u32 {
    let mut streak = 0;
    let mut expected = today;

    for date in logged_dates {
        if *date > expected {
            continue;
        }
        if *date != expected {
            break;
        }
        streak += 1;
        match expected.previous_day() {
            Some(day) => expected = day,
            None => break,
        }
    }

    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn streak_counts_consecutive_days_back_from_today() {
        let dates = [date!(2024 - 03 - 10), date!(2024 - 03 - 09), date!(2024 - 03 - 08)];
        assert_eq!(streak_from_dates(date!(2024 - 03 - 10), &dates), 3);
    }

    #[test]
    fn streak_stops_at_the_first_gap() {
        let dates = [date!(2024 - 03 - 10), date!(2024 - 03 - 08)];
        assert_eq!(streak_from_dates(date!(2024 - 03 - 10), &dates), 1);
    }

    #[test]
    fn streak_is_zero_without_a_log_today() {
        let dates = [date!(2024 - 03 - 08), date!(2024 - 03 - 07)];
        assert_eq!(streak_from_dates(date!(2024 - 03 - 10), &dates), 0);
    }

    #[test]
    fn streak_is_zero_for_no_logs() {
        assert_eq!(streak_from_dates(date!(2024 - 03 - 10), &[]), 0);
    }

    #[test]
    fn future_dates_are_ignored() {
        let dates = [date!(2024 - 03 - 12), date!(2024 - 03 - 10), date!(2024 - 03 - 09)];
        assert_eq!(streak_from_dates(date!(2024 - 03 - 10), &dates), 2);
    }
}
