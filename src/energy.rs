//! Horse energy regeneration.
//!
//! Energy is derived from elapsed wall-clock time, never from how often the
//! update runs. Every horse below its cap earns `regen_per_tick` per whole tick
//! since its anchor, and the anchor advances by exactly the ticks credited so
//! the leftover partial tick carries over to the next run.

use crate::error::HorserError;
use crate::time::unix_now;
use log::{debug, error, info};
use sqlx::{SqliteExecutor, SqlitePool};
use std::time::Duration as StdDuration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegenPolicy {
    pub tick_seconds: i64,
    pub regen_per_tick: i64,
}

impl Default for RegenPolicy {
    fn default() -> Self {
        Self {
            tick_seconds: 300,
            regen_per_tick: 1,
        }
    }
}

impl RegenPolicy {
    /// Seconds until a horse anchored at `anchor` earns its next point.
    pub fn next_tick_in(&self, anchor: i64, now: i64) -> i64 {
        if now < anchor {
            return anchor - now + self.tick_seconds;
        }
        self.tick_seconds - (now - anchor).rem_euclid(self.tick_seconds)
    }
}

// $1 = now, $2 = tick seconds, $3 = energy per tick.
// SQLite evaluates every SET expression against the old row, so both columns
// see the same elapsed tick count. The `>= $2` guard skips rows with no whole
// tick to credit, including anchors ahead of `now`.
const REGEN_SQL: &str = "UPDATE horses
SET energy = MIN(max_energy, energy + (($1 - last_regen_ts) / $2) * $3),
    last_regen_ts = last_regen_ts + (($1 - last_regen_ts) / $2) * $2
WHERE energy < max_energy
  AND $1 - last_regen_ts >= $2";

enum Scope<'a> {
    All,
    Owner { guild_id: &'a str, user_id: &'a str },
    Horse(i64),
}

async fn regenerate<'e>(
    executor: impl SqliteExecutor<'e>,
    policy: &RegenPolicy,
    scope: Scope<'_>,
    now: i64,
) -> Result<u64, sqlx::Error> {
    let sql = match scope {
        Scope::All => REGEN_SQL.to_string(),
        Scope::Owner { .. } => format!("{REGEN_SQL} AND guild_id = $4 AND user_id = $5"),
        Scope::Horse(_) => format!("{REGEN_SQL} AND horse_id = $4"),
    };

    let query = sqlx::query(&sql)
        .bind(now)
        .bind(policy.tick_seconds)
        .bind(policy.regen_per_tick);
    let query = match scope {
        Scope::All => query,
        Scope::Owner { guild_id, user_id } => query.bind(guild_id).bind(user_id),
        Scope::Horse(horse_id) => query.bind(horse_id),
    };

    Ok(query.execute(executor).await?.rows_affected())
}

/// Credits every horse below its cap with the whole ticks elapsed up to `now`.
///
/// One `UPDATE` statement, so a failure leaves no horse half-updated.
/// Returns how many horses gained energy.
pub async fn apply_regeneration(
    db: &SqlitePool,
    policy: &RegenPolicy,
    now: i64,
) -> Result<u64, sqlx::Error> {
    regenerate(db, policy, Scope::All, now).await
}

/// Same as [`apply_regeneration`], restricted to one owner's stable.
pub async fn catch_up_owner(
    db: &SqlitePool,
    policy: &RegenPolicy,
    guild_id: &str,
    user_id: &str,
    now: i64,
) -> Result<u64, sqlx::Error> {
    regenerate(db, policy, Scope::Owner { guild_id, user_id }, now).await
}

pub async fn catch_up_horse<'e>(
    executor: impl SqliteExecutor<'e>,
    policy: &RegenPolicy,
    horse_id: i64,
    now: i64,
) -> Result<u64, sqlx::Error> {
    regenerate(executor, policy, Scope::Horse(horse_id), now).await
}

/// Current `(energy, max_energy)` of a horse, caught up to `now`.
pub async fn horse_energy(
    db: &SqlitePool,
    policy: &RegenPolicy,
    horse_id: i64,
    now: i64,
) -> Result<(i64, i64), HorserError> {
    catch_up_horse(db, policy, horse_id, now).await?;
    sqlx::query_as::<_, (i64, i64)>("SELECT energy, max_energy FROM horses WHERE horse_id = ?")
        .bind(horse_id)
        .fetch_optional(db)
        .await?
        .ok_or(HorserError::HorseNotFound(horse_id))
}

/// Takes `amount` energy from a horse and returns what is left.
///
/// A horse leaving the cap restarts its anchor at `now`: capped horses are
/// never touched by regeneration, so their anchor is stale by the time they
/// spend.
// Racing and training are the callers; neither is playable yet.
#[allow(dead_code)]
pub async fn spend_energy(
    db: &SqlitePool,
    policy: &RegenPolicy,
    horse_id: i64,
    amount: i64,
    now: i64,
) -> Result<i64, HorserError> {
    if amount <= 0 {
        return Err(HorserError::InvalidAmount(amount));
    }

    let mut tx = db.begin().await?;

    catch_up_horse(&mut *tx, policy, horse_id, now).await?;

    let remaining = sqlx::query_scalar::<_, i64>(
        "UPDATE horses
         SET energy = energy - $1,
             last_regen_ts = CASE WHEN energy >= max_energy THEN $2 ELSE last_regen_ts END
         WHERE horse_id = $3 AND energy >= $1
         RETURNING energy",
    )
    .bind(amount)
    .bind(now)
    .bind(horse_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(remaining) = remaining else {
        let available = sqlx::query_scalar::<_, i64>("SELECT energy FROM horses WHERE horse_id = ?")
            .bind(horse_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(HorserError::HorseNotFound(horse_id))?;
        return Err(HorserError::NotEnoughEnergy {
            available,
            required: amount,
        });
    };

    tx.commit().await?;
    Ok(remaining)
}

/// One scheduled pass. Storage errors are logged and the pass is skipped;
/// the next pass catches up whatever this one missed.
pub async fn run_cycle(db: &SqlitePool, policy: &RegenPolicy, now: i64) -> Option<u64> {
    match apply_regeneration(db, policy, now).await {
        Ok(0) => {
            debug!("Energy catch-up: nothing to regenerate");
            Some(0)
        }
        Ok(updated) => {
            info!("Energy catch-up: regenerated {} horse(s)", updated);
            Some(updated)
        }
        Err(why) => {
            error!("Energy catch-up failed, retrying next cycle: {:?}", why);
            None
        }
    }
}

/// Runs [`run_cycle`] every `every`, starting immediately so downtime is
/// caught up at startup.
pub fn spawn_regenerator(db: SqlitePool, policy: RegenPolicy, every: StdDuration) -> JoinHandle<()> {
    info!(
        "Starting energy regenerator: +{} every {}s, checking every {}s",
        policy.regen_per_tick,
        policy.tick_seconds,
        every.as_secs()
    );
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            run_cycle(&db, &policy, unix_now()).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::horse::tests::test_pool;

    const POLICY: RegenPolicy = RegenPolicy {
        tick_seconds: 300,
        regen_per_tick: 1,
    };

    async fn insert_horse(
        db: &SqlitePool,
        user_id: &str,
        energy: i64,
        max_energy: i64,
        anchor: i64,
    ) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO horses (guild_id, user_id, horse_name, horse_color, energy, max_energy, last_regen_ts)
             VALUES ('1', ?, 'Test', 'aqua', ?, ?, ?)
             RETURNING horse_id",
        )
        .bind(user_id)
        .bind(energy)
        .bind(max_energy)
        .bind(anchor)
        .fetch_one(db)
        .await
        .unwrap()
    }

    async fn state(db: &SqlitePool, horse_id: i64) -> (i64, i64) {
        sqlx::query_as("SELECT energy, last_regen_ts FROM horses WHERE horse_id = ?")
            .bind(horse_id)
            .fetch_one(db)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn partial_ticks_earn_nothing() {
        let db = test_pool().await;
        let id = insert_horse(&db, "1", 3, 10, 0).await;

        assert_eq!(apply_regeneration(&db, &POLICY, 299).await.unwrap(), 0);
        assert_eq!(state(&db, id).await, (3, 0));
    }

    #[tokio::test]
    async fn whole_ticks_credit_and_advance_anchor() {
        let db = test_pool().await;
        let id = insert_horse(&db, "1", 2, 10, 100).await;

        assert_eq!(apply_regeneration(&db, &POLICY, 100 + 4 * 300).await.unwrap(), 1);
        assert_eq!(state(&db, id).await, (6, 1_300));
    }

    #[tokio::test]
    async fn leftover_time_is_kept_for_the_next_run() {
        let db = test_pool().await;
        let id = insert_horse(&db, "1", 3, 10, 0).await;

        apply_regeneration(&db, &POLICY, 1_000).await.unwrap();
        assert_eq!(state(&db, id).await, (6, 900));

        // 100s since the new anchor, not enough for another tick.
        apply_regeneration(&db, &POLICY, 1_000).await.unwrap();
        assert_eq!(state(&db, id).await, (6, 900));

        apply_regeneration(&db, &POLICY, 1_200).await.unwrap();
        assert_eq!(state(&db, id).await, (7, 1_200));
    }

    #[tokio::test]
    async fn energy_is_capped_at_max() {
        let db = test_pool().await;
        let id = insert_horse(&db, "1", 9, 10, 0).await;

        apply_regeneration(&db, &POLICY, 5 * 300).await.unwrap();
        assert_eq!(state(&db, id).await, (10, 1_500));
    }

    #[tokio::test]
    async fn capped_horses_are_never_touched() {
        let db = test_pool().await;
        let id = insert_horse(&db, "1", 10, 10, 0).await;

        assert_eq!(apply_regeneration(&db, &POLICY, 1_000_000).await.unwrap(), 0);
        assert_eq!(state(&db, id).await, (10, 0));
    }

    #[tokio::test]
    async fn repeated_runs_with_same_now_are_idempotent() {
        let db = test_pool().await;
        let a = insert_horse(&db, "1", 0, 10, 0).await;
        let b = insert_horse(&db, "1", 4, 5, 50).await;

        apply_regeneration(&db, &POLICY, 2_000).await.unwrap();
        let once = (state(&db, a).await, state(&db, b).await);
        assert_eq!(apply_regeneration(&db, &POLICY, 2_000).await.unwrap(), 0);
        let twice = (state(&db, a).await, state(&db, b).await);

        assert_eq!(once, twice);
        assert_eq!(once, ((6, 1_800), (5, 1_850)));
    }

    #[tokio::test]
    async fn one_late_run_matches_a_run_every_tick() {
        let db = test_pool().await;
        let late = insert_horse(&db, "1", 1, 10, 42).await;
        let steady = insert_horse(&db, "2", 1, 10, 42).await;
        let end = 42 + 6 * 300 + 123;

        for step in 1..=6 {
            catch_up_owner(&db, &POLICY, "1", "2", 42 + step * 300).await.unwrap();
        }
        catch_up_owner(&db, &POLICY, "1", "2", end).await.unwrap();
        catch_up_owner(&db, &POLICY, "1", "1", end).await.unwrap();

        assert_eq!(state(&db, late).await, state(&db, steady).await);
        assert_eq!(state(&db, late).await, (7, 42 + 6 * 300));
    }

    #[tokio::test]
    async fn capped_downtime_converges_once_energy_is_spent() {
        let db = test_pool().await;
        let late = insert_horse(&db, "1", 8, 10, 0).await;
        let steady = insert_horse(&db, "2", 8, 10, 0).await;

        for step in 1..=10 {
            catch_up_owner(&db, &POLICY, "1", "2", step * 300).await.unwrap();
        }
        catch_up_owner(&db, &POLICY, "1", "1", 3_000).await.unwrap();
        assert_eq!(state(&db, late).await.0, 10);
        assert_eq!(state(&db, steady).await.0, 10);

        // Leaving the cap re-anchors both horses at the same moment.
        spend_energy(&db, &POLICY, late, 3, 3_010).await.unwrap();
        spend_energy(&db, &POLICY, steady, 3, 3_010).await.unwrap();
        apply_regeneration(&db, &POLICY, 3_010 + 2 * 300).await.unwrap();

        assert_eq!(state(&db, late).await, state(&db, steady).await);
        assert_eq!(state(&db, late).await, (9, 3_610));
    }

    #[tokio::test]
    async fn anchors_in_the_future_are_left_alone() {
        let db = test_pool().await;
        let id = insert_horse(&db, "1", 2, 10, 10_000).await;

        assert_eq!(apply_regeneration(&db, &POLICY, 1_000).await.unwrap(), 0);
        assert_eq!(state(&db, id).await, (2, 10_000));
    }

    #[tokio::test]
    async fn regen_per_tick_scales_the_credit() {
        let db = test_pool().await;
        let id = insert_horse(&db, "1", 1, 10, 0).await;
        let policy = RegenPolicy {
            tick_seconds: 60,
            regen_per_tick: 2,
        };

        apply_regeneration(&db, &policy, 150).await.unwrap();
        assert_eq!(state(&db, id).await, (5, 120));
    }

    #[tokio::test]
    async fn owner_catch_up_only_touches_that_stable() {
        let db = test_pool().await;
        let mine = insert_horse(&db, "1", 0, 10, 0).await;
        let theirs = insert_horse(&db, "2", 0, 10, 0).await;

        assert_eq!(catch_up_owner(&db, &POLICY, "1", "1", 900).await.unwrap(), 1);
        assert_eq!(state(&db, mine).await, (3, 900));
        assert_eq!(state(&db, theirs).await, (0, 0));
    }

    #[tokio::test]
    async fn reading_energy_catches_the_horse_up() {
        let db = test_pool().await;
        let id = insert_horse(&db, "1", 3, 10, 0).await;

        assert_eq!(horse_energy(&db, &POLICY, id, 1_000).await.unwrap(), (6, 10));
        assert!(matches!(
            horse_energy(&db, &POLICY, id + 1, 1_000).await,
            Err(HorserError::HorseNotFound(_))
        ));
    }

    #[tokio::test]
    async fn spending_from_full_restarts_the_anchor() {
        let db = test_pool().await;
        let id = insert_horse(&db, "1", 10, 10, 0).await;

        assert_eq!(spend_energy(&db, &POLICY, id, 4, 50_000).await.unwrap(), 6);
        assert_eq!(state(&db, id).await, (6, 50_000));

        // No instant refill from the time spent at the cap.
        apply_regeneration(&db, &POLICY, 50_299).await.unwrap();
        assert_eq!(state(&db, id).await, (6, 50_000));
    }

    #[tokio::test]
    async fn spending_below_cap_keeps_the_anchor() {
        let db = test_pool().await;
        let id = insert_horse(&db, "1", 2, 10, 0).await;

        // Caught up to 5 energy at anchor 900 first.
        assert_eq!(spend_energy(&db, &POLICY, id, 4, 1_000).await.unwrap(), 1);
        assert_eq!(state(&db, id).await, (1, 900));
    }

    #[tokio::test]
    async fn overspending_changes_nothing() {
        let db = test_pool().await;
        let id = insert_horse(&db, "1", 2, 10, 0).await;

        let err = spend_energy(&db, &POLICY, id, 5, 100).await.unwrap_err();
        assert!(matches!(
            err,
            HorserError::NotEnoughEnergy { available: 2, required: 5 }
        ));
        assert_eq!(state(&db, id).await, (2, 0));

        assert!(matches!(
            spend_energy(&db, &POLICY, 999, 1, 100).await,
            Err(HorserError::HorseNotFound(999))
        ));
    }

    #[tokio::test]
    async fn non_positive_spends_are_rejected() {
        let db = test_pool().await;
        let partial = insert_horse(&db, "1", 5, 10, 0).await;
        let full = insert_horse(&db, "1", 10, 10, 0).await;

        assert!(matches!(
            spend_energy(&db, &POLICY, partial, -3, 100).await,
            Err(HorserError::InvalidAmount(-3))
        ));
        assert!(matches!(
            spend_energy(&db, &POLICY, full, 0, 50_000).await,
            Err(HorserError::InvalidAmount(0))
        ));

        assert_eq!(state(&db, partial).await, (5, 0));
        assert_eq!(state(&db, full).await, (10, 0));
    }

    #[tokio::test]
    async fn failed_cycle_is_skipped_not_fatal() {
        let db = test_pool().await;
        insert_horse(&db, "1", 0, 10, 0).await;

        assert_eq!(run_cycle(&db, &POLICY, 600).await, Some(1));
        db.close().await;
        assert_eq!(run_cycle(&db, &POLICY, 1_200).await, None);
    }

    #[test]
    fn next_tick_countdown() {
        assert_eq!(POLICY.next_tick_in(0, 0), 300);
        assert_eq!(POLICY.next_tick_in(0, 1_000), 200);
        assert_eq!(POLICY.next_tick_in(100, 50), 350);
    }
}
