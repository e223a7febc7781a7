//! Sanction (borrowing suspension) model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Sanction record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Sanction {
    pub id: i32,
    pub user_id: i32,
    pub reason: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Sanction to insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSanction {
    pub user_id: i32,
    pub reason: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Days of sanction for a return at `returned_at` of a loan due at `due_at`.
///
/// `None` when returned on or before the due instant; otherwise days late
/// rounded up (any lateness counts as one day), never less than `min_days`.
pub fn sanction_days(due_at: DateTime<Utc>, returned_at: DateTime<Utc>, min_days: i64) -> Option<i64> {
    if returned_at <= due_at {
        return None;
    }
    const DAY_MS: i64 = 86_400_000;
    let millis_late = (returned_at - due_at).num_milliseconds();
    let days = ((millis_late + DAY_MS - 1) / DAY_MS).max(1);
    Some(days.max(min_days))
}

impl NewSanction {
    /// Sanction for a late return, if any
    pub fn for_late_return(
        user_id: i32,
        loan_id: i32,
        due_at: DateTime<Utc>,
        returned_at: DateTime<Utc>,
        min_days: i64,
    ) -> Option<Self> {
        let days = sanction_days(due_at, returned_at, min_days)?;
        Some(NewSanction {
            user_id,
            reason: format!("Late return of loan {} ({} day(s))", loan_id, days),
            starts_at: returned_at,
            ends_at: returned_at + Duration::days(days),
        })
    }
}

/// Sanction list query parameters
#[derive(Debug, Default, Deserialize)]
pub struct SanctionQuery {
    pub user_id: Option<i32>,
    pub active_only: Option<bool>,
}

/// Block status query parameters
#[derive(Debug, Deserialize)]
pub struct BlockStatusQuery {
    pub user_id: i32,
}

/// Whether a user is currently blocked
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BlockStatus {
    pub user_id: i32,
    pub blocked: bool,
    /// Latest end of the active sanctions
    pub until: Option<DateTime<Utc>>,
}

impl BlockStatus {
    pub fn from_latest_end(user_id: i32, latest_end: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match latest_end {
            Some(end) if now < end => BlockStatus { user_id, blocked: true, until: Some(end) },
            _ => BlockStatus { user_id, blocked: false, until: None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn due() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_no_sanction_on_time() {
        assert_eq!(sanction_days(due(), due(), 1), None);
        assert_eq!(sanction_days(due(), due() - Duration::hours(3), 1), None);
    }

    #[test]
    fn test_late_by_25_hours_is_two_days() {
        let returned = due() + Duration::hours(25);
        assert_eq!(sanction_days(due(), returned, 1), Some(2));

        let sanction = NewSanction::for_late_return(4, 99, due(), returned, 1).unwrap();
        assert_eq!(sanction.starts_at, returned);
        assert_eq!(sanction.ends_at, returned + Duration::days(2));
        assert_eq!(sanction.user_id, 4);
    }

    #[test]
    fn test_minimum_days_clamp() {
        let returned = due() + Duration::minutes(5);
        assert_eq!(sanction_days(due(), returned, 1), Some(1));
        assert_eq!(sanction_days(due(), returned, 3), Some(3));
        assert_eq!(sanction_days(due(), due() + Duration::hours(25), 3), Some(3));
        assert_eq!(sanction_days(due(), due() + Duration::days(5), 3), Some(5));
    }

    #[test]
    fn test_exact_day_boundary() {
        assert_eq!(sanction_days(due(), due() + Duration::hours(24), 1), Some(1));
        assert_eq!(sanction_days(due(), due() + Duration::seconds(86_401), 1), Some(2));
    }

    #[test]
    fn test_sub_second_lateness_is_one_day() {
        assert_eq!(sanction_days(due(), due() + Duration::milliseconds(500), 0), Some(1));
        assert_eq!(sanction_days(due(), due() + Duration::microseconds(20), 0), Some(1));
        assert_eq!(
            sanction_days(due(), due() + Duration::hours(24) + Duration::milliseconds(1), 0),
            Some(2)
        );

        let returned = due() + Duration::milliseconds(500);
        let sanction = NewSanction::for_late_return(4, 7, due(), returned, 0).unwrap();
        assert_eq!(sanction.ends_at, returned + Duration::days(1));
    }

    #[test]
    fn test_block_status() {
        let now = due();
        let future = BlockStatus::from_latest_end(1, Some(now + Duration::days(1)), now);
        assert!(future.blocked);
        assert_eq!(future.until, Some(now + Duration::days(1)));

        let expired = BlockStatus::from_latest_end(1, Some(now - Duration::seconds(1)), now);
        assert!(!expired.blocked);
        assert_eq!(expired.until, None);

        let none = BlockStatus::from_latest_end(1, None, now);
        assert!(!none.blocked);
    }
}
