//! Overdue loan notifications
//!
//! One sweep mails every borrower whose open loan went past due since the
//! previous sweep, then flags those loans overdue so they are not mailed
//! again. The sweep runs on demand and on a weekly schedule.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc, Weekday};
use serde::Serialize;
use tokio::task::JoinHandle;
use utoipa::ToSchema;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
    models::loan::OverdueLoan,
    repository::Repository,
};

use super::email::Mailer;

/// Counts from one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SweepReport {
    pub selected: usize,
    pub sent: usize,
    pub failed: usize,
    pub flagged: u64,
}

#[derive(Clone)]
pub struct NotificationsService {
    repository: Repository,
    mailer: Arc<dyn Mailer>,
    config: EmailConfig,
}

impl NotificationsService {
    pub fn new(repository: Repository, mailer: Arc<dyn Mailer>, config: EmailConfig) -> Self {
        Self { repository, mailer, config }
    }

    /// Manual sweep; `Conflict` if another sweep is running
    pub async fn notify_overdue(&self) -> AppResult<SweepReport> {
        self.sweep(Utc::now()).await?.ok_or_else(|| {
            AppError::Conflict("An overdue notification sweep is already running".to_string())
        })
    }

    /// Sweep from the weekly schedule; `None` if another sweep is running
    pub async fn run_scheduled_sweep(&self) -> AppResult<Option<SweepReport>> {
        self.sweep(Utc::now()).await
    }

    async fn sweep(&self, now: DateTime<Utc>) -> AppResult<Option<SweepReport>> {
        let Some(sweep) = self.repository.loans.begin_overdue_sweep(now).await? else {
            return Ok(None);
        };

        let selected = sweep.loans.len();
        let (sent, failed) = deliver_overdue_notices(self.mailer.as_ref(), &sweep.loans).await;

        let ids: Vec<i32> = sweep.loans.iter().map(|loan| loan.id).collect();
        let flagged = sweep.finish(&ids).await?;

        tracing::info!(
            "Overdue sweep: {} selected, {} sent, {} failed, {} flagged",
            selected,
            sent,
            failed,
            flagged
        );

        Ok(Some(SweepReport { selected, sent, failed, flagged }))
    }

    /// Send a fixed message to `to`, or to the configured test recipient
    pub async fn send_test(&self, to: Option<&str>) -> AppResult<String> {
        let recipient = to
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| self.config.test_recipient.clone())
            .ok_or_else(|| {
                AppError::Validation("No recipient given and no default configured".to_string())
            })?;

        self.mailer
            .send(
                &recipient,
                "Correo de prueba SisBib",
                "Este es un correo de prueba del sistema de biblioteca.\nSi lo recibiste, el envío de correos funciona.",
            )
            .await?;

        tracing::info!("Test email sent to {}", recipient);
        Ok(recipient)
    }
}

/// Subject and body of the notice for one overdue loan
pub fn overdue_notice(loan: &OverdueLoan) -> (String, String) {
    let subject = format!("Préstamo vencido: {}", loan.title);
    let body = format!(
        "Hola {name},\n\n\
         Tu préstamo #{id} del libro \"{title}\" venció el {due} (UTC).\n\
         Por favor devuélvelo en biblioteca lo antes posible para evitar sanciones.\n\n\
         Biblioteca",
        name = loan.first_name,
        id = loan.id,
        title = loan.title,
        due = loan.due_at.format("%d-%m-%Y %H:%M"),
    );
    (subject, body)
}

/// Mail each loan's borrower; a failed send is logged and skipped.
///
/// Returns `(sent, failed)`.
pub async fn deliver_overdue_notices(mailer: &dyn Mailer, loans: &[OverdueLoan]) -> (usize, usize) {
    let mut sent = 0;
    let mut failed = 0;

    for loan in loans {
        let (subject, body) = overdue_notice(loan);
        match mailer.send(&loan.email, &subject, &body).await {
            Ok(()) => sent += 1,
            Err(e) => {
                failed += 1;
                tracing::warn!(
                    "Could not send overdue notice for loan {} to {}: {}",
                    loan.id,
                    loan.email,
                    e
                );
            }
        }
    }

    (sent, failed)
}

/// Next instant strictly after `now` falling on `weekday` at `at` (UTC)
pub fn next_weekly_run(now: DateTime<Utc>, weekday: Weekday, at: NaiveTime) -> DateTime<Utc> {
    let today = now.weekday().num_days_from_monday() as i64;
    let target = weekday.num_days_from_monday() as i64;
    let days_ahead = (target - today).rem_euclid(7);

    let date = now.date_naive() + Duration::days(days_ahead);
    let candidate = Utc.from_utc_datetime(&date.and_time(at));

    if candidate <= now {
        candidate + Duration::days(7)
    } else {
        candidate
    }
}

/// Run the sweep every week on `weekday` at `at` (UTC)
pub fn spawn_weekly_sweep(service: NotificationsService, weekday: Weekday, at: NaiveTime) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next = next_weekly_run(now, weekday, at);
            tracing::info!("Next overdue notification sweep at {}", next);

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            match service.run_scheduled_sweep().await {
                Ok(Some(_)) => {}
                Ok(None) => tracing::info!("Overdue sweep already running elsewhere, skipping"),
                Err(e) => tracing::error!("Scheduled overdue sweep failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::email::MockMailer;
    use mockall::predicate::eq;

    fn overdue(id: i32, email: &str) -> OverdueLoan {
        OverdueLoan {
            id,
            due_at: Utc.with_ymd_and_hms(2025, 6, 2, 18, 0, 0).unwrap(),
            email: email.to_string(),
            first_name: "Ana".to_string(),
            title: "Ficciones".to_string(),
        }
    }

    #[tokio::test]
    async fn test_failed_send_does_not_stop_sweep() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|to, _, _| to == "ana@example.cl")
            .times(1)
            .returning(|_, _, _| Err(AppError::Mail("relay refused".to_string())));
        mailer
            .expect_send()
            .withf(|to, _, _| to == "luis@example.cl")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let loans = vec![overdue(1, "ana@example.cl"), overdue(2, "luis@example.cl")];
        let (sent, failed) = deliver_overdue_notices(&mailer, &loans).await;
        assert_eq!((sent, failed), (1, 1));
    }

    #[tokio::test]
    async fn test_no_loans_sends_nothing() {
        let mut mailer = MockMailer::new();
        mailer.expect_send().times(0);
        assert_eq!(deliver_overdue_notices(&mailer, &[]).await, (0, 0));
    }

    #[tokio::test]
    async fn test_notice_mentions_title_and_due_date() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .with(eq("ana@example.cl"), eq("Préstamo vencido: Ficciones"), mockall::predicate::always())
            .times(1)
            .returning(|_, _, _| Ok(()));

        deliver_overdue_notices(&mailer, &[overdue(5, "ana@example.cl")]).await;

        let (_, body) = overdue_notice(&overdue(5, "ana@example.cl"));
        assert!(body.contains("#5"));
        assert!(body.contains("02-06-2025 18:00"));
    }

    #[test]
    fn test_next_weekly_run_later_this_week() {
        // Wednesday 2025-06-04
        let now = Utc.with_ymd_and_hms(2025, 6, 4, 10, 0, 0).unwrap();
        let at = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(
            next_weekly_run(now, Weekday::Fri, at),
            Utc.with_ymd_and_hms(2025, 6, 6, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_next_weekly_run_rolls_over() {
        // Monday 2025-06-02, already past 09:00
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 9, 30, 0).unwrap();
        let at = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(
            next_weekly_run(now, Weekday::Mon, at),
            Utc.with_ymd_and_hms(2025, 6, 9, 9, 0, 0).unwrap()
        );

        // Exactly on time: next week, never "now"
        let on_time = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        assert_eq!(
            next_weekly_run(on_time, Weekday::Mon, at),
            Utc.with_ymd_and_hms(2025, 6, 9, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_next_weekly_run_same_day_before_hour() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 7, 15, 0).unwrap();
        let at = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(
            next_weekly_run(now, Weekday::Mon, at),
            Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap()
        );
    }
}
