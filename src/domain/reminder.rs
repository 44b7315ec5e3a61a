//! Durable follow-up task for an unconfirmed self-reported claim.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One scheduled follow-up. `sent` only ever moves false -> true; the task id
/// doubles as the dedup key handed to the notification gateway so a crash
/// between send and flag update cannot produce a second user-visible message.
#[derive(Debug, Clone, Serialize)]
pub struct ReminderTask {
    pub id: Uuid,
    pub claim_id: Uuid,
    pub scheduled_for: DateTime<Utc>,
    pub sent: bool,
    pub created_at: DateTime<Utc>,
}

impl ReminderTask {
    pub fn for_claim(claim_id: Uuid, reported_at: DateTime<Utc>, delay_minutes: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            claim_id,
            scheduled_for: reported_at + Duration::minutes(delay_minutes),
            sent: false,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedules_after_the_configured_delay() {
        let reported = Utc::now();
        let task = ReminderTask::for_claim(Uuid::new_v4(), reported, 60);
        assert_eq!(task.scheduled_for, reported + Duration::minutes(60));
        assert!(!task.sent);
    }
}
