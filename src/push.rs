//! Attendance push channel.
//!
//! Every attendance mutation is published once into a bounded broadcast
//! channel. Subscribers only see the records their role allows, and a
//! subscriber that falls behind skips what it missed; clients re-fetch on
//! reconnect.

use std::sync::Arc;

use actix_web::web::Bytes;
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::model::{attendance::Attendance, role::Role};

pub const ATTENDANCE_EVENT: &str = "attendanceUpdate";

/// Who is listening on a stream.
#[derive(Debug, Clone, Copy)]
pub struct Viewer {
    pub user_id: u64,
    pub role: Role,
}

impl Viewer {
    pub fn can_see(&self, record: &Attendance) -> bool {
        self.role.is_manager() || record.user_id == self.user_id
    }
}

#[derive(Clone)]
pub struct AttendanceHub {
    tx: broadcast::Sender<Arc<Attendance>>,
}

impl AttendanceHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Fire and forget. Having no subscribers is not an error.
    pub fn publish(&self, record: Attendance) {
        let user_id = record.user_id;
        match self.tx.send(Arc::new(record)) {
            Ok(receivers) => tracing::debug!(user_id, receivers, "Attendance update published"),
            Err(_) => tracing::trace!(user_id, "Attendance update dropped, no subscribers"),
        }
    }

    pub fn subscribe(&self, viewer: Viewer) -> impl Stream<Item = Arc<Attendance>> + 'static {
        let rx = self.tx.subscribe();
        futures::stream::unfold(rx, move |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(record) if viewer.can_see(&record) => return Some((record, rx)),
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(viewer = viewer.user_id, skipped, "Push subscriber lagged");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Encodes one record as a Server-Sent Events frame.
pub fn sse_frame(record: &Attendance) -> Result<Bytes, serde_json::Error> {
    let data = serde_json::to_string(record)?;
    Ok(Bytes::from(format!("event: {ATTENDANCE_EVENT}\ndata: {data}\n\n")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::status::AttendanceStatus;
    use chrono::NaiveDate;
    use futures::StreamExt;

    fn record(user_id: u64) -> Attendance {
        Attendance {
            id: user_id * 10,
            user_id,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            shift_name: None,
            login_time: None,
            logout_time: None,
            lunch_out: None,
            lunch_in: None,
            late_minutes: 0,
            lunch_exceeded_minutes: 0,
            total_permission_minutes: 0,
            is_half_day: false,
            status: AttendanceStatus::Present,
            override_reason: None,
            version: 1,
        }
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let hub = AttendanceHub::new(4);
        hub.publish(record(1));
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[actix_web::test]
    async fn employees_only_see_their_own_records() {
        let hub = AttendanceHub::new(8);
        let mut stream = Box::pin(hub.subscribe(Viewer {
            user_id: 2,
            role: Role::Employee,
        }));

        hub.publish(record(1));
        hub.publish(record(2));

        let got = stream.next().await.unwrap();
        assert_eq!(got.user_id, 2);
    }

    #[actix_web::test]
    async fn managers_see_everything() {
        let hub = AttendanceHub::new(8);
        let mut stream = Box::pin(hub.subscribe(Viewer {
            user_id: 99,
            role: Role::Hr,
        }));

        hub.publish(record(1));
        hub.publish(record(2));

        assert_eq!(stream.next().await.unwrap().user_id, 1);
        assert_eq!(stream.next().await.unwrap().user_id, 2);
    }

    #[actix_web::test]
    async fn lagging_subscriber_skips_to_latest() {
        let hub = AttendanceHub::new(2);
        let mut stream = Box::pin(hub.subscribe(Viewer {
            user_id: 0,
            role: Role::Ceo,
        }));

        for user in 1..=5 {
            hub.publish(record(user));
        }

        // Capacity 2 keeps only the last two events.
        assert_eq!(stream.next().await.unwrap().user_id, 4);
        assert_eq!(stream.next().await.unwrap().user_id, 5);
    }

    #[test]
    fn frame_carries_event_name_and_record() {
        let frame = sse_frame(&record(3)).unwrap();
        let text = std::str::from_utf8(&frame).unwrap();
        assert!(text.starts_with("event: attendanceUpdate\ndata: {"));
        assert!(text.contains("\"userId\":3"));
        assert!(text.ends_with("\n\n"));
    }
}
