//! In-memory fakes for the engine's seams.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use slotwatch_availability::{
    AvailabilityClient, AvailabilityError, AvailabilitySearch, MealPeriodAvailability, MealSlot,
    RestaurantAvailability,
};
use slotwatch_core::staleness::recheck_cutoff;
use slotwatch_core::types::{DbId, Timestamp, DATE_FORMAT};
use slotwatch_db::models::alert::BookAlert;
use slotwatch_db::models::notification::{ActiveNotification, BookNotification};
use slotwatch_db::models::slot::{BookSlot, SlotKey};
use slotwatch_events::{NotificationPublisher, PublishError, SlotNotificationMessage};
use tokio::time::Instant;

use crate::repository::SlotRepository;

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).unwrap()
}

fn injected(what: &str) -> sqlx::Error {
    sqlx::Error::Protocol(format!("injected {what} failure"))
}

/// A one-day availability response with a single meal period.
pub fn day_with_slots(
    day: &str,
    meal_period: &str,
    slots: &[(&str, &str)],
) -> Vec<RestaurantAvailability> {
    vec![RestaurantAvailability {
        date: day.to_string(),
        status: "OK".to_string(),
        meal_periods: vec![MealPeriodAvailability {
            meal_period: meal_period.to_string(),
            slot_list: slots
                .iter()
                .map(|(time, available)| MealSlot {
                    time: time.to_string(),
                    available: available.to_string(),
                })
                .collect(),
        }],
        ..Default::default()
    }]
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

#[derive(Default)]
struct State {
    next_id: DbId,
    clock: Option<Timestamp>,
    restaurants: HashMap<DbId, (String, String)>,
    alerts: Vec<BookAlert>,
    slots: Vec<BookSlot>,
    notifications: Vec<BookNotification>,
    fail_due: bool,
    fail_upserts: bool,
    fail_marks: bool,
    fail_completions: bool,
    fail_exists_for_slots: HashSet<DbId>,
    fail_inserts_for_slots: HashSet<DbId>,
    failing_deactivations: usize,
}

impl State {
    fn id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn now(&self) -> Timestamp {
        self.clock.unwrap_or_else(Utc::now)
    }

    fn alert_mut(&mut self, id: DbId) -> Result<&mut BookAlert, sqlx::Error> {
        self.alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(sqlx::Error::RowNotFound)
    }

    fn upsert(&mut self, key: &SlotKey, available: bool) -> BookSlot {
        let now = self.now();
        if let Some(slot) = self.slots.iter_mut().find(|s| {
            s.restaurant_id == key.restaurant_id
                && s.date == key.date
                && s.meal_period == key.meal_period
                && s.party_mix == key.party_mix
                && s.hour == key.hour
        }) {
            slot.was_available = slot.available;
            slot.available = available;
            slot.updated_at = now;
            return slot.clone();
        }

        let slot = BookSlot {
            id: self.id(),
            restaurant_id: key.restaurant_id,
            date: key.date,
            meal_period: key.meal_period.clone(),
            party_mix: key.party_mix,
            hour: key.hour.clone(),
            available,
            was_available: false,
            created_at: now,
            updated_at: now,
        };
        self.slots.push(slot.clone());
        slot
    }
}

/// [`SlotRepository`] over plain vectors, with failure injection.
#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<State>,
}

impl InMemoryRepository {
    pub fn add_restaurant(&self, external_id: &str, name: &str) -> DbId {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        state
            .restaurants
            .insert(id, (external_id.to_string(), name.to_string()));
        id
    }

    /// Add a never-checked dinner alert for two.
    pub fn add_alert(&self, restaurant_id: DbId, day: &str) -> DbId {
        self.add_alert_checked_at(restaurant_id, day, Utc.timestamp_opt(0, 0).unwrap())
    }

    pub fn add_alert_checked_at(&self, restaurant_id: DbId, day: &str, checked_at: Timestamp) -> DbId {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        let (external_id, name) = state.restaurants[&restaurant_id].clone();
        let now = state.now();
        state.alerts.push(BookAlert {
            id,
            restaurant_id,
            restaurant_external_id: external_id,
            restaurant_name: name,
            recipient: format!("user-{id}"),
            date: date(day),
            meal_period: "dinner".to_string(),
            party_mix: 2,
            completed: false,
            checked_at,
            check_count: 0,
            error_count: 0,
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn alert(&self, id: DbId) -> BookAlert {
        let state = self.state.lock().unwrap();
        state.alerts.iter().find(|a| a.id == id).cloned().unwrap()
    }

    pub fn complete_now(&self, id: DbId) {
        self.state.lock().unwrap().alert_mut(id).unwrap().completed = true;
    }

    /// Fix the time used for `checked_at` and row timestamps.
    pub fn set_clock(&self, now: Timestamp) {
        self.state.lock().unwrap().clock = Some(now);
    }

    /// Record an observation directly, as an ingest would.
    pub fn put_slot(
        &self,
        restaurant_id: DbId,
        day: &str,
        meal_period: &str,
        party_mix: i32,
        hour: &str,
        available: bool,
    ) -> DbId {
        let key = SlotKey {
            restaurant_id,
            date: date(day),
            meal_period: meal_period.to_string(),
            party_mix,
            hour: hour.to_string(),
        };
        self.state.lock().unwrap().upsert(&key, available).id
    }

    pub fn slot(
        &self,
        restaurant_id: DbId,
        day: &str,
        meal_period: &str,
        party_mix: i32,
        hour: &str,
    ) -> Option<BookSlot> {
        let day = date(day);
        let state = self.state.lock().unwrap();
        state
            .slots
            .iter()
            .find(|s| {
                s.restaurant_id == restaurant_id
                    && s.date == day
                    && s.meal_period == meal_period
                    && s.party_mix == party_mix
                    && s.hour == hour
            })
            .cloned()
    }

    pub fn slot_count(&self) -> usize {
        self.state.lock().unwrap().slots.len()
    }

    pub fn active_notification_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.notifications.iter().filter(|n| n.active).count()
    }

    pub fn active_notifications_for_slot(&self, slot_id: DbId) -> usize {
        let state = self.state.lock().unwrap();
        state
            .notifications
            .iter()
            .filter(|n| n.active && n.book_slot_id == slot_id)
            .count()
    }

    /// Every notification row ever created for the slot, active or not.
    pub fn notification_history_for_slot(&self, slot_id: DbId) -> usize {
        let state = self.state.lock().unwrap();
        state
            .notifications
            .iter()
            .filter(|n| n.book_slot_id == slot_id)
            .count()
    }

    pub fn fail_due_alerts(&self) {
        self.state.lock().unwrap().fail_due = true;
    }

    pub fn fail_upserts(&self) {
        self.state.lock().unwrap().fail_upserts = true;
    }

    pub fn fail_marks(&self) {
        self.state.lock().unwrap().fail_marks = true;
    }

    pub fn fail_completions(&self) {
        self.state.lock().unwrap().fail_completions = true;
    }

    pub fn fail_existence_check_for_slot(&self, slot_id: DbId) {
        self.state
            .lock()
            .unwrap()
            .fail_exists_for_slots
            .insert(slot_id);
    }

    pub fn fail_notification_inserts_for_slot(&self, slot_id: DbId) {
        self.state
            .lock()
            .unwrap()
            .fail_inserts_for_slots
            .insert(slot_id);
    }

    pub fn fail_next_deactivations(&self, count: usize) {
        self.state.lock().unwrap().failing_deactivations = count;
    }
}

#[async_trait]
impl SlotRepository for InMemoryRepository {
    async fn due_alerts(&self, now: Timestamp, limit: i64) -> Result<Vec<BookAlert>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        if state.fail_due {
            return Err(injected("due alerts"));
        }
        let cutoff = recheck_cutoff(now);
        let mut due: Vec<BookAlert> = state
            .alerts
            .iter()
            .filter(|a| !a.completed && a.checked_at < cutoff)
            .cloned()
            .collect();
        due.sort_by_key(|a| (a.checked_at, a.id));
        due.truncate(limit.max(0) as usize);
        Ok(due)
    }

    async fn active_alerts(&self) -> Result<Vec<BookAlert>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state.alerts.iter().filter(|a| !a.completed).cloned().collect())
    }

    async fn upsert_slot(&self, key: &SlotKey, available: bool) -> Result<BookSlot, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_upserts {
            return Err(injected("upsert"));
        }
        Ok(state.upsert(key, available))
    }

    async fn mark_checked(&self, alert_id: DbId) -> Result<(), sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_marks {
            return Err(injected("mark"));
        }
        let now = state.now();
        let alert = state.alert_mut(alert_id)?;
        alert.checked_at = now;
        alert.check_count += 1;
        Ok(())
    }

    async fn mark_errored(&self, alert_id: DbId) -> Result<(), sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_marks {
            return Err(injected("mark"));
        }
        let now = state.now();
        let alert = state.alert_mut(alert_id)?;
        alert.checked_at = now;
        alert.error_count += 1;
        Ok(())
    }

    async fn matching_available_slots(
        &self,
        alert: &BookAlert,
    ) -> Result<Vec<BookSlot>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let mut slots: Vec<BookSlot> = state
            .slots
            .iter()
            .filter(|s| {
                s.available
                    && s.restaurant_id == alert.restaurant_id
                    && s.date == alert.date
                    && s.meal_period == alert.meal_period
                    && s.party_mix == alert.party_mix
            })
            .cloned()
            .collect();
        slots.sort_by(|a, b| a.hour.cmp(&b.hour));
        Ok(slots)
    }

    async fn active_notification_exists(
        &self,
        alert_id: DbId,
        slot_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let state = self.state.lock().unwrap();
        if state.fail_exists_for_slots.contains(&slot_id) {
            return Err(injected("existence check"));
        }
        Ok(state
            .notifications
            .iter()
            .any(|n| n.active && n.book_alert_id == alert_id && n.book_slot_id == slot_id))
    }

    async fn create_notification(
        &self,
        alert_id: DbId,
        slot_id: DbId,
    ) -> Result<Option<BookNotification>, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_inserts_for_slots.contains(&slot_id) {
            return Err(injected("notification insert"));
        }
        let exists = state
            .notifications
            .iter()
            .any(|n| n.active && n.book_alert_id == alert_id && n.book_slot_id == slot_id);
        if exists {
            return Ok(None);
        }
        let notification = BookNotification {
            id: state.id(),
            book_alert_id: alert_id,
            book_slot_id: slot_id,
            active: true,
            created_at: state.now(),
            deactivated_at: None,
        };
        state.notifications.push(notification.clone());
        Ok(Some(notification))
    }

    async fn active_notifications(&self) -> Result<Vec<ActiveNotification>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.active)
            .map(|n| ActiveNotification {
                id: n.id,
                book_alert_id: n.book_alert_id,
                book_slot_id: n.book_slot_id,
                slot_available: state
                    .slots
                    .iter()
                    .any(|s| s.id == n.book_slot_id && s.available),
            })
            .collect())
    }

    async fn deactivate_notification(&self, id: DbId) -> Result<bool, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if state.failing_deactivations > 0 {
            state.failing_deactivations -= 1;
            return Err(injected("deactivation"));
        }
        let now = state.now();
        match state.notifications.iter_mut().find(|n| n.id == id && n.active) {
            Some(n) => {
                n.active = false;
                n.deactivated_at = Some(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn complete_alert(&self, id: DbId) -> Result<bool, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_completions {
            return Err(injected("completion"));
        }
        let alert = state.alert_mut(id)?;
        if alert.completed {
            return Ok(false);
        }
        alert.completed = true;
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Availability client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub search: AvailabilitySearch,
    pub at: Instant,
}

#[derive(Clone)]
enum Script {
    Respond(Vec<RestaurantAvailability>),
    Fail(u16),
}

/// Answers per restaurant external id; unscripted restaurants get an empty
/// response.
#[derive(Default)]
pub struct ScriptedClient {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedClient {
    pub fn respond(&self, external_id: &str, response: Vec<RestaurantAvailability>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(external_id.to_string(), Script::Respond(response));
    }

    pub fn fail(&self, external_id: &str, status: u16) {
        self.scripts
            .lock()
            .unwrap()
            .insert(external_id.to_string(), Script::Fail(status));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AvailabilityClient for ScriptedClient {
    async fn query(
        &self,
        search: &AvailabilitySearch,
    ) -> Result<Vec<RestaurantAvailability>, AvailabilityError> {
        self.calls.lock().unwrap().push(RecordedCall {
            search: search.clone(),
            at: Instant::now(),
        });
        let script = self.scripts.lock().unwrap().get(&search.restaurant_id).cloned();
        match script {
            Some(Script::Respond(response)) => Ok(response),
            Some(Script::Fail(status)) => Err(AvailabilityError::HttpStatus {
                status,
                body: "service unavailable".to_string(),
            }),
            None => Ok(Vec::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingPublisher {
    messages: Mutex<Vec<SlotNotificationMessage>>,
    fail: bool,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn messages(&self) -> Vec<SlotNotificationMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationPublisher for RecordingPublisher {
    async fn publish(&self, message: &SlotNotificationMessage) -> Result<(), PublishError> {
        if self.fail {
            return Err(redis::RedisError::from((redis::ErrorKind::IoError, "connection refused")).into());
        }
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Logs
// ---------------------------------------------------------------------------

/// Collects formatted tracing output for the current thread.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Route this thread's events into the capture until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
