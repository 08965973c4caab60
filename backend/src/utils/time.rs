use std::sync::Mutex;

use chrono::{DateTime, Months, NaiveDate, Utc};
use chrono_tz::Tz;

/// Source of "now" for subscription and session checks.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;

    /// Calendar date that subscription gates compare against.
    fn today(&self) -> NaiveDate;
}

/// Wall clock whose calendar date is taken in the configured timezone.
#[derive(Debug, Clone)]
pub struct SystemClock {
    time_zone: Tz,
}

impl SystemClock {
    pub fn new(time_zone: Tz) -> Self {
        Self { time_zone }
    }
}

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        today_local(&self.time_zone)
    }
}

/// Clock that only moves when told to. Used by tests and tooling that need
/// a deterministic date.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn on_date(date: NaiveDate) -> Self {
        Self::new(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn set_date(&self, date: NaiveDate) {
        self.set(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }
}

impl Clock for ManualClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn today(&self) -> NaiveDate {
        self.now_utc().date_naive()
    }
}

/// Returns the current time in the configured timezone.
pub fn now_in_timezone(tz: &Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(tz)
}

/// Returns today's date in the configured timezone.
pub fn today_local(tz: &Tz) -> NaiveDate {
    now_in_timezone(tz).date_naive()
}

/// A subscription is valid through the whole of its end date.
pub fn is_subscription_valid(subscription_end: Option<NaiveDate>, today: NaiveDate) -> bool {
    subscription_end.is_some_and(|end| end >= today)
}

/// Days remaining until `subscription_end`; negative once lapsed.
pub fn subscription_days_left(subscription_end: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    subscription_end.map(|end| (end - today).num_days())
}

/// New end date after extending by `months`. Extensions start from today
/// when the subscription has lapsed or never existed.
pub fn extended_subscription_end(
    subscription_end: Option<NaiveDate>,
    today: NaiveDate,
    months: u32,
) -> Option<NaiveDate> {
    let base = subscription_end.map_or(today, |end| end.max(today));
    base.checked_add_months(Months::new(months))
}
