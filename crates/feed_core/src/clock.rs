//! Exchange trading-window clock.
//!
//! The exchange trades on weekdays between 09:15 and 15:30 local time
//! (IST, UTC+05:30). Exchange holidays are not modelled.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc, Weekday};

/// Offset of IST from UTC in seconds
pub const IST_OFFSET_SECS: i64 = 5 * 3600 + 30 * 60;

/// Trading window of an exchange in its local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeClock {
    /// Local offset from UTC in seconds
    pub utc_offset_secs: i64,
    /// Session open, minutes after local midnight
    pub open_minute: u32,
    /// Session close, minutes after local midnight
    pub close_minute: u32,
}

impl Default for ExchangeClock {
    fn default() -> Self {
        Self {
            utc_offset_secs: IST_OFFSET_SECS,
            open_minute: 9 * 60 + 15,
            close_minute: 15 * 60 + 30,
        }
    }
}

impl ExchangeClock {
    /// Local wall-clock time at the exchange
    pub fn local(&self, now: DateTime<Utc>) -> NaiveDateTime {
        (now + Duration::seconds(self.utc_offset_secs)).naive_utc()
    }

    /// Local calendar date at the exchange
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        self.local(now).date()
    }

    /// `HH:MM:SS` local time label
    pub fn time_label(&self, now: DateTime<Utc>) -> String {
        self.local(now).format("%H:%M:%S").to_string()
    }

    /// Whether `now` falls inside the trading window.
    ///
    /// The window is inclusive of the open minute and of the close minute.
    pub fn is_trading_time(&self, now: DateTime<Utc>) -> bool {
        let local = self.local(now);
        if !is_weekday(local.date()) {
            return false;
        }
        let minute = local.hour() * 60 + local.minute();
        minute >= self.open_minute && minute <= self.close_minute
    }
}

/// Monday to Friday
pub fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Latest weekday on or before `date`, `None` if the calendar starts first.
pub fn last_weekday_on_or_before(date: NaiveDate) -> Option<NaiveDate> {
    let mut day = date;
    while !is_weekday(day) {
        day = day.pred_opt()?;
    }
    Some(day)
}

/// The `count` weekdays ending at the last weekday on or before `end`,
/// in ascending order.
///
/// Fewer than `count` come back when the window would reach past
/// [`NaiveDate::MIN`].
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use feed_core::clock::weekdays_ending;
///
/// // 2024-06-09 is a Sunday
/// let end = NaiveDate::from_ymd_opt(2024, 6, 9).unwrap();
/// let days = weekdays_ending(end, 3);
/// assert_eq!(days.len(), 3);
/// assert_eq!(days[2], NaiveDate::from_ymd_opt(2024, 6, 7).unwrap());
/// ```
pub fn weekdays_ending(end: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(count);
    let mut next = last_weekday_on_or_before(end);
    while days.len() < count {
        let Some(day) = next else { break };
        days.push(day);
        next = day.pred_opt().and_then(last_weekday_on_or_before);
    }
    days.reverse();
    days
}
