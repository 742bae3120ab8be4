//! Week-ending calendar.
//!
//! Every journal period ends on the same weekday, and the first period ended
//! on the service launch date. Together these bound where drafts can exist.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use super::error::{AppError, Result};
use super::models::EntryDate;

/// The first What Got Done entry was due on this Friday.
pub const DEFAULT_LAUNCH_DATE: (i32, u32, u32) = (2019, 3, 29);

pub const DEFAULT_WEEK_ENDING: Weekday = Weekday::Fri;

const ONE_WEEK: Days = Days::new(7);

/// Launch date plus the weekday every period ends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekCalendar {
    launch_date: NaiveDate,
    week_ending: Weekday,
}

impl WeekCalendar {
    /// Creates a calendar; the launch date must itself be a week-ending day.
    ///
    /// # Errors
    /// Returns a configuration error if `launch_date` is not a `week_ending`.
    pub fn new(launch_date: NaiveDate, week_ending: Weekday) -> Result<Self> {
        if launch_date.weekday() != week_ending {
            return Err(AppError::Config {
                message: format!(
                    "launch date {launch_date} is a {}, expected a {week_ending}",
                    launch_date.weekday()
                ),
            });
        }
        Ok(Self {
            launch_date,
            week_ending,
        })
    }

    #[must_use]
    pub const fn launch_date(&self) -> NaiveDate {
        self.launch_date
    }

    #[must_use]
    pub const fn week_ending(&self) -> Weekday {
        self.week_ending
    }

    /// The week-ending day of the period containing `today`: the first
    /// `week_ending` on or after it.
    #[must_use]
    pub fn week_ending_for(&self, today: NaiveDate) -> EntryDate {
        let ahead = (7 + self.week_ending.num_days_from_monday()
            - today.weekday().num_days_from_monday())
            % 7;
        EntryDate::new(today + Days::new(u64::from(ahead)))
    }

    /// Every week-ending day from the launch date through `through`,
    /// ascending. Empty when `through` precedes the launch date.
    pub fn candidate_dates(&self, through: EntryDate) -> impl Iterator<Item = EntryDate> {
        let last = through.as_naive();
        std::iter::successors(Some(self.launch_date), |d| d.checked_add_days(ONE_WEEK))
            .take_while(move |d| *d <= last)
            .map(EntryDate::new)
    }
}

impl Default for WeekCalendar {
    fn default() -> Self {
        let (y, m, d) = DEFAULT_LAUNCH_DATE;
        Self {
            launch_date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN),
            week_ending: DEFAULT_WEEK_ENDING,
        }
    }
}
