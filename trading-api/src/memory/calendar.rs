use crate::traits::calendar::{Calendar, DateSearch};
use chrono::{Datelike, Duration, NaiveDateTime, Weekday};

/// Monday to Friday, no holidays.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekdayCalendar;

impl WeekdayCalendar {
    fn is_business_day(date: NaiveDateTime) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }
}

impl Calendar for WeekdayCalendar {
    fn business_day(&self, date: NaiveDateTime) -> Option<NaiveDateTime> {
        Self::is_business_day(date).then_some(date)
    }

    fn closest_business_day(&self, date: NaiveDateTime, search: DateSearch) -> NaiveDateTime {
        let step = match search {
            DateSearch::Previous => Duration::days(-1),
            DateSearch::Next => Duration::days(1),
        };
        let mut day = date;
        while !Self::is_business_day(day) {
            day += step;
        }
        day
    }

    fn add_business_days(&self, date: NaiveDateTime, n: i64) -> NaiveDateTime {
        let step = if n < 0 {
            Duration::days(-1)
        } else {
            Duration::days(1)
        };
        let mut day = date;
        let mut remaining = n.abs();
        while remaining > 0 {
            day += step;
            if Self::is_business_day(day) {
                remaining -= 1;
            }
        }
        day
    }
}
