use chrono::Duration;

use crate::entities::Date;

pub(crate) trait LetChain {
    fn let_<F, R>(self, f: F) -> R
    where
        Self: Sized,
        F: FnOnce(Self) -> R;
}
impl<T> LetChain for T {
    #[inline]
    fn let_<F, R>(self, f: F) -> R
    where
        Self: Sized,
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

pub(crate) trait AlsoChain {
    fn also_<F, R>(self, f: F) -> Self
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> R;
}
impl<T> AlsoChain for T {
    #[inline]
    fn also_<F, R>(mut self, f: F) -> Self
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> R,
    {
        f(&mut self);
        self
    }
}

/// Feed-style timestamp: clock time within a day, month and day beyond.
pub fn date_to_string(date: Option<&Date>, now: &Date) -> String {
    let date = match date {
        Some(d) => d,
        None => return "Just now".to_string(),
    };

    if now.signed_duration_since(*date) < Duration::hours(24) {
        date.format("%H:%M").to_string()
    } else {
        date.format("%b %-d").to_string()
    }
}

/// Profile-style timestamp.
pub fn joined_to_string(date: Option<&Date>) -> String {
    match date {
        Some(d) => d.format("%B %-d, %Y").to_string(),
        None => "Recently".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn feed_dates() {
        let now = chrono::Utc.with_ymd_and_hms(2024, 3, 10, 18, 0, 0).unwrap();

        assert_eq!(date_to_string(None, &now), "Just now");

        let recent = chrono::Utc.with_ymd_and_hms(2024, 3, 10, 9, 5, 0).unwrap();
        assert_eq!(date_to_string(Some(&recent), &now), "09:05");

        let old = chrono::Utc.with_ymd_and_hms(2024, 3, 2, 9, 5, 0).unwrap();
        assert_eq!(date_to_string(Some(&old), &now), "Mar 2");
    }

    #[test]
    fn joined_dates() {
        let d = chrono::Utc.with_ymd_and_hms(2023, 11, 4, 0, 0, 0).unwrap();
        assert_eq!(joined_to_string(Some(&d)), "November 4, 2023");
        assert_eq!(joined_to_string(None), "Recently");
    }
}
