use std::sync::LazyLock;

use chrono::{DateTime, Months, TimeDelta, Utc};
use regex::Regex;
use tracing::debug;

use crate::errors::StoreError;
use crate::ttl::spec::TtlSpec;

static TTL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)(ms|s|m|h|d|w|M|y)$")
        .expect("ttl pattern must compile")
});

/// Unit suffix of a textual TTL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlUnit {
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TtlUnit {
    /// Case-sensitive: `m` is minutes, `M` is months.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        let unit = match suffix {
            "ms" => TtlUnit::Millisecond,
            "s" => TtlUnit::Second,
            "m" => TtlUnit::Minute,
            "h" => TtlUnit::Hour,
            "d" => TtlUnit::Day,
            "w" => TtlUnit::Week,
            "M" => TtlUnit::Month,
            "y" => TtlUnit::Year,
            _ => return None,
        };
        Some(unit)
    }

    /// Advance `from` by `amount` units.
    ///
    /// Months and years use calendar arithmetic (day clamped to the end of the
    /// target month), everything else a fixed duration. `None` on overflow.
    pub fn advance(self, from: DateTime<Utc>, amount: u64) -> Option<DateTime<Utc>> {
        let fixed = |to_delta: fn(i64) -> Option<TimeDelta>| {
            i64::try_from(amount)
                .ok()
                .and_then(to_delta)
                .and_then(|delta| from.checked_add_signed(delta))
        };
        let calendar = |months: u64| {
            u32::try_from(months)
                .ok()
                .and_then(|months| from.checked_add_months(Months::new(months)))
        };

        match self {
            TtlUnit::Millisecond => fixed(TimeDelta::try_milliseconds),
            TtlUnit::Second => fixed(TimeDelta::try_seconds),
            TtlUnit::Minute => fixed(TimeDelta::try_minutes),
            TtlUnit::Hour => fixed(TimeDelta::try_hours),
            TtlUnit::Day => fixed(TimeDelta::try_days),
            TtlUnit::Week => fixed(TimeDelta::try_weeks),
            TtlUnit::Month => calendar(amount),
            TtlUnit::Year => amount.checked_mul(12).and_then(calendar),
        }
    }
}

/// Split `"<integer><unit>"` into its magnitude and unit.
pub fn parse_ttl_text(text: &str) -> Result<(u64, TtlUnit), StoreError> {
    let caps = TTL_PATTERN
        .captures(text)
        .ok_or_else(|| StoreError::invalid_ttl(text))?;

    let amount = caps[1]
        .parse::<u64>()
        .map_err(|_| StoreError::invalid_ttl(text))?;
    let unit = TtlUnit::from_suffix(&caps[2]).ok_or_else(|| StoreError::invalid_ttl(text))?;

    Ok((amount, unit))
}

/// Resolve a TTL specification into an absolute expiry instant.
///
/// `Ok(None)` means the value never expires.
pub fn parse_ttl(spec: &TtlSpec, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, StoreError> {
    let expires_at = match spec {
        TtlSpec::Never => return Ok(None),
        TtlSpec::Millis(ms) => TtlUnit::Millisecond
            .advance(now, *ms)
            .ok_or_else(|| StoreError::invalid_ttl(ms.to_string()))?,
        TtlSpec::Until(at) => *at,
        TtlSpec::Text(text) => {
            let (amount, unit) = parse_ttl_text(text)?;
            unit.advance(now, amount)
                .ok_or_else(|| StoreError::invalid_ttl(text.as_str()))?
        }
    };

    debug!(ttl = %spec, expires_at = %expires_at, "ttl resolved");
    Ok(Some(expires_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap()
    }

    #[test]
    fn null_spec_is_permanent() {
        assert_eq!(parse_ttl(&TtlSpec::Never, t0()).unwrap(), None);
    }

    #[test]
    fn millis_are_added_to_now() {
        let got = parse_ttl(&TtlSpec::Millis(1500), t0()).unwrap().unwrap();
        assert_eq!(got - t0(), TimeDelta::milliseconds(1500));
    }

    #[test]
    fn zero_millis_expire_at_now() {
        assert_eq!(parse_ttl(&TtlSpec::Millis(0), t0()).unwrap(), Some(t0()));
    }

    #[test]
    fn absolute_instant_is_taken_verbatim() {
        let at = Utc.with_ymd_and_hms(2030, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_ttl(&TtlSpec::Until(at), t0()).unwrap(), Some(at));
    }

    #[test]
    fn fixed_units_add_exact_durations() {
        let cases = [
            ("250ms", TimeDelta::milliseconds(250)),
            ("10s", TimeDelta::seconds(10)),
            ("5m", TimeDelta::minutes(5)),
            ("2h", TimeDelta::hours(2)),
            ("1d", TimeDelta::days(1)),
            ("3w", TimeDelta::weeks(3)),
        ];
        for (text, expected) in cases {
            let got = parse_ttl(&TtlSpec::from(text), t0()).unwrap().unwrap();
            assert_eq!(got - t0(), expected, "ttl '{text}'");
        }
    }

    #[test]
    fn months_use_calendar_arithmetic() {
        // Jan 31 + 1 month clamps to the last day of February (leap year)
        let got = parse_ttl(&TtlSpec::from("1M"), t0()).unwrap().unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap());

        let got = parse_ttl(&TtlSpec::from("3M"), t0()).unwrap().unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2024, 4, 30, 12, 0, 0).unwrap());
    }

    #[test]
    fn years_use_calendar_arithmetic() {
        let leap_day = Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap();
        let got = parse_ttl(&TtlSpec::from("1y"), leap_day).unwrap().unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2025, 2, 28, 0, 0, 0).unwrap());
    }

    #[test]
    fn minute_and_month_are_case_sensitive() {
        assert_eq!(parse_ttl_text("1m").unwrap(), (1, TtlUnit::Minute));
        assert_eq!(parse_ttl_text("1M").unwrap(), (1, TtlUnit::Month));
    }

    #[test]
    fn malformed_text_is_rejected() {
        let malformed = [
            "10x", "-5s", "10", "", "1.5h", " 10s", "10s ", "10S", "s10", "10 s",
            "5second", "1day", "2month", "3year", "10minute", "7millisecond",
        ];
        for text in malformed {
            let err = parse_ttl(&TtlSpec::from(text), t0()).unwrap_err();
            assert!(
                matches!(err, StoreError::InvalidTtlFormat { .. }),
                "'{text}' should be rejected"
            );
        }
    }

    #[test]
    fn overflowing_magnitude_is_rejected() {
        let err = parse_ttl(&TtlSpec::from("99999999999999999999999s"), t0()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTtlFormat { .. }));

        let err = parse_ttl(&TtlSpec::from("9999999999y"), t0()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTtlFormat { .. }));
    }
}
