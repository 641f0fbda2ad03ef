use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::errors::StoreError;
use crate::ttl::{parse_ttl, TtlSpec};

/// Expiry bookkeeping for one cell
///
/// Holds the established TTL specification, the absolute instant derived from
/// it and the expired flag. The flag only goes back to `false` when a TTL is
/// (re)established successfully.
#[derive(Debug, Clone)]
pub struct ExpiryClock {
    spec: TtlSpec,
    expires_at: Option<DateTime<Utc>>,
    expired: bool,
}

impl ExpiryClock {
    pub fn new(spec: TtlSpec, now: DateTime<Utc>) -> Result<Self, StoreError> {
        let expires_at = parse_ttl(&spec, now)?;
        Ok(Self {
            spec,
            expires_at,
            expired: false,
        })
    }

    /// Re-run the parser with `spec`, or with the established one when `None`.
    ///
    /// On failure nothing changes: the previous specification and instant stay
    /// in force. An expired clock only comes back to life when the new instant
    /// is not already behind `now`.
    pub fn establish(&mut self, spec: Option<TtlSpec>, now: DateTime<Utc>) -> Result<(), StoreError> {
        let spec = spec.unwrap_or_else(|| self.spec.clone());
        let expires_at = parse_ttl(&spec, now)?;
        let expired = self.expired && expires_at.is_some_and(|at| now > at);

        debug!(ttl = %spec, was_expired = self.expired, expired, "ttl established");
        self.spec = spec;
        self.expires_at = expires_at;
        self.expired = expired;
        Ok(())
    }

    /// An instant is set and `now` is strictly past it
    pub fn is_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }

    pub fn mark_expired(&mut self) {
        self.expired = true;
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn expires_at_millis(&self) -> Option<i64> {
        self.expires_at.map(|at| at.timestamp_millis())
    }

    pub fn spec(&self) -> &TtlSpec {
        &self.spec
    }

    /// Time left before expiry; `None` for permanent values, zero once elapsed.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.expires_at
            .map(|at| (at - now).max(TimeDelta::zero()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn permanent_clock_never_elapses() {
        let clock = ExpiryClock::new(TtlSpec::Never, t0()).unwrap();
        assert!(!clock.is_elapsed(t0() + TimeDelta::days(10_000)));
        assert_eq!(clock.remaining(t0()), None);
    }

    #[test]
    fn elapses_strictly_after_instant() {
        let clock = ExpiryClock::new(TtlSpec::Millis(100), t0()).unwrap();
        assert!(!clock.is_elapsed(t0() + TimeDelta::milliseconds(100)));
        assert!(clock.is_elapsed(t0() + TimeDelta::milliseconds(101)));
    }

    #[test]
    fn failed_establish_keeps_previous_state() {
        let mut clock = ExpiryClock::new(TtlSpec::from("1h"), t0()).unwrap();
        let before = clock.expires_at();
        clock.mark_expired();

        let err = clock.establish(Some(TtlSpec::from("1x")), t0() + TimeDelta::minutes(5));
        assert!(err.is_err());
        assert_eq!(clock.expires_at(), before);
        assert_eq!(clock.spec(), &TtlSpec::from("1h"));
        assert!(clock.is_expired());
    }

    #[test]
    fn establish_without_spec_reuses_current_one() {
        let mut clock = ExpiryClock::new(TtlSpec::from("10s"), t0()).unwrap();
        clock.mark_expired();

        let later = t0() + TimeDelta::seconds(30);
        clock.establish(None, later).unwrap();

        assert!(!clock.is_expired());
        assert_eq!(clock.expires_at(), Some(later + TimeDelta::seconds(10)));
    }

    #[test]
    fn elapsed_instant_does_not_revive() {
        let mut clock = ExpiryClock::new(TtlSpec::Until(t0() + TimeDelta::seconds(1)), t0()).unwrap();
        clock.mark_expired();

        let later = t0() + TimeDelta::seconds(2);
        clock.establish(None, later).unwrap();
        assert!(clock.is_expired());

        clock.establish(Some(TtlSpec::Until(later - TimeDelta::milliseconds(1))), later).unwrap();
        assert!(clock.is_expired());

        clock.establish(Some(TtlSpec::Until(later)), later).unwrap();
        assert!(!clock.is_expired());
    }

    #[test]
    fn establishing_never_clears_instant() {
        let mut clock = ExpiryClock::new(TtlSpec::from("10s"), t0()).unwrap();
        clock.establish(Some(TtlSpec::Never), t0()).unwrap();

        assert_eq!(clock.expires_at(), None);
        assert_eq!(clock.expires_at_millis(), None);
    }

    #[test]
    fn remaining_saturates_at_zero() {
        let clock = ExpiryClock::new(TtlSpec::Millis(50), t0()).unwrap();
        assert_eq!(
            clock.remaining(t0() + TimeDelta::milliseconds(20)),
            Some(TimeDelta::milliseconds(30))
        );
        assert_eq!(clock.remaining(t0() + TimeDelta::seconds(1)), Some(TimeDelta::zero()));
    }
}
