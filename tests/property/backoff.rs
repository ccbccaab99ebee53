//! Backoff schedule invariants:
//! - the pre-jitter delay grows monotonically and never exceeds the cap
//! - the jittered delay stays within `[pre-jitter delay, cap]`
//! - with jitter disabled the schedule is exactly exponential until capped

use aula_db_gate::Backoff;
use proptest::prelude::*;
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn jittered_delay_stays_within_bounds(
        initial_ms in 1u64..=1_000,
        cap_ms in 1u64..=20_000,
        jitter in 0.0f64..=1.0,
        attempt in 0u32..=16,
    ) {
        let cap = Duration::from_millis(cap_ms);
        let backoff = Backoff::new(Duration::from_millis(initial_ms))
            .cap(cap)
            .jitter(jitter);

        let base = backoff.base_delay(attempt);
        let delay = backoff.delay_for(attempt);

        prop_assert!(base <= cap, "pre-jitter delay {base:?} above cap {cap:?}");
        prop_assert!(delay >= base, "delay {delay:?} below its schedule {base:?}");
        prop_assert!(delay <= cap, "delay {delay:?} above cap {cap:?}");
    }

    #[test]
    fn base_delay_is_monotone(
        initial_ms in 1u64..=1_000,
        cap_ms in 1u64..=20_000,
        attempts in 1u32..=16,
    ) {
        let backoff = Backoff::new(Duration::from_millis(initial_ms))
            .cap(Duration::from_millis(cap_ms));

        for attempt in 0..attempts {
            let here = backoff.base_delay(attempt);
            let next = backoff.base_delay(attempt + 1);
            prop_assert!(
                next >= here,
                "delay shrank between attempts {attempt} and {}: {here:?} -> {next:?}",
                attempt + 1
            );
        }
    }

    #[test]
    fn uncapped_schedule_doubles_exactly(
        initial_ms in 1u64..=500,
        attempt in 0u32..=10,
    ) {
        // Cap far above anything 10 doublings of 500ms can reach.
        let backoff = Backoff::new(Duration::from_millis(initial_ms))
            .cap(Duration::from_secs(3_600))
            .jitter(0.0);

        let here = backoff.delay_for(attempt).as_nanos();
        let next = backoff.delay_for(attempt + 1).as_nanos();
        let diff = next.abs_diff(here * 2);
        // Allow one nanosecond of float rounding per conversion.
        prop_assert!(diff <= 2, "expected doubling, got {here}ns -> {next}ns");
    }
}
