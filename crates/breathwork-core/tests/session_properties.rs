//! Property tests for session timing and hold accounting.

use breathwork_core::{BreathingSessionEngine, Event, ManualClock, NullSink, Pattern};
use proptest::prelude::*;

fn engine_for(sequence: Vec<f64>) -> (BreathingSessionEngine, ManualClock) {
    let clock = ManualClock::new(1_767_225_600_000);
    let pattern = Pattern::new("prop", sequence).unwrap();
    let engine =
        BreathingSessionEngine::new(pattern, Box::new(clock.clone()), Box::new(NullSink)).unwrap();
    (engine, clock)
}

/// Advance one second at a time; the phase clock catches up on each poll.
fn run_secs(engine: &mut BreathingSessionEngine, clock: &ManualClock, secs: u64) {
    for _ in 0..secs {
        clock.advance_secs(1);
        engine.poll();
    }
}

fn whole_durations() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((1u32..=10).prop_map(f64::from), 1..=5)
}

proptest! {
    #[test]
    fn cycles_count_full_traversals(sequence in whole_durations(), cycles in 1u64..=4) {
        let (mut engine, clock) = engine_for(sequence.clone());
        let cycle_secs: f64 = sequence.iter().sum();
        engine.start();
        run_secs(&mut engine, &clock, cycles * cycle_secs as u64);

        prop_assert_eq!(engine.current_cycle(), cycles);
        prop_assert_eq!(engine.current_phase(), 0);
        prop_assert_eq!(engine.breath_count(), cycles * sequence.len() as u64);
    }

    #[test]
    fn elapsed_excludes_pauses(spans in prop::collection::vec((0u64..5_000, 0u64..20_000), 1..8)) {
        let (mut engine, clock) = engine_for(vec![4.0, 4.0]);
        engine.start();
        let mut running_ms = 0;
        for (run, paused) in spans {
            clock.advance_ms(run);
            engine.poll();
            running_ms += run;
            engine.pause();
            clock.advance_ms(paused);
            engine.poll();
            engine.resume(None);
        }
        let Some(Event::SessionEnded { summary, .. }) = engine.end() else {
            panic!("session should end");
        };
        let expected = running_ms as f64 / 1000.0;
        prop_assert!((summary.duration as f64 - expected).abs() <= 1.0,
            "duration {} vs expected {}", summary.duration, expected);
    }

    #[test]
    fn longest_hold_is_maximum(holds in prop::collection::vec(0u64..30_000, 0..6)) {
        let (mut engine, clock) = engine_for(vec![4.0, 7.0, 8.0]);
        engine.start();
        let mut rounded = Vec::new();
        for hold in &holds {
            run_secs(&mut engine, &clock, 3);
            engine.start_hold();
            clock.advance_ms(*hold);
            engine.poll();
            engine.end_hold();
            rounded.push((hold + 500) / 1000);
        }
        let stats = engine.hold_stats();
        prop_assert_eq!(stats.hold_count, holds.len() as u64);
        prop_assert_eq!(stats.longest_hold, rounded.iter().copied().max().unwrap_or(0));
        prop_assert_eq!(stats.total_hold_time, rounded.iter().sum::<u64>());
        prop_assert_eq!(stats.current_hold_time, 0);
    }

    #[test]
    fn end_hold_always_returns_to_first_phase(
        sequence in whole_durations(),
        offset in 0u64..60,
        hold in 0u64..10,
    ) {
        let (mut engine, clock) = engine_for(sequence.clone());
        engine.start();
        run_secs(&mut engine, &clock, offset);
        engine.start_hold();
        run_secs(&mut engine, &clock, hold);
        engine.end_hold();

        prop_assert_eq!(engine.current_phase(), 0);
        prop_assert!(!engine.is_holding());
        prop_assert_eq!(engine.countdown(), sequence[0]);
    }

    #[test]
    fn second_pause_changes_nothing(run in 0u64..20, gap in 0u64..5_000) {
        let (mut engine, clock) = engine_for(vec![4.0, 4.0, 4.0, 4.0]);
        engine.start();
        run_secs(&mut engine, &clock, run);
        engine.pause();
        let once = engine.snapshot();
        clock.advance_ms(gap);
        prop_assert!(engine.pause().is_none());
        let twice = engine.snapshot();

        match (once, twice) {
            (
                Event::StateSnapshot { current_phase: p1, elapsed_secs: e1, countdown: c1, .. },
                Event::StateSnapshot { current_phase: p2, elapsed_secs: e2, countdown: c2, .. },
            ) => {
                prop_assert_eq!(p1, p2);
                prop_assert_eq!(e1, e2);
                prop_assert_eq!(c1, c2);
            }
            _ => prop_assert!(false, "expected snapshots"),
        }
    }
}
