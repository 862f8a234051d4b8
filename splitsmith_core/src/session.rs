//! Guided session sequencing.
//!
//! The runner walks a validated routine step by step: announce the drill,
//! run the timed hold/rest countdowns for every set, collect feedback once
//! per drill, then hand one immutable [`LogEntry`] to the sink before the
//! next step begins. Wall-clock waits and user-facing output go through the
//! [`Clock`] and [`Notifier`] capabilities so tests can run without real
//! delays or a terminal.

use crate::feedback::{self, InputProvider};
use crate::journal::LogSink;
use crate::{Error, LogEntry, Result, RoutineDefinition, Selector, SessionContext, Step};
use chrono::NaiveDate;
use std::time::Duration;

/// One-second wall-clock waits for countdown ticks
pub trait Clock {
    fn sleep_one_second(&mut self);
}

/// Real clock backed by a blocking sleep
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep_one_second(&mut self) {
        std::thread::sleep(Duration::from_secs(1));
    }
}

/// User-facing side effects of a running session
///
/// The runner drives this once per observable event; the CLI renders to the
/// console, tests record the calls.
pub trait Notifier {
    fn session_started(&mut self, routine: &str, selector: Option<&Selector>);
    fn announce_step(&mut self, step: &Step);
    fn set_started(&mut self, set: u32, sets: u32, hold_s: u32);
    /// One tick per remaining second while a countdown runs
    fn tick(&mut self, label: &str, remaining_s: u32);
    /// Audible cue fired once when a countdown reaches zero
    fn cue(&mut self);
    /// A drill's record could not be persisted; the session continues
    fn append_failed(&mut self, drill: &str, error: &Error);
    fn session_finished(&mut self, logged: usize);
}

/// Run a guided session over a resolved routine
///
/// Steps execute strictly in definition order and sets strictly in order
/// within a step; feedback for step *i* is collected and its entry handed to
/// the sink before step *i+1* starts counting down. A sink failure drops
/// that single drill's record, is reported through the notifier, and the
/// session continues to the next step. Returns the entries that were
/// successfully persisted, in emission order.
pub fn run_session<C, N, I, S>(
    routine: &RoutineDefinition,
    selector: Option<Selector>,
    date: NaiveDate,
    clock: &mut C,
    notifier: &mut N,
    input: &mut I,
    sink: &mut S,
) -> Result<Vec<LogEntry>>
where
    C: Clock,
    N: Notifier,
    I: InputProvider,
    S: LogSink,
{
    let mut ctx = SessionContext::new(routine.name.clone(), selector);
    notifier.session_started(&ctx.routine, ctx.selector.as_ref());
    tracing::info!(
        "Starting session '{}' ({} steps)",
        ctx.routine,
        routine.steps.len()
    );

    let mut logged = Vec::new();

    for (step_index, step) in routine.steps.iter().enumerate() {
        ctx.step_index = step_index;
        notifier.announce_step(step);
        tracing::debug!(
            "Step {}/{}: '{}' {} x {}s",
            step_index + 1,
            routine.steps.len(),
            step.name,
            step.sets,
            step.hold_s
        );

        for set in 1..=step.sets {
            ctx.set_index = set;
            notifier.set_started(set, step.sets, step.hold_s);
            countdown(clock, notifier, &format!("{} hold", step.name), step.hold_s);

            // No rest after the final set
            if set < step.sets && step.rest_s > 0 {
                countdown(clock, notifier, "rest", step.rest_s);
            }
        }

        // Exactly one feedback record per drill, not per set
        let feedback = feedback::collect(input, &step.name)?;
        let entry = LogEntry::from_drill(date, &ctx.routine, step, &feedback);

        match sink.append(&entry) {
            Ok(()) => {
                tracing::info!("Logged drill '{}'", step.name);
                logged.push(entry);
            }
            Err(e) => {
                tracing::error!("Failed to log drill '{}': {}", step.name, e);
                notifier.append_failed(&step.name, &e);
            }
        }
    }

    notifier.session_finished(logged.len());
    Ok(logged)
}

/// Best-effort countdown: one tick per remaining second from N down to 1,
/// then a single audible cue
fn countdown<C: Clock, N: Notifier>(clock: &mut C, notifier: &mut N, label: &str, seconds: u32) {
    for remaining in (1..=seconds).rev() {
        notifier.tick(label, remaining);
        clock.sleep_one_second();
    }
    notifier.cue();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::ScriptedInput;
    use crate::{FeedbackRecord, Side};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct FastClock {
        seconds_slept: u32,
    }

    impl FastClock {
        fn new() -> Self {
            Self { seconds_slept: 0 }
        }
    }

    impl Clock for FastClock {
        fn sleep_one_second(&mut self) {
            self.seconds_slept += 1;
        }
    }

    #[derive(Debug, PartialEq)]
    enum Event {
        Announce(String),
        SetStarted(u32, u32),
        Tick(String, u32),
        Cue,
        AppendFailed(String),
    }

    struct RecordingNotifier {
        events: Vec<Event>,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self { events: Vec::new() }
        }

        fn ticks_for(&self, label: &str) -> usize {
            self.events
                .iter()
                .filter(|e| matches!(e, Event::Tick(l, _) if l == label))
                .count()
        }

        fn cues(&self) -> usize {
            self.events.iter().filter(|e| matches!(e, Event::Cue)).count()
        }
    }

    impl Notifier for RecordingNotifier {
        fn session_started(&mut self, _routine: &str, _selector: Option<&Selector>) {}
        fn announce_step(&mut self, step: &Step) {
            self.events.push(Event::Announce(step.name.clone()));
        }
        fn set_started(&mut self, set: u32, sets: u32, _hold_s: u32) {
            self.events.push(Event::SetStarted(set, sets));
        }
        fn tick(&mut self, label: &str, remaining_s: u32) {
            self.events.push(Event::Tick(label.to_string(), remaining_s));
        }
        fn cue(&mut self) {
            self.events.push(Event::Cue);
        }
        fn append_failed(&mut self, drill: &str, _error: &Error) {
            self.events.push(Event::AppendFailed(drill.to_string()));
        }
        fn session_finished(&mut self, _logged: usize) {}
    }

    struct MemorySink {
        entries: Vec<LogEntry>,
    }

    impl LogSink for MemorySink {
        fn append(&mut self, entry: &LogEntry) -> Result<()> {
            self.entries.push(entry.clone());
            Ok(())
        }
    }

    struct FailingSink;

    impl LogSink for FailingSink {
        fn append(&mut self, _entry: &LogEntry) -> Result<()> {
            Err(Error::Storage("journal unavailable".to_string()))
        }
    }

    fn step(name: &str, hold_s: u32, sets: u32, rest_s: u32) -> Step {
        Step {
            name: name.into(),
            hold_s,
            cue: None,
            side: None,
            sets,
            rest_s,
            tags: vec![],
        }
    }

    fn routine(steps: Vec<Step>) -> RoutineDefinition {
        RoutineDefinition {
            name: "Split A".into(),
            steps,
            tags: vec![],
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    /// Empty answers everywhere a default exists, rating 6
    fn easy_feedback(drills: usize) -> ScriptedInput {
        let mut answers = Vec::new();
        for _ in 0..drills {
            answers.extend(["6", "", "", ""]);
        }
        ScriptedInput::new(answers)
    }

    #[test]
    fn test_three_sets_run_exactly_two_rests() {
        let routine = routine(vec![step("Lunge", 30, 3, 15)]);
        let mut clock = FastClock::new();
        let mut notifier = RecordingNotifier::new();
        let mut input = easy_feedback(1);
        let mut sink = MemorySink { entries: vec![] };

        run_session(
            &routine, None, date(), &mut clock, &mut notifier, &mut input, &mut sink,
        )
        .unwrap();

        assert_eq!(notifier.ticks_for("Lunge hold"), 3 * 30);
        assert_eq!(notifier.ticks_for("rest"), 2 * 15);
        // One cue per countdown: 3 holds + 2 rests
        assert_eq!(notifier.cues(), 5);
        assert_eq!(clock.seconds_slept, 3 * 30 + 2 * 15);
    }

    #[test]
    fn test_no_rest_countdown_when_rest_is_zero() {
        let routine = routine(vec![step("Pigeon", 10, 2, 0)]);
        let mut clock = FastClock::new();
        let mut notifier = RecordingNotifier::new();
        let mut input = easy_feedback(1);
        let mut sink = MemorySink { entries: vec![] };

        run_session(
            &routine, None, date(), &mut clock, &mut notifier, &mut input, &mut sink,
        )
        .unwrap();

        assert_eq!(notifier.ticks_for("rest"), 0);
        assert_eq!(notifier.cues(), 2);
    }

    #[test]
    fn test_single_drill_scenario_produces_one_entry() {
        let mut lunge = step("Lunge", 30, 2, 10);
        lunge.side = Some(Side::Left);
        let routine = routine(vec![lunge]);

        let mut clock = FastClock::new();
        let mut notifier = RecordingNotifier::new();
        let mut input = ScriptedInput::new(["6", "", "", ""]);
        let mut sink = MemorySink { entries: vec![] };

        let logged = run_session(
            &routine, None, date(), &mut clock, &mut notifier, &mut input, &mut sink,
        )
        .unwrap();

        assert_eq!(logged.len(), 1);
        let entry = &logged[0];
        assert_eq!(entry.plan, "Split A");
        assert_eq!(entry.drill, "Lunge");
        assert_eq!(entry.side, Some(Side::Left));
        assert_eq!(entry.hold_s, 30);
        assert_eq!(entry.sets, 2);
        assert_eq!(entry.rpe, 6);
        assert!(!entry.pain);
        assert!(entry.rom_cm.is_none());
        assert_eq!(sink.entries, logged);
    }

    #[test]
    fn test_invalid_rating_reprompts_then_proceeds() {
        let routine = routine(vec![step("Lunge", 5, 1, 0)]);
        let mut clock = FastClock::new();
        let mut notifier = RecordingNotifier::new();
        // Two bad ratings before a valid one
        let mut input = ScriptedInput::new(["eleven", "11", "6", "", "", ""]);
        let mut sink = MemorySink { entries: vec![] };

        let logged = run_session(
            &routine, None, date(), &mut clock, &mut notifier, &mut input, &mut sink,
        )
        .unwrap();

        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].rpe, 6);
    }

    #[test]
    fn test_append_failure_reports_and_continues() {
        let routine = routine(vec![step("Lunge", 2, 1, 0), step("Pigeon", 2, 1, 0)]);
        let mut clock = FastClock::new();
        let mut notifier = RecordingNotifier::new();
        let mut input = easy_feedback(2);
        let mut sink = FailingSink;

        let logged = run_session(
            &routine, None, date(), &mut clock, &mut notifier, &mut input, &mut sink,
        )
        .unwrap();

        assert!(logged.is_empty());
        let failures: Vec<_> = notifier
            .events
            .iter()
            .filter(|e| matches!(e, Event::AppendFailed(_)))
            .collect();
        assert_eq!(failures.len(), 2);
        // Both steps still ran their countdowns
        assert_eq!(notifier.ticks_for("Pigeon hold"), 2);
    }

    /// Notifier and sink sharing one trace, to pin down interleaving:
    /// step i's record must be emitted before step i+1 announces.
    struct TracingNotifier(Rc<RefCell<Vec<String>>>);
    struct TracingSink(Rc<RefCell<Vec<String>>>);

    impl Notifier for TracingNotifier {
        fn session_started(&mut self, _routine: &str, _selector: Option<&Selector>) {}
        fn announce_step(&mut self, step: &Step) {
            self.0.borrow_mut().push(format!("announce:{}", step.name));
        }
        fn set_started(&mut self, _set: u32, _sets: u32, _hold_s: u32) {}
        fn tick(&mut self, _label: &str, _remaining_s: u32) {}
        fn cue(&mut self) {}
        fn append_failed(&mut self, _drill: &str, _error: &Error) {}
        fn session_finished(&mut self, _logged: usize) {}
    }

    impl LogSink for TracingSink {
        fn append(&mut self, entry: &LogEntry) -> Result<()> {
            self.0.borrow_mut().push(format!("emit:{}", entry.drill));
            Ok(())
        }
    }

    #[test]
    fn test_feedback_and_emit_complete_before_next_step() {
        let trace = Rc::new(RefCell::new(Vec::new()));
        let routine = routine(vec![step("Lunge", 1, 1, 0), step("Pigeon", 1, 1, 0)]);

        let mut clock = FastClock::new();
        let mut notifier = TracingNotifier(Rc::clone(&trace));
        let mut input = easy_feedback(2);
        let mut sink = TracingSink(Rc::clone(&trace));

        run_session(
            &routine, None, date(), &mut clock, &mut notifier, &mut input, &mut sink,
        )
        .unwrap();

        assert_eq!(
            *trace.borrow(),
            vec![
                "announce:Lunge".to_string(),
                "emit:Lunge".to_string(),
                "announce:Pigeon".to_string(),
                "emit:Pigeon".to_string(),
            ]
        );
    }

    #[test]
    fn test_set_announcements_in_order() {
        let routine = routine(vec![step("Lunge", 1, 3, 0)]);
        let mut clock = FastClock::new();
        let mut notifier = RecordingNotifier::new();
        let mut input = easy_feedback(1);
        let mut sink = MemorySink { entries: vec![] };

        run_session(
            &routine, None, date(), &mut clock, &mut notifier, &mut input, &mut sink,
        )
        .unwrap();

        let sets: Vec<_> = notifier
            .events
            .iter()
            .filter_map(|e| match e {
                Event::SetStarted(set, sets) => Some((*set, *sets)),
                _ => None,
            })
            .collect();
        assert_eq!(sets, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_full_feedback_carried_into_entry() {
        let routine = routine(vec![step("Pancake", 20, 1, 0)]);
        let mut clock = FastClock::new();
        let mut notifier = RecordingNotifier::new();
        let mut input = ScriptedInput::new(["8", "y", "12.5", "deeper than last week"]);
        let mut sink = MemorySink { entries: vec![] };

        let logged = run_session(
            &routine, None, date(), &mut clock, &mut notifier, &mut input, &mut sink,
        )
        .unwrap();

        let expected = FeedbackRecord {
            rpe: 8,
            pain: true,
            rom_cm: Some(12.5),
            notes: Some("deeper than last week".to_string()),
        };
        assert_eq!(logged[0].rpe, expected.rpe);
        assert_eq!(logged[0].pain, expected.pain);
        assert_eq!(logged[0].rom_cm, expected.rom_cm);
        assert_eq!(logged[0].notes, expected.notes);
    }
}
