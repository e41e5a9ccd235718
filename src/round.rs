use tracing::{debug, trace};

use crate::error::GameError;
use crate::timer::{Countdown, PresentationTimer, RoundToken, TimerSlot, TimerStatus};

#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Correct,
    Wrong,
}

impl Outcome {
    pub fn from_bool(correct: bool) -> Self {
        if correct {
            Outcome::Correct
        } else {
            Outcome::Wrong
        }
    }

    pub fn is_correct(self) -> bool {
        self == Outcome::Correct
    }
}

/// Where a round currently is
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Showing,
    Input,
    Evaluated(Outcome),
}

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Transition {
    Begin,
    Reveal,
    Conclude(Outcome),
    Reset,
}

impl Phase {
    /// The round transition table. Anything not listed is rejected.
    pub fn apply(self, via: Transition) -> Result<Phase, GameError> {
        match (self, via) {
            (Phase::Idle | Phase::Evaluated(_), Transition::Begin) => Ok(Phase::Showing),
            (Phase::Showing, Transition::Reveal) => Ok(Phase::Input),
            (Phase::Input, Transition::Conclude(outcome)) => Ok(Phase::Evaluated(outcome)),
            (_, Transition::Reset) => Ok(Phase::Idle),
            (from, via) => Err(GameError::InvalidTransition { from, via }),
        }
    }

    pub fn outcome(self) -> Option<Outcome> {
        match self {
            Phase::Evaluated(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// An outcome stamped with the round that produced it
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub token: RoundToken,
    pub outcome: Outcome,
}

/// Something that happened to the round during a tick
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum RoundEvent {
    Nothing,
    InputOpened,
    DeadlineExpired,
}

/// Phase bookkeeping and the timers that belong to the current round.
///
/// Every way out of a phase goes through this type, so no timer can outlive
/// the phase that armed it.
#[derive(Debug, Default)]
pub struct Round {
    phase: Phase,
    token: RoundToken,
    presentation: TimerSlot<PresentationTimer>,
    deadline: TimerSlot<Countdown>,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Idle
    }
}

impl Round {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn token(&self) -> RoundToken {
        self.token
    }

    pub fn accepts_input(&self) -> bool {
        self.phase == Phase::Input
    }

    /// Abandons whatever is in flight and enters `Showing` with a fresh token
    pub fn begin(&mut self) -> Result<RoundToken, GameError> {
        self.cancel_timers();
        self.phase = self.phase.apply(Transition::Reset)?.apply(Transition::Begin)?;
        self.token = self.token.next();
        trace!(token = self.token.get(), "round started");
        Ok(self.token)
    }

    /// Arms the presentation timer for the current round
    pub fn present(&mut self, build: impl FnOnce(RoundToken) -> PresentationTimer) {
        self.presentation.arm(build(self.token));
    }

    /// Arms an input deadline for the current round
    pub fn set_deadline(&mut self, total_ms: u64) {
        self.deadline.arm(Countdown::new(self.token, total_ms));
    }

    pub fn open_input(&mut self) -> Result<(), GameError> {
        self.presentation.cancel();
        self.phase = self.phase.apply(Transition::Reveal)?;
        Ok(())
    }

    pub fn tick(&mut self, dt_ms: u64) -> Result<RoundEvent, GameError> {
        match self.phase {
            Phase::Showing => {
                if self.presentation.advance(dt_ms, self.token) == TimerStatus::Fired {
                    self.open_input()?;
                    return Ok(RoundEvent::InputOpened);
                }
            }
            Phase::Input => {
                if self.deadline.advance(dt_ms, self.token) == TimerStatus::Fired {
                    return Ok(RoundEvent::DeadlineExpired);
                }
            }
            Phase::Idle | Phase::Evaluated(_) => {}
        }
        Ok(RoundEvent::Nothing)
    }

    pub fn conclude(&mut self, outcome: Outcome) -> Result<Verdict, GameError> {
        self.phase = self.phase.apply(Transition::Conclude(outcome))?;
        self.cancel_timers();
        debug!(token = self.token.get(), ?outcome, "round concluded");
        Ok(Verdict {
            token: self.token,
            outcome,
        })
    }

    pub fn reset(&mut self) {
        self.cancel_timers();
        self.phase = Phase::Idle;
    }

    pub fn presentation(&self) -> Option<&PresentationTimer> {
        self.presentation.get()
    }

    pub fn deadline(&self) -> Option<&Countdown> {
        self.deadline.get()
    }

    pub fn has_pending_timer(&self) -> bool {
        self.presentation.is_armed() || self.deadline.is_armed()
    }

    fn cancel_timers(&mut self) {
        self.presentation.cancel();
        self.deadline.cancel();
    }
}

/// Receives the single outcome of each round
pub trait RoundListener {
    fn on_correct(&mut self);
    fn on_wrong(&mut self);
}

/// Forwards verdicts to a listener, at most once per round
#[derive(Debug, Default)]
pub struct OutcomeReporter {
    last_reported: Option<RoundToken>,
}

impl OutcomeReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the verdict is stale or its round already reported
    pub fn report(
        &mut self,
        current: RoundToken,
        verdict: Verdict,
        listener: &mut dyn RoundListener,
    ) -> bool {
        if verdict.token != current {
            debug!(
                stale = verdict.token.get(),
                current = current.get(),
                "ignoring verdict from an earlier round"
            );
            return false;
        }
        if self.last_reported == Some(current) {
            debug!(token = current.get(), "round already reported");
            return false;
        }
        self.last_reported = Some(current);
        match verdict.outcome {
            Outcome::Correct => listener.on_correct(),
            Outcome::Wrong => listener.on_wrong(),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[derive(Default)]
    struct Tally {
        correct: u32,
        wrong: u32,
    }

    impl RoundListener for Tally {
        fn on_correct(&mut self) {
            self.correct += 1;
        }

        fn on_wrong(&mut self) {
            self.wrong += 1;
        }
    }

    #[test]
    fn transition_table_accepts_the_linear_path() {
        let phase = Phase::Idle
            .apply(Transition::Begin)
            .and_then(|p| p.apply(Transition::Reveal))
            .and_then(|p| p.apply(Transition::Conclude(Outcome::Correct)))
            .unwrap();
        assert_eq!(phase, Phase::Evaluated(Outcome::Correct));
        assert_eq!(phase.apply(Transition::Begin).unwrap(), Phase::Showing);
    }

    #[test]
    fn transition_table_rejects_going_backwards() {
        let rejected = [
            (Phase::Idle, Transition::Reveal),
            (Phase::Idle, Transition::Conclude(Outcome::Wrong)),
            (Phase::Showing, Transition::Begin),
            (Phase::Showing, Transition::Conclude(Outcome::Correct)),
            (Phase::Input, Transition::Begin),
            (Phase::Input, Transition::Reveal),
            (Phase::Evaluated(Outcome::Wrong), Transition::Reveal),
            (
                Phase::Evaluated(Outcome::Wrong),
                Transition::Conclude(Outcome::Correct),
            ),
        ];
        for (from, via) in rejected {
            assert_matches!(
                from.apply(via),
                Err(GameError::InvalidTransition { .. }),
                "{from:?} via {via:?}"
            );
        }
    }

    #[test]
    fn reset_is_always_allowed() {
        for phase in [
            Phase::Idle,
            Phase::Showing,
            Phase::Input,
            Phase::Evaluated(Outcome::Correct),
        ] {
            assert_eq!(phase.apply(Transition::Reset).unwrap(), Phase::Idle);
        }
    }

    #[test]
    fn presentation_opens_input_once() {
        let mut round = Round::new();
        round.begin().unwrap();
        round.present(|token| PresentationTimer::single(token, 200));
        assert_eq!(round.tick(100).unwrap(), RoundEvent::Nothing);
        assert_eq!(round.tick(100).unwrap(), RoundEvent::InputOpened);
        assert!(round.accepts_input());
        assert_eq!(round.tick(10_000).unwrap(), RoundEvent::Nothing);
    }

    #[test]
    fn new_round_cancels_pending_presentation() {
        let mut round = Round::new();
        let first = round.begin().unwrap();
        round.present(|token| PresentationTimer::single(token, 200));
        let second = round.begin().unwrap();
        assert_ne!(first, second);
        assert!(!round.has_pending_timer());
        // nothing armed for the new round, so the old deadline cannot fire
        assert_eq!(round.tick(1_000).unwrap(), RoundEvent::Nothing);
        assert_eq!(round.phase(), Phase::Showing);
    }

    #[test]
    fn conclude_releases_deadline() {
        let mut round = Round::new();
        round.begin().unwrap();
        round.open_input().unwrap();
        round.set_deadline(500);
        round.conclude(Outcome::Correct).unwrap();
        assert!(!round.has_pending_timer());
        assert_eq!(round.tick(1_000).unwrap(), RoundEvent::Nothing);
    }

    #[test]
    fn deadline_expires_in_input_phase() {
        let mut round = Round::new();
        round.begin().unwrap();
        round.open_input().unwrap();
        round.set_deadline(300);
        assert_eq!(round.tick(299).unwrap(), RoundEvent::Nothing);
        assert_eq!(round.tick(1).unwrap(), RoundEvent::DeadlineExpired);
    }

    #[test]
    fn concluding_twice_is_rejected() {
        let mut round = Round::new();
        round.begin().unwrap();
        round.open_input().unwrap();
        round.conclude(Outcome::Wrong).unwrap();
        assert!(round.conclude(Outcome::Correct).is_err());
    }

    #[test]
    fn reporter_fires_once_per_round() {
        let mut tally = Tally::default();
        let mut reporter = OutcomeReporter::new();
        let token = RoundToken::default().next();
        let verdict = Verdict {
            token,
            outcome: Outcome::Correct,
        };
        assert!(reporter.report(token, verdict, &mut tally));
        assert!(!reporter.report(token, verdict, &mut tally));
        assert_eq!(tally.correct, 1);
        assert_eq!(tally.wrong, 0);
    }

    #[test]
    fn reporter_ignores_stale_verdicts() {
        let mut tally = Tally::default();
        let mut reporter = OutcomeReporter::new();
        let old = RoundToken::default().next();
        let current = old.next();
        let stale = Verdict {
            token: old,
            outcome: Outcome::Wrong,
        };
        assert!(!reporter.report(current, stale, &mut tally));
        assert_eq!(tally.wrong, 0);
    }
}
