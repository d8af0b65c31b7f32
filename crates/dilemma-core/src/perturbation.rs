//! One-shot scheduled perturbation of the input rules.

use contracts::{PerturbationKind, PerturbationSpec};

/// Which input band the generator draws from. `Low` is entered permanently
/// when the configured perturbation fires; `trigger_round` shifts the
/// per-round seed stream so replays stay reproducible mid-perturbation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Stochastic,
    Low { trigger_round: u64 },
}

impl InputMode {
    pub fn seed_offset(&self) -> u64 {
        match self {
            Self::Stochastic => 0,
            Self::Low { trigger_round } => *trigger_round,
        }
    }
}

/// Holds the (at most one) configured perturbation and fires it exactly once
/// when the round counter reaches the trigger. Absence is a no-op.
#[derive(Debug, Clone)]
pub struct PerturbationScheduler {
    spec: Option<PerturbationSpec>,
    applied: bool,
}

impl PerturbationScheduler {
    pub fn new(spec: Option<PerturbationSpec>) -> Self {
        Self {
            spec,
            applied: false,
        }
    }

    /// Check the trigger against the current round. On a match, swap the
    /// input mode and survival threshold in place. Permanent: there is no
    /// un-apply.
    pub fn apply(
        &mut self,
        round: u64,
        input_mode: &mut InputMode,
        min_payoff_to_survive: &mut Option<f64>,
    ) -> bool {
        let Some(spec) = &self.spec else {
            return false;
        };
        if self.applied || round != spec.round {
            return false;
        }
        match spec.kind {
            PerturbationKind::LowInputsSeason => {
                *input_mode = InputMode::Low {
                    trigger_round: spec.round,
                };
                *min_payoff_to_survive = Some(spec.min_payoff_to_survive);
            }
        }
        self.applied = true;
        tracing::info!(round, kind = ?spec.kind, "applying perturbation");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(round: u64) -> PerturbationSpec {
        PerturbationSpec {
            round,
            kind: PerturbationKind::LowInputsSeason,
            min_payoff_to_survive: 20.0,
        }
    }

    #[test]
    fn fires_only_on_the_configured_round() {
        let mut scheduler = PerturbationScheduler::new(Some(spec(3)));
        let mut mode = InputMode::Stochastic;
        let mut threshold = None;

        assert!(!scheduler.apply(2, &mut mode, &mut threshold));
        assert_eq!(mode, InputMode::Stochastic);

        assert!(scheduler.apply(3, &mut mode, &mut threshold));
        assert_eq!(mode, InputMode::Low { trigger_round: 3 });
        assert_eq!(threshold, Some(20.0));
    }

    #[test]
    fn fires_at_most_once() {
        let mut scheduler = PerturbationScheduler::new(Some(spec(0)));
        let mut mode = InputMode::Stochastic;
        let mut threshold = None;
        assert!(scheduler.apply(0, &mut mode, &mut threshold));
        assert!(!scheduler.apply(0, &mut mode, &mut threshold));
    }

    #[test]
    fn absent_spec_is_a_no_op() {
        let mut scheduler = PerturbationScheduler::new(None);
        let mut mode = InputMode::Stochastic;
        let mut threshold = Some(10.0);
        for round in 0..5 {
            assert!(!scheduler.apply(round, &mut mode, &mut threshold));
        }
        assert_eq!(mode, InputMode::Stochastic);
        assert_eq!(threshold, Some(10.0));
    }
}
