use chrono::Duration;
use contracts::{
    ActorKind, Location, PersonaAction, Phase, Terminations, MIN_LIVE_AGENTS,
};

use super::{DilemmaEnv, EnvError, StepResult};

impl DilemmaEnv {
    /// Consume the current agent's action, mutate state, advance the
    /// cursors, and yield the next agent's observation.
    ///
    /// Malformed actions (wrong agent, wrong location, wrong type for the
    /// phase) fail immediately; they indicate a driver bug and are never
    /// retried or corrected.
    pub fn step(&mut self, action: &PersonaAction) -> Result<StepResult, EnvError> {
        if self.agent_selection.is_empty() {
            return Err(EnvError::NotReset);
        }
        if self.terminations.any() {
            return Err(EnvError::EpisodeOver);
        }
        if action.agent_id() != &self.agent_selection {
            return Err(EnvError::WrongAgent {
                expected: self.agent_selection.clone(),
                got: action.agent_id().clone(),
            });
        }

        match self.phase {
            Phase::Decision => {
                self.require_location(action, Location::Office)?;
                let PersonaAction::Choice { quantity, .. } = action else {
                    return Err(EnvError::ChoiceRequired { phase: self.phase });
                };
                self.step_decision(action.clone(), *quantity);
            }
            Phase::PostRoundReport => {
                self.require_location(action, Location::Office)?;
                self.step_post_round_report();
            }
            Phase::Home => {
                self.require_location(action, Location::Home)?;
                self.step_home(action)?;
            }
        }

        Ok(StepResult {
            agent_id: self.agent_selection.clone(),
            observation: self.observe_current(),
            rewards: self.rewards.clone(),
            terminations: self.terminations,
        })
    }

    fn require_location(
        &self,
        action: &PersonaAction,
        expected: Location,
    ) -> Result<(), EnvError> {
        if action.location() != expected {
            return Err(EnvError::WrongLocation {
                phase: self.phase,
                expected,
                got: action.location(),
            });
        }
        Ok(())
    }

    fn step_decision(&mut self, action: PersonaAction, quantity: f64) {
        let agent = self.agent_selection.clone();
        self.state.chosen_action.insert(agent.clone(), quantity);
        self.state.pending_action.insert(agent.clone(), action);
        self.state
            .next_location
            .insert(agent.clone(), Location::Office);

        if self.agent_selector.is_last() {
            let live = self.agent_selector.members().to_vec();
            self.scenario.assign_payoffs(
                &self.config,
                &mut self.state,
                &live,
                &mut self.rewards,
                self.num_round,
                &mut self.log,
            );
            self.phase = *self.phase_selector.advance();
        }
        self.agent_selection = self.agent_selector.advance().clone();
    }

    fn step_post_round_report(&mut self) {
        let agent = self.agent_selection.clone();
        self.state
            .next_location
            .insert(agent.clone(), Location::Home);
        let now = self.state.time(&agent);
        self.state
            .next_time
            .insert(agent.clone(), super::observe::reflection_day(now));

        if self.agent_selector.is_last() {
            self.phase = *self.phase_selector.advance();
        }
        self.agent_selection = self.agent_selector.advance().clone();
    }

    fn step_home(&mut self, action: &PersonaAction) -> Result<(), EnvError> {
        let agent = self.agent_selection.clone();
        self.state
            .next_location
            .insert(agent.clone(), Location::Office);
        let now = self.state.time(&agent);
        self.state
            .next_time
            .insert(agent.clone(), now + Duration::days(1));

        // Survival is evaluated for model-driven actors only.
        if action.kind() != ActorKind::Dummy
            && self
                .scenario
                .agent_no_survival(&self.state, &agent, self.min_payoff_to_survive)
        {
            if self.agent_selector.len() == 1 {
                tracing::info!(%agent, "combined input too low, no agent survived");
            } else {
                self.agent_selector.remove_and_resync(&agent)?;
                tracing::info!(%agent, round = self.num_round, "agent eliminated");
            }
        }

        if self.agent_selector.is_last() {
            self.save_log()?;
            self.num_round += 1;
            self.apply_perturbations();
            self.phase = *self.phase_selector.advance();
            self.terminations = Terminations {
                min_agents: self.agent_selector.len() < MIN_LIVE_AGENTS,
                max_rounds: self.num_round >= self.config.max_num_rounds,
            };
        }
        self.agent_selection = self.agent_selector.advance().clone();
        Ok(())
    }
}
