//! Round state store: per-agent transient and accumulated quantities plus
//! the episode scalars written by the payoff rules.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use contracts::{AgentId, Location, PersonaAction};

/// Simulated clock at episode start.
pub fn episode_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .expect("valid date")
        .and_hms_opt(1, 0, 0)
        .expect("valid time")
}

/// Mutable per-round quantities, owned and mutated exclusively by the
/// environment core. Initialized for every agent in the possible pool;
/// entries beyond the configured agent count are never visited.
#[derive(Debug, Clone)]
pub struct RoundState {
    pub num_agents: f64,
    pub collected_resource: BTreeMap<AgentId, f64>,
    pub last_collected_resource: BTreeMap<AgentId, i64>,
    pub chosen_action: BTreeMap<AgentId, f64>,
    pub round_payoff: BTreeMap<AgentId, f64>,
    pub acc_payoff: BTreeMap<AgentId, f64>,
    pub next_location: BTreeMap<AgentId, Location>,
    pub next_time: BTreeMap<AgentId, NaiveDateTime>,
    pub pending_action: BTreeMap<AgentId, PersonaAction>,
    /// Mean reported contribution of the latest pooling round (public-goods).
    pub mean_reported_earnings: f64,
    /// Whether every live agent defected in the latest round (matrix games).
    pub both_defect: bool,
}

impl RoundState {
    pub fn init(pool: &[AgentId], num_agents: usize) -> Self {
        let mut state = Self {
            num_agents: num_agents as f64,
            collected_resource: BTreeMap::new(),
            last_collected_resource: BTreeMap::new(),
            chosen_action: BTreeMap::new(),
            round_payoff: BTreeMap::new(),
            acc_payoff: BTreeMap::new(),
            next_location: BTreeMap::new(),
            next_time: BTreeMap::new(),
            pending_action: BTreeMap::new(),
            mean_reported_earnings: 0.0,
            both_defect: false,
        };
        for agent in pool {
            state.collected_resource.insert(agent.clone(), 0.0);
            state.last_collected_resource.insert(agent.clone(), 0);
            state.chosen_action.insert(agent.clone(), 0.0);
            state.round_payoff.insert(agent.clone(), 0.0);
            state.acc_payoff.insert(agent.clone(), 0.0);
            state.next_location.insert(agent.clone(), Location::Office);
            state.next_time.insert(agent.clone(), episode_start());
        }
        state
    }

    /// Record this round's generated input for an agent.
    pub fn credit_input(&mut self, agent: &AgentId, value: i64) {
        *self.collected_resource.entry(agent.clone()).or_default() += value as f64;
        self.last_collected_resource.insert(agent.clone(), value);
    }

    pub fn input(&self, agent: &AgentId) -> i64 {
        self.last_collected_resource.get(agent).copied().unwrap_or(0)
    }

    pub fn chosen(&self, agent: &AgentId) -> f64 {
        self.chosen_action.get(agent).copied().unwrap_or(0.0)
    }

    pub fn payoff(&self, agent: &AgentId) -> f64 {
        self.round_payoff.get(agent).copied().unwrap_or(0.0)
    }

    pub fn location(&self, agent: &AgentId) -> Location {
        self.next_location
            .get(agent)
            .copied()
            .unwrap_or(Location::Office)
    }

    pub fn time(&self, agent: &AgentId) -> NaiveDateTime {
        self.next_time
            .get(agent)
            .copied()
            .unwrap_or_else(episode_start)
    }

    /// Audit artifact of the agent's pending decision, if one was recorded.
    pub fn html_interactions(&self, agent: &AgentId) -> String {
        match self.pending_action.get(agent) {
            Some(PersonaAction::Choice {
                html_interactions, ..
            }) => html_interactions.clone(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::possible_agents;

    #[test]
    fn init_covers_the_whole_pool() {
        let pool = possible_agents();
        let state = RoundState::init(&pool, 2);
        assert_eq!(state.num_agents, 2.0);
        for agent in &pool {
            assert_eq!(state.input(agent), 0);
            assert_eq!(state.location(agent), Location::Office);
            assert_eq!(state.time(agent), episode_start());
        }
    }

    #[test]
    fn credit_input_accumulates_and_replaces_last() {
        let pool = possible_agents();
        let mut state = RoundState::init(&pool, 2);
        let agent = pool[0].clone();
        state.credit_input(&agent, 40);
        state.credit_input(&agent, 60);
        assert_eq!(state.input(&agent), 60);
        assert_eq!(state.collected_resource[&agent], 100.0);
    }
}
