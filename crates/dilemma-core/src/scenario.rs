//! Scenario rules: input generation, payoff assignment, survival predicates,
//! and the narrative report builders, selected once at setup.
//!
//! Each game kind carries its numeric constants; narratives only change the
//! wording of the reports. The kernel drives these hooks and never branches
//! on the configured scenario name itself.

use std::collections::BTreeMap;

use contracts::{
    parse_scenario_name, AgentId, ConfigError, EpisodeConfig, Narrative, RoundLogRecord,
    ScenarioKind,
};
use rand::Rng;

use crate::narrative;
use crate::perturbation::InputMode;
use crate::rng::round_rng;
use crate::state::RoundState;

/// Log tag for a decision row.
const CHOOSE_ACTION: &str = "choose_action";

/// A game's rules, fixed for the episode.
#[derive(Debug, Clone)]
pub struct Scenario {
    kind: ScenarioKind,
    narrative: Narrative,
    suckers_payoff_factor: f64,
}

impl Scenario {
    pub fn from_config(config: &EpisodeConfig) -> Result<Self, ConfigError> {
        let (kind, narrative) = parse_scenario_name(&config.scenario)?;
        let suckers_payoff_factor = match kind {
            ScenarioKind::Prisoner | ScenarioKind::Chicken => 0.25,
            // A lone stag hunter comes home with nothing.
            ScenarioKind::StagHunt => 0.0,
            ScenarioKind::PublicGoods => 0.0,
        };
        Ok(Self {
            kind,
            narrative,
            suckers_payoff_factor,
        })
    }

    pub fn kind(&self) -> ScenarioKind {
        self.kind
    }

    pub fn narrative(&self) -> Narrative {
        self.narrative
    }

    pub fn suckers_payoff_factor(&self) -> f64 {
        self.suckers_payoff_factor
    }

    // -----------------------------------------------------------------------
    // Input generation
    // -----------------------------------------------------------------------

    /// Half-open `[lo, hi)` band the round inputs are drawn from.
    fn input_band(
        &self,
        config: &EpisodeConfig,
        mode: InputMode,
        min_payoff_to_survive: Option<f64>,
    ) -> (i64, i64) {
        match mode {
            InputMode::Stochastic => (config.min_input, config.max_input + 1),
            InputMode::Low { .. } => {
                let threshold = min_payoff_to_survive.unwrap_or(0.0);
                match self.kind {
                    ScenarioKind::PublicGoods => (threshold.floor() as i64, config.min_input),
                    ScenarioKind::Prisoner | ScenarioKind::Chicken => (
                        config.defect_base as i64 + 1,
                        ((1.0 / self.suckers_payoff_factor) * threshold) as i64 - 1,
                    ),
                    // With a zero sucker factor a lone cooperator earns 0 at
                    // any input level, so the cooperator-cannot-survive cap
                    // is unbounded and the band keeps its configured top.
                    ScenarioKind::StagHunt => (config.min_input, config.max_input + 1),
                }
            }
        }
    }

    /// Draw this round's inputs: per-agent for public-goods (which also
    /// credits rewards), one shared draw for the matrix games.
    #[allow(clippy::too_many_arguments)]
    pub fn generate_inputs(
        &self,
        config: &EpisodeConfig,
        mode: InputMode,
        min_payoff_to_survive: Option<f64>,
        round: u64,
        state: &mut RoundState,
        live: &[AgentId],
        rewards: &mut BTreeMap<AgentId, f64>,
    ) {
        let (lo, hi) = self.input_band(config, mode, min_payoff_to_survive);
        let hi = hi.max(lo + 1);
        let mut rng = round_rng(config.seed, round, mode.seed_offset());
        match self.kind {
            ScenarioKind::PublicGoods => {
                for agent in live {
                    let value = rng.gen_range(lo..hi);
                    state.credit_input(agent, value);
                    *rewards.entry(agent.clone()).or_default() += value as f64;
                }
            }
            _ => {
                let value = rng.gen_range(lo..hi);
                for agent in live {
                    state.credit_input(agent, value);
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Payoff assignment
    // -----------------------------------------------------------------------

    /// Compute every live agent's round payoff from all chosen actions.
    /// One-shot per round, invoked after the last decision of the phase.
    pub fn assign_payoffs(
        &self,
        config: &EpisodeConfig,
        state: &mut RoundState,
        live: &[AgentId],
        rewards: &mut BTreeMap<AgentId, f64>,
        round: u64,
        log: &mut Vec<RoundLogRecord>,
    ) {
        match self.kind {
            ScenarioKind::PublicGoods => self.assign_pooled(state, live, rewards, round, log),
            _ => self.assign_matrix(config, state, live, rewards, round, log),
        }
    }

    fn assign_pooled(
        &self,
        state: &mut RoundState,
        live: &[AgentId],
        rewards: &mut BTreeMap<AgentId, f64>,
        round: u64,
        log: &mut Vec<RoundLogRecord>,
    ) {
        let mean = live.iter().map(|agent| state.chosen(agent)).sum::<f64>() / live.len() as f64;
        state.mean_reported_earnings = mean;

        for agent in live {
            let reported = state.chosen(agent);
            let net = mean - reported;
            let endowment = state.input(agent);
            let total_payoff = endowment as f64 + net;

            log.push(RoundLogRecord {
                agent_id: agent.clone(),
                round,
                action: CHOOSE_ACTION.to_string(),
                round_input_value: endowment,
                chosen_action: reported,
                round_payoff: total_payoff,
                html_interactions: state.html_interactions(agent),
            });

            *state.collected_resource.entry(agent.clone()).or_default() += net;
            *state.acc_payoff.entry(agent.clone()).or_default() += total_payoff;
            state.round_payoff.insert(agent.clone(), total_payoff);
            *rewards.entry(agent.clone()).or_default() += net;
        }
    }

    fn assign_matrix(
        &self,
        config: &EpisodeConfig,
        state: &mut RoundState,
        live: &[AgentId],
        rewards: &mut BTreeMap<AgentId, f64>,
        round: u64,
        log: &mut Vec<RoundLogRecord>,
    ) {
        // Actions are 1 (cooperate) or 2 (defect); the round input is shared.
        let input = state.input(&live[0]);
        let action_sum: f64 = live.iter().map(|agent| state.chosen(agent)).sum();
        let n = live.len() as f64;
        let both_defect = action_sum == 2.0 * n;

        let mut equal_split = false;
        let mut pot = input as f64;
        if both_defect {
            equal_split = true;
            pot = match self.kind {
                ScenarioKind::StagHunt => input as f64 / config.defect_base,
                _ => config.defect_base,
            };
        } else if action_sum == n {
            equal_split = true;
        }
        state.both_defect = both_defect;

        for agent in live {
            let payoff = if equal_split {
                pot / n
            } else if state.chosen(agent) == 1.0 {
                self.suckers_payoff_factor * input as f64
            } else {
                (1.0 - self.suckers_payoff_factor) * input as f64
            };

            log.push(RoundLogRecord {
                agent_id: agent.clone(),
                round,
                action: CHOOSE_ACTION.to_string(),
                round_input_value: input,
                chosen_action: state.chosen(agent),
                round_payoff: payoff,
                html_interactions: state.html_interactions(agent),
            });

            *state.acc_payoff.entry(agent.clone()).or_default() += payoff;
            state.round_payoff.insert(agent.clone(), payoff);
            *rewards.entry(agent.clone()).or_default() += payoff;
        }
    }

    // -----------------------------------------------------------------------
    // Survival
    // -----------------------------------------------------------------------

    /// Whether the agent failed to clear the survival threshold this round.
    /// A `None` threshold disables elimination entirely.
    pub fn agent_no_survival(
        &self,
        state: &RoundState,
        agent: &AgentId,
        min_payoff_to_survive: Option<f64>,
    ) -> bool {
        let Some(threshold) = min_payoff_to_survive else {
            return false;
        };
        match self.kind {
            ScenarioKind::PublicGoods => {
                let total = state.input(agent) as f64 - state.chosen(agent)
                    + state.mean_reported_earnings;
                total < threshold
            }
            _ => state.payoff(agent) < threshold,
        }
    }

    // -----------------------------------------------------------------------
    // Narrative reports
    // -----------------------------------------------------------------------

    fn display_name<'a>(names: &'a BTreeMap<AgentId, String>, agent: &'a AgentId) -> &'a str {
        names.get(agent).map(String::as_str).unwrap_or(agent)
    }

    /// The payoff report surfaced to `agent` after a round.
    pub fn prompt_round_payoffs(
        &self,
        config: &EpisodeConfig,
        state: &RoundState,
        live: &[AgentId],
        names: &BTreeMap<AgentId, String>,
        agent: &AgentId,
        min_payoff_to_survive: Option<f64>,
    ) -> String {
        let agent_name = Self::display_name(names, agent);
        match self.kind {
            ScenarioKind::PublicGoods => {
                let others: Vec<(String, f64)> = live
                    .iter()
                    .filter(|other| *other != agent)
                    .map(|other| {
                        (
                            Self::display_name(names, other).to_string(),
                            state.chosen(other),
                        )
                    })
                    .collect();
                narrative::public_goods_round_payoffs(
                    self.narrative,
                    state.chosen(agent),
                    state.payoff(agent),
                    state.mean_reported_earnings,
                    state.input(agent),
                    &others,
                    agent_name,
                    min_payoff_to_survive,
                )
            }
            ScenarioKind::Prisoner => narrative::prisoner_round_payoffs(
                self.narrative,
                state.chosen(agent),
                state.payoff(agent),
                state.both_defect,
                state.input(agent),
                agent_name,
                min_payoff_to_survive,
                config.defect_base,
            ),
            ScenarioKind::StagHunt => {
                let all_actions: Vec<(String, f64)> = live
                    .iter()
                    .map(|other| {
                        (
                            Self::display_name(names, other).to_string(),
                            state.chosen(other),
                        )
                    })
                    .collect();
                narrative::stag_hunt_round_payoffs(
                    &all_actions,
                    agent_name,
                    state.payoff(agent),
                    state.input(agent),
                    min_payoff_to_survive,
                )
            }
            ScenarioKind::Chicken => narrative::chicken_round_payoffs(
                state.chosen(agent),
                state.payoff(agent),
                state.both_defect,
                state.input(agent),
                agent_name,
                min_payoff_to_survive,
                config.defect_base,
            ),
        }
    }

    /// The opponent/competitor report surfaced to every agent after a round.
    /// Stag-hunt publishes none.
    pub fn prompt_opponent_action_report(
        &self,
        state: &RoundState,
        live: &[AgentId],
        names: &BTreeMap<AgentId, String>,
    ) -> Option<String> {
        match self.kind {
            ScenarioKind::PublicGoods => {
                let endowments: Vec<(String, i64)> = live
                    .iter()
                    .map(|agent| {
                        (
                            Self::display_name(names, agent).to_string(),
                            state.input(agent),
                        )
                    })
                    .collect();
                Some(narrative::public_goods_opponent_report(
                    self.narrative,
                    &endowments,
                ))
            }
            ScenarioKind::Prisoner => {
                let actions: Vec<(String, f64)> = live
                    .iter()
                    .map(|agent| {
                        (
                            Self::display_name(names, agent).to_string(),
                            state.chosen(agent),
                        )
                    })
                    .collect();
                Some(narrative::prisoner_opponent_report(self.narrative, &actions))
            }
            ScenarioKind::StagHunt => None,
            ScenarioKind::Chicken => {
                let actions: Vec<(String, f64)> = live
                    .iter()
                    .map(|agent| {
                        (
                            Self::display_name(names, agent).to_string(),
                            state.chosen(agent),
                        )
                    })
                    .collect();
                Some(narrative::chicken_opponent_report(&actions))
            }
        }
    }

    /// Decision-phase framing. Empty for everything except stag-hunt, which
    /// carries the round input and (optionally) the universalization matrix.
    pub fn prompt_universalization(
        &self,
        config: &EpisodeConfig,
        state: &RoundState,
        agent: &AgentId,
    ) -> String {
        match self.kind {
            ScenarioKind::StagHunt => narrative::stag_hunt_universalization(
                config.inject_universalization,
                state.input(agent),
                1.0 / config.defect_base,
                self.suckers_payoff_factor,
            ),
            _ => String::new(),
        }
    }
}
