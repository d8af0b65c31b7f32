//! Persona collaborator boundary.
//!
//! The kernel never decides for an agent: it yields observations and
//! consumes actions through the [`Persona`] trait. Model-driven personas
//! live outside this crate (the call may block on inference; any timeout
//! policy belongs to the caller). [`DummyPersona`] is the scripted variant
//! used as a fixed opponent and by the CLI driver.

use std::collections::BTreeMap;

use contracts::{
    ActionObs, ActorKind, AgentId, ConfigError, DummyStrategy, EpisodeConfig, Location,
    PersonaAction, Phase, ScenarioKind, TrajectorySpec,
};

use crate::scenario::Scenario;

/// A decision-maker for one agent: observation in, action out.
pub trait Persona {
    fn act(&mut self, obs: &ActionObs) -> PersonaAction;
}

/// How a trajectory value maps onto a decision quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionMode {
    /// Public goods: the value is a fraction of this round's endowment.
    FractionOfInput,
    /// Matrix games: the value is the option number itself (1 or 2).
    OptionValue,
}

/// A scripted persona following a fixed per-round trajectory.
#[derive(Debug, Clone)]
pub struct DummyPersona {
    agent_id: AgentId,
    mode: ActionMode,
    trajectory: Vec<f64>,
    current_round: usize,
}

impl DummyPersona {
    pub fn new(
        agent_id: AgentId,
        kind: ScenarioKind,
        spec: &TrajectorySpec,
        max_num_rounds: u64,
    ) -> Result<Self, ConfigError> {
        let rounds = max_num_rounds as usize;
        let trajectory = match spec {
            TrajectorySpec::Explicit(actions) => {
                if actions.len() != rounds {
                    return Err(ConfigError::TrajectoryLength {
                        agent: agent_id,
                        expected: max_num_rounds,
                        actual: actions.len() as u64,
                    });
                }
                actions.clone()
            }
            TrajectorySpec::Strategy(strategy) => match (kind, strategy) {
                (ScenarioKind::PublicGoods, DummyStrategy::Cooperate) => vec![1.0; rounds],
                (ScenarioKind::PublicGoods, DummyStrategy::Defect) => vec![0.0; rounds],
                (ScenarioKind::PublicGoods, DummyStrategy::Worsening) => worsening(rounds),
                (_, DummyStrategy::Cooperate) => vec![1.0; rounds],
                (_, DummyStrategy::Defect) => vec![2.0; rounds],
                (_, DummyStrategy::Worsening) => {
                    return Err(ConfigError::UnsupportedStrategy {
                        scenario: kind.to_string(),
                        strategy: "worsening".to_string(),
                    })
                }
            },
        };
        let mode = match kind {
            ScenarioKind::PublicGoods => ActionMode::FractionOfInput,
            _ => ActionMode::OptionValue,
        };
        Ok(Self {
            agent_id,
            mode,
            trajectory,
            current_round: 0,
        })
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }
}

/// Cooperate fully for a third of the episode, halve the contribution
/// briefly, then freeload for the rest.
fn worsening(rounds: usize) -> Vec<f64> {
    let stage = rounds / 3;
    let mut trajectory = vec![1.0; stage];
    trajectory.extend(std::iter::repeat(0.5).take(stage / 2));
    trajectory.extend(std::iter::repeat(0.0).take(stage * 3 / 2));
    while trajectory.len() < rounds {
        trajectory.push(0.0);
    }
    trajectory
}

impl Persona for DummyPersona {
    fn act(&mut self, obs: &ActionObs) -> PersonaAction {
        if obs.phase == Phase::Decision && obs.current_location == Location::Office {
            let input = obs
                .agent_resource_num
                .get(&self.agent_id)
                .copied()
                .unwrap_or(0);
            let value = self
                .trajectory
                .get(self.current_round)
                .copied()
                .unwrap_or(0.0);
            self.current_round += 1;
            let quantity = match self.mode {
                ActionMode::FractionOfInput => (value * input as f64).trunc(),
                ActionMode::OptionValue => value,
            };
            let mut stats = BTreeMap::new();
            stats.insert(format!("{}_input_value", self.agent_id), input as f64);
            stats.insert(format!("{}_chosen_action", self.agent_id), quantity);
            PersonaAction::Choice {
                agent_id: self.agent_id.clone(),
                kind: ActorKind::Dummy,
                location: Location::Office,
                quantity,
                stats,
                html_interactions: quantity.to_string(),
            }
        } else {
            PersonaAction::Transition {
                agent_id: self.agent_id.clone(),
                kind: ActorKind::Dummy,
                location: obs.current_location,
            }
        }
    }
}

/// Build a scripted persona for every configured live agent. Fails when an
/// agent is model-driven: this builder only serves drivers that run without
/// external inference.
pub fn scripted_personas(
    config: &EpisodeConfig,
) -> Result<BTreeMap<AgentId, Box<dyn Persona>>, ConfigError> {
    let scenario = Scenario::from_config(config)?;
    let mut personas: BTreeMap<AgentId, Box<dyn Persona>> = BTreeMap::new();
    for i in 0..config.num_agents {
        let agent_id = format!("persona_{i}");
        let persona = config
            .personas
            .get(&agent_id)
            .ok_or(ConfigError::MissingPersona(agent_id.clone()))?;
        let spec = persona
            .actions
            .as_ref()
            .ok_or(ConfigError::ModelDrivenPersona(agent_id.clone()))?;
        personas.insert(
            agent_id.clone(),
            Box::new(DummyPersona::new(
                agent_id,
                scenario.kind(),
                spec,
                config.max_num_rounds,
            )?),
        );
    }
    Ok(personas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn decision_obs(agent: &str, input: i64) -> ActionObs {
        let mut agent_resource_num = BTreeMap::new();
        agent_resource_num.insert(agent.to_string(), input);
        ActionObs {
            phase: Phase::Decision,
            current_location: Location::Office,
            current_location_agents: BTreeMap::new(),
            current_time: NaiveDate::from_ymd_opt(2024, 1, 1)
                .expect("date")
                .and_hms_opt(1, 0, 0)
                .expect("time"),
            events: Vec::new(),
            context: String::new(),
            agent_resource_num,
        }
    }

    #[test]
    fn fraction_mode_scales_the_endowment() {
        let mut persona = DummyPersona::new(
            "persona_0".to_string(),
            ScenarioKind::PublicGoods,
            &TrajectorySpec::Explicit(vec![1.0, 0.5, 0.0]),
            3,
        )
        .expect("persona");

        for expected in [80.0, 40.0, 0.0] {
            let action = persona.act(&decision_obs("persona_0", 80));
            let PersonaAction::Choice { quantity, stats, .. } = action else {
                panic!("decision phase must yield a choice");
            };
            assert_eq!(quantity, expected);
            assert_eq!(stats["persona_0_input_value"], 80.0);
        }
    }

    #[test]
    fn option_mode_passes_the_value_through() {
        let mut persona = DummyPersona::new(
            "persona_0".to_string(),
            ScenarioKind::Prisoner,
            &TrajectorySpec::Strategy(DummyStrategy::Defect),
            4,
        )
        .expect("persona");
        let action = persona.act(&decision_obs("persona_0", 100));
        let PersonaAction::Choice { quantity, .. } = action else {
            panic!("decision phase must yield a choice");
        };
        assert_eq!(quantity, 2.0);
    }

    #[test]
    fn non_decision_phases_yield_transitions() {
        let mut persona = DummyPersona::new(
            "persona_0".to_string(),
            ScenarioKind::Prisoner,
            &TrajectorySpec::Strategy(DummyStrategy::Cooperate),
            4,
        )
        .expect("persona");
        let mut obs = decision_obs("persona_0", 100);
        obs.phase = Phase::Home;
        obs.current_location = Location::Home;
        let action = persona.act(&obs);
        assert_eq!(
            action,
            PersonaAction::Transition {
                agent_id: "persona_0".to_string(),
                kind: ActorKind::Dummy,
                location: Location::Home,
            }
        );
    }

    #[test]
    fn worsening_fills_the_whole_episode() {
        let trajectory = worsening(10);
        assert_eq!(trajectory.len(), 10);
        assert_eq!(&trajectory[..3], &[1.0, 1.0, 1.0]);
        assert_eq!(trajectory[3], 0.5);
        assert!(trajectory[4..].iter().all(|value| *value == 0.0));
    }

    #[test]
    fn worsening_is_rejected_for_matrix_games() {
        let result = DummyPersona::new(
            "persona_0".to_string(),
            ScenarioKind::StagHunt,
            &TrajectorySpec::Strategy(DummyStrategy::Worsening),
            4,
        );
        assert!(matches!(
            result,
            Err(ConfigError::UnsupportedStrategy { .. })
        ));
    }

    #[test]
    fn explicit_trajectory_must_match_round_count() {
        let result = DummyPersona::new(
            "persona_0".to_string(),
            ScenarioKind::PublicGoods,
            &TrajectorySpec::Explicit(vec![1.0]),
            4,
        );
        assert!(matches!(result, Err(ConfigError::TrajectoryLength { .. })));
    }
}
