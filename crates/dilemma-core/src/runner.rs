//! Episode driver: the reset/step loop between the environment and a set of
//! personas, stopping at the first observed termination flag.

use std::collections::BTreeMap;

use contracts::{AgentId, Terminations};

use crate::env::{DilemmaEnv, EnvError};
use crate::persona::Persona;

/// What an episode left behind.
#[derive(Debug, Clone)]
pub struct EpisodeSummary {
    pub rounds_played: u64,
    pub survivors: Vec<AgentId>,
    pub acc_payoffs: BTreeMap<AgentId, f64>,
    pub terminations: Terminations,
}

/// Run one episode to termination. Personas must cover every live agent;
/// the environment log is flushed a final time before returning.
pub fn run_episode(
    env: &mut DilemmaEnv,
    personas: &mut BTreeMap<AgentId, Box<dyn Persona>>,
) -> Result<EpisodeSummary, EnvError> {
    let (mut agent_id, mut observation) = env.reset()?;
    loop {
        let persona = personas
            .get_mut(&agent_id)
            .ok_or_else(|| EnvError::UnknownPersona(agent_id.clone()))?;
        let action = persona.act(&observation);
        let step = env.step(&action)?;
        if step.terminations.any() {
            break;
        }
        agent_id = step.agent_id;
        observation = step.observation;
    }
    env.save_log()?;

    let summary = EpisodeSummary {
        rounds_played: env.num_round(),
        survivors: env.live_agents().to_vec(),
        acc_payoffs: env.acc_payoffs(),
        terminations: env.terminations(),
    };
    tracing::info!(
        rounds = summary.rounds_played,
        survivors = summary.survivors.len(),
        "episode finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::scripted_personas;
    use contracts::{DummyStrategy, EpisodeConfig, PersonaConfig, TrajectorySpec};

    fn scripted_config(scenario: &str, strategies: &[DummyStrategy]) -> EpisodeConfig {
        let mut config = EpisodeConfig::default();
        config.scenario = scenario.to_string();
        config.num_agents = strategies.len();
        config.max_num_rounds = 4;
        config.personas.clear();
        let names = ["Ada", "Bram", "Cleo", "Dag", "Edda"];
        for (i, strategy) in strategies.iter().enumerate() {
            config.personas.insert(
                format!("persona_{i}"),
                PersonaConfig {
                    name: names[i].to_string(),
                    actions: Some(TrajectorySpec::Strategy(*strategy)),
                },
            );
        }
        config
    }

    #[test]
    fn scripted_episode_runs_to_the_round_cap() {
        let config = scripted_config(
            "pg_base",
            &[DummyStrategy::Cooperate, DummyStrategy::Worsening],
        );
        let mut personas = scripted_personas(&config).expect("personas");
        let mut env = DilemmaEnv::new(config, None).expect("environment");

        let summary = run_episode(&mut env, &mut personas).expect("episode");
        assert_eq!(summary.rounds_played, 4);
        assert!(summary.terminations.max_rounds);
        assert_eq!(summary.survivors.len(), 2);
        // One log row per agent per round.
        assert_eq!(env.log_records().len(), 8);
    }

    #[test]
    fn matrix_episode_accumulates_payoffs() {
        let config = scripted_config(
            "pd_base",
            &[DummyStrategy::Cooperate, DummyStrategy::Defect],
        );
        let mut personas = scripted_personas(&config).expect("personas");
        let mut env = DilemmaEnv::new(config, None).expect("environment");

        let summary = run_episode(&mut env, &mut personas).expect("episode");
        // The defector out-earns the cooperator every round.
        assert!(summary.acc_payoffs["persona_1"] > summary.acc_payoffs["persona_0"]);
    }

    #[test]
    fn model_driven_personas_are_rejected_by_the_scripted_builder() {
        let mut config = scripted_config("pg_base", &[DummyStrategy::Cooperate]);
        config.num_agents = 2;
        config.personas.insert(
            "persona_1".to_string(),
            PersonaConfig {
                name: "Bram".to_string(),
                actions: None,
            },
        );
        assert!(matches!(
            scripted_personas(&config),
            Err(contracts::ConfigError::ModelDrivenPersona(_))
        ));
    }
}
