//! Cross-boundary contracts for the dilemma kernel: episode configuration,
//! persona actions and observations, scenario tags, termination flags, and
//! the round-log record shape shared by kernel, personas, and drivers.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub mod serde_seed;

/// Stable per-episode agent identifier (`persona_0` .. `persona_4`).
pub type AgentId = String;

/// Size of the fixed possible-agent pool. Episodes may configure fewer
/// live agents; pool entries beyond the configured count are never visited.
pub const POSSIBLE_AGENT_POOL: usize = 5;

/// Minimum live agents for an episode to keep running.
pub const MIN_LIVE_AGENTS: usize = 2;

/// The fixed possible-agent pool, in cycle order.
pub fn possible_agents() -> Vec<AgentId> {
    (0..POSSIBLE_AGENT_POOL)
        .map(|i| format!("persona_{i}"))
        .collect()
}

// ---------------------------------------------------------------------------
// Phases and locations
// ---------------------------------------------------------------------------

/// Environment phase. All live agents pass through the same phase before it
/// advances; a round is one full pass through all three.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Decision,
    PostRoundReport,
    Home,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decision => write!(f, "decision"),
            Self::PostRoundReport => write!(f, "post_round_report"),
            Self::Home => write!(f, "home"),
        }
    }
}

/// Where an agent is (or is expected next). Decisions happen at the office.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Office,
    Home,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Office => write!(f, "office"),
            Self::Home => write!(f, "home"),
        }
    }
}

/// Whether an actor is model-driven or scripted. Scripted (dummy) actors
/// skip survival checks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Llm,
    Dummy,
}

// ---------------------------------------------------------------------------
// Actions, events, observations
// ---------------------------------------------------------------------------

/// An action returned by a persona for the currently selected agent.
///
/// `Transition` is a plain phase-transition marker; `Choice` carries the
/// numeric decision plus audit artifacts for the episode log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PersonaAction {
    Transition {
        agent_id: AgentId,
        kind: ActorKind,
        location: Location,
    },
    Choice {
        agent_id: AgentId,
        kind: ActorKind,
        location: Location,
        quantity: f64,
        stats: BTreeMap<String, f64>,
        html_interactions: String,
    },
}

impl PersonaAction {
    pub fn agent_id(&self) -> &AgentId {
        match self {
            Self::Transition { agent_id, .. } | Self::Choice { agent_id, .. } => agent_id,
        }
    }

    pub fn kind(&self) -> ActorKind {
        match self {
            Self::Transition { kind, .. } | Self::Choice { kind, .. } => *kind,
        }
    }

    pub fn location(&self) -> Location {
        match self {
            Self::Transition { location, .. } | Self::Choice { location, .. } => *location,
        }
    }
}

/// A timed report surfaced to a persona: visible from `created`, dropped
/// from its context after `expiration`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonaEvent {
    pub description: String,
    pub created: NaiveDateTime,
    pub expiration: NaiveDateTime,
    pub always_include: bool,
}

/// Observation handed to the acting agent's persona. Contents depend on the
/// phase: the decision phase carries the agent's input number and (for
/// stag-hunt) a universalization framing in `context`; the post-round-report
/// phase carries the synthetic report events; home carries neither.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionObs {
    pub phase: Phase,
    pub current_location: Location,
    pub current_location_agents: BTreeMap<AgentId, Location>,
    pub current_time: NaiveDateTime,
    pub events: Vec<PersonaEvent>,
    pub context: String,
    pub agent_resource_num: BTreeMap<AgentId, i64>,
}

// ---------------------------------------------------------------------------
// Scenario tags
// ---------------------------------------------------------------------------

/// The four dilemma games.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    PublicGoods,
    Prisoner,
    StagHunt,
    Chicken,
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PublicGoods => write!(f, "public_goods"),
            Self::Prisoner => write!(f, "prisoner"),
            Self::StagHunt => write!(f, "stag_hunt"),
            Self::Chicken => write!(f, "chicken"),
        }
    }
}

/// Narrative framing layered over a game's numeric rules. Wording only;
/// payoff math is identical across narratives of the same kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Narrative {
    Base,
    Production,
    Privacy,
    Venture,
}

/// Parse a configured scenario name into its (kind, narrative) pair.
///
/// Names are matched exactly, once, at setup; the kernel never branches on
/// the raw string again.
pub fn parse_scenario_name(name: &str) -> Result<(ScenarioKind, Narrative), ConfigError> {
    let tag = match name {
        "pg_base" => (ScenarioKind::PublicGoods, Narrative::Base),
        "pg_production" => (ScenarioKind::PublicGoods, Narrative::Production),
        "pg_privacy" => (ScenarioKind::PublicGoods, Narrative::Privacy),
        "pg_venture" => (ScenarioKind::PublicGoods, Narrative::Venture),
        "pd_base" => (ScenarioKind::Prisoner, Narrative::Base),
        "pd_production" => (ScenarioKind::Prisoner, Narrative::Production),
        "pd_privacy" => (ScenarioKind::Prisoner, Narrative::Privacy),
        "pd_venture" => (ScenarioKind::Prisoner, Narrative::Venture),
        "sh_base" => (ScenarioKind::StagHunt, Narrative::Base),
        "ch_base" => (ScenarioKind::Chicken, Narrative::Base),
        other => return Err(ConfigError::UnknownScenario(other.to_string())),
    };
    Ok(tag)
}

// ---------------------------------------------------------------------------
// Episode configuration
// ---------------------------------------------------------------------------

/// The one-shot perturbation kinds the scheduler understands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PerturbationKind {
    LowInputsSeason,
}

/// A scheduled, permanent rule change: from `round` on, inputs come from the
/// low band and the survival threshold is replaced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerturbationSpec {
    pub round: u64,
    pub kind: PerturbationKind,
    pub min_payoff_to_survive: f64,
}

/// A fixed per-round trajectory for a scripted persona: either a named
/// strategy or an explicit list with one entry per round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TrajectorySpec {
    Strategy(DummyStrategy),
    Explicit(Vec<f64>),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DummyStrategy {
    Cooperate,
    Defect,
    Worsening,
}

/// Per-persona configuration. `actions: None` means the persona is driven
/// by an external model; `Some` makes it a scripted dummy actor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonaConfig {
    pub name: String,
    #[serde(default)]
    pub actions: Option<TrajectorySpec>,
}

/// Immutable episode configuration supplied at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EpisodeConfig {
    pub scenario: String,
    pub num_agents: usize,
    pub max_num_rounds: u64,
    /// Inclusive bounds of the stochastic input band.
    pub min_input: i64,
    pub max_input: i64,
    /// Pot on mutual defection: absolute for prisoner/chicken, a divisor of
    /// the round input for stag-hunt. Unused by public-goods.
    pub defect_base: f64,
    pub min_payoff_to_survive: Option<f64>,
    pub event_expiration_months: u32,
    pub inject_universalization: bool,
    #[serde(with = "serde_seed")]
    pub seed: u64,
    pub perturbations: Vec<PerturbationSpec>,
    pub personas: BTreeMap<AgentId, PersonaConfig>,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        let mut personas = BTreeMap::new();
        personas.insert(
            "persona_0".to_string(),
            PersonaConfig {
                name: "Ada".to_string(),
                actions: Some(TrajectorySpec::Strategy(DummyStrategy::Cooperate)),
            },
        );
        personas.insert(
            "persona_1".to_string(),
            PersonaConfig {
                name: "Bram".to_string(),
                actions: Some(TrajectorySpec::Strategy(DummyStrategy::Defect)),
            },
        );
        Self {
            scenario: "pg_base".to_string(),
            num_agents: 2,
            max_num_rounds: 10,
            min_input: 50,
            max_input: 100,
            defect_base: 60.0,
            min_payoff_to_survive: None,
            event_expiration_months: 1,
            inject_universalization: false,
            seed: 1337,
            perturbations: Vec::new(),
            personas,
        }
    }
}

impl EpisodeConfig {
    /// Validate the configuration before any round executes. All failures
    /// here are fatal setup errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_scenario_name(&self.scenario)?;
        if self.num_agents < MIN_LIVE_AGENTS || self.num_agents > POSSIBLE_AGENT_POOL {
            return Err(ConfigError::AgentCount {
                given: self.num_agents,
                min: MIN_LIVE_AGENTS,
                max: POSSIBLE_AGENT_POOL,
            });
        }
        if self.max_num_rounds == 0 {
            return Err(ConfigError::ZeroRounds);
        }
        if self.min_input > self.max_input {
            return Err(ConfigError::InputBand {
                min: self.min_input,
                max: self.max_input,
            });
        }
        if self.perturbations.len() > 1 {
            return Err(ConfigError::TooManyPerturbations(self.perturbations.len()));
        }
        for i in 0..self.num_agents {
            let agent_id = format!("persona_{i}");
            let persona = self
                .personas
                .get(&agent_id)
                .ok_or(ConfigError::MissingPersona(agent_id.clone()))?;
            if let Some(TrajectorySpec::Explicit(actions)) = &persona.actions {
                if actions.len() as u64 != self.max_num_rounds {
                    return Err(ConfigError::TrajectoryLength {
                        agent: agent_id,
                        expected: self.max_num_rounds,
                        actual: actions.len() as u64,
                    });
                }
            }
        }
        Ok(())
    }

    /// Display names for the configured agents, keyed by agent id.
    pub fn agent_names(&self) -> BTreeMap<AgentId, String> {
        self.personas
            .iter()
            .map(|(id, persona)| (id.clone(), persona.name.clone()))
            .collect()
    }
}

/// Fatal setup errors, raised before any round executes.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    UnknownScenario(String),
    AgentCount { given: usize, min: usize, max: usize },
    ZeroRounds,
    InputBand { min: i64, max: i64 },
    TooManyPerturbations(usize),
    MissingPersona(AgentId),
    ModelDrivenPersona(AgentId),
    TrajectoryLength { agent: AgentId, expected: u64, actual: u64 },
    UnsupportedStrategy { scenario: String, strategy: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownScenario(name) => write!(f, "unknown scenario name: {name}"),
            Self::AgentCount { given, min, max } => {
                write!(f, "num_agents {given} outside supported range {min}..={max}")
            }
            Self::ZeroRounds => write!(f, "max_num_rounds must be at least 1"),
            Self::InputBand { min, max } => {
                write!(f, "empty input band: min_input {min} > max_input {max}")
            }
            Self::TooManyPerturbations(count) => {
                write!(f, "at most one perturbation is supported, got {count}")
            }
            Self::MissingPersona(agent) => {
                write!(f, "no persona configured for live agent {agent}")
            }
            Self::ModelDrivenPersona(agent) => write!(
                f,
                "persona {agent} is model-driven; this driver only runs scripted personas"
            ),
            Self::TrajectoryLength { agent, expected, actual } => write!(
                f,
                "trajectory for {agent} has {actual} entries, expected one per round ({expected})"
            ),
            Self::UnsupportedStrategy { scenario, strategy } => {
                write!(f, "strategy {strategy} is not supported for scenario {scenario}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Termination flags and log records
// ---------------------------------------------------------------------------

/// Episode termination flags, recomputed at every round boundary. Either
/// flag ends the episode.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Terminations {
    pub min_agents: bool,
    pub max_rounds: bool,
}

impl Terminations {
    pub fn any(&self) -> bool {
        self.min_agents || self.max_rounds
    }
}

/// One episode-log row per (agent, round), written as JSON records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundLogRecord {
    pub agent_id: AgentId,
    pub round: u64,
    pub action: String,
    pub round_input_value: i64,
    pub chosen_action: f64,
    pub round_payoff: f64,
    pub html_interactions: String,
}
