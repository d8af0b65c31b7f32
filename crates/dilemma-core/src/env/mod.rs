//! Environment core: the turn-based state machine driving agents through
//! decision → post-round report → home, with survival elimination and the
//! perturbation hook at round boundaries.

use std::collections::BTreeMap;
use std::fmt;

use contracts::{
    possible_agents, ActionObs, AgentId, ConfigError, EpisodeConfig, Location, Phase,
    RoundLogRecord, Terminations,
};

use crate::journal::{JournalError, JsonLogStore};
use crate::perturbation::{InputMode, PerturbationScheduler};
use crate::scenario::Scenario;
use crate::selector::{CycleSelector, SelectorError};
use crate::state::RoundState;

mod observe;
mod step;

/// Outcome of one `step`: the next agent to act, its observation, and the
/// episode-level reward and termination views.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub agent_id: AgentId,
    pub observation: ActionObs,
    pub rewards: BTreeMap<AgentId, f64>,
    pub terminations: Terminations,
}

/// Environment failures. Protocol violations indicate a driver bug and are
/// never retried; configuration failures surface before any round executes.
#[derive(Debug)]
pub enum EnvError {
    Config(ConfigError),
    Selector(SelectorError),
    Journal(JournalError),
    NotReset,
    EpisodeOver,
    WrongAgent { expected: AgentId, got: AgentId },
    WrongLocation { phase: Phase, expected: Location, got: Location },
    ChoiceRequired { phase: Phase },
    UnknownPersona(AgentId),
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "configuration error: {err}"),
            Self::Selector(err) => write!(f, "selector error: {err}"),
            Self::Journal(err) => write!(f, "journal error: {err}"),
            Self::NotReset => write!(f, "step called before reset"),
            Self::EpisodeOver => write!(f, "step called on a terminated episode"),
            Self::WrongAgent { expected, got } => {
                write!(f, "action for agent {got}, but {expected} is selected")
            }
            Self::WrongLocation { phase, expected, got } => write!(
                f,
                "action at {got} during {phase} phase, expected {expected}"
            ),
            Self::ChoiceRequired { phase } => {
                write!(f, "{phase} phase requires a choice action")
            }
            Self::UnknownPersona(agent) => write!(f, "no persona registered for {agent}"),
        }
    }
}

impl std::error::Error for EnvError {}

impl From<ConfigError> for EnvError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<SelectorError> for EnvError {
    fn from(value: SelectorError) -> Self {
        Self::Selector(value)
    }
}

impl From<JournalError> for EnvError {
    fn from(value: JournalError) -> Self {
        Self::Journal(value)
    }
}

/// The turn-based perturbation environment.
///
/// Exactly one agent is current at any time; `reset` and `step` yield the
/// (agent, observation) pair the driver must answer next. All mutation of
/// the round state happens here and in the scenario hooks this struct
/// invokes.
#[derive(Debug)]
pub struct DilemmaEnv {
    config: EpisodeConfig,
    scenario: Scenario,
    agent_names: BTreeMap<AgentId, String>,
    agent_selector: CycleSelector<AgentId>,
    phase_selector: CycleSelector<Phase>,
    phase: Phase,
    agent_selection: AgentId,
    state: RoundState,
    rewards: BTreeMap<AgentId, f64>,
    num_round: u64,
    min_payoff_to_survive: Option<f64>,
    input_mode: InputMode,
    scheduler: PerturbationScheduler,
    terminations: Terminations,
    log: Vec<RoundLogRecord>,
    store: Option<JsonLogStore>,
    inputs_generated_round: Option<u64>,
}

impl DilemmaEnv {
    /// Build an environment from a validated configuration. `store` is the
    /// episode-log sink; `None` keeps the log in memory only.
    pub fn new(config: EpisodeConfig, store: Option<JsonLogStore>) -> Result<Self, EnvError> {
        config.validate()?;
        let scenario = Scenario::from_config(&config)?;
        let pool = possible_agents();
        let live: Vec<AgentId> = pool[..config.num_agents].to_vec();
        Ok(Self {
            scenario,
            agent_names: config.agent_names(),
            agent_selector: CycleSelector::new(live)?,
            phase_selector: CycleSelector::new(phase_cycle())?,
            phase: Phase::Decision,
            agent_selection: AgentId::new(),
            state: RoundState::init(&pool, config.num_agents),
            rewards: BTreeMap::new(),
            num_round: 0,
            min_payoff_to_survive: config.min_payoff_to_survive,
            input_mode: InputMode::Stochastic,
            scheduler: PerturbationScheduler::new(config.perturbations.first().cloned()),
            terminations: Terminations::default(),
            log: Vec::new(),
            store,
            inputs_generated_round: None,
            config,
        })
    }

    /// (Re)initialize the episode and yield the first agent's observation.
    pub fn reset(&mut self) -> Result<(AgentId, ActionObs), EnvError> {
        let pool = possible_agents();
        let live: Vec<AgentId> = pool[..self.config.num_agents].to_vec();

        self.agent_selector = CycleSelector::new(live.clone())?;
        self.phase_selector = CycleSelector::new(phase_cycle())?;
        self.state = RoundState::init(&pool, self.config.num_agents);
        self.rewards = live.iter().map(|agent| (agent.clone(), 0.0)).collect();
        self.num_round = 0;
        self.log.clear();
        self.min_payoff_to_survive = self.config.min_payoff_to_survive;
        self.input_mode = InputMode::Stochastic;
        self.scheduler = PerturbationScheduler::new(self.config.perturbations.first().cloned());
        self.terminations = Terminations::default();
        self.inputs_generated_round = None;

        self.agent_selection = self.agent_selector.advance().clone();
        self.phase = *self.phase_selector.advance();

        self.apply_perturbations();

        let observation = self.observe_current();
        Ok((self.agent_selection.clone(), observation))
    }

    pub(crate) fn apply_perturbations(&mut self) {
        self.scheduler.apply(
            self.num_round,
            &mut self.input_mode,
            &mut self.min_payoff_to_survive,
        );
    }

    /// Flush the accumulated round records to the log store, if one is
    /// attached. Invoked at every round boundary and at episode end.
    pub fn save_log(&self) -> Result<(), EnvError> {
        if let Some(store) = &self.store {
            store.write(&self.log)?;
        }
        Ok(())
    }

    pub fn config(&self) -> &EpisodeConfig {
        &self.config
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn num_round(&self) -> u64 {
        self.num_round
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_agent(&self) -> &AgentId {
        &self.agent_selection
    }

    pub fn live_agents(&self) -> &[AgentId] {
        self.agent_selector.members()
    }

    pub fn terminations(&self) -> Terminations {
        self.terminations
    }

    pub fn rewards(&self) -> &BTreeMap<AgentId, f64> {
        &self.rewards
    }

    pub fn round_state(&self) -> &RoundState {
        &self.state
    }

    pub fn log_records(&self) -> &[RoundLogRecord] {
        &self.log
    }

    pub fn min_payoff_to_survive(&self) -> Option<f64> {
        self.min_payoff_to_survive
    }

    /// Accumulated payoffs of the surviving agents.
    pub fn acc_payoffs(&self) -> BTreeMap<AgentId, f64> {
        self.agent_selector
            .members()
            .iter()
            .map(|agent| {
                (
                    agent.clone(),
                    self.state.acc_payoff.get(agent).copied().unwrap_or(0.0),
                )
            })
            .collect()
    }
}

fn phase_cycle() -> Vec<Phase> {
    vec![Phase::Decision, Phase::PostRoundReport, Phase::Home]
}
