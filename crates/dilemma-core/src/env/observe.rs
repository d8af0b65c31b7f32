use std::collections::BTreeMap;

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime};
use contracts::{ActionObs, AgentId, Location, PersonaEvent, Phase};

use super::DilemmaEnv;

impl DilemmaEnv {
    /// Observation for the currently selected agent. Observing the first
    /// agent of a decision phase generates that round's inputs (once).
    pub(crate) fn observe_current(&mut self) -> ActionObs {
        match self.phase {
            Phase::Decision => self.observe_decision(),
            Phase::PostRoundReport => self.observe_post_round_report(),
            Phase::Home => self.observe_home(),
        }
    }

    fn observe_decision(&mut self) -> ActionObs {
        if self.agent_selector.is_first() && self.inputs_generated_round != Some(self.num_round) {
            self.inputs_generated_round = Some(self.num_round);
            let live = self.agent_selector.members().to_vec();
            self.scenario.generate_inputs(
                &self.config,
                self.input_mode,
                self.min_payoff_to_survive,
                self.num_round,
                &mut self.state,
                &live,
                &mut self.rewards,
            );
        }

        let agent = self.agent_selection.clone();
        let mut agent_resource_num = BTreeMap::new();
        agent_resource_num.insert(agent.clone(), self.state.input(&agent));

        ActionObs {
            phase: self.phase,
            current_location: self.state.location(&agent),
            current_location_agents: self.live_locations(),
            current_time: self.state.time(&agent),
            events: Vec::new(),
            context: self
                .scenario
                .prompt_universalization(&self.config, &self.state, &agent),
            agent_resource_num,
        }
    }

    fn observe_post_round_report(&self) -> ActionObs {
        let agent = &self.agent_selection;
        let now = self.state.time(agent);
        let expiration = expiration_month(now, self.config.event_expiration_months);

        let mut events = vec![PersonaEvent {
            description: self.scenario.prompt_round_payoffs(
                &self.config,
                &self.state,
                self.agent_selector.members(),
                &self.agent_names,
                agent,
                self.min_payoff_to_survive,
            ),
            created: now + Duration::days(1),
            expiration,
            always_include: true,
        }];
        if let Some(report) = self.scenario.prompt_opponent_action_report(
            &self.state,
            self.agent_selector.members(),
            &self.agent_names,
        ) {
            // Surfaces just before the next reflection sweep begins.
            events.push(PersonaEvent {
                description: report,
                created: reflection_day(now) - Duration::days(1) - Duration::minutes(1),
                expiration,
                always_include: true,
            });
        }

        ActionObs {
            phase: self.phase,
            current_location: self.state.location(agent),
            current_location_agents: self.live_locations(),
            current_time: now,
            events,
            context: String::new(),
            agent_resource_num: self.zero_resources(),
        }
    }

    fn observe_home(&self) -> ActionObs {
        let agent = &self.agent_selection;
        ActionObs {
            phase: self.phase,
            current_location: self.state.location(agent),
            current_location_agents: self.live_locations(),
            current_time: self.state.time(agent),
            events: Vec::new(),
            context: String::new(),
            agent_resource_num: self.zero_resources(),
        }
    }

    fn live_locations(&self) -> BTreeMap<AgentId, Location> {
        self.agent_selector
            .members()
            .iter()
            .map(|agent| (agent.clone(), self.state.location(agent)))
            .collect()
    }

    fn zero_resources(&self) -> BTreeMap<AgentId, i64> {
        self.agent_selector
            .members()
            .iter()
            .map(|agent| (agent.clone(), 0))
            .collect()
    }
}

/// Last day of the current month, time of day preserved.
pub(crate) fn reflection_day(now: NaiveDateTime) -> NaiveDateTime {
    let date = now.date();
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    let first_of_next = NaiveDate::from_ymd_opt(year, month, 1).expect("valid date");
    NaiveDateTime::new(first_of_next - Duration::days(1), now.time())
}

/// Last day of the month `months` after the current one, time preserved.
pub(crate) fn expiration_month(now: NaiveDateTime, months: u32) -> NaiveDateTime {
    let target = now
        .date()
        .checked_add_months(Months::new(months + 1))
        .expect("date in range");
    let last = target - Duration::days(i64::from(target.day()));
    NaiveDateTime::new(last, now.time())
}
