use super::{AgentStates, FrameSkipStep, PolicyBinding};
use crate::{
    record::{Record, RecordValue},
    MultiAgentEnv,
};

/// Summary of a finished episode.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeStats {
    /// Index of the episode within the rollout.
    pub episode: usize,

    /// Total reward over all agents.
    pub reward: f32,

    /// The number of raw environment steps.
    pub steps: usize,

    /// The number of decisions, i.e., frame-skip groups.
    pub decisions: usize,
}

impl EpisodeStats {
    /// Converts the summary into a [`Record`].
    pub fn to_record(&self) -> Record {
        Record::from_slice(&[
            ("episode", RecordValue::Scalar(self.episode as _)),
            ("episode_reward", RecordValue::Scalar(self.reward)),
            ("episode_steps", RecordValue::Scalar(self.steps as _)),
            ("episode_decisions", RecordValue::Scalar(self.decisions as _)),
        ])
    }
}

/// State of a running episode.
///
/// Everything here lives for one reset-to-done lifecycle: the binding of agents to
/// policies, the per-agent states and the running totals.
#[derive(Debug)]
pub struct Episode<A> {
    index: usize,
    binding: PolicyBinding,
    states: AgentStates<A>,
    steps: usize,
    decisions: usize,
    reward_total: f32,
}

impl<A> Episode<A> {
    /// Starts an episode.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            binding: PolicyBinding::new(),
            states: AgentStates::new(),
            steps: 0,
            decisions: 0,
            reward_total: 0.0,
        }
    }

    /// Index of the episode within the rollout.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Binding of agents to policies.
    pub fn binding(&self) -> &PolicyBinding {
        &self.binding
    }

    /// Per-agent states.
    pub fn states(&self) -> &AgentStates<A> {
        &self.states
    }

    /// Reward accumulated so far.
    pub fn reward_total(&self) -> f32 {
        self.reward_total
    }

    /// Raw environment steps taken so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub(super) fn parts_mut(&mut self) -> (&mut PolicyBinding, &mut AgentStates<A>) {
        (&mut self.binding, &mut self.states)
    }

    /// Accounts for a finished frame-skip group.
    pub(super) fn record_group<E>(&mut self, step: &FrameSkipStep<E>)
    where
        E: MultiAgentEnv<Act = A>,
    {
        for (agent_id, r) in step.reward.iter() {
            self.states.set_prev_reward(agent_id, *r);
        }
        self.reward_total += step.reward_sum();
        self.steps += step.frames;
        self.decisions += 1;
    }

    /// Summary of the episode so far.
    pub fn stats(&self) -> EpisodeStats {
        EpisodeStats {
            episode: self.index,
            reward: self.reward_total,
            steps: self.steps,
            decisions: self.decisions,
        }
    }
}
