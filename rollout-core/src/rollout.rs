//! Rollout of trained policies.
mod action;
mod agent_state;
mod binding;
mod config;
mod episode;
mod frame_skip;
mod pacer;
use crate::{
    default_policy_mapping,
    error::RolloutError,
    record::{Record, RecordValue::Scalar, Recorder},
    AgentMap, MultiAgentEnv, PolicyKind, PolicyMap, PolicyMapping,
};
pub use action::normalize_action;
pub use agent_state::{AgentState, AgentStates};
use anyhow::Result;
pub use binding::PolicyBinding;
pub use config::{RolloutConfig, ZeroBudget};
pub use episode::{Episode, EpisodeStats};
pub use frame_skip::{FrameSkip, FrameSkipStep};
use log::{debug, info, trace};
pub use pacer::{pace, RenderPacer};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Runs trained policies in an environment and reports the reward of every episode.
///
/// # Rollout loop
///
/// 1. Reset the environment and start an [`Episode`], with an empty [`PolicyBinding`]
///    and empty [`AgentStates`].
/// 2. For every agent with an observation:
///     * bind the agent to a policy id with the [`PolicyMapping`] (once per episode),
///     * get or initialize its [`AgentState`],
///     * compute an action, passing the hidden state only to recurrent policies,
///     * convert the action with [`normalize_action`] and record it as the previous action.
/// 3. Apply the joint action for `frame_skip` raw steps with [`FrameSkip`], rendering
///    every frame at the pace of [`RenderPacer`] if enabled.
/// 4. Store the reward of the group as the previous reward of each agent and add it to
///    the episode total.
/// 5. Back to 2 until all agents are done or the step budget runs out.
/// 6. Report the episode reward and start another episode unless the step budget,
///    the episode limit or [`ZeroBudget`] says to stop.
///
/// ```mermaid
/// graph LR
///     Env -->|obs| Binding[PolicyBinding]
///     Binding -->|PolicyId| States[AgentStates]
///     States -->|"state, prev_act, prev_reward"| Policy
///     Policy -->|act| FrameSkip
///     FrameSkip -->|"reward, dones"| States
///     FrameSkip --> Env
/// ```
///
/// A single-agent [`Env`](crate::Env) is run by wrapping it with
/// [`SingleAgent`](crate::SingleAgent).
pub struct Rollout<E: MultiAgentEnv> {
    env: E,
    policies: PolicyMap<E>,
    mapping: Box<dyn PolicyMapping>,
    config: RolloutConfig,
    frame_skip: FrameSkip,
    pacer: RenderPacer,
    total_steps: usize,
    n_episodes: usize,
}

impl<E: MultiAgentEnv> Rollout<E> {
    /// Constructs a rollout mapping every agent to [`PolicyId::default_policy()`].
    ///
    /// [`PolicyId::default_policy()`]: crate::PolicyId::default_policy
    pub fn new(env: E, policies: PolicyMap<E>, config: RolloutConfig) -> Result<Self> {
        config.validate()?;
        let pacer = match config.render {
            true => RenderPacer::new(config.fps),
            false => RenderPacer::disabled(),
        };

        Ok(Self {
            env,
            policies,
            mapping: Box::new(default_policy_mapping),
            frame_skip: FrameSkip::new(config.frame_skip),
            pacer,
            config,
            total_steps: 0,
            n_episodes: 0,
        })
    }

    /// Sets the mapping from agents to policies.
    pub fn with_mapping(mut self, mapping: impl PolicyMapping + 'static) -> Self {
        self.mapping = Box::new(mapping);
        self
    }

    /// Returns a reference to the environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Returns a mutable reference to the environment.
    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RolloutConfig {
        &self.config
    }

    /// Raw environment steps taken over all episodes.
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// The number of episodes run so far.
    pub fn n_episodes(&self) -> usize {
        self.n_episodes
    }

    fn remaining_steps(&self) -> Option<usize> {
        match self.config.max_steps {
            0 => None,
            max_steps => Some(max_steps.saturating_sub(self.total_steps)),
        }
    }

    fn should_start_episode(&self, completed: usize) -> bool {
        if let Some(max_episodes) = self.config.max_episodes {
            if completed >= max_episodes {
                return false;
            }
        }

        match self.remaining_steps() {
            Some(remaining) => remaining > 0,
            None => match self.config.zero_budget {
                ZeroBudget::SingleEpisode => completed == 0 || self.config.max_episodes.is_some(),
                ZeroBudget::Unlimited => true,
            },
        }
    }

    /// Runs episodes until the budget is exhausted.
    ///
    /// A record summarizing each episode is written to `recorder`.
    pub fn run<R: Recorder + ?Sized>(&mut self, recorder: &mut R) -> Result<Vec<EpisodeStats>> {
        let mut episodes = Vec::new();
        while self.should_start_episode(episodes.len()) {
            episodes.push(self.run_episode(recorder)?);
        }
        info!(
            "Finished {} episodes, {} environment steps in total",
            episodes.len(),
            self.total_steps
        );
        Ok(episodes)
    }

    /// Runs an episode until it ends or the step budget runs out.
    pub fn run_episode<R: Recorder + ?Sized>(&mut self, recorder: &mut R) -> Result<EpisodeStats> {
        let mut episode = Episode::new(self.n_episodes);
        let mut obs = self.env.reset_with_index(episode.index())?;
        debug!("Start episode {}", episode.index());

        loop {
            let remaining = self.remaining_steps();
            if remaining == Some(0) {
                debug!("Step budget exhausted in episode {}", episode.index());
                break;
            }

            let (acts, extras) = self.select_actions(&obs, &mut episode)?;
            let step = self
                .frame_skip
                .run(&mut self.env, &acts, remaining, &mut self.pacer)?;
            self.total_steps += step.frames;
            episode.record_group(&step);

            if self.config.record_decisions {
                recorder.write(Self::decision_record(&episode, &step, extras));
            }

            let done = step.dones.all;
            obs = step.obs;
            if done {
                break;
            }
        }

        self.n_episodes += 1;
        let stats = episode.stats();
        info!("Episode reward {}", stats.reward);
        recorder.write(stats.to_record());

        Ok(stats)
    }

    /// Computes the joint action of the agents having an observation.
    fn select_actions(
        &mut self,
        obs: &AgentMap<Option<E::Obs>>,
        episode: &mut Episode<E::Act>,
    ) -> Result<(AgentMap<E::Act>, Record)> {
        let space = self.env.action_space();
        let (binding, states) = episode.parts_mut();
        let mut acts = AgentMap::new();
        let mut extras = Record::empty();

        for (agent_id, obs) in obs.iter() {
            let obs = match obs {
                Some(obs) => obs,
                None => {
                    trace!("No observation for {}", agent_id);
                    continue;
                }
            };

            let policy_id = binding.resolve(agent_id, self.mapping.as_mut());
            let (policy, kind) = self.policies.get_mut(&policy_id)?;
            let state = states.get_or_init(agent_id, || {
                AgentState::new(kind.initial_state(), policy.sample_action())
            });

            let hidden = match kind {
                PolicyKind::Recurrent(_) => state.hidden.as_ref(),
                PolicyKind::Stateless => None,
            };
            let out = policy.compute_action(obs, hidden, &state.prev_act, state.prev_reward)?;
            let next_hidden = match kind {
                PolicyKind::Recurrent(_) => Some(
                    out.state
                        .ok_or_else(|| RolloutError::MissingHiddenState(policy_id.clone()))?,
                ),
                PolicyKind::Stateless => None,
            };

            let act = normalize_action(out.act, space)?;
            state.record_decision(act.clone(), next_hidden);
            if self.config.record_decisions {
                extras.merge_inplace(out.extras.with_prefix(agent_id.as_str()));
            }
            acts.insert(agent_id.clone(), act);
        }

        Ok((acts, extras))
    }

    fn decision_record(episode: &Episode<E::Act>, step: &FrameSkipStep<E>, extras: Record) -> Record {
        let mut record = Record::from_slice(&[
            ("episode", Scalar(episode.index() as _)),
            ("step", Scalar(episode.steps() as _)),
            ("reward", Scalar(step.reward_sum())),
        ]);
        record.merge_inplace(step.record.clone());
        record.merge_inplace(extras);
        record
    }
}
