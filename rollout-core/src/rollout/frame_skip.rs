use super::RenderPacer;
use crate::{record::Record, AgentMap, Dones, MultiAgentEnv, MultiAgentStep};
use anyhow::{anyhow, Result};
use log::{debug, trace};

/// Outcome of a frame-skip group.
pub struct FrameSkipStep<E: MultiAgentEnv> {
    /// Observations after the last frame.
    pub obs: AgentMap<Option<E::Obs>>,

    /// Rewards summed over the frames of the group.
    pub reward: AgentMap<f32>,

    /// Termination flags after the last frame.
    pub dones: Dones,

    /// Information of the last frame.
    pub info: E::Info,

    /// Record emitted by the environment at the last frame.
    pub record: Record,

    /// The number of raw environment steps taken.
    pub frames: usize,
}

impl<E: MultiAgentEnv> FrameSkipStep<E> {
    /// Sum of the aggregated rewards over all agents.
    pub fn reward_sum(&self) -> f32 {
        self.reward.values().sum()
    }
}

/// Applies an action for a fixed number of raw environment steps.
///
/// The action is not recomputed within the group. Rewards are summed over the
/// frames, per agent, while observation, done flags and info are those of the last
/// frame. When rendering is enabled every frame is rendered.
#[derive(Debug, Clone, Copy)]
pub struct FrameSkip {
    n_frames: usize,
}

impl FrameSkip {
    /// Constructs the executor. `n_frames` must be positive.
    pub fn new(n_frames: usize) -> Self {
        debug_assert!(n_frames > 0);
        Self { n_frames }
    }

    /// The number of frames of a group.
    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    /// Runs a frame-skip group with the joint action `acts`.
    ///
    /// `limit` caps the number of frames, for the last group of a step budget.
    /// If the episode ends within the group, the remaining frames are still taken
    /// only when the environment accepts steps after the end of an episode.
    pub fn run<E: MultiAgentEnv>(
        &self,
        env: &mut E,
        acts: &AgentMap<E::Act>,
        limit: Option<usize>,
        pacer: &mut RenderPacer,
    ) -> Result<FrameSkipStep<E>> {
        let n_frames = limit.map_or(self.n_frames, |limit| limit.min(self.n_frames));
        let mut rewards: Option<AgentMap<f32>> = None;
        let mut last = None;
        let mut frames = 0;

        for frame in 0..n_frames {
            let (step, record) = env.step(acts)?;
            let MultiAgentStep {
                obs,
                reward,
                dones,
                info,
            } = step;
            trace!("Frame {}, reward {:?}", frame, reward);

            match rewards.as_mut() {
                None => rewards = Some(reward),
                Some(acc) => {
                    for (agent_id, r) in reward {
                        *acc.entry(agent_id).or_insert(0.0) += r;
                    }
                }
            }

            if pacer.is_enabled() {
                pacer.maybe_wait();
                env.render()?;
            }

            frames += 1;
            let done = dones.all;
            last = Some((obs, dones, info, record));

            if done && frames < n_frames && !env.steps_past_done() {
                debug!(
                    "Episode ended at frame {} of {}, skipping the rest of the group",
                    frames, n_frames
                );
                break;
            }
        }

        let (obs, dones, info, record) =
            last.ok_or_else(|| anyhow!("Frame-skip group without frames"))?;

        Ok(FrameSkipStep {
            obs,
            reward: rewards.unwrap_or_default(),
            dones,
            info,
            record,
            frames,
        })
    }
}
