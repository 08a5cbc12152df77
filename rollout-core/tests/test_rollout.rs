use anyhow::Result;
use rollout_core::{
    dummy::{
        DummyAct, DummyEnv, DummyEnvConfig, DummyMultiAgentEnv, DummyMultiAgentEnvConfig,
        DummyPolicy,
    },
    error::RolloutError,
    record::{BufferedRecorder, NullRecorder, RecordStorage},
    ActionSpaceKind, AgentId, Env, Evaluator, HiddenState, MultiAgentEnv, PolicyId, PolicyMap,
    Rollout, RolloutConfig, SingleAgent, ZeroBudget,
};
use std::{cell::Cell, rc::Rc};

type SingleDummy = SingleAgent<DummyEnv>;

fn env(config: DummyEnvConfig) -> Result<SingleDummy> {
    Ok(SingleAgent::new(DummyEnv::build(&config, 0)?))
}

fn rollout(
    env_config: DummyEnvConfig,
    policy: DummyPolicy,
    config: RolloutConfig,
) -> Result<Rollout<SingleDummy>> {
    Rollout::new(env(env_config)?, PolicyMap::single(policy), config)
}

#[test]
fn test_steps_are_decisions_times_frame_skip() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let env_config = DummyEnvConfig::default().episode_len(Some(12));
    let config = RolloutConfig::default().frame_skip(3);
    let mut rollout = rollout(env_config, DummyPolicy::new(0), config)?;
    let episodes = rollout.run(&mut NullRecorder {})?;

    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].steps, 12);
    assert_eq!(episodes[0].decisions, 4);
    assert_eq!(rollout.env().inner().total_steps(), 12);
    Ok(())
}

#[test]
fn test_last_group_is_truncated_at_termination() -> Result<()> {
    // The episode ends within the third group.
    let env_config = DummyEnvConfig::default()
        .episode_len(Some(10))
        .steps_past_done(false);
    let config = RolloutConfig::default().frame_skip(4);
    let mut rollout = rollout(env_config, DummyPolicy::new(0), config)?;
    let episodes = rollout.run(&mut NullRecorder {})?;

    assert_eq!(episodes[0].decisions, 3);
    assert_eq!(episodes[0].steps, 10);
    assert_eq!(episodes[0].reward, 10.0);
    Ok(())
}

#[test]
fn test_last_group_completes_past_termination() -> Result<()> {
    let env_config = DummyEnvConfig::default().episode_len(Some(10));
    let config = RolloutConfig::default().frame_skip(4);
    let mut rollout = rollout(env_config, DummyPolicy::new(0), config)?;
    let episodes = rollout.run(&mut NullRecorder {})?;

    assert_eq!(episodes[0].decisions, 3);
    assert_eq!(episodes[0].steps, 12);
    Ok(())
}

#[test]
fn test_binding_is_stable_within_episode() -> Result<()> {
    let env_config = ["a", "b", "c", "d"]
        .iter()
        .fold(DummyMultiAgentEnvConfig::default(), |c, id| c.agent(*id, 5));
    let env = DummyMultiAgentEnv::build(&env_config, 0)?;
    let policies = PolicyMap::<DummyMultiAgentEnv>::new()
        .with("p0", DummyPolicy::new(0))
        .with("p1", DummyPolicy::new(100));

    let n_calls = Rc::new(Cell::new(0));
    let n_calls_ = n_calls.clone();
    let mut rng = fastrand::Rng::with_seed(42);
    let mapping = move |_: &AgentId| {
        n_calls_.set(n_calls_.get() + 1);
        match rng.bool() {
            true => PolicyId::from("p0"),
            false => PolicyId::from("p1"),
        }
    };

    let config = RolloutConfig::default()
        .frame_skip(1)
        .max_episodes(Some(3));
    let mut rollout = Rollout::new(env, policies, config)?.with_mapping(mapping);
    let episodes = rollout.run(&mut NullRecorder {})?;

    assert_eq!(episodes.len(), 3);
    assert_eq!(n_calls.get(), 4 * 3);

    // Actions of policy p1 are offset by 100.
    let acts = rollout.env().acts();
    assert_eq!(acts.len(), 15);
    for episode in acts.chunks(5) {
        for agent_id in episode[0].keys() {
            let by_p1: Vec<bool> = episode
                .iter()
                .map(|joint| matches!(joint[agent_id], DummyAct::Flat(a) if a >= 100))
                .collect();
            assert!(by_p1.iter().all(|b| *b == by_p1[0]));
        }
    }
    Ok(())
}

#[test]
fn test_stateless_policy_never_receives_state() -> Result<()> {
    let env_config = DummyEnvConfig::default().episode_len(Some(8));
    let config = RolloutConfig::default().frame_skip(2);

    for policy in [
        DummyPolicy::new(0),
        DummyPolicy::new(0).initial_state(Some(HiddenState(vec![]))),
    ] {
        let calls = policy.calls();
        rollout(env_config.clone(), policy, config.clone())?.run(&mut NullRecorder {})?;

        let calls = calls.borrow();
        assert_eq!(calls.len(), 4);
        assert!(calls.iter().all(|c| c.state.is_none()));
    }
    Ok(())
}

#[test]
fn test_recurrent_state_is_threaded() -> Result<()> {
    let env_config = DummyEnvConfig::default().episode_len(Some(4));
    let config = RolloutConfig::default()
        .frame_skip(1)
        .max_episodes(Some(2));
    let policy = DummyPolicy::recurrent(0);
    let calls = policy.calls();
    rollout(env_config, policy, config)?.run(&mut NullRecorder {})?;

    // The dummy policy increments the state at every call; it starts from zero
    // again in the second episode.
    let states: Vec<_> = calls
        .borrow()
        .iter()
        .map(|c| c.state.clone())
        .collect();
    let expected: Vec<_> = [0.0, 1.0, 2.0, 3.0, 0.0, 1.0, 2.0, 3.0]
        .iter()
        .map(|x| Some(HiddenState(vec![vec![*x]])))
        .collect();
    assert_eq!(states, expected);
    Ok(())
}

#[test]
fn test_missing_recurrent_state_is_an_error() -> Result<()> {
    let policy = DummyPolicy::recurrent(0).return_state(false);
    let config = RolloutConfig::default().max_steps(8);
    let err = rollout(DummyEnvConfig::default(), policy, config)?
        .run(&mut NullRecorder {})
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<RolloutError>(),
        Some(RolloutError::MissingHiddenState(_))
    ));
    Ok(())
}

#[test]
fn test_prev_reward_is_group_sum() -> Result<()> {
    let env_config = DummyEnvConfig::default()
        .rewards(vec![1.0, 2.0, 4.0])
        .episode_len(Some(6));
    let config = RolloutConfig::default().frame_skip(3);
    let policy = DummyPolicy::new(0);
    let calls = policy.calls();
    let episodes = rollout(env_config, policy, config)?.run(&mut NullRecorder {})?;

    let calls = calls.borrow();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].prev_reward, 0.0);
    assert_eq!(calls[0].prev_act, DummyAct::Flat(-1));
    assert_eq!(calls[1].prev_reward, 7.0);
    assert_eq!(calls[1].prev_act, DummyAct::Flat(0));
    assert_eq!(calls[1].obs, 3);
    assert_eq!(episodes[0].reward, 14.0);
    Ok(())
}

#[test]
fn test_multi_agent_episode_ends_with_all_agents() -> Result<()> {
    let env_config = DummyMultiAgentEnvConfig::default()
        .agent("a", 2)
        .agent("b", 5);
    let env = DummyMultiAgentEnv::build(&env_config, 0)?;
    let policy_a = DummyPolicy::new(0);
    let policy_b = DummyPolicy::new(0);
    let (calls_a, calls_b) = (policy_a.calls(), policy_b.calls());
    let policies = PolicyMap::<DummyMultiAgentEnv>::new()
        .with("a", policy_a)
        .with("b", policy_b);
    let mapping = |agent_id: &AgentId| PolicyId::from(agent_id.as_str());

    let config = RolloutConfig::default().frame_skip(1);
    let mut rollout = Rollout::new(env, policies, config)?.with_mapping(mapping);
    let episodes = rollout.run(&mut NullRecorder {})?;

    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].steps, 5);
    assert_eq!(episodes[0].reward, 7.0);

    // Agent a has no observation after its own episode ends.
    assert_eq!(calls_a.borrow().len(), 2);
    assert_eq!(calls_b.borrow().len(), 5);
    let acts = rollout.env().acts();
    assert!(acts[2..]
        .iter()
        .all(|joint| !joint.contains_key(&AgentId::from("a"))));
    Ok(())
}

#[test]
fn test_multi_agent_prev_reward_is_own_group_sum() -> Result<()> {
    // a ends in the middle of the second group, b in the middle of the third.
    let env_config = DummyMultiAgentEnvConfig::default()
        .agent("a", 4)
        .agent("b", 7)
        .agent("c", 9)
        .reward("a", 1.0)
        .reward("b", 10.0)
        .reward("c", 100.0);
    let env = DummyMultiAgentEnv::build(&env_config, 0)?;
    let (policy_a, policy_b, policy_c) =
        (DummyPolicy::new(0), DummyPolicy::new(0), DummyPolicy::new(0));
    let calls = [policy_a.calls(), policy_b.calls(), policy_c.calls()];
    let policies = PolicyMap::<DummyMultiAgentEnv>::new()
        .with("a", policy_a)
        .with("b", policy_b)
        .with("c", policy_c);
    let mapping = |agent_id: &AgentId| PolicyId::from(agent_id.as_str());

    let config = RolloutConfig::default().frame_skip(3);
    let mut rollout = Rollout::new(env, policies, config)?.with_mapping(mapping);
    let episodes = rollout.run(&mut NullRecorder {})?;

    let prev_rewards = |i: usize| -> Vec<f32> {
        calls[i].borrow().iter().map(|c| c.prev_reward).collect()
    };
    assert_eq!(prev_rewards(0), vec![0.0, 3.0]);
    assert_eq!(prev_rewards(1), vec![0.0, 30.0, 30.0]);
    assert_eq!(prev_rewards(2), vec![0.0, 300.0, 300.0]);

    // Group sums: [3 + 30 + 300, 1 + 30 + 300, 10 + 300]
    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].steps, 9);
    assert_eq!(episodes[0].decisions, 3);
    assert_eq!(episodes[0].reward, 4.0 + 70.0 + 900.0);
    Ok(())
}

#[test]
fn test_rendering_does_not_change_results() -> Result<()> {
    let env_config = DummyEnvConfig::default()
        .rewards(vec![0.5, 1.0, -1.0])
        .episode_len(Some(9));
    let config = RolloutConfig::default().frame_skip(2);

    let mut headless = rollout(env_config.clone(), DummyPolicy::new(0), config.clone())?;
    let mut rendered = rollout(
        env_config,
        DummyPolicy::new(0),
        config.render(true).fps(1000.0),
    )?;
    let episodes = headless.run(&mut NullRecorder {})?;
    let episodes_ = rendered.run(&mut NullRecorder {})?;

    assert_eq!(episodes, episodes_);
    assert_eq!(headless.env().inner().n_renders(), 0);
    assert_eq!(
        rendered.env().inner().n_renders(),
        rendered.env().inner().total_steps()
    );
    Ok(())
}

#[test]
fn test_step_budget_on_endless_env() -> Result<()> {
    let config = RolloutConfig::default().frame_skip(4).max_steps(10);
    let mut rollout = rollout(DummyEnvConfig::default(), DummyPolicy::new(0), config)?;
    let episodes = rollout.run(&mut NullRecorder {})?;

    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].steps, 10);
    assert_eq!(episodes[0].decisions, 3);
    assert_eq!(episodes[0].reward, 10.0);
    assert_eq!(rollout.total_steps(), 10);
    assert_eq!(rollout.env().inner().total_steps(), 10);
    Ok(())
}

#[test]
fn test_step_budget_spans_episodes() -> Result<()> {
    let env_config = DummyEnvConfig::default().episode_len(Some(4));
    let config = RolloutConfig::default().frame_skip(1).max_steps(10);
    let mut rollout = rollout(env_config, DummyPolicy::new(0), config)?;
    let episodes = rollout.run(&mut NullRecorder {})?;

    let steps: Vec<_> = episodes.iter().map(|e| e.steps).collect();
    assert_eq!(steps, vec![4, 4, 2]);
    assert_eq!(rollout.env().inner().reset_indices(), &vec![0, 1, 2]);
    Ok(())
}

#[test]
fn test_zero_budget() -> Result<()> {
    let env_config = DummyEnvConfig::default().episode_len(Some(3));

    let config = RolloutConfig::default();
    let episodes = rollout(env_config.clone(), DummyPolicy::new(0), config)?
        .run(&mut NullRecorder {})?;
    assert_eq!(episodes.len(), 1);

    let config = RolloutConfig::default()
        .zero_budget(ZeroBudget::Unlimited)
        .max_episodes(Some(5));
    let episodes = rollout(env_config, DummyPolicy::new(0), config)?.run(&mut NullRecorder {})?;
    assert_eq!(episodes.len(), 5);
    Ok(())
}

#[test]
fn test_unknown_policy() -> Result<()> {
    let policies = PolicyMap::<SingleDummy>::new().with("p0", DummyPolicy::new(0));
    let mut rollout = Rollout::new(env(DummyEnvConfig::default())?, policies, Default::default())?;
    let err = rollout.run(&mut NullRecorder {}).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<RolloutError>(),
        Some(RolloutError::UnknownPolicy(id)) if id == &PolicyId::default_policy()
    ));
    Ok(())
}

#[test]
fn test_tuple_actions_are_unbatched() -> Result<()> {
    let env_config = DummyEnvConfig::default()
        .episode_len(Some(2))
        .action_space(ActionSpaceKind::Tuple(2));
    let policy = DummyPolicy::new(10).action_space(ActionSpaceKind::Tuple(2));
    let calls = policy.calls();
    let config = RolloutConfig::default().frame_skip(1);
    let mut rollout = rollout(env_config, policy, config)?;
    rollout.run(&mut NullRecorder {})?;

    assert_eq!(
        rollout.env().inner().acts(),
        &vec![
            DummyAct::Tuple(vec![vec![10], vec![11]]),
            DummyAct::Tuple(vec![vec![11], vec![12]]),
        ]
    );
    assert_eq!(
        calls.borrow()[1].prev_act,
        DummyAct::Tuple(vec![vec![10], vec![11]])
    );
    Ok(())
}

#[test]
fn test_action_space_mismatch() -> Result<()> {
    let env_config = DummyEnvConfig::default().action_space(ActionSpaceKind::Tuple(2));
    let policy = DummyPolicy::new(0).action_space(ActionSpaceKind::Tuple(3));
    let err = rollout(env_config, policy, RolloutConfig::default())?
        .run(&mut NullRecorder {})
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<RolloutError>(),
        Some(RolloutError::ActionSpaceMismatch(_))
    ));
    Ok(())
}

#[test]
fn test_invalid_config_is_rejected() -> Result<()> {
    let config = RolloutConfig::default().frame_skip(0);
    assert!(rollout(DummyEnvConfig::default(), DummyPolicy::new(0), config).is_err());
    Ok(())
}

#[test]
fn test_episode_records() -> Result<()> {
    let env_config = DummyEnvConfig::default().episode_len(Some(4));
    let config = RolloutConfig::default()
        .frame_skip(2)
        .max_episodes(Some(3))
        .record_decisions(true);
    let mut recorder = BufferedRecorder::new();
    rollout(env_config, DummyPolicy::new(7), config)?.run(&mut recorder)?;

    let records = recorder.into_records();
    let (episodes, decisions): (Vec<_>, Vec<_>) = records
        .into_iter()
        .partition(|r| r.get("episode_reward").is_some());
    assert_eq!(episodes.len(), 3);
    assert_eq!(decisions.len(), 6);
    assert_eq!(decisions[0].get_scalar("agent0/tag")?, 7.0);
    assert_eq!(decisions[1].get_scalar("step")?, 4.0);
    assert_eq!(decisions[1].get_scalar("reward")?, 2.0);

    let mut storage = RecordStorage::new();
    episodes.into_iter().for_each(|r| storage.store(r));
    let summary = storage.aggregate()?;
    assert_eq!(summary.get_scalar("episode_reward_mean")?, 4.0);
    assert_eq!(summary.get_scalar("episode_steps_max")?, 4.0);
    Ok(())
}

#[test]
fn test_evaluator_returns_mean_reward() -> Result<()> {
    let env_config = DummyEnvConfig::default().episode_len(Some(5));
    let config = RolloutConfig::default()
        .frame_skip(1)
        .max_episodes(Some(4));
    let record = rollout(env_config, DummyPolicy::new(0), config)?.evaluate()?;

    assert_eq!(record.get_scalar("Episode return")?, 5.0);
    Ok(())
}
