use anyhow::{bail, Result};
use scv_core::{
    EpisodeEnd, EpisodeLoop, Env, Policy, ShutdownSignal, StepType, TimeStep, Transition,
};
use std::fmt::Debug;

#[derive(Clone)]
struct StubConfig {
    terminal_at: Option<usize>,
    fail_at: Option<usize>,
    agents: usize,
}

/// Counts step calls and records how many actions each call received.
struct StubEnv<A> {
    config: StubConfig,
    t: usize,
    step_calls: usize,
    action_lens: Vec<usize>,
    received: Vec<A>,
}

impl<A: Clone + Debug> Env for StubEnv<A> {
    type Config = StubConfig;
    type Obs = usize;
    type Act = A;
    type ObsSpec = &'static str;
    type ActSpec = &'static str;

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            t: 0,
            step_calls: 0,
            action_lens: vec![],
            received: vec![],
        })
    }

    fn observation_spec(&self) -> Vec<&'static str> {
        ["obs_p1", "obs_p2"][..self.config.agents].to_vec()
    }

    fn action_spec(&self) -> Vec<&'static str> {
        ["act_p1", "act_p2"][..self.config.agents].to_vec()
    }

    fn reset(&mut self) -> Result<Vec<TimeStep<usize>>> {
        self.t = 0;
        Ok(vec![TimeStep::new(StepType::First, 0.0, 1.0, 0)])
    }

    fn step(&mut self, acts: &[A]) -> Result<Vec<TimeStep<usize>>> {
        self.step_calls += 1;
        self.action_lens.push(acts.len());
        self.received.extend(acts.iter().cloned());
        self.t += 1;
        if Some(self.t) == self.config.fail_at {
            bail!("simulator crashed");
        }
        let step_type = match self.config.terminal_at {
            Some(n) if self.t >= n => StepType::Last,
            _ => StepType::Mid,
        };
        Ok(vec![TimeStep::new(step_type, 0.5, 1.0, self.t)])
    }
}

/// Always returns the same action.
struct ConstPolicy<A> {
    act: A,
    specs: Option<(&'static str, &'static str)>,
    resets: usize,
}

impl<A> ConstPolicy<A> {
    fn new(act: A) -> Self {
        Self {
            act,
            specs: None,
            resets: 0,
        }
    }
}

impl<A: Clone + Debug> Policy<StubEnv<A>> for ConstPolicy<A> {
    fn setup(&mut self, obs_spec: &&'static str, act_spec: &&'static str) -> Result<()> {
        self.specs = Some((*obs_spec, *act_spec));
        Ok(())
    }

    fn reset(&mut self) {
        self.resets += 1;
    }

    fn step(&mut self, _timestep: &TimeStep<usize>) -> Result<A> {
        Ok(self.act.clone())
    }
}

fn stub_env<A: Clone + Debug>(terminal_at: Option<usize>) -> StubEnv<A> {
    StubEnv::build(
        &StubConfig {
            terminal_at,
            fail_at: None,
            agents: 1,
        },
        0,
    )
    .unwrap()
}

#[test]
fn stops_exactly_at_the_terminal_step() -> Result<()> {
    for terminal_at in [1, 5, 17, 200] {
        let mut env = stub_env::<u32>(Some(terminal_at));
        let mut policy = ConstPolicy::new(0u32);
        let stats = EpisodeLoop::new(200).run(&mut env, &mut policy)?;
        assert_eq!(stats.end, EpisodeEnd::Terminated);
        assert_eq!(stats.steps, terminal_at);
        assert_eq!(env.step_calls, terminal_at);
        assert_eq!(policy.resets, 1);
    }
    Ok(())
}

#[test]
fn never_terminating_env_sees_max_steps_plus_one_calls() -> Result<()> {
    for max_steps in [0, 1, 10, 57] {
        let mut env = stub_env::<u32>(None);
        let mut policy = ConstPolicy::new(0u32);
        let stats = EpisodeLoop::new(max_steps).run(&mut env, &mut policy)?;
        assert_eq!(stats.end, EpisodeEnd::StepLimit);
        assert_eq!(env.step_calls, max_steps + 1);
        assert_eq!(stats.steps, max_steps + 1);
    }
    Ok(())
}

#[test]
fn terminal_step_wins_over_the_ceiling() -> Result<()> {
    let mut env = stub_env::<u32>(Some(4));
    let mut policy = ConstPolicy::new(0u32);
    let stats = EpisodeLoop::new(3).run(&mut env, &mut policy)?;
    assert_eq!(stats.end, EpisodeEnd::Terminated);
    assert_eq!(stats.steps, 4);
    Ok(())
}

#[test]
fn actions_are_submitted_as_single_element_lists() -> Result<()> {
    let mut env = stub_env::<u32>(Some(3));
    let mut policy = ConstPolicy::new(7u32);
    EpisodeLoop::new(10).run(&mut env, &mut policy)?;
    assert_eq!(env.action_lens, vec![1, 1, 1]);
    assert_eq!(env.received, vec![7, 7, 7]);

    // A policy whose action is itself a list is still wrapped once.
    let mut env = stub_env::<Vec<u32>>(Some(2));
    let mut policy = ConstPolicy::new(vec![1u32, 2, 3]);
    EpisodeLoop::new(10).run(&mut env, &mut policy)?;
    assert_eq!(env.action_lens, vec![1, 1]);
    assert_eq!(env.received, vec![vec![1, 2, 3], vec![1, 2, 3]]);
    Ok(())
}

#[test]
fn setup_unwraps_the_per_agent_specs() -> Result<()> {
    let mut env = StubEnv::<u32>::build(
        &StubConfig {
            terminal_at: None,
            fail_at: None,
            agents: 2,
        },
        0,
    )?;
    let mut policy = ConstPolicy::new(0u32);
    EpisodeLoop::setup(&env, &mut policy)?;
    assert_eq!(policy.specs, Some(("obs_p1", "act_p1")));

    env.config.agents = 0;
    assert!(EpisodeLoop::setup(&env, &mut policy).is_err());
    Ok(())
}

#[test]
fn environment_errors_propagate() {
    let mut env = StubEnv::<u32>::build(
        &StubConfig {
            terminal_at: None,
            fail_at: Some(3),
            agents: 1,
        },
        0,
    )
    .unwrap();
    let mut policy = ConstPolicy::new(0u32);
    let err = EpisodeLoop::new(100).run(&mut env, &mut policy).unwrap_err();
    assert!(err.to_string().contains("simulator crashed"));
    assert_eq!(env.step_calls, 3);
}

#[test]
fn interrupt_stops_before_the_next_step() -> Result<()> {
    let shutdown = ShutdownSignal::new();
    shutdown.trigger();
    let mut env = stub_env::<u32>(None);
    let mut policy = ConstPolicy::new(0u32);
    let stats = EpisodeLoop::new(100)
        .shutdown_signal(shutdown)
        .run(&mut env, &mut policy)?;
    assert_eq!(stats.end, EpisodeEnd::Interrupted);
    assert_eq!(stats.steps, 0);
    assert_eq!(env.step_calls, 0);
    Ok(())
}

#[test]
fn observer_receives_every_transition() -> Result<()> {
    let mut env = stub_env::<u32>(Some(3));
    let mut policy = ConstPolicy::new(1u32);
    let mut seen = vec![];
    let (stats, last_obs) = EpisodeLoop::new(10).run_with(
        &mut env,
        &mut policy,
        |_, t: Transition<StubEnv<u32>>| {
            seen.push((t.obs, t.next_obs, t.is_terminated));
            Ok(())
        },
    )?;
    assert_eq!(seen, vec![(0, 1, false), (1, 2, false), (2, 3, true)]);
    assert_eq!(last_obs, 3);
    assert!((stats.total_reward - 1.5).abs() < 1e-6);
    Ok(())
}
