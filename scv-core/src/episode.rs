//! A single episode of interaction between a policy and an environment.
use crate::{error::ScvError, Env, Policy, ShutdownSignal, TimeStep, Transition};
use anyhow::Result;
use log::{info, trace};

/// Why an episode stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeEnd {
    /// The environment flagged the last timestep.
    Terminated,

    /// The step counter exceeded the configured maximum.
    StepLimit,

    /// The user interrupted the run.
    Interrupted,
}

/// Summary of a finished episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeStats {
    /// Number of environment steps performed.
    pub steps: usize,

    /// Sum of the rewards received.
    pub total_reward: f32,

    /// Stop condition.
    pub end: EpisodeEnd,
}

/// Takes the element of the controlled agent out of a per-agent tuple.
fn unwrap_agent<T>(values: Vec<T>, what: &'static str) -> Result<T> {
    values
        .into_iter()
        .next()
        .ok_or_else(|| ScvError::EmptyAgentTuple(what).into())
}

/// Runs episodes until termination or a step ceiling.
///
/// Each step, the policy computes exactly one action and the action is
/// submitted to the environment as a single-element slice. The episode
/// stops as soon as a timestep is flagged last; otherwise it stops once
/// the step counter exceeds `max_steps`, so an environment that never
/// terminates sees `max_steps + 1` step calls.
///
/// Errors from the environment or the policy are returned as-is.
#[derive(Debug, Clone)]
pub struct EpisodeLoop {
    max_steps: usize,
    shutdown: ShutdownSignal,
}

impl EpisodeLoop {
    /// Constructs a loop with the given step ceiling.
    pub fn new(max_steps: usize) -> Self {
        Self {
            max_steps,
            shutdown: ShutdownSignal::new(),
        }
    }

    /// Sets the signal polled before every step.
    pub fn shutdown_signal(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Returns the step ceiling.
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Hands the specs of the controlled agent to the policy.
    pub fn setup<E, P>(env: &E, policy: &mut P) -> Result<()>
    where
        E: Env,
        P: Policy<E> + ?Sized,
    {
        let obs_spec = unwrap_agent(env.observation_spec(), "observation spec")?;
        let act_spec = unwrap_agent(env.action_spec(), "action spec")?;
        trace!("obs_spec = {:?}", obs_spec);
        policy.setup(&obs_spec, &act_spec)
    }

    /// Runs one episode.
    pub fn run<E, P>(&self, env: &mut E, policy: &mut P) -> Result<EpisodeStats>
    where
        E: Env,
        P: Policy<E> + ?Sized,
    {
        let (stats, _) = self.run_with(env, policy, |_, _| Ok(()))?;
        Ok(stats)
    }

    /// Runs one episode, handing every transition to `observe`.
    ///
    /// Returns the statistics of the episode and its final observation.
    pub fn run_with<E, P, F>(
        &self,
        env: &mut E,
        policy: &mut P,
        mut observe: F,
    ) -> Result<(EpisodeStats, E::Obs)>
    where
        E: Env,
        P: Policy<E> + ?Sized,
        F: FnMut(&mut P, Transition<E>) -> Result<()>,
    {
        let mut timestep: TimeStep<E::Obs> = unwrap_agent(env.reset()?, "timestep")?;
        policy.reset();

        let mut steps = 0;
        let mut total_reward = 0f32;

        let end = loop {
            if self.shutdown.is_triggered() {
                info!("Episode interrupted after {} steps", steps);
                break EpisodeEnd::Interrupted;
            }

            let act = policy.step(&timestep)?;
            let next = unwrap_agent(env.step(std::slice::from_ref(&act))?, "timestep")?;
            steps += 1;
            total_reward += next.reward;

            let is_terminated = next.last();
            let reward = next.reward;
            let next_obs = next.observation.clone();
            let prev = std::mem::replace(&mut timestep, next);
            observe(
                &mut *policy,
                Transition {
                    obs: prev.observation,
                    act,
                    reward,
                    next_obs,
                    is_terminated,
                },
            )?;

            if is_terminated {
                info!("Episode finished with {} steps", steps);
                break EpisodeEnd::Terminated;
            }
            if steps > self.max_steps {
                info!(
                    "Episode stopped after {} steps, exceeding the limit of {} steps",
                    steps, self.max_steps
                );
                break EpisodeEnd::StepLimit;
            }
        };

        let stats = EpisodeStats {
            steps,
            total_reward,
            end,
        };
        Ok((stats, timestep.observation))
    }
}
