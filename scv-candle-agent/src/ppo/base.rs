use super::{PpoBatch, PpoConfig, PpoStep, TrajectoryBuffer};
use crate::{
    encoder::ObsEncoder,
    mlp::{Activation, MlpConfig},
    model::Model,
    opt::OptimizerConfig,
    util::{argmax_among, rows_to_tensor},
};
use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use candle_nn::{loss::mse, ops::log_softmax};
use log::{debug, info};
use rand::{distributions::WeightedIndex, rngs::SmallRng, Rng, SeedableRng};
use scv_core::{
    error::ScvError,
    record::{Record, RecordValue},
    sc2::{FunctionCall, Sc2ActSpec, Sc2Obs, Sc2ObsSpec},
    Agent, EpisodeEnd, EpisodeStats, Env, Policy, TimeStep, Transition,
};
use std::{fs, path::Path};

/// Logit offset of unavailable functions.
const MASKED: f32 = -1e9;

/// Networks built from the environment specs.
struct Nets {
    encoder: ObsEncoder,
    act_spec: Sc2ActSpec,
    screen: (usize, usize),
    actor: Model,
    critic: Model,
}

fn norm(i: u32, size: usize) -> f32 {
    match size {
        0 | 1 => 0.0,
        _ => i as f32 / (size - 1) as f32,
    }
}

impl Nets {
    fn build(config: &PpoConfig, obs_spec: &Sc2ObsSpec, act_spec: &Sc2ActSpec, device: &Device) -> Result<Self> {
        let encoder = ObsEncoder::build(&config.encoder, obs_spec)?;
        let screen = act_spec
            .screen_size()
            .or_else(|| obs_spec.screen_shape().map(|[_, h, w]| (w, h)))
            .unwrap_or((1, 1));
        let n_logits = act_spec.len() + screen.0 + screen.1;
        let actor_config = MlpConfig::new(encoder.dim(), config.units.clone(), n_logits, Activation::None);
        let critic_config = MlpConfig::new(encoder.dim(), config.units.clone(), 1, Activation::None);

        let actor = Model::build(
            "actor",
            actor_config,
            Some(&OptimizerConfig::adam(config.actor_lr)),
            device,
        )?;
        let critic = Model::build(
            "critic",
            critic_config,
            Some(&OptimizerConfig::adam(config.critic_lr)),
            device,
        )?;
        info!(
            "Built PPO networks: obs dim {}, {} functions, screen {:?}",
            encoder.dim(),
            act_spec.len(),
            screen
        );

        Ok(Self {
            encoder,
            act_spec: act_spec.clone(),
            screen,
            actor,
            critic,
        })
    }

    fn n_functions(&self) -> usize {
        self.act_spec.len()
    }

    fn mask(&self, available: &[usize]) -> Vec<f32> {
        let mut mask = vec![MASKED; self.n_functions()];
        for &f in available {
            if let Some(m) = mask.get_mut(f) {
                *m = 0.0;
            }
        }
        mask
    }

    /// Log probabilities of function, x and y, each `[batch_size, n]`.
    fn log_probs(&self, obs: &Tensor, mask: &Tensor) -> Result<(Tensor, Tensor, Tensor)> {
        let (n, (w, h)) = (self.n_functions(), self.screen);
        let logits = self.actor.forward(obs)?;
        let lp_fn = log_softmax(&(logits.narrow(1, 0, n)? + mask)?, 1)?;
        let lp_x = log_softmax(&logits.narrow(1, n, w)?, 1)?;
        let lp_y = log_softmax(&logits.narrow(1, n + w, h)?, 1)?;
        Ok((lp_fn, lp_x, lp_y))
    }

    /// Log probability of the `[batch_size, 3]` action indices.
    fn logp_of(&self, obs: &Tensor, mask: &Tensor, act: &Tensor) -> Result<Tensor> {
        let (lp_fn, lp_x, lp_y) = self.log_probs(obs, mask)?;
        let pick = |lp: &Tensor, col: usize| -> Result<Tensor> {
            let ix = act.narrow(1, col, 1)?.contiguous()?;
            Ok(lp.gather(&ix, 1)?)
        };
        let logp = ((pick(&lp_fn, 0)? + pick(&lp_x, 1)?)? + pick(&lp_y, 2)?)?;
        Ok(logp.squeeze(1)?)
    }

    fn value(&self, obs: &Tensor) -> Result<Tensor> {
        Ok(self.critic.forward(obs)?.squeeze(1)?)
    }

    fn call_of(&self, act: [u32; 3]) -> Result<FunctionCall> {
        let point = (norm(act[1], self.screen.0), norm(act[2], self.screen.1));
        Ok(self.act_spec.call_at(act[0] as usize, point)?)
    }
}

/// The step whose reward has not been observed yet.
struct Pending {
    obs: Vec<f32>,
    mask: Vec<f32>,
    act: [u32; 3],
    value: f32,
    logp: f32,
}

/// Proximal policy optimization (PPO) agent with a clipped objective.
///
/// A trajectory ends when the episode terminates, when it reaches
/// `max_trajectory_length` steps, or when the episode is stopped by the
/// step ceiling. Cut trajectories are bootstrapped with the critic. Every
/// finished trajectory triggers one update.
pub struct Ppo {
    config: PpoConfig,
    device: Device,
    nets: Option<Nets>,
    buffer: TrajectoryBuffer,
    rng: SmallRng,
    pending: Option<Pending>,
    n_trajectories: usize,
    trajectory_lengths: Vec<usize>,
    train: bool,
}

impl Ppo {
    /// Constructs the agent. Networks are built in [`Policy::setup`].
    pub fn build(config: PpoConfig) -> Result<Self> {
        let device = config.device.build()?;
        Ok(Self {
            rng: SmallRng::seed_from_u64(config.seed),
            config,
            device,
            nets: None,
            buffer: TrajectoryBuffer::new(),
            pending: None,
            n_trajectories: 0,
            trajectory_lengths: vec![],
            train: true,
        })
    }

    /// Number of trajectories used for updates so far.
    pub fn n_trajectories(&self) -> usize {
        self.n_trajectories
    }

    /// Lengths of the trajectories used for updates, oldest first.
    pub fn trajectory_lengths(&self) -> &[usize] {
        &self.trajectory_lengths
    }

    fn nets(&self) -> Result<&Nets> {
        Ok(self.nets.as_ref().ok_or(ScvError::NotSetUp)?)
    }

    fn value_of(&self, obs: &Sc2Obs) -> Result<f32> {
        let nets = self.nets()?;
        let x = rows_to_tensor(&[nets.encoder.encode(obs)], &self.device)?;
        Ok(nets.value(&x)?.to_vec1::<f32>()?[0])
    }

    fn sample(&mut self, obs: &Sc2Obs) -> Result<(FunctionCall, Pending)> {
        if obs.available_actions.is_empty() {
            return Err(ScvError::NoAvailableAction.into());
        }
        let nets = self.nets.as_ref().ok_or(ScvError::NotSetUp)?;
        let enc = nets.encoder.encode(obs);
        let mask = nets.mask(&obs.available_actions);
        let x = rows_to_tensor(&[enc.clone()], &self.device)?;
        let m = rows_to_tensor(&[mask.clone()], &self.device)?;

        let (lp_fn, lp_x, lp_y) = nets.log_probs(&x, &m)?;
        let row = |t: Tensor| -> Result<Vec<f32>> {
            t.to_vec2::<f32>()?
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("Empty actor output"))
        };
        let lps = [row(lp_fn)?, row(lp_x)?, row(lp_y)?];

        let mut act = [0u32; 3];
        for (i, lp) in lps.iter().enumerate() {
            let ix = match self.train {
                true => {
                    let probs: Vec<f32> = lp.iter().map(|v| v.exp()).collect();
                    self.rng.sample(WeightedIndex::new(&probs)?)
                }
                false => {
                    let all: Vec<usize> = match i {
                        0 => obs.available_actions.clone(),
                        _ => (0..lp.len()).collect(),
                    };
                    argmax_among(lp, &all).unwrap_or(0)
                }
            };
            act[i] = ix as u32;
        }
        let logp = lps
            .iter()
            .zip(act.iter())
            .map(|(lp, &ix)| lp[ix as usize])
            .sum();
        let value = nets.value(&x)?.to_vec1::<f32>()?[0];
        let call = nets.call_of(act)?;

        Ok((
            call,
            Pending {
                obs: enc,
                mask,
                act,
                value,
                logp,
            },
        ))
    }

    /// Ends the current trajectory and updates actor and critic on it.
    fn finish_trajectory(&mut self, last_value: f32) -> Result<Record> {
        let batch = self
            .buffer
            .finish(last_value, self.config.gamma, self.config.lambda);
        self.n_trajectories += 1;
        self.trajectory_lengths.push(batch.len());
        debug!(
            "Trajectory {} finished with {} steps",
            self.n_trajectories,
            batch.len()
        );
        self.update(&batch)
    }

    fn update(&mut self, batch: &PpoBatch) -> Result<Record> {
        let nets = self.nets.as_mut().ok_or(ScvError::NotSetUp)?;
        let device = &self.device;
        let n = batch.len();
        let obs = rows_to_tensor(&batch.obs, device)?;
        let mask = rows_to_tensor(&batch.mask, device)?;
        let act = Tensor::from_vec(batch.act.clone(), (n, 3), device)?;
        let adv = Tensor::from_slice(&batch.advantages[..], (n,), device)?;
        let ret = Tensor::from_slice(&batch.returns[..], (n,), device)?;
        let logp_old = Tensor::from_slice(&batch.logp[..], (n,), device)?;
        let clip = self.config.clip_ratio;

        let mut loss_actor = 0f32;
        let mut approx_kl = 0f32;
        let mut actor_iterations = 0;
        for i in 0..self.config.actor_train_iterations {
            let logp = nets.logp_of(&obs, &mask, &act)?;
            approx_kl = (&logp_old - &logp)?.mean_all()?.to_scalar::<f32>()?;
            if approx_kl > 1.5 * self.config.target_kl {
                info!("Early stopping at step {} due to reaching max kl", i);
                break;
            }

            let ratio = (&logp - &logp_old)?.exp()?;
            let clipped = ratio.clamp(1.0 - clip, 1.0 + clip)?;
            let surrogate = ratio.mul(&adv)?.minimum(&clipped.mul(&adv)?)?;
            let loss = surrogate.mean_all()?.neg()?;
            nets.actor.backward_step(&loss)?;
            loss_actor = loss.to_scalar::<f32>()?;
            actor_iterations += 1;
        }

        let mut loss_critic = 0f32;
        for _ in 0..self.config.critic_train_iterations {
            let loss = mse(&nets.value(&obs)?, &ret)?;
            nets.critic.backward_step(&loss)?;
            loss_critic = loss.to_scalar::<f32>()?;
        }

        Ok(Record::from_slice(&[
            ("loss_actor", RecordValue::Scalar(loss_actor)),
            ("loss_critic", RecordValue::Scalar(loss_critic)),
            ("approx_kl", RecordValue::Scalar(approx_kl)),
            ("actor_iterations", RecordValue::Scalar(actor_iterations as f32)),
            ("trajectory_length", RecordValue::Scalar(n as f32)),
        ]))
    }
}

impl<E> Policy<E> for Ppo
where
    E: Env<Obs = Sc2Obs, Act = FunctionCall, ObsSpec = Sc2ObsSpec, ActSpec = Sc2ActSpec>,
{
    fn setup(&mut self, obs_spec: &Sc2ObsSpec, act_spec: &Sc2ActSpec) -> Result<()> {
        self.nets = Some(Nets::build(&self.config, obs_spec, act_spec, &self.device)?);
        Ok(())
    }

    fn reset(&mut self) {
        self.pending = None;
    }

    fn step(&mut self, timestep: &TimeStep<Sc2Obs>) -> Result<FunctionCall> {
        let (call, pending) = self.sample(&timestep.observation)?;
        self.pending = Some(pending);
        Ok(call)
    }
}

impl<E> Agent<E> for Ppo
where
    E: Env<Obs = Sc2Obs, Act = FunctionCall, ObsSpec = Sc2ObsSpec, ActSpec = Sc2ActSpec>,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn observe(&mut self, transition: Transition<E>) -> Result<Option<Record>> {
        if !self.train {
            return Ok(None);
        }
        let p = self
            .pending
            .take()
            .ok_or_else(|| anyhow!("Transition observed without a preceding step"))?;
        self.buffer.store(PpoStep {
            obs: p.obs,
            mask: p.mask,
            act: p.act,
            reward: transition.reward,
            value: p.value,
            logp: p.logp,
        });

        if transition.is_terminated {
            Ok(Some(self.finish_trajectory(0.0)?))
        } else if self.buffer.len() >= self.config.max_trajectory_length {
            let last_value = self.value_of(&transition.next_obs)?;
            Ok(Some(self.finish_trajectory(last_value)?))
        } else {
            Ok(None)
        }
    }

    fn end_episode(&mut self, last_obs: &Sc2Obs, stats: &EpisodeStats) -> Result<Option<Record>> {
        if !self.train || self.buffer.is_empty() {
            return Ok(None);
        }
        let last_value = match stats.end {
            EpisodeEnd::Terminated => 0.0,
            _ => self.value_of(last_obs)?,
        };
        Ok(Some(self.finish_trajectory(last_value)?))
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        let nets = self.nets()?;
        nets.actor.save(path.join("actor.safetensors"))?;
        nets.critic.save(path.join("critic.safetensors"))?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        let nets = self.nets.as_mut().ok_or(ScvError::NotSetUp)?;
        nets.actor.load(path.join("actor.safetensors"))?;
        nets.critic.load(path.join("critic.safetensors"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scv_core::dummy::{dummy_act_spec, dummy_obs, dummy_obs_spec};

    fn agent() -> Result<Ppo> {
        let mut ppo = Ppo::build(PpoConfig::default().units(vec![8]))?;
        ppo.nets = Some(Nets::build(
            &ppo.config,
            &dummy_obs_spec(8),
            &dummy_act_spec(8),
            &Device::Cpu,
        )?);
        Ok(ppo)
    }

    #[test]
    fn masked_functions_are_never_sampled() -> Result<()> {
        let mut ppo = agent()?;
        let obs = dummy_obs(8, vec![1, 3]);
        for _ in 0..100 {
            let (call, _) = ppo.sample(&obs)?;
            assert!(call.function == 1 || call.function == 3, "{:?}", call);
            assert!(ppo.nets()?.act_spec.is_valid(&call, &obs.available_actions));
        }
        Ok(())
    }

    #[test]
    fn sampled_log_probability_matches_the_batched_one() -> Result<()> {
        let mut ppo = agent()?;
        let obs = dummy_obs(8, vec![0, 2]);
        let (_, p) = ppo.sample(&obs)?;

        let nets = ppo.nets()?;
        let x = rows_to_tensor(&[p.obs.clone()], &Device::Cpu)?;
        let m = rows_to_tensor(&[p.mask.clone()], &Device::Cpu)?;
        let act = Tensor::from_vec(p.act.to_vec(), (1, 3), &Device::Cpu)?;
        let logp = nets.logp_of(&x, &m, &act)?.to_vec1::<f32>()?[0];
        assert!((logp - p.logp).abs() < 1e-4, "{} vs {}", logp, p.logp);
        Ok(())
    }

    #[test]
    fn sampling_is_reproducible_from_the_seed() -> Result<()> {
        let mut ppo = agent()?;
        let obs = dummy_obs(8, vec![0, 1, 2, 3]);
        let draw = |ppo: &mut Ppo| -> Result<Vec<[u32; 3]>> {
            ppo.rng = SmallRng::seed_from_u64(7);
            (0..20).map(|_| Ok(ppo.sample(&obs)?.1.act)).collect()
        };
        let first = draw(&mut ppo)?;
        assert_eq!(first, draw(&mut ppo)?);
        Ok(())
    }

    #[test]
    fn sampling_without_available_functions_fails() -> Result<()> {
        let mut ppo = agent()?;
        assert!(ppo.sample(&dummy_obs(8, vec![])).is_err());
        Ok(())
    }
}
