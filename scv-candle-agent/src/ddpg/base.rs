use super::DdpgConfig;
use crate::{
    encoder::ObsEncoder,
    mlp::{Activation, MlpConfig},
    model::Model,
    opt::OptimizerConfig,
    replay_buffer::{Batch, EncodedTransition, ReplayBuffer},
    util::{argmax_among, rows_to_tensor, track},
};
use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use candle_nn::loss::mse;
use log::{info, trace};
use scv_core::{
    error::ScvError,
    record::{Record, RecordValue},
    sc2::{FunctionCall, RandomAgent, Sc2ActSpec, Sc2Obs, Sc2ObsSpec},
    Agent, Env, Policy, TimeStep, Transition,
};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, Write},
    path::Path,
};

const STATE_FILE: &str = "ddpg_state.yaml";
const BUFFER_FILE: &str = "replay_buffer.bin";

/// Counters persisted with the parameters, so that a restored agent does
/// not warm up again. The replay buffer is stored next to them.
#[derive(Debug, Deserialize, Serialize, PartialEq)]
struct DdpgState {
    env_steps: usize,
    n_updates: usize,
}

/// Networks built from the environment specs.
struct Nets {
    encoder: ObsEncoder,
    act_spec: Sc2ActSpec,
    actor: Model,
    actor_tgt: Model,
    critic: Model,
    critic_tgt: Model,
}

fn q_value(critic: &Model, obs: &Tensor, act: &Tensor) -> Result<Tensor> {
    let input = Tensor::cat(&[obs, act], 1)?;
    Ok(critic.forward(&input)?.squeeze(1)?)
}

impl Nets {
    fn build(config: &DdpgConfig, obs_spec: &Sc2ObsSpec, act_spec: &Sc2ActSpec, device: &Device) -> Result<Self> {
        let encoder = ObsEncoder::build(&config.encoder, obs_spec)?;
        let act_dim = act_spec.len() + 2;
        let actor_config = MlpConfig::new(encoder.dim(), config.units.clone(), act_dim, Activation::Tanh);
        let critic_config =
            MlpConfig::new(encoder.dim() + act_dim, config.units.clone(), 1, Activation::None);
        let actor_opt = OptimizerConfig::adam(config.actor_lr);
        let critic_opt = OptimizerConfig::adam(config.critic_lr);

        let nets = Self {
            actor: Model::build("actor", actor_config.clone(), Some(&actor_opt), device)?,
            actor_tgt: Model::build("actor", actor_config, None, device)?,
            critic: Model::build("critic", critic_config.clone(), Some(&critic_opt), device)?,
            critic_tgt: Model::build("critic", critic_config, None, device)?,
            encoder,
            act_spec: act_spec.clone(),
        };
        track(nets.actor_tgt.varmap(), nets.actor.varmap(), 1.0)?;
        track(nets.critic_tgt.varmap(), nets.critic.varmap(), 1.0)?;
        info!(
            "Built DDPG networks: obs dim {}, action dim {}",
            nets.encoder.dim(),
            act_dim
        );
        Ok(nets)
    }

    fn n_functions(&self) -> usize {
        self.act_spec.len()
    }

    /// Action vector of a call: `+1` for the called function, `-1` for the
    /// others, then its point mapped to `[-1, 1]`.
    fn act_vector_of(&self, call: &FunctionCall) -> Vec<f32> {
        let mut v = vec![-1f32; self.n_functions()];
        if let Some(s) = v.get_mut(call.function) {
            *s = 1.0;
        }
        let (x, y) = self.act_spec.point_of(call).unwrap_or((0.5, 0.5));
        v.push(2.0 * x - 1.0);
        v.push(2.0 * y - 1.0);
        v
    }

    fn call_of(&self, act: &[f32], available: &[usize]) -> Result<FunctionCall> {
        let n = self.n_functions();
        let function = argmax_among(&act[..n], available).ok_or(ScvError::NoAvailableAction)?;
        let point = ((act[n] + 1.0) / 2.0, (act[n + 1] + 1.0) / 2.0);
        Ok(self.act_spec.call_at(function, point)?)
    }

    fn update_critic(&mut self, batch: &Batch, gamma: f64, device: &Device) -> Result<f32> {
        let n = batch.len();
        let obs = rows_to_tensor(&batch.obs, device)?;
        let act = rows_to_tensor(&batch.act, device)?;
        let next_obs = rows_to_tensor(&batch.next_obs, device)?;
        let reward = Tensor::from_slice(&batch.reward[..], (n,), device)?;
        let is_terminated = Tensor::from_slice(&batch.is_terminated[..], (n,), device)?;

        let tgt = {
            let next_act = self.actor_tgt.forward(&next_obs)?;
            let next_q = q_value(&self.critic_tgt, &next_obs, &next_act)?;
            let not_done = ((1f64 - &is_terminated)? * gamma)?;
            (reward + not_done.mul(&next_q)?)?
        }
        .detach();

        let pred = q_value(&self.critic, &obs, &act)?;
        let loss = mse(&pred, &tgt)?;
        self.critic.backward_step(&loss)?;
        Ok(loss.to_scalar::<f32>()?)
    }

    fn update_actor(&mut self, batch: &Batch, device: &Device) -> Result<f32> {
        let obs = rows_to_tensor(&batch.obs, device)?;
        let act = self.actor.forward(&obs)?;
        let loss = q_value(&self.critic, &obs, &act)?.mean_all()?.neg()?;
        self.actor.backward_step(&loss)?;
        Ok(loss.to_scalar::<f32>()?)
    }

    fn soft_update(&self, tau: f64) -> Result<()> {
        track(self.actor_tgt.varmap(), self.actor.varmap(), tau)?;
        track(self.critic_tgt.varmap(), self.critic.varmap(), tau)?;
        Ok(())
    }
}

/// Deep deterministic policy gradient (DDPG) agent.
///
/// For the first `warmup_steps` environment steps it acts like
/// [`RandomAgent`] and does not update. Afterwards, every `update_steps`
/// environment steps it performs `update_steps` gradient steps on batches
/// drawn from the replay buffer.
pub struct Ddpg {
    config: DdpgConfig,
    device: Device,
    nets: Option<Nets>,
    buffer: ReplayBuffer,
    template: RandomAgent,
    last_act: Option<Vec<f32>>,
    env_steps: usize,
    n_updates: usize,
    train: bool,
}

impl Ddpg {
    /// Constructs the agent. Networks are built in [`Policy::setup`].
    pub fn build(config: DdpgConfig) -> Result<Self> {
        let device = config.device.build()?;
        Ok(Self {
            buffer: ReplayBuffer::new(config.replay_buffer_size, config.seed),
            template: RandomAgent::new(config.seed),
            config,
            device,
            nets: None,
            last_act: None,
            env_steps: 0,
            n_updates: 0,
            train: true,
        })
    }

    /// Environment steps observed so far.
    pub fn env_steps(&self) -> usize {
        self.env_steps
    }

    /// Gradient steps performed so far.
    pub fn n_updates(&self) -> usize {
        self.n_updates
    }

    /// Number of transitions in the replay buffer.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    fn nets(&self) -> Result<&Nets> {
        Ok(self.nets.as_ref().ok_or(ScvError::NotSetUp)?)
    }

    fn in_warmup(&self) -> bool {
        self.env_steps < self.config.warmup_steps
    }

    fn is_update_step(&self) -> bool {
        !self.in_warmup()
            && self.config.update_steps > 0
            && self.env_steps % self.config.update_steps == 0
            && self.buffer.len() >= self.config.batch_size
    }

    fn actor_action(&self, obs: &Sc2Obs) -> Result<Vec<f32>> {
        let nets = self.nets()?;
        let x = rows_to_tensor(&[nets.encoder.encode(obs)], &self.device)?;
        let mut act = nets.actor.forward(&x)?;
        if self.train && self.config.noise_std > 0.0 {
            let noise = act.randn_like(0., self.config.noise_std as f64)?;
            act = (act + noise)?.clamp(-1f32, 1f32)?;
        }
        act.to_vec2::<f32>()?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Empty actor output"))
    }

    fn opt(&mut self) -> Result<Record> {
        let nets = self.nets.as_mut().ok_or(ScvError::NotSetUp)?;
        let mut loss_critic = 0f32;
        let mut loss_actor = 0f32;
        let n = self.config.update_steps;

        for _ in 0..n {
            let batch = self.buffer.batch(self.config.batch_size)?;
            loss_critic += nets.update_critic(&batch, self.config.gamma, &self.device)?;
            loss_actor += nets.update_actor(&batch, &self.device)?;
            nets.soft_update(self.config.tau)?;
            self.n_updates += 1;
        }
        trace!("DDPG: {} gradient steps at env step {}", n, self.env_steps);

        Ok(Record::from_slice(&[
            ("loss_critic", RecordValue::Scalar(loss_critic / n as f32)),
            ("loss_actor", RecordValue::Scalar(loss_actor / n as f32)),
        ]))
    }
}

impl<E> Policy<E> for Ddpg
where
    E: Env<Obs = Sc2Obs, Act = FunctionCall, ObsSpec = Sc2ObsSpec, ActSpec = Sc2ActSpec>,
{
    fn setup(&mut self, obs_spec: &Sc2ObsSpec, act_spec: &Sc2ActSpec) -> Result<()> {
        self.nets = Some(Nets::build(&self.config, obs_spec, act_spec, &self.device)?);
        self.template = RandomAgent::new(self.config.seed).with_act_spec(act_spec.clone());
        Ok(())
    }

    fn reset(&mut self) {
        self.last_act = None;
    }

    fn step(&mut self, timestep: &TimeStep<Sc2Obs>) -> Result<FunctionCall> {
        let obs = &timestep.observation;
        if self.train && self.in_warmup() {
            let call = self.template.sample(obs)?;
            self.last_act = Some(self.nets()?.act_vector_of(&call));
            return Ok(call);
        }

        let act = self.actor_action(obs)?;
        let call = self.nets()?.call_of(&act, &obs.available_actions)?;
        self.last_act = Some(act);
        Ok(call)
    }
}

impl<E> Agent<E> for Ddpg
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

        let last_act = self.last_act.take();
        let nets = self.nets()?;
        let act = match last_act {
            Some(act) => act,
            None => nets.act_vector_of(&transition.act),
        };
        let tr = EncodedTransition {
            obs: nets.encoder.encode(&transition.obs),
            act,
            reward: transition.reward,
            next_obs: nets.encoder.encode(&transition.next_obs),
            is_terminated: transition.is_terminated,
        };
        self.buffer.push(tr);
        self.env_steps += 1;

        match self.is_update_step() {
            true => Ok(Some(self.opt()?)),
            false => Ok(None),
        }
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        let nets = self.nets()?;
        nets.actor.save(path.join("actor.safetensors"))?;
        nets.actor_tgt.save(path.join("actor_tgt.safetensors"))?;
        nets.critic.save(path.join("critic.safetensors"))?;
        nets.critic_tgt.save(path.join("critic_tgt.safetensors"))?;

        let state = DdpgState {
            env_steps: self.env_steps,
            n_updates: self.n_updates,
        };
        let mut file = File::create(path.join(STATE_FILE))?;
        file.write_all(serde_yaml::to_string(&state)?.as_bytes())?;
        self.buffer.save(path.join(BUFFER_FILE))?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        let nets = self.nets.as_mut().ok_or(ScvError::NotSetUp)?;
        nets.actor.load(path.join("actor.safetensors"))?;
        nets.actor_tgt.load(path.join("actor_tgt.safetensors"))?;
        nets.critic.load(path.join("critic.safetensors"))?;
        nets.critic_tgt.load(path.join("critic_tgt.safetensors"))?;

        let state_path = path.join(STATE_FILE);
        if state_path.is_file() {
            let state: DdpgState = serde_yaml::from_reader(BufReader::new(File::open(state_path)?))?;
            self.env_steps = state.env_steps;
            self.n_updates = state.n_updates;
        }
        let buffer_path = path.join(BUFFER_FILE);
        if buffer_path.is_file() {
            self.buffer.load(buffer_path)?;
        }
        info!(
            "Restored DDPG at env step {} with {} transitions",
            self.env_steps,
            self.buffer.len()
        );
        Ok(())
    }
}
