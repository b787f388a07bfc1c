//! On-policy trajectory storage and advantage estimation.

/// Discounted cumulative sums: `y[t] = x[t] + factor * y[t + 1]`.
pub fn discount_cumsum(xs: &[f32], factor: f32) -> Vec<f32> {
    let mut ys = vec![0f32; xs.len()];
    let mut acc = 0f32;
    for (t, &x) in xs.iter().enumerate().rev() {
        acc = x + factor * acc;
        ys[t] = acc;
    }
    ys
}

/// Generalised advantage estimates and rewards-to-go of one trajectory.
///
/// `last_value` bootstraps the trajectory: `0` when the episode
/// terminated, the critic's estimate of the last observation when the
/// trajectory was cut.
pub fn gae(
    rewards: &[f32],
    values: &[f32],
    last_value: f32,
    gamma: f32,
    lambda: f32,
) -> (Vec<f32>, Vec<f32>) {
    let n = rewards.len();
    let next_value = |t: usize| if t + 1 < n { values[t + 1] } else { last_value };
    let deltas: Vec<f32> = (0..n)
        .map(|t| rewards[t] + gamma * next_value(t) - values[t])
        .collect();
    let advantages = discount_cumsum(&deltas, gamma * lambda);

    let mut rewards_ext = rewards.to_vec();
    rewards_ext.push(last_value);
    let mut returns = discount_cumsum(&rewards_ext, gamma);
    returns.truncate(n);

    (advantages, returns)
}

/// One step of a trajectory.
#[derive(Debug, Clone)]
pub struct PpoStep {
    /// Encoded observation.
    pub obs: Vec<f32>,

    /// Additive mask of the function logits.
    pub mask: Vec<f32>,

    /// Indices of function, x and y.
    pub act: [u32; 3],

    /// Reward received after the action.
    pub reward: f32,

    /// Critic's value of `obs`.
    pub value: f32,

    /// Log probability of `act` when it was sampled.
    pub logp: f32,
}

/// Data of a finished trajectory, ready for an update.
#[derive(Debug, Default)]
pub struct PpoBatch {
    /// Encoded observations.
    pub obs: Vec<Vec<f32>>,

    /// Function logit masks.
    pub mask: Vec<Vec<f32>>,

    /// Flattened `[function, x, y]` indices.
    pub act: Vec<u32>,

    /// Normalised advantages.
    pub advantages: Vec<f32>,

    /// Rewards-to-go.
    pub returns: Vec<f32>,

    /// Log probabilities at sampling time.
    pub logp: Vec<f32>,
}

impl PpoBatch {
    /// Number of steps.
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    /// Returns `true` if there is no step.
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }
}

/// Collects the steps of the current trajectory.
#[derive(Default)]
pub struct TrajectoryBuffer {
    steps: Vec<PpoStep>,
}

impl TrajectoryBuffer {
    /// Constructs an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of steps of the current trajectory.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the current trajectory has no step.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Appends a step.
    pub fn store(&mut self, step: PpoStep) {
        self.steps.push(step);
    }

    /// Ends the current trajectory and returns it with advantages
    /// normalised to zero mean and unit variance.
    pub fn finish(&mut self, last_value: f32, gamma: f32, lambda: f32) -> PpoBatch {
        let steps = std::mem::take(&mut self.steps);
        let rewards: Vec<f32> = steps.iter().map(|s| s.reward).collect();
        let values: Vec<f32> = steps.iter().map(|s| s.value).collect();
        let (mut advantages, returns) = gae(&rewards, &values, last_value, gamma, lambda);
        normalize(&mut advantages);

        let mut batch = PpoBatch {
            advantages,
            returns,
            ..Default::default()
        };
        for s in steps {
            batch.obs.push(s.obs);
            batch.mask.push(s.mask);
            batch.act.extend_from_slice(&s.act);
            batch.logp.push(s.logp);
        }
        batch
    }
}

fn normalize(xs: &mut [f32]) {
    if xs.is_empty() {
        return;
    }
    let n = xs.len() as f32;
    let mean = xs.iter().sum::<f32>() / n;
    let std = (xs.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / n).sqrt();
    for x in xs.iter_mut() {
        *x = (*x - mean) / (std + 1e-8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &[f32], b: &[f32]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn discounted_sums() {
        assert!(close(&discount_cumsum(&[1.0, 1.0, 1.0], 0.5), &[1.75, 1.5, 1.0]));
        assert!(discount_cumsum(&[], 0.9).is_empty());
    }

    #[test]
    fn gae_matches_a_hand_computation() {
        let (gamma, lambda) = (0.9, 0.5);
        let rewards = [1.0, 0.0, 2.0];
        let values = [0.5, 1.0, 1.5];
        let last_value = 2.0;

        // deltas: 1 + 0.9*1.0 - 0.5 = 1.4
        //         0 + 0.9*1.5 - 1.0 = 0.35
        //         2 + 0.9*2.0 - 1.5 = 2.3
        // advantages with gamma * lambda = 0.45:
        //         a2 = 2.3
        //         a1 = 0.35 + 0.45 * 2.3 = 1.385
        //         a0 = 1.4 + 0.45 * 1.385 = 2.02325
        // returns: r2 = 2 + 0.9*2 = 3.8, r1 = 0 + 0.9*3.8 = 3.42, r0 = 1 + 0.9*3.42 = 4.078
        let (adv, ret) = gae(&rewards, &values, last_value, gamma, lambda);
        assert!(close(&adv, &[2.02325, 1.385, 2.3]), "{:?}", adv);
        assert!(close(&ret, &[4.078, 3.42, 3.8]), "{:?}", ret);
    }

    #[test]
    fn terminal_trajectory_is_not_bootstrapped() {
        let (adv, ret) = gae(&[1.0], &[0.25], 0.0, 0.99, 0.97);
        assert!(close(&adv, &[0.75]));
        assert!(close(&ret, &[1.0]));
    }

    #[test]
    fn finish_empties_the_buffer_and_normalises() {
        let mut buffer = TrajectoryBuffer::new();
        for i in 0..4 {
            buffer.store(PpoStep {
                obs: vec![i as f32],
                mask: vec![0.0],
                act: [0, i, i],
                reward: i as f32,
                value: 0.0,
                logp: -1.0,
            });
        }
        let batch = buffer.finish(0.0, 0.99, 0.97);
        assert!(buffer.is_empty());
        assert_eq!(batch.len(), 4);
        assert_eq!(batch.act.len(), 12);
        let mean = batch.advantages.iter().sum::<f32>() / 4.0;
        assert!(mean.abs() < 1e-5);
    }
}
