//! Discounted returns and generalized advantage estimation.
//!
//! Inputs are the stored fields of one environment over a segment of length
//! `T + 1`. Rewards and terminal flags are shifted by one step relative to
//! values: `rewards[t + 1]` and `terminals[t + 1]` are the outcome of the
//! action taken at `t`, so index `0` of both is unused. The value at index `T`
//! is the bootstrap value.
//!
//! With `V_next[t] = values[t + 1]` and `m[t] = 1 - terminals[t + 1]`,
//!
//! ```text
//! G[t] = rewards[t + 1] + gamma * m[t] * G[t + 1],         G[T] = values[T]
//! d[t] = rewards[t + 1] + gamma * m[t] * V_next[t] - values[t]
//! A[t] = d[t] + gamma * lambda * m[t] * A[t + 1],          A[T] = 0
//! ```
//!
//! Both recursions run backward from `t = T - 1` to `0`.
use crate::error::StrideError;

/// Returns and advantages of the first `T` steps of a segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Estimate {
    /// Discounted returns `G[0..T]`.
    pub returns: Vec<f32>,

    /// Generalized advantage estimates `A[0..T]`.
    pub advantages: Vec<f32>,
}

impl Estimate {
    /// Number of estimated steps, `T`.
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    /// Returns `true` if no step was estimated.
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }
}

/// Computes returns and advantages over a segment of length `T + 1`.
///
/// The three slices must have the same length. A segment shorter than two
/// steps has nothing to estimate and gives an empty [`Estimate`].
pub fn estimate(
    rewards: &[f32],
    values: &[f32],
    terminals: &[f32],
    gamma: f32,
    lambda: f32,
) -> Result<Estimate, StrideError> {
    let len = values.len();
    StrideError::check_len("rewards", len, rewards.len())?;
    StrideError::check_len("terminals", len, terminals.len())?;

    if len < 2 {
        return Ok(Estimate::default());
    }

    let horizon = len - 1;
    let mut returns = vec![0f32; horizon];
    let mut advantages = vec![0f32; horizon];

    let mut next_return = values[horizon];
    let mut next_value = values[horizon];
    let mut next_advantage = 0f32;

    for t in (0..horizon).rev() {
        let reward = rewards[t + 1];
        let mask = 1.0 - terminals[t + 1];
        let delta = reward + gamma * mask * next_value - values[t];

        returns[t] = reward + gamma * mask * next_return;
        advantages[t] = delta + gamma * lambda * mask * next_advantage;

        next_return = returns[t];
        next_value = values[t];
        next_advantage = advantages[t];
    }

    Ok(Estimate {
        returns,
        advantages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn assert_close(a: &[f32], b: &[f32]) {
        assert_eq!(a.len(), b.len());
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            assert!((x - y).abs() < EPS, "index {}: {} != {}", i, x, y);
        }
    }

    fn td_residuals(rewards: &[f32], values: &[f32], terminals: &[f32], gamma: f32) -> Vec<f32> {
        (0..values.len() - 1)
            .map(|t| {
                rewards[t + 1] + gamma * (1.0 - terminals[t + 1]) * values[t + 1] - values[t]
            })
            .collect()
    }

    #[test]
    fn test_four_step_segment() -> Result<(), StrideError> {
        let rewards = [1.0; 5];
        let values = [0.0; 5];
        let terminals = [0.0; 5];
        let est = estimate(&rewards, &values, &terminals, 0.99, 0.95)?;

        assert_close(&est.returns, &[3.940399, 2.9701, 1.99, 1.0]);
        // Values are all zero, so advantages discount by gamma * lambda instead
        assert_close(&est.advantages, &[3.6569504, 2.8250403, 1.9405, 1.0]);

        let mc = estimate(&rewards, &values, &terminals, 0.99, 1.0)?;
        assert_close(&mc.advantages, &est.returns);
        Ok(())
    }

    #[test]
    fn test_undiscounted_return_is_sum_plus_bootstrap() -> Result<(), StrideError> {
        let rewards = [9.0, 0.5, -1.0, 2.0, 0.25, 3.0];
        let values = [0.1, 0.2, 0.3, 0.4, 0.5, 1.5];
        let terminals = [0.0; 6];
        let est = estimate(&rewards, &values, &terminals, 1.0, 0.7)?;

        let expected = rewards[1..].iter().sum::<f32>() + values[5];
        assert!((est.returns[0] - expected).abs() < EPS);
        Ok(())
    }

    #[test]
    fn test_lambda_one_is_monte_carlo_advantage() -> Result<(), StrideError> {
        let rewards = [0.0, 1.0, -0.5, 2.0, 0.0, 1.0];
        let values = [0.3, -0.2, 0.8, 0.1, 0.4, 0.6];
        let terminals = [0.0, 0.0, 1.0, 0.0, 0.0, 0.0];
        let est = estimate(&rewards, &values, &terminals, 0.9, 1.0)?;

        let mc: Vec<f32> = est
            .returns
            .iter()
            .zip(values.iter())
            .map(|(g, v)| g - v)
            .collect();
        assert_close(&est.advantages, &mc);
        Ok(())
    }

    #[test]
    fn test_lambda_zero_is_td_residual_everywhere() -> Result<(), StrideError> {
        let rewards = [0.0, 1.0, -0.5, 2.0, 0.0, 1.0];
        let values = [0.3, -0.2, 0.8, 0.1, 0.4, 0.6];
        let terminals = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let est = estimate(&rewards, &values, &terminals, 0.9, 0.0)?;

        assert_close(&est.advantages, &td_residuals(&rewards, &values, &terminals, 0.9));
        Ok(())
    }

    #[test]
    fn test_gamma_zero_gives_immediate_rewards() -> Result<(), StrideError> {
        let rewards = [0.0, 1.0, 2.0, 3.0];
        let values = [0.5, 0.5, 0.5, 0.5];
        let terminals = [0.0; 4];
        let est = estimate(&rewards, &values, &terminals, 0.0, 0.95)?;

        assert_close(&est.returns, &[1.0, 2.0, 3.0]);
        assert_close(&est.advantages, &[0.5, 1.5, 2.5]);
        Ok(())
    }

    #[test]
    fn test_terminal_cuts_recursion() -> Result<(), StrideError> {
        // The episode ends with the action taken at t = 1
        let rewards = [0.0, 1.0, 1.0, 1.0];
        let values = [0.0, 0.0, 0.0, 10.0];
        let terminals = [0.0, 0.0, 1.0, 0.0];
        let est = estimate(&rewards, &values, &terminals, 0.5, 1.0)?;

        assert_close(&est.returns, &[1.5, 1.0, 6.0]);
        assert_close(&est.advantages, &[1.5, 1.0, 6.0]);
        Ok(())
    }

    #[test]
    fn test_inputs_are_not_mutated() -> Result<(), StrideError> {
        let rewards = vec![0.0, 1.0, 2.0];
        let values = vec![0.1, 0.2, 0.3];
        let terminals = vec![0.0, 0.0, 0.0];
        let (r, v, d) = (rewards.clone(), values.clone(), terminals.clone());
        let first = estimate(&rewards, &values, &terminals, 0.99, 0.95)?;
        let second = estimate(&rewards, &values, &terminals, 0.99, 0.95)?;

        assert_eq!(first, second);
        assert_eq!((r, v, d), (rewards, values, terminals));
        Ok(())
    }

    #[test]
    fn test_short_segments_are_empty() -> Result<(), StrideError> {
        assert!(estimate(&[], &[], &[], 0.99, 0.95)?.is_empty());
        assert!(estimate(&[1.0], &[0.5], &[0.0], 0.99, 0.95)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_length_mismatch() {
        let err = estimate(&[0.0, 1.0], &[0.0, 0.0, 0.0], &[0.0; 3], 0.99, 0.95).unwrap_err();
        assert_eq!(err, StrideError::shape("rewards", 3, 2));
    }
}
