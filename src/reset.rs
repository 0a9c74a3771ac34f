use crate::error::{SimError, SimResult};
use crate::pool::PlayerPool;
use crate::rating::apply_skill_floor;
use crate::stats::median;
use crate::types::Player;
use serde::{Deserialize, Serialize};

/// Season-boundary rating reset
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResetPolicy {
    /// Clamp every rating above `cap` down to `cap`
    HardCap { cap: i64 },
    /// Pull every rating toward the population median:
    /// `median + (mmr - median) * factor`
    MedianSquish { factor: f64 },
}

impl ResetPolicy {
    pub fn validate(&self) -> SimResult<()> {
        match *self {
            ResetPolicy::HardCap { cap } if cap < 0 => Err(SimError::InvalidConfiguration(
                format!("hard cap must be non-negative, got {cap}"),
            )),
            ResetPolicy::MedianSquish { factor } if !factor.is_finite() || factor < 0.0 => {
                Err(SimError::InvalidConfiguration(format!(
                    "squish factor must be finite and non-negative, got {factor}"
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn apply(&self, pool: &mut PlayerPool) {
        match *self {
            ResetPolicy::HardCap { cap } => hard_cap_reset(pool, cap),
            ResetPolicy::MedianSquish { factor } => median_squish_reset(pool, factor),
        }
    }
}

/// Reconcile hidden skill with rating, then clamp ratings above `cap`
pub fn hard_cap_reset(pool: &mut PlayerPool, cap: i64) {
    for player in pool.players_mut() {
        fix_real_skill(player);
        if player.mmr > cap {
            player.mmr = cap;
        }
    }
}

/// Reconcile hidden skill with rating, then squish ratings toward the median
/// taken once over the whole pool before anyone is touched.
pub fn median_squish_reset(pool: &mut PlayerPool, factor: f64) {
    let Some(center) = median(&pool.mmr_values()) else {
        return;
    };

    for player in pool.players_mut() {
        fix_real_skill(player);
        let squished = center + (player.mmr as f64 - center) * factor;
        player.mmr = (squished.round() as i64).max(0);
    }
}

/// Keep hidden skill within 10% of the visible rating.
///
/// A non-positive skill has no meaningful ratio and goes straight to the
/// floor check.
pub fn fix_real_skill(player: &mut Player) {
    if player.real_skill > 0 {
        let ratio = player.mmr as f64 / player.real_skill as f64;
        if ratio < 0.9 {
            player.real_skill = (player.mmr as f64 * 1.1).round() as i64;
        } else if ratio > 1.1 {
            player.real_skill = (player.mmr as f64 * 0.9).round() as i64;
        }
    }
    apply_skill_floor(player);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::REAL_SKILL_RESET;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pool_with(values: &[(i64, i64)]) -> PlayerPool {
        let mut rng = StdRng::seed_from_u64(0);
        let mut pool = PlayerPool::new(100);
        for &(mmr, skill) in values {
            pool.add_players(1, mmr, skill, 0, &mut rng).unwrap();
        }
        pool
    }

    #[test]
    fn test_fix_real_skill_raises_and_lowers() {
        // 500 / 1000 = 0.5 < 0.9
        let mut player = Player::new(0, 500, 1000);
        fix_real_skill(&mut player);
        assert_eq!(player.real_skill, 550);

        // 1000 / 500 = 2.0 > 1.1
        let mut player = Player::new(0, 1000, 500);
        fix_real_skill(&mut player);
        assert_eq!(player.real_skill, 900);

        // Within band: untouched
        let mut player = Player::new(0, 1000, 1000);
        fix_real_skill(&mut player);
        assert_eq!(player.real_skill, 1000);
    }

    #[test]
    fn test_fix_real_skill_floor_reset() {
        // 10 / 200 = 0.05 -> 11, below floor -> reset
        let mut player = Player::new(0, 10, 200);
        fix_real_skill(&mut player);
        assert_eq!(player.real_skill, REAL_SKILL_RESET);

        let mut player = Player::new(0, 10, 0);
        fix_real_skill(&mut player);
        assert_eq!(player.real_skill, REAL_SKILL_RESET);
    }

    #[test]
    fn test_hard_cap_reset() {
        let mut pool = pool_with(&[(900, 900), (1500, 1500), (1200, 1200)]);
        hard_cap_reset(&mut pool, 1000);

        assert!(pool.players().iter().all(|p| p.mmr <= 1000));
        assert_eq!(pool.get(0).unwrap().mmr, 900);
        assert_eq!(pool.get(1).unwrap().mmr, 1000);
        // Skill is reconciled against the pre-clamp rating
        assert_eq!(pool.get(1).unwrap().real_skill, 1500);
    }

    #[test]
    fn test_squish_identity_with_factor_one() {
        let values = [(100, 100), (350, 350), (1200, 1200), (40, 40)];
        let mut pool = pool_with(&values);
        median_squish_reset(&mut pool, 1.0);

        for (player, &(mmr, _)) in pool.players().iter().zip(values.iter()) {
            assert_eq!(player.mmr, mmr);
        }
    }

    #[test]
    fn test_squish_zero_collapses_to_median() {
        let mut pool = pool_with(&[(100, 100), (300, 300), (1000, 1000)]);
        median_squish_reset(&mut pool, 0.0);
        assert!(pool.players().iter().all(|p| p.mmr == 300));
    }

    #[test]
    fn test_squish_uses_pre_reset_median() {
        let mut pool = pool_with(&[(100, 100), (200, 200), (600, 600)]);
        median_squish_reset(&mut pool, 0.5);

        // median 200 for every player, not recomputed as ratings move
        assert_eq!(pool.get(0).unwrap().mmr, 150);
        assert_eq!(pool.get(1).unwrap().mmr, 200);
        assert_eq!(pool.get(2).unwrap().mmr, 400);
    }

    #[test]
    fn test_policy_validation_and_dispatch() {
        assert!(ResetPolicy::HardCap { cap: -1 }.validate().is_err());
        assert!(ResetPolicy::MedianSquish { factor: f64::NAN }.validate().is_err());
        assert!(ResetPolicy::MedianSquish { factor: 0.0 }.validate().is_ok());

        let mut pool = pool_with(&[(2000, 2000)]);
        ResetPolicy::HardCap { cap: 1500 }.apply(&mut pool);
        assert_eq!(pool.get(0).unwrap().mmr, 1500);
    }

    #[test]
    fn test_policy_json_shape() {
        let policy: ResetPolicy =
            serde_json::from_str(r#"{"kind": "median_squish", "factor": 0.25}"#).unwrap();
        assert_eq!(policy, ResetPolicy::MedianSquish { factor: 0.25 });
    }
}
