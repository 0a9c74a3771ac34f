use crate::pool::PlayerPool;
use crate::types::{Match, Player, SIGMA_MAX, SIGMA_MIN};

/// Offset subtracted from sigma before scaling into an mmr swing
const SIGMA_OFFSET: f64 = 1.5;
/// Mmr per unit of (sigma - offset)
const SWING_SCALE: f64 = 9.0;
/// Largest mmr change a single game can cause
pub const MAX_MMR_SWING: i64 = 18;
/// Flat hidden-skill change on a win or loss
const SKILL_SWING: i64 = 9;
/// Games over which sigma ramps down from SIGMA_MAX
const SIGMA_RAMP_GAMES: u32 = 15;
/// Hidden skill below this is considered broken...
pub const REAL_SKILL_FLOOR: i64 = 30;
/// ...and is snapped back to this value
pub const REAL_SKILL_RESET: i64 = 100;

/// Rounded mmr swing for a given sigma, capped at MAX_MMR_SWING
pub fn mmr_delta(sigma: f64) -> i64 {
    let delta = ((sigma - SIGMA_OFFSET) * SWING_SCALE).round() as i64;
    // The cap only shrinks large gains, never raises small ones
    if delta > MAX_MMR_SWING {
        MAX_MMR_SWING
    } else {
        delta
    }
}

/// Volatility after `games_played` games with the given streak.
///
/// Linear ramp from 3.5 toward 2.5 over the first 15 games. Past that the
/// value grows with streak length, so long runs re-inflate sigma.
pub fn calc_sigma(games_played: u32, streak: i32) -> f64 {
    if games_played < SIGMA_RAMP_GAMES {
        SIGMA_MAX - f64::from(games_played) / f64::from(SIGMA_RAMP_GAMES)
    } else {
        let half_streak = f64::from(streak) / 2.0;
        SIGMA_MAX.min(SIGMA_MIN + half_streak * half_streak)
    }
}

/// Snap hidden skill back to REAL_SKILL_RESET when it drops below the floor
pub fn apply_skill_floor(player: &mut Player) {
    if player.real_skill < REAL_SKILL_FLOOR {
        player.real_skill = REAL_SKILL_RESET;
    }
}

/// Applies post-game rating, skill, streak and sigma changes
#[derive(Clone, Copy, Debug, Default)]
pub struct RatingUpdater;

impl RatingUpdater {
    pub fn new() -> Self {
        Self
    }

    /// Update every participant of a resolved match
    pub fn apply_result(&self, game: &Match, pool: &mut PlayerPool) {
        for team in game.teams() {
            for &id in &team.player_ids {
                if let Some(player) = pool.get_mut(id) {
                    self.update_player(player, team.result);
                }
            }
        }
    }

    pub fn update_player(&self, player: &mut Player, won: bool) {
        player.games_played += 1;
        player.real_skill += 1;

        let delta = mmr_delta(player.sigma);
        if won {
            player.mmr += delta;
            player.real_skill += SKILL_SWING;
            player.streak = if player.streak < 0 { 1 } else { player.streak + 1 };
        } else {
            player.mmr = (player.mmr - delta).max(0);
            player.real_skill -= SKILL_SWING;
            player.streak = if player.streak > 0 { -1 } else { player.streak - 1 };
        }

        player.sigma = calc_sigma(player.games_played, player.streak);

        if player.streak.abs() > 1 {
            player.real_skill += i64::from(player.streak);
        }

        apply_skill_floor(player);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Side, Team};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_mmr_delta_values() {
        assert_eq!(mmr_delta(3.5), 18);
        assert_eq!(mmr_delta(2.5), 9);
        assert_eq!(mmr_delta(2.75), 11);
        // 3.5 - 1/15 -> 17.4
        assert_eq!(mmr_delta(SIGMA_MAX - 1.0 / 15.0), 17);
    }

    #[test]
    fn test_calc_sigma_ramp_and_streak_branch() {
        assert_eq!(calc_sigma(0, 0), 3.5);
        assert!((calc_sigma(3, 2) - 3.3).abs() < 1e-12);
        // At 15 games the streak branch applies
        assert_eq!(calc_sigma(15, 0), 2.5);
        assert_eq!(calc_sigma(15, 1), 2.75);
        assert_eq!(calc_sigma(15, -1), 2.75);
        assert_eq!(calc_sigma(40, 2), 3.5);
        assert_eq!(calc_sigma(40, -9), 3.5);
    }

    #[test]
    fn test_win_from_fresh_player() {
        let mut player = Player::new(0, 1000, 500);
        RatingUpdater::new().update_player(&mut player, true);

        assert_eq!(player.mmr, 1018);
        assert_eq!(player.games_played, 1);
        assert_eq!(player.streak, 1);
        // +1 flat, +9 win, streak of 1 gives no nudge
        assert_eq!(player.real_skill, 510);
        assert!((player.sigma - (3.5 - 1.0 / 15.0)).abs() < 1e-12);
    }

    #[test]
    fn test_loss_floors_mmr_at_zero() {
        let mut player = Player::new(0, 10, 500);
        RatingUpdater::new().update_player(&mut player, false);

        assert_eq!(player.mmr, 0);
        assert_eq!(player.streak, -1);
        assert_eq!(player.real_skill, 492);
    }

    #[test]
    fn test_streak_flips_and_nudges_skill() {
        let updater = RatingUpdater::new();
        let mut player = Player::new(0, 1000, 500);
        player.streak = 3;

        updater.update_player(&mut player, false);
        assert_eq!(player.streak, -1);

        updater.update_player(&mut player, false);
        assert_eq!(player.streak, -2);
        // previous 492, +1, -9, then the -2 streak nudge
        assert_eq!(player.real_skill, 482);

        updater.update_player(&mut player, true);
        assert_eq!(player.streak, 1);
    }

    #[test]
    fn test_low_skill_snaps_to_reset_value() {
        let mut player = Player::new(0, 100, 35);
        RatingUpdater::new().update_player(&mut player, false);
        // 35 + 1 - 9 = 27 < 30
        assert_eq!(player.real_skill, REAL_SKILL_RESET);
    }

    #[test]
    fn test_long_run_keeps_invariants() {
        let updater = RatingUpdater::new();
        let mut rng = StdRng::seed_from_u64(21);
        let mut player = Player::new(0, 50, 200);

        for _ in 0..500 {
            let before = player.mmr;
            updater.update_player(&mut player, rand::Rng::gen_bool(&mut rng, 0.4));
            assert!((SIGMA_MIN..=SIGMA_MAX).contains(&player.sigma));
            assert!(player.mmr >= 0);
            assert!((player.mmr - before).abs() <= MAX_MMR_SWING);
            assert!(player.real_skill >= REAL_SKILL_FLOOR);
            assert_ne!(player.streak, 0);
        }
    }

    #[test]
    fn test_apply_result_updates_both_teams() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut pool = PlayerPool::new(10);
        pool.add_players(2, 1000, 500, 0, &mut rng).unwrap();

        let players = pool.players();
        let mut game = Match::new(
            Team::from_players(&[&players[0]]),
            Team::from_players(&[&players[1]]),
        );
        game.set_winner(Side::B);
        RatingUpdater::new().apply_result(&game, &mut pool);

        assert_eq!(pool.get(0).unwrap().mmr, 982);
        assert_eq!(pool.get(1).unwrap().mmr, 1018);
        assert_eq!(pool.get(0).unwrap().games_played, 1);
        assert_eq!(pool.get(1).unwrap().games_played, 1);
    }
}
