use crate::types::{Match, OutcomeWeights, Side, Team};
use rand::Rng;

/// Turns team composites into a win probability and draws the winner
#[derive(Clone, Copy, Debug, Default)]
pub struct OutcomeModel {
    weights: OutcomeWeights,
}

impl OutcomeModel {
    pub fn new(weights: OutcomeWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> OutcomeWeights {
        self.weights
    }

    /// Weighted blend of visible rating and hidden skill
    pub fn composite(&self, team: &Team) -> f64 {
        self.weights.mmr * team.mmr as f64 + self.weights.skill * team.real_skill as f64
    }

    /// Chance (in percent, 0-100) that `team_a` beats `team_b`
    pub fn win_probability(&self, team_a: &Team, team_b: &Team) -> f64 {
        let composite_a = self.composite(team_a);
        let total = composite_a + self.composite(team_b);

        let probability = composite_a / total * 100.0;
        if total <= 0.0 || !probability.is_finite() {
            return 50.0;
        }
        probability
    }

    /// Team A wins iff `probability_a` is strictly greater than a draw from
    /// 1..=100, so a draw of 100 always goes to B.
    pub fn draw_outcome(&self, probability_a: f64, rng: &mut impl Rng) -> Side {
        let draw: u32 = rng.gen_range(1..=100);
        if probability_a > f64::from(draw) {
            Side::A
        } else {
            Side::B
        }
    }

    /// Compute the probability for `game`, draw the winner and record it on
    /// the teams. Returns the winning side and team A's probability.
    pub fn resolve(&self, game: &mut Match, rng: &mut impl Rng) -> (Side, f64) {
        let probability_a = self.win_probability(&game.team_a, &game.team_b);
        let winner = self.draw_outcome(probability_a, rng);
        game.set_winner(winner);
        (winner, probability_a)
    }
}
