use crate::error::{SimError, SimResult};
use crate::pool::PlayerPool;
use crate::types::{
    Match, Player, SimulationConfig, Team, DEFAULT_MAX_ANCHOR_ATTEMPTS,
    DEFAULT_MAX_SAMPLES_PER_ANCHOR,
};
use rand::Rng;

/// Forms two comparably rated teams from the pool
#[derive(Clone, Debug, PartialEq)]
pub struct MatchBuilder {
    players_per_team: usize,
    max_mmr_distance: i64,
    max_anchor_attempts: usize,
    max_samples_per_anchor: usize,
}

impl MatchBuilder {
    pub fn new(players_per_team: usize, max_mmr_distance: i64) -> Self {
        Self {
            players_per_team,
            max_mmr_distance,
            max_anchor_attempts: DEFAULT_MAX_ANCHOR_ATTEMPTS,
            max_samples_per_anchor: DEFAULT_MAX_SAMPLES_PER_ANCHOR,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            players_per_team: config.players_per_team,
            max_mmr_distance: config.max_mmr_distance,
            max_anchor_attempts: config.max_anchor_attempts,
            max_samples_per_anchor: config.max_samples_per_anchor,
        }
    }

    pub fn with_retry_limits(mut self, anchors: usize, samples_per_anchor: usize) -> Self {
        self.max_anchor_attempts = anchors;
        self.max_samples_per_anchor = samples_per_anchor;
        self
    }

    pub fn players_per_team(&self) -> usize {
        self.players_per_team
    }

    fn within_distance(&self, anchor: &Player, candidate: &Player) -> bool {
        (candidate.mmr - anchor.mmr).abs() < self.max_mmr_distance
    }

    /// Pick an anchor, rejection-sample distinct candidates within
    /// `max_mmr_distance` of it, and deal them alternately into two teams.
    ///
    /// Sampling is bounded: each anchor gets `max_samples_per_anchor` draws and
    /// at most `max_anchor_attempts` anchors are tried before giving up.
    pub fn build_match(&self, pool: &PlayerPool, rng: &mut impl Rng) -> SimResult<Match> {
        let players = pool.players();
        let mut samples_drawn = 0;

        let Some(needed) = self.players_per_team.checked_mul(2) else {
            return Err(SimError::MatchBuildFailure {
                anchors_tried: 0,
                samples_drawn,
                needed: usize::MAX,
            });
        };
        if players.len() < needed {
            return Err(SimError::MatchBuildFailure {
                anchors_tried: 0,
                samples_drawn,
                needed,
            });
        }

        for attempt in 0..self.max_anchor_attempts {
            let anchor = &players[rng.gen_range(0..players.len())];

            // Hopeless anchors would only burn the sample budget
            let eligible = players
                .iter()
                .filter(|p| self.within_distance(anchor, p))
                .count();
            if eligible < needed {
                #[cfg(feature = "debug")]
                log::trace!(
                    "Anchor {} (mmr {}) has only {} eligible players, attempt {}",
                    anchor.id,
                    anchor.mmr,
                    eligible,
                    attempt
                );
                continue;
            }

            let mut candidates: Vec<usize> = Vec::with_capacity(needed);
            for _ in 0..self.max_samples_per_anchor {
                samples_drawn += 1;
                let candidate = &players[rng.gen_range(0..players.len())];
                if self.within_distance(anchor, candidate) && !candidates.contains(&candidate.id) {
                    candidates.push(candidate.id);
                    if candidates.len() == needed {
                        return Ok(self.split_teams(&candidates, players));
                    }
                }
            }

            log::debug!(
                "Anchor {} exhausted {} samples on attempt {} with {}/{} candidates",
                anchor.id,
                self.max_samples_per_anchor,
                attempt,
                candidates.len(),
                needed
            );
        }

        Err(SimError::MatchBuildFailure {
            anchors_tried: self.max_anchor_attempts,
            samples_drawn,
            needed,
        })
    }

    /// Strict alternation in acceptance order: even picks to A, odd to B
    fn split_teams(&self, candidates: &[usize], players: &[Player]) -> Match {
        let team_a: Vec<&Player> = candidates.iter().step_by(2).map(|&id| &players[id]).collect();
        let team_b: Vec<&Player> = candidates
            .iter()
            .skip(1)
            .step_by(2)
            .map(|&id| &players[id])
            .collect();

        Match::new(Team::from_players(&team_a), Team::from_players(&team_b))
    }
}
