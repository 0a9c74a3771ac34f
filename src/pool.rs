use crate::error::{SimError, SimResult};
use crate::types::{Player, PlayerSnapshot};
use rand::Rng;
use std::ops::Range;

/// Owns every player of a run. Players are appended, never removed, so a
/// player's id is also its index.
#[derive(Clone, Debug)]
pub struct PlayerPool {
    players: Vec<Player>,
    next_player_id: usize,
    max_players: usize,
}

impl PlayerPool {
    pub fn new(max_players: usize) -> Self {
        Self {
            players: Vec::new(),
            next_player_id: 0,
            max_players,
        }
    }

    /// Create `count` players at the given rating, with hidden skill drawn
    /// uniformly from `starting_skill ± skill_jitter`.
    ///
    /// Rejects the whole batch when it would push the pool past its cap, and
    /// rejects a negative jitter. Returns the id range of the new players.
    pub fn add_players(
        &mut self,
        count: usize,
        starting_mmr: i64,
        starting_skill: i64,
        skill_jitter: i64,
        rng: &mut impl Rng,
    ) -> SimResult<Range<usize>> {
        if skill_jitter < 0 {
            return Err(SimError::InvalidConfiguration(format!(
                "skill_jitter must be non-negative, got {skill_jitter}"
            )));
        }
        let available = self.remaining_capacity();
        if count > available {
            return Err(SimError::CapacityExceeded {
                requested: count,
                available,
                cap: self.max_players,
            });
        }

        let jitter = skill_jitter;
        let first = self.next_player_id;
        self.players.reserve(count);
        for _ in 0..count {
            let real_skill = starting_skill + rng.gen_range(-jitter..=jitter);
            self.players
                .push(Player::new(self.next_player_id, starting_mmr, real_skill));
            self.next_player_id += 1;
        }

        Ok(first..self.next_player_id)
    }

    pub fn remaining_capacity(&self) -> usize {
        self.max_players.saturating_sub(self.players.len())
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    /// Change the cap for future growth. Existing players are never dropped.
    pub fn set_max_players(&mut self, max_players: usize) {
        self.max_players = max_players;
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }

    pub fn mmr_values(&self) -> Vec<i64> {
        self.players.iter().map(|p| p.mmr).collect()
    }

    pub fn snapshot(&self) -> Vec<PlayerSnapshot> {
        self.players.iter().map(Player::snapshot).collect()
    }
}
