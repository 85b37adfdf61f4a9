use std::collections::HashMap;

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::components::{PlayArea, Position};

/// Named, independently seeded random streams derived from one session seed.
///
/// Each consumer draws from its own stream so adding a new consumer never shifts
/// the sequence another one sees.
pub struct RngStreams {
    master: ChaCha8Rng,
    streams: HashMap<String, ChaCha8Rng>,
}

impl RngStreams {
    pub fn new(seed: u64) -> Self {
        Self {
            master: ChaCha8Rng::seed_from_u64(seed),
            streams: HashMap::new(),
        }
    }

    pub fn stream(&mut self, name: &str) -> &mut ChaCha8Rng {
        let master = &mut self.master;
        self.streams
            .entry(name.to_string())
            .or_insert_with(|| ChaCha8Rng::seed_from_u64(master.next_u64()))
    }
}

/// Uniform position inside `area` (`max` exclusive). An empty area yields `area.min`.
pub fn random_position(rng: &mut impl Rng, area: &PlayArea) -> Position {
    if area.max.x <= area.min.x || area.max.y <= area.min.y {
        return area.min;
    }
    Position::new(
        rng.gen_range(area.min.x..area.max.x),
        rng.gen_range(area.min.y..area.max.y),
    )
}
