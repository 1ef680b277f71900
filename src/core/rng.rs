//! Deterministic randomness
//!
//! Every random decision in the engine (mineral density rerolls, corpse
//! drops) draws from a generator seeded by `(game_time, object id)`. Running
//! the same tick twice from the same snapshot is bit-reproducible; there is
//! no global or unseeded random source anywhere in the core.

use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::types::{ObjectId, Tick};

/// Per-(tick, object) RNG stream
pub fn tick_rng(game_time: Tick, id: ObjectId) -> ChaCha8Rng {
    let seed = game_time
        .wrapping_mul(0x2545_f491_4f6c_dd1d)
        .wrapping_add(id.hash64());
    ChaCha8Rng::seed_from_u64(seed)
}
