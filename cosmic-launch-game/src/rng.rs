//! Seeded random streams for a session.
//!
//! Outcome sampling and cosmetic choreography draw from separate streams so
//! that shuffling decoys can never shift which body a rocket strikes.

use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

use crate::constants::{RNG_DOMAIN_CHOREOGRAPHY, RNG_DOMAIN_OUTCOME};

/// Independent random streams derived from one session seed.
#[derive(Debug, Clone)]
pub struct RngBundle {
    seed: u64,
    outcome: CountingRng<ChaCha20Rng>,
    choreography: CountingRng<SmallRng>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            seed,
            outcome: CountingRng::new(ChaCha20Rng::seed_from_u64(derive_stream_seed(
                seed,
                RNG_DOMAIN_OUTCOME,
            ))),
            choreography: CountingRng::new(SmallRng::seed_from_u64(derive_stream_seed(
                seed,
                RNG_DOMAIN_CHOREOGRAPHY,
            ))),
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Stream consumed by the outcome resolver.
    pub fn outcome(&mut self) -> &mut CountingRng<ChaCha20Rng> {
        &mut self.outcome
    }

    /// Stream consumed by cosmetic decisions such as decoy order.
    pub fn choreography(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.choreography
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl<R> CountingRng<R> {
    const fn new(rng: R) -> Self {
        Self { rng, draws: 0 }
    }

    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    // HMAC accepts keys of any length, so construction cannot fail.
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
