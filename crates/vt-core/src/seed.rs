//! Deterministic random streams.
//!
//! Every trial owns its generator, derived from `(root seed, trial index)`,
//! and every policy's lottery owns another derived from
//! `(root seed, policy label, trial index)`. No stream is shared between
//! trials, so results do not depend on execution order or thread count.
//! Keying lotteries by label rather than position keeps a policy's draws
//! unchanged when other policies are added to or removed from a run.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// FNV-1a over the label, finished with SplitMix64 against the root seed.
pub fn derive_seed(root: u64, label: &str) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for b in label.as_bytes() {
        h ^= u64::from(*b);
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    splitmix64(root ^ h)
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Stream used to generate the cohort of one trial.
pub fn cohort_rng(root: u64, trial: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(derive_seed(root, "cohort"));
    rng.set_stream(trial as u64);
    rng
}

/// Stream used for one policy's lottery draws in one trial.
pub fn lottery_rng(root: u64, policy_label: &str, trial: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(derive_seed(root, policy_label));
    rng.set_stream(trial as u64);
    rng
}
