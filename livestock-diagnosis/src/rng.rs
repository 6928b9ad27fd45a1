use blake2::{Blake2b512, Digest};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Make a random number generator from the training seed and a string id.
///
/// Every tree of the forest needs its own stream of randomness, yet the
/// whole forest must come out identical for the same seed. The id and seed
/// are concatenated and hashed; the first 32 bytes of the hash seed the
/// generator. Reusing an id with the same seed reproduces the same stream.
pub fn make_rng(seed: u64, id: &str) -> ChaCha8Rng {
    let message = format!("{id}{seed}");
    let mut hasher = Blake2b512::new();
    hasher.update(message);
    let digest = hasher.finalize();

    let mut key = [0u8; 32];
    key.copy_from_slice(&digest[..32]);
    ChaCha8Rng::from_seed(key)
}
