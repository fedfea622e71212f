use rand::distributions::Uniform;
use rand::{Rng, SeedableRng};

use crate::pinch::{Pinch, Strand};

const BASES: &[u8; 4] = b"ACGT";

/// Creates a repeat family we can verify extraction against.
/// Every copy sits in its own lane between two random flanks, and is pinched over its full length to the copy in lane 1.
/// Returns a tuple of (repeat, named lane records, pinches); lanes are named "1", "2", ...
/// # Arguments
/// * `alphabet_size` - number of symbols to draw from "ACGT", between 2 and 4
/// * `repeat_len` - the length of the repeat
/// * `num_copies` - the number of copies (and lanes) to generate
/// * `flank_len` - the length of the random sequence on each side of a copy
/// * `error_rate` - per-base substitution rate applied to each copy; substitutions keep the pinches gapless
/// * `seed` - seed for the random generator
pub fn generate_repeat_family(alphabet_size: u8, repeat_len: usize, num_copies: usize, flank_len: usize, error_rate: f64, seed: u64) -> (Vec<u8>, Vec<(String, Vec<u8>)>, Vec<Pinch>) {
    assert!((2..=4).contains(&alphabet_size));
    assert!((0.0..=1.0).contains(&error_rate));

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let base_distribution = Uniform::new(0, alphabet_size);
    let basem1_distribution = Uniform::new(1, alphabet_size);
    let error_distribution = Uniform::new(0.0, 1.0);

    let repeat: Vec<u8> = (0..repeat_len)
        .map(|_i| rng.sample(base_distribution))
        .collect();

    let mut records = Vec::with_capacity(num_copies);
    for copy_index in 0..num_copies {
        let mut lane: Vec<u8> = (0..flank_len)
            .map(|_i| rng.sample(base_distribution))
            .collect();
        for &c in repeat.iter() {
            if rng.sample(error_distribution) < error_rate {
                // substitution to any other symbol
                lane.push((c + rng.sample(basem1_distribution)) % alphabet_size);
            } else {
                lane.push(c);
            }
        }
        lane.extend((0..flank_len).map(|_i| rng.sample(base_distribution)));

        let lane: Vec<u8> = lane.into_iter().map(|c| BASES[c as usize]).collect();
        records.push(((copy_index + 1).to_string(), lane));
    }

    let pinches: Vec<Pinch> = (2..=num_copies as i64)
        .map(|lane| Pinch::new(lane, flank_len, 1, flank_len, repeat_len, Strand::Forward))
        .collect();

    let repeat: Vec<u8> = repeat.into_iter().map(|c| BASES[c as usize]).collect();
    (repeat, records, pinches)
}
