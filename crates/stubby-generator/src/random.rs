use crate::error::Error;
use crate::Generator;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};
use stubby_core::alias::MAX_LENGTH;
use stubby_core::Alias;
use typed_builder::TypedBuilder;

/// Upper-case letters, lower-case letters and digits.
pub const DEFAULT_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
pub const DEFAULT_LENGTH: usize = 6;

#[derive(Debug, Clone, TypedBuilder)]
pub struct RandomAliasSettings {
    #[builder(default = DEFAULT_LENGTH)]
    length: usize,
    #[builder(default = DEFAULT_ALPHABET.to_string(), setter(into))]
    alphabet: String,
}

/// Where the generator's randomness comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntropySource {
    /// Seeded from the operating system entropy source.
    Os,
    /// The OS source was unavailable; seeded from the clock and process id.
    /// Output is predictable to anyone who can guess the seed.
    Fallback,
    /// Seeded explicitly by the caller.
    Seeded,
}

/// Draws fixed-length aliases uniformly, with replacement, from an alphabet.
///
/// With the default settings there are 62^6 (about 5.6e10) possible aliases.
/// Collisions are unlikely for small catalogs but not impossible, so callers
/// must still handle them.
#[derive(Debug)]
pub struct RandomAliasGenerator {
    alphabet: Vec<u8>,
    length: usize,
    rng: Mutex<StdRng>,
    entropy: EntropySource,
}

impl RandomAliasGenerator {
    /// Creates a generator seeded from the OS entropy source.
    ///
    /// If that source cannot be read, the generator is seeded from the
    /// system clock and the process id instead and reports
    /// [`EntropySource::Fallback`] from [`entropy_source`](Self::entropy_source).
    pub fn new(settings: RandomAliasSettings) -> Result<Self, Error> {
        let (rng, entropy) = match StdRng::try_from_os_rng() {
            Ok(rng) => (rng, EntropySource::Os),
            Err(_) => (StdRng::seed_from_u64(fallback_seed()), EntropySource::Fallback),
        };
        Self::build(settings, rng, entropy)
    }

    /// Creates a generator with a fixed seed. Output is reproducible.
    pub fn seeded(settings: RandomAliasSettings, seed: u64) -> Result<Self, Error> {
        Self::build(settings, StdRng::seed_from_u64(seed), EntropySource::Seeded)
    }

    fn build(
        settings: RandomAliasSettings,
        rng: StdRng,
        entropy: EntropySource,
    ) -> Result<Self, Error> {
        let alphabet = validate_alphabet(&settings.alphabet)?;
        if settings.length == 0 || settings.length > MAX_LENGTH {
            return Err(Error::InvalidLength {
                length: settings.length,
                max_length: MAX_LENGTH,
            });
        }

        Ok(Self {
            alphabet,
            length: settings.length,
            rng: Mutex::new(rng),
            entropy,
        })
    }

    pub fn entropy_source(&self) -> EntropySource {
        self.entropy
    }

    /// The length of aliases produced by [`Generator::generate`].
    pub fn length(&self) -> usize {
        self.length
    }

    /// Returns exactly `length` symbols drawn from the alphabet.
    pub fn generate_len(&self, length: usize) -> String {
        let mut rng = self.rng.lock();
        (0..length)
            .map(|_| self.alphabet[rng.random_range(0..self.alphabet.len())] as char)
            .collect()
    }
}

impl Generator for RandomAliasGenerator {
    type Output = Alias;

    fn generate(&self) -> Self::Output {
        // The alphabet and length were validated at construction.
        Alias::new_unchecked(self.generate_len(self.length))
    }
}

fn validate_alphabet(alphabet: &str) -> Result<Vec<u8>, Error> {
    if alphabet.is_empty() {
        return Err(Error::EmptyAlphabet);
    }

    let mut seen = HashSet::new();
    for c in alphabet.chars() {
        if !c.is_ascii_alphanumeric() {
            return Err(Error::InvalidSymbol(c));
        }
        if !seen.insert(c) {
            return Err(Error::DuplicateSymbol(c));
        }
    }

    Ok(alphabet.as_bytes().to_vec())
}

fn fallback_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    nanos ^ (u64::from(std::process::id()) << 32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_generator() -> RandomAliasGenerator {
        RandomAliasGenerator::new(RandomAliasSettings::builder().build()).unwrap()
    }

    #[test]
    fn default_settings_produce_six_characters() {
        let generator = default_generator();
        assert_eq!(generator.length(), 6);
        assert_eq!(generator.generate().as_str().len(), 6);
    }

    #[test]
    fn never_leaves_the_alphabet() {
        let generator = default_generator();

        for _ in 0..10_000 {
            let alias = generator.generate_len(6);
            assert_eq!(alias.len(), 6);
            assert!(
                alias.bytes().all(|b| DEFAULT_ALPHABET.as_bytes().contains(&b)),
                "unexpected symbol in {alias}"
            );
        }
    }

    #[test]
    fn generated_aliases_pass_validation() {
        let generator = default_generator();
        for _ in 0..100 {
            let alias = generator.generate();
            assert!(Alias::new(alias.as_str()).is_ok());
        }
    }

    #[test]
    fn generate_len_honours_requested_length() {
        let generator = default_generator();
        assert_eq!(generator.generate_len(0), "");
        assert_eq!(generator.generate_len(1).len(), 1);
        assert_eq!(generator.generate_len(64).len(), 64);
    }

    #[test]
    fn os_entropy_is_reported() {
        assert_eq!(default_generator().entropy_source(), EntropySource::Os);
    }

    #[test]
    fn seeded_generators_are_reproducible() {
        let settings = RandomAliasSettings::builder().build();
        let first = RandomAliasGenerator::seeded(settings.clone(), 42).unwrap();
        let second = RandomAliasGenerator::seeded(settings, 42).unwrap();

        assert_eq!(first.entropy_source(), EntropySource::Seeded);
        for _ in 0..20 {
            assert_eq!(first.generate(), second.generate());
        }
    }

    #[test]
    fn tiny_alphabet_is_respected() {
        let settings = RandomAliasSettings::builder()
            .alphabet("ab")
            .length(3)
            .build();
        let generator = RandomAliasGenerator::seeded(settings, 7).unwrap();

        for _ in 0..200 {
            let alias = generator.generate();
            assert_eq!(alias.as_str().len(), 3);
            assert!(alias.as_str().chars().all(|c| c == 'a' || c == 'b'));
        }
    }

    #[test]
    fn every_symbol_is_reachable() {
        let settings = RandomAliasSettings::builder().alphabet("xyz").build();
        let generator = RandomAliasGenerator::seeded(settings, 1).unwrap();

        let mut seen = HashSet::new();
        for _ in 0..100 {
            seen.extend(generator.generate_len(6).chars());
        }
        assert_eq!(seen, HashSet::from(['x', 'y', 'z']));
    }

    #[test]
    fn rejects_bad_alphabets() {
        let build = |alphabet: &str| {
            RandomAliasGenerator::new(RandomAliasSettings::builder().alphabet(alphabet).build())
                .unwrap_err()
        };

        assert_eq!(build(""), Error::EmptyAlphabet);
        assert_eq!(build("ab-"), Error::InvalidSymbol('-'));
        assert_eq!(build("aba"), Error::DuplicateSymbol('a'));
    }

    #[test]
    fn rejects_bad_lengths() {
        let zero = RandomAliasGenerator::new(RandomAliasSettings::builder().length(0).build());
        assert!(matches!(zero, Err(Error::InvalidLength { length: 0, .. })));

        let long = RandomAliasGenerator::new(
            RandomAliasSettings::builder().length(MAX_LENGTH + 1).build(),
        );
        assert!(matches!(long, Err(Error::InvalidLength { .. })));
    }

    #[test]
    fn generator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RandomAliasGenerator>();
    }
}
