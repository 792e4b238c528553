//! Mnemonic phrase encoding, parsing and seed stretching

use super::error::{MnemonicError, MnemonicResult};
use crate::secure::{IntoSecret, SecretBytes, SecretString, Seed};
use bip39::{Language, Mnemonic as Bip39Mnemonic};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use secrecy::ExposeSecret;
use sha2::Sha512;
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

/// Entropy sizes accepted by [`generate`]
pub const SUPPORTED_ENTROPY_BITS: [usize; 5] = [128, 160, 192, 224, 256];

/// Entropy size used when generating a fresh phrase for a deposit run
pub const DEFAULT_ENTROPY_BITS: usize = 256;

/// PBKDF2 iteration count for seed derivation
pub const PBKDF2_ROUNDS: u32 = 2048;

/// The 2048-word English list, in index order.
pub fn word_list() -> &'static [&'static str; 2048] {
    Language::English.word_list()
}

/// Encode entropy as a mnemonic phrase.
///
/// When `entropy` is `None`, `entropy_bits` bits are drawn from the OS-seeded
/// thread RNG. The checksum is the top `entropy_bits / 32` bits of
/// SHA-256(entropy), and each 11-bit big-endian group of
/// `entropy || checksum` selects one word.
///
/// # Errors
///
/// - `UnsupportedEntropyLength` if `entropy_bits` is not one of
///   [`SUPPORTED_ENTROPY_BITS`]
/// - `EntropyLengthMismatch` if supplied entropy has a different size
pub fn generate(entropy_bits: usize, entropy: Option<&[u8]>) -> MnemonicResult<Mnemonic> {
    if !SUPPORTED_ENTROPY_BITS.contains(&entropy_bits) {
        return Err(MnemonicError::UnsupportedEntropyLength(entropy_bits));
    }

    match entropy {
        Some(bytes) => {
            if bytes.len() * 8 != entropy_bits {
                return Err(MnemonicError::EntropyLengthMismatch {
                    expected: entropy_bits,
                    actual: bytes.len() * 8,
                });
            }
            Mnemonic::from_entropy(bytes)
        }
        None => {
            let mut buf = Zeroizing::new(vec![0u8; entropy_bits / 8]);
            rand::thread_rng().fill_bytes(&mut buf);
            Mnemonic::from_entropy(&buf)
        }
    }
}

/// Stretch a phrase into a 64-byte seed.
///
/// Both the phrase and `"mnemonic" + password` are NFKD-normalized before
/// PBKDF2-HMAC-SHA512 with 2048 rounds. The phrase is not validated, matching
/// BIP-39, so recovery of phrases from other word lists still works.
pub fn to_seed(phrase: &str, password: &str) -> Seed {
    let normalized: Zeroizing<String> = Zeroizing::new(phrase.nfkd().collect());

    // "mnemonic" is ASCII, so normalizing the suffix alone is equivalent
    let mut salt = Zeroizing::new(String::from("mnemonic"));
    salt.extend(password.nfkd());

    let mut seed = Seed::zeroed();
    pbkdf2_hmac::<Sha512>(
        normalized.as_bytes(),
        salt.as_bytes(),
        PBKDF2_ROUNDS,
        seed.expose_secret_mut(),
    );
    seed
}

/// A validated BIP-39 English mnemonic
///
/// # Security
///
/// - The phrase lives in a `SecretString`, zeroized on drop
/// - `Debug` prints only the word count
/// - Not `Clone`
///
/// # Example
///
/// ```rust
/// use stakekit_crypto::mnemonic::Mnemonic;
///
/// let mnemonic = Mnemonic::generate(256).unwrap();
/// assert_eq!(mnemonic.word_count(), 24);
///
/// let restored = Mnemonic::from_phrase(mnemonic.phrase()).unwrap();
/// assert_eq!(
///     restored.to_seed("").expose_secret(),
///     mnemonic.to_seed("").expose_secret()
/// );
/// ```
pub struct Mnemonic {
    phrase: SecretString,
    word_count: usize,
}

impl Mnemonic {
    /// Generate a random mnemonic with `entropy_bits` of entropy
    pub fn generate(entropy_bits: usize) -> MnemonicResult<Self> {
        generate(entropy_bits, None)
    }

    /// Encode explicit entropy (16, 20, 24, 28 or 32 bytes)
    pub fn from_entropy(entropy: &[u8]) -> MnemonicResult<Self> {
        let inner = Bip39Mnemonic::from_entropy_in(Language::English, entropy).map_err(|e| {
            match e {
                bip39::Error::BadEntropyBitCount(bits) => {
                    MnemonicError::UnsupportedEntropyLength(bits)
                }
                other => MnemonicError::InvalidPhrase(other.to_string()),
            }
        })?;

        Ok(Self {
            word_count: inner.word_count(),
            phrase: inner.to_string().into_secret(),
        })
    }

    /// Parse and validate an existing phrase
    ///
    /// Surrounding and repeated whitespace is collapsed and words are
    /// lowercased before lookup.
    ///
    /// # Errors
    ///
    /// - `InvalidWordCount` for anything but 12, 15, 18, 21 or 24 words
    /// - `UnknownWord` for a word outside the list
    /// - `InvalidChecksum` if the checksum bits disagree with the entropy
    pub fn from_phrase(phrase: &str) -> MnemonicResult<Self> {
        let normalized = Zeroizing::new(normalize_phrase(phrase));
        let inner = parse(&normalized)?;

        Ok(Self {
            word_count: inner.word_count(),
            phrase: normalized.to_string().into_secret(),
        })
    }

    /// Check a phrase without keeping it
    pub fn validate(phrase: &str) -> MnemonicResult<()> {
        let normalized = Zeroizing::new(normalize_phrase(phrase));
        parse(&normalized).map(|_| ())
    }

    /// Get the mnemonic phrase
    ///
    /// # Security
    ///
    /// The returned reference should be used immediately and not stored.
    pub fn phrase(&self) -> &str {
        self.phrase.expose_secret()
    }

    /// Number of words in the phrase
    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// Stretch this phrase into a seed, see [`to_seed`]
    pub fn to_seed(&self, password: &str) -> Seed {
        to_seed(self.phrase(), password)
    }

    /// Decode the entropy the phrase encodes
    pub fn entropy(&self) -> MnemonicResult<SecretBytes> {
        let inner = parse(self.phrase())?;
        Ok(inner.to_entropy().into_secret())
    }
}

impl std::fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mnemonic")
            .field("word_count", &self.word_count)
            .field("phrase", &"[REDACTED]")
            .finish()
    }
}

fn normalize_phrase(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse(normalized: &str) -> MnemonicResult<Bip39Mnemonic> {
    Bip39Mnemonic::parse_in_normalized(Language::English, normalized).map_err(|e| match e {
        bip39::Error::BadWordCount(count) => MnemonicError::InvalidWordCount(count),
        bip39::Error::UnknownWord(index) => MnemonicError::UnknownWord {
            index,
            word: normalized
                .split(' ')
                .nth(index)
                .unwrap_or_default()
                .to_string(),
        },
        bip39::Error::InvalidChecksum => MnemonicError::InvalidChecksum,
        other => MnemonicError::InvalidPhrase(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    // (entropy, phrase, seed with password "TREZOR")
    const TREZOR_VECTORS: [(&str, &str, &str); 4] = [
        (
            "00000000000000000000000000000000",
            ABANDON_ABOUT,
            "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e53495531f09a6987599d18264c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04",
        ),
        (
            "7f7f7f7f7f7f7f7f7f7f7f7f7f7f7f7f",
            "legal winner thank year wave sausage worth useful legal winner thank yellow",
            "2e8905819b8723fe2c1d161860e5ee1830318dbf49a83bd451cfb8440c28bd6fa457fe1296106559a3c80937a1c1069be3a3a5bd381ee6260e8d9739fce1f607",
        ),
        (
            "ffffffffffffffffffffffffffffffff",
            "zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo wrong",
            "ac27495480225222079d7be181583751e86f571027b0497b5b5d11218e0a8a13332572917f0f8e5a589620c6f15b11c61dee327651a14c34e18231052e48c069",
        ),
        (
            "0000000000000000000000000000000000000000000000000000000000000000",
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon art",
            "bda85446c68413707090a52022edd26a1c9462295029f2e60cd7c4f2bbd3097170af7a4d73245cafa9c3cca8d561a7c3de6f5d4a10be8ed2a5e608d68f92fcc8",
        ),
    ];

    #[test]
    fn test_trezor_vectors() {
        for (entropy, phrase, seed) in TREZOR_VECTORS {
            let entropy = hex::decode(entropy).unwrap();
            let mnemonic = generate(entropy.len() * 8, Some(&entropy)).unwrap();
            assert_eq!(mnemonic.phrase(), phrase);
            assert_eq!(hex::encode(mnemonic.to_seed("TREZOR").expose_secret()), seed);
        }
    }

    #[test]
    fn test_seed_without_password() {
        let seed = to_seed(ABANDON_ABOUT, "");
        assert_eq!(
            hex::encode(seed.expose_secret()),
            "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc19a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4"
        );
    }

    #[test]
    fn test_password_is_nfkd_normalized() {
        let composed = to_seed(ABANDON_ABOUT, "caf\u{e9}");
        let decomposed = to_seed(ABANDON_ABOUT, "cafe\u{301}");
        assert_eq!(composed.expose_secret(), decomposed.expose_secret());
    }

    #[test]
    fn test_generate_random_word_counts() {
        for (bits, words) in SUPPORTED_ENTROPY_BITS.iter().zip([12, 15, 18, 21, 24]) {
            let mnemonic = generate(*bits, None).unwrap();
            assert_eq!(mnemonic.word_count(), words);
            assert_eq!(mnemonic.phrase().split(' ').count(), words);
            assert!(Mnemonic::validate(mnemonic.phrase()).is_ok());
        }
    }

    #[test]
    fn test_unsupported_entropy_length() {
        assert_eq!(
            generate(100, None).unwrap_err(),
            MnemonicError::UnsupportedEntropyLength(100)
        );
        assert!(matches!(
            generate(128, Some(&[0u8; 20])),
            Err(MnemonicError::EntropyLengthMismatch {
                expected: 128,
                actual: 160
            })
        ));
    }

    #[test]
    fn test_entropy_roundtrip() {
        let entropy = [0x80u8; 16];
        let mnemonic = Mnemonic::from_entropy(&entropy).unwrap();
        assert_eq!(
            mnemonic.phrase(),
            "letter advice cage absurd amount doctor acoustic avoid letter advice cage above"
        );
        assert_eq!(mnemonic.entropy().unwrap().expose_secret(), &entropy.to_vec());
    }

    #[test]
    fn test_from_phrase_normalizes_whitespace_and_case() {
        let mnemonic = Mnemonic::from_phrase(
            "  ABANDON abandon Abandon abandon abandon abandon abandon abandon abandon abandon abandon   about ",
        )
        .unwrap();
        assert_eq!(mnemonic.phrase(), ABANDON_ABOUT);
    }

    #[test]
    fn test_invalid_checksum() {
        let bad = ABANDON_ABOUT.replace("about", "abandon");
        assert_eq!(
            Mnemonic::validate(&bad).unwrap_err(),
            MnemonicError::InvalidChecksum
        );
    }

    #[test]
    fn test_unknown_word() {
        let bad = ABANDON_ABOUT.replacen("abandon", "abandonx", 1);
        assert_eq!(
            Mnemonic::validate(&bad).unwrap_err(),
            MnemonicError::UnknownWord {
                index: 0,
                word: "abandonx".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_word_count() {
        assert_eq!(
            Mnemonic::validate("abandon abandon about").unwrap_err(),
            MnemonicError::InvalidWordCount(3)
        );
    }

    #[test]
    fn test_word_list() {
        let words = word_list();
        assert_eq!(words[0], "abandon");
        assert_eq!(words[3], "about");
        assert_eq!(words[2047], "zoo");
    }

    #[test]
    fn test_debug_output_redacted() {
        let mnemonic = Mnemonic::from_phrase(ABANDON_ABOUT).unwrap();
        let debug = format!("{:?}", mnemonic);

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("abandon"));
    }

    #[test]
    fn test_parsed_words_are_wiped() {
        fn wiped_on_drop<T: zeroize::ZeroizeOnDrop>(_: &T) {}

        let mut inner = parse(TREZOR_VECTORS[1].1).unwrap();
        wiped_on_drop(&inner);
        assert!(inner.to_entropy().iter().any(|b| *b != 0));

        zeroize::Zeroize::zeroize(&mut inner);
        assert!(inner.to_entropy().iter().all(|b| *b == 0));
    }
}
