use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

const SEED_DIGITS: f64 = 1e14;

/// Page seed in `[0, 1)`. All seed-reproducible choices on a page derive from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seed(f64);

impl Seed {
    /// Returns `None` outside `[0, 1)` or for non-finite values.
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && (0.0..1.0).contains(&value)).then_some(Self(value))
    }

    /// Draws a fresh seed truncated to 14 decimal digits.
    pub fn fresh<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let raw: f64 = rng.gen();
        let truncated = (raw * SEED_DIGITS).floor() / SEED_DIGITS;
        Self(truncated.clamp(0.0, 1.0 - f64::EPSILON))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Parses a token piece: either bare digits (`"5"` is 0.5) or a decimal
    /// such as `"0.5"`.
    pub fn parse_piece(piece: &str) -> Option<Self> {
        if !piece.is_empty() && piece.bytes().all(|b| b.is_ascii_digit()) {
            return format!("0.{piece}").parse().ok().and_then(Self::new);
        }
        let digits = piece.strip_prefix("0.")?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        piece.parse().ok().and_then(Self::new)
    }

    /// Token form: the digits after the decimal point.
    pub fn to_token(&self) -> String {
        let text = self.0.to_string();
        match text.strip_prefix("0.") {
            Some(digits) => digits.to_string(),
            None => "0".to_string(),
        }
    }

    /// Derives a stable 64-bit seed for a named sub-stream.
    pub fn derive(&self, salt: &str) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(self.to_token().as_bytes());
        hasher.update(b":");
        hasher.update(salt.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Deterministic generator for a named sub-stream of this seed.
    pub fn rng_for(&self, salt: &str) -> StdRng {
        StdRng::seed_from_u64(self.derive(salt))
    }
}

#[cfg(test)]
mod tests {
    use super::Seed;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    #[test]
    fn token_form_round_trips() {
        for piece in ["5", "05", "12345678901234", "0"] {
            let seed = Seed::parse_piece(piece).unwrap();
            assert_eq!(Seed::parse_piece(&seed.to_token()), Some(seed));
        }
        assert_eq!(Seed::parse_piece("5"), Seed::parse_piece("0.5"));
    }

    #[test]
    fn rejects_non_seed_pieces() {
        for piece in ["", "1.5", "0.", "n12", "-3", "0.5e1", "garbage!!"] {
            assert_eq!(Seed::parse_piece(piece), None, "piece {piece:?}");
        }
    }

    #[test]
    fn fresh_seed_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            let seed = Seed::fresh(&mut rng);
            assert!((0.0..1.0).contains(&seed.value()));
        }
    }

    #[test]
    fn derived_streams_are_stable_and_independent() {
        let seed = Seed::new(0.25).unwrap();
        assert_eq!(seed.derive("images"), seed.derive("images"));
        assert_ne!(seed.derive("images"), seed.derive("quotes"));
        assert_eq!(
            seed.rng_for("songs").next_u64(),
            seed.rng_for("songs").next_u64()
        );
    }
}
