use hex_slice::AsHex;
use rand_core::{RngCore, SeedableRng};
use rand_os::OsRng;
use rand_xorshift::XorShiftRng;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Salt used to derive the seed of a node's left child.
pub const LEFT_SALT: u64 = 1;
/// Salt used to derive the seed of a node's right child.
pub const RIGHT_SALT: u64 = 2;

/// Identifies a pseudo-random stream. Every undetermined node of a
/// [`ChoiceTree`](struct.ChoiceTree.html) draws from its own seed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Seed(u64);

/// Derives a child seed from `seed`; different salts yield streams that are,
/// for our purposes, independent.
pub fn derive_seed(seed: Seed, salt: u64) -> Seed {
    // SplitMix64 finaliser over the salted state.
    let mut z = seed
        .0
        .wrapping_add(salt.wrapping_mul(0x9e37_79b9_7f4a_7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    Seed(z ^ (z >> 31))
}

impl Seed {
    /// Wraps a raw 64-bit seed.
    pub fn new(seed: u64) -> Self {
        Seed(seed)
    }

    /// A fresh seed drawn from the operating system's entropy source.
    pub fn random() -> Self {
        Seed(OsRng.next_u64())
    }

    /// The raw seed value.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// See [`derive_seed`](fn.derive_seed.html).
    pub fn derive(self, salt: u64) -> Self {
        derive_seed(self, salt)
    }

    /// The first word of this seed's stream. Reading it twice yields the same
    /// value.
    pub(crate) fn draw_u64(self) -> u64 {
        XorShiftRng::seed_from_u64(self.0).next_u64()
    }

    /// Draws a value uniformly from `0..=span`.
    pub(crate) fn draw_upto(self, span: u64) -> u64 {
        let raw = self.draw_u64();
        ((u128::from(raw) * (u128::from(span) + 1)) >> 64) as u64
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let bytes = self.0.to_be_bytes();
        fmt.debug_tuple("Seed")
            .field(&format_args!("{:x}", bytes[..].as_hex()))
            .finish()
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{:#018x}", self.0)
    }
}

impl FromStr for Seed {
    type Err = ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let val = if s.starts_with("0x") || s.starts_with("0X") {
            u64::from_str_radix(&s[2..], 16)?
        } else {
            s.parse::<u64>()?
        };
        Ok(Seed(val))
    }
}
