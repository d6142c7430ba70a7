use bitcoin::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::TryFromIntError;

/// Number of satoshis in one bitcoin.
pub const SATOSHIS_PER_BITCOIN: i64 = 100_000_000;

/// A signed amount of satoshis.
///
/// Signed because a fee computed over malformed or coinbase data can be
/// negative. Displayed with exactly eight decimals, computed with integer
/// arithmetic only.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Satoshis(pub i64);

impl Satoshis {
    pub const ZERO: Self = Self(0);

    /// The smallest representable non-zero value.
    pub const ONE: Self = Self(1);

    pub const fn to_sat(self) -> i64 {
        self.0
    }

    /// `self + rhs`, `None` on overflow.
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }

    /// `self - rhs`, `None` on overflow.
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(diff) => Some(Self(diff)),
            None => None,
        }
    }
}

/// Fails for amounts above `i64::MAX`, which decoded outputs can carry since
/// the block codec does not enforce `MAX_MONEY`.
impl TryFrom<Amount> for Satoshis {
    type Error = TryFromIntError;

    fn try_from(amount: Amount) -> Result<Self, Self::Error> {
        i64::try_from(amount.to_sat()).map(Self)
    }
}

impl fmt::Display for Satoshis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_btc = SATOSHIS_PER_BITCOIN as u64;
        write!(f, "{sign}{}.{:08}", abs / per_btc, abs % per_btc)
    }
}
