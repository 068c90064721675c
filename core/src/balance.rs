use num_bigint::{BigInt, ParseBigIntError};
use num_traits::Zero;

use crate::event::TokenBalance;

/// Net change (post - pre) of every balance of `mint` owned by `owner`.
///
/// Amounts are parsed as arbitrary-precision integers; an entry present on
/// only one side counts as zero on the other.
pub fn balance_delta(
    pre: &[TokenBalance],
    post: &[TokenBalance],
    mint: &str,
    owner: &str,
) -> Result<BigInt, ParseBigIntError> {
    let sum = |balances: &[TokenBalance]| -> Result<BigInt, ParseBigIntError> {
        balances
            .iter()
            .filter(|b| b.mint == mint && b.owner == owner)
            .try_fold(BigInt::zero(), |acc, b| Ok(acc + b.amount.parse::<BigInt>()?))
    };

    Ok(sum(post)? - sum(pre)?)
}
