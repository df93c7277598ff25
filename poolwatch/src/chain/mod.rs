//! On-chain access for a single AMM pair.
//!
//! Everything the engine learns about a pool flows through [`ChainReader`]:
//! reserves, token addresses, LP supply, token decimals, historical `Swap`
//! logs and block timestamps. Live updates arrive through [`subscriber`].

pub mod bindings;
pub mod client;
pub mod errors;
pub mod subscriber;

pub use client::{ChainReader, EthersChainReader};
pub use errors::ChainError;
pub use subscriber::{SwapNotice, SwapSubscriber};

use ethers::types::Address;

use crate::error::PoolError;

/// Parses a pair address and rejects the zero address.
///
/// Callers treat an error as "no pool": no RPC call may be issued for it.
pub fn validate_pair_address(raw: &str) -> Result<Address, PoolError> {
    let address: Address = raw
        .trim()
        .parse()
        .map_err(|_| PoolError::InvalidPairAddress(raw.to_string()))?;

    if address.is_zero() {
        return Err(PoolError::ZeroPairAddress);
    }

    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_checksummed_and_lowercase_addresses() {
        let a = validate_pair_address("0xf2A558c41e9A5505d2E5614a4AAb85f397816d00").unwrap();
        let b = validate_pair_address("0xf2a558c41e9a5505d2e5614a4aab85f397816d00").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_zero_address() {
        assert_eq!(
            validate_pair_address("0x0000000000000000000000000000000000000000"),
            Err(PoolError::ZeroPairAddress)
        );
    }

    #[test]
    fn rejects_malformed_addresses() {
        for raw in ["", "0x1234", "not-an-address", "0xzz558c41e9A5505d2E5614a4AAb85f397816d00"] {
            assert!(matches!(
                validate_pair_address(raw),
                Err(PoolError::InvalidPairAddress(_))
            ));
        }
    }
}
