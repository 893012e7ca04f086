// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Production collaborator clients.
//!
//! Thin HTTP wrappers that map provider responses onto the trait seams in
//! `quorus-types`. Each read goes through the injected retry policy; writes
//! are fired once and verified by the next cycle's reads.

/// Consensus-layer (beacon API) reader.
pub mod beacon;
/// Consensus-contract gateway client.
pub mod gateway;
/// Keys API client.
pub mod keys;

pub use beacon::BeaconChainReader;
pub use gateway::Gateway;
pub use keys::HttpKeysApi;

use quorus_types::error::{OracleError, Result};
use url::Url;

/// Join a path onto a base URL without caring about trailing slashes.
fn join_url(base: &Url, path: &str) -> Result<Url> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|err| OracleError::Config(format!("bad url {joined}: {err}")))
}

/// Decode a 0x-prefixed hex string.
fn decode_hex(value: &str) -> Option<Vec<u8>> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    if stripped.len() % 2 != 0 {
        return None;
    }
    (0..stripped.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&stripped[i..i + 2], 16).ok())
        .collect()
}

/// Encode bytes as a 0x-prefixed hex string.
fn encode_hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let bytes = vec![0x00, 0xab, 0xff];
        assert_eq!(encode_hex(&bytes), "0x00abff");
        assert_eq!(decode_hex("0x00abff"), Some(bytes.clone()));
        assert_eq!(decode_hex("00abff"), Some(bytes));
        assert_eq!(decode_hex("0xabc"), None);
        assert_eq!(decode_hex("0xzz"), None);
    }

    #[test]
    fn url_join_tolerates_slashes() {
        let base = Url::parse("http://localhost:5052/").unwrap();
        assert_eq!(
            join_url(&base, "/eth/v1/beacon/headers/finalized")
                .unwrap()
                .as_str(),
            "http://localhost:5052/eth/v1/beacon/headers/finalized"
        );
    }
}
