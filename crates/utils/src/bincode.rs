// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]
use bincode::{
    config::{
        FixintEncoding, LittleEndian, RejectTrailing, WithOtherEndian, WithOtherIntEncoding,
        WithOtherTrailing,
    },
    DefaultOptions, Options,
};

/// Type alias for the fully configured canonical options.
pub type CanonicalOptions = WithOtherTrailing<
    WithOtherIntEncoding<WithOtherEndian<DefaultOptions, LittleEndian>, FixintEncoding>,
    RejectTrailing,
>;

/// For every hashed or persisted encoding, we use bincode with the following options:
///   - Little endian encoding
///   - Fixint encoding
///   - Reject trailing bytes
///
/// Cross-operator hash agreement depends on this encoding never changing shape
/// for a given struct definition, so varint encoding is deliberately avoided.
pub fn bincode_opts() -> CanonicalOptions {
    bincode::DefaultOptions::new()
        .with_little_endian()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}
