// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! The ejector module: ordered validator-exit requests.

use async_trait::async_trait;
use committable::{Commitment, Committable, RawCommitmentBuilder};
use quorus_types::{
    data::{HasRefSlot, ReferenceBlockStamp, SlotNumber, Validator, ValidatorStatus},
    error::Result,
    traits::report::{BuildContext, ExtraDataChunk, ModuleKind, OracleReport, ReportModule},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::operator_keys_by_pubkey;

/// Report semantics version understood by the current contract.
const CONSENSUS_VERSION: u64 = 1;

/// The only wire format the contract accepts: a packed request list.
const DATA_FORMAT_LIST: u64 = 1;

/// Cap on requests packed into one report's transaction.
const MAX_REQUESTS_PER_REPORT: usize = 600;

/// The exit-request report for one frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EjectorReport {
    /// Report semantics version.
    pub consensus_version: u64,
    /// Frame reference slot the report is tagged with.
    pub ref_slot: SlotNumber,
    /// Number of exit requests in `data`.
    pub requests_count: u64,
    /// Wire format tag of `data`.
    pub data_format: u64,
    /// Packed requests: 3-byte module id, 5-byte operator id, 8-byte
    /// validator index (all big-endian), then the 48-byte pubkey.
    pub data: Vec<u8>,
}

impl Committable for EjectorReport {
    fn commit(&self) -> Commitment<Self> {
        RawCommitmentBuilder::new("Ejector report")
            .u64_field("consensus version", self.consensus_version)
            .u64_field("ref slot", *self.ref_slot)
            .u64_field("requests count", self.requests_count)
            .u64_field("data format", self.data_format)
            .var_size_field("data", &self.data)
            .finalize()
    }
}

impl HasRefSlot for EjectorReport {
    fn ref_slot(&self) -> SlotNumber {
        self.ref_slot
    }
}

impl OracleReport for EjectorReport {
    fn extra_data(&self) -> Vec<ExtraDataChunk> {
        Vec::new()
    }
}

/// Report builder for the exit-bus oracle.
pub struct EjectorModule {
    /// Staking module id queried from the keys API.
    staking_module_id: u64,
}

impl EjectorModule {
    /// Create a builder for one staking module.
    #[must_use]
    pub fn new(staking_module_id: u64) -> Self {
        Self { staking_module_id }
    }
}

impl Default for EjectorModule {
    fn default() -> Self {
        Self::new(1)
    }
}

#[async_trait]
impl ReportModule for EjectorModule {
    type Report = EjectorReport;

    fn kind(&self) -> ModuleKind {
        ModuleKind::Ejector
    }

    fn consensus_version(&self) -> u64 {
        CONSENSUS_VERSION
    }

    async fn build_report(
        &self,
        stamp: &ReferenceBlockStamp,
        ctx: &BuildContext<'_>,
    ) -> Result<Self::Report> {
        let validators = ctx.chain.validators(stamp).await?;
        let operator_of = operator_keys_by_pubkey(ctx.keys, self.staking_module_id).await?;

        let mut candidates: Vec<(&Validator, u64)> = validators
            .iter()
            .filter(|validator| validator.status == ValidatorStatus::Active)
            .filter_map(|validator| {
                operator_of
                    .get(&validator.pubkey.0)
                    .map(|operator| (validator, *operator))
            })
            .collect();
        // Oldest validators exit first; index breaks activation-epoch ties
        // so the order is total and identical for every operator.
        candidates.sort_by_key(|(validator, _)| {
            (
                validator.activation_epoch.map_or(u64::MAX, |epoch| *epoch),
                validator.index,
            )
        });
        candidates.truncate(MAX_REQUESTS_PER_REPORT);
        info!(requests = candidates.len(), "exit requests selected");

        let mut data = Vec::with_capacity(candidates.len() * 64);
        for (validator, operator_id) in &candidates {
            encode_request(&mut data, self.staking_module_id, *operator_id, validator);
        }

        Ok(EjectorReport {
            consensus_version: CONSENSUS_VERSION,
            ref_slot: stamp.ref_slot,
            requests_count: candidates.len() as u64,
            data_format: DATA_FORMAT_LIST,
            data,
        })
    }
}

/// Append one packed exit request.
fn encode_request(out: &mut Vec<u8>, module_id: u64, operator_id: u64, validator: &Validator) {
    out.extend_from_slice(&module_id.to_be_bytes()[5..]);
    out.extend_from_slice(&operator_id.to_be_bytes()[3..]);
    out.extend_from_slice(&validator.index.to_be_bytes());
    out.extend_from_slice(&validator.pubkey.0);
}

#[cfg(test)]
mod test {
    use quorus_types::data::{BlsPubkey, EpochNumber};

    use super::*;

    fn validator(index: u64, activation: u64) -> Validator {
        Validator {
            index,
            pubkey: BlsPubkey(vec![index as u8; 48]),
            balance_gwei: 32_000_000_000,
            effective_balance_gwei: 32_000_000_000,
            activation_epoch: Some(EpochNumber::new(activation)),
            status: ValidatorStatus::Active,
        }
    }

    #[test]
    fn packed_request_layout() {
        let mut out = Vec::new();
        encode_request(&mut out, 1, 7, &validator(42, 5));
        assert_eq!(out.len(), 3 + 5 + 8 + 48);
        assert_eq!(&out[..3], &[0, 0, 1]);
        assert_eq!(&out[3..8], &[0, 0, 0, 0, 7]);
        assert_eq!(&out[8..16], &42_u64.to_be_bytes());
        assert_eq!(&out[16..], &[42_u8; 48]);
    }

    #[test]
    fn report_hash_changes_with_data() {
        let base = EjectorReport {
            consensus_version: CONSENSUS_VERSION,
            ref_slot: SlotNumber::new(1000),
            requests_count: 0,
            data_format: DATA_FORMAT_LIST,
            data: Vec::new(),
        };
        let mut other = base.clone();
        other.data = vec![1];
        assert_ne!(base.hash(), other.hash());
    }
}
