// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! The accounting module: aggregate validator balances and exits, plus an
//! extra-data payload of per-operator exit/stuck deltas.

use std::collections::BTreeMap;

use async_trait::async_trait;
use committable::{Commitment, Committable, RawCommitmentBuilder};
use quorus_types::{
    data::{HasRefSlot, ReferenceBlockStamp, ReportHash, SlotNumber, Validator, ValidatorStatus},
    error::Result,
    traits::report::{BuildContext, ExtraDataChunk, ModuleKind, OracleReport, ReportModule},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::operator_keys_by_pubkey;

/// Report semantics version understood by the current contract.
const CONSENSUS_VERSION: u64 = 2;

/// Per-operator counters delivered as extra data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorDelta {
    /// Node-operator id.
    pub operator_id: u64,
    /// Validators that have completed their exit.
    pub exited_count: u64,
    /// Validators with an exit in flight.
    pub stuck_count: u64,
}

/// The accounting report for one frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingReport {
    /// Report semantics version.
    pub consensus_version: u64,
    /// Frame reference slot the report is tagged with.
    pub ref_slot: SlotNumber,
    /// Number of this module's validators on the consensus layer.
    pub validators_count: u64,
    /// Their aggregate balance, in Gwei.
    pub cl_balance_gwei: u64,
    /// Number of them that have exited.
    pub exited_validators_count: u64,
    /// Number of extra-data chunks that follow the main report.
    pub extra_data_items_count: u64,
    /// Commitment binding those chunks into this report.
    pub extra_data_hash: ReportHash,
    /// The chunks themselves; delivered separately, so excluded from the
    /// main payload encoding and bound through `extra_data_hash` instead.
    #[serde(skip)]
    pub extra_data: Vec<ExtraDataChunk>,
}

impl Committable for AccountingReport {
    fn commit(&self) -> Commitment<Self> {
        RawCommitmentBuilder::new("Accounting report")
            .u64_field("consensus version", self.consensus_version)
            .u64_field("ref slot", *self.ref_slot)
            .u64_field("validators count", self.validators_count)
            .u64_field("cl balance gwei", self.cl_balance_gwei)
            .u64_field("exited validators count", self.exited_validators_count)
            .u64_field("extra data items count", self.extra_data_items_count)
            .var_size_field("extra data hash", self.extra_data_hash.as_h256().as_bytes())
            .finalize()
    }
}

impl HasRefSlot for AccountingReport {
    fn ref_slot(&self) -> SlotNumber {
        self.ref_slot
    }
}

impl OracleReport for AccountingReport {
    fn extra_data(&self) -> Vec<ExtraDataChunk> {
        self.extra_data.clone()
    }
}

/// Report builder for the accounting oracle.
pub struct AccountingModule {
    /// Staking module id queried from the keys API.
    staking_module_id: u64,
}

impl AccountingModule {
    /// Create a builder for one staking module.
    #[must_use]
    pub fn new(staking_module_id: u64) -> Self {
        Self { staking_module_id }
    }
}

impl Default for AccountingModule {
    fn default() -> Self {
        Self::new(1)
    }
}

#[async_trait]
impl ReportModule for AccountingModule {
    type Report = AccountingReport;

    fn kind(&self) -> ModuleKind {
        ModuleKind::Accounting
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

        let mut ours: Vec<(&Validator, u64)> = validators
            .iter()
            .filter_map(|validator| {
                operator_of
                    .get(&validator.pubkey.0)
                    .map(|operator| (validator, *operator))
            })
            .collect();
        // Validator indices fix the aggregation order regardless of the
        // order providers answered in.
        ours.sort_by_key(|(validator, _)| validator.index);
        info!(
            all = validators.len(),
            ours = ours.len(),
            "validators matched against the key registry"
        );

        let validators_count = ours.len() as u64;
        let cl_balance_gwei = ours
            .iter()
            .map(|(validator, _)| validator.balance_gwei)
            .sum();
        let exited_validators_count = ours
            .iter()
            .filter(|(validator, _)| validator.status == ValidatorStatus::Exited)
            .count() as u64;

        let mut deltas: BTreeMap<u64, OperatorDelta> = BTreeMap::new();
        for (validator, operator_id) in &ours {
            let delta = deltas.entry(*operator_id).or_insert(OperatorDelta {
                operator_id: *operator_id,
                exited_count: 0,
                stuck_count: 0,
            });
            match validator.status {
                ValidatorStatus::Exited => delta.exited_count += 1,
                ValidatorStatus::Exiting => delta.stuck_count += 1,
                ValidatorStatus::Pending | ValidatorStatus::Active => {}
            }
        }

        let extra_data = chunk_deltas(
            deltas.into_values().collect(),
            ctx.config.extra_data_max_items_per_chunk.get(),
        )?;
        let extra_data_hash = ExtraDataChunk::sequence_hash(&extra_data);

        Ok(AccountingReport {
            consensus_version: CONSENSUS_VERSION,
            ref_slot: stamp.ref_slot,
            validators_count,
            cl_balance_gwei,
            exited_validators_count,
            extra_data_items_count: extra_data.len() as u64,
            extra_data_hash,
            extra_data,
        })
    }
}

/// Pack operator deltas into ordered chunks of at most `max_items` each.
fn chunk_deltas(deltas: Vec<OperatorDelta>, max_items: usize) -> Result<Vec<ExtraDataChunk>> {
    use bincode::Options;
    use quorus_types::error::OracleError;
    use quorus_utils::bincode::bincode_opts;

    deltas
        .chunks(max_items)
        .enumerate()
        .map(|(index, items)| {
            let payload = bincode_opts()
                .serialize(items)
                .map_err(|err| OracleError::FailedToSerialize(err.to_string()))?;
            Ok(ExtraDataChunk {
                index: index as u64,
                payload,
            })
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn delta(operator_id: u64) -> OperatorDelta {
        OperatorDelta {
            operator_id,
            exited_count: 1,
            stuck_count: 0,
        }
    }

    #[test]
    fn chunking_respects_max_items() {
        let deltas: Vec<_> = (0..7).map(delta).collect();
        let chunks = chunk_deltas(deltas, 3).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(
            chunks.iter().map(|chunk| chunk.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn no_deltas_means_no_chunks() {
        let chunks = chunk_deltas(Vec::new(), 3).unwrap();
        assert!(chunks.is_empty());
        assert_eq!(
            ExtraDataChunk::sequence_hash(&chunks),
            ExtraDataChunk::sequence_hash(&[])
        );
    }

    #[test]
    fn report_hash_ignores_chunk_storage_but_binds_their_content() {
        let chunks = chunk_deltas(vec![delta(1), delta(2)], 32).unwrap();
        let report = AccountingReport {
            consensus_version: CONSENSUS_VERSION,
            ref_slot: SlotNumber::new(1000),
            validators_count: 2,
            cl_balance_gwei: 64_000_000_000,
            exited_validators_count: 2,
            extra_data_items_count: chunks.len() as u64,
            extra_data_hash: ExtraDataChunk::sequence_hash(&chunks),
            extra_data: chunks,
        };

        // Dropping the in-memory chunks (as a deserialized copy would)
        // leaves the hash unchanged; changing their content does not.
        let mut stripped = report.clone();
        stripped.extra_data = Vec::new();
        assert_eq!(report.hash(), stripped.hash());

        let mut tampered = report.clone();
        tampered.extra_data_hash = ExtraDataChunk::sequence_hash(&[]);
        assert_ne!(report.hash(), tampered.hash());
    }
}
