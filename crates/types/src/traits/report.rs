// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! The report-builder capability: one implementation per oracle module.

use std::fmt::{self, Debug, Display, Formatter};

use async_trait::async_trait;
use bincode::Options;
use committable::{Commitment, Committable, RawCommitmentBuilder};
use quorus_utils::bincode::bincode_opts;
use serde::{Deserialize, Serialize};

use crate::{
    config::OracleConfig,
    data::{HasRefSlot, ReferenceBlockStamp, ReportHash},
    error::{OracleError, Result},
    frame::{ChainConfig, FrameConfig},
    traits::{chain_reader::ChainReader, keys_api::KeysApi, storage::ReportCache},
};

/// The oracle module a process instance runs as.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleKind {
    /// Validator balances and exits.
    Accounting,
    /// Validator exit requests.
    Ejector,
    /// Community staking module performance distribution.
    Csm,
}

impl ModuleKind {
    /// Stable lowercase name, used in logs and cache file names.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accounting => "accounting",
            Self::Ejector => "ejector",
            Self::Csm => "csm",
        }
    }
}

impl Display for ModuleKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ordered chunk of a report's supplementary payload.
///
/// Chunks are delivered strictly in index order, each in its own
/// transaction, after the main report has landed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraDataChunk {
    /// Position in the chunk sequence, starting at 0.
    pub index: u64,
    /// Canonical chunk payload.
    pub payload: Vec<u8>,
}

impl Committable for ExtraDataChunk {
    fn commit(&self) -> Commitment<Self> {
        RawCommitmentBuilder::new("Extra data chunk")
            .u64_field("index", self.index)
            .var_size_field("payload", &self.payload)
            .finalize()
    }
}

impl ExtraDataChunk {
    /// Commitment binding an ordered chunk sequence into a main report.
    ///
    /// The main report carries only this hash and the chunk count; the
    /// chunks themselves travel in separate transactions.
    #[must_use]
    pub fn sequence_hash(chunks: &[ExtraDataChunk]) -> ReportHash {
        let mut builder =
            RawCommitmentBuilder::<ExtraDataChunk>::new("Extra data sequence")
                .u64_field("count", chunks.len() as u64);
        for chunk in chunks {
            builder = builder.var_size_field("chunk", chunk.commit().as_ref());
        }
        ReportHash::from_commitment(builder.finalize())
    }
}

/// A canonical, deterministically serializable report.
///
/// Two honest operators computing the report for the same reference slot
/// from equally finalized data must produce byte-identical [`encode`]
/// output and therefore identical hashes; determinism is the whole
/// protocol, so implementations must not read clocks, maps with random
/// iteration order, or any other ambient state.
///
/// [`encode`]: OracleReport::encode
pub trait OracleReport: Committable + Serialize + HasRefSlot + Clone + Debug + Send + Sync {
    /// The report's supplementary payload, in delivery order. Empty for
    /// modules without extra data.
    fn extra_data(&self) -> Vec<ExtraDataChunk>;

    /// Canonical byte encoding submitted as the main report payload.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::FailedToSerialize`] if serialization fails.
    fn encode(&self) -> Result<Vec<u8>> {
        bincode_opts()
            .serialize(self)
            .map_err(|err| OracleError::FailedToSerialize(err.to_string()))
    }

    /// The 32-byte hash submitted during the consensus phase.
    fn hash(&self) -> ReportHash {
        ReportHash::from_commitment(self.commit())
    }
}

/// Everything a module may consult while building a report.
///
/// Holds borrows only: the orchestrator owns the collaborators and hands a
/// fresh context to the builder once per cycle.
pub struct BuildContext<'a> {
    /// Consensus-layer reader.
    pub chain: &'a dyn ChainReader,
    /// Operator key registry.
    pub keys: &'a dyn KeysApi,
    /// Persisted fragment cache.
    pub cache: &'a dyn ReportCache,
    /// Chain timing parameters.
    pub chain_config: &'a ChainConfig,
    /// Frame-length parameters.
    pub frame_config: &'a FrameConfig,
    /// Instance configuration.
    pub config: &'a OracleConfig,
}

/// One oracle module's report builder.
///
/// The cycle orchestrator is generic over this capability; accounting,
/// ejector and csm each provide one implementation.
#[async_trait]
pub trait ReportModule: Send + Sync + 'static {
    /// The module's report type.
    type Report: OracleReport;

    /// Which module this is.
    fn kind(&self) -> ModuleKind;

    /// Version tag of the report semantics; bumped on incompatible
    /// changes so stale cache fragments and stale contract expectations
    /// are both detected.
    fn consensus_version(&self) -> u64;

    /// Build the report for one reference blockstamp.
    ///
    /// Must be pure given equal chain state: called once per cycle and its
    /// output is hashed for cross-operator comparison.
    async fn build_report(
        &self,
        stamp: &ReferenceBlockStamp,
        ctx: &BuildContext<'_>,
    ) -> Result<Self::Report>;
}
