// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! A deterministic report module for driving whole cycles in tests.

use async_trait::async_trait;
use committable::{Commitment, Committable, RawCommitmentBuilder};
use quorus_types::{
    data::{HasRefSlot, ReferenceBlockStamp, SlotNumber},
    error::Result,
    traits::report::{BuildContext, ExtraDataChunk, ModuleKind, OracleReport, ReportModule},
};
use serde::{Deserialize, Serialize};

/// A minimal report whose hash is a pure function of `(ref_slot, tag)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReport {
    /// Frame reference slot the report is tagged with.
    pub ref_slot: SlotNumber,
    /// Content stand-in; two builders with different tags disagree.
    pub tag: u64,
    /// Scripted extra-data chunks.
    #[serde(skip)]
    pub extra: Vec<ExtraDataChunk>,
}

impl Committable for TestReport {
    fn commit(&self) -> Commitment<Self> {
        RawCommitmentBuilder::new("Test report")
            .u64_field("ref slot", *self.ref_slot)
            .u64_field("tag", self.tag)
            .var_size_field(
                "extra data",
                ExtraDataChunk::sequence_hash(&self.extra).as_h256().as_bytes(),
            )
            .finalize()
    }
}

impl HasRefSlot for TestReport {
    fn ref_slot(&self) -> SlotNumber {
        self.ref_slot
    }
}

impl OracleReport for TestReport {
    fn extra_data(&self) -> Vec<ExtraDataChunk> {
        self.extra.clone()
    }
}

/// Builder producing [`TestReport`]s.
pub struct TestModule {
    /// Content tag every report carries.
    pub tag: u64,
    /// Number of extra-data chunks per report.
    pub chunks: u64,
}

impl TestModule {
    /// A module with no extra data.
    #[must_use]
    pub fn plain(tag: u64) -> Self {
        Self { tag, chunks: 0 }
    }

    /// A module declaring `chunks` extra-data chunks.
    #[must_use]
    pub fn with_chunks(tag: u64, chunks: u64) -> Self {
        Self { tag, chunks }
    }

    /// The report this module would build for a reference slot; lets tests
    /// pre-compute the hash other members "submitted".
    #[must_use]
    pub fn expected_report(&self, ref_slot: u64) -> TestReport {
        TestReport {
            ref_slot: SlotNumber::new(ref_slot),
            tag: self.tag,
            extra: (0..self.chunks)
                .map(|index| ExtraDataChunk {
                    index,
                    payload: vec![u8::try_from(index).unwrap_or(u8::MAX); 4],
                })
                .collect(),
        }
    }
}

#[async_trait]
impl ReportModule for TestModule {
    type Report = TestReport;

    fn kind(&self) -> ModuleKind {
        ModuleKind::Accounting
    }

    fn consensus_version(&self) -> u64 {
        1
    }

    async fn build_report(
        &self,
        stamp: &ReferenceBlockStamp,
        _ctx: &BuildContext<'_>,
    ) -> Result<Self::Report> {
        Ok(self.expected_report(*stamp.ref_slot))
    }
}
