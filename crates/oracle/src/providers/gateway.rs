// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Client for the consensus-contract gateway.
//!
//! The gateway is the sidecar service that owns contract ABI encoding,
//! transaction signing and gas pricing, and exposes the contract views as
//! plain JSON. This client is therefore both the [`ConsensusContract`]
//! read seam and the [`TransactionSender`] write seam.

use std::num::NonZeroU64;

use async_trait::async_trait;
use ethereum_types::{Address, H256};
use quorus_types::{
    config::RetryPolicy,
    consensus::{CommitteeRoster, ConsensusSnapshot, MemberInfo, ProcessingState},
    data::{EpochNumber, ReportHash, SlotNumber},
    error::{OracleError, Result},
    frame::{ChainConfig, FrameConfig},
    traits::{consensus_contract::ConsensusContract, report::ExtraDataChunk, tx_sender::TransactionSender},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::info;
use url::Url;

use super::{encode_hex, join_url};
use crate::retry::with_retries;

/// Gateway REST client; read and write halves share one connection pool.
pub struct Gateway {
    /// Service endpoint.
    base: Url,
    /// Shared connection pool.
    http: reqwest::Client,
    /// Read retry policy.
    retry: RetryPolicy,
}

/// `GET /v1/config/frame` response.
#[derive(Deserialize)]
struct FrameConfigDto {
    /// Epoch the zeroth frame starts at.
    initial_epoch: u64,
    /// Frame length in epochs.
    epochs_per_frame: u64,
}

/// `GET /v1/committee` response.
#[derive(Deserialize)]
struct CommitteeDto {
    /// Members in submission order.
    members: Vec<Address>,
    /// Quorum threshold.
    quorum: u64,
}

/// One row of `GET /v1/consensus/{ref_slot}`.
#[derive(Deserialize)]
struct SubmissionDto {
    /// Member address.
    member: Address,
    /// Submitted hash.
    hash: H256,
}

/// `GET /v1/consensus/{ref_slot}` response.
#[derive(Deserialize)]
struct ConsensusDto {
    /// Reference slot of the frame.
    ref_slot: u64,
    /// Quorum threshold at read time.
    quorum: u64,
    /// Submitted hashes.
    submissions: Vec<SubmissionDto>,
}

/// `GET /v1/members/{address}` response.
#[derive(Deserialize)]
struct MemberInfoDto {
    /// Whether the address is on the roster.
    is_member: bool,
    /// Last reference slot the member reported for.
    last_report_ref_slot: u64,
    /// Hash submitted for the current frame, if any.
    current_frame_member_hash: Option<H256>,
}

/// `GET /v1/processing/{ref_slot}` response.
#[derive(Deserialize)]
struct ProcessingDto {
    /// Reference slot of the frame.
    ref_slot: u64,
    /// Whether the main report landed.
    main_data_submitted: bool,
    /// Extra-data chunks declared by the report.
    extra_data_items_count: u64,
    /// Extra-data chunks processed so far.
    extra_data_items_submitted: u64,
}

/// `POST /v1/report-hash` body.
#[derive(Serialize)]
struct SubmitHashBody {
    /// Reference slot of the frame.
    ref_slot: u64,
    /// This member's report hash.
    hash: H256,
}

/// `POST /v1/report` body.
#[derive(Serialize)]
struct SubmitReportBody {
    /// Reference slot of the frame.
    ref_slot: u64,
    /// 0x-prefixed canonical report payload.
    payload: String,
}

/// `POST /v1/extra-data` body.
#[derive(Serialize)]
struct SubmitExtraDataBody {
    /// Reference slot of the frame.
    ref_slot: u64,
    /// Chunk position.
    index: u64,
    /// 0x-prefixed chunk payload.
    payload: String,
}

impl Gateway {
    /// Create a client against a gateway endpoint.
    #[must_use]
    pub fn new(base: Url, retry: RetryPolicy) -> Self {
        Self {
            base,
            http: reqwest::Client::new(),
            retry,
        }
    }

    /// GET a JSON document with retries.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = join_url(&self.base, path)?;
        with_retries(&self.retry, || async {
            let response = self
                .http
                .get(url.clone())
                .send()
                .await
                .map_err(|err| OracleError::NodeUnavailable(err.to_string()))?;
            if !response.status().is_success() {
                return Err(OracleError::NodeUnavailable(format!(
                    "{url} answered {}",
                    response.status()
                )));
            }
            response
                .json::<T>()
                .await
                .map_err(|err| OracleError::NodeUnavailable(format!("decoding {url}: {err}")))
        })
        .await
    }

    /// POST a transaction request exactly once.
    ///
    /// Deliberately unretried: the gateway may have broadcast the
    /// transaction even when our connection died, and the next cycle's
    /// reads will tell.
    async fn post_once<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        let url = join_url(&self.base, path)?;
        let response = self
            .http
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|err| OracleError::TxFailed(err.to_string()))?;
        if !response.status().is_success() {
            return Err(OracleError::TxFailed(format!(
                "{url} answered {}",
                response.status()
            )));
        }
        info!(%url, "transaction accepted by the gateway");
        Ok(())
    }
}

#[async_trait]
impl ConsensusContract for Gateway {
    async fn chain_config(&self) -> Result<ChainConfig> {
        self.get_json("v1/config/chain").await
    }

    async fn frame_config(&self) -> Result<FrameConfig> {
        let dto: FrameConfigDto = self.get_json("v1/config/frame").await?;
        Ok(FrameConfig {
            initial_epoch: EpochNumber::new(dto.initial_epoch),
            epochs_per_frame: dto.epochs_per_frame,
        })
    }

    async fn member_roster(&self) -> Result<CommitteeRoster> {
        let dto: CommitteeDto = self.get_json("v1/committee").await?;
        let quorum = NonZeroU64::new(dto.quorum).ok_or_else(|| {
            OracleError::InconsistentChainState("contract reports a zero quorum".into())
        })?;
        Ok(CommitteeRoster::new(dto.members, quorum))
    }

    async fn consensus_snapshot(&self, ref_slot: SlotNumber) -> Result<ConsensusSnapshot> {
        let dto: ConsensusDto = self
            .get_json(&format!("v1/consensus/{ref_slot}"))
            .await?;
        let quorum = NonZeroU64::new(dto.quorum).ok_or_else(|| {
            OracleError::InconsistentChainState("contract reports a zero quorum".into())
        })?;
        Ok(ConsensusSnapshot {
            ref_slot: SlotNumber::new(dto.ref_slot),
            quorum,
            submissions: dto
                .submissions
                .into_iter()
                .filter(|row| !row.hash.is_zero())
                .map(|row| (row.member, ReportHash::new(row.hash)))
                .collect(),
        })
    }

    async fn member_info(&self, member: Address, ref_slot: SlotNumber) -> Result<MemberInfo> {
        let dto: MemberInfoDto = self
            .get_json(&format!("v1/members/{member:#x}?ref_slot={ref_slot}"))
            .await?;
        Ok(MemberInfo {
            is_member: dto.is_member,
            last_report_ref_slot: SlotNumber::new(dto.last_report_ref_slot),
            current_frame_member_hash: dto
                .current_frame_member_hash
                .filter(|hash| !hash.is_zero())
                .map(ReportHash::new),
        })
    }

    async fn processing_state(&self, ref_slot: SlotNumber) -> Result<ProcessingState> {
        let dto: ProcessingDto = self
            .get_json(&format!("v1/processing/{ref_slot}"))
            .await?;
        Ok(ProcessingState {
            ref_slot: SlotNumber::new(dto.ref_slot),
            main_data_submitted: dto.main_data_submitted,
            extra_data_items_count: dto.extra_data_items_count,
            extra_data_items_submitted: dto.extra_data_items_submitted,
        })
    }
}

#[async_trait]
impl TransactionSender for Gateway {
    async fn submit_report_hash(&self, ref_slot: SlotNumber, hash: ReportHash) -> Result<()> {
        self.post_once(
            "v1/report-hash",
            &SubmitHashBody {
                ref_slot: *ref_slot,
                hash: hash.as_h256(),
            },
        )
        .await
    }

    async fn submit_report(&self, ref_slot: SlotNumber, payload: Vec<u8>) -> Result<()> {
        self.post_once(
            "v1/report",
            &SubmitReportBody {
                ref_slot: *ref_slot,
                payload: encode_hex(&payload),
            },
        )
        .await
    }

    async fn submit_extra_data_chunk(
        &self,
        ref_slot: SlotNumber,
        chunk: &ExtraDataChunk,
    ) -> Result<()> {
        self.post_once(
            "v1/extra-data",
            &SubmitExtraDataBody {
                ref_slot: *ref_slot,
                index: chunk.index,
                payload: encode_hex(&chunk.payload),
            },
        )
        .await
    }
}
