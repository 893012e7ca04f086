// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! [`ChainReader`] over the standard beacon node REST API.

use async_trait::async_trait;
use ethereum_types::H256;
use quorus_types::{
    config::RetryPolicy,
    data::{
        AttestationDuty, BlockStamp, BlsPubkey, EpochNumber, SlotNumber, Validator,
        ValidatorStatus,
    },
    error::{OracleError, Result},
    traits::chain_reader::ChainReader,
};
use serde::{de::DeserializeOwned, Deserialize};
use url::Url;

use super::{decode_hex, join_url};
use crate::retry::with_retries;

/// Beacon REST API client.
pub struct BeaconChainReader {
    /// Node endpoint.
    base: Url,
    /// Shared connection pool.
    http: reqwest::Client,
    /// Read retry policy.
    retry: RetryPolicy,
}

/// `GET /eth/v1/beacon/headers/{block_id}` response.
#[derive(Deserialize)]
struct HeaderResponse {
    /// Whether the header is in the finalized portion of the chain.
    finalized: Option<bool>,
    /// Header payload.
    data: HeaderData,
}

/// Header payload.
#[derive(Deserialize)]
struct HeaderData {
    /// Block root.
    root: H256,
    /// Whether the block is on the canonical chain.
    canonical: Option<bool>,
    /// Signed header envelope.
    header: HeaderEnvelope,
}

/// Signed header envelope.
#[derive(Deserialize)]
struct HeaderEnvelope {
    /// The header itself.
    message: HeaderMessage,
}

/// The header fields we read.
#[derive(Deserialize)]
struct HeaderMessage {
    /// Slot, as a decimal string.
    slot: String,
    /// State root the block commits to.
    state_root: H256,
}

/// `GET /eth/v2/beacon/blocks/{root}` response.
#[derive(Deserialize)]
struct BlockResponse {
    /// Block payload.
    data: BlockData,
}

/// Block payload.
#[derive(Deserialize)]
struct BlockData {
    /// Signed block envelope.
    message: BlockMessage,
}

/// Signed block envelope.
#[derive(Deserialize)]
struct BlockMessage {
    /// Block body.
    body: BlockBody,
}

/// The block-body fields we read.
#[derive(Deserialize)]
struct BlockBody {
    /// Execution payload carried by the block.
    execution_payload: ExecutionPayload,
}

/// Execution-layer coordinates of a block.
#[derive(Deserialize)]
struct ExecutionPayload {
    /// Execution block number, as a decimal string.
    block_number: String,
    /// Execution block hash.
    block_hash: H256,
}

/// `GET /eth/v1/beacon/states/{state_id}/validators` response.
#[derive(Deserialize)]
struct ValidatorsResponse {
    /// Validator rows.
    data: Vec<ValidatorRow>,
}

/// One validator row.
#[derive(Deserialize)]
struct ValidatorRow {
    /// Validator index, as a decimal string.
    index: String,
    /// Current balance in Gwei, as a decimal string.
    balance: String,
    /// Lifecycle status string.
    status: String,
    /// Registration fields.
    validator: ValidatorDetails,
}

/// Registration fields of a validator row.
#[derive(Deserialize)]
struct ValidatorDetails {
    /// BLS public key, 0x-prefixed hex.
    pubkey: String,
    /// Effective balance in Gwei, as a decimal string.
    effective_balance: String,
    /// Activation epoch, as a decimal string.
    activation_epoch: String,
}

/// `POST /eth/v1/beacon/rewards/attestations/{epoch}` response.
#[derive(Deserialize)]
struct AttestationRewardsResponse {
    /// Rewards payload.
    data: AttestationRewardsData,
}

/// Rewards payload.
#[derive(Deserialize)]
struct AttestationRewardsData {
    /// Per-validator totals.
    total_rewards: Vec<AttestationRewardRow>,
}

/// One validator's attestation rewards for the epoch.
#[derive(Deserialize)]
struct AttestationRewardRow {
    /// Validator index, as a decimal string.
    validator_index: String,
    /// Target-vote reward; zero or negative when the attestation missed.
    target: String,
}

impl BeaconChainReader {
    /// Create a reader against a beacon node endpoint.
    #[must_use]
    pub fn new(base: Url, retry: RetryPolicy) -> Self {
        Self {
            base,
            http: reqwest::Client::new(),
            retry,
        }
    }

    /// GET a JSON document; `Ok(None)` on 404.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = join_url(&self.base, path)?;
        with_retries(&self.retry, || async {
            let response = self
                .http
                .get(url.clone())
                .send()
                .await
                .map_err(|err| OracleError::NodeUnavailable(err.to_string()))?;
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !response.status().is_success() {
                return Err(OracleError::NodeUnavailable(format!(
                    "{url} answered {}",
                    response.status()
                )));
            }
            response
                .json::<T>()
                .await
                .map(Some)
                .map_err(|err| OracleError::NodeUnavailable(format!("decoding {url}: {err}")))
        })
        .await
    }

    /// POST a JSON body; `Ok(None)` on 404.
    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<Option<T>> {
        let url = join_url(&self.base, path)?;
        with_retries(&self.retry, || async {
            let response = self
                .http
                .post(url.clone())
                .json(body)
                .send()
                .await
                .map_err(|err| OracleError::NodeUnavailable(err.to_string()))?;
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !response.status().is_success() {
                return Err(OracleError::NodeUnavailable(format!(
                    "{url} answered {}",
                    response.status()
                )));
            }
            response
                .json::<T>()
                .await
                .map(Some)
                .map_err(|err| OracleError::NodeUnavailable(format!("decoding {url}: {err}")))
        })
        .await
    }

    /// Fetch the header for a block id, failing on missed slots.
    async fn header(&self, block_id: &str) -> Result<HeaderResponse> {
        self.get_json::<HeaderResponse>(&format!("eth/v1/beacon/headers/{block_id}"))
            .await?
            .ok_or_else(|| OracleError::NodeUnavailable(format!("no header for {block_id}")))
    }

    /// Build a blockstamp from a header, fetching the block body for the
    /// execution-layer coordinates.
    async fn stamp_from_header(&self, header: HeaderResponse) -> Result<BlockStamp> {
        let slot = SlotNumber::new(parse_u64(&header.data.header.message.slot)?);
        if header.finalized == Some(false) || header.data.canonical == Some(false) {
            return Err(OracleError::SlotNotFinalized(slot));
        }
        let root = header.data.root;
        let block = self
            .get_json::<BlockResponse>(&format!("eth/v2/beacon/blocks/{root:#x}"))
            .await?
            .ok_or_else(|| OracleError::NodeUnavailable(format!("no block body for {root:#x}")))?;
        let payload = block.data.message.body.execution_payload;
        Ok(BlockStamp {
            slot_number: slot,
            block_root: root,
            state_root: header.data.header.message.state_root,
            block_number: parse_u64(&payload.block_number)?,
            block_hash: payload.block_hash,
        })
    }
}

#[async_trait]
impl ChainReader for BeaconChainReader {
    async fn finalized_blockstamp(&self) -> Result<BlockStamp> {
        let header = self.header("finalized").await?;
        self.stamp_from_header(header).await
    }

    async fn block_exists(&self, slot: SlotNumber) -> Result<bool> {
        Ok(self
            .get_json::<HeaderResponse>(&format!("eth/v1/beacon/headers/{slot}"))
            .await?
            .is_some())
    }

    async fn blockstamp_at(&self, slot: SlotNumber) -> Result<BlockStamp> {
        let header = self
            .get_json::<HeaderResponse>(&format!("eth/v1/beacon/headers/{slot}"))
            .await?
            .ok_or(OracleError::SlotMissed(slot))?;
        self.stamp_from_header(header).await
    }

    async fn validators(&self, stamp: &BlockStamp) -> Result<Vec<Validator>> {
        let response = self
            .get_json::<ValidatorsResponse>(&format!(
                "eth/v1/beacon/states/{:#x}/validators",
                stamp.state_root
            ))
            .await?
            .ok_or_else(|| {
                OracleError::NodeUnavailable(format!("no state {:#x}", stamp.state_root))
            })?;
        response.data.into_iter().map(parse_validator).collect()
    }

    async fn epoch_participation(&self, epoch: EpochNumber) -> Result<Vec<AttestationDuty>> {
        // An empty validator filter asks for the whole set.
        let response = self
            .post_json::<AttestationRewardsResponse>(
                &format!("eth/v1/beacon/rewards/attestations/{epoch}"),
                &serde_json::Value::Array(Vec::new()),
            )
            .await?
            .ok_or_else(|| {
                OracleError::NodeUnavailable(format!("no attestation rewards for epoch {epoch}"))
            })?;
        response
            .data
            .total_rewards
            .into_iter()
            .map(|row| {
                Ok(AttestationDuty {
                    validator_index: parse_u64(&row.validator_index)?,
                    included: row.target.parse::<i64>().map_or(false, |value| value > 0),
                })
            })
            .collect()
    }
}

/// Parse a decimal string field.
fn parse_u64(value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .map_err(|err| OracleError::NodeUnavailable(format!("malformed number {value:?}: {err}")))
}

/// Map one validator row onto the core type.
fn parse_validator(row: ValidatorRow) -> Result<Validator> {
    let pubkey = decode_hex(&row.validator.pubkey).ok_or_else(|| {
        OracleError::NodeUnavailable(format!("malformed pubkey {:?}", row.validator.pubkey))
    })?;
    let activation = parse_u64(&row.validator.activation_epoch).ok();
    Ok(Validator {
        index: parse_u64(&row.index)?,
        pubkey: BlsPubkey(pubkey),
        balance_gwei: parse_u64(&row.balance)?,
        effective_balance_gwei: parse_u64(&row.validator.effective_balance)?,
        activation_epoch: activation.map(EpochNumber::new),
        status: parse_status(&row.status),
    })
}

/// Map a beacon API status string onto the coarse lifecycle enum.
fn parse_status(status: &str) -> ValidatorStatus {
    match status {
        s if s.starts_with("pending") => ValidatorStatus::Pending,
        "active_exiting" | "active_slashed" => ValidatorStatus::Exiting,
        s if s.starts_with("active") => ValidatorStatus::Active,
        _ => ValidatorStatus::Exited,
    }
}
