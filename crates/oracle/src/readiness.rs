// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! The `check` command: one read-only pass over every provider.

use quorus_types::{
    error::{OracleError, Result},
    traits::{chain_reader::ChainReader, consensus_contract::ConsensusContract, keys_api::KeysApi},
};
use tracing::info;

use crate::cycle::describe_stamp;

/// Probe every provider once; no report is built and nothing is sent.
///
/// # Errors
///
/// The first provider failure, so the process exits non-zero and the
/// operator sees which dependency is broken.
pub async fn run_checks(
    chain: &dyn ChainReader,
    contract: &dyn ConsensusContract,
    keys: &dyn KeysApi,
    staking_module_id: u64,
) -> Result<()> {
    let finalized = chain.finalized_blockstamp().await?;
    info!(stamp = %describe_stamp(&finalized), "consensus layer answers");

    let chain_config = contract.chain_config().await?;
    let frame_config = contract.frame_config().await?;
    info!(
        slots_per_epoch = chain_config.slots_per_epoch,
        epochs_per_frame = frame_config.epochs_per_frame,
        initial_epoch = %frame_config.initial_epoch,
        "gateway answers"
    );

    let roster = contract.member_roster().await?;
    if roster.is_empty() {
        return Err(OracleError::InconsistentChainState(
            "committee roster is empty".into(),
        ));
    }
    info!(
        members = roster.len(),
        quorum = roster.quorum().get(),
        "committee roster loaded"
    );

    let keys = keys.operator_keys(staking_module_id).await?;
    info!(keys = keys.len(), "keys api answers");

    info!("all providers ready");
    Ok(())
}
