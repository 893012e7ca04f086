// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! The report modules: one [`ReportModule`](quorus_types::traits::report::ReportModule)
//! implementation per oracle instance kind.

/// Validator balances and exits.
pub mod accounting;
/// Validator exit requests.
pub mod ejector;
/// Community staking module performance distribution.
pub mod csm;

pub use accounting::AccountingModule;
pub use csm::CsmModule;
pub use ejector::EjectorModule;

use std::collections::BTreeMap;

use quorus_types::{error::Result, traits::keys_api::KeysApi};

/// Deposited keys of one staking module, indexed by raw pubkey bytes.
///
/// Only used keys count; an unused key has no validator behind it.
async fn operator_keys_by_pubkey(
    keys: &dyn KeysApi,
    staking_module_id: u64,
) -> Result<BTreeMap<Vec<u8>, u64>> {
    let keys = keys.operator_keys(staking_module_id).await?;
    Ok(keys
        .into_iter()
        .filter(|key| key.used)
        .map(|key| (key.pubkey.0, key.operator_id))
        .collect())
}
