// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Access to the operator key registry service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{data::BlsPubkey, error::Result};

/// One deposited key and the operator it belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorKey {
    /// Node-operator id within the staking module.
    pub operator_id: u64,
    /// The deposited BLS public key.
    pub pubkey: BlsPubkey,
    /// Whether the key has been used for a deposit.
    pub used: bool,
}

/// Client for the keys API service.
///
/// Pagination happens inside the implementation; consumers always see the
/// complete key set for a module or an error.
#[async_trait]
pub trait KeysApi: Send + Sync {
    /// Every registered key for the staking module `module_id`.
    async fn operator_keys(&self, module_id: u64) -> Result<Vec<OperatorKey>>;
}
