// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! [`KeysApi`] client over the keys registry REST service.

use async_trait::async_trait;
use quorus_types::{
    config::RetryPolicy,
    data::BlsPubkey,
    error::{OracleError, Result},
    traits::keys_api::{KeysApi, OperatorKey},
};
use serde::Deserialize;
use url::Url;

use super::{decode_hex, join_url};
use crate::retry::with_retries;

/// Page size for key listings.
const PAGE_LIMIT: u64 = 1000;

/// Keys API REST client.
pub struct HttpKeysApi {
    /// Service endpoint.
    base: Url,
    /// Shared connection pool.
    http: reqwest::Client,
    /// Read retry policy.
    retry: RetryPolicy,
}

/// One page of `GET /v1/modules/{id}/keys`.
#[derive(Deserialize)]
struct KeysPage {
    /// Key rows.
    data: Vec<KeyRow>,
    /// Listing metadata.
    meta: PageMeta,
}

/// Listing metadata.
#[derive(Deserialize)]
struct PageMeta {
    /// Total keys in the module.
    total: u64,
}

/// One key row.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyRow {
    /// Node-operator id.
    operator_index: u64,
    /// 0x-prefixed hex pubkey.
    key: String,
    /// Whether the key has been used for a deposit.
    used: bool,
}

impl HttpKeysApi {
    /// Create a client against a keys API endpoint.
    #[must_use]
    pub fn new(base: Url, retry: RetryPolicy) -> Self {
        Self {
            base,
            http: reqwest::Client::new(),
            retry,
        }
    }

    /// Fetch one page.
    async fn page(&self, module_id: u64, offset: u64) -> Result<KeysPage> {
        let url = join_url(
            &self.base,
            &format!("v1/modules/{module_id}/keys?offset={offset}&limit={PAGE_LIMIT}"),
        )?;
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
                .json::<KeysPage>()
                .await
                .map_err(|err| OracleError::NodeUnavailable(format!("decoding {url}: {err}")))
        })
        .await
    }
}

#[async_trait]
impl KeysApi for HttpKeysApi {
    async fn operator_keys(&self, module_id: u64) -> Result<Vec<OperatorKey>> {
        let mut keys = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.page(module_id, offset).await?;
            let page_len = page.data.len() as u64;
            for row in page.data {
                let pubkey = decode_hex(&row.key).ok_or_else(|| {
                    OracleError::KeysApiInconsistent(format!("malformed key {:?}", row.key))
                })?;
                keys.push(OperatorKey {
                    operator_id: row.operator_index,
                    pubkey: BlsPubkey(pubkey),
                    used: row.used,
                });
            }
            offset += page_len;
            if page_len < PAGE_LIMIT || offset >= page.meta.total {
                if offset < page.meta.total {
                    // A short page before the advertised total means the
                    // service mutated mid-listing.
                    return Err(OracleError::KeysApiInconsistent(format!(
                        "got {offset} keys of an advertised {}",
                        page.meta.total
                    )));
                }
                break;
            }
        }
        // Registry order is an implementation detail of the service; pin a
        // total order so downstream aggregation is deterministic.
        keys.sort_by(|a, b| {
            (a.operator_id, &a.pubkey.0).cmp(&(b.operator_id, &b.pubkey.0))
        });
        Ok(keys)
    }
}
