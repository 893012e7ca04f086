// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! The `quorus` binary: wires providers to the chosen module and runs it.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use quorus_oracle::{
    cache::FileReportCache,
    cli::{resolve_config, Args, ModuleCommand},
    modules::{AccountingModule, CsmModule, EjectorModule},
    providers::{BeaconChainReader, Gateway, HttpKeysApi},
    readiness, Collaborators, CycleOrchestrator,
};
use quorus_types::{
    config::OracleConfig,
    logging::setup_logging,
    traits::{
        chain_reader::ChainReader,
        consensus_contract::ConsensusContract,
        keys_api::KeysApi,
        metrics::NoMetrics,
        report::ReportModule,
        storage::{NoCache, ReportCache},
        tx_sender::TransactionSender,
    },
};

/// Staking module the accounting and ejector instances watch.
const CURATED_STAKING_MODULE_ID: u64 = 1;
/// Staking module the csm instance watches.
const COMMUNITY_STAKING_MODULE_ID: u64 = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging();
    let args = Args::parse();
    let config = resolve_config(&args).context("resolving configuration")?;
    config.validate().context("validating configuration")?;

    let chain: Arc<dyn ChainReader> = Arc::new(BeaconChainReader::new(
        config.consensus_layer_url.clone(),
        config.retry,
    ));
    let gateway = Arc::new(Gateway::new(config.gateway_url.clone(), config.retry));
    let contract: Arc<dyn ConsensusContract> = gateway.clone();
    let sender: Arc<dyn TransactionSender> = gateway.clone();
    let keys: Arc<dyn KeysApi> = Arc::new(HttpKeysApi::new(config.keys_api_url.clone(), config.retry));
    let cache: Arc<dyn ReportCache> = match &config.cache_dir {
        Some(dir) => Arc::new(FileReportCache::new(dir).context("opening the report cache")?),
        None => Arc::new(NoCache),
    };

    let io = Collaborators {
        chain: Arc::clone(&chain),
        contract,
        sender,
        keys: Arc::clone(&keys),
        cache,
    };

    match args.module {
        ModuleCommand::Check => {
            readiness::run_checks(&*chain, &*gateway, &*keys, CURATED_STAKING_MODULE_ID)
                .await
                .context("readiness check failed")?;
        }
        ModuleCommand::Accounting => {
            run_module(
                AccountingModule::new(CURATED_STAKING_MODULE_ID),
                io,
                config,
            )
            .await?;
        }
        ModuleCommand::Ejector => {
            run_module(EjectorModule::new(CURATED_STAKING_MODULE_ID), io, config).await?;
        }
        ModuleCommand::Csm => {
            run_module(CsmModule::new(COMMUNITY_STAKING_MODULE_ID), io, config).await?;
        }
    }
    Ok(())
}

/// Run one module per the resolved configuration.
async fn run_module<M: ReportModule>(
    module: M,
    io: Collaborators,
    config: OracleConfig,
) -> anyhow::Result<()> {
    // Metrics export wiring lives outside this binary; the loop records
    // into a no-op sink unless an exporter is attached.
    let metrics = NoMetrics::boxed();
    let mut orchestrator = CycleOrchestrator::new(module, io, config, &*metrics);
    orchestrator.run().await.context("oracle loop failed")
}
