//! Application context - wires an asset, its modules and their collaborators

use std::sync::Arc;

use anyhow::{anyhow, bail, Context as _};
use chrono::{DateTime, Utc};
use regulus_asset::{AssetConfig, AssetKind, NftF, TokenF};
use regulus_compliance::{AssetBinding, KycModule, RegulatoryModule};
use regulus_core::{Address, AssetOperation, ContextKey, ManualClock, TransferParty};
use regulus_modules::{
    topics, SimpleKycModule, SoulboundRegistry, TransferLimitsModule, TransferRateLimitModule,
};

use crate::scenario::{account, ModuleKind};

/// Deployed asset of either accounting model
pub enum Asset {
    Fungible(TokenF),
    NonFungible(NftF),
}

/// Application context
///
/// Owns the asset, the soulbound registry backing KYC, the scenario clock
/// and handles to every installed module.
pub struct AppContext {
    pub config: AssetConfig,
    pub owner: Address,
    pub asset: Asset,
    pub clock: Arc<ManualClock>,
    pub claims: Arc<SoulboundRegistry>,
    kyc: Option<Arc<SimpleKycModule>>,
    limits: Option<Arc<TransferLimitsModule>>,
    rate_limit: Option<Arc<TransferRateLimitModule>>,
}

impl AppContext {
    /// Deploy an asset owned by `owner`, starting the clock at `start_time`
    pub fn new(config: AssetConfig, owner: &str, start_time: i64) -> anyhow::Result<Self> {
        config.validate()?;
        let owner = account(owner)?;
        let this = Address::derive(&format!("asset:{}", config.symbol));

        let asset = match config.kind {
            AssetKind::Fungible => Asset::Fungible(TokenF::new(this, owner, &config)?),
            AssetKind::NonFungible => Asset::NonFungible(NftF::new(this, owner, &config)?),
        };

        let start = DateTime::<Utc>::from_timestamp(start_time, 0)
            .ok_or_else(|| anyhow!("start_time out of range: {start_time}"))?;

        tracing::info!(
            asset = %this,
            name = %config.name,
            kind = %config.kind,
            "Scenario asset ready"
        );

        Ok(Self {
            config,
            owner,
            asset,
            clock: Arc::new(ManualClock::new(start)),
            claims: Arc::new(SoulboundRegistry::new()),
            kyc: None,
            limits: None,
            rate_limit: None,
        })
    }

    pub fn this(&self) -> Address {
        self.core().this()
    }

    pub fn core(&self) -> &regulus_asset::AssetCore {
        match &self.asset {
            Asset::Fungible(token) => token.core(),
            Asset::NonFungible(nft) => nft.core(),
        }
    }

    pub fn core_mut(&mut self) -> &mut regulus_asset::AssetCore {
        match &mut self.asset {
            Asset::Fungible(token) => token.core_mut(),
            Asset::NonFungible(nft) => nft.core_mut(),
        }
    }

    /// Create, initialize and register a bundled module
    pub fn install(&mut self, kind: ModuleKind) -> anyhow::Result<()> {
        if self.is_installed(kind) {
            bail!("module {kind} already installed");
        }

        let binding = AssetBinding::new(self.this(), self.core().access());
        let address = Address::derive(&format!("module:{kind}:{}", self.config.symbol));
        let owner = self.owner;

        match kind {
            ModuleKind::SimpleKyc => {
                let module = Arc::new(SimpleKycModule::new(address, binding));
                module.init(self.claims.clone())?;
                let dynamic: Arc<dyn KycModule> = module.clone();
                self.core_mut().add_kyc_modules(owner, vec![dynamic])?;
                self.kyc = Some(module);
            }
            ModuleKind::TransferLimits => {
                let limits = &self.config.transfer_limits;
                let module = Arc::new(TransferLimitsModule::new(address, binding));
                module.init(limits.min, limits.max)?;
                let dynamic: Arc<dyn RegulatoryModule> = module.clone();
                self.core_mut().add_regulatory_modules(owner, vec![dynamic])?;
                self.limits = Some(module);
            }
            ModuleKind::RateLimit => {
                let params = &self.config.rate_limit;
                let module = Arc::new(TransferRateLimitModule::new(
                    address,
                    binding,
                    self.clock.clone(),
                ));
                module.init(
                    params.max_transfers_per_period,
                    params.time_period(),
                    params.subject,
                )?;
                let dynamic: Arc<dyn RegulatoryModule> = module.clone();
                self.core_mut().add_regulatory_modules(owner, vec![dynamic])?;
                self.rate_limit = Some(module);
            }
        }

        tracing::info!(module = %kind, address = %address, "Module installed");
        Ok(())
    }

    pub fn is_installed(&self, kind: ModuleKind) -> bool {
        match kind {
            ModuleKind::SimpleKyc => self.kyc.is_some(),
            ModuleKind::TransferLimits => self.limits.is_some(),
            ModuleKind::RateLimit => self.rate_limit.is_some(),
        }
    }

    pub fn rate_limit(&self) -> Option<&Arc<TransferRateLimitModule>> {
        self.rate_limit.as_ref()
    }

    /// Activate or deactivate topics on an installed module
    pub fn update_topics(
        &self,
        caller: Address,
        kind: ModuleKind,
        operation: AssetOperation,
        party: Option<TransferParty>,
        names: &[String],
        add: bool,
    ) -> anyhow::Result<()> {
        let topics = names
            .iter()
            .map(|name| topics::by_name(name).ok_or_else(|| anyhow!("unknown topic {name}")))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let selector = operation.selector();
        let not_installed = || anyhow!("module {kind} is not installed");

        let result = match kind {
            ModuleKind::SimpleKyc => {
                let base = self.kyc.as_ref().ok_or_else(not_installed)?.base();
                let key = key_for(selector, party);
                if add {
                    base.add_topics(caller, key, &topics)
                } else {
                    base.remove_topics(caller, key, &topics)
                }
            }
            ModuleKind::TransferLimits => {
                let base = self.limits.as_ref().ok_or_else(not_installed)?.base();
                let key = key_for(selector, party);
                if add {
                    base.add_topics(caller, key, &topics)
                } else {
                    base.remove_topics(caller, key, &topics)
                }
            }
            ModuleKind::RateLimit => {
                let module = self.rate_limit.as_ref().ok_or_else(not_installed)?;
                let party = party.unwrap_or_else(|| module.subject_party());
                let key = ContextKey::for_party(selector, party);
                if add {
                    module.base().add_topics(caller, key, &topics)
                } else {
                    module.base().remove_topics(caller, key, &topics)
                }
            }
        };
        result.with_context(|| format!("updating topics of {kind}/{operation}"))
    }
}

fn key_for(selector: regulus_core::Selector, party: Option<TransferParty>) -> ContextKey {
    match party {
        Some(party) => ContextKey::for_party(selector, party),
        None => ContextKey::for_selector(selector),
    }
}
