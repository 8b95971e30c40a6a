//! Asset configuration
//!
//! Every field has a default, so a partial JSON file only needs the values
//! it changes.

use std::path::Path;

use chrono::Duration;
use regulus_core::{Role, TransferParty};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::error::{AssetError, AssetResult};

/// Configuration for one asset deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Token name
    #[serde(default = "default_name")]
    pub name: String,

    /// Token symbol
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Fungible or non-fungible accounting
    #[serde(default)]
    pub kind: AssetKind,

    /// Role names guarding each privileged operation
    #[serde(default)]
    pub roles: RoleConfig,

    /// Bounds for the transfer limits module
    #[serde(default)]
    pub transfer_limits: TransferLimitsConfig,

    /// Parameters for the rate limit module
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Accounting model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssetKind {
    #[default]
    Fungible,
    NonFungible,
}

/// Role names, hashed with [`Role::named`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfig {
    #[serde(default = "default_mint_role")]
    pub mint: String,

    #[serde(default = "default_burn_role")]
    pub burn: String,

    #[serde(default = "default_forced_transfer_role")]
    pub forced_transfer: String,

    #[serde(default = "default_recovery_role")]
    pub recovery: String,

    #[serde(default = "default_diamond_cut_role")]
    pub diamond_cut: String,

    #[serde(default = "default_kyc_compliance_role")]
    pub kyc_compliance: String,

    #[serde(default = "default_regulatory_compliance_role")]
    pub regulatory_compliance: String,
}

/// Resolved roles for the privileged operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationRoles {
    pub mint: Role,
    pub burn: Role,
    pub forced_transfer: Role,
    pub recovery: Role,
    pub diamond_cut: Role,
    pub kyc_compliance: Role,
    pub regulatory_compliance: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLimitsConfig {
    /// Smallest amount a single operation may move
    #[serde(default = "default_min_transfer")]
    pub min: Decimal,

    /// Largest amount a single operation may move
    #[serde(default = "default_max_transfer")]
    pub max: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_transfers_per_period")]
    pub max_transfers_per_period: u64,

    /// Window length (in seconds)
    #[serde(default = "default_time_period_secs")]
    pub time_period_secs: u64,

    /// Party whose transfers are counted
    #[serde(default = "default_subject")]
    pub subject: TransferParty,
}

// Default value functions for serde
fn default_name() -> String {
    "Regulus Token".to_string()
}

fn default_symbol() -> String {
    "RGT".to_string()
}

fn default_mint_role() -> String {
    "MINT_ROLE".to_string()
}

fn default_burn_role() -> String {
    "BURN_ROLE".to_string()
}

fn default_forced_transfer_role() -> String {
    "FORCED_TRANSFER_ROLE".to_string()
}

fn default_recovery_role() -> String {
    "RECOVERY_ROLE".to_string()
}

fn default_diamond_cut_role() -> String {
    "DIAMOND_CUT_ROLE".to_string()
}

fn default_kyc_compliance_role() -> String {
    "KYC_COMPLIANCE_ROLE".to_string()
}

fn default_regulatory_compliance_role() -> String {
    "REGULATORY_COMPLIANCE_ROLE".to_string()
}

fn default_min_transfer() -> Decimal {
    Decimal::ZERO
}

fn default_max_transfer() -> Decimal {
    Decimal::new(1_000_000, 0)
}

fn default_max_transfers_per_period() -> u64 {
    10
}

fn default_time_period_secs() -> u64 {
    86_400 // 1 day
}

fn default_subject() -> TransferParty {
    TransferParty::Sender
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            mint: default_mint_role(),
            burn: default_burn_role(),
            forced_transfer: default_forced_transfer_role(),
            recovery: default_recovery_role(),
            diamond_cut: default_diamond_cut_role(),
            kyc_compliance: default_kyc_compliance_role(),
            regulatory_compliance: default_regulatory_compliance_role(),
        }
    }
}

impl RoleConfig {
    /// Hash every role name
    pub fn resolve(&self) -> OperationRoles {
        OperationRoles {
            mint: Role::named(&self.mint),
            burn: Role::named(&self.burn),
            forced_transfer: Role::named(&self.forced_transfer),
            recovery: Role::named(&self.recovery),
            diamond_cut: Role::named(&self.diamond_cut),
            kyc_compliance: Role::named(&self.kyc_compliance),
            regulatory_compliance: Role::named(&self.regulatory_compliance),
        }
    }
}

impl Default for OperationRoles {
    fn default() -> Self {
        RoleConfig::default().resolve()
    }
}

impl Default for TransferLimitsConfig {
    fn default() -> Self {
        Self {
            min: default_min_transfer(),
            max: default_max_transfer(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_transfers_per_period: default_max_transfers_per_period(),
            time_period_secs: default_time_period_secs(),
            subject: default_subject(),
        }
    }
}

const MAX_PERIOD_SECS: u64 = (i64::MAX / 1_000) as u64;

impl RateLimitConfig {
    /// Window length as chrono Duration
    pub fn time_period(&self) -> Duration {
        // chrono caps durations at i64::MAX milliseconds
        let secs = self.time_period_secs.min(MAX_PERIOD_SECS);
        Duration::seconds(secs as i64)
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            symbol: default_symbol(),
            kind: AssetKind::default(),
            roles: RoleConfig::default(),
            transfer_limits: TransferLimitsConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl AssetConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &Path) -> AssetResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AssetError::Config(format!("{}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| AssetError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject inconsistent values
    pub fn validate(&self) -> AssetResult<()> {
        if self.transfer_limits.min > self.transfer_limits.max {
            return Err(AssetError::Config(format!(
                "transfer_limits.min ({}) exceeds transfer_limits.max ({})",
                self.transfer_limits.min, self.transfer_limits.max
            )));
        }
        if self.rate_limit.time_period_secs == 0 {
            return Err(AssetError::Config(
                "rate_limit.time_period_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolved operation roles
    pub fn operation_roles(&self) -> OperationRoles {
        self.roles.resolve()
    }
}
