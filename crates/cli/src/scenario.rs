//! Scenario files - a module setup plus a list of steps to replay

use std::path::Path;

use regulus_core::{Address, AssetOperation, TransferParty};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// A replayable scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Label of the deploying account
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Modules to install, in consultation order
    #[serde(default)]
    pub modules: Vec<ModuleKind>,

    /// Unix time the scenario clock starts at (seconds)
    #[serde(default)]
    pub start_time: i64,

    pub steps: Vec<Step>,
}

fn default_owner() -> String {
    "owner".to_string()
}

/// Bundled modules a scenario can install
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModuleKind {
    SimpleKyc,
    TransferLimits,
    RateLimit,
}

/// One scenario step
///
/// Accounts are labels (hashed with [`Address::derive`]) or `0x` addresses.
/// Fungible assets use `amount`, non-fungible assets use `token_id`.
/// A missing `caller` means the scenario owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Mint {
        to: String,
        #[serde(default)]
        amount: Decimal,
        #[serde(default)]
        token_id: u64,
        #[serde(default)]
        caller: Option<String>,
    },
    Burn {
        from: String,
        #[serde(default)]
        amount: Decimal,
        #[serde(default)]
        token_id: u64,
        #[serde(default)]
        caller: Option<String>,
    },
    Transfer {
        from: String,
        to: String,
        #[serde(default)]
        amount: Decimal,
        #[serde(default)]
        token_id: u64,
    },
    TransferFrom {
        caller: String,
        from: String,
        to: String,
        #[serde(default)]
        amount: Decimal,
        #[serde(default)]
        token_id: u64,
    },
    Approve {
        owner: String,
        spender: String,
        #[serde(default)]
        amount: Decimal,
        #[serde(default)]
        token_id: u64,
    },
    ForcedTransfer {
        from: String,
        to: String,
        #[serde(default)]
        amount: Decimal,
        #[serde(default)]
        token_id: u64,
        #[serde(default)]
        caller: Option<String>,
    },
    Recovery {
        lost: String,
        new: String,
        #[serde(default)]
        caller: Option<String>,
    },
    /// Issue a soulbound attestation
    Attest { holder: String, token_id: u64 },
    /// Withdraw a soulbound attestation
    Revoke { token_id: u64 },
    AddTopics {
        module: ModuleKind,
        operation: AssetOperation,
        #[serde(default)]
        party: Option<TransferParty>,
        topics: Vec<String>,
    },
    RemoveTopics {
        module: ModuleKind,
        operation: AssetOperation,
        #[serde(default)]
        party: Option<TransferParty>,
        topics: Vec<String>,
    },
    /// Move the scenario clock forward
    Advance { seconds: i64 },
}

impl Step {
    /// Short human-readable description
    pub fn describe(&self) -> String {
        match self {
            Step::Mint { to, amount, token_id, .. } => {
                format!("mint {} to {to}", quantity(*amount, *token_id))
            }
            Step::Burn { from, amount, token_id, .. } => {
                format!("burn {} from {from}", quantity(*amount, *token_id))
            }
            Step::Transfer { from, to, amount, token_id } => {
                format!("transfer {} {from} -> {to}", quantity(*amount, *token_id))
            }
            Step::TransferFrom { caller, from, to, amount, token_id } => format!(
                "transfer_from {} {from} -> {to} by {caller}",
                quantity(*amount, *token_id)
            ),
            Step::Approve { owner, spender, amount, token_id } => format!(
                "approve {spender} for {} of {owner}",
                quantity(*amount, *token_id)
            ),
            Step::ForcedTransfer { from, to, amount, token_id, .. } => format!(
                "forced_transfer {} {from} -> {to}",
                quantity(*amount, *token_id)
            ),
            Step::Recovery { lost, new, .. } => format!("recovery {lost} -> {new}"),
            Step::Attest { holder, token_id } => format!("attest {holder} (#{token_id})"),
            Step::Revoke { token_id } => format!("revoke attestation #{token_id}"),
            Step::AddTopics { module, operation, topics, .. } => {
                format!("add_topics {module}/{operation} [{}]", topics.join(", "))
            }
            Step::RemoveTopics { module, operation, topics, .. } => {
                format!("remove_topics {module}/{operation} [{}]", topics.join(", "))
            }
            Step::Advance { seconds } => format!("advance {seconds}s"),
        }
    }

    /// Account labels this step mentions, in order
    pub fn accounts(&self) -> Vec<&str> {
        match self {
            Step::Mint { to, .. } => vec![to.as_str()],
            Step::Burn { from, .. } => vec![from.as_str()],
            Step::Transfer { from, to, .. } | Step::ForcedTransfer { from, to, .. } => {
                vec![from.as_str(), to.as_str()]
            }
            Step::TransferFrom { caller, from, to, .. } => {
                vec![caller.as_str(), from.as_str(), to.as_str()]
            }
            Step::Approve { owner, spender, .. } => vec![owner.as_str(), spender.as_str()],
            Step::Recovery { lost, new, .. } => vec![lost.as_str(), new.as_str()],
            Step::Attest { holder, .. } => vec![holder.as_str()],
            Step::Revoke { .. }
            | Step::AddTopics { .. }
            | Step::RemoveTopics { .. }
            | Step::Advance { .. } => Vec::new(),
        }
    }
}

fn quantity(amount: Decimal, token_id: u64) -> String {
    if amount.is_zero() && token_id != 0 {
        format!("#{token_id}")
    } else {
        amount.to_string()
    }
}

impl Scenario {
    /// Load a scenario from a JSON file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Resolve an account label or `0x` address
pub fn account(label: &str) -> anyhow::Result<Address> {
    if label.starts_with("0x") {
        Ok(label.parse()?)
    } else {
        Ok(Address::derive(label))
    }
}
