//! Command implementations

use std::collections::BTreeMap;

use anyhow::anyhow;
use regulus_asset::{AssetConfig, AssetError};
use regulus_core::{hooks, Address, AssetOperation};
use regulus_modules::topics;
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::context::{AppContext, Asset};
use crate::scenario::{account, Scenario, Step};

/// Verdict of one replayed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    /// Refused by a compliance layer
    Denied(String),
    /// Any other error (missing role, ledger, module misconfiguration)
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub step: String,
    pub outcome: Outcome,
}

/// Result of a scenario run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub asset: String,
    pub steps: Vec<StepReport>,
    /// Final holdings per account label (amount, or token count)
    pub balances: BTreeMap<String, String>,
}

impl Report {
    pub fn outcome(&self, index: usize) -> Option<&Outcome> {
        self.steps.get(index).map(|s| &s.outcome)
    }

    pub fn applied(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Applied))
    }

    pub fn denied(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Denied(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    fn count(&self, f: impl Fn(&Outcome) -> bool) -> usize {
        self.steps.iter().filter(|s| f(&s.outcome)).count()
    }
}

/// Deploy an asset, install the scenario's modules and replay every step
///
/// A denied or failed step is recorded and the run continues.
pub fn run(config: AssetConfig, scenario: &Scenario) -> anyhow::Result<Report> {
    let mut ctx = AppContext::new(config, &scenario.owner, scenario.start_time)?;
    for &kind in &scenario.modules {
        ctx.install(kind)?;
    }

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let outcome = match apply(&mut ctx, step) {
            Ok(()) => Outcome::Applied,
            Err(err) => classify(&err),
        };

        match &outcome {
            Outcome::Applied => tracing::debug!(index, step = %step.describe(), "Step applied"),
            Outcome::Denied(reason) => {
                tracing::warn!(index, step = %step.describe(), reason = %reason, "Step denied")
            }
            Outcome::Failed(reason) => {
                tracing::error!(index, step = %step.describe(), reason = %reason, "Step failed")
            }
        }

        steps.push(StepReport {
            index,
            step: step.describe(),
            outcome,
        });
    }

    let balances = balances(&ctx, scenario)?;
    Ok(Report {
        asset: format!("{} ({})", ctx.config.name, ctx.config.symbol),
        steps,
        balances,
    })
}

fn classify(err: &anyhow::Error) -> Outcome {
    match err.downcast_ref::<AssetError>() {
        Some(asset_err) if asset_err.is_denial() => Outcome::Denied(asset_err.to_string()),
        _ => Outcome::Failed(format!("{err:#}")),
    }
}

fn caller_or_owner(ctx: &AppContext, caller: &Option<String>) -> anyhow::Result<Address> {
    caller.as_deref().map_or(Ok(ctx.owner), account)
}

fn apply(ctx: &mut AppContext, step: &Step) -> anyhow::Result<()> {
    match step {
        Step::Mint { to, amount, token_id, caller } => {
            let caller = caller_or_owner(ctx, caller)?;
            let to = account(to)?;
            match &mut ctx.asset {
                Asset::Fungible(token) => token.mint(caller, to, *amount)?,
                Asset::NonFungible(nft) => nft.mint(caller, to, *token_id)?,
            }
        }
        Step::Burn { from, amount, token_id, caller } => {
            let caller = caller_or_owner(ctx, caller)?;
            let from = account(from)?;
            match &mut ctx.asset {
                Asset::Fungible(token) => token.burn(caller, from, *amount)?,
                Asset::NonFungible(nft) => nft.burn(caller, *token_id)?,
            }
        }
        Step::Transfer { from, to, amount, token_id } => {
            let (from, to) = (account(from)?, account(to)?);
            match &mut ctx.asset {
                Asset::Fungible(token) => token.transfer(from, to, *amount)?,
                Asset::NonFungible(nft) => nft.transfer(from, to, *token_id)?,
            }
        }
        Step::TransferFrom { caller, from, to, amount, token_id } => {
            let (caller, from, to) = (account(caller)?, account(from)?, account(to)?);
            match &mut ctx.asset {
                Asset::Fungible(token) => token.transfer_from(caller, from, to, *amount)?,
                Asset::NonFungible(nft) => nft.transfer_from(caller, from, to, *token_id)?,
            }
        }
        Step::Approve { owner, spender, amount, token_id } => {
            let (owner, spender) = (account(owner)?, account(spender)?);
            match &mut ctx.asset {
                Asset::Fungible(token) => token.approve(owner, spender, *amount)?,
                Asset::NonFungible(nft) => nft.approve(owner, spender, *token_id)?,
            }
        }
        Step::ForcedTransfer { from, to, amount, token_id, caller } => {
            let caller = caller_or_owner(ctx, caller)?;
            let (from, to) = (account(from)?, account(to)?);
            match &mut ctx.asset {
                Asset::Fungible(token) => token.forced_transfer(caller, from, to, *amount)?,
                Asset::NonFungible(nft) => nft.forced_transfer(caller, from, to, *token_id)?,
            }
        }
        Step::Recovery { lost, new, caller } => {
            let caller = caller_or_owner(ctx, caller)?;
            let (lost, new) = (account(lost)?, account(new)?);
            match &mut ctx.asset {
                Asset::Fungible(token) => {
                    token.recovery(caller, lost, new)?;
                }
                Asset::NonFungible(nft) => {
                    nft.recovery(caller, lost, new)?;
                }
            }
        }
        Step::Attest { holder, token_id } => ctx.claims.mint(account(holder)?, *token_id)?,
        Step::Revoke { token_id } => ctx.claims.burn(*token_id)?,
        Step::AddTopics { module, operation, party, topics } => {
            ctx.update_topics(ctx.owner, *module, *operation, *party, topics, true)?
        }
        Step::RemoveTopics { module, operation, party, topics } => {
            ctx.update_topics(ctx.owner, *module, *operation, *party, topics, false)?
        }
        Step::Advance { seconds } => {
            if *seconds < 0 {
                return Err(anyhow!("cannot move the clock backwards ({seconds}s)"));
            }
            let by = chrono::Duration::try_seconds(*seconds)
                .ok_or_else(|| anyhow!("advance out of range: {seconds}s"))?;
            ctx.clock.advance(by);
        }
    }
    Ok(())
}

fn balances(ctx: &AppContext, scenario: &Scenario) -> anyhow::Result<BTreeMap<String, String>> {
    let mut labels: Vec<&str> = Vec::new();
    for step in &scenario.steps {
        labels.extend(step.accounts());
    }

    let mut balances = BTreeMap::new();
    for label in labels {
        let address = account(label)?;
        let holding = match &ctx.asset {
            Asset::Fungible(token) => token.balance_of(address).to_string(),
            Asset::NonFungible(nft) => nft.balance_of(address).to_string(),
        };
        balances.insert(label.to_string(), holding);
    }
    Ok(balances)
}

/// Print a run report
pub fn print_report(report: &Report) {
    println!("Asset: {}", report.asset);
    println!();
    for step in &report.steps {
        match &step.outcome {
            Outcome::Applied => println!("✅ [{:>3}] {}", step.index, step.step),
            Outcome::Denied(reason) => {
                println!("⛔ [{:>3}] {} - denied: {}", step.index, step.step, reason)
            }
            Outcome::Failed(reason) => {
                println!("❌ [{:>3}] {} - failed: {}", step.index, step.step, reason)
            }
        }
    }
    println!();
    println!(
        "{} applied, {} denied, {} failed",
        report.applied(),
        report.denied(),
        report.failed()
    );

    if !report.balances.is_empty() {
        println!();
        println!("Balances:");
        for (label, holding) in &report.balances {
            println!("  {label}: {holding}");
        }
    }
}

/// Selector of every base operation and compliance hook
pub fn selectors() -> Vec<(String, String)> {
    let mut rows: Vec<(String, String)> = AssetOperation::iter()
        .map(|op| (op.signature().to_string(), op.selector().to_string()))
        .collect();

    rows.push((hooks::IS_KYCED_SIGNATURE.to_string(), hooks::is_kyced().to_string()));
    rows.push((
        hooks::CAN_TRANSFER_SIGNATURE.to_string(),
        hooks::can_transfer().to_string(),
    ));
    rows.push((
        hooks::TRANSFERRED_SIGNATURE.to_string(),
        hooks::transferred().to_string(),
    ));
    rows
}

/// Identifier of every bundled topic
pub fn topic_table() -> Vec<(String, String)> {
    topics::all()
        .into_iter()
        .map(|(name, topic)| (name.to_string(), topic.to_string()))
        .collect()
}

/// Default configuration as pretty JSON
pub fn default_config() -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&AssetConfig::default())?)
}
