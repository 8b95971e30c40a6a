//! Transfer rate limit module - fixed-window transfer counting per subject
//!
//! Time is cut into consecutive windows of `time_period`. Each subject may
//! complete at most `max_transfers_per_period` operations per window.
//!
//! Windows are fixed, not sliding: a burst straddling a boundary can pass
//! up to twice the maximum.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use parking_lot::RwLock;
use regulus_compliance::{
    AssetBinding, ComplianceError, ComplianceResult, Module, ModuleBase, PendingUpdate,
    RegulatoryModule,
};
use regulus_core::{Address, Clock, ContextKey, OperationContext, TransferParty};
use serde::{Deserialize, Serialize};

use crate::topics;

/// Completed transfers of one subject in one window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodCounter {
    /// Window index: `floor(unix_time / time_period)`
    pub period: i64,
    pub count: u64,
}

#[derive(Debug, Clone, Copy)]
struct RateLimitParams {
    max_transfers_per_period: u64,
    time_period: Duration,
    subject: TransferParty,
}

/// Regulatory module capping how often a subject may transfer
///
/// Topic: `MAX_TRANSFERS_PER_PERIOD`. The gate is side-effect free; the count
/// only moves when the update staged by `notify_completed` is applied.
pub struct TransferRateLimitModule {
    base: ModuleBase<TransferRateLimitModule>,
    params: RwLock<RateLimitParams>,
    counters: RwLock<HashMap<Address, PeriodCounter>>,
    clock: Arc<dyn Clock>,
}

impl TransferRateLimitModule {
    pub fn new(address: Address, binding: AssetBinding, clock: Arc<dyn Clock>) -> Self {
        Self {
            base: ModuleBase::new(address, "TransferRateLimit", binding),
            params: RwLock::new(RateLimitParams {
                max_transfers_per_period: 0,
                time_period: Duration::days(1),
                subject: TransferParty::Sender,
            }),
            counters: RwLock::new(HashMap::new()),
            clock,
        }
    }

    pub fn base(&self) -> &ModuleBase<TransferRateLimitModule> {
        &self.base
    }

    /// One-shot initializer
    pub fn init(
        &self,
        max_transfers_per_period: u64,
        time_period: Duration,
        subject: TransferParty,
    ) -> ComplianceResult<()> {
        self.base
            .initializer(|| self.init_unchained(max_transfers_per_period, time_period, subject))
    }

    /// Per-layer initializer; only callable from [`TransferRateLimitModule::init`]
    pub fn init_unchained(
        &self,
        max_transfers_per_period: u64,
        time_period: Duration,
        subject: TransferParty,
    ) -> ComplianceResult<()> {
        self.base.only_initializing()?;
        validate_period(time_period)?;
        *self.params.write() = RateLimitParams {
            max_transfers_per_period,
            time_period,
            subject,
        };
        self.wire_handlers();
        Ok(())
    }

    fn wire_handlers(&self) {
        self.base.set_handler(
            topics::max_transfers_per_period(),
            Self::check_max_transfers_per_period,
        );
    }

    // === Parameters ===

    pub fn max_transfers_per_period(&self) -> u64 {
        self.params.read().max_transfers_per_period
    }

    pub fn time_period(&self) -> Duration {
        self.params.read().time_period
    }

    /// Party whose transfers are counted
    pub fn subject_party(&self) -> TransferParty {
        self.params.read().subject
    }

    pub fn set_max_transfers_per_period(&self, caller: Address, max: u64) -> ComplianceResult<()> {
        self.base.only_agent(caller)?;
        self.params.write().max_transfers_per_period = max;
        tracing::info!(module = %self.base.address(), max, "Max transfers per period set");
        Ok(())
    }

    /// Change the window length; existing counters are re-bucketed lazily
    pub fn set_time_period(&self, caller: Address, time_period: Duration) -> ComplianceResult<()> {
        self.base.only_agent(caller)?;
        validate_period(time_period)?;
        self.params.write().time_period = time_period;
        tracing::info!(
            module = %self.base.address(),
            seconds = time_period.num_seconds(),
            "Time period set"
        );
        Ok(())
    }

    // === Counters ===

    /// Raw stored counter for `subject`
    pub fn counter(&self, subject: Address) -> Option<PeriodCounter> {
        self.counters.read().get(&subject).copied()
    }

    /// Transfers `subject` completed in the current window
    pub fn transfers_in_current_period(&self, subject: Address) -> u64 {
        let period = self.current_period(self.time_period());
        self.count_in(subject, period)
    }

    fn current_period(&self, time_period: Duration) -> i64 {
        let seconds = time_period.num_seconds().max(1);
        self.clock.now().timestamp().div_euclid(seconds)
    }

    fn count_in(&self, subject: Address, period: i64) -> u64 {
        self.counters
            .read()
            .get(&subject)
            .filter(|counter| counter.period == period)
            .map_or(0, |counter| counter.count)
    }

    fn count(&self, subject: Address, period: i64) {
        let mut counters = self.counters.write();
        let counter = counters.entry(subject).or_default();
        if counter.period != period {
            counter.period = period;
            counter.count = 0;
        }
        counter.count += 1;

        tracing::debug!(
            module = %self.base.address(),
            subject = %subject,
            period,
            count = counter.count,
            "Transfer counted"
        );
    }

    fn check_max_transfers_per_period(&self, ctx: &OperationContext) -> ComplianceResult<bool> {
        let params = *self.params.read();
        let subject = ctx.party(params.subject);
        let period = self.current_period(params.time_period);
        let count = self.count_in(subject, period);

        Ok(count.saturating_add(1) <= params.max_transfers_per_period)
    }
}

fn validate_period(time_period: Duration) -> ComplianceResult<()> {
    if time_period.num_seconds() <= 0 {
        return Err(ComplianceError::invalid(format!(
            "time period must be at least one second, got {}s",
            time_period.num_seconds()
        )));
    }
    Ok(())
}

impl Module for TransferRateLimitModule {
    fn address(&self) -> Address {
        self.base.address()
    }

    fn name(&self) -> &str {
        self.base.name()
    }

    fn asset(&self) -> Address {
        self.base.asset()
    }

    fn context_key(&self, ctx: &OperationContext) -> ContextKey {
        ContextKey::for_party(ctx.selector, self.subject_party())
    }

    fn evaluate(&self, ctx: &OperationContext) -> ComplianceResult<bool> {
        self.base.evaluate(self, self.context_key(ctx), ctx)
    }
}

impl RegulatoryModule for TransferRateLimitModule {
    fn on_completed(&self, ctx: &OperationContext) -> ComplianceResult<PendingUpdate<'_>> {
        let key = self.context_key(ctx);
        if !self.base.has_topic(key, topics::max_transfers_per_period()) {
            return Ok(PendingUpdate::none());
        }

        let params = *self.params.read();
        let subject = ctx.party(params.subject);
        let period = self.current_period(params.time_period);

        Ok(PendingUpdate::new(move || self.count(subject, period)))
    }
}
