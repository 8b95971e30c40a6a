//! Module base - topic table, per-topic handlers and asset binding
//!
//! Every concrete module embeds a [`ModuleBase`]. The base owns:
//! - the binding to one asset (its address and access control)
//! - `ContextKey -> [Topic]`, the rules active for each kind of operation
//! - `Topic -> Handler`, the function that decides one rule
//! - the module's [`Initializable`] flag

use std::collections::HashMap;

use parking_lot::RwLock;
use regulus_core::{AccessHandle, Address, ContextKey, Initializable, OperationContext, Role, Topic};

use crate::error::{ComplianceError, ComplianceResult};

/// Decides one topic for module `M`
pub type Handler<M> = fn(&M, &OperationContext) -> ComplianceResult<bool>;

/// Asset a module serves
#[derive(Clone)]
pub struct AssetBinding {
    pub asset: Address,
    pub access: AccessHandle,
}

impl AssetBinding {
    pub fn new(asset: Address, access: AccessHandle) -> Self {
        Self { asset, access }
    }
}

impl std::fmt::Debug for AssetBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetBinding")
            .field("asset", &self.asset)
            .finish_non_exhaustive()
    }
}

struct TopicTable<M> {
    topics: HashMap<ContextKey, Vec<Topic>>,
    handlers: HashMap<Topic, Handler<M>>,
}

/// Shared state and behaviour of every compliance module
pub struct ModuleBase<M> {
    address: Address,
    name: String,
    binding: AssetBinding,
    table: RwLock<TopicTable<M>>,
    init: RwLock<Initializable>,
}

impl<M> ModuleBase<M> {
    pub fn new(address: Address, name: impl Into<String>, binding: AssetBinding) -> Self {
        Self {
            address,
            name: name.into(),
            binding,
            table: RwLock::new(TopicTable {
                topics: HashMap::new(),
                handlers: HashMap::new(),
            }),
            init: RwLock::new(Initializable::new()),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn asset(&self) -> Address {
        self.binding.asset
    }

    pub fn binding(&self) -> &AssetBinding {
        &self.binding
    }

    // === Initialization ===

    /// Run `f` as the module's one-shot top-level initializer
    ///
    /// No lock is held while `f` runs, so `f` may call back into the base.
    pub fn initializer<T>(&self, f: impl FnOnce() -> ComplianceResult<T>) -> ComplianceResult<T> {
        let mut flag = *self.init.read();
        let result = flag.initializer(|staged| {
            *self.init.write() = *staged;
            f()
        });
        *self.init.write() = flag;
        result
    }

    /// Require an enclosing [`ModuleBase::initializer`]
    pub fn only_initializing(&self) -> ComplianceResult<()> {
        Ok(self.init.read().only_initializing()?)
    }

    pub fn is_initialized(&self) -> bool {
        self.init.read().is_initialized()
    }

    // === Authorization ===

    /// Require the module-admin role on the bound asset
    pub fn only_agent(&self, caller: Address) -> ComplianceResult<()> {
        Ok(self.binding.access.read().check_role(Role::agent(), caller)?)
    }

    /// Require `caller` to be the bound asset
    pub fn only_asset(&self, caller: Address) -> ComplianceResult<()> {
        if caller == self.binding.asset {
            Ok(())
        } else {
            Err(ComplianceError::SenderNotAsset(caller))
        }
    }

    // === Handlers ===

    /// Wire the function deciding `topic`
    pub fn set_handler(&self, topic: Topic, handler: Handler<M>) {
        self.table.write().handlers.insert(topic, handler);
    }

    pub fn has_handler(&self, topic: Topic) -> bool {
        self.table.read().handlers.contains_key(&topic)
    }

    // === Topics ===

    /// Topics active for `key`
    pub fn topics(&self, key: ContextKey) -> Vec<Topic> {
        self.table
            .read()
            .topics
            .get(&key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_topic(&self, key: ContextKey, topic: Topic) -> bool {
        self.table
            .read()
            .topics
            .get(&key)
            .is_some_and(|topics| topics.contains(&topic))
    }

    /// Activate `topics` for `key`; none of them may already be active
    pub fn add_topics(
        &self,
        caller: Address,
        key: ContextKey,
        topics: &[Topic],
    ) -> ComplianceResult<()> {
        self.only_agent(caller)?;

        let mut table = self.table.write();
        let mut staged = table.topics.get(&key).cloned().unwrap_or_default();
        for &topic in topics {
            if staged.contains(&topic) {
                return Err(ComplianceError::TopicAlreadyExists(topic));
            }
            staged.push(topic);
        }
        table.topics.insert(key, staged);

        tracing::info!(
            module = %self.address,
            key = %key,
            added = topics.len(),
            "Topics added"
        );
        Ok(())
    }

    /// Deactivate `topics` for `key`; all of them must be active
    pub fn remove_topics(
        &self,
        caller: Address,
        key: ContextKey,
        topics: &[Topic],
    ) -> ComplianceResult<()> {
        self.only_agent(caller)?;

        let mut table = self.table.write();
        let mut staged = table.topics.get(&key).cloned().unwrap_or_default();
        for topic in topics {
            let position = staged
                .iter()
                .position(|t| t == topic)
                .ok_or(ComplianceError::NoSuchTopic(*topic))?;
            staged.remove(position);
        }
        if staged.is_empty() {
            table.topics.remove(&key);
        } else {
            table.topics.insert(key, staged);
        }

        tracing::info!(
            module = %self.address,
            key = %key,
            removed = topics.len(),
            "Topics removed"
        );
        Ok(())
    }

    // === Evaluation ===

    /// Verdict of `module` under `key`
    ///
    /// An empty topic set passes. Otherwise every topic's handler must pass;
    /// evaluation stops at the first failing topic. Every topic under `key`
    /// must have a handler before any of them runs.
    pub fn evaluate(&self, module: &M, key: ContextKey, ctx: &OperationContext) -> ComplianceResult<bool> {
        let rules: Vec<(Topic, Handler<M>)> = {
            let table = self.table.read();
            match table.topics.get(&key) {
                Some(topics) => topics
                    .iter()
                    .map(|topic| {
                        table
                            .handlers
                            .get(topic)
                            .map(|handler| (*topic, *handler))
                            .ok_or(ComplianceError::HandlerNotSet(*topic))
                    })
                    .collect::<ComplianceResult<_>>()?,
                None => Vec::new(),
            }
        };

        for (topic, handler) in rules {
            if !handler(module, ctx)? {
                tracing::debug!(
                    module = %self.address,
                    topic = %topic,
                    selector = %ctx.selector,
                    "Topic check failed"
                );
                return Ok(false);
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regulus_core::{AccessControl, AssetOperation, InitError};

    /// Module whose only rule is "amount is not zero"
    struct NonZero {
        base: ModuleBase<NonZero>,
    }

    fn non_zero(_module: &NonZero, ctx: &OperationContext) -> ComplianceResult<bool> {
        Ok(!ctx.amount.is_zero())
    }

    fn owner() -> Address {
        Address::derive("owner")
    }

    fn topic() -> Topic {
        Topic::named("NON_ZERO")
    }

    fn key() -> ContextKey {
        ContextKey::for_selector(AssetOperation::Transfer.selector())
    }

    fn module() -> NonZero {
        let binding = AssetBinding::new(
            Address::derive("asset"),
            AccessControl::new(owner()).into_handle(),
        );
        NonZero {
            base: ModuleBase::new(Address::derive("non-zero"), "NonZero", binding),
        }
    }

    fn ctx(amount: u32) -> OperationContext {
        OperationContext::for_operation(AssetOperation::Transfer).with_amount(amount.into())
    }

    #[test]
    fn test_empty_topic_set_passes() {
        let m = module();
        assert!(m.base.evaluate(&m, key(), &ctx(0)).unwrap());
    }

    #[test]
    fn test_unwired_topic_fails() {
        let m = module();
        m.base.add_topics(owner(), key(), &[topic()]).unwrap();

        let err = m.base.evaluate(&m, key(), &ctx(1)).unwrap_err();
        assert_eq!(err, ComplianceError::HandlerNotSet(topic()));
    }

    #[test]
    fn test_unwired_topic_fails_behind_denying_topic() {
        let m = module();
        let unwired = Topic::named("UNWIRED");
        m.base.set_handler(topic(), non_zero);
        m.base.add_topics(owner(), key(), &[topic(), unwired]).unwrap();

        // NON_ZERO denies amount 0, but the missing handler is reported first
        let err = m.base.evaluate(&m, key(), &ctx(0)).unwrap_err();
        assert_eq!(err, ComplianceError::HandlerNotSet(unwired));
    }

    #[test]
    fn test_wired_topic_decides() {
        let m = module();
        m.base.set_handler(topic(), non_zero);
        m.base.add_topics(owner(), key(), &[topic()]).unwrap();

        assert!(m.base.evaluate(&m, key(), &ctx(1)).unwrap());
        assert!(!m.base.evaluate(&m, key(), &ctx(0)).unwrap());
    }

    #[test]
    fn test_add_then_remove_restores_set() {
        let m = module();
        let other = Topic::named("OTHER");
        m.base.add_topics(owner(), key(), &[other]).unwrap();

        m.base.add_topics(owner(), key(), &[topic()]).unwrap();
        m.base.remove_topics(owner(), key(), &[topic()]).unwrap();

        assert_eq!(m.base.topics(key()), vec![other]);
    }

    #[test]
    fn test_duplicate_topic_rejected() {
        let m = module();
        m.base.add_topics(owner(), key(), &[topic()]).unwrap();

        let err = m.base.add_topics(owner(), key(), &[topic()]).unwrap_err();
        assert_eq!(err, ComplianceError::TopicAlreadyExists(topic()));

        // Duplicates inside one batch count too, and nothing is applied
        let other = Topic::named("OTHER");
        let err = m
            .base
            .add_topics(owner(), key(), &[other, other])
            .unwrap_err();
        assert_eq!(err, ComplianceError::TopicAlreadyExists(other));
        assert_eq!(m.base.topics(key()), vec![topic()]);
    }

    #[test]
    fn test_remove_missing_topic_rejected() {
        let m = module();
        let err = m.base.remove_topics(owner(), key(), &[topic()]).unwrap_err();
        assert_eq!(err, ComplianceError::NoSuchTopic(topic()));
    }

    #[test]
    fn test_topic_admin_requires_agent() {
        let m = module();
        let alice = Address::derive("alice");

        let err = m.base.add_topics(alice, key(), &[topic()]).unwrap_err();
        assert!(err.is_unauthorized());
        assert!(m.base.topics(key()).is_empty());
    }

    #[test]
    fn test_only_asset() {
        let m = module();
        assert!(m.base.only_asset(Address::derive("asset")).is_ok());
        assert_eq!(
            m.base.only_asset(owner()),
            Err(ComplianceError::SenderNotAsset(owner()))
        );
    }

    #[test]
    fn test_initializer_once() {
        let m = module();
        m.base
            .initializer(|| {
                m.base.only_initializing()?;
                m.base.set_handler(topic(), non_zero);
                Ok(())
            })
            .unwrap();

        assert!(m.base.is_initialized());
        assert!(m.base.has_handler(topic()));
        assert_eq!(
            m.base.initializer(|| Ok(())),
            Err(ComplianceError::Init(InitError::AlreadyInitialized))
        );
        assert_eq!(
            m.base.only_initializing(),
            Err(ComplianceError::Init(InitError::NotInitializing))
        );
    }
}
