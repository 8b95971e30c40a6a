//! Integration tests for asset + facet router + compliance modules

use std::sync::Arc;

use chrono::Duration;
use regulus_asset::{AssetConfig, AssetError, AssetStorage, NftF, TokenF};
use regulus_compliance::{
    AssetBinding, ComplianceError, ComplianceResult, KycModule, Module, PendingUpdate,
    RegulatoryModule,
};
use regulus_core::{
    hooks, Address, AssetOperation, ContextKey, InitError, ManualClock, OperationContext, Role,
    Selector, TransferParty,
};
use regulus_diamond::{CallEnvelope, Facet, FacetCut, FacetError, FacetInit, RouterError};
use regulus_modules::{
    topics, PeriodCounter, SimpleKycModule, SoulboundRegistry, TransferLimitsModule,
    TransferRateLimitModule,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

// === Fixtures ===

fn owner() -> Address {
    Address::derive("owner")
}

fn alice() -> Address {
    Address::derive("alice")
}

fn bob() -> Address {
    Address::derive("bob")
}

/// One whole token in base units (18 decimals)
fn wei(units: u32) -> Decimal {
    Decimal::from(units) * Decimal::from(1_000_000_000_000_000_000u64)
}

fn token() -> TokenF {
    TokenF::new(Address::derive("token"), owner(), &AssetConfig::default()).unwrap()
}

fn binding_of(token: &TokenF) -> AssetBinding {
    AssetBinding::new(token.core().this(), token.core().access())
}

fn transfer_key() -> ContextKey {
    ContextKey::for_selector(AssetOperation::Transfer.selector())
}

/// Facet answering every hook with a fixed value, or failing
struct FixedFacet {
    answer: Option<Value>,
}

impl FixedFacet {
    fn returning(value: Value) -> Arc<dyn Facet<AssetStorage>> {
        Arc::new(Self {
            answer: Some(value),
        })
    }

    fn reverting() -> Arc<dyn Facet<AssetStorage>> {
        Arc::new(Self { answer: None })
    }
}

impl Facet<AssetStorage> for FixedFacet {
    fn address(&self) -> Address {
        Address::derive("fixed-facet")
    }

    fn name(&self) -> &str {
        "FixedFacet"
    }

    fn call(
        &self,
        _storage: &mut AssetStorage,
        _envelope: &CallEnvelope,
        _selector: Selector,
        _payload: Value,
    ) -> Result<Value, FacetError> {
        self.answer.clone().ok_or_else(|| "mock revert".into())
    }
}

/// Regulatory module that passes every gate but refuses every notification
struct RefusingModule {
    asset: Address,
}

impl RefusingModule {
    fn bound_to(asset: Address) -> Arc<Self> {
        Arc::new(Self { asset })
    }
}

impl Module for RefusingModule {
    fn address(&self) -> Address {
        Address::derive("refusing")
    }

    fn name(&self) -> &str {
        "Refusing"
    }

    fn asset(&self) -> Address {
        self.asset
    }

    fn evaluate(&self, _ctx: &OperationContext) -> ComplianceResult<bool> {
        Ok(true)
    }
}

impl RegulatoryModule for RefusingModule {
    fn on_completed(&self, _ctx: &OperationContext) -> ComplianceResult<PendingUpdate<'_>> {
        Err(ComplianceError::invalid("boom"))
    }
}

fn replace_hook(token: &mut TokenF, selector: Selector, facet: Arc<dyn Facet<AssetStorage>>) {
    token
        .core_mut()
        .diamond_cut(owner(), vec![FacetCut::replace(facet, vec![selector])], None)
        .unwrap();
}

// === Transfer limits ===

fn limited_token() -> (TokenF, Arc<TransferLimitsModule>) {
    let mut token = token();
    let module = TransferLimitsModule::new(Address::derive("limits"), binding_of(&token));
    module.init(wei(1), wei(2)).unwrap();
    module
        .base()
        .add_topics(
            owner(),
            transfer_key(),
            &[topics::min_transfer_limit(), topics::max_transfer_limit()],
        )
        .unwrap();

    let module = Arc::new(module);
    token
        .core_mut()
        .add_regulatory_modules(owner(), vec![module.clone() as Arc<dyn RegulatoryModule>])
        .unwrap();
    (token, module)
}

#[test]
fn test_fungible_transfer_limits() {
    let (mut token, _) = limited_token();
    token.mint(owner(), alice(), wei(3)).unwrap();

    assert!(matches!(
        token.transfer(alice(), bob(), wei(3)),
        Err(AssetError::CannotTransfer)
    ));
    assert!(matches!(
        token.transfer(alice(), bob(), Decimal::ZERO),
        Err(AssetError::CannotTransfer)
    ));

    token.transfer(alice(), bob(), wei(2)).unwrap();
    assert_eq!(token.balance_of(alice()), wei(1));
    assert_eq!(token.balance_of(bob()), wei(2));
}

#[test]
fn test_limits_change_at_runtime() {
    let (mut token, module) = limited_token();
    token.mint(owner(), alice(), wei(3)).unwrap();

    module.set_max_transfer_limit(owner(), wei(3)).unwrap();
    token.transfer(alice(), bob(), wei(3)).unwrap();
    assert_eq!(module.transfer_limits(), (wei(1), wei(3)));
}

#[test]
fn test_removed_module_no_longer_consulted() {
    let (mut token, module) = limited_token();
    token.mint(owner(), alice(), wei(3)).unwrap();

    token
        .core_mut()
        .remove_regulatory_modules(owner(), &[module.base().address()])
        .unwrap();
    token.transfer(alice(), bob(), wei(3)).unwrap();
    assert!(token.core().regulatory_modules().is_empty());
}

// === Rate limit ===

/// NFT whose `operation` is capped at `max` per day per sender
fn rate_limited_nft(
    max: u64,
    operation: AssetOperation,
) -> (NftF, Arc<TransferRateLimitModule>, Arc<ManualClock>) {
    let mut nft = NftF::new(Address::derive("nft"), owner(), &AssetConfig::default()).unwrap();
    let clock = Arc::new(ManualClock::at_epoch());
    let module = TransferRateLimitModule::new(
        Address::derive("rate-limit"),
        AssetBinding::new(nft.core().this(), nft.core().access()),
        clock.clone(),
    );
    module
        .init(max, Duration::days(1), TransferParty::Sender)
        .unwrap();
    module
        .base()
        .add_topics(
            owner(),
            ContextKey::for_party(operation.selector(), TransferParty::Sender),
            &[topics::max_transfers_per_period()],
        )
        .unwrap();

    let module = Arc::new(module);
    nft.core_mut()
        .add_regulatory_modules(owner(), vec![module.clone() as Arc<dyn RegulatoryModule>])
        .unwrap();
    (nft, module, clock)
}

#[test]
fn test_rate_limit_denies_exactly_max_plus_one() {
    let (mut nft, _, clock) = rate_limited_nft(10, AssetOperation::Transfer);
    for id in 1..=12 {
        nft.mint(owner(), alice(), id).unwrap();
    }

    for id in 1..=10 {
        nft.transfer(alice(), bob(), id).unwrap();
    }
    assert!(matches!(
        nft.transfer(alice(), bob(), 11),
        Err(AssetError::CannotTransfer)
    ));
    assert_eq!(nft.owner_of(11), Some(alice()));

    clock.advance(Duration::days(1));
    nft.transfer(alice(), bob(), 11).unwrap();
    assert_eq!(nft.balance_of(bob()), 11);
}

#[test]
fn test_rate_limit_ignores_denied_attempts() {
    let (mut nft, _, _) = rate_limited_nft(1, AssetOperation::Transfer);
    nft.mint(owner(), alice(), 1).unwrap();
    nft.mint(owner(), alice(), 2).unwrap();

    // Fails in the ledger after passing the gate: nothing is counted
    assert!(nft.transfer(alice(), bob(), 99).is_err());
    nft.transfer(alice(), bob(), 1).unwrap();
    assert!(matches!(
        nft.transfer(alice(), bob(), 2),
        Err(AssetError::CannotTransfer)
    ));
}

#[test]
fn test_rate_limit_on_transfer_from() {
    let (mut nft, module, _) = rate_limited_nft(1, AssetOperation::TransferFrom);
    for id in 1..=3 {
        nft.mint(owner(), alice(), id).unwrap();
    }
    nft.approve(alice(), bob(), 1).unwrap();
    nft.approve(alice(), bob(), 2).unwrap();

    nft.transfer_from(bob(), alice(), bob(), 1).unwrap();
    assert!(matches!(
        nft.transfer_from(bob(), alice(), bob(), 2),
        Err(AssetError::CannotTransfer)
    ));
    assert_eq!(nft.owner_of(2), Some(alice()));
    assert_eq!(module.transfers_in_current_period(alice()), 1);

    // Plain transfers are keyed separately
    nft.transfer(alice(), bob(), 3).unwrap();
    assert_eq!(module.transfers_in_current_period(alice()), 1);
}

#[test]
fn test_failed_notification_leaves_rate_limit_unchanged() {
    let (mut nft, module, _) = rate_limited_nft(1, AssetOperation::Transfer);
    nft.mint(owner(), alice(), 1).unwrap();
    let refusing = RefusingModule::bound_to(nft.core().this());
    nft.core_mut()
        .add_regulatory_modules(owner(), vec![refusing as Arc<dyn RegulatoryModule>])
        .unwrap();

    let err = nft.transfer(alice(), bob(), 1).unwrap_err();
    assert!(matches!(err, AssetError::TransferredReverted(_)));
    assert_eq!(err.compliance_cause(), Some(&ComplianceError::invalid("boom")));
    assert_eq!(nft.owner_of(1), Some(alice()));
    assert_eq!(module.counter(alice()), None);

    nft.core_mut()
        .remove_regulatory_modules(owner(), &[Address::derive("refusing")])
        .unwrap();
    nft.transfer(alice(), bob(), 1).unwrap();
    assert_eq!(nft.owner_of(1), Some(bob()));
    assert_eq!(
        module.counter(alice()),
        Some(PeriodCounter { period: 0, count: 1 })
    );
}

#[test]
fn test_failed_notification_rolls_back_transfer_from() {
    let (mut nft, module, _) = rate_limited_nft(1, AssetOperation::TransferFrom);
    nft.mint(owner(), alice(), 1).unwrap();
    nft.approve(alice(), bob(), 1).unwrap();
    let refusing = RefusingModule::bound_to(nft.core().this());
    nft.core_mut()
        .add_regulatory_modules(owner(), vec![refusing as Arc<dyn RegulatoryModule>])
        .unwrap();

    let err = nft.transfer_from(bob(), alice(), bob(), 1).unwrap_err();
    assert!(matches!(err, AssetError::TransferredReverted(_)));
    assert_eq!(nft.owner_of(1), Some(alice()));
    assert_eq!(nft.approved(1), Some(bob()));
    assert_eq!(module.transfers_in_current_period(alice()), 0);
}

#[test]
fn test_failed_notification_restores_fungible_allowance() {
    let mut token = token();
    token.mint(owner(), alice(), dec!(5)).unwrap();
    token.approve(alice(), bob(), dec!(3)).unwrap();
    let refusing = RefusingModule::bound_to(token.core().this());
    token
        .core_mut()
        .add_regulatory_modules(owner(), vec![refusing as Arc<dyn RegulatoryModule>])
        .unwrap();

    let err = token
        .transfer_from(bob(), alice(), bob(), dec!(2))
        .unwrap_err();
    assert!(matches!(err, AssetError::TransferredReverted(_)));
    assert_eq!(token.balance_of(alice()), dec!(5));
    assert_eq!(token.balance_of(bob()), dec!(0));
    assert_eq!(token.allowance(alice(), bob()), dec!(3));
}

// === KYC ===

#[test]
fn test_soulbound_kyc_on_mint() {
    let mut token = token();
    let registry = Arc::new(SoulboundRegistry::new());
    let module = SimpleKycModule::new(Address::derive("kyc"), binding_of(&token));
    module.init(registry.clone()).unwrap();
    module
        .base()
        .add_topics(
            owner(),
            ContextKey::for_selector(AssetOperation::Mint.selector()),
            &[topics::has_soul_recipient()],
        )
        .unwrap();
    token
        .core_mut()
        .add_kyc_modules(owner(), vec![Arc::new(module) as Arc<dyn KycModule>])
        .unwrap();

    assert!(matches!(
        token.mint(owner(), alice(), dec!(1)),
        Err(AssetError::NotKyced)
    ));

    registry.mint(alice(), 1).unwrap();
    token.mint(owner(), alice(), dec!(1)).unwrap();
    assert_eq!(token.balance_of(alice()), dec!(1));
}

#[test]
fn test_soulbound_kyc_on_transfer_from_operator() {
    let mut token = token();
    let registry = Arc::new(SoulboundRegistry::new());
    let module = SimpleKycModule::new(Address::derive("kyc"), binding_of(&token));
    module.init(registry.clone()).unwrap();
    module
        .base()
        .add_topics(
            owner(),
            ContextKey::for_selector(AssetOperation::TransferFrom.selector()),
            &[topics::has_soul_operator()],
        )
        .unwrap();
    token
        .core_mut()
        .add_kyc_modules(owner(), vec![Arc::new(module) as Arc<dyn KycModule>])
        .unwrap();

    token.mint(owner(), alice(), dec!(5)).unwrap();
    token.approve(alice(), bob(), dec!(5)).unwrap();
    let carol = Address::derive("carol");

    // Bob operates without a soul
    assert!(matches!(
        token.transfer_from(bob(), alice(), carol, dec!(1)),
        Err(AssetError::NotKyced)
    ));
    assert_eq!(token.allowance(alice(), bob()), dec!(5));

    // Neither holder needs one, and plain transfers are not keyed
    token.transfer(alice(), carol, dec!(1)).unwrap();

    registry.mint(bob(), 1).unwrap();
    token.transfer_from(bob(), alice(), carol, dec!(1)).unwrap();
    assert_eq!(token.balance_of(carol), dec!(2));
    assert_eq!(token.allowance(alice(), bob()), dec!(4));
}

#[test]
fn test_kyc_module_admin_requires_role() {
    let mut token = token();
    let module = SimpleKycModule::new(Address::derive("kyc"), binding_of(&token));

    let err = token
        .core_mut()
        .add_kyc_modules(alice(), vec![Arc::new(module)])
        .unwrap_err();
    assert!(matches!(err, AssetError::Compliance(ref e) if e.is_unauthorized()));
    assert!(token.core().kyc_modules().is_empty());
}

// === Unwired handlers ===

#[test]
fn test_unwired_module_aborts_operation() {
    let mut token = token();
    let module = TransferLimitsModule::new(Address::derive("limits"), binding_of(&token));
    module
        .base()
        .add_topics(
            owner(),
            ContextKey::for_selector(AssetOperation::Mint.selector()),
            &[topics::max_transfer_limit()],
        )
        .unwrap();
    token
        .core_mut()
        .add_regulatory_modules(owner(), vec![Arc::new(module)])
        .unwrap();

    let err = token.mint(owner(), alice(), dec!(1)).unwrap_err();
    assert!(matches!(err, AssetError::CanTransferReverted(_)));
    assert_eq!(
        err.compliance_cause(),
        Some(&ComplianceError::HandlerNotSet(topics::max_transfer_limit()))
    );
    assert_eq!(token.balance_of(alice()), dec!(0));
}

// === Replaceable hooks ===

#[test]
fn test_is_kyced_replaced() {
    let mut token = token();
    replace_hook(&mut token, hooks::is_kyced(), FixedFacet::returning(json!(false)));
    assert!(matches!(
        token.mint(owner(), alice(), dec!(1)),
        Err(AssetError::NotKyced)
    ));

    replace_hook(&mut token, hooks::is_kyced(), FixedFacet::reverting());
    assert!(matches!(
        token.mint(owner(), alice(), dec!(1)),
        Err(AssetError::IsKycedReverted(RouterError::Facet(_)))
    ));
}

#[test]
fn test_can_transfer_replaced() {
    let mut token = token();
    replace_hook(&mut token, hooks::can_transfer(), FixedFacet::returning(json!(false)));
    assert!(matches!(
        token.mint(owner(), alice(), dec!(1)),
        Err(AssetError::CannotTransfer)
    ));

    replace_hook(&mut token, hooks::can_transfer(), FixedFacet::reverting());
    assert!(matches!(
        token.mint(owner(), alice(), dec!(1)),
        Err(AssetError::CanTransferReverted(_))
    ));
}

#[test]
fn test_non_boolean_verdict_is_a_failure() {
    let mut token = token();
    replace_hook(&mut token, hooks::is_kyced(), FixedFacet::returning(json!("yes")));
    assert!(matches!(
        token.mint(owner(), alice(), dec!(1)),
        Err(AssetError::IsKycedReverted(_))
    ));
}

#[test]
fn test_transferred_failure_rolls_back_ledger() {
    let mut token = token();
    token.mint(owner(), alice(), dec!(5)).unwrap();

    replace_hook(&mut token, hooks::transferred(), FixedFacet::reverting());
    assert!(matches!(
        token.transfer(alice(), bob(), dec!(2)),
        Err(AssetError::TransferredReverted(_))
    ));
    assert_eq!(token.balance_of(alice()), dec!(5));
    assert_eq!(token.balance_of(bob()), dec!(0));
}

#[test]
fn test_removed_hook_aborts() {
    let mut token = token();
    token
        .core_mut()
        .diamond_cut(owner(), vec![FacetCut::remove(vec![hooks::is_kyced()])], None)
        .unwrap();

    assert!(matches!(
        token.mint(owner(), alice(), dec!(1)),
        Err(AssetError::IsKycedReverted(RouterError::SelectorNotRegistered(_)))
    ));
}

#[test]
fn test_diamond_cut_requires_role() {
    let mut token = token();
    let err = token
        .core_mut()
        .diamond_cut(
            alice(),
            vec![FacetCut::remove(vec![hooks::is_kyced()])],
            None,
        )
        .unwrap_err();
    assert!(matches!(err, AssetError::Unauthorized(_)));
    assert!(token.core().router().is_registered(hooks::is_kyced()));

    token
        .core_mut()
        .grant_role(owner(), Role::diamond_cut(), alice())
        .unwrap();
    token
        .core_mut()
        .diamond_cut(
            alice(),
            vec![FacetCut::remove(vec![hooks::is_kyced()])],
            None,
        )
        .unwrap();
}

#[test]
fn test_compliance_facets_cannot_be_reinitialized() {
    let mut token = token();
    let facet = regulus_asset::KycComplianceFacet;

    let err = token
        .core_mut()
        .diamond_cut(
            owner(),
            vec![],
            Some(FacetInit::new(Arc::new(facet), Value::Null)),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        AssetError::Router(RouterError::Init(InitError::AlreadyInitialized))
    ));
}

#[test]
fn test_transferred_through_fallback_requires_asset() {
    let mut token = token();
    let payload = serde_json::to_value(
        OperationContext::for_operation(AssetOperation::Transfer),
    )
    .unwrap();

    let err = token
        .core_mut()
        .call(alice(), hooks::transferred(), payload)
        .unwrap_err();
    assert_eq!(
        err.compliance_cause(),
        Some(&ComplianceError::SenderNotThisContract(alice()))
    );
}

#[test]
fn test_unregistered_selector_through_fallback() {
    let mut token = token();
    let err = token
        .core_mut()
        .call(alice(), Selector::from_signature("mockFunction()"), Value::Null)
        .unwrap_err();
    assert!(matches!(
        err,
        AssetError::Router(RouterError::SelectorNotRegistered(_))
    ));
}

#[test]
fn test_loupe_lists_compliance_facets() {
    let token = token();
    let router = token.core().router();

    assert_eq!(router.facet_addresses().len(), 2);
    assert_eq!(
        router.facet_address(hooks::can_transfer()),
        router.facet_address(hooks::transferred())
    );
    assert_ne!(
        router.facet_address(hooks::is_kyced()),
        router.facet_address(hooks::can_transfer())
    );
}
