//! Compliance hook facets
//!
//! The asset never calls its aggregators directly on the transfer path. It
//! dispatches `isKYCed`, `canTransfer` and `transferred` through its facet
//! router, so agents can swap the policy layer with a facet cut.

use regulus_core::{hooks, Address, OperationContext, Selector};
use regulus_diamond::{CallEnvelope, Facet, FacetError, RouterError};
use serde_json::Value;

use crate::storage::AssetStorage;

/// Storage namespace of [`KycComplianceFacet`]
pub const KYC_NAMESPACE: &str = "regulus.compliance.kyc";

/// Storage namespace of [`RegulatoryComplianceFacet`]
pub const REGULATORY_NAMESPACE: &str = "regulus.compliance.regulatory";

fn decode_context(payload: Value) -> Result<OperationContext, FacetError> {
    Ok(serde_json::from_value(payload)?)
}

fn mark_initialized(storage: &mut AssetStorage, namespace: &str) -> Result<(), FacetError> {
    storage
        .namespace(namespace)
        .initializer(|flag| flag.only_initializing())?;
    Ok(())
}

/// Routes `isKYCed` to the KYC aggregator
#[derive(Debug, Clone, Copy, Default)]
pub struct KycComplianceFacet;

impl KycComplianceFacet {
    pub fn selectors() -> Vec<Selector> {
        vec![hooks::is_kyced()]
    }
}

impl Facet<AssetStorage> for KycComplianceFacet {
    fn address(&self) -> Address {
        Address::derive("regulus.facet.kyc-compliance")
    }

    fn name(&self) -> &str {
        "KycComplianceFacet"
    }

    fn call(
        &self,
        storage: &mut AssetStorage,
        _envelope: &CallEnvelope,
        selector: Selector,
        payload: Value,
    ) -> Result<Value, FacetError> {
        if selector != hooks::is_kyced() {
            return Err(Box::new(RouterError::SelectorNotRegistered(selector)));
        }
        let ctx = decode_context(payload)?;
        Ok(Value::Bool(storage.kyc.is_kyced(&ctx)?))
    }

    fn initialize(
        &self,
        storage: &mut AssetStorage,
        _envelope: &CallEnvelope,
        _data: Value,
    ) -> Result<(), FacetError> {
        mark_initialized(storage, KYC_NAMESPACE)
    }
}

/// Routes `canTransfer` and `transferred` to the regulatory aggregator
#[derive(Debug, Clone, Copy, Default)]
pub struct RegulatoryComplianceFacet;

impl RegulatoryComplianceFacet {
    pub fn selectors() -> Vec<Selector> {
        vec![hooks::can_transfer(), hooks::transferred()]
    }
}

impl Facet<AssetStorage> for RegulatoryComplianceFacet {
    fn address(&self) -> Address {
        Address::derive("regulus.facet.regulatory-compliance")
    }

    fn name(&self) -> &str {
        "RegulatoryComplianceFacet"
    }

    fn call(
        &self,
        storage: &mut AssetStorage,
        envelope: &CallEnvelope,
        selector: Selector,
        payload: Value,
    ) -> Result<Value, FacetError> {
        let ctx = decode_context(payload)?;
        if selector == hooks::can_transfer() {
            Ok(Value::Bool(storage.regulatory.can_transfer(&ctx)?))
        } else if selector == hooks::transferred() {
            storage
                .regulatory
                .transferred(storage.this, envelope.caller, &ctx)?;
            Ok(Value::Null)
        } else {
            Err(Box::new(RouterError::SelectorNotRegistered(selector)))
        }
    }

    fn initialize(
        &self,
        storage: &mut AssetStorage,
        _envelope: &CallEnvelope,
        _data: Value,
    ) -> Result<(), FacetError> {
        mark_initialized(storage, REGULATORY_NAMESPACE)
    }
}

