//! Asset storage shared by every facet

use std::collections::HashMap;

use regulus_compliance::{KycCompliance, RegulatoryCompliance};
use regulus_core::{AccessHandle, Address, Initializable};

use crate::config::OperationRoles;

/// State the facet router lends to facets on every call
///
/// Identity checks compare callers against `this`, the asset's own address.
pub struct AssetStorage {
    pub this: Address,
    pub access: AccessHandle,
    pub kyc: KycCompliance,
    pub regulatory: RegulatoryCompliance,
    pub roles: OperationRoles,
    namespaces: HashMap<String, Initializable>,
}

impl AssetStorage {
    pub fn new(this: Address, access: AccessHandle, roles: OperationRoles) -> Self {
        Self {
            this,
            access,
            kyc: KycCompliance::with_role(roles.kyc_compliance),
            regulatory: RegulatoryCompliance::with_role(roles.regulatory_compliance),
            roles,
            namespaces: HashMap::new(),
        }
    }

    /// Initialization flag of a facet namespace
    pub fn namespace(&mut self, name: &str) -> &mut Initializable {
        self.namespaces.entry(name.to_string()).or_default()
    }

    pub fn is_initialized(&self, name: &str) -> bool {
        self.namespaces
            .get(name)
            .is_some_and(|flag| flag.is_initialized())
    }
}
