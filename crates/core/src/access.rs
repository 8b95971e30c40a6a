//! Role-based access control
//!
//! Roles are 32-byte identifiers. Every role has an admin role (by default
//! [`Role::DEFAULT_ADMIN`]) whose holders may grant and revoke it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::address::Address;
use crate::bytes::digest;
use crate::error::AccessError;

crate::fixed_bytes!(
    /// 32-byte role identifier
    Role,
    32
);

impl Role {
    /// Admin of every role unless overridden
    pub const DEFAULT_ADMIN: Role = Role::ZERO;

    /// Role for a name (SHA-256 of the name)
    pub fn named(name: &str) -> Self {
        Self(digest(name.as_bytes()))
    }

    /// Asset agent; also accepted wherever an operation role is required
    pub fn agent() -> Self {
        Self::named("AGENT_ROLE")
    }

    pub fn mint() -> Self {
        Self::named("MINT_ROLE")
    }

    pub fn burn() -> Self {
        Self::named("BURN_ROLE")
    }

    pub fn forced_transfer() -> Self {
        Self::named("FORCED_TRANSFER_ROLE")
    }

    pub fn recovery() -> Self {
        Self::named("RECOVERY_ROLE")
    }

    pub fn diamond_cut() -> Self {
        Self::named("DIAMOND_CUT_ROLE")
    }

    pub fn kyc_compliance() -> Self {
        Self::named("KYC_COMPLIANCE_ROLE")
    }

    pub fn regulatory_compliance() -> Self {
        Self::named("REGULATORY_COMPLIANCE_ROLE")
    }
}

/// Shared handle to an asset's access control
pub type AccessHandle = Arc<RwLock<AccessControl>>;

/// Role membership table
#[derive(Debug, Clone, Default)]
pub struct AccessControl {
    members: HashMap<Role, HashSet<Address>>,
    admins: HashMap<Role, Role>,
}

impl AccessControl {
    /// Create a table where `deployer` holds `DEFAULT_ADMIN` and `AGENT`
    pub fn new(deployer: Address) -> Self {
        let mut access = Self::default();
        access.insert(Role::DEFAULT_ADMIN, deployer);
        access.insert(Role::agent(), deployer);
        access
    }

    /// Wrap into a shared handle
    pub fn into_handle(self) -> AccessHandle {
        Arc::new(RwLock::new(self))
    }

    pub fn has_role(&self, role: Role, account: Address) -> bool {
        self.members
            .get(&role)
            .is_some_and(|holders| holders.contains(&account))
    }

    /// Require `role` (or `AGENT`) on `account`
    pub fn check_role(&self, role: Role, account: Address) -> Result<(), AccessError> {
        if self.has_role(role, account) || self.has_role(Role::agent(), account) {
            Ok(())
        } else {
            Err(AccessError::Unauthorized { account, role })
        }
    }

    /// Admin role of `role`
    pub fn role_admin(&self, role: Role) -> Role {
        self.admins.get(&role).copied().unwrap_or(Role::DEFAULT_ADMIN)
    }

    /// Change the admin of `role`; caller must hold the current admin
    pub fn set_role_admin(
        &mut self,
        caller: Address,
        role: Role,
        admin: Role,
    ) -> Result<(), AccessError> {
        self.require_admin(caller, role)?;
        self.admins.insert(role, admin);
        tracing::info!(role = %role, admin = %admin, "Role admin changed");
        Ok(())
    }

    /// Grant `role` to `account`; returns whether membership changed
    pub fn grant_role(
        &mut self,
        caller: Address,
        role: Role,
        account: Address,
    ) -> Result<bool, AccessError> {
        self.require_admin(caller, role)?;
        let changed = self.insert(role, account);
        if changed {
            tracing::info!(role = %role, account = %account, "Role granted");
        }
        Ok(changed)
    }

    /// Revoke `role` from `account`; returns whether membership changed
    pub fn revoke_role(
        &mut self,
        caller: Address,
        role: Role,
        account: Address,
    ) -> Result<bool, AccessError> {
        self.require_admin(caller, role)?;
        let changed = self
            .members
            .get_mut(&role)
            .is_some_and(|holders| holders.remove(&account));
        if changed {
            tracing::info!(role = %role, account = %account, "Role revoked");
        }
        Ok(changed)
    }

    fn require_admin(&self, caller: Address, role: Role) -> Result<(), AccessError> {
        let admin = self.role_admin(role);
        if self.has_role(admin, caller) {
            Ok(())
        } else {
            Err(AccessError::AdminRequired {
                account: caller,
                role,
                admin,
            })
        }
    }

    fn insert(&mut self, role: Role, account: Address) -> bool {
        self.members.entry(role).or_default().insert(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        Address::derive("owner")
    }

    #[test]
    fn test_deployer_holds_admin_and_agent() {
        let access = AccessControl::new(owner());
        assert!(access.has_role(Role::DEFAULT_ADMIN, owner()));
        assert!(access.has_role(Role::agent(), owner()));
        assert!(!access.has_role(Role::mint(), owner()));
    }

    #[test]
    fn test_agent_passes_any_check() {
        let access = AccessControl::new(owner());
        assert!(access.check_role(Role::mint(), owner()).is_ok());
        assert!(access.check_role(Role::diamond_cut(), owner()).is_ok());
    }

    #[test]
    fn test_check_role_unauthorized() {
        let access = AccessControl::new(owner());
        let alice = Address::derive("alice");

        let err = access.check_role(Role::mint(), alice).unwrap_err();
        assert_eq!(
            err,
            AccessError::Unauthorized {
                account: alice,
                role: Role::mint()
            }
        );
    }

    #[test]
    fn test_grant_and_revoke() {
        let mut access = AccessControl::new(owner());
        let minter = Address::derive("minter");

        assert!(access.grant_role(owner(), Role::mint(), minter).unwrap());
        assert!(!access.grant_role(owner(), Role::mint(), minter).unwrap());
        assert!(access.check_role(Role::mint(), minter).is_ok());
        assert!(access.check_role(Role::burn(), minter).is_err());

        assert!(access.revoke_role(owner(), Role::mint(), minter).unwrap());
        assert!(!access.has_role(Role::mint(), minter));
    }

    #[test]
    fn test_grant_requires_admin() {
        let mut access = AccessControl::new(owner());
        let alice = Address::derive("alice");

        let err = access.grant_role(alice, Role::mint(), alice).unwrap_err();
        assert!(matches!(err, AccessError::AdminRequired { .. }));
    }

    #[test]
    fn test_custom_role_admin() {
        let mut access = AccessControl::new(owner());
        let operator = Address::derive("operator");
        let minter = Address::derive("minter");

        access.set_role_admin(owner(), Role::mint(), Role::agent()).unwrap();
        access.grant_role(owner(), Role::agent(), operator).unwrap();

        assert_eq!(access.role_admin(Role::mint()), Role::agent());
        assert!(access.grant_role(operator, Role::mint(), minter).unwrap());
    }

    #[test]
    fn test_role_names_are_distinct() {
        assert_ne!(Role::kyc_compliance(), Role::regulatory_compliance());
        assert_ne!(Role::agent(), Role::DEFAULT_ADMIN);
    }
}
