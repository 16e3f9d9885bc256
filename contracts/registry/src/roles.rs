use crate::error::ContractError;
use cosmwasm_std::{Addr, StdResult, Storage};
use cw_storage_plus::Map;

pub const REGISTRAR_ROLE: &str = "registrar";
pub const ADMIN_ROLE: &str = "admin";

/// Registrar and admin flags. One address may hold both.
pub struct RoleStore<'a> {
    pub registrars: Map<'a, &'a Addr, bool>,
    pub admins: Map<'a, &'a Addr, bool>,
}

impl<'a> RoleStore<'a> {
    pub fn new(registrars_key: &'a str, admins_key: &'a str) -> Self {
        Self {
            registrars: Map::new(registrars_key),
            admins: Map::new(admins_key),
        }
    }

    pub fn is_registrar(&self, storage: &dyn Storage, address: &Addr) -> StdResult<bool> {
        Ok(self.registrars.may_load(storage, address)?.unwrap_or(false))
    }

    pub fn is_admin(&self, storage: &dyn Storage, address: &Addr) -> StdResult<bool> {
        Ok(self.admins.may_load(storage, address)?.unwrap_or(false))
    }

    pub fn set_registrar(
        &self,
        storage: &mut dyn Storage,
        address: &Addr,
        enabled: bool,
    ) -> StdResult<()> {
        self.registrars.save(storage, address, &enabled)
    }

    pub fn set_admin(
        &self,
        storage: &mut dyn Storage,
        address: &Addr,
        enabled: bool,
    ) -> StdResult<()> {
        self.admins.save(storage, address, &enabled)
    }

    pub fn only_registrar(&self, storage: &dyn Storage, sender: &Addr) -> Result<(), ContractError> {
        if !self.is_registrar(storage, sender)? {
            return Err(ContractError::Unauthorized {
                sender: sender.to_string(),
                role: REGISTRAR_ROLE.to_string(),
            });
        }
        Ok(())
    }

    pub fn only_admin(&self, storage: &dyn Storage, sender: &Addr) -> Result<(), ContractError> {
        if !self.is_admin(storage, sender)? {
            return Err(ContractError::Unauthorized {
                sender: sender.to_string(),
                role: ADMIN_ROLE.to_string(),
            });
        }
        Ok(())
    }
}
