use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::resolver::RecordStore;
use crate::roles::RoleStore;
use cosmwasm_std::Addr;
use cw_storage_plus::{Item, Map};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct Config {
    pub base_node: Vec<u8>,
    pub base_name: String,
    pub base_uri: String,
}

pub const CONFIG: Item<Config> = Item::new("CONFIG");

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct NameRecord {
    pub label: String,
    /// Last written owner. Only observable while the name is active, see `active_owner`.
    pub owner: Option<Addr>,
    pub expiry: u64,
    /// Single spender allowed to transfer or edit records; reset on every ownership change
    pub approved: Option<Addr>,
    pub creation_block: u64,
}

impl NameRecord {
    pub fn active_owner(&self, now: u64) -> Option<&Addr> {
        if now < self.expiry {
            self.owner.as_ref()
        } else {
            None
        }
    }
}

pub struct SubnameLedger<'a> {
    /// Keyed by node. Revoked names stay here as tombstones without owner or expiry.
    pub names: Map<'a, Vec<u8>, NameRecord>,
    /// (owner, operator) -> approved for every name of owner
    pub operators: Map<'a, (&'a Addr, &'a Addr), bool>,
    pub roles: RoleStore<'a>,
    pub records: RecordStore<'a>,
}

impl Default for SubnameLedger<'static> {
    fn default() -> Self {
        Self::new(
            "names",
            "operators",
            RoleStore::new("registrars", "admins"),
            RecordStore::new("addresses", "texts", "contenthash"),
        )
    }
}

impl<'a> SubnameLedger<'a> {
    fn new(
        names_key: &'a str,
        operators_key: &'a str,
        roles: RoleStore<'a>,
        records: RecordStore<'a>,
    ) -> Self {
        Self {
            names: Map::new(names_key),
            operators: Map::new(operators_key),
            roles,
            records,
        }
    }
}
