use crate::error::ContractError;
use crate::state::{NameRecord, SubnameLedger, CONFIG};
use cosmwasm_std::{Addr, Binary, DepsMut, Env, MessageInfo, Response, StdResult, Storage};
use subnames::events::LedgerEvent;
use subnames::resolver::NATIVE_COIN_TYPE;
use subnames::utils::{encode_node, is_valid_label, subnode};

impl<'a> SubnameLedger<'a> {
    pub fn load_name(&self, storage: &dyn Storage, node: &[u8]) -> Result<NameRecord, ContractError> {
        self.names
            .may_load(storage, node.to_vec())?
            .ok_or_else(|| ContractError::TokenDoesNotExist {
                node: encode_node(node),
            })
    }

    pub fn is_operator(&self, storage: &dyn Storage, owner: &Addr, operator: &Addr) -> StdResult<bool> {
        Ok(self
            .operators
            .may_load(storage, (owner, operator))?
            .unwrap_or(false))
    }

    /// Owner, the approved spender, or an operator of the owner.
    pub fn is_authorized(
        &self,
        storage: &dyn Storage,
        record: &NameRecord,
        owner: &Addr,
        sender: &Addr,
    ) -> StdResult<bool> {
        if owner == sender || record.approved.as_ref() == Some(sender) {
            return Ok(true);
        }
        self.is_operator(storage, owner, sender)
    }

    fn active_owner(&self, record: &NameRecord, node: &[u8], env: &Env) -> Result<Addr, ContractError> {
        record
            .active_owner(env.block.time.seconds())
            .cloned()
            .ok_or_else(|| ContractError::SubdomainExpired {
                node: encode_node(node),
            })
    }

    fn only_authorized(
        &self,
        storage: &dyn Storage,
        env: &Env,
        info: &MessageInfo,
        node: &[u8],
    ) -> Result<NameRecord, ContractError> {
        let record = self.load_name(storage, node)?;
        let owner = self.active_owner(&record, node, env)?;
        if !self.is_authorized(storage, &record, &owner, &info.sender)? {
            return Err(ContractError::NotNodeOwner {
                sender: info.sender.to_string(),
                node: encode_node(node),
            });
        }
        Ok(record)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_or_renew(
        &self,
        deps: DepsMut,
        env: Env,
        info: MessageInfo,
        node: Vec<u8>,
        label: String,
        owner: String,
        expiry: u64,
    ) -> Result<Response, ContractError> {
        self.roles.only_registrar(deps.storage, &info.sender)?;
        if !is_valid_label(&label) {
            return Err(ContractError::InvalidLabel { label });
        }
        let config = CONFIG.load(deps.storage)?;
        if subnode(&config.base_node, &label) != node {
            return Err(ContractError::NodeAndLabelNotMatch {});
        }
        let current = env.block.time.seconds();
        if expiry <= current {
            return Err(ContractError::ExpiryInPast { expiry, current });
        }
        let owner = deps.api.addr_validate(&owner)?;

        // Whatever was here before, active or not, is replaced. Resolver records are kept.
        self.names.save(
            deps.storage,
            node.clone(),
            &NameRecord {
                label: label.clone(),
                owner: Some(owner.clone()),
                expiry,
                approved: None,
                creation_block: env.block.height,
            },
        )?;

        let event = LedgerEvent::NameCreated {
            node: node.clone(),
            label,
            owner: owner.clone(),
            expiry,
        };
        Ok(Response::new()
            .add_attribute("method", "create_or_renew")
            .add_attribute("node", encode_node(&node))
            .add_attribute("owner", owner)
            .add_attribute("expiry", expiry.to_string())
            .add_event(event.to_event()))
    }

    pub fn transfer(
        &self,
        deps: DepsMut,
        env: Env,
        info: MessageInfo,
        node: Vec<u8>,
        from: String,
        to: String,
    ) -> Result<Response, ContractError> {
        let mut record = self.load_name(deps.storage, &node)?;
        // Checked against the block executing the transfer, not the one it was submitted in
        let owner = self.active_owner(&record, &node, &env)?;
        let from = deps.api.addr_validate(&from)?;
        if from != owner {
            return Err(ContractError::TransferFromIncorrectOwner {
                from: from.to_string(),
                owner: owner.to_string(),
            });
        }
        if !self.is_authorized(deps.storage, &record, &owner, &info.sender)? {
            return Err(ContractError::NotNodeOwner {
                sender: info.sender.to_string(),
                node: encode_node(&node),
            });
        }
        let to = deps.api.addr_validate(&to)?;

        record.owner = Some(to.clone());
        record.approved = None;
        self.names.save(deps.storage, node.clone(), &record)?;

        let event = LedgerEvent::Transferred {
            node: node.clone(),
            from: owner,
            to: to.clone(),
        };
        Ok(Response::new()
            .add_attribute("method", "transfer")
            .add_attribute("node", encode_node(&node))
            .add_attribute("to", to)
            .add_event(event.to_event()))
    }

    pub fn approve(
        &self,
        deps: DepsMut,
        env: Env,
        info: MessageInfo,
        node: Vec<u8>,
        spender: Option<String>,
    ) -> Result<Response, ContractError> {
        let mut record = self.load_name(deps.storage, &node)?;
        let owner = self.active_owner(&record, &node, &env)?;
        if info.sender != owner && !self.is_operator(deps.storage, &owner, &info.sender)? {
            return Err(ContractError::NotNodeOwner {
                sender: info.sender.to_string(),
                node: encode_node(&node),
            });
        }
        record.approved = spender
            .map(|spender| deps.api.addr_validate(&spender))
            .transpose()?;
        self.names.save(deps.storage, node.clone(), &record)?;

        Ok(Response::new()
            .add_attribute("method", "approve")
            .add_attribute("node", encode_node(&node))
            .add_attribute(
                "spender",
                record.approved.map(String::from).unwrap_or_default(),
            ))
    }

    pub fn set_approval_for_all(
        &self,
        deps: DepsMut,
        _env: Env,
        info: MessageInfo,
        operator: String,
        approved: bool,
    ) -> Result<Response, ContractError> {
        let operator_addr = deps.api.addr_validate(&operator)?;
        self.operators
            .save(deps.storage, (&info.sender, &operator_addr), &approved)?;

        Ok(Response::new()
            .add_attribute("method", "set_approval_for_all")
            .add_attribute("owner", info.sender)
            .add_attribute("operator", operator)
            .add_attribute("approved", approved.to_string()))
    }

    pub fn set_expiry(
        &self,
        deps: DepsMut,
        _env: Env,
        info: MessageInfo,
        node: Vec<u8>,
        expiry: u64,
    ) -> Result<Response, ContractError> {
        self.roles.only_admin(deps.storage, &info.sender)?;
        let mut record = self.load_name(deps.storage, &node)?;
        record.expiry = expiry;
        self.names.save(deps.storage, node.clone(), &record)?;

        let event = LedgerEvent::ExpiryUpdated {
            node: node.clone(),
            expiry,
        };
        Ok(Response::new()
            .add_attribute("method", "set_expiry")
            .add_attribute("node", encode_node(&node))
            .add_attribute("expiry", expiry.to_string())
            .add_event(event.to_event()))
    }

    pub fn revoke(
        &self,
        deps: DepsMut,
        _env: Env,
        info: MessageInfo,
        node: Vec<u8>,
    ) -> Result<Response, ContractError> {
        self.roles.only_admin(deps.storage, &info.sender)?;
        let mut record = self.load_name(deps.storage, &node)?;
        record.owner = None;
        record.expiry = 0;
        record.approved = None;
        self.names.save(deps.storage, node.clone(), &record)?;

        let event = LedgerEvent::NameRevoked {
            node: node.clone(),
            admin: info.sender.clone(),
        };
        Ok(Response::new()
            .add_attribute("method", "revoke")
            .add_attribute("node", encode_node(&node))
            .add_event(event.to_event()))
    }

    pub fn set_registrar(
        &self,
        deps: DepsMut,
        _env: Env,
        info: MessageInfo,
        address: String,
        enabled: bool,
    ) -> Result<Response, ContractError> {
        self.roles.only_admin(deps.storage, &info.sender)?;
        let registrar = deps.api.addr_validate(&address)?;
        self.roles.set_registrar(deps.storage, &registrar, enabled)?;
        Ok(Response::new()
            .add_attribute("method", "set_registrar")
            .add_attribute("registrar", address)
            .add_attribute("enabled", enabled.to_string()))
    }

    pub fn set_admin(
        &self,
        deps: DepsMut,
        _env: Env,
        info: MessageInfo,
        address: String,
        enabled: bool,
    ) -> Result<Response, ContractError> {
        self.roles.only_admin(deps.storage, &info.sender)?;
        let admin = deps.api.addr_validate(&address)?;
        self.roles.set_admin(deps.storage, &admin, enabled)?;
        Ok(Response::new()
            .add_attribute("method", "set_admin")
            .add_attribute("admin", address)
            .add_attribute("enabled", enabled.to_string()))
    }

    pub fn set_config(
        &self,
        deps: DepsMut,
        _env: Env,
        info: MessageInfo,
        base_uri: String,
    ) -> Result<Response, ContractError> {
        self.roles.only_admin(deps.storage, &info.sender)?;
        let mut config = CONFIG.load(deps.storage)?;
        config.base_uri = base_uri.clone();
        CONFIG.save(deps.storage, &config)?;
        Ok(Response::new()
            .add_attribute("method", "set_config")
            .add_attribute("base_uri", base_uri))
    }

    pub fn set_address(
        &self,
        deps: DepsMut,
        env: Env,
        info: MessageInfo,
        node: Vec<u8>,
        coin_type: u64,
        address: Binary,
    ) -> Result<Response, ContractError> {
        self.only_authorized(deps.storage, &env, &info, &node)?;
        self.records
            .set_address(deps.storage, &node, coin_type, &address)?;

        let event = LedgerEvent::AddressChanged {
            node: node.clone(),
            coin_type,
            address: address.to_vec(),
        };
        Ok(Response::new()
            .add_attribute("method", "set_address")
            .add_attribute("node", encode_node(&node))
            .add_attribute("coin_type", coin_type.to_string())
            .add_event(event.to_event()))
    }

    pub fn set_native_address(
        &self,
        deps: DepsMut,
        env: Env,
        info: MessageInfo,
        node: Vec<u8>,
        address: Binary,
    ) -> Result<Response, ContractError> {
        self.only_authorized(deps.storage, &env, &info, &node)?;
        self.records
            .set_address(deps.storage, &node, NATIVE_COIN_TYPE, &address)?;

        let event = LedgerEvent::AddrChanged {
            node: node.clone(),
            address: address.to_vec(),
        };
        Ok(Response::new()
            .add_attribute("method", "set_native_address")
            .add_attribute("node", encode_node(&node))
            .add_event(event.to_event()))
    }

    pub fn set_text(
        &self,
        deps: DepsMut,
        env: Env,
        info: MessageInfo,
        node: Vec<u8>,
        key: String,
        value: String,
    ) -> Result<Response, ContractError> {
        self.only_authorized(deps.storage, &env, &info, &node)?;
        self.records.set_text(deps.storage, &node, &key, &value)?;

        let event = LedgerEvent::TextChanged {
            node: node.clone(),
            key: key.clone(),
            value,
        };
        Ok(Response::new()
            .add_attribute("method", "set_text")
            .add_attribute("node", encode_node(&node))
            .add_attribute("key", key)
            .add_event(event.to_event()))
    }

    pub fn set_contenthash(
        &self,
        deps: DepsMut,
        env: Env,
        info: MessageInfo,
        node: Vec<u8>,
        hash: Option<Binary>,
    ) -> Result<Response, ContractError> {
        self.only_authorized(deps.storage, &env, &info, &node)?;
        // An empty hash clears the record
        let hash = hash.filter(|hash| !hash.is_empty());
        self.records
            .set_contenthash(deps.storage, &node, hash.as_ref())?;

        let event = LedgerEvent::ContenthashChanged {
            node: node.clone(),
            hash: hash.map(|hash| hash.to_vec()),
        };
        Ok(Response::new()
            .add_attribute("method", "set_contenthash")
            .add_attribute("node", encode_node(&node))
            .add_event(event.to_event()))
    }
}
