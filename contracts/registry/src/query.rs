use crate::error::ContractError;
use crate::state::{SubnameLedger, CONFIG};
use cosmwasm_std::{to_binary, Binary, Deps, Env, StdResult};
use subnames::registry::{
    AuthorizedResponse, ConfigResponse, ExpiryResponse, NameInfoResponse, NodeResponse,
    OperatorResponse, OwnerOfResponse, QueryMsg, RoleResponse, TokenUriResponse,
};
use subnames::resolver::{
    AddressResponse, ContentHashResponse, RecordsResponse, TextResponse, NATIVE_COIN_TYPE,
};
use subnames::utils::{encode_node, full_name, subnode};

impl<'a> SubnameLedger<'a> {
    /// Re-evaluated against the current block on every call.
    pub fn owner_of(&self, deps: Deps, env: &Env, node: Vec<u8>) -> StdResult<OwnerOfResponse> {
        let record = self.names.may_load(deps.storage, node)?;
        let now = env.block.time.seconds();
        Ok(OwnerOfResponse {
            owner: record.and_then(|record| record.active_owner(now).cloned()),
        })
    }

    pub fn expiry(&self, deps: Deps, node: Vec<u8>) -> Result<ExpiryResponse, ContractError> {
        let record = self.load_name(deps.storage, &node)?;
        Ok(ExpiryResponse {
            expiry: record.expiry,
        })
    }

    pub fn name_info(
        &self,
        deps: Deps,
        env: &Env,
        node: Vec<u8>,
    ) -> Result<NameInfoResponse, ContractError> {
        let record = self.load_name(deps.storage, &node)?;
        let config = CONFIG.load(deps.storage)?;
        let now = env.block.time.seconds();
        Ok(NameInfoResponse {
            name: full_name(&record.label, &config.base_name),
            owner: record.active_owner(now).cloned(),
            expired: record.active_owner(now).is_none(),
            label: record.label,
            expiry: record.expiry,
            creation_block: record.creation_block,
            approved: record.approved,
        })
    }

    /// Answers for expired and revoked names too; only never-created nodes fail.
    pub fn token_uri(&self, deps: Deps, node: Vec<u8>) -> Result<TokenUriResponse, ContractError> {
        self.load_name(deps.storage, &node)?;
        let config = CONFIG.load(deps.storage)?;
        Ok(TokenUriResponse {
            token_uri: format!("{}{}", config.base_uri, encode_node(&node)),
        })
    }

    pub fn node(&self, deps: Deps, label: String) -> StdResult<NodeResponse> {
        let config = CONFIG.load(deps.storage)?;
        Ok(NodeResponse {
            node: subnode(&config.base_node, &label),
        })
    }

    pub fn query_is_authorized(
        &self,
        deps: Deps,
        env: &Env,
        node: Vec<u8>,
        address: String,
    ) -> StdResult<AuthorizedResponse> {
        let address = deps.api.addr_validate(&address)?;
        let now = env.block.time.seconds();
        let authorized = match self.names.may_load(deps.storage, node)? {
            Some(record) => match record.active_owner(now) {
                Some(owner) => self.is_authorized(deps.storage, &record, owner, &address)?,
                None => false,
            },
            None => false,
        };
        Ok(AuthorizedResponse { authorized })
    }

    pub fn query_is_approved_for_all(
        &self,
        deps: Deps,
        owner: String,
        operator: String,
    ) -> StdResult<OperatorResponse> {
        let owner = deps.api.addr_validate(&owner)?;
        let operator = deps.api.addr_validate(&operator)?;
        Ok(OperatorResponse {
            is_approve: self.is_operator(deps.storage, &owner, &operator)?,
        })
    }

    pub fn query_is_registrar(&self, deps: Deps, address: String) -> StdResult<RoleResponse> {
        let address = deps.api.addr_validate(&address)?;
        Ok(RoleResponse {
            granted: self.roles.is_registrar(deps.storage, &address)?,
        })
    }

    pub fn query_is_admin(&self, deps: Deps, address: String) -> StdResult<RoleResponse> {
        let address = deps.api.addr_validate(&address)?;
        Ok(RoleResponse {
            granted: self.roles.is_admin(deps.storage, &address)?,
        })
    }

    pub fn get_config(&self, deps: Deps) -> StdResult<ConfigResponse> {
        let config = CONFIG.load(deps.storage)?;
        Ok(ConfigResponse {
            base_node: encode_node(&config.base_node),
            base_name: config.base_name,
            base_uri: config.base_uri,
        })
    }

    pub fn query_address(
        &self,
        deps: Deps,
        node: Vec<u8>,
        coin_type: u64,
    ) -> StdResult<AddressResponse> {
        Ok(AddressResponse {
            address: self.records.address(deps.storage, &node, coin_type)?,
        })
    }

    pub fn query_text(&self, deps: Deps, node: Vec<u8>, key: String) -> StdResult<TextResponse> {
        Ok(TextResponse {
            value: self.records.text(deps.storage, &node, &key)?,
        })
    }

    pub fn query_contenthash(&self, deps: Deps, node: Vec<u8>) -> StdResult<ContentHashResponse> {
        Ok(ContentHashResponse {
            hash: self.records.contenthash(deps.storage, &node)?,
        })
    }

    pub fn query_records(&self, deps: Deps, node: Vec<u8>) -> StdResult<RecordsResponse> {
        self.records.records(deps.storage, &node)
    }

    pub fn query(&self, deps: Deps, env: Env, msg: QueryMsg) -> Result<Binary, ContractError> {
        let res = match msg {
            QueryMsg::OwnerOf { node } => to_binary(&self.owner_of(deps, &env, node)?)?,
            QueryMsg::Expiry { node } => to_binary(&self.expiry(deps, node)?)?,
            QueryMsg::NameInfo { node } => to_binary(&self.name_info(deps, &env, node)?)?,
            QueryMsg::TokenUri { node } => to_binary(&self.token_uri(deps, node)?)?,
            QueryMsg::Node { label } => to_binary(&self.node(deps, label)?)?,
            QueryMsg::IsAuthorized { node, address } => {
                to_binary(&self.query_is_authorized(deps, &env, node, address)?)?
            }
            QueryMsg::IsApprovedForAll { owner, operator } => {
                to_binary(&self.query_is_approved_for_all(deps, owner, operator)?)?
            }
            QueryMsg::IsRegistrar { address } => to_binary(&self.query_is_registrar(deps, address)?)?,
            QueryMsg::IsAdmin { address } => to_binary(&self.query_is_admin(deps, address)?)?,
            QueryMsg::GetConfig {} => to_binary(&self.get_config(deps)?)?,

            QueryMsg::Address { node, coin_type } => {
                to_binary(&self.query_address(deps, node, coin_type)?)?
            }
            QueryMsg::NativeAddress { node } => {
                to_binary(&self.query_address(deps, node, NATIVE_COIN_TYPE)?)?
            }
            QueryMsg::Text { node, key } => to_binary(&self.query_text(deps, node, key)?)?,
            QueryMsg::Contenthash { node } => to_binary(&self.query_contenthash(deps, node)?)?,
            QueryMsg::Records { node } => to_binary(&self.query_records(deps, node)?)?,
        };
        Ok(res)
    }
}
