use crate::error::ContractError;
use crate::state::{Config, SubnameLedger, CONFIG};
#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{Binary, Deps, DepsMut, Env, MessageInfo, Response, StdResult};
use cw2::set_contract_version;
use subnames::registry::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use subnames::utils::{decode_node, namehash};

// version info for migration info
const CONTRACT_NAME: &str = "crates.io:subname-registry";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    SubnameLedger::default().instantiate(deps, env, info, msg)
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    SubnameLedger::default().execute(deps, env, info, msg)
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> Result<Binary, ContractError> {
    SubnameLedger::default().query(deps, env, msg)
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(_deps: DepsMut, _env: Env, _msg: MigrateMsg) -> StdResult<Response> {
    Ok(Response::default())
}

impl<'a> SubnameLedger<'a> {
    pub fn instantiate(
        &self,
        deps: DepsMut,
        _env: Env,
        info: MessageInfo,
        msg: InstantiateMsg,
    ) -> Result<Response, ContractError> {
        set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
        let base_node =
            decode_node(&msg.base_node).map_err(|_| ContractError::BytesFormatError {})?;
        if namehash(&msg.base_name) != base_node {
            return Err(ContractError::NameAndHashNotMatch {});
        }
        CONFIG.save(
            deps.storage,
            &Config {
                base_node,
                base_name: msg.base_name,
                base_uri: msg.base_uri,
            },
        )?;

        // The instantiator can always manage roles
        self.roles.set_admin(deps.storage, &info.sender, true)?;
        for admin in msg.admins.iter() {
            let admin = deps.api.addr_validate(admin)?;
            self.roles.set_admin(deps.storage, &admin, true)?;
        }
        for registrar in msg.registrars.iter() {
            let registrar = deps.api.addr_validate(registrar)?;
            self.roles.set_registrar(deps.storage, &registrar, true)?;
        }

        Ok(Response::default()
            .add_attribute("method", "instantiate")
            .add_attribute("owner", info.sender))
    }

    pub fn execute(
        &self,
        deps: DepsMut,
        env: Env,
        info: MessageInfo,
        msg: ExecuteMsg,
    ) -> Result<Response, ContractError> {
        match msg {
            // Only registrar
            ExecuteMsg::CreateOrRenew {
                node,
                label,
                owner,
                expiry,
            } => self.create_or_renew(deps, env, info, node, label, owner, expiry),

            // Only admin
            ExecuteMsg::SetExpiry { node, expiry } => self.set_expiry(deps, env, info, node, expiry),
            ExecuteMsg::Revoke { node } => self.revoke(deps, env, info, node),
            ExecuteMsg::SetRegistrar { address, enabled } => {
                self.set_registrar(deps, env, info, address, enabled)
            }
            ExecuteMsg::SetAdmin { address, enabled } => {
                self.set_admin(deps, env, info, address, enabled)
            }
            ExecuteMsg::SetConfig { base_uri } => self.set_config(deps, env, info, base_uri),

            // Owner, approved or operator
            ExecuteMsg::Transfer { node, from, to } => self.transfer(deps, env, info, node, from, to),
            ExecuteMsg::Approve { node, spender } => self.approve(deps, env, info, node, spender),
            ExecuteMsg::SetApprovalForAll { operator, approved } => {
                self.set_approval_for_all(deps, env, info, operator, approved)
            }
            ExecuteMsg::SetAddress {
                node,
                coin_type,
                address,
            } => self.set_address(deps, env, info, node, coin_type, address),
            ExecuteMsg::SetNativeAddress { node, address } => {
                self.set_native_address(deps, env, info, node, address)
            }
            ExecuteMsg::SetText { node, key, value } => {
                self.set_text(deps, env, info, node, key, value)
            }
            ExecuteMsg::SetContenthash { node, hash } => {
                self.set_contenthash(deps, env, info, node, hash)
            }
        }
    }
}
