use cosmwasm_std::{Addr, Binary};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct InstantiateMsg {
    /// Hex namehash of `base_name`, e.g. the node of `celo.eth`
    pub base_node: String,
    pub base_name: String,
    /// Prefix for token URIs, the hex node is appended
    pub base_uri: String,
    #[serde(default)]
    pub registrars: Vec<String>,
    #[serde(default)]
    pub admins: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExecuteMsg {
    /// Registrar only. Creates the name or overwrites it, whatever its current state.
    CreateOrRenew {
        node: Vec<u8>,
        label: String,
        owner: String,
        expiry: u64,
    },
    Transfer {
        node: Vec<u8>,
        from: String,
        to: String,
    },
    /// Set or clear the single approved spender of a name
    Approve {
        node: Vec<u8>,
        spender: Option<String>,
    },
    SetApprovalForAll {
        operator: String,
        approved: bool,
    },

    // Only admin
    SetExpiry {
        node: Vec<u8>,
        expiry: u64,
    },
    Revoke {
        node: Vec<u8>,
    },
    SetRegistrar {
        address: String,
        enabled: bool,
    },
    SetAdmin {
        address: String,
        enabled: bool,
    },
    SetConfig {
        base_uri: String,
    },

    // Resolver records, owner or approved only
    SetAddress {
        node: Vec<u8>,
        coin_type: u64,
        address: Binary,
    },
    SetNativeAddress {
        node: Vec<u8>,
        address: Binary,
    },
    SetText {
        node: Vec<u8>,
        key: String,
        value: String,
    },
    SetContenthash {
        node: Vec<u8>,
        hash: Option<Binary>,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QueryMsg {
    /// Return type: OwnerOfResponse. Owner is unset once the name has expired.
    OwnerOf { node: Vec<u8> },
    Expiry { node: Vec<u8> },
    NameInfo { node: Vec<u8> },
    TokenUri { node: Vec<u8> },
    Node { label: String },
    IsAuthorized { node: Vec<u8>, address: String },
    IsApprovedForAll { owner: String, operator: String },
    IsRegistrar { address: String },
    IsAdmin { address: String },
    GetConfig {},

    Address { node: Vec<u8>, coin_type: u64 },
    NativeAddress { node: Vec<u8> },
    Text { node: Vec<u8>, key: String },
    Contenthash { node: Vec<u8> },
    /// Return type: RecordsResponse, every record set on the node
    Records { node: Vec<u8> },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct OwnerOfResponse {
    pub owner: Option<Addr>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct ExpiryResponse {
    pub expiry: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct NameInfoResponse {
    pub label: String,
    pub name: String,
    pub owner: Option<Addr>,
    pub expiry: u64,
    pub expired: bool,
    pub creation_block: u64,
    pub approved: Option<Addr>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct TokenUriResponse {
    pub token_uri: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct NodeResponse {
    pub node: Vec<u8>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct AuthorizedResponse {
    pub authorized: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct OperatorResponse {
    pub is_approve: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct RoleResponse {
    pub granted: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct ConfigResponse {
    pub base_node: String,
    pub base_name: String,
    pub base_uri: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct MigrateMsg {}
