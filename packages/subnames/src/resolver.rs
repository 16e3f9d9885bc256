use cosmwasm_std::Binary;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// SLIP-44 coin type of the native address slot. Legacy `SetNativeAddress` writes land here.
pub const NATIVE_COIN_TYPE: u64 = 60;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct AddressResponse {
    pub address: Option<Binary>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct TextResponse {
    pub value: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct ContentHashResponse {
    pub hash: Option<Binary>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct AddressRecord {
    pub coin_type: u64,
    pub address: Binary,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct TextRecord {
    pub key: String,
    pub value: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct RecordsResponse {
    /// Ascending by coin type
    pub addresses: Vec<AddressRecord>,
    /// Ascending by key
    pub texts: Vec<TextRecord>,
    pub contenthash: Option<Binary>,
}
