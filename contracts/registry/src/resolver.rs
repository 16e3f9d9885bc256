use std::convert::TryInto;

use cosmwasm_std::{Binary, Order, StdError, StdResult, Storage};
use cw_storage_plus::{Map, U64Key};
use subnames::resolver::{AddressRecord, RecordsResponse, TextRecord};

/// Resolver records keyed by node. Every setter overwrites the previous value for its key;
/// authorization is the ledger's job, this store never checks the caller.
pub struct RecordStore<'a> {
    pub addresses: Map<'a, (Vec<u8>, U64Key), Binary>,
    pub texts: Map<'a, (Vec<u8>, String), String>,
    pub contenthash: Map<'a, Vec<u8>, Binary>,
}

impl<'a> RecordStore<'a> {
    pub fn new(addresses_key: &'a str, texts_key: &'a str, contenthash_key: &'a str) -> Self {
        Self {
            addresses: Map::new(addresses_key),
            texts: Map::new(texts_key),
            contenthash: Map::new(contenthash_key),
        }
    }

    pub fn set_address(
        &self,
        storage: &mut dyn Storage,
        node: &[u8],
        coin_type: u64,
        address: &Binary,
    ) -> StdResult<()> {
        self.addresses
            .save(storage, (node.to_vec(), U64Key::from(coin_type)), address)
    }

    pub fn address(
        &self,
        storage: &dyn Storage,
        node: &[u8],
        coin_type: u64,
    ) -> StdResult<Option<Binary>> {
        self.addresses
            .may_load(storage, (node.to_vec(), U64Key::from(coin_type)))
    }

    pub fn set_text(
        &self,
        storage: &mut dyn Storage,
        node: &[u8],
        key: &str,
        value: &str,
    ) -> StdResult<()> {
        self.texts
            .save(storage, (node.to_vec(), key.to_string()), &value.to_string())
    }

    pub fn text(&self, storage: &dyn Storage, node: &[u8], key: &str) -> StdResult<Option<String>> {
        self.texts.may_load(storage, (node.to_vec(), key.to_string()))
    }

    /// `None` clears the hash without touching addresses or texts.
    pub fn set_contenthash(
        &self,
        storage: &mut dyn Storage,
        node: &[u8],
        hash: Option<&Binary>,
    ) -> StdResult<()> {
        match hash {
            Some(hash) => self.contenthash.save(storage, node.to_vec(), hash),
            None => {
                self.contenthash.remove(storage, node.to_vec());
                Ok(())
            }
        }
    }

    pub fn contenthash(&self, storage: &dyn Storage, node: &[u8]) -> StdResult<Option<Binary>> {
        self.contenthash.may_load(storage, node.to_vec())
    }

    pub fn addresses(&self, storage: &dyn Storage, node: &[u8]) -> StdResult<Vec<AddressRecord>> {
        self.addresses
            .prefix(node.to_vec())
            .range(storage, None, None, Order::Ascending)
            .map(|item| {
                let (key, address) = item?;
                let coin_type: [u8; 8] = key
                    .as_slice()
                    .try_into()
                    .map_err(|_| StdError::generic_err("coin type key is not 8 bytes"))?;
                Ok(AddressRecord {
                    coin_type: u64::from_be_bytes(coin_type),
                    address,
                })
            })
            .collect()
    }

    pub fn texts(&self, storage: &dyn Storage, node: &[u8]) -> StdResult<Vec<TextRecord>> {
        self.texts
            .prefix(node.to_vec())
            .range(storage, None, None, Order::Ascending)
            .map(|item| {
                let (key, value) = item?;
                let key = String::from_utf8(key).map_err(StdError::invalid_utf8)?;
                Ok(TextRecord { key, value })
            })
            .collect()
    }

    pub fn records(&self, storage: &dyn Storage, node: &[u8]) -> StdResult<RecordsResponse> {
        Ok(RecordsResponse {
            addresses: self.addresses(storage, node)?,
            texts: self.texts(storage, node)?,
            contenthash: self.contenthash(storage, node)?,
        })
    }
}
