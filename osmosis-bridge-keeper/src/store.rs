// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use osmosis_bridge_types::AssetId;
use std::collections::BTreeMap;

const PARAMS_KEY: &[u8] = &[0x01];
const INBOUND_TRANSFER_PREFIX: u8 = 0x02;
const LAST_TRANSFER_HEIGHT_PREFIX: u8 = 0x03;

/// Key-value view of the module's state on the host chain.
pub trait Store {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>);
    fn delete(&mut self, key: &[u8]);
}

#[derive(Debug, Default, Clone)]
pub struct MemStore {
    inner: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Store for MemStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.get(key).cloned()
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.inner.insert(key, value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.inner.remove(key);
    }
}

pub(crate) fn params_key() -> Vec<u8> {
    PARAMS_KEY.to_vec()
}

// prefix | len(external_id) | external_id | external_height
pub(crate) fn inbound_transfer_key(external_id: &str, external_height: u64) -> Vec<u8> {
    let id = external_id.as_bytes();
    let mut key = Vec::with_capacity(1 + 4 + id.len() + 8);
    key.push(INBOUND_TRANSFER_PREFIX);
    key.extend_from_slice(&(id.len() as u32).to_be_bytes());
    key.extend_from_slice(id);
    key.extend_from_slice(&external_height.to_be_bytes());
    key
}

pub(crate) fn last_transfer_height_key(asset_id: &AssetId) -> Vec<u8> {
    let mut key = vec![LAST_TRANSFER_HEIGHT_PREFIX];
    key.extend_from_slice(asset_id.source_chain.as_bytes());
    key.push(0);
    key.extend_from_slice(asset_id.denom.as_bytes());
    key
}
