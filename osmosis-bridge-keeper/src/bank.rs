// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coin {
    pub denom: String,
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Minting backend. `module_addr` must be the admin of the token-factory denom.
pub trait TokenFactory {
    fn mint(&mut self, module_addr: &str, coin: Coin, dest_addr: &str) -> Result<(), String>;
    fn burn(&mut self, module_addr: &str, coin: Coin, source_addr: &str) -> Result<(), String>;
}

/// Token factory over in-memory balances.
#[derive(Debug, Default, Clone)]
pub struct MemBank {
    balances: HashMap<(String, String), u128>,
}

impl MemBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, address: &str, denom: &str) -> u128 {
        self.balances
            .get(&(address.to_string(), denom.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn set_balance(&mut self, address: &str, coin: Coin) {
        self.balances
            .insert((address.to_string(), coin.denom), coin.amount);
    }

    fn check_admin(module_addr: &str, denom: &str) -> Result<(), String> {
        let expected_prefix = format!("factory/{module_addr}/");
        if !denom.starts_with(&expected_prefix) {
            return Err(format!("{module_addr} is not the admin of {denom}"));
        }
        Ok(())
    }
}

impl TokenFactory for MemBank {
    fn mint(&mut self, module_addr: &str, coin: Coin, dest_addr: &str) -> Result<(), String> {
        Self::check_admin(module_addr, &coin.denom)?;
        let balance = self
            .balances
            .entry((dest_addr.to_string(), coin.denom.clone()))
            .or_insert(0);
        *balance = balance
            .checked_add(coin.amount)
            .ok_or_else(|| format!("balance overflow minting {coin}"))?;
        Ok(())
    }

    fn burn(&mut self, module_addr: &str, coin: Coin, source_addr: &str) -> Result<(), String> {
        Self::check_admin(module_addr, &coin.denom)?;
        let key = (source_addr.to_string(), coin.denom.clone());
        let balance = self.balances.get(&key).copied().unwrap_or(0);
        if balance < coin.amount {
            return Err(format!(
                "insufficient funds: {balance}{} < {coin}",
                coin.denom
            ));
        }
        self.balances.insert(key, balance - coin.amount);
        Ok(())
    }
}
