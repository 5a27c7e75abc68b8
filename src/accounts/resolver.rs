//! Identifier → account lookup.

use alloy::primitives::Address;
use std::collections::HashMap;
use std::sync::Arc;

use crate::accounts::account::Account;
use crate::bidding::error::BidError;
use crate::config::{AccountConfig, ConfigError, ValidationError};

/// Fixed table of signing accounts, built once at startup.
///
/// Lookup is exact, case-sensitive string equality. Anything outside the
/// table resolves to [`BidError::UnknownIdentifier`].
#[derive(Debug, Default)]
pub struct AccountResolver {
    accounts: HashMap<String, Arc<Account>>,
}

impl AccountResolver {
    /// Build a resolver from already-loaded accounts.
    ///
    /// Identifiers whose keys derive the same address share one sequence lock.
    pub fn from_accounts(accounts: Vec<Account>) -> Result<Self, ConfigError> {
        let mut table: HashMap<String, Arc<Account>> = HashMap::with_capacity(accounts.len());
        let mut by_address: HashMap<Address, Arc<Account>> = HashMap::new();

        for mut account in accounts {
            let identifier = account.identifier().to_string();
            if table.contains_key(&identifier) {
                return Err(ConfigError::Validation(vec![
                    ValidationError::DuplicateIdentifier(identifier),
                ]));
            }

            if let Some(first) = by_address.get(&account.address()) {
                tracing::info!(
                    identifier = %identifier,
                    shares_with = %first.identifier(),
                    address = %account.address(),
                    "Identifiers share a signing address"
                );
                account.share_sequence_with(first);
            }

            let account = Arc::new(account);
            by_address
                .entry(account.address())
                .or_insert_with(|| Arc::clone(&account));
            table.insert(identifier, account);
        }
        Ok(Self { accounts: table })
    }

    /// Load every configured account, reading keys through `lookup`.
    pub fn from_config_with<F>(entries: &[AccountConfig], lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let accounts = entries
            .iter()
            .map(|entry| Account::from_lookup(&entry.identifier, &entry.private_key_env, &lookup))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_accounts(accounts)
    }

    /// Load every configured account from the process environment.
    pub fn from_config(entries: &[AccountConfig]) -> Result<Self, ConfigError> {
        Self::from_config_with(entries, |name| std::env::var(name).ok())
    }

    /// Resolve an identifier to its account.
    pub fn resolve(&self, identifier: &str) -> Result<Arc<Account>, BidError> {
        self.accounts
            .get(identifier)
            .cloned()
            .ok_or_else(|| BidError::UnknownIdentifier(identifier.to_string()))
    }

    /// Configured identifiers, sorted.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.accounts.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_1: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const KEY_2: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    fn entries() -> Vec<AccountConfig> {
        ["1", "2"]
            .iter()
            .map(|id| AccountConfig {
                identifier: id.to_string(),
                private_key_env: format!("PRIVATE_KEY_{}", id),
            })
            .collect()
    }

    fn lookup(name: &str) -> Option<String> {
        match name {
            "PRIVATE_KEY_1" => Some(KEY_1.to_string()),
            "PRIVATE_KEY_2" => Some(KEY_2.to_string()),
            _ => None,
        }
    }

    fn resolver() -> AccountResolver {
        AccountResolver::from_config_with(&entries(), lookup).unwrap()
    }

    #[test]
    fn test_resolve_configured_identifiers() {
        let resolver = resolver();
        assert_eq!(resolver.len(), 2);
        assert_eq!(resolver.identifiers(), vec!["1", "2"]);
        assert_ne!(
            resolver.resolve("1").unwrap().address(),
            resolver.resolve("2").unwrap().address()
        );
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let resolver = resolver();
        let first = resolver.resolve("1").unwrap();
        let second = resolver.resolve("1").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unknown_identifiers() {
        let resolver = resolver();
        for id in ["", "9", " 1", "1 ", "01", "one", "１", "PRIVATE_KEY_1"] {
            match resolver.resolve(id) {
                Err(BidError::UnknownIdentifier(got)) => assert_eq!(got, id),
                other => panic!("expected UnknownIdentifier for {:?}, got {:?}", id, other),
            }
        }
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let mut entries = entries();
        entries[0].identifier = "alice".to_string();
        let resolver = AccountResolver::from_config_with(&entries, lookup).unwrap();
        assert!(resolver.resolve("alice").is_ok());
        assert!(resolver.resolve("Alice").is_err());
    }

    #[test]
    fn test_missing_key_fails_startup() {
        let mut entries = entries();
        entries.push(AccountConfig {
            identifier: "3".to_string(),
            private_key_env: "PRIVATE_KEY_3".to_string(),
        });
        let err = AccountResolver::from_config_with(&entries, lookup).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { ref identifier, .. } if identifier == "3"));
    }

    #[test]
    fn test_duplicate_accounts_rejected() {
        let accounts = vec![
            Account::from_private_key("1", KEY_1).unwrap(),
            Account::from_private_key("1", KEY_2).unwrap(),
        ];
        assert!(AccountResolver::from_accounts(accounts).is_err());
    }

    #[tokio::test]
    async fn test_shared_key_shares_sequence() {
        let resolver = AccountResolver::from_config_with(&entries(), |_| Some(KEY_1.to_string()))
            .unwrap();
        let one = resolver.resolve("1").unwrap();
        let two = resolver.resolve("2").unwrap();
        assert_eq!(one.address(), two.address());

        one.lock_sequence().await.advance_past(4);
        assert_eq!(two.lock_sequence().await.cached(), Some(5));
    }
}
