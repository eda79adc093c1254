//! API-key resolution.
//!
//! Lookup order: the settings record, then the provider's environment
//! variable (`OPENAI_API_KEY` / `ANTHROPIC_API_KEY`), then the OS keychain
//! under service `textlift` with the provider id as the user name.

use crate::llm::Provider;

pub const KEYCHAIN_SERVICE: &str = "textlift";

/// Where a resolved key came from. Logged instead of the key itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Settings,
    Environment,
    Keychain,
}

#[derive(Debug, Clone, Copy)]
pub struct CredentialResolver {
    use_env: bool,
    use_keychain: bool,
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self {
            use_env: true,
            use_keychain: true,
        }
    }
}

impl CredentialResolver {
    /// Only trust the settings record. Used by tests so the host
    /// environment cannot leak a real key into a run.
    pub fn settings_only() -> Self {
        Self {
            use_env: false,
            use_keychain: false,
        }
    }

    /// Returns `None` when every source is empty.
    pub fn resolve(&self, provider: Provider, settings_key: &str) -> Option<(String, CredentialSource)> {
        let key = settings_key.trim();
        if !key.is_empty() {
            return Some((key.to_string(), CredentialSource::Settings));
        }

        if self.use_env {
            if let Ok(key) = std::env::var(provider.env_key()) {
                let key = key.trim();
                if !key.is_empty() {
                    return Some((key.to_string(), CredentialSource::Environment));
                }
            }
        }

        if self.use_keychain {
            if let Some(key) = read_keychain(provider) {
                return Some((key, CredentialSource::Keychain));
            }
        }

        None
    }
}

fn read_keychain(provider: Provider) -> Option<String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, provider.id()).ok()?;
    match entry.get_password() {
        Ok(key) if !key.trim().is_empty() => {
            log::info!("[SETTINGS] Loaded {} key from OS keychain", provider.id());
            Some(key.trim().to_string())
        }
        Ok(_) => None,
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            log::debug!("[SETTINGS] Keychain lookup for {} failed: {}", provider.id(), e);
            None
        }
    }
}

/// Save an API key to the OS keychain.
pub fn store_in_keychain(provider: Provider, api_key: &str) -> Result<(), String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, provider.id())
        .map_err(|e| format!("Keyring error: {}", e))?;
    entry
        .set_password(api_key.trim())
        .map_err(|e| format!("Failed to save key: {}", e))?;
    log::info!("[SETTINGS] API key saved to keychain for provider: {}", provider.id());
    Ok(())
}
