use crate::config::AppConfig;
use crate::types::IdentityProvider;

/// Read-only view over the session's configuration snapshot.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    config: AppConfig,
}

impl ConfigStore {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn identity_providers(&self) -> &[IdentityProvider] {
        &self.config.idp_list
    }

    #[must_use]
    pub fn find_idp(&self, key: &str) -> Option<&IdentityProvider> {
        self.config.find_idp(key)
    }

    /// Providers whose users may be looked up from the sharing dialogs.
    pub fn searchable_idps(&self) -> impl Iterator<Item = &IdentityProvider> {
        self.config.idp_list.iter().filter(|idp| idp.searchable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn searchable_idps_filters_directory() {
        let config = AppConfig::from_json_str(
            r#"{
                "coms": { "apiPath": "https://coms.example/api/v1" },
                "idpList": [
                    { "idp": "idir", "name": "IDIR", "elevatedRights": true, "searchable": true },
                    { "idp": "bceid", "name": "BCeID", "elevatedRights": false, "searchable": false }
                ]
            }"#,
        )
        .unwrap();
        let store = ConfigStore::new(config);
        let keys: Vec<&str> = store.searchable_idps().map(|idp| idp.idp.as_str()).collect();
        assert_eq!(keys, vec!["idir"]);
        assert_eq!(store.find_idp("bceid").unwrap().name, "BCeID");
        assert_eq!(store.identity_providers().len(), 2);
    }
}
