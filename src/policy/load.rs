// src/policy/load.rs
// =============================================================================
// This module resolves a Policy from the places it can come from.
//
// Layers, lowest priority first:
// 1. Policy::default()
// 2. a JSON settings file (every field optional)
// 3. command-line overrides
//
// The settings file also carries the geo-lookup configuration, which is not
// part of the Policy itself: the engine only ever sees the resulting
// `geo_exempt` boolean.
//
// Example settings file:
//
//   {
//     "site_host": "example.com",
//     "exclusion_patterns": ["partner.com"],
//     "blocklist_patterns": ["partner.com/affiliate"],
//     "yandex_market_excluded": true,
//     "geo": { "exempt_countries": ["RU", "BY"] }
//   }
// =============================================================================

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::geo::GeoSettings;
use crate::policy::snapshot::Policy;

// Everything a settings file can contain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(flatten)]
    pub policy: Policy,
    #[serde(default)]
    pub geo: GeoSettings,
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        let json = std::fs::read_to_string(path).map_err(|source| PolicyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    // Like load(), but never fails: an unreadable or invalid file yields
    // the defaults, so one bad settings file cannot break page rendering.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("falling back to default policy: {e}");
                Self::default()
            }
        }
    }
}

impl Policy {
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        Settings::from_json(json).map(|settings| settings.policy)
    }

    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        Settings::load(path).map(|settings| settings.policy)
    }

    pub fn load_or_default(path: &Path) -> Self {
        Settings::load_or_default(path).policy
    }
}

// Values given on the command line; None / empty means "keep the file's".
//
// Pattern lists are appended to, never replaced, so a CLI `--exclude` adds
// to the exclusions from the file.
#[derive(Debug, Clone, Default)]
pub struct PolicyOverrides {
    pub site_host: Option<String>,
    pub exclude: Vec<String>,
    pub block: Vec<String>,
    pub social_block: bool,
    pub social_exempt: bool,
    pub yandex_market_excluded: bool,
    pub geo_exempt: Option<bool>,
}

impl PolicyOverrides {
    pub fn apply(&self, policy: &mut Policy) {
        if let Some(host) = &self.site_host {
            policy.site_host = host.clone();
        }
        policy.exclusion_patterns.extend(self.exclude.iter().cloned());
        policy.blocklist_patterns.extend(self.block.iter().cloned());
        policy.social_block_enabled |= self.social_block;
        policy.social_exempt |= self.social_exempt;
        policy.yandex_market_excluded |= self.yandex_market_excluded;
        if let Some(exempt) = self.geo_exempt {
            policy.geo_exempt = exempt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_json_gives_defaults() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_json() {
        let settings = Settings::from_json(
            r#"{
                "site_host": "example.com",
                "exclusion_patterns": ["partner.com"],
                "geo": { "exempt_countries": ["RU"] }
            }"#,
        )
        .unwrap();

        assert_eq!(settings.policy.site_host, "example.com");
        assert_eq!(settings.policy.exclusion_patterns, vec!["partner.com"]);
        assert!(settings.policy.blocklist_patterns.is_empty());
        assert!(!settings.policy.social_domains.is_empty());
        assert_eq!(settings.geo.exempt_countries, vec!["RU"]);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(
            Policy::from_json("{ not json"),
            Err(PolicyError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "site_host": "example.com", "geo_exempt": true }}"#).unwrap();

        let policy = Policy::load(file.path()).unwrap();
        assert_eq!(policy.site_host, "example.com");
        assert!(policy.geo_exempt);
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");

        assert!(matches!(Policy::load(&path), Err(PolicyError::Read { .. })));
        assert_eq!(Policy::load_or_default(&path), Policy::default());
    }

    #[test]
    fn test_overrides_layer_on_top() {
        let mut policy = Policy {
            site_host: "old.com".to_string(),
            exclusion_patterns: vec!["a.com".to_string()],
            geo_exempt: true,
            ..Policy::default()
        };
        let overrides = PolicyOverrides {
            site_host: Some("new.com".to_string()),
            exclude: vec!["b.com".to_string()],
            geo_exempt: Some(false),
            ..PolicyOverrides::default()
        };

        overrides.apply(&mut policy);

        assert_eq!(policy.site_host, "new.com");
        assert_eq!(policy.exclusion_patterns, vec!["a.com", "b.com"]);
        assert!(!policy.geo_exempt);
    }
}
