//! Per-service credential sections.
//!
//! Credentials are read from the workflow document (run level) and from an
//! instruction's own `credentials` block (task level). They deserialize but do
//! not serialize, and their `Debug` output never shows values.

use std::{collections::BTreeMap, fmt};

use opsblade_util::{coercion::value_to_string, text_processing::REDACTED};
use serde::{Deserialize, Deserializer, de::Error as _};

use crate::Document;

/// Key/value settings for a single service, such as `region` or `webhook`.
pub type ServiceCredentials = BTreeMap<String, String>;

/// Credential sections keyed by service name (`aws`, `jira`, `slack`, ...).
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Credentials {
    #[serde(deserialize_with = "deserialize_services")]
    services: BTreeMap<String, ServiceCredentials>,
}

/// Scalar settings such as `port: 5432` are kept as their text; an empty
/// section reads as no settings.
fn deserialize_services<'de, D>(deserializer: D) -> Result<BTreeMap<String, ServiceCredentials>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, Option<BTreeMap<String, Document>>> = BTreeMap::deserialize(deserializer)?;
    let mut services = BTreeMap::new();
    for (service, section) in raw {
        let mut settings = ServiceCredentials::new();
        for (key, value) in section.unwrap_or_default() {
            if value.is_array() || value.is_object() {
                return Err(D::Error::custom(format!("credential {service}.{key} must be a scalar value")));
            }
            settings.insert(key, value_to_string(&value));
        }
        services.insert(service, settings);
    }
    Ok(services)
}

impl Credentials {
    /// Combines task-local and run-level credentials.
    ///
    /// For every service, the task-local section is used when it carries at
    /// least one non-empty value; otherwise the run-level section applies.
    pub fn resolve(task_local: &Credentials, run_level: &Credentials) -> Credentials {
        let mut services = BTreeMap::new();
        let names = task_local.services.keys().chain(run_level.services.keys());
        for name in names {
            if services.contains_key(name) {
                continue;
            }
            let chosen = [task_local, run_level]
                .into_iter()
                .filter_map(|credentials| credentials.services.get(name))
                .find(|section| has_any_value(section));
            if let Some(section) = chosen {
                services.insert(name.clone(), section.clone());
            }
        }
        Credentials { services }
    }

    pub fn insert(&mut self, service: impl Into<String>, section: ServiceCredentials) {
        self.services.insert(service.into(), section);
    }

    pub fn service(&self, service: &str) -> Option<&ServiceCredentials> {
        self.services.get(service)
    }

    /// Returns a single non-empty setting of a service.
    pub fn get(&self, service: &str, key: &str) -> Option<&str> {
        self.services
            .get(service)
            .and_then(|section| section.get(key))
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Mutable access to every service section, used when expanding variables.
    pub fn sections_mut(&mut self) -> impl Iterator<Item = &mut ServiceCredentials> {
        self.services.values_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.services.values().all(|section| !has_any_value(section))
    }
}

fn has_any_value(section: &ServiceCredentials) -> bool {
    section.values().any(|value| !value.is_empty())
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (service, section) in &self.services {
            let keys: BTreeMap<&str, &str> = section.keys().map(|key| (key.as_str(), REDACTED)).collect();
            map.entry(service, &keys);
        }
        map.finish()
    }
}
