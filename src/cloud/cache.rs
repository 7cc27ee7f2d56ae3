//! Site/environment cache and default selection
//!
//! Listings from the API are cached so the pickers can be populated instantly
//! on the next start. A fresh listing prunes entries the API no longer reports.
//! Domains seen for an environment are remembered so a host name can later be
//! mapped back to its site and environment.

use crate::constants::ENVIRONMENT_ORDER;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSite {
    /// Milliseconds since epoch of the last listing that reported this site
    pub last_updated: i64,
    /// Environment name → last listing time
    #[serde(default)]
    pub environments: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainTarget {
    pub sitename: String,
    pub environment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteEnvironmentCache {
    #[serde(default)]
    pub sites: BTreeMap<String, CachedSite>,
    #[serde(default)]
    pub domains: BTreeMap<String, DomainTarget>,
}

impl SiteEnvironmentCache {
    /// Cached site names, sorted
    pub fn site_names(&self) -> Vec<String> {
        self.sites.keys().cloned().collect()
    }

    /// Cached environment names of a site, in display order
    pub fn environment_names(&self, site: &str) -> Vec<String> {
        let mut envs: Vec<String> = self
            .sites
            .get(site)
            .map(|s| s.environments.keys().cloned().collect())
            .unwrap_or_default();
        sort_environments(&mut envs);
        envs
    }

    /// Record a fresh site listing, dropping sites it does not contain
    pub fn record_sites(&mut self, sites: &[String], now: i64) {
        for name in sites {
            self.sites.entry(name.clone()).or_default().last_updated = now;
        }
        self.sites.retain(|_, site| site.last_updated == now);
    }

    /// Record a fresh environment listing for one site
    pub fn record_environments(&mut self, site: &str, envs: &[String], now: i64) {
        let cached = self.sites.entry(site.to_string()).or_default();
        for env in envs {
            cached.environments.insert(env.clone(), now);
        }
        cached.environments.retain(|_, seen| *seen == now);
    }

    /// Remember which site/environment serves each domain
    pub fn record_domains(&mut self, site: &str, env: &str, domains: &[String]) {
        for domain in domains {
            self.domains.insert(
                domain.to_ascii_lowercase(),
                DomainTarget {
                    sitename: site.to_string(),
                    environment: env.to_string(),
                },
            );
        }
    }

    pub fn domain_match(&self, host: &str) -> Option<&DomainTarget> {
        self.domains.get(&host.to_ascii_lowercase())
    }
}

// =============================================================================
// Ordering and defaults
// =============================================================================

fn environment_rank(name: &str) -> usize {
    ENVIRONMENT_ORDER
        .iter()
        .position(|e| *e == name)
        .unwrap_or(ENVIRONMENT_ORDER.len())
}

/// Well-known environments first in pipeline order, the rest alphabetically
pub fn compare_environments(a: &str, b: &str) -> Ordering {
    environment_rank(a)
        .cmp(&environment_rank(b))
        .then_with(|| a.cmp(b))
}

pub fn sort_environments(envs: &mut [String]) {
    envs.sort_by(|a, b| compare_environments(a, b));
}

fn known(list: &[String], name: Option<&str>) -> Option<String> {
    name.filter(|n| list.iter().any(|item| item == n)).map(str::to_string)
}

/// Pick the initial site: domain match, then last selection, then first
pub fn default_site(
    sites: &[String],
    domain_match: Option<&str>,
    last: Option<&str>,
) -> Option<String> {
    known(sites, domain_match)
        .or_else(|| known(sites, last))
        .or_else(|| {
            let mut sorted = sites.to_vec();
            sorted.sort();
            sorted.into_iter().next()
        })
}

/// Pick the initial environment from a sorted list
///
/// Domain match, then last selection, then production (`prod` or `live01*`,
/// the last one in display order wins), then `dev`, then the first entry.
pub fn default_environment(
    envs: &[String],
    domain_match: Option<&str>,
    last: Option<&str>,
) -> Option<String> {
    known(envs, domain_match)
        .or_else(|| known(envs, last))
        .or_else(|| {
            envs.iter()
                .rev()
                .find(|e| *e == "prod" || e.starts_with("live01"))
                .cloned()
        })
        .or_else(|| envs.iter().find(|e| *e == "dev").cloned())
        .or_else(|| envs.first().cloned())
}
