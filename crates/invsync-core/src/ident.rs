// ── Identifier normalization ──
//
// Maps external (name, credential scope) pairs to store-legal identifiers:
// lowercase DNS-1123 labels of at most 63 characters. The readable body is
// lossy (punctuation collapses to `-`, long names truncate), so every id
// ends in a short digest of the case-folded inputs to keep distinct pairs
// apart.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Longest identifier the store accepts.
pub const MAX_ID_LEN: usize = 63;

/// External name of the synthetic group holding unclustered hosts.
pub const UNCLUSTERED_NAME: &str = "NO CLUSTER";

/// Joins cluster and datacenter names in a cluster key.
pub const CLUSTER_KEY_SEPARATOR: char = '/';

const DIGEST_BYTES: usize = 4;
const BODY_MAX_LEN: usize = MAX_ID_LEN - DIGEST_BYTES * 2 - 1;

// ── ResourceId ──────────────────────────────────────────────────────

/// A normalized, store-legal object identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

// ── Normalization ───────────────────────────────────────────────────

/// Case-fold an input. The store compares names case-insensitively.
fn fold(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Keep ASCII alphanumerics, collapse everything else into single dashes,
/// and trim dashes from both ends.
fn sanitize(folded: &str) -> String {
    let mut out = String::with_capacity(folded.len());
    for ch in folded.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

fn digest(name: &str, scope: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update([0u8]);
    hasher.update(scope.as_bytes());
    hasher
        .finalize()
        .iter()
        .take(DIGEST_BYTES)
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Derive the store identifier for `raw_name` owned by `scope`.
///
/// Deterministic across processes. Inputs differing only by case map to
/// the same identifier; any other difference yields a different digest.
pub fn normalize(raw_name: &str, scope: &str) -> Result<ResourceId, CoreError> {
    let name = fold(raw_name);
    let scope_folded = fold(scope);

    let name_part = sanitize(&name);
    if name_part.is_empty() {
        return Err(CoreError::InvalidName {
            name: raw_name.into(),
            reason: "no characters remain after removing illegal ones".into(),
        });
    }
    let scope_part = sanitize(&scope_folded);
    if scope_part.is_empty() {
        return Err(CoreError::InvalidName {
            name: scope.into(),
            reason: "credential scope has no characters usable in an identifier".into(),
        });
    }

    let mut body = format!("{name_part}-{scope_part}");
    if body.len() > BODY_MAX_LEN {
        // Body is pure ASCII, so any byte index is a char boundary.
        body.truncate(BODY_MAX_LEN);
        while body.ends_with('-') {
            body.pop();
        }
    }

    Ok(ResourceId(format!("{body}-{}", digest(&name, &scope_folded))))
}

/// Ownership label value for `scope`: the same case-folded form the
/// identifier digest is keyed on, so scopes sharing ids share the label.
pub fn owner_label(scope: &str) -> String {
    fold(scope)
}

/// Compose the scope-free key of a cluster from its name and datacenter.
///
/// Unnamed clusters take the unclustered sentinel name.
pub fn cluster_key(cluster_name: &str, datacenter: &str) -> String {
    let base = if cluster_name.is_empty() {
        UNCLUSTERED_NAME
    } else {
        cluster_name
    };
    if datacenter.is_empty() {
        base.to_owned()
    } else {
        format!("{base}{CLUSTER_KEY_SEPARATOR}{datacenter}")
    }
}

/// Store identifier of a cluster.
pub fn cluster_id(
    cluster_name: &str,
    datacenter: &str,
    scope: &str,
) -> Result<ResourceId, CoreError> {
    normalize(&cluster_key(cluster_name, datacenter), scope)
}

/// Store identifier of a host. Hosts belong to one cluster per pass, so
/// the id is scope-qualified only.
pub fn host_id(host_name: &str, scope: &str) -> Result<ResourceId, CoreError> {
    normalize(host_name, scope)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn is_dns_label(id: &str) -> bool {
        !id.is_empty()
            && id.len() <= MAX_ID_LEN
            && id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && !id.starts_with('-')
            && !id.ends_with('-')
    }

    #[test]
    fn readable_body_then_digest() {
        let id = normalize("esx-01.lab.local", "vcenter-creds").unwrap();
        assert!(id.as_str().starts_with("esx-01-lab-local-vcenter-creds-"));
        assert_eq!(id.as_str().len(), "esx-01-lab-local-vcenter-creds-".len() + 8);
        assert!(is_dns_label(id.as_str()));
    }

    #[test]
    fn deterministic() {
        let a = normalize("Host_A", "scope").unwrap();
        let b = normalize("Host_A", "scope").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn case_only_differences_fold_together() {
        assert_eq!(
            normalize("ESX01.Lab", "Creds").unwrap(),
            normalize("esx01.lab", "creds").unwrap()
        );
        assert_eq!(
            normalize("  esx01  ", "creds").unwrap(),
            normalize("esx01", "creds").unwrap()
        );
    }

    #[test]
    fn owner_label_folds_like_identifiers() {
        assert_eq!(owner_label(" Prod "), owner_label("prod"));
        assert_ne!(owner_label("a b"), owner_label("a-b"));
        assert_eq!(normalize("h1", "Prod").unwrap(), normalize("h1", "prod").unwrap());
    }

    #[test]
    fn punctuation_differences_stay_distinct() {
        let dot = normalize("a.b", "s").unwrap();
        let underscore = normalize("a_b", "s").unwrap();
        let dash = normalize("a-b", "s").unwrap();
        assert_ne!(dot, underscore);
        assert_ne!(dot, dash);
        assert_ne!(underscore, dash);
    }

    #[test]
    fn name_scope_boundary_is_not_ambiguous() {
        // Both bodies read "a-b-c"; the digest keeps them apart.
        assert_ne!(normalize("a-b", "c").unwrap(), normalize("a", "b-c").unwrap());
    }

    #[test]
    fn long_names_are_truncated_to_limit() {
        let long = "x".repeat(200);
        let id = normalize(&long, "scope").unwrap();
        assert_eq!(id.as_str().len(), MAX_ID_LEN);
        assert!(is_dns_label(id.as_str()));

        // Same truncated body, different digest.
        let longer = "x".repeat(201);
        assert_ne!(id, normalize(&longer, "scope").unwrap());
    }

    #[test]
    fn truncation_never_leaves_double_dash_before_digest() {
        let name = format!("{}-{}", "a".repeat(53), "b".repeat(10));
        let id = normalize(&name, "s").unwrap();
        assert!(is_dns_label(id.as_str()));
        assert!(!id.as_str().contains("--"));
    }

    #[test]
    fn unusable_names_are_rejected() {
        for raw in ["", "   ", "---", "日本", "?!"] {
            assert!(
                matches!(normalize(raw, "scope"), Err(CoreError::InvalidName { .. })),
                "{raw:?} should be rejected"
            );
        }
        assert!(matches!(
            normalize("host", "@@"),
            Err(CoreError::InvalidName { .. })
        ));
    }

    #[test]
    fn distinct_pairs_never_collide_in_corpus() {
        let hosts = [
            "esx01", "esx02", "esx-01", "esx_01", "esx.01", "esx01.lab.local", "esx01-lab-local",
            "10.0.0.1", "10-0-0-1", "host a", "host-a", "hosta",
        ];
        let scopes = ["prod", "prod-eu", "prod.eu", "lab", "lab2"];

        let mut seen = HashSet::new();
        for host in hosts {
            for scope in scopes {
                let id = normalize(host, scope).unwrap();
                assert!(is_dns_label(id.as_str()), "{id} is not a DNS label");
                assert!(seen.insert(id.clone()), "collision on ({host}, {scope}): {id}");
            }
        }
        assert_eq!(seen.len(), hosts.len() * scopes.len());
    }

    #[test]
    fn cluster_key_composition() {
        assert_eq!(cluster_key("C1", "DC1"), "C1/DC1");
        assert_eq!(cluster_key("C1", ""), "C1");
        assert_eq!(cluster_key("", "DC1"), "NO CLUSTER/DC1");
        assert_eq!(cluster_key("", ""), UNCLUSTERED_NAME);
    }

    #[test]
    fn same_cluster_name_in_two_datacenters_is_two_ids() {
        let a = cluster_id("Prod", "DC1", "s").unwrap();
        let b = cluster_id("Prod", "DC2", "s").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn cluster_key_separator_disambiguates_dashed_names() {
        let a = cluster_id("a-b", "c", "s").unwrap();
        let b = cluster_id("a", "b-c", "s").unwrap();
        assert_ne!(a, b);
    }
}
