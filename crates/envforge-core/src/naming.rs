//! Names derived from the cluster name
//!
//! Every function here is pure, so re-running a profile with the same input
//! always targets the same resources.

const STORAGE_NAME_MAX: usize = 24;
const STORAGE_NAME_MIN: usize = 3;

/// DNS prefix of the cluster API server
pub fn dns_prefix(cluster_name: &str) -> String {
    format!("{}-dns", cluster_name)
}

pub fn network_name(cluster_name: &str) -> String {
    format!("{}-vnet", cluster_name)
}

pub fn gateway_name(cluster_name: &str) -> String {
    format!("{}-apim", cluster_name)
}

/// Storage account names are 3-24 lowercase letters and digits.
///
/// The derived name keeps the cluster name's alphanumerics, lowercased, and
/// appends `sto`; the cluster part is cut so the suffix always survives.
pub fn storage_account_name(cluster_name: &str) -> String {
    let suffix = "sto";
    let base: String = cluster_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .take(STORAGE_NAME_MAX - suffix.len())
        .collect();
    format!("{}{}", base, suffix)
}

pub fn is_valid_storage_account_name(name: &str) -> bool {
    (STORAGE_NAME_MIN..=STORAGE_NAME_MAX).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dns_prefix() {
        assert_eq!(dns_prefix("demo"), "demo-dns");
        assert_eq!(dns_prefix("demo"), dns_prefix("demo"));
    }

    #[test]
    fn test_derived_names() {
        assert_eq!(network_name("demo"), "demo-vnet");
        assert_eq!(gateway_name("demo"), "demo-apim");
    }

    #[test]
    fn test_storage_account_name() {
        assert_eq!(storage_account_name("Demo-Cluster_01"), "democluster01sto");

        let long = storage_account_name("a-very-long-cluster-name-for-testing");
        assert_eq!(long.len(), 24);
        assert!(long.ends_with("sto"));
        assert!(is_valid_storage_account_name(&long));
    }

    #[test]
    fn test_storage_account_name_validation() {
        assert!(is_valid_storage_account_name("sto44448"));
        assert!(!is_valid_storage_account_name("ab"));
        assert!(!is_valid_storage_account_name("Has-Dash"));
    }
}
