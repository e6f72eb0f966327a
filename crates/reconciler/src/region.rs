//! Static region allow-list.

/// Regions the provisioning backend is approved for.
pub const SUPPORTED_REGIONS: &[&str] = &[
    "asia-east1",
    "asia-northeast1",
    "asia-southeast1",
    "australia-southeast1",
    "europe-north1",
    "europe-west1",
    "europe-west2",
    "europe-west4",
    "northamerica-northeast1",
    "southamerica-east1",
    "us-central1",
    "us-east1",
    "us-east4",
    "us-west1",
    "us-west2",
];

/// Whether the given region is on the allow-list.
pub fn is_supported(region: &str) -> bool {
    SUPPORTED_REGIONS.contains(&region)
}
