//! Content-based hashing for run ids and result fingerprints.

use hl_calc::{CalcResult, RegistryDef};
use hl_project::Project;
use sha2::{Digest, Sha256};

/// Identity of a calculation: same project, engine and cell table give the
/// same id, so a stored run can be reused.
pub fn compute_run_id(project: &Project, engine_version: &str, registry: &RegistryDef) -> String {
    let mut hasher = Sha256::new();

    let project_json = serde_json::to_string(project).unwrap_or_default();
    hasher.update(project_json.as_bytes());

    hasher.update(engine_version.as_bytes());

    let registry_json = serde_json::to_string(registry).unwrap_or_default();
    hasher.update(registry_json.as_bytes());

    format!("{:x}", hasher.finalize())
}

/// Byte-identity check over a result document.
pub fn compute_fingerprint(result: &CalcResult) -> String {
    let json = serde_json::to_vec(result).unwrap_or_default();
    format!("{:x}", Sha256::digest(&json))
}
