//! Method-interception registry.
//!
//! Mods register hooks against named host methods while their entry points
//! run; the loader only ever reads the registry back for reporting. The
//! registry is process-global because mods reach it through C function
//! pointers in the host vtable, which cannot capture state.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

pub use mmloader_mod_sdk::PatchStage;

/// One registered hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRecord {
    /// Identifier of the mod that owns the hook.
    pub owner: String,
}

/// Hooks registered against a single target method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchInfo {
    pub prefixes: Vec<PatchRecord>,
    pub replacements: Vec<PatchRecord>,
    pub postfixes: Vec<PatchRecord>,
}

impl PatchInfo {
    /// Hooks registered for one stage.
    pub fn records(&self, stage: PatchStage) -> &[PatchRecord] {
        match stage {
            PatchStage::Prefix => &self.prefixes,
            PatchStage::Replacement => &self.replacements,
            PatchStage::Postfix => &self.postfixes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty() && self.replacements.is_empty() && self.postfixes.is_empty()
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    instance_id: Option<String>,
    patches: BTreeMap<String, PatchInfo>,
}

static REGISTRY: Lazy<RwLock<RegistryState>> = Lazy::new(|| RwLock::new(RegistryState::default()));

/// Initialize the subsystem under its globally unique identifier.
/// Idempotent: a second call keeps the first identifier.
pub fn initialize(instance_id: &str) {
    let mut state = REGISTRY.write();
    if let Some(existing) = &state.instance_id {
        tracing::debug!("patch registry already initialized as {}", existing);
        return;
    }
    state.instance_id = Some(instance_id.to_string());
    tracing::info!("patch registry initialized as {}", instance_id);
}

/// Identifier the registry was initialized under, if any.
pub fn instance_id() -> Option<String> {
    REGISTRY.read().instance_id.clone()
}

/// Record one hook against a target method.
pub fn register(target: &str, stage: PatchStage, owner: &str) {
    let mut state = REGISTRY.write();
    let info = state.patches.entry(target.to_string()).or_default();
    let record = PatchRecord {
        owner: owner.to_string(),
    };
    match stage {
        PatchStage::Prefix => info.prefixes.push(record),
        PatchStage::Replacement => info.replacements.push(record),
        PatchStage::Postfix => info.postfixes.push(record),
    }
    tracing::debug!("{} registered a {:?} hook on {}", owner, stage, target);
}

/// Every method with at least one registered hook, in sorted order.
pub fn patched_methods() -> Vec<String> {
    REGISTRY.read().patches.keys().cloned().collect()
}

/// Hooks for a single target method.
pub fn patch_info(target: &str) -> Option<PatchInfo> {
    REGISTRY.read().patches.get(target).cloned()
}

/// Drop all registered state, including the instance identifier.
pub fn reset() {
    *REGISTRY.write() = RegistryState::default();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::lock_global_state;

    #[test]
    fn test_registry_lifecycle() {
        let _guard = lock_global_state();
        reset();

        assert!(instance_id().is_none());
        initialize("de.morphyum.MMModLoader");
        // Second initialization keeps the first identifier.
        initialize("other.id");
        assert_eq!(instance_id().as_deref(), Some("de.morphyum.MMModLoader"));

        register("RaceSim.Tick", PatchStage::Postfix, "com.example.a");
        register("GameTimer.Update", PatchStage::Prefix, "com.example.a");
        register("GameTimer.Update", PatchStage::Prefix, "com.example.b");

        // Sorted enumeration.
        assert_eq!(patched_methods(), vec!["GameTimer.Update", "RaceSim.Tick"]);

        let info = patch_info("GameTimer.Update").expect("patched");
        assert_eq!(info.records(PatchStage::Prefix).len(), 2);
        assert!(info.records(PatchStage::Replacement).is_empty());
        assert!(info.records(PatchStage::Postfix).is_empty());
        assert_eq!(info.prefixes[0].owner, "com.example.a");

        assert!(patch_info("Unpatched.Method").is_none());

        reset();
        assert!(patched_methods().is_empty());
        assert!(instance_id().is_none());
    }
}
