//! The fixed set of known modules.

use crate::module::{ModuleCategory, OsintModule};
use crate::sources::{
    CrtShModule, DnsRecordsModule, EmailPolicyModule, HttpHeadersModule, IpGeoModule, NvdModule,
    RdapModule, RobotsModule, UsernamePresenceModule, WaybackModule,
};
use scout_core::Entity;
use std::sync::Arc;
use tracing::debug;

/// Ordered collection of modules.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn OsintModule>>,
}

impl ModuleRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in module.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(DnsRecordsModule::new());
        registry.register(CrtShModule);
        registry.register(WaybackModule);
        registry.register(RdapModule);
        registry.register(HttpHeadersModule);
        registry.register(RobotsModule);
        registry.register(IpGeoModule);
        registry.register(EmailPolicyModule::new());
        registry.register(UsernamePresenceModule::new());
        registry.register(NvdModule);
        registry
    }

    /// Add a module, replacing any existing module with the same id.
    pub fn register(&mut self, module: impl OsintModule + 'static) {
        self.register_arc(Arc::new(module));
    }

    /// Add a shared module, replacing any existing module with the same id.
    pub fn register_arc(&mut self, module: Arc<dyn OsintModule>) {
        if let Some(slot) = self.modules.iter_mut().find(|m| m.id() == module.id()) {
            debug!(module_id = module.id(), "replacing registered module");
            *slot = module;
        } else {
            self.modules.push(module);
        }
    }

    /// All modules in registration order.
    #[must_use]
    pub fn all(&self) -> &[Arc<dyn OsintModule>] {
        &self.modules
    }

    /// Module by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn OsintModule>> {
        self.modules.iter().find(|m| m.id() == id).cloned()
    }

    /// Modules that support `entity`, skipping paid sources unless `allow_paid`.
    #[must_use]
    pub fn applicable(&self, entity: &Entity, allow_paid: bool) -> Vec<Arc<dyn OsintModule>> {
        self.modules
            .iter()
            .filter(|m| m.supports(entity) && (m.is_free_tier() || allow_paid))
            .cloned()
            .collect()
    }

    /// Modules in `category`.
    #[must_use]
    pub fn by_category(&self, category: ModuleCategory) -> Vec<Arc<dyn OsintModule>> {
        self.modules
            .iter()
            .filter(|m| m.category() == category)
            .cloned()
            .collect()
    }

    /// Number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether no modules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.modules.iter().map(|m| m.id()))
            .finish()
    }
}
