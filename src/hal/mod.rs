//! Meta functions of the supported ops, and the default registry that dispatches to them.

use std::sync::OnceLock;

use crate::loom::registry::{Registry, RegistryBuilder};

pub mod index;
pub mod linalg;
pub mod out;
pub mod pool;
pub mod random;
pub mod reduce;

impl RegistryBuilder {
    /// Registers the meta functions of every supported op.
    pub fn add_default_ops(self) -> Self {
        let builder = index::register(self);
        let builder = reduce::register(builder);
        let builder = linalg::register(builder);
        let builder = pool::register(builder);
        random::register(builder)
    }
}

/// Process-wide registry holding every default op. Built on first use.
pub fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| RegistryBuilder::new().add_default_ops().build())
}
