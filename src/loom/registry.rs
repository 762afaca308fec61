use std::sync::Arc;

use rustc_hash::FxHashMap as HashMap;

use super::{
    ops::{MetaArgs, MetaOutput, OpId},
    tensor::TensorError,
};

/// Computes the output descriptors of an op from its arguments.
pub type MetaFn = fn(MetaArgs) -> Result<MetaOutput, TensorError>;

type MetaVTable = HashMap<OpId, MetaFn>;

/// Collects meta functions before any lookup happens.
/// The only way to read from the table is to [`build`](RegistryBuilder::build) it into a [`Registry`].
#[derive(Debug, Default, Clone)]
pub struct RegistryBuilder {
    ops: MetaVTable,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `f` as the meta function of `id`.
    ///
    /// # Panics
    /// Registering the same `id` twice is a programming error.
    /// With the `strict` feature this panics; otherwise the later function is discarded.
    pub fn add_op(mut self, id: OpId, f: MetaFn) -> Self {
        if self.ops.contains_key(&id) {
            #[cfg(feature = "strict")]
            panic!("meta function for {id} registered twice");
            #[cfg(not(feature = "strict"))]
            {
                log::error!("meta function for {id} registered twice, keeping the first");
                return self;
            }
        }
        log::debug!("register meta function for {id}");
        self.ops.insert(id, f);
        self
    }

    pub fn build(self) -> Registry {
        log::debug!("build meta registry with {} ops", self.ops.len());
        let ops = Arc::new(self.ops);
        Registry { ops }
    }
}

/// Read-only table of meta functions. Cheap to clone and safe to share across threads.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    ops: Arc<MetaVTable>,
}

impl Registry {
    /// Finds the meta function of `id`.
    #[inline]
    pub fn lookup(&self, id: OpId) -> Result<MetaFn, TensorError> {
        self.ops
            .get(&id)
            .copied()
            .ok_or(TensorError::Unimplemented(id))
    }

    /// Runs the meta function of `id` on `args`.
    #[cfg_attr(feature = "trace", tracing::instrument(skip_all, fields(op = %id)))]
    pub fn dispatch(&self, id: OpId, args: MetaArgs) -> Result<MetaOutput, TensorError> {
        let f = match self.lookup(id) {
            Ok(f) => f,
            Err(err) => {
                log::debug!("{err}");
                return Err(err);
            }
        };
        log::trace!("dispatch {id}");
        f(args)
    }

    #[inline]
    pub fn contains(&self, id: OpId) -> bool {
        self.ops.contains_key(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Ids of all registered ops, in no particular order.
    #[inline]
    pub fn ops(&self) -> impl Iterator<Item = OpId> + '_ {
        self.ops.keys().copied()
    }
}
