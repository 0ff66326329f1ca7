//! Build sessions: module generation and memoization.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arcstr::ArcStr;
use log::{debug, warn};
use serde::Serialize;

use crate::config::GeneratorOpts;
use crate::error::Result;
use crate::layout::ModuleRef;
use crate::tech::Pdk;

mod context;

pub use context::LayoutCtx;

/// A parameterized layout generator.
pub trait Component: Sized + 'static {
    type Params: Serialize;

    /// Validates `params` and prepares the generator.
    fn new(params: &Self::Params, factory: &Factory) -> Result<Self>;

    /// The module name. Should be derived from the parameters.
    fn name(&self) -> ArcStr;

    fn layout(&self, ctx: &mut LayoutCtx) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ModuleKey {
    kind: TypeId,
    params: String,
}

/// A build session.
///
/// Owns the technology, the generator options and the module cache. Requesting
/// the same component with the same parameters twice returns the same module.
pub struct Factory {
    pdk: Pdk,
    opts: GeneratorOpts,
    modules: HashMap<ModuleKey, ModuleRef>,
    names: HashSet<ArcStr>,
}

impl Factory {
    pub fn new(pdk: Pdk, opts: GeneratorOpts) -> Self {
        Self {
            pdk,
            opts,
            modules: HashMap::new(),
            names: HashSet::new(),
        }
    }

    #[inline]
    pub fn pdk(&self) -> &Pdk {
        &self.pdk
    }

    #[inline]
    pub fn opts(&self) -> &GeneratorOpts {
        &self.opts
    }

    /// Number of distinct modules generated so far.
    #[inline]
    pub fn num_modules(&self) -> usize {
        self.modules.len()
    }

    /// Returns the module for `params`, generating it on first request.
    pub fn generate<C: Component>(&mut self, params: &C::Params) -> Result<ModuleRef> {
        let key = ModuleKey {
            kind: TypeId::of::<C>(),
            params: serde_json::to_string(params)?,
        };
        if let Some(module) = self.modules.get(&key) {
            return Ok(Arc::clone(module));
        }

        let component = C::new(params, self)?;
        let name = self.reserve_name(component.name());
        debug!("generating {name}");

        let mut ctx = LayoutCtx::new(self, name);
        component.layout(&mut ctx)?;
        let module = Arc::new(ctx.finish()?);

        debug!(
            "finished {} ({:.3} x {:.3})",
            module.name(),
            module.width(),
            module.height()
        );
        self.modules.insert(key, Arc::clone(&module));
        Ok(module)
    }

    /// Claims `name`, appending a numeric suffix if it is already taken.
    fn reserve_name(&mut self, name: ArcStr) -> ArcStr {
        if self.names.insert(name.clone()) {
            return name;
        }
        let mut i = 1;
        let unique = loop {
            let candidate = arcstr::format!("{name}_{i}");
            if !self.names.contains(&candidate) {
                break candidate;
            }
            i += 1;
        };
        warn!("module name {name} is already taken; using {unique}");
        self.names.insert(unique.clone());
        unique
    }
}
