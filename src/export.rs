//! JSON export of a finished module hierarchy.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use arcstr::ArcStr;
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::{BoundBox, Rect, Transform};
use crate::layout::{Instance, Module, ModuleRef, Pin};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceExport {
    pub name: ArcStr,
    pub module: ArcStr,
    pub transform: Transform,
    /// Nets in the child's port order. Empty for dummies.
    #[serde(default)]
    pub connections: Vec<ArcStr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleExport {
    pub name: ArcStr,
    pub boundary: BoundBox,
    pub rects: Vec<Rect>,
    pub pins: Vec<Pin>,
    pub instances: Vec<InstanceExport>,
    pub dummies: Vec<InstanceExport>,
}

/// Every module of a hierarchy, children before their parents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutExport {
    pub top: ArcStr,
    pub modules: Vec<ModuleExport>,
}

fn export_instance(inst: &Instance, connections: &[ArcStr]) -> InstanceExport {
    InstanceExport {
        name: inst.name().clone(),
        module: inst.module().name().clone(),
        transform: inst.transform,
        connections: connections.to_vec(),
    }
}

impl ModuleExport {
    fn new(module: &Module) -> Self {
        Self {
            name: module.name().clone(),
            boundary: module.boundary(),
            rects: module.rects().to_vec(),
            pins: module.pins().to_vec(),
            instances: module
                .instances()
                .iter()
                .zip(module.connections())
                .map(|(inst, conns)| export_instance(inst, conns))
                .collect(),
            dummies: module
                .dummies()
                .iter()
                .map(|inst| export_instance(inst, &[]))
                .collect(),
        }
    }
}

impl LayoutExport {
    pub fn from_module(top: &ModuleRef) -> Self {
        let mut visited = HashSet::new();
        let mut modules = Vec::new();
        collect(top, &mut visited, &mut modules);
        Self {
            top: top.name().clone(),
            modules,
        }
    }

    pub fn module(&self, name: &str) -> Option<&ModuleExport> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Writes the export as JSON, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        info!("wrote {} modules to {:?}", self.modules.len(), path);
        Ok(())
    }
}

fn collect(module: &ModuleRef, visited: &mut HashSet<ArcStr>, out: &mut Vec<ModuleExport>) {
    if !visited.insert(module.name().clone()) {
        return;
    }
    for inst in module.instances().iter().chain(module.dummies()) {
        collect(inst.module(), visited, out);
    }
    out.push(ModuleExport::new(module));
}
