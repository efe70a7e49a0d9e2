//! IR Modules
//!
//! A module is the unit a model export works on: an ordered collection of
//! functions (the main graph plus any subgraphs).

use super::{IrFunction, IrFunctionId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// IR module - represents one exported model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrModule {
    /// Module name
    pub name: String,

    /// Functions defined in this module, in definition order
    pub functions: IndexMap<IrFunctionId, IrFunction>,

    /// Next available function ID
    #[serde(default)]
    pub next_function_id: u32,
}

impl IrModule {
    /// Create a new empty module
    pub fn new(name: String) -> Self {
        Self {
            name,
            functions: IndexMap::new(),
            next_function_id: 0,
        }
    }

    /// Allocate a new function ID
    pub fn alloc_function_id(&mut self) -> IrFunctionId {
        let id = IrFunctionId(self.next_function_id);
        self.next_function_id += 1;
        id
    }

    /// Add a function to the module
    pub fn add_function(&mut self, function: IrFunction) {
        if function.id.0 >= self.next_function_id {
            self.next_function_id = function.id.0 + 1;
        }
        self.functions.insert(function.id, function);
    }

    /// Find a function by name
    pub fn get_function_by_name(&self, name: &str) -> Option<&IrFunction> {
        self.functions.values().find(|f| f.name == name)
    }

    /// Load a module from its JSON form, repairing value counters
    pub fn from_json(content: &str) -> Result<Self, String> {
        let mut module: IrModule =
            serde_json::from_str(content).map_err(|e| format!("Failed to parse IR module: {}", e))?;
        for function in module.functions.values_mut() {
            function.recompute_next_reg_id();
        }
        if let Some(max) = module.functions.keys().map(|id| id.0).max() {
            module.next_function_id = module.next_function_id.max(max + 1);
        }
        Ok(module)
    }

    /// Serialize the module to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| format!("Failed to serialize IR module: {}", e))
    }
}
