//! IR Pass Infrastructure
//!
//! Passes that rewrite the graph IR implement [`OptimizationPass`] and are
//! sequenced by a [`PassManager`]. Unlike pure optimizations, export-time
//! passes may reject their input, so every entry point returns a `Result`.

use super::split_merged_operands::SplitError;
use super::validation::{self, ValidationError};
use super::{IrFunction, IrModule};
use std::collections::HashMap;
use std::fmt;

/// Pass trait
pub trait OptimizationPass {
    /// Get the name of this pass
    fn name(&self) -> &'static str;

    /// Run the pass on a module
    fn run_on_module(&mut self, module: &mut IrModule) -> Result<OptimizationResult, PassError>;

    /// Run the pass on a function (default implementation does nothing)
    fn run_on_function(
        &mut self,
        _function: &mut IrFunction,
    ) -> Result<OptimizationResult, PassError> {
        Ok(OptimizationResult::unchanged())
    }
}

/// Result of a pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizationResult {
    /// Whether the IR was modified
    pub modified: bool,

    /// Number of instructions inserted
    pub instructions_inserted: usize,

    /// Number of instructions eliminated
    pub instructions_eliminated: usize,

    /// Other statistics
    pub stats: HashMap<String, usize>,
}

impl OptimizationResult {
    /// Create a result indicating no changes
    pub fn unchanged() -> Self {
        Self::default()
    }

    /// Create a result indicating changes
    pub fn changed() -> Self {
        Self {
            modified: true,
            ..Self::default()
        }
    }

    /// Add to a named statistic
    pub fn add_stat(&mut self, key: &str, value: usize) {
        *self.stats.entry(key.to_string()).or_insert(0) += value;
    }

    /// Read a named statistic (0 if never recorded)
    pub fn stat(&self, key: &str) -> usize {
        self.stats.get(key).copied().unwrap_or(0)
    }

    /// Combine results
    pub fn combine(mut self, other: OptimizationResult) -> Self {
        self.modified |= other.modified;
        self.instructions_inserted += other.instructions_inserted;
        self.instructions_eliminated += other.instructions_eliminated;

        for (key, value) in other.stats {
            *self.stats.entry(key).or_insert(0) += value;
        }

        self
    }
}

/// Failure of a pass
#[derive(Debug)]
pub enum PassError {
    /// The pass could not transform a function
    Failed {
        pass: &'static str,
        function: String,
        error: SplitError,
    },

    /// The IR is invalid after the pass ran
    Invalid {
        pass: &'static str,
        errors: Vec<ValidationError>,
    },
}

impl PassError {
    /// Name of the pass that failed
    pub fn pass(&self) -> &'static str {
        match self {
            PassError::Failed { pass, .. } | PassError::Invalid { pass, .. } => pass,
        }
    }
}

impl fmt::Display for PassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassError::Failed {
                pass,
                function,
                error,
            } => write!(f, "pass '{}' failed on function @{}: {}", pass, function, error),
            PassError::Invalid { pass, errors } => {
                write!(f, "IR invalid after pass '{}':", pass)?;
                for error in errors {
                    write!(f, "\n  {}", error)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for PassError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PassError::Failed { error, .. } => Some(error),
            PassError::Invalid { .. } => None,
        }
    }
}

/// Pass manager
pub struct PassManager {
    passes: Vec<Box<dyn OptimizationPass>>,

    /// Upper bound on sweeps over the pass list
    max_iterations: usize,

    /// Run structural validation after every pass
    validate_after_each: bool,
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PassManager {
    /// Create a new pass manager
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            max_iterations: 4,
            validate_after_each: true,
        }
    }

    /// Add a pass to the manager
    pub fn add_pass<P: OptimizationPass + 'static>(&mut self, pass: P) {
        self.passes.push(Box::new(pass));
    }

    /// Set the sweep bound (at least one sweep always runs)
    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.max_iterations = max_iterations.max(1);
    }

    /// Enable or disable validation after each pass
    pub fn set_validate_after_each(&mut self, validate: bool) {
        self.validate_after_each = validate;
    }

    /// Names of the registered passes, in order
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Run all passes on a module until none of them changes it
    pub fn run(&mut self, module: &mut IrModule) -> Result<OptimizationResult, PassError> {
        let mut total_result = OptimizationResult::unchanged();

        for iteration in 0..self.max_iterations {
            let mut changed = false;

            for pass in &mut self.passes {
                let result = pass.run_on_module(module)?;
                tracing::debug!(
                    "pass {} (sweep {}) modified={} stats={:?}",
                    pass.name(),
                    iteration,
                    result.modified,
                    result.stats
                );

                if self.validate_after_each {
                    validation::validate_module(module).map_err(|errors| PassError::Invalid {
                        pass: pass.name(),
                        errors,
                    })?;
                }

                // Later sweeps that change nothing only confirm the fixed point
                changed |= result.modified;
                if iteration == 0 || result.modified {
                    total_result = total_result.combine(result);
                }
            }

            if !changed {
                return Ok(total_result);
            }
        }

        log::warn!(
            "pass pipeline still changing IR after {} sweeps",
            self.max_iterations
        );
        Ok(total_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingPass {
        remaining_changes: usize,
    }

    impl OptimizationPass for CountingPass {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn run_on_module(&mut self, _module: &mut IrModule) -> Result<OptimizationResult, PassError> {
            if self.remaining_changes == 0 {
                return Ok(OptimizationResult::unchanged());
            }
            self.remaining_changes -= 1;
            let mut result = OptimizationResult::changed();
            result.add_stat("changes", 1);
            Ok(result)
        }
    }

    /// Inspects two items on every sweep and changes the IR on the first one
    struct InspectingPass {
        sweeps: usize,
    }

    impl OptimizationPass for InspectingPass {
        fn name(&self) -> &'static str {
            "inspecting"
        }

        fn run_on_module(&mut self, _module: &mut IrModule) -> Result<OptimizationResult, PassError> {
            self.sweeps += 1;
            let mut result = if self.sweeps == 1 {
                OptimizationResult::changed()
            } else {
                OptimizationResult::unchanged()
            };
            result.add_stat("inspected", 2);
            Ok(result)
        }
    }

    #[test]
    fn test_combine_results() {
        let mut a = OptimizationResult::changed();
        a.instructions_inserted = 2;
        a.add_stat("constants_cloned", 2);
        let mut b = OptimizationResult::unchanged();
        b.add_stat("constants_cloned", 1);
        b.add_stat("dequantize_pairs_cloned", 1);

        let total = a.combine(b);
        assert!(total.modified);
        assert_eq!(total.instructions_inserted, 2);
        assert_eq!(total.stat("constants_cloned"), 3);
        assert_eq!(total.stat("dequantize_pairs_cloned"), 1);
        assert_eq!(total.stat("missing"), 0);
    }

    #[test]
    fn test_manager_runs_to_fixed_point() {
        let mut manager = PassManager::new();
        manager.add_pass(CountingPass {
            remaining_changes: 2,
        });
        let mut module = IrModule::new("m".to_string());

        let result = manager.run(&mut module).unwrap();
        assert!(result.modified);
        assert_eq!(result.stat("changes"), 2);
        assert_eq!(manager.pass_names(), vec!["counting"]);
    }

    #[test]
    fn test_manager_respects_sweep_bound() {
        let mut manager = PassManager::new();
        manager.set_max_iterations(1);
        manager.add_pass(CountingPass {
            remaining_changes: 10,
        });
        let mut module = IrModule::new("m".to_string());

        let result = manager.run(&mut module).unwrap();
        assert_eq!(result.stat("changes"), 1);
    }

    #[test]
    fn test_confirming_sweep_does_not_inflate_stats() {
        let mut manager = PassManager::new();
        manager.add_pass(InspectingPass { sweeps: 0 });
        let mut module = IrModule::new("m".to_string());

        let result = manager.run(&mut module).unwrap();
        assert!(result.modified);
        assert_eq!(result.stat("inspected"), 2);
    }
}
