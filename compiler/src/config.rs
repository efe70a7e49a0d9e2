//! TOML configuration for `opsplit.toml`.
//!
//! ```toml
//! [pipeline]
//! verify = true
//! parallel = false
//! max-iterations = 4
//!
//! [stateful-operands]
//! builtin = true
//!
//! [stateful-operands.ops]
//! "custom.state_update" = [0, 2]
//! ```

use crate::ir::optimization::PassManager;
use crate::ir::split_merged_operands::SplitMergedOperandsPass;
use crate::ir::stateful::StatefulPolicyTable;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// The raw TOML structure
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
    pipeline: Option<PipelineConfig>,
    stateful_operands: Option<StatefulOperandsConfig>,
}

/// `[pipeline]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PipelineConfig {
    /// Validate the IR after the pass
    #[serde(default = "default_true")]
    pub verify: bool,
    /// Split functions concurrently
    #[serde(default)]
    pub parallel: bool,
    /// Pass manager fixed-point bound
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            verify: true,
            parallel: false,
            max_iterations: default_max_iterations(),
        }
    }
}

/// `[stateful-operands]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatefulOperandsConfig {
    /// Start from the builtin catalogue of recurrent operations
    #[serde(default = "default_true")]
    pub builtin: bool,
    /// Extra or overriding entries: opcode name to stateful operand indices
    #[serde(default)]
    pub ops: BTreeMap<String, Vec<usize>>,
}

impl Default for StatefulOperandsConfig {
    fn default() -> Self {
        Self {
            builtin: true,
            ops: BTreeMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_iterations() -> usize {
    4
}

/// Parsed configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitConfig {
    pub pipeline: PipelineConfig,
    pub stateful_operands: StatefulOperandsConfig,
}

impl SplitConfig {
    /// Stateful operand policy described by this configuration
    pub fn policy(&self) -> StatefulPolicyTable {
        let mut table = StatefulPolicyTable::new(self.stateful_operands.builtin);
        for (name, indices) in &self.stateful_operands.ops {
            table.insert(name.clone(), indices.clone());
        }
        table
    }

    /// The split pass, configured
    pub fn pass(&self) -> SplitMergedOperandsPass {
        SplitMergedOperandsPass::new(Arc::new(self.policy())).with_parallel(self.pipeline.parallel)
    }

    /// A pass manager running the split pass
    pub fn pass_manager(&self) -> PassManager {
        let mut manager = PassManager::new();
        manager.set_max_iterations(self.pipeline.max_iterations);
        manager.set_validate_after_each(self.pipeline.verify);
        manager.add_pass(self.pass());
        manager
    }
}

/// Parse an `opsplit.toml` string.
pub fn parse_config(content: &str) -> Result<SplitConfig, String> {
    let raw: RawConfig =
        toml::from_str(content).map_err(|e| format!("Failed to parse opsplit.toml: {}", e))?;

    let config = SplitConfig {
        pipeline: raw.pipeline.unwrap_or_default(),
        stateful_operands: raw.stateful_operands.unwrap_or_default(),
    };

    if config.pipeline.max_iterations == 0 {
        return Err("[pipeline] max-iterations must be at least 1".to_string());
    }
    if let Some(name) = config.stateful_operands.ops.keys().find(|n| n.trim().is_empty()) {
        return Err(format!(
            "[stateful-operands.ops] has an entry with an empty opcode name {:?}",
            name
        ));
    }

    Ok(config)
}

/// Load and parse a configuration file.
pub fn load_config(path: &Path) -> Result<SplitConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::stateful::StatefulOperandPolicy;
    use crate::ir::{IrId, IrInstruction, IrOpcode};

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[pipeline]
verify = false
parallel = true
max-iterations = 2

[stateful-operands]
builtin = false

[stateful-operands.ops]
"custom.state_update" = [2, 0]
"#;
        let config = parse_config(toml).unwrap();
        assert!(!config.pipeline.verify);
        assert!(config.pipeline.parallel);
        assert_eq!(config.pipeline.max_iterations, 2);

        let policy = config.policy();
        assert!(!policy.includes_builtin());
        let inst = IrInstruction::new(
            IrOpcode::Custom {
                name: "custom.state_update".to_string(),
            },
            vec![IrId::new(0); 3],
            vec![],
        );
        assert_eq!(policy.stateful_operands(&inst).as_slice(), &[2, 0]);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, SplitConfig::default());
        assert!(config.policy().includes_builtin());
        assert_eq!(config.policy().effective_entries().len(), 5);
    }

    #[test]
    fn test_invalid_config() {
        assert!(parse_config("[pipeline]\nmax-iterations = 0\n").is_err());
        assert!(parse_config("[stateful-operands.ops]\n\"\" = [1]\n").is_err());
        assert!(parse_config("[pipeline]\nverify = \"yes\"\n")
            .unwrap_err()
            .starts_with("Failed to parse opsplit.toml"));
    }

    #[test]
    fn test_pass_manager_from_config() {
        let config = parse_config("[pipeline]\nparallel = true\n").unwrap();
        let manager = config.pass_manager();
        assert_eq!(manager.pass_names(), vec![SplitMergedOperandsPass::NAME]);
    }
}
