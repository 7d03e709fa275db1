/*++

Licensed under the Apache-2.0 license.

File Name:

   config.rs

Abstract:

    File contains utilities for parsing the prebuilt binary table

--*/

use anyhow::{anyhow, Context};
use fmc_image_types::PrebuiltType;
use serde_derive::{Deserialize, Serialize};
use std::path::Path;

/// One row of the prebuilt table: file name under the prebuilt directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PrebuiltConfig {
    pub file: String,

    /// Type name as in `DP_FW`
    pub r#type: String,
}

// Prebuilt Table Configuration
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct PrebuiltTableConfig {
    #[serde(default)]
    pub prebuilt: Vec<PrebuiltConfig>,
}

/// Built-in table, in descriptor order
const DEFAULT_PREBUILTS: [(&str, PrebuiltType); 8] = [
    ("ddr4_pmu_train_imem.bin", PrebuiltType::Ddr4PmuTrainImem),
    ("ddr4_pmu_train_dmem.bin", PrebuiltType::Ddr4PmuTrainDmem),
    ("ddr4_2d_pmu_train_imem.bin", PrebuiltType::Ddr4_2dPmuTrainImem),
    ("ddr4_2d_pmu_train_dmem.bin", PrebuiltType::Ddr4_2dPmuTrainDmem),
    ("ddr5_pmu_train_imem.bin", PrebuiltType::Ddr5PmuTrainImem),
    ("ddr5_pmu_train_dmem.bin", PrebuiltType::Ddr5PmuTrainDmem),
    ("dp_fw.bin", PrebuiltType::DpFw),
    ("uefi_ast2700.bin", PrebuiltType::UefiAst2700),
];

pub(crate) fn default_prebuilt_table() -> Vec<(String, PrebuiltType)> {
    DEFAULT_PREBUILTS
        .iter()
        .map(|(file, pb_type)| (file.to_string(), *pb_type))
        .collect()
}

/// Resolve the type names of a parsed table
pub(crate) fn resolve_prebuilt_table(
    config: &PrebuiltTableConfig,
) -> anyhow::Result<Vec<(String, PrebuiltType)>> {
    config
        .prebuilt
        .iter()
        .map(|pb| {
            match PrebuiltType::from_name(&pb.r#type) {
                Some(PrebuiltType::End) | None => Err(anyhow!(
                    "Unknown prebuilt type {} for {}",
                    pb.r#type,
                    pb.file
                )),
                Some(pb_type) => Ok((pb.file.clone(), pb_type)),
            }
        })
        .collect()
}

/// Load Prebuilt Table from file
pub(crate) fn load_prebuilt_table(path: &Path) -> anyhow::Result<Vec<(String, PrebuiltType)>> {
    let config_str = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read the config file {}", path.display()))?;

    let config: PrebuiltTableConfig = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    resolve_prebuilt_table(&config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let table = default_prebuilt_table();
        assert_eq!(table.len(), 8);
        assert_eq!(
            table[0],
            ("ddr4_pmu_train_imem.bin".to_string(), PrebuiltType::Ddr4PmuTrainImem)
        );
        assert_eq!(
            table[7],
            ("uefi_ast2700.bin".to_string(), PrebuiltType::UefiAst2700)
        );
    }

    #[test]
    fn test_load_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prebuilt.toml");
        std::fs::write(
            &path,
            r#"
[[prebuilt]]
file = "dp.bin"
type = "DP_FW"

[[prebuilt]]
file = "uefi.bin"
type = "UEFI_AST2700"
"#,
        )
        .unwrap();

        let table = load_prebuilt_table(&path).unwrap();
        assert_eq!(
            table,
            vec![
                ("dp.bin".to_string(), PrebuiltType::DpFw),
                ("uefi.bin".to_string(), PrebuiltType::UefiAst2700),
            ]
        );
    }

    #[test]
    fn test_unknown_type() {
        let config = PrebuiltTableConfig {
            prebuilt: vec![PrebuiltConfig {
                file: "x.bin".into(),
                r#type: "END".into(),
            }],
        };
        assert!(resolve_prebuilt_table(&config).is_err());
    }
}
