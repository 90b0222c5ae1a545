use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::context::DEFAULT_PROGRAM_NAME;
use crate::manifest::Manifest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetType {
    Program,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkType {
    Monolithic,
}

/// Compile switches declared to the orchestrator for the SDK target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileSwitches {
    pub build_developer_tools: bool,
    pub use_malloc_profiler: bool,
    pub build_with_editor_only_data: bool,
    pub compile_against_engine: bool,
    pub compile_against_core_uobject: bool,
    pub compile_icu: bool,
    pub uses_slate: bool,
    pub disable_debug_info: bool,
}

/// Declarative description of the SDK build target together with the files
/// staged after it builds. Nothing here is acted on locally; it is emitted
/// for the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDescription {
    pub name: String,
    pub target_type: TargetType,
    pub solution_directory: String,
    pub launch_module: String,
    pub binaries_subfolder: String,
    pub extra_modules: Vec<String>,
    pub link_type: LinkType,
    pub compile_as_dll: bool,
    pub use_pdb_files: bool,
    pub has_exports: bool,
    pub console_application: bool,
    pub switches: CompileSwitches,
    pub post_build: Manifest,
}

impl TargetDescription {
    pub fn sdk() -> Self {
        Self {
            name: DEFAULT_PROGRAM_NAME.to_string(),
            target_type: TargetType::Program,
            solution_directory: "Programs/Datasmith".to_string(),
            launch_module: DEFAULT_PROGRAM_NAME.to_string(),
            binaries_subfolder: DEFAULT_PROGRAM_NAME.to_string(),
            extra_modules: vec!["DatasmithCore".to_string(), "DatasmithExporter".to_string()],
            link_type: LinkType::Monolithic,
            compile_as_dll: true,
            use_pdb_files: true,
            has_exports: true,
            console_application: true,
            switches: CompileSwitches {
                build_developer_tools: false,
                use_malloc_profiler: false,
                build_with_editor_only_data: true,
                compile_against_engine: false,
                compile_against_core_uobject: true,
                compile_icu: false,
                uses_slate: false,
                disable_debug_info: false,
            },
            post_build: Manifest::sdk_default(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize target description to JSON")
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write target description to {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sdk_description() {
        let description = TargetDescription::sdk();

        assert_eq!(description.target_type, TargetType::Program);
        assert_eq!(description.link_type, LinkType::Monolithic);
        assert!(description.compile_as_dll);
        assert!(description.console_application);
        assert!(description.extra_modules.contains(&"DatasmithExporter".to_string()));
        assert!(!description.switches.uses_slate);
        assert_eq!(description.post_build, Manifest::sdk_default());
    }

    #[test]
    fn test_write_description() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("out/DatasmithSDK.target.json");

        TargetDescription::sdk().write(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: TargetDescription = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.launch_module, "DatasmithSDK");
        assert!(content.contains("\"link_type\": \"Monolithic\""));
    }
}
