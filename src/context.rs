use std::path::{Path, PathBuf};

use crate::error::{StageError, StageResult};
use crate::platform::TargetPlatform;

pub const DEFAULT_PROGRAM_NAME: &str = "DatasmithSDK";

/// Build context handed over by the orchestrator for one staging run.
#[derive(Debug, Clone)]
pub struct StageContext {
    pub engine_dir: PathBuf,
    pub platform: TargetPlatform,
    pub program_name: String,
}

impl StageContext {
    pub fn new(engine_dir: impl AsRef<Path>, platform: TargetPlatform) -> Self {
        Self {
            engine_dir: engine_dir.as_ref().to_path_buf(),
            platform,
            program_name: DEFAULT_PROGRAM_NAME.to_string(),
        }
    }

    pub fn program_name(mut self, program_name: impl Into<String>) -> Self {
        self.program_name = program_name.into();
        self
    }

    pub fn validate(&self) -> StageResult<()> {
        if !self.engine_dir.is_dir() {
            return Err(StageError::EngineDirMissing {
                path: self.engine_dir.clone(),
            });
        }
        Ok(())
    }

    /// `{engine}/Binaries/{platform}/{program}`
    pub fn output_root(&self) -> PathBuf {
        self.engine_dir
            .join("Binaries")
            .join(self.platform.as_str())
            .join(&self.program_name)
    }

    /// Expands `$(EngineDir)`, `$(TargetPlatform)` and `$(ProgramName)`.
    /// Any other `$(...)` token is left untouched.
    pub fn expand(&self, raw: &str) -> PathBuf {
        let engine_dir = self.engine_dir.to_string_lossy();
        let expanded = raw
            .replace("$(EngineDir)", &engine_dir)
            .replace("$(TargetPlatform)", self.platform.as_str())
            .replace("$(ProgramName)", &self.program_name);
        PathBuf::from(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_root_layout() {
        let context = StageContext::new("/engine", TargetPlatform::Linux);
        assert_eq!(
            context.output_root(),
            PathBuf::from("/engine/Binaries/Linux/DatasmithSDK")
        );

        let context = context.program_name("OtherSDK");
        assert!(context.output_root().ends_with("Binaries/Linux/OtherSDK"));
    }

    #[test]
    fn test_expand_variables() {
        let context = StageContext::new("/engine", TargetPlatform::Win64);

        assert_eq!(
            context.expand("$(EngineDir)/Source/Runtime/Core/Public"),
            PathBuf::from("/engine/Source/Runtime/Core/Public")
        );
        assert_eq!(
            context.expand("/build/$(TargetPlatform)/$(ProgramName)"),
            PathBuf::from("/build/Win64/DatasmithSDK")
        );
        assert_eq!(
            context.expand("$(ProjectDir)/Docs"),
            PathBuf::from("$(ProjectDir)/Docs")
        );
    }

    #[test]
    fn test_validate_missing_engine_dir() {
        let temp = tempfile::tempdir().unwrap();
        let context = StageContext::new(temp.path(), TargetPlatform::Linux);
        assert!(context.validate().is_ok());

        let context = StageContext::new(temp.path().join("missing"), TargetPlatform::Linux);
        assert!(matches!(
            context.validate(),
            Err(StageError::EngineDirMissing { .. })
        ));
    }
}
