use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{StageError, StageResult};
use crate::mask::FileMask;

/// One staging directive: copy files matching `file_mask` from `source_dir`
/// into `destination` under the output root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRule {
    source_dir: String,
    file_mask: FileMask,
    destination: String,
}

impl StageRule {
    /// Raw source directory; may still contain `$(...)` variables.
    pub fn source_dir(&self) -> &str {
        &self.source_dir
    }

    pub fn file_mask(&self) -> &FileMask {
        &self.file_mask
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Destination with `.` and `..` resolved lexically, or `None` when it is
    /// absolute or climbs above the output root.
    pub fn normalized_destination(&self) -> Option<PathBuf> {
        let mut normalized = PathBuf::new();

        for component in Path::new(&self.destination).components() {
            match component {
                Component::Normal(part) => normalized.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !normalized.pop() {
                        return None;
                    }
                }
                Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        Some(normalized)
    }
}

/// Ordered, read-only list of staging rules. Execution follows insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    rules: Vec<StageRule>,
}

impl Manifest {
    pub fn builder() -> ManifestBuilder {
        ManifestBuilder::default()
    }

    pub fn rules(&self) -> &[StageRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Documentation plus the public and private header sets the SDK ships.
    pub fn sdk_default() -> Self {
        let mut builder = Manifest::builder();

        builder
            .add_rule(
                "$(EngineDir)/Source/Programs/Enterprise/Datasmith/DatasmithSDK/Documentation",
                "*.*",
                "Documentation",
            )
            // Public API headers
            .add_rule("$(EngineDir)/Source/Runtime/Datasmith/DatasmithCore/Public", "*.h", "Public")
            .add_rule("$(EngineDir)/Source/Runtime/Datasmith/DirectLink/Public", "*.h", "Public")
            .add_rule("$(EngineDir)/Source/Developer/Datasmith/DatasmithExporter/Public", "*.h", "Public")
            // Headers the SDK depends on but does not expose
            .add_rule("$(EngineDir)/Source/Runtime/TraceLog/Public", "*.*", "Private")
            .add_rule("$(EngineDir)/Source/Runtime/Messaging/Public", "*.h", "Private")
            .add_rule("$(EngineDir)/Source/Runtime/Core/Public", "*.*", "Private")
            .add_rule("$(EngineDir)/Source/Runtime/CoreUObject/Public", "*.h", "Private");

        builder.build()
    }

    pub fn read(path: &Path) -> StageResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| StageError::ManifestRead {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| StageError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a StageRule;
    type IntoIter = std::slice::Iter<'a, StageRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

#[derive(Debug, Default)]
pub struct ManifestBuilder {
    rules: Vec<StageRule>,
}

impl ManifestBuilder {
    /// Appends a rule. Paths are not checked here; they are resolved against
    /// the filesystem when the manifest is staged.
    pub fn add_rule(
        &mut self,
        source_dir: impl Into<String>,
        file_mask: impl Into<String>,
        destination: impl Into<String>,
    ) -> &mut Self {
        self.rules.push(StageRule {
            source_dir: source_dir.into(),
            file_mask: FileMask::new(file_mask),
            destination: destination.into(),
        });
        self
    }

    pub fn build(self) -> Manifest {
        Manifest { rules: self.rules }
    }
}
