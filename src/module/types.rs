use serde::{Deserialize, Serialize};

/// Response shape for a module version listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleVersionList {
    pub modules: Vec<ModuleVersions>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleVersions {
    pub versions: Vec<ModuleVersion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleVersion {
    pub version: String,
}

/// Where the source archive for a module version can be fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDownload {
    pub location: String,
}

impl ModuleVersionList {
    pub fn new(versions: Vec<String>) -> Self {
        Self {
            modules: vec![ModuleVersions {
                versions: versions
                    .into_iter()
                    .map(|version| ModuleVersion { version })
                    .collect(),
            }],
        }
    }
}
