//! Static package metadata handed to the packaging subsystem.

use serde::{Deserialize, Serialize};

/// Package metadata record. Built once per run and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub author_email: String,
    /// Package identifiers included in the distribution
    pub packages: Vec<String>,
    /// Glob patterns for data files shipped inside every package
    pub package_data: Vec<String>,
}

impl Default for PackageMetadata {
    fn default() -> Self {
        Self {
            name: "microbepy".to_string(),
            version: "1.0".to_string(),
            description: "Python support for analysis of Microbial Communities".to_string(),
            author: "Joseph Hellerstein".to_string(),
            author_email: "jlheller@uw.edu".to_string(),
            packages: vec!["microbepy".to_string()],
            package_data: vec!["*.db".to_string()],
        }
    }
}

impl PackageMetadata {
    /// Environment variables describing this record.
    ///
    /// List fields are comma-joined; the full record is also provided as
    /// JSON under `PKG_METADATA_JSON`.
    pub fn to_env_vars(&self) -> Vec<(String, String)> {
        let mut vars = vec![
            ("PKG_NAME".to_string(), self.name.clone()),
            ("PKG_VERSION".to_string(), self.version.clone()),
            ("PKG_DESCRIPTION".to_string(), self.description.clone()),
            ("PKG_AUTHOR".to_string(), self.author.clone()),
            ("PKG_AUTHOR_EMAIL".to_string(), self.author_email.clone()),
            ("PKG_PACKAGES".to_string(), self.packages.join(",")),
            ("PKG_PACKAGE_DATA".to_string(), self.package_data.join(",")),
        ];

        // Serializing plain strings cannot fail
        if let Ok(json) = serde_json::to_string(self) {
            vars.push(("PKG_METADATA_JSON".to_string(), json));
        }

        vars
    }
}
