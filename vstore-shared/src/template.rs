//! Disk template tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::templates;
use crate::errors::VstoreError;

/// Selects which backend (and which path policy) serves a virtual disk.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskTemplate {
    /// Plain file on node-local storage.
    File,
    /// File on storage shared between nodes (same lifecycle as `File`).
    #[serde(rename = "sharedfile")]
    SharedFile,
    /// File inside a mounted Gluster volume.
    Gluster,
}

impl DiskTemplate {
    pub const ALL: [DiskTemplate; 3] = [Self::File, Self::SharedFile, Self::Gluster];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiskTemplate::File => templates::FILE,
            DiskTemplate::SharedFile => templates::SHARED_FILE,
            DiskTemplate::Gluster => templates::GLUSTER,
        }
    }

    /// Whether paths for this template come from the admin allow-list.
    pub fn uses_allow_list(&self) -> bool {
        matches!(self, DiskTemplate::File | DiskTemplate::SharedFile)
    }
}

impl fmt::Display for DiskTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiskTemplate {
    type Err = VstoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            templates::FILE => Ok(DiskTemplate::File),
            templates::SHARED_FILE => Ok(DiskTemplate::SharedFile),
            templates::GLUSTER => Ok(DiskTemplate::Gluster),
            _ => Err(VstoreError::Programmer(format!(
                "Unknown disk template: '{}'. Supported: file, sharedfile, gluster",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_tags() {
        for template in DiskTemplate::ALL {
            assert_eq!(template.as_str().parse::<DiskTemplate>().unwrap(), template);
        }
        assert!("drbd".parse::<DiskTemplate>().is_err());
    }

    #[test]
    fn test_allow_list_templates() {
        assert!(DiskTemplate::File.uses_allow_list());
        assert!(DiskTemplate::SharedFile.uses_allow_list());
        assert!(!DiskTemplate::Gluster.uses_allow_list());
    }
}
