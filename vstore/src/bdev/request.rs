//! Identity and provisioning parameters of a block device.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use vstore_shared::DiskTemplate;
use vstore_shared::constants::drivers;
use vstore_shared::errors::{VstoreError, VstoreResult};

const KNOWN_DRIVERS: [&str; 3] = [drivers::LOOP, drivers::BLKTAP, drivers::BLKTAP2];

/// `(driver, path)` pair naming a file-backed disk.
///
/// Travels as a two-element JSON array. For Gluster disks the path is
/// relative to the volume root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct UniqueId {
    driver: String,
    path: String,
}

impl UniqueId {
    pub fn new(driver: impl Into<String>, path: impl Into<String>) -> VstoreResult<Self> {
        let driver = driver.into();
        if !KNOWN_DRIVERS.contains(&driver.as_str()) {
            return Err(VstoreError::Programmer(format!(
                "Unknown file driver '{}'. Supported: {}",
                driver,
                KNOWN_DRIVERS.join(", ")
            )));
        }
        Ok(Self {
            driver,
            path: path.into(),
        })
    }

    pub fn driver(&self) -> &str {
        &self.driver
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl TryFrom<Vec<String>> for UniqueId {
    type Error = VstoreError;

    fn try_from(parts: Vec<String>) -> Result<Self, Self::Error> {
        match <[String; 2]>::try_from(parts) {
            Ok([driver, path]) => Self::new(driver, path),
            Err(parts) => Err(VstoreError::Programmer(format!(
                "Invalid configuration data {:?}",
                parts
            ))),
        }
    }
}

impl From<UniqueId> for Vec<String> {
    fn from(id: UniqueId) -> Self {
        vec![id.driver, id.path]
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.driver, self.path)
    }
}

/// Everything the configuration layer hands over to build a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRequest {
    pub template: DiskTemplate,
    pub unique_id: UniqueId,
    #[serde(default)]
    pub size_mib: u64,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default)]
    pub dyn_params: BTreeMap<String, String>,
    /// File-based devices are leaves; any child is a setup error.
    #[serde(default)]
    pub children: Vec<UniqueId>,
    #[serde(default)]
    pub exclusive_storage: bool,
}

impl DeviceRequest {
    pub fn new(template: DiskTemplate, unique_id: UniqueId, size_mib: u64) -> Self {
        Self {
            template,
            unique_id,
            size_mib,
            params: BTreeMap::new(),
            dyn_params: BTreeMap::new(),
            children: Vec::new(),
            exclusive_storage: false,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Reject child devices.
    pub fn check_leaf(&self) -> VstoreResult<()> {
        if !self.children.is_empty() {
            return Err(VstoreError::BlockDevice(
                "Invalid setup for file device".to_string(),
            ));
        }
        Ok(())
    }

    /// Reject requests a file backend can never create.
    pub fn check_creatable(&self) -> VstoreResult<()> {
        if self.exclusive_storage {
            return Err(VstoreError::Programmer(format!(
                "{} device requested with exclusive_storage",
                self.template
            )));
        }
        self.check_leaf()
    }
}

/// Flags accompanying a grow request.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GrowOptions {
    /// Only check that the grow would work.
    pub dry_run: bool,
    /// Grow the backing storage. File devices do nothing without it.
    pub backing_store: bool,
    pub excl_stor: bool,
}

impl GrowOptions {
    /// Really grow the backing file.
    pub fn backing_store() -> Self {
        Self {
            dry_run: false,
            backing_store: true,
            excl_stor: false,
        }
    }

    /// Whether a file device has to touch its file.
    pub fn touches_file(&self) -> bool {
        self.backing_store && !self.dry_run
    }
}
