//! Disks stored as plain files on local storage.

use std::path::Path;

use vstore_shared::DiskTemplate;
use vstore_shared::errors::{VstoreError, VstoreResult};

use super::{BlockDevice, DeviceRequest, GrowOptions, UniqueId};
use crate::disk::{CreateOptions, FileHandle};
use crate::pathcheck::PathPolicy;

/// A local file backing one disk.
///
/// A file is always ready once present, so open, close and shutdown do
/// nothing.
#[derive(Debug)]
pub struct FileStorage {
    unique_id: UniqueId,
    size_mib: u64,
    file: FileHandle,
    attached: bool,
}

impl FileStorage {
    /// Bind to the (possibly missing) file named by `request`.
    pub fn new(request: &DeviceRequest, policy: &PathPolicy) -> VstoreResult<Self> {
        request.check_leaf()?;
        let template = local_template(request.template)?;
        let file = FileHandle::open(request.unique_id.path(), template, policy)?;
        Self::with_file(request, file)
    }

    /// Create the backing file with the requested size.
    pub fn create(request: &DeviceRequest, policy: &PathPolicy) -> VstoreResult<Self> {
        request.check_creatable()?;
        let template = local_template(request.template)?;
        let file = FileHandle::new(
            request.unique_id.path(),
            template,
            policy,
            CreateOptions::with_size(request.size_mib),
        )?;
        Self::with_file(request, file)
    }

    fn with_file(request: &DeviceRequest, file: FileHandle) -> VstoreResult<Self> {
        let mut device = Self {
            unique_id: request.unique_id.clone(),
            size_mib: request.size_mib,
            file,
            attached: false,
        };
        device.attach()?;
        Ok(device)
    }

    pub fn file(&self) -> &FileHandle {
        &self.file
    }
}

fn local_template(template: DiskTemplate) -> VstoreResult<DiskTemplate> {
    match template {
        DiskTemplate::File | DiskTemplate::SharedFile => Ok(template),
        other => Err(VstoreError::Programmer(format!(
            "Local file device requested for template {}",
            other
        ))),
    }
}

impl BlockDevice for FileStorage {
    fn unique_id(&self) -> &UniqueId {
        &self.unique_id
    }

    fn size_mib(&self) -> u64 {
        self.size_mib
    }

    fn dev_path(&self) -> &Path {
        self.file.path()
    }

    fn assemble(&mut self) -> VstoreResult<()> {
        self.file.exists(Some(true)).map(|_| ())
    }

    fn attach(&mut self) -> VstoreResult<bool> {
        self.attached = self.file.exists(None)?;
        Ok(self.attached)
    }

    fn is_attached(&self) -> bool {
        self.attached
    }

    fn open(&mut self, _force: bool) -> VstoreResult<()> {
        Ok(())
    }

    fn close(&mut self) -> VstoreResult<()> {
        Ok(())
    }

    fn shutdown(&mut self) -> VstoreResult<()> {
        Ok(())
    }

    fn remove(&mut self) -> VstoreResult<bool> {
        self.file.remove()?;
        Ok(true)
    }

    fn rename(&mut self, _new_id: &UniqueId) -> VstoreResult<()> {
        Err(VstoreError::Programmer(
            "Rename is not supported for file-based storage".to_string(),
        ))
    }

    fn grow(&mut self, amount_mib: i64, options: GrowOptions) -> VstoreResult<()> {
        if !options.touches_file() {
            return Ok(());
        }
        self.file.grow(amount_mib)
    }

    fn actual_size(&self) -> VstoreResult<u64> {
        self.file.size()
    }
}
