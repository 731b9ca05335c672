use std::ffi::CString;

use esp_idf_sys::{esp, esp_vfs_spiffs_conf_t, esp_vfs_spiffs_register};
use log::*;

/// Where the SPIFFS partition holding the badge images is mounted.
pub const MOUNT_POINT: &str = "/spiffs";

/// Mounts the first SPIFFS partition of the partition table at [`MOUNT_POINT`].
pub fn mount_spiffs() -> anyhow::Result<()> {
    let base_path = CString::new(MOUNT_POINT)?;
    let conf = esp_vfs_spiffs_conf_t {
        base_path: base_path.as_ptr(),
        partition_label: core::ptr::null(),
        max_files: 2,
        format_if_mount_failed: false,
    };

    // The VFS copies the base path, `base_path` only has to outlive the call.
    esp!(unsafe { esp_vfs_spiffs_register(&conf) })?;
    info!("SPIFFS mounted at {}", MOUNT_POINT);
    Ok(())
}
