//! Filesystem locations of the runtime state this crate reads.

use std::path::{Path, PathBuf};

/// Directory of per-link LLDP neighbor stores.
pub const LLDP_DIR: &str = "/run/systemd/netif/lldp";
/// Directory of per-link network manager state files.
pub const LINK_STATE_DIR: &str = "/run/systemd/netif/links";
/// Global network manager state file.
pub const STATE_FILE: &str = "/run/systemd/netif/state";
/// Device manager property database.
pub const UDEV_DATA_DIR: &str = "/run/udev/data";
/// Kernel network device directory.
pub const SYSFS_NET_DIR: &str = "/sys/class/net";
/// OUI vendor database source.
pub const HWDB_OUI: &str = "/usr/lib/udev/hwdb.d/20-OUI.hwdb";

/// Where to find runtime state (default: the standard system locations).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub lldp_dir: PathBuf,
    pub link_state_dir: PathBuf,
    pub state_file: PathBuf,
    pub udev_data_dir: PathBuf,
    pub sysfs_net_dir: PathBuf,
    pub hwdb: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            lldp_dir: LLDP_DIR.into(),
            link_state_dir: LINK_STATE_DIR.into(),
            state_file: STATE_FILE.into(),
            udev_data_dir: UDEV_DATA_DIR.into(),
            sysfs_net_dir: SYSFS_NET_DIR.into(),
            hwdb: HWDB_OUI.into(),
        }
    }
}

impl Paths {
    /// Every location below `root`, keeping the standard layout.
    ///
    /// Useful for reading state captured from another system.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let rebase = |path: &str| root.join(path.trim_start_matches('/'));
        Self {
            lldp_dir: rebase(LLDP_DIR),
            link_state_dir: rebase(LINK_STATE_DIR),
            state_file: rebase(STATE_FILE),
            udev_data_dir: rebase(UDEV_DATA_DIR),
            sysfs_net_dir: rebase(SYSFS_NET_DIR),
            hwdb: rebase(HWDB_OUI),
        }
    }

    pub fn with_lldp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lldp_dir = dir.into();
        self
    }

    /// Set the per-link state directory; the global state file is expected
    /// next to it.
    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.state_file = dir
            .parent()
            .map(|parent| parent.join("state"))
            .unwrap_or_else(|| PathBuf::from("state"));
        self.link_state_dir = dir;
        self
    }

    pub fn with_state_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.state_file = file.into();
        self
    }

    pub fn with_udev_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.udev_data_dir = dir.into();
        self
    }

    pub fn with_sysfs_net_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sysfs_net_dir = dir.into();
        self
    }

    pub fn with_hwdb(mut self, file: impl Into<PathBuf>) -> Self {
        self.hwdb = file.into();
        self
    }
}
