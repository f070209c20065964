//! Device properties from the device manager database and sysfs.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::config::Paths;
use crate::link::LinkInfo;
use crate::netlink::types::link::arphrd_name;

/// Properties of a network device. Each one is looked up on its own and
/// may be missing independently of the others.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceProperties {
    /// `.link` file that configured the device.
    pub link_file: Option<String>,
    pub driver: Option<String>,
    /// Persistent device path, e.g. `pci-0000:00:1f.6`.
    pub path: Option<String>,
    pub vendor: Option<String>,
    pub model: Option<String>,
    /// Kernel device type, e.g. `wlan` or `bridge`.
    pub devtype: Option<String>,
}

fn read_source(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "could not read device properties");
            None
        }
    }
}

/// Parse `E:KEY=VALUE` property lines of a device database entry.
fn parse_database(text: &str) -> HashMap<String, String> {
    text.lines()
        .filter_map(|line| line.strip_prefix("E:"))
        .filter_map(|prop| prop.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Find `DEVTYPE=` in a sysfs uevent file.
fn parse_devtype(uevent: &str) -> Option<String> {
    uevent
        .lines()
        .find_map(|line| line.strip_prefix("DEVTYPE="))
        .filter(|devtype| !devtype.is_empty())
        .map(str::to_string)
}

impl DeviceProperties {
    /// Load the properties of `link`; `None` when the device is unknown to
    /// both the database and sysfs.
    ///
    /// The two sources are read independently: one that cannot be read is
    /// logged and treated as absent without losing the other.
    pub fn load(paths: &Paths, link: &LinkInfo) -> Option<Self> {
        let database = read_source(&paths.udev_data_dir.join(format!("n{}", link.index)));
        let uevent = read_source(&paths.sysfs_net_dir.join(&link.name).join("uevent"));

        if database.is_none() && uevent.is_none() {
            return None;
        }

        let mut device = Self::from_database(database.as_deref().unwrap_or_default());
        device.devtype = uevent.as_deref().and_then(parse_devtype);
        Some(device)
    }

    /// Properties from the text of a device database entry.
    pub fn from_database(text: &str) -> Self {
        let props = parse_database(text);
        let get = |key: &str| props.get(key).filter(|v| !v.is_empty()).cloned();

        Self {
            link_file: get("ID_NET_LINK_FILE"),
            driver: get("ID_NET_DRIVER"),
            path: get("ID_PATH"),
            vendor: get("ID_VENDOR_FROM_DATABASE").or_else(|| get("ID_VENDOR")),
            model: get("ID_MODEL_FROM_DATABASE").or_else(|| get("ID_MODEL")),
            devtype: None,
        }
    }
}

/// Human readable link type: the device type when the kernel reports one,
/// otherwise the hardware type name.
pub fn link_type_string(iftype: u16, device: Option<&DeviceProperties>) -> Option<String> {
    device
        .and_then(|d| d.devtype.clone())
        .or_else(|| arphrd_name(iftype).map(str::to_string))
}
