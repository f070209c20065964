//! Hardware vendor lookup by OUI.
//!
//! The lookup key is the modalias the device database uses for OUIs,
//! `OUI:` followed by the twelve upper-case hex digits of the hardware
//! address. [`HwdbFile`] answers it from the hwdb source text shipped with
//! the device manager, e.g.:
//!
//! ```text
//! OUI:001A2B*
//!  ID_OUI_FROM_DATABASE=Ayecom Technology Co., Ltd.
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use glob::Pattern;

use crate::netlink::Result;
use crate::util::addr::MacAddr;

/// Property holding the vendor name in the OUI database.
pub const OUI_PROPERTY: &str = "ID_OUI_FROM_DATABASE";

/// A keyed vendor description source.
///
/// A miss is `None`, never an error.
pub trait VendorDatabase {
    fn lookup(&self, key: &str) -> Option<String>;
}

impl<V: VendorDatabase + ?Sized> VendorDatabase for &V {
    fn lookup(&self, key: &str) -> Option<String> {
        (**self).lookup(key)
    }
}

/// An absent database knows no vendor.
impl<V: VendorDatabase> VendorDatabase for Option<V> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.as_ref().and_then(|db| db.lookup(key))
    }
}

impl VendorDatabase for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// The OUI database parsed from hwdb source text.
#[derive(Debug, Default)]
pub struct HwdbFile {
    exact: HashMap<String, String>,
    /// Keyed by the pattern with its trailing `*` removed.
    prefixes: HashMap<String, String>,
    /// Patterns with other wildcards, checked in file order.
    globs: Vec<(Pattern, String)>,
    longest_prefix: usize,
}

impl HwdbFile {
    /// Load a hwdb source file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let db = Self::parse(&text);
        tracing::debug!(path = %path.display(), entries = db.len(), "loaded vendor database");
        Ok(db)
    }

    /// Parse hwdb source text, keeping only the OUI vendor property.
    ///
    /// Match lines start in the first column; property lines are indented
    /// and apply to every match line of the current block. Blank lines end
    /// a block. Unparseable lines are ignored.
    pub fn parse(text: &str) -> Self {
        let mut db = Self::default();
        let mut matches: Vec<&str> = Vec::new();
        let mut in_properties = false;

        for line in text.lines() {
            if line.trim().is_empty() {
                matches.clear();
                in_properties = false;
                continue;
            }
            if line.starts_with('#') {
                continue;
            }

            if !line.starts_with(char::is_whitespace) {
                if in_properties {
                    matches.clear();
                    in_properties = false;
                }
                matches.push(line.trim_end());
                continue;
            }

            in_properties = true;
            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            if key != OUI_PROPERTY {
                continue;
            }
            for pattern in &matches {
                db.insert(pattern, value);
            }
        }

        db
    }

    fn insert(&mut self, pattern: &str, value: &str) {
        let value = value.to_string();

        if let Some(prefix) = pattern.strip_suffix('*')
            && !prefix.contains(['*', '?', '['])
        {
            self.longest_prefix = self.longest_prefix.max(prefix.len());
            self.prefixes.insert(prefix.to_string(), value);
        } else if !pattern.contains(['*', '?', '[']) {
            self.exact.insert(pattern.to_string(), value);
        } else if let Ok(glob) = Pattern::new(pattern) {
            self.globs.push((glob, value));
        } else {
            tracing::debug!(pattern, "ignoring invalid hwdb match");
        }
    }

    /// Number of match patterns carrying a vendor.
    pub fn len(&self) -> usize {
        self.exact.len() + self.prefixes.len() + self.globs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl VendorDatabase for HwdbFile {
    /// Exact matches win, then the longest matching prefix, then the first
    /// other pattern that matches.
    fn lookup(&self, key: &str) -> Option<String> {
        if let Some(value) = self.exact.get(key) {
            return Some(value.clone());
        }

        let longest = self.longest_prefix.min(key.len());
        let by_prefix = (0..=longest)
            .rev()
            .filter(|&len| key.is_char_boundary(len))
            .find_map(|len| self.prefixes.get(&key[..len]));
        if let Some(value) = by_prefix {
            return Some(value.clone());
        }

        self.globs
            .iter()
            .find(|(pattern, _)| pattern.matches(key))
            .map(|(_, value)| value.clone())
    }
}

/// The database key for a hardware address.
pub fn oui_key(mac: &MacAddr) -> String {
    let hex: String = mac.octets().iter().map(|b| format!("{:02X}", b)).collect();
    format!("OUI:{}", hex)
}

/// Describe the vendor of a hardware address.
///
/// The `00:00:00` prefix is commonly misused and never looked up.
pub fn oui_description<V: VendorDatabase + ?Sized>(db: &V, mac: &MacAddr) -> Option<String> {
    if mac.oui() == [0, 0, 0] {
        return None;
    }
    db.lookup(&oui_key(mac))
}
