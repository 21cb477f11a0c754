//! Package lookups over Android's `packages.xml`.
//!
//! The package manager persists installed packages as `<package>` children of
//! a `<packages>` root, each carrying at least `name` and `codePath`
//! attributes. These helpers answer "which package lives at this install
//! path" without the caller walking the tree by hand.

use crate::{AbxError, Document, Element, Result};
use std::borrow::Cow;

/// Where the package manager keeps its state on a device.
pub const DEFAULT_PACKAGES_PATH: &str = "/data/system/packages.xml";

/// Code paths at or above this length are rejected outright.
pub const MAX_CODE_PATH_LEN: usize = 1024;

const ROOT_TAG: &[u8] = b"packages";
const PACKAGE_TAG: &[u8] = b"package";
const NAME_ATTRIBUTE: &str = "name";
const CODE_PATH_ATTRIBUTE: &str = "codePath";

/// One `<package>` entry borrowed from a decoded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageRecord<'a> {
    pub name: &'a [u8],
    pub code_path: &'a [u8],
}

impl<'a> PackageRecord<'a> {
    fn from_element(element: Element<'a>) -> Option<Self> {
        if element.tag_name() != PACKAGE_TAG {
            return None;
        }
        let name = element.find_attribute(NAME_ATTRIBUTE)?;
        let code_path = element.find_attribute(CODE_PATH_ATTRIBUTE)?;
        Some(Self {
            name: name.value(),
            code_path: code_path.value(),
        })
    }

    pub fn name_lossy(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.name)
    }

    pub fn code_path_lossy(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.code_path)
    }
}

/// All packages carrying both a name and a code path, in document order.
pub fn packages(document: &Document) -> Result<impl Iterator<Item = PackageRecord<'_>>> {
    let root = document.root();
    if root.tag_name() != ROOT_TAG {
        return Err(AbxError::UnexpectedRoot {
            found: root.tag_name_lossy().into_owned(),
        });
    }
    Ok(root.children().filter_map(PackageRecord::from_element))
}

/// Find the package installed at exactly `code_path`.
pub fn find_package_by_code_path(
    document: &Document,
    code_path: impl AsRef<[u8]>,
) -> Result<Option<PackageRecord<'_>>> {
    let code_path = code_path.as_ref();
    if code_path.is_empty() || code_path.len() >= MAX_CODE_PATH_LEN {
        return Err(AbxError::InvalidCodePath {
            len: code_path.len(),
        });
    }

    let found = packages(document)?.find(|package| package.code_path == code_path);
    match &found {
        Some(package) => log::debug!(
            "{} is installed at {}",
            package.name_lossy(),
            package.code_path_lossy()
        ),
        None => log::debug!("No package at {}", String::from_utf8_lossy(code_path)),
    }
    Ok(found)
}
