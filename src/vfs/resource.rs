/*!
 * Resource Addressing
 * Parses `authority:/path` identifiers into validated, normalized form
 */

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::types::{VfsError, VfsResult};

/// Namespace segment that selects the owning provider
///
/// Follows URI scheme syntax: an ASCII letter followed by letters, digits,
/// `+`, `-` or `.`. Stored lowercase, so `MEM` and `mem` are the same authority.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Authority(String);

impl Authority {
    pub fn new(raw: &str) -> VfsResult<Self> {
        let mut chars = raw.chars();
        match chars.next() {
            None => {
                return Err(VfsError::MalformedAddress("authority cannot be empty".into()));
            }
            Some(c) if !c.is_ascii_alphabetic() => {
                return Err(VfsError::MalformedAddress(format!(
                    "authority must start with a letter: {raw}"
                )));
            }
            Some(_) => {}
        }
        if let Some(bad) = chars.find(|c| !(c.is_ascii_alphanumeric() || matches!(*c, '+' | '-' | '.'))) {
            return Err(VfsError::MalformedAddress(format!(
                "invalid character {bad:?} in authority: {raw}"
            )));
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Authority {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Authority {
    type Err = VfsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Validated resource address
///
/// Two identifiers are equal iff their authorities and normalized paths are
/// equal; surface differences such as repeated or trailing separators do not
/// matter. The canonical text form is `authority:/path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    authority: Authority,
    path: String,
    canonical: String,
}

impl ResourceId {
    /// Parse a raw `authority:/path` string
    pub fn parse(raw: &str) -> VfsResult<Self> {
        let (authority, path) = raw.split_once(':').ok_or_else(|| {
            VfsError::MalformedAddress(format!("missing authority separator ':' in {raw:?}"))
        })?;
        Self::new(&Authority::new(authority)?, path)
    }

    /// Build an identifier from an authority and a raw path
    pub fn new(authority: &Authority, path: &str) -> VfsResult<Self> {
        let path = normalize_path(path)?;
        Ok(Self::from_parts(authority.clone(), path))
    }

    /// The authority root (`authority:/`)
    pub fn root(authority: &Authority) -> Self {
        Self::from_parts(authority.clone(), "/".to_string())
    }

    fn from_parts(authority: Authority, path: String) -> Self {
        let canonical = format!("{}:{}", authority, path);
        Self {
            authority,
            path,
            canonical,
        }
    }

    #[inline]
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Normalized absolute path, always starting with `/`
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.path == "/"
    }

    /// Last path segment; `None` for the root
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            None
        } else {
            self.path.rsplit('/').next()
        }
    }

    /// Containing directory; `None` for the root
    pub fn parent(&self) -> Option<ResourceId> {
        if self.is_root() {
            return None;
        }
        let parent = match self.path.rfind('/') {
            Some(0) | None => "/".to_string(),
            Some(idx) => self.path[..idx].to_string(),
        };
        Some(Self::from_parts(self.authority.clone(), parent))
    }

    /// Child resource named `name`
    ///
    /// `name` must be a single segment: non-empty, no separators, not `.`/`..`.
    pub fn join(&self, name: &str) -> VfsResult<ResourceId> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
            return Err(VfsError::MalformedAddress(format!(
                "invalid path segment {name:?}"
            )));
        }
        let path = if self.is_root() {
            format!("/{name}")
        } else {
            format!("{}/{name}", self.path)
        };
        Ok(Self::from_parts(self.authority.clone(), path))
    }

    /// True if `self` is `other` or lies beneath it
    pub fn starts_with(&self, other: &ResourceId) -> bool {
        if self.authority != other.authority {
            return false;
        }
        if other.is_root() || self.path == other.path {
            return true;
        }
        self.path
            .strip_prefix(other.path.as_str())
            .map(|rest| rest.starts_with('/'))
            .unwrap_or(false)
    }
}

/// Normalize a raw path into absolute, separator-collapsed form
///
/// `.` segments are dropped and `..` pops one segment; popping past the root
/// is an error rather than being clamped.
fn normalize_path(raw: &str) -> VfsResult<String> {
    if raw.contains('\0') {
        return Err(VfsError::MalformedAddress("path cannot contain null bytes".into()));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(VfsError::MalformedAddress(format!(
                        "path escapes the root: {raw:?}"
                    )));
                }
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        Ok("/".to_string())
    } else {
        Ok(format!("/{}", segments.join("/")))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.canonical
    }
}

impl FromStr for ResourceId {
    type Err = VfsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ResourceId::parse(&raw).map_err(serde::de::Error::custom)
    }
}
