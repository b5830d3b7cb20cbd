//! Serde support for paths that may not be valid UTF-8.
//!
//! A path that is valid UTF-8 is written as a plain JSON string, so
//! ordinary archives and caches stay readable. Any other path is written as
//! an array of its raw OS units (bytes on Unix, UTF-16 code units on
//! Windows) and read back exactly.
//!
//! Use the module with `#[serde(with = "path_codec")]` on a path field, or
//! [`many`] on a list of paths. [`EncodedPath`] and [`DecodedPath`] cover
//! hand-written impls.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[cfg(unix)]
type Unit = u8;
#[cfg(windows)]
type Unit = u16;
#[cfg(not(any(unix, windows)))]
type Unit = u8;

#[cfg(unix)]
fn to_units(path: &Path) -> Vec<Unit> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(unix)]
fn from_units(units: Vec<Unit>) -> PathBuf {
    use std::os::unix::ffi::OsStringExt;
    PathBuf::from(OsString::from_vec(units))
}

#[cfg(windows)]
fn to_units(path: &Path) -> Vec<Unit> {
    use std::os::windows::ffi::OsStrExt;
    path.as_os_str().encode_wide().collect()
}

#[cfg(windows)]
fn from_units(units: Vec<Unit>) -> PathBuf {
    use std::os::windows::ffi::OsStringExt;
    PathBuf::from(OsString::from_wide(&units))
}

#[cfg(not(any(unix, windows)))]
fn to_units(path: &Path) -> Vec<Unit> {
    path.to_string_lossy().into_owned().into_bytes()
}

#[cfg(not(any(unix, windows)))]
fn from_units(units: Vec<Unit>) -> PathBuf {
    PathBuf::from(OsString::from(String::from_utf8_lossy(&units).into_owned()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Encoded {
    Text(String),
    Units(Vec<Unit>),
}

impl From<Encoded> for PathBuf {
    fn from(encoded: Encoded) -> Self {
        match encoded {
            Encoded::Text(text) => PathBuf::from(text),
            Encoded::Units(units) => from_units(units),
        }
    }
}

/// Serialize a path as a string, or as raw units if it isn't UTF-8.
///
/// # Errors
///
/// Returns the serializer's error.
pub fn serialize<P, S>(path: &P, serializer: S) -> Result<S::Ok, S::Error>
where
    P: AsRef<Path> + ?Sized,
    S: Serializer,
{
    let path = path.as_ref();
    match path.to_str() {
        Some(text) => serializer.serialize_str(text),
        None => serializer.collect_seq(to_units(path)),
    }
}

/// Deserialize a path written by [`serialize`].
///
/// # Errors
///
/// Returns the deserializer's error if the value is neither form.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PathBuf, D::Error> {
    Encoded::deserialize(deserializer).map(PathBuf::from)
}

/// A borrowed path that serializes through this codec.
#[derive(Debug, Clone, Copy)]
pub struct EncodedPath<'a>(pub &'a Path);

impl Serialize for EncodedPath<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize(self.0, serializer)
    }
}

/// An owned path that deserializes through this codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPath(pub PathBuf);

impl<'de> Deserialize<'de> for DecodedPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize(deserializer).map(Self)
    }
}

/// The codec applied to each path of a list.
pub mod many {
    use super::{DecodedPath, EncodedPath};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::path::PathBuf;

    /// Serialize every path in `paths`.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error.
    pub fn serialize<S: Serializer>(paths: &[PathBuf], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(paths.iter().map(|p| EncodedPath(p.as_path())))
    }

    /// Deserialize a list written by [`serialize`].
    ///
    /// # Errors
    ///
    /// Returns the deserializer's error if any element is malformed.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<PathBuf>, D::Error> {
        let decoded = Vec::<DecodedPath>::deserialize(deserializer)?;
        Ok(decoded.into_iter().map(|p| p.0).collect())
    }
}
