//! Tree addresses and their path-string encoding
//!
//! An [`Address`] names a node by the ordered segment names leading from the
//! results root to it. On the wire an address is either a JSON array of
//! segments or a single `/`-joined path string. A segment that itself
//! contains `/` must be wrapped in double quotes by the caller; the quotes are
//! part of the segment and survive a round trip.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use core::fmt;
use core::ops::Deref;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Path separator between address segments
pub const SEPARATOR: char = '/';

/// Prefix of option keys that belong to result nodes
const OPTION_KEY_PREFIX: &str = "results";

// ----------------------------------------------------------------------------
// Address
// ----------------------------------------------------------------------------

/// Ordered path of node names from the results root (optimized for shallow trees)
///
/// The empty address names the results root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(SmallVec<[String; 4]>);

impl Address {
    /// The address of the results root
    pub fn root() -> Self {
        Self(SmallVec::new())
    }

    /// Whether this address names the results root
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a segment
    pub fn push<S: Into<String>>(&mut self, segment: S) {
        self.0.push(segment.into());
    }

    /// Encode as a single path string
    pub fn flatten(&self) -> String {
        flatten(&self.0)
    }

    /// Key under which the host stores the option `name` of this node
    pub fn option_key(&self, name: &str) -> String {
        let mut key = String::from(OPTION_KEY_PREFIX);
        key.push(SEPARATOR);
        key.push_str(&self.flatten());
        key.push(SEPARATOR);
        key.push_str(name);
        key
    }
}

impl Deref for Address {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for Address {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<String>> for Address {
    fn from(segments: Vec<String>) -> Self {
        Self(SmallVec::from_vec(segments))
    }
}

impl From<&[&str]> for Address {
    fn from(segments: &[&str]) -> Self {
        segments.iter().copied().collect()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flatten())
    }
}

// ----------------------------------------------------------------------------
// Codec
// ----------------------------------------------------------------------------

/// Join segments with the separator. No escaping is applied.
pub fn flatten<S: AsRef<str>>(segments: &[S]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        out.push_str(segment.as_ref());
    }
    out
}

/// Split a path string on the separator, keeping double-quoted runs whole
///
/// Single left-to-right scan: a `"` followed by at least one non-quote
/// character and a closing `"` is captured as one segment, quotes included;
/// otherwise a maximal run of non-separator characters is captured. There
/// is no escape for a literal quote inside a quoted run. An empty path, or
/// one made only of separators, yields the root address.
pub fn unflatten(path: &str) -> Address {
    let bytes = path.as_bytes();
    let len = bytes.len();
    let mut segments = Address::root();
    let mut i = 0;

    while i < len {
        if bytes[i] == b'"' {
            if let Some(offset) = path[i + 1..].find('"') {
                if offset > 0 {
                    let end = i + offset + 2;
                    segments.push(&path[i..end]);
                    i = end;
                    continue;
                }
            }
        }

        if bytes[i] == b'/' {
            i += 1;
            continue;
        }

        let end = path[i..].find(SEPARATOR).map_or(len, |offset| i + offset);
        segments.push(&path[i..end]);
        i = end;
    }

    segments
}

/// Encode a segment the way rendered nodes carry it in their name attribute
pub fn encode_name(segment: &str) -> String {
    STANDARD.encode(segment.as_bytes())
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
