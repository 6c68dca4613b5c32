//! Just enough semantic versioning to classify a dependency bump.
//!
//! Classification follows npm's `semver.diff`: moving to a pre-release
//! yields the `pre*` kinds, and leaving a pre-release of `X.0.0` for a
//! release is a major bump.

use std::cmp::Ordering;
use std::fmt;

/// One dot-separated pre-release identifier. Numeric identifiers sort
/// before alphanumeric ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Identifier {
    Numeric(u64),
    Alpha(String),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(n) => write!(f, "{}", n),
            Identifier::Alpha(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Vec<Identifier>,
}

impl Version {
    /// Lenient parse: a leading `v` is accepted, missing minor or patch
    /// components count as zero, build metadata and anything after the
    /// first whitespace are ignored.
    pub fn parse(input: &str) -> Option<Self> {
        let token = input.split_whitespace().next()?;
        let token = token
            .strip_prefix('v')
            .or_else(|| token.strip_prefix('V'))
            .unwrap_or(token);
        let token = token.split('+').next().unwrap_or(token);

        let (core, pre) = match token.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (token, None),
        };

        let mut parts = core.splitn(3, '.');
        let major = parts.next()?.parse().ok()?;
        let minor = match parts.next() {
            Some(p) => p.parse().ok()?,
            None => 0,
        };
        let patch = match parts.next() {
            Some(p) => p.parse().ok()?,
            None => 0,
        };

        let pre = match pre {
            Some(pre) => pre
                .split('.')
                .map(parse_identifier)
                .collect::<Option<Vec<_>>>()?,
            None => Vec::new(),
        };

        Some(Self {
            major,
            minor,
            patch,
            pre,
        })
    }

    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }

    fn main(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

fn parse_identifier(raw: &str) -> Option<Identifier> {
    if raw.is_empty() {
        return None;
    }
    if raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw.parse().ok().map(Identifier::Numeric);
    }
    if raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        return Some(Identifier::Alpha(raw.to_string()));
    }
    None
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.main().cmp(&other.main()).then_with(|| {
            match (self.is_prerelease(), other.is_prerelease()) {
                (false, false) => Ordering::Equal,
                (false, true) => Ordering::Greater,
                (true, false) => Ordering::Less,
                (true, true) => self.pre.cmp(&other.pre),
            }
        })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        for (i, id) in self.pre.iter().enumerate() {
            f.write_str(if i == 0 { "-" } else { "." })?;
            write!(f, "{}", id)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateType {
    Major,
    Minor,
    Patch,
    Premajor,
    Preminor,
    Prepatch,
    Prerelease,
}

impl UpdateType {
    fn into_pre(self) -> Self {
        match self {
            UpdateType::Major => UpdateType::Premajor,
            UpdateType::Minor => UpdateType::Preminor,
            UpdateType::Patch => UpdateType::Prepatch,
            other => other,
        }
    }
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UpdateType::Major => "major",
            UpdateType::Minor => "minor",
            UpdateType::Patch => "patch",
            UpdateType::Premajor => "premajor",
            UpdateType::Preminor => "preminor",
            UpdateType::Prepatch => "prepatch",
            UpdateType::Prerelease => "prerelease",
        })
    }
}

/// Kind of change between two versions, in either direction.
///
/// Returns `None` when either side does not parse. Identical versions are
/// reported as a patch.
pub fn diff(old: &str, new: &str) -> Option<UpdateType> {
    let old = Version::parse(old)?;
    let new = Version::parse(new)?;

    let (low, high) = match old.cmp(&new) {
        Ordering::Equal => return Some(UpdateType::Patch),
        Ordering::Less => (&old, &new),
        Ordering::Greater => (&new, &old),
    };

    if low.is_prerelease() && !high.is_prerelease() {
        if low.minor == 0 && low.patch == 0 {
            return Some(UpdateType::Major);
        }
        if low.main() == high.main() {
            return Some(if low.minor != 0 && low.patch == 0 {
                UpdateType::Minor
            } else {
                UpdateType::Patch
            });
        }
    }

    let kind = if old.major != new.major {
        UpdateType::Major
    } else if old.minor != new.minor {
        UpdateType::Minor
    } else if old.patch != new.patch {
        UpdateType::Patch
    } else {
        return Some(UpdateType::Prerelease);
    };

    Some(if high.is_prerelease() { kind.into_pre() } else { kind })
}
