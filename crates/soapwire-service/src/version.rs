use std::borrow::Cow;
use std::fmt;

/// Protocol version spoken by the server.
///
/// `api_version` goes into the request header; `major` drives version gating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerVersion {
    pub major: u8,
    pub minor: u8,
    pub api_version: Cow<'static, str>,
}

impl ServerVersion {
    pub const V2007: Self = Self::known(8, 0, "Exchange2007");
    pub const V2007_SP1: Self = Self::known(8, 1, "Exchange2007_SP1");
    pub const V2010: Self = Self::known(14, 0, "Exchange2010");
    pub const V2010_SP1: Self = Self::known(14, 1, "Exchange2010_SP1");
    pub const V2010_SP2: Self = Self::known(14, 2, "Exchange2010_SP2");
    pub const V2013: Self = Self::known(15, 0, "Exchange2013");

    /// Every named version, oldest first.
    pub const ALL: [Self; 6] = [
        Self::V2007,
        Self::V2007_SP1,
        Self::V2010,
        Self::V2010_SP1,
        Self::V2010_SP2,
        Self::V2013,
    ];

    const fn known(major: u8, minor: u8, api_version: &'static str) -> Self {
        Self {
            major,
            minor,
            api_version: Cow::Borrowed(api_version),
        }
    }

    /// A version not in the named set.
    pub fn new(major: u8, minor: u8, api_version: impl Into<String>) -> Self {
        Self {
            major,
            minor,
            api_version: Cow::Owned(api_version.into()),
        }
    }

    /// Look up a named version by its header value (case-insensitive).
    pub fn from_api_version(api_version: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.api_version.eq_ignore_ascii_case(api_version))
    }

    /// True if this server is at least major version `major`.
    pub fn supports(&self, major: u8) -> bool {
        self.major >= major
    }
}

impl Default for ServerVersion {
    fn default() -> Self {
        Self::V2013
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}.{})", self.api_version, self.major, self.minor)
    }
}
