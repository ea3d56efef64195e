use std::fmt;
use std::str::FromStr;

/// Operating systems the Go toolchain can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Aix,
  Android,
  Darwin,
  Dragonfly,
  Freebsd,
  Illumos,
  Ios,
  Js,
  Linux,
  Netbsd,
  Openbsd,
  Plan9,
  Solaris,
  Wasip1,
  Windows,
}

impl Os {
  /// Every supported operating system, in `go tool dist list` order
  pub const ALL: [Os; 15] = [
    Self::Aix,
    Self::Android,
    Self::Darwin,
    Self::Dragonfly,
    Self::Freebsd,
    Self::Illumos,
    Self::Ios,
    Self::Js,
    Self::Linux,
    Self::Netbsd,
    Self::Openbsd,
    Self::Plan9,
    Self::Solaris,
    Self::Wasip1,
    Self::Windows,
  ];

  /// Detect the host operating system at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "aix" => Some(Self::Aix),
      "android" => Some(Self::Android),
      "macos" => Some(Self::Darwin),
      "dragonfly" => Some(Self::Dragonfly),
      "freebsd" => Some(Self::Freebsd),
      "illumos" => Some(Self::Illumos),
      "ios" => Some(Self::Ios),
      "linux" => Some(Self::Linux),
      "netbsd" => Some(Self::Netbsd),
      "openbsd" => Some(Self::Openbsd),
      "solaris" => Some(Self::Solaris),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  /// Returns the `GOOS` identifier for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Aix => "aix",
      Self::Android => "android",
      Self::Darwin => "darwin",
      Self::Dragonfly => "dragonfly",
      Self::Freebsd => "freebsd",
      Self::Illumos => "illumos",
      Self::Ios => "ios",
      Self::Js => "js",
      Self::Linux => "linux",
      Self::Netbsd => "netbsd",
      Self::Openbsd => "openbsd",
      Self::Plan9 => "plan9",
      Self::Solaris => "solaris",
      Self::Wasip1 => "wasip1",
      Self::Windows => "windows",
    }
  }

  /// Suffix the toolchain gives executables for this OS
  pub fn exe_suffix(&self) -> &'static str {
    match self {
      Self::Windows => ".exe",
      _ => "",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Os {
  type Err = UnknownOs;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|os| os.as_str() == s)
      .ok_or_else(|| UnknownOs(s.to_string()))
  }
}

/// Returned when a string does not name a supported operating system.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported operating system: {0}")]
pub struct UnknownOs(pub String);

/// Returns true if `value` names a supported operating system
pub fn is_os(value: &str) -> bool {
  value.parse::<Os>().is_ok()
}
