use std::fmt;
use std::str::FromStr;

/// CPU architectures the Go toolchain can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
  I386,
  Amd64,
  Arm,
  Arm64,
  Loong64,
  Mips,
  Mips64,
  Mips64le,
  Mipsle,
  Ppc64,
  Ppc64le,
  Riscv64,
  S390x,
  Wasm,
}

impl Arch {
  /// Every supported architecture, in `go tool dist list` order
  pub const ALL: [Arch; 14] = [
    Self::I386,
    Self::Amd64,
    Self::Arm,
    Self::Arm64,
    Self::Loong64,
    Self::Mips,
    Self::Mips64,
    Self::Mips64le,
    Self::Mipsle,
    Self::Ppc64,
    Self::Ppc64le,
    Self::Riscv64,
    Self::S390x,
    Self::Wasm,
  ];

  /// Detect the host CPU architecture at runtime
  pub fn current() -> Option<Self> {
    let little = cfg!(target_endian = "little");
    match std::env::consts::ARCH {
      "x86" => Some(Self::I386),
      "x86_64" => Some(Self::Amd64),
      "arm" => Some(Self::Arm),
      "aarch64" => Some(Self::Arm64),
      "loongarch64" => Some(Self::Loong64),
      "mips" if little => Some(Self::Mipsle),
      "mips" => Some(Self::Mips),
      "mips64" if little => Some(Self::Mips64le),
      "mips64" => Some(Self::Mips64),
      "powerpc64" if little => Some(Self::Ppc64le),
      "powerpc64" => Some(Self::Ppc64),
      "riscv64" => Some(Self::Riscv64),
      "s390x" => Some(Self::S390x),
      "wasm32" => Some(Self::Wasm),
      _ => None,
    }
  }

  /// Returns the `GOARCH` identifier for this architecture
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::I386 => "386",
      Self::Amd64 => "amd64",
      Self::Arm => "arm",
      Self::Arm64 => "arm64",
      Self::Loong64 => "loong64",
      Self::Mips => "mips",
      Self::Mips64 => "mips64",
      Self::Mips64le => "mips64le",
      Self::Mipsle => "mipsle",
      Self::Ppc64 => "ppc64",
      Self::Ppc64le => "ppc64le",
      Self::Riscv64 => "riscv64",
      Self::S390x => "s390x",
      Self::Wasm => "wasm",
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Arch {
  type Err = UnknownArch;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|arch| arch.as_str() == s)
      .ok_or_else(|| UnknownArch(s.to_string()))
  }
}

/// Returned when a string does not name a supported architecture.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported architecture: {0}")]
pub struct UnknownArch(pub String);

/// Returns true if `value` names a supported architecture
pub fn is_arch(value: &str) -> bool {
  value.parse::<Arch>().is_ok()
}
