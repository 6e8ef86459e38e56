//! OS/architecture pairs GN is compiled for.

use anyhow::{bail, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    Mac,
    Win,
}

impl Os {
    pub fn name(self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::Mac => "mac",
            Os::Win => "win",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Arch {
    Amd64,
    Arm64,
}

impl Arch {
    pub fn name(self) -> &'static str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64 => "arm64",
        }
    }
}

/// An OS/architecture pair, e.g. `linux-amd64`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Target {
    pub os: Os,
    pub arch: Arch,
}

impl Target {
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let Some((os, arch)) = s.split_once('-') else {
            bail!("expected <os>-<arch>, got `{}`", s);
        };
        let os = match os {
            "linux" => Os::Linux,
            "mac" => Os::Mac,
            "win" => Os::Win,
            _ => bail!("unsupported os: {}", os),
        };
        let arch = match arch {
            "amd64" => Arch::Amd64,
            "arm64" => Arch::Arm64,
            _ => bail!("unsupported architecture: {}", arch),
        };
        Ok(Self { os, arch })
    }

    /// The platform this tool itself is running on.
    pub fn host() -> Result<Self> {
        let os = match std::env::consts::OS {
            "linux" => Os::Linux,
            "macos" => Os::Mac,
            "windows" => Os::Win,
            other => bail!("unsupported host os: {}", other),
        };
        let arch = match std::env::consts::ARCH {
            "x86_64" => Arch::Amd64,
            "aarch64" => Arch::Arm64,
            other => bail!("unsupported host architecture: {}", other),
        };
        Ok(Self { os, arch })
    }

    pub fn platform(self) -> String {
        format!("{}-{}", self.os.name(), self.arch.name())
    }

    /// Clang `--target=` value for cross compiles.
    pub fn triple(self) -> &'static str {
        match (self.os, self.arch) {
            (Os::Linux, Arch::Amd64) => "x86_64-linux-gnu",
            (Os::Linux, Arch::Arm64) => "aarch64-linux-gnu",
            (Os::Mac, Arch::Amd64) => "x86_64-apple-darwin",
            (Os::Mac, Arch::Arm64) => "aarch64-apple-darwin",
            (Os::Win, Arch::Amd64) => "x86_64-pc-windows-msvc",
            (Os::Win, Arch::Arm64) => "aarch64-pc-windows-msvc",
        }
    }

    pub fn is_linux(self) -> bool {
        self.os == Os::Linux
    }

    pub fn is_mac(self) -> bool {
        self.os == Os::Mac
    }

    pub fn is_win(self) -> bool {
        self.os == Os::Win
    }

    pub fn exe_suffix(self) -> &'static str {
        if self.is_win() {
            ".exe"
        } else {
            ""
        }
    }
}
