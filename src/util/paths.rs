use std::path::PathBuf;

/// Directory layout under the working directory: the GN checkout, the
/// fetched toolchain, and scratch space for allocator builds and packaging.
#[derive(Clone, Debug)]
pub struct Workspace {
    start_dir: PathBuf,
}

impl Workspace {
    pub fn new(start_dir: impl Into<PathBuf>) -> Self {
        Self {
            start_dir: start_dir.into(),
        }
    }

    pub fn src_dir(&self) -> PathBuf {
        self.start_dir.join("gn")
    }

    pub fn out_dir(&self) -> PathBuf {
        self.src_dir().join("out")
    }

    pub fn cipd_dir(&self) -> PathBuf {
        self.start_dir.join("cipd")
    }

    pub fn ensure_file(&self) -> PathBuf {
        self.start_dir.join("cipd.ensure")
    }

    pub fn ninja(&self) -> PathBuf {
        self.cipd_dir().join("ninja")
    }

    pub fn rpmalloc_src_dir(&self) -> PathBuf {
        self.start_dir.join("rpmalloc")
    }

    pub fn cleanup_dir(&self) -> PathBuf {
        self.start_dir.join(".cleanup")
    }

    pub fn rpmalloc_build_dir(&self, platform: &str) -> PathBuf {
        self.cleanup_dir().join(format!("rpmalloc-{platform}"))
    }

    pub fn pkg_def_file(&self) -> PathBuf {
        self.cleanup_dir().join("gn_pkg_def.json")
    }

    pub fn cipd_pkg_file(&self) -> PathBuf {
        self.cleanup_dir().join("gn.cipd")
    }
}
