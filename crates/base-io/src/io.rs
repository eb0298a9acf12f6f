use crate::{fs::Fs, runtime::IoRuntime};

/// Bundles the async runtime with the filesystem root, the single value
/// backend-loading code needs to start spawning IO tasks (mirrors the
/// teacher's `IoFileSys` passed into `VulkanBackendLoadingIo::new`).
#[derive(Clone)]
pub struct IoFileSys {
    pub rt: IoRuntime,
    pub fs: Fs,
}

impl IoFileSys {
    pub fn new(root: impl Into<std::path::PathBuf>) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        Ok(Self {
            rt: IoRuntime::new(runtime),
            fs: Fs::new(root),
        })
    }
}
