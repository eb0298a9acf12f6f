use std::path::{Path, PathBuf};

use path_clean::PathClean;

/// Minimal filesystem facade the shader compiler bridge and texture/atlas
/// loaders go through, rather than touching `std::fs` directly — keeps every
/// read attributable to a resolved, cleaned path for error messages and for
/// the registry's leak-diagnostic "attribution string" (spec.md §4.A).
#[derive(Debug, Clone)]
pub struct Fs {
    root: PathBuf,
}

impl Fs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path).clean()
    }

    pub async fn read(&self, path: impl AsRef<Path>) -> anyhow::Result<Vec<u8>> {
        let full = self.resolve(path.as_ref());
        Ok(tokio::fs::read(&full).await.map_err(|err| {
            anyhow::anyhow!("failed to read {}: {err}", full.display())
        })?)
    }

    pub async fn read_to_string(&self, path: impl AsRef<Path>) -> anyhow::Result<String> {
        let full = self.resolve(path.as_ref());
        Ok(tokio::fs::read_to_string(&full)
            .await
            .map_err(|err| anyhow::anyhow!("failed to read {}: {err}", full.display()))?)
    }
}
