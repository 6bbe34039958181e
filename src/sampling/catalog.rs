use std::path::{Path, PathBuf};

use crate::error::SamplingError;

/// Reader for a flow-field sampling file.
///
/// Each operation opens its own handle on the container and closes it when
/// done; the struct itself only remembers the path.
pub struct SamplingReader {
    file_path: PathBuf,
}

impl SamplingReader {
    pub fn new(file_path: impl AsRef<Path>) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// List the sampled groups in the container, in file order.
    pub fn groups(&self) -> Result<Vec<String>, SamplingError> {
        let file = netcdf::open(&self.file_path)?;
        let names = file.groups()?.map(|g| g.name()).collect();
        Ok(names)
    }
}
