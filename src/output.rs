use std::path::{Path, PathBuf};

use crate::identity::SymbolIdentity;

/// Where to write the downloaded PDB: `output` (or the PDB's own file name),
/// inside `output_dir` if one is given.
pub fn output_path(
    identity: &SymbolIdentity,
    output: Option<&Path>,
    output_dir: Option<&Path>,
) -> PathBuf {
    let filename = match output {
        Some(output) => output.to_path_buf(),
        None => PathBuf::from(identity.basename()),
    };
    match output_dir {
        Some(dir) => dir.join(filename),
        None => filename,
    }
}

pub async fn write_pdb(path: &Path, pdb_bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(path, pdb_bytes).await?;
    log::info!("Wrote {} bytes to {:?}", pdb_bytes.len(), path);
    Ok(())
}
