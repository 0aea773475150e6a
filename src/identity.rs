use std::fmt;

/// The information needed to look up the PDB file of a PE binary on a symbol
/// server: the build signature and the PDB path that the linker embedded.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SymbolIdentity {
    signature: String,
    filename: String,
}

impl SymbolIdentity {
    pub fn new(signature: String, filename: String) -> Self {
        Self {
            signature,
            filename,
        }
    }

    /// The uppercase hex signature, for example `9C85A7373CC2BC2A7AB9C9388952B8F81`
    /// (GUID followed by the age).
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// The PDB path as embedded in the binary, e.g. `D:\a\_work\1\s\out\firefox.pdb`.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The file name part of the embedded PDB path.
    ///
    /// Both `/` and `\` count as separators, no matter which platform we're
    /// running on. `std::path` would not split a Windows path on Linux.
    pub fn basename(&self) -> &str {
        match self.filename.rfind(|c: char| c == '/' || c == '\\') {
            Some(last_separator) => &self.filename[last_separator + 1..],
            None => &self.filename,
        }
    }

    /// The path of the PDB relative to the root of a symbol store, of the form
    /// `firefox.pdb/HEX/firefox.pdb`.
    pub fn store_path(&self) -> String {
        let basename = self.basename();
        format!("{}/{}/{}", basename, self.signature, basename)
    }
}

impl fmt::Display for SymbolIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.filename, self.signature)
    }
}
