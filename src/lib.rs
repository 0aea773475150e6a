//! Find and download the PDB file that belongs to a Windows binary.
//!
//! ```no_run
//! # async fn run(exe_bytes: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let identity = pdb_fetch::extract_symbol_identity(exe_bytes)?;
//! println!("{} {}", identity.basename(), identity.signature());
//!
//! let fetcher = pdb_fetch::SymbolFetcher::new()?;
//! let pdb_bytes = fetcher.fetch(&identity, None).await?;
//! # let _ = pdb_bytes;
//! # Ok(())
//! # }
//! ```

mod error;
mod identity;
mod output;
mod pe_debug;
pub mod symbol_path;
mod symsrv;

pub use error::{ExtractError, FetchError};
pub use identity::SymbolIdentity;
pub use output::{output_path, write_pdb};
pub use pe_debug::{extract_symbol_identity, parse_codeview_record, CodeViewGuid, CodeViewTag};
pub use symsrv::{
    symbol_url, HttpResponse, HttpTransport, ReqwestTransport, SymbolFetcher,
    DEFAULT_SYMBOL_SERVER,
};

// Re-export bytes, since it's part of the fetch API.
pub use bytes;
