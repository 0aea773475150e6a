use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use pdb_fetch::{
    extract_symbol_identity, output_path, symbol_path, write_pdb, ExtractError, FetchError,
    SymbolFetcher,
};

#[derive(Debug, Parser)]
#[command(
    name = "pdb-fetch",
    version,
    about = r#"
Prints the PDB signature and filename of a Windows binary and downloads the
matching PDB file from a symbol server.

The symbol server is taken from --store, or from the first server listed in
_NT_SYMBOL_PATH, or is the public Microsoft symbol server.

EXAMPLES:
    # Download vcruntime140_1.amd64.pdb into the current directory:
    pdb-fetch -f C:\Windows\System32\vcruntime140_1.dll

    # Only print the PDB info:
    pdb-fetch -n -f xul.dll

    # Use a different symbol server:
    pdb-fetch -f xul.dll -s https://symbols.mozilla.org/ -d symbols
"#
)]
struct Opt {
    /// Path to the PE file
    #[arg(short, long)]
    file: PathBuf,

    /// PDB store URL
    #[arg(short, long)]
    store: Option<String>,

    /// No download. Only print PDB info.
    #[arg(short, long)]
    no_download: bool,

    /// Output filepath, defaults to the file name of the PDB
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output directory
    #[arg(short = 'd', long)]
    output_dir: Option<PathBuf>,

    /// Print debug output. RUST_LOG takes precedence if it's set.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let opt = Opt::parse();

    let default_filter = if opt.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let pe_data = match tokio::fs::read(&opt.file).await {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Opt::command()
            .error(
                ErrorKind::ValueValidation,
                format!("could not find file {}", opt.file.display()),
            )
            .exit(),
        Err(err) => {
            eprintln!("Could not open file {:?}: {}", opt.file, err);
            std::process::exit(1)
        }
    };

    let identity = match extract_symbol_identity(&pe_data) {
        Ok(identity) => identity,
        Err(ExtractError::NoDebugEntry) => {
            eprintln!("PE file does not contain a debug entry.");
            std::process::exit(1)
        }
        Err(ExtractError::UnsupportedDebugEntryType(tag)) => {
            eprintln!("PE file contains an unsupported debug entry type: {}", tag);
            std::process::exit(1)
        }
        Err(err) => {
            eprintln!("Could not read the PDB info from {:?}: {}", opt.file, err);
            std::process::exit(1)
        }
    };

    println!("PDB signature: {}", identity.signature());
    println!("PDB filename: {}", identity.filename());

    if opt.no_download {
        return;
    }

    let store = symbol_path::resolve_store_url_from_environment(opt.store.as_deref());
    let fetcher = match SymbolFetcher::new() {
        Ok(fetcher) => fetcher,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1)
        }
    };
    let pdb = match fetcher.fetch(&identity, store.as_deref()).await {
        Ok(pdb) => pdb,
        Err(FetchError::PdbNotFound) => {
            eprintln!("PDB store returned 404. PDB not found.");
            std::process::exit(1)
        }
        Err(FetchError::UnexpectedReturnStatus(status)) => {
            eprintln!("PDB store returned unexpected status code: {}", status);
            std::process::exit(1)
        }
        Err(err) => {
            eprintln!("Could not download the PDB: {}", err);
            std::process::exit(1)
        }
    };

    let path = output_path(&identity, opt.output.as_deref(), opt.output_dir.as_deref());
    if let Err(err) = write_pdb(&path, &pdb).await {
        eprintln!("Could not write {:?}: {}", path, err);
        std::process::exit(1)
    }
    println!("PDB written to {}", path.display());
}
