//! Choosing the symbol server to download from.
//!
//! An explicitly configured store wins. Otherwise we look at the `_NT_SYMBOL_PATH`
//! environment variable, whose syntax is documented at
//! <https://docs.microsoft.com/en-us/windows-hardware/drivers/debugger/advanced-symsrv-use>,
//! and use the first http(s) server listed in one of its `srv*` / `symsrv*`
//! entries. Without either, the fetcher falls back to the public Microsoft
//! symbol server.

pub const NT_SYMBOL_PATH_VAR: &str = "_NT_SYMBOL_PATH";

/// The first symbol server URL in a `_NT_SYMBOL_PATH`-style string.
///
/// Cache directories and plain paths are skipped, since nothing is cached or
/// read from disk here.
pub fn first_symbol_server(symbol_path: &str) -> Option<&str> {
    symbol_path.split(';').find_map(|entry| {
        let mut parts = entry.trim().split('*');
        let kind = parts.next()?.to_ascii_lowercase();
        if kind != "srv" && kind != "symsrv" {
            return None;
        }
        parts.find(|part| is_server_url(part))
    })
}

fn is_server_url(part: &str) -> bool {
    let lower = part.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Picks the store URL: `explicit_store` if given, otherwise the first server of
/// `env_symbol_path` (the value of `_NT_SYMBOL_PATH`). `None` means "use the
/// default server".
pub fn resolve_store_url(
    explicit_store: Option<&str>,
    env_symbol_path: Option<&str>,
) -> Option<String> {
    if let Some(store) = explicit_store {
        return Some(store.to_string());
    }
    let url = first_symbol_server(env_symbol_path?)?;
    log::info!("Using symbol server {} from {}", url, NT_SYMBOL_PATH_VAR);
    Some(url.to_string())
}

/// [`resolve_store_url`] with the current value of `_NT_SYMBOL_PATH`.
pub fn resolve_store_url_from_environment(explicit_store: Option<&str>) -> Option<String> {
    let env_symbol_path = std::env::var(NT_SYMBOL_PATH_VAR).ok();
    resolve_store_url(explicit_store, env_symbol_path.as_deref())
}
