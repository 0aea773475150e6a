
use pdb_fetch::{
    extract_symbol_identity, output_path, write_pdb, CodeViewTag, ExtractError, FetchError,
    ReqwestTransport, SymbolFetcher,
};
use pe_image::{build_pe, rsds_record, vcruntime_rsds_record, DebugDirectory, DebugEntry};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const VCRUNTIME_SIGNATURE: &str = "9C85A7373CC2BC2A7AB9C9388952B8F81";

fn vcruntime_image(is_64: bool) -> Vec<u8> {
    build_pe(
        is_64,
        &DebugDirectory::Entries(vec![DebugEntry::codeview(vcruntime_rsds_record())]),
    )
}

#[test]
fn extracts_rsds_identity_from_pe64() {
    let identity = extract_symbol_identity(&vcruntime_image(true)).unwrap();
    assert_eq!(identity.signature(), VCRUNTIME_SIGNATURE);
    assert_eq!(
        identity.filename(),
        r"D:\a\_work\1\s\binaries\amd64ret\bin\amd64\vcruntime140_1.amd64.pdb"
    );
    assert_eq!(identity.basename(), "vcruntime140_1.amd64.pdb");
}

#[test]
fn extracts_rsds_identity_from_pe32() {
    let identity = extract_symbol_identity(&vcruntime_image(false)).unwrap();
    assert_eq!(identity.signature(), VCRUNTIME_SIGNATURE);
    assert_eq!(identity.basename(), "vcruntime140_1.amd64.pdb");
}

#[test]
fn extraction_is_deterministic() {
    let image = build_pe(
        true,
        &DebugDirectory::Entries(vec![DebugEntry::codeview(rsds_record(
            0x0123_4567,
            0x89ab,
            0xcdef,
            [1, 2, 3, 4, 5, 6, 7, 8],
            0x2a,
            "/build/out/libfoo.pdb",
        ))]),
    );
    let first = extract_symbol_identity(&image).unwrap();
    let second = extract_symbol_identity(&image).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.signature(), "0123456789ABCDEF01020304050607082A");
    assert_eq!(first.basename(), "libfoo.pdb");
}

#[test]
fn missing_debug_directory() {
    let image = build_pe(true, &DebugDirectory::Missing);
    assert!(matches!(
        extract_symbol_identity(&image),
        Err(ExtractError::NoDebugEntry)
    ));
}

#[test]
fn empty_debug_directory() {
    let image = build_pe(false, &DebugDirectory::Entries(vec![]));
    assert!(matches!(
        extract_symbol_identity(&image),
        Err(ExtractError::NoDebugEntry)
    ));
}

#[test]
fn unknown_tag_is_carried_in_error() {
    let mut record = vcruntime_rsds_record();
    record[..4].copy_from_slice(b"NB10");
    let image = build_pe(
        true,
        &DebugDirectory::Entries(vec![DebugEntry::codeview(record)]),
    );
    match extract_symbol_identity(&image) {
        Err(ExtractError::UnsupportedDebugEntryType(tag)) => {
            assert_eq!(tag, CodeViewTag(*b"NB10"))
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn legacy_tag_is_unsupported() {
    let mut record = b"01BN".to_vec();
    record.extend_from_slice(&[0x78, 0x56, 0x34, 0x12, 0, 0, 0, 0, 3, 0, 0, 0]);
    record.extend_from_slice(b"legacy.pdb\0");
    let image = build_pe(
        true,
        &DebugDirectory::Entries(vec![DebugEntry::codeview(record)]),
    );
    match extract_symbol_identity(&image) {
        Err(ExtractError::UnsupportedDebugEntryType(tag)) => {
            assert_eq!(tag.as_bytes(), b"01BN")
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn only_first_entry_is_used() {
    let image = build_pe(
        true,
        &DebugDirectory::Entries(vec![
            DebugEntry {
                typ: pe_image::IMAGE_DEBUG_TYPE_POGO,
                data: b"PGU\0\x01\x10\0\0".to_vec(),
            },
            DebugEntry::codeview(vcruntime_rsds_record()),
        ]),
    );
    match extract_symbol_identity(&image) {
        Err(ExtractError::UnsupportedDebugEntryType(tag)) => {
            assert_eq!(tag.as_bytes(), b"PGU\0")
        }
        other => panic!("unexpected result {:?}", other),
    }

    let image = build_pe(
        true,
        &DebugDirectory::Entries(vec![
            DebugEntry::codeview(vcruntime_rsds_record()),
            DebugEntry {
                typ: pe_image::IMAGE_DEBUG_TYPE_POGO,
                data: b"PGU\0\x01\x10\0\0".to_vec(),
            },
        ]),
    );
    assert_eq!(
        extract_symbol_identity(&image).unwrap().signature(),
        VCRUNTIME_SIGNATURE
    );
}

#[test]
fn not_a_pe() {
    assert!(matches!(
        extract_symbol_identity(b"\x7fELF\x02\x01\x01\0\0\0\0\0\0\0\0\0"),
        Err(ExtractError::NotPe(_)) | Err(ExtractError::ObjectParseError(_))
    ));
    assert!(matches!(
        extract_symbol_identity(b""),
        Err(ExtractError::ObjectParseError(_))
    ));
}

/// Accepts one connection on a local port, answers it with `status_line` and
/// `body`, and resolves to the request line it received.
async fn serve_once(
    status_line: &'static str,
    body: &'static [u8],
) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let len = stream.read(&mut buf).await.unwrap();
            if len == 0 {
                break;
            }
            request.extend_from_slice(&buf[..len]);
        }
        let header = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status_line,
            body.len()
        );
        stream.write_all(header.as_bytes()).await.unwrap();
        stream.write_all(body).await.unwrap();
        let _ = stream.shutdown().await;
        let request = String::from_utf8_lossy(&request).into_owned();
        request.lines().next().unwrap_or_default().to_string()
    });
    (format!("http://{}", addr), handle)
}

fn local_fetcher() -> SymbolFetcher<ReqwestTransport> {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    SymbolFetcher::with_transport(ReqwestTransport::with_client(client))
}

#[tokio::test]
async fn downloads_pdb_from_store() {
    const PDB: &[u8] = b"Microsoft C/C++ MSF 7.00\r\n\x1aDS\0\0\0\x00\x10\0\0";
    let (base_url, server) = serve_once("200 OK", PDB).await;

    let identity = extract_symbol_identity(&vcruntime_image(true)).unwrap();
    let store = format!("{}/symbols/", base_url);
    let pdb = local_fetcher().fetch(&identity, Some(&store)).await.unwrap();
    assert_eq!(&pdb[..], PDB);
    assert_eq!(
        server.await.unwrap(),
        format!(
            "GET /symbols/vcruntime140_1.amd64.pdb/{}/vcruntime140_1.amd64.pdb HTTP/1.1",
            VCRUNTIME_SIGNATURE
        )
    );

    let dir = tempfile::tempdir().unwrap();
    let path = output_path(&identity, None, Some(dir.path()));
    write_pdb(&path, &pdb).await.unwrap();
    assert_eq!(path, dir.path().join("vcruntime140_1.amd64.pdb"));
    assert_eq!(std::fs::read(&path).unwrap(), PDB);
}

#[tokio::test]
async fn store_404_is_pdb_not_found() {
    let (base_url, server) = serve_once("404 Not Found", b"").await;
    let identity = extract_symbol_identity(&vcruntime_image(true)).unwrap();
    let result = local_fetcher().fetch(&identity, Some(&base_url)).await;
    assert!(matches!(result, Err(FetchError::PdbNotFound)));
    server.await.unwrap();
}

#[tokio::test]
async fn store_500_is_unexpected_status() {
    let (base_url, server) = serve_once("500 Internal Server Error", b"oops").await;
    let identity = extract_symbol_identity(&vcruntime_image(false)).unwrap();
    let result = local_fetcher().fetch(&identity, Some(&base_url)).await;
    assert!(matches!(result, Err(FetchError::UnexpectedReturnStatus(500))));
    server.await.unwrap();
}

#[tokio::test]
async fn connection_refused_is_a_transport_error() {
    // Bind and drop to get a port that nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let identity = extract_symbol_identity(&vcruntime_image(true)).unwrap();
    let store = format!("http://{}", addr);
    let result = local_fetcher().fetch(&identity, Some(&store)).await;
    assert!(matches!(result, Err(FetchError::Transport(_))));
}
