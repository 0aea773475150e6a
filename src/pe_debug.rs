//! Reading the PDB identity out of the debug directory of a PE binary.
//!
//! The debug directory is an array of `IMAGE_DEBUG_DIRECTORY` descriptors.
//! Only the first descriptor is looked at. Its data is normally a CodeView
//! record, which starts with a four byte tag. For `RSDS` records (PDB 7.0) the
//! tag is followed by a GUID, an age and the NUL-terminated path of the PDB:
//!
//! ```text
//! "RSDS" | Data1 u32 | Data2 u16 | Data3 u16 | Data4 u8 | Data5 u8 | Data6 [u8; 6] | Age u32 | path
//! ```

use std::fmt;

use object::endian::{LittleEndian as LE, U16, U32};
use object::pe;
use object::read::pe::{ImageNtHeaders, PeFile, PeFile32, PeFile64};
use object::read::{Bytes, FileKind, ReadRef};

use crate::error::ExtractError;
use crate::identity::SymbolIdentity;

/// The four bytes at the start of a CodeView debug record.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodeViewTag(pub [u8; 4]);

impl CodeViewTag {
    /// PDB 7.0, GUID + age.
    pub const RSDS: CodeViewTag = CodeViewTag(*b"RSDS");

    /// Older format with a numeric signature + age. Not decoded.
    pub const LEGACY_01BN: CodeViewTag = CodeViewTag(*b"01BN");

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for CodeViewTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.escape_ascii())
    }
}

impl fmt::Debug for CodeViewTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CodeViewTag(b\"{}\")", self.0.escape_ascii())
    }
}

/// The GUID of an `RSDS` record, split into the fields in which it is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodeViewGuid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: u8,
    pub data5: u8,
    pub data6: [u8; 6],
}

impl CodeViewGuid {
    /// The symbol server signature for this GUID and the given age.
    ///
    /// The GUID fields are zero-padded uppercase hex, the age is uppercase hex
    /// without padding, e.g. `9C85A7373CC2BC2A7AB9C9388952B8F81` for age 1.
    pub fn signature_with_age(&self, age: u32) -> String {
        let data6: String = self.data6.iter().map(|b| format!("{:02X}", b)).collect();
        format!(
            "{:08X}{:04X}{:04X}{:02X}{:02X}{}{:X}",
            self.data1, self.data2, self.data3, self.data4, self.data5, data6, age
        )
    }
}

/// Parses `data` as a PE binary and returns the identity of its PDB file.
///
/// Only the first debug directory entry is used.
pub fn extract_symbol_identity(data: &[u8]) -> Result<SymbolIdentity, ExtractError> {
    let file_kind = FileKind::parse(data).map_err(ExtractError::ObjectParseError)?;
    let record = match file_kind {
        FileKind::Pe32 => {
            let pe = PeFile32::parse(data).map_err(ExtractError::ObjectParseError)?;
            first_debug_entry_data(&pe, data)?
        }
        FileKind::Pe64 => {
            let pe = PeFile64::parse(data).map_err(ExtractError::ObjectParseError)?;
            first_debug_entry_data(&pe, data)?
        }
        other => return Err(ExtractError::NotPe(other)),
    };
    parse_codeview_record(record)
}

fn first_debug_entry_data<'data, Pe: ImageNtHeaders>(
    pe_file: &PeFile<'data, Pe, &'data [u8]>,
    data: &'data [u8],
) -> Result<&'data [u8], ExtractError> {
    let data_dir = pe_file
        .data_directory(pe::IMAGE_DIRECTORY_ENTRY_DEBUG)
        .ok_or(ExtractError::NoDebugEntry)?;
    let debug_data = data_dir
        .data(data, &pe_file.section_table())
        .map_err(|_| ExtractError::InvalidDebugDirectory("not contained in any section"))?;

    let count = debug_data.len() / std::mem::size_of::<pe::ImageDebugDirectory>();
    let (debug_dirs, _) =
        object::pod::slice_from_bytes::<pe::ImageDebugDirectory>(debug_data, count)
            .map_err(|()| ExtractError::InvalidDebugDirectory("could not read descriptors"))?;
    let debug_dir = debug_dirs.first().ok_or(ExtractError::NoDebugEntry)?;
    log::debug!(
        "Found {} debug directory entries, the first one has type {}",
        debug_dirs.len(),
        debug_dir.typ.get(LE)
    );

    data.read_bytes_at(
        debug_dir.pointer_to_raw_data.get(LE).into(),
        debug_dir.size_of_data.get(LE).into(),
    )
    .map_err(|()| ExtractError::TruncatedDebugEntry("entry data lies outside the file"))
}

/// Decodes the data of a debug directory entry, which starts with the CodeView tag.
pub fn parse_codeview_record(record: &[u8]) -> Result<SymbolIdentity, ExtractError> {
    let mut record = Bytes(record);
    let mut tag = [0; 4];
    tag.copy_from_slice(
        record
            .read_bytes(4)
            .map_err(|()| ExtractError::TruncatedDebugEntry("CodeView tag"))?
            .0,
    );
    let tag = CodeViewTag(tag);
    log::debug!("CodeView tag: {}", tag);

    match tag {
        CodeViewTag::RSDS => {}
        CodeViewTag::LEGACY_01BN => {
            // The signature of these records would be the numeric signature in
            // hex followed by the age in hex. Nothing we've seen produces them,
            // so leave this unsupported until there's a binary to test with.
            return Err(ExtractError::UnsupportedDebugEntryType(tag));
        }
        other => return Err(ExtractError::UnsupportedDebugEntryType(other)),
    }

    let guid = read_guid(&mut record)?;
    let age = record
        .read::<U32<LE>>()
        .map_err(|()| ExtractError::TruncatedDebugEntry("RSDS age"))?
        .get(LE);
    let signature = guid.signature_with_age(age);

    let mut path = record.0;
    if let [rest @ .., 0] = path {
        path = rest;
    }
    let filename = std::str::from_utf8(path)
        .map_err(|_| ExtractError::PdbPathNotUtf8)?
        .to_string();

    Ok(SymbolIdentity::new(signature, filename))
}

fn read_guid(record: &mut Bytes<'_>) -> Result<CodeViewGuid, ExtractError> {
    let truncated = |()| ExtractError::TruncatedDebugEntry("RSDS GUID");
    let data1 = record.read::<U32<LE>>().map_err(truncated)?.get(LE);
    let data2 = record.read::<U16<LE>>().map_err(truncated)?.get(LE);
    let data3 = record.read::<U16<LE>>().map_err(truncated)?.get(LE);
    let data4 = *record.read::<u8>().map_err(truncated)?;
    let data5 = *record.read::<u8>().map_err(truncated)?;
    let mut data6 = [0; 6];
    data6.copy_from_slice(record.read_bytes(6).map_err(truncated)?.0);
    Ok(CodeViewGuid {
        data1,
        data2,
        data3,
        data4,
        data5,
        data6,
    })
}
