//! Two-level archive unpacking, fully in memory.
//!
//! A publication is a gzip-compressed tar holding one inner plain tar, which
//! in turn holds the `CRI_*.xml` payload. Both levels go through
//! [`find_member`].

use std::io::Read;

use flate2::read::GzDecoder;

use crate::error::TransformError;
use crate::xml::{parse_document, XmlNode};

pub const INNER_ARCHIVE_EXTENSION: &str = ".tar";
pub const PAYLOAD_PREFIX: &str = "CRI_";
pub const PAYLOAD_EXTENSION: &str = ".xml";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone)]
pub struct UnpackedDocument {
    /// Member name of the inner tar inside the outer archive.
    pub inner_name: String,
    /// Member name of the payload inside the inner tar.
    pub payload_name: String,
    pub tree: XmlNode,
}

/// Opens an outer archive and parses its payload document.
///
/// # Errors
///
/// Returns [`TransformError::InnerArchiveNotFound`] or
/// [`TransformError::PayloadNotFound`] when a level has no matching member,
/// [`TransformError::Io`] for corrupt compression or tar framing, and the XML
/// errors of [`parse_document`].
pub fn unpack(archive_bytes: &[u8]) -> Result<UnpackedDocument, TransformError> {
    let outer: Box<dyn Read + '_> = if archive_bytes.starts_with(&GZIP_MAGIC) {
        Box::new(GzDecoder::new(archive_bytes))
    } else {
        Box::new(archive_bytes)
    };

    let (inner_name, inner_bytes) =
        find_member(outer, |path| path.ends_with(INNER_ARCHIVE_EXTENSION))?.ok_or(
            TransformError::InnerArchiveNotFound {
                extension: INNER_ARCHIVE_EXTENSION,
            },
        )?;

    let (payload_name, payload) = find_member(inner_bytes.as_slice(), is_payload)?.ok_or_else(
        || TransformError::PayloadNotFound {
            archive: inner_name.clone(),
            prefix: PAYLOAD_PREFIX,
            extension: PAYLOAD_EXTENSION,
        },
    )?;

    tracing::debug!(
        inner = %inner_name,
        payload = %payload_name,
        bytes = payload.len(),
        "payload extracted"
    );

    let tree = parse_document(&payload, &payload_name)?;
    Ok(UnpackedDocument {
        inner_name,
        payload_name,
        tree,
    })
}

fn is_payload(path: &str) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name.starts_with(PAYLOAD_PREFIX) && file_name.ends_with(PAYLOAD_EXTENSION)
}

/// Scans regular-file members of a tar stream and reads the first one whose
/// path satisfies `matches` into memory. Later candidates are logged and
/// skipped.
fn find_member<R: Read>(
    reader: R,
    matches: impl Fn(&str) -> bool,
) -> Result<Option<(String, Vec<u8>)>, TransformError> {
    let mut archive = tar::Archive::new(reader);
    let mut found: Option<(String, Vec<u8>)> = None;

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path()?.to_string_lossy().into_owned();
        if !matches(&path) {
            continue;
        }
        if let Some((selected, _)) = &found {
            tracing::warn!(selected = %selected, ignored = %path, "several candidate members, keeping the first");
            continue;
        }
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        found = Some((path, bytes));
    }

    Ok(found)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;

    use super::*;

    fn tar_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Regular);
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    const PAYLOAD: &[u8] = b"<CompteRendu><Metadonnees/></CompteRendu>";

    #[test]
    fn unpacks_gzip_outer_archive() {
        let inner = tar_with(&[("CRI_20220004.xml", PAYLOAD)]);
        let outer = gzip(&tar_with(&[("AN_2022004.tar", inner.as_slice())]));
        let doc = unpack(&outer).unwrap();
        assert_eq!(doc.inner_name, "AN_2022004.tar");
        assert_eq!(doc.payload_name, "CRI_20220004.xml");
        assert_eq!(doc.tree.name, "CompteRendu");
    }

    #[test]
    fn accepts_uncompressed_outer_archive() {
        let inner = tar_with(&[("CRI_1.xml", PAYLOAD)]);
        let outer = tar_with(&[("x.tar", inner.as_slice())]);
        assert!(unpack(&outer).is_ok());
    }

    #[test]
    fn payload_match_uses_file_name_component() {
        let inner = tar_with(&[
            ("notes/readme.xml", b"<x/>".as_slice()),
            ("data/CRI_20220004.xml", PAYLOAD),
        ]);
        let outer = gzip(&tar_with(&[("AN.tar", inner.as_slice())]));
        let doc = unpack(&outer).unwrap();
        assert_eq!(doc.payload_name, "data/CRI_20220004.xml");
    }

    #[test]
    fn first_matching_payload_wins() {
        let inner = tar_with(&[
            ("CRI_a.xml", b"<First/>".as_slice()),
            ("CRI_b.xml", b"<Second/>".as_slice()),
        ]);
        let outer = gzip(&tar_with(&[("AN.tar", inner.as_slice())]));
        assert_eq!(unpack(&outer).unwrap().tree.name, "First");
    }

    #[test]
    fn missing_inner_archive_is_typed() {
        let outer = gzip(&tar_with(&[("readme.txt", b"hello".as_slice())]));
        let err = unpack(&outer).unwrap_err();
        assert!(matches!(err, TransformError::InnerArchiveNotFound { .. }), "{err:?}");
    }

    #[test]
    fn missing_payload_names_the_inner_archive() {
        let inner = tar_with(&[("SOMMAIRE.xml", b"<x/>".as_slice())]);
        let outer = gzip(&tar_with(&[("AN_2022004.tar", inner.as_slice())]));
        let err = unpack(&outer).unwrap_err();
        assert!(
            matches!(err, TransformError::PayloadNotFound { ref archive, .. } if archive == "AN_2022004.tar"),
            "{err:?}"
        );
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let inner = tar_with(&[("CRI_1.xml", b"<CompteRendu><Section>".as_slice())]);
        let outer = gzip(&tar_with(&[("AN.tar", inner.as_slice())]));
        assert!(unpack(&outer).is_err());
    }

    #[test]
    fn corrupt_gzip_is_an_error() {
        assert!(unpack(&[0x1f, 0x8b, 0x00, 0x13, 0x37, 0x42, 0x00]).is_err());
    }
}
