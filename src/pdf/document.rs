use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use lopdf::encryption::DecryptionError;
use lopdf::xref::XrefEntry;
use lopdf::{Document, EncryptionState, Object, ObjectId, Reader};
use tracing::{debug, instrument, warn};

use crate::error::{Error, Result};

/// Outcome of opening a document without a password.
#[derive(Debug)]
pub enum OpenAttempt {
    /// Readable as is (unencrypted, or encrypted with an empty user password).
    Unprotected(PdfDocument),
    /// Encrypted and unreadable without the user password.
    PasswordRequired,
    /// Anything else: missing file, corrupt structure, ...
    Failed(Error),
}

#[derive(Debug)]
pub struct PdfDocument {
    doc: Document,
    path: PathBuf,
}

impl PdfDocument {
    /// Open without a password and report whether one is needed.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn try_open<P: AsRef<Path>>(path: P) -> OpenAttempt {
        let path = path.as_ref();
        match Document::load(path) {
            Ok(doc) if needs_password(&doc) => match empty_password_error(&doc) {
                err if is_incorrect_password(&err) => {
                    debug!("document is encrypted with a user password");
                    OpenAttempt::PasswordRequired
                }
                err => OpenAttempt::Failed(Error::pdf(path, err)),
            },
            Ok(doc) => {
                debug!(pages = doc.get_pages().len(), "PDF loaded");
                OpenAttempt::Unprotected(PdfDocument {
                    doc,
                    path: path.to_path_buf(),
                })
            }
            Err(err) if is_incorrect_password(&err) => OpenAttempt::PasswordRequired,
            Err(err) => OpenAttempt::Failed(Error::pdf(path, err)),
        }
    }

    /// Open a document that must not need a password.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match Self::try_open(path) {
            OpenAttempt::Unprotected(doc) => Ok(doc),
            OpenAttempt::PasswordRequired => Err(Error::PasswordRequired {
                path: path.to_path_buf(),
            }),
            OpenAttempt::Failed(err) => Err(err),
        }
    }

    /// Open and decrypt with `password`. Unencrypted documents open as usual.
    ///
    /// Every failure, including a malformed file, is reported as
    /// [`Error::UnlockFailed`].
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open_with_password<P: AsRef<Path>>(path: P, password: &str) -> Result<Self> {
        let path = path.as_ref();
        let unlock_failed = |source: lopdf::Error| Error::UnlockFailed {
            path: path.to_path_buf(),
            source,
        };

        let buffer = std::fs::read(path).map_err(|err| unlock_failed(err.into()))?;
        let mut doc = Document::load_mem(&buffer).map_err(unlock_failed)?;
        if needs_password(&doc) {
            let restored = read_encrypted_objects(&mut doc, &buffer);
            debug!(objects = restored, "read encrypted objects");
            doc.decrypt(password).map_err(unlock_failed)?;
            debug!("document decrypted");
        }

        let doc = PdfDocument {
            doc,
            path: path.to_path_buf(),
        };
        // Never hand back an empty document as unlocked
        if doc.page_count() == 0 {
            return Err(unlock_failed(lopdf::Error::PageNumberNotFound(1)));
        }
        Ok(doc)
    }

    #[cfg(test)]
    pub fn from_document(doc: Document, path: impl Into<PathBuf>) -> Self {
        PdfDocument {
            doc,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Delete the page at zero-based `index`. Later pages move down by one.
    pub fn delete_page(&mut self, index: u32) {
        self.doc.delete_pages(&[index + 1]);
    }

    /// Drop the encryption dictionary so the next save writes plaintext.
    pub fn strip_encryption(&mut self) {
        let encrypt_id = self
            .doc
            .trailer
            .get(b"Encrypt")
            .and_then(Object::as_reference)
            .ok();
        if let Some(id) = encrypt_id {
            self.doc.objects.remove(&id);
        }
        self.doc.trailer.remove(b"Encrypt");
        self.doc.encryption_state = None;
    }

    /// Drop unreferenced objects and empty streams, then Flate-compress the
    /// remaining streams. Returns how many objects were removed.
    pub fn compress(&mut self) -> usize {
        let pruned = self.doc.prune_objects().len();
        let empty = self.doc.delete_zero_length_streams().len();
        self.doc.compress();
        pruned + empty
    }

    /// Serialize the document
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|err| Error::pdf(&self.path, err.into()))?;
        Ok(buffer)
    }

    /// Save to `path`. Serialization finishes before the file is created, so
    /// a failed save leaves nothing behind.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes)?;
        debug!(path = %path.as_ref().display(), "PDF saved");
        Ok(())
    }

    /// Get metadata from the document info dictionary
    pub fn get_info(&self) -> PdfInfo {
        let mut info = PdfInfo {
            page_count: self.page_count(),
            encrypted: self.is_encrypted(),
            ..PdfInfo::default()
        };

        let dict = self
            .doc
            .trailer
            .get(b"Info")
            .and_then(Object::as_reference)
            .and_then(|id| self.doc.get_dictionary(id));
        if let Ok(dict) = dict {
            info.title = get_string_from_dict(dict, b"Title");
            info.author = get_string_from_dict(dict, b"Author");
            info.creator = get_string_from_dict(dict, b"Creator");
            info.producer = get_string_from_dict(dict, b"Producer");
            info.creation_date = get_string_from_dict(dict, b"CreationDate");
            info.mod_date = get_string_from_dict(dict, b"ModDate");
        }

        info
    }
}

/// Encrypted, and the loader could not decrypt it with the empty password.
fn needs_password(doc: &Document) -> bool {
    doc.is_encrypted() && doc.encryption_state.is_none()
}

/// Why the empty password does not open `doc`.
fn empty_password_error(doc: &Document) -> lopdf::Error {
    match doc.authenticate_password("") {
        Err(err) => err,
        // Authenticated, but the loader still could not build a decryption state
        Ok(()) => match EncryptionState::decode(doc, "") {
            Err(err) => err,
            Ok(_) => lopdf::Error::Unimplemented("empty-password decryption state"),
        },
    }
}

fn is_incorrect_password(err: &lopdf::Error) -> bool {
    matches!(
        err,
        lopdf::Error::Decryption(DecryptionError::IncorrectPassword)
    )
}

/// Parse every uncompressed object of `buffer` into `doc`, still encrypted.
///
/// `Document::load` only authenticates with the empty password; when that
/// fails it keeps the `/Encrypt` dictionary and nothing else. Objects inside
/// object streams are extracted later by `Document::decrypt`.
fn read_encrypted_objects(doc: &mut Document, buffer: &[u8]) -> usize {
    let ids: Vec<ObjectId> = doc
        .reference_table
        .entries
        .iter()
        .filter_map(|(&number, entry)| match *entry {
            XrefEntry::Normal { generation, .. } => Some((number, generation)),
            _ => None,
        })
        .filter(|id| !doc.objects.contains_key(id))
        .collect();

    let reader = Reader {
        buffer,
        document: std::mem::take(doc),
        encryption_state: None,
        raw_objects: BTreeMap::new(),
    };
    let mut objects = Vec::with_capacity(ids.len());
    for id in ids {
        match reader.get_object(id, &mut HashSet::new()) {
            Ok(object) => objects.push((id, object)),
            Err(err) => warn!(object = ?id, error = %err, "skipping unreadable object"),
        }
    }

    *doc = reader.document;
    let count = objects.len();
    doc.objects.extend(objects);
    count
}

#[derive(Debug, Default, Clone)]
pub struct PdfInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
    pub page_count: u32,
    pub encrypted: bool,
}

fn get_string_from_dict(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(|obj| match obj {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        _ => None,
    })
}

fn decode_pdf_string(bytes: &[u8]) -> Option<String> {
    match bytes {
        // UTF-16 BE with BOM
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units).ok()
        }
        // Latin-1 is close enough to PDFDocEncoding for metadata
        _ => Some(bytes.iter().map(|&b| b as char).collect()),
    }
}
