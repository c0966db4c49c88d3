//! In-memory PDF fixtures for unit tests.

use std::path::{Path, PathBuf};

use lopdf::{dictionary, Document, EncryptionState, EncryptionVersion, Object, Permissions, Stream};

/// A document with `pages` pages; page N draws the text "Page N".
pub fn sample_pdf(pages: u32) -> Document {
    let mut doc = Document::with_version("1.5");
    doc.trailer.set(
        "ID",
        Object::Array(vec![
            Object::string_literal(vec![1u8; 16]),
            Object::string_literal(vec![2u8; 16]),
        ]),
    );

    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();
    for n in 1..=pages {
        let content = format!("BT /F1 24 Tf 72 720 Td (Page {}) Tj ET", n);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => pages as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Like [`sample_pdf`], but encrypted with `user_password`.
pub fn encrypted_pdf(pages: u32, user_password: &str) -> Document {
    let mut doc = sample_pdf(pages);
    let version = EncryptionVersion::V2 {
        document: &doc,
        owner_password: "owner",
        user_password,
        key_length: 128,
        permissions: Permissions::all(),
    };
    let state = EncryptionState::try_from(version).unwrap();
    doc.encrypt(&state).unwrap();
    doc
}

pub fn write_pdf(dir: &Path, name: &str, mut doc: Document) -> PathBuf {
    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}

/// The "Page N" text of every page, in page order.
pub fn page_labels(doc: &Document) -> Vec<String> {
    let mut pages: Vec<_> = doc.get_pages().into_iter().collect();
    pages.sort_by_key(|(num, _)| *num);
    pages
        .into_iter()
        .map(|(_, id)| {
            let content = doc.get_page_content(id).unwrap();
            let text = String::from_utf8_lossy(&content);
            let start = text.find('(').unwrap() + 1;
            let end = text.find(')').unwrap();
            text[start..end].to_string()
        })
        .collect()
}

pub fn load_labels(path: &Path) -> Vec<String> {
    page_labels(&Document::load(path).unwrap())
}
