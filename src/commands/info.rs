use crate::pdf::{OpenAttempt, PdfDocument};
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    println!("File: {}", path.display());

    let doc = match PdfDocument::try_open(path) {
        OpenAttempt::Unprotected(doc) => doc,
        OpenAttempt::PasswordRequired => {
            println!("Protection: password required");
            return Ok(());
        }
        OpenAttempt::Failed(err) => return Err(err.into()),
    };
    let info = doc.get_info();

    println!("Pages: {}", info.page_count);
    println!(
        "Protection: {}",
        if info.encrypted {
            "encrypted, opens without a password"
        } else {
            "none"
        }
    );

    let fields = [
        ("Title", &info.title),
        ("Author", &info.author),
        ("Creator", &info.creator),
        ("Producer", &info.producer),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("{}: {}", label, value);
        }
    }
    if let Some(creation_date) = &info.creation_date {
        println!("Created: {}", format_pdf_date(creation_date));
    }
    if let Some(mod_date) = &info.mod_date {
        println!("Modified: {}", format_pdf_date(mod_date));
    }

    Ok(())
}

/// Render a PDF date (D:YYYYMMDDHHmmSS...) as "YYYY-MM-DD HH:mm:SS"
pub fn format_pdf_date(date: &str) -> String {
    let Some(d) = date.strip_prefix("D:") else {
        return date.to_string();
    };
    if d.len() < 8 || !d.as_bytes()[..8].iter().all(u8::is_ascii_digit) {
        return date.to_string();
    }
    let time = match d.get(8..14) {
        Some(t) if t.bytes().all(|b| b.is_ascii_digit()) => {
            format!(" {}:{}:{}", &t[0..2], &t[2..4], &t[4..6])
        }
        _ => String::new(),
    };
    format!("{}-{}-{}{}", &d[0..4], &d[4..6], &d[6..8], time)
}
