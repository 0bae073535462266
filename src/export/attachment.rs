//! Save attachments of a message into a per-category folder.
//!
//! A file that already exists is never overwritten: the new attachment gets
//! a `_<unix-seconds>` suffix before its extension (and a counter after that
//! if the suffixed name is taken too). Files are opened with `create_new`,
//! so the check and the creation are a single filesystem operation.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, SorterError};
use crate::model::message::MimePart;

/// Upper bound on `_<stamp>_<n>` candidates tried for one attachment.
const MAX_RENAME_ATTEMPTS: u32 = 1000;

/// Name used when an attachment's filename is nothing but `.` or `..`.
const FALLBACK_FILENAME: &str = "attachment";

/// Writes attachment parts under `<base_dir>/<category>/`.
#[derive(Debug, Clone)]
pub struct AttachmentExtractor {
    base_dir: PathBuf,
}

impl AttachmentExtractor {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Save every attachment among `parts` and return the saved paths in
    /// part order.
    ///
    /// Only parts that are not `multipart/*` containers, carry a
    /// `Content-Disposition` header and have a non-empty filename are saved.
    /// Parts without a disposition are body content, even if they are named.
    ///
    /// A failed write removes the partial file and returns the error; files
    /// saved before it stay on disk.
    pub fn extract<'a, I>(&self, parts: I, category: &str) -> Result<Vec<PathBuf>>
    where
        I: IntoIterator<Item = MimePart<'a>>,
    {
        let mut saved = Vec::new();

        for part in parts {
            if part.composite || part.disposition.is_none() {
                continue;
            }
            let Some(filename) = part.filename.filter(|name| !name.is_empty()) else {
                debug!(disposition = ?part.disposition, "Skipping unnamed part");
                continue;
            };

            let folder = self.category_dir(category);
            std::fs::create_dir_all(&folder).map_err(|e| SorterError::io(&folder, e))?;

            let path = save_unique(&folder, &sanitize_filename(filename), &part.payload)?;
            info!(path = %path.display(), bytes = part.payload.len(), "Saved attachment");
            saved.push(path);
        }

        Ok(saved)
    }

    /// Folder for one category.
    pub fn category_dir(&self, category: &str) -> PathBuf {
        self.base_dir.join(sanitize_filename(category))
    }
}

/// Make an untrusted name safe to use as a single path component.
///
/// Path separators and control characters become `_`; everything else,
/// spaces and non-ASCII letters included, is kept so that a file that does
/// not collide is saved under exactly the name the sender gave it.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => FALLBACK_FILENAME.to_string(),
        _ => cleaned,
    }
}

/// Create a new file for `filename` inside `folder` and write `payload`.
fn save_unique(folder: &Path, filename: &str, payload: &[u8]) -> Result<PathBuf> {
    let (mut file, path) = create_unique(folder, filename)?;

    let written = file.write_all(payload).and_then(|()| file.flush());
    if let Err(e) = written {
        drop(file);
        if let Err(cleanup) = std::fs::remove_file(&path) {
            debug!(path = %path.display(), error = %cleanup, "Could not remove partial file");
        }
        return Err(SorterError::io(&path, e));
    }

    Ok(path)
}

/// Open `folder/filename`, or the first free disambiguated variant of it.
fn create_unique(folder: &Path, filename: &str) -> Result<(File, PathBuf)> {
    let path = folder.join(filename);
    if let Some(file) = try_create_new(&path)? {
        return Ok((file, path));
    }

    let stamp = chrono::Utc::now().timestamp();
    for attempt in 0..MAX_RENAME_ATTEMPTS {
        let candidate = folder.join(disambiguated_name(filename, stamp, attempt));
        if let Some(file) = try_create_new(&candidate)? {
            debug!(
                original = filename,
                renamed = %candidate.display(),
                "Attachment name already taken"
            );
            return Ok((file, candidate));
        }
    }

    Err(SorterError::io(
        path,
        std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "no free name for attachment",
        ),
    ))
}

/// `Ok(None)` if the path is already taken.
fn try_create_new(path: &Path) -> Result<Option<File>> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(SorterError::io(path, e)),
    }
}

/// `report.pdf` → `report_<stamp>.pdf`, then `report_<stamp>_1.pdf`, ...
fn disambiguated_name(filename: &str, stamp: i64, attempt: u32) -> String {
    let as_path = Path::new(filename);
    let stem = as_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    let suffix = if attempt == 0 {
        format!("_{stamp}")
    } else {
        format!("_{stamp}_{attempt}")
    };

    match as_path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}{suffix}.{ext}"),
        None => format!("{stem}{suffix}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    fn attachment<'a>(name: &'a str, payload: &'a [u8]) -> MimePart<'a> {
        MimePart {
            composite: false,
            disposition: Some("attachment"),
            filename: Some(name),
            payload: Cow::Borrowed(payload),
        }
    }

    #[test]
    fn test_saves_under_category_with_original_name() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = AttachmentExtractor::new(dir.path());

        let saved = extractor
            .extract([attachment("report.pdf", b"%PDF")], "Финансы")
            .unwrap();

        assert_eq!(saved, vec![dir.path().join("Финансы").join("report.pdf")]);
        assert_eq!(std::fs::read(&saved[0]).unwrap(), b"%PDF");
    }

    #[test]
    fn test_existing_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("Финансы");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("report.pdf"), b"old").unwrap();

        let extractor = AttachmentExtractor::new(dir.path());
        let saved = extractor
            .extract([attachment("report.pdf", b"new")], "Финансы")
            .unwrap();

        assert_eq!(saved.len(), 1);
        let name = saved[0].file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("report_"), "got {name}");
        assert!(name.ends_with(".pdf"), "got {name}");
        let stamp = &name["report_".len()..name.len() - ".pdf".len()];
        assert!(stamp.parse::<i64>().is_ok(), "got {name}");

        assert_eq!(std::fs::read(folder.join("report.pdf")).unwrap(), b"old");
        assert_eq!(std::fs::read(&saved[0]).unwrap(), b"new");
    }

    #[test]
    fn test_repeated_names_in_one_message_stay_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("Другое");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("report.pdf"), b"old").unwrap();

        let extractor = AttachmentExtractor::new(dir.path());
        let saved = extractor
            .extract(
                [attachment("report.pdf", b"one"), attachment("report.pdf", b"two")],
                "Другое",
            )
            .unwrap();

        assert_eq!(saved.len(), 2);
        assert_ne!(saved[0], saved[1]);
        assert_ne!(saved[0], folder.join("report.pdf"));
        assert_ne!(saved[1], folder.join("report.pdf"));
        assert_eq!(std::fs::read(&saved[0]).unwrap(), b"one");
        assert_eq!(std::fs::read(&saved[1]).unwrap(), b"two");
        assert_eq!(std::fs::read(folder.join("report.pdf")).unwrap(), b"old");
        assert_eq!(std::fs::read_dir(&folder).unwrap().count(), 3);
    }

    #[test]
    fn test_skips_composite_inline_and_unnamed_parts() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = AttachmentExtractor::new(dir.path());

        let parts = [
            MimePart {
                composite: true,
                disposition: None,
                filename: None,
                payload: Cow::Borrowed(&b""[..]),
            },
            // named but no disposition: body content
            MimePart {
                composite: false,
                disposition: None,
                filename: Some("body.txt"),
                payload: Cow::Borrowed(&b"hello"[..]),
            },
            MimePart {
                composite: false,
                disposition: Some("attachment"),
                filename: None,
                payload: Cow::Borrowed(&b"anon"[..]),
            },
            MimePart {
                composite: false,
                disposition: Some("attachment"),
                filename: Some(""),
                payload: Cow::Borrowed(&b"anon"[..]),
            },
        ];

        let saved = extractor.extract(parts, "Другое").unwrap();
        assert!(saved.is_empty());
        assert!(!dir.path().join("Другое").exists());
    }

    #[test]
    fn test_inline_disposition_with_filename_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = AttachmentExtractor::new(dir.path());
        let part = MimePart {
            composite: false,
            disposition: Some("inline"),
            filename: Some("logo.png"),
            payload: Cow::Borrowed(&b"\x89PNG"[..]),
        };
        let saved = extractor.extract([part], "Реклама").unwrap();
        assert_eq!(saved, vec![dir.path().join("Реклама").join("logo.png")]);
    }

    #[test]
    fn test_payload_round_trip_binary() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = AttachmentExtractor::new(dir.path());
        let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let saved = extractor
            .extract([attachment("blob.bin", &payload)], "Работа")
            .unwrap();
        assert_eq!(std::fs::read(&saved[0]).unwrap(), payload);
    }

    #[test]
    fn test_traversal_names_stay_inside_category() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = AttachmentExtractor::new(dir.path());
        let saved = extractor
            .extract([attachment("../../etc/passwd", b"x")], "Другое")
            .unwrap();
        assert_eq!(saved[0].parent().unwrap(), dir.path().join("Другое"));
        assert_eq!(saved[0].file_name().unwrap(), ".._.._etc_passwd");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("my report (1).pdf"), "my report (1).pdf");
        assert_eq!(sanitize_filename("Счёт №5.xlsx"), "Счёт №5.xlsx");
        assert_eq!(sanitize_filename("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_filename("tab\there"), "tab_here");
        assert_eq!(sanitize_filename(".."), "attachment");
        assert_eq!(sanitize_filename(""), "attachment");
    }

    #[test]
    fn test_disambiguated_name() {
        assert_eq!(disambiguated_name("report.pdf", 1700000000, 0), "report_1700000000.pdf");
        assert_eq!(disambiguated_name("report.pdf", 1700000000, 2), "report_1700000000_2.pdf");
        assert_eq!(disambiguated_name("archive.tar.gz", 5, 0), "archive.tar_5.gz");
        assert_eq!(disambiguated_name("README", 5, 0), "README_5");
        assert_eq!(disambiguated_name(".bashrc", 5, 0), ".bashrc_5");
    }
}
