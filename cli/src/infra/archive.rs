//! Infrastructure implementation of the `ArchiveExtractor` port.
//!
//! The format is sniffed from magic bytes, not the file name: downloads land
//! in scratch as a bare `archive` file.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::ArchiveExtractor;

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveFormat {
    Zip,
    TarGz,
}

fn sniff(path: &Path) -> Result<ArchiveFormat> {
    let mut head = [0u8; 4];
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let n = file.read(&mut head).context("reading archive header")?;
    if n >= 4 && head == ZIP_MAGIC {
        Ok(ArchiveFormat::Zip)
    } else if n >= 2 && head[..2] == GZIP_MAGIC {
        Ok(ArchiveFormat::TarGz)
    } else {
        anyhow::bail!("unsupported archive format")
    }
}

/// Unpacks zip and gzip-compressed tar archives on the blocking pool.
pub struct LocalArchiveExtractor;

impl ArchiveExtractor for LocalArchiveExtractor {
    async fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<()> {
        let archive = archive.to_path_buf();
        let dest = dest_dir.to_path_buf();
        tokio::task::spawn_blocking(move || extract_blocking(&archive, &dest))
            .await
            .context("extract task panicked")?
    }
}

fn extract_blocking(archive: &Path, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest).with_context(|| format!("creating {}", dest.display()))?;
    match sniff(archive)? {
        ArchiveFormat::Zip => extract_zip(archive, dest),
        ArchiveFormat::TarGz => {
            let file = File::open(archive)?;
            tar::Archive::new(flate2::read::GzDecoder::new(file))
                .unpack(dest)
                .context("unpacking tar.gz")
        }
    }
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file).context("reading zip")?;
    tracing::debug!(entries = zip.len(), dest = %dest.display(), "extracting zip");
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).context("reading zip entry")?;
        // Entries escaping `dest` (absolute or `..`) are skipped.
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let out = dest.join(relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&out)?;
            continue;
        }
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut target =
            File::create(&out).with_context(|| format!("creating {}", out.display()))?;
        std::io::copy(&mut entry, &mut target)
            .with_context(|| format!("writing {}", out.display()))?;
        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&out, std::fs::Permissions::from_mode(mode & 0o777))?;
        }
    }
    Ok(())
}
