use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use rollcall_identity::IdentityId;

use crate::cosine::l2_normalize;
use crate::error::GalleryError;
use crate::index::{Entry, GallerySnapshot};

/// Binary format magic and version.
const GALLERY_MAGIC: [u8; 4] = [b'F', b'G', b'A', b'L'];
const GALLERY_VERSION: u32 = 1;

/// Save serializes a gallery snapshot to a writer in a compact binary
/// format:
///
/// ```text
/// [4B magic "FGAL"] [4B version=1]
/// [4B dim] [4B count]
/// For each entry:
///   [16B identity UUID]
///   [dim x 4B float32 template]
/// ```
///
/// All multi-byte values are little-endian.
pub fn save(snapshot: &GallerySnapshot, w: &mut dyn Write) -> Result<(), GalleryError> {
    let mut bw = BufWriter::new(w);
    let write_err = |e: std::io::Error| GalleryError::Io(e.to_string());

    // Header.
    bw.write_all(&GALLERY_MAGIC).map_err(write_err)?;
    bw.write_all(&GALLERY_VERSION.to_le_bytes()).map_err(write_err)?;
    bw.write_all(&(snapshot.dim as u32).to_le_bytes()).map_err(write_err)?;
    bw.write_all(&(snapshot.entries.len() as u32).to_le_bytes()).map_err(write_err)?;

    // Entries.
    for entry in &snapshot.entries {
        bw.write_all(entry.identity_id.as_bytes()).map_err(write_err)?;
        for &v in &entry.vector {
            bw.write_all(&v.to_le_bytes()).map_err(write_err)?;
        }
    }

    bw.flush().map_err(write_err)?;
    Ok(())
}

/// Load deserializes a snapshot from a reader.
///
/// Templates are re-normalized on the way in rather than trusted as
/// stored; a zero template is rejected as corrupt.
pub fn load(r: &mut dyn Read) -> Result<GallerySnapshot, GalleryError> {
    let mut br = BufReader::new(r);
    let read_err = |e: std::io::Error| GalleryError::Io(e.to_string());

    let read_u32 = |br: &mut BufReader<&mut dyn Read>| -> Result<u32, GalleryError> {
        let mut buf = [0u8; 4];
        br.read_exact(&mut buf)
            .map_err(|e| GalleryError::Io(e.to_string()))?;
        Ok(u32::from_le_bytes(buf))
    };

    // Magic.
    let mut magic = [0u8; 4];
    br.read_exact(&mut magic).map_err(read_err)?;
    if magic != GALLERY_MAGIC {
        return Err(GalleryError::InvalidFormat(format!(
            "invalid magic {magic:?}"
        )));
    }

    // Version.
    let version = read_u32(&mut br)?;
    if version != GALLERY_VERSION {
        return Err(GalleryError::InvalidFormat(format!(
            "unsupported version {version} (want {GALLERY_VERSION})"
        )));
    }

    let dim = read_u32(&mut br)? as usize;
    if dim == 0 {
        return Err(GalleryError::InvalidFormat("invalid dimension 0".into()));
    }
    let count = read_u32(&mut br)? as usize;

    let mut entries = Vec::with_capacity(count.min(1 << 20));
    for _ in 0..count {
        let mut id_bytes = [0u8; 16];
        br.read_exact(&mut id_bytes).map_err(read_err)?;
        let identity_id = IdentityId::from_bytes(id_bytes);

        let mut vector = vec![0.0f32; dim];
        for v in &mut vector {
            let mut fb = [0u8; 4];
            br.read_exact(&mut fb).map_err(read_err)?;
            *v = f32::from_le_bytes(fb);
        }
        if !l2_normalize(&mut vector) {
            return Err(GalleryError::InvalidFormat(format!(
                "degenerate template for identity {identity_id}"
            )));
        }

        entries.push(Entry {
            identity_id,
            vector,
        });
    }

    Ok(GallerySnapshot::from_entries(dim, entries))
}

/// Save a snapshot to a file, creating or truncating it.
pub fn save_file(snapshot: &GallerySnapshot, path: &Path) -> Result<(), GalleryError> {
    let mut f = File::create(path).map_err(|e| GalleryError::Io(e.to_string()))?;
    save(snapshot, &mut f)
}

/// Load a snapshot from a file written by [`save_file`].
pub fn load_file(path: &Path) -> Result<GallerySnapshot, GalleryError> {
    let mut f = File::open(path).map_err(|e| GalleryError::Io(e.to_string()))?;
    load(&mut f)
}
