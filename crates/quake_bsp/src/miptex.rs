//! Types for the miptexture lump: a self-describing texture directory.
//!
//! Unlike the fixed-record lumps, the miptexture lump carries its own
//! directory: an `i32` count followed by that many signed 32-bit offsets, each
//! relative to the start of the lump. The referenced 40-byte texture headers
//! live at arbitrary positions within the remaining bytes:
//!
//! | Offset (bytes) | Field                  | Description                                             |
//! |----------------|------------------------|---------------------------------------------------------|
//! | 0x0000         | Name                   | 16 bytes: Texture name, NUL padded                      |
//! | 0x0010         | Width                  | 4 bytes: Texture width in pixels                        |
//! | 0x0014         | Height                 | 4 bytes: Texture height in pixels                       |
//! | 0x0018         | Mip offsets            | 16 bytes: Four lump-relative offsets to the mip levels  |
//!
//! The mip level offsets inside a header are themselves relative to the lump
//! start, so a header is only meaningful next to the lump's raw bytes. The
//! directory therefore keeps the whole lump as one owned blob and hands out
//! borrowed [`MipTexture`] views into it.
//!
//! Individual directory entries are routinely missing or corrupt in maps found
//! in the wild. A slot whose offset is non-positive or does not leave room for
//! a full header resolves to `None` instead of failing the load; only a
//! directory whose count/offset table does not fit its own lump is an error.

use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// On-disk size of one miptexture header in bytes.
pub const MIPTEX_SIZE: usize = 40;

/// A borrowed view of one texture header inside the miptexture lump.
///
/// The view aliases the directory's raw blob and cannot outlive it, which
/// keeps the header's lump-relative mip offsets resolvable against
/// [`MiptexDirectory::raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MipTexture<'a> {
    raw: &'a [u8],
}

impl<'a> MipTexture<'a> {
    /// Texture name with the NUL padding stripped.
    ///
    /// Names are conventionally ASCII; anything that is not valid UTF-8 is
    /// replaced, use [`MipTexture::name_raw`] for the untouched bytes.
    pub fn name(&self) -> std::borrow::Cow<'a, str> {
        let name = self.name_raw();
        let end = name.iter().position(|&b| b == 0).unwrap_or(name.len());
        String::from_utf8_lossy(&name[..end])
    }

    /// The 16 name bytes exactly as stored.
    pub fn name_raw(&self) -> &'a [u8] {
        &self.raw[..16]
    }

    /// Texture width in pixels.
    pub fn width(&self) -> u32 {
        LittleEndian::read_u32(&self.raw[16..20])
    }

    /// Texture height in pixels.
    pub fn height(&self) -> u32 {
        LittleEndian::read_u32(&self.raw[20..24])
    }

    /// Lump-relative byte offsets of the four mip levels, largest first.
    pub fn mip_offsets(&self) -> [u32; 4] {
        let mut offsets = [0u32; 4];
        LittleEndian::read_u32_into(&self.raw[24..MIPTEX_SIZE], &mut offsets);
        offsets
    }
}

/// The decoded miptexture directory together with the lump's raw bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MiptexDirectory {
    raw: Vec<u8>,
    offsets: Vec<i32>,
    // Validated blob positions, one per directory slot.
    resolved: Vec<Option<usize>>,
}

impl MiptexDirectory {
    /// Decode the directory from the lump's raw bytes, taking ownership of
    /// them. An empty blob (absent lump) yields an empty directory.
    pub(crate) fn parse(raw: Vec<u8>) -> Result<MiptexDirectory> {
        if raw.is_empty() {
            return Ok(MiptexDirectory::default());
        }
        if raw.len() < 4 {
            return Err(Error::TruncatedMiptexDirectory);
        }

        let count = LittleEndian::read_i32(&raw[..4]);
        if count < 0 {
            return Err(Error::TruncatedMiptexDirectory);
        }
        let count = count as usize;
        let table_len = 4 + count * 4;
        if raw.len() < table_len {
            return Err(Error::TruncatedMiptexDirectory);
        }

        let mut offsets = vec![0i32; count];
        LittleEndian::read_i32_into(&raw[4..table_len], &mut offsets);

        let resolved = offsets
            .iter()
            .enumerate()
            .map(|(index, &offset)| resolve_offset(index, offset, raw.len()))
            .collect();

        debug!(count, "decoded miptexture directory");

        Ok(MiptexDirectory {
            raw,
            offsets,
            resolved,
        })
    }

    /// Number of directory slots, including absent ones.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the directory has no slots at all.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// The raw directory offsets exactly as stored, one per slot.
    pub fn offsets(&self) -> &[i32] {
        &self.offsets
    }

    /// The lump's entire raw bytes; mip level offsets index into this.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Borrow the texture header for the given slot. Returns `None` for an
    /// out-of-range index or a slot whose stored offset was unusable.
    pub fn get(&self, index: usize) -> Option<MipTexture<'_>> {
        let position = (*self.resolved.get(index)?)?;
        Some(MipTexture {
            raw: &self.raw[position..position + MIPTEX_SIZE],
        })
    }
}

fn resolve_offset(index: usize, offset: i32, blob_len: usize) -> Option<usize> {
    if offset <= 0 {
        debug!(index, offset, "miptexture slot not present");
        return None;
    }
    let position = offset as usize;
    if position >= blob_len || position + MIPTEX_SIZE > blob_len {
        warn!(index, offset, blob_len, "miptexture offset out of range");
        return None;
    }
    Some(position)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::Error;

    fn directory_blob(offsets: &[i32], trailing: &[u8]) -> Vec<u8> {
        let mut blob = (offsets.len() as i32).to_le_bytes().to_vec();
        for offset in offsets {
            blob.extend_from_slice(&offset.to_le_bytes());
        }
        blob.extend_from_slice(trailing);
        blob
    }

    fn texture_header(name: &str, width: u32, height: u32) -> Vec<u8> {
        let mut header = vec![0u8; 16];
        header[..name.len()].copy_from_slice(name.as_bytes());
        header.extend_from_slice(&width.to_le_bytes());
        header.extend_from_slice(&height.to_le_bytes());
        let mut offset = MIPTEX_SIZE as u32;
        for level in 0..4 {
            header.extend_from_slice(&offset.to_le_bytes());
            offset += (width * height) >> (2 * level);
        }
        header
    }

    #[test]
    fn parse_empty_blob_is_empty_directory() {
        let directory = MiptexDirectory::parse(Vec::new()).unwrap();
        assert_eq!(directory.len(), 0);
        assert!(directory.is_empty());
        assert_eq!(directory.get(0), None);
    }

    #[test]
    fn parse_short_blob_fails() {
        assert!(matches!(
            MiptexDirectory::parse(vec![0x02, 0x00]),
            Err(Error::TruncatedMiptexDirectory)
        ));
    }

    #[test]
    fn parse_truncated_table_fails() {
        // Count says 4 entries but only one offset follows.
        let mut blob = directory_blob(&[12], &[]);
        blob[..4].copy_from_slice(&4i32.to_le_bytes());

        assert!(matches!(
            MiptexDirectory::parse(blob),
            Err(Error::TruncatedMiptexDirectory)
        ));
    }

    #[test]
    fn parse_negative_count_fails() {
        assert!(matches!(
            MiptexDirectory::parse((-1i32).to_le_bytes().to_vec()),
            Err(Error::TruncatedMiptexDirectory)
        ));
    }

    #[test]
    fn invalid_offsets_resolve_to_absent_slots() {
        let directory = MiptexDirectory::parse(directory_blob(&[-1, 9_999_999], &[])).unwrap();

        assert_eq!(directory.len(), 2);
        assert_eq!(directory.offsets(), &[-1, 9_999_999]);
        assert_eq!(directory.get(0), None);
        assert_eq!(directory.get(1), None);
    }

    #[test]
    fn header_extending_past_blob_is_absent() {
        // Offset lands inside the blob but the header would run past its end.
        let blob = directory_blob(&[8], &[0u8; 16]);
        let directory = MiptexDirectory::parse(blob).unwrap();

        assert_eq!(directory.get(0), None);
    }

    #[test]
    fn valid_slot_aliases_the_blob() {
        // One entry whose header starts right after the offset table.
        let header = texture_header("bricks", 64, 32);
        let blob = directory_blob(&[8], &header);
        let directory = MiptexDirectory::parse(blob).unwrap();

        let texture = directory.get(0).expect("slot should resolve");
        assert_eq!(texture.name(), "bricks");
        assert_eq!(texture.width(), 64);
        assert_eq!(texture.height(), 32);
        assert_eq!(texture.mip_offsets()[0], MIPTEX_SIZE as u32);

        assert_eq!(directory.get(1), None);
    }
}
