//! NSO (Nintendo Shared Object) - the executable format the loader maps.
//!
//! The patcher only needs two things from an NSO: the build id its tables are
//! keyed by, and the mapped image it writes into. [`Nso::map`] produces the
//! latter the same way the loader lays a module out in memory.
//!
//! ## Header (0x100 bytes)
//! ```text
//! [0x00] Magic "NSO0"                                  (4 bytes)
//! [0x04] Version                                       (u32 LE)
//! [0x08] Reserved                                      (4 bytes)
//! [0x0C] Flags                                         (u32 LE)
//!        bit 0-2: text/ro/data compressed
//!        bit 3-5: text/ro/data hash checked
//! [0x10] Text segment { FileOffset, MemoryOffset, Size } (3 × u32 LE)
//! [0x1C] ModuleNameOffset                              (u32 LE)
//! [0x20] Ro segment                                    (3 × u32 LE)
//! [0x2C] ModuleNameSize                                (u32 LE)
//! [0x30] Data segment                                  (3 × u32 LE)
//! [0x3C] BssSize                                       (u32 LE)
//! [0x40] ModuleId / build id                           (0x20 bytes)
//! [0x60] Text/Ro/Data FileSize (compressed)            (3 × u32 LE)
//! [0x6C] Reserved                                      (0x1C bytes)
//! [0x88] ApiInfo / DynStr / DynSym extents             (3 × 2 × u32 LE)
//! [0xA0] Text/Ro/Data SHA-256                          (3 × 0x20 bytes)
//! ```
//!
//! Segments are LZ4 block compressed when their flag bit is set. Hashes are
//! recorded but not verified.

use std::io::{Read, Seek, SeekFrom};

use crate::module_id::{MODULE_ID_SIZE, ModuleId};
use crate::utils::{align_up, bytesa, le_u32, magic};
use crate::{Error, Result};

/// Size of the NSO header, and of the protected region of a mapped module.
pub const NSO_HEADER_SIZE: usize = 0x100;

const PAGE_SIZE: usize = 0x1000;

/// One of the three loadable segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Offset of the (possibly compressed) data in the file.
    pub file_offset: u32,
    /// Offset of the segment in the mapped image.
    pub memory_offset: u32,
    /// Decompressed size.
    pub size: u32,
    /// Size of the data in the file.
    pub file_size: u32,
    pub compressed: bool,
    pub check_hash: bool,
    pub hash: [u8; 0x20],
}

impl Segment {
    fn memory_end(&self) -> Result<usize> {
        (self.memory_offset as usize)
            .checked_add(self.size as usize)
            .ok_or(Error::InvalidRange)
    }
}

/// Parsed NSO header.
#[derive(Debug, Clone)]
pub struct Nso {
    pub version: u32,
    /// Text, ro and data, in that order.
    pub segments: [Segment; 3],
    pub bss_size: u32,
    /// Full build id; [`Nso::module_id`] is its leading part.
    pub build_id: [u8; 0x20],
    pub module_name_offset: u32,
    pub module_name_size: u32,
    /// Stream position of the header.
    pub(crate) base: u64,
}

impl Nso {
    /// Parse an NSO header from `r`, positioned at the "NSO0" magic.
    pub fn parse<R: Read + Seek>(r: &mut R) -> Result<Self> {
        let base = r.stream_position()?;

        magic(r, b"NSO0")?;
        let version = le_u32(r)?;
        let _reserved = le_u32(r)?;
        let flags = le_u32(r)?;

        let mut layout = [(0u32, 0u32, 0u32); 3];
        let mut trailers = [0u32; 3];
        for (slot, trailer) in layout.iter_mut().zip(trailers.iter_mut()) {
            *slot = (le_u32(r)?, le_u32(r)?, le_u32(r)?);
            *trailer = le_u32(r)?;
        }
        let [module_name_offset, module_name_size, bss_size] = trailers;

        let build_id = bytesa::<0x20>(r)?;
        let file_sizes = [le_u32(r)?, le_u32(r)?, le_u32(r)?];
        let _reserved = bytesa::<0x1C>(r)?;
        let _extents = bytesa::<0x18>(r)?;
        let hashes = [bytesa::<0x20>(r)?, bytesa::<0x20>(r)?, bytesa::<0x20>(r)?];

        let segments = std::array::from_fn(|i| {
            let (file_offset, memory_offset, size) = layout[i];
            Segment {
                file_offset,
                memory_offset,
                size,
                file_size: file_sizes[i],
                compressed: flags & (1 << i) != 0,
                check_hash: flags & (1 << (i + 3)) != 0,
                hash: hashes[i],
            }
        });

        let nso = Self {
            version,
            segments,
            bss_size,
            build_id,
            module_name_offset,
            module_name_size,
            base,
        };
        nso.validate()?;
        Ok(nso)
    }

    fn validate(&self) -> Result<()> {
        let [text, ro, data] = &self.segments;
        if text.memory_offset != 0 {
            return Err(Error::Parse("text segment must start the image"));
        }
        if text.memory_end()? > ro.memory_offset as usize
            || ro.memory_end()? > data.memory_offset as usize
        {
            return Err(Error::Parse("segments overlap or are out of order"));
        }
        for segment in &self.segments {
            if !segment.compressed && segment.file_size != segment.size {
                return Err(Error::Parse("uncompressed segment size mismatch"));
            }
        }
        Ok(())
    }

    /// Identity used to look up patches.
    pub fn module_id(&self) -> ModuleId {
        let mut id = [0u8; MODULE_ID_SIZE];
        id.copy_from_slice(&self.build_id[..MODULE_ID_SIZE]);
        ModuleId::new(id)
    }

    /// Leading bytes of the build id, in the form the patcher entry points take.
    pub fn module_id_bytes(&self) -> [u8; MODULE_ID_SIZE] {
        *self.module_id().as_bytes()
    }

    /// Page-aligned size of the mapped image, bss included.
    pub fn mapped_size(&self) -> Result<usize> {
        let [text, ro, data] = &self.segments;
        let end = data
            .memory_end()?
            .checked_add(self.bss_size as usize)
            .ok_or(Error::InvalidRange)?;
        let end = end.max(text.memory_end()?).max(ro.memory_end()?);
        Ok(align_up(end, PAGE_SIZE))
    }

    /// Load every segment into a zero-filled image.
    ///
    /// `r` must be the same stream [`Nso::parse`] read the header from.
    pub fn map<R: Read + Seek>(&self, r: &mut R) -> Result<Vec<u8>> {
        let mut image = vec![0u8; self.mapped_size()?];
        for segment in &self.segments {
            r.seek(SeekFrom::Start(self.base + segment.file_offset as u64))?;
            let dst = image
                .get_mut(segment.memory_offset as usize..segment.memory_end()?)
                .ok_or(Error::InvalidRange)?;
            if segment.compressed {
                let mut src = vec![0u8; segment.file_size as usize];
                r.read_exact(&mut src)?;
                decompress_segment(&src, dst)?;
            } else {
                r.read_exact(dst)?;
            }
        }
        Ok(image)
    }
}

#[cfg(feature = "compression")]
fn decompress_segment(src: &[u8], dst: &mut [u8]) -> Result<()> {
    crate::compression::lz4::decompress_lz4_block(src, dst)
}

#[cfg(not(feature = "compression"))]
fn decompress_segment(_src: &[u8], _dst: &mut [u8]) -> Result<()> {
    Err(Error::Unsupported(
        "compressed segment requires the `compression` feature",
    ))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const BUILD_ID: [u8; 0x20] = [0x42; 0x20];

    /// Build an NSO from uncompressed or pre-compressed segment payloads.
    /// `payloads[i]` is `(file bytes, decompressed size)`.
    fn build_nso(payloads: [(&[u8], usize); 3], flags: u32, bss: u32) -> Vec<u8> {
        let mut header = Vec::with_capacity(NSO_HEADER_SIZE);
        header.extend_from_slice(b"NSO0");
        header.extend_from_slice(&0u32.to_le_bytes());
        header.extend_from_slice(&0u32.to_le_bytes());
        header.extend_from_slice(&flags.to_le_bytes());

        let mut file_offset = NSO_HEADER_SIZE as u32;
        let mut memory_offset = 0u32;
        let trailers = [0u32, 0, bss];
        for (i, (bytes, size)) in payloads.iter().enumerate() {
            header.extend_from_slice(&file_offset.to_le_bytes());
            header.extend_from_slice(&memory_offset.to_le_bytes());
            header.extend_from_slice(&(*size as u32).to_le_bytes());
            header.extend_from_slice(&trailers[i].to_le_bytes());
            file_offset += bytes.len() as u32;
            memory_offset += align_up(*size, PAGE_SIZE) as u32;
        }
        header.extend_from_slice(&BUILD_ID);
        for (bytes, _) in &payloads {
            header.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        }
        header.resize(NSO_HEADER_SIZE, 0);

        for (bytes, _) in &payloads {
            header.extend_from_slice(bytes);
        }
        header
    }

    /// Three 4-byte segments; `text_size` is the decompressed text size.
    fn small_nso(text_size: usize, flags: u32) -> Vec<u8> {
        let seg = &[0u8; 4][..];
        build_nso([(seg, text_size), (seg, 4), (seg, 4)], flags, 0)
    }

    #[test]
    fn module_id_is_leading_build_id_bytes() {
        let mut file = small_nso(4, 0);
        let build_id: [u8; 0x20] = std::array::from_fn(|i| i as u8);
        file[0x40..0x60].copy_from_slice(&build_id);
        let nso = Nso::parse(&mut Cursor::new(file)).unwrap();

        let expected: [u8; MODULE_ID_SIZE] = std::array::from_fn(|i| i as u8);
        assert_eq!(nso.module_id(), ModuleId::new(expected));
        assert_eq!(nso.module_id_bytes(), expected);
    }

    #[test]
    fn maps_uncompressed_segments() {
        let text = [0xAAu8; 0x30];
        let ro = [0xBBu8; 0x10];
        let data = [0xCCu8; 0x20];
        let file = build_nso(
            [(&text[..], 0x30), (&ro[..], 0x10), (&data[..], 0x20)],
            0,
            0x1800,
        );

        let mut r = Cursor::new(file);
        let nso = Nso::parse(&mut r).unwrap();
        assert_eq!(nso.module_id(), ModuleId::new([0x42; 16]));
        assert_eq!(nso.segments[1].memory_offset, 0x1000);
        assert_eq!(nso.mapped_size().unwrap(), 0x4000);

        let image = nso.map(&mut r).unwrap();
        assert_eq!(image.len(), 0x4000);
        assert_eq!(&image[..0x30], &text);
        assert!(image[0x30..0x1000].iter().all(|&b| b == 0));
        assert_eq!(&image[0x1000..0x1010], &ro);
        assert_eq!(&image[0x2000..0x2020], &data);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut file = small_nso(4, 0);
        file[3] = b'1';
        assert!(matches!(Nso::parse(&mut Cursor::new(file)), Err(Error::BadMagic)));
    }

    #[test]
    fn truncated_header_is_eof() {
        let file = small_nso(4, 0);
        let r = &mut Cursor::new(&file[..0x80]);
        assert!(matches!(Nso::parse(r), Err(Error::UnexpectedEof)));
    }

    #[test]
    fn rejects_size_mismatch_for_plain_segment() {
        let file = small_nso(8, 0);
        assert!(matches!(
            Nso::parse(&mut Cursor::new(file)),
            Err(Error::Parse(_))
        ));
    }

    #[cfg(not(feature = "compression"))]
    #[test]
    fn compressed_segment_needs_feature() {
        let file = small_nso(8, 0b001);
        let mut r = Cursor::new(file);
        let nso = Nso::parse(&mut r).unwrap();
        assert!(matches!(nso.map(&mut r), Err(Error::Unsupported(_))));
    }

    #[cfg(feature = "compression")]
    #[test]
    fn maps_compressed_text() {
        let text: Vec<u8> = (0..0x800u32).map(|i| (i % 7) as u8).collect();
        let packed = lz4_flex::block::compress(&text);
        let ro = [0x11u8; 8];
        let data = [0x22u8; 8];
        let file = build_nso(
            [(&packed[..], text.len()), (&ro[..], 8), (&data[..], 8)],
            0b001,
            0,
        );

        let mut r = Cursor::new(file);
        let nso = Nso::parse(&mut r).unwrap();
        assert!(nso.segments[0].compressed);
        let image = nso.map(&mut r).unwrap();
        assert_eq!(&image[..text.len()], &text[..]);
        assert_eq!(&image[0x1000..0x1008], &ro);
    }
}
