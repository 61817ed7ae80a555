//! This library handles reading level data from **BSP** files used by *Quake*.
//!
//! # BSP Format Documentation
//!
//! This crate provides utilities to read and decode the **BSP** level format used by
//! the original *Quake* engine (format version 29). A BSP file stores the compiled
//! geometry, visibility, lighting and gameplay data of a single level. BSP files are
//! typically identified with the `.bsp` extension.
//!
//! ## File Structure
//!
//! A BSP file consists of a header followed by fifteen data regions called *lumps*.
//! Each lump is described by an (offset, length) pair in the header; lump data can
//! appear anywhere in the file and in any physical order.
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Version                | 4 bytes: Fixed value 29 for Quake                          |
//! | 0x0004         | Lump directory         | 15 entries of 8 bytes each                                 |
//!
//! ### Header
//!
//! The header consists of a 4-byte signed version number, which must equal `29`,
//! followed by the lump directory: fifteen entries of `{i32 offset, i32 length}`.
//! Offsets are absolute file positions; lengths are byte counts. The directory
//! order is fixed:
//!
//! | Index | Lump        | Contents                                              |
//! |-------|-------------|-------------------------------------------------------|
//! | 0     | Entities    | Key/value text blocks                                 |
//! | 1     | Planes      | 20-byte plane records                                 |
//! | 2     | Miptextures | Self-describing texture directory                     |
//! | 3     | Vertices    | 12-byte vertex positions                              |
//! | 4     | Visibility  | Opaque compressed visibility data                     |
//! | 5     | Nodes       | 24-byte BSP tree nodes                                |
//! | 6     | Texinfo     | 40-byte texture mapping records                       |
//! | 7     | Faces       | 20-byte surface records                               |
//! | 8     | Lighting    | Opaque lightmap samples                               |
//! | 9     | Clipnodes   | 8-byte collision hull nodes                           |
//! | 10    | Leaves      | 24-byte BSP tree leaves                               |
//! | 11    | Facelists   | i16 face indices referenced by leaves                 |
//! | 12    | Edges       | 4-byte vertex index pairs                             |
//! | 13    | Surfedges   | i32 signed edge references                            |
//! | 14    | Models      | 60-byte sub-model records                             |
//!
//! ### Fixed-record lumps
//!
//! Most lumps are arrays of tightly packed little-endian records. The element
//! count of a lump is `length / record_size` using truncating division; a
//! trailing partial record is ignored. Record layouts are documented on the
//! types in [`types`].
//!
//! ### Entities lump
//!
//! Plain text (not null-terminated on disk) consisting of `{ ... }` blocks, each
//! holding a sequence of `"key" "value"` quoted pairs. See [`Entity`] for the
//! grammar and recovery rules.
//!
//! ### Miptexture lump
//!
//! A self-describing directory: `i32 count` followed by `count` signed 32-bit
//! offsets, each pointing at a 40-byte texture header somewhere in the remaining
//! bytes of the same lump. See [`MiptexDirectory`].
//!
//! ## Additional Information
//!
//! - **File Extension**: `.bsp`
//! - **Endianness**: Little-endian for all multi-byte values
//! - **Version**: 29 (Quake); other versions are rejected
//!

pub mod entity;
pub mod error;
pub mod miptex;
pub mod read;
pub mod types;

pub use entity::{Entity, Property};
pub use miptex::{MipTexture, MiptexDirectory};
pub use read::Bsp;
pub use types::{BspHeader, LumpEntry, LumpKind, BSP_VERSION, LUMP_COUNT};
