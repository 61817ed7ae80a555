//! Base types for the structure of a BSP file.

use byteorder::{LittleEndian, ReadBytesExt};
use std::fmt;
use std::io::Read;

use crate::error::{Error, Result};

/// The only supported format version, written by the Quake toolchain.
pub const BSP_VERSION: i32 = 29;

/// Number of entries in the header's lump directory.
pub const LUMP_COUNT: usize = 15;

/// Identifies one of the fifteen lumps of a BSP file, in directory order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum LumpKind {
    /// Key/value entity text
    Entities = 0,
    /// Splitting planes
    Planes = 1,
    /// Miptexture directory and texture headers
    MipTextures = 2,
    /// Vertex positions
    Vertices = 3,
    /// Compressed visibility data (opaque)
    Visibility = 4,
    /// BSP tree nodes
    Nodes = 5,
    /// Texture mapping info
    TexInfo = 6,
    /// Renderable surfaces
    Faces = 7,
    /// Lightmap samples (opaque)
    Lighting = 8,
    /// Collision hull nodes
    ClipNodes = 9,
    /// BSP tree leaves
    Leaves = 10,
    /// Face index lists referenced by leaves
    FaceLists = 11,
    /// Vertex index pairs
    Edges = 12,
    /// Signed edge references
    SurfEdges = 13,
    /// Sub-models (world plus brush entities)
    Models = 14,
}

impl LumpKind {
    /// Lump name as it appears in the format documentation.
    pub fn name(&self) -> &'static str {
        match self {
            LumpKind::Entities => "entities",
            LumpKind::Planes => "planes",
            LumpKind::MipTextures => "miptextures",
            LumpKind::Vertices => "vertices",
            LumpKind::Visibility => "visibility",
            LumpKind::Nodes => "nodes",
            LumpKind::TexInfo => "texinfo",
            LumpKind::Faces => "faces",
            LumpKind::Lighting => "lighting",
            LumpKind::ClipNodes => "clipnodes",
            LumpKind::Leaves => "leaves",
            LumpKind::FaceLists => "facelists",
            LumpKind::Edges => "edges",
            LumpKind::SurfEdges => "surfedges",
            LumpKind::Models => "models",
        }
    }
}

impl fmt::Display for LumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One lump directory entry: where a lump's bytes live in the file.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct LumpEntry {
    /// Absolute byte offset of the lump data
    pub offset: i32,
    /// Byte length of the lump data
    pub length: i32,
}

impl LumpEntry {
    fn read(reader: &mut dyn Read) -> std::io::Result<Self> {
        let offset = reader.read_i32::<LittleEndian>()?;
        let length = reader.read_i32::<LittleEndian>()?;
        Ok(Self { offset, length })
    }
}

/// BSP file header
///
/// A 4-byte version number followed by the fixed-order lump directory,
/// 124 bytes in total. All values are little-endian.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BspHeader {
    /// Format version, 29 for Quake
    pub version: i32,
    /// The lump directory, indexed by [`LumpKind`]
    pub lumps: [LumpEntry; LUMP_COUNT],
}

impl BspHeader {
    /// Read a header from the stream's current position.
    pub fn read(reader: &mut dyn Read) -> Result<BspHeader> {
        let too_short = |e: std::io::Error| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => Error::TruncatedHeader,
            _ => Error::IOError(e),
        };

        let version = reader.read_i32::<LittleEndian>().map_err(too_short)?;
        let mut lumps = [LumpEntry::default(); LUMP_COUNT];
        for lump in &mut lumps {
            *lump = LumpEntry::read(reader).map_err(too_short)?;
        }
        Ok(BspHeader { version, lumps })
    }

    /// Directory entry for the given lump.
    pub fn lump(&self, kind: LumpKind) -> LumpEntry {
        self.lumps[kind as usize]
    }
}

/// A fixed-size record decoded from one of the array-shaped lumps.
///
/// `SIZE` is the on-disk record size in bytes; a lump holds
/// `length / SIZE` records with any trailing remainder ignored.
pub(crate) trait LumpRecord: Sized {
    /// On-disk size of one record in bytes
    const SIZE: usize;

    /// Which lump this record type is stored in
    const KIND: LumpKind;

    /// Decode one record from its little-endian byte layout.
    fn read(reader: &mut dyn Read) -> std::io::Result<Self>;
}

fn read_f32x3(reader: &mut dyn Read) -> std::io::Result<[f32; 3]> {
    Ok([
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
    ])
}

fn read_i16x3(reader: &mut dyn Read) -> std::io::Result<[i16; 3]> {
    Ok([
        reader.read_i16::<LittleEndian>()?,
        reader.read_i16::<LittleEndian>()?,
        reader.read_i16::<LittleEndian>()?,
    ])
}

/// A splitting plane: unit normal, distance from origin and an axis-type code
/// (0/1/2 mean the normal lies on the x/y/z axis).
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Plane {
    /// Unit normal vector
    pub normal: [f32; 3],
    /// Signed distance from the origin along the normal
    pub dist: f32,
    /// Axis-type code used by the engine to pick fast plane tests
    pub plane_type: i32,
}

impl LumpRecord for Plane {
    const SIZE: usize = 20;
    const KIND: LumpKind = LumpKind::Planes;

    fn read(reader: &mut dyn Read) -> std::io::Result<Self> {
        Ok(Self {
            normal: read_f32x3(reader)?,
            dist: reader.read_f32::<LittleEndian>()?,
            plane_type: reader.read_i32::<LittleEndian>()?,
        })
    }
}

/// A vertex position.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Vertex {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
    /// Z coordinate
    pub z: f32,
}

impl LumpRecord for Vertex {
    const SIZE: usize = 12;
    const KIND: LumpKind = LumpKind::Vertices;

    fn read(reader: &mut dyn Read) -> std::io::Result<Self> {
        Ok(Self {
            x: reader.read_f32::<LittleEndian>()?,
            y: reader.read_f32::<LittleEndian>()?,
            z: reader.read_f32::<LittleEndian>()?,
        })
    }
}

/// An interior BSP tree node.
///
/// A non-negative child value indexes another node; a negative value encodes a
/// leaf as `-(leaf_index + 1)`, per BSP convention. Stored as read, the sign
/// encoding is not unpacked.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Node {
    /// Index of the splitting plane
    pub plane_index: i32,
    /// Front and back children (negative encodes leaf space)
    pub children: [i16; 2],
    /// Bounding box minimums
    pub mins: [i16; 3],
    /// Bounding box maximums
    pub maxs: [i16; 3],
    /// First face index
    pub first_face: u16,
    /// Number of faces
    pub face_count: u16,
}

impl LumpRecord for Node {
    const SIZE: usize = 24;
    const KIND: LumpKind = LumpKind::Nodes;

    fn read(reader: &mut dyn Read) -> std::io::Result<Self> {
        Ok(Self {
            plane_index: reader.read_i32::<LittleEndian>()?,
            children: [
                reader.read_i16::<LittleEndian>()?,
                reader.read_i16::<LittleEndian>()?,
            ],
            mins: read_i16x3(reader)?,
            maxs: read_i16x3(reader)?,
            first_face: reader.read_u16::<LittleEndian>()?,
            face_count: reader.read_u16::<LittleEndian>()?,
        })
    }
}

/// Texture mapping info for a face: two texture-axis vectors plus the
/// miptexture the face is painted with.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct TexInfo {
    /// S and T axis vectors, each with a trailing displacement component
    pub vecs: [[f32; 4]; 2],
    /// Index into the miptexture directory
    pub miptex: i32,
    /// Flag bits (bit 0 marks animated sky/water surfaces)
    pub flags: i32,
}

impl LumpRecord for TexInfo {
    const SIZE: usize = 40;
    const KIND: LumpKind = LumpKind::TexInfo;

    fn read(reader: &mut dyn Read) -> std::io::Result<Self> {
        let mut vecs = [[0f32; 4]; 2];
        for vec in &mut vecs {
            for component in vec.iter_mut() {
                *component = reader.read_f32::<LittleEndian>()?;
            }
        }
        Ok(Self {
            vecs,
            miptex: reader.read_i32::<LittleEndian>()?,
            flags: reader.read_i32::<LittleEndian>()?,
        })
    }
}

/// A renderable surface.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Face {
    /// Index of the plane the face lies on
    pub plane_index: i16,
    /// 0 if the face is on the front of the plane, 1 for the back
    pub side: i16,
    /// First index into the surfedges lump
    pub first_edge: i32,
    /// Number of surfedges used by the face
    pub edge_count: i16,
    /// Index into the texinfo lump
    pub texinfo: i16,
    /// Light style bytes
    pub styles: [u8; 4],
    /// Byte offset into the lighting lump, -1 when unlit
    pub light_offset: i32,
}

impl LumpRecord for Face {
    const SIZE: usize = 20;
    const KIND: LumpKind = LumpKind::Faces;

    fn read(reader: &mut dyn Read) -> std::io::Result<Self> {
        let mut face = Self {
            plane_index: reader.read_i16::<LittleEndian>()?,
            side: reader.read_i16::<LittleEndian>()?,
            first_edge: reader.read_i32::<LittleEndian>()?,
            edge_count: reader.read_i16::<LittleEndian>()?,
            texinfo: reader.read_i16::<LittleEndian>()?,
            ..Self::default()
        };
        reader.read_exact(&mut face.styles)?;
        face.light_offset = reader.read_i32::<LittleEndian>()?;
        Ok(face)
    }
}

/// A node of one of the simplified collision hulls.
///
/// Children use sentinel values instead of leaf indices: `-1` means outside
/// the solid, `-2` means inside it. Preserved as read.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ClipNode {
    /// Index of the splitting plane
    pub plane_index: i32,
    /// Front and back children (-1 outside solid, -2 inside solid)
    pub children: [i16; 2],
}

impl LumpRecord for ClipNode {
    const SIZE: usize = 8;
    const KIND: LumpKind = LumpKind::ClipNodes;

    fn read(reader: &mut dyn Read) -> std::io::Result<Self> {
        Ok(Self {
            plane_index: reader.read_i32::<LittleEndian>()?,
            children: [
                reader.read_i16::<LittleEndian>()?,
                reader.read_i16::<LittleEndian>()?,
            ],
        })
    }
}

/// A BSP tree leaf.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Leaf {
    /// Contents code (solid, water, lava, ...)
    pub contents: i32,
    /// Bounding box minimums
    pub mins: [i16; 3],
    /// Bounding box maximums
    pub maxs: [i16; 3],
    /// First index into the facelists lump
    pub first_face: u16,
    /// Number of facelist entries
    pub face_count: u16,
    /// Ambient sound levels (water, sky, slime, lava)
    pub ambient_levels: [i8; 4],
}

impl LumpRecord for Leaf {
    const SIZE: usize = 24;
    const KIND: LumpKind = LumpKind::Leaves;

    fn read(reader: &mut dyn Read) -> std::io::Result<Self> {
        let mut leaf = Self {
            contents: reader.read_i32::<LittleEndian>()?,
            mins: read_i16x3(reader)?,
            maxs: read_i16x3(reader)?,
            first_face: reader.read_u16::<LittleEndian>()?,
            face_count: reader.read_u16::<LittleEndian>()?,
            ..Self::default()
        };
        for level in &mut leaf.ambient_levels {
            *level = reader.read_i8()?;
        }
        Ok(leaf)
    }
}

/// One entry of the facelists lump: an index into the faces lump.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct FaceListEntry(pub i16);

impl LumpRecord for FaceListEntry {
    const SIZE: usize = 2;
    const KIND: LumpKind = LumpKind::FaceLists;

    fn read(reader: &mut dyn Read) -> std::io::Result<Self> {
        Ok(Self(reader.read_i16::<LittleEndian>()?))
    }
}

/// An edge between two vertices. Edge 0 is never used; faces reference edges
/// through the surfedges lump.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Start and end vertex indices
    pub vertices: [u16; 2],
}

impl LumpRecord for Edge {
    const SIZE: usize = 4;
    const KIND: LumpKind = LumpKind::Edges;

    fn read(reader: &mut dyn Read) -> std::io::Result<Self> {
        Ok(Self {
            vertices: [
                reader.read_u16::<LittleEndian>()?,
                reader.read_u16::<LittleEndian>()?,
            ],
        })
    }
}

/// One entry of the surfedges lump: a signed reference to an edge, where a
/// negative value means the edge is traversed end-to-start.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct SurfEdge(pub i32);

impl LumpRecord for SurfEdge {
    const SIZE: usize = 4;
    const KIND: LumpKind = LumpKind::SurfEdges;

    fn read(reader: &mut dyn Read) -> std::io::Result<Self> {
        Ok(Self(reader.read_i32::<LittleEndian>()?))
    }
}

/// A sub-model: model 0 is the world, the rest are brush entities such as
/// doors and platforms.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Model {
    /// Bounding box minimums
    pub mins: [f32; 3],
    /// Bounding box maximums
    pub maxs: [f32; 3],
    /// Model origin
    pub origin: [f32; 3],
    /// Root node of each BSP hull (draw hull plus collision hulls)
    pub head_nodes: [i32; 4],
    /// First face index
    pub first_face: i32,
    /// Number of faces
    pub face_count: i32,
}

impl LumpRecord for Model {
    const SIZE: usize = 60;
    const KIND: LumpKind = LumpKind::Models;

    fn read(reader: &mut dyn Read) -> std::io::Result<Self> {
        let mins = read_f32x3(reader)?;
        let maxs = read_f32x3(reader)?;
        let origin = read_f32x3(reader)?;
        let mut head_nodes = [0i32; 4];
        for node in &mut head_nodes {
            *node = reader.read_i32::<LittleEndian>()?;
        }
        Ok(Self {
            mins,
            maxs,
            origin,
            head_nodes,
            first_face: reader.read_i32::<LittleEndian>()?,
            face_count: reader.read_i32::<LittleEndian>()?,
        })
    }
}
