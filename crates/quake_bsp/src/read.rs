//! Types for reading BSP level files
//!

use std::io::{Read, Seek, SeekFrom};

use tracing::{debug, instrument};

use crate::entity::{self, Entity};
use crate::error::{Error, Result};
use crate::miptex::MiptexDirectory;
use crate::types::{
    BspHeader, ClipNode, Edge, Face, FaceListEntry, Leaf, LumpEntry, LumpKind, LumpRecord, Model,
    Node, Plane, SurfEdge, TexInfo, Vertex, BSP_VERSION,
};

/// A fully loaded BSP level.
///
/// ```no_run
/// fn list_lights(reader: impl std::io::Read + std::io::Seek) -> quake_bsp::error::Result<()> {
///     let bsp = quake_bsp::Bsp::load(reader)?;
///
///     for entity in bsp.entities() {
///         if entity.get("classname") == Some("light") {
///             println!("light at {:?}", entity.get("origin"));
///         }
///     }
///
///     Ok(())
/// }
/// ```
///
/// Loading is all-or-nothing: [`Bsp::load`] either returns a fully populated
/// level or an error, never a partial result. The loaded value is immutable
/// and owns all of its data; dropping it releases everything at once.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Bsp {
    entities: Vec<Entity>,
    planes: Vec<Plane>,
    miptex: MiptexDirectory,
    vertices: Vec<Vertex>,
    visdata: Vec<u8>,
    nodes: Vec<Node>,
    texinfo: Vec<TexInfo>,
    faces: Vec<Face>,
    lighting: Vec<u8>,
    clipnodes: Vec<ClipNode>,
    leaves: Vec<Leaf>,
    facelist: Vec<FaceListEntry>,
    edges: Vec<Edge>,
    surfedges: Vec<SurfEdge>,
    models: Vec<Model>,
}

impl Bsp {
    /// Load a level from a BSP byte stream.
    ///
    /// The header is read from the stream's current position; lump offsets in
    /// the header are absolute stream positions. The version must be 29, any
    /// other value fails before a single lump is read. Lumps are decoded in
    /// directory order; the first fatal problem (negative lump bounds, a lump
    /// reaching past the end of the stream, an undecodable miptexture
    /// directory) aborts the whole load.
    #[instrument(skip(reader), err)]
    pub fn load<R: Read + Seek>(mut reader: R) -> Result<Bsp> {
        let header = BspHeader::read(&mut reader)?;
        if header.version != BSP_VERSION {
            return Err(Error::UnsupportedVersion(header.version));
        }

        let entities_text = read_blob(&mut reader, &header, LumpKind::Entities)?;
        let entities = entity::parse_entities(&entities_text);
        debug!(count = entities.len(), "decoded entities lump");

        let planes = read_records(&mut reader, &header)?;
        let miptex = MiptexDirectory::parse(read_blob(&mut reader, &header, LumpKind::MipTextures)?)?;
        let vertices = read_records(&mut reader, &header)?;
        let visdata = read_blob(&mut reader, &header, LumpKind::Visibility)?;
        let nodes = read_records(&mut reader, &header)?;
        let texinfo = read_records(&mut reader, &header)?;
        let faces = read_records(&mut reader, &header)?;
        let lighting = read_blob(&mut reader, &header, LumpKind::Lighting)?;
        let clipnodes = read_records(&mut reader, &header)?;
        let leaves = read_records(&mut reader, &header)?;
        let facelist = read_records(&mut reader, &header)?;
        let edges = read_records(&mut reader, &header)?;
        let surfedges = read_records(&mut reader, &header)?;
        let models = read_records(&mut reader, &header)?;

        Ok(Bsp {
            entities,
            planes,
            miptex,
            vertices,
            visdata,
            nodes,
            texinfo,
            faces,
            lighting,
            clipnodes,
            leaves,
            facelist,
            edges,
            surfedges,
            models,
        })
    }

    /// Number of entities in the level.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// All entities in file order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Entity at the given position, if it exists.
    pub fn entity(&self, index: usize) -> Option<&Entity> {
        self.entities.get(index)
    }

    /// Value of the named property on the given entity: first match wins,
    /// `None` when the entity index or the key is unknown.
    pub fn entity_property(&self, index: usize, key: &str) -> Option<&str> {
        self.entity(index)?.get(key)
    }

    /// All splitting planes.
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// The miptexture directory.
    pub fn miptex(&self) -> &MiptexDirectory {
        &self.miptex
    }

    /// Number of miptexture directory slots, including absent ones.
    pub fn miptex_count(&self) -> usize {
        self.miptex.len()
    }

    /// All vertex positions.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Raw visibility data; empty when the lump is absent.
    pub fn visdata(&self) -> &[u8] {
        &self.visdata
    }

    /// All BSP tree nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All texture mapping records.
    pub fn texinfo(&self) -> &[TexInfo] {
        &self.texinfo
    }

    /// All surfaces.
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Raw lightmap samples; empty when the level is unlit.
    pub fn lighting(&self) -> &[u8] {
        &self.lighting
    }

    /// All collision hull nodes.
    pub fn clipnodes(&self) -> &[ClipNode] {
        &self.clipnodes
    }

    /// All BSP tree leaves.
    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    /// The face index list referenced by leaves.
    pub fn facelist(&self) -> &[FaceListEntry] {
        &self.facelist
    }

    /// All edges.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// The signed edge references faces are built from.
    pub fn surfedges(&self) -> &[SurfEdge] {
        &self.surfedges
    }

    /// All sub-models; model 0 is the world.
    pub fn models(&self) -> &[Model] {
        &self.models
    }
}

/// Validate a directory entry and position the stream at its lump.
/// Returns `None` for a zero-length (absent) lump.
fn seek_lump<R: Read + Seek>(
    reader: &mut R,
    entry: LumpEntry,
    kind: LumpKind,
) -> Result<Option<usize>> {
    if entry.length == 0 {
        return Ok(None);
    }
    if entry.offset < 0 || entry.length < 0 {
        return Err(Error::InvalidLumpBounds {
            lump: kind,
            offset: entry.offset,
            length: entry.length,
        });
    }
    reader.seek(SeekFrom::Start(entry.offset as u64))?;
    Ok(Some(entry.length as usize))
}

fn read_exact_or_truncated<R: Read>(reader: &mut R, buf: &mut [u8], kind: LumpKind) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => Error::TruncatedLump(kind),
        _ => Error::IOError(e),
    })
}

/// Read an opaque lump verbatim into an owned buffer.
fn read_blob<R: Read + Seek>(
    reader: &mut R,
    header: &BspHeader,
    kind: LumpKind,
) -> Result<Vec<u8>> {
    let Some(length) = seek_lump(reader, header.lump(kind), kind)? else {
        return Ok(Vec::new());
    };
    let mut blob = vec![0u8; length];
    read_exact_or_truncated(reader, &mut blob, kind)?;
    Ok(blob)
}

/// Read a fixed-record lump as `length / record_size` records, dropping any
/// trailing partial record. The full record span is fetched in one read so a
/// truncated file fails instead of yielding a short array.
fn read_records<R: Read + Seek, T: LumpRecord>(
    reader: &mut R,
    header: &BspHeader,
) -> Result<Vec<T>> {
    let Some(length) = seek_lump(reader, header.lump(T::KIND), T::KIND)? else {
        return Ok(Vec::new());
    };

    let count = length / T::SIZE;
    let mut raw = vec![0u8; count * T::SIZE];
    read_exact_or_truncated(reader, &mut raw, T::KIND)?;

    let mut bytes = raw.as_slice();
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        records.push(T::read(&mut bytes)?);
    }
    debug!(lump = %T::KIND, count, "decoded lump");
    Ok(records)
}
