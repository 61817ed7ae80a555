use std::io::Cursor;

use quake_bsp::error::Error;
use quake_bsp::{Bsp, LumpKind, BSP_VERSION, LUMP_COUNT};
use tracing_test::traced_test;

const HEADER_SIZE: usize = 4 + LUMP_COUNT * 8;

/// Builds a complete BSP byte image: header at the front, lump data packed
/// behind it in directory order.
#[derive(Default)]
struct LevelBuilder {
    lumps: [Vec<u8>; LUMP_COUNT],
}

impl LevelBuilder {
    fn new() -> Self {
        Self::default()
    }

    fn lump(mut self, kind: LumpKind, bytes: Vec<u8>) -> Self {
        self.lumps[kind as usize] = bytes;
        self
    }

    fn build(&self) -> Vec<u8> {
        let mut image = BSP_VERSION.to_le_bytes().to_vec();
        let mut offset = HEADER_SIZE as i32;
        for lump in &self.lumps {
            image.extend_from_slice(&offset.to_le_bytes());
            image.extend_from_slice(&(lump.len() as i32).to_le_bytes());
            offset += lump.len() as i32;
        }
        for lump in &self.lumps {
            image.extend_from_slice(lump);
        }
        image
    }
}

fn set_version(image: &mut [u8], version: i32) {
    image[..4].copy_from_slice(&version.to_le_bytes());
}

fn set_lump_entry(image: &mut [u8], kind: LumpKind, offset: i32, length: i32) {
    let base = 4 + (kind as usize) * 8;
    image[base..base + 4].copy_from_slice(&offset.to_le_bytes());
    image[base + 4..base + 8].copy_from_slice(&length.to_le_bytes());
}

fn f32s(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn i32s(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn i16s(values: &[i16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn plane_bytes(normal: [f32; 3], dist: f32, plane_type: i32) -> Vec<u8> {
    let mut bytes = f32s(&normal);
    bytes.extend_from_slice(&dist.to_le_bytes());
    bytes.extend_from_slice(&plane_type.to_le_bytes());
    bytes
}

fn face_bytes(plane_index: i16, first_edge: i32, edge_count: i16, texinfo: i16) -> Vec<u8> {
    let mut bytes = i16s(&[plane_index, 0]);
    bytes.extend_from_slice(&first_edge.to_le_bytes());
    bytes.extend(i16s(&[edge_count, texinfo]));
    bytes.extend_from_slice(&[0xFF; 4]); // styles
    bytes.extend_from_slice(&(-1i32).to_le_bytes()); // unlit
    bytes
}

fn miptex_lump(offsets: &[i32], trailing: &[u8]) -> Vec<u8> {
    let mut bytes = (offsets.len() as i32).to_le_bytes().to_vec();
    bytes.extend(i32s(offsets));
    bytes.extend_from_slice(trailing);
    bytes
}

fn texture_header(name: &str, width: u32, height: u32) -> Vec<u8> {
    let mut header = vec![0u8; 16];
    header[..name.len()].copy_from_slice(name.as_bytes());
    header.extend_from_slice(&width.to_le_bytes());
    header.extend_from_slice(&height.to_le_bytes());
    for offset in [40u32, 0, 0, 0] {
        header.extend_from_slice(&offset.to_le_bytes());
    }
    header
}

fn full_level() -> Vec<u8> {
    let entities =
        br#"{"classname" "worldspawn" "wad" "quake.wad"} {"classname" "light" "origin" "0 0 0"}"#;

    let mut node = i32s(&[4]); // plane_index
    node.extend(i16s(&[1, -2])); // children
    node.extend(i16s(&[-128, -128, -64, 128, 128, 64])); // bounds
    node.extend_from_slice(&1u16.to_le_bytes());
    node.extend_from_slice(&1u16.to_le_bytes());

    let mut texinfo = f32s(&[1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    texinfo.extend(i32s(&[0, 0])); // miptex 0, no flags

    let mut clipnodes = i32s(&[0]);
    clipnodes.extend(i16s(&[-1, -2]));
    clipnodes.extend(i32s(&[1]));
    clipnodes.extend(i16s(&[0, -1]));

    let mut leaf = i32s(&[-2]); // contents
    leaf.extend(i16s(&[-128, -128, -64, 128, 128, 64]));
    leaf.extend_from_slice(&0u16.to_le_bytes());
    leaf.extend_from_slice(&1u16.to_le_bytes());
    leaf.extend_from_slice(&[0, 0, 0, 0]); // ambient levels

    let mut model = f32s(&[
        -128.0, -128.0, -64.0, // mins
        128.0, 128.0, 64.0, // maxs
        0.0, 0.0, 0.0, // origin
    ]);
    model.extend(i32s(&[0, 1, 1, 0, 0, 1]));

    LevelBuilder::new()
        .lump(LumpKind::Entities, entities.to_vec())
        .lump(
            LumpKind::Planes,
            [
                plane_bytes([1.0, 0.0, 0.0], 16.0, 0),
                plane_bytes([0.0, 0.0, 1.0], -32.0, 2),
            ]
            .concat(),
        )
        .lump(
            LumpKind::MipTextures,
            miptex_lump(&[12, -1], &texture_header("floor01", 64, 64)),
        )
        .lump(
            LumpKind::Vertices,
            f32s(&[0.0, 0.0, 0.0, 64.0, 0.0, 0.0, 64.0, 64.0, 0.0]),
        )
        .lump(LumpKind::Visibility, vec![0x01, 0x82, 0x04])
        .lump(LumpKind::Nodes, node)
        .lump(LumpKind::TexInfo, texinfo)
        .lump(LumpKind::Faces, face_bytes(0, 0, 3, 0))
        .lump(LumpKind::Lighting, vec![0xAA; 16])
        .lump(LumpKind::ClipNodes, clipnodes)
        .lump(LumpKind::Leaves, leaf)
        .lump(LumpKind::FaceLists, i16s(&[0]))
        .lump(
            LumpKind::Edges,
            [0u16, 1, 1, 2]
                .iter()
                .flat_map(|v| v.to_le_bytes())
                .collect(),
        )
        .lump(LumpKind::SurfEdges, i32s(&[0, 1, -1]))
        .lump(LumpKind::Models, model)
        .build()
}

#[traced_test]
#[test]
fn load_full_level() -> Result<(), Error> {
    let bsp = Bsp::load(Cursor::new(full_level()))?;

    assert_eq!(bsp.entity_count(), 2);
    assert_eq!(bsp.entity_property(0, "classname"), Some("worldspawn"));
    assert_eq!(bsp.entity_property(0, "wad"), Some("quake.wad"));
    assert_eq!(bsp.entity_property(1, "origin"), Some("0 0 0"));
    assert_eq!(bsp.entity_property(1, "missing"), None);
    assert_eq!(bsp.entity_property(7, "classname"), None);

    assert_eq!(bsp.planes().len(), 2);
    assert_eq!(bsp.planes()[0].normal, [1.0, 0.0, 0.0]);
    assert_eq!(bsp.planes()[1].dist, -32.0);
    assert_eq!(bsp.planes()[1].plane_type, 2);

    assert_eq!(bsp.miptex_count(), 2);
    let texture = bsp.miptex().get(0).expect("first slot should resolve");
    assert_eq!(texture.name(), "floor01");
    assert_eq!(texture.width(), 64);
    assert_eq!(texture.height(), 64);
    assert_eq!(bsp.miptex().get(1), None);

    assert_eq!(bsp.vertices().len(), 3);
    assert_eq!(bsp.vertices()[1].x, 64.0);
    assert_eq!(bsp.visdata(), &[0x01, 0x82, 0x04]);
    assert_eq!(bsp.nodes().len(), 1);
    assert_eq!(bsp.nodes()[0].children, [1, -2]);
    assert_eq!(bsp.texinfo().len(), 1);
    assert_eq!(bsp.faces().len(), 1);
    assert_eq!(bsp.faces()[0].light_offset, -1);
    assert_eq!(bsp.lighting().len(), 16);
    assert_eq!(bsp.clipnodes().len(), 2);
    assert_eq!(bsp.clipnodes()[0].children, [-1, -2]);
    assert_eq!(bsp.leaves().len(), 1);
    assert_eq!(bsp.leaves()[0].contents, -2);
    assert_eq!(bsp.facelist().len(), 1);
    assert_eq!(bsp.edges().len(), 2);
    assert_eq!(bsp.edges()[1].vertices, [1, 2]);
    assert_eq!(bsp.surfedges().len(), 3);
    assert_eq!(bsp.surfedges()[2].0, -1);
    assert_eq!(bsp.models().len(), 1);
    assert_eq!(bsp.models()[0].head_nodes, [0, 1, 1, 0]);

    Ok(())
}

#[test]
fn load_wrong_version_fails() {
    let mut image = full_level();
    set_version(&mut image, 30);

    assert!(matches!(
        Bsp::load(Cursor::new(image)),
        Err(Error::UnsupportedVersion(30))
    ));
}

#[test]
fn load_short_header_fails() {
    let image = full_level();

    assert!(matches!(
        Bsp::load(Cursor::new(&image[..40])),
        Err(Error::TruncatedHeader)
    ));
}

#[traced_test]
#[test]
fn load_all_empty_lumps() -> Result<(), Error> {
    let bsp = Bsp::load(Cursor::new(LevelBuilder::new().build()))?;

    assert_eq!(bsp.entity_count(), 0);
    assert_eq!(bsp.planes().len(), 0);
    assert_eq!(bsp.miptex_count(), 0);
    assert_eq!(bsp.vertices().len(), 0);
    assert_eq!(bsp.visdata().len(), 0);
    assert_eq!(bsp.lighting().len(), 0);
    assert_eq!(bsp.models().len(), 0);

    Ok(())
}

#[test]
fn load_negative_offset_fails() {
    let mut image = full_level();
    set_lump_entry(&mut image, LumpKind::Planes, -8, 40);

    assert!(matches!(
        Bsp::load(Cursor::new(image)),
        Err(Error::InvalidLumpBounds {
            lump: LumpKind::Planes,
            offset: -8,
            length: 40,
        })
    ));
}

#[test]
fn load_negative_length_fails() {
    let mut image = full_level();
    set_lump_entry(&mut image, LumpKind::Vertices, HEADER_SIZE as i32, -12);

    assert!(matches!(
        Bsp::load(Cursor::new(image)),
        Err(Error::InvalidLumpBounds {
            lump: LumpKind::Vertices,
            length: -12,
            ..
        })
    ));
}

#[test]
fn load_truncated_lump_fails() {
    let mut image = full_level();
    let oversized = image.len() as i32;
    set_lump_entry(&mut image, LumpKind::Lighting, HEADER_SIZE as i32, oversized);

    assert!(matches!(
        Bsp::load(Cursor::new(image)),
        Err(Error::TruncatedLump(LumpKind::Lighting))
    ));
}

#[test]
fn trailing_partial_record_is_dropped() -> Result<(), Error> {
    // 45 bytes of plane data is two whole 20-byte records plus change.
    let mut planes = [
        plane_bytes([1.0, 0.0, 0.0], 16.0, 0),
        plane_bytes([0.0, 1.0, 0.0], 24.0, 1),
    ]
    .concat();
    planes.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF, 0x00]);

    let image = LevelBuilder::new().lump(LumpKind::Planes, planes).build();
    let bsp = Bsp::load(Cursor::new(image))?;

    assert_eq!(bsp.planes().len(), 2);
    assert_eq!(bsp.planes()[1].dist, 24.0);

    Ok(())
}

#[test]
fn load_is_idempotent() -> Result<(), Error> {
    let image = full_level();

    let first = Bsp::load(Cursor::new(&image))?;
    let second = Bsp::load(Cursor::new(&image))?;

    assert_eq!(first, second);

    Ok(())
}
