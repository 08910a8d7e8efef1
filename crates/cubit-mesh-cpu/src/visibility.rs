//! Face emission rules between a block and its neighbor.

use cubit_blocks::{AIR, BlockDatabase, BlockType, Face};

/// Whether `face` of `block` must be drawn against `neighbor`, which touches it with `neighbor_face`.
///
/// Air never emits. Two opaque faces hide each other. Two transparent faces hide
/// each other only when they belong to the same block type.
#[inline]
pub fn should_show_face(
    db: &BlockDatabase,
    block: BlockType,
    face: Face,
    neighbor: BlockType,
    neighbor_face: Face,
) -> bool {
    if block == AIR {
        return false;
    }
    let trans = db.is_transparent(block, face);
    let trans_neighbor = neighbor == AIR || db.is_transparent(neighbor, neighbor_face);
    if trans && trans_neighbor {
        return block != neighbor;
    }
    trans || trans_neighbor
}

/// Coarse rule used by LOD meshes, which ignore transparency.
#[inline]
pub fn should_show_face_lod(block: BlockType, neighbor: BlockType) -> bool {
    block != AIR && neighbor == AIR
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubit_blocks::{BlockMeshData, TransparencyClass};

    fn db() -> BlockDatabase {
        BlockDatabase::from_entries(vec![
            ("stone".into(), BlockMeshData::uniform(1, [0; 3], TransparencyClass::Opaque)),
            ("glass".into(), BlockMeshData::uniform(2, [0; 3], TransparencyClass::FullyTransparent)),
            ("water".into(), BlockMeshData::uniform(3, [0; 3], TransparencyClass::SemiTransparent)),
        ])
    }

    #[test]
    fn rule_table() {
        let db = db();
        let (f, o) = (Face::PosX, Face::NegX);
        assert!(should_show_face(&db, 1, f, AIR, o));
        assert!(!should_show_face(&db, 1, f, 1, o));
        assert!(should_show_face(&db, 1, f, 2, o));
        assert!(should_show_face(&db, 2, f, 1, o));
        assert!(!should_show_face(&db, 2, f, 2, o));
        assert!(should_show_face(&db, 2, f, 3, o));
        assert!(should_show_face(&db, 3, f, 2, o));
        assert!(should_show_face(&db, 3, f, AIR, o));
        assert!(!should_show_face(&db, AIR, f, 1, o));
    }
}
