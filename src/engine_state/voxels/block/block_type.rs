//! # Block Type Module
//!
//! Rendering classes of blocks. The class decides which triangle stream a block
//! lands in and whether it hides the faces of its neighbors.

/// How a block participates in meshing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlockClass {
    /// Fully opaque cube; hides neighboring faces.
    Solid,
    /// Cube that does not hide neighboring faces. Air belongs here.
    Transparent,
    /// Foliage cube; rendered like a solid but lets neighbors show through.
    Leaves,
    /// Two crossed quads instead of a cube (flowers, grass).
    Billboard,
    /// Translucent fluid, rendered in its own stream.
    Liquid,
}

impl BlockClass {
    /// Whether a face next to a block of this class can be seen.
    ///
    /// Liquids are handled separately: they reveal faces of non-liquid blocks
    /// but hide faces of other liquids.
    pub fn is_see_through(self) -> bool {
        matches!(
            self,
            BlockClass::Transparent | BlockClass::Leaves | BlockClass::Billboard
        )
    }

    /// Whether this class is rendered in the liquid stream.
    pub fn is_liquid(self) -> bool {
        self == BlockClass::Liquid
    }

    /// Whether a face of a block of class `self` that borders a cell of class
    /// `neighbor` must be emitted.
    pub fn exposes_face_towards(self, neighbor: BlockClass) -> bool {
        neighbor.is_see_through() || (neighbor.is_liquid() && !self.is_liquid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn liquids_hide_each_other() {
        assert!(!BlockClass::Liquid.exposes_face_towards(BlockClass::Liquid));
        assert!(BlockClass::Solid.exposes_face_towards(BlockClass::Liquid));
        assert!(BlockClass::Liquid.exposes_face_towards(BlockClass::Transparent));
    }

    #[test]
    fn solids_hide_everything() {
        for class in [
            BlockClass::Solid,
            BlockClass::Transparent,
            BlockClass::Leaves,
            BlockClass::Billboard,
            BlockClass::Liquid,
        ] {
            assert!(!class.exposes_face_towards(BlockClass::Solid));
        }
    }
}
