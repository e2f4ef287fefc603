//! Header and texture entry bit sets.

use bitflags::bitflags;

bitflags! {
    /// Optional channels present in the file
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MeshFlags: u8 {
        const UVS = 0x01;
        const NORMALS = 0x02;
        const COLORS = 0x04;
        /// The offset is not at the origin
        const OFFSET = 0x08;
        const PLANES = 0x10;
    }
}

bitflags! {
    /// Sampler flags of a texture entry
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TextureFlags: u8 {
        const ALPHA = 0x01;
        const WRAP_U = 0x02;
        const WRAP_V = 0x04;
        const WRAP = Self::WRAP_U.bits() | Self::WRAP_V.bits();
    }
}

bitflags! {
    /// Render properties of a texture entry
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TextureProps: u32 {
        const SNOWABLE = 0x0001;
        const TRANSPARENT = 0x0010;
        const NOT_LIT = 0x0040;
        const CLAMP = 0x0400;
    }
}
