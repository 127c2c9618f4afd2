//! Content flags for filtering collision queries
//!
//! Every polytope carries the contents of the brush it was built from and
//! every placed entity carries a category mask. A query passes a mask of
//! the contents it wants to collide with; anything sharing no bit with it
//! is invisible to that query.

use bitflags::bitflags;

bitflags! {
    /// What a volume is made of, and what a query collides with
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ContentFlags: u32 {
        /// Solid world geometry
        const SOLID = 1 << 0;
        /// Blocks visibility traces
        const OPAQUE = 1 << 1;
        /// Water volume
        const WATER = 1 << 2;
        /// Blocks players only
        const PLAYER_CLIP = 1 << 3;
        /// Blocks monsters only
        const MONSTER_CLIP = 1 << 4;
        /// Blocks moveable physics objects only
        const MOVEABLE_CLIP = 1 << 5;
        /// Bodies of actors
        const BODY = 1 << 6;
        /// Hit by projectiles only
        const PROJECTILE = 1 << 7;
        /// Dead bodies
        const CORPSE = 1 << 8;
        /// Trigger volumes (no physical response)
        const TRIGGER = 1 << 9;
        /// Solid for navigation only
        const AAS_SOLID = 1 << 10;
        /// Navigation obstacle
        const AAS_OBSTACLE = 1 << 11;

        /// Everything that blocks player movement
        const MASK_PLAYER_SOLID = Self::SOLID.bits() | Self::PLAYER_CLIP.bits() | Self::BODY.bits();
        /// Everything that blocks monster movement
        const MASK_MONSTER_SOLID = Self::SOLID.bits() | Self::MONSTER_CLIP.bits() | Self::BODY.bits();
        /// Everything a hit-scan weapon can strike
        const MASK_SHOT = Self::SOLID.bits() | Self::BODY.bits() | Self::PROJECTILE.bits() | Self::CORPSE.bits();
        /// Everything that blocks line of sight
        const MASK_OPAQUE = Self::SOLID.bits() | Self::OPAQUE.bits();
    }
}

impl ContentFlags {
    /// Whether anything in `self` is selected by the query `mask`
    #[inline]
    pub fn matches(self, mask: ContentFlags) -> bool {
        self.intersects(mask)
    }

    /// Build a mask from raw bits, dropping unknown bits
    pub fn from_raw(bits: u32) -> Self {
        Self::from_bits_truncate(bits)
    }
}
