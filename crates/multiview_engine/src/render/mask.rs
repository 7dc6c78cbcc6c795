//! Stencil masks
//!
//! A mask writes its id into the stencil buffer; content that uses the mask
//! is drawn only where the stencil holds that id (or, inverted, everywhere
//! else).

/// Mask id used when none is given
pub const DEFAULT_MASK_ID: u8 = 1;

/// Stencil comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilFunc {
    /// Always pass
    Always,
    /// Pass where the stored value equals the reference
    Equal,
    /// Pass where the stored value differs from the reference
    NotEqual,
}

/// Stencil buffer operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilOp {
    /// Keep the stored value
    Keep,
    /// Write the reference value
    Replace,
}

/// Stencil state for a material
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilMask {
    /// Enable stencil writes
    pub stencil_write: bool,
    /// Reference value
    pub stencil_ref: u8,
    /// Comparison function
    pub stencil_func: StencilFunc,
    /// Operation when the stencil test fails
    pub stencil_fail: StencilOp,
    /// Operation when the depth test fails
    pub stencil_z_fail: StencilOp,
    /// Operation when both tests pass
    pub stencil_z_pass: StencilOp,
}

impl StencilMask {
    /// State for the material that defines mask `id`
    pub fn writer(id: u8) -> Self {
        Self {
            stencil_write: true,
            stencil_ref: id,
            stencil_func: StencilFunc::Always,
            stencil_fail: StencilOp::Keep,
            stencil_z_fail: StencilOp::Keep,
            stencil_z_pass: StencilOp::Replace,
        }
    }
}

impl Default for StencilMask {
    /// Content drawn inside mask [`DEFAULT_MASK_ID`]
    fn default() -> Self {
        use_mask(DEFAULT_MASK_ID, false)
    }
}

/// State for content clipped by mask `id`
///
/// With `inverse` the content is drawn outside the mask instead of inside.
pub fn use_mask(id: u8, inverse: bool) -> StencilMask {
    StencilMask {
        stencil_write: true,
        stencil_ref: id,
        stencil_func: if inverse {
            StencilFunc::NotEqual
        } else {
            StencilFunc::Equal
        },
        stencil_fail: StencilOp::Keep,
        stencil_z_fail: StencilOp::Keep,
        stencil_z_pass: StencilOp::Keep,
    }
}
