use crate::color::Color;

/// Surface appearance of a node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Material {
    /// Color multiplied into the shaded surface.
    pub color: Color,
    /// Highlighted nodes are drawn in wireframe.
    pub highlighted: bool,
}

impl Material {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            highlighted: false,
        }
    }
}
