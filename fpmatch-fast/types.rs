/// FAST corner on a single pyramid level, before orientation is known
#[derive(Debug, Clone, Copy)]
pub struct ScoredKeypoint {
    pub x: usize,
    pub y: usize,
    pub response: f32,
}

/// Scale information for pyramid levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleLevel {
    pub level: usize,
    pub scale: f32,
    pub width: usize,
    pub height: usize,
}
