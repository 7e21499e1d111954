/// Ternary classification of the current face count, used to gate capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadinessState {
    NotReady,
    Ready,
    Ambiguous,
}

impl ReadinessState {
    pub fn from_face_count(count: usize) -> Self {
        match count {
            0 => Self::NotReady,
            1 => Self::Ready,
            _ => Self::Ambiguous,
        }
    }

    pub fn is_ready(self) -> bool {
        self == Self::Ready
    }
}
