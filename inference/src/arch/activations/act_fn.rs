use super::Tanh;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActFn {
    Tanh(Tanh),
}

impl ActFn {
    pub fn tanh() -> Self {
        Self::Tanh(Tanh)
    }

    pub fn f(&self, x: f32) -> f32 {
        match self {
            Self::Tanh(a) => a.f(x),
        }
    }

    /// A short human readable name, used when describing the architecture.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tanh(_) => "tanh",
        }
    }
}
