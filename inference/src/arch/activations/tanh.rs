/// Hyperbolic tangent, evaluated in single precision.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Tanh;

impl Tanh {
    pub fn f(&self, z: f32) -> f32 {
        z.tanh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tanh_is_odd_and_bounded() {
        let t = Tanh;
        assert_eq!(t.f(0.0), 0.0);
        assert_eq!(t.f(-0.5), -t.f(0.5));
        assert!(t.f(50.0) <= 1.0);
        assert!(t.f(-50.0) >= -1.0);
    }
}
