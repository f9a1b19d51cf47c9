pub trait FloatAsExt: Sized {
    /// Returns `Some(f)` if f is far enough from zero (near is given by eps) else returns None
    ///
    /// Returns None for NaN and Some(f) for +/- infty
    fn into_non_zero(self, eps: Self) -> Option<Self>;

    /// Returns `Some(f)` is f is finite else returns None
    ///
    /// Returns None for NaN and +/- infty
    fn into_finite(self) -> Option<Self>;
}

macro_rules! impl_float_as_ext {
    ($($t:ty),*) => {
        $(
            impl FloatAsExt for $t {
                fn into_non_zero(self, eps: Self) -> Option<Self> {
                    (self.abs() > eps).then_some(self)
                }

                fn into_finite(self) -> Option<Self> {
                    self.is_finite().then_some(self)
                }
            }
        )*
    };
}

impl_float_as_ext!(f32, f64);

#[cfg(test)]
mod tests {
    use super::FloatAsExt;

    #[test]
    fn as_non_zero_test() {
        assert_eq!(0.0f32.into_non_zero(0.1), None);
        assert_eq!(1.0f32.into_non_zero(0.1), Some(1.0));
        assert_eq!((-0.01f32).into_non_zero(0.1), None);
        assert_eq!(f32::NAN.into_non_zero(0.1), None);
        assert_eq!(f32::INFINITY.into_non_zero(0.1), Some(f32::INFINITY));
        assert_eq!((-1.0f64).into_non_zero(1e-9), Some(-1.0));
    }

    #[test]
    fn as_finite_test() {
        assert_eq!(0.0f64.into_finite(), Some(0.0));
        assert_eq!((-0.01f64).into_finite(), Some(-0.01));
        assert_eq!(f64::NAN.into_finite(), None);
        assert_eq!(f64::NEG_INFINITY.into_finite(), None);
        assert_eq!(f32::INFINITY.into_finite(), None);
    }
}
