//! Fill values.

use derive_more::From;

/// The fill value of an array: the native-endian bytes of one element, used
/// to answer reads of uninitialized chunks.
#[derive(Clone, Debug, Eq, PartialEq, From)]
pub struct FillValue(Vec<u8>);

impl FillValue {
    /// Create a new [`FillValue`] from the native-endian bytes of one element.
    #[must_use]
    pub fn new(fill_value: Vec<u8>) -> Self {
        Self(fill_value)
    }

    /// Return the size in bytes of the fill value.
    #[must_use]
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Return the fill value as native-endian bytes.
    #[must_use]
    pub fn as_ne_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<bool> for FillValue {
    fn from(fill_value: bool) -> Self {
        Self(vec![u8::from(fill_value)])
    }
}

macro_rules! impl_fill_value_from_ne_bytes {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FillValue {
                fn from(fill_value: $t) -> Self {
                    Self(fill_value.to_ne_bytes().to_vec())
                }
            }
        )*
    };
}

impl_fill_value_from_ne_bytes!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_values() {
        assert_eq!(FillValue::from(false).as_ne_bytes(), &[0]);
        assert_eq!(FillValue::from(true).as_ne_bytes(), &[1]);
        assert_eq!(FillValue::from(42u8).as_ne_bytes(), &[42]);
        assert_eq!(FillValue::from(42u16).size(), 2);
        assert_eq!(
            FillValue::from(1.5f32).as_ne_bytes(),
            1.5f32.to_ne_bytes().as_slice()
        );
        assert_eq!(FillValue::new(vec![1, 2, 3, 4]).size(), 4);
    }
}
