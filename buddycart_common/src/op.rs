/// Implements a standard operator trait for a newtype with a `value()` accessor and a `From<inner>` impl.
///
/// The trait being implemented must be in scope at the call site.
#[macro_export]
macro_rules! op {
    (binary $t:ty, $trait:ident, $method:ident) => {
        impl $trait for $t {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self::Output {
                Self::from(self.value().$method(rhs.value()))
            }
        }
    };
    (inplace $t:ty, $trait:ident, $method:ident) => {
        impl $trait for $t {
            fn $method(&mut self, rhs: Self) {
                let mut value = self.value();
                value.$method(rhs.value());
                *self = Self::from(value);
            }
        }
    };
    (unary $t:ty, $trait:ident, $method:ident) => {
        impl $trait for $t {
            type Output = Self;

            fn $method(self) -> Self::Output {
                Self::from(self.value().$method())
            }
        }
    };
}
