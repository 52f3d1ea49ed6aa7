//! Operator boilerplate for single-field newtypes.
//!
//! `op!(binary T, Add, add)` expands to the `Add` impl that applies the operator to the inner
//! value and re-wraps it. `inplace` covers the `*Assign` traits, `unary` covers `Neg`.

#[macro_export]
macro_rules! op {
    (binary $t:ty, $trait:ident, $method:ident) => {
        impl $trait for $t {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self::Output {
                Self(self.0.$method(rhs.0))
            }
        }
    };
    (inplace $t:ty, $trait:ident, $method:ident) => {
        impl $trait for $t {
            fn $method(&mut self, rhs: Self) {
                self.0.$method(rhs.0);
            }
        }
    };
    (unary $t:ty, $trait:ident, $method:ident) => {
        impl $trait for $t {
            type Output = Self;

            fn $method(self) -> Self::Output {
                Self(self.0.$method())
            }
        }
    };
}
