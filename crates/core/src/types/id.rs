//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create ID wrappers that keep a student ID
//! from being passed where a class ID is expected.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - Conversion methods: `new()`, `as_i32()`
/// - `From<i32>` and `Into<i32>` implementations
/// - `FromStr`, so IDs can be read straight from form inputs and CLI arguments
///
/// # Example
///
/// ```rust
/// # use schoolsoft_core::define_id;
/// define_id!(StudentId);
/// define_id!(ClassId);
///
/// let student = StudentId::new(1);
/// let class: ClassId = "4".parse().unwrap();
///
/// // These are different types, so this won't compile:
/// // let _: StudentId = class;
/// # let _ = (student, class);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i32>().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(StudentId);
define_id!(TeacherId);
define_id!(ClassId);
define_id!(PaymentId);
define_id!(UserId);
define_id!(SchoolId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_as_bare_number() {
        let json = serde_json::to_string(&StudentId::new(42)).unwrap();
        assert_eq!(json, "42");

        let parsed: ClassId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed.as_i32(), 7);
    }

    #[test]
    fn test_id_from_str_trims_input() {
        let id: TeacherId = " 12 ".parse().unwrap();
        assert_eq!(id, TeacherId::new(12));
        assert!("twelve".parse::<TeacherId>().is_err());
    }

    #[test]
    fn test_id_display() {
        assert_eq!(PaymentId::new(301).to_string(), "301");
    }
}
