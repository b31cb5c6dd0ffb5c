//! Declaration macro for parameter identifier sets.

/// Declare a parameter identifier enum together with its ranges.
///
/// Generates the enum, an `ALL` table, `range()` and `name()`.
///
/// # Example
/// ```ignore
/// param_set! {
///     pub enum GlobalParam {
///         SpeedOfSound => ParameterRange::linear(300.0, 400.0, 343.0),
///     }
/// }
/// ```
macro_rules! param_set {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $range:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant
            ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn range(self) -> $crate::ParameterRange {
                match self {
                    $($name::$variant => $range),+
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }
    };
}
