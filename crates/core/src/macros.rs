// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative macros shared across the domain types.
//!
//! [`simple_display!`] maps enum variants to their wire names;
//! [`builder!`] emits the test-only builders the suites construct
//! entities with.

/// Implement `Display` by mapping each enum variant to a string literal.
///
/// Variants that carry data take `(..)` so their fields are ignored.
///
/// ```ignore
/// crate::simple_display! {
///     Verdict {
///         Approve => "approve",
///         RequestChanges => "request_changes",
///         Reject => "reject",
///     }
/// }
/// ```
#[macro_export]
macro_rules! simple_display {
    ($ty:ty { $( $var:ident $(( $($skip:tt)* ))? => $text:expr ),+ $(,)? }) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(match self {
                    $( Self::$var $(( $($skip)* ))? => $text, )+
                })
            }
        }
    };
}

/// Emit a builder for constructing an entity in tests.
///
/// Expands to the builder struct, a `Default` impl seeded with the listed
/// values, one setter per field, `build()`, and a `Target::builder()`
/// constructor. Everything is gated behind
/// `#[cfg(any(test, feature = "test-support"))]` so nothing leaks into
/// production builds.
///
/// Field groups:
/// - `into { field: Type = default }` — setter takes `impl Into<Type>`
/// - `set { field: Type = default }` — setter takes the type as-is
/// - `option { field: Type = default }` — stored as `Option<Type>`,
///   setter wraps its argument in `Some`
/// - `computed { field: Type = expr }` — no setter; the expression runs
///   inside `build()`
#[macro_export]
macro_rules! builder {
    (
        pub struct $builder:ident => $target:ident {
            $(into {
                $( $f_into:ident : $t_into:ty = $d_into:expr ),* $(,)?
            })?
            $(set {
                $( $f_set:ident : $t_set:ty = $d_set:expr ),* $(,)?
            })?
            $(option {
                $( $f_opt:ident : $t_opt:ty = $d_opt:expr ),* $(,)?
            })?
            $(computed {
                $( $f_comp:ident : $t_comp:ty = $e_comp:expr ),* $(,)?
            })?
        }
    ) => {
        #[cfg(any(test, feature = "test-support"))]
        pub struct $builder {
            $($( $f_into: $t_into, )*)?
            $($( $f_set: $t_set, )*)?
            $($( $f_opt: Option<$t_opt>, )*)?
        }

        #[cfg(any(test, feature = "test-support"))]
        impl Default for $builder {
            fn default() -> Self {
                Self {
                    $($( $f_into: $d_into.into(), )*)?
                    $($( $f_set: $d_set, )*)?
                    $($( $f_opt: $d_opt, )*)?
                }
            }
        }

        #[cfg(any(test, feature = "test-support"))]
        impl $builder {
            $($(
                pub fn $f_into(mut self, v: impl Into<$t_into>) -> Self {
                    self.$f_into = v.into();
                    self
                }
            )*)?

            $($(
                pub fn $f_set(mut self, v: $t_set) -> Self {
                    self.$f_set = v;
                    self
                }
            )*)?

            $($(
                pub fn $f_opt(mut self, v: impl Into<$t_opt>) -> Self {
                    self.$f_opt = Some(v.into());
                    self
                }
            )*)?

            pub fn build(self) -> $target {
                $target {
                    $($( $f_into: self.$f_into, )*)?
                    $($( $f_set: self.$f_set, )*)?
                    $($( $f_opt: self.$f_opt, )*)?
                    $($( $f_comp: $e_comp, )*)?
                }
            }
        }

        #[cfg(any(test, feature = "test-support"))]
        impl $target {
            /// Builder seeded with test defaults.
            pub fn builder() -> $builder {
                $builder::default()
            }
        }
    };
}
