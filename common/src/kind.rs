//! Macros for defining kind enums.

use derive_more::{Display, Error};

/// Macro for defining a kind enum stored as `INT2` in a database and
/// displayed in `SCREAMING_SNAKE_CASE`.
///
/// # Example
///
/// ```rust
/// # use common::define_kind;
/// define_kind! {
///     #[doc = "Way a payment was made."]
///     enum Method {
///         #[doc = "Wire transfer."]
///         Transfer = 1,
///
///         #[doc = "Cash."]
///         Cash = 2,
///     }
/// }
///
/// assert_eq!(Method::try_from(2), Ok(Method::Cash));
/// assert_eq!(Method::Transfer.to_string(), "TRANSFER");
/// ```
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_kind {
    (
        #[doc = $doc:literal]
        enum $name:ident {
            $(
                #[doc = $variant_doc:literal]
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            $crate::private::strum::Display,
            $crate::private::strum::EnumString,
            Eq,
            PartialEq,
        )]
        #[cfg_attr(
            feature = "serde",
            derive(
                $crate::private::serde::Deserialize,
                $crate::private::serde::Serialize,
            ),
            serde(rename_all = "SCREAMING_SNAKE_CASE"),
        )]
        #[doc = $doc]
        #[repr(u8)]
        #[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $(
                 #[doc = $variant_doc]
                 $variant = $value,
            )*
        }

        impl $name {
            /// All the variants, in their declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// Converts this into its [`u8`] representation.
            #[must_use]
            pub const fn u8(self) -> u8 {
                self as u8
            }
        }

        impl ::core::convert::TryFrom<u8> for $name {
            type Error = $crate::UnknownKind;

            fn try_from(v: u8) -> Result<Self, Self::Error> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|k| k.u8() == v)
                    .ok_or($crate::UnknownKind {
                        kind: ::core::stringify!($name),
                        value: v,
                    })
            }
        }

        #[cfg(feature = "postgres")]
        impl<'a> $crate::private::postgres_types::FromSql<'a> for $name {
            $crate::private::postgres_types::accepts!(INT2);

            fn from_sql(
                ty: &$crate::private::postgres_types::Type,
                raw: &[u8],
            ) -> Result<
                $name,
                Box<dyn ::std::error::Error
                    + ::core::marker::Sync
                    + ::core::marker::Send>,
            > {
                Self::try_from(u8::try_from(i16::from_sql(ty, raw)?)?)
                    .map_err(Into::into)
            }
        }

        #[cfg(feature = "postgres")]
        impl $crate::private::postgres_types::ToSql for $name {
            $crate::private::postgres_types::accepts!(INT2);
            $crate::private::postgres_types::to_sql_checked!();

            fn to_sql(
                &self,
                ty: &$crate::private::postgres_types::Type,
                w: &mut $crate::private::postgres_types::private::BytesMut,
            ) -> Result<
                $crate::private::postgres_types::IsNull,
                ::std::boxed::Box<
                    dyn ::std::error::Error
                        + ::core::marker::Sync
                        + ::core::marker::Send
                >,
            > {
                i16::from(self.u8()).to_sql(ty, w)
            }
        }
    };
}

/// Error of converting an unknown [`u8`] value into a kind enum.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
#[display("invalid `{kind}` value: {value}")]
pub struct UnknownKind {
    /// Name of the kind enum.
    pub kind: &'static str,

    /// Converted value.
    pub value: u8,
}

#[cfg(test)]
mod spec {
    use super::UnknownKind;

    define_kind! {
        #[doc = "Priority of a task."]
        enum Priority {
            #[doc = "Low."]
            Low = 1,

            #[doc = "High."]
            High = 3,
        }
    }

    #[test]
    fn converts_from_u8() {
        assert_eq!(Priority::try_from(1), Ok(Priority::Low));
        assert_eq!(Priority::try_from(3), Ok(Priority::High));
        assert_eq!(
            Priority::try_from(2),
            Err(UnknownKind {
                kind: "Priority",
                value: 2,
            }),
        );
    }

    #[test]
    fn lists_all_variants() {
        assert_eq!(Priority::ALL, &[Priority::Low, Priority::High]);
        assert!(Priority::ALL.iter().all(|p| {
            Priority::try_from(p.u8()) == Ok(*p)
        }));
    }

    #[test]
    fn displays_and_parses_screaming_case() {
        assert_eq!(Priority::High.to_string(), "HIGH");
        assert_eq!("LOW".parse::<Priority>(), Ok(Priority::Low));
    }
}
