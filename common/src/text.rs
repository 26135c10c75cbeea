//! Macros for defining free-form text newtypes.

/// Macro for defining a trimmed, non-empty and length-limited [`String`]
/// newtype.
///
/// # Example
///
/// ```rust
/// # use crate::common::define_text;
///
/// define_text! {
///     #[doc = "Title of a book."]
///     struct Title(..= 200);
/// }
/// ```
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_text {
    (
        #[doc = $doc:literal]
        struct $name:ident(..= $max:literal);
    ) => {
        #[derive(Clone, Debug, Eq, Hash, PartialEq)]
        #[doc = $doc]
        pub struct $name(::std::string::String);

        impl $name {
            /// Creates a new value without performing any validation.
            ///
            /// # Safety
            ///
            /// The caller must ensure that the given value is trimmed,
            /// non-empty and not too long.
            #[expect(unsafe_code, reason = "bypass")]
            #[must_use]
            pub unsafe fn new_unchecked(
                val: impl ::core::convert::Into<::std::string::String>,
            ) -> Self {
                Self(val.into())
            }

            /// Creates a new value if the given one is valid.
            #[must_use]
            pub fn new(
                val: impl ::core::convert::Into<::std::string::String>,
            ) -> ::core::option::Option<Self> {
                let val = val.into();
                Self::check(&val).then_some(Self(val))
            }

            /// Maximum number of characters allowed.
            pub const MAX_LEN: usize = $max;

            /// Checks whether the given value is valid.
            fn check(val: &str) -> bool {
                val.trim() == val
                    && !val.is_empty()
                    && val.chars().count() <= Self::MAX_LEN
            }
        }

        impl ::core::convert::AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(
                &self,
                f: &mut ::core::fmt::Formatter<'_>,
            ) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = &'static str;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::new(s).ok_or(::core::concat!(
                    "invalid `",
                    ::core::stringify!($name),
                    "`",
                ))
            }
        }

        #[cfg(feature = "postgres")]
        impl<'a> $crate::private::postgres_types::FromSql<'a> for $name {
            $crate::private::postgres_types::accepts!(TEXT, VARCHAR);

            fn from_sql(
                ty: &$crate::private::postgres_types::Type,
                raw: &'a [u8],
            ) -> ::core::result::Result<
                $name,
                ::std::boxed::Box<dyn ::std::error::Error
                    + ::core::marker::Sync
                    + ::core::marker::Send>,
            > {
                <::std::string::String as
                    $crate::private::postgres_types::FromSql<'a>>::from_sql(
                    ty, raw,
                )
                .map(Self)
            }
        }

        #[cfg(feature = "postgres")]
        impl $crate::private::postgres_types::ToSql for $name {
            $crate::private::postgres_types::accepts!(TEXT, VARCHAR);
            $crate::private::postgres_types::to_sql_checked!();

            fn to_sql(
                &self,
                ty: &$crate::private::postgres_types::Type,
                w: &mut $crate::private::postgres_types::private::BytesMut,
            ) -> ::core::result::Result<
                $crate::private::postgres_types::IsNull,
                ::std::boxed::Box<
                    dyn ::std::error::Error
                        + ::core::marker::Sync
                        + ::core::marker::Send
                >,
            > {
                <::std::string::String as
                    $crate::private::postgres_types::ToSql>::to_sql(
                    &self.0, ty, w,
                )
            }
        }
    };
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    crate::define_text! {
        #[doc = "Test text."]
        struct Title(..= 5);
    }

    #[test]
    fn validates() {
        assert!(Title::new("hello").is_some());
        assert!(Title::new("héllo").is_some());
        assert!(Title::new("").is_none());
        assert!(Title::new(" hi").is_none());
        assert!(Title::new("hi\n").is_none());
        assert!(Title::new("hello!").is_none());

        assert_eq!(Title::from_str("hey").unwrap().as_ref(), "hey");
        assert_eq!(Title::from_str("").unwrap_err(), "invalid `Title`");
    }
}
