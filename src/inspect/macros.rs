//! Declarative opt-in for user types.

/// Implements [`Reflect`](crate::Reflect) and
/// [`StructView`](crate::inspect::StructView) for a struct with named fields.
///
/// Fields listed under `hidden` are shown only by type. A leading `@display`
/// adds the type's `Display` output to the inspected value; `@error` adds it as
/// the error string.
///
/// ```
/// use jlog::reflect_struct;
///
/// struct Credentials {
///     user: String,
///     token: String,
/// }
///
/// reflect_struct!(Credentials { user } hidden { token });
///
/// let creds = Credentials { user: "ada".into(), token: "s3cr3t".into() };
/// let json = serde_json::to_string(&jlog::inspect(&creds)).unwrap();
/// assert!(json.contains("ada"));
/// assert!(!json.contains("s3cr3t"));
/// ```
#[macro_export]
macro_rules! reflect_struct {
    (@emit $ty:ty, [$($field:ident),*], [$($hidden:ident),*], $mode:ident) => {
        impl $crate::Reflect for $ty {
            fn reflect(&self) -> $crate::Reflection<'_> {
                $crate::Reflection::Struct(self)
            }
        }

        impl $crate::inspect::StructView for $ty {
            fn fields(&self) -> ::std::vec::Vec<$crate::inspect::Field<'_>> {
                ::std::vec![
                    $($crate::inspect::Field::visible(::core::stringify!($field), &self.$field),)*
                    $($crate::inspect::Field::hidden(::core::stringify!($hidden), &self.$hidden),)*
                ]
            }

            $crate::reflect_struct!(@texts $mode);
        }
    };
    (@texts plain) => {};
    (@texts display) => {
        fn display_text(&self) -> ::core::option::Option<::std::string::String> {
            ::core::option::Option::Some(::std::string::ToString::to_string(self))
        }
    };
    (@texts error) => {
        fn error_text(&self) -> ::core::option::Option<::std::string::String> {
            ::core::option::Option::Some(::std::string::ToString::to_string(self))
        }
    };
    (@display $ty:ty { $($field:ident),* $(,)? } $(hidden { $($hidden:ident),* $(,)? })?) => {
        $crate::reflect_struct!(@emit $ty, [$($field),*], [$($($hidden),*)?], display);
    };
    (@error $ty:ty { $($field:ident),* $(,)? } $(hidden { $($hidden:ident),* $(,)? })?) => {
        $crate::reflect_struct!(@emit $ty, [$($field),*], [$($($hidden),*)?], error);
    };
    ($ty:ty { $($field:ident),* $(,)? } $(hidden { $($hidden:ident),* $(,)? })?) => {
        $crate::reflect_struct!(@emit $ty, [$($field),*], [$($($hidden),*)?], plain);
    };
}

/// Implements [`Reflect`](crate::Reflect) for error types so they inspect as
/// their message plus `source` chain.
///
/// The types must implement `std::error::Error` and be `'static`.
#[macro_export]
macro_rules! reflect_error {
    ($($ty:ty),+ $(,)?) => {
        $(impl $crate::Reflect for $ty {
            fn reflect(&self) -> $crate::Reflection<'_> {
                $crate::Reflection::Error(self)
            }
        })+
    };
}
