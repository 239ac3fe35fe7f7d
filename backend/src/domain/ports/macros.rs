//! Defines the helper macro for generating domain port error enums.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident { message: String } => $display:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($display)]
                $variant {
                    /// Underlying cause, as text.
                    message: String,
                },
            )*
        }

        impl $name {
            ::paste::paste! {
                $(
                    /// Build the variant from any displayable cause.
                    pub fn [<$variant:snake>](message: impl ::std::convert::Into<String>) -> Self {
                        Self::$variant { message: message.into() }
                    }
                )*
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    define_port_error! {
        /// Example error for macro coverage.
        pub enum ExamplePortError {
            /// First kind.
            Alpha { message: String } => "alpha: {message}",
            /// Second kind.
            Beta { message: String } => "beta: {message}",
        }
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = ExamplePortError::alpha("hello");
        assert_eq!(err.to_string(), "alpha: hello");
    }

    #[test]
    fn variants_compare_by_payload() {
        assert_ne!(
            ExamplePortError::beta("x"),
            ExamplePortError::alpha("x")
        );
    }
}
