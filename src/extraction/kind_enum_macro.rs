/// Defines a closed vocabulary enum with an open `Custom(String)` escape hatch.
///
/// Every variant carries its serialized name and the signature aliases used
/// to recognize it in configuration keys and values.
#[macro_export]
macro_rules! define_kind_enum {
    (
        $(#[$enum_meta:meta])*
        $enum_name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $serde_name:literal : [ $( $alias:literal ),* $(,)? ]
            ),* $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $enum_name {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
            Custom(String),
        }

        impl serde::Serialize for $enum_name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.name())
            }
        }

        impl<'de> serde::Deserialize<'de> for $enum_name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Ok(match s.as_str() {
                    $(
                        $serde_name => Self::$variant,
                    )*
                    _ => Self::Custom(s),
                })
            }
        }

        impl $enum_name {
            pub fn name(&self) -> &str {
                match self {
                    $(
                        Self::$variant => $serde_name,
                    )*
                    Self::Custom(name) => name,
                }
            }

            /// Case-insensitive lookup by serialized name or alias
            pub fn from_name(name: &str) -> Option<Self> {
                let lower = name.to_lowercase();
                Self::all_variants()
                    .iter()
                    .find(|kind| {
                        kind.name() == lower || kind.aliases().iter().any(|alias| *alias == lower)
                    })
                    .cloned()
            }

            pub fn aliases(&self) -> &'static [&'static str] {
                match self {
                    $(
                        Self::$variant => &[$($alias),*],
                    )*
                    Self::Custom(_) => &[],
                }
            }

            pub fn all_variants() -> &'static [Self] {
                &[
                    $(
                        Self::$variant,
                    )*
                ]
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.name())
            }
        }
    };
}
