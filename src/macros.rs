/// Declares a fieldless enum whose variants map one-to-one onto wire names, together with a
/// static `(name, variant)` table sorted by name for binary search.
///
/// Variants must be listed in byte order of their wire name; the unit tests of every user check
/// that the generated table is sorted.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident / $table:ident {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $($variant),+
        }

        impl $name {
            /// The name used for this variant in provisioning documents.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        pub(crate) static $table: &[(&str, $name)] = &[$(($wire, $name::$variant)),+];
    };
}

/// Declares a textual enumeration of the provisioning model.
///
/// Every generated enum has a leading `NotSet` variant, which is also what `from_text` returns
/// when the (ASCII case-insensitive) lookup finds nothing.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
        pub enum $name {
            #[default]
            NotSet,
            $($variant),+
        }

        impl $name {
            const TABLE: &'static [(&'static str, $name)] = &[$(($text, $name::$variant)),+];

            pub fn from_text(text: &str) -> Self {
                Self::TABLE
                    .iter()
                    .find(|(candidate, _)| candidate.eq_ignore_ascii_case(text))
                    .map(|(_, value)| *value)
                    .unwrap_or($name::NotSet)
            }

            pub fn is_set(self) -> bool {
                self != $name::NotSet
            }
        }
    };
}
