//! Shared wire vocabularies
//!
//! Every enum in this crate that crosses the wire is declared with
//! [`wire_enum!`]: the variant-to-name table lives in one `as_str` match and
//! serde goes through it (`into`/`try_from`), so the rest of the code only
//! ever compares variants, never wire strings.

use thiserror::Error;

/// A string that does not name any variant of a wire enum
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

/// Declares a `Copy` enum with an explicit serialization-name table.
///
/// Parsing trims the input and ignores ASCII case.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(into = "&'static str", try_from = "String")]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire name of this variant
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $wire ),+
                }
            }
        }

        impl ::std::convert::From<$name> for &'static str {
            fn from(value: $name) -> Self {
                value.as_str()
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::core::types::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|variant| variant.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| $crate::core::types::UnknownVariant {
                        kind: $kind,
                        value: wanted.to_string(),
                        expected: Self::ALL
                            .iter()
                            .map(|variant| variant.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }

        impl ::std::convert::TryFrom<String> for $name {
            type Error = $crate::core::types::UnknownVariant;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use wire_enum;

wire_enum! {
    /// Distribution platform a publisher targets
    pub enum Platform: "platform" {
        Curseforge => "curseforge",
        Modrinth => "modrinth",
    }
}

impl Platform {
    /// Human-facing platform name used in log lines
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Curseforge => "CurseForge",
            Platform::Modrinth => "Modrinth",
        }
    }

    /// Prefix of derived dependency names (`<prefix>-<identifier>`)
    pub fn dependency_prefix(&self) -> &'static str {
        self.as_str()
    }
}

wire_enum! {
    /// Mod-loading runtime targeted by the artifact
    pub enum LoaderType: "loader" {
        Fabric => "fabric",
        Quilt => "quilt",
        Forge => "forge",
        NeoForge => "neoforge",
    }
}

wire_enum! {
    /// Maturity tier of a release
    pub enum ReleaseType: "release type" {
        Release => "release",
        Beta => "beta",
        Alpha => "alpha",
    }
}

wire_enum! {
    /// Runtime side an artifact supports
    pub enum Environment: "environment" {
        Client => "client",
        Server => "server",
    }
}

wire_enum! {
    /// Markup a CurseForge changelog is written in
    pub enum ChangelogType: "changelog type" {
        Text => "text",
        Markdown => "markdown",
        Html => "html",
    }
}

impl Default for ChangelogType {
    fn default() -> Self {
        ChangelogType::Markdown
    }
}

/// Joins wire names for messages such as "allowed values: release, beta, alpha"
pub fn list_variants<T: Copy + Into<&'static str>>(all: &[T]) -> String {
    all.iter()
        .map(|variant| (*variant).into())
        .collect::<Vec<&'static str>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_type_parses_case_insensitively() {
        assert_eq!("Beta".parse::<ReleaseType>().unwrap(), ReleaseType::Beta);
        assert_eq!(" alpha ".parse::<ReleaseType>().unwrap(), ReleaseType::Alpha);
    }

    #[test]
    fn test_unknown_release_type_lists_allowed_values() {
        let err = "nightly".parse::<ReleaseType>().unwrap_err();
        assert_eq!(err.value, "nightly");
        assert_eq!(err.expected, "release, beta, alpha");
        assert!(err.to_string().contains("release type"));
    }

    #[test]
    fn test_loader_serialization() {
        let json = serde_json::to_string(&vec![LoaderType::Fabric, LoaderType::NeoForge]).unwrap();
        assert_eq!(json, r#"["fabric","neoforge"]"#);

        let loaders: Vec<LoaderType> = serde_json::from_str(r#"["quilt","forge"]"#).unwrap();
        assert_eq!(loaders, vec![LoaderType::Quilt, LoaderType::Forge]);
    }

    #[test]
    fn test_unknown_loader_fails_deserialization() {
        let result: Result<LoaderType, _> = serde_json::from_str(r#""rift""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_platform_names() {
        assert_eq!(Platform::Curseforge.as_str(), "curseforge");
        assert_eq!(Platform::Modrinth.display_name(), "Modrinth");
        assert_eq!(Platform::Modrinth.dependency_prefix(), "modrinth");
        assert_eq!(list_variants(ReleaseType::ALL), "release, beta, alpha");
    }

    #[test]
    fn test_changelog_type_defaults_to_markdown() {
        assert_eq!(ChangelogType::default(), ChangelogType::Markdown);
        assert_eq!(serde_json::to_string(&ChangelogType::Html).unwrap(), r#""html""#);
    }
}
