//! Dependency declarations keyed by derived name
//!
//! A declaration is registered under `<platform-prefix>-<identifier>`.
//! Declaring the same identifier twice for one platform replaces the earlier
//! entry; [`DependencySet::insert`] hands the replaced declaration back.

use crate::core::types::{Platform, wire_enum};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

wire_enum! {
    /// Relation kind as written in CurseForge configuration
    pub enum RelationKind: "relation" {
        Required => "required",
        Optional => "optional",
        Incompatible => "incompatible",
        Embedded => "embedded",
        Tool => "tool",
    }
}

wire_enum! {
    /// CurseForge upload API relation vocabulary
    pub enum RelationType: "relation type" {
        EmbeddedLibrary => "embeddedLibrary",
        Incompatible => "incompatible",
        OptionalDependency => "optionalDependency",
        RequiredDependency => "requiredDependency",
        Tool => "tool",
    }
}

impl From<RelationKind> for RelationType {
    fn from(kind: RelationKind) -> Self {
        match kind {
            RelationKind::Required => RelationType::RequiredDependency,
            RelationKind::Optional => RelationType::OptionalDependency,
            RelationKind::Incompatible => RelationType::Incompatible,
            RelationKind::Embedded => RelationType::EmbeddedLibrary,
            RelationKind::Tool => RelationType::Tool,
        }
    }
}

wire_enum! {
    /// Modrinth dependency vocabulary, shared by configuration and the API
    pub enum DependencyType: "dependency type" {
        Required => "required",
        Optional => "optional",
        Incompatible => "incompatible",
        Embedded => "embedded",
    }
}

/// A declaration that can live in a [`DependencySet`]
pub trait Dependency {
    /// Relation vocabulary of the platform
    type Kind: Copy;

    /// Platform whose prefix goes into the derived name
    const PLATFORM: Platform;

    fn new(identifier: String, kind: Self::Kind) -> Self;

    /// Slug or project id of the referenced project
    fn identifier(&self) -> &str;

    fn kind(&self) -> Self::Kind;

    /// Key of this declaration, e.g. `curseforge-fabric-api`
    fn derived_name(&self) -> String {
        format!(
            "{}-{}",
            Self::PLATFORM.dependency_prefix(),
            self.identifier().trim()
        )
    }
}

/// CurseForge project referenced by slug
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurseforgeDependency {
    pub slug: String,
    pub relation: RelationKind,
}

impl Dependency for CurseforgeDependency {
    type Kind = RelationKind;
    const PLATFORM: Platform = Platform::Curseforge;

    fn new(slug: String, relation: RelationKind) -> Self {
        Self { slug, relation }
    }

    fn identifier(&self) -> &str {
        &self.slug
    }

    fn kind(&self) -> RelationKind {
        self.relation
    }
}

/// Modrinth project referenced by project id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModrinthDependency {
    pub project_id: String,
    pub dependency_type: DependencyType,
}

impl Dependency for ModrinthDependency {
    type Kind = DependencyType;
    const PLATFORM: Platform = Platform::Modrinth;

    fn new(project_id: String, dependency_type: DependencyType) -> Self {
        Self {
            project_id,
            dependency_type,
        }
    }

    fn identifier(&self) -> &str {
        &self.project_id
    }

    fn kind(&self) -> DependencyType {
        self.dependency_type
    }
}

/// Declarations keyed by derived name, iterated in name order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySet<D> {
    entries: BTreeMap<String, D>,
}

impl<D> Default for DependencySet<D> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<D: Dependency> DependencySet<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a declaration, returning the one it replaced
    pub fn insert(&mut self, dependency: D) -> Option<D> {
        self.entries.insert(dependency.derived_name(), dependency)
    }

    /// Registers `identifier` with the given relation
    pub fn declare(&mut self, identifier: impl Into<String>, kind: D::Kind) -> &mut Self {
        self.insert(D::new(identifier.into(), kind));
        self
    }

    pub fn get(&self, derived_name: &str) -> Option<&D> {
        self.entries.get(derived_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &D> {
        self.entries.values()
    }
}

impl<D: Dependency> FromIterator<D> for DependencySet<D> {
    fn from_iter<I: IntoIterator<Item = D>>(iter: I) -> Self {
        let mut set = Self::new();
        for dependency in iter {
            set.insert(dependency);
        }
        set
    }
}

impl DependencySet<CurseforgeDependency> {
    pub fn required(&mut self, slug: impl Into<String>) -> &mut Self {
        self.declare(slug, RelationKind::Required)
    }

    pub fn optional(&mut self, slug: impl Into<String>) -> &mut Self {
        self.declare(slug, RelationKind::Optional)
    }

    pub fn incompatible(&mut self, slug: impl Into<String>) -> &mut Self {
        self.declare(slug, RelationKind::Incompatible)
    }

    pub fn embedded(&mut self, slug: impl Into<String>) -> &mut Self {
        self.declare(slug, RelationKind::Embedded)
    }

    pub fn tool(&mut self, slug: impl Into<String>) -> &mut Self {
        self.declare(slug, RelationKind::Tool)
    }
}

impl DependencySet<ModrinthDependency> {
    pub fn required(&mut self, project_id: impl Into<String>) -> &mut Self {
        self.declare(project_id, DependencyType::Required)
    }

    pub fn optional(&mut self, project_id: impl Into<String>) -> &mut Self {
        self.declare(project_id, DependencyType::Optional)
    }

    pub fn incompatible(&mut self, project_id: impl Into<String>) -> &mut Self {
        self.declare(project_id, DependencyType::Incompatible)
    }

    pub fn embedded(&mut self, project_id: impl Into<String>) -> &mut Self {
        self.declare(project_id, DependencyType::Embedded)
    }
}

// Written to and read from configuration files as a plain list.
impl<D: Dependency + Serialize> Serialize for DependencySet<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.values())
    }
}

impl<'de, D: Dependency + Deserialize<'de>> Deserialize<'de> for DependencySet<D> {
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        let list = Vec::<D>::deserialize(deserializer)?;
        Ok(list.into_iter().collect())
    }
}
