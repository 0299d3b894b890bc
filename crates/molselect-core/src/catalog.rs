use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::analyzer::{Counts, SmilesAnalyzer, StructureAnalyzer, StructureError};
use crate::error::{Error, Result};

/// One selectable molecule. `id` is its position in the catalog and the
/// identifier used by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: usize,
    pub name: String,
    pub structure: String,
    pub atoms: u32,
    pub bonds: u32,
}

impl Candidate {
    pub fn counts(&self) -> Counts {
        Counts::new(self.atoms, self.bonds)
    }
}

/// Raw catalog record as written in a data file. Counts, when both are
/// present, take precedence over structure analysis.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogEntry {
    pub name: String,
    pub structure: String,
    #[serde(default)]
    pub atoms: Option<u32>,
    #[serde(default)]
    pub bonds: Option<u32>,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, structure: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            structure: structure.into(),
            atoms: None,
            bonds: None,
        }
    }

    pub fn with_counts(mut self, atoms: u32, bonds: u32) -> Self {
        self.atoms = Some(atoms);
        self.bonds = Some(bonds);
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default, rename = "candidate")]
    candidates: Vec<CatalogEntry>,
}

const BUILTIN: [(&str, &str); 9] = [
    ("Ethanol", "CCO"),
    ("Methylamine", "CCN"),
    ("Methoxy methane", "COC"),
    ("Methyl formate", "COO"),
    ("Oxazole", "CNO"),
    ("Isocyanic acid", "CN=C=O"),
    ("Propane", "CCC"),
    ("Acetaldehyde", "CC=O"),
    ("Hydrogen cyanide", "CC#N"),
];

/// Ordered, immutable list of candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    candidates: Vec<Candidate>,
}

impl Catalog {
    pub fn from_entries<A>(entries: impl IntoIterator<Item = CatalogEntry>, analyzer: &A) -> Result<Self>
    where
        A: StructureAnalyzer + ?Sized,
    {
        let candidates = entries
            .into_iter()
            .enumerate()
            .map(|(id, entry)| {
                let counts = resolve_counts(&entry, analyzer).map_err(|source| Error::InvalidStructure {
                    name: entry.name.clone(),
                    structure: entry.structure.clone(),
                    source,
                })?;
                debug!(id, name = %entry.name, atoms = counts.atoms, bonds = counts.bonds, "catalog entry");
                Ok(Candidate {
                    id,
                    name: entry.name,
                    structure: entry.structure,
                    atoms: counts.atoms,
                    bonds: counts.bonds,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { candidates })
    }

    /// Parse a TOML document of `[[candidate]]` tables.
    pub fn from_toml_str<A>(source: &str, analyzer: &A) -> Result<Self>
    where
        A: StructureAnalyzer + ?Sized,
    {
        Self::parse_toml(source, "<inline>", analyzer)
    }

    pub fn from_file<A>(path: impl AsRef<Path>, analyzer: &A) -> Result<Self>
    where
        A: StructureAnalyzer + ?Sized,
    {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| Error::CatalogLoad {
            origin: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse_toml(&source, &path.display().to_string(), analyzer)
    }

    fn parse_toml<A>(source: &str, origin: &str, analyzer: &A) -> Result<Self>
    where
        A: StructureAnalyzer + ?Sized,
    {
        let file: CatalogFile = toml::from_str(source).map_err(|e| Error::CatalogLoad {
            origin: origin.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_entries(file.candidates, analyzer)
    }

    /// The nine built-in candidates with counts derived by [`SmilesAnalyzer`].
    pub fn builtin() -> Result<Self> {
        Self::from_entries(Self::builtin_entries(), &SmilesAnalyzer)
    }

    pub fn builtin_entries() -> Vec<CatalogEntry> {
        BUILTIN
            .iter()
            .map(|(name, structure)| CatalogEntry::new(*name, *structure))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Candidate> {
        self.candidates.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }
}

/// Load the built-in catalog.
pub fn load_catalog() -> Result<Catalog> {
    Catalog::builtin()
}

fn resolve_counts<A>(entry: &CatalogEntry, analyzer: &A) -> std::result::Result<Counts, StructureError>
where
    A: StructureAnalyzer + ?Sized,
{
    match (entry.atoms, entry.bonds) {
        (Some(atoms), Some(bonds)) => Ok(Counts::new(atoms, bonds)),
        (None, None) => analyzer.analyze(&entry.structure),
        _ => Err(StructureError::PartialCounts),
    }
}
