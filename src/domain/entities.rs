//! Domain entities: dataset records and display annotations

use serde::{Deserialize, Serialize};

/// A stored phylogeny in Newick notation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phylogeny {
    pub id: String,
    pub name: String,
    pub newick: String,
}

/// A language (variety) with an optional Glottolog code linking it to tree labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub glottocode: Option<String>,
}

/// A categorical value a parameter may take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainElement {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// A numeral parameter, e.g. "One" or "Base".
///
/// Parameters without a domain take free-form values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub domain: Vec<DomainElement>,
}

impl Parameter {
    pub fn has_domain(&self) -> bool {
        !self.domain.is_empty()
    }

    pub fn domain_element(&self, id: &str) -> Option<&DomainElement> {
        self.domain.iter().find(|de| de.id == id)
    }
}

/// A single form recorded for a language and parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    pub name: String,
    #[serde(default, rename = "domainelement")]
    pub domain_element: Option<String>,
}

/// All values one language has for one parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueSet {
    pub language: String,
    pub parameter: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub values: Vec<Value>,
}

/// Snapshot of everything the phylogeny views read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub phylogeny: Option<Phylogeny>,
    #[serde(default)]
    pub languages: Vec<Language>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub valuesets: Vec<ValueSet>,
}

impl Dataset {
    pub fn language(&self, id: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.id == id)
    }

    pub fn parameter(&self, id: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.id == id)
    }
}

/// Marker shape drawn for a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    #[serde(rename = "c")]
    Circle,
    #[serde(rename = "s")]
    Square,
}

/// One line of a node tooltip: an optional value and the language it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TooltipEntry {
    pub value: Option<String>,
    pub language_id: String,
    pub language_name: String,
}

/// Display metadata for a tree node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayAnnotation {
    pub eid: String,
    pub shape: Shape,
    pub color: String,
    pub conflict: bool,
    pub tooltip_title: String,
    pub tooltip: Option<Vec<TooltipEntry>>,
}
