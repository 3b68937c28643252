//! Phylogeny display service
//!
//! Builds the tree shown for a set of selected parameters and the marker
//! metadata for each of its labels. A service instance is request-scoped:
//! it borrows a dataset snapshot and is dropped after rendering.

use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult};
use crate::config::DisplayConfig;
use crate::domain::{
    newick, prune, Dataset, DisplayAnnotation, DomainError, LabelIndex, Parameter, ScopeSet,
    Shape, TooltipEntry, Value, ValueSet,
};

/// Prunes Newick `text` to `scope` and serializes the result.
///
/// Returns the empty string when the tree is malformed or nothing in scope
/// occurs in it; the tree is then unavailable rather than an error.
#[instrument(level = "debug", skip(text, scope), fields(scope_len = scope.len()))]
pub fn prune_text(text: &str, scope: &ScopeSet) -> String {
    match try_prune(text, scope) {
        Ok(pruned) => pruned,
        Err(DomainError::EmptyTargetSet) => {
            debug!("no scope names in tree");
            String::new()
        }
        Err(e) => {
            warn!("tree unavailable: {}", e);
            String::new()
        }
    }
}

fn try_prune(text: &str, scope: &ScopeSet) -> Result<String, DomainError> {
    let mut tree = newick::parse(text)?;
    let targets = scope.targets(&tree);
    prune(&mut tree, &targets)?;
    Ok(newick::write(&tree))
}

/// Request-scoped view of a dataset for a parameter selection.
pub struct PhylogenyService<'a> {
    dataset: &'a Dataset,
    display: DisplayConfig,
    parameters: Vec<&'a Parameter>,
    labels: LabelIndex,
    /// language id -> selected parameter index -> value set
    language2valueset: HashMap<&'a str, HashMap<usize, &'a ValueSet>>,
}

impl<'a> PhylogenyService<'a> {
    /// Create a service for the given parameter ids, in display order.
    pub fn new(
        dataset: &'a Dataset,
        parameter_ids: &[String],
        display: DisplayConfig,
    ) -> ApplicationResult<Self> {
        let parameters = parameter_ids
            .iter()
            .map(|id| {
                dataset
                    .parameter(id)
                    .ok_or_else(|| ApplicationError::UnknownParameter(id.clone()))
            })
            .collect::<ApplicationResult<Vec<_>>>()?;

        let mut language2valueset: HashMap<&str, HashMap<usize, &ValueSet>> = HashMap::new();
        for vs in &dataset.valuesets {
            if let Some(pindex) = parameters.iter().position(|p| p.id == vs.parameter) {
                language2valueset
                    .entry(vs.language.as_str())
                    .or_default()
                    .insert(pindex, vs);
            }
        }

        let labels = LabelIndex::from_languages(&dataset.languages);
        debug!(
            "phylogeny context: {} parameters, {} languages with data, {} labels",
            parameters.len(),
            language2valueset.len(),
            labels.len()
        );

        Ok(Self {
            dataset,
            display,
            parameters,
            labels,
            language2valueset,
        })
    }

    pub fn parameters(&self) -> &[&'a Parameter] {
        &self.parameters
    }

    pub fn label_index(&self) -> &LabelIndex {
        &self.labels
    }

    /// Labels with at least one language that has data for a selected parameter.
    pub fn scope(&self) -> ScopeSet {
        ScopeSet::from_labels(&self.labels, |language| {
            self.language2valueset.contains_key(language)
        })
    }

    fn stored_newick(&self) -> &str {
        self.dataset
            .phylogeny
            .as_ref()
            .map(|p| p.newick.as_str())
            .unwrap_or("")
    }

    /// The stored tree reduced to the labels in scope; empty when unavailable.
    pub fn pruned_newick(&self) -> String {
        prune_text(self.stored_newick(), &self.scope())
    }

    /// The tree to display: unchanged without a parameter selection, pruned otherwise.
    pub fn newick(&self) -> String {
        if self.parameters.is_empty() {
            return self.stored_newick().to_string();
        }
        self.pruned_newick()
    }

    /// Labels of the displayed tree that carry languages, in tree order.
    pub fn displayed_labels(&self) -> Vec<String> {
        match newick::parse(&self.newick()) {
            Ok(tree) => tree
                .names()
                .into_iter()
                .filter(|name| !self.labels.languages(name).is_empty())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    fn language_entry(&self, language_id: &str, value: Option<String>) -> TooltipEntry {
        let language_name = self
            .dataset
            .language(language_id)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| language_id.to_string());
        TooltipEntry {
            value,
            language_id: language_id.to_string(),
            language_name,
        }
    }

    fn valueset_color(&self, vs: &ValueSet, parameter: &Parameter) -> String {
        vs.color
            .clone()
            .or_else(|| {
                vs.values
                    .first()
                    .and_then(|v| v.domain_element.as_deref())
                    .and_then(|id| parameter.domain_element(id))
                    .and_then(|de| de.color.clone())
            })
            .unwrap_or_else(|| self.display.default_color.clone())
    }

    fn same_value(a: &Value, b: &Value, has_domain: bool) -> bool {
        if has_domain {
            a.domain_element == b.domain_element
        } else {
            a.name == b.name
        }
    }

    fn all_equal(values: &[(&Value, &str)], has_domain: bool) -> bool {
        match values.split_first() {
            Some(((first, _), rest)) => rest
                .iter()
                .all(|(other, _)| Self::same_value(first, other, has_domain)),
            None => true,
        }
    }

    fn missing_data(&self, mut annotation: DisplayAnnotation) -> DisplayAnnotation {
        annotation.tooltip_title = "Missing data".to_string();
        annotation.tooltip = None;
        annotation.shape = Shape::Square;
        annotation.color = self.display.missing_color.clone();
        annotation
    }

    /// Marker metadata for `label`, optionally for one selected parameter.
    #[instrument(level = "trace", skip(self))]
    pub fn label_properties(&self, label: &str, pindex: Option<usize>) -> DisplayAnnotation {
        let eid = match pindex {
            Some(p) => format!("tlpk{}-{}", label, p),
            None => format!("tlpk{}-None", label),
        };
        let mut annotation = DisplayAnnotation {
            eid,
            shape: Shape::Circle,
            color: self.display.default_color.clone(),
            conflict: false,
            tooltip_title: format!("Related {}", self.display.languages_label),
            tooltip: None,
        };
        let language_ids = self.labels.languages(label);

        let Some(pindex) = pindex else {
            annotation.tooltip = Some(
                language_ids
                    .iter()
                    .map(|id| self.language_entry(id, None))
                    .collect(),
            );
            return annotation;
        };
        let Some(parameter) = self.parameters.get(pindex).copied() else {
            return self.missing_data(annotation);
        };

        let mut values: Vec<(&Value, &str)> = Vec::new();
        let mut color = self.display.default_color.clone();
        for id in language_ids {
            let Some(vs) = self
                .language2valueset
                .get(id.as_str())
                .and_then(|sets| sets.get(&pindex))
            else {
                continue;
            };
            values.extend(vs.values.iter().map(|v| (v, vs.language.as_str())));
            color = self.valueset_color(vs, parameter);
        }

        if values.is_empty() {
            return self.missing_data(annotation);
        }

        annotation.conflict = !Self::all_equal(&values, parameter.has_domain());
        annotation.tooltip_title = format!("Parameter {}", parameter.id);
        annotation.tooltip = Some(
            values
                .iter()
                .map(|(value, language_id)| {
                    let name = value
                        .domain_element
                        .as_deref()
                        .and_then(|id| parameter.domain_element(id))
                        .map(|de| de.name.clone())
                        .unwrap_or_else(|| value.name.clone());
                    self.language_entry(language_id, Some(name))
                })
                .collect(),
        );
        annotation.color = color;
        annotation
    }
}
