//! The layout: an ordered arena of resolved context definitions.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::context::ContextDef;
use crate::raw::{RawContext, parse_layout_str};
use crate::validate::{LayoutWarning, validate_layout};
use crate::LayoutError;

/// A named, ordered tree of context definitions describing one document
/// format.
///
/// Contexts are stored in declaration order (the scan order). Parent
/// references are resolved to arena indices at load time, tolerating forward
/// declarations; a parent reference that would make a context its own
/// ancestor is refused.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Layout name (the single top-level key of the description).
    name: String,
    /// Contexts in declaration order.
    contexts: Vec<ContextDef>,
    /// Context name to arena index.
    index_by_name: HashMap<String, usize>,
    /// Canonical name to the aliases standing in for it, declaration order.
    aliases: HashMap<String, Vec<String>>,
    /// Arena indices of repeatable contexts, declaration order.
    repeatables: Vec<usize>,
}

impl Layout {
    /// Loads a layout from a YAML description string.
    pub fn from_str(text: &str) -> Result<Self, LayoutError> {
        let (name, raws) = parse_layout_str(text, "<inline>")?;
        Self::build(name, raws)
    }

    /// Loads a layout from a YAML description file.
    pub fn from_file(path: &Path) -> Result<Self, LayoutError> {
        let text = fs::read_to_string(path).map_err(|source| LayoutError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let (name, raws) = parse_layout_str(&text, &path.display().to_string())?;
        Self::build(name, raws)
    }

    /// Resolves raw contexts into the arena and links the references.
    fn build(name: String, raws: Vec<RawContext>) -> Result<Self, LayoutError> {
        let mut contexts = Vec::with_capacity(raws.len());
        let mut index_by_name = HashMap::new();
        for (index, raw) in raws.into_iter().enumerate() {
            let ctx = ContextDef::resolve(raw)?;
            if index_by_name.insert(ctx.name.clone(), index).is_some() {
                return Err(LayoutError::DuplicateContext { context: ctx.name });
            }
            contexts.push(ctx);
        }

        // Link parents: forward references are fine, unknown names are not.
        for index in 0..contexts.len() {
            let Some(parent_name) = contexts[index].parent.as_ref().map(|p| p.name.clone()) else {
                continue;
            };
            let Some(&target) = index_by_name.get(&parent_name) else {
                return Err(LayoutError::UnknownParent {
                    context: contexts[index].name.clone(),
                    parent: parent_name,
                });
            };
            if let Some(parent) = contexts[index].parent.as_mut() {
                parent.index = Some(target);
            }
        }

        // Refuse cyclic parent chains.
        for start in 0..contexts.len() {
            let mut hops = 0;
            let mut current = start;
            while let Some(next) = contexts[current].parent.as_ref().and_then(|p| p.index) {
                hops += 1;
                if hops > contexts.len() {
                    return Err(LayoutError::CyclicParent {
                        context: contexts[start].name.clone(),
                    });
                }
                current = next;
            }
        }

        // Alias map, canonical side must exist.
        let mut aliases: HashMap<String, Vec<String>> = HashMap::new();
        for ctx in &contexts {
            if let Some(canonical) = &ctx.alternative_of {
                if !index_by_name.contains_key(canonical) {
                    return Err(LayoutError::UnknownCanonical {
                        context: ctx.name.clone(),
                        canonical: canonical.clone(),
                    });
                }
                aliases
                    .entry(canonical.clone())
                    .or_default()
                    .push(ctx.name.clone());
            }
        }

        let repeatables = contexts
            .iter()
            .enumerate()
            .filter(|(_, ctx)| ctx.repeat)
            .map(|(index, _)| index)
            .collect();

        Ok(Self {
            name,
            contexts,
            index_by_name,
            aliases,
            repeatables,
        })
    }

    /// The layout name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The layout family: the name prefix before the first dot.
    ///
    /// Layouts sharing a family are interchangeable across page boundaries
    /// during a single document scan.
    pub fn family(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }

    /// Contexts in declaration order.
    pub fn contexts(&self) -> &[ContextDef] {
        &self.contexts
    }

    /// Looks up a context by name.
    pub fn get(&self, name: &str) -> Option<&ContextDef> {
        self.index_by_name.get(name).map(|&index| &self.contexts[index])
    }

    /// Position of a context in the declaration order.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index_by_name.get(name).copied()
    }

    /// Aliases standing in for a canonical context, declaration order.
    pub fn aliases_of(&self, canonical: &str) -> &[String] {
        self.aliases
            .get(canonical)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Arena indices of repeatable contexts, declaration order.
    pub fn repeatables(&self) -> &[usize] {
        &self.repeatables
    }

    /// Lints the layout for suspicious but non-fatal constructs.
    pub fn validate(&self) -> Vec<LayoutWarning> {
        validate_layout(self)
    }
}
