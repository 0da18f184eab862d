mod construction;

use std::sync::Arc;

use async_graphql_parser::types::{OperationType, Type};
use async_graphql_value::{ConstValue, Name, Value};
use engine_error::{Location, Message, MessageCode, MessageCollection};
use indexmap::IndexMap;

pub use construction::{ConstructionContext, ConstructionError, ConstructionOptions, ConstructionSink, SyntaxNode};

/// Index of a part in its document's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartId(usize);

impl PartId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum PartKind {
    Operation {
        ty: OperationType,
        name: Option<Name>,
    },
    Field {
        alias: Option<Name>,
        name: Name,
    },
    FragmentSpread {
        fragment_name: Name,
    },
    InlineFragment {
        type_condition: Option<Name>,
    },
    FragmentDefinition {
        name: Name,
        type_condition: Name,
    },
    Variable {
        name: Name,
        ty: Type,
        default_value: Option<ConstValue>,
    },
    Directive {
        name: Name,
    },
    /// An argument of a field or directive.
    InputValue {
        name: Name,
        value: Value,
    },
}

impl PartKind {
    pub fn is_selection(&self) -> bool {
        matches!(
            self,
            PartKind::Field { .. } | PartKind::FragmentSpread { .. } | PartKind::InlineFragment { .. }
        )
    }

    pub fn label(&self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone)]
pub struct DocumentPart {
    pub kind: PartKind,
    pub parent: Option<PartId>,
    pub children: Vec<PartId>,
    pub origin: Location,
    /// Number of field selections between the part and its operation or fragment definition.
    pub depth: usize,
    /// Operation the part belongs to. Parts of fragment definitions have none.
    pub operation: Option<PartId>,
    pub directives: Vec<PartId>,
}

impl DocumentPart {
    /// Response key of a field, its alias or its name.
    pub fn response_key(&self) -> Option<&Name> {
        match &self.kind {
            PartKind::Field { alias, name } => Some(alias.as_ref().unwrap_or(name)),
            _ => None,
        }
    }
}

/// Every part of a request's query, owned in one arena.
#[derive(Debug)]
pub struct Document {
    pub(crate) parts: Vec<DocumentPart>,
    pub(crate) roots: Vec<PartId>,
    pub(crate) operations: Vec<PartId>,
    pub(crate) fragments: IndexMap<String, PartId>,
    pub(crate) fragment_spreads: Vec<PartId>,
    pub(crate) messages: Arc<MessageCollection>,
}

impl Document {
    pub(crate) fn empty(messages: Arc<MessageCollection>) -> Self {
        Document {
            parts: Vec::new(),
            roots: Vec::new(),
            operations: Vec::new(),
            fragments: IndexMap::new(),
            fragment_spreads: Vec::new(),
            messages,
        }
    }

    /// Parses `query` and builds its document. Syntax errors are reported on
    /// `messages` and yield an empty document.
    pub fn parse(
        query: &str,
        messages: Arc<MessageCollection>,
        options: &ConstructionOptions,
    ) -> Result<Document, ConstructionError> {
        match async_graphql_parser::parse_query(query) {
            Ok(syntax) => Document::construct(&[&syntax], messages, options),
            Err(err) => {
                let mut message = Message::critical(MessageCode::SyntaxError, err.to_string());
                if let Some(pos) = err.positions().next() {
                    message = message.with_origin(Location::new(pos.line, pos.column));
                }
                tracing::debug!(error = %err, "query failed to parse");
                messages.add(message);
                Ok(Document::empty(messages))
            }
        }
    }

    pub fn get(&self, id: PartId) -> Option<&DocumentPart> {
        self.parts.get(id.0)
    }

    pub fn parts(&self) -> impl ExactSizeIterator<Item = (PartId, &DocumentPart)> + '_ {
        self.parts.iter().enumerate().map(|(index, part)| (PartId(index), part))
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Operations and fragment definitions, in source order.
    pub fn roots(&self) -> &[PartId] {
        &self.roots
    }

    pub fn operations(&self) -> &[PartId] {
        &self.operations
    }

    pub fn fragment(&self, name: &str) -> Option<PartId> {
        self.fragments.get(name).copied()
    }

    pub fn fragments(&self) -> impl Iterator<Item = (&str, PartId)> + '_ {
        self.fragments.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn fragment_spreads(&self) -> &[PartId] {
        &self.fragment_spreads
    }

    pub fn messages(&self) -> &Arc<MessageCollection> {
        &self.messages
    }

    pub fn is_valid(&self) -> bool {
        self.messages.is_valid()
    }

    pub fn children(&self, id: PartId) -> impl Iterator<Item = (PartId, &DocumentPart)> + '_ {
        self.get(id)
            .into_iter()
            .flat_map(|part| part.children.iter())
            .filter_map(|child| self.get(*child).map(|part| (*child, part)))
    }

    pub fn selections(&self, id: PartId) -> impl Iterator<Item = (PartId, &DocumentPart)> + '_ {
        self.children(id).filter(|(_, part)| part.kind.is_selection())
    }

    pub fn arguments(&self, id: PartId) -> impl Iterator<Item = (&Name, &Value)> + '_ {
        self.children(id).filter_map(|(_, part)| match &part.kind {
            PartKind::InputValue { name, value } => Some((name, value)),
            _ => None,
        })
    }

    pub fn directives(&self, id: PartId) -> impl Iterator<Item = (PartId, &DocumentPart)> + '_ {
        self.get(id)
            .into_iter()
            .flat_map(|part| part.directives.iter())
            .filter_map(|directive| self.get(*directive).map(|part| (*directive, part)))
    }

    /// Parts below `id` in pre-order, `id` excluded.
    pub fn descendants(&self, id: PartId) -> Descendants<'_> {
        let stack = self.get(id).map(|part| part.children.iter().rev().copied().collect()).unwrap_or_default();
        Descendants { document: self, stack }
    }

    /// Operation to execute: the one named `name`, or the only one when no name is given.
    pub fn operation(&self, name: Option<&str>) -> Option<PartId> {
        match name {
            Some(name) => self.operations.iter().copied().find(|id| self.operation_name(*id) == Some(name)),
            None => match self.operations.as_slice() {
                [single] => Some(*single),
                _ => None,
            },
        }
    }

    pub fn operation_name(&self, id: PartId) -> Option<&str> {
        match self.get(id).map(|part| &part.kind) {
            Some(PartKind::Operation { name, .. }) => name.as_deref(),
            _ => None,
        }
    }

    /// Names of the fragments spread anywhere below `id`, directly or not.
    pub fn spread_fragment_names(&self, id: PartId) -> Vec<&str> {
        let mut names = Vec::new();
        for (_, part) in self.descendants(id) {
            if let PartKind::FragmentSpread { fragment_name } = &part.kind {
                if !names.contains(&fragment_name.as_str()) {
                    names.push(fragment_name.as_str());
                }
            }
        }
        names
    }

    /// Fragments reachable from `id` through spreads, following nested spreads.
    pub fn reachable_fragments(&self, id: PartId) -> Vec<&str> {
        let mut reachable: Vec<&str> = Vec::new();
        let mut stack = self.spread_fragment_names(id);
        while let Some(name) = stack.pop() {
            if reachable.contains(&name) {
                continue;
            }
            reachable.push(name);
            if let Some(fragment) = self.fragment(name) {
                stack.extend(self.spread_fragment_names(fragment));
            }
        }
        reachable
    }
}

impl std::ops::Index<PartId> for Document {
    type Output = DocumentPart;

    fn index(&self, id: PartId) -> &Self::Output {
        &self.parts[id.0]
    }
}

pub struct Descendants<'a> {
    document: &'a Document,
    stack: Vec<PartId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = (PartId, &'a DocumentPart);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let part = self.document.get(id)?;
        self.stack.extend(part.children.iter().rev().copied());
        Some((id, part))
    }
}
