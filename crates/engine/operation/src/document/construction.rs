use std::{
    cell::{Cell, RefCell},
    sync::Arc,
};

use async_graphql_parser::{
    types::{
        Directive, DocumentOperations, ExecutableDocument, Field, FragmentDefinition, FragmentSpread, InlineFragment,
        OperationDefinition, Selection, SelectionSet, VariableDefinition,
    },
    Pos, Positioned,
};
use async_graphql_value::{Name, Value};
use engine_error::{Location, Message, MessageCode, MessageCollection};

use super::{Document, DocumentPart, PartId, PartKind};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("construction context already holds part {0:?}")]
    PartAlreadyAssigned(PartId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructionOptions {
    /// Syntax nesting beyond which the rest of a branch is dropped and reported.
    pub max_nesting: usize,
}

impl Default for ConstructionOptions {
    fn default() -> Self {
        ConstructionOptions { max_nesting: 512 }
    }
}

/// A node of the parsed query.
#[derive(Debug, Clone, Copy)]
pub enum SyntaxNode<'a> {
    Document(&'a ExecutableDocument),
    Operation(Option<&'a Name>, &'a Positioned<OperationDefinition>),
    FragmentDefinition(&'a Name, &'a Positioned<FragmentDefinition>),
    VariableDefinition(&'a Positioned<VariableDefinition>),
    SelectionSet(&'a Positioned<SelectionSet>),
    Field(&'a Positioned<Field>),
    FragmentSpread(&'a Positioned<FragmentSpread>),
    InlineFragment(&'a Positioned<InlineFragment>),
    Directive(&'a Positioned<Directive>),
    Argument(&'a Positioned<Name>, &'a Positioned<Value>),
}

impl<'a> SyntaxNode<'a> {
    pub fn pos(&self) -> Pos {
        match self {
            SyntaxNode::Document(_) => Pos::default(),
            SyntaxNode::Operation(_, node) => node.pos,
            SyntaxNode::FragmentDefinition(_, node) => node.pos,
            SyntaxNode::VariableDefinition(node) => node.pos,
            SyntaxNode::SelectionSet(node) => node.pos,
            SyntaxNode::Field(node) => node.pos,
            SyntaxNode::FragmentSpread(node) => node.pos,
            SyntaxNode::InlineFragment(node) => node.pos,
            SyntaxNode::Directive(node) => node.pos,
            SyntaxNode::Argument(name, _) => name.pos,
        }
    }

    pub fn location(&self) -> Location {
        let pos = self.pos();
        Location::new(pos.line, pos.column)
    }

    /// Part this node becomes, `None` for nodes that are passed through.
    pub fn part_kind(&self) -> Option<PartKind> {
        let kind = match self {
            SyntaxNode::Document(_) | SyntaxNode::SelectionSet(_) => return None,
            SyntaxNode::Operation(name, operation) => PartKind::Operation {
                ty: operation.node.ty,
                name: name.cloned(),
            },
            SyntaxNode::FragmentDefinition(name, fragment) => PartKind::FragmentDefinition {
                name: (*name).clone(),
                type_condition: fragment.node.type_condition.node.on.node.clone(),
            },
            SyntaxNode::VariableDefinition(variable) => PartKind::Variable {
                name: variable.node.name.node.clone(),
                ty: variable.node.var_type.node.clone(),
                default_value: variable.node.default_value.as_ref().map(|value| value.node.clone()),
            },
            SyntaxNode::Field(field) => PartKind::Field {
                alias: field.node.alias.as_ref().map(|alias| alias.node.clone()),
                name: field.node.name.node.clone(),
            },
            SyntaxNode::FragmentSpread(spread) => PartKind::FragmentSpread {
                fragment_name: spread.node.fragment_name.node.clone(),
            },
            SyntaxNode::InlineFragment(fragment) => PartKind::InlineFragment {
                type_condition: fragment
                    .node
                    .type_condition
                    .as_ref()
                    .map(|condition| condition.node.on.node.clone()),
            },
            SyntaxNode::Directive(directive) => PartKind::Directive {
                name: directive.node.name.node.clone(),
            },
            SyntaxNode::Argument(name, value) => PartKind::InputValue {
                name: name.node.clone(),
                value: value.node.clone(),
            },
        };
        Some(kind)
    }

    /// Child nodes in source order.
    pub fn children(&self) -> Vec<SyntaxNode<'a>> {
        let mut children = Vec::new();
        match *self {
            SyntaxNode::Document(document) => {
                match &document.operations {
                    DocumentOperations::Single(operation) => children.push(SyntaxNode::Operation(None, operation)),
                    DocumentOperations::Multiple(operations) => children.extend(
                        operations
                            .iter()
                            .map(|(name, operation)| SyntaxNode::Operation(Some(name), operation)),
                    ),
                }
                children.extend(
                    document
                        .fragments
                        .iter()
                        .map(|(name, fragment)| SyntaxNode::FragmentDefinition(name, fragment)),
                );
                children.sort_by_key(|node| (node.pos().line, node.pos().column));
            }
            SyntaxNode::Operation(_, operation) => {
                children.extend(
                    operation
                        .node
                        .variable_definitions
                        .iter()
                        .map(SyntaxNode::VariableDefinition),
                );
                children.extend(operation.node.directives.iter().map(SyntaxNode::Directive));
                children.push(SyntaxNode::SelectionSet(&operation.node.selection_set));
            }
            SyntaxNode::FragmentDefinition(_, fragment) => {
                children.extend(fragment.node.directives.iter().map(SyntaxNode::Directive));
                children.push(SyntaxNode::SelectionSet(&fragment.node.selection_set));
            }
            SyntaxNode::SelectionSet(selection_set) => {
                children.extend(selection_set.node.items.iter().map(|item| match &item.node {
                    Selection::Field(field) => SyntaxNode::Field(field),
                    Selection::FragmentSpread(spread) => SyntaxNode::FragmentSpread(spread),
                    Selection::InlineFragment(fragment) => SyntaxNode::InlineFragment(fragment),
                }));
            }
            SyntaxNode::Field(field) => {
                children.extend(
                    field
                        .node
                        .arguments
                        .iter()
                        .map(|(name, value)| SyntaxNode::Argument(name, value)),
                );
                children.extend(field.node.directives.iter().map(SyntaxNode::Directive));
                if !field.node.selection_set.node.items.is_empty() {
                    children.push(SyntaxNode::SelectionSet(&field.node.selection_set));
                }
            }
            SyntaxNode::FragmentSpread(spread) => {
                children.extend(spread.node.directives.iter().map(SyntaxNode::Directive));
            }
            SyntaxNode::InlineFragment(fragment) => {
                children.extend(fragment.node.directives.iter().map(SyntaxNode::Directive));
                children.push(SyntaxNode::SelectionSet(&fragment.node.selection_set));
            }
            SyntaxNode::Directive(directive) => {
                children.extend(
                    directive
                        .node
                        .arguments
                        .iter()
                        .map(|(name, value)| SyntaxNode::Argument(name, value)),
                );
            }
            SyntaxNode::VariableDefinition(_) | SyntaxNode::Argument(..) => {}
        }
        children
    }
}

/// State shared by every context of one construction: the document being
/// populated and the nesting guard.
#[derive(Debug)]
pub struct ConstructionSink {
    document: RefCell<Document>,
    max_nesting: usize,
    reported_nesting: Cell<bool>,
}

impl ConstructionSink {
    pub fn new(messages: Arc<MessageCollection>, options: &ConstructionOptions) -> Self {
        ConstructionSink {
            document: RefCell::new(Document::empty(messages)),
            max_nesting: options.max_nesting,
            reported_nesting: Cell::new(false),
        }
    }

    pub fn report(&self, message: Message) {
        self.document.borrow().messages.add(message);
    }

    fn report_too_deep(&self, location: Location) {
        if !self.reported_nesting.replace(true) {
            self.report(
                Message::critical(
                    MessageCode::DocumentConstructionError,
                    format!("Query is nested deeper than {} levels", self.max_nesting),
                )
                .with_origin(location),
            );
        }
    }

    pub fn into_document(self) -> Document {
        self.document.into_inner()
    }
}

/// Snapshot of the construction state for one syntax node. Contexts are never
/// mutated, every step produces a new one.
#[derive(Debug, Clone)]
pub struct ConstructionContext<'a> {
    sink: &'a ConstructionSink,
    node: SyntaxNode<'a>,
    parent: Option<PartId>,
    part: Option<PartId>,
    depth: usize,
    nesting: usize,
    operation: Option<PartId>,
}

impl<'a> ConstructionContext<'a> {
    pub fn new(sink: &'a ConstructionSink, node: SyntaxNode<'a>) -> Self {
        ConstructionContext {
            sink,
            node,
            parent: None,
            part: None,
            depth: 0,
            nesting: 0,
            operation: None,
        }
    }

    pub fn node(&self) -> SyntaxNode<'a> {
        self.node
    }

    pub fn parent(&self) -> Option<PartId> {
        self.parent
    }

    pub fn part(&self) -> Option<PartId> {
        self.part
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn nesting(&self) -> usize {
        self.nesting
    }

    pub fn operation(&self) -> Option<PartId> {
        self.operation
    }

    /// Creates the part for the node in focus under the context's parent.
    pub fn assign_part(&self, kind: PartKind, origin: Location) -> Result<Self, ConstructionError> {
        if let Some(part) = self.part {
            return Err(ConstructionError::PartAlreadyAssigned(part));
        }

        let mut document = self.sink.document.borrow_mut();
        let id = PartId(document.parts.len());
        let depth = match kind {
            PartKind::Field { .. } => self.depth + 1,
            PartKind::FragmentDefinition { .. } | PartKind::Operation { .. } => 0,
            _ => self.depth,
        };
        let operation = match kind {
            PartKind::Operation { .. } => Some(id),
            PartKind::FragmentDefinition { .. } => None,
            _ => self.operation,
        };

        if let Some(message) = self.duplicate(&document, &kind) {
            document.messages.add(message.with_origin(origin));
        }
        match &kind {
            PartKind::Operation { .. } => document.operations.push(id),
            PartKind::FragmentDefinition { name, .. } => {
                if !document.fragments.contains_key(name.as_str()) {
                    document.fragments.insert(name.to_string(), id);
                }
            }
            PartKind::FragmentSpread { .. } => document.fragment_spreads.push(id),
            _ => {}
        }

        let is_directive = matches!(kind, PartKind::Directive { .. });
        document.parts.push(DocumentPart {
            kind,
            parent: self.parent,
            children: Vec::new(),
            origin,
            depth,
            operation,
            directives: Vec::new(),
        });
        match self.parent.and_then(|parent| document.parts.get_mut(parent.0)) {
            Some(parent) => {
                parent.children.push(id);
                if is_directive {
                    parent.directives.push(id);
                }
            }
            None => document.roots.push(id),
        }

        Ok(ConstructionContext {
            part: Some(id),
            depth,
            operation,
            ..self.clone()
        })
    }

    /// Passes through a node that has no part of its own: the parent's part
    /// stays in charge and depth is left untouched.
    #[must_use]
    pub fn skip(&self) -> Self {
        ConstructionContext {
            part: self.parent,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn create_child_context(&self, node: SyntaxNode<'a>) -> Self {
        ConstructionContext {
            node,
            parent: self.part,
            part: None,
            nesting: self.nesting + 1,
            ..self.clone()
        }
    }

    fn duplicate(&self, document: &Document, kind: &PartKind) -> Option<Message> {
        let siblings = || {
            self.parent
                .and_then(|parent| document.parts.get(parent.0))
                .into_iter()
                .flat_map(|parent| parent.children.iter())
                .filter_map(|id| document.parts.get(id.0))
        };
        let text = match kind {
            PartKind::InputValue { name, .. } => siblings()
                .any(|part| matches!(&part.kind, PartKind::InputValue { name: other, .. } if other == name))
                .then(|| format!(r#"There can be only one argument named "{name}""#)),
            PartKind::Variable { name, .. } => siblings()
                .any(|part| matches!(&part.kind, PartKind::Variable { name: other, .. } if other == name))
                .then(|| format!(r#"There can be only one variable named "${name}""#)),
            PartKind::FragmentDefinition { name, .. } => document
                .fragments
                .contains_key(name.as_str())
                .then(|| format!(r#"There can be only one fragment named "{name}""#)),
            _ => None,
        }?;
        Some(Message::critical(MessageCode::DocumentConstructionError, text))
    }
}

impl Document {
    /// Builds the document of one or more parsed sources. Definitions keep
    /// their source order, sources are taken one after the other.
    pub fn construct(
        sources: &[&ExecutableDocument],
        messages: Arc<MessageCollection>,
        options: &ConstructionOptions,
    ) -> Result<Document, ConstructionError> {
        let sink = ConstructionSink::new(messages, options);
        let mut stack = sources
            .iter()
            .rev()
            .map(|source| ConstructionContext::new(&sink, SyntaxNode::Document(source)))
            .collect::<Vec<_>>();

        while let Some(context) = stack.pop() {
            if context.nesting() > sink.max_nesting {
                sink.report_too_deep(context.node().location());
                continue;
            }
            let context = match context.node().part_kind() {
                Some(kind) => context.assign_part(kind, context.node().location())?,
                None => context.skip(),
            };
            stack.extend(
                context
                    .node()
                    .children()
                    .into_iter()
                    .rev()
                    .map(|child| context.create_child_context(child)),
            );
        }

        let document = sink.into_document();
        tracing::debug!(
            parts = document.len(),
            operations = document.operations.len(),
            fragments = document.fragments.len(),
            "document constructed"
        );
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    fn build(query: &str) -> Document {
        Document::parse(query, Arc::new(MessageCollection::new()), &ConstructionOptions::default()).unwrap()
    }

    fn outline(document: &Document) -> Vec<String> {
        let mut lines = Vec::new();
        for root in document.roots() {
            let part = &document[*root];
            lines.push(format!("{} d={}", part.kind.label(), part.depth));
            for (_, part) in document.descendants(*root) {
                let mut indent = 1;
                let mut parent = part.parent;
                while let Some(id) = parent {
                    if document.roots().contains(&id) {
                        break;
                    }
                    indent += 1;
                    parent = document[id].parent;
                }
                lines.push(format!("{}{} d={}", "  ".repeat(indent), part.kind.label(), part.depth));
            }
        }
        lines
    }

    #[test]
    fn builds_parts_in_source_order() {
        let document = build(indoc! {r#"
            query Q($id: ID!) {
              user(id: $id) @include(if: true) {
                name
                ...Friends
                ... on User { id }
              }
            }

            fragment Friends on User {
              friends { name }
            }
        "#});

        assert_eq!(
            outline(&document),
            vec![
                "operation d=0",
                "  variable d=0",
                "  field d=1",
                "    input_value d=1",
                "    directive d=1",
                "      input_value d=1",
                "    field d=2",
                "    fragment_spread d=1",
                "    inline_fragment d=1",
                "      field d=2",
                "fragment_definition d=0",
                "  field d=1",
                "    field d=2",
            ]
        );
        assert!(document.is_valid());
        assert_eq!(document.operations().len(), 1);
        assert_eq!(document.fragment_spreads().len(), 1);
        assert!(document.fragment("Friends").is_some());
    }

    #[test]
    fn every_part_has_one_parent() {
        let document = build(indoc! {r"
            {
              a { b { c { d } } }
              ... on Query { e { f } }
            }
        "});

        let mut owners = vec![0usize; document.len()];
        for (_, part) in document.parts() {
            for child in &part.children {
                owners[child.index()] += 1;
                assert_eq!(document[*child].parent.map(PartId::index), Some(part_index(&document, part)));
            }
        }
        for (id, part) in document.parts() {
            let expected = usize::from(part.parent.is_some());
            assert_eq!(owners[id.index()], expected);
            if let Some(parent) = part.parent {
                let parent = &document[parent];
                let increment = usize::from(matches!(part.kind, PartKind::Field { .. }));
                assert_eq!(part.depth, parent.depth + increment);
            }
        }
    }

    fn part_index(document: &Document, part: &DocumentPart) -> usize {
        document
            .parts()
            .find(|(_, candidate)| std::ptr::eq(*candidate, part))
            .map(|(id, _)| id.index())
            .unwrap()
    }

    #[test]
    fn assigning_twice_is_an_invariant_violation() {
        let sink = ConstructionSink::new(Arc::new(MessageCollection::new()), &ConstructionOptions::default());
        let syntax = async_graphql_parser::parse_query("{ a }").unwrap();
        let context = ConstructionContext::new(&sink, SyntaxNode::Document(&syntax));
        let kind = PartKind::FragmentSpread {
            fragment_name: Name::new("F"),
        };

        let assigned = context.assign_part(kind.clone(), Location::new(1, 1)).unwrap();
        let err = assigned.assign_part(kind, Location::new(1, 1)).unwrap_err();

        assert_eq!(err, ConstructionError::PartAlreadyAssigned(assigned.part().unwrap()));
    }

    #[test]
    fn skip_passes_the_parent_part_through() {
        let sink = ConstructionSink::new(Arc::new(MessageCollection::new()), &ConstructionOptions::default());
        let syntax = async_graphql_parser::parse_query("{ a { b } }").unwrap();
        let root = ConstructionContext::new(&sink, SyntaxNode::Document(&syntax));
        let field = root
            .assign_part(
                PartKind::Field {
                    alias: None,
                    name: Name::new("a"),
                },
                Location::new(1, 3),
            )
            .unwrap();

        let selection = field.create_child_context(SyntaxNode::Document(&syntax));
        assert_eq!(selection.part(), None);
        assert_eq!(selection.parent(), field.part());

        let skipped = selection.skip();
        assert_eq!(skipped.part(), field.part());
        assert_eq!(skipped.depth(), field.depth());
        assert_eq!(skipped.nesting(), field.nesting() + 1);
    }

    #[test]
    fn structural_errors_become_messages() {
        let document = build(indoc! {r"
            query Q($a: Int, $a: Int) {
              field(x: 1, x: 2)
            }
        "});

        let texts = document
            .messages()
            .to_vec()
            .into_iter()
            .map(|message| message.text.to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            texts,
            vec![
                r#"There can be only one variable named "$a""#,
                r#"There can be only one argument named "x""#,
            ]
        );
        assert!(!document.is_valid());
    }

    #[test]
    fn fragments_from_several_sources_cannot_shadow_each_other() {
        let first = async_graphql_parser::parse_query("{ ...F } fragment F on Query { a }").unwrap();
        let second = async_graphql_parser::parse_query("fragment F on Query { b } { c }").unwrap();
        let document = Document::construct(
            &[&first, &second],
            Arc::new(MessageCollection::new()),
            &ConstructionOptions::default(),
        )
        .unwrap();

        let messages = document.messages().to_vec();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, r#"There can be only one fragment named "F""#);
        assert_eq!(document.operations().len(), 2);
        assert_eq!(document[document.fragment("F").unwrap()].origin, Location::new(1, 10));
    }

    #[test]
    fn deep_documents_are_cut_at_the_guard() {
        let depth = 40;
        let query = format!("{}{}", "{ a ".repeat(depth), "}".repeat(depth));
        let document = Document::parse(
            &query,
            Arc::new(MessageCollection::new()),
            &ConstructionOptions { max_nesting: 16 },
        )
        .unwrap();

        let messages = document.messages().to_vec();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].code, MessageCode::DocumentConstructionError);
        assert!(document.parts().all(|(_, part)| part.depth <= 16));
    }

    #[test]
    fn syntax_errors_yield_an_empty_document() {
        let document = build("{ a");

        assert!(document.is_empty());
        let messages = document.messages().to_vec();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].code, MessageCode::SyntaxError);
    }
}
