use std::{
    any::{Any, TypeId},
    cell::RefCell,
    collections::HashMap,
    rc::Rc,
};

use async_graphql_parser::types::OperationType;
use engine_error::{Location, Message, MessageCode, MessageCollection};
use engine_schema::{Schema, TypeDefinition};
use tokio_util::sync::CancellationToken;

use super::ChildContexts;
use crate::{Document, DocumentPart, PartId, PartKind};

struct Shared<'a> {
    document: &'a Document,
    schema: &'a Schema,
    messages: &'a MessageCollection,
    cancellation: &'a CancellationToken,
    metadata: RefCell<HashMap<TypeId, Box<dyn Any>>>,
}

struct Node<'a> {
    part: Option<PartId>,
    parent: Option<DocumentValidationContext<'a>>,
    parent_type: Option<&'a TypeDefinition>,
}

/// Validation state of one document part. The root context stands for the
/// document itself and has no part.
#[derive(Clone)]
pub struct DocumentValidationContext<'a> {
    shared: Rc<Shared<'a>>,
    node: Rc<Node<'a>>,
}

impl<'a> DocumentValidationContext<'a> {
    pub fn root(
        document: &'a Document,
        schema: &'a Schema,
        messages: &'a MessageCollection,
        cancellation: &'a CancellationToken,
    ) -> Self {
        DocumentValidationContext {
            shared: Rc::new(Shared {
                document,
                schema,
                messages,
                cancellation,
                metadata: RefCell::new(HashMap::new()),
            }),
            node: Rc::new(Node {
                part: None,
                parent: None,
                parent_type: None,
            }),
        }
    }

    pub fn document(&self) -> &'a Document {
        self.shared.document
    }

    pub fn schema(&self) -> &'a Schema {
        self.shared.schema
    }

    pub fn part_id(&self) -> Option<PartId> {
        self.node.part
    }

    pub fn part(&self) -> Option<&'a DocumentPart> {
        self.node.part.and_then(|id| self.shared.document.get(id))
    }

    pub fn parent(&self) -> Option<&DocumentValidationContext<'a>> {
        self.node.parent.as_ref()
    }

    /// Composite type the part was selected on.
    pub fn parent_type(&self) -> Option<&'a TypeDefinition> {
        self.node.parent_type
    }

    pub fn report(&self, origin: Location, text: impl Into<String>) {
        self.shared.messages.add(
            Message::critical(MessageCode::OperationValidationError, text.into()).with_origin(origin),
        );
    }

    /// State kept by rule `R` across the whole traversal.
    pub fn with_metadata<R, T, V>(&self, f: impl FnOnce(&mut T) -> V) -> V
    where
        R: 'static,
        T: Default + 'static,
    {
        let mut metadata = self.shared.metadata.borrow_mut();
        let entry = metadata
            .entry(TypeId::of::<R>())
            .or_insert_with(|| Box::new(T::default()));
        match entry.downcast_mut::<T>() {
            Some(state) => f(state),
            None => {
                let mut state = T::default();
                let value = f(&mut state);
                *entry = Box::new(state);
                value
            }
        }
    }

    /// Composite type in scope for the children of this part.
    fn type_for_children(&self) -> Option<&'a TypeDefinition> {
        let schema = self.shared.schema;
        let composite = |name: &str| schema.get_type(name).filter(|def| def.is_composite());
        match &self.part()?.kind {
            PartKind::Operation { ty, .. } => match ty {
                OperationType::Query => composite(schema.query_type().map(|def| def.name.as_str())?),
                OperationType::Mutation => composite(schema.mutation_type().map(|def| def.name.as_str())?),
                OperationType::Subscription => None,
            },
            PartKind::Field { name, .. } => {
                let field = self.parent_type()?.field(name)?;
                composite(field.named_type())
            }
            PartKind::InlineFragment {
                type_condition: Some(condition),
            } => composite(condition.as_str()),
            PartKind::FragmentDefinition { type_condition, .. } => composite(type_condition.as_str()),
            _ => self.parent_type(),
        }
    }

    fn child(&self, part: PartId, parent_type: Option<&'a TypeDefinition>) -> Self {
        DocumentValidationContext {
            shared: Rc::clone(&self.shared),
            node: Rc::new(Node {
                part: Some(part),
                parent: Some(self.clone()),
                parent_type,
            }),
        }
    }
}

impl ChildContexts for DocumentValidationContext<'_> {
    fn has_children(&self) -> bool {
        match self.part() {
            Some(part) => !part.children.is_empty(),
            None => !self.shared.document.roots().is_empty(),
        }
    }

    fn child_contexts(&self) -> Vec<Self> {
        let document = self.shared.document;
        let children = match self.part() {
            Some(part) => part.children.as_slice(),
            None => document.roots(),
        };
        let parent_type = self.type_for_children();
        children.iter().map(|child| self.child(*child, parent_type)).collect()
    }

    fn is_cancelled(&self) -> bool {
        self.shared.cancellation.is_cancelled()
    }
}
