use std::{fmt::Write, sync::Arc};

use async_graphql_value::{ConstValue, Name};
use engine_error::MessageCollection;
use engine_invocation::{Member, ResolverError};
use engine_operation::{
    ArgumentValue, ConstructionOptions, Document, FieldInvocationContext, FieldInvocationPlan, PlanCacheKey,
    PlanError,
};
use engine_schema::{
    Argument, DirectiveLocation, DirectiveType, Field, InputObjectType, InterfaceType, ObjectType, Schema, UnionType,
};
use indexmap::IndexMap;
use indoc::indoc;
use pretty_assertions::assert_eq;

struct Query;
struct User;
struct Post;

fn unit<T: Send + Sync + 'static>() -> Member<T> {
    Member::property(|_: &T| ())
}

fn schema() -> Schema {
    let query = ObjectType::new("Query")
        .field(Field::new("me", "User", unit::<Query>()))
        .field(
            Field::new(
                "search",
                "[SearchResult!]!",
                Member::method1(["term"], |_: &Query, _term: String| Ok::<_, ResolverError>(())),
            )
            .argument(Argument::new("term", "String!")),
        )
        .field(
            Field::new(
                "users",
                "[User!]!",
                Member::method1(["filter"], |_: &Query, _filter: Option<ConstValue>| {
                    Ok::<_, ResolverError>(())
                }),
            )
            .argument(Argument::new("filter", "UserFilter")),
        );
    let user = ObjectType::new("User")
        .implements("Node")
        .field(Field::new("id", "ID!", unit::<User>()))
        .field(Field::new("name", "String!", unit::<User>()))
        .field(
            Field::new(
                "friends",
                "[User!]!",
                Member::method1(["first"], |_: &User, _first: Option<i64>| Ok::<_, ResolverError>(())),
            )
            .argument(Argument::new("first", "Int")),
        );
    let post = ObjectType::new("Post")
        .implements("Node")
        .field(Field::new("id", "ID!", unit::<Post>()))
        .field(Field::new("title", "String!", unit::<Post>()));

    Schema::build(query)
        .object(user)
        .object(post)
        .interface(InterfaceType::new("Node").field("id", "ID!"))
        .union(UnionType::new("SearchResult").member("User").member("Post"))
        .input_object(InputObjectType::new("UserFilter").field(Argument::new("name", "String")))
        .directive(DirectiveType::new("upper").location(DirectiveLocation::Field))
        .directive(
            DirectiveType::new("audit")
                .location(DirectiveLocation::Query)
                .location(DirectiveLocation::FragmentDefinition),
        )
        .finish()
        .unwrap()
}

fn plan(query: &str, operation_name: Option<&str>) -> Result<FieldInvocationPlan, PlanError> {
    let schema = schema();
    let document = Document::parse(
        query,
        Arc::new(MessageCollection::new()),
        &ConstructionOptions::default(),
    )
    .unwrap();
    let key = PlanCacheKey::new(schema.id(), operation_name, query);
    FieldInvocationPlan::build(&document, &schema, operation_name, key)
}

fn outline(plan: &FieldInvocationPlan) -> String {
    fn write_fields(out: &mut String, fields: &[FieldInvocationContext], depth: usize) {
        for field in fields {
            let _ = write!(
                out,
                "{}{}: {}.{} -> {}",
                "  ".repeat(depth),
                field.response_key,
                field.parent_type,
                field.field_name,
                field.ty
            );
            if let Some(restrict) = &field.restrict {
                let _ = write!(out, " only({})", restrict.types().collect::<Vec<_>>().join("|"));
            }
            for directive in &field.directives {
                let _ = write!(out, " @{}", directive.name);
            }
            out.push('\n');
            write_fields(out, &field.children, depth + 1);
        }
    }

    let mut out = String::new();
    write_fields(&mut out, plan.root(), 0);
    out
}

#[test]
fn fragments_are_expanded_and_restricted() {
    let plan = plan(
        indoc! {r"
            query Search($term: String!) {
              search(term: $term) {
                __typename
                ... on Node { id }
                ... on User { name }
                ...PostFields
              }
            }

            fragment PostFields on Post { title }
        "},
        None,
    )
    .unwrap();

    insta::assert_snapshot!(outline(&plan), @r"
    search: Query.search -> [SearchResult!]!
      __typename: SearchResult.__typename -> String!
      id: Node.id -> ID!
      name: User.name -> String! only(User)
      title: Post.title -> String! only(Post)
    ");
    assert!(plan.is_cacheable());
    assert_eq!(plan.operation_name(), Some("Search"));
    assert_eq!(plan.root_type(), "Query");
    assert_eq!(plan.variables().len(), 1);
    assert_eq!(plan.field_count(), 5);
}

#[test]
fn fragment_directives_come_first() {
    let plan = plan(
        indoc! {r"
            query ($withName: Boolean!) {
              me {
                id @skip(if: false)
                ... @include(if: $withName) { name @upper }
                ...Friends @skip(if: true)
              }
            }

            fragment Friends on User { friends(first: 2) { id } }
        "},
        None,
    )
    .unwrap();

    insta::assert_snapshot!(outline(&plan), @r"
    me: Query.me -> User
      id: User.id -> ID! @skip
      name: User.name -> String! @include @upper
      friends: User.friends -> [User!]! @skip
        id: User.id -> ID!
    ");
    assert!(!plan.is_cacheable());

    let me = &plan.root()[0];
    let include = &me.children[1].directives[0];
    assert_eq!(
        include.arguments.get("if"),
        Some(&ArgumentValue::Variable(Name::new("withName")))
    );
}

#[test]
fn operation_and_fragment_definition_directives() {
    let plan = plan(
        indoc! {r"
            query @audit {
              me { ...Names @skip(if: false) }
            }

            fragment Names on User @audit { name }
        "},
        None,
    )
    .unwrap();

    insta::assert_snapshot!(outline(&plan), @r"
    me: Query.me -> User
      name: User.name -> String! @skip @audit
    ");
    let operation = plan.directives().iter().map(|directive| directive.name.as_str()).collect::<Vec<_>>();
    assert_eq!(operation, vec!["audit"]);
    assert!(!plan.is_cacheable());
}

#[test]
fn restrictions_intersect() {
    let plan = plan(r#"{ search(term: "ada") { ... on User { name } } }"#, None).unwrap();
    let search = &plan.root()[0];

    let mut unrestricted = search.clone();
    unrestricted.restrict(["Post"]);
    assert!(unrestricted.applies_to("Post"));
    assert!(!unrestricted.applies_to("User"));

    let mut name = search.children[0].clone();
    assert!(name.applies_to("User"));
    name.restrict(["User", "Post"]);
    assert_eq!(name.restrict.as_ref().unwrap().types().collect::<Vec<_>>(), vec!["User"]);
    name.restrict(["Post"]);
    assert!(name.restrict.as_ref().unwrap().is_empty());
    assert!(!name.applies_to("User"));
    assert!(!name.applies_to("Post"));
}

#[test]
fn repeated_selections_are_merged() {
    let plan = plan("{ me { id } me { name } other: me { id } }", None).unwrap();

    insta::assert_snapshot!(outline(&plan), @r"
    me: Query.me -> User
      id: User.id -> ID!
      name: User.name -> String!
    other: Query.me -> User
      id: User.id -> ID!
    ");
}

#[test]
fn arguments_are_bound() {
    let plan = plan(
        r#"query ($name: String, $first: Int) { users(filter: { name: $name }) { friends(first: $first) { id } } search(term: "ada") { __typename } }"#,
        None,
    )
    .unwrap();

    let users = &plan.root()[0];
    let friends = &users.children[0];
    let search = &plan.root()[1];
    assert!(matches!(users.arguments["filter"], ArgumentValue::Template(_)));
    assert_eq!(friends.arguments["first"], ArgumentValue::Variable(Name::new("first")));
    assert_eq!(
        search.arguments["term"],
        ArgumentValue::Literal(ConstValue::String("ada".into()))
    );

    let mut variables = IndexMap::new();
    variables.insert(Name::new("name"), ConstValue::String("ada".into()));
    let filter = users.resolve_arguments(&variables).swap_remove("filter").unwrap();
    assert_eq!(filter.to_string(), r#"{name: "ada"}"#);
    assert!(friends.resolve_arguments(&variables).is_empty());
}

#[test]
fn operation_selection() {
    let query = "query A { me { id } } query B { me { name } }";

    assert_eq!(plan(query, None).unwrap_err(), PlanError::OperationNameRequired);
    assert_eq!(
        plan(query, Some("C")).unwrap_err(),
        PlanError::UnknownOperation("C".into())
    );
    assert_eq!(plan(query, Some("B")).unwrap().operation_name(), Some("B"));
    assert_eq!(
        plan("{ me(id: 1, id: 2) { id } }", None).unwrap_err(),
        PlanError::InvalidDocument
    );
}

#[test]
fn plans_have_unique_ids_and_stable_keys() {
    let query = "{ me { id } }";
    let first = plan(query, None).unwrap();
    let second = plan(query, None).unwrap();
    assert_ne!(first.id(), second.id());

    let schema = schema();
    let key = PlanCacheKey::new(schema.id(), None, query);
    assert_eq!(key, PlanCacheKey::new(schema.id(), None, query));
    assert_ne!(key, PlanCacheKey::new(schema.id(), Some("A"), query));
    assert_ne!(key, PlanCacheKey::new(schema.id(), None, "{ me { name } }"));
    assert!(key.to_string().ends_with(&blake3::hash(query.as_bytes()).to_hex().to_string()));
}
