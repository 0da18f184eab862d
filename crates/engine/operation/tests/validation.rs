use std::sync::Arc;

use engine_error::{Location, MessageCollection, Severity};
use engine_invocation::{Member, ResolverError};
use engine_operation::{document_rules, validate, ConstructionOptions, Document, ValidationOptions, ValidationOutcome};
use engine_schema::{Argument, Field, ObjectType, Schema};
use pretty_assertions::assert_eq;
use rstest::rstest;
use tokio_util::sync::CancellationToken;

struct Query;
struct User;

fn schema() -> Schema {
    let query = ObjectType::new("Query").field(
        Field::new(
            "user",
            "User",
            Member::method1(["id"], |_: &Query, _id: String| Ok::<_, ResolverError>(())),
        )
        .argument(Argument::new("id", "ID!")),
    );
    let user = ObjectType::new("User")
        .field(Field::new("id", "ID!", Member::property(|_: &User| ())))
        .field(Field::new("name", "String", Member::property(|_: &User| ())))
        .field(Field::new("friends", "[User!]!", Member::property(|_: &User| ())));
    Schema::build(query).object(user).finish().unwrap()
}

fn document(query: &str) -> Document {
    Document::parse(
        query,
        Arc::new(MessageCollection::new()),
        &ConstructionOptions::default(),
    )
    .unwrap()
}

fn run(document: &Document, options: &ValidationOptions) -> (ValidationOutcome, MessageCollection) {
    let messages = MessageCollection::new();
    let outcome = validate(
        document,
        &schema(),
        &document_rules(options),
        &messages,
        &CancellationToken::new(),
    );
    (outcome, messages)
}

fn summary(messages: MessageCollection) -> Vec<(Option<Location>, Severity, String)> {
    messages
        .into_vec()
        .into_iter()
        .map(|message| {
            (message.origin().location, message.severity(), message.text.into_owned())
        })
        .collect()
}

#[test]
fn valid_operation_passes_every_rule() {
    let document = document(
        r#"
        query Friends($id: ID!) {
          user(id: $id) { ...UserFields friends { ...UserFields } }
        }

        fragment UserFields on User { id name @include(if: true) }
        "#,
    );
    let (outcome, messages) = run(&document, &ValidationOptions::default());
    assert_eq!(outcome, ValidationOutcome::Completed);
    assert!(messages.is_empty(), "{:#?}", messages.to_vec());
}

#[test]
fn errors_carry_their_origin() {
    let document = document("{\n  user(id: 1) { nickname }\n}");
    let (outcome, messages) = run(&document, &ValidationOptions::default());
    assert_eq!(outcome, ValidationOutcome::Completed);
    assert_eq!(
        summary(messages),
        vec![(
            Some(Location::new(2, 17)),
            Severity::Critical,
            r#"Unknown field "nickname" on type "User""#.to_string()
        )]
    );
}

#[rstest]
#[case::within_limit(Some(3), 0)]
#[case::too_deep(Some(2), 1)]
#[case::unlimited(None, 0)]
fn depth_limit_is_optional(#[case] max_query_depth: Option<usize>, #[case] expected_errors: usize) {
    let document = document(r#"{ user(id: "1") { friends { id } } }"#);
    let (_, messages) = run(&document, &ValidationOptions { max_query_depth });
    assert_eq!(messages.len(), expected_errors);
}

#[test]
fn validation_is_idempotent() {
    let document = document(
        r"
        query A($unused: Int) { user { nope } ...Missing }
        fragment Loop on User { ...Loop }
        ",
    );
    let (_, first) = run(&document, &ValidationOptions::default());
    let (_, second) = run(&document, &ValidationOptions::default());
    assert!(!first.is_empty());
    assert_eq!(summary(first), summary(second));
}

#[test]
fn cancelled_validation_stops_early() {
    let document = document("{ user { nope } }");
    let messages = MessageCollection::new();
    let cancellation = CancellationToken::new();
    cancellation.cancel();

    let outcome = validate(
        &document,
        &schema(),
        &document_rules(&ValidationOptions::default()),
        &messages,
        &cancellation,
    );
    assert_eq!(outcome, ValidationOutcome::Cancelled);
    assert!(messages.is_empty());
}
