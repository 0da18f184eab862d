mod common;

use common::errors;
use engine::{context::FieldAuthorizationContext, Authorizer, Engine, Identity, Request};
use engine_invocation::{Constructor, Member};
use engine_schema::{Field, ObjectType, Schema};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

struct Query;

fn schema() -> Schema {
    Schema::build(
        ObjectType::new("Query")
            .constructor(Constructor::new0(|| Query))
            .field(Field::new("version", "String!", Member::property(|_: &Query| "1")))
            .field(Field::new("me", "String", Member::property(|_: &Query| "ada")).authenticated())
            .field(Field::new("audit", "String", Member::property(|_: &Query| "log")).roles(["admin", "auditor"])),
    )
    .finish()
    .unwrap()
}

#[tokio::test]
async fn anonymous_requests_cannot_reach_secured_fields() {
    let response = Engine::new(schema()).execute(Request::new("{ version me }")).await;

    assert_eq!(response.data(), Some(&json!({"version": "1"})));
    assert_eq!(
        errors(&response),
        vec![(
            "UNAUTHENTICATED".to_string(),
            r#"Field "Query.me" requires an authenticated request"#.to_string()
        )]
    );
}

#[rstest]
#[case::anonymous(Identity::anonymous(), json!({}), Some("UNAUTHENTICATED"))]
#[case::without_role(Identity::authenticated("ada"), json!({}), Some("UNAUTHORIZED"))]
#[case::other_role(Identity::authenticated("ada").with_roles(["editor"]), json!({}), Some("UNAUTHORIZED"))]
#[case::one_of_the_roles(Identity::authenticated("ada").with_roles(["auditor"]), json!({"audit": "log"}), None)]
#[tokio::test]
async fn roles(#[case] identity: Identity, #[case] data: serde_json::Value, #[case] code: Option<&str>) {
    let response = Engine::new(schema())
        .execute(Request::new("{ audit }").identity(identity))
        .await;

    assert_eq!(response.data(), Some(&data));
    let codes = errors(&response).into_iter().map(|(code, _)| code).collect::<Vec<_>>();
    assert_eq!(codes, code.into_iter().map(str::to_string).collect::<Vec<_>>());
}

#[tokio::test]
async fn authorized_request_sees_everything() {
    let identity = Identity::authenticated("ada").with_roles(["admin"]);

    let response = Engine::new(schema())
        .execute(Request::new("{ version me audit }").identity(identity))
        .await;

    assert!(response.is_valid(), "{:?}", response.messages());
    assert_eq!(response.data(), Some(&json!({"version": "1", "me": "ada", "audit": "log"})));
}

/// Only lets through requests made by "ada".
struct OnlyAda;

impl Authorizer for OnlyAda {
    fn authorize(&self, ctx: &FieldAuthorizationContext<'_>) -> bool {
        ctx.identity().name() == Some("ada")
    }
}

#[tokio::test]
async fn custom_authorizer() {
    let engine = Engine::builder(schema()).authorizer(OnlyAda).build();

    let response = engine
        .execute(Request::new("{ me }").identity(Identity::authenticated("ada")))
        .await;
    assert_eq!(response.data(), Some(&json!({"me": "ada"})));

    let response = engine
        .execute(Request::new("{ me }").identity(Identity::authenticated("grace")))
        .await;
    assert_eq!(response.data(), Some(&json!({})));
    assert_eq!(
        errors(&response),
        vec![(
            "UNAUTHORIZED".to_string(),
            r#"Not authorized to access "Query.me""#.to_string()
        )]
    );
}
