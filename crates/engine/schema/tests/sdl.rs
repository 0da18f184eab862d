use std::sync::Arc;

use async_graphql_value::ConstValue;
use engine_invocation::Member;
use engine_schema::{
    Argument, DirectiveLocation, DirectiveType, EnumType, Field, InputObjectType, InterfaceType, ObjectType, Schema,
    UnionType,
};

struct Query;

struct User {
    id: String,
    name: String,
}

struct Post {
    id: String,
    title: String,
}

fn schema() -> Schema {
    let query = ObjectType::new("Query")
        .field(Field::new(
            "me",
            "User",
            Member::method0(|_: &Query| {
                Ok(Arc::new(User {
                    id: "1".into(),
                    name: "ada".into(),
                }))
            }),
        ))
        .field(
            Field::new(
                "search",
                "[SearchResult!]!",
                Member::method1(["term"], |_: &Query, _term: String| Ok(Vec::<Arc<User>>::new())),
            )
            .argument(Argument::new("term", "String!")),
        );

    let user = ObjectType::new("User")
        .implements("Node")
        .field(Field::new("id", "ID!", Member::property(|user: &User| user.id.clone())))
        .field(Field::new("name", "String!", Member::property(|user: &User| user.name.clone())))
        .field(Field::new(
            "role",
            "Role!",
            Member::property(|_: &User| ConstValue::Enum(async_graphql_value::Name::new("USER"))),
        ));

    let post = ObjectType::new("Post")
        .implements("Node")
        .field(Field::new("id", "ID!", Member::property(|post: &Post| post.id.clone())))
        .field(
            Field::new("title", "String!", Member::property(|post: &Post| post.title.clone())).deprecated("use headline"),
        );

    Schema::build(query)
        .object(user)
        .object(post)
        .interface(InterfaceType::new("Node").field("id", "ID!"))
        .union(UnionType::new("SearchResult").member("User").member("Post"))
        .enumeration(EnumType::new("Role").value("ADMIN").value("USER"))
        .input_object(
            InputObjectType::new("Filter")
                .field(Argument::new("name", "String"))
                .field(Argument::new("limit", "Int").default_value(ConstValue::from(10))),
        )
        .directive(DirectiveType::new("upper").location(DirectiveLocation::Field))
        .finish()
        .unwrap()
}

#[test]
fn renders_sdl() {
    insta::assert_snapshot!(schema().sdl(), @r#"
    type Query {
      me: User
      search(term: String!): [SearchResult!]!
    }

    type User implements Node {
      id: ID!
      name: String!
      role: Role!
    }

    type Post implements Node {
      id: ID!
      title: String! @deprecated(reason: "use headline")
    }

    interface Node {
      id: ID!
    }

    union SearchResult = User | Post

    enum Role {
      ADMIN
      USER
    }

    input Filter {
      name: String
      limit: Int = 10
    }

    directive @upper on FIELD
    "#);
}

#[test]
fn abstract_types() {
    let schema = schema();
    assert_eq!(schema.possible_types("Node"), vec!["User", "Post"]);
    assert_eq!(schema.possible_types("SearchResult"), vec!["User", "Post"]);
    assert!(schema.types_overlap("Node", "SearchResult"));
    assert!(schema.types_overlap("User", "Node"));
    assert!(!schema.types_overlap("User", "Post"));
    assert!(!schema.is_possible_type("User", "Post"));
}

#[test]
fn schemas_have_distinct_ids() {
    assert_ne!(schema().id(), schema().id());
}
