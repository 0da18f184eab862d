use std::sync::Arc;

use async_graphql_value::ConstValue;
use engine_error::MessageCollection;
use engine_invocation::{Member, ResolverError};
use engine_schema::{
    Argument, DirectiveLocation, DirectiveType, EnumType, Field, InputObjectType, InterfaceType, ObjectType, Schema,
    UnionType,
};
use tokio_util::sync::CancellationToken;

use super::{run_rules, DocumentRule, DocumentValidationContext, Rule};
use crate::{ConstructionOptions, Document};

struct Query;
struct Mutation;
struct Dog;
struct Cat;
struct Human;
struct ComplicatedArgs;

fn unit<T>() -> Member<T>
where
    T: Send + Sync + 'static,
{
    Member::property(|_: &T| ())
}

pub(crate) fn test_schema() -> Schema {
    let query = ObjectType::new("Query")
        .field(Field::new("dog", "Dog", unit::<Query>()))
        .field(Field::new("cat", "Cat", unit::<Query>()))
        .field(Field::new("pet", "Pet", unit::<Query>()))
        .field(Field::new("catOrDog", "CatOrDog", unit::<Query>()))
        .field(
            Field::new(
                "human",
                "Human",
                Member::method1(["id"], |_: &Query, _id: Option<String>| Ok::<_, ResolverError>(())),
            )
            .argument(Argument::new("id", "ID")),
        )
        .field(Field::new("complicatedArgs", "ComplicatedArgs", unit::<Query>()));

    let mutation = ObjectType::new("Mutation").field(
        Field::new(
            "renameDog",
            "Dog",
            Member::method1(["name"], |_: &Mutation, _name: String| Ok::<_, ResolverError>(())),
        )
        .argument(Argument::new("name", "String!")),
    );

    let dog = ObjectType::new("Dog")
        .implements("Pet")
        .field(Field::new("name", "String!", unit::<Dog>()))
        .field(Field::new("nickname", "String", unit::<Dog>()))
        .field(Field::new("barkVolume", "Int", unit::<Dog>()))
        .field(
            Field::new(
                "isHousetrained",
                "Boolean!",
                Member::method1(["atOtherHomes"], |_: &Dog, _at: Option<bool>| {
                    Ok::<_, ResolverError>(true)
                }),
            )
            .argument(Argument::new("atOtherHomes", "Boolean").default_value(ConstValue::Boolean(true))),
        )
        .field(
            Field::new(
                "doesKnowCommand",
                "Boolean!",
                Member::method1(["dogCommand"], |_: &Dog, _command: String| Ok::<_, ResolverError>(true)),
            )
            .argument(Argument::new("dogCommand", "DogCommand!")),
        )
        .field(Field::new("owner", "Human", unit::<Dog>()));

    let cat = ObjectType::new("Cat")
        .implements("Pet")
        .field(Field::new("name", "String!", unit::<Cat>()))
        .field(Field::new("meowVolume", "Int", unit::<Cat>()));

    let human = ObjectType::new("Human")
        .field(Field::new("name", "String", unit::<Human>()))
        .field(Field::new("iq", "Int", unit::<Human>()))
        .field(Field::new("pets", "[Pet!]!", unit::<Human>()))
        .field(Field::new("relatives", "[Human!]", unit::<Human>()));

    let complicated_args = ObjectType::new("ComplicatedArgs")
        .field(
            Field::new(
                "intArgField",
                "String",
                Member::method1(["intArg"], |_: &ComplicatedArgs, _arg: Option<i64>| {
                    Ok::<_, ResolverError>(())
                }),
            )
            .argument(Argument::new("intArg", "Int")),
        )
        .field(
            Field::new(
                "multipleReqs",
                "String",
                Member::method2(["req1", "req2"], |_: &ComplicatedArgs, _req1: i64, _req2: i64| {
                    Ok::<_, ResolverError>(())
                }),
            )
            .argument(Argument::new("req1", "Int!"))
            .argument(Argument::new("req2", "Int!")),
        )
        .field(
            Field::new(
                "multipleOpts",
                "String",
                Member::method2(["opt1", "opt2"], |_: &ComplicatedArgs, _opt1: i64, _opt2: i64| {
                    Ok::<_, ResolverError>(())
                }),
            )
            .argument(Argument::new("opt1", "Int!").default_value(ConstValue::from(0)))
            .argument(Argument::new("opt2", "Int!").default_value(ConstValue::from(0))),
        )
        .field(
            Field::new(
                "complexArgField",
                "String",
                Member::method1(["complexArg"], |_: &ComplicatedArgs, _arg: Option<ConstValue>| {
                    Ok::<_, ResolverError>(())
                }),
            )
            .argument(Argument::new("complexArg", "ComplexInput")),
        );

    Schema::build(query)
        .mutation(mutation)
        .object(dog)
        .object(cat)
        .object(human)
        .object(complicated_args)
        .interface(InterfaceType::new("Pet").field("name", "String!"))
        .union(UnionType::new("CatOrDog").member("Cat").member("Dog"))
        .enumeration(EnumType::new("DogCommand").value("SIT").value("HEEL").value("DOWN"))
        .input_object(
            InputObjectType::new("ComplexInput")
                .field(Argument::new("requiredField", "Boolean!"))
                .field(Argument::new("intField", "Int")),
        )
        .directive(DirectiveType::new("onField").location(DirectiveLocation::Field))
        .directive(DirectiveType::new("onQuery").location(DirectiveLocation::Query))
        .directive(
            DirectiveType::new("tag")
                .location(DirectiveLocation::Field)
                .argument(Argument::new("name", "String!"))
                .repeatable(),
        )
        .finish()
        .unwrap()
}

/// Texts of the messages `rule` reports on the document made of `sources`.
pub(crate) fn rule_messages<R>(rule: R, sources: &[&str]) -> Vec<String>
where
    R: for<'a> Rule<DocumentValidationContext<'a>> + 'static,
{
    let parsed = sources
        .iter()
        .map(|source| async_graphql_parser::parse_query(source).unwrap())
        .collect::<Vec<_>>();
    let parsed = parsed.iter().collect::<Vec<_>>();
    let document = Document::construct(
        &parsed,
        Arc::new(MessageCollection::new()),
        &ConstructionOptions::default(),
    )
    .unwrap();

    let schema = test_schema();
    let messages = MessageCollection::new();
    let cancellation = CancellationToken::new();
    let rules: Vec<DocumentRule> = vec![Box::new(rule)];
    run_rules(
        DocumentValidationContext::root(&document, &schema, &messages, &cancellation),
        &rules,
    );
    messages.into_vec().into_iter().map(|message| message.text.into_owned()).collect()
}

pub(crate) fn expect_passes_rule_<R>(rule: R, sources: &[&str])
where
    R: for<'a> Rule<DocumentValidationContext<'a>> + 'static,
{
    let errors = rule_messages(rule, sources);
    assert!(errors.is_empty(), "Expected rule to pass, but errors found: {errors:#?}");
}

pub(crate) fn expect_fails_rule_<R>(rule: R, sources: &[&str])
where
    R: for<'a> Rule<DocumentValidationContext<'a>> + 'static,
{
    let errors = rule_messages(rule, sources);
    assert!(!errors.is_empty(), "Expected rule to fail, but no errors were found");
}

macro_rules! expect_passes_rule {
    ($factory:expr, [$($query:expr),+ $(,)?] $(,)?) => {
        $crate::validation::test_harness::expect_passes_rule_($factory(), &[$($query),+])
    };
    ($factory:expr, $query:expr $(,)?) => {
        $crate::validation::test_harness::expect_passes_rule_($factory(), &[$query])
    };
}

macro_rules! expect_fails_rule {
    ($factory:expr, [$($query:expr),+ $(,)?] $(,)?) => {
        $crate::validation::test_harness::expect_fails_rule_($factory(), &[$($query),+])
    };
    ($factory:expr, $query:expr $(,)?) => {
        $crate::validation::test_harness::expect_fails_rule_($factory(), &[$query])
    };
}

macro_rules! rule_messages {
    ($factory:expr, $query:expr $(,)?) => {
        $crate::validation::test_harness::rule_messages($factory(), &[$query])
    };
}
