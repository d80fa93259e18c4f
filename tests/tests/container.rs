use tests::*;

use pretty_assertions::assert_eq;
use rivet::{
    driver::{Capability, Operation, Response},
    err, tuple, CommandDef, CommandRequest, Container, Dispatch, Gateway, GraphSpec, Memory,
    Name, RelationDef, Result, Value,
};
use rivet_core::async_trait;

use std::sync::Arc;

#[test]
fn relation_lookup() {
    let (_, container) = container();

    let users = assert_ok!(container.relation("users"));
    assert_eq!(users.name(), "users");

    let err = assert_not_found!(container.relation("orders"));
    assert_eq!(err.to_string(), "relation `orders` not found");
}

#[test]
fn relations_carry_their_commands() {
    let (_, container) = container();

    let users = assert_ok!(container.relation("users"));
    let names: Vec<_> = users.commands().names().map(|n| n.to_string()).collect();
    assert_eq!(names, ["create", "update", "delete"]);

    // Commands handed to relations are the wired ones.
    let create = assert_ok!(users.command("create"));
    assert!(create
        .cache()
        .is_some_and(|cache| cache.ptr_eq(&container.caches().commands)));
}

#[test]
fn relation_without_commands_gets_an_empty_set() {
    let gateway: Arc<dyn Gateway> = Arc::new(Memory::new());
    let mut builder = users_and_tasks(gateway);
    builder.relation(RelationDef::new("tags"));
    let container = assert_ok!(builder.build());

    let tags = assert_ok!(container.relation("tags"));
    assert!(tags.commands().is_empty());
    assert_not_found!(tags.command("create"));
}

#[test]
fn mapper_decoration() {
    let (_, container) = container();

    let users = assert_ok!(container.relation("users"));
    assert!(users.has_mappers());

    let tasks = assert_ok!(container.relation("tasks"));
    assert!(!tasks.has_mappers());
}

#[tokio::test]
async fn relation_with_refines_before_mapping() {
    let (_, container) = container();
    let create = assert_ok!(container.command_at("users", "create"));
    assert_ok!(create.call(tuple! { "name" => "Jane", "admin" => true }).await);
    assert_ok!(create.call(tuple! { "name" => "Joe", "admin" => false }).await);

    let admins =
        assert_ok!(container.relation_with("users", |users| users.filter("admin", true)));

    // Restricted on `admin`, though the mapper hides it.
    assert_eq!(
        assert_ok!(admins.to_vec().await),
        vec![Value::from(tuple! { "id" => 1, "name" => "Jane" })]
    );
}

#[test]
fn construction_is_repeatable_with_distinct_caches() {
    let gateway: Arc<dyn Gateway> = Arc::new(Memory::new());
    let builder = users_and_tasks(gateway);

    let a = assert_ok!(builder.build());
    let b = assert_ok!(builder.build());

    let names = |c: &Container| {
        (
            c.relations().names().cloned().collect::<Vec<_>>(),
            c.mappers().names().cloned().collect::<Vec<_>>(),
            c.commands()
                .iter()
                .flat_map(|(relation, set)| {
                    set.values()
                        .map(move |command| (relation.clone(), command.path()))
                })
                .collect::<Vec<_>>(),
        )
    };
    assert_eq!(names(&a), names(&b));

    assert!(!a.caches().mappers.ptr_eq(&b.caches().mappers));
    assert!(!a.caches().commands.ptr_eq(&b.caches().commands));
}

#[test]
fn command_lookup_is_decorated_once() {
    let (_, container) = container();

    let a = assert_ok!(container.command("users.create")).into_command();
    let b = assert_ok!(container.command("users.create")).into_command();
    let (a, b) = (assert_ok!(a), assert_ok!(b));

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.mappers().map(|set| set.relation().to_string()), Some("users".into()));

    // `tasks` has no mappers, so its command is handed out as registered.
    let create = assert_ok!(container.command_at("tasks", "create"));
    assert!(create.mappers().is_none());
    assert!(Arc::ptr_eq(
        &create,
        assert_ok!(assert_ok!(container.commands().get("tasks")).get("create"))
    ));
}

#[tokio::test]
async fn looked_up_command_maps_its_result() {
    let (_, container) = container();

    let create = assert_ok!(container.command("users.create"));
    let jane = assert_ok!(create.call(tuple! { "name" => "Jane", "admin" => true }).await);

    assert_eq!(jane, Value::from(tuple! { "id" => 1, "name" => "Jane" }));
}

#[test]
fn dispatch_on_request_shape() {
    let (_, container) = container();

    assert!(matches!(
        assert_ok!(container.command(CommandRequest::Builder)),
        Dispatch::Builder(_)
    ));
    assert!(matches!(
        assert_ok!(container.dispatch(Value::Null)),
        Dispatch::Builder(_)
    ));
    assert!(matches!(
        assert_ok!(container.command(GraphSpec::new("users", "create"))),
        Dispatch::Graph(_)
    ));
    assert!(matches!(
        assert_ok!(container.dispatch(Value::from("tasks.create"))),
        Dispatch::Command(_)
    ));
}

#[test]
fn invalid_command_requests() {
    let (_, container) = container();

    assert_invalid_argument!(container.dispatch(Value::from(3)));
    assert_invalid_argument!(container.dispatch(Value::from(true)));
    assert_invalid_argument!(container.dispatch(Value::from(tuple! { "users" => "create" })));

    assert_not_found!(container.command("unknown_name"));
    assert_not_found!(container.command("users.archive"));
    assert_not_found!(container.command("orders.create"));
}

#[test]
fn builder_validation() {
    let gateway: Arc<dyn Gateway> = Arc::new(Memory::new());

    let mut builder = users_and_tasks(gateway.clone());
    builder.relation(RelationDef::new("orders").gateway("warehouse"));
    let err = assert_not_found!(builder.build());
    assert_eq!(err.to_string(), "gateway `warehouse` not found");

    let mut builder = users_and_tasks(gateway.clone());
    builder.command(CommandDef::create("orders"));
    assert_not_found!(builder.build());

    let mut builder = users_and_tasks(gateway.clone());
    builder.relation(RelationDef::new("users"));
    assert_invalid_argument!(builder.build());

    let mut builder = users_and_tasks(gateway);
    builder.command(CommandDef::create("tasks"));
    assert_invalid_argument!(builder.build());
}

#[tokio::test]
async fn dataset_prefix_applies_to_relations_and_commands() {
    let gateway: Arc<dyn Gateway> = Arc::new(Memory::new());
    let mut builder = users_and_tasks(gateway.clone());
    builder.dataset_prefix("app_");
    let container = assert_ok!(builder.build());

    let users = assert_ok!(container.relation("users"));
    assert_eq!(users.dataset_name(), "app_users");

    let create = assert_ok!(container.command_at("users", "create"));
    assert_ok!(create.call(tuple! { "name" => "Jane" }).await);

    assert!(gateway.contains_dataset("app_users"));
    assert!(!gateway.contains_dataset("users"));
    assert_eq!(assert_ok!(users.count().await), 1);
}

#[tokio::test]
async fn connect_by_url() {
    init_tracing();

    let mut builder = Container::builder();
    assert_ok!(builder.connect("default", "memory://").await);
    builder.relation(RelationDef::new("users"));
    let container = assert_ok!(builder.build());

    let gateway = assert_ok!(container.gateways().get("default"));
    assert!(gateway.is_connected());

    let mut builder = Container::builder();
    assert_invalid_argument!(builder.connect("default", "sqlite::memory:").await);
}

#[tokio::test]
async fn disconnect_releases_gateways() {
    let (_, container) = container();

    let gateways = assert_ok!(container.disconnect().await);
    assert_eq!(gateways.len(), 1);
    assert!(gateways.values().all(|gateway| !gateway.is_connected()));

    // Lookups still work, gateway access does not.
    let users = assert_ok!(container.relation("users"));
    let err = assert_err!(users.count().await);
    assert!(err.is_disconnected());
}

/// A gateway whose connection refuses to close.
#[derive(Debug)]
struct BusyGateway;

#[async_trait]
impl Gateway for BusyGateway {
    fn capability(&self) -> &'static Capability {
        &Capability::MEMORY
    }

    fn contains_dataset(&self, _name: &str) -> bool {
        false
    }

    async fn exec(&self, dataset: &Name, _op: Operation) -> Result<Response> {
        Err(err!("`{dataset}` is unreachable"))
    }

    async fn disconnect(&self) -> Result<()> {
        Err(err!("socket busy"))
    }

    fn is_connected(&self) -> bool {
        true
    }
}

#[tokio::test]
async fn failed_disconnect_still_releases_other_gateways() {
    init_tracing();

    let memory: Arc<dyn Gateway> = Arc::new(Memory::new());
    let mut builder = Container::builder();
    builder
        .gateway("busy", BusyGateway)
        .shared_gateway("default", memory.clone());
    let container = assert_ok!(builder.build());

    let err = assert_err!(container.disconnect().await);
    assert_eq!(err.to_string(), "disconnecting gateway `busy`: socket busy");

    // The memory gateway comes after the failing one and is still released.
    assert!(!memory.is_connected());
}
