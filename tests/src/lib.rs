
mod logging_gateway;
pub use logging_gateway::{GatewayOp, LoggingGateway};

use rivet::{
    container::Builder, Cardinality, CommandDef, Container, Gateway, MapperDef, Memory,
    RelationDef,
};

use std::sync::{Arc, Once};

/// Installs a fmt subscriber writing through the test harness. Filtered by
/// `RUST_LOG`; safe to call from every test.
pub fn init_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A builder with `users` and `tasks` relations on one memory gateway.
///
/// `users` has `create`, `update` (by id 1) and `delete` commands and an
/// `entity` mapper hiding `admin`. `tasks` has a `create` command requiring a
/// `title`, plus `update` and `delete` commands returning every task they
/// touched.
pub fn users_and_tasks(gateway: Arc<dyn Gateway>) -> Builder {
    init_tracing();

    let mut builder = Container::builder();
    builder
        .shared_gateway("default", gateway)
        .relation(RelationDef::new("users"))
        .relation(RelationDef::new("tasks"))
        .command(CommandDef::create("users"))
        .command(CommandDef::update("users").by("id", 1))
        .command(CommandDef::delete("users"))
        .command(CommandDef::create("tasks").requires(["title"]))
        .command(CommandDef::update("tasks").result(Cardinality::Many))
        .command(CommandDef::delete("tasks").result(Cardinality::Many))
        .mapper(MapperDef::new("users", "entity").reject(["admin"]));
    builder
}

/// [`users_and_tasks`] on a fresh memory gateway, already built.
pub fn container() -> (Arc<dyn Gateway>, Container) {
    let gateway: Arc<dyn Gateway> = Arc::new(Memory::new());
    let container = assert_ok!(users_and_tasks(gateway.clone()).build());
    (gateway, container)
}
