use tests::*;

use pretty_assertions::assert_eq;
use rivet::{driver::Operation, tuple, Container, Gateway, GraphSpec, Memory, Tuple, Value};

use std::sync::Arc;

fn users_with_tasks() -> GraphSpec {
    GraphSpec::new("users", "create").child(GraphSpec::new("tasks", "create"))
}

#[tokio::test]
async fn parent_runs_before_children() {
    let logging = LoggingGateway::new(Arc::new(Memory::new()));
    let ops_log = logging.ops_log_handle();
    let container = assert_ok!(users_and_tasks(Arc::new(logging)).build());

    let graph = assert_ok!(assert_ok!(container.command(users_with_tasks())).into_graph());
    assert_eq!(graph.name(), "users");

    let result = assert_ok!(
        graph
            .call(tuple! {
                "name" => "Jane",
                "tasks" => vec![tuple! { "title" => "One" }, tuple! { "title" => "Two" }],
            })
            .await
    );

    let ops = ops_log.lock().unwrap();
    let writes: Vec<_> = ops
        .iter()
        .map(|op| match &op.operation {
            Operation::Insert(insert) => (op.dataset.to_string(), insert.tuples.clone()),
            other => panic!("unexpected operation {other:?}"),
        })
        .collect();

    // One insert per task, each after the user and carrying its id.
    assert_eq!(
        writes,
        [
            ("users".to_string(), vec![tuple! { "name" => "Jane" }]),
            (
                "tasks".to_string(),
                vec![tuple! { "title" => "One", "user_id" => 1 }]
            ),
            (
                "tasks".to_string(),
                vec![tuple! { "title" => "Two", "user_id" => 1 }]
            ),
        ]
    );

    // The aggregate mirrors the input, mapped by the `users` mapper set.
    assert_eq!(
        result,
        Value::from(tuple! {
            "id" => 1,
            "name" => "Jane",
            "tasks" => vec![
                tuple! { "id" => 1, "title" => "One", "user_id" => 1 },
                tuple! { "id" => 2, "title" => "Two", "user_id" => 1 },
            ],
        })
    );
}

#[tokio::test]
async fn list_input_runs_each_parent_in_turn() {
    let (_, container) = container();
    let graph = assert_ok!(container.graph(&users_with_tasks()));

    let result = assert_ok!(
        graph
            .call(vec![
                Value::from(tuple! {
                    "name" => "Jane",
                    "tasks" => vec![tuple! { "title" => "Jane's" }],
                }),
                Value::from(tuple! {
                    "name" => "Joe",
                    "tasks" => vec![tuple! { "title" => "Joe's" }],
                }),
            ])
            .await
    );

    let users = assert_ok!(result.into_list());
    assert_eq!(users.len(), 2);

    let tasks = assert_ok!(assert_ok!(container.relation("tasks")).to_vec().await);
    assert_eq!(
        tasks,
        vec![
            Value::from(tuple! { "id" => 1, "title" => "Jane's", "user_id" => 1 }),
            Value::from(tuple! { "id" => 2, "title" => "Joe's", "user_id" => 2 }),
        ]
    );
}

#[tokio::test]
async fn untyped_spec_dispatches_to_a_graph() {
    let (_, container) = container();

    // [users, [create, [[tasks, [create]]]]]
    let spec = Value::List(vec![
        "users".into(),
        Value::List(vec![
            "create".into(),
            Value::List(vec![Value::List(vec![
                "tasks".into(),
                Value::List(vec!["create".into()]),
            ])]),
        ]),
    ]);

    let graph = assert_ok!(container.dispatch(spec));
    let result = assert_ok!(
        graph
            .call(tuple! { "name" => "Jane", "tasks" => vec![tuple! { "title" => "One" }] })
            .await
    );

    let tasks = assert_ok!(assert_ok!(result.into_record()).remove("tasks").ok_or("no tasks"));
    assert_eq!(assert_ok!(tasks.into_list()).len(), 1);
}

#[tokio::test]
async fn fluent_builder() {
    let (_, container) = container();

    let graph = assert_ok!(container
        .command_builder()
        .create("users")
        .child(GraphSpec::new("tasks", "create"))
        .build());
    assert_eq!(graph.nodes().len(), 1);

    assert_invalid_argument!(container.command_builder().build());
    assert_not_found!(container.command_builder().create("orders").build());
}

#[tokio::test]
async fn unknown_pair_fails_before_any_write() {
    let (gateway, container) = container();

    let spec = GraphSpec::new("users", "create").child(GraphSpec::new("tasks", "archive"));
    let err = assert_not_found!(container.command(spec));
    assert_eq!(err.to_string(), "command `tasks.archive` not found");

    assert!(!gateway.contains_dataset("users"));
}

#[tokio::test]
async fn child_failure_fails_the_graph_without_rollback() {
    let (_, container) = container();
    let graph = assert_ok!(container.graph(&users_with_tasks()));

    // The second task misses its required title.
    let err = assert_err!(
        graph
            .call(tuple! {
                "name" => "Jane",
                "tasks" => vec![tuple! { "title" => "One" }, tuple! { "done" => true }],
            })
            .await
    );
    assert!(err.is_validation());

    // Writes made before the failure stay.
    let users = assert_ok!(container.relation("users"));
    let tasks = assert_ok!(container.relation("tasks"));
    assert_eq!(assert_ok!(users.count().await), 1);
    assert_eq!(assert_ok!(tasks.count().await), 1);
}

#[tokio::test]
async fn transaction_undoes_a_failed_graph() {
    let (gateway, container) = container();
    let graph = assert_ok!(container.graph(&users_with_tasks()));

    let tx = assert_ok!(container.transaction("default").await);
    assert_err!(
        graph
            .call(tuple! { "name" => "Jane", "tasks" => vec![tuple! { "done" => true }] })
            .await
    );
    assert_ok!(tx.rollback().await);

    assert!(!gateway.contains_dataset("users"));
    assert_eq!(assert_ok!(assert_ok!(container.relation("users")).count().await), 0);
}

#[tokio::test]
async fn dropped_transaction_rolls_back() {
    let (gateway, container) = container();
    let create = assert_ok!(container.command_at("users", "create"));

    {
        let _tx = assert_ok!(container.transaction("default").await);
        assert_ok!(create.call(tuple! { "name" => "Jane" }).await);
    }

    // The rollback runs on a spawned task.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    assert!(!gateway.contains_dataset("users"));
}

#[tokio::test]
async fn update_graph_propagates_existing_key() {
    let gateway: Arc<dyn Gateway> = Arc::new(Memory::new());
    let container = assert_ok!(users_and_tasks(gateway).build());

    let create = assert_ok!(container.command_at("users", "create"));
    assert_ok!(create.call(tuple! { "name" => "Jane" }).await);

    // `users.update` is restricted to id 1.
    let spec = GraphSpec::new("users", "update").child(GraphSpec::new("tasks", "create"));
    let graph = assert_ok!(container.graph(&spec));
    let result = assert_ok!(
        graph
            .call(tuple! { "name" => "Janet", "tasks" => vec![tuple! { "title" => "One" }] })
            .await
    );

    assert_eq!(
        result,
        Value::from(tuple! {
            "id" => 1,
            "name" => "Janet",
            "tasks" => vec![tuple! { "id" => 1, "title" => "One", "user_id" => 1 }],
        })
    );
}

/// Creates Jane (id 1) and Joe (id 2), each owning one task.
async fn jane_and_joe(container: &Container) {
    let graph = assert_ok!(container.graph(&users_with_tasks()));
    assert_ok!(
        graph
            .call(vec![
                Value::from(tuple! {
                    "name" => "Jane",
                    "tasks" => vec![tuple! { "title" => "Jane's" }],
                }),
                Value::from(tuple! {
                    "name" => "Joe",
                    "tasks" => vec![tuple! { "title" => "Joe's" }],
                }),
            ])
            .await
    );
}

#[tokio::test]
async fn update_child_only_touches_the_parents_tuples() {
    let (_, container) = container();
    jane_and_joe(&container).await;

    let spec = GraphSpec::new("users", "update").child(GraphSpec::new("tasks", "update"));
    let graph = assert_ok!(container.graph(&spec));
    let result = assert_ok!(
        graph
            .call(tuple! { "name" => "Janet", "tasks" => tuple! { "done" => true } })
            .await
    );

    assert_eq!(
        result,
        Value::from(tuple! {
            "id" => 1,
            "name" => "Janet",
            "tasks" => vec![
                tuple! { "id" => 1, "title" => "Jane's", "user_id" => 1, "done" => true },
            ],
        })
    );

    // The association restricts which tasks change; it is not written into them.
    let tasks = assert_ok!(assert_ok!(container.relation("tasks")).to_vec().await);
    assert_eq!(
        tasks,
        vec![
            Value::from(tuple! { "id" => 1, "title" => "Jane's", "user_id" => 1, "done" => true }),
            Value::from(tuple! { "id" => 2, "title" => "Joe's", "user_id" => 2 }),
        ]
    );
}

#[tokio::test]
async fn delete_child_removes_the_parents_tuples() {
    let (_, container) = container();
    jane_and_joe(&container).await;

    let spec = GraphSpec::new("users", "delete").child(GraphSpec::new("tasks", "delete"));
    let graph = assert_ok!(container.graph(&spec));
    let result = assert_ok!(graph.call(tuple! { "id" => 1, "tasks" => Tuple::new() }).await);

    assert_eq!(
        result,
        Value::from(tuple! {
            "id" => 1,
            "name" => "Jane",
            "tasks" => vec![tuple! { "id" => 1, "title" => "Jane's", "user_id" => 1 }],
        })
    );

    let tasks = assert_ok!(assert_ok!(container.relation("tasks")).to_vec().await);
    assert_eq!(
        tasks,
        vec![Value::from(tuple! { "id" => 2, "title" => "Joe's", "user_id" => 2 })]
    );
}

#[tokio::test]
async fn record_child_input_yields_one_child() {
    let (_, container) = container();
    let graph = assert_ok!(container.graph(&users_with_tasks()));

    let result = assert_ok!(
        graph
            .call(tuple! { "name" => "Jane", "tasks" => tuple! { "title" => "Only" } })
            .await
    );

    assert_eq!(
        result,
        Value::from(tuple! {
            "id" => 1,
            "name" => "Jane",
            "tasks" => tuple! { "id" => 1, "title" => "Only", "user_id" => 1 },
        })
    );
}

#[tokio::test]
async fn parent_storing_nothing_fails_before_children_run() {
    let (gateway, container) = container();

    // No user 1 exists, so `users.update` stores nothing.
    let spec = GraphSpec::new("users", "update").child(GraphSpec::new("tasks", "create"));
    let graph = assert_ok!(container.graph(&spec));
    let err = assert_err!(
        graph
            .call(tuple! { "name" => "Janet", "tasks" => vec![tuple! { "title" => "One" }] })
            .await
    );

    assert!(err.is_validation());
    assert_eq!(
        err.to_string(),
        "validation failed: `users.update` stored no tuple for its children"
    );
    assert!(!gateway.contains_dataset("tasks"));
}
