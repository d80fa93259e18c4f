use tests::*;

use rivet::{driver::operation, tuple, Gateway, Memory, Name};
use rivet_driver_memory::Storage;

#[test]
fn datasets_auto_vivify() {
    let storage = Storage::new();

    assert!(!storage.contains("orders"));

    let orders = storage.dataset("orders");
    assert!(orders.is_empty());

    assert!(storage.contains("orders"));
}

#[tokio::test]
async fn reads_never_fail_on_unwritten_datasets() {
    let memory = Memory::new();
    let orders = Name::from("orders");

    let response = assert_ok!(
        memory
            .exec(&orders, operation::Delete { filter: tuple! { "id" => 1 } }.into())
            .await
    );
    assert!(assert_ok!(response.into_tuples()).is_empty());

    assert!(memory.contains_dataset("orders"));
}

#[tokio::test]
async fn relations_read_unwritten_datasets_as_empty() {
    let (gateway, container) = container();

    assert!(!gateway.contains_dataset("tasks"));

    let tasks = assert_ok!(container.relation("tasks"));
    assert_eq!(assert_ok!(tasks.count().await), 0);
    assert_eq!(assert_ok!(tasks.first().await), None);

    assert!(gateway.contains_dataset("tasks"));
}
