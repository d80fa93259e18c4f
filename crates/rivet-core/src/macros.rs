/// Builds a [`Tuple`](crate::value::Tuple) from `name => value` pairs.
///
/// ```
/// let row = rivet_core::tuple! { "name" => "Jane", "age" => 42 };
/// assert_eq!(row.len(), 2);
/// ```
#[macro_export]
macro_rules! tuple {
    () => {
        $crate::value::Tuple::new()
    };
    (
        $( $name:expr => $value:expr ),+ $(,)?
    ) => {
        $crate::value::Tuple::new() $( .with($name, $value) )+
    };
}
