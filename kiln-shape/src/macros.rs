/// Implement [`Shaped`](crate::Shaped) for a plain struct as a record.
///
/// Every listed field becomes a readable and writable member, in the order
/// given. A field may declare its JSON name with `=> "Name"` and extra names
/// accepted when reading with `| "alias"`. The struct must implement
/// [`Default`]; deserialization starts from the default value.
///
/// ```rust
/// use kiln_shape::{Shaped, record};
///
/// #[derive(Default)]
/// struct Point {
///     x: f64,
///     y: f64,
///     label: Option<String>,
/// }
///
/// record! {
///     Point {
///         x: f64 => "X" | "x",
///         y: f64 => "Y" | "y",
///         label: Option<String>,
///     }
/// }
///
/// assert!(Point::SHAPE.is_type::<Point>());
/// ```
#[macro_export]
macro_rules! record {
    (
        $ty:ident {
            $(
                $field:ident : $fty:ty $(=> $rename:literal $(| $alias:literal)*)?
            ),* $(,)?
        }
    ) => {
        impl $crate::Shaped for $ty {
            const SHAPE: &'static $crate::Shape = &const {
                $crate::Shape::new::<$ty>($crate::Def::Record(
                    $crate::RecordDef::new(&const {
                        [$(
                            $crate::Member::new(::core::stringify!($field), $crate::shape_of::<$fty>)
                                .getter(|value| {
                                    ::core::result::Result::Ok(
                                        &$crate::downcast::<$ty>(value)?.$field
                                            as &dyn ::core::any::Any,
                                    )
                                })
                                .setter(|target, value| {
                                    $crate::downcast_mut::<$ty>(target)?.$field =
                                        $crate::unbox::<$fty>(value)?;
                                    ::core::result::Result::Ok(())
                                })
                                $(.rename($rename).aliases(&[$($alias),*]))?
                        ),*]
                    })
                    .construct(|| {
                        $crate::__private::Box::new(<$ty as ::core::default::Default>::default())
                    }),
                ))
            };
        }
    };
}
