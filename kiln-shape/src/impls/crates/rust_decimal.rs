use rust_decimal::Decimal;

impl_shaped_for_scalar! {
    Decimal => Decimal,
}
