mod chrono;
mod indexmap;
mod rust_decimal;
