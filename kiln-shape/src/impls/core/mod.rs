mod cell;
mod fn_ptr;
mod option;
mod scalar;
