use alloc::string::String;

impl_shaped_for_scalar! {
    String => String,
}
