//! Attribute macro behind `#[kiln_testhelpers::test]`.

use unsynn::*;

keyword! {
    KFn = "fn";
}

unsynn! {
    struct BeforeFn {
        items: Any<Cons<Except<KFn>, TokenTree>>,
    }

    struct Signature {
        items: Any<Cons<Except<BraceGroup>, TokenTree>>,
    }

    struct TestFn {
        before_fn: BeforeFn, _fn: KFn, name: Ident,
        signature: Signature, body: BraceGroup
    }
}

impl quote::ToTokens for BeforeFn {
    fn to_tokens(&self, tokens: &mut unsynn::TokenStream) {
        self.items.to_tokens(tokens)
    }
}

impl quote::ToTokens for Signature {
    fn to_tokens(&self, tokens: &mut unsynn::TokenStream) {
        self.items.to_tokens(tokens)
    }
}

/// Marks a test function and installs the kiln test subscriber before its body runs.
///
/// ```ignore
/// #[kiln_testhelpers::test]
/// fn parses_numbers() {
///     // tracing output from kiln is visible here
/// }
/// ```
#[proc_macro_attribute]
pub fn test(
    _attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let item = TokenStream::from(item);
    let mut iter = item.to_token_iter();
    let test_fn = match iter.parse::<TestFn>() {
        Ok(test_fn) => test_fn,
        Err(err) => {
            let message = format!("#[kiln_testhelpers::test] expects a function: {err:?}");
            return quote::quote! { ::core::compile_error!(#message); }.into();
        }
    };

    let TestFn {
        before_fn,
        _fn,
        name,
        signature,
        body,
    } = test_fn;
    let body = body.0.stream();

    quote::quote! {
        #[::core::prelude::rust_2024::test]
        #before_fn fn #name #signature {
            ::kiln_testhelpers::setup();

            #body
        }
    }
    .into()
}
