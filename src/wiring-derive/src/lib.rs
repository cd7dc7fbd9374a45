mod attrs;
mod impls;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use syn::Result as SynResult;

/// Implements `wiring::descriptor::Constructible` for the self type of an
/// `impl` block from its `#[inject]` constructor.
///
/// The component is registered under the last segment of its type name
/// unless `#[component(name = "...")]` is given. Constructor arguments are
/// described as follows:
///
/// - `Arc<dyn Trait>` depends on the interface declared with `interface!`;
/// - `Arc<T>` depends on the abstraction named after `T`;
/// - any other type is a scalar resolved through the `$name` binding.
///
/// `#[abstraction("Name")]` overrides the abstraction of an argument,
/// `#[scalar]` forces scalar resolution and `#[default(expr)]` supplies a
/// fallback value.
#[proc_macro_attribute]
pub fn component(attr: TokenStream, item: TokenStream) -> TokenStream {
    match component_impl(attr, item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

fn component_impl(attr: TokenStream, item: TokenStream) -> SynResult<TokenStream2> {
    let attr_data = attrs::parse_attributes(attr)?;
    let expanded = impls::expand_implementation(item, attr_data)?;
    Ok(expanded)
}
