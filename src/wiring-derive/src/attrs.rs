use proc_macro::TokenStream;
use syn::spanned::Spanned;
use syn::{Error as SynError, Expr, ExprLit, Lit, LitStr, MetaNameValue, Result as SynResult};

#[derive(Debug, Default)]
pub struct AttributeData {
    pub name: Option<LitStr>,
}

pub fn parse_attributes(attr: TokenStream) -> SynResult<AttributeData> {
    if attr.is_empty() {
        return Ok(AttributeData::default());
    }

    let meta = syn::parse::<MetaNameValue>(attr)
        .map_err(|err| SynError::new(err.span(), "expects `#[component(name = \"...\")]`"))?;
    if !meta.path.is_ident("name") {
        return Err(SynError::new(
            meta.path.span(),
            "expects `#[component(name = \"...\")]`",
        ));
    }

    match meta.value {
        Expr::Lit(ExprLit {
            lit: Lit::Str(name),
            ..
        }) => Ok(AttributeData { name: Some(name) }),
        value => Err(SynError::new(
            value.span(),
            "expects the component name to be a string literal",
        )),
    }
}
