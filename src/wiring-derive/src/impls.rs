use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{quote, ToTokens};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::token::Comma;
use syn::visit_mut::{self, VisitMut};
use syn::{
    AngleBracketedGenericArguments, Attribute, Error as SynError, Expr, FnArg, GenericArgument,
    Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, Meta, Pat, PathArguments, Result as SynResult,
    ReturnType, Signature, Type, TypePath,
};

use crate::attrs::AttributeData;

#[derive(Debug)]
struct ConstructorData {
    self_type: TypePath,
    identifier: Ident,
    arguments: Vec<ArgumentData>,
    return_type: ReturnTypeData,
}

#[derive(Debug)]
struct ArgumentData {
    span: Span,
    name: String,
    ty: Type,
    extraction: ExtractionData,
    kind: KindData,
    default: Option<Expr>,
}

/// How the resolved instance is turned into the argument type.
#[derive(Debug)]
enum ExtractionData {
    Interface(Type),
    Object(Type),
    Value,
}

#[derive(Debug)]
enum KindData {
    Object(TokenStream2),
    Scalar,
}

#[derive(Debug, Default)]
struct ArgumentAttributes {
    default: Option<Expr>,
    abstraction: Option<LitStr>,
    scalar: Option<Span>,
}

#[derive(Debug)]
enum ReturnTypeData {
    Infallible,
    Result { error_type: Type },
}

const RETURN_TYPE_MESSAGE: &str = "a constructor's return type should be `Self` or `Result<Self, E>`";

struct AttributeRemovalVisitor;

impl AttributeRemovalVisitor {
    fn is_custom_attribute(attr: &Attribute) -> bool {
        let path = attr.path();
        path.is_ident("inject")
            || path.is_ident("default")
            || path.is_ident("abstraction")
            || path.is_ident("scalar")
    }
}

impl VisitMut for AttributeRemovalVisitor {
    fn visit_attributes_mut(&mut self, attrs: &mut Vec<Attribute>) {
        attrs.retain(|attr| !Self::is_custom_attribute(attr));
        attrs
            .iter_mut()
            .for_each(|attr| visit_mut::visit_attribute_mut(self, attr));
    }
}

pub fn expand_implementation(
    impls: TokenStream,
    attr_data: AttributeData,
) -> SynResult<TokenStream2> {
    let mut impls = match syn::parse::<ItemImpl>(impls) {
        Ok(impls) => impls,
        Err(err) => {
            return Err(SynError::new(
                err.span(),
                "`#[component]` should be annotated on the `impl` block",
            ))
        }
    };

    let self_type = get_self_type(&impls)?;
    let signature = get_constructor_signature(&impls.items, impls.span())?;
    let ctor_data = parse_constructor(self_type, signature)?;

    let expanded = expand_constructible_implementation(ctor_data, attr_data)?;

    let mut visitor = AttributeRemovalVisitor;
    visitor.visit_item_impl_mut(&mut impls);

    Ok(quote! {
        #impls
        #expanded
    })
}

fn get_self_type(impls: &ItemImpl) -> SynResult<TypePath> {
    if let Type::Path(ty) = impls.self_ty.as_ref() {
        Ok(ty.clone())
    } else {
        Err(SynError::new(impls.self_ty.span(), "invalid self type"))
    }
}

fn get_constructor_signature(items: &[ImplItem], impl_span: Span) -> SynResult<Signature> {
    let ctors: Vec<_> = items
        .iter()
        .filter_map(filter_and_map_item_fn)
        .filter(is_annotated_with_inject)
        .collect();

    let signature = match ctors.as_slice() {
        [ctor] => ctor.sig.clone(),
        [] => {
            return Err(SynError::new(
                impl_span,
                "no associated function is annotated with `#[inject]`",
            ))
        }
        _ => {
            return Err(SynError::new(
                impl_span,
                "only one associated function can be annotated with `#[inject]`",
            ))
        }
    };

    if let Some(FnArg::Receiver(rec)) = signature.inputs.first() {
        return Err(SynError::new(
            rec.span(),
            "method is not allowed to be annotated with `#[inject]`",
        ));
    }

    Ok(signature)
}

fn filter_and_map_item_fn(item: &ImplItem) -> Option<&ImplItemFn> {
    if let ImplItem::Fn(impl_fn) = item {
        Some(impl_fn)
    } else {
        None
    }
}

fn is_annotated_with_inject(item_fn: &&ImplItemFn) -> bool {
    item_fn.attrs.iter().any(|attr| {
        let content = attr.meta.to_token_stream().to_string();
        &content == "inject"
    })
}

fn parse_constructor(self_type: TypePath, signature: Signature) -> SynResult<ConstructorData> {
    let identifier = signature.ident;
    let arguments = parse_constructor_arguments(signature.inputs)?;
    let return_type = parse_constructor_return_type(signature.output, &self_type)?;

    Ok(ConstructorData {
        self_type,
        identifier,
        arguments,
        return_type,
    })
}

fn parse_constructor_arguments(inputs: Punctuated<FnArg, Comma>) -> SynResult<Vec<ArgumentData>> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(i, arg)| match arg {
            FnArg::Typed(arg) => parse_argument(i, arg),
            FnArg::Receiver(rec) => Err(SynError::new(
                rec.span(),
                "method is not allowed to be annotated with `#[inject]`",
            )),
        })
        .collect()
}

fn parse_argument(position: usize, arg: syn::PatType) -> SynResult<ArgumentData> {
    let span = arg.span();
    let name = match arg.pat.as_ref() {
        Pat::Ident(pat) => pat.ident.to_string().trim_start_matches('_').to_string(),
        _ => format!("arg{position}"),
    };
    let attrs = parse_argument_attributes(arg.attrs)?;
    let ty = *arg.ty;
    let extraction = parse_extraction(&ty);

    let kind = if let Some(scalar) = attrs.scalar {
        if attrs.abstraction.is_some() {
            return Err(SynError::new(
                scalar,
                "`#[scalar]` and `#[abstraction(...)]` can't be used together",
            ));
        }
        KindData::Scalar
    } else if let Some(abstraction) = attrs.abstraction {
        KindData::Object(abstraction.into_token_stream())
    } else {
        match &extraction {
            ExtractionData::Interface(inner) => KindData::Object(quote! {
                <#inner as ::wiring::descriptor::Interface>::NAME
            }),
            ExtractionData::Object(inner) => {
                let abstraction = type_name(inner, span)?;
                KindData::Object(abstraction.into_token_stream())
            }
            ExtractionData::Value => KindData::Scalar,
        }
    };

    Ok(ArgumentData {
        span,
        name,
        ty,
        extraction,
        kind,
        default: attrs.default,
    })
}

fn parse_argument_attributes(attrs: Vec<Attribute>) -> SynResult<ArgumentAttributes> {
    let mut res = ArgumentAttributes::default();

    for attr in attrs {
        match attr.meta {
            Meta::List(list) if list.path.is_ident("default") => {
                if res.default.is_some() {
                    return Err(SynError::new(
                        list.path.span(),
                        "duplicated `#[default(...)]`",
                    ));
                }
                res.default = Some(syn::parse2::<Expr>(list.tokens)?);
            }
            Meta::List(list) if list.path.is_ident("abstraction") => {
                if res.abstraction.is_some() {
                    return Err(SynError::new(
                        list.path.span(),
                        "duplicated `#[abstraction(...)]`",
                    ));
                }
                res.abstraction = Some(syn::parse2::<LitStr>(list.tokens).map_err(|err| {
                    SynError::new(err.span(), "expects `#[abstraction(\"...\")]`")
                })?);
            }
            Meta::Path(path) if path.is_ident("scalar") => res.scalar = Some(path.span()),
            Meta::Path(path) if path.is_ident("default") || path.is_ident("abstraction") => {
                return Err(SynError::new(
                    path.span(),
                    "expects `#[default(...)]` to receive an expression and `#[abstraction(...)]` a string literal",
                ));
            }
            Meta::List(list) if list.path.is_ident("scalar") => {
                return Err(SynError::new(list.span(), "expects `#[scalar]` without arguments"));
            }
            _ => {}
        }
    }

    Ok(res)
}

/// Classifies `Arc<dyn Trait>` and `Arc<T>` arguments. Any other type is
/// extracted by cloning.
fn parse_extraction(ty: &Type) -> ExtractionData {
    let Type::Path(path) = ty else {
        return ExtractionData::Value;
    };
    let Some(last) = path.path.segments.last() else {
        return ExtractionData::Value;
    };
    if last.ident != "Arc" {
        return ExtractionData::Value;
    }
    let PathArguments::AngleBracketed(AngleBracketedGenericArguments { args, .. }) = &last.arguments
    else {
        return ExtractionData::Value;
    };
    match args.first() {
        Some(GenericArgument::Type(inner @ Type::TraitObject(_))) => {
            ExtractionData::Interface(inner.clone())
        }
        Some(GenericArgument::Type(inner @ Type::Path(_))) if args.len() == 1 => {
            ExtractionData::Object(inner.clone())
        }
        _ => ExtractionData::Value,
    }
}

fn type_name(ty: &Type, span: Span) -> SynResult<LitStr> {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .map(|segment| LitStr::new(&segment.ident.to_string(), span))
            .ok_or_else(|| SynError::new(span, "invalid argument type")),
        _ => Err(SynError::new(span, "invalid argument type")),
    }
}

fn parse_constructor_return_type(
    output: ReturnType,
    self_type: &TypePath,
) -> SynResult<ReturnTypeData> {
    let ReturnType::Type(_, return_type) = output else {
        return Err(SynError::new(output.span(), RETURN_TYPE_MESSAGE));
    };
    let Type::Path(return_type) = *return_type else {
        return Err(SynError::new(return_type.span(), RETURN_TYPE_MESSAGE));
    };

    let segments: Vec<_> = return_type.path.segments.iter().collect();

    if &return_type == self_type {
        return Ok(ReturnTypeData::Infallible);
    }
    match segments.as_slice() {
        [only] if only.ident == "Self" => Ok(ReturnTypeData::Infallible),
        [only] if only.ident == "Result" => parse_result_return_type(&only.arguments, self_type),
        [krate, module, last]
            if krate.ident == "std" && module.ident == "result" && last.ident == "Result" =>
        {
            parse_result_return_type(&last.arguments, self_type)
        }
        _ => Err(SynError::new(return_type.span(), RETURN_TYPE_MESSAGE)),
    }
}

fn parse_result_return_type(
    type_args: &PathArguments,
    self_type: &TypePath,
) -> SynResult<ReturnTypeData> {
    let PathArguments::AngleBracketed(AngleBracketedGenericArguments {
        args: generic_args, ..
    }) = type_args
    else {
        return Err(SynError::new(type_args.span(), RETURN_TYPE_MESSAGE));
    };

    let mut generic_args = generic_args.iter();
    let (
        Some(GenericArgument::Type(Type::Path(first_type))),
        Some(GenericArgument::Type(error_type)),
        None,
    ) = (generic_args.next(), generic_args.next(), generic_args.next())
    else {
        return Err(SynError::new(type_args.span(), RETURN_TYPE_MESSAGE));
    };

    let is_self = first_type == self_type
        || first_type
            .path
            .segments
            .first()
            .is_some_and(|s| s.ident == "Self");
    if is_self {
        Ok(ReturnTypeData::Result {
            error_type: error_type.clone(),
        })
    } else {
        Err(SynError::new(type_args.span(), RETURN_TYPE_MESSAGE))
    }
}

fn expand_constructible_implementation(
    ctor_data: ConstructorData,
    attr_data: AttributeData,
) -> SynResult<TokenStream2> {
    let self_type = &ctor_data.self_type;
    let constructor = &ctor_data.identifier;

    let name = match attr_data.name {
        Some(name) => name,
        None => type_name(&Type::Path(self_type.clone()), self_type.span())?,
    };

    let associated_type_error =
        if let ReturnTypeData::Result { error_type } = &ctor_data.return_type {
            quote! { type Error = #error_type; }
        } else {
            quote! { type Error = ::std::convert::Infallible; }
        };

    let parameters = ctor_data
        .arguments
        .iter()
        .map(|arg| {
            let name = &arg.name;
            let parameter = match &arg.kind {
                KindData::Object(abstraction) => {
                    quote! { ::wiring::descriptor::Parameter::object(#name, #abstraction) }
                }
                KindData::Scalar => quote! { ::wiring::descriptor::Parameter::scalar(#name) },
            };
            match &arg.default {
                Some(default) => {
                    let ty = &arg.ty;
                    quote! { #parameter.with_default(|| -> #ty { #default }), }
                }
                None => quote! { #parameter, },
            }
        })
        .collect::<TokenStream2>();

    let get_arg_statements = ctor_data
        .arguments
        .iter()
        .enumerate()
        .map(|(i, arg)| {
            let dep = Ident::new(&format!("dep{i}"), arg.span);
            let ty = &arg.ty;
            match &arg.extraction {
                ExtractionData::Interface(inner) => {
                    quote! { let #dep: #ty = args.interface::<#inner>(#i)?; }
                }
                ExtractionData::Object(inner) => {
                    quote! { let #dep: #ty = args.object::<#inner>(#i)?; }
                }
                ExtractionData::Value => quote! { let #dep: #ty = args.value::<#ty>(#i)?; },
            }
        })
        .collect::<TokenStream2>();

    let dep_args = ctor_data
        .arguments
        .iter()
        .enumerate()
        .map(|(i, arg)| {
            let dep = Ident::new(&format!("dep{i}"), arg.span);
            quote! { #dep, }
        })
        .collect::<TokenStream2>();

    let wire_deps = if let ReturnTypeData::Infallible = &ctor_data.return_type {
        quote! { Ok(Ok(#self_type::#constructor(#dep_args))) }
    } else {
        quote! { Ok(#self_type::#constructor(#dep_args)) }
    };

    Ok(quote! {
        impl ::wiring::descriptor::Constructible for #self_type {
            const NAME: &'static str = #name;

            #associated_type_error

            fn parameters() -> ::std::vec::Vec<::wiring::descriptor::Parameter> {
                ::std::vec![#parameters]
            }

            fn construct(args: &::wiring::descriptor::Arguments) -> ::std::result::Result<
                ::std::result::Result<Self, Self::Error>,
                ::wiring::container::error::InjectorError
            > {
                #get_arg_statements
                #wire_deps
            }
        }
    })
}
