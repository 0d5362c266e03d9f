use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{parse_macro_input, Expr, ExprLit, ItemFn, Lit, MetaNameValue, Token};

/// Runs an `async fn` test on a fresh settle runtime.
///
/// Accepts an optional `flavor = "multi_thread"` argument; the default is a
/// current-thread runtime.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item, MacroKind::Test)
}

/// Runs an `async fn main` on a fresh settle runtime.
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item, MacroKind::Main)
}

enum MacroKind {
    Test,
    Main,
}

enum Flavor {
    CurrentThread,
    MultiThread,
}

fn parse_flavor(attr: TokenStream) -> syn::Result<Flavor> {
    if attr.is_empty() {
        return Ok(Flavor::CurrentThread);
    }

    let args = Punctuated::<MetaNameValue, Token![,]>::parse_terminated
        .parse2(TokenStream2::from(attr))?;

    let mut flavor = Flavor::CurrentThread;
    for arg in args {
        if !arg.path.is_ident("flavor") {
            return Err(syn::Error::new_spanned(
                arg.path,
                "settle_async attribute macros only accept `flavor`",
            ));
        }
        let Expr::Lit(ExprLit {
            lit: Lit::Str(value),
            ..
        }) = &arg.value
        else {
            return Err(syn::Error::new_spanned(
                arg.value,
                "`flavor` must be a string literal",
            ));
        };
        flavor = match value.value().as_str() {
            "current_thread" => Flavor::CurrentThread,
            "multi_thread" => Flavor::MultiThread,
            other => {
                return Err(syn::Error::new_spanned(
                    value,
                    format!("unknown runtime flavor `{other}`"),
                ))
            }
        };
    }
    Ok(flavor)
}

fn expand(attr: TokenStream, item: TokenStream, kind: MacroKind) -> TokenStream {
    let flavor = match parse_flavor(attr) {
        Ok(flavor) => flavor,
        Err(err) => return err.to_compile_error().into(),
    };

    let input = parse_macro_input!(item as ItemFn);

    if input.sig.asyncness.is_none() {
        return syn::Error::new_spanned(
            input.sig.fn_token,
            "settle_async attribute macros require `async fn`",
        )
        .to_compile_error()
        .into();
    }

    let mut sig = input.sig;
    sig.asyncness = None;

    let attrs = input.attrs;
    let vis = input.vis;
    let block = input.block;

    let runner = match flavor {
        Flavor::CurrentThread => quote!(settle_async::runtime::block_on),
        Flavor::MultiThread => quote!(settle_async::runtime::block_on_multi_thread),
    };

    let test_attr = match kind {
        MacroKind::Test => quote!(#[test]),
        MacroKind::Main => quote!(),
    };

    quote! {
        #(#attrs)*
        #test_attr
        #vis #sig {
            #runner(async move #block)
        }
    }
    .into()
}
