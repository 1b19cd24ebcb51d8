// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use quote::*;

use proc_macro::TokenStream as TokenStream1;
use proc_macro2::TokenStream as TokenStream2;
use syn::{parse::Parser, punctuated::Punctuated, spanned::Spanned, Expr, Token};

mod attr_data;
mod diagnostic;
use attr_data::*;

/// Turns an `extern` block into a struct of function pointers resolved from a `shlib::SharedLibrary`.
///
/// See the `shlib` crate for usage.
#[proc_macro_attribute]
pub fn symbol_table(args: TokenStream1, input: TokenStream1) -> TokenStream1 {
    let args = TokenStream2::from(args);
    let input = TokenStream2::from(input);
    match expand(args, input) {
        Ok(tokens) => TokenStream1::from(tokens),
        Err(e) => syn::Error::into_compile_error(e).into(),
    }
}

fn expand(args: TokenStream2, input: TokenStream2) -> syn::Result<TokenStream2> {
    let foreign_mod = syn::parse2::<syn::ItemForeignMod>(input)?;
    let punct = Parser::parse2(Punctuated::<Expr, Token!(,)>::parse_terminated, args)?;
    let AttrData { name } = AttrData::try_from(punct)?;
    diagnostic::check_foreign_mod(&foreign_mod)?;

    let abi = &foreign_mod.abi;
    let table_docs = &foreign_mod.attrs;

    let mut fields = Vec::new();
    let mut inits = Vec::new();
    let mut methods = Vec::new();
    for item in foreign_mod.items.iter() {
        let syn::ForeignItem::Fn(fn_item) = item else {
            continue;
        };
        let fn_name = &fn_item.sig.ident;
        let vis = &fn_item.vis;
        let output = &fn_item.sig.output;
        let (link_name, fn_attrs) = split_link_name(&fn_item.attrs)?;
        let link_name = link_name.unwrap_or_else(|| fn_name.to_string());

        let mut param_list = Vec::new();
        let mut param_ty_list = Vec::new();
        let mut ty_list = Vec::new();
        for (i, arg) in fn_item.sig.inputs.iter().enumerate() {
            let syn::FnArg::Typed(pat_type) = arg else {
                continue;
            };
            let ty = &pat_type.ty;
            let param_name = match pat_type.pat.as_ref() {
                syn::Pat::Ident(pat_id) => pat_id.ident.clone(),
                _ => format_ident!("p{i}"),
            };
            param_ty_list.push(quote!(#param_name : #ty));
            param_list.push(param_name);
            ty_list.push(ty);
        }

        let fn_ptr_ty = quote!(unsafe #abi fn (#(#ty_list),*) #output);
        fields.push(quote!(#fn_name: #fn_ptr_ty));
        inits.push(quote!(#fn_name: unsafe { lib.get::<#fn_ptr_ty>(#link_name)? }));
        // According to "The Rustonomicon" foreign functions are assumed unsafe,
        // so forwarding methods are implicitly prepended with `unsafe`
        methods.push(quote! {
            #(#fn_attrs)*
            #[allow(non_snake_case)]
            #[inline]
            #vis unsafe fn #fn_name (&self, #(#param_ty_list),*) #output {
                unsafe { (self.#fn_name)(#(#param_list),*) }
            }
        });
    }

    Ok(quote! {
        #(#table_docs)*
        #[derive(Clone, Copy)]
        #[allow(non_snake_case)]
        pub struct #name<'lib> {
            #(#fields,)*
            __lib: ::core::marker::PhantomData<&'lib ()>,
        }

        impl<'lib> #name<'lib> {
            /// Resolves every symbol of the table. The first missing symbol is returned as the error.
            pub fn load<L: ::shlib::Loader>(
                lib: &'lib ::shlib::SharedLibrary<L>,
            ) -> ::shlib::Result<Self> {
                Ok(Self {
                    #(#inits,)*
                    __lib: ::core::marker::PhantomData,
                })
            }

            #(#methods)*
        }
    })
}

// Pulls `#[link_name = "..."]` out of the attributes, leaving the rest to be forwarded.
fn split_link_name(attrs: &[syn::Attribute]) -> syn::Result<(Option<String>, Vec<&syn::Attribute>)> {
    let mut link_name = None;
    let mut rest = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("link_name") {
            rest.push(attr);
            continue;
        }
        let value = &attr.meta.require_name_value()?.value;
        match value {
            Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(val),
                ..
            }) if link_name.is_none() => link_name = Some(val.value()),
            Expr::Lit(_) if link_name.is_some() => {
                return Err(syn::Error::new(attr.span(), "link_name is already defined"))
            }
            other => return Err(syn::Error::new(other.span(), "Expected string.")),
        }
    }
    Ok((link_name, rest))
}
