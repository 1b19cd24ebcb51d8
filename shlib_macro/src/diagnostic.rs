// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use syn::spanned::Spanned;
use syn::{Error, ForeignItem, ItemForeignMod};

/// Folds every error into the last one so they are all reported at once.
pub(crate) fn combine(mut errors: Vec<Error>) -> Option<Error> {
    let mut main_err = errors.pop()?;
    for err in errors {
        main_err.combine(err);
    }
    Some(main_err)
}

// Names taken by the generated table itself: the loader method and the lifetime marker field.
pub(crate) const RESERVED: &[&str] = &["load", "__lib"];

// Rejects everything a symbol table cannot express.
pub(crate) fn check_foreign_mod(foreign_mod: &ItemForeignMod) -> syn::Result<()> {
    let mut errors = vec![];
    for mod_attr in foreign_mod.attrs.iter() {
        if !mod_attr.path().is_ident("doc") {
            errors.push(Error::new(
                mod_attr.span(),
                "only doc comments may be placed on a symbol table",
            ));
        }
    }
    for item in foreign_mod.items.iter() {
        let ForeignItem::Fn(fn_item) = item else {
            errors.push(Error::new(item.span(), "only functions may be placed in a symbol table"));
            continue;
        };
        let sig = &fn_item.sig;
        if RESERVED.iter().any(|reserved| sig.ident == reserved) {
            errors.push(Error::new(
                sig.ident.span(),
                format!(
                    "`{0}` is reserved; rename it and use `#[link_name = \"{0}\"]`",
                    sig.ident
                ),
            ));
        }
        if let Some(variadic) = &sig.variadic {
            errors.push(Error::new(variadic.span(), "variadic functions are unsupported"));
        }
        if !sig.generics.params.is_empty() {
            errors.push(Error::new(sig.generics.span(), "generic functions are unsupported"));
        }
        for arg in sig.inputs.iter() {
            if let syn::FnArg::Receiver(rec) = arg {
                errors.push(Error::new(rec.span(), "`self` arguments are unsupported"));
            }
        }
    }
    match combine(errors) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
