// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use syn::punctuated::Punctuated;
use syn::{spanned::Spanned, *};

pub struct AttrData {
	pub name: Ident,
}

impl TryFrom<Punctuated<Expr, Token!(,)>> for AttrData {
	type Error = syn::Error;
	fn try_from(value: Punctuated<Expr, Token!(,)>) -> Result<Self> {
		let mut maybe_name: Option<Ident> = None;
		let mut errors = vec![];
		const EXPECTED_KW: &str = "Expected `name = <identifier>`.";

		for expr in value.iter() {
			match expr {
				Expr::Assign(assign) => {
					let (assign_left, assign_right) = (assign.left.as_ref(), assign.right.as_ref());

					let Expr::Path(ExprPath { path, .. }) = assign_left else {
						errors.push(Error::new(assign_left.span(), EXPECTED_KW));
						continue;
					};
					if path.is_ident("name") {
						// Branch for syntax: #[symbol_table(name = <ident>)]
						match assign_right {
							Expr::Path(ExprPath { path, .. }) if path.get_ident().is_some() => {
								if maybe_name.is_none() {
									maybe_name = path.get_ident().cloned();
								} else {
									errors.push(Error::new(assign.span(), "name is already defined"));
								}
							}
							right => errors.push(Error::new(right.span(), "Expected identifier.")),
						}
					} else {
						errors.push(Error::new(assign_left.span(), EXPECTED_KW));
					}
				}

				// Branch for everything else.
				expr => errors.push(Error::new(expr.span(), EXPECTED_KW)),
			}
		}
		if maybe_name.is_none() && errors.is_empty() {
			errors.push(Error::new(
				value.span(),
				"No table name detected. Suggest using: `name = <identifier>`.",
			));
		}

		// if there are any errors this will immediately combine and return early.
		match (maybe_name, crate::diagnostic::combine(errors)) {
			(_, Some(err)) => Err(err),
			(Some(name), None) => Ok(Self { name }),
			(None, None) => Err(Error::new(value.span(), EXPECTED_KW)),
		}
	}
}
