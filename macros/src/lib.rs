//! Derive macros for the MVU runtime
//!
//! # Available Macros
//!
//! - `#[derive(Message)]` - Implements `mvu_core::message::Message` for action and effect enums
//!
//! # Example
//!
//! ```ignore
//! use mvu_macros::Message;
//!
//! #[derive(Message, Clone, Debug)]
//! enum TodoAction {
//!     AddItem { text: String },
//!     #[tag = "end-edit"]
//!     StopEditing,
//! }
//!
//! assert_eq!(TodoAction::AddItem { text: "milk".into() }.tag(), "add-item");
//! assert_eq!(TodoAction::StopEditing.tag(), "end-edit");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Expr, ExprLit, Fields, Lit, parse_macro_input};

/// Derive macro for action and effect enums
///
/// Generates an implementation of `mvu_core::message::Message` whose `tag()`
/// returns the kebab-case name of the current variant (`AddItem` becomes
/// `"add-item"`). Tags are what the runtime logs and counts, so they stay
/// stable even when payloads change.
///
/// # Attributes
///
/// - `#[tag = "..."]` - Override the generated tag of a variant
///
/// # Panics
///
/// This macro will produce a compile error (not a runtime panic) if:
/// - Applied to a non-enum type
/// - A `#[tag]` attribute is not of the form `#[tag = "literal"]`
#[proc_macro_derive(Message, attributes(tag))]
pub fn derive_message(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(&input, "#[derive(Message)] can only be used on enums")
            .to_compile_error()
            .into();
    };

    let mut arms = Vec::with_capacity(data_enum.variants.len());

    for variant in &data_enum.variants {
        let variant_name = &variant.ident;
        let tag = match tag_override(&variant.attrs) {
            Ok(Some(tag)) => tag,
            Ok(None) => kebab_case(&variant_name.to_string()),
            Err(error) => return error.to_compile_error().into(),
        };

        let pattern = match &variant.fields {
            Fields::Named(_) => quote! { Self::#variant_name { .. } },
            Fields::Unnamed(_) => quote! { Self::#variant_name(..) },
            Fields::Unit => quote! { Self::#variant_name },
        };

        arms.push(quote! { #pattern => #tag, });
    }

    // An empty enum has no values, so `match *self {}` is exhaustive.
    let body = if arms.is_empty() {
        quote! { match *self {} }
    } else {
        quote! {
            match self {
                #(#arms)*
            }
        }
    };

    let expanded = quote! {
        impl #impl_generics ::mvu_core::message::Message for #name #ty_generics #where_clause {
            fn tag(&self) -> &'static str {
                #body
            }
        }
    };

    TokenStream::from(expanded)
}

/// Read a `#[tag = "..."]` override, if present
fn tag_override(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let Some(attr) = attrs.iter().find(|attr| attr.path().is_ident("tag")) else {
        return Ok(None);
    };

    let name_value = attr.meta.require_name_value()?;
    match &name_value.value {
        Expr::Lit(ExprLit {
            lit: Lit::Str(lit), ..
        }) => Ok(Some(lit.value())),
        other => Err(syn::Error::new_spanned(
            other,
            "expected a string literal: #[tag = \"...\"]",
        )),
    }
}

/// `ToggleComplete` -> `toggle-complete`
fn kebab_case(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 4);
    for (i, ch) in ident.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
