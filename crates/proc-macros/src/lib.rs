// Copyright (c) 2024 Mike Tsao

//! This crate provides proc macros for
//! [patchbay](https://crates.io/crates/patchbay) development.
//!
//! PRO TIP: use `cargo expand --lib elements` to see what's being generated

#![deny(missing_docs)]

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::Ident;

mod metadata;
mod params;

/// The `Metadata` macro derives the boilerplate necessary for the `HasMetadata`
/// trait. Every signal unit needs a unique ID so that the connection resolver
/// and the timer dispatcher can tell instances apart. The struct must have a
/// field named `uid` of type `UnitUid`.
#[proc_macro_derive(Metadata)]
pub fn metadata_derive(input: TokenStream) -> TokenStream {
    metadata::impl_metadata(input)
}

/// The `Params` macro derives the `HasParams` trait from fields of type
/// `ParamRef` that are annotated with `#[param]`. For each such field `foo`,
/// it also generates `foo_param()`, `foo(engine)` and `set_foo(engine, value,
/// time)`. Annotate a field with `#[param(custom)]` to list it in `HasParams`
/// while writing the accessors by hand.
#[proc_macro_derive(Params, attributes(param))]
pub fn params_derive(input: TokenStream) -> TokenStream {
    params::impl_derive_params(input)
}

// See https://github.com/bkchr/proc-macro-crate/issues/14, ModProg's solution
fn main_crate_name() -> proc_macro2::TokenStream {
    const MAIN_CRATE_NAME: &str = "patchbay";
    let name = match (
        proc_macro_crate::crate_name(MAIN_CRATE_NAME),
        std::env::var("CARGO_CRATE_NAME").as_deref(),
    ) {
        (Ok(proc_macro_crate::FoundCrate::Itself), Ok(MAIN_CRATE_NAME)) => quote!(crate),
        (Ok(proc_macro_crate::FoundCrate::Name(name)), _) => {
            let ident = Ident::new(&name, proc_macro2::Span::call_site());
            quote!(::#ident)
        }
        _ => {
            let n = format_ident!("{}", MAIN_CRATE_NAME);
            quote!(::#n)
        }
    };
    name
}
