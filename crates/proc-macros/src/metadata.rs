// Copyright (c) 2024 Mike Tsao

use crate::main_crate_name;
use convert_case::{Case, Casing};
use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

pub(crate) fn impl_metadata(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = input.ident;
    let kebab_case_name = name.to_string().to_case(Case::Kebab);
    let generics = input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let crate_name = main_crate_name();
    TokenStream::from(quote! {
        #[automatically_derived]
        impl #impl_generics #crate_name::traits::HasMetadata for #name #ty_generics #where_clause {
            fn uid(&self) -> #crate_name::types::UnitUid {
                self.uid
            }

            fn name(&self) -> &'static str {
                Self::UNIT_NAME
            }

            fn key(&self) -> &'static str {
                Self::UNIT_KEY
            }
        }

        #[automatically_derived]
        impl #impl_generics #name #ty_generics #where_clause {
            /// A human-readable identifier for this unit type.
            pub const UNIT_NAME: &'static str = stringify!(#name);
            /// A unique, long-lived string that represents this unit type.
            pub const UNIT_KEY: &'static str = #kebab_case_name;
        }
    })
}
