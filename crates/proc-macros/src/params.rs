// Copyright (c) 2024 Mike Tsao

use crate::main_crate_name;
use convert_case::{Case, Casing};
use core::str::FromStr;
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields};

pub(crate) const PARAM_ATTRIBUTE_NAME: &str = "param";

#[derive(Debug, EnumString, Display, Eq, PartialEq, EnumIter)]
#[strum(serialize_all = "snake_case")]
enum ParamAttributes {
    /// List the field in HasParams, but don't generate accessors.
    Custom,
}

struct ParamField {
    field: syn::Ident,
    name: String,
    generate_accessors: bool,
}

pub(crate) fn impl_derive_params(input: TokenStream) -> TokenStream {
    TokenStream::from({
        let input = parse_macro_input!(input as DeriveInput);
        let generics = &input.generics;
        let struct_name = &input.ident;
        let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
        let crate_name = main_crate_name();

        let param_fields = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(fields) => fields
                    .named
                    .iter()
                    .filter_map(|f| {
                        let attrs = parse_attrs(&f.attrs)?;
                        f.ident.as_ref().map(|ident| ParamField {
                            field: ident.clone(),
                            name: ident.to_string().to_case(Case::Kebab),
                            generate_accessors: !attrs.contains(&ParamAttributes::Custom),
                        })
                    })
                    .collect::<Vec<_>>(),
                _ => panic!("#[derive(Params)] requires a struct with named fields"),
            },
            _ => panic!("#[derive(Params)] can be used only on structs"),
        };

        let listed_fields: Vec<_> = param_fields.iter().map(|p| p.field.clone()).collect();
        let listed_names: Vec<_> = param_fields.iter().map(|p| p.name.clone()).collect();

        let accessor_fields: Vec<_> = param_fields
            .iter()
            .filter(|p| p.generate_accessors)
            .collect();
        let fields: Vec<_> = accessor_fields.iter().map(|p| p.field.clone()).collect();
        let ref_getters: Vec<_> = accessor_fields
            .iter()
            .map(|p| format_ident!("{}_param", p.field))
            .collect();
        let setters: Vec<_> = accessor_fields
            .iter()
            .map(|p| format_ident!("set_{}", p.field))
            .collect();
        let ref_docs: Vec<_> = accessor_fields
            .iter()
            .map(|p| format!("The `{}` parameter, for use as a connection destination.", p.name))
            .collect();
        let getter_docs: Vec<_> = accessor_fields
            .iter()
            .map(|p| format!("The current value of the `{}` parameter.", p.name))
            .collect();
        let setter_docs: Vec<_> = accessor_fields
            .iter()
            .map(|p| {
                format!(
                    "Moves the `{}` parameter toward `value` with time constant `time`. A zero time sets it immediately.",
                    p.name
                )
            })
            .collect();

        quote! {
            #[automatically_derived]
            impl #impl_generics #crate_name::traits::HasParams for #struct_name #ty_generics #where_clause {
                fn params(&self) -> Vec<(&'static str, #crate_name::engine::ParamRef)> {
                    vec![ #( (#listed_names, self.#listed_fields) ),* ]
                }
            }

            #[automatically_derived]
            impl #impl_generics #struct_name #ty_generics #where_clause {
                #(
                    #[doc = #ref_docs]
                    pub fn #ref_getters(&self) -> #crate_name::engine::ParamRef {
                        self.#fields
                    }

                    #[doc = #getter_docs]
                    pub fn #fields(&self, engine: &dyn #crate_name::engine::Engine) -> f64 {
                        engine.param_value(self.#fields)
                    }

                    #[doc = #setter_docs]
                    pub fn #setters(
                        &self,
                        engine: &mut dyn #crate_name::engine::Engine,
                        value: f64,
                        time: #crate_name::types::Seconds,
                    ) {
                        #crate_name::automation::timed_approach(engine, self.#fields, value, time)
                    }
                )*
            }
        }
    })
}

// Returns None if the field isn't a param at all.
fn parse_attrs(attrs: &[Attribute]) -> Option<Vec<ParamAttributes>> {
    let mut found = false;
    let mut parsed = Vec::default();
    attrs
        .iter()
        .filter(|attr| attr.path.is_ident(PARAM_ATTRIBUTE_NAME))
        .for_each(|attr| {
            found = true;
            if let Ok(syn::Meta::List(meta_list)) = attr.parse_meta() {
                for item in meta_list.nested.iter() {
                    if let syn::NestedMeta::Meta(syn::Meta::Path(path)) = item {
                        if let Some(ident) = path.get_ident() {
                            let s = ident.to_string();
                            if let Ok(a) = ParamAttributes::from_str(&s) {
                                parsed.push(a);
                            } else {
                                let valid = ParamAttributes::iter()
                                    .map(|a| a.to_string())
                                    .collect::<Vec<String>>()
                                    .join(", ");
                                panic!("Unrecognized param attribute: \"{s}\". Valid values are {valid}");
                            }
                        }
                    }
                }
            }
        });
    if found {
        Some(parsed)
    } else {
        None
    }
}
