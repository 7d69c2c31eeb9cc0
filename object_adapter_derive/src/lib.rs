use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, parse_macro_input, spanned::Spanned};

/// Generates `Mapped` and `MappedClass` for a struct with named fields.
///
/// - `#[mapped(class = "...")]` on the struct overrides the class name.
/// - `#[mapped(reference)]` marks an `Option<ObjectHandle>` reference slot.
/// - `#[mapped(name = "...")]` renames a slot.
/// - `#[mapped(skip)]` leaves a field out of the accessor table.
///
/// Every other field is a scalar slot whose type implements `FieldValue`.
#[proc_macro_derive(Mapped, attributes(mapped))]
pub fn derive_mapped(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_mapped(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct MappedFieldOptions {
    reference: bool,
    skip: bool,
    name: Option<String>,
}

struct MappedSlot {
    ident: Ident,
    name: String,
}

fn expand_mapped(input: DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let class_name = parse_class_name(&input.attrs)?.unwrap_or_else(|| ident.to_string());

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            input.span(),
            "#[derive(Mapped)] only supports structs",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new(
            input.span(),
            "#[derive(Mapped)] requires a struct with named fields",
        ));
    };

    let mut fields = Vec::new();
    let mut references = Vec::new();
    for field in &named.named {
        let options = parse_field_options(&field.attrs)?;
        if options.skip {
            continue;
        }

        let Some(field_ident) = field.ident.clone() else {
            continue;
        };
        let slot = MappedSlot {
            name: options.name.unwrap_or_else(|| field_ident.to_string()),
            ident: field_ident,
        };

        if options.reference {
            references.push(slot);
        } else {
            fields.push(slot);
        }
    }

    let field_names: Vec<&str> = fields.iter().map(|s| s.name.as_str()).collect();
    let field_idents: Vec<&Ident> = fields.iter().map(|s| &s.ident).collect();
    let reference_names: Vec<&str> = references.iter().map(|s| s.name.as_str()).collect();
    let reference_idents: Vec<&Ident> = references.iter().map(|s| &s.ident).collect();

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let not_found = quote! {
        Err(::object_adapter::MappingError::FieldNotFound {
            class: #class_name.to_string(),
            field: name.to_string(),
        }
        .into())
    };

    Ok(quote! {
        impl #impl_generics ::object_adapter::Mapped for #ident #ty_generics #where_clause {
            fn class_name(&self) -> &'static str {
                #class_name
            }

            fn field(&self, name: &str) -> ::object_adapter::Result<::object_adapter::Value> {
                match name {
                    #(#field_names => Ok(::object_adapter::FieldValue::to_value(&self.#field_idents)),)*
                    _ => #not_found,
                }
            }

            #[allow(unused_variables)]
            fn set_field(
                &mut self,
                name: &str,
                value: ::object_adapter::Value,
            ) -> ::object_adapter::Result<()> {
                match name {
                    #(#field_names => {
                        self.#field_idents = ::object_adapter::FieldValue::from_value(value)?;
                        Ok(())
                    })*
                    _ => #not_found,
                }
            }

            fn reference(
                &self,
                name: &str,
            ) -> ::object_adapter::Result<Option<::object_adapter::ObjectHandle>> {
                match name {
                    #(#reference_names => Ok(self.#reference_idents.clone()),)*
                    _ => #not_found,
                }
            }

            #[allow(unused_variables)]
            fn set_reference(
                &mut self,
                name: &str,
                reference: Option<::object_adapter::ObjectHandle>,
            ) -> ::object_adapter::Result<()> {
                match name {
                    #(#reference_names => {
                        self.#reference_idents = reference;
                        Ok(())
                    })*
                    _ => #not_found,
                }
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
        }

        impl #impl_generics ::object_adapter::MappedClass for #ident #ty_generics #where_clause {
            const CLASS_NAME: &'static str = #class_name;
            const FIELDS: &'static [&'static str] = &[#(#field_names),*];
            const REFERENCES: &'static [&'static str] = &[#(#reference_names),*];
        }
    })
}

fn parse_class_name(attrs: &[syn::Attribute]) -> syn::Result<Option<String>> {
    let mut class_name = None;

    for attr in attrs {
        if !attr.path().is_ident("mapped") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("class") {
                let value = meta.value()?;
                let lit: LitStr = value.parse()?;
                class_name = Some(lit.value());
                return Ok(());
            }

            Err(meta.error("Unsupported #[mapped(...)] struct option. Supported: class = \"...\""))
        })?;
    }

    Ok(class_name)
}

fn parse_field_options(attrs: &[syn::Attribute]) -> syn::Result<MappedFieldOptions> {
    let mut options = MappedFieldOptions::default();

    for attr in attrs {
        if !attr.path().is_ident("mapped") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("reference") {
                options.reference = true;
                return Ok(());
            }

            if meta.path.is_ident("skip") {
                options.skip = true;
                return Ok(());
            }

            if meta.path.is_ident("name") {
                let value = meta.value()?;
                let lit: LitStr = value.parse()?;
                options.name = Some(lit.value());
                return Ok(());
            }

            Err(meta.error(
                "Unsupported #[mapped(...)] field option. Supported: reference, skip, name = \"...\"",
            ))
        })?;

        if options.skip && (options.reference || options.name.is_some()) {
            return Err(syn::Error::new(
                attr.span(),
                "#[mapped(skip)] cannot be combined with other options",
            ));
        }
    }

    Ok(options)
}
