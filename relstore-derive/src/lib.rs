mod utils;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields, FieldsNamed, Ident};
use utils::{arg, default_sql_type, error, has_attribute, string_args};

/// Derive `relstore::Relational` for a struct with named fields.
///
/// * `#[relational(table = "...")]` on the struct names the table (defaults to the struct name).
/// * `#[primary_key]` marks exactly one field as the key.
/// * `#[column(name = "...", sql_type = "...")]` on a field renames the column or sets the
///   type used when creating the table.
#[proc_macro_derive(Relational, attributes(relational, primary_key, column))]
pub fn relational(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    match expand(ast) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(ast: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = ast.ident;

    let fields = match ast.data {
        Data::Struct(syn::DataStruct {
            fields: Fields::Named(FieldsNamed { ref named, .. }),
            ..
        }) => named,
        _ => return Err(error("Relational can only be derived on a struct with named fields")),
    };

    let table_args = string_args(&ast.attrs, "relational", &["table"])?;
    let table = arg(&table_args, "table")
        .map(str::to_owned)
        .unwrap_or_else(|| name.to_string());

    let columns = process_fields(fields.iter())?;

    let keys: Vec<&ColumnField> = columns.iter().filter(|column| column.primary_key).collect();
    let key = match keys.as_slice() {
        [key] => *key,
        [] => return Err(error("Relational needs one field marked #[primary_key]")),
        _ => return Err(error("Relational allows only one #[primary_key] field")),
    };

    let key_field = &key.field;
    let key_column = &key.column;

    let column_defs = columns.iter().map(|column| {
        let (column_name, sql_type) = (&column.column, &column.sql_type);
        quote! {
            relstore::Column { name: #column_name, sql_type: #sql_type },
        }
    });

    let to_values = columns.iter().map(|column| {
        let field = &column.field;
        quote! {
            relstore::ToValue::to_value(&self.#field),
        }
    });

    let from_values = columns.iter().map(|column| {
        let (field, column_name) = (&column.field, &column.column);
        quote! {
            #field: relstore::record::take_column(&mut values, #table, #column_name)?,
        }
    });

    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics relstore::Relational for #name #ty_generics #where_clause {
            const TABLE: &'static str = #table;
            const PRIMARY_KEY: &'static str = #key_column;
            const COLUMNS: &'static [relstore::Column] = &[
                #(#column_defs)*
            ];

            fn key(&self) -> relstore::Value {
                relstore::ToValue::to_value(&self.#key_field)
            }

            fn to_values(&self) -> Vec<relstore::Value> {
                vec![#(#to_values)*]
            }

            fn from_values(values: Vec<relstore::Value>) -> relstore::DbResult<Self> {
                let mut values = values.into_iter();
                Ok(Self {
                    #(#from_values)*
                })
            }
        }
    })
}

/// What the derive needs to know about one field.
struct ColumnField {
    field: Ident,
    column: String,
    sql_type: String,
    primary_key: bool,
}

/// Process fields and decide the column each one maps to.
fn process_fields<'a>(fields: impl Iterator<Item = &'a Field>) -> syn::Result<Vec<ColumnField>> {
    let mut columns = vec![];

    for field in fields {
        let args = string_args(&field.attrs, "column", &["name", "sql_type"])?;

        // Named fields always carry an ident.
        let ident = match field.ident.clone() {
            Some(ident) => ident,
            None => return Err(syn::Error::new_spanned(field, "expected a named field")),
        };

        columns.push(ColumnField {
            column: arg(&args, "name")
                .map(str::to_owned)
                .unwrap_or_else(|| ident.to_string()),
            sql_type: arg(&args, "sql_type")
                .unwrap_or_else(|| default_sql_type(&field.ty))
                .to_owned(),
            primary_key: has_attribute(&field.attrs, "primary_key"),
            field: ident,
        });
    }

    Ok(columns)
}
