use proc_macro2::Span;
use syn::{Attribute, Lit, Meta, NestedMeta, Type};

/// This returns true if a bare attribute (`#[name]`) is present.
pub fn has_attribute(attrs: &[Attribute], attr_name: &str) -> bool {
    attrs.iter().any(|attr| {
        matches!(attr.parse_meta(), Ok(Meta::Path(path)) if path.is_ident(attr_name))
    })
}

/// Collect the `key = "value"` pairs of every `#[attr_name(...)]` attribute.
///
/// Only keys listed in `allowed` are accepted.
pub fn string_args(
    attrs: &[Attribute],
    attr_name: &str,
    allowed: &[&str],
) -> syn::Result<Vec<(String, String)>> {
    let mut args = vec![];

    for attr in attrs.iter().filter(|attr| attr.path.is_ident(attr_name)) {
        let list = match attr.parse_meta()? {
            Meta::List(list) => list,
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    format!("expected #[{}(key = \"value\")]", attr_name),
                ))
            }
        };

        for nested in list.nested {
            match nested {
                NestedMeta::Meta(Meta::NameValue(pair)) => {
                    let key = pair
                        .path
                        .get_ident()
                        .map(|ident| ident.to_string())
                        .unwrap_or_default();

                    if !allowed.contains(&key.as_str()) {
                        return Err(syn::Error::new_spanned(
                            pair.path,
                            format!("unknown {} argument, expected one of {:?}", attr_name, allowed),
                        ));
                    }

                    match pair.lit {
                        Lit::Str(value) => args.push((key, value.value())),
                        other => {
                            return Err(syn::Error::new_spanned(other, "expected a string literal"))
                        }
                    }
                }
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        format!("expected #[{}(key = \"value\")]", attr_name),
                    ))
                }
            }
        }
    }

    Ok(args)
}

/// Look up a single argument collected by [`string_args`].
pub fn arg<'a>(args: &'a [(String, String)], key: &str) -> Option<&'a str> {
    args.iter()
        .rev()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

/// SQL type used for a field when none is given.
///
/// `Option<T>` maps like `T`. Anything unknown is stored as text.
pub fn default_sql_type(ty: &Type) -> &'static str {
    let segment = match ty {
        Type::Path(path) => match path.path.segments.last() {
            Some(segment) => segment,
            None => return "text",
        },
        Type::Reference(reference) => return default_sql_type(&reference.elem),
        _ => return "text",
    };

    if segment.ident == "Option" {
        if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
            if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
                return default_sql_type(inner);
            }
        }
    }

    match segment.ident.to_string().as_str() {
        "i8" | "i16" | "u8" => "smallint",
        "i32" | "u16" => "integer",
        "i64" | "u32" => "bigint",
        "f32" => "real",
        "f64" => "double precision",
        "bool" => "boolean",
        _ => "text",
    }
}

pub fn error(message: &str) -> syn::Error {
    syn::Error::new(Span::call_site(), message)
}
