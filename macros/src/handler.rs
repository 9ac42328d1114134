use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Generics, Ident, ItemFn, ReturnType, Signature, Type};

use crate::arguments::HandlerArguments;
use crate::utils::{
    create_str_literal_from_ident, error, extract_input, extract_result_types, extract_type_ident,
    is_unit, HandlerInput, ResultTypes,
};

#[derive(Clone, Copy)]
pub enum Kind {
    Command,
    Query,
    Event,
}

impl Kind {
    fn description(self) -> &'static str {
        match self {
            Kind::Command => "a command",
            Kind::Query => "a query",
            Kind::Event => "an event",
        }
    }

    fn parameter_name(self) -> &'static str {
        match self {
            Kind::Command => "command",
            Kind::Query => "query",
            Kind::Event => "event",
        }
    }
}

pub fn handler(kind: Kind, arguments: TokenStream, handler: TokenStream) -> TokenStream {
    let arguments = parse_macro_input!(arguments as HandlerArguments);
    let ItemFn {
        sig, block, attrs, ..
    } = parse_macro_input!(handler as ItemFn);

    let Signature {
        asyncness,
        ident: handler_name,
        inputs,
        output,
        generics: Generics {
            params,
            where_clause,
            ..
        },
        ..
    } = sig;

    if asyncness.is_none() {
        return error(
            handler_name,
            format!("{} handler must be async", kind.description()),
        );
    }

    let HandlerInput {
        context,
        context_type,
        parameter,
        parameter_type,
    } = match extract_input(&inputs) {
        Some(result) => result,
        None => {
            return error(
                inputs,
                format!(
                    r#"arguments of {} handler should match "(context: &Context, {}: &T)""#,
                    kind.description(),
                    kind.parameter_name(),
                ),
            )
        }
    };

    if let Err(error) = check_output(kind, &handler_name, &output) {
        return error.to_compile_error().into();
    }

    let result_types = extract_result_types(&output);

    let error_type = match arguments
        .error
        .as_ref()
        .or(result_types.as_ref().map(|types| types.error))
    {
        Some(error_type) => error_type,
        None => return error(handler_name, MISSING_ERROR_TYPE),
    };

    let name = match arguments
        .name
        .or_else(|| extract_type_ident(parameter_type).map(create_str_literal_from_ident))
    {
        Some(name) => name,
        None => return error(parameter_type, MISSING_NAME),
    };

    let implementation = match kind {
        Kind::Query => {
            let output_type = match arguments
                .output
                .as_ref()
                .or(result_types.as_ref().map(|types| types.ok))
            {
                Some(output_type) => output_type,
                None => return error(handler_name, MISSING_OUTPUT_TYPE),
            };
            quote! {
                #[::mediatr::async_trait]
                impl<#params> ::mediatr::Query for #parameter_type #where_clause {
                    type Output = #output_type;
                    type Error = #error_type;

                    fn name(&self) -> &'static str {
                        #name
                    }

                    async fn handle(&self, #context: &#context_type) #output {
                        let #parameter: &#parameter_type = self;
                        #block
                    }
                }
            }
        }
        Kind::Command | Kind::Event => {
            let (trait_name, method_name) = match kind {
                Kind::Command => (quote! { Command }, quote! { execute }),
                _ => (quote! { Event }, quote! { dispatch }),
            };
            quote! {
                #[::mediatr::async_trait]
                impl<#params> ::mediatr::#trait_name for #parameter_type #where_clause {
                    type Error = #error_type;

                    fn name(&self) -> &'static str {
                        #name
                    }

                    async fn #method_name(&self, #context: &#context_type) #output {
                        let #parameter: &#parameter_type = self;
                        #block
                    }
                }
            }
        }
    };

    TokenStream::from(quote! {
        #(#attrs)*
        #implementation
    })
}

/// The handler must return a `Result`, or an alias of one when the error type is given as an
/// argument. Commands and events must return `Result<(), _>`.
fn check_output(kind: Kind, handler_name: &Ident, output: &ReturnType) -> syn::Result<()> {
    let return_type = match output {
        ReturnType::Type(_, return_type) => return_type.as_ref(),
        ReturnType::Default => {
            return Err(syn::Error::new_spanned(
                handler_name,
                format!("{} handler must return a Result", kind.description()),
            ))
        }
    };
    if !matches!(return_type, Type::Path(_)) {
        return Err(syn::Error::new_spanned(
            return_type,
            format!("{} handler must return a Result", kind.description()),
        ));
    }
    if let (Kind::Command | Kind::Event, Some(ResultTypes { ok, .. })) =
        (kind, extract_result_types(output))
    {
        if !is_unit(ok) {
            return Err(syn::Error::new_spanned(
                ok,
                format!("{} handler must return Result<(), _>", kind.description()),
            ));
        }
    }
    Ok(())
}

const MISSING_ERROR_TYPE: &str = r"Cannot find the error type.

Help: specify the error type with `#[command(error = <path>)]` or by detailing the result type in the function signature (`Result<(), Error>`)";

const MISSING_OUTPUT_TYPE: &str = r"Cannot find the output type.

Help: specify the output type with `#[query(output = <path>)]` or by detailing the result type in the function signature (`Result<Output, Error>`)";

const MISSING_NAME: &str = r#"Cannot derive a name from this type.

Help: specify the name with `name = "..."`"#;
