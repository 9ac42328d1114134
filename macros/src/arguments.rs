use syn::parse::{Parse, ParseStream};
use syn::{Ident, LitStr, Token, Type};

/// Arguments of the `command`, `query` and `event` attributes: `name = "..."`, `error = Type` and,
/// for queries, `output = Type`, separated by commas.
#[derive(Default)]
pub struct HandlerArguments {
    pub name: Option<LitStr>,
    pub error: Option<Type>,
    pub output: Option<Type>,
}

impl Parse for HandlerArguments {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut arguments = HandlerArguments::default();
        while !input.is_empty() {
            let argument = input.parse::<Ident>()?;
            input.parse::<Token![=]>()?;
            if argument == "name" {
                arguments.name = Some(input.parse()?);
            } else if argument == "error" {
                arguments.error = Some(input.parse()?);
            } else if argument == "output" {
                arguments.output = Some(input.parse()?);
            } else {
                return Err(syn::Error::new_spanned(argument, "unexpected argument"));
            }
            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(arguments)
    }
}
