use proc_macro::{Delimiter, Group, Ident, Span, TokenStream, TokenTree};

/// Splits macro input on top-level commas, dropping empty pieces so a
/// trailing comma is accepted.
///
/// Commas inside groups are left alone. A closure parameter list or a
/// turbofish is not a group, so such arguments need their own braces.
pub(crate) fn split_args(input: TokenStream) -> Vec<TokenStream> {
    let mut args = Vec::new();
    let mut current = Vec::new();

    for token in input {
        match token {
            TokenTree::Punct(ref p) if p.as_char() == ',' => {
                args.push(std::mem::take(&mut current));
            }
            other => current.push(other),
        }
    }
    args.push(current);

    args.into_iter()
        .filter(|arg| !arg.is_empty())
        .map(|arg| arg.into_iter().collect())
        .collect()
}

/// Expands to a `compile_error!` carrying `msg`.
pub(crate) fn compile_error(msg: &str) -> TokenStream {
    format!("::core::compile_error!({msg:?});")
        .parse()
        .unwrap_or_default()
}

/// Runtime options accepted by `#[greenwire::main]` and `#[greenwire::test]`.
#[derive(Default)]
pub(crate) struct RuntimeArgs {
    event_capacity: Option<usize>,
    task_capacity: Option<usize>,
}

impl RuntimeArgs {
    /// Parses `key = value` pairs separated by commas.
    pub(crate) fn parse(attr: TokenStream) -> Result<Self, String> {
        let mut args = Self::default();

        for arg in split_args(attr) {
            let tokens: Vec<TokenTree> = arg.into_iter().collect();

            let [TokenTree::Ident(key), TokenTree::Punct(eq), TokenTree::Literal(value)] =
                tokens.as_slice()
            else {
                let found: TokenStream = tokens.iter().cloned().collect();
                return Err(format!("expected `key = value`, found `{found}`"));
            };

            if eq.as_char() != '=' {
                return Err(format!("expected `=` after `{key}`"));
            }

            let value: usize = value
                .to_string()
                .replace('_', "")
                .parse()
                .map_err(|_| format!("`{key}` takes an integer"))?;

            match key.to_string().as_str() {
                "event_capacity" => args.event_capacity = Some(value),
                "task_capacity" => args.task_capacity = Some(value),
                other => return Err(format!("unknown runtime option `{other}`")),
            }
        }

        Ok(args)
    }

    /// Source of the expression building the configured runtime.
    fn builder(&self) -> String {
        let mut builder = String::from("::greenwire::RuntimeBuilder::new()");

        if let Some(n) = self.event_capacity {
            builder.push_str(&format!(".event_capacity({n})"));
        }
        if let Some(n) = self.task_capacity {
            builder.push_str(&format!(".task_capacity({n})"));
        }

        builder.push_str(".build()");
        builder
    }

    /// Turns `async fn f(..) -> T { body }` into a plain `fn` whose
    /// body runs on a fresh runtime and returns the block's value.
    ///
    /// The user body is moved into the new one untouched, so its
    /// spans still point at the user's code.
    pub(crate) fn wrap_fn(&self, item: TokenStream) -> Result<Vec<TokenTree>, String> {
        let mut tokens: Vec<TokenTree> = item.into_iter().collect();

        let Some(async_pos) = tokens
            .iter()
            .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
        else {
            return Err("the function must be `async`".into());
        };
        tokens.remove(async_pos);

        let Some(body_pos) = tokens.iter().rposition(
            |t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace),
        ) else {
            return Err("expected a function body".into());
        };

        let TokenTree::Group(body) = tokens[body_pos].clone() else {
            unreachable!()
        };

        let mut call: TokenStream = format!("let runtime = {}; runtime.block_on", self.builder())
            .parse()
            .map_err(|err| format!("invalid runtime options: {err}"))?;

        let future: TokenStream = [
            TokenTree::Ident(Ident::new("async", Span::call_site())),
            TokenTree::Ident(Ident::new("move", Span::call_site())),
            TokenTree::Group(body),
        ]
        .into_iter()
        .collect();

        call.extend([TokenTree::Group(Group::new(Delimiter::Parenthesis, future))]);
        tokens[body_pos] = TokenTree::Group(Group::new(Delimiter::Brace, call));

        Ok(tokens)
    }
}
