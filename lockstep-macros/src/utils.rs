use proc_macro::{TokenStream, TokenTree};

/// Splits a `TokenStream` into comma-separated arguments.
///
/// Only top-level commas separate arguments; commas inside a group
/// (parentheses, brackets, braces) belong to a single token tree.
pub(crate) fn split_args(input: TokenStream) -> Vec<Vec<TokenTree>> {
    let mut args = Vec::new();
    let mut current = Vec::new();

    for token in input {
        match &token {
            TokenTree::Punct(p) if p.as_char() == ',' => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(token),
        }
    }

    if !current.is_empty() {
        args.push(current);
    }

    args
}

/// Converts a slice of tokens back into source text.
///
/// Consecutive identifiers are separated by a space so they never merge.
pub(crate) fn tokens_to_string(tokens: &[TokenTree]) -> String {
    let mut out = String::new();
    let mut prev_was_ident = false;

    for t in tokens {
        let is_ident = matches!(t, TokenTree::Ident(_));

        if prev_was_ident && is_ident {
            out.push(' ');
        }

        out.push_str(&t.to_string());
        prev_was_ident = is_ident;
    }

    out
}

/// Parses the arguments of `main`/`test`: empty, or `tick_budget = N`.
pub(crate) fn parse_tick_budget(attr: TokenStream) -> Result<Option<usize>, String> {
    let mut tick_budget = None;

    for arg in split_args(attr) {
        let text = tokens_to_string(&arg);
        let Some((key, value)) = text.split_once('=') else {
            return Err(format!("expected `key = value`, found `{text}`"));
        };

        match key.trim() {
            "tick_budget" => {
                let n = value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| format!("`tick_budget` expects an integer, found `{}`", value.trim()))?;

                if n == 0 {
                    return Err("`tick_budget` must be greater than zero".to_string());
                }

                tick_budget = Some(n);
            }
            other => return Err(format!("unknown argument `{other}`")),
        }
    }

    Ok(tick_budget)
}

/// Expands to a `compile_error!` carrying `msg`.
pub(crate) fn compile_error(msg: &str) -> TokenStream {
    format!("::core::compile_error!({msg:?});").parse().unwrap()
}
