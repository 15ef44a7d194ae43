//! Procedural macros for the Lockstep runtime.
//!
//! - `#[lockstep::main]` and `#[lockstep::test]` turn an `async fn` into a
//!   synchronous one running its body on a fresh runtime. Both accept an
//!   optional `tick_budget = N`.
//! - `join!` awaits several futures concurrently on the current task.
//!
//! The macros generate source text and parse it back, so this crate has
//! no dependencies.

mod utils;

use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Polls every future until all of them completed, then yields their
/// outputs as a tuple, in argument order. A single future is simply
/// awaited.
///
/// The futures run on the current task, interleaved at their `.await`
/// points; nothing is spawned.
#[proc_macro]
pub fn join(input: TokenStream) -> TokenStream {
    let args = utils::split_args(input);
    let count = args.len();

    if count == 0 {
        return "()".parse().unwrap();
    }

    if count == 1 {
        let expr = utils::tokens_to_string(&args[0]);
        return format!("{{ ({expr}).await }}").parse().unwrap();
    }

    let mut output = String::from("{\n");

    for (i, expr_tokens) in args.iter().enumerate() {
        let expr = utils::tokens_to_string(expr_tokens);
        output.push_str(&format!(
            "let mut __join_f{i} = ::core::pin::pin!({expr});\n\
             let mut __join_o{i} = ::core::option::Option::None;\n"
        ));
    }

    output.push_str("::core::future::poll_fn(|cx| {\n");
    output.push_str("    let mut pending = false;\n");

    for i in 0..count {
        output.push_str(&format!(
            "    if __join_o{i}.is_none() {{\n\
                     match ::core::future::Future::poll(__join_f{i}.as_mut(), cx) {{\n\
                         ::core::task::Poll::Ready(val) => __join_o{i} = ::core::option::Option::Some(val),\n\
                         ::core::task::Poll::Pending => pending = true,\n\
                     }}\n\
                 }}\n"
        ));
    }

    output.push_str("    if pending {\n");
    output.push_str("        return ::core::task::Poll::Pending;\n");
    output.push_str("    }\n");
    output.push_str("    ::core::task::Poll::Ready((\n");

    for i in 0..count {
        output.push_str(&format!("        __join_o{i}.take().unwrap(),\n"));
    }

    output.push_str("    ))\n");
    output.push_str("}).await\n");
    output.push_str("}\n");

    output
        .parse()
        .unwrap_or_else(|err| utils::compile_error(&format!("join! expansion failed: {err}")))
}

/// Runs an `async fn main` on a Lockstep runtime.
///
/// ```rust,ignore
/// #[lockstep::main(tick_budget = 32)]
/// async fn main() {
///     // ...
/// }
/// ```
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    match wrap_in_runtime(attr, item) {
        Ok(tokens) => tokens,
        Err(msg) => utils::compile_error(&msg),
    }
}

/// Runs an `async fn` test on its own Lockstep runtime.
///
/// Accepts the same arguments as `#[lockstep::main]`.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let body = match wrap_in_runtime(attr, item) {
        Ok(tokens) => tokens,
        Err(msg) => return utils::compile_error(&msg),
    };

    let mut result: TokenStream = "#[::core::prelude::v1::test]".parse().unwrap();
    result.extend(body);
    result
}

/// Drops `async` from the signature and moves the body into
/// `block_on` on a runtime built from the attribute arguments.
fn wrap_in_runtime(attr: TokenStream, item: TokenStream) -> Result<TokenStream, String> {
    let tick_budget = utils::parse_tick_budget(attr)?;
    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    let Some(async_pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    else {
        return Err("the function must be declared `async`".to_string());
    };
    tokens.remove(async_pos);

    let Some(pos) = tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
    else {
        return Err("expected a function body".to_string());
    };

    let TokenTree::Group(body) = &tokens[pos] else {
        unreachable!()
    };

    let mut builder = String::from("::lockstep::RuntimeBuilder::new()");
    if let Some(n) = tick_budget {
        builder.push_str(&format!(".tick_budget({n})"));
    }

    let block = format!(
        "{{
            let runtime = {builder}.build();
            runtime.block_on(async move {{ {} }})
        }}",
        body.stream()
    );

    let block = block.parse().map_err(|err| format!("failed to expand: {err}"))?;
    tokens[pos] = TokenTree::Group(Group::new(Delimiter::Brace, block));

    Ok(tokens.into_iter().collect())
}
