//! Procedural macros for the greenwire runtime.
//!
//! - `#[greenwire::main]` runs an `async fn main` on a fresh runtime.
//! - `#[greenwire::test]` does the same for `async` tests.
//! - `join!` awaits several futures concurrently on the current task.
//!
//! Both attributes accept `event_capacity = N` and `task_capacity = N`.
//! Expansions are assembled from token trees and short source strings,
//! so the crate needs no parser dependencies.

mod utils;

use proc_macro::TokenStream;
use utils::{RuntimeArgs, compile_error, split_args};

/// Awaits every argument concurrently and yields their outputs as a
/// tuple, in argument order.
///
/// ```rust,ignore
/// let (a, b) = greenwire::join!(fetch_a(), fetch_b());
/// ```
#[proc_macro]
pub fn join(input: TokenStream) -> TokenStream {
    let branches = split_args(input);

    match branches.len() {
        0 => return "()".parse().unwrap_or_default(),
        1 => return format!("{{ ({}).await }}", branches[0]).parse().unwrap_or_default(),
        _ => {}
    }

    let mut output = String::from("{\n");

    for (i, branch) in branches.iter().enumerate() {
        output.push_str(&format!(
            "let mut __join_{i} = ::greenwire::__private::MaybeDone::new({branch});\n"
        ));
    }

    // Every branch is polled on each wake; `&=` does not short-circuit.
    output.push_str("::std::future::poll_fn(|cx| {\nlet mut done = true;\n");
    for i in 0..branches.len() {
        output.push_str(&format!("done &= __join_{i}.poll_done(cx);\n"));
    }

    let outputs: String = (0..branches.len())
        .map(|i| format!("__join_{i}.take(), "))
        .collect();
    output.push_str(&format!(
        "if done {{ ::std::task::Poll::Ready(({outputs})) }} else {{ ::std::task::Poll::Pending }}\n"
    ));
    output.push_str("}).await\n}");

    output
        .parse()
        .unwrap_or_else(|err| compile_error(&format!("join! expansion failed: {err}")))
}

/// Runs an `async fn main` on a greenwire runtime.
///
/// ```rust,ignore
/// #[greenwire::main(event_capacity = 128)]
/// async fn main() -> greenwire::Result<()> {
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let wrapped = RuntimeArgs::parse(attr).and_then(|args| args.wrap_fn(item));

    match wrapped {
        Ok(tokens) => tokens.into_iter().collect(),
        Err(msg) => compile_error(&msg),
    }
}

/// Runs an `async` test on its own greenwire runtime.
///
/// The test may return anything a `#[test]` function may return.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let tokens = match RuntimeArgs::parse(attr).and_then(|args| args.wrap_fn(item)) {
        Ok(tokens) => tokens,
        Err(msg) => return compile_error(&msg),
    };

    let mut output: TokenStream = "#[::core::prelude::v1::test]".parse().unwrap_or_default();
    output.extend(tokens);
    output
}
