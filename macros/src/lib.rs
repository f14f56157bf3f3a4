//! Proc macros for bindery: `markup!` tree construction.
//!
//! This crate is not meant to be used directly; enable the `macros` feature on `bindery`.

use proc_macro::TokenStream;

mod markup_macro;

/// HTML-like tree construction macro.
///
/// Expands to a `bindery::dom::ElementBuilder` expression; pass it to
/// `Document::build` to create the nodes.
///
/// # Syntax
///
/// - `<tag />`: element with no children
/// - `<tag attr="val"> ... </tag>`: element with children
/// - `"text"`: text child
/// - `{expr}`: text child from an expression, or an attribute value
///
/// Attribute names may be hyphenated (`data-name`) or keywords (`type`).
/// Exactly one root element is required.
///
/// # Example
///
/// ```ignore
/// let tree = markup! {
///     <form>
///         <h1 name="title"></h1>
///         <input type="text" name="first_name" />
///         <ul>
///             <li data-name="rows[]"><span name="label"></span></li>
///         </ul>
///     </form>
/// };
/// let root = doc.build(&tree);
/// ```
#[proc_macro]
pub fn markup(input: TokenStream) -> TokenStream {
    markup_macro::markup_impl(input.into())
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
