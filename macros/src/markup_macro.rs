//! markup! macro: parse HTML-like syntax and generate bindery builder code.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::{braced, Error, Expr, Ident, LitStr, Result, Token};

// ---------------------------------------------------------------------------
// AST types
// ---------------------------------------------------------------------------

/// An attribute value: a string literal or a braced expression.
#[derive(Clone)]
pub(crate) enum AttrValue {
    Literal(LitStr),
    Expr(Expr),
}

/// A parsed attribute: `name="value"` or `data-name={expr}`.
#[derive(Clone)]
pub(crate) struct Attribute {
    /// Attribute name, hyphenated segments joined.
    pub name: String,
    pub span: Span,
    pub value: AttrValue,
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match &self.value {
            AttrValue::Literal(lit) => lit.value(),
            AttrValue::Expr(_) => "{..}".to_owned(),
        };
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("value", &value)
            .finish()
    }
}

/// A child of an element.
#[derive(Clone)]
pub(crate) enum Node {
    Element(Element),
    Text(LitStr),
    TextExpr(Box<Expr>),
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Element(element) => std::fmt::Debug::fmt(element, f),
            Node::Text(lit) => write!(f, "Text({:?})", lit.value()),
            Node::TextExpr(_) => f.write_str("Text({..})"),
        }
    }
}

/// A parsed element: `<tag attrs... />` or `<tag attrs...> children </tag>`.
#[derive(Clone)]
pub(crate) struct Element {
    pub tag: String,
    pub attrs: Vec<Attribute>,
    pub children: Vec<Node>,
    pub self_closing: bool,
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("attrs", &self.attrs)
            .field("children", &self.children.len())
            .field("self_closing", &self.self_closing)
            .finish()
    }
}

impl std::fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Literal(lit) => write!(f, "{:?}", lit.value()),
            AttrValue::Expr(_) => f.write_str("{..}"),
        }
    }
}

/// The top-level markup! input: a sequence of elements.
#[derive(Debug)]
struct MarkupInput {
    elements: Vec<Element>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

impl Parse for MarkupInput {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut elements = Vec::new();
        while !input.is_empty() {
            elements.push(parse_element(input)?);
        }
        Ok(MarkupInput { elements })
    }
}

/// Parse a possibly hyphenated name (`data-name`, `type`, `contenteditable`).
fn parse_name(input: ParseStream) -> Result<(String, Span)> {
    let first = Ident::parse_any(input)?;
    let span = first.span();
    let mut name = first.to_string();
    while input.peek(Token![-]) {
        input.parse::<Token![-]>()?;
        let segment = Ident::parse_any(input)?;
        name.push('-');
        name.push_str(&segment.to_string());
    }
    Ok((name, span))
}

fn parse_braced_expr(input: ParseStream) -> Result<Expr> {
    let content;
    braced!(content in input);
    content.parse()
}

/// Parse a single element from the token stream.
pub(crate) fn parse_element(input: ParseStream) -> Result<Element> {
    input.parse::<Token![<]>()?;
    let (tag, _) = parse_name(input)?;

    let mut attrs = Vec::new();
    loop {
        if input.peek(Token![/]) {
            input.parse::<Token![/]>()?;
            input.parse::<Token![>]>()?;
            return Ok(Element {
                tag,
                attrs,
                children: Vec::new(),
                self_closing: true,
            });
        }

        if input.peek(Token![>]) {
            input.parse::<Token![>]>()?;
            break;
        }

        let (name, span) = parse_name(input)?;
        input.parse::<Token![=]>()?;
        let value = if input.peek(LitStr) {
            AttrValue::Literal(input.parse()?)
        } else if input.peek(syn::token::Brace) {
            AttrValue::Expr(parse_braced_expr(input)?)
        } else {
            return Err(input.error("expected a string literal or `{expr}` attribute value"));
        };
        attrs.push(Attribute { name, span, value });
    }

    let mut children = Vec::new();
    loop {
        if input.peek(Token![<]) && input.peek2(Token![/]) {
            input.parse::<Token![<]>()?;
            input.parse::<Token![/]>()?;
            let (closing, span) = parse_name(input)?;
            if closing != tag {
                return Err(Error::new(
                    span,
                    format!("mismatched closing tag: expected `</{tag}>`, found `</{closing}>`"),
                ));
            }
            input.parse::<Token![>]>()?;
            break;
        }

        if input.peek(Token![<]) {
            children.push(Node::Element(parse_element(input)?));
        } else if input.peek(LitStr) {
            children.push(Node::Text(input.parse()?));
        } else if input.peek(syn::token::Brace) {
            children.push(Node::TextExpr(Box::new(parse_braced_expr(input)?)));
        } else {
            return Err(input.error(format!(
                "expected a child element, text, `{{expr}}`, or `</{tag}>`"
            )));
        }
    }

    Ok(Element {
        tag,
        attrs,
        children,
        self_closing: false,
    })
}

// ---------------------------------------------------------------------------
// Code generation
// ---------------------------------------------------------------------------

/// Generate the builder expression for a single element.
fn generate_element(elem: &Element) -> TokenStream {
    let tag = &elem.tag;
    let mut calls = Vec::new();

    for attr in &elem.attrs {
        let name = LitStr::new(&attr.name, attr.span);
        match &attr.value {
            AttrValue::Literal(lit) => calls.push(quote! { .attr(#name, #lit) }),
            AttrValue::Expr(expr) => calls.push(quote! { .attr(#name, #expr) }),
        }
    }

    for child in &elem.children {
        match child {
            Node::Element(element) => {
                let code = generate_element(element);
                calls.push(quote! { .child(#code) });
            }
            Node::Text(lit) => calls.push(quote! { .text(#lit) }),
            Node::TextExpr(expr) => calls.push(quote! { .text(#expr) }),
        }
    }

    quote! {
        ::bindery::dom::ElementBuilder::new(#tag) #(#calls)*
    }
}

/// Entry point: generate code for the markup! macro.
pub(crate) fn markup_impl(input: TokenStream) -> Result<TokenStream> {
    let parsed: MarkupInput = syn::parse2(input)?;

    match parsed.elements.as_slice() {
        [root] => Ok(generate_element(root)),
        [] => Err(Error::new(
            Span::call_site(),
            "markup! requires one root element",
        )),
        [_, extra, ..] => Err(Error::new(
            Span::call_site(),
            format!("markup! takes a single root element; found a second `<{}>`", extra.tag),
        )),
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;

    fn parse_single_element(tokens: TokenStream) -> Result<Element> {
        syn::parse2::<MarkupInput>(tokens).map(|m| m.elements.into_iter().next().unwrap())
    }

    // -----------------------------------------------------------------------
    // Parsing tests
    // -----------------------------------------------------------------------

    #[test]
    fn parse_self_closing_element() {
        let elem = parse_single_element(quote! { <input name="first_name" /> }).unwrap();
        assert_eq!(elem.tag, "input");
        assert!(elem.self_closing);
        assert_eq!(elem.attrs.len(), 1);
        assert_eq!(elem.attrs[0].name, "name");
    }

    #[test]
    fn parse_hyphenated_and_keyword_attributes() {
        let elem = parse_single_element(quote! {
            <input type="checkbox" data-name="rows[]" data-readonly="1" />
        })
        .unwrap();
        let names: Vec<&str> = elem.attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["type", "data-name", "data-readonly"]);
    }

    #[test]
    fn parse_text_and_element_children() {
        let elem = parse_single_element(quote! {
            <p>
                "Hello, "
                <b name="who"></b>
                {greeting}
            </p>
        })
        .unwrap();
        assert_eq!(elem.children.len(), 3);
        assert!(matches!(elem.children[0], Node::Text(_)));
        assert!(matches!(elem.children[1], Node::Element(_)));
        assert!(matches!(elem.children[2], Node::TextExpr(_)));
    }

    #[test]
    fn parse_braced_attribute_value() {
        let elem = parse_single_element(quote! { <li name={format!("{}[]", list)} /> }).unwrap();
        assert!(matches!(elem.attrs[0].value, AttrValue::Expr(_)));
    }

    #[test]
    fn parse_error_mismatched_closing_tag() {
        let err = parse_single_element(quote! { <ul><li></li></ol> }).unwrap_err();
        assert!(err.to_string().contains("mismatched closing tag"));
    }

    #[test]
    fn parse_error_bare_identifier_child() {
        let err = parse_single_element(quote! { <p>hello</p> }).unwrap_err();
        assert!(err.to_string().contains("expected a child element"));
    }

    // -----------------------------------------------------------------------
    // Code generation tests
    // -----------------------------------------------------------------------

    #[test]
    fn codegen_nested_builder_chain() {
        let code = markup_impl(quote! {
            <ul class="people">
                <li data-name="rows[]">"row"</li>
            </ul>
        })
        .unwrap()
        .to_string();
        assert!(code.contains("ElementBuilder :: new (\"ul\")"), "got: {code}");
        assert!(code.contains(". attr (\"class\" , \"people\")"), "got: {code}");
        assert!(code.contains(". child (:: bindery :: dom :: ElementBuilder :: new (\"li\")"), "got: {code}");
        assert!(code.contains(". attr (\"data-name\" , \"rows[]\")"), "got: {code}");
        assert!(code.contains(". text (\"row\")"), "got: {code}");
    }

    #[test]
    fn codegen_requires_one_root() {
        let empty = markup_impl(quote! {}).unwrap_err();
        assert!(empty.to_string().contains("one root element"));
        let two = markup_impl(quote! { <a /> <b /> }).unwrap_err();
        assert!(two.to_string().contains("single root element"));
    }
}
