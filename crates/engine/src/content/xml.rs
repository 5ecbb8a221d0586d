use std::path::Path;

use roxmltree::{Document, Node};

use crate::rules::{parse_leading_integer, parse_leading_number};

use super::error::{ContentError, ContentErrorCode};

/// Attribute access with source locations for error reporting.
#[derive(Clone, Copy)]
pub(crate) struct XmlReader<'a, 'input> {
    pub doc: &'a Document<'input>,
    pub file_path: &'a Path,
}

impl<'a, 'input> XmlReader<'a, 'input> {
    pub fn new(doc: &'a Document<'input>, file_path: &'a Path) -> Self {
        Self { doc, file_path }
    }

    pub fn error(&self, node: Node<'_, '_>, code: ContentErrorCode, message: impl Into<String>) -> ContentError {
        ContentError::at_node(code, message, self.file_path, self.doc, node)
    }

    /// Present and non-empty.
    pub fn attr<'n>(&self, node: Node<'n, 'input>, name: &str) -> Option<&'n str> {
        node.attribute(name).filter(|value| !value.is_empty())
    }

    pub fn string(&self, node: Node<'_, 'input>, name: &str) -> Option<String> {
        self.attr(node, name).map(str::to_string)
    }

    pub fn string_or(&self, node: Node<'_, 'input>, name: &str, default: &str) -> String {
        self.attr(node, name).unwrap_or(default).to_string()
    }

    pub fn required(&self, node: Node<'_, 'input>, name: &str) -> Result<String, ContentError> {
        self.string(node, name).ok_or_else(|| {
            self.error(
                node,
                ContentErrorCode::MissingAttribute,
                format!("<{}> requires attribute '{name}'", node.tag_name().name()),
            )
        })
    }

    pub fn number_or(&self, node: Node<'_, 'input>, name: &str, default: f64) -> Result<f64, ContentError> {
        let Some(raw) = self.attr(node, name) else {
            return Ok(default);
        };
        parse_leading_number(raw).ok_or_else(|| self.invalid_number(node, name, raw))
    }

    pub fn integer_or(&self, node: Node<'_, 'input>, name: &str, default: i64) -> Result<i64, ContentError> {
        let Some(raw) = self.attr(node, name) else {
            return Ok(default);
        };
        parse_leading_integer(raw).ok_or_else(|| self.invalid_number(node, name, raw))
    }

    pub fn flag(&self, node: Node<'_, 'input>, name: &str) -> bool {
        node.attribute(name) == Some("true")
    }

    fn invalid_number(&self, node: Node<'_, '_>, name: &str, raw: &str) -> ContentError {
        self.error(
            node,
            ContentErrorCode::InvalidValue,
            format!(
                "attribute '{name}' on <{}> must be numeric, got '{raw}'",
                node.tag_name().name()
            ),
        )
    }
}

pub(crate) fn child_elements<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(Node::is_element)
}

pub(crate) fn first_child_named<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    child_elements(node).find(|child| child.has_tag_name(name))
}

/// Descendants excluding `node` itself.
pub(crate) fn descendants_named<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.descendants()
        .skip(1)
        .filter(move |child| child.is_element() && child.has_tag_name(name))
}
