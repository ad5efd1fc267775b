//! `\mmlToken{kind}[attrs]{text}`：直接构造一个记号元素

use once_cell::sync::Lazy;
use phf::{phf_map, phf_set};
use regex::Regex;

use crate::ast::{Node, NodeKind, ParseResult};
use crate::error::TexError;

use super::super::Parser;
use super::Command;

/// 一个 `name=value` 属性，值可以带单引号或双引号
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?i)([a-z]+)\s*=\s*('[^']*'|"[^"]*"|[^ ,]*)\s*,?\s*"#).expect("内置正则一定合法")
});

/// 默认属性之外允许设置的属性
static ALLOWED: phf::Set<&'static str> = phf_set! {
    "fontfamily", "fontsize", "fontweight", "fontstyle", "color",
    "background", "id", "class", "href", "style",
};

static COMMANDS: phf::Map<&'static str, Command> = phf_map! {
    "mmlToken" => Command::MmlToken,
};

pub(super) fn lookup(name: &str) -> Option<Command> {
    COMMANDS.get(name).copied()
}

fn unquote(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

pub(super) fn mml_token(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    let kind_name = parser.cursor.get_argument(name)?;
    let attributes = parser.cursor.get_brackets(name)?.unwrap_or_default();
    let text = parser.cursor.get_argument(name)?;
    let kind = NodeKind::token_from_name(kind_name.trim())
        .filter(|kind| kind.is_token())
        .ok_or_else(|| TexError::NotMathMLToken(kind_name.clone()))?;

    let mut node = Node::token(kind, text);
    let mut rest = attributes.trim_start();
    while !rest.is_empty() {
        let caps = ATTRIBUTE
            .captures(rest)
            .ok_or_else(|| TexError::InvalidMathMLAttr(rest.to_string()))?;
        let (Some(whole), Some(attr), Some(value)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            return Err(TexError::InvalidMathMLAttr(rest.to_string()));
        };
        let attr = attr.as_str();
        if !kind.has_default_attribute(attr) && !ALLOWED.contains(attr) {
            return Err(TexError::UnknownAttrForElement(
                attr.to_string(),
                kind_name.clone(),
            ));
        }
        let value = unquote(value.as_str());
        if !value.is_empty() {
            let value = match value.to_ascii_lowercase().as_str() {
                "true" => "true".to_string(),
                "false" => "false".to_string(),
                _ => value.to_string(),
            };
            node.set_attribute(attr, value);
        }
        rest = &rest[whole.end()..];
    }
    parser.push(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::testing::inline;
    use pretty_assertions::assert_eq;

    #[test]
    fn token_with_attributes() {
        assert_eq!(
            inline("\\mmlToken{mo}[stretchy=\"TRUE\", lspace='0']{|}").unwrap(),
            "<math><mo lspace=\"0\" stretchy=\"true\">|</mo></math>"
        );
    }

    #[test]
    fn only_tokens_are_allowed() {
        assert_eq!(
            inline("\\mmlToken{mrow}{x}"),
            Err(TexError::NotMathMLToken("mrow".into()))
        );
    }

    #[test]
    fn attributes_are_checked() {
        assert_eq!(
            inline("\\mmlToken{mi}[foo=1]{x}"),
            Err(TexError::UnknownAttrForElement("foo".into(), "mi".into()))
        );
        assert_eq!(
            inline("\\mmlToken{mi}[=1]{x}"),
            Err(TexError::InvalidMathMLAttr("=1".into()))
        );
        assert_eq!(
            inline("\\mmlToken{mi}[class=v]{x}").unwrap(),
            "<math><mi class=\"v\">x</mi></math>"
        );
    }
}
