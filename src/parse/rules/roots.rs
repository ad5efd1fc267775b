//! 根号：`\sqrt[n]{x}`、`\root n \of x`，以及指数位置微调 `\leftroot`/`\uproot`

use once_cell::sync::Lazy;
use phf::phf_map;
use regex::Regex;

use crate::ast::{Node, NodeKind, ParseResult};
use crate::error::TexError;

use super::super::Parser;
use super::Command;

static INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*-?[0-9]+\s*$").expect("内置正则一定合法"));

static COMMANDS: phf::Map<&'static str, Command> = phf_map! {
    "sqrt" => Command::Sqrt,
    "root" => Command::Root,
    "leftroot" => Command::MoveRoot("leftroot"),
    "uproot" => Command::MoveRoot("uproot"),
};

pub(super) fn lookup(name: &str) -> Option<Command> {
    COMMANDS.get(name).copied()
}

pub(super) fn sqrt(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    let index = parser.cursor.get_brackets(name)?;
    let mut arg = parser.cursor.get_argument(name)?;
    // `\sqrt\frac12` 需要把分式的两个参数一起带上
    if arg == "\\frac" {
        let num = parser.cursor.get_argument(&arg)?;
        let den = parser.cursor.get_argument(&arg)?;
        arg = format!("\\frac{{{num}}}{{{den}}}");
    }
    let env = parser.env();
    let body = parser.parse_text(&arg, env)?;
    let node = match index.filter(|n| !n.is_empty()) {
        None => Node::new(NodeKind::Msqrt, vec![body]),
        Some(index) => {
            let index = parse_index(parser, &index)?;
            Node::new(NodeKind::Mroot, vec![body, index])
        }
    };
    parser.push(node)
}

pub(super) fn root(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    let index = parser.cursor.get_up_to(name, "\\of")?;
    let body = parser.parse_arg(name)?;
    let index = parse_index(parser, &index)?;
    parser.push(Node::new(NodeKind::Mroot, vec![body, index]))
}

/// 根指数单独解析；其中的 `\leftroot`/`\uproot` 转换为 mpadded 的偏移
fn parse_index(parser: &mut Parser<'_, '_>, text: &str) -> ParseResult<Node> {
    let mut env = parser.env();
    env.in_root = true;
    let (node, global) = parser.parse_text_with(text, env)?;
    if global.left_root.is_none() && global.up_root.is_none() {
        return Ok(node);
    }
    let mut padded = Node::new(NodeKind::Mpadded, vec![node]);
    if let Some(left) = global.left_root {
        padded.set_attribute("width", left);
    }
    if let Some(up) = global.up_root {
        padded.set_attribute("voffset", up.clone());
        padded.set_attribute("height", up);
    }
    Ok(padded)
}

/// 以 1/15 em 为单位移动根指数，只能在根指数中使用一次
pub(super) fn move_root(parser: &mut Parser<'_, '_>, name: &str, id: &str) -> ParseResult<()> {
    if !parser.env().in_root {
        return Err(TexError::MisplacedMoveRoot(name.to_string()));
    }
    let taken = match id {
        "leftroot" => parser.global.left_root.is_some(),
        _ => parser.global.up_root.is_some(),
    };
    if taken {
        return Err(TexError::MultipleMoveRoot(name.to_string()));
    }
    let arg = parser.cursor.get_argument(name)?;
    if !INTEGER.is_match(&arg) {
        return Err(TexError::IntegerArg(name.to_string()));
    }
    let value: f64 = arg
        .trim()
        .parse()
        .map_err(|_| TexError::IntegerArg(name.to_string()))?;
    let shift = value / 15.0;
    let text = if shift < 0.0 {
        format!("{shift}em")
    } else {
        format!("+{shift}em")
    };
    match id {
        "leftroot" => parser.global.left_root = Some(text),
        _ => parser.global.up_root = Some(text),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::error::TexError;
    use crate::parse::testing::inline;
    use pretty_assertions::assert_eq;

    #[test]
    fn square_and_indexed_roots() {
        assert_eq!(inline("\\sqrt{x}").unwrap(), "<math><msqrt><mi>x</mi></msqrt></math>");
        assert_eq!(
            inline("\\sqrt[3]{x}").unwrap(),
            "<math><mroot><mi>x</mi><mn>3</mn></mroot></math>"
        );
        assert_eq!(
            inline("\\root 3 \\of x").unwrap(),
            "<math><mroot><mi>x</mi><mn>3</mn></mroot></math>"
        );
    }

    #[test]
    fn moved_index_is_padded() {
        let out = inline("\\sqrt[\\leftroot{-3}\\uproot{15} n]{x}").unwrap();
        assert!(out.contains("width=\"-0.2em\""));
        assert!(out.contains("voffset=\"+1em\""));
    }

    #[test]
    fn move_root_outside_index_fails() {
        assert_eq!(
            inline("\\uproot{2}"),
            Err(TexError::MisplacedMoveRoot("\\uproot".into()))
        );
        assert_eq!(
            inline("\\sqrt[\\uproot{x}]{y}"),
            Err(TexError::IntegerArg("\\uproot".into()))
        );
    }
}
