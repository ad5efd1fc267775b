//! 定界符：`\left`/`\right`/`\middle`、固定尺寸的 `\big` 一族，以及单独出现的定界符

use phf::phf_map;

use crate::ast::{Node, NodeKind, ParseResult, TexClass};
use crate::error::TexError;

use super::super::stack::{ItemKind, StackItem};
use super::super::util::big_delimiter;
use super::super::Parser;
use super::Command;

/// 定界符记号到字符的映射，键是输入中的原始写法
static DELIMITERS: phf::Map<&'static str, &'static str> = phf_map! {
    "(" => "(",
    ")" => ")",
    "[" => "[",
    "]" => "]",
    "<" => "\u{27E8}",
    ">" => "\u{27E9}",
    "/" => "/",
    "|" => "|",
    "." => "",
    "\\\\" => "\\",
    "\\lmoustache" => "\u{23B0}",
    "\\rmoustache" => "\u{23B1}",
    "\\lgroup" => "\u{27EE}",
    "\\rgroup" => "\u{27EF}",
    "\\arrowvert" => "\u{23D0}",
    "\\Arrowvert" => "\u{2016}",
    "\\bracevert" => "\u{23AA}",
    "\\Vert" => "\u{2016}",
    "\\|" => "\u{2016}",
    "\\vert" => "|",
    "\\uparrow" => "\u{2191}",
    "\\downarrow" => "\u{2193}",
    "\\updownarrow" => "\u{2195}",
    "\\Uparrow" => "\u{21D1}",
    "\\Downarrow" => "\u{21D3}",
    "\\Updownarrow" => "\u{21D5}",
    "\\backslash" => "\\",
    "\\rangle" => "\u{27E9}",
    "\\langle" => "\u{27E8}",
    "\\rbrace" => "}",
    "\\lbrace" => "{",
    "\\}" => "}",
    "\\{" => "{",
    "\\rceil" => "\u{2309}",
    "\\lceil" => "\u{2308}",
    "\\rfloor" => "\u{230B}",
    "\\lfloor" => "\u{230A}",
    "\\lbrack" => "[",
    "\\rbrack" => "]",
    "\\lt" => "\u{27E8}",
    "\\gt" => "\u{27E9}",
    "\\ulcorner" => "\u{231C}",
    "\\urcorner" => "\u{231D}",
    "\\llcorner" => "\u{231E}",
    "\\lrcorner" => "\u{231F}",
    "\\lvert" => "|",
    "\\rvert" => "|",
    "\\lVert" => "\u{2016}",
    "\\rVert" => "\u{2016}",
};

static COMMANDS: phf::Map<&'static str, Command> = phf_map! {
    "left" => Command::Left,
    "right" => Command::Right,
    "middle" => Command::Middle,
    "big" => Command::Big(TexClass::Ord, "1.2em"),
    "Big" => Command::Big(TexClass::Ord, "1.623em"),
    "bigg" => Command::Big(TexClass::Ord, "2.047em"),
    "Bigg" => Command::Big(TexClass::Ord, "2.470em"),
    "bigl" => Command::Big(TexClass::Open, "1.2em"),
    "Bigl" => Command::Big(TexClass::Open, "1.623em"),
    "biggl" => Command::Big(TexClass::Open, "2.047em"),
    "Biggl" => Command::Big(TexClass::Open, "2.470em"),
    "bigr" => Command::Big(TexClass::Close, "1.2em"),
    "Bigr" => Command::Big(TexClass::Close, "1.623em"),
    "biggr" => Command::Big(TexClass::Close, "2.047em"),
    "Biggr" => Command::Big(TexClass::Close, "2.470em"),
    "bigm" => Command::Big(TexClass::Rel, "1.2em"),
    "Bigm" => Command::Big(TexClass::Rel, "1.623em"),
    "biggm" => Command::Big(TexClass::Rel, "2.047em"),
    "Biggm" => Command::Big(TexClass::Rel, "2.470em"),
};

pub(super) fn lookup(name: &str) -> Option<Command> {
    if let Some(command) = COMMANDS.get(name) {
        return Some(*command);
    }
    // `\\` 是换行命令，只在定界符位置才表示反斜杠
    if name == "\\" {
        return None;
    }
    DELIMITERS
        .get(format!("\\{name}").as_str())
        .map(|text| Command::Delimiter(text))
}

pub(super) fn delimiter_for(token: &str) -> Option<&'static str> {
    DELIMITERS.get(token).copied()
}

/// 单独出现的定界符：不伸缩的普通运算符
pub(super) fn standalone(parser: &mut Parser<'_, '_>, text: &str) -> ParseResult<()> {
    let mut mo = Node::token(NodeKind::Mo, text);
    mo.set_attribute("fence", "false");
    mo.set_attribute("stretchy", "false");
    if matches!(text, "|" | "\u{2016}") {
        mo.texclass = Some(TexClass::Ord);
    }
    parser.push(mo)
}

pub(super) fn left(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    let delim = parser.get_delimiter(name, false)?;
    let color = parser.env().color;
    parser.push_item(StackItem::new(ItemKind::Left { delim, color }))
}

pub(super) fn right(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    let delim = parser.get_delimiter(name, false)?;
    let color = parser.env().color;
    parser.push_item(StackItem::new(ItemKind::Right { delim, color }))
}

pub(super) fn middle(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    let delim = parser.get_delimiter(name, false)?;
    let inside_left = matches!(
        parser.stack.top().map(|item| &item.kind),
        Some(ItemKind::Left { .. })
    );
    if !inside_left {
        return Err(TexError::MisplacedMiddle(name.to_string()));
    }
    let color = parser.env().color;
    parser.push_item(StackItem::new(ItemKind::Middle { delim, color }))
}

pub(super) fn big(
    parser: &mut Parser<'_, '_>,
    name: &str,
    class: TexClass,
    size: &str,
) -> ParseResult<()> {
    let delim = parser.get_delimiter(name, false)?;
    parser.push(big_delimiter(&delim, class, size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_break_is_not_a_standalone_delimiter() {
        assert_eq!(lookup("\\"), None);
        assert_eq!(delimiter_for("\\\\"), Some("\\"));
        assert_eq!(lookup("langle"), Some(Command::Delimiter("\u{27E8}")));
    }

    #[test]
    fn big_sizes_grow() {
        assert_eq!(lookup("Bigr"), Some(Command::Big(TexClass::Close, "1.623em")));
        assert_eq!(lookup("biggm"), Some(Command::Big(TexClass::Rel, "2.047em")));
    }
}
