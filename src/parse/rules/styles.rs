//! 字体、样式、颜色、尺寸，以及幻影、压扁、文本盒子等排版命令

use phf::phf_map;

use crate::ast::{Node, NodeKind, ParseResult, TexClass};
use crate::error::TexError;

use super::super::lexer::trim_spaces;
use super::super::stack::{Env, ItemKind, Letters, StackItem};
use super::super::util::text_node;
use super::super::Parser;
use super::Command;

const fn text_box(level: Option<&'static str>, variant: Option<&'static str>) -> Command {
    Command::HBox { level, variant }
}

static COMMANDS: phf::Map<&'static str, Command> = phf_map! {
    "mathrm" => Command::MathFont("normal"),
    "mathup" => Command::MathFont("normal"),
    "mathnormal" => Command::MathFont(""),
    "mathbf" => Command::MathFont("bold"),
    "mathbfup" => Command::MathFont("bold"),
    "mathit" => Command::MathFont("italic"),
    "mathbfit" => Command::MathFont("bold-italic"),
    "boldsymbol" => Command::MathFont("bold-italic"),
    "mathbb" => Command::MathFont("double-struck"),
    "Bbb" => Command::MathFont("double-struck"),
    "mathfrak" => Command::MathFont("fraktur"),
    "mathbffrak" => Command::MathFont("bold-fraktur"),
    "mathscr" => Command::MathFont("script"),
    "mathbfscr" => Command::MathFont("bold-script"),
    "mathcal" => Command::MathFont("script"),
    "mathbfcal" => Command::MathFont("bold-script"),
    "mathsf" => Command::MathFont("sans-serif"),
    "mathsfup" => Command::MathFont("sans-serif"),
    "mathbfsf" => Command::MathFont("bold-sans-serif"),
    "mathbfsfup" => Command::MathFont("bold-sans-serif"),
    "mathsfit" => Command::MathFont("sans-serif-italic"),
    "mathbfsfit" => Command::MathFont("sans-serif-bold-italic"),
    "mathtt" => Command::MathFont("monospace"),

    "rm" => Command::SetFont("normal"),
    "mit" => Command::SetFont("italic"),
    "oldstyle" => Command::SetFont("normal"),
    "cal" => Command::SetFont("script"),
    "it" => Command::SetFont("italic"),
    "bf" => Command::SetFont("bold"),
    "bbFont" => Command::SetFont("double-struck"),
    "scr" => Command::SetFont("script"),
    "frak" => Command::SetFont("fraktur"),
    "sf" => Command::SetFont("sans-serif"),
    "tt" => Command::SetFont("monospace"),

    "displaystyle" => Command::SetStyle(true, 0),
    "textstyle" => Command::SetStyle(false, 0),
    "scriptstyle" => Command::SetStyle(false, 1),
    "scriptscriptstyle" => Command::SetStyle(false, 2),

    "tiny" => Command::SetSize("0.5em"),
    "Tiny" => Command::SetSize("0.6em"),
    "scriptsize" => Command::SetSize("0.7em"),
    "small" => Command::SetSize("0.85em"),
    "normalsize" => Command::SetSize("1em"),
    "large" => Command::SetSize("1.2em"),
    "Large" => Command::SetSize("1.44em"),
    "LARGE" => Command::SetSize("1.73em"),
    "huge" => Command::SetSize("2.07em"),
    "Huge" => Command::SetSize("2.49em"),

    "color" => Command::Color,
    "textcolor" => Command::TextColor,

    "phantom" => Command::Phantom { vertical: false, horizontal: false },
    "vphantom" => Command::Phantom { vertical: true, horizontal: false },
    "hphantom" => Command::Phantom { vertical: false, horizontal: true },
    "smash" => Command::Smash,
    "rlap" => Command::Lap(false),
    "llap" => Command::Lap(true),

    "text" => text_box(None, None),
    "mbox" => text_box(Some("0"), None),
    "hbox" => text_box(Some("0"), None),
    "textrm" => text_box(None, Some("normal")),
    "textnormal" => text_box(None, Some("normal")),
    "textup" => text_box(None, Some("normal")),
    "textbf" => text_box(None, Some("bold")),
    "textit" => text_box(None, Some("italic")),
    "textsf" => text_box(None, Some("sans-serif")),
    "texttt" => text_box(None, Some("monospace")),
    "fbox" => Command::FBox,
};

pub(super) fn lookup(name: &str) -> Option<Command> {
    COMMANDS.get(name).copied()
}

/// `\mathbf{...}` 等：参数在指定字体下解析，连续字母合成一个标识符
pub(super) fn math_font(parser: &mut Parser<'_, '_>, name: &str, variant: &'static str) -> ParseResult<()> {
    let text = parser.cursor.get_argument(name)?;
    let env = Env {
        font: Some(variant).filter(|v| !v.is_empty()),
        letters: Some(Letters::Identifiers),
        ..parser.env()
    };
    let node = parser.parse_text(&text, env)?;
    parser.push(Node::atom(TexClass::Ord, vec![node]))
}

/// `\rm`、`\bf` 等：改变当前组内后续内容的字体
pub(super) fn set_font(parser: &mut Parser<'_, '_>, variant: &'static str) -> ParseResult<()> {
    parser.stack.update_env(|env| env.font = Some(variant));
    Ok(())
}

pub(super) fn set_style(parser: &mut Parser<'_, '_>, display: bool, level: u8) -> ParseResult<()> {
    parser.push_item(StackItem::new(ItemKind::Style {
        attributes: vec![
            ("displaystyle", display.to_string()),
            ("scriptlevel", level.to_string()),
        ],
    }))
}

pub(super) fn set_size(parser: &mut Parser<'_, '_>, size: &str) -> ParseResult<()> {
    parser.push_item(StackItem::new(ItemKind::Style {
        attributes: vec![("mathsize", size.to_string())],
    }))
}

/// 颜色参数：可选的颜色模型加颜色值；无法识别的值原样保留
fn read_color(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<String> {
    let model = parser.cursor.get_brackets(name)?.unwrap_or_default();
    let value = parser.cursor.get_argument(name)?;
    Ok(convert_color(model.trim(), trim_spaces(&value).as_str()))
}

fn convert_color(model: &str, value: &str) -> String {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let converted = match model {
        "rgb" if parts.len() == 3 => parts
            .iter()
            .map(|part| unit_channel(part))
            .collect::<Option<Vec<_>>>(),
        "RGB" if parts.len() == 3 => parts
            .iter()
            .map(|part| part.parse::<u8>().ok())
            .collect::<Option<Vec<_>>>(),
        "gray" if parts.len() == 1 => unit_channel(parts[0]).map(|g| vec![g, g, g]),
        _ => None,
    };
    match converted {
        Some(channels) => channels.iter().fold(String::from("#"), |mut hex, c| {
            hex.push_str(&format!("{c:02x}"));
            hex
        }),
        None => value.to_string(),
    }
}

/// 0 到 1 之间的小数换算为 0 到 255
fn unit_channel(text: &str) -> Option<u8> {
    let value: f64 = text.parse().ok()?;
    if !(0.0..=1.0).contains(&value) {
        return None;
    }
    Some((value * 255.0).round() as u8)
}

/// `\color{c}`：之后直到组结束的内容着色
pub(super) fn color(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    let color = read_color(parser, name)?;
    parser.stack.update_env(|env| env.color = Some(color.clone()));
    parser.push_item(StackItem::new(ItemKind::Style {
        attributes: vec![("mathcolor", color)],
    }))
}

/// `\textcolor{c}{x}`：只给参数着色
pub(super) fn text_color(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    let color = read_color(parser, name)?;
    let text = parser.cursor.get_argument(name)?;
    let env = Env {
        color: Some(color.clone()),
        ..parser.env()
    };
    let node = parser.parse_text(&text, env)?;
    let mut style = Node::new(NodeKind::Mstyle, vec![node]);
    style.set_attribute("mathcolor", color);
    parser.push(style)
}

pub(super) fn phantom(
    parser: &mut Parser<'_, '_>,
    name: &str,
    vertical: bool,
    horizontal: bool,
) -> ParseResult<()> {
    let mut node = Node::new(NodeKind::Mphantom, vec![parser.parse_arg(name)?]);
    if vertical || horizontal {
        node = Node::new(NodeKind::Mpadded, vec![node]);
        if horizontal {
            node.set_attribute("height", "0");
            node.set_attribute("depth", "0");
        }
        if vertical {
            node.set_attribute("width", "0");
        }
    }
    parser.push(Node::atom(TexClass::Ord, vec![node]))
}

/// `\smash[b|t]{x}`：去掉深度、高度或两者
pub(super) fn smash(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    let edge = trim_spaces(&parser.cursor.get_brackets(name)?.unwrap_or_default());
    let mut node = Node::new(NodeKind::Mpadded, vec![parser.parse_arg(name)?]);
    match edge.as_str() {
        "b" => node.set_attribute("depth", "0"),
        "t" => node.set_attribute("height", "0"),
        _ => {
            node.set_attribute("height", "0");
            node.set_attribute("depth", "0");
        }
    }
    parser.push(Node::atom(TexClass::Ord, vec![node]))
}

pub(super) fn lap(parser: &mut Parser<'_, '_>, name: &str, left: bool) -> ParseResult<()> {
    let mut node = Node::new(NodeKind::Mpadded, vec![parser.parse_arg(name)?]);
    node.set_attribute("width", "0");
    if left {
        node.set_attribute("lspace", "-1width");
    }
    parser.push(Node::atom(TexClass::Ord, vec![node]))
}

pub(super) fn hbox(
    parser: &mut Parser<'_, '_>,
    name: &str,
    level: Option<&str>,
    variant: Option<&str>,
) -> ParseResult<()> {
    let text = parser.cursor.get_argument(name)?;
    let nodes = internal_math(parser, &text, level, variant)?;
    parser.push_all(nodes)
}

pub(super) fn fbox(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    let text = parser.cursor.get_argument(name)?;
    let nodes = internal_math(parser, &text, None, None)?;
    let mut node = Node::new(NodeKind::Menclose, nodes);
    node.set_attribute("notation", "box");
    parser.push(node)
}

/// 文本中的数学片段的结束标记
#[derive(Clone, Copy, PartialEq, Eq)]
enum MathEnd {
    Dollar,
    Paren,
    /// `\ref{...}`/`\eqref{...}` 到右花括号为止
    Brace,
}

/// 文本盒子的内容：普通文本成为 mtext，`$...$`、`\(...\)` 与引用按数学解析
pub(crate) fn internal_math(
    parser: &mut Parser<'_, '_>,
    text: &str,
    level: Option<&str>,
    variant: Option<&str>,
) -> ParseResult<Vec<Node>> {
    let variant = variant.or(parser.env().font);
    let mut chars: Vec<char> = text.chars().collect();
    let mut nodes = Vec::new();
    let mut pending: Option<MathEnd> = None;
    let mut braces = 0usize;
    let mut start = 0usize;
    let mut i = 0usize;
    let slice = |chars: &[char], from: usize, to: usize| -> String { chars[from..to].iter().collect() };

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '$' => match pending {
                Some(MathEnd::Dollar) if braces == 0 => {
                    let math = slice(&chars, start, i - 1);
                    nodes.push(inner_math(parser, &math, None)?);
                    pending = None;
                    start = i;
                }
                None => {
                    if start + 1 < i {
                        nodes.push(internal_text(&slice(&chars, start, i - 1), variant));
                    }
                    pending = Some(MathEnd::Dollar);
                    start = i;
                }
                _ => {}
            },
            '{' if pending.is_some() => braces += 1,
            '}' => {
                if pending == Some(MathEnd::Brace) && braces == 0 {
                    let math = slice(&chars, start, i);
                    nodes.push(inner_math(parser, &math, variant)?);
                    pending = None;
                    start = i;
                } else if pending.is_some() && braces > 0 {
                    braces -= 1;
                }
            }
            '\\' => {
                let rest = slice(&chars, i, chars.len());
                let reference = ["ref", "eqref"].iter().find_map(|cmd| {
                    let after = rest.strip_prefix(cmd)?;
                    let trimmed = after.trim_start();
                    trimmed
                        .starts_with('{')
                        .then(|| cmd.chars().count() + (after.chars().count() - trimmed.chars().count()) + 1)
                });
                if let (None, Some(length)) = (pending, reference) {
                    if start + 1 < i {
                        nodes.push(internal_text(&slice(&chars, start, i - 1), variant));
                    }
                    pending = Some(MathEnd::Brace);
                    start = i - 1;
                    i += length;
                    continue;
                }
                let Some(&next) = chars.get(i) else { continue };
                i += 1;
                match next {
                    '(' if pending.is_none() => {
                        if start + 2 < i {
                            nodes.push(internal_text(&slice(&chars, start, i - 2), variant));
                        }
                        pending = Some(MathEnd::Paren);
                        start = i;
                    }
                    ')' if pending == Some(MathEnd::Paren) && braces == 0 => {
                        let math = slice(&chars, start, i - 2);
                        nodes.push(inner_math(parser, &math, None)?);
                        pending = None;
                        start = i;
                    }
                    '$' | '{' | '}' | '\\' if pending.is_none() => {
                        // 转义字符：去掉反斜杠，字符本身作为文本
                        i -= 1;
                        chars.remove(i - 1);
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
    if pending.is_some() {
        return Err(TexError::MathNotTerminated);
    }
    if start < chars.len() {
        nodes.push(internal_text(&slice(&chars, start, chars.len()), variant));
    }
    if let Some(level) = level {
        let mut style = Node::new(NodeKind::Mstyle, nodes);
        style.set_attribute("displaystyle", "false");
        style.set_attribute("scriptlevel", level);
        return Ok(vec![style]);
    }
    if nodes.len() > 1 {
        return Ok(vec![Node::row(nodes)]);
    }
    Ok(nodes)
}

/// 文本中的数学片段在全新的状态下解析，包成普通原子
fn inner_math(parser: &mut Parser<'_, '_>, text: &str, variant: Option<&str>) -> ParseResult<Node> {
    let node = parser.parse_text(text, Env::default())?;
    let mut atom = Node::atom(TexClass::Ord, vec![node]);
    if let Some(variant) = variant {
        atom.set_attribute("mathvariant", variant);
    }
    Ok(atom)
}

/// 首尾空白各替换为一个不换行空格，避免渲染时被吞掉
fn internal_text(text: &str, variant: Option<&str>) -> Node {
    let trimmed_start = text.trim_start();
    let mut out = String::with_capacity(text.len() + 4);
    if trimmed_start.len() != text.len() {
        out.push('\u{A0}');
    }
    let core = trimmed_start.trim_end();
    out.push_str(core);
    if core.len() != trimmed_start.len() {
        out.push('\u{A0}');
    }
    text_node(&out, variant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::testing::inline;
    use pretty_assertions::assert_eq;

    #[test]
    fn color_models() {
        assert_eq!(convert_color("", "red"), "red");
        assert_eq!(convert_color("rgb", "1,0.5,0"), "#ff8000");
        assert_eq!(convert_color("RGB", "0, 128, 255"), "#0080ff");
        assert_eq!(convert_color("gray", "0"), "#000000");
        assert_eq!(convert_color("rgb", "2,0,0"), "2,0,0");
    }

    #[test]
    fn math_font_joins_letters() {
        assert_eq!(
            inline("\\mathrm{dx}").unwrap(),
            "<math><mrow data-texclass=\"ORD\"><mi mathvariant=\"normal\">dx</mi></mrow></math>"
        );
    }

    #[test]
    fn text_keeps_edge_spaces() {
        assert_eq!(
            inline("\\text{ if }").unwrap(),
            "<math><mtext>\u{A0}if\u{A0}</mtext></math>"
        );
    }

    #[test]
    fn text_with_inline_math() {
        assert_eq!(
            inline("\\text{a $x$}").unwrap(),
            "<math><mrow><mtext>a\u{A0}</mtext><mrow data-texclass=\"ORD\"><mi>x</mi></mrow></mrow></math>"
        );
        assert_eq!(inline("\\text{a $x}"), Err(TexError::MathNotTerminated));
    }

    #[test]
    fn escaped_dollar_is_text() {
        assert_eq!(inline("\\text{\\$5}").unwrap(), "<math><mtext>$5</mtext></math>");
    }

    #[test]
    fn mbox_resets_script_level() {
        assert_eq!(
            inline("\\mbox{a}").unwrap(),
            "<math><mstyle displaystyle=\"false\" scriptlevel=\"0\"><mtext>a</mtext></mstyle></math>"
        );
    }

    #[test]
    fn color_applies_to_rest_of_group() {
        assert_eq!(
            inline("{\\color{red} x}y").unwrap(),
            "<math><mrow data-texclass=\"ORD\"><mstyle mathcolor=\"red\"><mi>x</mi></mstyle></mrow><mi>y</mi></math>"
        );
    }
}
