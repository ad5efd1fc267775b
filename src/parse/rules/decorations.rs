//! 装饰：重音、上下括线、`\overset`/`\underset` 与可伸缩箭头

use phf::phf_map;

use crate::ast::{Node, NodeKind, ParseResult, TexClass, OVER, UNDER};
use crate::opdict;

use super::super::lexer::em;
use super::super::util::set_movablelimits;
use super::super::Parser;
use super::Command;

const fn under(mo: &'static str) -> Command {
    Command::UnderOver {
        mo,
        under: true,
        stack: false,
    }
}

const fn over(mo: &'static str) -> Command {
    Command::UnderOver {
        mo,
        under: false,
        stack: false,
    }
}

static COMMANDS: phf::Map<&'static str, Command> = phf_map! {
    "acute" => Command::Accent("\u{B4}", false),
    "grave" => Command::Accent("\u{60}", false),
    "ddot" => Command::Accent("\u{A8}", false),
    "tilde" => Command::Accent("~", false),
    "bar" => Command::Accent("\u{AF}", false),
    "breve" => Command::Accent("\u{2D8}", false),
    "check" => Command::Accent("\u{2C7}", false),
    "hat" => Command::Accent("^", false),
    "vec" => Command::Accent("\u{2192}", false),
    "dot" => Command::Accent("\u{2D9}", false),
    "mathring" => Command::Accent("\u{2DA}", false),
    "dddot" => Command::Accent("\u{20DB}", false),
    "ddddot" => Command::Accent("\u{20DC}", false),
    "widetilde" => Command::Accent("~", true),
    "widehat" => Command::Accent("^", true),

    "overline" => over("\u{2015}"),
    "underline" => under("\u{2015}"),
    "overparen" => over("\u{23DC}"),
    "underparen" => under("\u{23DD}"),
    "overrightarrow" => over("\u{2192}"),
    "underrightarrow" => under("\u{2192}"),
    "overleftarrow" => over("\u{2190}"),
    "underleftarrow" => under("\u{2190}"),
    "overleftrightarrow" => over("\u{2194}"),
    "underleftrightarrow" => under("\u{2194}"),
    "overbrace" => Command::UnderOver { mo: "\u{23DE}", under: false, stack: true },
    "underbrace" => Command::UnderOver { mo: "\u{23DF}", under: true, stack: true },

    "overset" => Command::Overset,
    "underset" => Command::Underset,

    "xrightarrow" => Command::XArrow("\u{2192}", 5, 10),
    "xleftarrow" => Command::XArrow("\u{2190}", 10, 5),
    "xleftrightarrow" => Command::XArrow("\u{2194}", 10, 10),
    "xRightarrow" => Command::XArrow("\u{21D2}", 5, 10),
    "xLeftarrow" => Command::XArrow("\u{21D0}", 10, 5),
    "xLeftrightarrow" => Command::XArrow("\u{21D4}", 10, 10),
    "xmapsto" => Command::XArrow("\u{21A6}", 10, 10),
    "xhookrightarrow" => Command::XArrow("\u{21AA}", 10, 10),
    "xhookleftarrow" => Command::XArrow("\u{21A9}", 10, 10),
};

pub(super) fn lookup(name: &str) -> Option<Command> {
    COMMANDS.get(name).copied()
}

/// 作用对象本身是带可移动上下限的运算符时，取消可移动
fn fix_movable_limits(base: &mut Node) {
    let movable = base.flag("movablelimits")
        || base
            .core_mo()
            .map_or(false, |mo| opdict::has_movable_limits(mo.text()));
    if movable {
        set_movablelimits(base, false);
    }
}

/// 重音：`munderover` 的上方放重音符，整体是一个普通原子
pub(super) fn accent(parser: &mut Parser<'_, '_>, name: &str, mo: &str, stretchy: bool) -> ParseResult<()> {
    let mut base = parser.parse_arg(name)?;
    let mut accent = Node::token(NodeKind::Mo, mo);
    if let Some(font) = parser.env().font {
        accent.set_attribute("mathvariant", font);
    }
    accent.set_attribute("accent", "true");
    accent.set_attribute("stretchy", if stretchy { "true" } else { "false" });
    accent.set_flag("mathaccent", true);
    let core_is_mo = base.core_mo().is_some();
    if core_is_mo || base.flag("movablelimits") {
        set_movablelimits(&mut base, false);
    }
    let mut node = Node::with_slots(NodeKind::Munderover, base, 3);
    node.set_child(OVER, accent);
    parser.push(Node::atom(TexClass::Ord, vec![node]))
}

/// 上下括线与括号：`\overline`、`\underbrace` 等
pub(super) fn under_over(
    parser: &mut Parser<'_, '_>,
    name: &str,
    mo: &str,
    under: bool,
    stack: bool,
) -> ParseResult<()> {
    let mut base = parser.parse_arg(name)?;
    fix_movable_limits(&mut base);
    let mut node = Node::with_slots(NodeKind::Munderover, base, 3);
    let mut line = Node::token(NodeKind::Mo, mo);
    line.set_attribute("stretchy", "true");
    line.set_attribute("accent", if stack { "false" } else { "true" });
    node.set_child(if under { UNDER } else { OVER }, line);
    let mut node = if stack {
        let mut atom = Node::atom(TexClass::Op, vec![node]);
        atom.set_flag("movesupsub", true);
        atom
    } else {
        node
    };
    node.set_flag("subsupOK", true);
    parser.push(node)
}

/// `\overset{上}{基}`、`\underset{下}{基}`
pub(super) fn overset(parser: &mut Parser<'_, '_>, name: &str, under: bool) -> ParseResult<()> {
    let mut script = parser.parse_arg(name)?;
    let mut base = parser.parse_arg(name)?;
    fix_movable_limits(&mut base);
    if script.kind == NodeKind::Mo {
        script.set_attribute("accent", "false");
    }
    let kind = if under { NodeKind::Munder } else { NodeKind::Mover };
    parser.push(Node::new(kind, vec![base, script]))
}

/// 可伸缩箭头，上方为必选参数，下方为可选参数
pub(super) fn xarrow(
    parser: &mut Parser<'_, '_>,
    name: &str,
    mo: &str,
    left: u8,
    right: u8,
) -> ParseResult<()> {
    let width = format!("+{}", em(f64::from(left + right) / 18.0));
    let lspace = em(f64::from(left) / 18.0);
    let bottom = parser.cursor.get_brackets(name)?;
    let top = parser.parse_arg(name)?;

    let mut arrow = Node::token(NodeKind::Mo, mo);
    arrow.set_attribute("stretchy", "true");
    arrow.texclass = Some(TexClass::Rel);
    let mut arrow = Node::new(NodeKind::Mstyle, vec![arrow]);
    arrow.set_attribute("scriptlevel", "0");
    let mut node = Node::with_slots(NodeKind::Munderover, arrow, 3);

    let mut strut = Node::new(NodeKind::Mspace, Vec::new());
    strut.set_attribute("depth", ".25em");
    let mut upper = Node::new(NodeKind::Mpadded, vec![top, strut]);
    upper.set_attribute("width", width.clone());
    upper.set_attribute("lspace", lspace.clone());
    upper.set_attribute("voffset", "-.2em");
    upper.set_attribute("height", "-.2em");
    node.set_child(OVER, upper);

    if let Some(bottom) = bottom.filter(|b| !b.is_empty()) {
        let env = parser.env();
        let lower = parser.parse_text(&bottom, env)?;
        let mut strut = Node::new(NodeKind::Mspace, Vec::new());
        strut.set_attribute("height", ".75em");
        let mut lower = Node::new(NodeKind::Mpadded, vec![lower, strut]);
        lower.set_attribute("width", width);
        lower.set_attribute("lspace", lspace);
        lower.set_attribute("voffset", ".15em");
        lower.set_attribute("depth", "-.15em");
        node.set_child(UNDER, lower);
    }
    node.set_flag("subsupOK", true);
    parser.push(node)
}

#[cfg(test)]
mod tests {
    use crate::parse::testing::inline;
    use pretty_assertions::assert_eq;

    #[test]
    fn accent_sits_over_the_base() {
        assert_eq!(
            inline("\\hat{x}").unwrap(),
            "<math><mrow data-texclass=\"ORD\"><mover><mi>x</mi><mo accent=\"true\" stretchy=\"false\">^</mo></mover></mrow></math>"
        );
    }

    #[test]
    fn underbrace_takes_limits() {
        let out = inline("\\underbrace{x+y}_{n}").unwrap();
        assert!(out.starts_with("<math><munder><mrow data-texclass=\"OP\"><munder>"));
    }

    #[test]
    fn overset_builds_mover() {
        assert_eq!(
            inline("\\overset{a}{b}").unwrap(),
            "<math><mover><mi>b</mi><mi>a</mi></mover></math>"
        );
    }

    #[test]
    fn extensible_arrow_pads_its_label() {
        let out = inline("\\xrightarrow[b]{a}").unwrap();
        assert!(out.contains("width=\"+0.833em\""));
        assert!(out.contains("lspace=\"0.278em\""));
        assert!(out.starts_with("<math><munderover>"));
    }
}
