//! 空白与位移：固定宽度的空白、`\hskip` 一族、`\raise`/`\lower`、`\moveleft`/`\moveright`

use phf::phf_map;

use crate::ast::{Node, NodeKind, ParseResult};

use super::super::lexer::{em, match_dimen};
use super::super::stack::{ItemKind, Shift, StackItem};
use super::super::util::text_node;
use super::super::Parser;
use super::Command;

static COMMANDS: phf::Map<&'static str, Command> = phf_map! {
    "," => Command::Spacer("0.167em"),
    ":" => Command::Spacer("0.222em"),
    ">" => Command::Spacer("0.222em"),
    ";" => Command::Spacer("0.278em"),
    "!" => Command::Spacer("-0.167em"),
    "thinspace" => Command::Spacer("0.167em"),
    "medspace" => Command::Spacer("0.222em"),
    "thickspace" => Command::Spacer("0.278em"),
    "negthinspace" => Command::Spacer("-0.167em"),
    "negmedspace" => Command::Spacer("-0.222em"),
    "negthickspace" => Command::Spacer("-0.278em"),
    "enspace" => Command::Spacer("0.5em"),
    "quad" => Command::Spacer("1em"),
    "qquad" => Command::Spacer("2em"),
    "hskip" => Command::Hskip,
    "hspace" => Command::HSpace,
    "kern" => Command::Hskip,
    "mskip" => Command::Hskip,
    "mspace" => Command::Hskip,
    "mkern" => Command::Hskip,
    "raise" => Command::RaiseLower(true),
    "lower" => Command::RaiseLower(false),
    "moveleft" => Command::MoveLeftRight(true),
    "moveright" => Command::MoveLeftRight(false),
    " " => Command::Tilde,
    "nobreakspace" => Command::Tilde,
};

pub(super) fn lookup(name: &str) -> Option<Command> {
    COMMANDS.get(name).copied()
}

pub(super) fn spacer(parser: &mut Parser<'_, '_>, width: &str) -> ParseResult<()> {
    let mut space = Node::new(NodeKind::Mspace, Vec::new());
    space.set_attribute("width", width);
    let mut style = Node::new(NodeKind::Mstyle, vec![space]);
    style.set_attribute("scriptlevel", "0");
    parser.push(style)
}

/// 数学单位 mu 在输出中换算为 em
fn normalize_mu(dimen: String) -> String {
    match match_dimen(&dimen, false) {
        Some((value, unit, _)) if unit == "mu" => value
            .parse::<f64>()
            .map(|v| em(v / 18.0))
            .unwrap_or(dimen),
        _ => dimen,
    }
}

pub(super) fn hskip(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    let width = normalize_mu(parser.cursor.get_dimen(name)?);
    let mut space = Node::new(NodeKind::Mspace, Vec::new());
    space.set_attribute("width", width);
    parser.push(space)
}

/// `\hspace*{...}` 的星号不影响结果
pub(super) fn hspace(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    parser.cursor.get_star();
    hskip(parser, name)
}

pub(super) fn raise_lower(parser: &mut Parser<'_, '_>, name: &str, raise: bool) -> ParseResult<()> {
    let dimen = parser.cursor.get_dimen(name)?;
    let (raise, amount) = match dimen.strip_prefix('-') {
        Some(stripped) => (!raise, stripped.to_string()),
        None => (raise, dimen),
    };
    let shift = if raise {
        Shift::Vertical {
            height: format!("+{amount}"),
            depth: format!("-{amount}"),
        }
    } else {
        Shift::Vertical {
            height: format!("-{amount}"),
            depth: format!("+{amount}"),
        }
    };
    parser.push_item(StackItem::new(ItemKind::Position {
        name: name.to_string(),
        shift,
    }))
}

pub(super) fn move_left_right(parser: &mut Parser<'_, '_>, name: &str, left: bool) -> ParseResult<()> {
    let mut width = parser.cursor.get_dimen(name)?;
    let mut negated = match width.strip_prefix('-') {
        Some(stripped) => stripped.to_string(),
        None => format!("-{width}"),
    };
    if left {
        std::mem::swap(&mut width, &mut negated);
    }
    let space = |width: String| {
        let mut node = Node::new(NodeKind::Mspace, Vec::new());
        node.set_attribute("width", width);
        node
    };
    parser.push_item(StackItem::new(ItemKind::Position {
        name: name.to_string(),
        shift: Shift::Horizontal {
            left: space(width),
            right: space(negated),
        },
    }))
}

pub(super) fn tilde(parser: &mut Parser<'_, '_>) -> ParseResult<()> {
    parser.push(text_node("\u{A0}", None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TexError;
    use crate::parse::testing::inline;
    use pretty_assertions::assert_eq;

    #[test]
    fn thin_space_is_a_styled_mspace() {
        assert_eq!(
            inline("a\\,b").unwrap(),
            "<math><mi>a</mi><mstyle scriptlevel=\"0\"><mspace width=\"0.167em\"></mspace></mstyle><mi>b</mi></math>"
        );
    }

    #[test]
    fn math_units_become_em() {
        assert_eq!(normalize_mu("18mu".into()), "1em");
        assert_eq!(normalize_mu("2pt".into()), "2pt");
        assert!(inline("\\hspace{1em}").unwrap().contains("width=\"1em\""));
    }

    #[test]
    fn raise_needs_a_box() {
        assert_eq!(
            inline("{\\raise 2pt}"),
            Err(TexError::MissingBoxFor("\\raise".into()))
        );
        let out = inline("\\raise 2pt x").unwrap();
        assert!(out.contains("voffset=\"+2pt\""));
    }
}
