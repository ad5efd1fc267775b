//! 上下标、撇号与 `\limits`/`\nolimits`

use phf::phf_map;

use crate::ast::{Node, NodeKind, ParseResult, TexClass, OVER, SUB, SUP, UNDER};
use crate::error::TexError;

use super::super::stack::{ItemKind, StackItem};
use super::super::util::set_movablelimits;
use super::super::Parser;
use super::Command;

static COMMANDS: phf::Map<&'static str, Command> = phf_map! {
    "limits" => Command::Limits(true),
    "nolimits" => Command::Limits(false),
    "sp" => Command::Superscript,
    "sb" => Command::Subscript,
};

pub(super) fn lookup(name: &str) -> Option<Command> {
    COMMANDS.get(name).copied()
}

/// 紧跟在 `^`/`_` 后的数字只取第一位：在它后面插入一个空格
fn protect_digit(parser: &mut Parser<'_, '_>) {
    if !matches!(parser.cursor.next_non_space(), Some(c) if c.is_ascii_digit()) {
        return;
    }
    let rest = parser.cursor.rest();
    let mut chars = rest.chars();
    if let Some(first) = chars.next() {
        let protected = format!("{first} {}", chars.as_str());
        parser.cursor.reset(&protected);
    }
}

/// 取出上下标的基底；前一项是撇号时一并取出撇号
fn take_base(parser: &mut Parser<'_, '_>) -> (Node, Option<Node>) {
    let prime = matches!(
        parser.stack.top().map(|item| &item.kind),
        Some(ItemKind::Prime)
    );
    if prime {
        if let Some(mut item) = parser.stack.pop() {
            let primes = item.nodes.pop();
            let base = item.nodes.pop().unwrap_or_else(|| Node::token(NodeKind::Mi, ""));
            return (base, primes);
        }
    }
    let base = parser
        .stack
        .prev()
        .unwrap_or_else(|| Node::token(NodeKind::Mi, ""));
    (base, None)
}

/// 上下限可移动的基底：标识符先提升为运算符
fn promote_identifier(mut base: Node) -> Node {
    if base.kind == NodeKind::Mi {
        base.kind = NodeKind::Mo;
        base.texclass = Some(TexClass::Op);
    }
    base
}

pub(crate) fn superscript(parser: &mut Parser<'_, '_>) -> ParseResult<()> {
    protect_digit(parser);
    let (mut base, primes) = take_base(parser);
    let movesupsub = base.flag("movesupsub");
    let double = (base.kind == NodeKind::Msubsup && base.has_child(SUP))
        || (base.kind == NodeKind::Munderover
            && base.has_child(OVER)
            && !base.flag("subsupOK"));
    if double {
        return Err(TexError::DoubleExponent);
    }
    let mut position = if base.kind == NodeKind::Msubsup { SUP } else { OVER };
    if base.kind != NodeKind::Msubsup {
        if movesupsub {
            if base.kind != NodeKind::Munderover || base.has_child(OVER) {
                base = Node::with_slots(NodeKind::Munderover, promote_identifier(base), 3);
                base.set_flag("movesupsub", true);
            }
            position = OVER;
        } else {
            base = Node::with_slots(NodeKind::Msubsup, base, 3);
            position = SUP;
        }
    }
    let movesupsub = match base.property("movesupsub") {
        Some(_) => Some(base.flag("movesupsub")),
        None => None,
    };
    parser.push_item(StackItem::with_nodes(
        ItemKind::SubSup {
            position,
            primes,
            movesupsub,
        },
        vec![base],
    ))
}

pub(crate) fn subscript(parser: &mut Parser<'_, '_>) -> ParseResult<()> {
    protect_digit(parser);
    let (mut base, primes) = take_base(parser);
    let movesupsub = base.flag("movesupsub");
    let double = (base.kind == NodeKind::Msubsup && base.has_child(SUB))
        || (base.kind == NodeKind::Munderover
            && base.has_child(UNDER)
            && !base.flag("subsupOK"));
    if double {
        return Err(TexError::DoubleSubscripts);
    }
    let mut position = if base.kind == NodeKind::Msubsup { SUB } else { UNDER };
    if base.kind != NodeKind::Msubsup {
        if movesupsub {
            if base.kind != NodeKind::Munderover || base.has_child(UNDER) {
                base = Node::with_slots(NodeKind::Munderover, promote_identifier(base), 3);
                base.set_flag("movesupsub", true);
            }
            position = UNDER;
        } else {
            base = Node::with_slots(NodeKind::Msubsup, base, 3);
            position = SUB;
        }
    }
    let movesupsub = match base.property("movesupsub") {
        Some(_) => Some(base.flag("movesupsub")),
        None => None,
    };
    parser.push_item(StackItem::with_nodes(
        ItemKind::SubSup {
            position,
            primes,
            movesupsub,
        },
        vec![base],
    ))
}

/// 连续的撇号合成一个记号：′ ″ ‴ ⁗
pub(crate) fn prime(parser: &mut Parser<'_, '_>, _ch: char) -> ParseResult<()> {
    let base = parser
        .stack
        .prev()
        .unwrap_or_else(|| Node::token(NodeKind::Mi, ""));
    if base.kind == NodeKind::Msubsup && base.has_child(SUP) {
        return Err(TexError::DoubleExponentPrime);
    }
    let mut count = 1usize;
    while matches!(parser.cursor.next_non_space(), Some('\'' | '\u{2019}')) {
        parser.cursor.advance(1);
        count += 1;
    }
    let text = match count {
        1 => "\u{2032}".to_string(),
        2 => "\u{2033}".to_string(),
        3 => "\u{2034}".to_string(),
        4 => "\u{2057}".to_string(),
        n => "\u{2032}".repeat(n),
    };
    let mut primes = Node::token(NodeKind::Mo, text);
    primes.set_flag("variantForm", true);
    parser.push_item(StackItem::with_nodes(ItemKind::Prime, vec![base, primes]))
}

/// `\limits`/`\nolimits`：在上下限结构与上下标结构之间切换
pub(super) fn limits(parser: &mut Parser<'_, '_>, name: &str, limits: bool) -> ParseResult<()> {
    let Some(op) = parser.stack.prev_mut() else {
        return Err(TexError::MisplacedLimits(name.to_string()));
    };
    if op.effective_class() != TexClass::Op && !op.has_property("movesupsub") {
        return Err(TexError::MisplacedLimits(name.to_string()));
    }
    match (op.kind, limits) {
        (NodeKind::Munderover, false) => op.kind = NodeKind::Msubsup,
        (NodeKind::Msubsup, true) => op.kind = NodeKind::Munderover,
        _ => {}
    }
    op.set_flag("movesupsub", limits);
    set_movablelimits(op, false);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::error::TexError;
    use crate::parse::testing::inline;
    use pretty_assertions::assert_eq;

    #[test]
    fn sub_and_sup_share_one_node() {
        assert_eq!(
            inline("x_1^2").unwrap(),
            "<math><msubsup><mi>x</mi><mn>1</mn><mn>2</mn></msubsup></math>"
        );
    }

    #[test]
    fn only_the_first_digit_is_scripted() {
        assert_eq!(
            inline("x^23").unwrap(),
            "<math><msup><mi>x</mi><mn>2</mn></msup><mn>3</mn></math>"
        );
    }

    #[test]
    fn double_scripts_are_rejected() {
        assert_eq!(inline("x^1^2"), Err(TexError::DoubleExponent));
        assert_eq!(inline("x_1_2"), Err(TexError::DoubleSubscripts));
        assert_eq!(inline("x^1'"), Err(TexError::DoubleExponentPrime));
    }

    #[test]
    fn primes_combine() {
        assert_eq!(
            inline("f''").unwrap(),
            "<math><msup><mi>f</mi><mo>\u{2033}</mo></msup></math>"
        );
    }

    #[test]
    fn limits_require_an_operator() {
        assert_eq!(inline("x\\limits"), Err(TexError::MisplacedLimits("\\limits".into())));
        assert!(inline("\\sum\\limits_{i}").unwrap().contains("<munder>"));
        assert!(inline("\\sum\\nolimits_{i}").unwrap().contains("<msub>"));
    }
}
