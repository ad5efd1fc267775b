//! 函数名：`\sin` 一类的函数、`\lim` 一类带上下限的运算符和 `\operatorname`

use phf::phf_map;

use crate::ast::{Node, NodeKind, ParseResult, TexClass};

use super::super::lexer::trim_spaces;
use super::super::stack::{Env, ItemKind, Letters, StackItem};
use super::super::util::set_movablelimits;
use super::super::Parser;
use super::Command;

static COMMANDS: phf::Map<&'static str, Command> = phf_map! {
    "arcsin" => Command::NamedFn("arcsin"),
    "arccos" => Command::NamedFn("arccos"),
    "arctan" => Command::NamedFn("arctan"),
    "arg" => Command::NamedFn("arg"),
    "cos" => Command::NamedFn("cos"),
    "cosh" => Command::NamedFn("cosh"),
    "cot" => Command::NamedFn("cot"),
    "coth" => Command::NamedFn("coth"),
    "csc" => Command::NamedFn("csc"),
    "deg" => Command::NamedFn("deg"),
    "dim" => Command::NamedFn("dim"),
    "exp" => Command::NamedFn("exp"),
    "hom" => Command::NamedFn("hom"),
    "ker" => Command::NamedFn("ker"),
    "lg" => Command::NamedFn("lg"),
    "ln" => Command::NamedFn("ln"),
    "log" => Command::NamedFn("log"),
    "sec" => Command::NamedFn("sec"),
    "sin" => Command::NamedFn("sin"),
    "sinh" => Command::NamedFn("sinh"),
    "tan" => Command::NamedFn("tan"),
    "tanh" => Command::NamedFn("tanh"),

    "det" => Command::NamedOp("det"),
    "gcd" => Command::NamedOp("gcd"),
    "inf" => Command::NamedOp("inf"),
    "lim" => Command::NamedOp("lim"),
    "liminf" => Command::NamedOp("lim\u{2006}inf"),
    "limsup" => Command::NamedOp("lim\u{2006}sup"),
    "injlim" => Command::NamedOp("inj\u{2006}lim"),
    "projlim" => Command::NamedOp("proj\u{2006}lim"),
    "max" => Command::NamedOp("max"),
    "min" => Command::NamedOp("min"),
    "Pr" => Command::NamedOp("Pr"),
    "sup" => Command::NamedOp("sup"),

    "operatorname" => Command::OperatorName,
};

pub(super) fn lookup(name: &str) -> Option<Command> {
    COMMANDS.get(name).copied()
}

/// 普通函数名：直立的标识符，后面按需要插入函数应用符
pub(super) fn named_fn(parser: &mut Parser<'_, '_>, text: &str) -> ParseResult<()> {
    let mut mi = Node::token(NodeKind::Mi, text);
    mi.texclass = Some(TexClass::Op);
    parser.push_item(StackItem::with_nodes(ItemKind::Fn, vec![mi]))
}

/// 带上下限的函数名：显示模式下上下限放在正下方与正上方
pub(super) fn named_op(parser: &mut Parser<'_, '_>, text: &str) -> ParseResult<()> {
    let mut mo = Node::token(NodeKind::Mo, text);
    mo.texclass = Some(TexClass::Op);
    mo.set_flag("movesupsub", true);
    set_movablelimits(&mut mo, true);
    parser.push(mo)
}

/// `\operatorname{name}`；带星号时上下限可移动
pub(super) fn operator_name(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    let star = parser.cursor.get_star();
    let text = trim_spaces(&parser.cursor.get_argument(name)?);
    let env = Env {
        font: Some("normal"),
        letters: Some(Letters::OperatorName),
        ..parser.env()
    };
    let node = parser.parse_text(&text, env)?;
    let mut op = if node.kind == NodeKind::Mi {
        node
    } else {
        Node::atom(TexClass::Op, vec![node])
    };
    op.texclass = Some(TexClass::Op);
    op.set_flag("movesupsub", star);
    op.set_flag("movablelimits", true);
    if !star {
        // 不带星号时紧随其后的 `\limits` 被忽略
        let position = parser.cursor.position();
        if parser.cursor.next_non_space() == Some('\\') {
            parser.cursor.advance(1);
            if parser.cursor.next_control_sequence() != "limits" {
                parser.cursor.set_position(position);
            }
        } else {
            parser.cursor.set_position(position);
        }
    }
    parser.push_item(StackItem::with_nodes(ItemKind::Fn, vec![op]))
}

#[cfg(test)]
mod tests {
    use crate::parse::testing::inline;
    use pretty_assertions::assert_eq;

    #[test]
    fn function_application_is_inserted() {
        assert_eq!(
            inline("\\sin x").unwrap(),
            "<math><mi>sin</mi><mo>\u{2061}</mo><mi>x</mi></math>"
        );
    }

    #[test]
    fn no_application_before_relations() {
        assert_eq!(inline("\\sin=").unwrap(), "<math><mi>sin</mi><mo>=</mo></math>");
    }

    #[test]
    fn lim_takes_limits_under() {
        assert_eq!(
            inline("\\lim_{n}").unwrap(),
            "<math><munder><mo movablelimits=\"true\">lim</mo><mi>n</mi></munder></math>"
        );
    }

    #[test]
    fn operatorname_joins_letters() {
        assert_eq!(
            inline("\\operatorname{sn} x").unwrap(),
            "<math><mi mathvariant=\"normal\">sn</mi><mo>\u{2061}</mo><mi>x</mi></math>"
        );
    }
}
