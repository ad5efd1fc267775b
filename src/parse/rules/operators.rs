//! 显式类别的原子（`\mathrel` 等）、`\not` 与 `\dots`

use once_cell::sync::Lazy;
use phf::phf_map;
use regex::Regex;

use crate::ast::{Node, NodeKind, ParseResult, TexClass};

use super::super::stack::{ItemKind, StackItem};
use super::super::Parser;
use super::{Command, OpStyle};

/// `\mathop{\rm name}` 的简写形式直接生成直立标识符
static RM_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\\rm\s+([a-zA-Z0-9 ]+)$").expect("内置正则一定合法"));

static COMMANDS: phf::Map<&'static str, Command> = phf_map! {
    "mathord" => Command::Atom(TexClass::Ord),
    "mathop" => Command::Atom(TexClass::Op),
    "mathopen" => Command::Atom(TexClass::Open),
    "mathclose" => Command::Atom(TexClass::Close),
    "mathbin" => Command::Atom(TexClass::Bin),
    "mathrel" => Command::Atom(TexClass::Rel),
    "mathpunct" => Command::Atom(TexClass::Punct),
    "mathinner" => Command::Atom(TexClass::Inner),
    "not" => Command::Not,
    "dots" => Command::Dots,
    "dotsb" => Command::Operator("\u{22EF}", OpStyle::Plain),
    "dotsm" => Command::Operator("\u{22EF}", OpStyle::Plain),
    "dotsi" => Command::Operator("\u{22EF}", OpStyle::Plain),
    "dotsc" => Command::Operator("\u{2026}", OpStyle::Plain),
    "dotso" => Command::Operator("\u{2026}", OpStyle::Plain),
};

/// `\not` 作用在这些符号上时换成现成的否定字符
static NEGATIONS: phf::Map<&'static str, &'static str> = phf_map! {
    "\u{2190}" => "\u{219A}",
    "\u{2192}" => "\u{219B}",
    "\u{2194}" => "\u{21AE}",
    "\u{21D0}" => "\u{21CD}",
    "\u{21D2}" => "\u{21CF}",
    "\u{21D4}" => "\u{21CE}",
    "\u{2208}" => "\u{2209}",
    "\u{220B}" => "\u{220C}",
    "\u{2223}" => "\u{2224}",
    "\u{2225}" => "\u{2226}",
    "\u{223C}" => "\u{2241}",
    "~" => "\u{2241}",
    "\u{2243}" => "\u{2244}",
    "\u{2245}" => "\u{2247}",
    "\u{2248}" => "\u{2249}",
    "\u{224D}" => "\u{226D}",
    "=" => "\u{2260}",
    "\u{2261}" => "\u{2262}",
    "<" => "\u{226E}",
    ">" => "\u{226F}",
    "\u{2264}" => "\u{2270}",
    "\u{2265}" => "\u{2271}",
    "\u{2272}" => "\u{2274}",
    "\u{2273}" => "\u{2275}",
    "\u{2276}" => "\u{2278}",
    "\u{2277}" => "\u{2279}",
    "\u{227A}" => "\u{2280}",
    "\u{227B}" => "\u{2281}",
    "\u{2282}" => "\u{2284}",
    "\u{2283}" => "\u{2285}",
    "\u{2286}" => "\u{2288}",
    "\u{2287}" => "\u{2289}",
    "\u{22A2}" => "\u{22AC}",
    "\u{22A8}" => "\u{22AD}",
    "\u{22A9}" => "\u{22AE}",
    "\u{22AB}" => "\u{22AF}",
    "\u{227C}" => "\u{22E0}",
    "\u{227D}" => "\u{22E1}",
    "\u{2291}" => "\u{22E2}",
    "\u{2292}" => "\u{22E3}",
    "\u{22B2}" => "\u{22EA}",
    "\u{22B3}" => "\u{22EB}",
    "\u{22B4}" => "\u{22EC}",
    "\u{22B5}" => "\u{22ED}",
    "\u{2203}" => "\u{2204}",
};

pub(super) fn lookup(name: &str) -> Option<Command> {
    COMMANDS.get(name).copied()
}

pub(crate) fn negated(text: &str) -> Option<&'static str> {
    NEGATIONS.get(text).copied()
}

/// `\mathrel{...}` 等：参数包成指定类别的原子；`\mathop` 的结果按函数名处理
pub(super) fn atom(parser: &mut Parser<'_, '_>, name: &str, class: TexClass) -> ParseResult<()> {
    if class != TexClass::Op {
        let node = parser.parse_arg(name)?;
        return parser.push(Node::atom(class, vec![node]));
    }
    let text = parser.cursor.get_argument(name)?;
    let mut op = match RM_NAME.captures(&text).and_then(|caps| caps.get(1)) {
        Some(found) => {
            let mut mi = Node::token(NodeKind::Mi, found.as_str());
            mi.set_attribute("mathvariant", "normal");
            mi.texclass = Some(TexClass::Op);
            mi
        }
        None => {
            let env = parser.env();
            let node = parser.parse_text(&text, env)?;
            Node::atom(TexClass::Op, vec![node])
        }
    };
    op.set_flag("movesupsub", true);
    op.set_flag("movablelimits", true);
    parser.push_item(StackItem::with_nodes(ItemKind::Fn, vec![op]))
}

pub(super) fn not(parser: &mut Parser<'_, '_>) -> ParseResult<()> {
    parser.push_item(StackItem::new(ItemKind::Not))
}

/// `\dots`：根据后面的符号选择基线点或居中点
pub(super) fn dots(parser: &mut Parser<'_, '_>) -> ParseResult<()> {
    let mut ldots = Node::token(NodeKind::Mo, "\u{2026}");
    ldots.set_attribute("stretchy", "false");
    let mut cdots = Node::token(NodeKind::Mo, "\u{22EF}");
    cdots.set_attribute("stretchy", "false");
    parser.push_item(StackItem::new(ItemKind::Dots { ldots, cdots }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::testing::inline;
    use pretty_assertions::assert_eq;

    #[test]
    fn negations_use_precomposed_characters() {
        assert_eq!(negated("="), Some("\u{2260}"));
        assert_eq!(negated("x"), None);
        assert_eq!(inline("a\\not= b").unwrap(), "<math><mi>a</mi><mo>\u{2260}</mo><mi>b</mi></math>");
    }

    #[test]
    fn not_without_precomposed_form_overlays_a_slash() {
        assert_eq!(inline("\\not\\perp").unwrap(), "<math><mo>\u{22A5}\u{338}</mo></math>");
    }

    #[test]
    fn dots_follow_the_next_symbol() {
        assert!(inline("a+\\dots+b").unwrap().contains("\u{22EF}"));
        assert!(inline("a,\\dots,b").unwrap().contains("\u{2026}"));
    }

    #[test]
    fn relation_atom() {
        assert_eq!(
            inline("\\mathrel{x}").unwrap(),
            "<math><mrow data-texclass=\"REL\"><mi>x</mi></mrow></math>"
        );
    }
}
