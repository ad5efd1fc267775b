//! 输出模块：把节点树转成确定性的 MathML 标记文本
//!
//! 元素名取自节点种类，属性按名称排序，TeX 原子额外带上 `data-texclass`。
//! 解析期的内部标志不会输出。

use std::borrow::Cow;
use std::fmt::Write;

use crate::ast::{Node, NodeKind};

/// 把一棵节点树序列化为 MathML 字符串
pub fn to_mathml(node: &Node) -> String {
    let mut out = String::with_capacity(256);
    write_node(&mut out, node);
    out
}

fn write_node(out: &mut String, node: &Node) {
    // 残留的无属性推断行直接输出其内容
    if node.kind == NodeKind::InferredMrow && node.attributes.is_empty() {
        for child in node.children() {
            write_node(out, child);
        }
        return;
    }

    let tag = node.kind.tag_name();
    out.push('<');
    out.push_str(tag);

    let class = match (node.kind, node.texclass) {
        (NodeKind::TexAtom, Some(class)) => Some(class.as_str()),
        _ => None,
    };
    let mut attributes: Vec<(&str, &str)> = node
        .attributes
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .chain(class.map(|class| ("data-texclass", class)))
        .collect();
    attributes.sort_unstable_by(|a, b| a.0.cmp(b.0));
    for (name, value) in attributes {
        let _ = write!(out, r#" {}="{}""#, name, escape_text(value));
    }
    out.push('>');

    if let Some(text) = &node.text {
        out.push_str(&escape_text(text));
    }
    for child in node.children() {
        write_node(out, child);
    }

    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// 替换文本中的 XML 关键字符
fn escape_text(input: &str) -> Cow<'_, str> {
    if !input.bytes().any(|b| matches!(b, b'&' | b'<' | b'>' | b'"')) {
        return Cow::Borrowed(input);
    }

    let mut escaped = String::with_capacity(input.len() + 16);
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TexClass;
    use pretty_assertions::assert_eq;

    #[test]
    fn attributes_are_sorted_and_escaped() {
        let mut mo = Node::token(NodeKind::Mo, "<");
        mo.set_attribute("stretchy", "false");
        mo.set_attribute("fence", "a\"b");
        assert_eq!(
            to_mathml(&mo),
            "<mo fence=\"a&quot;b\" stretchy=\"false\">&lt;</mo>"
        );
    }

    #[test]
    fn atoms_carry_their_class() {
        let mut atom = Node::atom(TexClass::Op, vec![Node::token(NodeKind::Mi, "x")]);
        atom.set_attribute("class", "c");
        assert_eq!(
            to_mathml(&atom),
            "<mrow class=\"c\" data-texclass=\"OP\"><mi>x</mi></mrow>"
        );
        let mut mo = Node::token(NodeKind::Mo, "+");
        mo.texclass = Some(TexClass::Bin);
        assert_eq!(to_mathml(&mo), "<mo>+</mo>");
    }

    #[test]
    fn empty_slots_and_inferred_rows() {
        let mut msub = Node::with_slots(NodeKind::Msubsup, Node::token(NodeKind::Mi, "x"), 3);
        msub.set_child(2, Node::token(NodeKind::Mn, "2"));
        assert_eq!(to_mathml(&msub), "<msubsup><mi>x</mi><mn>2</mn></msubsup>");

        let row = Node::new(
            NodeKind::InferredMrow,
            vec![Node::token(NodeKind::Mi, "a"), Node::new(NodeKind::Mspace, Vec::new())],
        );
        let math = Node::new(NodeKind::Math, vec![row]);
        assert_eq!(to_mathml(&math), "<math><mi>a</mi><mspace></mspace></math>");
    }
}
