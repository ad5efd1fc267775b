//! 各命令共用的节点构造函数

use crate::ast::{Node, NodeKind, TexClass};

/// 可伸缩的括号运算符
pub(crate) fn fence_mo(text: &str, class: TexClass) -> Node {
    let mut mo = Node::token(NodeKind::Mo, text);
    mo.set_attribute("fence", "true");
    mo.set_attribute("stretchy", "true");
    mo.set_attribute("symmetric", "true");
    mo.texclass = Some(class);
    mo
}

/// `\left ... \right` 的结果：INNER 类的行，两端是伸缩括号，`.` 表示省略
pub(crate) fn fenced(
    open: &str,
    inner: Node,
    close: &str,
    open_color: Option<&str>,
    close_color: Option<&str>,
) -> Node {
    let mut row = Node::row(Vec::new());
    row.texclass = Some(TexClass::Inner);
    let mut left = fence_mo(open, TexClass::Open);
    if let Some(color) = open_color {
        left.set_attribute("mathcolor", color);
    }
    row.push_child(left);
    push_flattened(&mut row, inner);
    let mut right = fence_mo(close, TexClass::Close);
    if let Some(color) = close_color {
        right.set_attribute("mathcolor", color);
    }
    row.push_child(right);
    row
}

/// 固定尺寸的括号，用于 `\binom`、`\genfrac` 等
pub(crate) fn fixed_fence(open: Option<&str>, inner: Node, close: Option<&str>) -> Node {
    let mut row = Node::row(Vec::new());
    row.texclass = Some(TexClass::Ord);
    if let Some(open) = open {
        row.push_child(big_delimiter(open, TexClass::Open, "1.2em"));
    }
    push_flattened(&mut row, inner);
    if let Some(close) = close {
        row.push_child(big_delimiter(close, TexClass::Close, "1.2em"));
    }
    row
}

/// 指定尺寸的括号，包在对应类别的 TeXAtom 中
pub(crate) fn big_delimiter(text: &str, class: TexClass, size: &str) -> Node {
    let mut mo = Node::token(NodeKind::Mo, text);
    mo.set_attribute("minsize", size);
    mo.set_attribute("maxsize", size);
    mo.set_attribute("fence", "true");
    mo.set_attribute("stretchy", "true");
    mo.set_attribute("symmetric", "true");
    Node::atom(class, vec![mo])
}

fn push_flattened(row: &mut Node, inner: Node) {
    if matches!(inner.kind, NodeKind::Mrow | NodeKind::InferredMrow)
        && inner.texclass.is_none()
        && inner.attributes.is_empty()
    {
        for child in inner.into_children() {
            row.push_child(child);
        }
    } else {
        row.push_child(inner);
    }
}

/// 设置运算符的 movablelimits（解析期属性同时写入核心 `mo` 的输出属性）
pub(crate) fn set_movablelimits(node: &mut Node, value: bool) {
    node.set_flag("movablelimits", value);
    if let Some(mo) = node.core_mo_mut() {
        mo.set_flag("movablelimits", value);
        mo.set_attribute("movablelimits", if value { "true" } else { "false" });
    }
}

/// 文本节点，保留首尾空格
pub(crate) fn text_node(text: &str, variant: Option<&str>) -> Node {
    let mut node = Node::token(NodeKind::Mtext, text);
    if let Some(variant) = variant {
        node.set_attribute("mathvariant", variant);
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_rows_splice_inner_rows() {
        let inner = Node::new(
            NodeKind::InferredMrow,
            vec![Node::token(NodeKind::Mi, "a"), Node::token(NodeKind::Mi, "b")],
        );
        let row = fenced("(", inner, ")", None, Some("red"));
        assert_eq!(row.texclass, Some(TexClass::Inner));
        assert_eq!(row.children().count(), 4);
        assert_eq!(row.child(3).and_then(|mo| mo.attribute("mathcolor")), Some("red"));
    }

    #[test]
    fn fixed_fences_are_sized() {
        let frac = Node::new(NodeKind::Mfrac, Vec::new());
        let row = fixed_fence(Some("("), frac, None);
        assert_eq!(row.children().count(), 2);
        let open = row.child(0).and_then(|atom| atom.child(0));
        assert_eq!(open.and_then(|mo| mo.attribute("minsize")), Some("1.2em"));
    }
}
