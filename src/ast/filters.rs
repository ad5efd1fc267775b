//! 解析结束后的整理过程：展平推断行、收拢空的上下标槽位、按位置给运算符定类

use super::{Node, NodeKind, TexClass, Value, BASE, OVER, SUB, SUP, UNDER};
use crate::opdict::{self, Form};

/// 对整棵树依次执行所有整理步骤
pub(crate) fn finalize(node: &mut Node) {
    flatten_inferred(node);
    clean_scripts(node);
    assign_forms(node);
    adjust_binary_operators(node);
}

/// 子节点个数不固定、可以直接吸收推断行的节点
fn accepts_inferred(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Math
            | NodeKind::Mrow
            | NodeKind::InferredMrow
            | NodeKind::TexAtom
            | NodeKind::Mtd
            | NodeKind::Mstyle
            | NodeKind::Mpadded
            | NodeKind::Mphantom
            | NodeKind::Menclose
            | NodeKind::Msqrt
    )
}

fn flatten_inferred(node: &mut Node) {
    for child in node.slots_mut().iter_mut().flatten() {
        flatten_inferred(child);
    }
    if node.kind.has_fixed_slots() || !accepts_inferred(node.kind) {
        for child in node.slots_mut().iter_mut().flatten() {
            if child.kind == NodeKind::InferredMrow {
                child.kind = NodeKind::Mrow;
            }
        }
        return;
    }
    if !node.children().any(|c| c.kind == NodeKind::InferredMrow) {
        return;
    }
    let slots = std::mem::take(node.slots_mut());
    let mut flattened = Vec::with_capacity(slots.len());
    for slot in slots.into_iter().flatten() {
        if slot.kind == NodeKind::InferredMrow && slot.attributes.is_empty() {
            flattened.extend(slot.into_children().into_iter().map(Some));
        } else if slot.kind == NodeKind::InferredMrow {
            let mut row = slot;
            row.kind = NodeKind::Mrow;
            flattened.push(Some(row));
        } else {
            flattened.push(Some(slot));
        }
    }
    *node.slots_mut() = flattened;
}

/// `msubsup`/`munderover` 缺少某个槽位时退化为更简单的元素
fn clean_scripts(node: &mut Node) {
    for child in node.slots_mut().iter_mut().flatten() {
        clean_scripts(child);
    }
    let (first, second, only_first, only_second) = match node.kind {
        NodeKind::Msubsup => (SUB, SUP, NodeKind::Msub, NodeKind::Msup),
        NodeKind::Munderover => (UNDER, OVER, NodeKind::Munder, NodeKind::Mover),
        _ => return,
    };
    let has_first = node.has_child(first);
    let has_second = node.has_child(second);
    let slots = node.slots_mut();
    slots.resize(3, None);
    match (has_first, has_second) {
        (true, true) => {}
        (true, false) => {
            slots.truncate(2);
            node.kind = only_first;
        }
        (false, true) => {
            slots.remove(first);
            node.kind = only_second;
        }
        (false, false) => {
            let base = slots[BASE].take();
            if let Some(mut base) = base {
                // 基底继承外层的解析期标志，避免丢失 movablelimits 信息
                for key in ["movesupsub", "movablelimits"] {
                    if let Some(value) = node.property(key).cloned() {
                        base.set_property(key, value);
                    }
                }
                *node = base;
            } else {
                *node = Node::row(Vec::new());
            }
        }
    }
}

fn is_row_like(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Math
            | NodeKind::Mrow
            | NodeKind::InferredMrow
            | NodeKind::TexAtom
            | NodeKind::Mtd
            | NodeKind::Mstyle
            | NodeKind::Mpadded
            | NodeKind::Mphantom
            | NodeKind::Menclose
            | NodeKind::Msqrt
    )
}

fn is_space_like(node: &Node) -> bool {
    node.kind == NodeKind::Mspace
}

fn assign_forms(node: &mut Node) {
    if is_row_like(node.kind) {
        let positions: Vec<usize> = node
            .slots()
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Some(child) if !is_space_like(child) => Some(i),
                _ => None,
            })
            .collect();
        let count = positions.len();
        let first = positions.first().copied();
        let last = positions.last().copied();
        for (index, slot) in node.slots_mut().iter_mut().enumerate() {
            let Some(child) = slot else { continue };
            let form = if count > 1 && Some(index) == first {
                Form::Prefix
            } else if count > 1 && Some(index) == last {
                Form::Postfix
            } else {
                Form::Infix
            };
            if let Some(mo) = child.core_mo_mut() {
                classify_mo(mo, form);
            }
        }
    }
    for child in node.slots_mut().iter_mut().flatten() {
        if child.kind == NodeKind::Mo && !child.has_property("form") {
            classify_mo(child, Form::Infix);
        }
        assign_forms(child);
    }
}

fn classify_mo(mo: &mut Node, form: Form) {
    if mo.has_property("form") {
        return;
    }
    let form = match mo.attribute("form") {
        Some("prefix") => Form::Prefix,
        Some("postfix") => Form::Postfix,
        Some("infix") => Form::Infix,
        _ => form,
    };
    let entry = opdict::resolve(mo.text(), form);
    mo.set_property("form", Value::Text(form.as_str().to_string()));
    mo.set_property("lspace", Value::Int(i64::from(entry.lspace)));
    mo.set_property("rspace", Value::Int(i64::from(entry.rspace)));
    // 解析时显式指定的类别保持不变
    if mo.texclass.is_some() {
        mo.set_flag("fixedClass", true);
    } else {
        mo.texclass = Some(entry.class);
    }
}

/// TeX 的规则：出现在行首或关系符、开括号等之后的二元运算符按普通符号处理
fn adjust_binary_operators(node: &mut Node) {
    for child in node.slots_mut().iter_mut().flatten() {
        adjust_binary_operators(child);
    }
    if !is_row_like(node.kind) {
        return;
    }
    let classes: Vec<Option<TexClass>> = node
        .slots()
        .iter()
        .map(|slot| {
            slot.as_ref()
                .filter(|c| !is_space_like(c))
                .map(Node::effective_class)
        })
        .collect();
    let present: Vec<(usize, TexClass)> = classes
        .iter()
        .enumerate()
        .filter_map(|(i, c)| c.map(|c| (i, c)))
        .collect();
    for (k, &(index, class)) in present.iter().enumerate() {
        if class != TexClass::Bin {
            continue;
        }
        let prev = k.checked_sub(1).map(|p| present[p].1);
        let next = present.get(k + 1).map(|n| n.1);
        let demote_prev = matches!(
            prev,
            None | Some(TexClass::Bin)
                | Some(TexClass::Op)
                | Some(TexClass::Rel)
                | Some(TexClass::Open)
                | Some(TexClass::Punct)
        );
        let demote_next = matches!(
            next,
            None | Some(TexClass::Rel) | Some(TexClass::Close) | Some(TexClass::Punct)
        );
        if demote_prev || demote_next {
            if let Some(Some(child)) = node.slots_mut().get_mut(index) {
                if child.kind == NodeKind::Mo && !child.flag("fixedClass") {
                    child.texclass = Some(TexClass::Ord);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mi(text: &str) -> Node {
        Node::token(NodeKind::Mi, text)
    }

    fn mo(text: &str) -> Node {
        Node::token(NodeKind::Mo, text)
    }

    #[test]
    fn inferred_rows_are_flattened_into_rows() {
        let inner = Node::new(NodeKind::InferredMrow, vec![mi("a"), mi("b")]);
        let mut math = Node::new(NodeKind::Math, vec![inner, mi("c")]);
        finalize(&mut math);
        let texts: Vec<&str> = math.children().map(Node::text).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn inferred_row_in_slot_becomes_mrow() {
        let num = Node::new(NodeKind::InferredMrow, vec![mi("a"), mi("b")]);
        let mut frac = Node::new(NodeKind::Mfrac, vec![num, mi("c")]);
        finalize(&mut frac);
        assert_eq!(frac.child(0).map(|c| c.kind), Some(NodeKind::Mrow));
    }

    #[test]
    fn half_empty_scripts_collapse() {
        let mut node = Node::with_slots(NodeKind::Msubsup, mi("x"), 3);
        node.set_child(SUP, Node::token(NodeKind::Mn, "2"));
        finalize(&mut node);
        assert_eq!(node.kind, NodeKind::Msup);
        assert_eq!(node.child_count(), 2);

        let mut under = Node::with_slots(NodeKind::Munderover, mo("∑"), 3);
        under.set_child(UNDER, mi("i"));
        finalize(&mut under);
        assert_eq!(under.kind, NodeKind::Munder);
    }

    #[test]
    fn leading_minus_becomes_ordinary() {
        let mut row = Node::new(NodeKind::Math, vec![mo("-"), mi("x"), mo("+"), mi("y")]);
        finalize(&mut row);
        assert_eq!(row.child(0).and_then(|c| c.texclass), Some(TexClass::Ord));
        assert_eq!(row.child(2).and_then(|c| c.texclass), Some(TexClass::Bin));
    }
}
