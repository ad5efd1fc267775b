//! 表格类环境的行列累积：单元格、行、横线、行距，以及带编号的公式行

use std::collections::BTreeMap;

use crate::ast::{Node, NodeKind, ParseResult, TexClass};
use crate::error::TexError;
use crate::tags::TagRegistry;

use super::lexer::{dimen_to_em, em};
use super::stack::{base_check, CheckContext, Env, ItemKind, Outcome, StackItem};
use super::util::fenced;

/// 一个正在构建的表格
#[derive(Debug, Clone, Default)]
pub(crate) struct ArrayState {
    pub attributes: BTreeMap<&'static str, String>,
    pub table: Vec<Node>,
    pub row: Vec<Node>,
    /// 已经画出的边框：left/right/top/bottom
    pub frame: Vec<&'static str>,
    pub dashed: bool,
    /// 当前单元格中 `\hfill` 出现的位置
    pub hfill: Vec<usize>,
    pub open: Option<String>,
    pub close: Option<String>,
    /// 必须由右花括号结束（`\matrix{...}` 一类）
    pub require_close: bool,
    /// 第二列按文本扫描；值为结束环境名，`\cases{...}` 为空串
    pub cases: Option<String>,
    pub row_spacing: Option<f64>,
    /// 公式行模式下已出现的最大列数
    pub eqn: Option<usize>,
}

impl ArrayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 公式行（align、gather 等）：每行都可能带编号
    pub fn equations() -> Self {
        Self {
            eqn: Some(0),
            ..Self::default()
        }
    }

    pub fn set(&mut self, name: &'static str, value: impl Into<String>) {
        self.attributes.insert(name, value.into());
    }

    pub fn end_entry(&mut self, mut nodes: Vec<Node>) {
        if self.eqn.is_some() {
            if !self.row.is_empty() {
                fix_initial_mo(&mut nodes);
            }
            self.row.push(Node::new(NodeKind::Mtd, nodes));
            return;
        }
        let size = nodes.len();
        let mut mtd = Node::new(NodeKind::Mtd, nodes);
        if !self.hfill.is_empty() {
            if self.hfill[0] == 0 {
                mtd.set_attribute("columnalign", "right");
            }
            if self.hfill.last() == Some(&size) {
                let align = if mtd.attribute("columnalign").is_some() {
                    "center"
                } else {
                    "left"
                };
                mtd.set_attribute("columnalign", align);
            }
        }
        self.hfill.clear();
        self.row.push(mtd);
    }

    pub fn end_row(&mut self, tags: &mut TagRegistry) {
        let cells = std::mem::take(&mut self.row);
        let Some(max_row) = self.eqn.as_mut() else {
            self.table.push(Node::new(NodeKind::Mtr, cells));
            return;
        };
        *max_row = (*max_row).max(cells.len());
        let row = match tags.get_tag(false) {
            Some(tag) => {
                let mut children = Vec::with_capacity(cells.len() + 1);
                children.push(tag);
                children.extend(cells);
                Node::new(NodeKind::Mlabeledtr, children)
            }
            None => Node::new(NodeKind::Mtr, cells),
        };
        tags.clear_tag();
        self.table.push(row);
    }

    pub fn end_table(&mut self, nodes: Vec<Node>, tags: &mut TagRegistry) {
        if !nodes.is_empty() || !self.row.is_empty() {
            self.end_entry(nodes);
            self.end_row(tags);
        }
        self.check_lines();
        if let Some(max_row) = self.eqn {
            tags.end();
            self.extend_columns("columnalign", max_row);
            self.extend_columns("columnspacing", max_row.saturating_sub(1));
        }
    }

    /// 行线数目与行数对齐；最后一行下方的线改为底边框
    fn check_lines(&mut self) {
        if let Some(rowlines) = self.attributes.get("rowlines") {
            let mut lines: Vec<String> = rowlines.split(' ').map(str::to_string).collect();
            if lines.len() == self.table.len() {
                self.frame.push("bottom");
                lines.pop();
                if lines.is_empty() {
                    self.attributes.remove("rowlines");
                } else {
                    self.set("rowlines", lines.join(" "));
                }
            } else if lines.len() + 1 < self.table.len() {
                self.set("rowlines", format!("{} none", lines.join(" ")));
            }
        }
        if let Some(spacing) = self.row_spacing {
            let mut rows = self.split_attribute("rowspacing");
            while rows.len() < self.table.len() {
                rows.push(em(spacing));
            }
            self.set("rowspacing", rows.join(" "));
        }
    }

    fn split_attribute(&self, name: &str) -> Vec<String> {
        self.attributes
            .get(name)
            .map(|value| value.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// 按列循环补齐对齐方式，使其与最长的一行一致
    fn extend_columns(&mut self, name: &'static str, count: usize) {
        let values = self.split_attribute(name);
        if values.len() < 2 || count == 0 {
            return;
        }
        let extended: Vec<String> = values.iter().cycle().take(count).cloned().collect();
        self.set(name, extended.join(" "));
    }

    /// `\\[dimen]` 给上一行追加额外行距
    pub fn add_row_spacing(&mut self, spacing: &str) -> ParseResult<()> {
        let extra = dimen_to_em(spacing)
            .ok_or_else(|| TexError::BracketMustBeDimension("\\\\".into()))?;
        let mut rows = self.split_attribute("rowspacing");
        if rows.is_empty() || self.table.is_empty() {
            return Ok(());
        }
        let base = match self.row_spacing {
            Some(value) => value,
            None => {
                let value = dimen_to_em(&rows[0]).unwrap_or(0.0);
                self.row_spacing = Some(value);
                value
            }
        };
        while rows.len() < self.table.len() {
            rows.push(em(base));
        }
        let index = self.table.len() - 1;
        rows[index] = em((base + extra).max(0.0));
        self.set("rowspacing", rows.join(" "));
        Ok(())
    }

    /// `\hline`/`\hdashline`：第一行之前画上边框，其余情况追加行线
    pub fn add_hline(&mut self, dashed: bool) {
        let style = if dashed { "dashed" } else { "solid" };
        if self.table.is_empty() {
            self.frame.push("top");
            self.dashed = dashed;
            return;
        }
        let mut lines = self.split_attribute("rowlines");
        while lines.len() < self.table.len() {
            lines.push("none".into());
        }
        let index = self.table.len() - 1;
        lines[index] = style.to_string();
        self.set("rowlines", lines.join(" "));
    }

    pub fn create_mml(&mut self) -> Node {
        let mut scriptlevel = None;
        let mut table = Node::new(NodeKind::Mtable, std::mem::take(&mut self.table));
        for (name, value) in std::mem::take(&mut self.attributes) {
            if name == "scriptlevel" {
                scriptlevel = Some(value);
            } else {
                table.set_attribute(name, value);
            }
        }
        if self.frame.len() == 4 {
            table.set_attribute("frame", if self.dashed { "dashed" } else { "solid" });
        } else if !self.frame.is_empty() {
            if let Some(rowlines) = table.attribute("rowlines") {
                let trimmed = rowlines
                    .split(' ')
                    .rev()
                    .skip_while(|line| *line == "none")
                    .collect::<Vec<_>>();
                if trimmed.is_empty() {
                    table.attributes.remove("rowlines");
                }
            }
            let notation = self.frame.join(" ");
            let mut enclosed = Node::new(NodeKind::Menclose, vec![table]);
            enclosed.set_attribute("notation", notation);
            table = enclosed;
        }
        if let Some(level) = scriptlevel {
            let mut style = Node::new(NodeKind::Mstyle, vec![table]);
            style.set_attribute("scriptlevel", level);
            table = style;
        }
        match (self.open.take(), self.close.take()) {
            (None, None) => table,
            (open, close) => fenced(
                open.as_deref().unwrap_or(""),
                table,
                close.as_deref().unwrap_or(""),
                None,
                None,
            ),
        }
    }
}

/// 单元格以运算符开头时补一个空标识符，让运算符按中缀处理
fn fix_initial_mo(nodes: &mut Vec<Node>) {
    let first = nodes.iter().position(|child| {
        child.kind != NodeKind::Mspace && !(child.kind == NodeKind::TexAtom && is_empty_atom(child))
    });
    if let Some(index) = first {
        let child = &nodes[index];
        if child.is_embellished_op()
            || (child.kind == NodeKind::TexAtom && child.texclass == Some(TexClass::Rel))
        {
            nodes.insert(0, Node::token(NodeKind::Mi, ""));
        }
    }
}

fn is_empty_atom(atom: &Node) -> bool {
    atom.children()
        .all(|child| child.kind == NodeKind::InferredMrow && child.child_count() == 0)
}

pub(crate) fn check(
    mut top: StackItem,
    item: StackItem,
    cx: &mut CheckContext<'_>,
) -> ParseResult<Outcome> {
    if !item.is_close() {
        return base_check(top, item);
    }
    let ItemKind::Array(state) = &mut top.kind else {
        return base_check(top, item);
    };
    let nodes = std::mem::take(&mut top.nodes);
    match &item.kind {
        ItemKind::Cell { entry: true, .. } => {
            state.end_entry(nodes);
            top.env = Env::default();
            Ok(Outcome::Absorb(top))
        }
        ItemKind::Cell { cr: true, .. } => {
            state.end_entry(nodes);
            state.end_row(cx.tags);
            top.env = Env::default();
            Ok(Outcome::Absorb(top))
        }
        _ => {
            state.end_table(nodes, cx.tags);
            let node = state.create_mml();
            let require_close = state.require_close;
            if require_close {
                if matches!(item.kind, ItemKind::Close) {
                    return Ok(Outcome::Replace(vec![StackItem::mml(node)]));
                }
                return Err(TexError::MissingCloseBrace);
            }
            Ok(Outcome::Replace(vec![StackItem::mml(node), item]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use pretty_assertions::assert_eq;

    fn mi(text: &str) -> Node {
        Node::token(NodeKind::Mi, text)
    }

    #[test]
    fn rows_and_cells_accumulate() {
        let mut tags = TagRegistry::new(&Options::default());
        let mut array = ArrayState::new();
        array.end_entry(vec![mi("a")]);
        array.end_entry(vec![mi("b")]);
        array.end_row(&mut tags);
        array.end_table(vec![mi("c")], &mut tags);
        let table = array.create_mml();
        assert_eq!(table.kind, NodeKind::Mtable);
        assert_eq!(table.children().count(), 2);
        assert_eq!(table.child(0).map(Node::child_count), Some(2));
    }

    #[test]
    fn extra_row_spacing_is_added_to_previous_row() {
        let mut tags = TagRegistry::new(&Options::default());
        let mut array = ArrayState::new();
        array.set("rowspacing", "4pt");
        array.end_entry(vec![mi("a")]);
        array.end_row(&mut tags);
        array.add_row_spacing("3pt").unwrap();
        assert_eq!(array.attributes.get("rowspacing").map(String::as_str), Some("0.7em"));
    }

    #[test]
    fn hline_before_first_row_is_a_frame() {
        let mut tags = TagRegistry::new(&Options::default());
        let mut array = ArrayState::new();
        array.add_hline(false);
        array.end_entry(vec![mi("a")]);
        array.end_row(&mut tags);
        array.add_hline(true);
        array.end_entry(vec![mi("b")]);
        array.end_row(&mut tags);
        array.end_table(Vec::new(), &mut tags);
        let node = array.create_mml();
        assert_eq!(node.kind, NodeKind::Menclose);
        assert_eq!(node.attribute("notation"), Some("top"));
        assert_eq!(node.child(0).and_then(|t| t.attribute("rowlines")), Some("dashed"));
    }

    #[test]
    fn leading_relation_gets_empty_base() {
        let mut nodes = vec![Node::token(NodeKind::Mo, "="), mi("b")];
        fix_initial_mo(&mut nodes);
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].kind, NodeKind::Mi);
        assert_eq!(nodes[0].text(), "");
    }
}
