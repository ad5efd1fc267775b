//! 公式编号与标签：自动编号、`\tag`/`\label` 的登记，以及交叉引用的两遍解析支持
//!
//! 每条公式开始时调用 `start_equation`，结束时调用 `finish_equation`。
//! 第一遍中遇到未知引用会设置 `redo`，调用方据此在所有公式编译完成后重编译一次。

use std::collections::BTreeMap;

use crate::ast::{Node, NodeKind, ParseResult};
use crate::config::{Options, TagMode, TagSide};
use crate::error::TexError;

/// 未解析引用显示的占位文本
pub const UNKNOWN_REF: &str = "???";

/// 标签绑定：编号（或自定义文本）及锚点 id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub tag: String,
    pub id: String,
}

impl Default for Label {
    fn default() -> Self {
        Self {
            tag: UNKNOWN_REF.to_string(),
            id: String::new(),
        }
    }
}

/// 一个编号环境的状态
#[derive(Debug, Clone, Default)]
struct TagInfo {
    env: String,
    taggable: bool,
    default_tags: bool,
    tag: Option<String>,
    tag_format: String,
    tag_id: String,
    label: String,
    no_tag: bool,
}

impl TagInfo {
    fn new(env: &str, taggable: bool, default_tags: bool) -> Self {
        Self {
            env: env.to_string(),
            taggable,
            default_tags,
            ..Self::default()
        }
    }
}

/// 文档级的编号登记表
#[derive(Debug, Clone)]
pub struct TagRegistry {
    mode: TagMode,
    side: TagSide,
    indent: String,
    use_label_ids: bool,
    counter: usize,
    all_counter: usize,
    redo: bool,
    ref_update: bool,
    current: TagInfo,
    stack: Vec<TagInfo>,
    /// 已结束的环境是否带了编号
    history: Vec<bool>,
    labels: BTreeMap<String, Label>,
    all_labels: BTreeMap<String, Label>,
}

impl TagRegistry {
    pub fn new(options: &Options) -> Self {
        Self {
            mode: options.tags,
            side: options.tag_side,
            indent: options.tag_indent.clone(),
            use_label_ids: options.use_label_ids,
            counter: 0,
            all_counter: 0,
            redo: false,
            ref_update: false,
            current: TagInfo::new("", true, options.tags == TagMode::All),
            stack: Vec::new(),
            history: Vec::new(),
            labels: BTreeMap::new(),
            all_labels: BTreeMap::new(),
        }
    }

    /// 开始一条公式；`recompile` 给出重编译时的起始编号
    pub fn start_equation(&mut self, recompile: Option<usize>) {
        self.history.clear();
        self.stack.clear();
        self.current = TagInfo::new("", true, self.mode == TagMode::All);
        self.labels.clear();
        self.counter = self.all_counter;
        self.redo = false;
        self.ref_update = false;
        if let Some(counter) = recompile {
            self.ref_update = true;
            self.counter = counter;
        }
    }

    /// 结束一条公式并合并其标签；需要重编译时返回该公式的起始编号
    pub fn finish_equation(&mut self) -> Option<usize> {
        let redo = self.redo.then_some(self.all_counter);
        if !self.ref_update {
            self.all_counter = self.counter;
        }
        let labels = std::mem::take(&mut self.labels);
        self.all_labels.extend(labels);
        self.ref_update = false;
        redo
    }

    /// 编译失败时丢弃本条公式登记的内容
    pub fn abort_equation(&mut self) {
        self.labels.clear();
        self.counter = self.all_counter;
        self.ref_update = false;
        self.redo = false;
    }

    /// 进入一个编号环境
    pub fn start(&mut self, env: &str, taggable: bool, default_tags: bool) {
        let default_tags = match self.mode {
            TagMode::None => false,
            TagMode::Ams => default_tags,
            TagMode::All => default_tags || taggable,
        };
        let previous = std::mem::replace(&mut self.current, TagInfo::new(env, taggable, default_tags));
        self.stack.push(previous);
    }

    pub fn end(&mut self) {
        self.history.push(self.current.tag.is_some());
        self.current = self.stack.pop().unwrap_or_default();
    }

    pub fn current_env(&self) -> &str {
        &self.current.env
    }

    pub fn current_taggable(&self) -> bool {
        self.current.taggable
    }

    pub fn has_tag(&self) -> bool {
        self.current.tag.is_some()
    }

    /// 设置编号；`no_format` 为真时不加括号（`\tag*`）
    pub fn tag(&mut self, tag: &str, no_format: bool) {
        self.current.tag_format = if no_format {
            tag.to_string()
        } else {
            format_tag(tag)
        };
        self.current.tag = Some(tag.to_string());
        self.current.no_tag = false;
    }

    pub fn notag(&mut self) {
        self.current.tag = None;
        self.current.no_tag = true;
    }

    pub fn auto_tag(&mut self) {
        if self.mode == TagMode::None || self.current.tag.is_some() {
            return;
        }
        self.counter += 1;
        let tag = self.counter.to_string();
        self.tag(&tag, false);
    }

    pub fn clear_tag(&mut self) {
        self.current.label.clear();
        self.current.tag = None;
        self.current.tag_format.clear();
        self.current.no_tag = false;
        self.current.tag_id.clear();
    }

    /// 当前环境的编号单元格；`force` 为真时总是编号
    pub fn get_tag(&mut self, force: bool) -> Option<Node> {
        if force {
            self.auto_tag();
            return self.current.tag.is_some().then(|| self.make_tag());
        }
        if self.current.taggable && !self.current.no_tag {
            if self.current.default_tags {
                self.auto_tag();
            }
            if self.current.tag.is_some() {
                return Some(self.make_tag());
            }
        }
        None
    }

    fn make_tag(&mut self) -> Node {
        let tag = self.current.tag.clone().unwrap_or_default();
        let source = if self.use_label_ids && !self.current.label.is_empty() {
            self.current.label.clone()
        } else {
            tag.clone()
        };
        self.current.tag_id = format_id(&source);
        if !self.current.label.is_empty() {
            tracing::debug!(label = %self.current.label, tag = %tag, "登记标签");
            self.labels.insert(
                self.current.label.clone(),
                Label {
                    tag,
                    id: self.current.tag_id.clone(),
                },
            );
        }
        let text = Node::token(NodeKind::Mtext, self.current.tag_format.clone());
        let mut cell = Node::new(NodeKind::Mtd, vec![text]);
        cell.set_attribute("id", self.current.tag_id.clone());
        cell
    }

    /// 把编号单元格与公式组合成单行带标签的表格
    pub fn en_tag(&self, node: Node, tag: Node) -> Node {
        let cell = Node::new(NodeKind::Mtd, vec![node]);
        let row = Node::new(NodeKind::Mlabeledtr, vec![tag, cell]);
        let mut table = Node::new(NodeKind::Mtable, vec![row]);
        table.set_attribute("side", self.side.as_str());
        table.set_attribute("minlabelspacing", self.indent.clone());
        table.set_attribute("displaystyle", "true");
        table
    }

    /// 顶层公式结束时，按编号模式为整条行间公式加编号
    pub fn finalize(&mut self, node: Node, display: bool) -> Node {
        if !display {
            return node;
        }
        if self.mode == TagMode::All {
            if self.history.iter().any(|tagged| *tagged) {
                return node;
            }
            return match self.get_tag(true) {
                Some(tag) => self.en_tag(node, tag),
                None => node,
            };
        }
        if !self.current.env.is_empty() || self.current.tag.is_none() {
            return node;
        }
        let tag = self.make_tag();
        self.en_tag(node, tag)
    }

    /// 记录 `\label`；重编译时跳过重复检查
    pub fn set_label(&mut self, label: &str, command: &str, ignore_duplicates: bool) -> ParseResult<()> {
        if label.is_empty() {
            return Ok(());
        }
        let ref_update = self.ref_update;
        let known = self.all_labels.contains_key(label) || self.labels.contains_key(label);
        let target = self.label_target();
        if !ref_update {
            if !target.label.is_empty() {
                return Err(TexError::MultipleLabel(command.to_string()));
            }
            if known && !ignore_duplicates {
                return Err(TexError::DuplicateLabel(label.to_string()));
            }
        }
        target.label = label.to_string();
        if !ref_update {
            self.labels.insert(label.to_string(), Label::default());
        }
        Ok(())
    }

    /// 不可编号的子环境（aligned 等）中的 `\label` 归属最近的可编号环境
    fn label_target(&mut self) -> &mut TagInfo {
        if self.current.taggable {
            return &mut self.current;
        }
        match self.stack.iter().rposition(|info| info.taggable) {
            Some(index) => &mut self.stack[index],
            None => &mut self.current,
        }
    }

    /// 查询引用；第一遍中未知的标签会触发重编译
    pub fn reference(&mut self, label: &str) -> Label {
        if let Some(found) = self.all_labels.get(label).or_else(|| self.labels.get(label)) {
            return found.clone();
        }
        if !self.ref_update {
            tracing::debug!(label, "引用尚未定义的标签，安排第二遍");
            self.redo = true;
        } else {
            tracing::warn!(label, "引用的标签始终未定义");
        }
        Label::default()
    }

    /// 文档中所有已登记的标签
    pub fn labels(&self) -> &BTreeMap<String, Label> {
        &self.all_labels
    }

    /// 文档中最后分配的自动编号
    pub fn counter(&self) -> usize {
        self.all_counter
    }
}

pub fn format_tag(tag: &str) -> String {
    format!("({tag})")
}

pub fn format_id(id: &str) -> String {
    let cleaned: String = id
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("eqn:{cleaned}")
}

/// 锚点地址：基础地址加上百分号编码后的 id
pub fn format_url(id: &str, base: &str) -> String {
    format!("{base}#{}", percent_encode(id))
}

fn percent_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TagRegistry {
        TagRegistry::new(&Options::default())
    }

    #[test]
    fn numbered_environment_gets_counter() {
        let mut tags = registry();
        tags.start_equation(None);
        tags.start("equation", true, true);
        tags.set_label("A", "\\label", false).unwrap();
        let tag = tags.get_tag(false).expect("带编号环境应该生成编号");
        assert_eq!(tag.attribute("id"), Some("eqn:A"));
        assert_eq!(tag.text_content(), "(1)");
        tags.end();
        assert_eq!(tags.finish_equation(), None);
        assert_eq!(tags.labels().get("A").map(|l| l.tag.as_str()), Some("1"));
        assert_eq!(tags.counter(), 1);
    }

    #[test]
    fn notag_suppresses_numbering() {
        let mut tags = registry();
        tags.start_equation(None);
        tags.start("align", true, true);
        tags.notag();
        assert!(tags.get_tag(false).is_none());
        tags.end();
        tags.finish_equation();
        assert_eq!(tags.counter(), 0);
    }

    #[test]
    fn label_errors() {
        let mut tags = registry();
        tags.start_equation(None);
        tags.set_label("A", "\\label", false).unwrap();
        assert_eq!(
            tags.set_label("B", "\\label", false),
            Err(TexError::MultipleLabel("\\label".into()))
        );
        tags.finish_equation();
        tags.start_equation(None);
        assert_eq!(
            tags.set_label("A", "\\label", false),
            Err(TexError::DuplicateLabel("A".into()))
        );
        assert!(tags.set_label("A", "\\label", true).is_ok());
    }

    #[test]
    fn unknown_reference_requests_redo_once() {
        let mut tags = registry();
        tags.start_equation(None);
        assert_eq!(tags.reference("X"), Label::default());
        assert_eq!(tags.finish_equation(), Some(0));
        tags.start_equation(Some(0));
        tags.reference("X");
        assert_eq!(tags.finish_equation(), None);
    }

    #[test]
    fn finalize_wraps_explicit_tag() {
        let mut tags = registry();
        tags.start_equation(None);
        tags.tag("*", true);
        let node = tags.finalize(Node::token(NodeKind::Mi, "x"), true);
        assert_eq!(node.kind, NodeKind::Mtable);
        assert_eq!(node.attribute("side"), Some("right"));
        assert_eq!(node.text_content(), "*x");
    }

    #[test]
    fn urls_are_percent_encoded() {
        assert_eq!(format_url("eqn:a b", "page"), "page#eqn%3Aa%20b");
        assert_eq!(format_id("a b"), "eqn:a_b");
    }
}
