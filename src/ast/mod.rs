//! 语法树定义：解析器输出的数学标记树

mod filters;

use std::collections::BTreeMap;

use phf::phf_set;

use crate::error::TexError;

pub(crate) use filters::finalize;

/// 节点种类，基本对应 MathML 元素
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Math,
    Mi,
    Mn,
    Mo,
    Mtext,
    Mspace,
    Ms,
    Mglyph,
    Mrow,
    /// 推断出的行：只在解析阶段存在，最终会被展平或转换为 Mrow
    InferredMrow,
    /// 带 TeX 类别的原子（花括号分组、`\mathop` 等）
    TexAtom,
    Mfrac,
    Msqrt,
    Mroot,
    Msub,
    Msup,
    Msubsup,
    Munder,
    Mover,
    Munderover,
    Mtable,
    Mtr,
    Mlabeledtr,
    Mtd,
    Mstyle,
    Mpadded,
    Mphantom,
    Menclose,
}

impl NodeKind {
    pub fn tag_name(self) -> &'static str {
        match self {
            NodeKind::Math => "math",
            NodeKind::Mi => "mi",
            NodeKind::Mn => "mn",
            NodeKind::Mo => "mo",
            NodeKind::Mtext => "mtext",
            NodeKind::Mspace => "mspace",
            NodeKind::Ms => "ms",
            NodeKind::Mglyph => "mglyph",
            NodeKind::Mrow | NodeKind::InferredMrow | NodeKind::TexAtom => "mrow",
            NodeKind::Mfrac => "mfrac",
            NodeKind::Msqrt => "msqrt",
            NodeKind::Mroot => "mroot",
            NodeKind::Msub => "msub",
            NodeKind::Msup => "msup",
            NodeKind::Msubsup => "msubsup",
            NodeKind::Munder => "munder",
            NodeKind::Mover => "mover",
            NodeKind::Munderover => "munderover",
            NodeKind::Mtable => "mtable",
            NodeKind::Mtr => "mtr",
            NodeKind::Mlabeledtr => "mlabeledtr",
            NodeKind::Mtd => "mtd",
            NodeKind::Mstyle => "mstyle",
            NodeKind::Mpadded => "mpadded",
            NodeKind::Mphantom => "mphantom",
            NodeKind::Menclose => "menclose",
        }
    }

    /// 根据元素名查找记号类节点，供 `\mmlToken` 使用
    pub fn token_from_name(name: &str) -> Option<NodeKind> {
        match name {
            "mi" => Some(NodeKind::Mi),
            "mn" => Some(NodeKind::Mn),
            "mo" => Some(NodeKind::Mo),
            "mtext" => Some(NodeKind::Mtext),
            "mspace" => Some(NodeKind::Mspace),
            "ms" => Some(NodeKind::Ms),
            "mglyph" => Some(NodeKind::Mglyph),
            _ => None,
        }
    }

    pub fn is_token(self) -> bool {
        matches!(
            self,
            NodeKind::Mi
                | NodeKind::Mn
                | NodeKind::Mo
                | NodeKind::Mtext
                | NodeKind::Mspace
                | NodeKind::Ms
                | NodeKind::Mglyph
        )
    }

    /// 子节点按位置区分含义的节点（上下标、分式等）
    pub fn has_fixed_slots(self) -> bool {
        matches!(
            self,
            NodeKind::Mfrac
                | NodeKind::Mroot
                | NodeKind::Msub
                | NodeKind::Msup
                | NodeKind::Msubsup
                | NodeKind::Munder
                | NodeKind::Mover
                | NodeKind::Munderover
        )
    }

    /// 该元素在标记层面认可的默认属性
    pub fn has_default_attribute(self, name: &str) -> bool {
        if COMMON_DEFAULTS.contains(name) {
            return true;
        }
        match self {
            NodeKind::Mi | NodeKind::Mn | NodeKind::Mtext => TOKEN_DEFAULTS.contains(name),
            NodeKind::Mo => TOKEN_DEFAULTS.contains(name) || MO_DEFAULTS.contains(name),
            NodeKind::Mspace => TOKEN_DEFAULTS.contains(name) || MSPACE_DEFAULTS.contains(name),
            NodeKind::Ms => TOKEN_DEFAULTS.contains(name) || MS_DEFAULTS.contains(name),
            NodeKind::Mglyph => MGLYPH_DEFAULTS.contains(name),
            _ => false,
        }
    }
}

static COMMON_DEFAULTS: phf::Set<&'static str> = phf_set! {
    "mathbackground", "mathcolor", "mathsize", "dir",
};

static TOKEN_DEFAULTS: phf::Set<&'static str> = phf_set! {
    "mathvariant",
};

static MO_DEFAULTS: phf::Set<&'static str> = phf_set! {
    "form", "fence", "separator", "lspace", "rspace", "stretchy", "symmetric",
    "maxsize", "minsize", "largeop", "movablelimits", "accent", "linebreak",
    "lineleading", "linebreakstyle", "linebreakmultchar", "indentalign",
    "indentshift", "indenttarget", "indentalignfirst", "indentshiftfirst",
    "indentalignlast", "indentshiftlast",
};

static MSPACE_DEFAULTS: phf::Set<&'static str> = phf_set! {
    "width", "height", "depth", "linebreak",
};

static MS_DEFAULTS: phf::Set<&'static str> = phf_set! {
    "lquote", "rquote",
};

static MGLYPH_DEFAULTS: phf::Set<&'static str> = phf_set! {
    "alt", "src", "width", "height", "valign",
};

/// TeX 语义类别，决定符号之间的间距
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexClass {
    Ord,
    Op,
    Bin,
    Rel,
    Open,
    Close,
    Punct,
    Inner,
    /// 重音类符号，间距与 Ord 相同
    Accent,
    None,
}

impl TexClass {
    pub fn as_str(self) -> &'static str {
        match self {
            TexClass::Ord => "ORD",
            TexClass::Op => "OP",
            TexClass::Bin => "BIN",
            TexClass::Rel => "REL",
            TexClass::Open => "OPEN",
            TexClass::Close => "CLOSE",
            TexClass::Punct => "PUNCT",
            TexClass::Inner => "INNER",
            TexClass::Accent => "ACCENT",
            TexClass::None => "NONE",
        }
    }
}

/// 解析期属性的取值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// 上下标节点中的槽位
pub const BASE: usize = 0;
pub const SUB: usize = 1;
pub const SUP: usize = 2;
pub const UNDER: usize = 1;
pub const OVER: usize = 2;

/// 输出树中的一个节点；节点由父节点独占
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    children: Vec<Option<Node>>,
    /// 输出给渲染端的属性
    pub attributes: BTreeMap<String, String>,
    /// 解析期标志（movesupsub、subsupOK 等），会影响后续的上下标处理
    properties: BTreeMap<&'static str, Value>,
    pub texclass: Option<TexClass>,
    pub text: Option<String>,
}

impl Node {
    pub fn new(kind: NodeKind, children: Vec<Node>) -> Self {
        Self {
            kind,
            children: children.into_iter().map(Some).collect(),
            attributes: BTreeMap::new(),
            properties: BTreeMap::new(),
            texclass: None,
            text: None,
        }
    }

    pub fn token(kind: NodeKind, text: impl Into<String>) -> Self {
        let mut node = Self::new(kind, Vec::new());
        node.text = Some(text.into());
        node
    }

    /// 带固定槽位的空节点，例如 `msubsup` 的三个位置
    pub fn with_slots(kind: NodeKind, base: Node, slots: usize) -> Self {
        let mut node = Self::new(kind, vec![base]);
        node.children.resize(slots, None);
        node
    }

    pub fn atom(class: TexClass, children: Vec<Node>) -> Self {
        let mut node = Self::new(NodeKind::TexAtom, children);
        node.texclass = Some(class);
        node
    }

    pub fn row(children: Vec<Node>) -> Self {
        Self::new(NodeKind::Mrow, children)
    }

    pub fn is(&self, kind: NodeKind) -> bool {
        self.kind == kind
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children.get(index).and_then(|c| c.as_ref())
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.children.get_mut(index).and_then(|c| c.as_mut())
    }

    /// 位置 `index` 上是否已经填入节点
    pub fn has_child(&self, index: usize) -> bool {
        self.child(index).is_some()
    }

    pub fn set_child(&mut self, index: usize, node: Node) {
        if self.children.len() <= index {
            self.children.resize(index + 1, None);
        }
        self.children[index] = Some(node);
    }

    pub fn push_child(&mut self, node: Node) {
        self.children.push(Some(node));
    }

    /// 按顺序迭代所有已填入的子节点
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(|c| c.as_ref())
    }

    /// 保留空槽位的原始子节点序列
    pub fn slots(&self) -> &[Option<Node>] {
        &self.children
    }

    pub(crate) fn slots_mut(&mut self) -> &mut Vec<Option<Node>> {
        &mut self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn into_children(self) -> Vec<Node> {
        self.children.into_iter().flatten().collect()
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_property(&mut self, name: &'static str, value: Value) {
        self.properties.insert(name, value);
    }

    pub fn set_flag(&mut self, name: &'static str, value: bool) {
        self.properties.insert(name, Value::Bool(value));
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// 布尔属性，缺省视为 false
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.properties.get(name), Some(Value::Bool(true)))
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// 收集整棵子树中记号节点的文本
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in self.children() {
            child.collect_text(out);
        }
    }

    /// 是否是被修饰的运算符（运算符本身或以运算符为核心的上下标结构）
    pub fn is_embellished_op(&self) -> bool {
        self.core_mo().is_some()
    }

    /// 返回被修饰运算符的核心 `mo`
    pub fn core_mo(&self) -> Option<&Node> {
        match self.kind {
            NodeKind::Mo => Some(self),
            NodeKind::Msub
            | NodeKind::Msup
            | NodeKind::Msubsup
            | NodeKind::Munder
            | NodeKind::Mover
            | NodeKind::Munderover
            | NodeKind::Mfrac => self.child(BASE).and_then(Node::core_mo),
            NodeKind::Mrow | NodeKind::InferredMrow | NodeKind::Mstyle | NodeKind::Mpadded => {
                let mut children = self.children();
                match (children.next(), children.next()) {
                    (Some(only), None) => only.core_mo(),
                    _ => None,
                }
            }
            NodeKind::TexAtom => {
                if self.texclass == Some(TexClass::Op) {
                    None
                } else {
                    let mut children = self.children();
                    match (children.next(), children.next()) {
                        (Some(only), None) => only.core_mo(),
                        _ => None,
                    }
                }
            }
            _ => None,
        }
    }

    pub fn core_mo_mut(&mut self) -> Option<&mut Node> {
        if self.core_mo().is_none() {
            return None;
        }
        match self.kind {
            NodeKind::Mo => Some(self),
            NodeKind::Msub
            | NodeKind::Msup
            | NodeKind::Msubsup
            | NodeKind::Munder
            | NodeKind::Mover
            | NodeKind::Munderover
            | NodeKind::Mfrac => self.child_mut(BASE).and_then(Node::core_mo_mut),
            _ => self
                .children
                .iter_mut()
                .flatten()
                .next()
                .and_then(Node::core_mo_mut),
        }
    }

    /// TeX 类别：显式设定优先，否则取核心运算符的类别
    pub fn effective_class(&self) -> TexClass {
        if let Some(class) = self.texclass {
            return class;
        }
        if self.kind == NodeKind::Mo {
            return crate::opdict::default_class(self.text());
        }
        match self.core_mo() {
            Some(mo) if !std::ptr::eq(mo, self) => mo.effective_class(),
            _ => TexClass::Ord,
        }
    }
}

pub type ParseResult<T> = Result<T, TexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_keep_positions() {
        let mut node = Node::with_slots(NodeKind::Msubsup, Node::token(NodeKind::Mi, "x"), 3);
        assert!(node.has_child(BASE));
        assert!(!node.has_child(SUP));
        node.set_child(SUP, Node::token(NodeKind::Mn, "2"));
        assert_eq!(node.child(SUP).map(Node::text), Some("2"));
        assert_eq!(node.children().count(), 2);
        assert_eq!(node.child_count(), 3);
    }

    #[test]
    fn core_mo_looks_through_scripts() {
        let mut sum = Node::token(NodeKind::Mo, "∑");
        sum.texclass = Some(TexClass::Op);
        let scripted = Node::with_slots(NodeKind::Munderover, sum, 3);
        assert_eq!(scripted.core_mo().map(Node::text), Some("∑"));
        assert_eq!(scripted.effective_class(), TexClass::Op);
        assert!(Node::token(NodeKind::Mi, "x").core_mo().is_none());
    }

    #[test]
    fn default_attribute_sets() {
        assert!(NodeKind::Mo.has_default_attribute("stretchy"));
        assert!(NodeKind::Mi.has_default_attribute("mathvariant"));
        assert!(!NodeKind::Mi.has_default_attribute("stretchy"));
        assert!(NodeKind::Mspace.has_default_attribute("width"));
    }
}
