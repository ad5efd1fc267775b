//! 解析栈：每个栈元素代表一个尚未闭合的语法上下文
//!
//! 压栈时由栈顶元素检查新元素（`check`），结果有三种：两者都留在栈上、新元素被栈顶吸收、
//! 或者弹出栈顶并把一组替换元素依次重新压栈。产生的节点以 `Mml` 元素的形式压入，
//! 最终被某个上下文吸收。

use std::collections::VecDeque;

use crate::ast::{Node, NodeKind, ParseResult, TexClass, OVER, SUP};
use crate::error::TexError;
use crate::tags::TagRegistry;

use super::array::{self, ArrayState};
use super::rules::operators::negated;
use super::util::{fenced, fixed_fence};

/// 字母连写规则：字体命令内部和 `\operatorname` 内部使用不同的模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Letters {
    Identifiers,
    OperatorName,
}

/// 随上下文复制、随上下文结束而恢复的状态
#[derive(Debug, Clone, Default)]
pub(crate) struct Env {
    pub font: Option<&'static str>,
    pub letters: Option<Letters>,
    pub in_root: bool,
    pub color: Option<String>,
}

/// 单个解析器内共享的状态
#[derive(Debug, Clone, Default)]
pub(crate) struct Global {
    pub is_inner: bool,
    pub display: bool,
    /// 已经进入过一个带编号的公式环境
    pub eqnenv: bool,
    pub left_root: Option<String>,
    pub up_root: Option<String>,
}

/// `\raise`/`\moveleft` 等命令的位移
#[derive(Debug, Clone)]
pub(crate) enum Shift {
    Vertical { height: String, depth: String },
    Horizontal { left: Node, right: Node },
}

#[derive(Debug, Clone)]
pub(crate) enum ItemKind {
    Start,
    Stop,
    Open,
    Close,
    /// 已完成的节点
    Mml,
    /// 节点为 `[基底, 撇号]`
    Prime,
    /// 节点为待填槽位的上下标结构
    SubSup {
        position: usize,
        primes: Option<Node>,
        movesupsub: Option<bool>,
    },
    Over {
        name: String,
        num: Option<Node>,
        thickness: Option<String>,
        open: Option<String>,
        close: Option<String>,
    },
    Left {
        delim: String,
        color: Option<String>,
    },
    Right {
        delim: String,
        color: Option<String>,
    },
    Middle {
        delim: String,
        color: Option<String>,
    },
    /// `end` 是用户环境替换好参数的结束代码
    Begin {
        name: String,
        end: Option<String>,
    },
    End {
        name: String,
    },
    Style {
        attributes: Vec<(&'static str, String)>,
    },
    Position {
        name: String,
        shift: Shift,
    },
    Cell {
        name: String,
        entry: bool,
        cr: bool,
        linebreak: bool,
    },
    Array(Box<ArrayState>),
    Equation {
        name: String,
    },
    /// 节点为函数名
    Fn,
    Not,
    Dots {
        ldots: Node,
        cdots: Node,
    },
    Null,
}

#[derive(Debug, Clone)]
pub(crate) struct StackItem {
    pub kind: ItemKind,
    pub nodes: Vec<Node>,
    pub env: Env,
}

impl StackItem {
    pub fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            nodes: Vec::new(),
            env: Env::default(),
        }
    }

    pub fn with_nodes(kind: ItemKind, nodes: Vec<Node>) -> Self {
        Self {
            kind,
            nodes,
            env: Env::default(),
        }
    }

    pub fn mml(node: Node) -> Self {
        Self::with_nodes(ItemKind::Mml, vec![node])
    }

    pub fn is_open(&self) -> bool {
        matches!(
            self.kind,
            ItemKind::Start
                | ItemKind::Open
                | ItemKind::Left { .. }
                | ItemKind::Begin { .. }
                | ItemKind::Array(_)
        )
    }

    pub fn is_close(&self) -> bool {
        matches!(
            self.kind,
            ItemKind::Stop
                | ItemKind::Close
                | ItemKind::End { .. }
                | ItemKind::Right { .. }
                | ItemKind::Middle { .. }
                | ItemKind::Cell { .. }
        )
    }

    pub fn is_final(&self) -> bool {
        matches!(self.kind, ItemKind::Mml)
    }

    /// 错误消息中使用的名称
    pub fn name(&self) -> String {
        match &self.kind {
            ItemKind::Over { name, .. }
            | ItemKind::Position { name, .. }
            | ItemKind::Cell { name, .. }
            | ItemKind::Begin { name, .. }
            | ItemKind::End { name }
            | ItemKind::Equation { name } => name.clone(),
            ItemKind::Left { .. } => "\\left".into(),
            ItemKind::Right { .. } => "\\right".into(),
            ItemKind::Middle { .. } => "\\middle".into(),
            _ => String::new(),
        }
    }

    /// 把收集到的节点合成一个节点：单个节点原样返回，否则组成（推断）行
    pub fn to_mml(&mut self, inferred: bool) -> Node {
        if self.nodes.len() == 1 {
            if let Some(node) = self.nodes.pop() {
                return node;
            }
        }
        let kind = if inferred {
            NodeKind::InferredMrow
        } else {
            NodeKind::Mrow
        };
        Node::new(kind, std::mem::take(&mut self.nodes))
    }

    /// 第一个节点，`Mml` 元素就是它携带的节点
    pub fn first(&self) -> Option<&Node> {
        self.nodes.first()
    }
}

/// 栈顶检查的结果
pub(crate) enum Outcome {
    /// 栈顶不变，新元素压在其上
    Keep(StackItem, StackItem),
    /// 新元素被栈顶吸收
    Absorb(StackItem),
    /// 弹出栈顶，依次压入这些元素
    Replace(Vec<StackItem>),
}

/// 检查过程需要访问的外部状态
pub(crate) struct CheckContext<'a> {
    pub tags: &'a mut TagRegistry,
    pub global: &'a Global,
}

#[derive(Debug, Default)]
pub(crate) struct Stack {
    items: Vec<StackItem>,
}

impl Stack {
    pub fn new(env: Env) -> Self {
        let mut start = StackItem::new(ItemKind::Start);
        start.env = env;
        Self { items: vec![start] }
    }

    pub fn top(&self) -> Option<&StackItem> {
        self.items.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut StackItem> {
        self.items.last_mut()
    }

    pub fn pop(&mut self) -> Option<StackItem> {
        self.items.pop()
    }

    /// 栈上的条目数，即当前的嵌套层数
    pub fn depth(&self) -> usize {
        self.items.len()
    }

    pub fn env(&self) -> Env {
        self.items.last().map(|item| item.env.clone()).unwrap_or_default()
    }

    /// 修改当前上下文的状态；栈为空时不做任何事
    pub fn update_env(&mut self, update: impl FnOnce(&mut Env)) {
        if let Some(top) = self.items.last_mut() {
            update(&mut top.env);
        }
    }

    /// 取出栈顶最近产生的节点
    pub fn prev(&mut self) -> Option<Node> {
        self.items.last_mut().and_then(|item| item.nodes.pop())
    }

    pub fn prev_mut(&mut self) -> Option<&mut Node> {
        self.items.last_mut().and_then(|item| item.nodes.last_mut())
    }

    /// 最内层同名环境登记的结束代码
    pub fn pending_end(&self, env: &str) -> Option<String> {
        self.items
            .iter()
            .rev()
            .find_map(|item| match &item.kind {
                ItemKind::Begin { name, end } if name == env => Some(end.clone()),
                _ => None,
            })
            .flatten()
    }

    pub fn push(&mut self, item: StackItem, cx: &mut CheckContext<'_>) -> ParseResult<()> {
        let mut queue = VecDeque::from([item]);
        while let Some(mut item) = queue.pop_front() {
            if matches!(item.kind, ItemKind::Null) {
                continue;
            }
            let Some(top) = self.items.pop() else {
                self.items.push(item);
                continue;
            };
            match check(top, item, cx)? {
                Outcome::Keep(top, item_back) => {
                    item = item_back;
                    // 数组有自己独立的状态，其余上下文继承外层状态
                    if !matches!(item.kind, ItemKind::Array(_)) {
                        item.env = top.env.clone();
                    }
                    self.items.push(top);
                    self.items.push(item);
                }
                Outcome::Absorb(top) => self.items.push(top),
                Outcome::Replace(items) => {
                    for replacement in items.into_iter().rev() {
                        queue.push_front(replacement);
                    }
                }
            }
        }
        Ok(())
    }

    /// 解析结束后栈上只剩一个完成的节点
    pub fn result(&mut self) -> ParseResult<Node> {
        match self.items.pop() {
            Some(StackItem {
                kind: ItemKind::Mml,
                mut nodes,
                ..
            }) if self.items.is_empty() => nodes.pop().ok_or(TexError::ExtraOpenMissingClose),
            _ => Err(TexError::ExtraOpenMissingClose),
        }
    }
}

fn check(top: StackItem, item: StackItem, cx: &mut CheckContext<'_>) -> ParseResult<Outcome> {
    match top.kind {
        ItemKind::Start => check_start(top, item, cx),
        ItemKind::Open => check_open(top, item),
        ItemKind::Prime => Ok(check_prime(top, item)),
        ItemKind::SubSup { .. } => check_subsup(top, item),
        ItemKind::Over { .. } => check_over(top, item),
        ItemKind::Left { .. } => check_left(top, item),
        ItemKind::Begin { .. } => check_begin(top, item),
        ItemKind::Array(_) => array::check(top, item, cx),
        ItemKind::Equation { .. } => check_equation(top, item, cx),
        ItemKind::Fn => check_fn(top, item),
        ItemKind::Not => check_not(top, item),
        ItemKind::Dots { .. } => check_dots(top, item),
        ItemKind::Style { .. } => check_style(top, item),
        ItemKind::Position { .. } => check_position(top, item),
        _ => base_check(top, item),
    }
}

/// 栈顶遇到 stop 时报告的错误
fn stop_error(top: &ItemKind) -> Option<TexError> {
    match top {
        ItemKind::Open => Some(TexError::ExtraOpenMissingClose),
        ItemKind::Left { .. } => Some(TexError::ExtraLeftMissingRight),
        ItemKind::SubSup { .. } => Some(TexError::MissingScript),
        ItemKind::Begin { name, .. } | ItemKind::Equation { name } => {
            Some(TexError::EnvMissingEnd(name.clone()))
        }
        _ => None,
    }
}

/// 闭合类元素到达一个不接受它的上下文
fn close_error(item: &StackItem, on_stop: Option<TexError>) -> Option<TexError> {
    match &item.kind {
        ItemKind::Stop => on_stop,
        ItemKind::Close => Some(TexError::ExtraCloseMissingOpen),
        ItemKind::End { name } => Some(TexError::MissingBeginExtraEnd(name.clone())),
        ItemKind::Right { .. } => Some(TexError::MissingLeftExtraRight("\\right".into())),
        ItemKind::Middle { .. } => Some(TexError::ExtraMiddle),
        _ => None,
    }
}

pub(crate) fn base_check(mut top: StackItem, mut item: StackItem) -> ParseResult<Outcome> {
    if top.is_open() {
        if let ItemKind::Over { num, .. } = &mut item.kind {
            *num = Some(top.to_mml(false));
        }
        if let ItemKind::Cell {
            name, linebreak, ..
        } = &item.kind
        {
            if *linebreak {
                return Ok(Outcome::Absorb(top));
            }
            return Err(TexError::Misplaced(name.clone()));
        }
    }
    if item.is_close() {
        if let Some(err) = close_error(&item, stop_error(&top.kind)) {
            return Err(err);
        }
    }
    if item.is_final() {
        top.nodes.append(&mut item.nodes);
        return Ok(Outcome::Absorb(top));
    }
    Ok(Outcome::Keep(top, item))
}

fn check_start(mut top: StackItem, item: StackItem, cx: &mut CheckContext<'_>) -> ParseResult<Outcome> {
    if matches!(item.kind, ItemKind::Stop) {
        let node = top.to_mml(true);
        let node = if cx.global.is_inner {
            node
        } else {
            cx.tags.finalize(node, cx.global.display)
        };
        return Ok(Outcome::Replace(vec![StackItem::mml(node)]));
    }
    base_check(top, item)
}

fn check_open(mut top: StackItem, item: StackItem) -> ParseResult<Outcome> {
    if matches!(item.kind, ItemKind::Close) {
        let inner = top.to_mml(true);
        let atom = Node::atom(TexClass::Ord, vec![inner]);
        return Ok(Outcome::Replace(vec![StackItem::mml(atom)]));
    }
    base_check(top, item)
}

fn check_prime(mut top: StackItem, item: StackItem) -> Outcome {
    let (Some(primes), Some(mut base)) = (top.nodes.pop(), top.nodes.pop()) else {
        return Outcome::Replace(vec![item]);
    };
    let open_sup = base.kind == NodeKind::Msubsup && !base.has_child(SUP);
    let open_over =
        base.kind == NodeKind::Munderover && !base.has_child(OVER) && !base.flag("subsupOK");
    let node = if open_sup || open_over {
        base.set_child(SUP, primes);
        base
    } else {
        let kind = if base.flag("movesupsub") {
            NodeKind::Mover
        } else {
            NodeKind::Msup
        };
        Node::new(kind, vec![base, primes])
    };
    Outcome::Replace(vec![StackItem::mml(node), item])
}

fn check_subsup(top: StackItem, item: StackItem) -> ParseResult<Outcome> {
    if matches!(item.kind, ItemKind::Open | ItemKind::Left { .. }) {
        return Ok(Outcome::Keep(top, item));
    }
    let ItemKind::SubSup {
        position,
        primes,
        movesupsub,
    } = top.kind
    else {
        return base_check(top, item);
    };
    if item.is_final() {
        let (Some(mut base), Some(mut script)) =
            (top.nodes.into_iter().next(), item.nodes.into_iter().next())
        else {
            return Err(TexError::MissingScript);
        };
        if let Some(mut primes) = primes {
            if position != SUP {
                base.set_child(SUP, primes);
            } else {
                primes.set_flag("variantForm", true);
                script = Node::row(vec![primes, script]);
            }
        }
        base.set_child(position, script);
        if let Some(value) = movesupsub {
            base.set_flag("movesupsub", value);
        }
        return Ok(Outcome::Replace(vec![StackItem::mml(base)]));
    }
    if item.is_close() {
        if let Some(err) = close_error(&item, Some(TexError::MissingScript)) {
            return Err(err);
        }
    }
    Err(if position == SUP {
        TexError::MissingOpenForSup
    } else {
        TexError::MissingOpenForSub
    })
}

fn check_over(mut top: StackItem, item: StackItem) -> ParseResult<Outcome> {
    if matches!(item.kind, ItemKind::Over { .. }) {
        return Err(TexError::AmbiguousUseOf(item.name()));
    }
    if !item.is_close() {
        return base_check(top, item);
    }
    let den = top.to_mml(false);
    let ItemKind::Over {
        num,
        thickness,
        open,
        close,
        ..
    } = top.kind
    else {
        return base_check(top, item);
    };
    let num = num.unwrap_or_else(|| Node::row(Vec::new()));
    let mut frac = Node::new(NodeKind::Mfrac, vec![num, den]);
    if let Some(thickness) = thickness {
        frac.set_attribute("linethickness", thickness);
    }
    let open = open.filter(|s| !s.is_empty());
    let close = close.filter(|s| !s.is_empty());
    if open.is_some() || close.is_some() {
        frac.set_flag("withDelims", true);
        frac = fixed_fence(open.as_deref(), frac, close.as_deref());
    }
    Ok(Outcome::Replace(vec![StackItem::mml(frac), item]))
}

fn check_left(mut top: StackItem, item: StackItem) -> ParseResult<Outcome> {
    match item.kind {
        ItemKind::Right { delim, color } => {
            let inner = top.to_mml(true);
            let ItemKind::Left {
                delim: open,
                color: open_color,
            } = top.kind
            else {
                return Err(TexError::MissingLeftExtraRight("\\right".into()));
            };
            let node = fenced(
                &open,
                inner,
                &delim,
                open_color.as_deref(),
                color.as_deref(),
            );
            Ok(Outcome::Replace(vec![StackItem::mml(node)]))
        }
        ItemKind::Middle { delim, color } => {
            let mut mo = Node::token(NodeKind::Mo, delim);
            mo.set_attribute("stretchy", "true");
            if let Some(color) = color {
                mo.set_attribute("mathcolor", color);
            }
            top.nodes.push(Node::atom(TexClass::Close, Vec::new()));
            top.nodes.push(mo);
            top.nodes.push(Node::atom(TexClass::Open, Vec::new()));
            Ok(Outcome::Absorb(top))
        }
        _ => base_check(top, item),
    }
}

fn check_begin(mut top: StackItem, item: StackItem) -> ParseResult<Outcome> {
    let begin = top.name();
    match &item.kind {
        ItemKind::End { name } if *name != begin => {
            Err(TexError::EnvBadEnd(begin, name.clone()))
        }
        ItemKind::End { .. } => {
            let node = top.to_mml(true);
            Ok(Outcome::Replace(vec![StackItem::mml(node)]))
        }
        ItemKind::Stop => Err(TexError::EnvMissingEnd(begin)),
        _ => base_check(top, item),
    }
}

fn check_equation(
    mut top: StackItem,
    item: StackItem,
    cx: &mut CheckContext<'_>,
) -> ParseResult<Outcome> {
    match item.kind {
        ItemKind::End { .. } => {
            let node = top.to_mml(true);
            let tag = cx.tags.get_tag(false);
            cx.tags.end();
            let node = match tag {
                Some(tag) => cx.tags.en_tag(node, tag),
                None => node,
            };
            Ok(Outcome::Replace(vec![StackItem::mml(node), item]))
        }
        ItemKind::Stop => Err(TexError::EnvMissingEnd(top.name())),
        _ => base_check(top, item),
    }
}

/// 函数名之后除非紧跟二元、关系、右括号、标点或空白，否则插入函数应用符号
fn check_fn(mut top: StackItem, item: StackItem) -> ParseResult<Outcome> {
    if top.nodes.is_empty() {
        return base_check(top, item);
    }
    if item.is_open() {
        return Ok(Outcome::Keep(top, item));
    }
    let func = top.nodes.remove(0);
    let apply = match &item.kind {
        ItemKind::Fn => true,
        ItemKind::Mml => item.first().map_or(false, needs_apply),
        _ => false,
    };
    let mut items = vec![StackItem::mml(func)];
    if apply {
        let mut mo = Node::token(NodeKind::Mo, "\u{2061}");
        mo.texclass = Some(TexClass::None);
        items.push(StackItem::mml(mo));
    }
    items.push(item);
    Ok(Outcome::Replace(items))
}

fn needs_apply(next: &Node) -> bool {
    let is_space = next.kind == NodeKind::Mspace
        || (next.kind == NodeKind::Mstyle
            && next.child(0).map_or(false, |c| c.kind == NodeKind::Mspace));
    if is_space {
        return false;
    }
    match next.core_mo() {
        Some(mo) => !matches!(
            mo.effective_class(),
            TexClass::Bin | TexClass::Rel | TexClass::Close | TexClass::Punct
        ),
        None => true,
    }
}

/// `\not`：单字符符号换成对应的否定字符或叠加斜线，其余情况放一个零宽斜线
fn check_not(top: StackItem, mut item: StackItem) -> ParseResult<Outcome> {
    if matches!(item.kind, ItemKind::Open | ItemKind::Left { .. }) {
        return Ok(Outcome::Keep(top, item));
    }
    if item.is_final() {
        if let Some(node) = item.nodes.first_mut() {
            let negatable = matches!(node.kind, NodeKind::Mo | NodeKind::Mi | NodeKind::Mtext)
                && node.text().chars().count() == 1
                && !node.flag("movesupsub");
            if negatable {
                let text = match negated(node.text()) {
                    Some(replacement) => replacement.to_string(),
                    None => format!("{}\u{338}", node.text()),
                };
                node.text = Some(text);
                return Ok(Outcome::Replace(vec![item]));
            }
        }
    }
    let mut padded = Node::new(
        NodeKind::Mpadded,
        vec![Node::token(NodeKind::Mtext, "\u{29F8}")],
    );
    padded.set_attribute("width", "0");
    let atom = Node::atom(TexClass::Rel, vec![padded]);
    Ok(Outcome::Replace(vec![StackItem::mml(atom), item]))
}

fn check_dots(top: StackItem, item: StackItem) -> ParseResult<Outcome> {
    if matches!(item.kind, ItemKind::Open | ItemKind::Left { .. }) {
        return Ok(Outcome::Keep(top, item));
    }
    let ItemKind::Dots { ldots, cdots } = top.kind else {
        return Ok(Outcome::Replace(vec![item]));
    };
    let centered = item.is_final()
        && item
            .first()
            .and_then(Node::core_mo)
            .map_or(false, |mo| {
                matches!(mo.effective_class(), TexClass::Bin | TexClass::Rel)
            });
    let dots = if centered { cdots } else { ldots };
    Ok(Outcome::Replace(vec![StackItem::mml(dots), item]))
}

fn check_style(top: StackItem, item: StackItem) -> ParseResult<Outcome> {
    if !item.is_close() {
        return base_check(top, item);
    }
    let ItemKind::Style { attributes } = top.kind else {
        return Ok(Outcome::Replace(vec![item]));
    };
    let mut style = Node::new(NodeKind::Mstyle, top.nodes);
    for (name, value) in attributes {
        style.set_attribute(name, value);
    }
    Ok(Outcome::Replace(vec![StackItem::mml(style), item]))
}

fn check_position(top: StackItem, mut item: StackItem) -> ParseResult<Outcome> {
    if item.is_close() {
        return Err(TexError::MissingBoxFor(top.name()));
    }
    if !item.is_final() {
        return base_check(top, item);
    }
    let ItemKind::Position { shift, .. } = top.kind else {
        return Ok(Outcome::Replace(vec![item]));
    };
    match shift {
        Shift::Vertical { height, depth } => {
            let node = item.to_mml(true);
            let mut padded = Node::new(NodeKind::Mpadded, vec![node]);
            padded.set_attribute("height", height.clone());
            padded.set_attribute("depth", depth);
            padded.set_attribute("voffset", height);
            Ok(Outcome::Replace(vec![StackItem::mml(padded)]))
        }
        Shift::Horizontal { left, right } => Ok(Outcome::Replace(vec![
            StackItem::mml(left),
            item,
            StackItem::mml(right),
        ])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;

    fn mi(text: &str) -> Node {
        Node::token(NodeKind::Mi, text)
    }

    fn push_all(stack: &mut Stack, items: Vec<StackItem>, global: &Global) -> ParseResult<()> {
        let mut tags = TagRegistry::new(&Options::default());
        let mut cx = CheckContext {
            tags: &mut tags,
            global,
        };
        for item in items {
            stack.push(item, &mut cx)?;
        }
        Ok(())
    }

    fn inner() -> Global {
        Global {
            is_inner: true,
            ..Global::default()
        }
    }

    #[test]
    fn groups_become_ord_atoms() {
        let mut stack = Stack::new(Env::default());
        push_all(
            &mut stack,
            vec![
                StackItem::new(ItemKind::Open),
                StackItem::mml(mi("a")),
                StackItem::mml(mi("b")),
                StackItem::new(ItemKind::Close),
                StackItem::new(ItemKind::Stop),
            ],
            &inner(),
        )
        .unwrap();
        let node = stack.result().unwrap();
        assert_eq!(node.kind, NodeKind::TexAtom);
        assert_eq!(node.texclass, Some(TexClass::Ord));
        assert_eq!(node.text_content(), "ab");
    }

    #[test]
    fn unbalanced_groups_report_errors() {
        let mut stack = Stack::new(Env::default());
        let err = push_all(
            &mut stack,
            vec![StackItem::new(ItemKind::Open), StackItem::new(ItemKind::Stop)],
            &inner(),
        );
        assert_eq!(err, Err(TexError::ExtraOpenMissingClose));

        let mut stack = Stack::new(Env::default());
        let err = push_all(&mut stack, vec![StackItem::new(ItemKind::Close)], &inner());
        assert_eq!(err, Err(TexError::ExtraCloseMissingOpen));
    }

    #[test]
    fn mismatched_end_names_both_environments() {
        let mut stack = Stack::new(Env::default());
        let err = push_all(
            &mut stack,
            vec![
                StackItem::new(ItemKind::Begin {
                    name: "b".into(),
                    end: None,
                }),
                StackItem::new(ItemKind::End { name: "a".into() }),
            ],
            &inner(),
        );
        assert_eq!(err, Err(TexError::EnvBadEnd("b".into(), "a".into())));
    }

    #[test]
    fn over_splits_numerator_and_denominator() {
        let mut stack = Stack::new(Env::default());
        push_all(
            &mut stack,
            vec![
                StackItem::mml(mi("a")),
                StackItem::new(ItemKind::Over {
                    name: "\\over".into(),
                    num: None,
                    thickness: None,
                    open: None,
                    close: None,
                }),
                StackItem::mml(mi("b")),
                StackItem::new(ItemKind::Stop),
            ],
            &inner(),
        )
        .unwrap();
        let node = stack.result().unwrap();
        assert_eq!(node.kind, NodeKind::Mfrac);
        assert_eq!(node.child(0).map(Node::text), Some("a"));
        assert_eq!(node.child(1).map(Node::text), Some("b"));
    }

    #[test]
    fn script_requires_an_argument() {
        let mut stack = Stack::new(Env::default());
        let base = Node::with_slots(NodeKind::Msubsup, mi("x"), 3);
        let err = push_all(
            &mut stack,
            vec![
                StackItem::with_nodes(
                    ItemKind::SubSup {
                        position: SUP,
                        primes: None,
                        movesupsub: None,
                    },
                    vec![base],
                ),
                StackItem::new(ItemKind::Stop),
            ],
            &inner(),
        );
        assert_eq!(err, Err(TexError::MissingScript));
    }
}
