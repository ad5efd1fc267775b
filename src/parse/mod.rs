//! 解析器：逐字符读取 TeX 源码，把记号压入解析栈，最终得到一棵节点树
//!
//! 控制序列先查用户宏表，再查内置命令表（`rules`）。需要独立解析的参数（分式的分子、
//! 根号的内容等）由子解析器处理，子解析器与外层共享宏表、编号表和展开预算。

mod array;
mod lexer;
pub mod rules;
mod stack;
mod util;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{self, Node, NodeKind, ParseResult};
use crate::config::Options;
use crate::error::TexError;
use crate::macros::{ExpansionBudget, MacroTable};
use crate::opdict;
use crate::tags::TagRegistry;

pub(crate) use lexer::Cursor;
use stack::{CheckContext, Env, Global, ItemKind, Letters, Stack, StackItem};

/// 子解析器的最大嵌套深度
const MAX_NESTING: usize = 64;

/// 所有解析器栈上同时存在的条目总数上限，也就是输出树深度的上限；
/// 后续的整理、序列化与析构都按树深递归
const MAX_LEVELS: usize = 160;

/// `\operatorname` 内部的字母连写模式
static OPERATOR_LETTERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[-*a-z]+").expect("内置正则一定合法"));

/// 一次编译共享的上下文
pub(crate) struct ParseContext<'d> {
    pub(crate) options: &'d Options,
    pub(crate) macros: &'d mut MacroTable,
    pub(crate) tags: &'d mut TagRegistry,
    pub(crate) budget: ExpansionBudget,
    depth: usize,
    /// 外层（挂起的）解析器栈上的条目数之和
    levels: usize,
}

impl<'d> ParseContext<'d> {
    pub(crate) fn new(options: &'d Options, macros: &'d mut MacroTable, tags: &'d mut TagRegistry) -> Self {
        Self {
            options,
            macros,
            tags,
            budget: ExpansionBudget::new(options),
            depth: 0,
            levels: 0,
        }
    }

    /// 进入子解析器；`outer` 是当前解析器栈上的条目数
    fn enter(&mut self, outer: usize) -> ParseResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(TexError::MaxNestingExceeded);
        }
        self.check_levels(outer)?;
        self.depth += 1;
        self.levels += outer;
        Ok(())
    }

    fn leave(&mut self, outer: usize) {
        self.depth = self.depth.saturating_sub(1);
        self.levels = self.levels.saturating_sub(outer);
    }

    fn check_levels(&self, current: usize) -> ParseResult<()> {
        if self.levels + current > MAX_LEVELS {
            return Err(TexError::MaxNestingExceeded);
        }
        Ok(())
    }
}

/// 解析一条公式，返回整理后的 `math` 根节点
pub(crate) fn parse(tex: &str, ctx: &mut ParseContext<'_>) -> ParseResult<Node> {
    let display = ctx.options.display;
    let mut parser = Parser::new(tex, Env::default(), ctx, false);
    let node = parser.finish()?;
    let mut math = Node::new(NodeKind::Math, vec![node]);
    if display {
        math.set_attribute("display", "block");
    }
    ast::finalize(&mut math);
    Ok(math)
}

pub(crate) struct Parser<'p, 'd> {
    pub(crate) cursor: Cursor,
    pub(crate) stack: Stack,
    pub(crate) ctx: &'p mut ParseContext<'d>,
    pub(crate) global: Global,
    /// 正在处理的控制序列（含反斜杠），用于错误消息
    pub(crate) current_cs: String,
}

impl<'p, 'd> Parser<'p, 'd> {
    fn new(text: &str, env: Env, ctx: &'p mut ParseContext<'d>, inner: bool) -> Self {
        let global = Global {
            is_inner: inner,
            display: ctx.options.display,
            ..Global::default()
        };
        Self {
            cursor: Cursor::new(text),
            stack: Stack::new(env),
            ctx,
            global,
            current_cs: String::new(),
        }
    }

    /// 读完输入并压入 stop，返回结果节点
    fn finish(&mut self) -> ParseResult<Node> {
        self.parse_all()?;
        self.push_item(StackItem::new(ItemKind::Stop))?;
        self.stack.result()
    }

    fn parse_all(&mut self) -> ParseResult<()> {
        while let Some(ch) = self.cursor.consume_char() {
            self.dispatch_char(ch)?;
        }
        Ok(())
    }

    pub(crate) fn push(&mut self, node: Node) -> ParseResult<()> {
        if node.kind == NodeKind::InferredMrow && node.attributes.is_empty() {
            for child in node.into_children() {
                self.push(child)?;
            }
            return Ok(());
        }
        self.push_item(StackItem::mml(node))
    }

    pub(crate) fn push_all(&mut self, nodes: Vec<Node>) -> ParseResult<()> {
        for node in nodes {
            self.push(node)?;
        }
        Ok(())
    }

    pub(crate) fn push_item(&mut self, item: StackItem) -> ParseResult<()> {
        let mut cx = CheckContext {
            tags: &mut *self.ctx.tags,
            global: &self.global,
        };
        self.stack.push(item, &mut cx)?;
        self.ctx.check_levels(self.stack.depth())
    }

    pub(crate) fn env(&self) -> Env {
        self.stack.env()
    }

    pub(crate) fn options(&self) -> &'d Options {
        self.ctx.options
    }

    /// 在给定状态下解析一段独立的文本
    pub(crate) fn parse_text(&mut self, text: &str, env: Env) -> ParseResult<Node> {
        self.parse_text_with(text, env).map(|(node, _)| node)
    }

    /// 与 `parse_text` 相同，同时返回子解析器的共享状态
    pub(crate) fn parse_text_with(&mut self, text: &str, env: Env) -> ParseResult<(Node, Global)> {
        let outer = self.stack.depth();
        self.ctx.enter(outer)?;
        let mut sub = Parser::new(text, env, &mut *self.ctx, true);
        let result = sub.finish();
        let global = std::mem::take(&mut sub.global);
        self.ctx.leave(outer);
        result.map(|node| (node, global))
    }

    /// 读取一个参数并在当前状态下解析
    pub(crate) fn parse_arg(&mut self, name: &str) -> ParseResult<Node> {
        let text = self.cursor.get_argument(name)?;
        let env = self.env();
        self.parse_text(&text, env)
    }

    /// 在当前栈上解析一段文本，之后继续读原来的输入
    pub(crate) fn parse_inline(&mut self, text: &str) -> ParseResult<()> {
        let rest = self.cursor.take_rest();
        self.cursor.reset(text);
        let result = self.parse_all();
        self.cursor.reset(&rest);
        result
    }

    /// 把文本拼到未读输入之前，并计入展开预算
    pub(crate) fn splice(&mut self, text: &str) -> ParseResult<()> {
        let max_buffer = self.ctx.budget.max_buffer();
        self.cursor.splice(text, max_buffer)?;
        self.ctx.budget.charge()
    }

    /// 读取定界符：内置定界符或 `\let` 绑定的定界符
    pub(crate) fn get_delimiter(&mut self, name: &str, brace_ok: bool) -> ParseResult<String> {
        let token = self
            .cursor
            .delimiter_token(name, brace_ok)?
            .ok_or_else(|| TexError::MissingOrUnrecognizedDelim(name.to_string()))?;
        if let Some(delim) = rules::delimiter_for(&token) {
            return Ok(delim.to_string());
        }
        if let Some(cs) = token.strip_prefix('\\') {
            if let Some(delim) = self.ctx.macros.delimiter(cs) {
                return Ok(delim.to_string());
            }
        }
        Err(TexError::MissingOrUnrecognizedDelim(name.to_string()))
    }

    fn dispatch_char(&mut self, ch: char) -> ParseResult<()> {
        match ch {
            '\\' => self.control_sequence(),
            '{' => self.push_item(StackItem::new(ItemKind::Open)),
            '}' => self.push_item(StackItem::new(ItemKind::Close)),
            '~' => self.push(util::text_node("\u{A0}", None)),
            '^' => rules::scripts::superscript(self),
            '_' => rules::scripts::subscript(self),
            '\'' | '\u{2019}' => rules::scripts::prime(self, ch),
            '&' => rules::matrix::entry(self, "&"),
            '#' => Err(TexError::CantUseHash1),
            '%' => {
                self.cursor.skip_to_end_of_line();
                Ok(())
            }
            c if c.is_whitespace() => Ok(()),
            c if c.is_ascii_alphabetic() => self.letter(c),
            c if c.is_ascii_digit() || c == '.' || c == ',' => self.digit(c),
            c => self.other(c),
        }
    }

    fn control_sequence(&mut self) -> ParseResult<()> {
        let name = self.cursor.next_control_sequence();
        let cs = format!("\\{name}");
        self.current_cs = cs.clone();
        if let Some(def) = self.ctx.macros.lookup(&name).cloned() {
            return rules::newcommand::expand(self, &cs, def);
        }
        match rules::lookup(&name) {
            Some(command) => rules::execute(self, command, &cs),
            None => Err(TexError::UndefinedControlSequence(cs)),
        }
    }

    fn letter(&mut self, ch: char) -> ParseResult<()> {
        let env = self.env();
        let mut text = ch.to_string();
        if let (Some(letters), Some(_)) = (env.letters, env.font) {
            let start = self.cursor.position().saturating_sub(1);
            let rest = self.cursor.text_from(start);
            let pattern = match letters {
                Letters::Identifiers => &self.options().multi_letter_identifiers,
                Letters::OperatorName => &*OPERATOR_LETTERS,
            };
            if let Some(found) = pattern.find(&rest).filter(|m| m.start() == 0 && !m.is_empty()) {
                text = found.as_str().to_string();
                self.cursor.set_position(start + text.chars().count());
            }
        }
        let mut mi = Node::token(NodeKind::Mi, text);
        if let Some(font) = env.font {
            mi.set_attribute("mathvariant", font);
        }
        self.push(mi)
    }

    fn digit(&mut self, ch: char) -> ParseResult<()> {
        let start = self.cursor.position().saturating_sub(1);
        let rest = self.cursor.text_from(start);
        let found = self
            .options()
            .digits
            .find(&rest)
            .filter(|m| m.start() == 0 && !m.is_empty())
            .map(|m| m.as_str().to_string());
        let Some(number) = found else {
            return self.other(ch);
        };
        self.cursor.set_position(start + number.chars().count());
        let mut mn = Node::token(NodeKind::Mn, number.replace("{}", ""));
        if let Some(font) = self.env().font {
            mn.set_attribute("mathvariant", font);
        }
        self.push(mn)
    }

    fn other(&mut self, ch: char) -> ParseResult<()> {
        let ch = match ch {
            '-' => '\u{2212}',
            '*' => '\u{2217}',
            '`' => '\u{2018}',
            c => c,
        };
        let range = opdict::range_of(ch);
        let kind = range.map_or(NodeKind::Mo, |r| r.kind);
        let text = ch.to_string();
        let mut node = Node::token(kind, text.as_str());
        if let Some(font) = self.env().font {
            node.set_attribute("mathvariant", font);
        }
        if let Some(variant) = range.and_then(|r| r.variant) {
            node.set_attribute("mathvariant", variant);
        }
        if kind == NodeKind::Mo && opdict::is_stretchy(&text) {
            node.set_attribute("stretchy", "false");
        }
        self.push(node)
    }
}

/// 规则模块测试共用的编译入口
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::serialize::to_mathml;

    pub(crate) fn compile_with(tex: &str, options: &Options) -> ParseResult<String> {
        let mut macros = MacroTable::new();
        let mut tags = TagRegistry::new(options);
        let mut ctx = ParseContext::new(options, &mut macros, &mut tags);
        parse(tex, &mut ctx).map(|node| to_mathml(&node))
    }

    pub(crate) fn inline(tex: &str) -> ParseResult<String> {
        compile_with(tex, &Options::inline())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::to_mathml;
    use pretty_assertions::assert_eq;

    fn parse_with(tex: &str, options: &Options) -> ParseResult<Node> {
        let mut macros = MacroTable::new();
        let mut tags = TagRegistry::new(options);
        let mut ctx = ParseContext::new(options, &mut macros, &mut tags);
        parse(tex, &mut ctx)
    }

    fn inline(tex: &str) -> ParseResult<String> {
        parse_with(tex, &Options::inline()).map(|node| to_mathml(&node))
    }

    #[test]
    fn letters_digits_and_operators() {
        assert_eq!(
            inline("x+12.5").unwrap(),
            "<math><mi>x</mi><mo>+</mo><mn>12.5</mn></math>"
        );
    }

    #[test]
    fn minus_is_remapped() {
        assert_eq!(inline("a-b").unwrap(), "<math><mi>a</mi><mo>\u{2212}</mo><mi>b</mi></math>");
    }

    #[test]
    fn grouped_digits_drop_braces() {
        assert_eq!(inline("1{,}000").unwrap(), "<math><mn>1,000</mn></math>");
    }

    #[test]
    fn standalone_parenthesis_is_not_stretchy() {
        assert_eq!(
            inline("(x)").unwrap(),
            "<math><mo stretchy=\"false\">(</mo><mi>x</mi><mo stretchy=\"false\">)</mo></math>"
        );
    }

    #[test]
    fn comments_and_whitespace_are_ignored() {
        assert_eq!(inline("a % note\n b").unwrap(), "<math><mi>a</mi><mi>b</mi></math>");
    }

    #[test]
    fn hash_outside_definition_fails() {
        assert_eq!(inline("a#"), Err(TexError::CantUseHash1));
    }

    #[test]
    fn unknown_command_names_itself() {
        assert_eq!(
            inline("\\nosuchthing"),
            Err(TexError::UndefinedControlSequence("\\nosuchthing".into()))
        );
    }

    #[test]
    fn display_root_is_block() {
        let node = parse_with("x", &Options::default()).unwrap();
        assert_eq!(node.attribute("display"), Some("block"));
    }

    fn nested(open: &str, close: &str, depth: usize) -> String {
        format!("{}x{}", open.repeat(depth), close.repeat(depth))
    }

    #[test]
    fn deep_nesting_is_an_error() {
        assert_eq!(inline(&nested("{", "}", 5000)), Err(TexError::MaxNestingExceeded));
        assert_eq!(
            inline(&nested("\\left(", "\\right)", 1000)),
            Err(TexError::MaxNestingExceeded)
        );
        assert_eq!(
            inline(&nested("\\displaystyle{", "}", 1000)),
            Err(TexError::MaxNestingExceeded)
        );
    }

    #[test]
    fn nesting_below_the_limit_compiles() {
        let out = inline(&nested("{", "}", MAX_LEVELS - 10)).unwrap();
        assert!(out.contains("<mi>x</mi>"));
        assert!(inline(&nested("\\left(", "\\right)", 40)).is_ok());
    }

    #[test]
    fn sub_parsers_count_outer_levels() {
        let half = MAX_LEVELS / 2 + 1;
        let inner = format!("\\sqrt{{{}}}", nested("{", "}", half));
        assert!(inline(&inner).is_ok());
        let outer = format!("{}{inner}{}", "{".repeat(half), "}".repeat(half));
        assert_eq!(inline(&outer), Err(TexError::MaxNestingExceeded));
    }
}
