//! 内置命令表：每个分类模块提供一张 `phf` 命令表和对应的处理函数
//!
//! `lookup` 依次查询各分类表，`execute` 把命令分派给所属模块。
//! 命令是封闭的枚举，`\let` 可以直接保存它的快照。

pub(crate) mod basic;
pub(crate) mod decorations;
pub(crate) mod delimiters;
pub(crate) mod environments;
pub(crate) mod fractions;
pub(crate) mod functions;
pub(crate) mod matrix;
pub(crate) mod mml;
pub(crate) mod newcommand;
pub(crate) mod operators;
pub(crate) mod references;
pub(crate) mod roots;
pub(crate) mod scripts;
pub(crate) mod spacing;
pub(crate) mod styles;
pub(crate) mod symbols;

use crate::ast::{ParseResult, TexClass};

use super::Parser;

/// 大型运算符与普通运算符的几种排版方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpStyle {
    Plain,
    /// 求和类：上下限可移动
    Large,
    /// 积分类：上下限不移动
    Integral,
    Punct,
}

/// `\over` 一族的参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverStyle {
    pub open: Option<&'static str>,
    pub close: Option<&'static str>,
    /// 从输入中读取两侧定界符
    pub with_delims: bool,
    pub thickness: Option<&'static str>,
    /// 从输入中读取线宽
    pub dimen: bool,
}

/// `\dfrac`、`\binom` 等的固定参数；空串表示省略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FracStyle {
    pub open: &'static str,
    pub close: &'static str,
    pub thickness: &'static str,
    pub style: &'static str,
}

/// 纯 TeX 的矩阵宏（`\matrix{...}` 一类）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixStyle {
    pub open: Option<&'static str>,
    pub close: Option<&'static str>,
    pub align: Option<&'static str>,
    pub spacing: Option<&'static str>,
    pub vspacing: Option<&'static str>,
    pub display: bool,
    pub cases: bool,
}

/// 内置命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    // 符号
    Identifier(&'static str),
    Upright(&'static str),
    Operator(&'static str, OpStyle),
    Delimiter(&'static str),

    // 上下标
    Superscript,
    Subscript,
    Limits(bool),

    // 分式
    Frac,
    Genfrac(Option<FracStyle>),
    CFrac,
    Over(OverStyle),

    // 根号
    Sqrt,
    Root,
    MoveRoot(&'static str),

    // 定界符
    Left,
    Right,
    Middle,
    Big(TexClass, &'static str),

    // 装饰
    Accent(&'static str, bool),
    UnderOver {
        mo: &'static str,
        under: bool,
        stack: bool,
    },
    Overset,
    Underset,
    XArrow(&'static str, u8, u8),

    // 字体与样式
    MathFont(&'static str),
    SetFont(&'static str),
    SetStyle(bool, u8),
    SetSize(&'static str),
    Color,
    TextColor,
    Phantom {
        vertical: bool,
        horizontal: bool,
    },
    Smash,
    Lap(bool),
    HBox {
        level: Option<&'static str>,
        variant: Option<&'static str>,
    },
    FBox,

    // 函数名与运算符
    NamedFn(&'static str),
    NamedOp(&'static str),
    OperatorName,
    Atom(TexClass),
    Not,
    Dots,

    // 空白与位移
    Spacer(&'static str),
    Hskip,
    HSpace,
    RaiseLower(bool),
    MoveLeftRight(bool),
    Tilde,

    // 表格
    Cr,
    CrLaTeX,
    HLine(bool),
    HFill,
    Matrix(MatrixStyle),
    BeginEnd,

    // 定义
    NewCommand,
    NewEnvironment,
    Def,
    Let,
    DeclareMathOperator,
    Macro(&'static str, u8),

    // 编号与引用
    Tag,
    Notag,
    Label,
    Ref(bool),

    MmlToken,
}

/// 按名称（不含反斜杠）查找内置命令
pub fn lookup(name: &str) -> Option<Command> {
    symbols::lookup(name)
        .or_else(|| delimiters::lookup(name))
        .or_else(|| scripts::lookup(name))
        .or_else(|| fractions::lookup(name))
        .or_else(|| roots::lookup(name))
        .or_else(|| decorations::lookup(name))
        .or_else(|| styles::lookup(name))
        .or_else(|| functions::lookup(name))
        .or_else(|| operators::lookup(name))
        .or_else(|| spacing::lookup(name))
        .or_else(|| matrix::lookup(name))
        .or_else(|| environments::lookup(name))
        .or_else(|| newcommand::lookup(name))
        .or_else(|| references::lookup(name))
        .or_else(|| mml::lookup(name))
        .or_else(|| basic::lookup(name))
}

/// 定界符记号（`(`、`\langle` 等）对应的字符
pub fn delimiter_for(token: &str) -> Option<&'static str> {
    delimiters::delimiter_for(token)
}

pub(crate) fn execute(parser: &mut Parser<'_, '_>, command: Command, name: &str) -> ParseResult<()> {
    use Command::*;
    match command {
        Identifier(text) => symbols::identifier(parser, text),
        Upright(text) => symbols::upright(parser, text),
        Operator(text, style) => symbols::operator(parser, text, style),
        Delimiter(text) => delimiters::standalone(parser, text),

        Superscript => scripts::superscript(parser),
        Subscript => scripts::subscript(parser),
        Limits(limits) => scripts::limits(parser, name, limits),

        Frac => fractions::frac(parser, name),
        Genfrac(style) => fractions::genfrac(parser, name, style),
        CFrac => fractions::cfrac(parser, name),
        Over(style) => fractions::over(parser, name, style),

        Sqrt => roots::sqrt(parser, name),
        Root => roots::root(parser, name),
        MoveRoot(id) => roots::move_root(parser, name, id),

        Left => delimiters::left(parser, name),
        Right => delimiters::right(parser, name),
        Middle => delimiters::middle(parser, name),
        Big(class, size) => delimiters::big(parser, name, class, size),

        Accent(mo, stretchy) => decorations::accent(parser, name, mo, stretchy),
        UnderOver { mo, under, stack } => decorations::under_over(parser, name, mo, under, stack),
        Overset => decorations::overset(parser, name, false),
        Underset => decorations::overset(parser, name, true),
        XArrow(mo, left, right) => decorations::xarrow(parser, name, mo, left, right),

        MathFont(variant) => styles::math_font(parser, name, variant),
        SetFont(variant) => styles::set_font(parser, variant),
        SetStyle(display, level) => styles::set_style(parser, display, level),
        SetSize(size) => styles::set_size(parser, size),
        Color => styles::color(parser, name),
        TextColor => styles::text_color(parser, name),
        Phantom {
            vertical,
            horizontal,
        } => styles::phantom(parser, name, vertical, horizontal),
        Smash => styles::smash(parser, name),
        Lap(left) => styles::lap(parser, name, left),
        HBox { level, variant } => styles::hbox(parser, name, level, variant),
        FBox => styles::fbox(parser, name),

        NamedFn(text) => functions::named_fn(parser, text),
        NamedOp(text) => functions::named_op(parser, text),
        OperatorName => functions::operator_name(parser, name),
        Atom(class) => operators::atom(parser, name, class),
        Not => operators::not(parser),
        Dots => operators::dots(parser),

        Spacer(width) => spacing::spacer(parser, width),
        Hskip => spacing::hskip(parser, name),
        HSpace => spacing::hspace(parser, name),
        RaiseLower(raise) => spacing::raise_lower(parser, name, raise),
        MoveLeftRight(left) => spacing::move_left_right(parser, name, left),
        Tilde => spacing::tilde(parser),

        Cr => matrix::cr(parser, name),
        CrLaTeX => matrix::cr_latex(parser, name),
        HLine(dashed) => matrix::hline(parser, name, dashed),
        HFill => matrix::hfill(parser, name),
        Matrix(style) => matrix::matrix(parser, name, style),
        BeginEnd => environments::begin_end(parser, name),

        NewCommand => newcommand::new_command(parser, name),
        NewEnvironment => newcommand::new_environment(parser, name),
        Def => newcommand::def(parser, name),
        Let => newcommand::let_(parser, name),
        DeclareMathOperator => newcommand::declare_math_operator(parser, name),
        Macro(body, params) => basic::expand(parser, name, body, params),

        Tag => references::tag(parser, name),
        Notag => references::notag(parser),
        Label => references::label(parser, name),
        Ref(eq) => references::reference(parser, name, eq),

        MmlToken => mml::mml_token(parser, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_covers_every_category() {
        assert_eq!(lookup("alpha"), Some(Command::Identifier("\u{3B1}")));
        assert!(matches!(lookup("frac"), Some(Command::Frac)));
        assert!(matches!(lookup("sqrt"), Some(Command::Sqrt)));
        assert!(matches!(lookup("left"), Some(Command::Left)));
        assert!(matches!(lookup("hat"), Some(Command::Accent(..))));
        assert!(matches!(lookup("mathbf"), Some(Command::MathFont("bold"))));
        assert!(matches!(lookup("sin"), Some(Command::NamedFn("sin"))));
        assert!(matches!(lookup("begin"), Some(Command::BeginEnd)));
        assert!(matches!(lookup("newcommand"), Some(Command::NewCommand)));
        assert!(matches!(lookup("label"), Some(Command::Label)));
        assert!(matches!(lookup("mmlToken"), Some(Command::MmlToken)));
        assert_eq!(lookup("nosuchcommand"), None);
    }

    #[test]
    fn delimiters_resolve_by_token() {
        assert_eq!(delimiter_for("("), Some("("));
        assert_eq!(delimiter_for("\\langle"), Some("\u{27E8}"));
        assert_eq!(delimiter_for("\\{"), Some("{"));
        assert_eq!(delimiter_for("x"), None);
    }
}
