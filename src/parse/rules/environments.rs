//! `\begin{...}`/`\end{...}`：内置的表格与公式环境，以及 `\newenvironment` 定义的用户环境

use once_cell::sync::Lazy;
use phf::phf_map;
use regex::Regex;

use crate::ast::ParseResult;
use crate::error::TexError;
use crate::macros::{substitute_args, EnvDef};

use super::super::array::ArrayState;
use super::super::lexer::trim_spaces;
use super::super::stack::{ItemKind, StackItem};
use super::super::Parser;
use super::Command;

/// 相邻的多条竖线只保留最后一条
static REPEATED_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^|:]([|:])+").expect("内置正则一定合法"));

static COMMANDS: phf::Map<&'static str, Command> = phf_map! {
    "begin" => Command::BeginEnd,
    "end" => Command::BeginEnd,
};

/// 表格的整体样式：行间、行内或脚本级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableStyle {
    Display,
    Text,
    Script,
}

#[derive(Debug, Clone, Copy)]
enum Environment {
    /// 普通表格；`align` 为空时从参数读取列格式
    Array {
        open: Option<&'static str>,
        close: Option<&'static str>,
        align: Option<&'static str>,
        spacing: Option<&'static str>,
        vspacing: Option<&'static str>,
        style: Option<TableStyle>,
        /// 读取 `[t]`/`[b]`/`[c]` 垂直对齐参数
        valign: bool,
    },
    Equation {
        numbered: bool,
    },
    /// align、gather、eqnarray 等逐行编号的环境
    EqnArray {
        numbered: bool,
        taggable: bool,
        align: &'static str,
        spacing: Option<&'static str>,
    },
    /// aligned、gathered：嵌在公式内部，不编号
    Aligned {
        align: &'static str,
        spacing: Option<&'static str>,
    },
}

const fn matrix(open: Option<&'static str>, close: Option<&'static str>) -> Environment {
    Environment::Array {
        open,
        close,
        align: Some("c"),
        spacing: None,
        vspacing: None,
        style: None,
        valign: false,
    }
}

static ENVIRONMENTS: phf::Map<&'static str, Environment> = phf_map! {
    "array" => Environment::Array {
        open: None,
        close: None,
        align: None,
        spacing: None,
        vspacing: None,
        style: None,
        valign: true,
    },
    "subarray" => Environment::Array {
        open: None,
        close: None,
        align: None,
        spacing: Some("0em"),
        vspacing: Some("0.1em"),
        style: Some(TableStyle::Script),
        valign: false,
    },
    "smallmatrix" => Environment::Array {
        open: None,
        close: None,
        align: Some("c"),
        spacing: Some("0.333em"),
        vspacing: Some(".2em"),
        style: Some(TableStyle::Script),
        valign: false,
    },
    "matrix" => matrix(None, None),
    "pmatrix" => matrix(Some("("), Some(")")),
    "bmatrix" => matrix(Some("["), Some("]")),
    "Bmatrix" => matrix(Some("{"), Some("}")),
    "vmatrix" => matrix(Some("|"), Some("|")),
    "Vmatrix" => matrix(Some("\u{2016}"), Some("\u{2016}")),
    "cases" => Environment::Array {
        open: Some("{"),
        close: Some(""),
        align: Some("ll"),
        spacing: None,
        vspacing: Some(".2em"),
        style: Some(TableStyle::Text),
        valign: false,
    },
    "equation" => Environment::Equation { numbered: true },
    "equation*" => Environment::Equation { numbered: false },
    "align" => Environment::EqnArray {
        numbered: true,
        taggable: true,
        align: "rl",
        spacing: Some("0em 2em"),
    },
    "align*" => Environment::EqnArray {
        numbered: false,
        taggable: true,
        align: "rl",
        spacing: Some("0em 2em"),
    },
    "gather" => Environment::EqnArray {
        numbered: true,
        taggable: true,
        align: "c",
        spacing: None,
    },
    "gather*" => Environment::EqnArray {
        numbered: false,
        taggable: true,
        align: "c",
        spacing: None,
    },
    "eqnarray" => Environment::EqnArray {
        numbered: true,
        taggable: true,
        align: "rcl",
        spacing: Some("0em 0.278em"),
    },
    "eqnarray*" => Environment::EqnArray {
        numbered: false,
        taggable: true,
        align: "rcl",
        spacing: Some("0em 0.278em"),
    },
    "split" => Environment::EqnArray {
        numbered: false,
        taggable: false,
        align: "rl",
        spacing: Some("0em"),
    },
    "aligned" => Environment::Aligned {
        align: "rl",
        spacing: Some("0em 2em"),
    },
    "gathered" => Environment::Aligned {
        align: "c",
        spacing: None,
    },
};

pub(super) fn lookup(name: &str) -> Option<Command> {
    COMMANDS.get(name).copied()
}

pub(super) fn begin_end(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    let env = trim_spaces(&parser.cursor.get_argument(name)?);
    if env.contains('\\') {
        return Err(TexError::InvalidEnv(env));
    }
    if name == "\\end" {
        return end(parser, &env);
    }
    parser.ctx.budget.charge()?;
    if let Some(def) = parser.ctx.macros.environment(&env).cloned() {
        return begin_user(parser, &env, def);
    }
    match ENVIRONMENTS.get(env.as_str()).copied() {
        Some(environment) => begin_builtin(parser, &env, environment),
        None => Err(TexError::UnknownEnv(env)),
    }
}

fn end(parser: &mut Parser<'_, '_>, env: &str) -> ParseResult<()> {
    if parser.ctx.macros.environment(env).is_some() {
        parser.ctx.budget.charge()?;
        if let Some(body) = parser.stack.pending_end(env) {
            tracing::debug!(env, "展开环境结束代码");
            parser.parse_inline(&body)?;
        }
    } else if !ENVIRONMENTS.contains_key(env) {
        return Err(TexError::UnknownEnv(env.to_string()));
    }
    parser.push_item(StackItem::new(ItemKind::End {
        name: env.to_string(),
    }))
}

/// 用户环境：开始代码拼回输入，结束代码替换好参数后记在 `Begin` 上
fn begin_user(parser: &mut Parser<'_, '_>, env: &str, def: EnvDef) -> ParseResult<()> {
    let cs = format!("\\begin{{{env}}}");
    let mut args = Vec::with_capacity(def.params);
    if def.params > 0 {
        if let Some(default) = &def.default {
            let optional = parser.cursor.get_brackets(&cs)?;
            args.push(optional.unwrap_or_else(|| default.clone()));
        }
        while args.len() < def.params {
            args.push(parser.cursor.get_argument(&cs)?);
        }
    }
    let max_buffer = parser.ctx.budget.max_buffer();
    let begin = substitute_args(&def.begin, &args, max_buffer)?;
    let end = substitute_args(&def.end, &args, max_buffer)?;
    tracing::debug!(env, args = args.len(), "展开环境");
    parser.push_item(StackItem::new(ItemKind::Begin {
        name: env.to_string(),
        end: Some(end),
    }))?;
    parser.cursor.splice(&begin, max_buffer)
}

fn begin_builtin(parser: &mut Parser<'_, '_>, env: &str, environment: Environment) -> ParseResult<()> {
    let cs = format!("\\begin{{{env}}}");
    let begin = StackItem::new(ItemKind::Begin {
        name: env.to_string(),
        end: None,
    });
    match environment {
        Environment::Array {
            open,
            close,
            align,
            spacing,
            vspacing,
            style,
            valign,
        } => {
            let vertical = if valign {
                parser.cursor.get_brackets(&cs)?
            } else {
                None
            };
            let align = match align {
                Some(align) => align.to_string(),
                None => parser.cursor.get_argument(&cs)?,
            };
            let mut array = ArrayState::new();
            array.set("columnalign", column_align(&align));
            array.set("columnspacing", spacing.unwrap_or("1em"));
            array.set("rowspacing", vspacing.unwrap_or("4pt"));
            column_lines(&mut array, &align);
            array.open = open.map(str::to_string);
            array.close = close.map(str::to_string);
            match style {
                Some(TableStyle::Display) => array.set("displaystyle", "true"),
                Some(TableStyle::Text) => array.set("displaystyle", "false"),
                Some(TableStyle::Script) => {
                    array.set("displaystyle", "false");
                    array.set("scriptlevel", "1");
                }
                None => {}
            }
            if let Some(vertical) = vertical {
                vertical_align(&mut array, &vertical);
            }
            parser.push_item(begin)?;
            parser.push_item(StackItem::new(ItemKind::Array(Box::new(array))))
        }
        Environment::Equation { numbered } => {
            parser.push_item(begin)?;
            check_eqn_env(parser)?;
            parser.ctx.tags.start(env, true, numbered);
            parser.push_item(StackItem::new(ItemKind::Equation {
                name: env.to_string(),
            }))
        }
        Environment::EqnArray {
            numbered,
            taggable,
            align,
            spacing,
        } => {
            parser.push_item(begin)?;
            if taggable {
                check_eqn_env(parser)?;
            }
            let options = parser.options();
            let mut array = ArrayState::equations();
            array.set("displaystyle", "true");
            array.set("columnalign", column_align(align));
            array.set("columnspacing", spacing.unwrap_or("1em"));
            array.set("rowspacing", "3pt");
            array.set("side", options.tag_side.as_str());
            array.set("minlabelspacing", options.tag_indent.clone());
            parser.ctx.tags.start(env, taggable, numbered);
            parser.push_item(StackItem::new(ItemKind::Array(Box::new(array))))
        }
        Environment::Aligned { align, spacing } => {
            let vertical = parser.cursor.get_brackets(&cs)?;
            let mut array = ArrayState::equations();
            array.set("displaystyle", "true");
            array.set("columnalign", column_align(align));
            array.set("columnspacing", spacing.unwrap_or("1em"));
            array.set("rowspacing", ".5em");
            if let Some(vertical) = vertical {
                vertical_align(&mut array, &vertical);
            }
            parser.push_item(begin)?;
            parser.ctx.tags.start(env, false, false);
            parser.push_item(StackItem::new(ItemKind::Array(Box::new(array))))
        }
    }
}

/// 带编号的公式环境不能互相嵌套
fn check_eqn_env(parser: &mut Parser<'_, '_>) -> ParseResult<()> {
    if parser.global.eqnenv {
        return Err(TexError::ErroneousNestingEq);
    }
    parser.global.eqnenv = true;
    Ok(())
}

/// `lcr` 列格式转成 MathML 的对齐方式列表
fn column_align(align: &str) -> String {
    align
        .chars()
        .filter_map(|c| match c {
            'l' => Some("left"),
            'r' => Some("right"),
            'c' => Some("center"),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// 列格式中的 `|`（实线）与 `:`（虚线）：两端的成为边框，中间的成为列线
fn column_lines(array: &mut ArrayState, align: &str) {
    let raw: String = std::iter::once('c')
        .chain(align.chars())
        .filter(|c| matches!(c, 'c' | 'l' | 'r' | '|' | ':'))
        .collect();
    let lines: Vec<char> = REPEATED_LINES.replace_all(&raw, "$1").chars().collect();
    let is_line = |c: &char| matches!(c, '|' | ':');
    if !lines.iter().any(is_line) {
        return;
    }
    if let Some(first) = lines.first().filter(|c| is_line(c)) {
        array.frame.push("left");
        array.dashed = *first == ':';
    }
    if lines.last().map_or(false, is_line) {
        array.frame.push("right");
    }
    if lines.len() > 2 {
        let inner = lines[1..lines.len() - 1]
            .iter()
            .map(|c| match c {
                '|' => "solid",
                ':' => "dashed",
                _ => "none",
            })
            .collect::<Vec<_>>()
            .join(" ");
        array.set("columnlines", inner);
    }
}

/// `[t]`、`[b]`、`[c]`：表格相对基线的位置
fn vertical_align(array: &mut ArrayState, align: &str) {
    match trim_spaces(align).as_str() {
        "" => {}
        "t" => array.set("align", "baseline 1"),
        "b" => array.set("align", "baseline -1"),
        "c" => array.set("align", "axis"),
        other => array.set("align", other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::parse::testing::{compile_with, inline};
    use pretty_assertions::assert_eq;

    #[test]
    fn column_formats() {
        assert_eq!(column_align("l|cr"), "left center right");
        let mut array = ArrayState::new();
        column_lines(&mut array, "|c:c|");
        assert_eq!(array.frame, vec!["left", "right"]);
        assert_eq!(array.attributes.get("columnlines").map(String::as_str), Some("dashed"));
    }

    #[test]
    fn fenced_matrix() {
        let out = inline("\\begin{pmatrix}a&b\\end{pmatrix}").unwrap();
        assert!(out.starts_with("<math><mrow><mo"));
        assert!(out.contains(
            "<mtable columnalign=\"center\" columnspacing=\"1em\" rowspacing=\"4pt\">\
             <mtr><mtd><mi>a</mi></mtd><mtd><mi>b</mi></mtd></mtr></mtable>"
        ));
    }

    #[test]
    fn framed_array() {
        assert_eq!(
            inline("\\begin{array}{|c|}\\hline a\\\\\\hline\\end{array}").unwrap(),
            "<math><mtable columnalign=\"center\" columnspacing=\"1em\" frame=\"solid\" rowspacing=\"4pt\">\
             <mtr><mtd><mi>a</mi></mtd></mtr></mtable></math>"
        );
    }

    #[test]
    fn mismatched_end_names_both() {
        assert_eq!(
            inline("\\begin{matrix}a\\end{pmatrix}"),
            Err(TexError::EnvBadEnd("matrix".into(), "pmatrix".into()))
        );
        assert_eq!(
            inline("\\begin{matrix}a"),
            Err(TexError::EnvMissingEnd("matrix".into()))
        );
    }

    #[test]
    fn unknown_and_invalid_names() {
        assert_eq!(inline("\\begin{foo}"), Err(TexError::UnknownEnv("foo".into())));
        assert_eq!(inline("\\end{foo}"), Err(TexError::UnknownEnv("foo".into())));
        assert_eq!(inline("\\begin{\\x}"), Err(TexError::InvalidEnv("\\x".into())));
    }

    #[test]
    fn numbered_environments_do_not_nest() {
        assert_eq!(
            inline("\\begin{equation}\\begin{align}x\\end{align}\\end{equation}"),
            Err(TexError::ErroneousNestingEq)
        );
    }

    #[test]
    fn equation_is_numbered() {
        let out = compile_with("\\begin{equation}x\\end{equation}", &Options::default()).unwrap();
        assert!(out.contains("<mlabeledtr><mtd id=\"eqn:1\"><mtext>(1)</mtext></mtd>"));
        let out = compile_with("\\begin{equation*}x\\end{equation*}", &Options::default()).unwrap();
        assert_eq!(out, "<math display=\"block\"><mi>x</mi></math>");
    }

    #[test]
    fn align_rows_are_numbered() {
        let out = compile_with("\\begin{align}a&=b\\\\c&=d\\end{align}", &Options::default()).unwrap();
        assert_eq!(out.matches("<mlabeledtr>").count(), 2);
        assert!(out.contains("(2)"));
        assert!(out.contains("side=\"right\""));
    }

    #[test]
    fn aligned_is_never_numbered() {
        let out = compile_with("\\begin{aligned}a&=b\\end{aligned}", &Options::default()).unwrap();
        assert!(!out.contains("mlabeledtr"));
        assert!(out.contains("<mtd><mi></mi><mo>=</mo><mi>b</mi></mtd>"));
    }
}
