//! 定义类命令（`\newcommand`、`\newenvironment`、`\def`、`\let`、`\DeclareMathOperator`）
//! 与用户宏的展开

use once_cell::sync::Lazy;
use phf::phf_map;
use regex::Regex;

use crate::ast::ParseResult;
use crate::error::TexError;
use crate::macros::{parse_template, substitute_args, AliasSource, MacroDef, CS_NAME};

use super::super::lexer::trim_spaces;
use super::super::Parser;
use super::{delimiters, execute, Command};

static PARAM_COUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").expect("内置正则一定合法"));

static COMMANDS: phf::Map<&'static str, Command> = phf_map! {
    "newcommand" => Command::NewCommand,
    "renewcommand" => Command::NewCommand,
    "newenvironment" => Command::NewEnvironment,
    "renewenvironment" => Command::NewEnvironment,
    "def" => Command::Def,
    "let" => Command::Let,
    "DeclareMathOperator" => Command::DeclareMathOperator,
};

pub(super) fn lookup(name: &str) -> Option<Command> {
    COMMANDS.get(name).copied()
}

/// `[n]` 参数个数
fn param_count(name: &str, count: Option<String>) -> ParseResult<usize> {
    let Some(count) = count else { return Ok(0) };
    let count = trim_spaces(&count);
    if !PARAM_COUNT.is_match(&count) {
        return Err(TexError::IllegalParamNumber(name.to_string()));
    }
    count
        .parse()
        .map_err(|_| TexError::IllegalParamNumber(name.to_string()))
}

/// `\newcommand{\cs}[n][default]{body}`
pub(super) fn new_command(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    let cs = trim_spaces(&parser.cursor.get_argument(name)?);
    let params = parser.cursor.get_brackets(name)?;
    let default = parser.cursor.get_brackets(name)?;
    let body = parser.cursor.get_argument(name)?;
    let cs = cs.strip_prefix('\\').unwrap_or(&cs);
    if !CS_NAME.is_match(cs) {
        return Err(TexError::IllegalControlSequenceName(name.to_string()));
    }
    let params = param_count(name, params)?;
    parser.ctx.macros.define(cs, &body, params, default)
}

/// `\newenvironment{name}[n][default]{begin}{end}`
pub(super) fn new_environment(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    let env = trim_spaces(&parser.cursor.get_argument(name)?);
    let params = parser.cursor.get_brackets(name)?;
    let default = parser.cursor.get_brackets(name)?;
    let begin = parser.cursor.get_argument(name)?;
    let end = parser.cursor.get_argument(name)?;
    let params = param_count(name, params)?;
    parser
        .ctx
        .macros
        .define_environment(&env, &begin, &end, params, default)
}

/// `\def\cs<template>{body}`
pub(super) fn def(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    let cs = parser.cursor.get_cs_name(name)?;
    let full = format!("\\{cs}");
    let template = parser.cursor.get_template(&full)?;
    let (params, delimiters) = parse_template(&full, &template)?;
    let body = parser.cursor.get_argument(name)?;
    parser.ctx.macros.define_template(&cs, &body, params, delimiters)
}

/// `\let\cs=<token>`：右侧在此刻解析，之后的重定义不影响别名
pub(super) fn let_(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    let cs = parser.cursor.get_cs_name(name)?;
    if parser.cursor.next_non_space() == Some('=') {
        parser.cursor.advance(1);
    }
    let source = match parser.cursor.next_non_space() {
        None => return Err(TexError::MissingArgFor(name.to_string())),
        Some('\\') => {
            parser.cursor.advance(1);
            AliasSource::ControlSequence(parser.cursor.next_control_sequence())
        }
        Some(ch) => {
            parser.cursor.advance(1);
            AliasSource::Character(ch)
        }
    };
    if !parser.ctx.macros.alias(&cs, source) {
        tracing::debug!(cs = %cs, "别名右侧未定义，忽略");
    }
    Ok(())
}

/// `\DeclareMathOperator{\cs}{text}`，带星号时上下限放在正下方
pub(super) fn declare_math_operator(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    let star = parser.cursor.get_star();
    let cs = trim_spaces(&parser.cursor.get_argument(name)?);
    let cs = cs.strip_prefix('\\').unwrap_or(&cs);
    if !CS_NAME.is_match(cs) {
        return Err(TexError::IllegalControlSequenceName(name.to_string()));
    }
    let op = parser.cursor.get_argument(name)?;
    let body = format!("\\operatorname{}{{{op}}}", if star { "*" } else { "" });
    parser.ctx.macros.define(cs, &body, 0, None)
}

/// 展开一个用户宏；`cs` 含反斜杠
pub(crate) fn expand(parser: &mut Parser<'_, '_>, cs: &str, def: MacroDef) -> ParseResult<()> {
    match def {
        MacroDef::Text {
            body,
            params,
            default,
        } => {
            let body = if params == 0 {
                body
            } else {
                let mut args = Vec::with_capacity(params);
                if let Some(default) = default {
                    let optional = parser.cursor.get_brackets(cs)?;
                    args.push(optional.unwrap_or(default));
                }
                while args.len() < params {
                    args.push(parser.cursor.get_argument(cs)?);
                }
                substitute_args(&body, &args, parser.ctx.budget.max_buffer())?
            };
            parser.splice(&body)
        }
        MacroDef::Template {
            body,
            params,
            delimiters,
        } => {
            parser.cursor.next_non_space();
            let prefix = delimiters.first().map(String::as_str).unwrap_or_default();
            if !prefix.is_empty() && !parser.cursor.match_param(prefix) {
                return Err(TexError::MismatchUseDef(cs.to_string()));
            }
            let mut args = Vec::with_capacity(params);
            for delimiter in delimiters.iter().skip(1).take(params) {
                args.push(parser.cursor.get_parameter(cs, delimiter)?);
            }
            let body = substitute_args(&body, &args, parser.ctx.budget.max_buffer())?;
            parser.splice(&body)
        }
        MacroDef::Primitive(command) => execute(parser, command, cs),
        MacroDef::Char(text) => parser.splice(&text),
        MacroDef::Delimiter(text) => delimiters::standalone(parser, &text),
    }
}

#[cfg(test)]
mod tests {
    use crate::error::TexError;
    use crate::parse::testing::inline;
    use pretty_assertions::assert_eq;

    fn same(left: &str, right: &str) {
        assert_eq!(inline(left).unwrap(), inline(right).unwrap());
    }

    #[test]
    fn newcommand_with_arguments() {
        same("\\newcommand{\\R}{\\mathbb{R}}\\R", "\\mathbb{R}");
        same("\\newcommand{\\pair}[2]{(#1,#2)}\\pair{a}{b}", "(a,b)");
        same("\\renewcommand\\sq[1]{#1^2}\\sq x", "x^2");
    }

    #[test]
    fn optional_first_argument() {
        same("\\newcommand{\\opt}[2][x]{#1#2}\\opt{y}", "xy");
        same("\\newcommand{\\opt}[2][x]{#1#2}\\opt[z]{y}", "zy");
    }

    #[test]
    fn bad_definitions() {
        assert_eq!(
            inline("\\newcommand{\\ab1}{x}"),
            Err(TexError::IllegalControlSequenceName("\\newcommand".into()))
        );
        assert_eq!(
            inline("\\newcommand{\\x}[a]{x}"),
            Err(TexError::IllegalParamNumber("\\newcommand".into()))
        );
        assert_eq!(inline("\\def x{y}"), Err(TexError::MissingCS("\\def".into())));
    }

    #[test]
    fn delimited_parameters() {
        same("\\def\\x#1.{[#1]}\\x a.", "[a]");
        assert_eq!(
            inline("\\def\\x.#1{#1}\\x a"),
            Err(TexError::MismatchUseDef("\\x".into()))
        );
    }

    #[test]
    fn let_takes_a_snapshot() {
        same("\\let\\a=\\alpha \\a", "\\alpha");
        same("\\def\\b{x}\\let\\c\\b\\def\\b{y}\\c", "x");
        same("\\let\\lp( \\left\\lp a\\right)", "\\left(a\\right)");
    }

    #[test]
    fn self_alias_defines_nothing() {
        assert_eq!(
            inline("\\let\\x\\x\\x"),
            Err(TexError::UndefinedControlSequence("\\x".into()))
        );
    }

    #[test]
    fn runaway_recursion_is_bounded() {
        assert_eq!(inline("\\def\\x{\\x}\\x"), Err(TexError::MaxMacroSubstitutionsExceeded));
        assert_eq!(inline("\\def\\x{\\x\\x}\\x"), Err(TexError::MaxBufferSizeExceeded));
    }

    #[test]
    fn user_environment_wraps_builtin() {
        same(
            "\\newenvironment{pm}{\\begin{pmatrix}}{\\end{pmatrix}}\\begin{pm}a\\end{pm}",
            "\\begin{pmatrix}a\\end{pmatrix}",
        );
        same("\\newenvironment{br}[1]{[#1}{]}\\begin{br}{a}b\\end{br}", "[ab]");
        assert_eq!(
            inline("\\newenvironment{e}{[}{]}\\begin{e}a\\end{matrix}"),
            Err(TexError::EnvBadEnd("e".into(), "matrix".into()))
        );
    }

    #[test]
    fn declared_operators() {
        same("\\DeclareMathOperator{\\tr}{tr}\\tr x", "\\operatorname{tr} x");
        same("\\DeclareMathOperator*{\\esssup}{ess\\,sup}\\esssup_x", "\\operatorname*{ess\\,sup}_x");
    }
}
