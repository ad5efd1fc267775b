//! 表格的行列控制：`&`、`\\`、`\cr`、横线、`\hfill`，以及纯 TeX 的 `\matrix{...}` 一类宏

use once_cell::sync::Lazy;
use phf::phf_map;
use regex::Regex;

use crate::ast::{Node, NodeKind, ParseResult};
use crate::error::TexError;

use super::super::array::ArrayState;
use super::super::lexer::{match_dimen, trim_spaces};
use super::super::stack::{ItemKind, StackItem};
use super::super::Parser;
use super::styles::internal_math;
use super::{Command, MatrixStyle};

/// `\cases` 第二列扫描到行尾的标记
static CASES_ROW_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\\cr[^a-zA-Z]|\\\\)").expect("内置正则一定合法"));

/// 整列恰好是一个 `\text{...}`
static TEXT_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\\text[^a-zA-Z]").expect("内置正则一定合法"));

const PLAIN: MatrixStyle = MatrixStyle {
    open: None,
    close: None,
    align: None,
    spacing: None,
    vspacing: None,
    display: false,
    cases: false,
};

static COMMANDS: phf::Map<&'static str, Command> = phf_map! {
    "\\" => Command::CrLaTeX,
    "cr" => Command::Cr,
    "hline" => Command::HLine(false),
    "hdashline" => Command::HLine(true),
    "hfill" => Command::HFill,
    "matrix" => Command::Matrix(PLAIN),
    "pmatrix" => Command::Matrix(MatrixStyle {
        open: Some("("),
        close: Some(")"),
        ..PLAIN
    }),
    "cases" => Command::Matrix(MatrixStyle {
        open: Some("{"),
        close: Some(""),
        align: Some("left left"),
        vspacing: Some(".1em"),
        cases: true,
        ..PLAIN
    }),
    "eqalign" => Command::Matrix(MatrixStyle {
        align: Some("right left"),
        spacing: Some("0.278em"),
        vspacing: Some(".5em"),
        display: true,
        ..PLAIN
    }),
};

pub(super) fn lookup(name: &str) -> Option<Command> {
    COMMANDS.get(name).copied()
}

/// 纯 TeX 形式的 `\cases` 表格
fn scans_cases(parser: &Parser<'_, '_>) -> bool {
    matches!(
        parser.stack.top().map(|item| &item.kind),
        Some(ItemKind::Array(state)) if state.cases.is_some()
    )
}

/// `&`：结束当前单元格
pub(crate) fn entry(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    parser.push_item(StackItem::new(ItemKind::Cell {
        name: name.to_string(),
        entry: true,
        cr: false,
        linebreak: false,
    }))?;
    if scans_cases(parser) {
        cases_text(parser)?;
    }
    Ok(())
}

/// `\cases` 的第二列按文本处理，其中可以用 `$...$` 写公式
fn cases_text(parser: &mut Parser<'_, '_>) -> ParseResult<()> {
    let rest: Vec<char> = parser.cursor.rest().chars().collect();
    let mut braces = 0usize;
    let mut close = None;
    let mut i = 0usize;
    while i < rest.len() {
        match rest[i] {
            '{' => {
                braces += 1;
                i += 1;
            }
            '}' => {
                if braces == 0 {
                    break;
                }
                braces -= 1;
                if braces == 0 && close.is_none() {
                    close = Some(i);
                }
                i += 1;
            }
            '&' if braces == 0 => return Err(TexError::ExtraAlignTab),
            '\\' => {
                let tail: String = rest[i..].iter().collect();
                if CASES_ROW_END.is_match(&tail) {
                    break;
                }
                i += 2;
            }
            _ => i += 1,
        }
    }
    let end = i.min(rest.len());
    let text: String = rest[..end].iter().collect();
    let last = text.trim_end().chars().count().checked_sub(1);
    if TEXT_START.is_match(&text) && close.is_some() && close == last {
        return Ok(());
    }
    let nodes = internal_math(parser, &trim_spaces(&text), Some("0"), None)?;
    parser.push_all(nodes)?;
    parser.cursor.advance(end);
    Ok(())
}

/// `\cr`：结束当前行
pub(super) fn cr(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    parser.push_item(StackItem::new(ItemKind::Cell {
        name: name.to_string(),
        entry: false,
        cr: true,
        linebreak: false,
    }))
}

/// `\\`、`\\*`、`\\[dimen]`：表格内结束一行，表格外是强制换行
pub(super) fn cr_latex(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    if parser.cursor.peek_char() == Some('*') {
        parser.cursor.advance(1);
    }
    let mut spacing = None;
    if parser.cursor.peek_char() == Some('[') {
        let dimen = parser.cursor.get_brackets(name)?.unwrap_or_default();
        if !dimen.is_empty() {
            let (value, unit, _) = match_dimen(&dimen, false)
                .ok_or_else(|| TexError::BracketMustBeDimension(name.to_string()))?;
            spacing = Some(format!("{value}{unit}"));
        }
    }
    parser.push_item(StackItem::new(ItemKind::Cell {
        name: name.to_string(),
        entry: false,
        cr: true,
        linebreak: true,
    }))?;
    if let Some(ItemKind::Array(state)) = parser.stack.top_mut().map(|item| &mut item.kind) {
        if let Some(spacing) = spacing {
            state.add_row_spacing(&spacing)?;
        }
        return Ok(());
    }
    if let Some(spacing) = spacing {
        let mut strut = Node::new(NodeKind::Mspace, Vec::new());
        strut.set_attribute("depth", spacing);
        parser.push(strut)?;
    }
    let mut newline = Node::new(NodeKind::Mspace, Vec::new());
    newline.set_attribute("linebreak", "newline");
    parser.push(newline)
}

/// `\hline`/`\hdashline` 只能出现在一行的开头
pub(super) fn hline(parser: &mut Parser<'_, '_>, name: &str, dashed: bool) -> ParseResult<()> {
    match parser.stack.top_mut() {
        Some(StackItem {
            kind: ItemKind::Array(state),
            nodes,
            ..
        }) if nodes.is_empty() && state.row.is_empty() => {
            state.add_hline(dashed);
            Ok(())
        }
        _ => Err(TexError::Misplaced(name.to_string())),
    }
}

/// `\hfill`：记录在单元格中的位置，用于推断该格的对齐方式
pub(super) fn hfill(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    match parser.stack.top_mut() {
        Some(StackItem {
            kind: ItemKind::Array(state),
            nodes,
            ..
        }) => {
            state.hfill.push(nodes.len());
            Ok(())
        }
        _ => Err(TexError::UnsupportedHFill(name.to_string())),
    }
}

/// `\matrix{...}` 一类：表格由右花括号结束；参数也可以是单个记号
pub(super) fn matrix(parser: &mut Parser<'_, '_>, name: &str, style: MatrixStyle) -> ParseResult<()> {
    match parser.cursor.next_non_space() {
        None => return Err(TexError::MissingArgFor(name.to_string())),
        Some('{') => parser.cursor.advance(1),
        Some(ch) => {
            parser.cursor.advance(1);
            let max_buffer = parser.ctx.budget.max_buffer();
            parser.cursor.splice(&format!("{ch}}}"), max_buffer)?;
        }
    }
    let mut array = ArrayState::new();
    array.require_close = true;
    array.set("rowspacing", style.vspacing.unwrap_or("4pt"));
    array.set("columnspacing", style.spacing.unwrap_or("1em"));
    if style.cases {
        array.cases = Some(String::new());
    }
    if style.open.is_some() || style.close.is_some() {
        array.open = style.open.map(str::to_string);
        array.close = style.close.map(str::to_string);
    }
    if style.display {
        array.set("displaystyle", "true");
    }
    if let Some(align) = style.align {
        array.set("columnalign", align);
    }
    parser.push_item(StackItem::new(ItemKind::Array(Box::new(array))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::testing::inline;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_matrix_closes_with_brace() {
        assert_eq!(
            inline("\\matrix{a & b \\cr c & d}").unwrap(),
            "<math><mtable columnspacing=\"1em\" rowspacing=\"4pt\">\
             <mtr><mtd><mi>a</mi></mtd><mtd><mi>b</mi></mtd></mtr>\
             <mtr><mtd><mi>c</mi></mtd><mtd><mi>d</mi></mtd></mtr>\
             </mtable></math>"
        );
    }

    #[test]
    fn ampersand_outside_table_is_misplaced() {
        assert_eq!(inline("a & b"), Err(TexError::Misplaced("&".into())));
        assert_eq!(inline("a \\cr b"), Err(TexError::Misplaced("\\cr".into())));
    }

    #[test]
    fn line_break_outside_table() {
        assert_eq!(
            inline("a\\\\b").unwrap(),
            "<math><mi>a</mi><mspace linebreak=\"newline\"></mspace><mi>b</mi></math>"
        );
    }

    #[test]
    fn line_break_spacing_must_be_a_dimension() {
        assert_eq!(
            inline("a\\\\[x]b"),
            Err(TexError::BracketMustBeDimension("\\\\".into()))
        );
    }

    #[test]
    fn cases_second_column_is_text() {
        let out = inline("\\cases{1 & x>0 \\cr 0 & \\text{else}}").unwrap();
        assert!(out.contains("<mstyle displaystyle=\"false\" scriptlevel=\"0\"><mtext>x&gt;0</mtext></mstyle>"));
        assert!(out.contains("<mtd><mtext>else</mtext></mtd>"));
        assert!(out.contains("columnalign=\"left left\""));
    }

    #[test]
    fn cases_text_rejects_extra_tab() {
        assert_eq!(inline("\\cases{1 & a & b}"), Err(TexError::ExtraAlignTab));
    }

    #[test]
    fn hline_needs_a_table() {
        assert_eq!(inline("\\hline"), Err(TexError::Misplaced("\\hline".into())));
        assert_eq!(inline("\\hfill"), Err(TexError::UnsupportedHFill("\\hfill".into())));
    }
}
