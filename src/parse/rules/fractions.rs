//! 分式：`\frac`、`\genfrac` 一族、连分式 `\cfrac` 与中缀的 `\over` 一族

use phf::phf_map;

use crate::ast::{Node, NodeKind, ParseResult};
use crate::error::TexError;

use super::super::lexer::trim_spaces;
use super::super::stack::{ItemKind, StackItem};
use super::super::util::fixed_fence;
use super::super::Parser;
use super::{delimiter_for, Command, FracStyle, OverStyle};

const fn fixed(open: &'static str, close: &'static str, thickness: &'static str, style: &'static str) -> Command {
    Command::Genfrac(Some(FracStyle {
        open,
        close,
        thickness,
        style,
    }))
}

const fn infix(open: Option<&'static str>, close: Option<&'static str>, thickness: Option<&'static str>) -> Command {
    Command::Over(OverStyle {
        open,
        close,
        with_delims: false,
        thickness,
        dimen: false,
    })
}

static COMMANDS: phf::Map<&'static str, Command> = phf_map! {
    "frac" => Command::Frac,
    "genfrac" => Command::Genfrac(None),
    "cfrac" => Command::CFrac,
    "dfrac" => fixed("", "", "", "0"),
    "tfrac" => fixed("", "", "", "1"),
    "binom" => fixed("(", ")", "0", ""),
    "dbinom" => fixed("(", ")", "0", "0"),
    "tbinom" => fixed("(", ")", "0", "1"),
    "over" => infix(None, None, None),
    "atop" => infix(None, None, Some("0")),
    "choose" => infix(Some("("), Some(")"), Some("0")),
    "brace" => infix(Some("{"), Some("}"), Some("0")),
    "brack" => infix(Some("["), Some("]"), Some("0")),
    "above" => Command::Over(OverStyle {
        open: None,
        close: None,
        with_delims: false,
        thickness: None,
        dimen: true,
    }),
    "overwithdelims" => Command::Over(OverStyle {
        open: None,
        close: None,
        with_delims: true,
        thickness: None,
        dimen: false,
    }),
    "atopwithdelims" => Command::Over(OverStyle {
        open: None,
        close: None,
        with_delims: true,
        thickness: Some("0"),
        dimen: false,
    }),
    "abovewithdelims" => Command::Over(OverStyle {
        open: None,
        close: None,
        with_delims: true,
        thickness: None,
        dimen: true,
    }),
};

pub(super) fn lookup(name: &str) -> Option<Command> {
    COMMANDS.get(name).copied()
}

pub(super) fn frac(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    let num = parser.parse_arg(name)?;
    let den = parser.parse_arg(name)?;
    parser.push(Node::new(NodeKind::Mfrac, vec![num, den]))
}

/// 花括号中的定界符参数；空参数表示不加定界符
fn delimiter_arg(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<Option<String>> {
    let text = trim_spaces(&parser.cursor.get_argument(name)?);
    if text.is_empty() {
        return Ok(None);
    }
    delimiter_for(&text)
        .map(|delim| Some(delim.to_string()))
        .ok_or_else(|| TexError::MissingOrUnrecognizedDelim(name.to_string()))
}

/// `\genfrac{左}{右}{线宽}{样式}{分子}{分母}`；固定参数的变体跳过前四个参数
pub(super) fn genfrac(parser: &mut Parser<'_, '_>, name: &str, style: Option<FracStyle>) -> ParseResult<()> {
    let (open, close, thickness, level) = match style {
        Some(fixed) => (
            delimiter_for(fixed.open).filter(|d| !d.is_empty()).map(str::to_string),
            delimiter_for(fixed.close).filter(|d| !d.is_empty()).map(str::to_string),
            fixed.thickness.to_string(),
            fixed.style.to_string(),
        ),
        None => {
            let open = delimiter_arg(parser, name)?;
            let close = delimiter_arg(parser, name)?;
            let thickness = parser.cursor.get_argument(name)?;
            let level = trim_spaces(&parser.cursor.get_argument(name)?);
            (open, close, thickness, level)
        }
    };
    let num = parser.parse_arg(name)?;
    let den = parser.parse_arg(name)?;
    let mut frac = Node::new(NodeKind::Mfrac, vec![num, den]);
    if !thickness.is_empty() {
        frac.set_attribute("linethickness", thickness);
    }
    if open.is_some() || close.is_some() {
        frac.set_flag("withDelims", true);
        frac = fixed_fence(open.as_deref(), frac, close.as_deref());
    }
    if !level.is_empty() {
        let digit = match level.as_str() {
            "0" => 0,
            "1" => 1,
            "2" => 2,
            "3" => 3,
            _ => return Err(TexError::BadMathStyleFor(name.to_string())),
        };
        let mut style = Node::new(NodeKind::Mstyle, vec![frac]);
        if digit == 0 {
            style.set_attribute("displaystyle", "true");
            style.set_attribute("scriptlevel", "0");
        } else {
            style.set_attribute("displaystyle", "false");
            style.set_attribute("scriptlevel", (digit - 1).to_string());
        }
        frac = style;
    }
    parser.push(frac)
}

/// 连分式：分子分母都按行内样式排版，可选参数控制对齐
pub(super) fn cfrac(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    let align = trim_spaces(&parser.cursor.get_brackets(name)?.unwrap_or_default());
    let num = parser.cursor.get_argument(name)?;
    let den = parser.cursor.get_argument(name)?;
    let align = match align.as_str() {
        "l" => Some("left"),
        "r" => Some("right"),
        "" => None,
        _ => return Err(TexError::IllegalAlign(name.to_string())),
    };
    let env = parser.env();
    let num = parser.parse_text(&format!("\\textstyle{{{num}}}"), env.clone())?;
    let den = parser.parse_text(&format!("\\textstyle{{{den}}}"), env)?;
    let mut frac = Node::new(NodeKind::Mfrac, vec![num, den]);
    if let Some(align) = align {
        frac.set_attribute("numalign", align);
        frac.set_attribute("denomalign", align);
    }
    parser.push(frac)
}

/// 中缀分式：把已经读到的内容作为分子，之后的内容作为分母
pub(super) fn over(parser: &mut Parser<'_, '_>, name: &str, style: OverStyle) -> ParseResult<()> {
    let (open, close) = if style.open.is_some() || style.close.is_some() {
        (
            style.open.and_then(delimiter_for).map(str::to_string),
            style.close.and_then(delimiter_for).map(str::to_string),
        )
    } else if style.with_delims {
        (
            Some(parser.get_delimiter(name, false)?),
            Some(parser.get_delimiter(name, false)?),
        )
    } else {
        (None, None)
    };
    let thickness = if style.dimen {
        Some(parser.cursor.get_dimen(name)?)
    } else {
        style.thickness.map(str::to_string)
    };
    parser.push_item(StackItem::new(ItemKind::Over {
        name: name.to_string(),
        num: None,
        thickness,
        open,
        close,
    }))
}

#[cfg(test)]
mod tests {
    use crate::error::TexError;
    use crate::parse::testing::inline;
    use pretty_assertions::assert_eq;

    #[test]
    fn frac_takes_two_arguments() {
        assert_eq!(
            inline("\\frac{a}{b}").unwrap(),
            "<math><mfrac><mi>a</mi><mi>b</mi></mfrac></math>"
        );
        assert_eq!(inline("\\frac{a}"), Err(TexError::MissingArgFor("\\frac".into())));
    }

    #[test]
    fn display_fraction_sets_style() {
        assert_eq!(
            inline("\\dfrac12").unwrap(),
            "<math><mstyle displaystyle=\"true\" scriptlevel=\"0\"><mfrac><mn>1</mn><mn>2</mn></mfrac></mstyle></math>"
        );
    }

    #[test]
    fn binomial_has_fixed_parentheses() {
        let out = inline("\\binom{n}{k}").unwrap();
        assert!(out.contains("linethickness=\"0\""));
        assert!(out.contains("maxsize=\"1.2em\""));
    }

    #[test]
    fn genfrac_rejects_unknown_style() {
        assert_eq!(
            inline("\\genfrac{}{}{}{5}{a}{b}"),
            Err(TexError::BadMathStyleFor("\\genfrac".into()))
        );
    }

    #[test]
    fn cfrac_alignment_is_checked() {
        assert!(inline("\\cfrac[l]{1}{2}").unwrap().contains("numalign=\"left\""));
        assert_eq!(inline("\\cfrac[x]{1}{2}"), Err(TexError::IllegalAlign("\\cfrac".into())));
    }

    #[test]
    fn over_splits_the_group() {
        assert_eq!(
            inline("{a \\over b}").unwrap(),
            "<math><mrow data-texclass=\"ORD\"><mfrac><mi>a</mi><mi>b</mi></mfrac></mrow></math>"
        );
    }
}
