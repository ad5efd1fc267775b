//! 公式编号与交叉引用：`\tag`、`\notag`、`\label`、`\ref`、`\eqref`

use phf::phf_map;

use crate::ast::{Node, NodeKind, ParseResult};
use crate::error::TexError;
use crate::tags::{format_tag, format_url};

use super::super::lexer::trim_spaces;
use super::super::Parser;
use super::styles::internal_math;
use super::Command;

static COMMANDS: phf::Map<&'static str, Command> = phf_map! {
    "tag" => Command::Tag,
    "notag" => Command::Notag,
    "nonumber" => Command::Notag,
    "label" => Command::Label,
    "ref" => Command::Ref(false),
    "eqref" => Command::Ref(true),
};

pub(super) fn lookup(name: &str) -> Option<Command> {
    COMMANDS.get(name).copied()
}

/// `\tag{...}`、`\tag*{...}`：手工编号，带星号时不加括号
pub(super) fn tag(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    let tags = &*parser.ctx.tags;
    if !tags.current_taggable() && !tags.current_env().is_empty() {
        return Err(TexError::TagNotAllowedHere(
            name.to_string(),
            tags.current_env().to_string(),
        ));
    }
    if tags.has_tag() {
        return Err(TexError::MultipleTag(name.to_string()));
    }
    let star = parser.cursor.get_star();
    let text = trim_spaces(&parser.cursor.get_argument(name)?);
    parser.ctx.tags.tag(&text, star);
    Ok(())
}

pub(super) fn notag(parser: &mut Parser<'_, '_>) -> ParseResult<()> {
    parser.ctx.tags.notag();
    Ok(())
}

pub(super) fn label(parser: &mut Parser<'_, '_>, name: &str) -> ParseResult<()> {
    let label = parser.cursor.get_argument(name)?;
    let ignore_duplicates = parser.options().ignore_duplicate_labels;
    parser.ctx.tags.set_label(&label, name, ignore_duplicates)
}

/// `\ref{...}`/`\eqref{...}`：指向编号锚点的链接；标签未知时显示占位文本
pub(super) fn reference(parser: &mut Parser<'_, '_>, name: &str, eq: bool) -> ParseResult<()> {
    let label = parser.cursor.get_argument(name)?;
    let target = parser.ctx.tags.reference(&label);
    let text = if eq {
        format_tag(&target.tag)
    } else {
        target.tag
    };
    let nodes = internal_math(parser, &text, None, None)?;
    let mut link = Node::new(NodeKind::Mrow, nodes);
    link.set_attribute("href", format_url(&target.id, &parser.options().base_url));
    link.set_attribute("class", "formula-ref");
    parser.push(link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::parse::testing::{compile_with, inline};
    use pretty_assertions::assert_eq;

    fn display(tex: &str) -> ParseResult<String> {
        compile_with(tex, &Options::default())
    }

    #[test]
    fn manual_tags() {
        let out = display("x\\tag{A}").unwrap();
        assert!(out.contains("<mlabeledtr><mtd id=\"eqn:A\"><mtext>(A)</mtext></mtd><mtd><mi>x</mi></mtd></mlabeledtr>"));
        let out = display("x\\tag*{A}").unwrap();
        assert!(out.contains("<mtext>A</mtext>"));
        assert_eq!(display("\\tag{1}\\tag{2}"), Err(TexError::MultipleTag("\\tag".into())));
    }

    #[test]
    fn tag_inside_untaggable_environment() {
        assert_eq!(
            display("\\begin{split}x\\tag{1}\\end{split}"),
            Err(TexError::TagNotAllowedHere("\\tag".into(), "split".into()))
        );
    }

    #[test]
    fn notag_suppresses_automatic_number() {
        let out = display("\\begin{equation}x\\notag\\end{equation}").unwrap();
        assert!(!out.contains("mlabeledtr"));
    }

    #[test]
    fn labels_are_unique() {
        assert_eq!(
            display("\\label{a}\\label{b}"),
            Err(TexError::MultipleLabel("\\label".into()))
        );
    }

    #[test]
    fn unknown_reference_is_a_placeholder() {
        assert_eq!(
            inline("\\ref{zz}").unwrap(),
            "<math><mrow class=\"formula-ref\" href=\"#\"><mtext>???</mtext></mrow></math>"
        );
    }

    #[test]
    fn eqref_links_to_the_anchor() {
        let out = display("\\begin{equation}x\\label{e}\\end{equation}\\eqref{e}").unwrap();
        assert!(out.contains("<mrow class=\"formula-ref\" href=\"#eqn%3Ae\"><mtext>(1)</mtext></mrow>"));
    }
}
