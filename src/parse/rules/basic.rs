//! 用其他命令写成的内置宏：`\stackrel`、`\boxed`、`\iff`、`\pmod` 等

use phf::phf_map;

use crate::ast::ParseResult;
use crate::macros::substitute_args;

use super::super::Parser;
use super::Command;

static COMMANDS: phf::Map<&'static str, Command> = phf_map! {
    "stackrel" => Command::Macro("\\mathrel{\\mathop{#2}\\limits^{#1}}", 2),
    "boxed" => Command::Macro("\\fbox{$\\displaystyle{#1}$}", 1),
    "iff" => Command::Macro("\\;\\Longleftrightarrow\\;", 0),
    "implies" => Command::Macro("\\;\\Longrightarrow\\;", 0),
    "impliedby" => Command::Macro("\\;\\Longleftarrow\\;", 0),
    "bmod" => Command::Macro("\\mathbin{\\rm mod}", 0),
    "pmod" => Command::Macro("\\mkern18mu({\\rm mod}\\mkern6mu #1)", 1),
    "pod" => Command::Macro("\\mkern18mu(#1)", 1),
    "mod" => Command::Macro("\\mkern18mu{\\rm mod}\\,\\,", 0),
    "mathstrut" => Command::Macro("\\vphantom{(}", 0),
    "strut" => Command::Macro("\\vphantom{(}", 0),
    "newline" => Command::Macro("\\\\", 0),
};

pub(super) fn lookup(name: &str) -> Option<Command> {
    COMMANDS.get(name).copied()
}

/// 读取参数、代入宏体并拼回输入，与用户宏一样计入展开次数
pub(super) fn expand(parser: &mut Parser<'_, '_>, name: &str, body: &str, params: u8) -> ParseResult<()> {
    let mut args = Vec::with_capacity(usize::from(params));
    for _ in 0..params {
        args.push(parser.cursor.get_argument(name)?);
    }
    let text = substitute_args(body, &args, parser.ctx.budget.max_buffer())?;
    parser.splice(&text)
}

#[cfg(test)]
mod tests {
    use crate::parse::testing::inline;
    use pretty_assertions::assert_eq;

    #[test]
    fn stackrel_puts_first_argument_on_top() {
        assert_eq!(
            inline("\\stackrel{a}{=}").unwrap(),
            inline("\\mathrel{\\mathop{=}\\limits^{a}}").unwrap()
        );
    }

    #[test]
    fn boxed_draws_a_frame() {
        let out = inline("\\boxed{x}").unwrap();
        assert!(out.starts_with("<math><menclose notation=\"box\">"));
    }

    #[test]
    fn arrows_are_padded() {
        assert_eq!(
            inline("a\\iff b").unwrap(),
            inline("a\\;\\Longleftrightarrow\\;b").unwrap()
        );
    }
}
