//! 宏表：用户定义的宏、`\let` 别名与环境，以及宏展开用到的文本替换工具
//!
//! 宏表只保存定义本身；读取参数、把替换结果拼回输入缓冲区的工作由解析器完成
//! （见 `parse::rules::newcommand`）。这里的替换函数都是纯函数，便于单独测试。

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::ParseResult;
use crate::config::Options;
use crate::error::TexError;
use crate::parse::rules::Command;

/// `\newcommand` 可接受的控制序列名：单个字符或一串字母
pub(crate) static CS_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:.|[a-zA-Z]+)$").expect("内置正则一定合法"));

/// 宏的一个绑定
#[derive(Debug, Clone, PartialEq)]
pub enum MacroDef {
    /// 普通替换宏；`default` 存在时第一个参数是可选的方括号参数
    Text {
        body: String,
        params: usize,
        default: Option<String>,
    },
    /// `\def` 定义的带分隔符的宏；`delimiters[0]` 是 `#1` 之前必须匹配的文本，
    /// `delimiters[i]` 是结束第 i 个参数的文本，空串表示普通参数
    Template {
        body: String,
        params: usize,
        delimiters: Vec<String>,
    },
    /// `\let` 指向内置命令时保存的快照
    Primitive(Command),
    /// `\let` 指向普通字符时保存的快照
    Char(String),
    /// `\let` 指向定界符时保存的快照，`\left` 等命令同样可以使用
    Delimiter(String),
}

/// 用户定义的环境
#[derive(Debug, Clone, PartialEq)]
pub struct EnvDef {
    pub begin: String,
    pub end: String,
    pub params: usize,
    pub default: Option<String>,
}

/// `\let` 右侧在定义时刻解析出的结果
#[derive(Debug, Clone, PartialEq)]
pub enum AliasSource {
    /// 右侧是控制序列（不含反斜杠）
    ControlSequence(String),
    /// 右侧是单个字符
    Character(char),
}

/// 宏与环境的定义表；同一文档内的多条公式共享一张表
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    macros: HashMap<String, MacroDef>,
    environments: HashMap<String, EnvDef>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, name: &str) -> Option<&MacroDef> {
        self.macros.get(name)
    }

    pub fn environment(&self, name: &str) -> Option<&EnvDef> {
        self.environments.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.macros.len() + self.environments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 通过 `\let` 绑定的定界符
    pub fn delimiter(&self, name: &str) -> Option<&str> {
        match self.macros.get(name) {
            Some(MacroDef::Delimiter(text)) => Some(text),
            _ => None,
        }
    }

    /// 注册普通替换宏，已有定义会被覆盖
    pub fn define(
        &mut self,
        name: &str,
        body: &str,
        params: usize,
        default: Option<String>,
    ) -> ParseResult<()> {
        if !CS_NAME.is_match(name) {
            return Err(TexError::IllegalControlSequenceName(format!("\\{name}")));
        }
        if params > 9 {
            return Err(TexError::IllegalParamNumber(format!("\\{name}")));
        }
        tracing::debug!(name, params, "定义宏");
        self.macros.insert(
            name.to_string(),
            MacroDef::Text {
                body: body.to_string(),
                params,
                default,
            },
        );
        Ok(())
    }

    /// 注册 `\def` 宏；没有分隔符时退化为普通替换宏
    pub fn define_template(
        &mut self,
        name: &str,
        body: &str,
        params: usize,
        delimiters: Vec<String>,
    ) -> ParseResult<()> {
        if name.is_empty() {
            return Err(TexError::MissingCS("\\def".into()));
        }
        tracing::debug!(name, params, "定义带模板的宏");
        let def = if delimiters.iter().all(String::is_empty) {
            MacroDef::Text {
                body: body.to_string(),
                params,
                default: None,
            }
        } else {
            MacroDef::Template {
                body: body.to_string(),
                params,
                delimiters,
            }
        };
        self.macros.insert(name.to_string(), def);
        Ok(())
    }

    pub fn define_environment(
        &mut self,
        name: &str,
        begin: &str,
        end: &str,
        params: usize,
        default: Option<String>,
    ) -> ParseResult<()> {
        if name.is_empty() || name.contains('\\') {
            return Err(TexError::InvalidEnv(name.to_string()));
        }
        if params > 9 {
            return Err(TexError::IllegalParamNumber("\\newenvironment".into()));
        }
        tracing::debug!(name, params, "定义环境");
        self.environments.insert(
            name.to_string(),
            EnvDef {
                begin: begin.to_string(),
                end: end.to_string(),
                params,
                default,
            },
        );
        Ok(())
    }

    /// `\let`：在调用时刻解析右侧并保存快照，之后右侧再被重定义也不影响别名。
    /// 右侧是未定义的控制序列时什么都不做，返回 `false`。
    pub fn alias(&mut self, target: &str, source: AliasSource) -> bool {
        let def = match source {
            AliasSource::ControlSequence(name) => {
                if let Some(existing) = self.macros.get(&name) {
                    existing.clone()
                } else if let Some(delim) = crate::parse::rules::delimiter_for(&format!("\\{name}")) {
                    MacroDef::Delimiter(delim.to_string())
                } else if let Some(command) = crate::parse::rules::lookup(&name) {
                    MacroDef::Primitive(command)
                } else {
                    return false;
                }
            }
            AliasSource::Character(ch) => {
                let text = ch.to_string();
                match crate::parse::rules::delimiter_for(&text) {
                    Some(delim) => MacroDef::Delimiter(delim.to_string()),
                    None => MacroDef::Char(text),
                }
            }
        };
        tracing::debug!(target, "定义别名");
        self.macros.insert(target.to_string(), def);
        true
    }
}

/// 单次编译的宏替换预算：替换次数与缓冲区长度两个上限
#[derive(Debug, Clone)]
pub(crate) struct ExpansionBudget {
    used: usize,
    limit: usize,
    max_buffer: usize,
}

impl ExpansionBudget {
    pub(crate) fn new(options: &Options) -> Self {
        Self {
            used: 0,
            limit: options.max_macro_substitutions,
            max_buffer: options.max_buffer_size,
        }
    }

    /// 每次宏或环境展开计数一次
    pub(crate) fn charge(&mut self) -> ParseResult<()> {
        self.used += 1;
        if self.used > self.limit {
            return Err(TexError::MaxMacroSubstitutionsExceeded);
        }
        Ok(())
    }

    pub(crate) fn used(&self) -> usize {
        self.used
    }

    pub(crate) fn max_buffer(&self) -> usize {
        self.max_buffer
    }
}

/// 文本是否以未被转义的控制字（反斜杠加字母）结尾
fn ends_with_control_word(text: &str) -> bool {
    let trimmed = text.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    if trimmed.len() == text.len() || !trimmed.ends_with('\\') {
        return false;
    }
    let slashes = trimmed.chars().rev().take_while(|&c| c == '\\').count();
    slashes % 2 == 1
}

/// 拼接两段文本；前一段以控制字结尾而后一段以字母开头时插入空格，
/// 避免 `\alpha` 与后续字母粘连成新的控制序列
pub(crate) fn add_args(first: &str, second: &str, max_buffer: usize) -> ParseResult<String> {
    let needs_space = second.starts_with(|c: char| c.is_ascii_alphabetic())
        && ends_with_control_word(first);
    let length = first.chars().count() + second.chars().count() + usize::from(needs_space);
    if length > max_buffer {
        return Err(TexError::MaxBufferSizeExceeded);
    }
    let mut joined = String::with_capacity(first.len() + second.len() + 1);
    joined.push_str(first);
    if needs_space {
        joined.push(' ');
    }
    joined.push_str(second);
    Ok(joined)
}

/// 从左到右扫描一遍宏体，把 `#n` 替换为第 n 个参数，`##` 替换为 `#`
pub(crate) fn substitute_args(
    body: &str,
    args: &[String],
    max_buffer: usize,
) -> ParseResult<String> {
    let mut result = String::new();
    let mut pending = String::new();
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                pending.push(ch);
                if let Some(next) = chars.next() {
                    pending.push(next);
                }
            }
            '#' => match chars.next() {
                Some('#') => pending.push('#'),
                Some(digit @ '1'..='9') => {
                    let index = digit as usize - '1' as usize;
                    let arg = args.get(index).ok_or(TexError::IllegalMacroParam)?;
                    result = add_args(&result, &pending, max_buffer)?;
                    result = add_args(&result, arg, max_buffer)?;
                    pending.clear();
                }
                _ => return Err(TexError::IllegalMacroParam),
            },
            _ => pending.push(ch),
        }
    }
    add_args(&result, &pending, max_buffer)
}

/// 解析 `\def` 的参数模板（宏名之后、左花括号之前的部分），
/// 返回参数个数与各参数的分隔文本
pub(crate) fn parse_template(cs: &str, template: &str) -> ParseResult<(usize, Vec<String>)> {
    let mut count = 0usize;
    let mut delimiters = vec![String::new()];
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '#' => {
                let next = chars.next();
                let digit = next
                    .and_then(|c| c.to_digit(10))
                    .filter(|d| (1..=9).contains(d))
                    .ok_or_else(|| TexError::IllegalHashInTemplate(cs.to_string()))?;
                count += 1;
                if digit as usize != count {
                    return Err(TexError::ParametersNotSequential(cs.to_string()));
                }
                delimiters.push(String::new());
            }
            '\\' => {
                let current = delimiters.last_mut().ok_or(TexError::IllegalMacroParam)?;
                current.push(ch);
                if let Some(next) = chars.next() {
                    current.push(next);
                    if next.is_ascii_alphabetic() {
                        while let Some(&c) = chars.peek() {
                            if !c.is_ascii_alphabetic() {
                                break;
                            }
                            current.push(c);
                            chars.next();
                        }
                    }
                }
            }
            _ => {
                if let Some(current) = delimiters.last_mut() {
                    current.push(ch);
                }
            }
        }
    }
    Ok((count, delimiters))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn substitution_is_single_pass() {
        let args = vec!["Q".to_string(), "#1".to_string()];
        assert_eq!(substitute_args("a#1b", &args, 100).unwrap(), "aQb");
        // 参数内容中的 # 不会被再次替换
        assert_eq!(substitute_args("#2", &args, 100).unwrap(), "#1");
        assert_eq!(substitute_args("x##y", &args, 100).unwrap(), "x#y");
        assert_eq!(substitute_args("\\#1", &args, 100).unwrap(), "\\#1");
    }

    #[test]
    fn bad_parameter_references_fail() {
        let args = vec!["Q".to_string()];
        assert_eq!(substitute_args("#2", &args, 100), Err(TexError::IllegalMacroParam));
        assert_eq!(substitute_args("#x", &args, 100), Err(TexError::IllegalMacroParam));
        assert_eq!(substitute_args("#", &args, 100), Err(TexError::IllegalMacroParam));
    }

    #[test]
    fn control_words_do_not_merge_with_letters() {
        assert_eq!(add_args("\\alpha", "b", 100).unwrap(), "\\alpha b");
        assert_eq!(add_args("\\\\", "b", 100).unwrap(), "\\\\b");
        assert_eq!(add_args("x", "b", 100).unwrap(), "xb");
        assert_eq!(
            add_args("\\alpha", "bcd", 5),
            Err(TexError::MaxBufferSizeExceeded)
        );
    }

    #[test]
    fn define_validates_names() {
        let mut table = MacroTable::new();
        assert!(table.define("foo", "x", 0, None).is_ok());
        assert!(table.define("!", "x", 0, None).is_ok());
        assert_eq!(
            table.define("12", "x", 0, None),
            Err(TexError::IllegalControlSequenceName("\\12".into()))
        );
        assert_eq!(
            table.define("f1", "x", 0, None),
            Err(TexError::IllegalControlSequenceName("\\f1".into()))
        );
        assert!(matches!(table.lookup("foo"), Some(MacroDef::Text { params: 0, .. })));
    }

    #[test]
    fn alias_takes_a_snapshot() {
        let mut table = MacroTable::new();
        table.define("bar", "h", 0, None).unwrap();
        assert!(table.alias("fooi", AliasSource::ControlSequence("bar".into())));
        table.define("bar", "g", 0, None).unwrap();
        assert!(matches!(
            table.lookup("fooi"),
            Some(MacroDef::Text { body, .. }) if body == "h"
        ));
    }

    #[test]
    fn alias_to_undefined_defines_nothing() {
        let mut table = MacroTable::new();
        assert!(!table.alias("x", AliasSource::ControlSequence("x".into())));
        assert!(table.lookup("x").is_none());
        assert!(table.alias("lb", AliasSource::ControlSequence("langle".into())));
        assert_eq!(table.delimiter("lb"), Some("⟨"));
        assert!(table.alias("plus", AliasSource::Character('+')));
        assert_eq!(table.lookup("plus"), Some(&MacroDef::Char("+".into())));
    }

    #[test]
    fn templates_must_be_sequential() {
        assert_eq!(
            parse_template("\\x", "#1.#2;").unwrap(),
            (2, vec!["".to_string(), ".".to_string(), ";".to_string()])
        );
        assert_eq!(
            parse_template("\\x", "#1#3"),
            Err(TexError::ParametersNotSequential("\\x".into()))
        );
        assert_eq!(
            parse_template("\\x", "#a"),
            Err(TexError::IllegalHashInTemplate("\\x".into()))
        );
        assert_eq!(
            parse_template("\\x", "\\stop#1\\end").unwrap().1,
            vec!["\\stop".to_string(), "\\end".to_string()]
        );
    }

    #[test]
    fn budget_stops_runaway_expansion() {
        let mut options = Options::default();
        options.max_macro_substitutions = 3;
        let mut budget = ExpansionBudget::new(&options);
        for _ in 0..3 {
            budget.charge().unwrap();
        }
        assert_eq!(budget.charge(), Err(TexError::MaxMacroSubstitutionsExceeded));
        assert_eq!(budget.used(), 4);
    }
}
