//! 游标：在源字符串上移动的读取位置，以及各命令共用的参数读取函数
//!
//! 宏展开会把替换文本拼到未读部分之前并把位置归零，所以这里保存的是可替换的字符缓冲。
//! 始终满足 `pos <= source.len()`。

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::ParseResult;
use crate::error::TexError;
use crate::macros::add_args;

/// 尺寸：数值加单位，用于 `\hspace`、`\\[2pt]` 等
static DIMEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*([-+]?(?:\.[0-9]+|[0-9]+(?:\.[0-9]*)?))\s*(pt|em|ex|mu|px|mm|cm|in|pc)")
        .expect("内置正则一定合法")
});

pub(crate) struct Cursor {
    source: Vec<char>,
    pos: usize,
}

impl Cursor {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
        }
    }

    #[inline]
    pub(crate) fn peek_char(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    #[inline]
    pub(crate) fn consume_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += 1;
        Some(ch)
    }

    #[inline]
    pub(crate) fn advance(&mut self, count: usize) {
        self.pos = (self.pos + count).min(self.source.len());
    }

    #[inline]
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.source.len());
    }

    pub(crate) fn is_done(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// 从 `start` 开始的剩余文本（按字符计位置）
    pub(crate) fn text_from(&self, start: usize) -> String {
        let start = start.min(self.source.len());
        self.source[start..].iter().collect()
    }

    pub(crate) fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.source.len());
        let start = start.min(end);
        self.source[start..end].iter().collect()
    }

    pub(crate) fn rest(&self) -> String {
        self.text_from(self.pos)
    }

    pub(crate) fn starts_with_str(&self, pattern: &str) -> bool {
        let mut idx = self.pos;
        for ch in pattern.chars() {
            if self.source.get(idx) != Some(&ch) {
                return false;
            }
            idx += 1;
        }
        true
    }

    /// 把 `text` 拼到未读部分之前并从头开始读
    pub(crate) fn splice(&mut self, text: &str, max_buffer: usize) -> ParseResult<()> {
        let joined = add_args(text, &self.rest(), max_buffer)?;
        self.reset(&joined);
        Ok(())
    }

    /// 用新文本替换整个缓冲区
    pub(crate) fn reset(&mut self, text: &str) {
        self.source = text.chars().collect();
        self.pos = 0;
    }

    /// 取出未读部分，缓冲区随后为空
    pub(crate) fn take_rest(&mut self) -> String {
        let rest = self.rest();
        self.source.clear();
        self.pos = 0;
        rest
    }

    /// 读取反斜杠之后的控制序列名：一串字母（吞掉其后的一个空格）或恰好一个字符
    pub(crate) fn next_control_sequence(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek_char(), Some(c) if c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        if self.pos > start {
            let name = self.slice(start, self.pos);
            if self.peek_char() == Some(' ') {
                self.pos += 1;
            }
            return name;
        }
        self.consume_char().map(String::from).unwrap_or_default()
    }

    /// `%` 注释：跳到行尾（不含换行）
    pub(crate) fn skip_to_end_of_line(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch == '\n' {
                break;
            }
            self.pos += 1;
        }
    }

    /// 跳过空白并查看下一个字符
    pub(crate) fn next_non_space(&mut self) -> Option<char> {
        while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
        self.peek_char()
    }

    /// 读取一个参数：花括号组（不含外层括号）、控制序列或单个字符
    pub(crate) fn get_argument(&mut self, name: &str) -> ParseResult<String> {
        match self.next_non_space() {
            None => Err(TexError::MissingArgFor(name.to_string())),
            Some('}') => Err(TexError::ExtraCloseMissingOpen),
            Some('\\') => {
                self.pos += 1;
                Ok(format!("\\{}", self.next_control_sequence()))
            }
            Some('{') => {
                self.pos += 1;
                let start = self.pos;
                let mut depth = 0usize;
                while let Some(ch) = self.consume_char() {
                    match ch {
                        '\\' => self.advance(1),
                        '{' => depth += 1,
                        '}' if depth == 0 => return Ok(self.slice(start, self.pos - 1)),
                        '}' => depth -= 1,
                        _ => {}
                    }
                }
                Err(TexError::MissingCloseBrace)
            }
            Some(ch) => {
                self.pos += 1;
                Ok(ch.to_string())
            }
        }
    }

    /// 可选的方括号参数；花括号内的 `]` 不结束参数
    pub(crate) fn get_brackets(&mut self, name: &str) -> ParseResult<Option<String>> {
        if self.next_non_space() != Some('[') {
            return Ok(None);
        }
        self.pos += 1;
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(ch) = self.consume_char() {
            match ch {
                '{' => depth += 1,
                '\\' => self.advance(1),
                '}' => {
                    if depth == 0 {
                        return Err(TexError::ExtraCloseLooking("']'".into()));
                    }
                    depth -= 1;
                }
                ']' if depth == 0 => return Ok(Some(self.slice(start, self.pos - 1))),
                _ => {}
            }
        }
        Err(TexError::MissingCloseBracket(name.to_string()))
    }

    /// 定界符的原始记号：`\name`、单个字符，或在允许时读取花括号参数
    pub(crate) fn delimiter_token(&mut self, name: &str, brace_ok: bool) -> ParseResult<Option<String>> {
        match self.next_non_space() {
            None => Ok(None),
            Some('\\') => {
                self.pos += 1;
                Ok(Some(format!("\\{}", self.next_control_sequence())))
            }
            Some('{') if brace_ok => Ok(Some(self.get_argument(name)?.trim().to_string())),
            Some(ch) => {
                self.pos += 1;
                Ok(Some(ch.to_string()))
            }
        }
    }

    /// 读取尺寸：花括号中的完整尺寸或直接跟在命令后的尺寸
    pub(crate) fn get_dimen(&mut self, name: &str) -> ParseResult<String> {
        if self.next_non_space() == Some('{') {
            let text = self.get_argument(name)?;
            if let Some((value, unit, _)) = match_dimen(&text, false) {
                return Ok(format!("{value}{unit}"));
            }
        } else {
            let rest = self.rest();
            if let Some((value, unit, length)) = match_dimen(&rest, true) {
                self.advance(length);
                return Ok(format!("{value}{unit}"));
            }
        }
        Err(TexError::MissingDimOrUnits(name.to_string()))
    }

    /// 读到与 `token` 匹配的记号为止（不含该记号），花括号内的内容整体跳过
    pub(crate) fn get_up_to(&mut self, name: &str, token: &str) -> ParseResult<String> {
        let start = self.pos;
        let mut depth = 0usize;
        while !self.is_done() {
            let before = self.pos;
            let Some(ch) = self.consume_char() else { break };
            let text = match ch {
                '\\' => format!("\\{}", self.next_control_sequence()),
                '{' => {
                    depth += 1;
                    ch.to_string()
                }
                '}' => {
                    if depth == 0 {
                        return Err(TexError::ExtraCloseLooking(token.to_string()));
                    }
                    depth -= 1;
                    ch.to_string()
                }
                _ => ch.to_string(),
            };
            if depth == 0 && text == token {
                return Ok(self.slice(start, before));
            }
        }
        Err(TexError::TokenNotFoundForCommand(token.to_string(), name.to_string()))
    }

    /// 命令名之后紧跟的 `*`
    pub(crate) fn get_star(&mut self) -> bool {
        if self.next_non_space() == Some('*') {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// `\def`、`\let` 之后的控制序列名（不含反斜杠）
    pub(crate) fn get_cs_name(&mut self, name: &str) -> ParseResult<String> {
        if self.next_non_space() != Some('\\') {
            return Err(TexError::MissingCS(name.to_string()));
        }
        let cs = self.get_argument(name)?;
        Ok(cs.trim()[1..].to_string())
    }

    /// `\def` 的参数模板：读到第一个未转义的 `{` 之前
    pub(crate) fn get_template(&mut self, cs: &str) -> ParseResult<String> {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            match ch {
                '{' => return Ok(self.slice(start, self.pos)),
                '\\' => self.advance(2),
                _ => self.pos += 1,
            }
        }
        Err(TexError::MissingReplacementString(cs.to_string()))
    }

    /// 当前位置是否是分隔文本 `param`；匹配时越过它
    pub(crate) fn match_param(&mut self, param: &str) -> bool {
        if !self.starts_with_str(param) {
            return false;
        }
        let length = param.chars().count();
        let ends_with_word = param
            .trim_end_matches(|c: char| c.is_ascii_alphabetic())
            .ends_with('\\')
            && param.ends_with(|c: char| c.is_ascii_alphabetic());
        if ends_with_word
            && matches!(self.source.get(self.pos + length), Some(c) if c.is_ascii_alphabetic())
        {
            return false;
        }
        self.pos += length;
        true
    }

    /// 读取一个以 `param` 结尾的分隔参数；只由一个花括号组构成时去掉外层括号
    pub(crate) fn get_parameter(&mut self, name: &str, param: &str) -> ParseResult<String> {
        if param.is_empty() {
            return self.get_argument(name);
        }
        let start = self.pos;
        let mut end = self.pos;
        let mut braced = false;
        while !self.is_done() {
            let ch = self.source[self.pos];
            if ch == '{' {
                braced = self.pos == start;
                self.get_argument(name)?;
                end = self.pos;
            } else if self.match_param(param) {
                return Ok(if braced {
                    self.slice(start + 1, end - 1)
                } else {
                    self.slice(start, end)
                });
            } else if ch == '\\' {
                self.pos += 1;
                braced = false;
                self.next_control_sequence_raw();
                end = self.pos;
            } else {
                self.pos += 1;
                end = self.pos;
                braced = false;
            }
        }
        Err(TexError::RunawayArgument(name.to_string()))
    }

    /// 与 `next_control_sequence` 相同，但不吞掉空格
    fn next_control_sequence_raw(&mut self) {
        let start = self.pos;
        while matches!(self.peek_char(), Some(c) if c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        if self.pos == start {
            self.advance(1);
        }
    }
}

/// 匹配尺寸；`rest` 为真时只要求前缀匹配，并返回匹配的字符数
pub(crate) fn match_dimen(text: &str, rest: bool) -> Option<(String, String, usize)> {
    let caps = DIMEN.captures(text)?;
    let whole = caps.get(0)?;
    if !rest && !text[whole.end()..].trim().is_empty() {
        return None;
    }
    let value = caps.get(1)?.as_str().to_string();
    let unit = caps.get(2)?.as_str().to_ascii_lowercase();
    Some((value, unit, whole.as_str().chars().count()))
}

/// 把尺寸换算为 em
pub(crate) fn dimen_to_em(text: &str) -> Option<f64> {
    let (value, unit, _) = match_dimen(text, false)?;
    let value: f64 = value.parse().ok()?;
    let factor = match unit.as_str() {
        "em" => 1.0,
        "ex" => 0.43,
        "pt" => 0.1,
        "pc" => 1.2,
        "px" => 0.1,
        "in" => 7.2,
        "cm" => 7.2 / 2.54,
        "mm" => 7.2 / 25.4,
        "mu" => 1.0 / 18.0,
        _ => return None,
    };
    Some(value * factor)
}

/// em 数值的文本形式：保留三位小数并去掉末尾的零
pub(crate) fn em(value: f64) -> String {
    if value.abs() < 0.0006 {
        return "0em".to_string();
    }
    let fixed = format!("{value:.3}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}em")
}

/// 去掉首尾空白；以反斜杠结尾时保留一个空格，避免控制符号被截断
pub(crate) fn trim_spaces(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.ends_with('\\') && text.ends_with(' ') {
        format!("{trimmed} ")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_sequence_names() {
        let mut cursor = Cursor::new("alpha x");
        assert_eq!(cursor.next_control_sequence(), "alpha");
        assert_eq!(cursor.peek_char(), Some('x'));
        let mut cursor = Cursor::new(",a");
        assert_eq!(cursor.next_control_sequence(), ",");
        assert_eq!(cursor.peek_char(), Some('a'));
    }

    #[test]
    fn arguments_respect_nesting() {
        let mut cursor = Cursor::new(" {a{b}\\}c} d");
        assert_eq!(cursor.get_argument("\\x").unwrap(), "a{b}\\}c");
        assert_eq!(cursor.get_argument("\\x").unwrap(), "d");
        assert_eq!(
            cursor.get_argument("\\x"),
            Err(TexError::MissingArgFor("\\x".into()))
        );
        let mut open = Cursor::new("{ab");
        assert_eq!(open.get_argument("\\x"), Err(TexError::MissingCloseBrace));
    }

    #[test]
    fn brackets_are_optional() {
        let mut cursor = Cursor::new("[{]}x]y");
        assert_eq!(cursor.get_brackets("\\sqrt").unwrap().as_deref(), Some("{]}x"));
        assert_eq!(cursor.get_brackets("\\sqrt").unwrap(), None);
        let mut open = Cursor::new("[x");
        assert_eq!(
            open.get_brackets("\\sqrt"),
            Err(TexError::MissingCloseBracket("\\sqrt".into()))
        );
    }

    #[test]
    fn dimensions() {
        let mut cursor = Cursor::new(" 2.5pt x");
        assert_eq!(cursor.get_dimen("\\kern").unwrap(), "2.5pt");
        assert_eq!(cursor.peek_char(), Some(' '));
        let mut braced = Cursor::new("{-1em}");
        assert_eq!(braced.get_dimen("\\kern").unwrap(), "-1em");
        let mut bad = Cursor::new("{2}");
        assert!(bad.get_dimen("\\kern").is_err());
        assert_eq!(em(3.0 / 18.0), "0.167em");
        assert_eq!(em(1.0), "1em");
        assert_eq!(dimen_to_em("18mu").map(em), Some("1em".to_string()));
    }

    #[test]
    fn up_to_token_and_splice() {
        let mut cursor = Cursor::new("3{\\of}\\of x");
        assert_eq!(cursor.get_up_to("\\root", "\\of").unwrap(), "3{\\of}");
        cursor.splice("ab", 100).unwrap();
        assert_eq!(cursor.rest(), "abx");
        assert!(cursor.splice("toolong", 3).is_err());
    }

    #[test]
    fn delimited_parameters() {
        let mut cursor = Cursor::new("{a}.b");
        assert_eq!(cursor.get_parameter("\\x", ".").unwrap(), "a");
        let mut cursor = Cursor::new("a\\stop b\\stopper\\stop");
        assert_eq!(cursor.get_parameter("\\x", "\\stop").unwrap(), "a");
        let mut runaway = Cursor::new("abc");
        assert_eq!(
            runaway.get_parameter("\\x", "."),
            Err(TexError::RunawayArgument("\\x".into()))
        );
    }
}
