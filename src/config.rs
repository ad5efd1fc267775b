//! 编译配置模块：管理宏替换上限、编号方式等可调参数

use once_cell::sync::Lazy; // 延迟读取环境变量
use regex::Regex;
use std::env; // 读取环境变量

/// 默认的宏替换次数上限
const DEFAULT_MAX_MACROS: usize = 10_000;
/// 默认的输入缓冲区上限（字符数）
const DEFAULT_MAX_BUFFER: usize = 5 * 1024;

/// 环境变量 `FORMULA_MAX_MACROS` 的默认设置
static ENV_MAX_MACROS: Lazy<usize> =
    Lazy::new(|| read_limit("FORMULA_MAX_MACROS").unwrap_or(DEFAULT_MAX_MACROS));

/// 环境变量 `FORMULA_MAX_BUFFER` 的默认设置
static ENV_MAX_BUFFER: Lazy<usize> =
    Lazy::new(|| read_limit("FORMULA_MAX_BUFFER").unwrap_or(DEFAULT_MAX_BUFFER));

static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z]+").expect("内置正则一定合法"));

static DIGITS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[0-9]+(?:\{,\}[0-9]{3})*(?:\.[0-9]*)?|\.[0-9]+)").expect("内置正则一定合法")
});

fn read_limit(name: &str) -> Option<usize> {
    let value = env::var(name).ok()?;
    value.trim().parse::<usize>().ok().filter(|v| *v > 0)
}

/// 编号放在公式的哪一侧
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TagSide {
    Left,
    Right,
}

impl TagSide {
    pub fn as_str(self) -> &'static str {
        match self {
            TagSide::Left => "left",
            TagSide::Right => "right",
        }
    }
}

/// 自动编号策略
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TagMode {
    /// 从不自动编号，只有 `\tag` 生效
    None,
    /// 只有带编号的环境（equation、align 等）自动编号
    Ams,
    /// 所有行间公式都自动编号
    All,
}

/// 单次编译使用的配置
#[derive(Clone, Debug)]
pub struct Options {
    /// 行间模式（影响编号与 `\\` 的处理）
    pub display: bool,
    /// 字体命令内部连续字母合并为一个标识符时使用的模式
    pub multi_letter_identifiers: Regex,
    /// 数字记号的匹配模式
    pub digits: Regex,
    /// 单次编译允许的宏替换次数
    pub max_macro_substitutions: usize,
    /// 宏展开后缓冲区允许的最大长度
    pub max_buffer_size: usize,
    /// 是否容忍重复定义的标签
    pub ignore_duplicate_labels: bool,
    pub tag_side: TagSide,
    pub tag_indent: String,
    pub tags: TagMode,
    /// 生成交叉引用链接时使用的基础地址
    pub base_url: String,
    /// 锚点 id 优先使用标签名而不是编号
    pub use_label_ids: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            display: true,
            multi_letter_identifiers: IDENTIFIER_PATTERN.clone(),
            digits: DIGITS_PATTERN.clone(),
            max_macro_substitutions: *ENV_MAX_MACROS,
            max_buffer_size: *ENV_MAX_BUFFER,
            ignore_duplicate_labels: false,
            tag_side: TagSide::Right,
            tag_indent: "0.8em".to_string(),
            tags: TagMode::Ams,
            base_url: String::new(),
            use_label_ids: true,
        }
    }
}

impl Options {
    /// 行内公式的默认配置
    pub fn inline() -> Self {
        Self {
            display: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let options = Options::default();
        assert!(options.display);
        assert!(options.max_macro_substitutions >= 1);
        assert!(options.max_buffer_size >= 1);
        assert_eq!(options.tag_side.as_str(), "right");
        assert!(!Options::inline().display);
    }

    #[test]
    fn digit_pattern_accepts_grouped_numbers() {
        let options = Options::default();
        let found = options.digits.find("12{,}345.5x").map(|m| m.as_str());
        assert_eq!(found, Some("12{,}345.5"));
        assert_eq!(options.digits.find(".5").map(|m| m.as_str()), Some(".5"));
        assert!(options.digits.find("x1").is_none());
    }
}
