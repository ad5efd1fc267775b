//! 错误类型模块：统一描述编译过程中可能出现的异常情况
//!
//! 每个变体对应一个稳定的消息键（`key()`），变体字段即消息模板的替换参数（`args()`），
//! `Display` 输出格式化后的完整消息。

use thiserror::Error; // 引入 thiserror 帮助我们简洁地定义错误枚举

/// 编译流程中用来传播的错误枚举
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TexError {
    // ---- 宏定义 ----
    #[error("{0} 使用了非法的控制序列名称")]
    IllegalControlSequenceName(String),
    #[error("{0} 指定的参数个数不合法")]
    IllegalParamNumber(String),
    #[error("{0} 的参数必须按顺序编号")]
    ParametersNotSequential(String),
    #[error("{0} 的参数模板中 # 用法非法")]
    IllegalHashInTemplate(String),
    #[error("{0} 的定义缺少替换文本")]
    MissingReplacementString(String),
    #[error("{0} 之后必须跟一个控制序列")]
    MissingCS(String),
    #[error("宏参数引用非法")]
    IllegalMacroParam,
    #[error("数学模式中不能使用宏参数字符 #")]
    CantUseHash1,
    #[error("{0} 的用法与其定义不匹配")]
    MismatchUseDef(String),
    #[error("{0} 的参数没有结束")]
    RunawayArgument(String),

    // ---- 资源上限 ----
    #[error("宏替换次数超过上限，可能存在递归宏调用")]
    MaxMacroSubstitutionsExceeded,
    #[error("内部缓冲区超过大小上限，可能存在递归宏调用")]
    MaxBufferSizeExceeded,
    #[error("子表达式嵌套过深，可能存在递归宏调用")]
    MaxNestingExceeded,

    // ---- 参数读取 ----
    #[error("未定义的控制序列 {0}")]
    UndefinedControlSequence(String),
    #[error("{0} 缺少参数")]
    MissingArgFor(String),
    #[error("多余的右花括号或缺少左花括号")]
    ExtraCloseMissingOpen,
    #[error("多余的左花括号或缺少右花括号")]
    ExtraOpenMissingClose,
    #[error("缺少右花括号")]
    MissingCloseBrace,
    #[error("查找 {0} 时遇到多余的右花括号")]
    ExtraCloseLooking(String),
    #[error("找不到 {0} 参数的右方括号 ']'")]
    MissingCloseBracket(String),
    #[error("{0} 缺少定界符或定界符无法识别")]
    MissingOrUnrecognizedDelim(String),
    #[error("{0} 缺少尺寸或尺寸单位")]
    MissingDimOrUnits(String),
    #[error("找不到 {1} 需要的 {0}")]
    TokenNotFoundForCommand(String, String),
    #[error("{0} 的方括号参数必须是尺寸")]
    BracketMustBeDimension(String),
    #[error("{0} 的参数必须是整数")]
    IntegerArg(String),

    // ---- 语法结构 ----
    #[error("双重上标：请用花括号明确结合关系")]
    DoubleExponent,
    #[error("双重下标：请用花括号明确结合关系")]
    DoubleSubscripts,
    #[error("撇号导致双重上标：请用花括号明确结合关系")]
    DoubleExponentPrime,
    #[error("缺少上标或下标内容")]
    MissingScript,
    #[error("上标缺少左花括号")]
    MissingOpenForSup,
    #[error("下标缺少左花括号")]
    MissingOpenForSub,
    #[error("{0} 的用法有歧义")]
    AmbiguousUseOf(String),
    #[error("{0} 只能用于运算符之后")]
    MisplacedLimits(String),
    #[error("{0} 只能出现在根号指数中")]
    MisplacedMoveRoot(String),
    #[error("{0} 被重复使用")]
    MultipleMoveRoot(String),
    #[error("{0} 必须位于 \\left 与 \\right 之间")]
    MisplacedMiddle(String),
    #[error("多余的 \\middle")]
    ExtraMiddle,
    #[error("缺少 \\left 或多余的 {0}")]
    MissingLeftExtraRight(String),
    #[error("多余的 \\left 或缺少 \\right")]
    ExtraLeftMissingRight,
    #[error("缺少 \\begin{{{0}}} 或多余的 \\end{{{0}}}")]
    MissingBeginExtraEnd(String),
    #[error("\\begin{{{0}}} 被 \\end{{{1}}} 结束")]
    EnvBadEnd(String, String),
    #[error("缺少 \\end{{{0}}}")]
    EnvMissingEnd(String),
    #[error("未知的环境 '{0}'")]
    UnknownEnv(String),
    #[error("非法的环境名称 '{0}'")]
    InvalidEnv(String),
    #[error("公式环境嵌套错误")]
    ErroneousNestingEq,
    #[error("位置错误的 {0}")]
    Misplaced(String),
    #[error("\\cases 文本中出现多余的对齐符 &")]
    ExtraAlignTab,
    #[error("不支持在此处使用 {0}")]
    UnsupportedHFill(String),
    #[error("{0} 缺少作用对象")]
    MissingBoxFor(String),
    #[error("{0} 的样式参数不合法")]
    BadMathStyleFor(String),
    #[error("{0} 指定的对齐方式不合法")]
    IllegalAlign(String),
    #[error("文本中的数学公式没有结束")]
    MathNotTerminated,

    // ---- 属性注入 ----
    #[error("{0} 不是记号元素")]
    NotMathMLToken(String),
    #[error("非法的属性：{0}")]
    InvalidMathMLAttr(String),
    #[error("{0} 不是 {1} 可识别的属性")]
    UnknownAttrForElement(String, String),

    // ---- 编号与标签 ----
    #[error("重复的 {0}")]
    MultipleTag(String),
    #[error("重复的 {0}")]
    MultipleLabel(String),
    #[error("标签 '{0}' 被重复定义")]
    DuplicateLabel(String),
    #[error("{0} 不允许出现在 {1} 环境中")]
    TagNotAllowedHere(String, String),

    /// 捕获 panic 后返回的通用错误
    #[error("内部编译发生未知异常")]
    UnexpectedPanic,
}

impl TexError {
    /// 稳定的消息键，供调用方精确记录或本地化
    pub fn key(&self) -> &'static str {
        match self {
            TexError::IllegalControlSequenceName(_) => "IllegalControlSequenceName",
            TexError::IllegalParamNumber(_) => "IllegalParamNumber",
            TexError::ParametersNotSequential(_) => "ParametersNotSequential",
            TexError::IllegalHashInTemplate(_) => "IllegalHashInTemplate",
            TexError::MissingReplacementString(_) => "MissingReplacementString",
            TexError::MissingCS(_) => "MissingCS",
            TexError::IllegalMacroParam => "IllegalMacroParam",
            TexError::CantUseHash1 => "CantUseHash1",
            TexError::MismatchUseDef(_) => "MismatchUseDef",
            TexError::RunawayArgument(_) => "RunawayArgument",
            TexError::MaxMacroSubstitutionsExceeded => "MaxMacroSubstitutionsExceeded",
            TexError::MaxBufferSizeExceeded => "MaxBufferSizeExceeded",
            TexError::MaxNestingExceeded => "MaxNestingExceeded",
            TexError::UndefinedControlSequence(_) => "UndefinedControlSequence",
            TexError::MissingArgFor(_) => "MissingArgFor",
            TexError::ExtraCloseMissingOpen => "ExtraCloseMissingOpen",
            TexError::ExtraOpenMissingClose => "ExtraOpenMissingClose",
            TexError::MissingCloseBrace => "MissingCloseBrace",
            TexError::ExtraCloseLooking(_) => "ExtraCloseLooking",
            TexError::MissingCloseBracket(_) => "MissingCloseBracket",
            TexError::MissingOrUnrecognizedDelim(_) => "MissingOrUnrecognizedDelim",
            TexError::MissingDimOrUnits(_) => "MissingDimOrUnits",
            TexError::TokenNotFoundForCommand(..) => "TokenNotFoundForCommand",
            TexError::BracketMustBeDimension(_) => "BracketMustBeDimension",
            TexError::IntegerArg(_) => "IntegerArg",
            TexError::DoubleExponent => "DoubleExponent",
            TexError::DoubleSubscripts => "DoubleSubscripts",
            TexError::DoubleExponentPrime => "DoubleExponentPrime",
            TexError::MissingScript => "MissingScript",
            TexError::MissingOpenForSup => "MissingOpenForSup",
            TexError::MissingOpenForSub => "MissingOpenForSub",
            TexError::AmbiguousUseOf(_) => "AmbiguousUseOf",
            TexError::MisplacedLimits(_) => "MisplacedLimits",
            TexError::MisplacedMoveRoot(_) => "MisplacedMoveRoot",
            TexError::MultipleMoveRoot(_) => "MultipleMoveRoot",
            TexError::MisplacedMiddle(_) => "MisplacedMiddle",
            TexError::ExtraMiddle => "ExtraMiddle",
            TexError::MissingLeftExtraRight(_) => "MissingLeftExtraRight",
            TexError::ExtraLeftMissingRight => "ExtraLeftMissingRight",
            TexError::MissingBeginExtraEnd(_) => "MissingBeginExtraEnd",
            TexError::EnvBadEnd(..) => "EnvBadEnd",
            TexError::EnvMissingEnd(_) => "EnvMissingEnd",
            TexError::UnknownEnv(_) => "UnknownEnv",
            TexError::InvalidEnv(_) => "InvalidEnv",
            TexError::ErroneousNestingEq => "ErroneousNestingEq",
            TexError::Misplaced(_) => "Misplaced",
            TexError::ExtraAlignTab => "ExtraAlignTab",
            TexError::UnsupportedHFill(_) => "UnsupportedHFill",
            TexError::MissingBoxFor(_) => "MissingBoxFor",
            TexError::BadMathStyleFor(_) => "BadMathStyleFor",
            TexError::IllegalAlign(_) => "IllegalAlign",
            TexError::MathNotTerminated => "MathNotTerminated",
            TexError::NotMathMLToken(_) => "NotMathMLToken",
            TexError::InvalidMathMLAttr(_) => "InvalidMathMLAttr",
            TexError::UnknownAttrForElement(..) => "UnknownAttrForElement",
            TexError::MultipleTag(_) => "MultipleTag",
            TexError::MultipleLabel(_) => "MultipleLabel",
            TexError::DuplicateLabel(_) => "DuplicateLabel",
            TexError::TagNotAllowedHere(..) => "TagNotAllowedHere",
            TexError::UnexpectedPanic => "UnexpectedPanic",
        }
    }

    /// 消息模板的替换参数，按模板中的出现顺序排列
    pub fn args(&self) -> Vec<String> {
        match self {
            TexError::IllegalControlSequenceName(a)
            | TexError::IllegalParamNumber(a)
            | TexError::ParametersNotSequential(a)
            | TexError::IllegalHashInTemplate(a)
            | TexError::MissingReplacementString(a)
            | TexError::MissingCS(a)
            | TexError::MismatchUseDef(a)
            | TexError::RunawayArgument(a)
            | TexError::UndefinedControlSequence(a)
            | TexError::MissingArgFor(a)
            | TexError::ExtraCloseLooking(a)
            | TexError::MissingCloseBracket(a)
            | TexError::MissingOrUnrecognizedDelim(a)
            | TexError::MissingDimOrUnits(a)
            | TexError::BracketMustBeDimension(a)
            | TexError::IntegerArg(a)
            | TexError::AmbiguousUseOf(a)
            | TexError::MisplacedLimits(a)
            | TexError::MisplacedMoveRoot(a)
            | TexError::MultipleMoveRoot(a)
            | TexError::MisplacedMiddle(a)
            | TexError::MissingLeftExtraRight(a)
            | TexError::MissingBeginExtraEnd(a)
            | TexError::EnvMissingEnd(a)
            | TexError::UnknownEnv(a)
            | TexError::InvalidEnv(a)
            | TexError::Misplaced(a)
            | TexError::UnsupportedHFill(a)
            | TexError::MissingBoxFor(a)
            | TexError::BadMathStyleFor(a)
            | TexError::IllegalAlign(a)
            | TexError::NotMathMLToken(a)
            | TexError::InvalidMathMLAttr(a)
            | TexError::MultipleTag(a)
            | TexError::MultipleLabel(a)
            | TexError::DuplicateLabel(a) => vec![a.clone()],
            TexError::TokenNotFoundForCommand(a, b)
            | TexError::EnvBadEnd(a, b)
            | TexError::UnknownAttrForElement(a, b)
            | TexError::TagNotAllowedHere(a, b) => vec![a.clone(), b.clone()],
            TexError::IllegalMacroParam
            | TexError::CantUseHash1
            | TexError::MaxMacroSubstitutionsExceeded
            | TexError::MaxBufferSizeExceeded
            | TexError::MaxNestingExceeded
            | TexError::ExtraCloseMissingOpen
            | TexError::ExtraOpenMissingClose
            | TexError::MissingCloseBrace
            | TexError::DoubleExponent
            | TexError::DoubleSubscripts
            | TexError::DoubleExponentPrime
            | TexError::MissingScript
            | TexError::MissingOpenForSup
            | TexError::MissingOpenForSub
            | TexError::MathNotTerminated
            | TexError::ExtraMiddle
            | TexError::ExtraLeftMissingRight
            | TexError::ErroneousNestingEq
            | TexError::ExtraAlignTab
            | TexError::UnexpectedPanic => Vec::new(),
        }
    }

    /// 资源上限类错误：通常意味着递归宏
    pub fn is_resource_limit(&self) -> bool {
        matches!(
            self,
            TexError::MaxMacroSubstitutionsExceeded
                | TexError::MaxBufferSizeExceeded
                | TexError::MaxNestingExceeded
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_and_args_follow_variant() {
        let err = TexError::EnvBadEnd("b".into(), "a".into());
        assert_eq!(err.key(), "EnvBadEnd");
        assert_eq!(err.args(), vec!["b".to_string(), "a".to_string()]);
        assert_eq!(err.to_string(), "\\begin{b} 被 \\end{a} 结束");
    }

    #[test]
    fn resource_errors_are_flagged() {
        assert!(TexError::MaxBufferSizeExceeded.is_resource_limit());
        assert!(!TexError::DoubleExponent.is_resource_limit());
        assert!(TexError::DoubleExponent.args().is_empty());
    }
}
