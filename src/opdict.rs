//! 运算符字典：按 (符号文本, 位置) 查询间距、TeX 类别与默认属性
//!
//! 显式表查不到时，按首个码点在 Unicode 区段表中二分查找，由区段的类别推出间距；
//! 两者都失败时返回 `{0, 0, Rel}`。所有表都是只读静态数据，可在线程间共享。

use phf::phf_map;

use crate::ast::{NodeKind, TexClass};

/// 运算符在行中的位置
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Form {
    Prefix,
    Infix,
    Postfix,
}

impl Form {
    pub fn as_str(self) -> &'static str {
        match self {
            Form::Prefix => "prefix",
            Form::Infix => "infix",
            Form::Postfix => "postfix",
        }
    }

    /// 指定位置查不到时依次尝试的位置
    fn search_order(self) -> [Form; 3] {
        match self {
            Form::Prefix => [Form::Prefix, Form::Infix, Form::Postfix],
            Form::Infix => [Form::Infix, Form::Prefix, Form::Postfix],
            Form::Postfix => [Form::Postfix, Form::Infix, Form::Prefix],
        }
    }
}

/// 运算符的默认属性集合
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Hash)]
pub struct OpProps(u16);

impl OpProps {
    pub const EMPTY: OpProps = OpProps(0);
    pub const FENCE: OpProps = OpProps(1);
    pub const STRETCHY: OpProps = OpProps(1 << 1);
    pub const SYMMETRIC: OpProps = OpProps(1 << 2);
    pub const LARGEOP: OpProps = OpProps(1 << 3);
    pub const MOVABLELIMITS: OpProps = OpProps(1 << 4);
    pub const ACCENT: OpProps = OpProps(1 << 5);
    pub const SEPARATOR: OpProps = OpProps(1 << 6);
    pub const INTEGRAL: OpProps = OpProps(1 << 7);

    pub const fn union(self, other: OpProps) -> OpProps {
        OpProps(self.0 | other.0)
    }

    pub fn contains(self, other: OpProps) -> bool {
        self.0 & other.0 == other.0
    }

    /// 以 MathML 属性名列出所有置位的属性
    pub fn names(self) -> Vec<&'static str> {
        const NAMES: [(OpProps, &str); 8] = [
            (OpProps::FENCE, "fence"),
            (OpProps::STRETCHY, "stretchy"),
            (OpProps::SYMMETRIC, "symmetric"),
            (OpProps::LARGEOP, "largeop"),
            (OpProps::MOVABLELIMITS, "movablelimits"),
            (OpProps::ACCENT, "accent"),
            (OpProps::SEPARATOR, "separator"),
            (OpProps::INTEGRAL, "integral"),
        ];
        NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

/// 一条运算符字典记录，间距以 1/18 em 为单位
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct OpEntry {
    pub lspace: u8,
    pub rspace: u8,
    pub class: TexClass,
    pub props: OpProps,
}

const fn entry(lspace: u8, rspace: u8, class: TexClass, props: OpProps) -> OpEntry {
    OpEntry {
        lspace,
        rspace,
        class,
        props,
    }
}

const FENCED: OpProps = OpProps::FENCE
    .union(OpProps::STRETCHY)
    .union(OpProps::SYMMETRIC);
const BIG: OpProps = OpProps::LARGEOP.union(OpProps::SYMMETRIC);

const ORD: OpEntry = entry(0, 0, TexClass::Ord, OpProps::EMPTY);
const ORD11: OpEntry = entry(1, 1, TexClass::Ord, OpProps::EMPTY);
const ORD21: OpEntry = entry(2, 1, TexClass::Ord, OpProps::EMPTY);
const ORD02: OpEntry = entry(0, 2, TexClass::Ord, OpProps::EMPTY);
const ORD55: OpEntry = entry(5, 5, TexClass::Ord, OpProps::EMPTY);
const NONE: OpEntry = entry(0, 0, TexClass::None, OpProps::EMPTY);
const OP: OpEntry = entry(1, 2, TexClass::Op, BIG.union(OpProps::MOVABLELIMITS));
const OPFIXED: OpEntry = entry(1, 2, TexClass::Op, BIG);
const INTEGRAL: OpEntry = entry(0, 1, TexClass::Op, BIG.union(OpProps::INTEGRAL));
const BIN3: OpEntry = entry(3, 3, TexClass::Bin, OpProps::EMPTY);
const BIN4: OpEntry = entry(4, 4, TexClass::Bin, OpProps::EMPTY);
const BIN01: OpEntry = entry(0, 1, TexClass::Bin, OpProps::EMPTY);
const BIN5: OpEntry = entry(5, 5, TexClass::Bin, OpProps::EMPTY);
const REL: OpEntry = entry(5, 5, TexClass::Rel, OpProps::EMPTY);
const REL1: OpEntry = entry(1, 1, TexClass::Rel, OpProps::STRETCHY);
const RELSTRETCH: OpEntry = entry(5, 5, TexClass::Rel, OpProps::STRETCHY);
const WIDEREL: OpEntry = entry(5, 5, TexClass::Rel, OpProps::ACCENT.union(OpProps::STRETCHY));
const OPEN: OpEntry = entry(0, 0, TexClass::Open, FENCED);
const CLOSE: OpEntry = entry(0, 0, TexClass::Close, FENCED);
const FENCE_ORD: OpEntry = entry(0, 0, TexClass::Ord, FENCED);
const INNER: OpEntry = entry(0, 0, TexClass::Inner, OpProps::EMPTY);
const PUNCT: OpEntry = entry(0, 3, TexClass::Punct, OpProps::SEPARATOR);
const ACCENT: OpEntry = entry(0, 0, TexClass::Ord, OpProps::ACCENT);
const WIDEACCENT: OpEntry = entry(0, 0, TexClass::Ord, OpProps::ACCENT.union(OpProps::STRETCHY));

static PREFIX: phf::Map<&'static str, OpEntry> = phf_map! {
    "(" => OPEN,
    "[" => OPEN,
    "{" => OPEN,
    "|" => FENCE_ORD,
    "||" => FENCE_ORD,
    "‖" => FENCE_ORD,
    "⌈" => OPEN,
    "⌊" => OPEN,
    "⟨" => OPEN,
    "⟦" => OPEN,
    "⟪" => OPEN,
    "⟮" => OPEN,
    "⦃" => OPEN,
    "⦅" => OPEN,
    "¬" => ORD21,
    "±" => BIN01,
    "∓" => BIN01,
    "+" => BIN01,
    "-" => BIN01,
    "−" => BIN01,
    "∀" => ORD21,
    "∂" => ORD21,
    "∃" => ORD21,
    "∄" => ORD21,
    "∇" => ORD21,
    "√" => entry(1, 1, TexClass::Ord, OpProps::STRETCHY),
    "∛" => ORD11,
    "∜" => ORD11,
    "∠" => ORD,
    "∡" => ORD,
    "∢" => ORD,
    "∑" => OP,
    "∏" => OP,
    "∐" => OP,
    "⋀" => OP,
    "⋁" => OP,
    "⋂" => OP,
    "⋃" => OP,
    "⨀" => OP,
    "⨁" => OP,
    "⨂" => OP,
    "⨄" => OP,
    "⨅" => OP,
    "⨆" => OP,
    "⨉" => OP,
    "∫" => INTEGRAL,
    "∬" => INTEGRAL,
    "∭" => INTEGRAL,
    "∮" => INTEGRAL,
    "∯" => INTEGRAL,
    "∰" => INTEGRAL,
    "∱" => INTEGRAL,
    "∲" => INTEGRAL,
    "∳" => INTEGRAL,
    "⨌" => INTEGRAL,
    "⨑" => INTEGRAL,
    "lim" => OP,
    "limsup" => OP,
    "liminf" => OP,
    "max" => OP,
    "min" => OP,
    "sup" => OP,
    "inf" => OP,
    "det" => OP,
    "gcd" => OP,
    "Pr" => OP,
    "injlim" => OP,
    "projlim" => OP,
    "varlimsup" => OP,
    "varliminf" => OP,
    "varinjlim" => OP,
    "varprojlim" => OP,
    "argmax" => OP,
    "argmin" => OP,
    "⨯" => OPFIXED,
};

static POSTFIX: phf::Map<&'static str, OpEntry> = phf_map! {
    "!" => entry(1, 0, TexClass::Close, OpProps::EMPTY),
    "&" => ORD,
    ")" => CLOSE,
    "]" => CLOSE,
    "}" => CLOSE,
    "|" => FENCE_ORD,
    "||" => FENCE_ORD,
    "‖" => FENCE_ORD,
    "⌉" => CLOSE,
    "⌋" => CLOSE,
    "⟩" => CLOSE,
    "⟧" => CLOSE,
    "⟫" => CLOSE,
    "⟯" => CLOSE,
    "⦄" => CLOSE,
    "⦆" => CLOSE,
    "'" => ORD02,
    "′" => ORD02,
    "″" => ORD02,
    "‴" => ORD02,
    "⁗" => ORD02,
    "‵" => ORD02,
    "%" => ORD,
    "°" => ORD,
    "^" => WIDEACCENT,
    "_" => WIDEACCENT,
    "~" => WIDEACCENT,
    "¨" => ACCENT,
    "¯" => WIDEACCENT,
    "´" => ACCENT,
    "¸" => ACCENT,
    "ˆ" => WIDEACCENT,
    "ˇ" => WIDEACCENT,
    "ˉ" => WIDEACCENT,
    "ˊ" => ACCENT,
    "ˋ" => ACCENT,
    "˘" => ACCENT,
    "˙" => ACCENT,
    "˚" => ACCENT,
    "˜" => WIDEACCENT,
    "‾" => WIDEACCENT,
    "⃗" => ACCENT,
    "⏜" => WIDEACCENT,
    "⏝" => WIDEACCENT,
    "⏞" => WIDEACCENT,
    "⏟" => WIDEACCENT,
    "⏠" => WIDEACCENT,
    "⏡" => WIDEACCENT,
    "⎴" => WIDEACCENT,
    "⎵" => WIDEACCENT,
    "→" => WIDEREL,
    "←" => WIDEREL,
    "↔" => WIDEREL,
};

static INFIX: phf::Map<&'static str, OpEntry> = phf_map! {
    "!=" => BIN4,
    "#" => ORD,
    "$" => ORD,
    "%" => entry(3, 3, TexClass::Ord, OpProps::EMPTY),
    "&&" => BIN4,
    "*" => BIN3,
    "**" => entry(1, 1, TexClass::Bin, OpProps::EMPTY),
    "*=" => BIN4,
    "+" => BIN4,
    "+=" => BIN4,
    "," => PUNCT,
    "-" => BIN4,
    "-=" => BIN4,
    "->" => BIN5,
    "." => entry(0, 3, TexClass::Punct, OpProps::SEPARATOR),
    "/" => ORD11,
    "//" => entry(1, 1, TexClass::Bin, OpProps::EMPTY),
    "/=" => BIN4,
    ":" => entry(1, 2, TexClass::Rel, OpProps::EMPTY),
    ":=" => BIN4,
    ";" => PUNCT,
    "<" => REL,
    "<=" => BIN5,
    "<>" => entry(1, 1, TexClass::Bin, OpProps::EMPTY),
    "=" => REL,
    "==" => BIN4,
    ">" => REL,
    ">=" => BIN5,
    "?" => entry(1, 1, TexClass::Close, OpProps::EMPTY),
    "@" => ORD11,
    "\\" => ORD,
    "^" => ORD11,
    "_" => ORD11,
    "|" => entry(2, 2, TexClass::Ord, FENCED),
    "||" => entry(2, 2, TexClass::Bin, FENCED),
    "|||" => entry(2, 2, TexClass::Ord, FENCED),
    "±" => BIN4,
    "·" => BIN4,
    "×" => BIN4,
    "÷" => BIN4,
    "϶" => REL,
    "†" => BIN3,
    "‡" => BIN3,
    "•" => BIN4,
    "…" => INNER,
    "⁄" => entry(4, 4, TexClass::Ord, OpProps::STRETCHY),
    "⁡" => NONE,
    "⁢" => NONE,
    "⁣" => entry(0, 0, TexClass::None, OpProps::SEPARATOR),
    "⁤" => BIN4,
    "←" => RELSTRETCH,
    "↑" => REL1,
    "→" => RELSTRETCH,
    "↓" => REL1,
    "↔" => RELSTRETCH,
    "↕" => REL1,
    "↖" => REL,
    "↗" => REL,
    "↘" => REL,
    "↙" => REL,
    "↚" => RELSTRETCH,
    "↛" => RELSTRETCH,
    "↞" => RELSTRETCH,
    "↟" => REL1,
    "↠" => RELSTRETCH,
    "↡" => REL1,
    "↢" => RELSTRETCH,
    "↣" => RELSTRETCH,
    "↤" => RELSTRETCH,
    "↥" => REL1,
    "↦" => RELSTRETCH,
    "↧" => REL1,
    "↩" => RELSTRETCH,
    "↪" => RELSTRETCH,
    "↫" => RELSTRETCH,
    "↬" => RELSTRETCH,
    "↭" => RELSTRETCH,
    "↮" => RELSTRETCH,
    "↰" => REL1,
    "↱" => REL1,
    "↶" => REL,
    "↷" => REL,
    "↺" => REL,
    "↻" => REL,
    "↼" => RELSTRETCH,
    "↽" => RELSTRETCH,
    "↾" => REL1,
    "↿" => REL1,
    "⇀" => RELSTRETCH,
    "⇁" => RELSTRETCH,
    "⇂" => REL1,
    "⇃" => REL1,
    "⇄" => RELSTRETCH,
    "⇅" => REL1,
    "⇆" => RELSTRETCH,
    "⇇" => RELSTRETCH,
    "⇈" => REL1,
    "⇉" => RELSTRETCH,
    "⇊" => REL1,
    "⇋" => RELSTRETCH,
    "⇌" => RELSTRETCH,
    "⇍" => RELSTRETCH,
    "⇎" => RELSTRETCH,
    "⇏" => RELSTRETCH,
    "⇐" => RELSTRETCH,
    "⇑" => REL1,
    "⇒" => RELSTRETCH,
    "⇓" => REL1,
    "⇔" => RELSTRETCH,
    "⇕" => REL1,
    "⇚" => RELSTRETCH,
    "⇛" => RELSTRETCH,
    "⇝" => RELSTRETCH,
    "∈" => REL,
    "∉" => REL,
    "∊" => REL,
    "∋" => REL,
    "∌" => REL,
    "∍" => REL,
    "−" => BIN4,
    "∓" => BIN4,
    "∔" => BIN4,
    "∕" => entry(4, 4, TexClass::Ord, OpProps::STRETCHY),
    "∖" => BIN4,
    "∗" => BIN4,
    "∘" => BIN4,
    "∙" => BIN4,
    "∝" => REL,
    "∣" => REL,
    "∤" => REL,
    "∥" => REL,
    "∦" => REL,
    "∧" => BIN4,
    "∨" => BIN4,
    "∩" => BIN4,
    "∪" => BIN4,
    "∴" => REL,
    "∵" => REL,
    "∶" => REL,
    "∷" => REL,
    "∸" => BIN4,
    "∼" => REL,
    "∽" => REL,
    "≀" => BIN4,
    "≁" => REL,
    "≂" => REL,
    "≃" => REL,
    "≄" => REL,
    "≅" => REL,
    "≆" => REL,
    "≇" => REL,
    "≈" => REL,
    "≉" => REL,
    "≊" => REL,
    "≋" => REL,
    "≍" => REL,
    "≎" => REL,
    "≏" => REL,
    "≐" => REL,
    "≑" => REL,
    "≒" => REL,
    "≓" => REL,
    "≔" => REL,
    "≕" => REL,
    "≖" => REL,
    "≗" => REL,
    "≜" => REL,
    "≟" => REL,
    "≠" => REL,
    "≡" => REL,
    "≢" => REL,
    "≤" => REL,
    "≥" => REL,
    "≦" => REL,
    "≧" => REL,
    "≨" => REL,
    "≩" => REL,
    "≪" => REL,
    "≫" => REL,
    "≬" => REL,
    "≭" => REL,
    "≮" => REL,
    "≯" => REL,
    "≰" => REL,
    "≱" => REL,
    "≲" => REL,
    "≳" => REL,
    "≶" => REL,
    "≷" => REL,
    "≺" => REL,
    "≻" => REL,
    "≼" => REL,
    "≽" => REL,
    "≾" => REL,
    "≿" => REL,
    "⊀" => REL,
    "⊁" => REL,
    "⊂" => REL,
    "⊃" => REL,
    "⊄" => REL,
    "⊅" => REL,
    "⊆" => REL,
    "⊇" => REL,
    "⊈" => REL,
    "⊉" => REL,
    "⊊" => REL,
    "⊋" => REL,
    "⊎" => BIN4,
    "⊏" => REL,
    "⊐" => REL,
    "⊑" => REL,
    "⊒" => REL,
    "⊓" => BIN4,
    "⊔" => BIN4,
    "⊕" => BIN4,
    "⊖" => BIN4,
    "⊗" => BIN4,
    "⊘" => BIN4,
    "⊙" => BIN4,
    "⊚" => BIN4,
    "⊛" => BIN4,
    "⊝" => BIN4,
    "⊞" => BIN4,
    "⊟" => BIN4,
    "⊠" => BIN4,
    "⊡" => BIN4,
    "⊢" => REL,
    "⊣" => REL,
    "⊨" => REL,
    "⊩" => REL,
    "⊪" => REL,
    "⊫" => REL,
    "⊬" => REL,
    "⊭" => REL,
    "⊮" => REL,
    "⊯" => REL,
    "⊲" => REL,
    "⊳" => REL,
    "⊴" => REL,
    "⊵" => REL,
    "⊸" => REL,
    "⊺" => BIN4,
    "⊻" => BIN4,
    "⊼" => BIN4,
    "⊽" => BIN4,
    "⋄" => BIN4,
    "⋅" => BIN4,
    "⋆" => BIN4,
    "⋇" => BIN4,
    "⋈" => REL,
    "⋉" => BIN4,
    "⋊" => BIN4,
    "⋋" => BIN4,
    "⋌" => BIN4,
    "⋍" => REL,
    "⋎" => BIN4,
    "⋏" => BIN4,
    "⋐" => REL,
    "⋑" => REL,
    "⋒" => BIN4,
    "⋓" => BIN4,
    "⋔" => REL,
    "⋖" => REL,
    "⋗" => REL,
    "⋘" => REL,
    "⋙" => REL,
    "⋚" => REL,
    "⋛" => REL,
    "⋞" => REL,
    "⋟" => REL,
    "⋠" => REL,
    "⋡" => REL,
    "⋢" => REL,
    "⋣" => REL,
    "⋦" => REL,
    "⋧" => REL,
    "⋨" => REL,
    "⋩" => REL,
    "⋪" => REL,
    "⋫" => REL,
    "⋬" => REL,
    "⋭" => REL,
    "⋮" => ORD55,
    "⋯" => INNER,
    "⋰" => REL,
    "⋱" => ORD55,
    "⌢" => REL,
    "⌣" => REL,
    "△" => BIN4,
    "▵" => BIN4,
    "▹" => BIN4,
    "▽" => BIN4,
    "▿" => BIN4,
    "◃" => BIN4,
    "◁" => BIN4,
    "▷" => BIN4,
    "◯" => BIN3,
    "⟵" => RELSTRETCH,
    "⟶" => RELSTRETCH,
    "⟷" => RELSTRETCH,
    "⟸" => RELSTRETCH,
    "⟹" => RELSTRETCH,
    "⟺" => RELSTRETCH,
    "⟼" => RELSTRETCH,
    "⤍" => RELSTRETCH,
    "⤏" => RELSTRETCH,
    "⧸" => BIN3,
    "⨿" => BIN4,
    "⨯" => BIN4,
    "⩽" => REL,
    "⩾" => REL,
    "⪅" => REL,
    "⪆" => REL,
    "⪇" => REL,
    "⪈" => REL,
    "⪉" => REL,
    "⪊" => REL,
    "⪋" => REL,
    "⪌" => REL,
    "⪕" => REL,
    "⪖" => REL,
    "⪯" => REL,
    "⪰" => REL,
    "⪵" => REL,
    "⪶" => REL,
    "⪷" => REL,
    "⪸" => REL,
    "⪹" => REL,
    "⪺" => REL,
    "⫅" => REL,
    "⫆" => REL,
    "⫋" => REL,
    "⫌" => REL,
};

/// Unicode 区段记录：缺省的节点种类、类别与字体变体
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RangeEntry {
    pub start: u32,
    pub end: u32,
    pub class: TexClass,
    pub kind: NodeKind,
    pub variant: Option<&'static str>,
}

const fn range(start: u32, end: u32, class: TexClass, kind: NodeKind) -> RangeEntry {
    RangeEntry {
        start,
        end,
        class,
        kind,
        variant: None,
    }
}

const fn upright(start: u32, end: u32) -> RangeEntry {
    RangeEntry {
        start,
        end,
        class: TexClass::Ord,
        kind: NodeKind::Mi,
        variant: Some("normal"),
    }
}

/// 按起点升序排列且互不重叠
static RANGES: &[RangeEntry] = &[
    range(0x0020, 0x007F, TexClass::Ord, NodeKind::Mo),
    range(0x00A0, 0x00BF, TexClass::Ord, NodeKind::Mo),
    range(0x00C0, 0x024F, TexClass::Ord, NodeKind::Mi),
    range(0x02B0, 0x036F, TexClass::Ord, NodeKind::Mo),
    range(0x0370, 0x03FF, TexClass::Ord, NodeKind::Mi),
    range(0x0400, 0x04FF, TexClass::Ord, NodeKind::Mi),
    range(0x0590, 0x05FF, TexClass::Ord, NodeKind::Mi),
    range(0x0600, 0x06FF, TexClass::Ord, NodeKind::Mi),
    range(0x0900, 0x097F, TexClass::Ord, NodeKind::Mi),
    range(0x0E00, 0x0E7F, TexClass::Ord, NodeKind::Mi),
    range(0x1E00, 0x1EFF, TexClass::Ord, NodeKind::Mi),
    range(0x2000, 0x206F, TexClass::Ord, NodeKind::Mo),
    range(0x2070, 0x209F, TexClass::Ord, NodeKind::Mo),
    range(0x20A0, 0x20CF, TexClass::Ord, NodeKind::Mo),
    range(0x20D0, 0x20FF, TexClass::Ord, NodeKind::Mo),
    range(0x2100, 0x214F, TexClass::Ord, NodeKind::Mi),
    range(0x2150, 0x218F, TexClass::Ord, NodeKind::Mn),
    range(0x2190, 0x21FF, TexClass::Rel, NodeKind::Mo),
    range(0x2200, 0x22FF, TexClass::Bin, NodeKind::Mo),
    range(0x2300, 0x23FF, TexClass::Ord, NodeKind::Mo),
    range(0x2460, 0x24FF, TexClass::Ord, NodeKind::Mn),
    range(0x2500, 0x27EF, TexClass::Ord, NodeKind::Mo),
    range(0x27F0, 0x27FF, TexClass::Rel, NodeKind::Mo),
    range(0x2800, 0x28FF, TexClass::Ord, NodeKind::Mtext),
    range(0x2900, 0x297F, TexClass::Rel, NodeKind::Mo),
    range(0x2980, 0x29FF, TexClass::Ord, NodeKind::Mo),
    range(0x2A00, 0x2AFF, TexClass::Bin, NodeKind::Mo),
    range(0x2B00, 0x2B2F, TexClass::Ord, NodeKind::Mo),
    range(0x2B30, 0x2B4F, TexClass::Rel, NodeKind::Mo),
    range(0x2B50, 0x2BFF, TexClass::Ord, NodeKind::Mo),
    range(0x2C00, 0x2DFF, TexClass::Ord, NodeKind::Mi),
    range(0x2E00, 0x2E7F, TexClass::Ord, NodeKind::Mo),
    upright(0x2E80, 0x2FDF),
    range(0x2FF0, 0x303F, TexClass::Ord, NodeKind::Mo),
    upright(0x3040, 0xA49F),
    range(0xA4D0, 0xA82F, TexClass::Ord, NodeKind::Mi),
    range(0xA830, 0xA83F, TexClass::Ord, NodeKind::Mn),
    range(0xA840, 0xD7FF, TexClass::Ord, NodeKind::Mi),
    upright(0xF900, 0xFAFF),
    range(0xFB00, 0xFDFF, TexClass::Ord, NodeKind::Mi),
    range(0xFE00, 0xFE6F, TexClass::Ord, NodeKind::Mo),
    range(0xFE70, 0x100FF, TexClass::Ord, NodeKind::Mi),
    range(0x10100, 0x1D7FF, TexClass::Ord, NodeKind::Mi),
    range(0x1D800, 0x1DAFF, TexClass::Ord, NodeKind::Mo),
    range(0x1DB00, 0x1F4FF, TexClass::Ord, NodeKind::Mi),
    range(0x1F500, 0x1F5FF, TexClass::Ord, NodeKind::Mo),
    range(0x1F600, 0x1F6FF, TexClass::Ord, NodeKind::Mi),
    range(0x1F700, 0x1F77F, TexClass::Ord, NodeKind::Mo),
    range(0x1F780, 0x1F80F, TexClass::Ord, NodeKind::Mi),
    range(0x1F810, 0x1F8FF, TexClass::Rel, NodeKind::Mo),
    range(0x1F900, 0x1F9FF, TexClass::Ord, NodeKind::Mi),
    range(0x1FA00, 0x1FAFF, TexClass::Ord, NodeKind::Mo),
    range(0x1FB00, 0x1FBFF, TexClass::Ord, NodeKind::Mi),
];

/// 区段回退时按类别推出的间距
fn class_spacing(class: TexClass) -> (u8, u8) {
    match class {
        TexClass::Op => (1, 2),
        TexClass::Bin => (3, 3),
        TexClass::Rel => (4, 4),
        TexClass::Punct => (0, 3),
        _ => (0, 0),
    }
}

const DEFAULT: OpEntry = entry(0, 0, TexClass::Rel, OpProps::EMPTY);

fn table(form: Form) -> &'static phf::Map<&'static str, OpEntry> {
    match form {
        Form::Prefix => &PREFIX,
        Form::Infix => &INFIX,
        Form::Postfix => &POSTFIX,
    }
}

/// 只查显式表
pub fn lookup(text: &str, form: Form) -> Option<OpEntry> {
    table(form).get(text).copied()
}

/// 依次按中缀、前缀、后缀查显式表
pub fn lookup_any(text: &str) -> Option<OpEntry> {
    Form::Infix
        .search_order()
        .iter()
        .find_map(|form| lookup(text, *form))
}

/// 首个码点所在的 Unicode 区段
pub fn range_of(ch: char) -> Option<&'static RangeEntry> {
    let code = ch as u32;
    let index = RANGES.partition_point(|r| r.end < code);
    RANGES.get(index).filter(|r| r.start <= code)
}

fn from_range(text: &str) -> Option<OpEntry> {
    let first = text.chars().next()?;
    let found = range_of(first)?;
    let (lspace, rspace) = class_spacing(found.class);
    Some(entry(lspace, rspace, found.class, OpProps::EMPTY))
}

/// 指定位置的显式记录，否则区段回退，否则 `{0, 0, Rel}`
pub fn classify(text: &str, form: Form) -> OpEntry {
    lookup(text, form)
        .or_else(|| from_range(text))
        .unwrap_or(DEFAULT)
}

/// 与 `classify` 相同，但显式表会按该位置的优先顺序尝试全部三种位置
pub fn resolve(text: &str, form: Form) -> OpEntry {
    form.search_order()
        .iter()
        .find_map(|f| lookup(text, *f))
        .or_else(|| from_range(text))
        .unwrap_or(DEFAULT)
}

/// 解析期使用的类别：按中缀位置查询
pub fn default_class(text: &str) -> TexClass {
    resolve(text, Form::Infix).class
}

/// 字典是否认为该符号可伸缩
pub fn is_stretchy(text: &str) -> bool {
    lookup_any(text).map_or(false, |e| e.props.contains(OpProps::STRETCHY))
}

/// 字典是否认为该符号的上下限可移动
pub fn has_movable_limits(text: &str) -> bool {
    lookup_any(text).map_or(false, |e| e.props.contains(OpProps::MOVABLELIMITS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_entries_by_position() {
        let plus = classify("+", Form::Infix);
        assert_eq!(plus.class, TexClass::Bin);
        assert_eq!((plus.lspace, plus.rspace), (4, 4));
        assert_eq!(classify("+", Form::Prefix).rspace, 1);
        assert_eq!(classify("(", Form::Prefix).class, TexClass::Open);
        assert!(classify(")", Form::Postfix).props.contains(OpProps::FENCE));
    }

    #[test]
    fn classification_is_pure() {
        for text in ["=", "∑", "(", "→", "∫", "lim"] {
            for form in [Form::Prefix, Form::Infix, Form::Postfix] {
                assert_eq!(classify(text, form), classify(text, form), "{text} 的查询结果不稳定");
            }
        }
    }

    #[test]
    fn large_operators_move_limits() {
        let sum = classify("∑", Form::Prefix);
        assert_eq!(sum.class, TexClass::Op);
        assert!(sum.props.contains(OpProps::MOVABLELIMITS));
        let int = classify("∫", Form::Prefix);
        assert!(!int.props.contains(OpProps::MOVABLELIMITS));
        assert!(int.props.contains(OpProps::INTEGRAL));
        assert_eq!(lookup_any("∑").map(|e| e.class), Some(TexClass::Op));
    }

    #[test]
    fn range_fallback_and_default() {
        // ⨝ 不在显式表中，落在 2A00–2AFF 的二元运算区段
        let join = classify("⨝", Form::Infix);
        assert_eq!(join.class, TexClass::Bin);
        assert_eq!((join.lspace, join.rspace), (3, 3));
        assert_eq!(range_of('α').map(|r| r.kind), Some(NodeKind::Mi));
        assert_eq!(range_of('中').and_then(|r| r.variant), Some("normal"));
        // 私用区不在任何区段内
        assert_eq!(classify("\u{E000}", Form::Infix), DEFAULT);
        assert!(range_of('\u{E000}').is_none());
    }

    #[test]
    fn resolve_falls_back_across_positions() {
        assert_eq!(resolve("∑", Form::Infix).class, TexClass::Op);
        assert_eq!(resolve(")", Form::Infix).class, TexClass::Close);
        assert_eq!(resolve("-", Form::Prefix).class, TexClass::Bin);
    }

    #[test]
    fn prop_names() {
        assert_eq!(OPEN.props.names(), vec!["fence", "stretchy", "symmetric"]);
    }
}
