//! 符号表：希腊字母、直立符号，以及关系符、二元运算符、箭头和大型运算符

use phf::phf_map;

use crate::ast::{Node, NodeKind, ParseResult, TexClass};
use crate::opdict;

use super::super::Parser;
use super::{Command, OpStyle};

/// 默认斜体的标识符
static IDENTIFIERS: phf::Map<&'static str, &'static str> = phf_map! {
    "alpha" => "\u{3B1}",
    "beta" => "\u{3B2}",
    "gamma" => "\u{3B3}",
    "delta" => "\u{3B4}",
    "epsilon" => "\u{3F5}",
    "zeta" => "\u{3B6}",
    "eta" => "\u{3B7}",
    "theta" => "\u{3B8}",
    "iota" => "\u{3B9}",
    "kappa" => "\u{3BA}",
    "lambda" => "\u{3BB}",
    "mu" => "\u{3BC}",
    "nu" => "\u{3BD}",
    "xi" => "\u{3BE}",
    "omicron" => "\u{3BF}",
    "pi" => "\u{3C0}",
    "rho" => "\u{3C1}",
    "sigma" => "\u{3C3}",
    "tau" => "\u{3C4}",
    "upsilon" => "\u{3C5}",
    "phi" => "\u{3D5}",
    "chi" => "\u{3C7}",
    "psi" => "\u{3C8}",
    "omega" => "\u{3C9}",
    "varepsilon" => "\u{3B5}",
    "vartheta" => "\u{3D1}",
    "varpi" => "\u{3D6}",
    "varrho" => "\u{3F1}",
    "varsigma" => "\u{3C2}",
    "varphi" => "\u{3C6}",
    "S" => "\u{A7}",
    "aleph" => "\u{2135}",
    "hbar" => "\u{210F}",
    "imath" => "\u{131}",
    "jmath" => "\u{237}",
    "ell" => "\u{2113}",
    "wp" => "\u{2118}",
};

/// 直立的标识符（大写希腊字母与杂项符号）
static UPRIGHT: phf::Map<&'static str, &'static str> = phf_map! {
    "Gamma" => "\u{393}",
    "Delta" => "\u{394}",
    "Theta" => "\u{398}",
    "Lambda" => "\u{39B}",
    "Xi" => "\u{39E}",
    "Pi" => "\u{3A0}",
    "Sigma" => "\u{3A3}",
    "Upsilon" => "\u{3A5}",
    "Phi" => "\u{3A6}",
    "Psi" => "\u{3A8}",
    "Omega" => "\u{3A9}",
    "#" => "#",
    "$" => "$",
    "%" => "%",
    "&" => "&",
    "_" => "_",
    "infty" => "\u{221E}",
    "partial" => "\u{2202}",
    "nabla" => "\u{2207}",
    "emptyset" => "\u{2205}",
    "varnothing" => "\u{2205}",
    "Re" => "\u{211C}",
    "Im" => "\u{2111}",
    "forall" => "\u{2200}",
    "exists" => "\u{2203}",
    "nexists" => "\u{2204}",
    "neg" => "\u{AC}",
    "lnot" => "\u{AC}",
    "top" => "\u{22A4}",
    "bot" => "\u{22A5}",
    "angle" => "\u{2220}",
    "triangle" => "\u{25B3}",
    "prime" => "\u{2032}",
    "flat" => "\u{266D}",
    "natural" => "\u{266E}",
    "sharp" => "\u{266F}",
    "clubsuit" => "\u{2663}",
    "diamondsuit" => "\u{2662}",
    "heartsuit" => "\u{2661}",
    "spadesuit" => "\u{2660}",
    "complement" => "\u{2201}",
    "square" => "\u{25A1}",
    "blacksquare" => "\u{25A0}",
    "mho" => "\u{2127}",
    "eth" => "\u{F0}",
    "beth" => "\u{2136}",
    "gimel" => "\u{2137}",
    "daleth" => "\u{2138}",
};

/// 运算符记号
static OPERATORS: phf::Map<&'static str, (&'static str, OpStyle)> = phf_map! {
    // 大型运算符
    "sum" => ("\u{2211}", OpStyle::Large),
    "prod" => ("\u{220F}", OpStyle::Large),
    "coprod" => ("\u{2210}", OpStyle::Large),
    "bigcap" => ("\u{22C2}", OpStyle::Large),
    "bigcup" => ("\u{22C3}", OpStyle::Large),
    "bigvee" => ("\u{22C1}", OpStyle::Large),
    "bigwedge" => ("\u{22C0}", OpStyle::Large),
    "bigodot" => ("\u{2A00}", OpStyle::Large),
    "bigoplus" => ("\u{2A01}", OpStyle::Large),
    "bigotimes" => ("\u{2A02}", OpStyle::Large),
    "biguplus" => ("\u{2A04}", OpStyle::Large),
    "bigsqcup" => ("\u{2A06}", OpStyle::Large),
    "int" => ("\u{222B}", OpStyle::Integral),
    "iint" => ("\u{222C}", OpStyle::Integral),
    "iiint" => ("\u{222D}", OpStyle::Integral),
    "oint" => ("\u{222E}", OpStyle::Integral),
    "intop" => ("\u{222B}", OpStyle::Large),
    "smallint" => ("\u{222B}", OpStyle::Plain),

    // 二元运算符
    "pm" => ("\u{B1}", OpStyle::Plain),
    "mp" => ("\u{2213}", OpStyle::Plain),
    "times" => ("\u{D7}", OpStyle::Plain),
    "div" => ("\u{F7}", OpStyle::Plain),
    "cdot" => ("\u{22C5}", OpStyle::Plain),
    "ast" => ("\u{2217}", OpStyle::Plain),
    "star" => ("\u{22C6}", OpStyle::Plain),
    "circ" => ("\u{2218}", OpStyle::Plain),
    "bullet" => ("\u{2219}", OpStyle::Plain),
    "oplus" => ("\u{2295}", OpStyle::Plain),
    "ominus" => ("\u{2296}", OpStyle::Plain),
    "otimes" => ("\u{2297}", OpStyle::Plain),
    "oslash" => ("\u{2298}", OpStyle::Plain),
    "odot" => ("\u{2299}", OpStyle::Plain),
    "cap" => ("\u{2229}", OpStyle::Plain),
    "cup" => ("\u{222A}", OpStyle::Plain),
    "sqcap" => ("\u{2293}", OpStyle::Plain),
    "sqcup" => ("\u{2294}", OpStyle::Plain),
    "vee" => ("\u{2228}", OpStyle::Plain),
    "lor" => ("\u{2228}", OpStyle::Plain),
    "wedge" => ("\u{2227}", OpStyle::Plain),
    "land" => ("\u{2227}", OpStyle::Plain),
    "setminus" => ("\u{2216}", OpStyle::Plain),
    "wr" => ("\u{2240}", OpStyle::Plain),
    "diamond" => ("\u{22C4}", OpStyle::Plain),
    "bigtriangleup" => ("\u{25B3}", OpStyle::Plain),
    "bigtriangledown" => ("\u{25BD}", OpStyle::Plain),
    "triangleleft" => ("\u{25C3}", OpStyle::Plain),
    "triangleright" => ("\u{25B9}", OpStyle::Plain),
    "uplus" => ("\u{228E}", OpStyle::Plain),
    "amalg" => ("\u{2A3F}", OpStyle::Plain),
    "dagger" => ("\u{2020}", OpStyle::Plain),
    "ddagger" => ("\u{2021}", OpStyle::Plain),
    "bigcirc" => ("\u{25EF}", OpStyle::Plain),
    "lhd" => ("\u{22B2}", OpStyle::Plain),
    "rhd" => ("\u{22B3}", OpStyle::Plain),
    "unlhd" => ("\u{22B4}", OpStyle::Plain),
    "unrhd" => ("\u{22B5}", OpStyle::Plain),

    // 关系符
    "leq" => ("\u{2264}", OpStyle::Plain),
    "le" => ("\u{2264}", OpStyle::Plain),
    "geq" => ("\u{2265}", OpStyle::Plain),
    "ge" => ("\u{2265}", OpStyle::Plain),
    "neq" => ("\u{2260}", OpStyle::Plain),
    "ne" => ("\u{2260}", OpStyle::Plain),
    "equiv" => ("\u{2261}", OpStyle::Plain),
    "approx" => ("\u{2248}", OpStyle::Plain),
    "sim" => ("\u{223C}", OpStyle::Plain),
    "simeq" => ("\u{2243}", OpStyle::Plain),
    "cong" => ("\u{2245}", OpStyle::Plain),
    "propto" => ("\u{221D}", OpStyle::Plain),
    "subset" => ("\u{2282}", OpStyle::Plain),
    "supset" => ("\u{2283}", OpStyle::Plain),
    "subseteq" => ("\u{2286}", OpStyle::Plain),
    "supseteq" => ("\u{2287}", OpStyle::Plain),
    "sqsubseteq" => ("\u{2291}", OpStyle::Plain),
    "sqsupseteq" => ("\u{2292}", OpStyle::Plain),
    "in" => ("\u{2208}", OpStyle::Plain),
    "ni" => ("\u{220B}", OpStyle::Plain),
    "owns" => ("\u{220B}", OpStyle::Plain),
    "notin" => ("\u{2209}", OpStyle::Plain),
    "ll" => ("\u{226A}", OpStyle::Plain),
    "gg" => ("\u{226B}", OpStyle::Plain),
    "prec" => ("\u{227A}", OpStyle::Plain),
    "succ" => ("\u{227B}", OpStyle::Plain),
    "preceq" => ("\u{2AAF}", OpStyle::Plain),
    "succeq" => ("\u{2AB0}", OpStyle::Plain),
    "perp" => ("\u{22A5}", OpStyle::Plain),
    "mid" => ("\u{2223}", OpStyle::Plain),
    "parallel" => ("\u{2225}", OpStyle::Plain),
    "models" => ("\u{22A8}", OpStyle::Plain),
    "vdash" => ("\u{22A2}", OpStyle::Plain),
    "dashv" => ("\u{22A3}", OpStyle::Plain),
    "asymp" => ("\u{224D}", OpStyle::Plain),
    "doteq" => ("\u{2250}", OpStyle::Plain),
    "bowtie" => ("\u{22C8}", OpStyle::Plain),
    "smile" => ("\u{2323}", OpStyle::Plain),
    "frown" => ("\u{2322}", OpStyle::Plain),

    // 箭头
    "to" => ("\u{2192}", OpStyle::Plain),
    "rightarrow" => ("\u{2192}", OpStyle::Plain),
    "leftarrow" => ("\u{2190}", OpStyle::Plain),
    "gets" => ("\u{2190}", OpStyle::Plain),
    "leftrightarrow" => ("\u{2194}", OpStyle::Plain),
    "Rightarrow" => ("\u{21D2}", OpStyle::Plain),
    "Leftarrow" => ("\u{21D0}", OpStyle::Plain),
    "Leftrightarrow" => ("\u{21D4}", OpStyle::Plain),
    "longrightarrow" => ("\u{27F6}", OpStyle::Plain),
    "longleftarrow" => ("\u{27F5}", OpStyle::Plain),
    "longleftrightarrow" => ("\u{27F7}", OpStyle::Plain),
    "Longrightarrow" => ("\u{27F9}", OpStyle::Plain),
    "Longleftarrow" => ("\u{27F8}", OpStyle::Plain),
    "Longleftrightarrow" => ("\u{27FA}", OpStyle::Plain),
    "mapsto" => ("\u{21A6}", OpStyle::Plain),
    "longmapsto" => ("\u{27FC}", OpStyle::Plain),
    "uparrow" => ("\u{2191}", OpStyle::Plain),
    "downarrow" => ("\u{2193}", OpStyle::Plain),
    "updownarrow" => ("\u{2195}", OpStyle::Plain),
    "Uparrow" => ("\u{21D1}", OpStyle::Plain),
    "Downarrow" => ("\u{21D3}", OpStyle::Plain),
    "Updownarrow" => ("\u{21D5}", OpStyle::Plain),
    "nearrow" => ("\u{2197}", OpStyle::Plain),
    "searrow" => ("\u{2198}", OpStyle::Plain),
    "swarrow" => ("\u{2199}", OpStyle::Plain),
    "nwarrow" => ("\u{2196}", OpStyle::Plain),
    "hookleftarrow" => ("\u{21A9}", OpStyle::Plain),
    "hookrightarrow" => ("\u{21AA}", OpStyle::Plain),
    "leftharpoonup" => ("\u{21BC}", OpStyle::Plain),
    "rightharpoonup" => ("\u{21C0}", OpStyle::Plain),
    "leftharpoondown" => ("\u{21BD}", OpStyle::Plain),
    "rightharpoondown" => ("\u{21C1}", OpStyle::Plain),
    "rightleftharpoons" => ("\u{21CC}", OpStyle::Plain),

    // 点与标点
    "ldots" => ("\u{2026}", OpStyle::Plain),
    "cdots" => ("\u{22EF}", OpStyle::Plain),
    "vdots" => ("\u{22EE}", OpStyle::Plain),
    "ddots" => ("\u{22F1}", OpStyle::Plain),
    "colon" => (":", OpStyle::Punct),
    "surd" => ("\u{221A}", OpStyle::Plain),
};

pub(super) fn lookup(name: &str) -> Option<Command> {
    IDENTIFIERS
        .get(name)
        .map(|text| Command::Identifier(text))
        .or_else(|| UPRIGHT.get(name).map(|text| Command::Upright(text)))
        .or_else(|| {
            OPERATORS
                .get(name)
                .map(|(text, style)| Command::Operator(text, *style))
        })
}

pub(super) fn identifier(parser: &mut Parser<'_, '_>, text: &str) -> ParseResult<()> {
    let mut mi = Node::token(NodeKind::Mi, text);
    if let Some(font) = parser.env().font {
        mi.set_attribute("mathvariant", font);
    }
    parser.push(mi)
}

pub(super) fn upright(parser: &mut Parser<'_, '_>, text: &str) -> ParseResult<()> {
    let mut mi = Node::token(NodeKind::Mi, text);
    let variant = parser.env().font.unwrap_or("normal");
    mi.set_attribute("mathvariant", variant);
    parser.push(mi)
}

pub(super) fn operator(parser: &mut Parser<'_, '_>, text: &str, style: OpStyle) -> ParseResult<()> {
    let mut mo = Node::token(NodeKind::Mo, text);
    if opdict::is_stretchy(text) {
        mo.set_attribute("stretchy", "false");
    }
    match style {
        OpStyle::Plain => {}
        OpStyle::Large => {
            mo.texclass = Some(TexClass::Op);
            mo.set_flag("movesupsub", true);
            mo.set_flag("movablelimits", true);
        }
        OpStyle::Integral => mo.texclass = Some(TexClass::Op),
        OpStyle::Punct => mo.texclass = Some(TexClass::Punct),
    }
    parser.push(mo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_do_not_overlap() {
        for name in IDENTIFIERS.keys() {
            assert!(!UPRIGHT.contains_key(name), "{name}");
            assert!(!OPERATORS.contains_key(name), "{name}");
        }
        for name in UPRIGHT.keys() {
            assert!(!OPERATORS.contains_key(name), "{name}");
        }
    }

    #[test]
    fn large_operators_move_limits() {
        assert_eq!(lookup("sum"), Some(Command::Operator("\u{2211}", OpStyle::Large)));
        assert_eq!(lookup("int"), Some(Command::Operator("\u{222B}", OpStyle::Integral)));
        assert_eq!(lookup("Gamma"), Some(Command::Upright("\u{393}")));
    }
}
