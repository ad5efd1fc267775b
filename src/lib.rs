#[global_allocator]
static ALLOC: jemallocator::Jemalloc = jemallocator::Jemalloc;

/// 模块入口：对外提供编译接口，并串联各子模块

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe}; // 引入 panic 捕获工具，防止单条公式拖垮进程

use rayon::prelude::*; // 引入 rayon 并行迭代器，批量编译会用到

mod ast; // 语法树定义模块
mod config; // 编译配置管理
mod error; // 错误类型模块，统一描述错误信息
mod ffi; // FFI 模块，提供 C 可调用的接口
mod macros; // 宏与环境定义表
pub mod opdict; // 运算符分类表
mod parse; // 解析模块，把 TeX 字符串解析成节点树
mod serialize; // 输出模块，把节点树转成标记文本
mod tags; // 公式编号与交叉引用

pub use crate::ast::{Node, NodeKind, TexClass, Value}; // 暴露节点树模型
pub use crate::config::{Options, TagMode, TagSide};
pub use crate::error::TexError; // 暴露错误类型，方便调用方处理
pub use crate::ffi::{compile_tex_to_mathml, free_mathml}; // 暴露 C 接口，调用方负责释放内存
pub use crate::macros::{MacroDef, MacroTable};
pub use crate::serialize::to_mathml;
pub use crate::tags::Label;

use crate::parse::ParseContext;
use crate::tags::TagRegistry;

/// 一条公式的编译结果
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    /// `math` 根节点
    pub root: Node,
    /// 根节点序列化后的标记文本
    pub mathml: String,
}

impl Compiled {
    fn new(root: Node) -> Self {
        let mathml = to_mathml(&root);
        Self { root, mathml }
    }
}

/// 文档级的编译上下文：多条公式共享宏表和编号表
#[derive(Debug, Clone)]
pub struct Document {
    options: Options,
    macros: MacroTable,
    tags: TagRegistry,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl Document {
    pub fn new(options: Options) -> Self {
        Self::with_macros(options, MacroTable::new())
    }

    /// 沿用上一份文档留下的宏定义
    pub fn with_macros(options: Options, macros: MacroTable) -> Self {
        let tags = TagRegistry::new(&options);
        Self {
            options,
            macros,
            tags,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// 编译单条公式；公式内部的前向引用会立即重编译一次
    ///
    /// 引用后续调用才定义的标签时结果保持 `???`。跨公式的引用请用 `compile_all`
    /// 一次提交整篇文档。
    pub fn compile(&mut self, tex: &str) -> Result<Compiled, TexError> {
        let (result, redo) = self.compile_pass(tex, None);
        match redo {
            Some(counter) => self.compile_pass(tex, Some(counter)).0,
            None => result,
        }
    }

    /// 按顺序编译整篇文档的公式
    ///
    /// 第一遍编译全部公式；引用了未知标签的公式在第一遍结束后、拿着完整的标签表
    /// 重编译一次，之后不再继续。
    pub fn compile_all(&mut self, texts: &[&str]) -> Vec<Result<Compiled, TexError>> {
        let mut results = Vec::with_capacity(texts.len());
        let mut pending = Vec::new();
        for (index, tex) in texts.iter().enumerate() {
            let (result, redo) = self.compile_pass(tex, None);
            if let Some(counter) = redo {
                pending.push((index, counter));
            }
            results.push(result);
        }
        if !pending.is_empty() {
            tracing::debug!(count = pending.len(), "重编译含前向引用的公式");
        }
        for (index, counter) in pending {
            results[index] = self.compile_pass(texts[index], Some(counter)).0;
        }
        results
    }

    /// 到目前为止登记的全部标签
    pub fn labels(&self) -> &BTreeMap<String, Label> {
        self.tags.labels()
    }

    /// 最后分配的自动编号，下一条编号公式从它加一开始
    pub fn equation_count(&self) -> usize {
        self.tags.counter()
    }

    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    /// 取出宏表，交给下一份文档继续使用
    pub fn into_macros(self) -> MacroTable {
        self.macros
    }

    /// 编译一遍；第一遍遇到未知引用时返回该公式的起始编号
    fn compile_pass(
        &mut self,
        tex: &str,
        recompile: Option<usize>,
    ) -> (Result<Compiled, TexError>, Option<usize>) {
        self.tags.start_equation(recompile);
        let options = &self.options;
        let macros = &mut self.macros;
        let tags = &mut self.tags;
        let guarded_result = catch_unwind(AssertUnwindSafe(|| {
            // 用 catch_unwind 捕获潜在 panic
            let mut ctx = ParseContext::new(options, macros, tags);
            parse::parse(tex, &mut ctx)
        }));

        match guarded_result {
            Ok(Ok(root)) => {
                let redo = self.tags.finish_equation();
                (Ok(Compiled::new(root)), redo)
            }
            Ok(Err(err)) => {
                tracing::debug!(key = err.key(), "公式编译失败");
                self.tags.abort_equation();
                (Err(err), None)
            }
            Err(_) => {
                self.tags.abort_equation();
                (Err(TexError::UnexpectedPanic), None) // 捕获 panic，转换成安全的错误提示
            }
        }
    }
}

/// 对外提供的核心函数：输入 TeX，按默认配置编译
pub fn compile(tex: &str) -> Result<Compiled, TexError> {
    Document::default().compile(tex)
}

/// 批量编译接口：互相独立的公式交给 rayon 并行处理，每条公式各用一份上下文
pub fn compile_batch(texts: &[String], options: &Options) -> Vec<Result<Compiled, TexError>> {
    texts
        .par_iter() // 开启 rayon 并行迭代
        .map(|tex| Document::new(options.clone()).compile(tex)) // 每条公式独立编译
        .collect() // 把结果收集成 Vec
}

#[cfg(test)] // 仅在测试环境编译下面的代码
mod tests {
    use super::*; // 把父模块公开项目引入作用域
    use pretty_assertions::assert_eq;

    fn mathml(result: &Result<Compiled, TexError>) -> &str {
        result.as_ref().map(|c| c.mathml.as_str()).unwrap_or("")
    }

    #[test]
    fn simple_formula_should_compile() {
        let out = compile("x^2").expect("编译失败");
        assert!(out.mathml.starts_with("<math display=\"block\">"));
        assert!(out.mathml.contains("<msup><mi>x</mi><mn>2</mn></msup>"));
        assert_eq!(out.root.kind, NodeKind::Math);
    }

    #[test]
    fn compilation_is_deterministic() {
        let tex = "\\frac{a}{b} + \\sqrt[3]{x} \\left( \\sum_{i=1}^n i \\right)";
        assert_eq!(compile(tex), compile(tex));
    }

    #[test]
    fn errors_are_reported() {
        assert_eq!(compile("x^1^2").map(|c| c.mathml), Err(TexError::DoubleExponent));
        assert_eq!(
            compile("\\begin{matrix}a\\end{pmatrix}").map(|c| c.mathml),
            Err(TexError::EnvBadEnd("matrix".into(), "pmatrix".into()))
        );
        assert_eq!(
            compile("\\def\\x{\\x}\\x").map(|c| c.mathml),
            Err(TexError::MaxMacroSubstitutionsExceeded)
        );
    }

    #[test]
    fn definitions_persist_within_a_document() {
        let mut doc = Document::new(Options::inline());
        doc.compile("\\newcommand{\\R}{\\mathbb{R}}").expect("定义失败");
        let used = doc.compile("\\R").expect("使用失败");
        let direct = Document::new(Options::inline())
            .compile("\\mathbb{R}")
            .expect("直接编译失败");
        assert_eq!(used.mathml, direct.mathml);
        assert!(doc.macros().contains("R"));

        let mut fresh = Document::new(Options::inline());
        assert_eq!(
            fresh.compile("\\R").map(|c| c.mathml),
            Err(TexError::UndefinedControlSequence("\\R".into()))
        );
    }

    #[test]
    fn macro_table_can_be_handed_on() {
        let mut doc = Document::new(Options::inline());
        doc.compile("\\def\\b{x}\\let\\c\\b").expect("定义失败");
        let mut next = Document::with_macros(Options::inline(), doc.into_macros());
        next.compile("\\def\\b{y}").expect("重定义失败");
        let out = next.compile("\\c").expect("别名展开失败");
        assert_eq!(out.mathml, "<math><mi>x</mi></math>");
    }

    #[test]
    fn forward_references_resolve_on_second_pass() {
        let mut doc = Document::default();
        let results = doc.compile_all(&[
            "\\eqref{e}",
            "\\begin{equation}x\\label{e}\\end{equation}",
        ]);
        assert!(mathml(&results[0]).contains("href=\"#eqn%3Ae\""));
        assert!(mathml(&results[0]).contains("<mtext>(1)</mtext>"));
        assert!(mathml(&results[1]).contains("<mlabeledtr>"));
        assert_eq!(doc.labels().get("e").map(|l| l.tag.as_str()), Some("1"));
    }

    #[test]
    fn unresolved_references_stay_placeholders() {
        let mut doc = Document::default();
        let results = doc.compile_all(&["\\ref{nope}"]);
        assert!(mathml(&results[0]).contains("<mtext>???</mtext>"));
        assert!(doc.labels().is_empty());
    }

    #[test]
    fn failed_equation_does_not_consume_numbers() {
        let mut doc = Document::default();
        let results = doc.compile_all(&[
            "\\begin{equation}x\\end{equation}",
            "\\begin{equation}x^1^2\\end{equation}",
            "\\begin{equation}y\\end{equation}",
        ]);
        assert!(mathml(&results[0]).contains("<mtext>(1)</mtext>"));
        assert_eq!(
            results[1].as_ref().map(|_| ()),
            Err(&TexError::DoubleExponent)
        );
        assert!(mathml(&results[2]).contains("<mtext>(2)</mtext>"));
        assert_eq!(doc.equation_count(), 2);
    }

    #[test]
    fn deeply_nested_input_returns_an_error() {
        let deep = format!("{}x{}", "{".repeat(5000), "}".repeat(5000));
        assert_eq!(
            compile(&deep).map(|c| c.mathml),
            Err(TexError::MaxNestingExceeded)
        );
        let outputs = compile_batch(&[deep, "x".to_string()], &Options::inline());
        assert_eq!(
            outputs[0].as_ref().map(|_| ()),
            Err(&TexError::MaxNestingExceeded)
        );
        assert!(outputs[1].is_ok());
    }

    #[test]
    fn batch_compile_should_work() {
        let inputs = vec![
            "E=mc^2".to_string(),
            "\\frac{1}{2}".to_string(),
            "\\def\\a{1}\\a".to_string(),
            "\\a".to_string(),
        ];
        let outputs = compile_batch(&inputs, &Options::inline()); // 调用批量编译
        assert_eq!(outputs.len(), 4, "输出数量要和输入一致"); // 校验数量
        assert!(outputs[..3].iter().all(|item| item.is_ok()));
        assert_eq!(
            outputs[3].as_ref().map(|_| ()),
            Err(&TexError::UndefinedControlSequence("\\a".into())),
            "批量编译的公式之间不共享宏表"
        );
    }
}
