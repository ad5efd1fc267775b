use criterion::{black_box, criterion_group, criterion_main, Criterion}; // 引入 Criterion 基准测试工具
use formula_tree::{compile, compile_batch, Options};

/// 针对核心编译函数的性能基准，涵盖简单公式、复杂公式与宏展开
fn compile_formula_benchmark(c: &mut Criterion) {
    let simple = "E=mc^2";
    let complex = r"P_{mediaBidPrice} = \min\left(\max\left(P_{channelSettlePrice} \times \left(1 - \alpha \cdot \frac{P_{channelSettlePrice} - P_{midPrice}}{P_{channelSettlePrice}+P_{midPrice}}\right), \min\left(P_{mediaBidFloor} 0.01, \max(P_{channelSettlePrice}, P_{mediaBidFloor})\right)\right), P_{channelSettlePrice}\right)";
    let macros = r"\newcommand{\norm}[1]{\left\|#1\right\|}\def\pair#1,#2.{(#1,#2)} \norm{\pair a,b.} + \begin{pmatrix} 1 & 0 \\ 0 & 1 \end{pmatrix}";

    c.bench_function("compile_simple_formula", |b| {
        b.iter(|| {
            let result = compile(black_box(simple));
            assert!(result.is_ok(), "简单公式编译应当成功");
        });
    });

    c.bench_function("compile_complex_formula", |b| {
        b.iter(|| {
            let result = compile(black_box(complex));
            assert!(result.is_ok(), "复杂公式编译应当成功");
        });
    });

    c.bench_function("compile_with_macros", |b| {
        b.iter(|| {
            let result = compile(black_box(macros));
            assert!(result.is_ok(), "宏展开公式编译应当成功");
        });
    });

    let batch: Vec<String> = (0..64).map(|i| format!("x_{{{i}}} + {complex}")).collect();
    let options = Options::default();
    c.bench_function("compile_batch_64", |b| {
        b.iter(|| {
            let results = compile_batch(black_box(&batch), &options);
            assert_eq!(results.len(), batch.len());
        });
    });
}

criterion_group!(benches, compile_formula_benchmark);
criterion_main!(benches);
