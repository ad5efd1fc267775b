use std::path::PathBuf;
use std::{env, fs};

use sha2::{Digest, Sha256};

const DEFAULT_FORMULA: &str = r"\newcommand{\abs}[1]{\left|#1\right|} \begin{aligned} \abs{x+y} &\le \abs{x} + \abs{y} \\ e^{i\pi} + 1 &= 0 \end{aligned} \tag{T}";

fn main() {
    let formula = env::var("FORMULA")
        .ok()
        .or_else(|| env::args().nth(1))
        .unwrap_or_else(|| DEFAULT_FORMULA.to_string());

    let mut hasher = Sha256::new();
    hasher.update(formula.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    let output_dir = PathBuf::from("output_mml");
    let mut output_path = output_dir.clone();
    output_path.push(format!("{}.mml", hash));

    if output_path.exists() {
        println!("文件已存在，无需重复生成: {:?}", output_path);
        return;
    }

    let start = std::time::Instant::now();
    match formula_tree::compile(&formula) {
        Ok(compiled) => {
            let elapsed = start.elapsed();
            if let Err(err) = fs::create_dir_all(&output_dir)
                .and_then(|_| fs::write(&output_path, compiled.mathml))
            {
                eprintln!("写入 MathML 失败: {}", err);
            } else {
                println!("已生成 MathML: {:?}，耗时: {:.3?}", output_path, elapsed);
            }
        }
        Err(err) => eprintln!("编译失败 [{}]: {}", err.key(), err),
    }
}
