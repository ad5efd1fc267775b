//! FFI 模块：向 Go 等外部语言暴露 C 兼容接口

use std::ffi::{CStr, CString}; // 引入 C 字符串转换相关类型
use std::os::raw::c_char; // 引入 C 语言字符类型

use crate::compile; // 引入核心编译函数
use crate::error::TexError;

/// 将 Rust 字符串转换为 C 字符串指针
fn string_to_c_pointer(text: &str) -> *mut c_char {
    // 文本中含 \0 时退化为空串
    CString::new(text).unwrap_or_default().into_raw()
}

/// 编译失败时返回的 `merror` 片段，消息键放在 `data-error` 中
fn error_to_mathml(err: &TexError) -> String {
    let message = to_escaped(&err.to_string());
    format!(
        "<math><merror data-error=\"{}\"><mtext>{}</mtext></merror></math>",
        err.key(),
        message
    )
}

fn to_escaped(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// C 可调用的编译入口；返回的字符串必须交给 `free_mathml` 释放
#[no_mangle] // 确保函数名不被编译器修改
pub extern "C" fn compile_tex_to_mathml(tex: *const c_char) -> *mut c_char {
    if tex.is_null() {
        return string_to_c_pointer(&error_to_mathml(&TexError::MissingArgFor(
            "compile_tex_to_mathml".to_string(),
        )));
    }

    let input = unsafe { CStr::from_ptr(tex) }; // 将 C 指针视作 CStr
    let Ok(formula) = input.to_str() else {
        return string_to_c_pointer("<math><merror data-error=\"InvalidUtf8\"><mtext>Invalid UTF-8</mtext></merror></math>");
    };

    match compile(formula) {
        Ok(compiled) => string_to_c_pointer(&compiled.mathml),
        Err(err) => string_to_c_pointer(&error_to_mathml(&err)),
    }
}

/// 供外部语言在使用完字符串后释放内存
#[no_mangle] // 同样确保符号名稳定
pub extern "C" fn free_mathml(ptr: *mut c_char) {
    if ptr.is_null() {
        // 避免对空指针重复释放
        return;
    }
    unsafe {
        drop(CString::from_raw(ptr)); // 把指针重新包装成 CString，让 Rust 帮忙释放
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(tex: &str) -> String {
        let input = CString::new(tex).expect("测试输入不含 \\0");
        let ptr = compile_tex_to_mathml(input.as_ptr());
        let out = unsafe { CStr::from_ptr(ptr) }
            .to_str()
            .expect("输出一定是 UTF-8")
            .to_string();
        free_mathml(ptr);
        out
    }

    #[test]
    fn round_trip_through_c_strings() {
        let out = call("a+b");
        assert!(out.contains("<mi>a</mi><mo>+</mo><mi>b</mi>"));
    }

    #[test]
    fn errors_become_merror() {
        let out = call("x^1^2");
        assert!(out.starts_with("<math><merror data-error=\"DoubleExponent\">"));

        let ptr = compile_tex_to_mathml(std::ptr::null());
        assert!(!ptr.is_null());
        free_mathml(ptr);
        free_mathml(std::ptr::null_mut());
    }

    #[test]
    fn deep_input_does_not_abort() {
        let out = call(&format!("{}x{}", "{".repeat(5000), "}".repeat(5000)));
        assert!(out.contains("data-error=\"MaxNestingExceeded\""));
    }
}
