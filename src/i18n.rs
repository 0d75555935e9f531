// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持英文（默认）、俄文和中文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 支持的诊断语言
pub const SUPPORTED_LOCALES: [&str; 3] = ["en", "ru", "zh-CN"];

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"en" / "ru" / "zh-CN"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 是否为受支持的语言
pub fn is_supported(locale: &str) -> bool {
    SUPPORTED_LOCALES.contains(&locale)
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use docflow_import::i18n::t_with_args;
/// let msg = t_with_args("diagnostics.register_not_found", &[("id", "7")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    substitute(rust_i18n::t!(key).to_string(), args)
}

/// 按指定语言翻译消息（不修改全局语言）
///
/// 导入诊断使用此函数，语言取自 ImportSettings
pub fn t_in_locale(locale: &str, key: &str, args: &[(&str, &str)]) -> String {
    substitute(rust_i18n::t!(key, locale = locale).to_string(), args)
}

fn substitute(mut result: String, args: &[(&str, &str)]) -> String {
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}
