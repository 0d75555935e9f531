// ==========================================
// 文档流转导入工具 - 字段解析器
// ==========================================
// 职责: 原始字符串 → 类型化值（日期 / 数值）
// 日期两段式解析:
//   1. 按区域设置的日历日期文本
//   2. 回退: 区域数值 → OLE Automation 日期序列号
// 空白输入返回 None（未设置），不视为错误
// ==========================================

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::ops::BitOr;
use thiserror::Error;

/// OLE Automation 日期有效范围（开区间）
const OA_DATE_MIN: f64 = -657_435.0;
const OA_DATE_MAX: f64 = 2_958_466.0;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// 字段解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldParseError {
    #[error("日期格式错误: '{value}'")]
    InvalidDate { value: String },

    #[error("数值格式错误: '{value}'")]
    InvalidNumber { value: String },

    #[error("OLE 日期序列号超出范围: {value}")]
    OaDateOutOfRange { value: f64 },

    #[error("未知区域设置: '{0}'")]
    UnknownCulture(String),
}

// ==========================================
// NumberStyles - 数值解析允许的元素
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberStyles(u32);

impl NumberStyles {
    pub const NONE: NumberStyles = NumberStyles(0);
    pub const ALLOW_LEADING_WHITE: NumberStyles = NumberStyles(1);
    pub const ALLOW_TRAILING_WHITE: NumberStyles = NumberStyles(1 << 1);
    pub const ALLOW_LEADING_SIGN: NumberStyles = NumberStyles(1 << 2);
    pub const ALLOW_TRAILING_SIGN: NumberStyles = NumberStyles(1 << 3);
    pub const ALLOW_DECIMAL_POINT: NumberStyles = NumberStyles(1 << 5);
    pub const ALLOW_THOUSANDS: NumberStyles = NumberStyles(1 << 6);
    pub const ALLOW_EXPONENT: NumberStyles = NumberStyles(1 << 7);
    pub const ALLOW_CURRENCY_SYMBOL: NumberStyles = NumberStyles(1 << 8);

    pub const INTEGER: NumberStyles = NumberStyles(
        Self::ALLOW_LEADING_WHITE.0 | Self::ALLOW_TRAILING_WHITE.0 | Self::ALLOW_LEADING_SIGN.0,
    );
    pub const NUMBER: NumberStyles = NumberStyles(
        Self::INTEGER.0
            | Self::ALLOW_TRAILING_SIGN.0
            | Self::ALLOW_DECIMAL_POINT.0
            | Self::ALLOW_THOUSANDS.0,
    );
    pub const FLOAT: NumberStyles = NumberStyles(
        Self::INTEGER.0 | Self::ALLOW_DECIMAL_POINT.0 | Self::ALLOW_EXPONENT.0,
    );

    pub fn contains(self, other: NumberStyles) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for NumberStyles {
    type Output = NumberStyles;

    fn bitor(self, rhs: NumberStyles) -> NumberStyles {
        NumberStyles(self.0 | rhs.0)
    }
}

impl Default for NumberStyles {
    fn default() -> Self {
        NumberStyles::NUMBER | NumberStyles::ALLOW_CURRENCY_SYMBOL
    }
}

// ==========================================
// Culture - 区域设置
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    Dmy,
    Mdy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Culture {
    name: &'static str,
    date_order: DateOrder,
    decimal_separator: char,
    group_separators: &'static [char],
    currency_symbol: &'static str,
    english_month_names: bool,
}

impl Culture {
    pub const EN_GB: Culture = Culture {
        name: "en-GB",
        date_order: DateOrder::Dmy,
        decimal_separator: '.',
        group_separators: &[','],
        currency_symbol: "£",
        english_month_names: true,
    };

    pub const EN_US: Culture = Culture {
        name: "en-US",
        date_order: DateOrder::Mdy,
        decimal_separator: '.',
        group_separators: &[','],
        currency_symbol: "$",
        english_month_names: true,
    };

    pub const RU_RU: Culture = Culture {
        name: "ru-RU",
        date_order: DateOrder::Dmy,
        decimal_separator: ',',
        group_separators: &[' ', '\u{a0}', '\u{202f}'],
        currency_symbol: "₽",
        english_month_names: false,
    };

    pub const INVARIANT: Culture = Culture {
        name: "",
        date_order: DateOrder::Mdy,
        decimal_separator: '.',
        group_separators: &[','],
        currency_symbol: "¤",
        english_month_names: true,
    };

    /// 按名称获取区域设置（大小写不敏感，空串为 invariant）
    pub fn from_name(name: &str) -> Result<Culture, FieldParseError> {
        match name.trim().to_lowercase().as_str() {
            "en-gb" => Ok(Culture::EN_GB),
            "en-us" => Ok(Culture::EN_US),
            "ru-ru" => Ok(Culture::RU_RU),
            "" | "invariant" => Ok(Culture::INVARIANT),
            _ => Err(FieldParseError::UnknownCulture(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn date_order(&self) -> DateOrder {
        self.date_order
    }
}

impl Default for Culture {
    fn default() -> Self {
        Culture::EN_GB
    }
}

// ==========================================
// 日期解析
// ==========================================

/// 解析日期时间
///
/// # 参数
/// - value: 原始文本
/// - style: 回退数值解析所用的 NumberStyles
/// - culture: 区域设置
///
/// # 返回
/// - Ok(None): 空白输入
/// - Ok(Some): 文本日期或 OLE 序列号解析成功
/// - Err: 两种方式均无法解析
pub fn parse_date(
    value: &str,
    style: NumberStyles,
    culture: &Culture,
) -> Result<Option<NaiveDateTime>, FieldParseError> {
    let text = value.trim();
    if text.is_empty() {
        return Ok(None);
    }

    if let Some(parsed) = parse_calendar_text(text, culture) {
        return Ok(Some(parsed));
    }

    match parse_number(text, style, culture) {
        Ok(Some(serial)) => from_oa_date(serial).map(Some),
        _ => Err(FieldParseError::InvalidDate {
            value: text.to_string(),
        }),
    }
}

/// 解析日期（丢弃时间部分）
pub fn parse_date_only(
    value: &str,
    style: NumberStyles,
    culture: &Culture,
) -> Result<Option<NaiveDate>, FieldParseError> {
    Ok(parse_date(value, style, culture)?.map(|dt| dt.date()))
}

/// OLE Automation 日期序列号 → 日期时间
///
/// 基准日 1899-12-30；小数部分为当日时间，负值的小数部分同样按正向时间计
pub fn from_oa_date(value: f64) -> Result<NaiveDateTime, FieldParseError> {
    if !(value > OA_DATE_MIN && value < OA_DATE_MAX) {
        return Err(FieldParseError::OaDateOutOfRange { value });
    }

    let rounding = if value >= 0.0 { 0.5 } else { -0.5 };
    let mut millis = (value * MILLIS_PER_DAY as f64 + rounding) as i64;
    if millis < 0 {
        millis -= (millis % MILLIS_PER_DAY) * 2;
    }

    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|epoch| epoch.checked_add_signed(Duration::milliseconds(millis)))
        .ok_or(FieldParseError::OaDateOutOfRange { value })
}

fn parse_calendar_text(text: &str, culture: &Culture) -> Option<NaiveDateTime> {
    if let Some(parsed) = parse_numeric_calendar(text, culture) {
        return Some(parsed);
    }
    if culture.english_month_names {
        return parse_month_name_calendar(text);
    }
    None
}

// dd/MM/yyyy, MM/dd/yyyy, yyyy-MM-dd 以及可选时间
fn parse_numeric_calendar(text: &str, culture: &Culture) -> Option<NaiveDateTime> {
    let normalized = if text.len() > 10 && text.as_bytes().get(10) == Some(&b'T') {
        text.replacen('T', " ", 1)
    } else {
        text.to_string()
    };

    let mut parts = normalized.splitn(2, char::is_whitespace);
    let date_part = parts.next()?;
    let time_part = parts.next().map(str::trim).filter(|s| !s.is_empty());

    let tokens: Vec<&str> = date_part.split(['/', '.', '-']).collect();
    if tokens.len() != 3
        || tokens
            .iter()
            .any(|t| t.is_empty() || !t.chars().all(|c| c.is_ascii_digit()))
    {
        return None;
    }

    let (year_token, month_token, day_token) = if tokens[0].len() == 4 {
        (tokens[0], tokens[1], tokens[2])
    } else {
        match culture.date_order {
            DateOrder::Dmy => (tokens[2], tokens[1], tokens[0]),
            DateOrder::Mdy => (tokens[2], tokens[0], tokens[1]),
        }
    };

    let year = parse_year(year_token)?;
    let month: u32 = month_token.parse().ok()?;
    let day: u32 = day_token.parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let time = match time_part {
        Some(t) => parse_time(t)?,
        None => NaiveTime::MIN,
    };
    Some(date.and_time(time))
}

// 两位年份窗口上限为 2049: 00-49 → 20xx，50-99 → 19xx
fn parse_year(token: &str) -> Option<i32> {
    let year: i32 = token.parse().ok()?;
    match token.len() {
        4 => Some(year),
        1 | 2 if year <= 49 => Some(2000 + year),
        1 | 2 => Some(1900 + year),
        _ => None,
    }
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    const TIME_FORMATS: [&str; 5] = ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
}

// 1 Feb 2020 / February 1, 2020 / 01-Feb-2020
fn parse_month_name_calendar(text: &str) -> Option<NaiveDateTime> {
    const DATE_FORMATS: [&str; 4] = ["%d %B %Y", "%B %d %Y", "%B %d, %Y", "%d-%b-%Y"];
    // 01-Feb-20: 两位年份按同一窗口展开（chrono 的 %y 窗口不同）
    let expanded = match text.rsplit_once('-') {
        Some((head, year)) if year.len() <= 2 => Some(format!("{}-{}", head, parse_year(year)?)),
        _ => None,
    };
    let text = expanded.as_deref().unwrap_or(text);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ==========================================
// 数值解析
// ==========================================

/// 按区域设置解析浮点数
///
/// # 返回
/// - Ok(None): 空白输入
/// - Ok(Some): 解析成功
/// - Err: 含有 style 不允许的元素
pub fn parse_number(
    value: &str,
    style: NumberStyles,
    culture: &Culture,
) -> Result<Option<f64>, FieldParseError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    let invalid = || FieldParseError::InvalidNumber {
        value: value.to_string(),
    };

    let mut text = value;
    if style.contains(NumberStyles::ALLOW_LEADING_WHITE) {
        text = text.trim_start();
    }
    if style.contains(NumberStyles::ALLOW_TRAILING_WHITE) {
        text = text.trim_end();
    }

    // 符号可位于货币符号之前或之后
    let mut sign: Option<bool> = None;
    if style.contains(NumberStyles::ALLOW_LEADING_SIGN) {
        (sign, text) = split_leading_sign(text);
    }
    if style.contains(NumberStyles::ALLOW_CURRENCY_SYMBOL) {
        text = strip_currency(text, culture.currency_symbol);
    }
    if sign.is_none() && style.contains(NumberStyles::ALLOW_LEADING_SIGN) {
        (sign, text) = split_leading_sign(text);
    }
    if sign.is_none() && style.contains(NumberStyles::ALLOW_TRAILING_SIGN) {
        if let Some(rest) = text.strip_suffix('-') {
            sign = Some(true);
            text = rest.trim_end();
        } else if let Some(rest) = text.strip_suffix('+') {
            sign = Some(false);
            text = rest.trim_end();
        }
    }
    let negative = sign.unwrap_or(false);

    let body = normalize_digits(text, style, culture).ok_or_else(invalid)?;
    let number: f64 = body.parse().map_err(|_| invalid())?;
    Ok(Some(if negative { -number } else { number }))
}

// 返回 (Some(是否为负), 剩余文本)
fn split_leading_sign(text: &str) -> (Option<bool>, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (Some(true), rest)
    } else if let Some(rest) = text.strip_prefix('+') {
        (Some(false), rest)
    } else {
        (None, text)
    }
}

fn strip_currency<'a>(text: &'a str, symbol: &str) -> &'a str {
    if let Some(rest) = text.strip_prefix(symbol) {
        rest.trim_start()
    } else if let Some(rest) = text.strip_suffix(symbol) {
        rest.trim_end()
    } else {
        text
    }
}

// 去除千分位并将小数点统一为 '.'
fn normalize_digits(text: &str, style: NumberStyles, culture: &Culture) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut digits = 0usize;
    let mut seen_decimal = false;
    let mut seen_exponent = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            out.push(c);
            digits += 1;
        } else if c == culture.decimal_separator
            && style.contains(NumberStyles::ALLOW_DECIMAL_POINT)
            && !seen_decimal
            && !seen_exponent
        {
            out.push('.');
            seen_decimal = true;
        } else if culture.group_separators.contains(&c)
            && style.contains(NumberStyles::ALLOW_THOUSANDS)
            && digits > 0
            && !seen_decimal
            && !seen_exponent
        {
            continue;
        } else if (c == 'e' || c == 'E')
            && style.contains(NumberStyles::ALLOW_EXPONENT)
            && digits > 0
            && !seen_exponent
        {
            out.push('e');
            seen_exponent = true;
            if let Some(&sign) = chars.peek() {
                if sign == '+' || sign == '-' {
                    out.push(sign);
                    chars.next();
                }
            }
        } else {
            return None;
        }
    }

    if digits == 0 || out.ends_with('e') || out.ends_with('-') || out.ends_with('+') {
        return None;
    }
    Some(out)
}
