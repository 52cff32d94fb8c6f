//! Thai text helpers used when filling document templates.
//!
//! Form input pasted from word processors and chat apps routinely carries
//! zero-width characters, bidi marks and decomposed vowels that render as
//! boxes or break line wrapping once they land in a `.docx`.

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

lazy_static! {
    /// Zero-width, soft hyphen, Mongolian vowel separator and bidi control characters
    static ref INVISIBLE: Regex = Regex::new(
        r"[\x{200B}-\x{200F}\x{2060}\x{FEFF}\x{00AD}\x{180E}\x{202A}-\x{202E}\x{2066}-\x{2069}]"
    )
    .unwrap();

    /// C0/C1 controls other than tab and newline
    static ref CONTROL: Regex =
        Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F-\x9F]").unwrap();

    static ref EXOTIC_SPACE: Regex =
        Regex::new(r"[\x{00A0}\x{2000}-\x{200A}\x{202F}\x{205F}\x{3000}]").unwrap();

    /// NIKHAHIT, optional tone mark, SARA AA
    static ref DECOMPOSED_SARA_AM: Regex =
        Regex::new(r"\x{0E4D}([\x{0E48}-\x{0E4B}]?)\x{0E32}").unwrap();

    static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t]+").unwrap();

    static ref EXCESS_NEWLINES: Regex = Regex::new(r"\n{3,}").unwrap();
}

const THAI_MONTHS: [&str; 12] = [
    "มกราคม",
    "กุมภาพันธ์",
    "มีนาคม",
    "เมษายน",
    "พฤษภาคม",
    "มิถุนายน",
    "กรกฎาคม",
    "สิงหาคม",
    "กันยายน",
    "ตุลาคม",
    "พฤศจิกายน",
    "ธันวาคม",
];

const DIGIT_WORDS: [&str; 10] = [
    "ศูนย์", "หนึ่ง", "สอง", "สาม", "สี่", "ห้า", "หก", "เจ็ด", "แปด", "เก้า",
];

const PLACE_WORDS: [&str; 6] = ["", "สิบ", "ร้อย", "พัน", "หมื่น", "แสน"];

const BUDDHIST_ERA_OFFSET: i32 = 543;

fn is_thai_combining_mark(c: char) -> bool {
    matches!(c, '\u{0E31}' | '\u{0E34}'..='\u{0E3A}' | '\u{0E47}'..='\u{0E4E}')
}

/// Drop a combining mark that repeats the one right before it
fn dedupe_combining_marks(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev: Option<char> = None;
    for c in input.chars() {
        if is_thai_combining_mark(c) && prev == Some(c) {
            continue;
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// Normalize free-form Thai text for insertion into a document.
pub fn clean_thai_text(input: &str) -> String {
    let text = input.replace("\r\n", "\n").replace('\r', "\n");
    let text = INVISIBLE.replace_all(&text, "");
    let text = CONTROL.replace_all(&text, "");
    let text = EXOTIC_SPACE.replace_all(&text, " ");
    let text = DECOMPOSED_SARA_AM.replace_all(&text, "${1}\u{0E33}");
    let text = dedupe_combining_marks(&text);
    let text = HORIZONTAL_SPACE.replace_all(&text, " ");

    let joined = text.split('\n').map(str::trim).collect::<Vec<_>>().join("\n");

    EXCESS_NEWLINES
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string()
}

/// Same as [`clean_thai_text`] but folds everything onto one line.
pub fn clean_single_line(input: &str) -> String {
    let cleaned = clean_thai_text(input).replace('\n', " ");
    HORIZONTAL_SPACE.replace_all(&cleaned, " ").into_owned()
}

pub fn to_thai_digits(input: &str) -> String {
    input
        .chars()
        .map(|c| match c.to_digit(10) {
            Some(d) if c.is_ascii_digit() => char::from_u32(0x0E50 + d).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// `18 ตุลาคม 2569` style date in the Buddhist era
pub fn thai_date(date: NaiveDate) -> String {
    format!(
        "{} {} {}",
        date.day(),
        THAI_MONTHS[date.month0() as usize],
        date.year() + BUDDHIST_ERA_OFFSET
    )
}

/// Parse user-entered money such as `1,250,000.50` or `15000 บาท`
pub fn parse_amount(input: &str) -> Option<Decimal> {
    let cleaned: String = clean_single_line(input)
        .replace("บาท", "")
        .chars()
        .filter(|c| !matches!(c, ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// `1234567.5` → `1,234,567.50`
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Words for a number below one million. `has_prefix` marks that a higher
/// group was already spoken, so a trailing one reads `เอ็ด`.
fn group_words(n: u64, has_prefix: bool) -> String {
    let digits: Vec<u64> = n.to_string().bytes().map(|b| (b - b'0') as u64).collect();
    let len = digits.len();
    let mut out = String::new();

    for (i, &d) in digits.iter().enumerate() {
        let place = len - i - 1;
        if d == 0 {
            continue;
        }
        match place {
            0 if d == 1 && (has_prefix || n >= 10) => out.push_str("เอ็ด"),
            0 => out.push_str(DIGIT_WORDS[d as usize]),
            1 if d == 1 => out.push_str("สิบ"),
            1 if d == 2 => out.push_str("ยี่สิบ"),
            _ => {
                out.push_str(DIGIT_WORDS[d as usize]);
                out.push_str(PLACE_WORDS[place]);
            }
        }
    }
    out
}

fn number_words(n: u64, has_prefix: bool) -> String {
    const MILLION: u64 = 1_000_000;
    if n < MILLION {
        return group_words(n, has_prefix);
    }
    let high = n / MILLION;
    let low = n % MILLION;
    let mut out = number_words(high, has_prefix);
    out.push_str("ล้าน");
    if low > 0 {
        out.push_str(&group_words(low, true));
    }
    out
}

/// Spell an amount in Thai baht, e.g. `หนึ่งพันสองร้อยบาทห้าสิบสตางค์`.
/// `None` when the baht part does not fit in a `u64`.
pub fn baht_text(amount: Decimal) -> Option<String> {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let abs = rounded.abs();
    let baht = abs.trunc();
    let satang = ((abs - baht) * Decimal::ONE_HUNDRED).trunc();

    let baht = baht.to_u64()?;
    let satang = satang.to_u64()?;

    if baht == 0 && satang == 0 {
        return Some("ศูนย์บาทถ้วน".to_string());
    }

    let mut out = String::new();
    if rounded.is_sign_negative() {
        out.push_str("ลบ");
    }
    if baht > 0 {
        out.push_str(&number_words(baht, false));
        out.push_str("บาท");
    }
    if satang == 0 {
        out.push_str("ถ้วน");
    } else {
        out.push_str(&number_words(satang, false));
        out.push_str("สตางค์");
    }
    Some(out)
}
