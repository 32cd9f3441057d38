//! Format specifications for f-strings, `format()` and `str.format`
//!
//! Supports `[[fill]align][sign][#][0][width][,|_][.precision][type]` with
//! the presentation types `s d n c x X o b e E f F g G %`.

use crate::interpreter::constants::{MAX_FORMAT_PRECISION, MAX_REPEAT_LEN};
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::repr::format_float;
use crate::interpreter::types::ExcKind;
use crate::memory::value::{Data, Value};

/// Parsed format specification
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FormatSpec {
    pub fill: char,
    pub align: Option<char>,
    pub sign: char,
    pub alternate: bool,
    pub width: usize,
    pub grouping: Option<char>,
    pub precision: Option<usize>,
    pub kind: Option<char>,
}

impl FormatSpec {
    pub(crate) fn parse(spec: &str) -> Option<FormatSpec> {
        let chars: Vec<char> = spec.chars().collect();
        let mut parsed = FormatSpec {
            fill: ' ',
            align: None,
            sign: '-',
            alternate: false,
            width: 0,
            grouping: None,
            precision: None,
            kind: None,
        };
        let is_align = |c: char| matches!(c, '<' | '>' | '^' | '=');
        let mut i = 0;

        if chars.len() >= 2 && is_align(chars[1]) {
            parsed.fill = chars[0];
            parsed.align = Some(chars[1]);
            i = 2;
        } else if chars.first().copied().is_some_and(is_align) {
            parsed.align = Some(chars[0]);
            i = 1;
        }
        if let Some(&sign @ ('+' | '-' | ' ')) = chars.get(i) {
            parsed.sign = sign;
            i += 1;
        }
        if chars.get(i) == Some(&'#') {
            parsed.alternate = true;
            i += 1;
        }
        if chars.get(i) == Some(&'0') {
            if parsed.align.is_none() {
                parsed.fill = '0';
                parsed.align = Some('=');
            }
            i += 1;
        }
        let width_start = i;
        while chars.get(i).is_some_and(char::is_ascii_digit) {
            i += 1;
        }
        if i > width_start {
            parsed.width = chars[width_start..i].iter().collect::<String>().parse().ok()?;
        }
        if let Some(&group @ (',' | '_')) = chars.get(i) {
            parsed.grouping = Some(group);
            i += 1;
        }
        if chars.get(i) == Some(&'.') {
            i += 1;
            let precision_start = i;
            while chars.get(i).is_some_and(char::is_ascii_digit) {
                i += 1;
            }
            if i == precision_start {
                return None;
            }
            parsed.precision = Some(chars[precision_start..i].iter().collect::<String>().parse().ok()?);
        }
        match chars.len() - i {
            0 => {}
            1 => parsed.kind = Some(chars[i]),
            _ => return None,
        }
        Some(parsed)
    }
}

impl Interpreter {
    /// `format(value, spec)`
    pub(crate) fn format_value(&mut self, value: &Value, spec: &str) -> Result<String, RuntimeError> {
        if spec.is_empty() {
            return self.to_display_string(value);
        }
        let Some(parsed) = FormatSpec::parse(spec) else {
            return Err(self.raise(ExcKind::ValueError, "Invalid format specifier"));
        };
        if parsed.width > MAX_REPEAT_LEN {
            return Err(self.raise(ExcKind::ValueError, "width too big"));
        }
        if parsed.precision.is_some_and(|p| p > MAX_FORMAT_PRECISION) {
            return Err(self.raise(ExcKind::ValueError, "precision too big"));
        }
        let unknown = |interp: &mut Interpreter, kind: char| {
            let message = format!(
                "Unknown format code '{}' for object of type '{}'",
                kind,
                value.type_name()
            );
            interp.raise(ExcKind::ValueError, message)
        };

        let body = match (value.data(), parsed.kind) {
            (Data::Int(_) | Data::Bool(_), None | Some('d' | 'n')) => {
                let n = value.as_int().unwrap_or(0);
                signed(n < 0, group_digits(&n.unsigned_abs().to_string(), parsed.grouping), &parsed)
            }
            (Data::Int(_) | Data::Bool(_), Some(kind @ ('x' | 'X' | 'o' | 'b' | 'c'))) => {
                let n = value.as_int().unwrap_or(0);
                let magnitude = n.unsigned_abs();
                let digits = match kind {
                    'x' => format!("{}{:x}", if parsed.alternate { "0x" } else { "" }, magnitude),
                    'X' => format!("{}{:X}", if parsed.alternate { "0X" } else { "" }, magnitude),
                    'o' => format!("{}{:o}", if parsed.alternate { "0o" } else { "" }, magnitude),
                    'b' => format!("{}{:b}", if parsed.alternate { "0b" } else { "" }, magnitude),
                    _ => match u32::try_from(n).ok().and_then(char::from_u32) {
                        Some(c) => c.to_string(),
                        None => {
                            return Err(self.raise(ExcKind::OverflowError, "%c arg not in range(0x110000)"))
                        }
                    },
                };
                signed(n < 0, digits, &parsed)
            }
            (Data::Int(_) | Data::Bool(_) | Data::Float(_), Some(kind @ ('e' | 'E' | 'f' | 'F' | 'g' | 'G' | '%')))
            | (Data::Float(_), Some(kind @ 'n')) => {
                let x = value.as_float().unwrap_or(0.0);
                let text = format_float_kind(x.abs(), kind, parsed.precision, parsed.alternate);
                let text = if x.is_finite() && matches!(kind, 'f' | 'F' | '%') {
                    group_float(&text, parsed.grouping)
                } else {
                    text
                };
                signed(x.is_sign_negative() && !x.is_nan(), text, &parsed)
            }
            (Data::Float(f), None) => {
                let text = match parsed.precision {
                    Some(_) => {
                        let general = format_float_kind(f.abs(), 'g', parsed.precision, parsed.alternate);
                        if general.chars().all(|c| c.is_ascii_digit()) {
                            format!("{}.0", general)
                        } else {
                            general
                        }
                    }
                    None => format_float(f.abs()),
                };
                signed(f.is_sign_negative() && !f.is_nan(), group_float(&text, parsed.grouping), &parsed)
            }
            (Data::Str(s), None | Some('s')) => {
                let mut text = s.clone();
                if let Some(precision) = parsed.precision {
                    text = text.chars().take(precision).collect();
                }
                text
            }
            (_, None) => {
                let text = self.to_display_string(value)?;
                return Ok(pad(&text, &parsed, '<'));
            }
            (_, Some(kind)) => return Err(unknown(self, kind)),
        };

        let default_align = if matches!(value.data(), Data::Str(_)) { '<' } else { '>' };
        Ok(pad(&body, &parsed, default_align))
    }

    /// `f"{value!r:spec}"` and friends
    pub(crate) fn format_field(
        &mut self,
        value: &Value,
        repr: bool,
        spec: Option<&str>,
    ) -> Result<String, RuntimeError> {
        if !repr {
            return match spec {
                Some(spec) => self.format_value(value, spec),
                None => self.to_display_string(value),
            };
        }
        let text = self.to_repr_string(value)?;
        match spec {
            Some(spec) => {
                let text = self.heap.str(text);
                self.format_value(&text, spec)
            }
            None => Ok(text),
        }
    }

    /// `template.format(*args, **kwargs)`
    pub(crate) fn str_format(
        &mut self,
        template: &str,
        args: &[Value],
        kwargs: &[(String, Value)],
    ) -> Result<String, RuntimeError> {
        let mut out = String::new();
        let mut chars = template.chars().peekable();
        let mut next_auto = 0;

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '}' => {
                    return Err(self.raise(
                        ExcKind::ValueError,
                        "Single '}' encountered in format string",
                    ))
                }
                '{' => {
                    let mut field = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        field.push(c);
                    }
                    if !closed {
                        return Err(self.raise(
                            ExcKind::ValueError,
                            "Single '{' encountered in format string",
                        ));
                    }
                    let (head, spec) = match field.split_once(':') {
                        Some((head, spec)) => (head, Some(spec)),
                        None => (field.as_str(), None),
                    };
                    let (name, repr) = match head.split_once('!') {
                        Some((name, "r")) => (name, true),
                        Some((name, "s")) => (name, false),
                        Some(_) => {
                            return Err(self.raise(
                                ExcKind::ValueError,
                                "Unknown conversion specifier",
                            ))
                        }
                        None => (head, false),
                    };
                    let value = if name.is_empty() {
                        let value = args.get(next_auto).cloned();
                        next_auto += 1;
                        value.ok_or_else(|| {
                            let message = format!(
                                "Replacement index {} out of range for positional args tuple",
                                next_auto - 1
                            );
                            self.raise(ExcKind::IndexError, message)
                        })?
                    } else if let Ok(index) = name.parse::<usize>() {
                        args.get(index).cloned().ok_or_else(|| {
                            let message = format!(
                                "Replacement index {} out of range for positional args tuple",
                                index
                            );
                            self.raise(ExcKind::IndexError, message)
                        })?
                    } else {
                        let found = kwargs.iter().find(|(key, _)| key == name).map(|(_, v)| v.clone());
                        match found {
                            Some(value) => value,
                            None => {
                                let key = self.heap.str(name);
                                return Err(self.raise_with(ExcKind::KeyError, vec![key]));
                            }
                        }
                    };
                    out.push_str(&self.format_field(&value, repr, spec)?);
                }
                other => out.push(other),
            }
        }
        Ok(out)
    }
}

fn signed(negative: bool, body: String, spec: &FormatSpec) -> String {
    let sign = match (negative, spec.sign) {
        (true, _) => "-",
        (false, '+') => "+",
        (false, ' ') => " ",
        _ => "",
    };
    format!("{}{}", sign, body)
}

/// Insert `separator` between groups of three digits
fn group_digits(digits: &str, separator: Option<char>) -> String {
    let Some(separator) = separator else {
        return digits.to_string();
    };
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(c);
    }
    grouped
}

fn group_float(text: &str, separator: Option<char>) -> String {
    let split = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
    let (integer, rest) = text.split_at(split);
    format!("{}{}", group_digits(integer, separator), rest)
}

/// Render a non-negative float with one of the float presentation types
pub(crate) fn format_float_kind(x: f64, kind: char, precision: Option<usize>, alternate: bool) -> String {
    if x.is_nan() {
        return if kind.is_ascii_uppercase() { "NAN" } else { "nan" }.to_string();
    }
    if x.is_infinite() {
        return if kind.is_ascii_uppercase() { "INF" } else { "inf" }.to_string();
    }
    match kind {
        'f' | 'F' => format!("{:.*}", precision.unwrap_or(6), x),
        '%' => format!("{:.*}%", precision.unwrap_or(6), x * 100.0),
        'e' | 'E' => {
            let text = scientific(x, precision.unwrap_or(6));
            if kind == 'E' {
                text.to_uppercase()
            } else {
                text
            }
        }
        _ => {
            let precision = precision.unwrap_or(6).max(1);
            let exponent = scientific_exponent(x, precision - 1);
            let text = if (-4..precision as i32).contains(&exponent) {
                let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
                format!("{:.*}", decimals, x)
            } else {
                scientific(x, precision - 1)
            };
            let text = if alternate { text } else { strip_trailing_zeros(&text) };
            if kind == 'G' {
                text.to_uppercase()
            } else {
                text
            }
        }
    }
}

/// `1.500000e+03` style
fn scientific(x: f64, digits: usize) -> String {
    let rust = format!("{:.*e}", digits, x);
    let (mantissa, exponent) = rust.split_once('e').unwrap_or((&rust, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    format!(
        "{}e{}{:02}",
        mantissa,
        if exponent < 0 { '-' } else { '+' },
        exponent.abs()
    )
}

fn scientific_exponent(x: f64, digits: usize) -> i32 {
    let rust = format!("{:.*e}", digits, x);
    rust.split_once('e')
        .and_then(|(_, exponent)| exponent.parse().ok())
        .unwrap_or(0)
}

fn strip_trailing_zeros(text: &str) -> String {
    let (number, exponent) = match text.find('e') {
        Some(index) => text.split_at(index),
        None => (text, ""),
    };
    let number = if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    };
    format!("{}{}", number, exponent)
}

fn pad(body: &str, spec: &FormatSpec, default_align: char) -> String {
    let len = body.chars().count();
    if len >= spec.width {
        return body.to_string();
    }
    let padding = spec.width - len;
    let fill = |n: usize| spec.fill.to_string().repeat(n);
    match spec.align.unwrap_or(default_align) {
        '<' => format!("{}{}", body, fill(padding)),
        '^' => format!("{}{}{}", fill(padding / 2), body, fill(padding - padding / 2)),
        '=' => {
            let sign_len = body.starts_with(['-', '+', ' ']) as usize;
            let (sign, digits) = body.split_at(sign_len);
            format!("{}{}{}", sign, fill(padding), digits)
        }
        _ => format!("{}{}", fill(padding), body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(interpreter: &mut Interpreter, value: Value, spec: &str) -> String {
        interpreter.format_value(&value, spec).unwrap()
    }

    #[test]
    fn test_parse_spec() {
        let spec = FormatSpec::parse("*^+#010,.3f").unwrap();
        assert_eq!(spec.fill, '*');
        assert_eq!(spec.align, Some('^'));
        assert_eq!(spec.sign, '+');
        assert!(spec.alternate);
        assert_eq!(spec.width, 10);
        assert_eq!(spec.grouping, Some(','));
        assert_eq!(spec.precision, Some(3));
        assert_eq!(spec.kind, Some('f'));
        assert!(FormatSpec::parse(".f").is_none());
        assert!(FormatSpec::parse("dd").is_none());
    }

    #[test]
    fn test_float_specs() {
        let mut interpreter = Interpreter::new();
        let pi = interpreter.heap.float(3.14159);
        assert_eq!(format(&mut interpreter, pi.clone(), ".2f"), "3.14");
        assert_eq!(format(&mut interpreter, pi.clone(), "8.3f"), "   3.142");
        assert_eq!(format(&mut interpreter, pi.clone(), "e"), "3.141590e+00");
        assert_eq!(format(&mut interpreter, pi, ".3"), "3.14");
        let big = interpreter.heap.float(1234567.891);
        assert_eq!(format(&mut interpreter, big.clone(), ",.2f"), "1,234,567.89");
        assert_eq!(format(&mut interpreter, big, "g"), "1.23457e+06");
        let share = interpreter.heap.float(0.256);
        assert_eq!(format(&mut interpreter, share, ".1%"), "25.6%");
    }

    #[test]
    fn test_int_and_str_specs() {
        let mut interpreter = Interpreter::new();
        let n = interpreter.heap.int(-42);
        assert_eq!(format(&mut interpreter, n.clone(), "05d"), "-0042");
        assert_eq!(format(&mut interpreter, n, "<6"), "-42   ");
        let big = interpreter.heap.int(1_000_000);
        assert_eq!(format(&mut interpreter, big, ","), "1,000,000");
        let byte = interpreter.heap.int(255);
        assert_eq!(format(&mut interpreter, byte, "#x"), "0xff");
        let word = interpreter.heap.str("ab");
        assert_eq!(format(&mut interpreter, word.clone(), ">4"), "  ab");
        assert_eq!(format(&mut interpreter, word, "-^6"), "--ab--");
        let flag = interpreter.heap.bool(true);
        assert_eq!(format(&mut interpreter, flag.clone(), ""), "True");
        assert_eq!(format(&mut interpreter, flag, ">3"), "  1");
    }

    #[test]
    fn test_unknown_code() {
        let mut interpreter = Interpreter::new();
        let text = interpreter.heap.str("x");
        let err = interpreter.format_value(&text, "d").unwrap_err();
        assert_eq!(
            err.to_string(),
            "ValueError: Unknown format code 'd' for object of type 'str'"
        );
    }

    #[test]
    fn test_oversized_width_and_precision() {
        let mut interpreter = Interpreter::new();
        let n = interpreter.heap.int(12);
        let err = interpreter.format_value(&n, "99999999999d").unwrap_err();
        assert_eq!(err.to_string(), "ValueError: width too big");
        let err = interpreter.format_value(&n, ">9999999999").unwrap_err();
        assert_eq!(err.to_string(), "ValueError: width too big");
        let x = interpreter.heap.float(1.5);
        let err = interpreter.format_value(&x, ".70000f").unwrap_err();
        assert_eq!(err.to_string(), "ValueError: precision too big");
        let err = interpreter.format_value(&x, ".99999999999999999999f").unwrap_err();
        assert_eq!(err.to_string(), "ValueError: Invalid format specifier");
    }

    #[test]
    fn test_str_format() {
        let mut interpreter = Interpreter::new();
        let one = interpreter.heap.int(1);
        let pi = interpreter.heap.float(3.14159);
        let name = interpreter.heap.str("bob");
        let text = interpreter
            .str_format(
                "{0} and {1:.2f} {{literal}} {who!r}",
                &[one, pi],
                &[("who".to_string(), name)],
            )
            .unwrap();
        assert_eq!(text, "1 and 3.14 {literal} 'bob'");
    }
}
