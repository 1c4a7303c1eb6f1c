use std::mem;

use crate::{data_type::DataType, value::Value};

/// Splits one record of a table data file into its fields.
///
/// Fields are separated by spaces. A field may be wrapped in `'` or `"` so
/// that it can contain spaces; the closing quote must match the opening one.
/// Runs of spaces outside quotes never produce empty fields, so right-padded
/// fixed-width records tokenize the same as compact ones.
pub struct RecordTokenizer {
    /// The record stored as a vector of characters for easy iteration.
    input: Vec<char>,
    /// The current position in the character vector.
    position: usize,
}

impl RecordTokenizer {
    /// Creates a tokenizer for one line, ignoring its line terminator.
    pub fn new(line: &str) -> Self {
        Self {
            input: line.trim_end_matches(['\n', '\r']).chars().collect(),
            position: 0,
        }
    }

    /// Returns the raw fields of the record, quote delimiters included.
    ///
    /// # Example
    /// ```
    /// # use flatquery::tokenizer::RecordTokenizer;
    /// let fields = RecordTokenizer::new("1 'Forest Gump' 1994\n").fields();
    /// assert_eq!(fields, vec!["1", "'Forest Gump'", "1994"]);
    /// ```
    pub fn fields(&mut self) -> Vec<String> {
        let mut fields = Vec::new();
        let mut current = String::new();
        let mut quote: Option<char> = None;

        while !self.is_at_end() {
            let ch = self.current_char();
            match (quote, ch) {
                (None, '\'' | '"') => quote = Some(ch),
                (Some(open), c) if c == open => quote = None,
                (None, ' ') => {
                    if !current.is_empty() {
                        fields.push(mem::take(&mut current));
                    }
                    self.advance();
                    continue;
                }
                _ => {}
            }
            current.push(ch);
            self.advance();
        }

        // end of line closes the last field
        if !current.is_empty() {
            fields.push(current);
        }
        fields
    }

    /// Tokenizes `line` and converts each field according to the declared
    /// column types.
    ///
    /// The result always has exactly `types.len()` values: extra fields (record
    /// padding or terminators) are ignored and missing fields are [Value::Null].
    pub fn parse_record(line: &str, types: &[DataType]) -> Vec<Value> {
        let mut fields = Self::new(line).fields().into_iter();
        types
            .iter()
            .map(|data_type| match fields.next() {
                Some(raw) => convert(&raw, *data_type),
                None => Value::Null,
            })
            .collect()
    }

    // --- Navigation Helpers ---

    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }
}

/// Converts one raw field to a value of the given type using the lenient
/// conversions below.
pub fn convert(raw: &str, data_type: DataType) -> Value {
    match data_type {
        DataType::Int => Value::Int(parse_int(raw)),
        DataType::Real => Value::Real(parse_real(raw)),
        DataType::Text => Value::Text(strip_quotes(raw).into()),
    }
}

/// Removes one pair of matching `'` or `"` delimiters around a string field.
/// A field that is not wrapped in matching quotes is returned unchanged.
pub fn strip_quotes(raw: &str) -> &str {
    let mut chars = raw.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first @ ('\'' | '"')), Some(last)) if first == last => &raw[1..raw.len() - 1],
        _ => raw,
    }
}

/// Lenient integer conversion with C `atoi` semantics.
///
/// Leading whitespace and one sign are accepted, then digits are read up to
/// the first non-digit. Input without any leading digit yields `0`; values
/// beyond the `i64` range saturate.
pub fn parse_int(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut n: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        let d = i64::from(b - b'0');
        n = if negative {
            n.saturating_mul(10).saturating_sub(d)
        } else {
            n.saturating_mul(10).saturating_add(d)
        };
    }
    n
}

/// Lenient real conversion with C `atof` semantics.
///
/// The longest prefix of the form `[ws][sign]digits[.digits][(e|E)[sign]digits]`
/// is converted; input without any mantissa digit yields `0.0`.
pub fn parse_real(raw: &str) -> f64 {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        end += 1 + frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return 0.0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    s[..end].parse().unwrap_or(0.0)
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
