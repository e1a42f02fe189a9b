//! Phonetic encoders.
//!
//! An encoder maps a token to one or more codes; tokens sharing a code land
//! in the same similarity bucket. Only ASCII letters take part in encoding,
//! everything else is ignored.

mod double_metaphone;

use serde::{Deserialize, Serialize};

/// Supported phonetic encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhoneticEncoder {
    /// American Soundex, one four-character code.
    Soundex,
    /// Single-key Metaphone.
    Metaphone,
    /// Double Metaphone. A token is registered under both its primary and
    /// its alternate code when they differ.
    DoubleMetaphone,
}

impl PhoneticEncoder {
    /// Encode a token. Returns no codes for text without letters.
    pub fn encode(&self, text: &str) -> Vec<String> {
        let letters: Vec<char> = text
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        if letters.is_empty() {
            return Vec::new();
        }

        match self {
            PhoneticEncoder::Soundex => vec![soundex(&letters)],
            PhoneticEncoder::Metaphone => non_empty(metaphone(&letters)),
            PhoneticEncoder::DoubleMetaphone => {
                let (primary, alternate) = double_metaphone::encode(&letters);
                let mut codes = non_empty(primary);
                if !alternate.is_empty() && !codes.contains(&alternate) {
                    codes.push(alternate);
                }
                codes
            }
        }
    }
}

fn non_empty(code: String) -> Vec<String> {
    if code.is_empty() { Vec::new() } else { vec![code] }
}

fn soundex_digit(c: char) -> Option<char> {
    match c {
        'B' | 'F' | 'P' | 'V' => Some('1'),
        'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => Some('2'),
        'D' | 'T' => Some('3'),
        'L' => Some('4'),
        'M' | 'N' => Some('5'),
        'R' => Some('6'),
        _ => None,
    }
}

fn soundex(letters: &[char]) -> String {
    let mut code = String::with_capacity(4);
    code.push(letters[0]);
    let mut previous = soundex_digit(letters[0]);

    for &c in &letters[1..] {
        if code.len() == 4 {
            break;
        }
        match c {
            // H and W do not separate equal codes.
            'H' | 'W' => continue,
            'A' | 'E' | 'I' | 'O' | 'U' | 'Y' => previous = None,
            _ => {
                let digit = soundex_digit(c);
                if digit.is_some() && digit != previous {
                    code.extend(digit);
                }
                previous = digit;
            }
        }
    }

    while code.len() < 4 {
        code.push('0');
    }
    code
}

fn is_vowel(c: Option<char>) -> bool {
    matches!(c, Some('A' | 'E' | 'I' | 'O' | 'U'))
}

fn is_front_vowel(c: Option<char>) -> bool {
    matches!(c, Some('E' | 'I' | 'Y'))
}

fn metaphone(letters: &[char]) -> String {
    let n = letters.len();
    let at = |i: usize| letters.get(i).copied();
    let mut out = String::new();

    // Initial letter exceptions.
    let mut start = 0;
    match (at(0), at(1)) {
        (Some('A'), Some('E')) => {
            out.push('E');
            start = 2;
        }
        (Some('G' | 'K' | 'P'), Some('N')) | (Some('W'), Some('R')) => start = 1,
        (Some('X'), _) => {
            out.push('S');
            start = 1;
        }
        (Some('W'), Some('H')) => {
            out.push('W');
            start = 2;
        }
        _ => {}
    }

    let mut i = start;
    while i < n {
        let c = letters[i];
        let prev = if i > 0 { at(i - 1) } else { None };
        let next = at(i + 1);

        if prev == Some(c) && c != 'C' {
            i += 1;
            continue;
        }

        match c {
            'A' | 'E' | 'I' | 'O' | 'U' => {
                if i == 0 {
                    out.push(c);
                }
            }
            'B' => {
                if !(prev == Some('M') && i + 1 == n) {
                    out.push('B');
                }
            }
            'C' => {
                if next == Some('I') && at(i + 2) == Some('A') {
                    out.push('X');
                } else if next == Some('H') {
                    out.push('X');
                    i += 2;
                    continue;
                } else if is_front_vowel(next) {
                    if prev != Some('S') {
                        out.push('S');
                    }
                } else {
                    out.push('K');
                }
            }
            'D' => {
                if next == Some('G') && is_front_vowel(at(i + 2)) {
                    out.push('J');
                    i += 2;
                    continue;
                }
                out.push('T');
            }
            'G' => {
                if next == Some('H') && !(i + 2 == n || is_vowel(at(i + 2))) {
                    // silent GH before a consonant
                } else if next == Some('N')
                    && (i + 2 == n || (at(i + 2) == Some('E') && at(i + 3) == Some('D')))
                {
                    // silent in GN / GNED endings
                } else if is_front_vowel(next) && prev != Some('G') {
                    out.push('J');
                } else {
                    out.push('K');
                }
            }
            'H' => {
                let after_modifier = matches!(prev, Some('C' | 'S' | 'P' | 'T' | 'G'));
                if !after_modifier && is_vowel(next) {
                    out.push('H');
                }
            }
            'K' => {
                if prev != Some('C') {
                    out.push('K');
                }
            }
            'P' => {
                if next == Some('H') {
                    out.push('F');
                } else {
                    out.push('P');
                }
            }
            'Q' => out.push('K'),
            'S' => {
                if next == Some('C') && at(i + 2) == Some('H') {
                    out.push_str("SK");
                    i += 3;
                    continue;
                } else if next == Some('H') {
                    out.push('X');
                } else if next == Some('I') && matches!(at(i + 2), Some('O' | 'A')) {
                    out.push('X');
                } else {
                    out.push('S');
                }
            }
            'T' => {
                if next == Some('I') && matches!(at(i + 2), Some('O' | 'A')) {
                    out.push('X');
                } else if next == Some('H') {
                    out.push('0');
                } else if !(next == Some('C') && at(i + 2) == Some('H')) {
                    out.push('T');
                }
            }
            'V' => out.push('F'),
            'W' | 'Y' => {
                if is_vowel(next) {
                    out.push(c);
                }
            }
            'X' => out.push_str("KS"),
            'Z' => out.push('S'),
            _ => out.push(c),
        }
        i += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soundex_classic_codes() {
        let soundex = |s: &str| PhoneticEncoder::Soundex.encode(s).remove(0);
        assert_eq!(soundex("Robert"), "R163");
        assert_eq!(soundex("Rupert"), "R163");
        assert_eq!(soundex("Tymczak"), "T522");
        assert_eq!(soundex("Ashcraft"), "A261");
        assert_eq!(soundex("Pfister"), "P236");
        assert_eq!(soundex("Lee"), "L000");
    }

    #[test]
    fn test_smith_and_smyth_share_codes() {
        for encoder in [
            PhoneticEncoder::Soundex,
            PhoneticEncoder::Metaphone,
            PhoneticEncoder::DoubleMetaphone,
        ] {
            assert_eq!(encoder.encode("smith"), encoder.encode("smyth"), "{encoder:?}");
        }
    }

    #[test]
    fn test_metaphone_rules() {
        let metaphone = |s: &str| PhoneticEncoder::Metaphone.encode(s).remove(0);
        assert_eq!(metaphone("smith"), "SM0");
        assert_eq!(metaphone("knight"), "NT");
        assert_eq!(metaphone("phone"), "FN");
        assert_eq!(metaphone("thumb"), "0M");
        assert_eq!(metaphone("xavier"), "SFR");
        assert_eq!(metaphone("church"), "XRX");
        assert_eq!(metaphone("school"), "SKL");
    }

    #[test]
    fn test_double_metaphone_codes() {
        let encode = |s: &str| PhoneticEncoder::DoubleMetaphone.encode(s);
        assert_eq!(encode("smith"), vec!["SM0".to_string(), "XMT".to_string()]);
        assert_eq!(encode("Schmidt"), vec!["XMT".to_string(), "SMT".to_string()]);
        // identical primary and alternate collapse to one code
        assert_eq!(encode("thomas"), vec!["TMS".to_string()]);
        // smith and schmidt meet on the alternate code
        assert!(encode("schmidt").contains(&encode("smith")[1]));
    }

    #[test]
    fn test_no_letters_no_codes() {
        assert!(PhoneticEncoder::Soundex.encode("1234").is_empty());
        assert!(PhoneticEncoder::Metaphone.encode("").is_empty());
    }
}
