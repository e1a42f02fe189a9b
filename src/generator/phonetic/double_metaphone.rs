//! Lawrence Philips' Double Metaphone.
//!
//! Produces a primary and an alternate code of at most four characters.
//! Input is the uppercased ASCII letters of one token.

const MAX_CODE_LENGTH: usize = 4;

const SILENT_STARTS: [&str; 5] = ["GN", "KN", "PN", "WR", "PS"];
const L_R_N_M_B_H_F_V_W: [&str; 9] = ["L", "R", "N", "M", "B", "H", "F", "V", "W"];
const ES_EP_EB_EL_EY_IB_IL_IN_IE_EI_ER: [&str; 11] =
    ["ES", "EP", "EB", "EL", "EY", "IB", "IL", "IN", "IE", "EI", "ER"];
const L_T_K_S_N_M_B_Z: [&str; 8] = ["L", "T", "K", "S", "N", "M", "B", "Z"];

/// Primary and alternate code of `letters`.
pub(super) fn encode(letters: &[char]) -> (String, String) {
    let mut encoder = Encoder::new(letters);
    encoder.run();
    (encoder.primary, encoder.alternate)
}

struct Encoder<'a> {
    value: &'a [char],
    primary: String,
    alternate: String,
    slavo_germanic: bool,
}

impl<'a> Encoder<'a> {
    fn new(value: &'a [char]) -> Self {
        let text: String = value.iter().collect();
        Self {
            value,
            primary: String::with_capacity(MAX_CODE_LENGTH),
            alternate: String::with_capacity(MAX_CODE_LENGTH),
            slavo_germanic: text.contains('W')
                || text.contains('K')
                || text.contains("CZ")
                || text.contains("WITZ"),
        }
    }

    fn len(&self) -> isize {
        self.value.len() as isize
    }

    fn last(&self) -> isize {
        self.len() - 1
    }

    /// Character at `index`, `'\0'` outside the value.
    fn at(&self, index: isize) -> char {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.value.get(i))
            .copied()
            .unwrap_or('\0')
    }

    fn is_vowel_at(&self, index: isize) -> bool {
        matches!(self.at(index), 'A' | 'E' | 'I' | 'O' | 'U' | 'Y')
    }

    /// Whether the `length` characters at `start` equal one of `options`.
    fn contains(&self, start: isize, length: usize, options: &[&str]) -> bool {
        let Ok(start) = usize::try_from(start) else {
            return false;
        };
        let Some(window) = self.value.get(start..start + length) else {
            return false;
        };
        options
            .iter()
            .any(|option| option.chars().eq(window.iter().copied()))
    }

    fn is_complete(&self) -> bool {
        self.primary.len() >= MAX_CODE_LENGTH && self.alternate.len() >= MAX_CODE_LENGTH
    }

    fn add_primary(&mut self, code: &str) {
        let room = MAX_CODE_LENGTH.saturating_sub(self.primary.len());
        self.primary.extend(code.chars().take(room));
    }

    fn add_alternate(&mut self, code: &str) {
        let room = MAX_CODE_LENGTH.saturating_sub(self.alternate.len());
        self.alternate.extend(code.chars().take(room));
    }

    fn add(&mut self, primary: &str, alternate: &str) {
        self.add_primary(primary);
        self.add_alternate(alternate);
    }

    fn both(&mut self, code: &str) {
        self.add(code, code);
    }

    fn run(&mut self) {
        let mut index: isize = if SILENT_STARTS.iter().any(|s| self.contains(0, 2, &[s])) {
            1
        } else {
            0
        };

        while !self.is_complete() && index <= self.last() {
            index = match self.at(index) {
                'A' | 'E' | 'I' | 'O' | 'U' | 'Y' => {
                    if index == 0 {
                        self.both("A");
                    }
                    index + 1
                }
                'B' => {
                    self.both("P");
                    self.skip_double(index, 'B')
                }
                'C' => self.handle_c(index),
                'D' => self.handle_d(index),
                'F' => {
                    self.both("F");
                    self.skip_double(index, 'F')
                }
                'G' => self.handle_g(index),
                'H' => self.handle_h(index),
                'J' => self.handle_j(index),
                'K' => {
                    self.both("K");
                    self.skip_double(index, 'K')
                }
                'L' => self.handle_l(index),
                'M' => {
                    self.both("M");
                    if self.condition_m0(index) { index + 2 } else { index + 1 }
                }
                'N' => {
                    self.both("N");
                    self.skip_double(index, 'N')
                }
                'P' => self.handle_p(index),
                'Q' => {
                    self.both("K");
                    self.skip_double(index, 'Q')
                }
                'R' => self.handle_r(index),
                'S' => self.handle_s(index),
                'T' => self.handle_t(index),
                'V' => {
                    self.both("F");
                    self.skip_double(index, 'V')
                }
                'W' => self.handle_w(index),
                'X' => self.handle_x(index),
                'Z' => self.handle_z(index),
                _ => index + 1,
            };
        }
    }

    fn skip_double(&self, index: isize, c: char) -> isize {
        if self.at(index + 1) == c { index + 2 } else { index + 1 }
    }

    fn handle_c(&mut self, index: isize) -> isize {
        if self.condition_c0(index) {
            self.both("K");
            index + 2
        } else if index == 0 && self.contains(index, 6, &["CAESAR"]) {
            self.both("S");
            index + 2
        } else if self.contains(index, 2, &["CH"]) {
            self.handle_ch(index)
        } else if self.contains(index, 2, &["CZ"]) && !self.contains(index - 2, 4, &["WICZ"]) {
            self.add("S", "X");
            index + 2
        } else if self.contains(index + 1, 3, &["CIA"]) {
            self.both("X");
            index + 3
        } else if self.contains(index, 2, &["CC"]) && !(index == 1 && self.at(0) == 'M') {
            self.handle_cc(index)
        } else if self.contains(index, 2, &["CK", "CG", "CQ"]) {
            self.both("K");
            index + 2
        } else if self.contains(index, 2, &["CI", "CE", "CY"]) {
            if self.contains(index, 3, &["CIO", "CIE", "CIA"]) {
                self.add("S", "X");
            } else {
                self.both("S");
            }
            index + 2
        } else {
            self.both("K");
            if self.contains(index + 1, 1, &["C", "K", "Q"])
                && !self.contains(index + 1, 2, &["CE", "CI"])
            {
                index + 2
            } else {
                index + 1
            }
        }
    }

    fn handle_cc(&mut self, index: isize) -> isize {
        if self.contains(index + 2, 1, &["I", "E", "H"]) && !self.contains(index + 2, 2, &["HU"]) {
            if (index == 1 && self.at(index - 1) == 'A')
                || self.contains(index - 1, 5, &["UCCEE", "UCCES"])
            {
                self.both("KS");
            } else {
                self.both("X");
            }
            index + 3
        } else {
            self.both("K");
            index + 2
        }
    }

    fn handle_ch(&mut self, index: isize) -> isize {
        if index > 0 && self.contains(index, 4, &["CHAE"]) {
            self.add("K", "X");
        } else if self.condition_ch0(index) || self.condition_ch1(index) {
            self.both("K");
        } else if index > 0 {
            if self.contains(0, 2, &["MC"]) {
                self.both("K");
            } else {
                self.add("X", "K");
            }
        } else {
            self.both("X");
        }
        index + 2
    }

    fn handle_d(&mut self, index: isize) -> isize {
        if self.contains(index, 2, &["DG"]) {
            if self.contains(index + 2, 1, &["I", "E", "Y"]) {
                self.both("J");
                index + 3
            } else {
                self.both("TK");
                index + 2
            }
        } else if self.contains(index, 2, &["DT", "DD"]) {
            self.both("T");
            index + 2
        } else {
            self.both("T");
            index + 1
        }
    }

    fn handle_g(&mut self, index: isize) -> isize {
        let next = self.at(index + 1);
        if next == 'H' {
            self.handle_gh(index)
        } else if next == 'N' {
            if index == 1 && self.is_vowel_at(0) && !self.slavo_germanic {
                self.add("KN", "N");
            } else if !self.contains(index + 2, 2, &["EY"]) && !self.slavo_germanic {
                self.add("N", "KN");
            } else {
                self.both("KN");
            }
            index + 2
        } else if self.contains(index + 1, 2, &["LI"]) && !self.slavo_germanic {
            self.add("KL", "L");
            index + 2
        } else if index == 0
            && (next == 'Y' || self.contains(index + 1, 2, &ES_EP_EB_EL_EY_IB_IL_IN_IE_EI_ER))
        {
            self.add("K", "J");
            index + 2
        } else if (self.contains(index + 1, 2, &["ER"]) || next == 'Y')
            && !self.contains(0, 6, &["DANGER", "RANGER", "MANGER"])
            && !self.contains(index - 1, 1, &["E", "I"])
            && !self.contains(index - 1, 3, &["RGY", "OGY"])
        {
            self.add("K", "J");
            index + 2
        } else if self.contains(index + 1, 1, &["E", "I", "Y"])
            || self.contains(index - 1, 4, &["AGGI", "OGGI"])
        {
            if self.contains(0, 3, &["SCH"]) || self.contains(index + 1, 2, &["ET"]) {
                self.both("K");
            } else if self.contains(index + 1, 3, &["IER"]) {
                self.both("J");
            } else {
                self.add("J", "K");
            }
            index + 2
        } else if next == 'G' {
            self.both("K");
            index + 2
        } else {
            self.both("K");
            index + 1
        }
    }

    fn handle_gh(&mut self, index: isize) -> isize {
        if index > 0 && !self.is_vowel_at(index - 1) {
            self.both("K");
        } else if index == 0 {
            if self.at(index + 2) == 'I' {
                self.both("J");
            } else {
                self.both("K");
            }
        } else if (index > 1 && self.contains(index - 2, 1, &["B", "H", "D"]))
            || (index > 2 && self.contains(index - 3, 1, &["B", "H", "D"]))
            || (index > 3 && self.contains(index - 4, 1, &["B", "H"]))
        {
            // silent, as in "bough" or "night"
        } else if index > 2
            && self.at(index - 1) == 'U'
            && self.contains(index - 3, 1, &["C", "G", "L", "R", "T"])
        {
            self.both("F");
        } else if index > 0 && self.at(index - 1) != 'I' {
            self.both("K");
        }
        index + 2
    }

    fn handle_h(&mut self, index: isize) -> isize {
        if (index == 0 || self.is_vowel_at(index - 1)) && self.is_vowel_at(index + 1) {
            self.both("H");
            index + 2
        } else {
            index + 1
        }
    }

    fn handle_j(&mut self, index: isize) -> isize {
        if self.contains(index, 4, &["JOSE"]) {
            if index == 0 && self.len() == 4 {
                self.both("H");
            } else {
                self.add("J", "H");
            }
            return index + 1;
        }

        if index == 0 {
            self.add("J", "A");
        } else if self.is_vowel_at(index - 1)
            && !self.slavo_germanic
            && matches!(self.at(index + 1), 'A' | 'O')
        {
            self.add("J", "H");
        } else if index == self.last() {
            self.add_primary("J");
        } else if !self.contains(index + 1, 1, &L_T_K_S_N_M_B_Z)
            && !self.contains(index - 1, 1, &["S", "K", "L"])
        {
            self.both("J");
        }
        self.skip_double(index, 'J')
    }

    fn handle_l(&mut self, index: isize) -> isize {
        if self.at(index + 1) == 'L' {
            if self.condition_l0(index) {
                self.add_primary("L");
            } else {
                self.both("L");
            }
            index + 2
        } else {
            self.both("L");
            index + 1
        }
    }

    fn handle_p(&mut self, index: isize) -> isize {
        if self.at(index + 1) == 'H' {
            self.both("F");
            index + 2
        } else {
            self.both("P");
            if self.contains(index + 1, 1, &["P", "B"]) { index + 2 } else { index + 1 }
        }
    }

    fn handle_r(&mut self, index: isize) -> isize {
        if index == self.last()
            && !self.slavo_germanic
            && self.contains(index - 2, 2, &["IE"])
            && !self.contains(index - 4, 2, &["ME", "MA"])
        {
            self.add_alternate("R");
        } else {
            self.both("R");
        }
        self.skip_double(index, 'R')
    }

    fn handle_s(&mut self, index: isize) -> isize {
        if self.contains(index - 1, 3, &["ISL", "YSL"]) {
            index + 1
        } else if index == 0 && self.contains(index, 5, &["SUGAR"]) {
            self.add("X", "S");
            index + 1
        } else if self.contains(index, 2, &["SH"]) {
            if self.contains(index + 1, 4, &["HEIM", "HOEK", "HOLM", "HOLZ"]) {
                self.both("S");
            } else {
                self.both("X");
            }
            index + 2
        } else if self.contains(index, 3, &["SIO", "SIA"]) || self.contains(index, 4, &["SIAN"]) {
            if self.slavo_germanic {
                self.both("S");
            } else {
                self.add("S", "X");
            }
            index + 3
        } else if (index == 0 && self.contains(index + 1, 1, &["M", "N", "L", "W"]))
            || self.contains(index + 1, 1, &["Z"])
        {
            self.add("S", "X");
            if self.contains(index + 1, 1, &["Z"]) { index + 2 } else { index + 1 }
        } else if self.contains(index, 2, &["SC"]) {
            self.handle_sc(index)
        } else {
            if index == self.last() && self.contains(index - 2, 2, &["AI", "OI"]) {
                self.add_alternate("S");
            } else {
                self.both("S");
            }
            if self.contains(index + 1, 1, &["S", "Z"]) { index + 2 } else { index + 1 }
        }
    }

    fn handle_sc(&mut self, index: isize) -> isize {
        if self.at(index + 2) == 'H' {
            if self.contains(index + 3, 2, &["OO", "ER", "EN", "UY", "ED", "EM"]) {
                if self.contains(index + 3, 2, &["ER", "EN"]) {
                    self.add("X", "SK");
                } else {
                    self.both("SK");
                }
            } else if index == 0 && !self.is_vowel_at(3) && self.at(3) != 'W' {
                self.add("X", "S");
            } else {
                self.both("X");
            }
        } else if self.contains(index + 2, 1, &["I", "E", "Y"]) {
            self.both("S");
        } else {
            self.both("SK");
        }
        index + 3
    }

    fn handle_t(&mut self, index: isize) -> isize {
        if self.contains(index, 4, &["TION"]) || self.contains(index, 3, &["TIA", "TCH"]) {
            self.both("X");
            index + 3
        } else if self.contains(index, 2, &["TH"]) || self.contains(index, 3, &["TTH"]) {
            if self.contains(index + 2, 2, &["OM", "AM"]) || self.contains(0, 3, &["SCH"]) {
                self.both("T");
            } else {
                self.add("0", "T");
            }
            index + 2
        } else {
            self.both("T");
            if self.contains(index + 1, 1, &["T", "D"]) { index + 2 } else { index + 1 }
        }
    }

    fn handle_w(&mut self, index: isize) -> isize {
        if self.contains(index, 2, &["WR"]) {
            self.both("R");
            return index + 2;
        }

        if index == 0 && (self.is_vowel_at(index + 1) || self.contains(index, 2, &["WH"])) {
            if self.is_vowel_at(index + 1) {
                self.add("A", "F");
            } else {
                self.both("A");
            }
            index + 1
        } else if (index == self.last() && self.is_vowel_at(index - 1))
            || self.contains(index - 1, 5, &["EWSKI", "EWSKY", "OWSKI", "OWSKY"])
            || self.contains(0, 3, &["SCH"])
        {
            self.add_alternate("F");
            index + 1
        } else if self.contains(index, 4, &["WICZ", "WITZ"]) {
            self.add("TS", "FX");
            index + 4
        } else {
            index + 1
        }
    }

    fn handle_x(&mut self, index: isize) -> isize {
        if index == 0 {
            self.both("S");
            return index + 1;
        }
        let silent_french = index == self.last()
            && (self.contains(index - 3, 3, &["IAU", "EAU"])
                || self.contains(index - 2, 2, &["AU", "OU"]));
        if !silent_french {
            self.both("KS");
        }
        if self.contains(index + 1, 1, &["C", "X"]) { index + 2 } else { index + 1 }
    }

    fn handle_z(&mut self, index: isize) -> isize {
        if self.at(index + 1) == 'H' {
            self.both("J");
            return index + 2;
        }
        if self.contains(index + 1, 2, &["ZO", "ZI", "ZA"])
            || (self.slavo_germanic && index > 0 && self.at(index - 1) != 'T')
        {
            self.add("S", "TS");
        } else {
            self.both("S");
        }
        self.skip_double(index, 'Z')
    }

    fn condition_c0(&self, index: isize) -> bool {
        if self.contains(index, 4, &["CHIA"]) {
            return true;
        }
        if index <= 1 || self.is_vowel_at(index - 2) || !self.contains(index - 1, 3, &["ACH"]) {
            return false;
        }
        let c = self.at(index + 2);
        (c != 'I' && c != 'E') || self.contains(index - 2, 6, &["BACHER", "MACHER"])
    }

    fn condition_ch0(&self, index: isize) -> bool {
        index == 0
            && (self.contains(index + 1, 5, &["HARAC", "HARIS"])
                || self.contains(index + 1, 3, &["HOR", "HYM", "HIA", "HEM"]))
            && !self.contains(0, 5, &["CHORE"])
    }

    fn condition_ch1(&self, index: isize) -> bool {
        self.contains(0, 3, &["SCH"])
            || self.contains(index - 2, 6, &["ORCHES", "ARCHIT", "ORCHID"])
            || self.contains(index + 2, 1, &["T", "S"])
            || ((self.contains(index - 1, 1, &["A", "O", "U", "E"]) || index == 0)
                && (self.contains(index + 2, 1, &L_R_N_M_B_H_F_V_W) || index + 1 == self.last()))
    }

    fn condition_l0(&self, index: isize) -> bool {
        if index == self.len() - 3 && self.contains(index - 1, 4, &["ILLO", "ILLA", "ALLE"]) {
            return true;
        }
        (self.contains(self.len() - 2, 2, &["AS", "OS"]) || self.contains(self.last(), 1, &["A", "O"]))
            && self.contains(index - 1, 4, &["ALLE"])
    }

    fn condition_m0(&self, index: isize) -> bool {
        if self.at(index + 1) == 'M' {
            return true;
        }
        self.contains(index - 1, 3, &["UMB"])
            && (index + 1 == self.last() || self.contains(index + 2, 2, &["ER"]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(text: &str) -> (String, String) {
        let letters: Vec<char> = text.chars().map(|c| c.to_ascii_uppercase()).collect();
        encode(&letters)
    }

    fn pair(primary: &str, alternate: &str) -> (String, String) {
        (primary.to_string(), alternate.to_string())
    }

    #[test]
    fn test_known_codes() {
        assert_eq!(codes("smith"), pair("SM0", "XMT"));
        assert_eq!(codes("schmidt"), pair("XMT", "SMT"));
        assert_eq!(codes("thomas"), pair("TMS", "TMS"));
        assert_eq!(codes("tolkien"), pair("TLKN", "TLKN"));
        assert_eq!(codes("knight"), pair("NT", "NT"));
        assert_eq!(codes("jose"), pair("HS", "HS"));
        assert_eq!(codes("caesar"), pair("SSR", "SSR"));
        assert_eq!(codes("xavier"), pair("SF", "SFR"));
        assert_eq!(codes("gnome"), pair("NM", "NM"));
    }

    #[test]
    fn test_codes_are_capped() {
        let (primary, alternate) = codes("aleksandrovich");
        assert_eq!(primary.len(), 4);
        assert_eq!(alternate.len(), 4);
    }
}
